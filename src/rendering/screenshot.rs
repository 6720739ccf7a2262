use std::path::{Path, PathBuf};
use std::sync::mpsc::channel;

use anyhow::Context;
use chrono::{DateTime, Utc};
use image::RgbaImage;
use wgpu::PollType;
use winit::dpi::PhysicalSize;

use crate::rendering::texture::DepthTexture;

const BYTES_PER_PIXEL: u32 = 4;

/// `galaxias_simulation_2024-05-01T13-45-07.png`
pub fn screenshot_file_name(time: DateTime<Utc>) -> String {
    format!("galaxias_simulation_{}.png", time.format("%Y-%m-%dT%H-%M-%S"))
}

/// Row pitch accepted by `copy_texture_to_buffer`.
pub fn padded_bytes_per_row(width: u32) -> u32 {
    let unpadded = width * BYTES_PER_PIXEL;
    let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
    unpadded.div_ceil(align) * align
}

/// Strips row padding and converts BGRA texels to RGBA when needed.
pub fn unpad_rows(data: &[u8], size: PhysicalSize<u32>, padded_row: u32, bgra: bool) -> Vec<u8> {
    let row = (size.width * BYTES_PER_PIXEL) as usize;
    let mut pixels = Vec::with_capacity(row * size.height as usize);

    for chunk in data.chunks(padded_row as usize).take(size.height as usize) {
        pixels.extend_from_slice(&chunk[..row]);
    }

    if bgra {
        for texel in pixels.chunks_exact_mut(BYTES_PER_PIXEL as usize) {
            texel.swap(0, 2);
        }
    }

    pixels
}

pub fn save_png(dir: &Path, image: &RgbaImage, time: DateTime<Utc>) -> anyhow::Result<PathBuf> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create screenshot folder {}", dir.display()))?;

    let path = dir.join(screenshot_file_name(time));
    image
        .save(&path)
        .with_context(|| format!("Failed to write screenshot {}", path.display()))?;

    Ok(path)
}

/// Renders one frame into an offscreen texture and reads it back.
///
/// `draw` records the frame into the given color and depth views.
pub fn capture<F>(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    size: PhysicalSize<u32>,
    format: wgpu::TextureFormat,
    draw: F,
) -> anyhow::Result<RgbaImage>
where
    F: FnOnce(&mut wgpu::CommandEncoder, &wgpu::TextureView, &wgpu::TextureView),
{
    let bgra = match format {
        wgpu::TextureFormat::Bgra8Unorm | wgpu::TextureFormat::Bgra8UnormSrgb => true,
        wgpu::TextureFormat::Rgba8Unorm | wgpu::TextureFormat::Rgba8UnormSrgb => false,
        other => anyhow::bail!("Screenshots are not supported for {:?} surfaces", other),
    };

    let extent = wgpu::Extent3d {
        width: size.width.max(1),
        height: size.height.max(1),
        depth_or_array_layers: 1,
    };
    let size = PhysicalSize::new(extent.width, extent.height);

    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Screenshot Texture"),
        size: extent,
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
        view_formats: &[],
    });
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    let depth = DepthTexture::new(device, size, "Screenshot Depth Texture");

    let padded_row = padded_bytes_per_row(extent.width);
    let buffer = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Screenshot Readback Buffer"),
        size: (padded_row * extent.height) as u64,
        usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
        mapped_at_creation: false,
    });

    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
        label: Some("Screenshot Encoder"),
    });

    draw(&mut encoder, &view, depth.view());

    encoder.copy_texture_to_buffer(
        wgpu::TexelCopyTextureInfo {
            texture: &texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        wgpu::TexelCopyBufferInfo {
            buffer: &buffer,
            layout: wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(padded_row),
                rows_per_image: Some(extent.height),
            },
        },
        extent,
    );

    queue.submit([encoder.finish()]);

    let slice = buffer.slice(..);
    let (sender, receiver) = channel();
    slice.map_async(wgpu::MapMode::Read, move |result| {
        let _ = sender.send(result);
    });

    device
        .poll(PollType::Wait)
        .context("Failed to poll device for screenshot readback")?;
    receiver
        .recv()
        .context("Screenshot readback was dropped")?
        .context("Failed to map screenshot buffer")?;

    let pixels = {
        let data = slice.get_mapped_range();
        unpad_rows(&data, size, padded_row, bgra)
    };
    buffer.unmap();

    RgbaImage::from_raw(size.width, size.height, pixels)
        .context("Screenshot buffer does not match the frame size")
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn file_name_uses_iso_like_timestamp() {
        let time = Utc.with_ymd_and_hms(2024, 5, 1, 13, 45, 7).unwrap();
        assert_eq!(
            screenshot_file_name(time),
            "galaxias_simulation_2024-05-01T13-45-07.png"
        );
    }

    #[test]
    fn rows_are_padded_to_copy_alignment() {
        assert_eq!(padded_bytes_per_row(64), 256);
        assert_eq!(padded_bytes_per_row(65), 512);
        assert_eq!(padded_bytes_per_row(1), 256);
    }

    #[test]
    fn unpad_strips_padding_and_swizzles() {
        let size = PhysicalSize::new(1, 2);
        let mut data = vec![0u8; 512];
        data[..4].copy_from_slice(&[1, 2, 3, 4]);
        data[256..260].copy_from_slice(&[5, 6, 7, 8]);

        assert_eq!(unpad_rows(&data, size, 256, false), vec![1, 2, 3, 4, 5, 6, 7, 8]);
        assert_eq!(unpad_rows(&data, size, 256, true), vec![3, 2, 1, 4, 7, 6, 5, 8]);
    }

    #[test]
    fn saves_png_into_new_folder() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("screenshots");
        let image = RgbaImage::from_pixel(2, 2, image::Rgba([10, 20, 30, 255]));
        let time = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();

        let path = save_png(&target, &image, time).unwrap();

        assert_eq!(path, target.join("galaxias_simulation_2024-01-02T03-04-05.png"));
        let loaded = image::open(&path).unwrap().to_rgba8();
        assert_eq!(loaded.get_pixel(1, 1), &image::Rgba([10, 20, 30, 255]));
    }
}
