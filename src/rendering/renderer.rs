use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use chrono::Utc;
use wgpu::CommandEncoderDescriptor;
use winit::{dpi::PhysicalSize, window::Window};

use crate::{
    camera::CameraUniform,
    decor::Decor,
    editor::EditorSession,
    rendering::{
        imgui_renderer::{create_imgui_renderer, ImguiRendererState},
        line_pass::{LinePass, LinePassTargets},
        lines::build_frame_lines,
        mesh_pass::{collect_mesh_draws, MeshPass, MeshPassTargets},
        pass::Pass,
        render_common::RenderCommon,
        screenshot,
        shader_loader::{PipelineCacheBuilder, ShaderLoader},
        texture::DepthTexture,
    },
};

pub struct Renderer {
    pub window: Arc<Window>,
    pub size: PhysicalSize<u32>,

    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,

    common: Arc<RenderCommon>,
    depth_texture: DepthTexture,
    camera_uniform: CameraUniform,

    shader_loader: ShaderLoader,

    mesh_pass: MeshPass,
    line_pass: LinePass,
    imgui_renderer: ImguiRendererState,
}

impl Renderer {
    pub async fn new(
        window: Arc<Window>,
        imgui_context: &mut imgui::Context,
    ) -> anyhow::Result<Renderer> {
        let size = window.inner_size();

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());
        let surface = instance
            .create_surface(window.clone())
            .context("Failed to create surface")?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .context("No suitable graphics adapter")?;

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                label: None,
                memory_hints: Default::default(),
                trace: wgpu::Trace::Off,
            })
            .await
            .context("Failed to request device")?;

        let common = Arc::new(RenderCommon::new(&device, &adapter, &surface, size));

        let depth_texture = DepthTexture::new(&device, size, "Depth Texture");

        let mut cache_builder = PipelineCacheBuilder::new();
        let mesh_pass = MeshPass::create(&device, common.clone(), &mut cache_builder)?;
        let line_pass = LinePass::create(&device, common.clone(), &mut cache_builder)?;
        let shader_loader = ShaderLoader::new(device.clone(), cache_builder)?;

        let imgui_renderer =
            create_imgui_renderer(&device, &queue, common.surface_format(), imgui_context);

        Ok(Self {
            window,
            size,
            surface,
            device,
            queue,
            common,
            depth_texture,
            camera_uniform: CameraUniform::default(),
            shader_loader,
            mesh_pass,
            line_pass,
            imgui_renderer,
        })
    }

    pub fn resize(&mut self, new_size: PhysicalSize<u32>) {
        if new_size.width == 0 || new_size.height == 0 {
            return;
        }

        let mut config = match self.common.output_surface_config.write() {
            Ok(config) => config,
            Err(poisoned) => poisoned.into_inner(),
        };

        self.size = new_size;
        config.width = new_size.width;
        config.height = new_size.height;
        self.depth_texture.resize(&self.device, new_size);
        self.surface.configure(&self.device, &config);
    }

    /// Uploads this frame's camera, mesh instances and line geometry.
    fn prepare(&mut self, session: &EditorSession, decor: &Decor, show_outline: bool) {
        self.shader_loader.load_pending_shaders();

        self.camera_uniform
            .update(self.size, &session.controls.camera);
        self.camera_uniform
            .update_buffer(&self.queue, &self.common.camera_uniform_buffer);

        let draws = collect_mesh_draws(&session.scene);
        self.mesh_pass.upload(&self.device, &self.queue, &draws);

        let batch = build_frame_lines(session, decor, show_outline);
        self.line_pass.upload(&self.device, &self.queue, &batch);
    }

    fn clear_color(session: &EditorSession) -> wgpu::Color {
        let [r, g, b] = session.view.background.to_linear();
        wgpu::Color {
            r: r as f64,
            g: g as f64,
            b: b as f64,
            a: 1.0,
        }
    }

    pub fn render(
        &mut self,
        session: &EditorSession,
        decor: &Decor,
        draw_data: &imgui::DrawData,
    ) -> Result<(), wgpu::SurfaceError> {
        self.prepare(session, decor, true);

        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        self.mesh_pass.render(
            &MeshPassTargets {
                color: view.clone(),
                depth: self.depth_texture.view().clone(),
                clear_color: Self::clear_color(session),
            },
            &mut encoder,
            &self.shader_loader.cache,
            |render_pass| self.mesh_pass.draw(render_pass),
        );

        self.line_pass.render(
            &LinePassTargets {
                color: view.clone(),
                depth: self.depth_texture.view().clone(),
            },
            &mut encoder,
            &self.shader_loader.cache,
            |render_pass| self.line_pass.draw(render_pass),
        );

        self.imgui_renderer
            .render(&view, draw_data, &self.device, &self.queue, &mut encoder);

        self.queue.submit([encoder.finish()]);
        output.present();

        Ok(())
    }

    /// Renders the scene without panels or selection outline and writes it to
    /// a timestamped PNG in `dir`.
    pub fn capture_screenshot(
        &mut self,
        session: &EditorSession,
        decor: &Decor,
        dir: &Path,
    ) -> anyhow::Result<PathBuf> {
        self.prepare(session, decor, false);

        let clear_color = Self::clear_color(session);
        let mesh_pass = &self.mesh_pass;
        let line_pass = &self.line_pass;
        let pipeline_cache = &self.shader_loader.cache;

        let image = screenshot::capture(
            &self.device,
            &self.queue,
            self.size,
            self.common.surface_format(),
            |encoder, color, depth| {
                mesh_pass.render(
                    &MeshPassTargets {
                        color: color.clone(),
                        depth: depth.clone(),
                        clear_color,
                    },
                    encoder,
                    pipeline_cache,
                    |render_pass| mesh_pass.draw(render_pass),
                );
                line_pass.render(
                    &LinePassTargets {
                        color: color.clone(),
                        depth: depth.clone(),
                    },
                    encoder,
                    pipeline_cache,
                    |render_pass| line_pass.draw(render_pass),
                );
            },
        )?;

        let path = screenshot::save_png(dir, &image, Utc::now())?;
        log::info!("Saved screenshot to {}", path.display());

        Ok(path)
    }
}
