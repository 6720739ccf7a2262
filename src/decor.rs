//! Generated backdrop geometry. Neither the grid nor the stars are scene
//! objects, so they can never be picked or selected.

use glam::Vec3;
use rand::Rng;

use crate::editor::background::Color;

pub const STAR_COUNT: usize = 3_333;
pub const STARFIELD_EXTENT: f32 = 50_000.0;
pub const GRID_SIZE: f32 = 40_000.0;
pub const GRID_DIVISIONS: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridLine {
    pub start: Vec3,
    pub end: Vec3,
    pub color: Color,
}

pub struct Decor {
    pub stars: Vec<Vec3>,
    pub grid: Vec<GridLine>,
}

impl Decor {
    pub fn generate<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self {
            stars: starfield(STAR_COUNT, STARFIELD_EXTENT, rng),
            grid: grid_lines(GRID_SIZE, GRID_DIVISIONS),
        }
    }
}

/// Points spread uniformly in a cube of side `extent` centered on the origin.
pub fn starfield<R: Rng + ?Sized>(count: usize, extent: f32, rng: &mut R) -> Vec<Vec3> {
    (0..count)
        .map(|_| {
            Vec3::new(
                (rng.gen::<f32>() - 0.5) * extent,
                (rng.gen::<f32>() - 0.5) * extent,
                (rng.gen::<f32>() - 0.5) * extent,
            )
        })
        .collect()
}

/// Square grid on the XZ plane. The two lines through the origin are brighter.
pub fn grid_lines(size: f32, divisions: u32) -> Vec<GridLine> {
    let center_color = Color::rgb8(0x44, 0x44, 0x44);
    let line_color = Color::rgb8(0x22, 0x22, 0x22);
    let half = size / 2.0;
    let step = size / divisions as f32;

    (0..=divisions)
        .flat_map(|i| {
            let offset = -half + i as f32 * step;
            let color = if 2 * i == divisions {
                center_color
            } else {
                line_color
            };

            [
                GridLine {
                    start: Vec3::new(-half, 0.0, offset),
                    end: Vec3::new(half, 0.0, offset),
                    color,
                },
                GridLine {
                    start: Vec3::new(offset, 0.0, -half),
                    end: Vec3::new(offset, 0.0, half),
                    color,
                },
            ]
        })
        .collect()
}
