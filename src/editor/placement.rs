use glam::{Vec2, Vec3};
use rand::Rng;

use crate::assets::model::ModelNode;
use crate::config::PlacementConfig;

/// How a loaded model has to be adjusted to sit in the sandbox.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalizedModel {
    /// Centroid of the raw model; the model is shifted by `-center`.
    pub center: Vec3,
    /// Raw size before scaling.
    pub size: Vec3,
    /// Uniform scale mapping the largest dimension to the target size.
    pub scale: f32,
    /// Half of the largest horizontal footprint after scaling.
    pub radius: f32,
}

pub fn normalize(model: &ModelNode, target_size: f32) -> NormalizedModel {
    let (center, size) = model
        .bounds()
        .map(|bounds| (bounds.center(), bounds.size()))
        .unwrap_or((Vec3::ZERO, Vec3::ZERO));

    let max_dimension = size.max_element();
    let scale = if max_dimension > 0.0 {
        target_size / max_dimension
    } else {
        1.0
    };

    NormalizedModel {
        center,
        size,
        scale,
        radius: (size.x * scale).max(size.z * scale) / 2.0,
    }
}

/// Footprint of an object already in the scene.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Occupant {
    pub center: Vec3,
    pub radius: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Placement {
    Clear(Vec3),
    /// No clear spot within the attempt budget; overlap is possible.
    Fallback(Vec3),
}

impl Placement {
    pub fn position(&self) -> Vec3 {
        match *self {
            Placement::Clear(position) | Placement::Fallback(position) => position,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Placement::Fallback(_))
    }
}

/// Planar (XZ) clearance test against every occupant.
pub fn is_clear(candidate: Vec3, radius: f32, occupants: &[Occupant], clearance: f32) -> bool {
    occupants.iter().all(|occupant| {
        let distance = Vec2::new(candidate.x, candidate.z)
            .distance(Vec2::new(occupant.center.x, occupant.center.z));
        distance >= radius + occupant.radius + clearance
    })
}

fn sample_square<R: Rng + ?Sized>(rng: &mut R, side: f32) -> Vec3 {
    let x = (rng.gen::<f32>() - 0.5) * side;
    let z = (rng.gen::<f32>() - 0.5) * side;
    Vec3::new(x, 0.0, z)
}

/// Random rejection sampling on the ground plane. Always returns a position.
pub fn place<R: Rng + ?Sized>(
    radius: f32,
    occupants: &[Occupant],
    rng: &mut R,
    config: &PlacementConfig,
) -> Placement {
    for _ in 0..config.max_attempts {
        let candidate = sample_square(rng, config.region_size);
        if is_clear(candidate, radius, occupants, config.clearance) {
            return Placement::Clear(candidate);
        }
    }

    let fallback = sample_square(rng, config.fallback_region_size);
    log::warn!(
        "No clear spot after {} attempts, placing at {} unchecked",
        config.max_attempts,
        fallback
    );

    Placement::Fallback(fallback)
}
