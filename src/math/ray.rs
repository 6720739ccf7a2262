use glam::{Mat4, Vec3};

use crate::math::bounds::AABB;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

impl Ray {
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: direction.normalize_or_zero(),
        }
    }

    pub fn at(&self, distance: f32) -> Vec3 {
        self.origin + self.direction * distance
    }

    /// Slab test. Returns the distance to the entry point, or the exit point
    /// when the origin is inside the box.
    pub fn intersect_aabb(&self, aabb: &AABB) -> Option<f32> {
        let mut t_min: f32 = 0.0;
        let mut t_max: f32 = f32::INFINITY;

        for axis in 0..3 {
            let origin = self.origin[axis];
            let direction = self.direction[axis];
            let (min, max) = (aabb.min[axis], aabb.max[axis]);

            if direction.abs() < 1e-6 {
                if origin < min || origin > max {
                    return None;
                }
                continue;
            }

            let inv = 1.0 / direction;
            let mut t1 = (min - origin) * inv;
            let mut t2 = (max - origin) * inv;
            if t1 > t2 {
                std::mem::swap(&mut t1, &mut t2);
            }
            t_min = t_min.max(t1);
            t_max = t_max.min(t2);
            if t_min > t_max {
                return None;
            }
        }

        if t_max < 0.0 {
            return None;
        }

        Some(if t_min >= 0.0 { t_min } else { t_max })
    }

    /// Intersects a box given in the local space of `world`. The returned
    /// distance is in world units.
    pub fn intersect_transformed_aabb(&self, aabb: &AABB, world: &Mat4) -> Option<f32> {
        let inverse = world.inverse();
        if !inverse.is_finite() {
            return None;
        }

        let local_direction = inverse.transform_vector3(self.direction);
        if local_direction.length_squared() <= f32::EPSILON {
            return None;
        }

        let local = Ray::new(inverse.transform_point3(self.origin), local_direction);
        let t_local = local.intersect_aabb(aabb)?;
        let hit_world = world.transform_point3(local.at(t_local));

        Some(hit_world.distance(self.origin))
    }
}
