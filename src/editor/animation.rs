use glam::{Quat, Vec3};

use crate::config::AnimationConfig;
use crate::scene_graph::Scene;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnimationSettings {
    pub paused: bool,
    pub global_spin: bool,
    pub global_orbit: bool,
    pub global_speed: f32,
}

impl Default for AnimationSettings {
    fn default() -> Self {
        Self {
            paused: false,
            global_spin: false,
            global_orbit: false,
            global_speed: 1.0,
        }
    }
}

/// Rotates `position` around the world Y axis through the origin.
pub fn orbit_xz(position: Vec3, angle: f32) -> Vec3 {
    Quat::from_rotation_y(angle) * position
}

/// One frame of spin and orbit for every placed object in the scene.
/// Returns how many objects moved.
pub fn advance(scene: &mut Scene, settings: &AnimationSettings, config: &AnimationConfig) -> usize {
    if settings.paused {
        return 0;
    }

    let roots = scene.roots().to_vec();
    let mut moved = 0;

    for id in roots {
        let Some(props) = scene.get_object(id).and_then(|object| object.editor.clone()) else {
            continue;
        };

        let speed = props.animation_speed * settings.global_speed;
        let spin = settings.global_spin || props.spinning;
        let orbit = settings.global_orbit || props.orbiting;

        if spin {
            scene.rotate_object_y(id, config.spin_rate * speed);
        }

        if orbit {
            let position = scene.objects[id].transform.translation();
            scene.set_object_translation(id, orbit_xz(position, config.orbit_rate * speed));
        }

        if spin || orbit {
            moved += 1;
        }
    }

    moved
}

#[cfg(test)]
mod tests {
    use std::f32::consts::FRAC_PI_2;

    use super::*;
    use crate::scene_graph::{EditorProps, Object3D, ObjectId};

    fn placed(scene: &mut Scene, position: Vec3) -> ObjectId {
        let mut object = Object3D::new("Planet");
        object.editor = Some(EditorProps::placed(10.0));
        object.transform.set_translation(position);
        let id = scene.add_object(object);
        scene.attach(id);
        id
    }

    fn assert_close(a: Vec3, b: Vec3) {
        assert!(a.distance(b) < 1e-3, "{a} != {b}");
    }

    #[test]
    fn orbit_keeps_distance_to_origin() {
        let rotated = orbit_xz(Vec3::new(100.0, 5.0, 0.0), FRAC_PI_2);
        assert_close(rotated, Vec3::new(0.0, 5.0, -100.0));
    }

    #[test]
    fn only_flagged_objects_animate() {
        let mut scene = Scene::new();
        let still = placed(&mut scene, Vec3::new(100.0, 0.0, 0.0));
        let orbiting = placed(&mut scene, Vec3::new(100.0, 0.0, 0.0));
        scene.objects[orbiting].editor.as_mut().unwrap().orbiting = true;

        let moved = advance(&mut scene, &AnimationSettings::default(), &AnimationConfig::default());

        assert_eq!(moved, 1);
        assert_eq!(scene.objects[still].transform.translation(), Vec3::new(100.0, 0.0, 0.0));
        let position = scene.objects[orbiting].transform.translation();
        assert!(position.z.abs() > 0.0);
        assert!((position.length() - 100.0).abs() < 1e-3);
    }

    #[test]
    fn global_spin_scales_with_speeds() {
        let mut scene = Scene::new();
        let id = placed(&mut scene, Vec3::ZERO);
        scene.objects[id].editor.as_mut().unwrap().animation_speed = 2.0;
        let settings = AnimationSettings {
            global_spin: true,
            global_speed: 3.0,
            ..Default::default()
        };

        advance(&mut scene, &settings, &AnimationConfig::default());

        let (axis, angle) = scene.objects[id].transform.rotation().to_axis_angle();
        assert_close(axis, Vec3::Y);
        assert!((angle - 0.06).abs() < 1e-5);
    }

    #[test]
    fn paused_skips_animation() {
        let mut scene = Scene::new();
        let id = placed(&mut scene, Vec3::new(50.0, 0.0, 0.0));
        let settings = AnimationSettings {
            paused: true,
            global_orbit: true,
            global_spin: true,
            ..Default::default()
        };

        assert_eq!(advance(&mut scene, &settings, &AnimationConfig::default()), 0);
        assert_eq!(scene.objects[id].transform.translation(), Vec3::new(50.0, 0.0, 0.0));
    }

    #[test]
    fn detached_objects_do_not_animate() {
        let mut scene = Scene::new();
        let id = placed(&mut scene, Vec3::new(50.0, 0.0, 0.0));
        scene.detach(id);
        let settings = AnimationSettings {
            global_orbit: true,
            ..Default::default()
        };

        assert_eq!(advance(&mut scene, &settings, &AnimationConfig::default()), 0);
    }
}
