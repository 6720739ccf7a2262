use std::f32::consts::PI;

use glam::{Mat4, Vec2, Vec3, Vec4};
use wgpu::util::DeviceExt;
use winit::dpi::PhysicalSize;

use crate::config::CameraConfig;
use crate::math::ray::Ray;

const MIN_POLAR_ANGLE: f32 = 1e-3;
const ZOOM_STEP: f32 = 0.95;

pub struct Camera {
    pub eye: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    pub fov_y: f32,
    pub near: f32,
    pub far: f32,
}

impl Camera {
    pub fn from_config(config: &CameraConfig) -> Self {
        Self {
            eye: config.home_eye,
            target: config.home_target,
            up: Vec3::Y,
            fov_y: config.fov_y_degrees.to_radians(),
            near: config.near,
            far: config.far,
        }
    }

    pub fn get_view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye, self.target, self.up)
    }

    pub fn get_projection_matrix(&self, resolution: Vec2) -> Mat4 {
        let aspect = if resolution.y > 0.0 {
            resolution.x / resolution.y
        } else {
            1.0
        };
        Mat4::perspective_rh(self.fov_y, aspect, self.near, self.far)
    }

    pub fn get_vp_matrix(&self, resolution: Vec2) -> Mat4 {
        self.get_projection_matrix(resolution) * self.get_view_matrix()
    }

    /// World-space ray from the eye through a cursor position in pixels.
    pub fn screen_ray(&self, cursor: Vec2, size: PhysicalSize<u32>) -> Option<Ray> {
        if size.width == 0 || size.height == 0 {
            return None;
        }

        let resolution = Vec2::new(size.width as f32, size.height as f32);
        let ndc_x = 2.0 * cursor.x / resolution.x - 1.0;
        let ndc_y = 1.0 - 2.0 * cursor.y / resolution.y;

        let inverse_vp = self.get_vp_matrix(resolution).inverse();
        let far = inverse_vp * Vec4::new(ndc_x, ndc_y, 1.0, 1.0);
        if far.w.abs() < f32::EPSILON {
            return None;
        }

        let direction = far.truncate() / far.w - self.eye;
        if direction.length_squared() < f32::EPSILON {
            return None;
        }

        Some(Ray::new(self.eye, direction))
    }
}

/// Orbits the camera around its target with damped rotation and clamped zoom.
pub struct OrbitControls {
    pub camera: Camera,
    home_eye: Vec3,
    home_target: Vec3,
    theta_delta: f32,
    phi_delta: f32,
    pending_scale: f32,
    min_distance: f32,
    max_distance: f32,
    damping: f32,
    rotate_speed: f32,
}

impl OrbitControls {
    pub fn new(config: &CameraConfig) -> Self {
        Self {
            camera: Camera::from_config(config),
            home_eye: config.home_eye,
            home_target: config.home_target,
            theta_delta: 0.0,
            phi_delta: 0.0,
            pending_scale: 1.0,
            min_distance: config.min_distance,
            max_distance: config.max_distance,
            damping: config.damping.clamp(0.0, 1.0),
            rotate_speed: config.rotate_speed,
        }
    }

    /// Queues a rotation from a mouse drag, in pixels.
    pub fn rotate(&mut self, drag: Vec2) {
        self.theta_delta -= drag.x * self.rotate_speed;
        self.phi_delta -= drag.y * self.rotate_speed;
    }

    /// Positive `steps` zoom in.
    pub fn zoom(&mut self, steps: f32) {
        self.pending_scale *= ZOOM_STEP.powf(steps);
    }

    /// Puts the camera back at its home position and drops pending motion.
    pub fn reset(&mut self) {
        self.camera.eye = self.home_eye;
        self.camera.target = self.home_target;
        self.theta_delta = 0.0;
        self.phi_delta = 0.0;
        self.pending_scale = 1.0;
    }

    pub fn distance(&self) -> f32 {
        self.camera.eye.distance(self.camera.target)
    }

    /// Applies one frame of damped motion.
    pub fn update(&mut self) {
        let offset = self.camera.eye - self.camera.target;
        let radius = offset.length();
        if radius <= f32::EPSILON {
            return;
        }

        let theta = offset.x.atan2(offset.z) + self.theta_delta * self.damping;
        let phi = ((offset.y / radius).clamp(-1.0, 1.0).acos() + self.phi_delta * self.damping)
            .clamp(MIN_POLAR_ANGLE, PI - MIN_POLAR_ANGLE);
        let radius = (radius * self.pending_scale).clamp(self.min_distance, self.max_distance);

        self.camera.eye = self.camera.target
            + radius * Vec3::new(phi.sin() * theta.sin(), phi.cos(), phi.sin() * theta.cos());

        self.theta_delta *= 1.0 - self.damping;
        self.phi_delta *= 1.0 - self.damping;
        self.pending_scale = 1.0;
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable, Default)]
pub struct CameraUniform {
    view_proj: Mat4,
}

impl CameraUniform {
    pub fn update(&mut self, resolution: PhysicalSize<u32>, camera: &Camera) {
        self.view_proj =
            camera.get_vp_matrix(Vec2::new(resolution.width as f32, resolution.height as f32));
    }

    pub fn create_buffer(&self, device: &wgpu::Device) -> wgpu::Buffer {
        device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Camera Uniform Buffer"),
            contents: bytemuck::cast_slice(&[*self]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        })
    }

    pub fn update_buffer(&self, queue: &wgpu::Queue, buffer: &wgpu::Buffer) {
        queue.write_buffer(buffer, 0, bytemuck::cast_slice(&[*self]));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settle(controls: &mut OrbitControls) {
        for _ in 0..1000 {
            controls.update();
        }
    }

    #[test]
    fn starts_and_resets_at_home() {
        let config = CameraConfig::default();
        let mut controls = OrbitControls::new(&config);
        assert_eq!(controls.camera.eye, Vec3::new(0.0, 3000.0, 3000.0));

        controls.rotate(Vec2::new(120.0, -40.0));
        controls.zoom(10.0);
        settle(&mut controls);
        assert!(controls.camera.eye.distance(config.home_eye) > 1.0);

        controls.reset();
        assert_eq!(controls.camera.eye, config.home_eye);
        assert_eq!(controls.camera.target, Vec3::ZERO);
    }

    #[test]
    fn damped_rotation_converges_to_full_delta() {
        let mut controls = OrbitControls::new(&CameraConfig::default());
        let distance = controls.distance();

        // 100 px at 0.005 rad/px is half a radian of yaw
        controls.rotate(Vec2::new(-100.0, 0.0));
        controls.update();
        let first = controls.camera.eye.x;
        settle(&mut controls);

        let eye = controls.camera.eye;
        assert!(first > 0.0 && first < eye.x);
        assert!((eye.x.atan2(eye.z) - 0.5).abs() < 1e-3);
        assert!((controls.distance() - distance).abs() < 0.5);
    }

    #[test]
    fn zoom_is_clamped() {
        let config = CameraConfig::default();
        let mut controls = OrbitControls::new(&config);

        controls.zoom(1000.0);
        controls.update();
        assert!((controls.distance() - config.min_distance).abs() < 1e-2);

        controls.zoom(-1000.0);
        controls.update();
        assert!((controls.distance() - config.max_distance).abs() < 1.0);
    }

    #[test]
    fn center_ray_points_at_target() {
        let camera = Camera::from_config(&CameraConfig::default());
        let ray = camera
            .screen_ray(Vec2::new(400.0, 300.0), PhysicalSize::new(800, 600))
            .unwrap();

        let expected = (camera.target - camera.eye).normalize();
        assert!(ray.direction.distance(expected) < 1e-3);
        assert_eq!(ray.origin, camera.eye);
        assert!(camera.screen_ray(Vec2::ZERO, PhysicalSize::new(0, 0)).is_none());
    }
}
