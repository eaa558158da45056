//! Pointer-driven orbit camera controller.
//!
//! Input methods only accumulate deltas; [`OrbitController::update`] applies
//! them to a [`Camera`] in one step. The camera position is kept as a
//! spherical offset around `target`.

use std::f32::consts::{PI, TAU};

use glam::Vec3;

use crate::camera::Camera;

const MIN_POLAR: f32 = 1e-6;

/// Orbits a camera around a target point.
#[derive(Debug, Clone)]
pub struct OrbitController {
    target: Vec3,
    pub enable_zoom: bool,
    pub enable_pan: bool,
    pub enable_rotate: bool,
    pub rotate_speed: f32,
    pub zoom_speed: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    delta_theta: f32,
    delta_phi: f32,
    scale: f32,
    /// Pending pan along camera (right, up), in multiples of the target distance.
    pan_offset: (f32, f32),
}

impl OrbitController {
    pub fn new(target: Vec3) -> Self {
        Self {
            target,
            enable_zoom: true,
            enable_pan: true,
            enable_rotate: true,
            rotate_speed: 1.0,
            zoom_speed: 1.0,
            min_distance: 0.0,
            max_distance: f32::INFINITY,
            delta_theta: 0.0,
            delta_phi: 0.0,
            scale: 1.0,
            pan_offset: (0.0, 0.0),
        }
    }

    pub fn target(&self) -> Vec3 {
        self.target
    }

    pub fn set_target(&mut self, target: Vec3) {
        self.target = target;
    }

    /// Queue a rotation from a pointer drag of `(dx, dy)` pixels.
    ///
    /// A drag across the full viewport height turns the camera once around.
    pub fn rotate(&mut self, dx: f32, dy: f32, viewport_height: f32) {
        if !self.enable_rotate || viewport_height <= 0.0 {
            return;
        }
        self.delta_theta -= TAU * dx / viewport_height * self.rotate_speed;
        self.delta_phi -= TAU * dy / viewport_height * self.rotate_speed;
    }

    /// Queue a pan from a pointer drag of `(dx, dy)` pixels.
    ///
    /// Scaled so the point under the cursor at the target's depth follows the
    /// pointer. `fov_y` is the camera's vertical field of view in radians.
    pub fn pan(&mut self, dx: f32, dy: f32, viewport_height: f32, fov_y: f32) {
        if !self.enable_pan || viewport_height <= 0.0 {
            return;
        }
        // Fraction of the target distance per pixel.
        let per_pixel = 2.0 * (fov_y * 0.5).tan() / viewport_height;
        self.pan_offset.0 -= dx * per_pixel;
        self.pan_offset.1 += dy * per_pixel;
    }

    /// Queue a dolly from a wheel delta. Returns `false` when zoom is
    /// disabled and the input was ignored.
    pub fn dolly(&mut self, scroll: f32) -> bool {
        if !self.enable_zoom {
            return false;
        }
        let factor = 0.95_f32.powf(self.zoom_speed * scroll.abs());
        if scroll > 0.0 {
            self.scale *= factor;
        } else if scroll < 0.0 {
            self.scale /= factor;
        }
        true
    }

    /// Apply queued input to `camera` and aim it at the target. Returns
    /// whether the camera moved.
    pub fn update(&mut self, camera: &mut Camera) -> bool {
        let moved = self.delta_theta != 0.0
            || self.delta_phi != 0.0
            || self.scale != 1.0
            || self.pan_offset != (0.0, 0.0);

        let offset = camera.position - self.target;
        let radius = offset.length();
        let (pan_right, pan_up) = self.pan_offset;
        self.target += (camera.right() * pan_right + camera.up() * pan_up) * radius;

        let (mut theta, mut phi) = if radius > 0.0 {
            (offset.x.atan2(offset.z), (offset.y / radius).clamp(-1.0, 1.0).acos())
        } else {
            (0.0, PI * 0.5)
        };
        theta += self.delta_theta;
        phi = (phi + self.delta_phi).clamp(MIN_POLAR, PI - MIN_POLAR);
        let radius = (radius * self.scale).clamp(self.min_distance, self.max_distance);

        let sin_phi = phi.sin();
        camera.position = self.target
            + Vec3::new(
                radius * sin_phi * theta.sin(),
                radius * phi.cos(),
                radius * sin_phi * theta.cos(),
            );
        camera.look_at(self.target);

        self.delta_theta = 0.0;
        self.delta_phi = 0.0;
        self.scale = 1.0;
        self.pan_offset = (0.0, 0.0);
        moved
    }
}
