//! Perspective camera producing view and reverse-Z projection matrices.

use glam::{Mat4, Quat, Vec3};

/// A perspective camera.
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    pub position: Vec3,
    /// Rotation as a unit quaternion; identity looks down -Z with +Y up.
    pub rotation: Quat,
    /// Vertical field of view in radians.
    pub fov_y: f32,
    /// Width / height.
    pub aspect_ratio: f32,
    /// Near clip plane distance (always positive).
    pub near: f32,
    /// Far clip plane distance (always positive, > near).
    pub far: f32,
}

impl Camera {
    /// A camera at the origin with the given vertical field of view in degrees.
    pub fn perspective(fov_y_deg: f32, aspect_ratio: f32, near: f32, far: f32) -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            fov_y: fov_y_deg.to_radians(),
            aspect_ratio,
            near,
            far,
        }
    }

    /// Compute the view matrix (inverse of camera transform).
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::from_rotation_translation(self.rotation, self.position).inverse()
    }

    /// Compute the projection matrix with reverse-Z.
    pub fn projection_matrix(&self) -> Mat4 {
        // Near maps to z=1 and far to z=0: swap the planes.
        Mat4::perspective_rh(self.fov_y, self.aspect_ratio, self.far, self.near)
    }

    pub fn view_projection_matrix(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    /// The forward direction vector (-Z in camera space).
    pub fn forward(&self) -> Vec3 {
        self.rotation * Vec3::NEG_Z
    }

    /// The up direction vector (+Y in camera space).
    pub fn up(&self) -> Vec3 {
        self.rotation * Vec3::Y
    }

    /// The right direction vector (+X in camera space).
    pub fn right(&self) -> Vec3 {
        self.rotation * Vec3::X
    }

    /// Turn to face `target`, keeping world +Y as up where possible.
    pub fn look_at(&mut self, target: Vec3) {
        let Some(dir) = (target - self.position).try_normalize() else {
            return;
        };
        let up = if dir.cross(Vec3::Y).length_squared() < 1e-8 {
            Vec3::Z
        } else {
            Vec3::Y
        };
        let view = Mat4::look_to_rh(self.position, dir, up);
        self.rotation = Quat::from_mat4(&view).inverse().normalize();
    }

    /// Update the aspect ratio from a viewport size.
    pub fn set_aspect_ratio(&mut self, width: f32, height: f32) {
        self.aspect_ratio = width / height;
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::perspective(45.0, 16.0 / 9.0, 0.1, 10000.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec4;
    use std::f32::consts::FRAC_PI_4;

    #[test]
    fn test_identity_camera_looks_down_neg_z() {
        let camera = Camera::default();
        let forward = camera.forward();
        assert!((forward - Vec3::NEG_Z).length() < 1e-6);
    }

    #[test]
    fn test_perspective_takes_degrees() {
        let camera = Camera::perspective(60.0, 1.5, 100.0, 2_000_000.0);
        assert!((camera.fov_y - 60f32.to_radians()).abs() < 1e-6);
        assert_eq!(camera.near, 100.0);
        assert_eq!(camera.far, 2_000_000.0);
        let default = Camera::default();
        assert!((default.fov_y - FRAC_PI_4).abs() < 1e-6);
    }

    #[test]
    fn test_set_aspect_ratio() {
        let mut camera = Camera::default();
        camera.set_aspect_ratio(1920.0, 1080.0);
        assert!((camera.aspect_ratio - 16.0 / 9.0).abs() < 1e-6);
    }

    #[test]
    fn test_reverse_z_depth_range() {
        let camera = Camera::perspective(60.0, 1.0, 100.0, 2_000_000.0);
        let proj = camera.projection_matrix();
        let near = proj * Vec4::new(0.0, 0.0, -100.0, 1.0);
        let far = proj * Vec4::new(0.0, 0.0, -2_000_000.0, 1.0);
        assert!((near.z / near.w - 1.0).abs() < 1e-4);
        assert!((far.z / far.w).abs() < 1e-4);
    }

    #[test]
    fn test_view_matrix_inverse_is_camera_transform() {
        let camera = Camera {
            position: Vec3::new(10.0, 20.0, 30.0),
            rotation: Quat::from_rotation_y(std::f32::consts::FRAC_PI_2),
            ..Camera::default()
        };
        let inv_view = camera.view_matrix().inverse();
        let reconstructed_pos = inv_view.col(3).truncate();
        assert!((reconstructed_pos - camera.position).length() < 1e-4);
    }

    #[test]
    fn test_look_at_faces_target() {
        let mut camera = Camera {
            position: Vec3::new(200.0, -1000.0, 500.0),
            ..Camera::default()
        };
        camera.look_at(Vec3::ZERO);
        let expected = (Vec3::ZERO - camera.position).normalize();
        assert!((camera.forward() - expected).length() < 1e-4);
        // Horizon stays level.
        assert!(camera.right().y.abs() < 1e-4);
    }

    #[test]
    fn test_look_at_straight_down_is_finite() {
        let mut camera = Camera {
            position: Vec3::new(0.0, 10.0, 0.0),
            ..Camera::default()
        };
        camera.look_at(Vec3::ZERO);
        assert!(camera.rotation.is_finite());
        assert!((camera.forward() - Vec3::NEG_Y).length() < 1e-4);
    }

    #[test]
    fn test_look_at_own_position_is_ignored() {
        let mut camera = Camera::default();
        camera.look_at(camera.position);
        assert_eq!(camera.rotation, Quat::IDENTITY);
    }

    #[test]
    fn test_up_right_forward_orthogonal() {
        let mut camera = Camera {
            position: Vec3::new(3.0, 4.0, 5.0),
            ..Camera::default()
        };
        camera.look_at(Vec3::ZERO);
        let (f, u, r) = (camera.forward(), camera.up(), camera.right());
        assert!((f.length() - 1.0).abs() < 1e-5);
        assert!(f.dot(u).abs() < 1e-5);
        assert!(f.dot(r).abs() < 1e-5);
        assert!(u.dot(r).abs() < 1e-5);
    }

    #[test]
    fn test_view_projection_combines_correctly() {
        let camera = Camera::default();
        let vp = camera.view_projection_matrix();
        let expected = camera.projection_matrix() * camera.view_matrix();
        assert!(vp.abs_diff_eq(expected, 1e-6));
    }
}
