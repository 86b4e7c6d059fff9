use glam::{Mat4, Vec3, Vec4};

use super::Transform;

/// Perspective camera. View and projection are derived from the transform and the projection
/// parameters; every setter recomputes the matrix it affects together with its inverse.
#[derive(Clone, Debug)]
pub struct Camera {
    transform: Transform,
    fov_y_radians: f32,
    aspect: f32,
    near: f32,
    far: f32,
    view: Mat4,
    inv_view: Mat4,
    projection: Mat4,
    inv_projection: Mat4,
}

impl Camera {
    pub fn new(fov_y_radians: f32, aspect: f32, near: f32, far: f32) -> Self {
        let mut camera = Self {
            transform: Transform::default(),
            fov_y_radians,
            aspect,
            near,
            far,
            view: Mat4::IDENTITY,
            inv_view: Mat4::IDENTITY,
            projection: Mat4::IDENTITY,
            inv_projection: Mat4::IDENTITY,
        };
        camera.update_projection();
        camera
    }

    pub fn set_transform(&mut self, transform: Transform) {
        self.transform = transform;
        self.inv_view = transform.matrix();
        self.view = self.inv_view.inverse();
    }

    pub fn set_projection_params(&mut self, fov_y_radians: f32, near: f32, far: f32) {
        self.fov_y_radians = fov_y_radians;
        self.near = near;
        self.far = far;
        self.update_projection();
    }

    pub fn set_aspect(&mut self, aspect: f32) {
        if aspect.is_finite() && aspect > 0.0 {
            self.aspect = aspect;
            self.update_projection();
        }
    }

    fn update_projection(&mut self) {
        self.projection = Mat4::perspective_rh(self.fov_y_radians, self.aspect, self.near, self.far);
        self.inv_projection = self.projection.inverse();
    }

    pub fn transform(&self) -> &Transform {
        &self.transform
    }

    pub fn position(&self) -> Vec3 {
        self.transform.translation
    }

    pub fn view(&self) -> Mat4 {
        self.view
    }

    pub fn inv_view(&self) -> Mat4 {
        self.inv_view
    }

    pub fn projection(&self) -> Mat4 {
        self.projection
    }

    pub fn inv_projection(&self) -> Mat4 {
        self.inv_projection
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection * self.view
    }

    pub fn near(&self) -> f32 {
        self.near
    }

    pub fn far(&self) -> f32 {
        self.far
    }

    pub fn fov_y(&self) -> f32 {
        self.fov_y_radians
    }

    pub fn aspect(&self) -> f32 {
        self.aspect
    }

    /// Inverse of projection · rotation-only view, mapping clip space to world directions.
    pub fn inv_sky_view_projection(&self) -> Mat4 {
        let mut rotation_only = self.view;
        rotation_only.w_axis = Vec4::W;
        (self.projection * rotation_only).inverse()
    }

    /// Conservative sphere test against the six frustum planes.
    pub fn sphere_in_frustum(&self, center: Vec3, radius: f32) -> bool {
        let m = self.view_projection();
        let rows = [m.row(0), m.row(1), m.row(2), m.row(3)];
        let planes = [
            rows[3] + rows[0],
            rows[3] - rows[0],
            rows[3] + rows[1],
            rows[3] - rows[1],
            rows[2],
            rows[3] - rows[2],
        ];
        let point = center.extend(1.0);
        planes.iter().all(|plane| {
            let normal_len = plane.truncate().length();
            normal_len <= f32::EPSILON || plane.dot(point) / normal_len >= -radius
        })
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(60f32.to_radians(), 16.0 / 9.0, 0.1, 100.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Quat;

    #[test]
    fn inverses_track_setters() {
        let mut cam = Camera::default();
        cam.set_transform(Transform::look_at(
            Vec3::new(3.0, -4.0, 20.0),
            Vec3::ZERO,
            Vec3::Y,
        ));
        assert!((cam.view() * cam.inv_view()).abs_diff_eq(Mat4::IDENTITY, 1e-4));

        cam.set_projection_params(0.45 * std::f32::consts::PI, 1.0, 100.0);
        assert!((cam.projection() * cam.inv_projection()).abs_diff_eq(Mat4::IDENTITY, 1e-4));

        cam.set_aspect(4.0 / 3.0);
        assert!((cam.projection() * cam.inv_projection()).abs_diff_eq(Mat4::IDENTITY, 1e-4));
    }

    #[test]
    fn view_is_inverse_of_camera_transform() {
        let mut cam = Camera::default();
        let tr = Transform::from_trs(Vec3::new(1.0, 2.0, 3.0), Quat::from_rotation_z(0.5), Vec3::ONE);
        cam.set_transform(tr);
        let eye_in_view = cam.view().transform_point3(tr.translation);
        assert!(eye_in_view.abs_diff_eq(Vec3::ZERO, 1e-5));
    }

    #[test]
    fn invalid_aspect_is_ignored() {
        let mut cam = Camera::default();
        let before = cam.projection();
        cam.set_aspect(0.0);
        assert_eq!(cam.projection(), before);
    }

    #[test]
    fn frustum_keeps_points_in_front_and_drops_points_behind() {
        let mut cam = Camera::default();
        cam.set_transform(Transform::look_at(Vec3::new(0.0, 0.0, 10.0), Vec3::ZERO, Vec3::Y));
        assert!(cam.sphere_in_frustum(Vec3::ZERO, 1.0));
        assert!(!cam.sphere_in_frustum(Vec3::new(0.0, 0.0, 20.0), 1.0));
        assert!(cam.sphere_in_frustum(Vec3::new(0.0, 0.0, 10.5), 1.0));
    }

    #[test]
    fn sky_directions_ignore_camera_position() {
        let mut a = Camera::default();
        let mut b = Camera::default();
        a.set_transform(Transform::from_translation(Vec3::ZERO));
        b.set_transform(Transform::from_translation(Vec3::new(50.0, -20.0, 8.0)));
        assert!(a
            .inv_sky_view_projection()
            .abs_diff_eq(b.inv_sky_view_projection(), 1e-4));
    }
}
