use glam::{Mat4, Quat, Vec3};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            translation: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    /// T · R · S
    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }

    pub fn from_trs(t: Vec3, r: Quat, s: Vec3) -> Self {
        Self {
            translation: t,
            rotation: r,
            scale: s,
        }
    }

    pub fn from_translation(t: Vec3) -> Self {
        Self {
            translation: t,
            ..Self::default()
        }
    }

    /// Transform undoing this one. Exact for uniform scale; non-uniform scale with rotation
    /// has no TRS inverse, so the scale is inverted component-wise.
    pub fn inverse(&self) -> Self {
        let rotation = self.rotation.inverse();
        let scale = self.scale.recip();
        let translation = -(rotation * self.translation) * scale;
        Self {
            translation,
            rotation,
            scale,
        }
    }

    /// Local -Z in world space, the direction a camera with this transform looks along.
    pub fn forward(&self) -> Vec3 {
        self.rotation * Vec3::NEG_Z
    }

    pub fn look_at(eye: Vec3, target: Vec3, up: Vec3) -> Self {
        let view = Mat4::look_at_rh(eye, target, up);
        let (_, rotation, translation) = view.inverse().to_scale_rotation_translation();
        Self {
            translation,
            rotation,
            scale: Vec3::ONE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_identity() {
        let m = Transform::default().matrix();
        assert!(m.abs_diff_eq(Mat4::IDENTITY, 1e-6));
    }

    #[test]
    fn translate_then_scale_ok() {
        let tr = Transform::from_trs(Vec3::new(1.0, 2.0, 3.0), Quat::IDENTITY, Vec3::splat(2.0));
        let p = tr.matrix().transform_point3(Vec3::new(1.0, 0.0, 0.0));
        // (1,0,0) -> (2,0,0) -> (3,2,3)
        assert!(p.abs_diff_eq(Vec3::new(3.0, 2.0, 3.0), 1e-6));
    }

    #[test]
    fn inverse_matches_matrix_inverse() {
        let tr = Transform::from_trs(
            Vec3::new(4.0, -2.0, 7.0),
            Quat::from_rotation_z(0.7) * Quat::from_rotation_x(-0.3),
            Vec3::splat(3.0),
        );
        let expected = tr.matrix().inverse();
        assert!(tr.inverse().matrix().abs_diff_eq(expected, 1e-5));
        assert!((tr.matrix() * tr.inverse().matrix()).abs_diff_eq(Mat4::IDENTITY, 1e-5));
    }

    #[test]
    fn look_at_points_forward_at_target() {
        let tr = Transform::look_at(Vec3::new(0.0, 0.0, 50.0), Vec3::ZERO, Vec3::Y);
        assert!(tr.forward().abs_diff_eq(Vec3::NEG_Z, 1e-5));
        assert!(tr.translation.abs_diff_eq(Vec3::new(0.0, 0.0, 50.0), 1e-4));
    }
}
