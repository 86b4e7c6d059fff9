use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3, Vec4};

use crate::renderer::constants::{DIR_LIGHT_COUNT, POINT_LIGHT_COUNT};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DirectionalLight {
    pub color: Vec3,
    /// Direction the light travels in, world space.
    pub direction: Vec3,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointLight {
    pub position: Vec3,
    pub radius: f32,
    pub color: Vec3,
    /// Constant, linear and quadratic attenuation factors.
    pub attenuation: Vec3,
}

impl Default for DirectionalLight {
    fn default() -> Self {
        Self {
            color: Vec3::ZERO,
            direction: Vec3::NEG_Z,
        }
    }
}

impl Default for PointLight {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            radius: 1.0,
            color: Vec3::ZERO,
            attenuation: Vec3::new(1.0, 0.0, 0.0),
        }
    }
}

/// Every light in the scene. Written by the simulation, read by the renderer.
#[derive(Clone, Debug, Default)]
pub struct SceneLighting {
    pub ambient: Vec3,
    pub directional: [DirectionalLight; DIR_LIGHT_COUNT],
    pub point: [PointLight; POINT_LIGHT_COUNT],
}

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable, Debug, PartialEq)]
pub struct DirectionalLightRaw {
    pub color: [f32; 4],
    pub direction: [f32; 4],
}

impl DirectionalLightRaw {
    /// `transform` maps the world direction into the space the shader works in.
    pub fn from_light(light: &DirectionalLight, transform: Mat4) -> Self {
        let direction = transform.transform_vector3(light.direction).normalize_or_zero();
        Self {
            color: light.color.extend(0.0).to_array(),
            direction: direction.extend(0.0).to_array(),
        }
    }
}

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable, Debug, PartialEq)]
pub struct PointLightRaw {
    pub position_radius: [f32; 4],
    pub color: [f32; 4],
    pub attenuation: [f32; 4],
}

impl PointLightRaw {
    /// `transform` maps the world position into the space the shader works in.
    pub fn from_light(light: &PointLight, transform: Mat4) -> Self {
        let position = transform.transform_point3(light.position);
        Self {
            position_radius: position.extend(light.radius).to_array(),
            color: light.color.extend(0.0).to_array(),
            attenuation: light.attenuation.extend(0.0).to_array(),
        }
    }
}

/// CPU mirror of the shader's point-light falloff. The denominator is clamped to 1 so a light
/// never amplifies its own color near the centre.
/// Lambert plus Blinn-Phong for normalized `to_light` and `to_eye`; `specular.w` is the
/// exponent. Same formula as `shade` in the common shader code.
pub fn blinn_phong(
    normal: Vec3,
    to_light: Vec3,
    to_eye: Vec3,
    light_color: Vec3,
    albedo: Vec3,
    specular: Vec4,
) -> Vec3 {
    let n_dot_l = normal.dot(to_light).max(0.0);
    if n_dot_l <= 0.0 {
        return Vec3::ZERO;
    }
    let half = (to_light + to_eye).normalize();
    let spec = normal.dot(half).max(0.0).powf(specular.w.max(1.0));
    light_color * (albedo * n_dot_l + specular.truncate() * spec)
}

pub fn point_light_attenuation(attenuation: Vec3, radius: f32, distance: f32) -> f32 {
    let falloff = attenuation.x + attenuation.y * distance + attenuation.z * distance * distance;
    let window = (1.0 - distance / radius).clamp(0.0, 1.0);
    window / falloff.max(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn head_on_light_gives_full_diffuse_and_specular() {
        let lit = blinn_phong(
            Vec3::Z,
            Vec3::Z,
            Vec3::Z,
            Vec3::splat(0.5),
            Vec3::new(1.0, 0.5, 0.25),
            Vec4::new(1.0, 1.0, 1.0, 16.0),
        );
        assert!(lit.abs_diff_eq(Vec3::new(1.0, 0.75, 0.625), 1e-6));
    }

    #[test]
    fn light_from_behind_contributes_nothing() {
        let lit = blinn_phong(Vec3::Z, Vec3::NEG_Z, Vec3::Z, Vec3::ONE, Vec3::ONE, Vec4::splat(1.0));
        assert_eq!(lit, Vec3::ZERO);
    }

    #[test]
    fn raw_lights_are_vec4_aligned() {
        assert_eq!(std::mem::size_of::<DirectionalLightRaw>(), 32);
        assert_eq!(std::mem::size_of::<PointLightRaw>(), 48);
    }

    #[test]
    fn view_space_direction_is_normalized() {
        let light = DirectionalLight {
            color: Vec3::ONE,
            direction: Vec3::new(-0.5, 0.0, -1.0),
        };
        let view = Mat4::look_at_rh(Vec3::new(0.0, 0.0, 10.0), Vec3::ZERO, Vec3::Y);
        let raw = DirectionalLightRaw::from_light(&light, view);
        let dir = Vec3::from_slice(&raw.direction[..3]);
        assert!((dir.length() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn point_light_keeps_radius_in_w() {
        let light = PointLight {
            position: Vec3::new(1.0, 2.0, 3.0),
            radius: 8.0,
            color: Vec3::X,
            attenuation: Vec3::Y,
        };
        let raw = PointLightRaw::from_light(&light, Mat4::IDENTITY);
        assert_eq!(raw.position_radius, [1.0, 2.0, 3.0, 8.0]);
    }

    #[test]
    fn attenuation_reaches_zero_at_radius() {
        let att = Vec3::new(0.0, 1.0, 0.0);
        assert_eq!(point_light_attenuation(att, 8.0, 8.0), 0.0);
        assert_eq!(point_light_attenuation(att, 8.0, 12.0), 0.0);
        assert!(point_light_attenuation(att, 8.0, 2.0) > point_light_attenuation(att, 8.0, 4.0));
        assert!(point_light_attenuation(att, 8.0, 0.0) <= 1.0);
    }
}
