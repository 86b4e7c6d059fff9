//! Materials: a program plus the uniform blocks and textures it reads.
//!
//! Resources that are the same for every instance of a material kind (programs, layouts,
//! samplers, constant blocks) live in the kind's `Shared` state, handed out by the
//! [`MaterialResourceCache`]. Bind group slots are the same for every material:
//!
//! | group | contents |
//! |-------|----------|
//! | 0 | scene block, written once per frame, plus constant blocks |
//! | 1 | per-instance block, one dynamic-offset slot per draw |
//! | 2 | the material's own textures |
//! | 3 | inputs produced by earlier passes (G-buffer, AO, shadow maps) |
//!
//! Materials without an instance block or textures of their own compact the remaining groups:
//! full-screen materials read pass inputs at [`SCREEN_INPUT_GROUP`], the point-light volumes at
//! group 2.
//!
//! Binding order in a pass is program, scene block, instance block, textures.

mod blur;
mod cache;
mod dir_light;
mod forward;
mod gbuffer;
mod point_light;
mod shadow;
mod skybox;
mod ssao;
mod surface;

pub use blur::{BlurDirection, EdgeBlurMaterial, EdgeBlurSceneUniform};
pub use cache::MaterialResourceCache;
pub use dir_light::{DirLightMaterial, DirLightSceneUniform};
pub use forward::{ForwardMaterial, ForwardSceneUniform};
pub use gbuffer::{GBufferMaterial, GBufferSceneUniform};
pub use point_light::{PointLightInstanceUniform, PointLightMaterial, PointLightSceneUniform};
pub use shadow::ShadowMaterial;
pub use skybox::{SkyBoxMaterial, SkyBoxSceneUniform, SkyBoxVariant};
pub use ssao::{SsaoMaterial, SsaoSceneUniform, RANDOM_DIRECTIONS_TEXTURE};
pub use surface::{
    ObjectUniform, SurfaceDefaults, SurfaceMaterial, DEFAULT_DIFFUSE_TEXTURE, DEFAULT_NORMAL_TEXTURE,
    DEFAULT_SPECULAR_TEXTURE,
};

use crate::renderer::assets::Assets;
use crate::renderer::constants::DIR_LIGHT_COUNT;
use crate::renderer::context::GpuContext;
use crate::renderer::gpu::{GpuShader, ShaderSource};
use crate::renderer::passes::ShadowOutputs;

pub const SCENE_GROUP: u32 = 0;
pub const INSTANCE_GROUP: u32 = 1;
pub const TEXTURE_GROUP: u32 = 2;
pub const INPUT_GROUP: u32 = 3;
pub const SCREEN_INPUT_GROUP: u32 = 1;

/// Stable key of a material kind in the resource cache.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MaterialKind {
    Forward,
    GBufferBuild,
    DirLightShading,
    PointLightShading,
    ShadowDepth,
    Ssao,
    EdgeBlur,
    SkyBox,
}

pub trait MaterialType {
    const KIND: MaterialKind;
    type Shared: 'static;

    fn create_shared(gpu: &GpuContext, assets: &mut Assets) -> Self::Shared;
}

const COMMON_WGSL: &str = include_str!("../../shader/common.wgsl");

/// Common helpers, then the generated `snippets`, then `body`.
pub(crate) fn compose_source(snippets: &[&str], body: &str) -> ShaderSource {
    let mut wgsl = String::from(COMMON_WGSL);
    for snippet in snippets {
        wgsl.push('\n');
        wgsl.push_str(snippet);
    }
    wgsl.push('\n');
    wgsl.push_str(body);
    ShaderSource::new(wgsl)
}

/// Compiles `body` (with the common helpers and any generated `snippets`) through the shader
/// library, so every material of a kind shares one module.
pub(crate) fn load_shader(
    gpu: &GpuContext,
    assets: &mut Assets,
    name: &str,
    snippets: &[&str],
    body: &str,
) -> GpuShader {
    assets
        .shaders
        .get_or_add(gpu, name, || compose_source(snippets, body))
}

pub(crate) fn pipeline_layout(
    device: &wgpu::Device,
    label: &str,
    groups: &[&wgpu::BindGroupLayout],
) -> wgpu::PipelineLayout {
    device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some(label),
        bind_group_layouts: groups,
        push_constant_ranges: &[],
    })
}

pub(crate) fn bind_group_layout(
    device: &wgpu::Device,
    label: &str,
    entries: &[wgpu::BindGroupLayoutEntry],
) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some(label),
        entries,
    })
}

pub(crate) fn texture_entry(
    binding: u32,
    sample_type: wgpu::TextureSampleType,
    view_dimension: wgpu::TextureViewDimension,
) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Texture {
            sample_type,
            view_dimension,
            multisampled: false,
        },
        count: None,
    }
}

/// Render-target input read with `textureLoad`.
pub(crate) fn unfiltered_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    texture_entry(
        binding,
        wgpu::TextureSampleType::Float { filterable: false },
        wgpu::TextureViewDimension::D2,
    )
}

pub(crate) fn depth_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    texture_entry(
        binding,
        wgpu::TextureSampleType::Depth,
        wgpu::TextureViewDimension::D2,
    )
}

pub(crate) fn sampler_entry(binding: u32, ty: wgpu::SamplerBindingType) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Sampler(ty),
        count: None,
    }
}

pub(crate) fn view_entry(binding: u32, view: &wgpu::TextureView) -> wgpu::BindGroupEntry<'_> {
    wgpu::BindGroupEntry {
        binding,
        resource: wgpu::BindingResource::TextureView(view),
    }
}

pub(crate) fn repeat_sampler(device: &wgpu::Device, label: &str) -> wgpu::Sampler {
    device.create_sampler(&wgpu::SamplerDescriptor {
        label: Some(label),
        address_mode_u: wgpu::AddressMode::Repeat,
        address_mode_v: wgpu::AddressMode::Repeat,
        address_mode_w: wgpu::AddressMode::Repeat,
        mag_filter: wgpu::FilterMode::Linear,
        min_filter: wgpu::FilterMode::Linear,
        mipmap_filter: wgpu::FilterMode::Nearest,
        ..Default::default()
    })
}

/// Hardware-interpolated depth comparison, the 2×2 lerp filtering of the shadow lookup.
pub(crate) fn shadow_sampler(device: &wgpu::Device) -> wgpu::Sampler {
    device.create_sampler(&wgpu::SamplerDescriptor {
        label: Some("ShadowComparisonSampler"),
        address_mode_u: wgpu::AddressMode::ClampToEdge,
        address_mode_v: wgpu::AddressMode::ClampToEdge,
        address_mode_w: wgpu::AddressMode::ClampToEdge,
        mag_filter: wgpu::FilterMode::Linear,
        min_filter: wgpu::FilterMode::Linear,
        mipmap_filter: wgpu::FilterMode::Nearest,
        compare: Some(wgpu::CompareFunction::LessEqual),
        ..Default::default()
    })
}

/// Layout entries for the comparison sampler followed by one depth texture per directional
/// light, starting at `first_binding`.
pub(crate) fn shadow_layout_entries(first_binding: u32) -> Vec<wgpu::BindGroupLayoutEntry> {
    let mut entries = vec![sampler_entry(
        first_binding,
        wgpu::SamplerBindingType::Comparison,
    )];
    entries.extend((0..DIR_LIGHT_COUNT as u32).map(|i| depth_entry(first_binding + 1 + i)));
    entries
}

pub(crate) fn shadow_bind_entries(
    first_binding: u32,
    shadows: &ShadowOutputs,
) -> Vec<wgpu::BindGroupEntry<'_>> {
    let mut entries = vec![wgpu::BindGroupEntry {
        binding: first_binding,
        resource: wgpu::BindingResource::Sampler(shadows.sampler()),
    }];
    entries.extend(
        shadows
            .lights()
            .iter()
            .enumerate()
            .map(|(i, light)| view_entry(first_binding + 1 + i as u32, &light.view)),
    );
    entries
}

/// WGSL declarations matching [`shadow_layout_entries`], plus
/// `dir_shadow_visibility(light, coord)` returning the lit fraction for a shadow-map coordinate
/// (uv in xy, biased reference depth in z).
pub(crate) fn shadow_sampling_wgsl(group: u32, first_binding: u32) -> String {
    let mut out = format!(
        "@group({group}) @binding({first_binding}) var dir_shadow_sampler: sampler_comparison;\n"
    );
    for i in 0..DIR_LIGHT_COUNT as u32 {
        out.push_str(&format!(
            "@group({group}) @binding({}) var dir_shadow_map_{i}: texture_depth_2d;\n",
            first_binding + 1 + i
        ));
    }
    out.push_str("fn dir_shadow_visibility(light: u32, coord: vec3<f32>) -> f32 {\n");
    out.push_str("    if (any(coord.xy < vec2<f32>(0.0)) || any(coord.xy > vec2<f32>(1.0)) || coord.z > 1.0) {\n");
    out.push_str("        return 1.0;\n    }\n    var visibility = 1.0;\n    switch light {\n");
    for i in 0..DIR_LIGHT_COUNT {
        out.push_str(&format!(
            "        case {i}u: {{ visibility = textureSampleCompareLevel(dir_shadow_map_{i}, dir_shadow_sampler, coord.xy, coord.z); }}\n"
        ));
    }
    out.push_str("        default: {}\n    }\n    return visibility;\n}\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shadow_snippet_declares_one_map_per_light() {
        let wgsl = shadow_sampling_wgsl(3, 5);
        assert!(wgsl.contains("@group(3) @binding(5) var dir_shadow_sampler: sampler_comparison;"));
        for i in 0..DIR_LIGHT_COUNT {
            assert!(wgsl.contains(&format!("var dir_shadow_map_{i}: texture_depth_2d;")));
            assert!(wgsl.contains(&format!("case {i}u:")));
        }
        assert_eq!(shadow_layout_entries(5).len(), DIR_LIGHT_COUNT + 1);
    }

    #[test]
    fn material_kinds_are_distinct_keys() {
        use std::collections::HashSet;
        let kinds = [
            MaterialKind::Forward,
            MaterialKind::GBufferBuild,
            MaterialKind::DirLightShading,
            MaterialKind::PointLightShading,
            MaterialKind::ShadowDepth,
            MaterialKind::Ssao,
            MaterialKind::EdgeBlur,
            MaterialKind::SkyBox,
        ];
        assert_eq!(kinds.iter().collect::<HashSet<_>>().len(), kinds.len());
    }

    #[test]
    fn every_material_shader_validates() {
        use wgpu::naga;

        let forward_shadows = shadow_sampling_wgsl(INPUT_GROUP, 0);
        let dir_shadows = shadow_sampling_wgsl(SCREEN_INPUT_GROUP, dir_light::SHADOW_BINDING);
        let shaders: [(&str, Vec<&str>, &str); 8] = [
            ("forward", vec![forward_shadows.as_str()], include_str!("../../shader/forward.wgsl")),
            ("gbuffer", vec![], include_str!("../../shader/gbuffer.wgsl")),
            ("dir_light", vec![dir_shadows.as_str()], include_str!("../../shader/dir_light.wgsl")),
            ("point_light", vec![], include_str!("../../shader/point_light.wgsl")),
            ("shadow", vec![], include_str!("../../shader/shadow.wgsl")),
            ("ssao", vec![], include_str!("../../shader/ssao.wgsl")),
            ("blur", vec![], include_str!("../../shader/blur.wgsl")),
            ("skybox", vec![], include_str!("../../shader/skybox.wgsl")),
        ];

        for (name, snippets, body) in shaders {
            let text = compose_source(&snippets, body).compiled_text();
            let module = naga::front::wgsl::parse_str(&text)
                .unwrap_or_else(|e| panic!("{name} failed to parse:\n{}", e.emit_to_string(&text)));
            naga::valid::Validator::new(
                naga::valid::ValidationFlags::all(),
                naga::valid::Capabilities::all(),
            )
            .validate(&module)
            .unwrap_or_else(|e| panic!("{name} failed to validate: {e:?}"));
        }
    }

    #[test]
    fn common_lighting_helpers_keep_their_signatures() {
        use wgpu::naga;

        let text = compose_source(&[], "").compiled_text();
        let module = naga::front::wgsl::parse_str(&text).expect("common helpers parse");
        let arity = |name: &str| {
            module
                .functions
                .iter()
                .find(|(_, f)| f.name.as_deref() == Some(name))
                .map(|(_, f)| f.arguments.len())
        };
        // CPU counterparts: lights::blinn_phong and lights::point_light_attenuation
        assert_eq!(arity("shade"), Some(6));
        assert_eq!(arity("point_attenuation"), Some(3));
        assert_eq!(arity("shadow_coord"), Some(3));
    }
}
