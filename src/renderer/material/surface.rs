use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec2, Vec3};

use crate::renderer::assets::Assets;
use crate::renderer::context::GpuContext;
use crate::renderer::gpu::{CpuTexture, GpuTexture};

pub const DEFAULT_DIFFUSE_TEXTURE: &str = "DefaultDiffuseTexture";
pub const DEFAULT_NORMAL_TEXTURE: &str = "DefaultNormalTexture";
pub const DEFAULT_SPECULAR_TEXTURE: &str = "DefaultSpecularTexture";

static NEXT_MATERIAL_ID: AtomicU64 = AtomicU64::new(1);

/// Per-object surface parameters shared by the forward and G-buffer materials.
///
/// The maps are fixed at construction; cached texture bind groups are keyed by [`Self::id`].
#[derive(Debug)]
pub struct SurfaceMaterial {
    id: u64,
    pub specular: Vec3,
    pub specular_exponent: f32,
    pub tex_scale: Vec2,
    pub tex_translate: Vec2,
    diffuse_map: Option<GpuTexture>,
    normal_map: Option<GpuTexture>,
    specular_map: Option<GpuTexture>,
}

impl SurfaceMaterial {
    pub fn new(specular: Vec3, specular_exponent: f32) -> Self {
        Self {
            id: NEXT_MATERIAL_ID.fetch_add(1, Ordering::Relaxed),
            specular,
            specular_exponent,
            tex_scale: Vec2::ONE,
            tex_translate: Vec2::ZERO,
            diffuse_map: None,
            normal_map: None,
            specular_map: None,
        }
    }

    pub fn with_diffuse_map(mut self, map: GpuTexture) -> Self {
        self.diffuse_map = Some(map);
        self
    }

    pub fn with_normal_map(mut self, map: GpuTexture) -> Self {
        self.normal_map = Some(map);
        self
    }

    pub fn with_specular_map(mut self, map: GpuTexture) -> Self {
        self.specular_map = Some(map);
        self
    }

    pub fn with_tex_transform(mut self, scale: Vec2, translate: Vec2) -> Self {
        self.tex_scale = scale;
        self.tex_translate = translate;
        self
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    /// Diffuse, normal and specular maps with missing ones replaced by the 1×1 defaults.
    pub fn resolved_maps(&self, defaults: &SurfaceDefaults) -> [GpuTexture; 3] {
        [
            self.diffuse_map.clone().unwrap_or_else(|| defaults.diffuse.clone()),
            self.normal_map.clone().unwrap_or_else(|| defaults.normal.clone()),
            self.specular_map.clone().unwrap_or_else(|| defaults.specular.clone()),
        ]
    }
}

/// Shared 1×1 fallbacks for materials without their own maps, held by the texture library.
#[derive(Clone, Debug)]
pub struct SurfaceDefaults {
    diffuse: GpuTexture,
    normal: GpuTexture,
    specular: GpuTexture,
}

impl SurfaceDefaults {
    pub fn load(gpu: &GpuContext, assets: &mut Assets) -> Self {
        Self {
            diffuse: assets
                .textures
                .get_or_add(gpu, DEFAULT_DIFFUSE_TEXTURE, CpuTexture::white),
            normal: assets
                .textures
                .get_or_add(gpu, DEFAULT_NORMAL_TEXTURE, CpuTexture::flat_normal),
            specular: assets
                .textures
                .get_or_add(gpu, DEFAULT_SPECULAR_TEXTURE, CpuTexture::white),
        }
    }
}

impl Default for SurfaceMaterial {
    fn default() -> Self {
        Self::new(Vec3::ONE, 32.0)
    }
}

/// Sampler plus diffuse, normal and specular maps at bindings 0..=3.
pub(crate) fn surface_texture_layout(device: &wgpu::Device, label: &str) -> wgpu::BindGroupLayout {
    let filterable = wgpu::TextureSampleType::Float { filterable: true };
    let d2 = wgpu::TextureViewDimension::D2;
    super::bind_group_layout(
        device,
        label,
        &[
            super::sampler_entry(0, wgpu::SamplerBindingType::Filtering),
            super::texture_entry(1, filterable, d2),
            super::texture_entry(2, filterable, d2),
            super::texture_entry(3, filterable, d2),
        ],
    )
}

/// Texture bind groups of the surface materials drawn by one pass, keyed by material id.
/// Groups of materials not drawn since the last [`begin_frame`](Self::begin_frame) are dropped
/// by [`evict_undrawn`](Self::evict_undrawn).
pub(crate) struct SurfaceTextureGroups<G = wgpu::BindGroup> {
    groups: HashMap<u64, G>,
    drawn: HashSet<u64>,
}

impl<G> Default for SurfaceTextureGroups<G> {
    fn default() -> Self {
        Self {
            groups: HashMap::new(),
            drawn: HashSet::new(),
        }
    }
}

impl SurfaceTextureGroups {
    pub(crate) fn prepare(
        &mut self,
        gpu: &GpuContext,
        layout: &wgpu::BindGroupLayout,
        sampler: &wgpu::Sampler,
        defaults: &SurfaceDefaults,
        material: &SurfaceMaterial,
    ) {
        self.get_or_create(material.id(), || {
            let [diffuse, normal, specular] = material.resolved_maps(defaults);
            gpu.device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("SurfaceTextures"),
                layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: wgpu::BindingResource::Sampler(sampler),
                    },
                    super::view_entry(1, diffuse.view()),
                    super::view_entry(2, normal.view()),
                    super::view_entry(3, specular.view()),
                ],
            })
        });
    }
}

impl<G> SurfaceTextureGroups<G> {
    pub(crate) fn begin_frame(&mut self) {
        self.drawn.clear();
    }

    /// Marks `material_id` drawn this frame, creating its group on first use.
    pub(crate) fn get_or_create(&mut self, material_id: u64, create: impl FnOnce() -> G) -> &G {
        self.drawn.insert(material_id);
        self.groups.entry(material_id).or_insert_with(create)
    }

    pub(crate) fn evict_undrawn(&mut self) {
        let drawn = &self.drawn;
        self.groups.retain(|id, _| drawn.contains(id));
    }

    pub(crate) fn get(&self, material_id: u64) -> &G {
        self.groups
            .get(&material_id)
            .expect("surface textures drawn before being prepared")
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.groups.len()
    }

    pub(crate) fn clear(&mut self) {
        self.groups.clear();
        self.drawn.clear();
    }
}

/// Per-draw block shared by the surface materials.
#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable, Debug, PartialEq)]
pub struct ObjectUniform {
    pub world: [[f32; 4]; 4],
    pub view_world: [[f32; 4]; 4],
    /// rgb specular color, a exponent
    pub specular: [f32; 4],
    /// xy scale, zw translate
    pub tex_scale_translate: [f32; 4],
}

impl ObjectUniform {
    pub fn new(world: Mat4, view: Mat4, material: &SurfaceMaterial) -> Self {
        Self {
            world: world.to_cols_array_2d(),
            view_world: (view * world).to_cols_array_2d(),
            specular: material.specular.extend(material.specular_exponent).to_array(),
            tex_scale_translate: [
                material.tex_scale.x,
                material.tex_scale.y,
                material.tex_translate.x,
                material.tex_translate.y,
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn materials_get_unique_ids() {
        let a = SurfaceMaterial::default();
        let b = SurfaceMaterial::default();
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn undrawn_materials_lose_their_texture_groups() {
        let mut groups = SurfaceTextureGroups::<u64>::default();
        for frame in 0..100u64 {
            groups.begin_frame();
            groups.get_or_create(1, || 1);
            groups.get_or_create(1000 + frame, || frame);
            groups.evict_undrawn();
            assert_eq!(groups.len(), 2);
        }
        assert_eq!(*groups.get(1), 1);
        assert_eq!(*groups.get(1099), 99);
    }

    #[test]
    fn groups_are_created_once_while_drawn() {
        let mut groups = SurfaceTextureGroups::<u32>::default();
        let mut created = 0;
        for _ in 0..3 {
            groups.begin_frame();
            groups.get_or_create(7, || {
                created += 1;
                created
            });
            groups.evict_undrawn();
        }
        assert_eq!(created, 1);
        assert_eq!(*groups.get(7), 1);
    }

    #[test]
    fn object_uniform_packs_material_parameters() {
        let material = SurfaceMaterial::new(Vec3::new(0.2, 0.3, 0.4), 28.0)
            .with_tex_transform(Vec2::splat(4.0), Vec2::new(0.5, 0.0));
        let uniform = ObjectUniform::new(Mat4::IDENTITY, Mat4::IDENTITY, &material);
        assert_eq!(uniform.specular, [0.2, 0.3, 0.4, 28.0]);
        assert_eq!(uniform.tex_scale_translate, [4.0, 4.0, 0.5, 0.0]);
        assert_eq!(std::mem::size_of::<ObjectUniform>(), 160);
    }

    #[test]
    fn view_world_composes_view_after_world() {
        let world = Mat4::from_translation(Vec3::X);
        let view = Mat4::from_translation(Vec3::new(0.0, 0.0, -10.0));
        let uniform = ObjectUniform::new(world, view, &SurfaceMaterial::default());
        let m = Mat4::from_cols_array_2d(&uniform.view_world);
        assert!(m
            .transform_point3(Vec3::ZERO)
            .abs_diff_eq(Vec3::new(1.0, 0.0, -10.0), 1e-6));
    }
}
