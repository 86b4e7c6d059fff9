use std::path::Path;

use rand::{Rng, SeedableRng};

use crate::renderer::assets::{GpuAsset, UploadToGpu};
use crate::renderer::context::GpuContext;

/// RGBA8 texels kept on the CPU until uploaded through the texture library.
#[derive(Clone, Debug)]
pub struct CpuTexture {
    pub width: u32,
    pub height: u32,
    pub texels: Vec<u8>,
    /// Linear data (normal maps, noise) skips the sRGB view format.
    pub linear: bool,
}

impl CpuTexture {
    pub fn from_rgba8(width: u32, height: u32, texels: Vec<u8>, linear: bool) -> Self {
        assert_eq!(
            texels.len(),
            (width * height * 4) as usize,
            "texel buffer does not match {width}x{height}"
        );
        Self {
            width,
            height,
            texels,
            linear,
        }
    }

    pub fn from_color(color: [u8; 4], linear: bool) -> Self {
        Self::from_rgba8(1, 1, color.to_vec(), linear)
    }

    pub fn white() -> Self {
        Self::from_color([255, 255, 255, 255], false)
    }

    /// Tangent-space normal pointing straight out of the surface.
    pub fn flat_normal() -> Self {
        Self::from_color([128, 128, 255, 255], true)
    }

    /// Random RGB bytes with opaque alpha, reproducible for a given seed.
    pub fn random(size: u32, seed: u64) -> Self {
        let mut rng = rand::rngs::SmallRng::seed_from_u64(seed);
        let mut texels = vec![0u8; (size * size * 4) as usize];
        for texel in texels.chunks_exact_mut(4) {
            texel[0] = rng.gen();
            texel[1] = rng.gen();
            texel[2] = rng.gen();
            texel[3] = 255;
        }
        Self::from_rgba8(size, size, texels, true)
    }

    pub fn checkerboard(size: u32, checker_size: u32, color1: [u8; 4], color2: [u8; 4]) -> Self {
        let checker_size = checker_size.max(1);
        let mut texels = vec![0u8; (size * size * 4) as usize];

        for y in 0..size {
            for x in 0..size {
                let is_color1 = ((x / checker_size) + (y / checker_size)) % 2 == 0;
                let color = if is_color1 { color1 } else { color2 };
                let idx = ((y * size + x) * 4) as usize;
                texels[idx..idx + 4].copy_from_slice(&color);
            }
        }

        Self::from_rgba8(size, size, texels, false)
    }

    pub fn from_path(path: impl AsRef<Path>, linear: bool) -> Result<Self, String> {
        let path = path.as_ref();
        log::info!("Loading texture: {:?}", path);

        let img =
            image::open(path).map_err(|e| format!("Failed to load image {:?}: {}", path, e))?;
        let rgba = img.to_rgba8();
        let (width, height) = rgba.dimensions();

        Ok(Self::from_rgba8(width, height, rgba.into_raw(), linear))
    }

    fn formats(linear: bool) -> (wgpu::TextureFormat, Option<wgpu::TextureFormat>) {
        if linear {
            (wgpu::TextureFormat::Rgba8Unorm, None)
        } else {
            (
                wgpu::TextureFormat::Rgba8Unorm,
                Some(wgpu::TextureFormat::Rgba8UnormSrgb),
            )
        }
    }
}

impl UploadToGpu for CpuTexture {
    type Gpu = GpuTexture;

    fn upload_to_gpu(&self, gpu: &GpuContext, label: &str) -> GpuTexture {
        let (format, view_format) = CpuTexture::formats(self.linear);
        let size = wgpu::Extent3d {
            width: self.width,
            height: self.height,
            depth_or_array_layers: 1,
        };
        let view_formats: Vec<wgpu::TextureFormat> = view_format.into_iter().collect();

        let texture = gpu.device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &view_formats,
        });

        write_layer(gpu, &texture, 0, self.width, self.height, &self.texels);

        let view = texture.create_view(&wgpu::TextureViewDescriptor {
            label: Some(label),
            format: view_format,
            ..Default::default()
        });

        GpuTexture::from_parts(texture, view)
    }
}

/// Six square faces in +X, -X, +Y, -Y, +Z, -Z order.
#[derive(Clone, Debug)]
pub struct CpuTextureCube {
    pub size: u32,
    pub faces: [Vec<u8>; 6],
    pub linear: bool,
}

impl CpuTextureCube {
    /// Vertical gradient sky for a Z-up world: `zenith` at +Z, `horizon` around the equator,
    /// `nadir` at -Z.
    pub fn gradient(size: u32, zenith: [u8; 3], horizon: [u8; 3], nadir: [u8; 3]) -> Self {
        let faces = std::array::from_fn(|face| {
            let mut texels = vec![0u8; (size * size * 4) as usize];
            for y in 0..size {
                for x in 0..size {
                    let u = (x as f32 + 0.5) / size as f32 * 2.0 - 1.0;
                    let v = (y as f32 + 0.5) / size as f32 * 2.0 - 1.0;
                    let dir = cube_face_direction(face, u, v).normalize();
                    let color = sky_color(dir.z, zenith, horizon, nadir);
                    let idx = ((y * size + x) * 4) as usize;
                    texels[idx..idx + 3].copy_from_slice(&color);
                    texels[idx + 3] = 255;
                }
            }
            texels
        });

        Self {
            size,
            faces,
            linear: false,
        }
    }
}

fn cube_face_direction(face: usize, u: f32, v: f32) -> glam::Vec3 {
    use glam::Vec3;
    match face {
        0 => Vec3::new(1.0, -v, -u),
        1 => Vec3::new(-1.0, -v, u),
        2 => Vec3::new(u, 1.0, v),
        3 => Vec3::new(u, -1.0, -v),
        4 => Vec3::new(u, -v, 1.0),
        _ => Vec3::new(-u, -v, -1.0),
    }
}

fn sky_color(height: f32, zenith: [u8; 3], horizon: [u8; 3], nadir: [u8; 3]) -> [u8; 3] {
    let (target, t) = if height >= 0.0 {
        (zenith, height)
    } else {
        (nadir, -height)
    };
    std::array::from_fn(|c| {
        let a = horizon[c] as f32;
        let b = target[c] as f32;
        (a + (b - a) * t.clamp(0.0, 1.0)).round() as u8
    })
}

impl UploadToGpu for CpuTextureCube {
    type Gpu = GpuTextureCube;

    fn upload_to_gpu(&self, gpu: &GpuContext, label: &str) -> GpuTextureCube {
        let (format, view_format) = CpuTexture::formats(self.linear);
        let view_formats: Vec<wgpu::TextureFormat> = view_format.into_iter().collect();

        let texture = gpu.device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width: self.size,
                height: self.size,
                depth_or_array_layers: 6,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &view_formats,
        });

        for (layer, face) in self.faces.iter().enumerate() {
            write_layer(gpu, &texture, layer as u32, self.size, self.size, face);
        }

        let view = texture.create_view(&wgpu::TextureViewDescriptor {
            label: Some(label),
            format: view_format,
            dimension: Some(wgpu::TextureViewDimension::Cube),
            array_layer_count: Some(6),
            ..Default::default()
        });

        GpuTextureCube(GpuTexture::from_parts(texture, view))
    }
}

fn write_layer(
    gpu: &GpuContext,
    texture: &wgpu::Texture,
    layer: u32,
    width: u32,
    height: u32,
    texels: &[u8],
) {
    gpu.queue.write_texture(
        wgpu::TexelCopyTextureInfo {
            texture,
            mip_level: 0,
            origin: wgpu::Origin3d {
                x: 0,
                y: 0,
                z: layer,
            },
            aspect: wgpu::TextureAspect::All,
        },
        texels,
        wgpu::TexelCopyBufferLayout {
            offset: 0,
            bytes_per_row: Some(4 * width),
            rows_per_image: Some(height),
        },
        wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
    );
}

#[derive(Clone, Debug)]
struct TextureParts {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
}

/// Texture handle with an invalid state. Clones share the underlying texture.
#[derive(Clone, Debug, Default)]
pub struct GpuTexture {
    parts: Option<TextureParts>,
}

impl GpuTexture {
    pub fn invalid() -> Self {
        Self { parts: None }
    }

    pub fn from_parts(texture: wgpu::Texture, view: wgpu::TextureView) -> Self {
        Self {
            parts: Some(TextureParts { texture, view }),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.parts.is_some()
    }

    /// Panics on an invalid texture: sampling one is a programming error.
    pub fn view(&self) -> &wgpu::TextureView {
        &self
            .parts
            .as_ref()
            .expect("binding an invalid texture")
            .view
    }

    pub fn texture(&self) -> Option<&wgpu::Texture> {
        self.parts.as_ref().map(|parts| &parts.texture)
    }

    pub fn release(&mut self) {
        self.parts = None;
    }
}

#[derive(Clone, Debug, Default)]
pub struct GpuTextureCube(GpuTexture);

impl GpuTextureCube {
    pub fn is_valid(&self) -> bool {
        self.0.is_valid()
    }

    pub fn view(&self) -> &wgpu::TextureView {
        self.0.view()
    }

    pub fn release(&mut self) {
        self.0.release();
    }
}

impl GpuAsset for GpuTexture {
    fn is_valid(&self) -> bool {
        GpuTexture::is_valid(self)
    }

    fn release(&mut self) {
        GpuTexture::release(self)
    }
}

impl GpuAsset for GpuTextureCube {
    fn is_valid(&self) -> bool {
        GpuTextureCube::is_valid(self)
    }

    fn release(&mut self) {
        GpuTextureCube::release(self)
    }
}
