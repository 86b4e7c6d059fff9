use crate::renderer::assets::{GpuAsset, UploadToGpu};
use crate::renderer::constants::wgsl_prelude;
use crate::renderer::context::GpuContext;

/// WGSL text awaiting compilation. The shared constants header is prepended on upload.
#[derive(Clone, Debug)]
pub struct ShaderSource {
    pub wgsl: String,
}

impl ShaderSource {
    pub fn new(wgsl: impl Into<String>) -> Self {
        Self { wgsl: wgsl.into() }
    }

    /// The text handed to the compiler: constants header followed by the source.
    pub fn compiled_text(&self) -> String {
        format!("{}\n{}", wgsl_prelude(), self.wgsl)
    }
}

impl UploadToGpu for ShaderSource {
    type Gpu = GpuShader;

    fn upload_to_gpu(&self, gpu: &GpuContext, label: &str) -> GpuShader {
        let source = self.compiled_text();

        let result = validated(&gpu.device, || {
            gpu.device
                .create_shader_module(wgpu::ShaderModuleDescriptor {
                    label: Some(label),
                    source: wgpu::ShaderSource::Wgsl(source.into()),
                })
        });

        match result {
            Ok(module) => GpuShader {
                label: label.to_owned(),
                module: Some(module),
            },
            Err(message) => {
                log::error!("Shader {label} failed to compile:\n{message}");
                GpuShader {
                    label: label.to_owned(),
                    module: None,
                }
            }
        }
    }
}

/// Compiled shader module, or the invalid sentinel when compilation failed.
#[derive(Clone, Debug)]
pub struct GpuShader {
    label: String,
    module: Option<wgpu::ShaderModule>,
}

impl GpuShader {
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn is_valid(&self) -> bool {
        self.module.is_some()
    }

    pub fn module(&self) -> Option<&wgpu::ShaderModule> {
        self.module.as_ref()
    }

    pub fn release(&mut self) {
        self.module = None;
    }
}

impl GpuAsset for GpuShader {
    fn is_valid(&self) -> bool {
        GpuShader::is_valid(self)
    }

    fn release(&mut self) {
        GpuShader::release(self)
    }
}

/// A linked render pipeline. Failure to link leaves it invalid; binding an invalid program
/// panics.
#[derive(Clone, Debug)]
pub struct GpuProgram {
    label: String,
    pipeline: Option<wgpu::RenderPipeline>,
}

impl GpuProgram {
    pub fn invalid(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            pipeline: None,
        }
    }

    /// Builds the pipeline inside internal and validation error scopes. An invalid shader skips
    /// the build.
    pub fn link(
        device: &wgpu::Device,
        label: &str,
        shader: &GpuShader,
        build: impl FnOnce(&wgpu::ShaderModule) -> wgpu::RenderPipeline,
    ) -> Self {
        let Some(module) = shader.module() else {
            log::error!(
                "Program {label} not linked: shader {} is invalid",
                shader.label()
            );
            return Self::invalid(label);
        };

        match validated(device, || build(module)) {
            Ok(pipeline) => Self {
                label: label.to_owned(),
                pipeline: Some(pipeline),
            },
            Err(message) => {
                log::error!("Program {label} failed to link:\n{message}");
                Self::invalid(label)
            }
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn is_valid(&self) -> bool {
        self.pipeline.is_some()
    }

    pub fn bind(&self, pass: &mut wgpu::RenderPass<'_>) {
        let Some(pipeline) = &self.pipeline else {
            panic!("binding invalid program {}", self.label);
        };
        pass.set_pipeline(pipeline);
    }

    pub fn release(&mut self) {
        self.pipeline = None;
    }
}

/// Runs `create` with internal and validation error scopes pushed and returns the error text,
/// if either caught one. Backend shader translation reports through the internal scope.
fn validated<T>(device: &wgpu::Device, create: impl FnOnce() -> T) -> Result<T, String> {
    device.push_error_scope(wgpu::ErrorFilter::Internal);
    device.push_error_scope(wgpu::ErrorFilter::Validation);
    let value = create();
    let validation = pollster::block_on(device.pop_error_scope());
    let internal = pollster::block_on(device.pop_error_scope());
    scoped_result(value, [validation, internal])
}

fn scoped_result<T>(value: T, errors: [Option<wgpu::Error>; 2]) -> Result<T, String> {
    let messages: Vec<String> = errors.iter().flatten().map(ToString::to_string).collect();
    if messages.is_empty() {
        Ok(value)
    } else {
        Err(messages.join("\n"))
    }
}
