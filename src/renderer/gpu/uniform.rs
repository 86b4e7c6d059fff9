use std::marker::PhantomData;
use std::mem;
use std::num::NonZeroU64;

use bytemuck::Pod;
use wgpu::util::DeviceExt;

/// Uniform block written once per frame (or once ever, for constants).
#[derive(Debug)]
pub struct UniformBuffer<T: Pod> {
    buffer: Option<wgpu::Buffer>,
    _marker: PhantomData<T>,
}

impl<T: Pod> UniformBuffer<T> {
    pub fn new(device: &wgpu::Device, label: &str, initial: &T) -> Self {
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents: bytemuck::bytes_of(initial),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        Self {
            buffer: Some(buffer),
            _marker: PhantomData,
        }
    }

    pub fn write(&self, queue: &wgpu::Queue, value: &T) {
        queue.write_buffer(self.buffer(), 0, bytemuck::bytes_of(value));
    }

    pub fn buffer(&self) -> &wgpu::Buffer {
        self.buffer.as_ref().expect("uniform buffer used after release")
    }

    pub fn binding(&self) -> wgpu::BindingResource<'_> {
        self.buffer().as_entire_binding()
    }

    pub fn is_valid(&self) -> bool {
        self.buffer.is_some()
    }

    pub fn release(&mut self) {
        if let Some(buffer) = self.buffer.take() {
            buffer.destroy();
        }
    }

    pub fn layout_entry(binding: u32, visibility: wgpu::ShaderStages) -> wgpu::BindGroupLayoutEntry {
        wgpu::BindGroupLayoutEntry {
            binding,
            visibility,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: NonZeroU64::new(mem::size_of::<T>() as u64),
            },
            count: None,
        }
    }
}

/// One uniform slot per draw, selected with a dynamic offset at bind time.
///
/// The usage per frame is `begin_frame`, `push` for every draw, `flush`, then record the draws
/// with the offsets `push` returned. The buffer grows on `flush` and the bind group is rebuilt
/// with it, so bind groups must not be taken before flushing.
pub struct DynamicUniformBuffer<T: Pod> {
    label: String,
    layout: wgpu::BindGroupLayout,
    buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    stride: u64,
    capacity: u32,
    scratch: Vec<u8>,
    len: u32,
    _marker: PhantomData<T>,
}

impl<T: Pod> DynamicUniformBuffer<T> {
    pub fn new(
        device: &wgpu::Device,
        label: &str,
        layout: &wgpu::BindGroupLayout,
        capacity: u32,
    ) -> Self {
        let stride = slot_stride(
            mem::size_of::<T>() as u64,
            device.limits().min_uniform_buffer_offset_alignment as u64,
        );
        let capacity = capacity.max(1);
        let buffer = Self::create_buffer(device, label, stride, capacity);
        let bind_group = Self::create_bind_group(device, label, layout, &buffer);

        Self {
            label: label.to_owned(),
            layout: layout.clone(),
            buffer,
            bind_group,
            stride,
            capacity,
            scratch: Vec::with_capacity((stride * capacity as u64) as usize),
            len: 0,
            _marker: PhantomData,
        }
    }

    pub fn layout_entry(binding: u32, visibility: wgpu::ShaderStages) -> wgpu::BindGroupLayoutEntry {
        wgpu::BindGroupLayoutEntry {
            binding,
            visibility,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: true,
                min_binding_size: NonZeroU64::new(mem::size_of::<T>() as u64),
            },
            count: None,
        }
    }

    pub fn begin_frame(&mut self) {
        self.scratch.clear();
        self.len = 0;
    }

    /// Queues `value` and returns the dynamic offset of its slot.
    pub fn push(&mut self, value: &T) -> u32 {
        let offset = self.len as u64 * self.stride;
        self.scratch.extend_from_slice(bytemuck::bytes_of(value));
        self.scratch.resize(((self.len as u64 + 1) * self.stride) as usize, 0);
        self.len += 1;
        offset as u32
    }

    pub fn len(&self) -> u32 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn flush(&mut self, device: &wgpu::Device, queue: &wgpu::Queue) {
        if self.len > self.capacity {
            self.grow(device, self.len);
        }
        if !self.scratch.is_empty() {
            queue.write_buffer(&self.buffer, 0, &self.scratch);
        }
    }

    pub fn bind_group(&self) -> &wgpu::BindGroup {
        &self.bind_group
    }

    pub fn release(&mut self) {
        self.buffer.destroy();
        self.scratch = Vec::new();
        self.len = 0;
    }

    fn grow(&mut self, device: &wgpu::Device, required: u32) {
        let new_capacity = required.max(self.capacity * 2);
        log::info!(
            "Growing {} buffer: {} -> {}",
            self.label,
            self.capacity,
            new_capacity
        );

        self.buffer.destroy();
        self.buffer = Self::create_buffer(device, &self.label, self.stride, new_capacity);
        self.bind_group = Self::create_bind_group(device, &self.label, &self.layout, &self.buffer);
        self.capacity = new_capacity;
    }

    fn create_buffer(device: &wgpu::Device, label: &str, stride: u64, capacity: u32) -> wgpu::Buffer {
        device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size: stride * capacity as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        })
    }

    fn create_bind_group(
        device: &wgpu::Device,
        label: &str,
        layout: &wgpu::BindGroupLayout,
        buffer: &wgpu::Buffer,
    ) -> wgpu::BindGroup {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(label),
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer,
                    offset: 0,
                    size: NonZeroU64::new(mem::size_of::<T>() as u64),
                }),
            }],
        })
    }
}

fn slot_stride(size: u64, alignment: u64) -> u64 {
    let alignment = alignment.max(1);
    size.div_ceil(alignment) * alignment
}
