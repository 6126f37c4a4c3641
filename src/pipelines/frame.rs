//! Per-slot frame uniforms.
//!
//! Each in-flight slot owns its own camera and light buffers so the CPU can
//! write frame N+1 while the GPU still reads frame N.

use wgpu::util::DeviceExt;

use crate::{camera::CameraUniform, frames::FrameSlot, pipelines::light::LightUniform};

pub fn mk_bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    let uniform = |binding| wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    };
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[uniform(0), uniform(1)],
        label: Some("Frame Bind Group Layout"),
    })
}

struct SlotBuffers {
    camera: wgpu::Buffer,
    light: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

pub struct FrameResources {
    pub bind_group_layout: wgpu::BindGroupLayout,
    slots: Vec<SlotBuffers>,
}

impl FrameResources {
    pub fn new(device: &wgpu::Device, slots: usize) -> Self {
        let bind_group_layout = mk_bind_group_layout(device);
        let slots = (0..slots)
            .map(|i| {
                let camera = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some(&format!("Camera Buffer {i}")),
                    contents: bytemuck::cast_slice(&[CameraUniform::new()]),
                    usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                });
                let light = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some(&format!("Light Buffer {i}")),
                    contents: bytemuck::cast_slice(&[LightUniform::new([0.0, -1.0, 0.0], 0.0)]),
                    usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                });
                let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
                    layout: &bind_group_layout,
                    entries: &[
                        wgpu::BindGroupEntry {
                            binding: 0,
                            resource: camera.as_entire_binding(),
                        },
                        wgpu::BindGroupEntry {
                            binding: 1,
                            resource: light.as_entire_binding(),
                        },
                    ],
                    label: Some(&format!("Frame Bind Group {i}")),
                });
                SlotBuffers {
                    camera,
                    light,
                    bind_group,
                }
            })
            .collect();
        Self {
            bind_group_layout,
            slots,
        }
    }

    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    pub fn write(&self, queue: &wgpu::Queue, slot: &FrameSlot, camera: &CameraUniform, light: &LightUniform) {
        let buffers = &self.slots[slot.index()];
        queue.write_buffer(&buffers.camera, 0, bytemuck::cast_slice(&[*camera]));
        queue.write_buffer(&buffers.light, 0, bytemuck::cast_slice(&[*light]));
    }

    pub fn bind_group(&self, slot: &FrameSlot) -> &wgpu::BindGroup {
        &self.slots[slot.index()].bind_group
    }
}
