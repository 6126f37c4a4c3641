//! GPU side of a resident scene.

use std::num::NonZeroU32;

use wgpu::util::DeviceExt;

use crate::{
    data_structures::{
        arguments::SceneRoot,
        model::{Mesh, Submesh},
        texture::{Texture, TextureImage, create_default_sampler},
    },
    scene::{
        Scene,
        arguments::{DrawCall, SceneArguments},
        heap::HeapKind,
    },
};

/// Bindings of the scene group. Mirrors `scene_common.wgsl`.
pub mod binding {
    pub const ARGUMENTS: u32 = 0;
    pub const POSITIONS: u32 = 1;
    pub const GENERICS: u32 = 2;
    pub const INDICES: u32 = 3;
    pub const KEYPATHS: u32 = 4;
    pub const ROOT: u32 = 5;
    pub const MATERIALS: u32 = 6;
    pub const MATERIAL_SAMPLER: u32 = 7;
}

fn storage_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Storage { read_only: true },
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

/// Layout of the scene bind group for a scene with `texture_count` material
/// textures.
pub fn scene_bind_group_layout(device: &wgpu::Device, texture_count: u32) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("Scene Bind Group Layout"),
        entries: &[
            storage_entry(binding::ARGUMENTS),
            storage_entry(binding::POSITIONS),
            storage_entry(binding::GENERICS),
            storage_entry(binding::INDICES),
            storage_entry(binding::KEYPATHS),
            wgpu::BindGroupLayoutEntry {
                binding: binding::ROOT,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: binding::MATERIALS,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    multisampled: false,
                    view_dimension: wgpu::TextureViewDimension::D2,
                    sample_type: wgpu::TextureSampleType::Float { filterable: true },
                },
                count: NonZeroU32::new(texture_count.max(1)),
            },
            wgpu::BindGroupLayoutEntry {
                binding: binding::MATERIAL_SAMPLER,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                count: None,
            },
        ],
    })
}

/// Storage bindings must not be empty.
fn padded(bytes: &[u8]) -> Vec<u8> {
    let mut data = bytes.to_vec();
    data.resize(bytes.len().next_multiple_of(16).max(16), 0);
    data
}

/// Where a submesh's vertex and index data lives, for binding heap slices as
/// vertex and index buffers.
#[derive(Debug, Clone, Copy)]
pub struct DrawRange {
    pub positions: wgpu::BufferAddress,
    pub generics: wgpu::BufferAddress,
    pub indices: wgpu::BufferAddress,
    pub index_bytes: wgpu::BufferAddress,
    pub index_format: wgpu::IndexFormat,
}

impl DrawRange {
    fn new(mesh: &Mesh, submesh: &Submesh) -> Self {
        Self {
            positions: mesh.positions.offset as wgpu::BufferAddress,
            generics: mesh.generics.offset as wgpu::BufferAddress,
            indices: submesh.indices.offset as wgpu::BufferAddress,
            index_bytes: (submesh.index_count * submesh.index_type.size()) as wgpu::BufferAddress,
            index_format: submesh.index_type.format(),
        }
    }
}

/// Heaps, keypaths and material textures uploaded to the GPU, bound together
/// as the scene bind group.
pub struct ResidentScene {
    pub heaps: [wgpu::Buffer; 4],
    pub keypaths: wgpu::Buffer,
    pub root: wgpu::Buffer,
    pub textures: Vec<Texture>,
    pub sampler: wgpu::Sampler,
    pub bind_group_layout: wgpu::BindGroupLayout,
    pub bind_group: wgpu::BindGroup,
    pub draws: Vec<(DrawCall, DrawRange)>,
}

impl ResidentScene {
    pub(crate) fn new(device: &wgpu::Device, queue: &wgpu::Queue, scene: &Scene, arguments: &SceneArguments) -> Self {
        let heaps = HeapKind::ALL.map(|kind| {
            device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(kind.label()),
                contents: &padded(scene.heaps.heap(kind).bytes()),
                usage: wgpu::BufferUsages::STORAGE
                    | wgpu::BufferUsages::VERTEX
                    | wgpu::BufferUsages::INDEX
                    | wgpu::BufferUsages::COPY_DST,
            })
        });
        let keypaths = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Keypath Buffer"),
            contents: &padded(bytemuck::cast_slice(&arguments.keypaths)),
            usage: wgpu::BufferUsages::STORAGE,
        });
        let root = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Scene Root Buffer"),
            contents: bytemuck::cast_slice(&[SceneRoot {
                scene: arguments.root.offset,
                keypath_count: arguments.keypath_count(),
                _padding: [0; 2],
            }]),
            usage: wgpu::BufferUsages::UNIFORM,
        });

        let mut textures: Vec<Texture> = scene
            .textures
            .images()
            .iter()
            .map(|image| Texture::from_texture_image(device, queue, image))
            .collect();
        if textures.is_empty() {
            // a binding array needs at least one element
            let white = TextureImage::solid("white", 1, 1, [255; 4], false);
            textures.push(Texture::from_texture_image(device, queue, &white));
        }
        let sampler = create_default_sampler(device);

        let bind_group_layout = scene_bind_group_layout(device, textures.len() as u32);
        let views: Vec<&wgpu::TextureView> = textures.iter().map(|t| &t.view).collect();
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Scene Bind Group"),
            layout: &bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: binding::ARGUMENTS,
                    resource: heaps[HeapKind::Arguments as usize].as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: binding::POSITIONS,
                    resource: heaps[HeapKind::Positions as usize].as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: binding::GENERICS,
                    resource: heaps[HeapKind::Generics as usize].as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: binding::INDICES,
                    resource: heaps[HeapKind::Indices as usize].as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: binding::KEYPATHS,
                    resource: keypaths.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: binding::ROOT,
                    resource: root.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: binding::MATERIALS,
                    resource: wgpu::BindingResource::TextureViewArray(&views),
                },
                wgpu::BindGroupEntry {
                    binding: binding::MATERIAL_SAMPLER,
                    resource: wgpu::BindingResource::Sampler(&sampler),
                },
            ],
        });

        let draws = arguments
            .draws
            .iter()
            .map(|draw| {
                let mesh = &scene.meshes[draw.mesh];
                (*draw, DrawRange::new(mesh, &mesh.submeshes[draw.submesh]))
            })
            .collect();

        log::info!(
            "Scene resident: {} heap bytes, {} textures, {} draws",
            HeapKind::ALL
                .iter()
                .map(|kind| scene.heaps.heap(*kind).len())
                .sum::<usize>(),
            textures.len(),
            arguments.draws.len()
        );

        Self {
            heaps,
            keypaths,
            root,
            textures,
            sampler,
            bind_group_layout,
            bind_group,
            draws,
        }
    }

    pub fn heap(&self, kind: HeapKind) -> &wgpu::Buffer {
        &self.heaps[kind as usize]
    }
}
