//! Meshes as they live in the scene heaps, and the vertex layouts that read them.

use half::f16;

use crate::data_structures::{
    arguments::{MATERIAL_TEXTURE_COUNT, TextureSlot},
    texture::TextureHandle,
};
use crate::scene::heap::Allocation;

pub trait Vertex {
    fn desc() -> wgpu::VertexBufferLayout<'static>;
}

/// Shader locations of the mesh vertex attributes.
pub mod attribute {
    pub const POSITION: u32 = 0;
    pub const NORMAL: u32 = 1;
    pub const UV: u32 = 2;
    pub const TANGENT: u32 = 3;
    pub const BITANGENT: u32 = 4;
}

/// Element of the positions heap.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct PositionVertex {
    pub position: [f32; 3],
}

impl Vertex for PositionVertex {
    fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<PositionVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[wgpu::VertexAttribute {
                offset: 0,
                shader_location: attribute::POSITION,
                format: wgpu::VertexFormat::Float32x3,
            }],
        }
    }
}

/// Element of the generics heap. The tangent frame is stored as half floats,
/// `w` is unused.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct GenericVertex {
    pub tex_coords: [f32; 2],
    pub normal: [f16; 4],
    pub tangent: [f16; 4],
    pub bitangent: [f16; 4],
}

impl GenericVertex {
    pub fn new(tex_coords: [f32; 2], normal: [f32; 3], tangent: [f32; 3], bitangent: [f32; 3]) -> Self {
        let pack = |v: [f32; 3]| {
            [
                f16::from_f32(v[0]),
                f16::from_f32(v[1]),
                f16::from_f32(v[2]),
                f16::ZERO,
            ]
        };
        Self {
            tex_coords,
            normal: pack(normal),
            tangent: pack(tangent),
            bitangent: pack(bitangent),
        }
    }
}

impl Vertex for GenericVertex {
    fn desc() -> wgpu::VertexBufferLayout<'static> {
        use std::mem;
        wgpu::VertexBufferLayout {
            array_stride: mem::size_of::<GenericVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: mem::offset_of!(GenericVertex, tex_coords) as wgpu::BufferAddress,
                    shader_location: attribute::UV,
                    format: wgpu::VertexFormat::Float32x2,
                },
                wgpu::VertexAttribute {
                    offset: mem::offset_of!(GenericVertex, normal) as wgpu::BufferAddress,
                    shader_location: attribute::NORMAL,
                    format: wgpu::VertexFormat::Float16x4,
                },
                wgpu::VertexAttribute {
                    offset: mem::offset_of!(GenericVertex, tangent) as wgpu::BufferAddress,
                    shader_location: attribute::TANGENT,
                    format: wgpu::VertexFormat::Float16x4,
                },
                wgpu::VertexAttribute {
                    offset: mem::offset_of!(GenericVertex, bitangent) as wgpu::BufferAddress,
                    shader_location: attribute::BITANGENT,
                    format: wgpu::VertexFormat::Float16x4,
                },
            ],
        }
    }
}

pub const POSITION_STRIDE: usize = 12;
pub const GENERIC_STRIDE: usize = 32;

const _: () = {
    assert!(std::mem::size_of::<PositionVertex>() == POSITION_STRIDE);
    assert!(std::mem::size_of::<GenericVertex>() == GENERIC_STRIDE);
    assert!(std::mem::offset_of!(GenericVertex, tex_coords) == 0);
    assert!(std::mem::offset_of!(GenericVertex, normal) == 8);
    assert!(std::mem::offset_of!(GenericVertex, tangent) == 16);
    assert!(std::mem::offset_of!(GenericVertex, bitangent) == 24);
};

/// Sky dome vertex. Only position and texture coordinates are kept.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct SkyboxVertex {
    pub position: [f32; 3],
    pub tex_coords: [f32; 2],
}

impl Vertex for SkyboxVertex {
    fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<SkyboxVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: attribute::POSITION,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: std::mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
                    shader_location: attribute::UV,
                    format: wgpu::VertexFormat::Float32x2,
                },
            ],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexType {
    U16,
    U32,
}

impl IndexType {
    /// Narrowest type able to address `vertex_count` vertices.
    pub fn for_vertex_count(vertex_count: usize) -> Self {
        if vertex_count <= u16::MAX as usize + 1 {
            IndexType::U16
        } else {
            IndexType::U32
        }
    }

    pub fn size(self) -> u32 {
        match self {
            IndexType::U16 => 2,
            IndexType::U32 => 4,
        }
    }

    pub fn format(self) -> wgpu::IndexFormat {
        match self {
            IndexType::U16 => wgpu::IndexFormat::Uint16,
            IndexType::U32 => wgpu::IndexFormat::Uint32,
        }
    }
}

/// A submesh resident in the index heap together with its material.
#[derive(Debug, Clone)]
pub struct Submesh {
    pub name: String,
    pub indices: Allocation,
    pub index_type: IndexType,
    pub index_count: u32,
    /// Indexed by [`TextureSlot`].
    pub textures: [TextureHandle; MATERIAL_TEXTURE_COUNT],
}

impl Submesh {
    pub fn texture(&self, slot: TextureSlot) -> TextureHandle {
        self.textures[slot.index()]
    }
}

/// A mesh whose vertices live in the positions and generics heaps.
#[derive(Debug, Clone)]
pub struct Mesh {
    pub name: String,
    pub positions: Allocation,
    pub generics: Allocation,
    pub vertex_count: u32,
    pub submeshes: Vec<Submesh>,
}
