//! Records of the scene argument buffer.
//!
//! These structs are written byte for byte into the argument heap and decoded
//! by `scene_common.wgsl`. Addresses are byte offsets into the heap named by
//! the field; texture handles index the material texture binding array.
//! Field order, size and alignment must match the WGSL decoders exactly, which
//! the assertions at the bottom of this file pin down.

use std::mem::{offset_of, size_of};

/// Material texture slots, in the order they are stored in [`SubmeshData`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u32)]
pub enum TextureSlot {
    BaseColor = 0,
    Metallic = 1,
    Roughness = 2,
    Normal = 3,
    AmbientOcclusion = 4,
}

pub const MATERIAL_TEXTURE_COUNT: usize = 5;

impl TextureSlot {
    pub const ALL: [TextureSlot; MATERIAL_TEXTURE_COUNT] = [
        TextureSlot::BaseColor,
        TextureSlot::Metallic,
        TextureSlot::Roughness,
        TextureSlot::Normal,
        TextureSlot::AmbientOcclusion,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    /// Only base colour is authored in sRGB; every other slot holds linear data.
    pub fn is_srgb(self) -> bool {
        matches!(self, TextureSlot::BaseColor)
    }

    pub fn name(self) -> &'static str {
        match self {
            TextureSlot::BaseColor => "baseColor",
            TextureSlot::Metallic => "metallic",
            TextureSlot::Roughness => "roughness",
            TextureSlot::Normal => "tangentSpaceNormal",
            TextureSlot::AmbientOcclusion => "ambientOcclusion",
        }
    }
}

impl std::fmt::Display for TextureSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// One placed model.
#[repr(C)]
#[derive(Debug, Default, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct InstanceData {
    pub mesh_index: u32,
    // the transform is 16-byte aligned on the GPU
    pub _padding: [u32; 3],
    /// Column-major model matrix.
    pub transform: [[f32; 4]; 4],
}

#[repr(C)]
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MeshData {
    /// Address in the positions heap.
    pub positions: u32,
    /// Address in the generics heap.
    pub generics: u32,
    /// Address of the first [`SubmeshData`] in the argument heap.
    pub submeshes: u32,
    pub submesh_count: u32,
}

#[repr(C)]
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct SubmeshData {
    /// 1 for 16-bit indices, 0 for 32-bit indices.
    pub short_index_type: u32,
    /// Address in the index heap.
    pub indices: u32,
    pub index_count: u32,
    /// Texture handles indexed by [`TextureSlot`].
    pub materials: [u32; MATERIAL_TEXTURE_COUNT],
}

#[repr(C)]
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct SceneData {
    /// Address of the first [`InstanceData`] in the argument heap.
    pub instances: u32,
    /// Address of the first [`MeshData`] in the argument heap.
    pub meshes: u32,
    pub instance_count: u32,
    pub mesh_count: u32,
}

/// Identifies the submesh a draw renders: `instances[instance_id]`, then the
/// instance's mesh, then `submeshes[submesh_id]` of that mesh.
#[repr(C)]
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Hash, bytemuck::Pod, bytemuck::Zeroable)]
pub struct SubmeshKeypath {
    pub instance_id: u32,
    pub submesh_id: u32,
}

/// Uniform locating the scene record. Mirrors `SceneRoot` in `scene_common.wgsl`.
#[repr(C)]
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct SceneRoot {
    pub scene: u32,
    pub keypath_count: u32,
    pub _padding: [u32; 2],
}

/// Byte layout shared with the WGSL decoders.
pub mod layout {
    pub const INSTANCE_DATA_STRIDE: usize = 80;
    pub const INSTANCE_MESH_INDEX_OFFSET: usize = 0;
    pub const INSTANCE_TRANSFORM_OFFSET: usize = 16;

    pub const MESH_DATA_STRIDE: usize = 16;
    pub const MESH_POSITIONS_OFFSET: usize = 0;
    pub const MESH_GENERICS_OFFSET: usize = 4;
    pub const MESH_SUBMESHES_OFFSET: usize = 8;
    pub const MESH_SUBMESH_COUNT_OFFSET: usize = 12;

    pub const SUBMESH_DATA_STRIDE: usize = 32;
    pub const SUBMESH_SHORT_INDEX_TYPE_OFFSET: usize = 0;
    pub const SUBMESH_INDICES_OFFSET: usize = 4;
    pub const SUBMESH_INDEX_COUNT_OFFSET: usize = 8;
    pub const SUBMESH_MATERIALS_OFFSET: usize = 12;

    pub const SCENE_DATA_STRIDE: usize = 16;
    pub const SCENE_INSTANCES_OFFSET: usize = 0;
    pub const SCENE_MESHES_OFFSET: usize = 4;
    pub const SCENE_INSTANCE_COUNT_OFFSET: usize = 8;
    pub const SCENE_MESH_COUNT_OFFSET: usize = 12;

    pub const KEYPATH_STRIDE: usize = 8;
    pub const SCENE_ROOT_SIZE: usize = 16;
}

const _: () = {
    use layout::*;
    assert!(size_of::<InstanceData>() == INSTANCE_DATA_STRIDE);
    assert!(offset_of!(InstanceData, mesh_index) == INSTANCE_MESH_INDEX_OFFSET);
    assert!(offset_of!(InstanceData, transform) == INSTANCE_TRANSFORM_OFFSET);

    assert!(size_of::<MeshData>() == MESH_DATA_STRIDE);
    assert!(offset_of!(MeshData, positions) == MESH_POSITIONS_OFFSET);
    assert!(offset_of!(MeshData, generics) == MESH_GENERICS_OFFSET);
    assert!(offset_of!(MeshData, submeshes) == MESH_SUBMESHES_OFFSET);
    assert!(offset_of!(MeshData, submesh_count) == MESH_SUBMESH_COUNT_OFFSET);

    assert!(size_of::<SubmeshData>() == SUBMESH_DATA_STRIDE);
    assert!(offset_of!(SubmeshData, short_index_type) == SUBMESH_SHORT_INDEX_TYPE_OFFSET);
    assert!(offset_of!(SubmeshData, indices) == SUBMESH_INDICES_OFFSET);
    assert!(offset_of!(SubmeshData, index_count) == SUBMESH_INDEX_COUNT_OFFSET);
    assert!(offset_of!(SubmeshData, materials) == SUBMESH_MATERIALS_OFFSET);

    assert!(size_of::<SceneData>() == SCENE_DATA_STRIDE);
    assert!(offset_of!(SceneData, instances) == SCENE_INSTANCES_OFFSET);
    assert!(offset_of!(SceneData, meshes) == SCENE_MESHES_OFFSET);
    assert!(offset_of!(SceneData, instance_count) == SCENE_INSTANCE_COUNT_OFFSET);
    assert!(offset_of!(SceneData, mesh_count) == SCENE_MESH_COUNT_OFFSET);

    assert!(size_of::<SubmeshKeypath>() == KEYPATH_STRIDE);
    assert!(size_of::<SceneRoot>() == SCENE_ROOT_SIZE);
};
