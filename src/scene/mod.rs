//! The bindless scene.
//!
//! A [`Scene`] owns every heap allocation and texture the renderer draws from.
//! [`arguments`] flattens it into records addressed by byte offsets,
//! [`residency`] tracks which of those allocations the GPU may reach and
//! [`gpu`] turns the committed set into buffers and a bind group.

use thiserror::Error;

use crate::{
    data_structures::{
        instance::ModelInstance,
        model::Mesh,
        texture::{TextureHandle, TextureImage},
    },
    resources::{shapes::SkyboxGeometry, texture::TextureTable},
};

pub mod arguments;
pub mod gpu;
pub mod heap;
pub mod residency;

use heap::{AllocationId, DeviceAddress, HeapKind, SceneHeaps};

#[derive(Debug, Error, PartialEq)]
pub enum SceneError {
    #[error("{heap} cannot hold another {requested} bytes")]
    HeapExhausted { heap: HeapKind, requested: usize },
    #[error("no allocation holds {len} bytes at {address}")]
    UnresolvedAddress { address: DeviceAddress, len: u32 },
    #[error("instance {instance} refers to mesh {mesh_index} but the scene has {mesh_count} meshes")]
    MeshOutOfRange {
        instance: usize,
        mesh_index: u32,
        mesh_count: usize,
    },
    #[error("{0} is not resident")]
    TextureNotResident(TextureHandle),
    #[error("allocation {0:?} is not resident")]
    AllocationNotResident(AllocationId),
    #[error("{0} is not resident")]
    HeapNotResident(HeapKind),
    #[error("residency set `{0}` has uncommitted additions")]
    Uncommitted(String),
    #[error("{0} is out of range of the argument graph")]
    RecordOutOfRange(String),
}

pub struct Scene {
    pub heaps: SceneHeaps,
    pub meshes: Vec<Mesh>,
    pub instances: Vec<ModelInstance>,
    pub textures: TextureTable,
    /// Equirectangular radiance map.
    pub sky: TextureImage,
    pub skybox: SkyboxGeometry,
}

impl Scene {
    pub fn new(
        heaps: SceneHeaps,
        meshes: Vec<Mesh>,
        instances: Vec<ModelInstance>,
        textures: TextureTable,
        sky: TextureImage,
        skybox: SkyboxGeometry,
    ) -> Result<Self, SceneError> {
        for (instance, model) in instances.iter().enumerate() {
            if model.mesh_index as usize >= meshes.len() {
                return Err(SceneError::MeshOutOfRange {
                    instance,
                    mesh_index: model.mesh_index,
                    mesh_count: meshes.len(),
                });
            }
        }
        Ok(Self {
            heaps,
            meshes,
            instances,
            textures,
            sky,
            skybox,
        })
    }

    pub fn submesh_count(&self) -> usize {
        self.meshes.iter().map(|mesh| mesh.submeshes.len()).sum()
    }
}
