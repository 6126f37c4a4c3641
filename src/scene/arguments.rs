//! Builds the argument graph of a scene.
//!
//! The graph is a tree of records in the argument heap:
//!
//! ```text
//! SceneData ─┬─> [InstanceData; instance_count]
//!            └─> [MeshData; mesh_count] ──> [SubmeshData; submesh_count] ──> texture handles
//!                        │                            └─> index heap
//!                        └─> positions heap, generics heap
//! ```
//!
//! Children are always written before their parent so that the parent can
//! store the child's address by value.

use std::collections::HashSet;

use crate::{
    data_structures::{
        arguments::{InstanceData, MeshData, SceneData, SubmeshData, SubmeshKeypath},
        model::IndexType,
    },
    scene::{
        Scene, SceneError,
        heap::{Allocation, HeapKind},
        residency::Resource,
    },
};

/// One indexed draw. `keypath` is both the index into the keypath table and
/// the instance index the draw is issued with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrawCall {
    pub keypath: u32,
    pub mesh: usize,
    pub submesh: usize,
    pub index_count: u32,
}

impl DrawCall {
    pub fn instances(&self) -> std::ops::Range<u32> {
        self.keypath..self.keypath + 1
    }
}

#[derive(Debug, Clone)]
pub struct SceneArguments {
    /// The [`SceneData`] record.
    pub root: Allocation,
    pub instances: Allocation,
    pub meshes: Allocation,
    /// Submesh record array of each mesh, in mesh order.
    pub submeshes: Vec<Allocation>,
    pub keypaths: Vec<SubmeshKeypath>,
    pub draws: Vec<DrawCall>,
    /// Everything the graph references, deduplicated, in discovery order.
    pub resources: Vec<Resource>,
}

impl SceneArguments {
    pub fn keypath_count(&self) -> u32 {
        self.keypaths.len() as u32
    }
}

#[derive(Default)]
struct ResourceList {
    seen: HashSet<Resource>,
    ordered: Vec<Resource>,
}

impl ResourceList {
    fn push(&mut self, resource: Resource) {
        if self.seen.insert(resource) {
            self.ordered.push(resource);
        }
    }
}

/// Writes the argument records of `scene` into its argument heap.
pub fn build_scene_arguments(scene: &mut Scene) -> Result<SceneArguments, SceneError> {
    let mut resources = ResourceList::default();
    for kind in HeapKind::ALL {
        resources.push(Resource::Heap(kind));
    }

    let instance_records: Vec<InstanceData> = scene.instances.iter().map(|i| i.to_raw()).collect();
    let instances = scene
        .heaps
        .allocate_slice(HeapKind::Arguments, &instance_records)?;
    resources.push(Resource::Allocation(instances.id));

    let mut mesh_records = Vec::with_capacity(scene.meshes.len());
    let mut submesh_arrays = Vec::with_capacity(scene.meshes.len());
    for mesh in &scene.meshes {
        let submesh_records: Vec<SubmeshData> = mesh
            .submeshes
            .iter()
            .map(|submesh| SubmeshData {
                short_index_type: (submesh.index_type == IndexType::U16) as u32,
                indices: submesh.indices.offset,
                index_count: submesh.index_count,
                materials: submesh.textures.map(|handle| handle.0),
            })
            .collect();
        let submeshes = scene
            .heaps
            .allocate_slice(HeapKind::Arguments, &submesh_records)?;

        resources.push(Resource::Allocation(mesh.positions.id));
        resources.push(Resource::Allocation(mesh.generics.id));
        for submesh in &mesh.submeshes {
            resources.push(Resource::Allocation(submesh.indices.id));
            for handle in submesh.textures {
                resources.push(Resource::Texture(handle));
            }
        }
        resources.push(Resource::Allocation(submeshes.id));

        mesh_records.push(MeshData {
            positions: mesh.positions.offset,
            generics: mesh.generics.offset,
            submeshes: submeshes.offset,
            submesh_count: submesh_records.len() as u32,
        });
        submesh_arrays.push(submeshes);
    }
    let meshes = scene
        .heaps
        .allocate_slice(HeapKind::Arguments, &mesh_records)?;
    resources.push(Resource::Allocation(meshes.id));

    let root = scene.heaps.allocate_slice(
        HeapKind::Arguments,
        &[SceneData {
            instances: instances.offset,
            meshes: meshes.offset,
            instance_count: instance_records.len() as u32,
            mesh_count: mesh_records.len() as u32,
        }],
    )?;
    resources.push(Resource::Allocation(root.id));

    let mut keypaths = Vec::new();
    let mut draws = Vec::new();
    for (instance_id, instance) in scene.instances.iter().enumerate() {
        let mesh_index = instance.mesh_index as usize;
        let mesh = scene
            .meshes
            .get(mesh_index)
            .ok_or(SceneError::MeshOutOfRange {
                instance: instance_id,
                mesh_index: instance.mesh_index,
                mesh_count: scene.meshes.len(),
            })?;
        for (submesh_id, submesh) in mesh.submeshes.iter().enumerate() {
            let keypath = keypaths.len() as u32;
            keypaths.push(SubmeshKeypath {
                instance_id: instance_id as u32,
                submesh_id: submesh_id as u32,
            });
            draws.push(DrawCall {
                keypath,
                mesh: mesh_index,
                submesh: submesh_id,
                index_count: submesh.index_count,
            });
        }
    }

    log::info!(
        "Built argument graph: {} instances, {} meshes, {} draws, {} bytes of records",
        instance_records.len(),
        mesh_records.len(),
        draws.len(),
        scene.heaps.heap(HeapKind::Arguments).len()
    );

    Ok(SceneArguments {
        root,
        instances,
        meshes,
        submeshes: submesh_arrays,
        keypaths,
        draws,
        resources: resources.ordered,
    })
}
