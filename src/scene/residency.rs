//! Residency tracking.
//!
//! Shaders reach scene data through addresses and handles stored in records,
//! so nothing in a pipeline or a draw call tells the GPU which resources a frame
//! touches. A [`ResidencySet`] is that list: every heap, allocation and texture
//! the argument graph may reference. Additions are staged and only count once
//! committed; a committed set can be checked against the graph with
//! [`verify`](ResidencySet::verify) and realised with
//! [`request_residency`](ResidencySet::request_residency).

use std::collections::HashSet;

use crate::{
    config::RESIDENCY_CHUNK_SIZE,
    data_structures::{
        arguments::{InstanceData, MeshData, SceneData, SubmeshData, layout},
        model::{GENERIC_STRIDE, POSITION_STRIDE},
        texture::TextureHandle,
    },
    scene::{
        Scene, SceneError,
        arguments::SceneArguments,
        gpu::ResidentScene,
        heap::{AllocationId, DeviceAddress, HeapKind, SceneHeaps},
    },
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    Heap(HeapKind),
    Allocation(AllocationId),
    Texture(TextureHandle),
}

#[derive(Debug)]
pub struct ResidencySet {
    label: String,
    chunk_size: usize,
    pending: Vec<Resource>,
    committed: HashSet<Resource>,
    commits: usize,
}

impl ResidencySet {
    pub fn new(label: &str) -> Self {
        Self::with_chunk_size(label, RESIDENCY_CHUNK_SIZE)
    }

    pub fn with_chunk_size(label: &str, chunk_size: usize) -> Self {
        Self {
            label: label.to_string(),
            chunk_size: chunk_size.max(1),
            pending: Vec::new(),
            committed: HashSet::new(),
            commits: 0,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Stages resources. They are not resident until [`commit`](Self::commit).
    pub fn add_allocations(&mut self, resources: &[Resource]) {
        self.pending.extend_from_slice(resources);
    }

    /// Stages every resource referenced by `arguments`, `chunk_size` at a time.
    /// Returns the number of chunks added.
    pub fn add_scene_resources(&mut self, arguments: &SceneArguments) -> usize {
        let mut chunks = 0;
        for chunk in arguments.resources.chunks(self.chunk_size) {
            self.add_allocations(chunk);
            chunks += 1;
        }
        chunks
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    pub fn commit(&mut self) {
        let added = self.pending.len();
        self.committed.extend(self.pending.drain(..));
        self.commits += 1;
        log::debug!(
            "Residency set `{}` commit #{}: {added} staged, {} resident",
            self.label,
            self.commits,
            self.committed.len()
        );
    }

    pub fn contains(&self, resource: &Resource) -> bool {
        self.committed.contains(resource)
    }

    pub fn allocation_count(&self) -> usize {
        self.committed.len()
    }

    fn require(&self, resource: Resource) -> Result<(), SceneError> {
        if self.contains(&resource) {
            return Ok(());
        }
        Err(match resource {
            Resource::Heap(kind) => SceneError::HeapNotResident(kind),
            Resource::Allocation(id) => SceneError::AllocationNotResident(id),
            Resource::Texture(handle) => SceneError::TextureNotResident(handle),
        })
    }

    /// Dereferences `len` bytes at `address` and checks that both the heap and
    /// the allocation behind it are resident.
    fn require_address(&self, heaps: &SceneHeaps, address: DeviceAddress, len: u32) -> Result<(), SceneError> {
        self.require(Resource::Heap(address.heap))?;
        let allocation = heaps.resolve(address, len)?;
        self.require(Resource::Allocation(allocation.id))
    }

    /// Number of vertices `index_count` indices at `address` reach, that is the
    /// largest index plus one.
    fn referenced_vertices(
        &self,
        heaps: &SceneHeaps,
        address: DeviceAddress,
        index_count: u32,
        index_size: u32,
    ) -> Result<u32, SceneError> {
        let len = index_count.saturating_mul(index_size);
        self.require_address(heaps, address, len)?;
        let start = address.offset as usize;
        let bytes = heaps
            .heap(address.heap)
            .bytes()
            .get(start..start + len as usize)
            .ok_or(SceneError::UnresolvedAddress { address, len })?;
        let largest = if index_size == 2 {
            bytes
                .chunks_exact(2)
                .map(|c| u16::from_le_bytes([c[0], c[1]]) as u32)
                .max()
        } else {
            bytes
                .chunks_exact(4)
                .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
                .max()
        };
        Ok(largest.map_or(0, |index| index.saturating_add(1)))
    }

    fn read<T: bytemuck::Pod>(&self, heaps: &SceneHeaps, address: DeviceAddress) -> Result<T, SceneError> {
        self.require_address(heaps, address, std::mem::size_of::<T>() as u32)?;
        heaps.read(address)
    }

    /// Walks the argument graph the way the shaders do, starting from the
    /// scene record, and checks that every address and texture handle it
    /// reaches is resident. Vertex streams must hold every vertex the mesh's
    /// indices reach. Returns the number of references checked.
    pub fn verify(&self, heaps: &SceneHeaps, arguments: &SceneArguments) -> Result<usize, SceneError> {
        if self.has_pending() {
            return Err(SceneError::Uncommitted(self.label.clone()));
        }
        let arguments_at = |offset: u32| DeviceAddress::new(HeapKind::Arguments, offset);
        let mut checked = 0;

        let scene: SceneData = self.read(heaps, arguments.root.address())?;
        checked += 1;

        let mut instance_meshes = Vec::with_capacity(scene.instance_count as usize);
        for i in 0..scene.instance_count {
            let offset = scene.instances + i * layout::INSTANCE_DATA_STRIDE as u32;
            let instance: InstanceData = self.read(heaps, arguments_at(offset))?;
            if instance.mesh_index >= scene.mesh_count {
                return Err(SceneError::RecordOutOfRange(format!(
                    "instance {i} mesh index {}",
                    instance.mesh_index
                )));
            }
            instance_meshes.push(instance.mesh_index);
            checked += 1;
        }

        let mut submesh_counts = Vec::with_capacity(scene.mesh_count as usize);
        for m in 0..scene.mesh_count {
            let offset = scene.meshes + m * layout::MESH_DATA_STRIDE as u32;
            let mesh: MeshData = self.read(heaps, arguments_at(offset))?;
            checked += 1;

            let mut vertex_count = 1;
            for s in 0..mesh.submesh_count {
                let offset = mesh.submeshes + s * layout::SUBMESH_DATA_STRIDE as u32;
                let submesh: SubmeshData = self.read(heaps, arguments_at(offset))?;
                let index_size = if submesh.short_index_type == 1 { 2 } else { 4 };
                let referenced = self.referenced_vertices(
                    heaps,
                    DeviceAddress::new(HeapKind::Indices, submesh.indices),
                    submesh.index_count,
                    index_size,
                )?;
                vertex_count = vertex_count.max(referenced);
                for handle in submesh.materials {
                    self.require(Resource::Texture(TextureHandle(handle)))?;
                }
                checked += 2 + submesh.materials.len();
            }

            // every vertex an index reaches must lie inside both vertex streams
            for (heap, address, stride) in [
                (HeapKind::Positions, mesh.positions, POSITION_STRIDE),
                (HeapKind::Generics, mesh.generics, GENERIC_STRIDE),
            ] {
                let len = vertex_count.checked_mul(stride as u32).ok_or_else(|| {
                    SceneError::RecordOutOfRange(format!("mesh {m} vertex {}", vertex_count - 1))
                })?;
                self.require_address(heaps, DeviceAddress::new(heap, address), len)?;
            }
            checked += 2;
            submesh_counts.push(mesh.submesh_count);
        }

        for (k, keypath) in arguments.keypaths.iter().enumerate() {
            let mesh = instance_meshes
                .get(keypath.instance_id as usize)
                .ok_or_else(|| SceneError::RecordOutOfRange(format!("keypath {k} instance")))?;
            if keypath.submesh_id >= submesh_counts[*mesh as usize] {
                return Err(SceneError::RecordOutOfRange(format!("keypath {k} submesh")));
            }
        }

        log::info!(
            "Residency set `{}` covers all {checked} references of the argument graph",
            self.label
        );
        Ok(checked)
    }

    /// Makes the committed resources available to the GPU.
    pub fn request_residency(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        scene: &Scene,
        arguments: &SceneArguments,
    ) -> Result<ResidentScene, SceneError> {
        if self.has_pending() {
            return Err(SceneError::Uncommitted(self.label.clone()));
        }
        for kind in HeapKind::ALL {
            self.require(Resource::Heap(kind))?;
        }
        for handle in scene.textures.handles() {
            self.require(Resource::Texture(handle))?;
        }
        Ok(ResidentScene::new(device, queue, scene, arguments))
    }
}
