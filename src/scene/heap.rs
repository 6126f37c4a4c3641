//! Scene heaps.
//!
//! A heap is a CPU-staged arena that is uploaded as a single GPU buffer. Every
//! piece of scene data (vertex positions, vertex generics, indices and the
//! argument records) is sub-allocated from one of four heaps. The byte offset of
//! an allocation inside its heap is the address shaders use to reach it.

use std::fmt;

use bytemuck::Pod;

use crate::scene::SceneError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum HeapKind {
    /// Packed `f32x3` vertex positions.
    Positions,
    /// Texture coordinates and the half-float tangent frame.
    Generics,
    /// 16- and 32-bit index data.
    Indices,
    /// Scene, instance, mesh and submesh records.
    Arguments,
}

impl HeapKind {
    pub const ALL: [HeapKind; 4] = [
        HeapKind::Positions,
        HeapKind::Generics,
        HeapKind::Indices,
        HeapKind::Arguments,
    ];

    /// Alignment of every allocation start within the heap.
    pub fn alignment(self) -> u32 {
        match self {
            // records hold a mat4x4 that WGSL decodes as vec4 loads
            HeapKind::Arguments => 16,
            _ => 4,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            HeapKind::Positions => "Positions Heap",
            HeapKind::Generics => "Generics Heap",
            HeapKind::Indices => "Index Heap",
            HeapKind::Arguments => "Argument Heap",
        }
    }
}

impl fmt::Display for HeapKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Unique across all heaps of a [`SceneHeaps`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AllocationId(pub u32);

/// Location of data inside a heap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeviceAddress {
    pub heap: HeapKind,
    pub offset: u32,
}

impl DeviceAddress {
    pub fn new(heap: HeapKind, offset: u32) -> Self {
        Self { heap, offset }
    }
}

impl fmt::Display for DeviceAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}+{:#x}", self.heap, self.offset)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Allocation {
    pub id: AllocationId,
    pub heap: HeapKind,
    pub offset: u32,
    pub size: u32,
}

impl Allocation {
    pub fn address(&self) -> DeviceAddress {
        DeviceAddress::new(self.heap, self.offset)
    }

    /// Address `offset` bytes into the allocation.
    pub fn address_at(&self, offset: u32) -> DeviceAddress {
        DeviceAddress::new(self.heap, self.offset + offset)
    }

    pub fn end(&self) -> u32 {
        self.offset + self.size
    }

    /// Whether `len` bytes starting at `address` lie within this allocation.
    pub fn covers(&self, address: DeviceAddress, len: u32) -> bool {
        address.heap == self.heap
            && address.offset >= self.offset
            && address.offset as u64 + len as u64 <= self.end() as u64
    }
}

/// One arena. Allocations are never freed; the whole heap lives as long as the
/// scene.
#[derive(Debug, Clone)]
pub struct SceneHeap {
    kind: HeapKind,
    data: Vec<u8>,
    allocations: Vec<Allocation>,
}

impl SceneHeap {
    pub fn new(kind: HeapKind) -> Self {
        Self {
            kind,
            data: Vec::new(),
            allocations: Vec::new(),
        }
    }

    pub fn kind(&self) -> HeapKind {
        self.kind
    }

    pub fn bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn allocations(&self) -> &[Allocation] {
        &self.allocations
    }

    fn allocate(&mut self, id: AllocationId, bytes: &[u8]) -> Result<Allocation, SceneError> {
        let align = self.kind.alignment() as usize;
        let start = self.data.len().next_multiple_of(align);
        // the allocation itself is padded too, so a u16 index list never ends mid-word
        let padded = bytes.len().next_multiple_of(4);
        let end = start + padded;
        if end > u32::MAX as usize {
            return Err(SceneError::HeapExhausted {
                heap: self.kind,
                requested: bytes.len(),
            });
        }
        self.data.resize(start, 0);
        self.data.extend_from_slice(bytes);
        self.data.resize(end, 0);

        let allocation = Allocation {
            id,
            heap: self.kind,
            offset: start as u32,
            size: padded as u32,
        };
        self.allocations.push(allocation);
        Ok(allocation)
    }

    /// The allocation holding `len` bytes at `offset`.
    pub fn find(&self, offset: u32, len: u32) -> Option<&Allocation> {
        let address = DeviceAddress::new(self.kind, offset);
        // allocations are sorted by offset
        let idx = self.allocations.partition_point(|a| a.offset <= offset);
        idx.checked_sub(1)
            .map(|i| &self.allocations[i])
            .filter(|a| a.covers(address, len))
    }
}

/// The four heaps of a scene.
#[derive(Debug, Clone)]
pub struct SceneHeaps {
    positions: SceneHeap,
    generics: SceneHeap,
    indices: SceneHeap,
    arguments: SceneHeap,
    next_id: u32,
}

impl Default for SceneHeaps {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneHeaps {
    pub fn new() -> Self {
        Self {
            positions: SceneHeap::new(HeapKind::Positions),
            generics: SceneHeap::new(HeapKind::Generics),
            indices: SceneHeap::new(HeapKind::Indices),
            arguments: SceneHeap::new(HeapKind::Arguments),
            next_id: 0,
        }
    }

    pub fn heap(&self, kind: HeapKind) -> &SceneHeap {
        match kind {
            HeapKind::Positions => &self.positions,
            HeapKind::Generics => &self.generics,
            HeapKind::Indices => &self.indices,
            HeapKind::Arguments => &self.arguments,
        }
    }

    fn heap_mut(&mut self, kind: HeapKind) -> &mut SceneHeap {
        match kind {
            HeapKind::Positions => &mut self.positions,
            HeapKind::Generics => &mut self.generics,
            HeapKind::Indices => &mut self.indices,
            HeapKind::Arguments => &mut self.arguments,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &SceneHeap> {
        HeapKind::ALL.into_iter().map(|kind| self.heap(kind))
    }

    /// Copies `bytes` into the heap `kind`.
    pub fn allocate(&mut self, kind: HeapKind, bytes: &[u8]) -> Result<Allocation, SceneError> {
        let id = AllocationId(self.next_id);
        let allocation = self.heap_mut(kind).allocate(id, bytes)?;
        self.next_id += 1;
        Ok(allocation)
    }

    pub fn allocate_slice<T: Pod>(
        &mut self,
        kind: HeapKind,
        items: &[T],
    ) -> Result<Allocation, SceneError> {
        self.allocate(kind, bytemuck::cast_slice(items))
    }

    pub fn allocation(&self, id: AllocationId) -> Option<&Allocation> {
        self.iter()
            .flat_map(|heap| heap.allocations())
            .find(|allocation| allocation.id == id)
    }

    /// The allocation backing `len` bytes at `address`.
    pub fn resolve(&self, address: DeviceAddress, len: u32) -> Result<&Allocation, SceneError> {
        self.heap(address.heap)
            .find(address.offset, len)
            .ok_or(SceneError::UnresolvedAddress { address, len })
    }

    /// Reads a record back from a heap, the way a shader dereferences an address.
    pub fn read<T: Pod>(&self, address: DeviceAddress) -> Result<T, SceneError> {
        let len = std::mem::size_of::<T>() as u32;
        self.resolve(address, len)?;
        let start = address.offset as usize;
        let bytes = &self.heap(address.heap).bytes()[start..start + len as usize];
        Ok(bytemuck::pod_read_unaligned(bytes))
    }
}
