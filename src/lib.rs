//! bindless-hybrid
//!
//! A wgpu renderer that reaches all scene data through a graph of records in
//! GPU heaps instead of per-draw bindings. Instances, meshes, submeshes and
//! material textures are written once as nested records of heap offsets and
//! texture handles; a draw only carries the index of a keypath, and the shaders
//! walk from the scene record down to the vertices. Opaque geometry is shaded
//! either forward or through a G-buffer and a full-screen lighting pass, with
//! the sky drawn forward in both cases.
//!
//! High-level modules
//! - `config`: renderer tunables and environment overrides
//! - `camera`: orbiting camera, projection and its uniform
//! - `context`: device, queue and window surface
//! - `data_structures`: vertex formats, argument records, instances, textures
//! - `resources`: OBJ import, procedural shapes, materials and textures
//! - `scene`: heaps, the argument graph and residency
//! - `pipelines`: shader library and render pipelines
//! - `frames`: bounded frame pipelining
//! - `render`: per-frame pass encoding
//! - `flow`: the winit application loop
//!

pub mod camera;
pub mod config;
pub mod context;
pub mod data_structures;
pub mod flow;
pub mod frames;
pub mod pipelines;
pub mod render;
pub mod resources;
pub mod scene;
