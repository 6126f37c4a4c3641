//! Scene data types.
//!
//! - `arguments` holds the records shaders decode from the argument heap
//! - `model` contains resident meshes and their vertex layouts
//! - `instance` places meshes in the world
//! - `texture` contains texture handles, decoded images and GPU textures

pub mod arguments;
pub mod instance;
pub mod model;
pub mod texture;
