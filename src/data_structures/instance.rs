//! Placed models.

use cgmath::{Deg, Matrix4, Vector3};

use crate::data_structures::arguments::InstanceData;

/// A mesh placed in the world, rotated about +Y.
#[derive(Clone, Debug, PartialEq)]
pub struct ModelInstance {
    pub mesh_index: u32,
    pub position: Vector3<f32>,
    pub rotation: Deg<f32>,
}

impl ModelInstance {
    pub fn new(mesh_index: u32, position: [f32; 3], rotation_degrees: f32) -> Self {
        Self {
            mesh_index,
            position: position.into(),
            rotation: Deg(rotation_degrees),
        }
    }

    pub fn to_matrix(&self) -> Matrix4<f32> {
        Matrix4::from_translation(self.position) * Matrix4::from_angle_y(self.rotation)
    }

    pub fn to_raw(&self) -> InstanceData {
        InstanceData {
            mesh_index: self.mesh_index,
            _padding: [0; 3],
            transform: self.to_matrix().into(),
        }
    }
}

/// Mesh slots of the default scene.
pub mod mesh_slot {
    pub const FIRETRUCK: u32 = 0;
    pub const SPHERE: u32 = 1;
    pub const PLANE: u32 = 2;
}

/// The default placement: two firetrucks, a sphere and the floor. At most
/// `max_instances` entries are returned.
pub fn configure_model_instances(max_instances: usize) -> Vec<ModelInstance> {
    let instances = [
        ModelInstance::new(mesh_slot::FIRETRUCK, [20.0, -5.0, -40.0], 135.0),
        ModelInstance::new(mesh_slot::FIRETRUCK, [-13.0, -5.0, -20.0], 235.0),
        ModelInstance::new(mesh_slot::SPHERE, [-5.0, 2.75, -55.0], 0.0),
        ModelInstance::new(mesh_slot::PLANE, [0.0, -5.0, 0.0], 0.0),
    ];
    if instances.len() > max_instances {
        log::warn!(
            "{} model instances configured, only the first {max_instances} are placed",
            instances.len()
        );
    }
    instances.into_iter().take(max_instances).collect()
}
