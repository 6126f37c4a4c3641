use cgmath::{InnerSpace, Vector3};

use crate::config::Config;

/// Directional light. Mirrors `LightData` in `frame.wgsl`.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LightUniform {
    /// Unit vector pointing towards the light.
    pub inv_direction: [f32; 3],
    pub intensity: f32,
    pub color: [f32; 3],
    /// Weight of the image based ambient term.
    pub ambient: f32,
}

impl LightUniform {
    pub fn new(direction: [f32; 3], intensity: f32) -> Self {
        let inv_direction = -Vector3::from(direction).normalize();
        Self {
            inv_direction: inv_direction.into(),
            intensity,
            color: [1.0; 3],
            ambient: 0.3,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.light_direction, config.light_intensity)
    }
}
