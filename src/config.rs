//! Renderer configuration.
//!
//! All tunables of the sample live in [`Config`]. The defaults reproduce the
//! reference scene; a couple of environment variables allow switching the asset
//! root and the render mode without recompiling.

use std::{env, path::PathBuf, str::FromStr};

use anyhow::bail;

/// Number of frames whose GPU work may be outstanding at once.
pub const MAX_FRAMES_IN_FLIGHT: usize = 3;
/// Upper bound of model instances placed in the scene.
pub const MAX_MODEL_INSTANCES: usize = 4;
/// Resources are registered with a residency set in batches of this size.
pub const RESIDENCY_CHUNK_SIZE: usize = 16;

pub const ASSET_ROOT_ENV: &str = "BINDLESS_ASSET_ROOT";
pub const RENDER_MODE_ENV: &str = "BINDLESS_RENDER_MODE";

/// How opaque scene geometry is shaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RenderMode {
    /// Scene geometry is lit directly while rasterizing.
    Forward,
    /// Scene geometry fills a G-buffer which a full-screen pass lights;
    /// the sky is drawn forward on top.
    #[default]
    Hybrid,
}

impl FromStr for RenderMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "forward" => Ok(Self::Forward),
            "hybrid" | "deferred" => Ok(Self::Hybrid),
            other => bail!("unknown render mode `{other}` (expected `forward` or `hybrid`)"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub asset_root: PathBuf,
    pub model_file: String,
    pub sky_file: String,
    pub frames_in_flight: usize,
    pub max_model_instances: usize,
    pub residency_chunk_size: usize,
    pub render_mode: RenderMode,
    pub clear_colour: wgpu::Color,
    /// Vertical field of view in degrees.
    pub fov_degrees: f32,
    pub z_near: f32,
    pub z_far: f32,
    pub camera_pan_speed: f32,
    pub metallic_bias: f32,
    pub roughness_bias: f32,
    pub exposure: f32,
    pub bloom_threshold: f32,
    pub bloom_strength: f32,
    pub light_direction: [f32; 3],
    pub light_intensity: f32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            asset_root: PathBuf::from("./assets"),
            model_file: "firetruck.obj".to_string(),
            sky_file: "kloppenheim_06_4k.hdr".to_string(),
            frames_in_flight: MAX_FRAMES_IN_FLIGHT,
            max_model_instances: MAX_MODEL_INSTANCES,
            residency_chunk_size: RESIDENCY_CHUNK_SIZE,
            render_mode: RenderMode::default(),
            clear_colour: wgpu::Color {
                r: 0.65,
                g: 0.65,
                b: 0.65,
                a: 1.0,
            },
            fov_degrees: 65.0,
            z_near: 0.1,
            z_far: 250.0,
            camera_pan_speed: 0.5,
            metallic_bias: 0.0,
            roughness_bias: 0.0,
            exposure: 1.0,
            bloom_threshold: 1.0,
            bloom_strength: 0.3,
            light_direction: [0.0, -6.0, -6.0],
            light_intensity: 5.0,
        }
    }
}

impl Config {
    /// Default configuration with environment overrides applied.
    pub fn from_env() -> anyhow::Result<Self> {
        let mut config = Self::default();
        if let Ok(root) = env::var(ASSET_ROOT_ENV) {
            config.asset_root = PathBuf::from(root);
        }
        if let Ok(mode) = env::var(RENDER_MODE_ENV) {
            config.render_mode = mode.parse()?;
        }
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.frames_in_flight == 0 {
            bail!("at least one frame must be allowed in flight");
        }
        if self.residency_chunk_size == 0 {
            bail!("residency chunk size must be positive");
        }
        if !(self.z_near > 0.0 && self.z_far > self.z_near) {
            bail!(
                "invalid depth range: near {} far {}",
                self.z_near,
                self.z_far
            );
        }
        Ok(())
    }
}
