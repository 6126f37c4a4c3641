//! Orbiting camera, projection and the per-frame camera uniform.

use std::f32::consts::TAU;

use cgmath::{Matrix4, Rad, Vector3};

use crate::config::Config;

/// Camera data as read by the shaders. Mirrors `CameraData` in `frame.wgsl`.
#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    pub projection: [[f32; 4]; 4],
    pub view: [[f32; 4]; 4],
    pub position: [f32; 3],
    pub metallic_bias: f32,
    pub roughness_bias: f32,
    // Uniform structs are padded to a multiple of 16 bytes
    _padding: [f32; 3],
}

impl CameraUniform {
    pub fn new() -> Self {
        use cgmath::SquareMatrix;
        Self {
            projection: Matrix4::identity().into(),
            view: Matrix4::identity().into(),
            position: [0.0; 3],
            metallic_bias: 0.0,
            roughness_bias: 0.0,
            _padding: [0.0; 3],
        }
    }

    pub fn update(&mut self, camera: &OrbitCamera, projection: &Projection) {
        let position = camera.position();
        self.projection = projection.calc_matrix().into();
        self.view = Matrix4::from_translation(-position).into();
        self.position = position.into();
        self.metallic_bias = camera.metallic_bias;
        self.roughness_bias = camera.roughness_bias;
    }
}

impl Default for CameraUniform {
    fn default() -> Self {
        Self::new()
    }
}

/// Right-handed perspective projection mapping depth to `[0, 1]`.
#[derive(Debug, Clone)]
pub struct Projection {
    aspect: f32,
    fovy: Rad<f32>,
    znear: f32,
    zfar: f32,
}

impl Projection {
    pub fn new<F: Into<Rad<f32>>>(width: u32, height: u32, fovy: F, znear: f32, zfar: f32) -> Self {
        Self {
            aspect: width.max(1) as f32 / height.max(1) as f32,
            fovy: fovy.into(),
            znear,
            zfar,
        }
    }

    pub fn from_config(config: &Config, width: u32, height: u32) -> Self {
        Self::new(
            width,
            height,
            cgmath::Deg(config.fov_degrees),
            config.z_near,
            config.z_far,
        )
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.aspect = width.max(1) as f32 / height.max(1) as f32;
    }

    pub fn aspect(&self) -> f32 {
        self.aspect
    }

    pub fn calc_matrix(&self) -> Matrix4<f32> {
        perspective_zo(self.fovy, self.aspect, self.znear, self.zfar)
    }
}

/// Perspective matrix with a `[0, 1]` clip-space depth range, as wgpu expects.
pub fn perspective_zo(fovy: Rad<f32>, aspect: f32, znear: f32, zfar: f32) -> Matrix4<f32> {
    let ys = 1.0 / (fovy.0 * 0.5).tan();
    let xs = ys / aspect;
    let zs = zfar / (znear - zfar);
    #[rustfmt::skip]
    let matrix = Matrix4::new(
        xs,  0.0, 0.0,         0.0,
        0.0, ys,  0.0,         0.0,
        0.0, 0.0, zs,         -1.0,
        0.0, 0.0, znear * zs,  0.0,
    );
    matrix
}

/// A camera panning along an ellipse around the scene.
#[derive(Debug, Clone)]
pub struct OrbitCamera {
    angle: f32,
    pub pan_speed: f32,
    pub metallic_bias: f32,
    pub roughness_bias: f32,
}

impl OrbitCamera {
    pub fn new(pan_speed: f32) -> Self {
        Self {
            angle: 0.0,
            pan_speed,
            metallic_bias: 0.0,
            roughness_bias: 0.0,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self {
            metallic_bias: config.metallic_bias,
            roughness_bias: config.roughness_bias,
            ..Self::new(config.camera_pan_speed)
        }
    }

    pub fn angle(&self) -> f32 {
        self.angle
    }

    pub fn position(&self) -> Vector3<f32> {
        Vector3::new(self.angle.cos() * 10.0, 5.0, self.angle.sin() * 22.5)
    }

    /// Moves the camera one step along its orbit. The angle stays in `[0, 2π]`.
    pub fn advance(&mut self) {
        self.angle += 0.01 * self.pan_speed;
        if self.angle > TAU {
            self.angle -= TAU;
        }
    }
}
