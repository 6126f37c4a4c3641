//! Procedural meshes: the showcase sphere, the floor plane and the sky dome.

use std::f32::consts::{PI, TAU};

use thiserror::Error;

use crate::{
    data_structures::model::SkyboxVertex,
    resources::{
        material::MaterialDescriptor,
        mesh::{MeshGeometry, SubmeshGeometry},
    },
};

/// Sizes of the procedural scene meshes.
#[derive(Debug, Clone)]
pub struct ShapeBuilder {
    pub sphere_radius: f32,
    pub sphere_segments: [u32; 2],
    pub plane_dimensions: [f32; 2],
    pub plane_segments: [u32; 2],
    pub plane_uv_repeat: f32,
    pub skybox_radius: f32,
    pub skybox_segments: [u32; 2],
}

impl Default for ShapeBuilder {
    fn default() -> Self {
        Self {
            sphere_radius: 8.0,
            sphere_segments: [20, 20],
            plane_dimensions: [200.0, 200.0],
            plane_segments: [100, 100],
            plane_uv_repeat: 20.0,
            skybox_radius: 200.0,
            skybox_segments: [10, 10],
        }
    }
}

impl ShapeBuilder {
    pub fn sphere(&self) -> MeshGeometry {
        let [radial, vertical] = self.sphere_segments;
        let mut geometry = ellipsoid("sphere", self.sphere_radius, radial, vertical, false);
        geometry.submeshes[0].material = Some(MaterialDescriptor::procedural("sphere", "white"));
        geometry
    }

    pub fn plane(&self) -> MeshGeometry {
        plane(
            self.plane_dimensions,
            self.plane_segments,
            self.plane_uv_repeat,
        )
    }

    pub fn skybox(&self) -> Result<SkyboxGeometry, SkyboxError> {
        let [radial, vertical] = self.skybox_segments;
        let geometry = ellipsoid("skybox", self.skybox_radius, radial, vertical, true);
        SkyboxGeometry::try_from(geometry)
    }
}

/// Grid of `(columns + 1) x (rows + 1)` vertices, two triangles per cell,
/// vertex `(i, j)` at `i * (rows + 1) + j`.
fn grid_indices(columns: u32, rows: u32, inward: bool) -> Vec<u32> {
    let stride = rows + 1;
    let mut indices = Vec::with_capacity((columns * rows * 6) as usize);
    for i in 0..columns {
        for j in 0..rows {
            let a = i * stride + j;
            let b = a + 1;
            let c = a + stride;
            let d = c + 1;
            if inward {
                indices.extend_from_slice(&[a, c, b, c, d, b]);
            } else {
                indices.extend_from_slice(&[a, b, c, c, b, d]);
            }
        }
    }
    indices
}

/// UV sphere. `i` walks the azimuth, `j` walks from the north to the south pole.
pub fn ellipsoid(name: &str, radius: f32, radial: u32, vertical: u32, inward: bool) -> MeshGeometry {
    let mut geometry = MeshGeometry {
        name: name.to_string(),
        ..Default::default()
    };
    for i in 0..=radial {
        let u = i as f32 / radial as f32;
        let phi = u * TAU;
        for j in 0..=vertical {
            let v = j as f32 / vertical as f32;
            let theta = v * PI;
            let direction = [
                theta.sin() * phi.cos(),
                theta.cos(),
                -theta.sin() * phi.sin(),
            ];
            geometry
                .positions
                .push(direction.map(|component| component * radius));
            geometry.normals.push(if inward {
                direction.map(|component| -component)
            } else {
                direction
            });
            geometry.tex_coords.push([u, v]);
        }
    }
    geometry.submeshes.push(SubmeshGeometry {
        name: format!("{name} submesh"),
        indices: grid_indices(radial, vertical, inward),
        material: None,
    });
    geometry
}

/// Floor facing +Y, centred on the origin.
pub fn plane(dimensions: [f32; 2], segments: [u32; 2], uv_repeat: f32) -> MeshGeometry {
    let [width, depth] = dimensions;
    let [columns, rows] = segments;
    let mut geometry = MeshGeometry {
        name: "plane".to_string(),
        ..Default::default()
    };
    for i in 0..=columns {
        let u = i as f32 / columns as f32;
        for j in 0..=rows {
            let v = j as f32 / rows as f32;
            geometry
                .positions
                .push([(u - 0.5) * width, 0.0, (v - 0.5) * depth]);
            geometry.normals.push([0.0, 1.0, 0.0]);
            geometry.tex_coords.push([u * uv_repeat, v * uv_repeat]);
        }
    }
    geometry.submeshes.push(SubmeshGeometry {
        name: "plane submesh".to_string(),
        indices: grid_indices(columns, rows, false),
        material: Some(MaterialDescriptor::procedural("plane", "checkerboard_gray")),
    });
    geometry
}

/// Sky dome vertices and 16-bit indices. The dome is drawn from its own
/// buffers, outside the scene heaps.
#[derive(Debug, Clone)]
pub struct SkyboxGeometry {
    pub vertices: Vec<SkyboxVertex>,
    pub indices: Vec<u16>,
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum SkyboxError {
    #[error("Sky dome has {vertices} vertices, more than 16-bit indices can address")]
    TooManyVertices { vertices: usize },
}

impl TryFrom<MeshGeometry> for SkyboxGeometry {
    type Error = SkyboxError;

    fn try_from(geometry: MeshGeometry) -> Result<Self, Self::Error> {
        let vertex_count = geometry.vertex_count();
        if vertex_count > u16::MAX as usize + 1 {
            return Err(SkyboxError::TooManyVertices { vertices: vertex_count });
        }
        let vertices = geometry
            .positions
            .iter()
            .zip(&geometry.tex_coords)
            .map(|(position, tex_coords)| SkyboxVertex {
                position: *position,
                tex_coords: *tex_coords,
            })
            .collect();
        let indices = geometry
            .submeshes
            .iter()
            .flat_map(|submesh| submesh.indices.iter().map(|&i| i as u16))
            .collect();
        Ok(Self { vertices, indices })
    }
}
