use std::{
    io::{BufReader, Cursor},
    path::Path,
};

use anyhow::Context;
use cgmath::{InnerSpace, Vector2, Vector3, Zero};

use crate::{
    data_structures::model::{GenericVertex, IndexType, Mesh, Submesh},
    resources::{
        load_string,
        material::{MaterialDescriptor, resolve_material},
        texture::TextureTable,
    },
    scene::heap::{HeapKind, SceneHeaps},
};

#[derive(Debug, Clone)]
pub struct SubmeshGeometry {
    pub name: String,
    /// Triangle list into the owning mesh's vertices.
    pub indices: Vec<u32>,
    pub material: Option<MaterialDescriptor>,
}

/// Vertex and index data of one mesh before it is written to the heaps.
#[derive(Debug, Clone, Default)]
pub struct MeshGeometry {
    pub name: String,
    pub positions: Vec<[f32; 3]>,
    pub tex_coords: Vec<[f32; 2]>,
    /// Empty if the source had none; see [`generate_normals`](Self::generate_normals).
    pub normals: Vec<[f32; 3]>,
    pub submeshes: Vec<SubmeshGeometry>,
}

impl MeshGeometry {
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangles(&self) -> impl Iterator<Item = &[u32]> {
        self.submeshes
            .iter()
            .flat_map(|submesh| submesh.indices.chunks_exact(3))
    }

    /// Area-weighted smooth normals.
    pub fn generate_normals(&mut self) {
        let mut normals = vec![Vector3::zero(); self.positions.len()];
        for c in self.triangles() {
            let p0: Vector3<f32> = self.positions[c[0] as usize].into();
            let p1: Vector3<f32> = self.positions[c[1] as usize].into();
            let p2: Vector3<f32> = self.positions[c[2] as usize].into();
            // unnormalized, so larger faces weigh more
            let face = (p1 - p0).cross(p2 - p0);
            for &i in c {
                normals[i as usize] += face;
            }
        }
        self.normals = normals
            .into_iter()
            .map(|n| {
                if n.magnitude2() > f32::EPSILON {
                    n.normalize().into()
                } else {
                    [0.0, 1.0, 0.0]
                }
            })
            .collect();
    }

    /// Interleaves texture coordinates with the tangent frame.
    pub fn generics(&self) -> Vec<GenericVertex> {
        let (tangents, bitangents) = compute_tangents(self);
        (0..self.vertex_count())
            .map(|i| {
                GenericVertex::new(
                    self.tex_coords.get(i).copied().unwrap_or_default(),
                    self.normals.get(i).copied().unwrap_or([0.0, 1.0, 0.0]),
                    tangents[i],
                    bitangents[i],
                )
            })
            .collect()
    }

    /// Writes the mesh into the heaps and resolves every submesh material.
    pub async fn upload(mut self, heaps: &mut SceneHeaps, textures: &mut TextureTable) -> anyhow::Result<Mesh> {
        if self.normals.len() != self.positions.len() {
            log::debug!("{} has no normals, generating them", self.name);
            self.generate_normals();
        }
        let generics = self.generics();
        let positions = heaps.allocate_slice(HeapKind::Positions, &self.positions)?;
        let generics = heaps.allocate_slice(HeapKind::Generics, &generics)?;

        let index_type = IndexType::for_vertex_count(self.vertex_count());
        let mut submeshes = Vec::with_capacity(self.submeshes.len());
        for submesh in self.submeshes {
            let indices = match index_type {
                IndexType::U16 => {
                    let narrow: Vec<u16> = submesh.indices.iter().map(|&i| i as u16).collect();
                    heaps.allocate_slice(HeapKind::Indices, &narrow)?
                }
                IndexType::U32 => heaps.allocate_slice(HeapKind::Indices, &submesh.indices)?,
            };
            let handles = resolve_material(&submesh.name, submesh.material.as_ref(), textures).await?;
            submeshes.push(Submesh {
                name: submesh.name,
                indices,
                index_type,
                index_count: submesh.indices.len() as u32,
                textures: handles,
            });
        }

        Ok(Mesh {
            name: self.name,
            positions,
            generics,
            vertex_count: self.positions.len() as u32,
            submeshes,
        })
    }
}

/**
 * Obj files don't come with tangents and bitangents so they are derived from
 * the texture coordinates for normal maps to work correctly.
 */
pub fn compute_tangents(geometry: &MeshGeometry) -> (Vec<[f32; 3]>, Vec<[f32; 3]>) {
    let n = geometry.vertex_count();
    let mut tangents = vec![Vector3::<f32>::zero(); n];
    let mut bitangents = vec![Vector3::<f32>::zero(); n];
    let mut triangles_included = vec![0u32; n];
    let uv = |i: u32| -> Vector2<f32> {
        geometry
            .tex_coords
            .get(i as usize)
            .copied()
            .unwrap_or_default()
            .into()
    };

    for c in geometry.triangles() {
        let pos0: Vector3<f32> = geometry.positions[c[0] as usize].into();
        let pos1: Vector3<f32> = geometry.positions[c[1] as usize].into();
        let pos2: Vector3<f32> = geometry.positions[c[2] as usize].into();

        let delta_pos1 = pos1 - pos0;
        let delta_pos2 = pos2 - pos0;
        let delta_uv1 = uv(c[1]) - uv(c[0]);
        let delta_uv2 = uv(c[2]) - uv(c[0]);

        // Solving
        //     delta_pos1 = delta_uv1.x * T + delta_uv1.y * B
        //     delta_pos2 = delta_uv2.x * T + delta_uv2.y * B
        let det = delta_uv1.x * delta_uv2.y - delta_uv1.y * delta_uv2.x;
        if det.abs() <= f32::EPSILON {
            continue;
        }
        let r = 1.0 / det;
        let tangent = (delta_pos1 * delta_uv2.y - delta_pos2 * delta_uv1.y) * r;
        // Flipped for right-handed normal maps with wgpu's texture coordinate system
        let bitangent = (delta_pos2 * delta_uv1.x - delta_pos1 * delta_uv2.x) * -r;

        for &i in c {
            tangents[i as usize] += tangent;
            bitangents[i as usize] += bitangent;
            triangles_included[i as usize] += 1;
        }
    }

    let mut out_tangents = Vec::with_capacity(n);
    let mut out_bitangents = Vec::with_capacity(n);
    for i in 0..n {
        let normal: Vector3<f32> = geometry.normals.get(i).copied().unwrap_or([0.0, 1.0, 0.0]).into();
        let (tangent, bitangent) = if triangles_included[i] > 0 && tangents[i].magnitude2() > f32::EPSILON {
            let denom = 1.0 / triangles_included[i] as f32;
            (tangents[i] * denom, bitangents[i] * denom)
        } else {
            fallback_basis(normal)
        };
        out_tangents.push(tangent.into());
        out_bitangents.push(bitangent.into());
    }
    (out_tangents, out_bitangents)
}

/// Any tangent frame around `normal`, for vertices without usable UVs.
fn fallback_basis(normal: Vector3<f32>) -> (Vector3<f32>, Vector3<f32>) {
    let helper = if normal.x.abs() < 0.9 {
        Vector3::unit_x()
    } else {
        Vector3::unit_y()
    };
    let tangent = normal.cross(helper).normalize();
    let bitangent = normal.cross(tangent);
    (tangent, bitangent)
}

/// Parses an OBJ file into one [`MeshGeometry`]. Every object or group of the
/// file becomes a submesh.
pub async fn parse_obj(asset_root: &Path, file_name: &str) -> anyhow::Result<MeshGeometry> {
    let obj_text = load_string(asset_root, file_name).await?;
    let mut obj_reader = BufReader::new(Cursor::new(obj_text));

    let root = asset_root.to_path_buf();
    let (models, obj_materials) = tobj::load_obj_buf_async(
        &mut obj_reader,
        &tobj::LoadOptions {
            triangulate: true,
            single_index: true,
            ..Default::default()
        },
        move |p| {
            let root = root.clone();
            async move {
                match load_string(&root, &p).await {
                    Ok(mat_text) => tobj::load_mtl_buf(&mut BufReader::new(Cursor::new(mat_text))),
                    Err(e) => {
                        log::warn!("Material library {p} could not be read: {e:#}");
                        Err(tobj::LoadError::OpenFileFailed)
                    }
                }
            }
        },
    )
    .await
    .with_context(|| format!("Failed to parse {file_name}"))?;

    let materials: Vec<MaterialDescriptor> = match obj_materials {
        Ok(materials) => materials.iter().map(MaterialDescriptor::from_obj).collect(),
        Err(e) => {
            log::warn!("{file_name} has no usable materials: {e}");
            Vec::new()
        }
    };

    let mut geometry = MeshGeometry {
        name: file_name.to_string(),
        ..Default::default()
    };
    let mut has_normals = true;
    for m in &models {
        let base = geometry.positions.len() as u32;
        let vertex_count = m.mesh.positions.len() / 3;
        has_normals &= m.mesh.normals.len() == m.mesh.positions.len();

        geometry.positions.extend(m.mesh.positions.chunks_exact(3).map(|p| [p[0], p[1], p[2]]));
        geometry.tex_coords.extend((0..vertex_count).map(|i| {
            [
                m.mesh.texcoords.get(i * 2).map_or(0.0, |f| *f),
                1.0 - m.mesh.texcoords.get(i * 2 + 1).map_or(0.0, |f| *f),
            ]
        }));
        geometry.normals.extend(m.mesh.normals.chunks_exact(3).map(|n| [n[0], n[1], n[2]]));

        geometry.submeshes.push(SubmeshGeometry {
            name: m.name.clone(),
            indices: m.mesh.indices.iter().map(|i| i + base).collect(),
            material: m.mesh.material_id.and_then(|id| materials.get(id).cloned()),
        });
    }
    if !has_normals {
        geometry.normals.clear();
    }
    Ok(geometry)
}

/// Imports an OBJ file into the heaps as a single mesh.
pub async fn load_obj_mesh(
    asset_root: &Path,
    file_name: &str,
    heaps: &mut SceneHeaps,
    textures: &mut TextureTable,
) -> anyhow::Result<Mesh> {
    let geometry = parse_obj(asset_root, file_name).await?;
    log::info!(
        "Imported {file_name}: {} vertices, {} submeshes",
        geometry.vertex_count(),
        geometry.submeshes.len()
    );
    geometry.upload(heaps, textures).await
}
