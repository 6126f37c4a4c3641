use std::path::Path;

use bindless_hybrid::{
    data_structures::{instance::configure_model_instances, texture::TextureImage},
    resources::{
        material::MaterialDescriptor,
        mesh::{MeshGeometry, SubmeshGeometry},
        shapes::ShapeBuilder,
        texture::TextureTable,
    },
    scene::{Scene, heap::SceneHeaps},
};
use tempfile::TempDir;

/// Procedural shapes with few segments, so scenes stay small.
pub fn small_shapes() -> ShapeBuilder {
    ShapeBuilder {
        sphere_segments: [6, 4],
        plane_segments: [2, 2],
        skybox_segments: [4, 4],
        ..Default::default()
    }
}

pub fn write_png(dir: &Path, name: &str, rgba: [u8; 4]) {
    let img = image::RgbaImage::from_pixel(4, 4, image::Rgba(rgba));
    img.save(dir.join(name)).expect("write png fixture");
}

pub fn write_file(dir: &Path, name: &str, contents: &str) {
    std::fs::write(dir.join(name), contents).expect("write fixture");
}

/// An asset root holding the normal map the procedural materials reference.
pub fn asset_dir() -> TempDir {
    let dir = tempfile::tempdir().expect("create temp dir");
    write_png(dir.path(), "BodyNormalMap.png", [127, 127, 255, 255]);
    dir
}

/// The small plane with its second half of triangles moved to a submesh of
/// its own, 12 indices each.
pub fn two_part_plane() -> MeshGeometry {
    let mut plane = small_shapes().plane();
    let back = plane.submeshes[0].indices.split_off(12);
    plane.submeshes.push(SubmeshGeometry {
        name: "plane back".to_string(),
        indices: back,
        material: Some(MaterialDescriptor::procedural("plane back", "white")),
    });
    plane
}

/// The default scene layout with a plane standing in for the OBJ model.
pub async fn small_scene(asset_root: &Path) -> Scene {
    let shapes = small_shapes();
    scene_of(asset_root, [shapes.plane(), shapes.sphere(), shapes.plane()]).await
}

/// Like [`small_scene`], but the model is [`two_part_plane`]. Both model
/// instances come first, so keypaths 0 to 3 cover its two submeshes twice.
pub async fn two_part_scene(asset_root: &Path) -> Scene {
    let shapes = small_shapes();
    scene_of(asset_root, [two_part_plane(), shapes.sphere(), shapes.plane()]).await
}

async fn scene_of(asset_root: &Path, geometries: [MeshGeometry; 3]) -> Scene {
    let mut heaps = SceneHeaps::new();
    let mut textures = TextureTable::new(asset_root);
    let mut meshes = Vec::new();
    for geometry in geometries {
        meshes.push(
            geometry
                .upload(&mut heaps, &mut textures)
                .await
                .expect("upload procedural mesh"),
        );
    }
    let sky = TextureImage::solid("sky", 2, 1, [40, 60, 90, 255], false);
    Scene::new(
        heaps,
        meshes,
        configure_model_instances(4),
        textures,
        sky,
        small_shapes().skybox().expect("sky dome"),
    )
    .expect("valid scene")
}
