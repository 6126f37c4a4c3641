use bindless_hybrid::{
    data_structures::{arguments::TextureSlot, model::IndexType},
    resources::{
        material::MaterialError,
        mesh::{load_obj_mesh, parse_obj},
        texture::TextureTable,
    },
    scene::heap::{HeapKind, SceneHeaps},
};

use crate::common::test_utils::{asset_dir, write_file, write_png};

mod common;

const TRUCK_OBJ: &str = "mtllib truck.mtl
o body
v 0 0 0
v 1 0 0
v 1 0 1
v 0 0 1
vt 0 0
vt 1 0
vt 1 1
vt 0 1
usemtl paint
f 1/1 2/2 3/3 4/4
o cab
v 0 1 0
v 1 1 0
v 0 1 1
vt 0 0
vt 1 0
vt 0 1
usemtl paint
f 5/5 6/6 7/7
";

const TRUCK_MTL: &str = "newmtl paint
map_Kd body.png
map_Pm white
map_Pr black
map_Bump BodyNormalMap.png
map_Ka white
";

fn truck_assets(with_mtl: bool) -> tempfile::TempDir {
    let dir = asset_dir();
    write_file(dir.path(), "truck.obj", TRUCK_OBJ);
    write_png(dir.path(), "body.png", [180, 20, 20, 255]);
    if with_mtl {
        write_file(dir.path(), "truck.mtl", TRUCK_MTL);
    }
    dir
}

#[tokio::test]
async fn should_turn_objects_into_submeshes() {
    let assets = truck_assets(true);
    let geometry = parse_obj(assets.path(), "truck.obj").await.expect("parse");

    assert_eq!(geometry.vertex_count(), 7);
    let names: Vec<&str> = geometry.submeshes.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, ["body", "cab"]);
    assert_eq!(geometry.submeshes[0].indices.len(), 6);
    // indices of later objects point past the earlier objects' vertices
    assert_eq!(geometry.submeshes[1].indices, [4, 5, 6]);
    assert!(geometry.submeshes.iter().all(|s| s.material.is_some()));
}

#[tokio::test]
async fn should_flip_v_and_generate_normals() {
    let assets = truck_assets(true);
    let mut geometry = parse_obj(assets.path(), "truck.obj").await.expect("parse");

    assert_eq!(geometry.tex_coords[0], [0.0, 1.0]);
    assert_eq!(geometry.tex_coords[2], [1.0, 0.0]);
    assert!(geometry.normals.is_empty());

    geometry.generate_normals();
    assert_eq!(geometry.normals.len(), 7);
    for normal in &geometry.normals {
        assert!((normal[1] + 1.0).abs() < 1e-5, "{normal:?}");
    }
}

#[tokio::test]
async fn should_load_the_mesh_into_the_heaps() {
    let assets = truck_assets(true);
    let mut heaps = SceneHeaps::new();
    let mut textures = TextureTable::new(assets.path());

    let mesh = load_obj_mesh(assets.path(), "truck.obj", &mut heaps, &mut textures)
        .await
        .expect("load");

    assert_eq!(mesh.vertex_count, 7);
    assert_eq!(mesh.positions.size, 7 * 12);
    assert_eq!(mesh.generics.heap, HeapKind::Generics);
    assert_eq!(mesh.submeshes.len(), 2);
    for (submesh, count) in mesh.submeshes.iter().zip([6, 3]) {
        assert_eq!(submesh.index_type, IndexType::U16);
        assert_eq!(submesh.index_count, count);
        assert_eq!(submesh.indices.heap, HeapKind::Indices);
    }

    let body = &mesh.submeshes[0];
    let base_color = textures.get(body.texture(TextureSlot::BaseColor)).expect("resident");
    assert_eq!(base_color.label, "body.png");
    assert!(base_color.format.is_srgb());
    let normal = textures.get(body.texture(TextureSlot::Normal)).expect("resident");
    assert_eq!(normal.label, "BodyNormalMap.png");
    // both submeshes share the one material's textures
    assert_eq!(body.textures, mesh.submeshes[1].textures);
}

#[tokio::test]
async fn should_fail_when_the_material_library_is_missing() {
    let assets = truck_assets(false);
    let mut heaps = SceneHeaps::new();
    let mut textures = TextureTable::new(assets.path());

    let error = load_obj_mesh(assets.path(), "truck.obj", &mut heaps, &mut textures)
        .await
        .expect_err("no materials");
    assert_eq!(
        error.downcast_ref::<MaterialError>(),
        Some(&MaterialError::MissingMaterial {
            submesh: "body".to_string()
        })
    );
}

#[tokio::test]
async fn should_fail_on_a_missing_obj() {
    let assets = asset_dir();
    let error = parse_obj(assets.path(), "nothing.obj").await.expect_err("missing");
    assert!(error.to_string().contains("nothing.obj"));
}
