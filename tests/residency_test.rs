use bindless_hybrid::{
    data_structures::model::{IndexType, POSITION_STRIDE},
    scene::{
        SceneError,
        arguments::{SceneArguments, build_scene_arguments},
        heap::{DeviceAddress, HeapKind},
        residency::{Resource, ResidencySet},
    },
};

use crate::common::test_utils::{asset_dir, small_scene, two_part_scene};

mod common;

#[tokio::test]
async fn should_verify_a_fully_committed_scene() {
    let assets = asset_dir();
    let mut scene = small_scene(assets.path()).await;
    let arguments = build_scene_arguments(&mut scene).expect("arguments");

    let mut residency = ResidencySet::new("test");
    residency.add_scene_resources(&arguments);
    residency.commit();

    let checked = residency
        .verify(&scene.heaps, &arguments)
        .expect("every reference is resident");
    assert!(checked > arguments.draws.len());
    assert_eq!(residency.allocation_count(), arguments.resources.len());
    for resource in &arguments.resources {
        assert!(residency.contains(resource));
    }
}

#[tokio::test]
async fn should_add_resources_in_chunks() {
    let assets = asset_dir();
    let mut scene = small_scene(assets.path()).await;
    let arguments = build_scene_arguments(&mut scene).expect("arguments");

    let mut residency = ResidencySet::new("chunks");
    assert_eq!(residency.chunk_size(), 16);
    let chunks = residency.add_scene_resources(&arguments);
    assert_eq!(chunks, arguments.resources.len().div_ceil(16));

    let mut single = ResidencySet::with_chunk_size("single", 0);
    assert_eq!(single.chunk_size(), 1);
    assert_eq!(single.add_scene_resources(&arguments), arguments.resources.len());
}

#[tokio::test]
async fn should_not_count_staged_resources_until_commit() {
    let assets = asset_dir();
    let mut scene = small_scene(assets.path()).await;
    let arguments = build_scene_arguments(&mut scene).expect("arguments");

    let mut residency = ResidencySet::new("staged");
    residency.add_scene_resources(&arguments);
    assert!(residency.has_pending());
    assert!(!residency.contains(&Resource::Heap(HeapKind::Arguments)));
    assert_eq!(
        residency.verify(&scene.heaps, &arguments),
        Err(SceneError::Uncommitted("staged".to_string()))
    );

    residency.commit();
    assert!(!residency.has_pending());
    assert!(residency.verify(&scene.heaps, &arguments).is_ok());
}

#[tokio::test]
async fn should_report_a_missing_texture() {
    let assets = asset_dir();
    let mut scene = small_scene(assets.path()).await;
    let arguments = build_scene_arguments(&mut scene).expect("arguments");

    let missing = scene.meshes[0].submeshes[0].textures[0];
    let resources: Vec<Resource> = arguments
        .resources
        .iter()
        .copied()
        .filter(|r| *r != Resource::Texture(missing))
        .collect();
    let mut residency = ResidencySet::new("no base colour");
    residency.add_allocations(&resources);
    residency.commit();

    assert_eq!(
        residency.verify(&scene.heaps, &arguments),
        Err(SceneError::TextureNotResident(missing))
    );
}

#[tokio::test]
async fn should_report_a_missing_allocation() {
    let assets = asset_dir();
    let mut scene = small_scene(assets.path()).await;
    let arguments = build_scene_arguments(&mut scene).expect("arguments");

    let missing = scene.meshes[1].submeshes[0].indices.id;
    let resources: Vec<Resource> = arguments
        .resources
        .iter()
        .copied()
        .filter(|r| *r != Resource::Allocation(missing))
        .collect();
    let mut residency = ResidencySet::new("no indices");
    residency.add_allocations(&resources);
    residency.commit();

    assert_eq!(
        residency.verify(&scene.heaps, &arguments),
        Err(SceneError::AllocationNotResident(missing))
    );
}

#[tokio::test]
async fn should_report_a_missing_heap() {
    let assets = asset_dir();
    let mut scene = small_scene(assets.path()).await;
    let arguments = build_scene_arguments(&mut scene).expect("arguments");

    let resources: Vec<Resource> = arguments
        .resources
        .iter()
        .copied()
        .filter(|r| *r != Resource::Heap(HeapKind::Arguments))
        .collect();
    let mut residency = ResidencySet::new("no argument heap");
    residency.add_allocations(&resources);
    residency.commit();

    assert_eq!(
        residency.verify(&scene.heaps, &arguments),
        Err(SceneError::HeapNotResident(HeapKind::Arguments))
    );
}

fn commit_all_but(arguments: &SceneArguments, dropped: Option<Resource>) -> ResidencySet {
    let resources: Vec<Resource> = arguments
        .resources
        .iter()
        .copied()
        .filter(|r| Some(*r) != dropped)
        .collect();
    let mut residency = ResidencySet::new("partial");
    residency.add_allocations(&resources);
    residency.commit();
    residency
}

#[tokio::test]
async fn should_walk_every_submesh_of_a_split_mesh() {
    let assets = asset_dir();
    let mut scene = two_part_scene(assets.path()).await;
    let arguments = build_scene_arguments(&mut scene).expect("arguments");

    let residency = commit_all_but(&arguments, None);
    assert!(residency.verify(&scene.heaps, &arguments).is_ok());

    let missing = scene.meshes[0].submeshes[1].indices.id;
    let residency = commit_all_but(&arguments, Some(Resource::Allocation(missing)));
    assert_eq!(
        residency.verify(&scene.heaps, &arguments),
        Err(SceneError::AllocationNotResident(missing))
    );
}

#[tokio::test]
async fn should_require_every_vertex_of_the_position_stream() {
    let assets = asset_dir();
    let mut scene = small_scene(assets.path()).await;
    // the sphere keeps its indices but loses all but its first three vertices
    let truncated = scene
        .heaps
        .allocate_slice(HeapKind::Positions, &[[0.0f32; 3]; 3])
        .expect("allocate");
    let sphere = &mut scene.meshes[1];
    sphere.positions = truncated;
    let vertex_count = sphere.vertex_count;
    let arguments = build_scene_arguments(&mut scene).expect("arguments");

    let residency = commit_all_but(&arguments, None);
    assert_eq!(
        residency.verify(&scene.heaps, &arguments),
        Err(SceneError::UnresolvedAddress {
            address: DeviceAddress::new(HeapKind::Positions, truncated.offset),
            len: vertex_count * POSITION_STRIDE as u32,
        })
    );
}

#[tokio::test]
async fn should_reject_indices_past_the_vertex_streams() {
    let assets = asset_dir();
    let mut scene = small_scene(assets.path()).await;
    let stray = scene
        .heaps
        .allocate_slice(HeapKind::Indices, &[0u16, 1, 600, 0])
        .expect("allocate");
    let submesh = &mut scene.meshes[1].submeshes[0];
    assert_eq!(submesh.index_type, IndexType::U16);
    submesh.indices = stray;
    submesh.index_count = 3;
    let positions = scene.meshes[1].positions;
    let arguments = build_scene_arguments(&mut scene).expect("arguments");

    let residency = commit_all_but(&arguments, None);
    assert_eq!(
        residency.verify(&scene.heaps, &arguments),
        Err(SceneError::UnresolvedAddress {
            address: positions.address(),
            len: 601 * POSITION_STRIDE as u32,
        })
    );
}
