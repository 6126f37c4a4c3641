use bindless_hybrid::{
    camera::CameraUniform,
    data_structures::{
        arguments::{InstanceData, SceneRoot, SubmeshData, TextureSlot, layout},
        instance::ModelInstance,
        model::{GENERIC_STRIDE, GenericVertex, POSITION_STRIDE},
    },
    pipelines::{library::FORWARD_SOURCE, light::LightUniform, post::PostUniform},
};

/// Value of `const NAME: u32 = Nu;` in a WGSL source.
fn wgsl_u32_const(source: &str, name: &str) -> u32 {
    let prefix = format!("const {name}: u32 = ");
    let line = source
        .lines()
        .find_map(|line| line.trim().strip_prefix(prefix.as_str()))
        .unwrap_or_else(|| panic!("{name} is not declared"));
    line.trim_end_matches(';')
        .trim_end_matches('u')
        .parse()
        .expect("numeric constant")
}

#[test]
fn should_match_wgsl_record_strides() {
    assert_eq!(
        wgsl_u32_const(FORWARD_SOURCE, "INSTANCE_DATA_STRIDE") as usize,
        layout::INSTANCE_DATA_STRIDE
    );
    assert_eq!(
        wgsl_u32_const(FORWARD_SOURCE, "MESH_DATA_STRIDE") as usize,
        layout::MESH_DATA_STRIDE
    );
    assert_eq!(
        wgsl_u32_const(FORWARD_SOURCE, "SUBMESH_DATA_STRIDE") as usize,
        layout::SUBMESH_DATA_STRIDE
    );
    assert_eq!(
        wgsl_u32_const(FORWARD_SOURCE, "POSITION_STRIDE_WORDS") as usize * 4,
        POSITION_STRIDE
    );
    assert_eq!(
        wgsl_u32_const(FORWARD_SOURCE, "GENERIC_STRIDE_WORDS") as usize * 4,
        GENERIC_STRIDE
    );
}

#[test]
fn should_store_instance_transform_after_mesh_index() {
    let instance = ModelInstance::new(2, [1.0, 2.0, 3.0], 0.0);
    let raw = instance.to_raw();
    let bytes: &[u8] = bytemuck::bytes_of(&raw);
    assert_eq!(bytes.len(), layout::INSTANCE_DATA_STRIDE);

    let mesh_index: u32 = bytemuck::pod_read_unaligned(&bytes[0..4]);
    assert_eq!(mesh_index, 2);
    assert!(bytes[4..16].iter().all(|b| *b == 0));

    // column-major: the translation is the fourth column
    let translation: [f32; 4] = bytemuck::pod_read_unaligned(
        &bytes[layout::INSTANCE_TRANSFORM_OFFSET + 48..layout::INSTANCE_TRANSFORM_OFFSET + 64],
    );
    assert_eq!(translation, [1.0, 2.0, 3.0, 1.0]);
}

#[test]
fn should_place_material_handles_in_slot_order() {
    let record = SubmeshData {
        short_index_type: 1,
        indices: 64,
        index_count: 36,
        materials: [10, 11, 12, 13, 14],
    };
    let bytes = bytemuck::bytes_of(&record);
    for slot in TextureSlot::ALL {
        let offset = layout::SUBMESH_MATERIALS_OFFSET + slot.index() * 4;
        let handle: u32 = bytemuck::pod_read_unaligned(&bytes[offset..offset + 4]);
        assert_eq!(handle, 10 + slot.index() as u32, "slot {slot}");
    }
}

#[test]
fn should_order_texture_slots() {
    let names: Vec<&str> = TextureSlot::ALL.iter().map(|slot| slot.name()).collect();
    assert_eq!(
        names,
        ["baseColor", "metallic", "roughness", "tangentSpaceNormal", "ambientOcclusion"]
    );
    for (i, slot) in TextureSlot::ALL.iter().enumerate() {
        assert_eq!(slot.index(), i);
    }
    assert!(TextureSlot::BaseColor.is_srgb());
    assert!(!TextureSlot::Normal.is_srgb());
}

#[test]
fn should_pack_generic_vertices_as_half_floats() {
    let vertex = GenericVertex::new([0.25, 0.75], [0.0, 1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, -1.0]);
    let bytes = bytemuck::bytes_of(&vertex);
    assert_eq!(bytes.len(), GENERIC_STRIDE);

    let uv: [f32; 2] = bytemuck::pod_read_unaligned(&bytes[0..8]);
    assert_eq!(uv, [0.25, 0.75]);
    let bitangent: [half::f16; 4] = bytemuck::pod_read_unaligned(&bytes[24..32]);
    assert_eq!(bitangent[2].to_f32(), -1.0);
}

#[test]
fn should_size_uniforms_for_wgsl() {
    assert_eq!(std::mem::size_of::<CameraUniform>(), 160);
    assert_eq!(std::mem::size_of::<LightUniform>(), 32);
    assert_eq!(std::mem::size_of::<PostUniform>(), 16);
    assert_eq!(std::mem::size_of::<SceneRoot>(), 16);
    assert_eq!(std::mem::size_of::<InstanceData>() % 16, 0);
}
