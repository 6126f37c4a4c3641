use bindless_hybrid::pipelines::library::{
    DEFERRED_MODULE, DEFERRED_SOURCE, FORWARD_MODULE, FORWARD_SOURCE, GBUFFER_SOURCE, POST_SOURCE, SHADER_SOURCES,
    SKYBOX_SOURCE, declares_entry_point,
};

#[test]
fn should_find_every_pipeline_entry_point() {
    let entry_points = [
        (FORWARD_SOURCE, ["vs_forward", "fs_forward"]),
        (GBUFFER_SOURCE, ["vs_gbuffer", "fs_gbuffer"]),
        (DEFERRED_SOURCE, ["vs_fullscreen", "fs_deferred"]),
        (SKYBOX_SOURCE, ["vs_skybox", "fs_skybox"]),
        (POST_SOURCE, ["fs_bloom_threshold", "fs_post_merge"]),
        (POST_SOURCE, ["vs_fullscreen", "fs_rt_downsample"]),
    ];
    for (source, names) in entry_points {
        for name in names {
            assert!(declares_entry_point(source, name), "{name} not found");
        }
    }
}

#[test]
fn should_ignore_helper_functions() {
    assert!(!declares_entry_point(FORWARD_SOURCE, "shade"));
    assert!(!declares_entry_point(FORWARD_SOURCE, "resolve_keypath"));
    assert!(!declares_entry_point(POST_SOURCE, "luminance"));
}

#[test]
fn should_not_match_name_prefixes_or_missing_functions() {
    assert!(!declares_entry_point(FORWARD_SOURCE, "vs_forw"));
    assert!(!declares_entry_point(FORWARD_SOURCE, "forward"));
    assert!(!declares_entry_point(FORWARD_SOURCE, "fs_deferred"));
    assert!(!declares_entry_point("@vertex fn main_vs() {}", "vs"));
    assert!(declares_entry_point("@vertex fn main_vs() {}", "main_vs"));
}

#[test]
fn should_register_one_source_per_module() {
    let modules: Vec<&str> = SHADER_SOURCES.iter().map(|(module, _)| *module).collect();
    assert!(modules.contains(&FORWARD_MODULE));
    assert!(modules.contains(&DEFERRED_MODULE));
    let mut unique = modules.clone();
    unique.sort();
    unique.dedup();
    assert_eq!(unique.len(), modules.len());
}
