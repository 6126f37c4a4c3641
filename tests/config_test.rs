use std::path::PathBuf;

use bindless_hybrid::config::{
    ASSET_ROOT_ENV, Config, MAX_FRAMES_IN_FLIGHT, MAX_MODEL_INSTANCES, RENDER_MODE_ENV, RESIDENCY_CHUNK_SIZE,
    RenderMode,
};

#[test]
fn should_default_to_the_reference_scene() {
    let config = Config::default();
    assert_eq!(config.frames_in_flight, MAX_FRAMES_IN_FLIGHT);
    assert_eq!(config.max_model_instances, MAX_MODEL_INSTANCES);
    assert_eq!(config.residency_chunk_size, RESIDENCY_CHUNK_SIZE);
    assert_eq!(config.render_mode, RenderMode::Hybrid);
    assert_eq!(config.model_file, "firetruck.obj");
    assert_eq!(config.sky_file, "kloppenheim_06_4k.hdr");
    assert!(config.validate().is_ok());
}

#[test]
fn should_parse_render_modes() {
    assert_eq!("forward".parse::<RenderMode>().ok(), Some(RenderMode::Forward));
    assert_eq!(" Hybrid ".parse::<RenderMode>().ok(), Some(RenderMode::Hybrid));
    assert_eq!("deferred".parse::<RenderMode>().ok(), Some(RenderMode::Hybrid));
    let error = "raytraced".parse::<RenderMode>().expect_err("unknown mode");
    assert!(error.to_string().contains("raytraced"));
}

#[test]
fn should_reject_invalid_settings() {
    let no_frames = Config {
        frames_in_flight: 0,
        ..Default::default()
    };
    assert!(no_frames.validate().is_err());

    let no_chunks = Config {
        residency_chunk_size: 0,
        ..Default::default()
    };
    assert!(no_chunks.validate().is_err());

    let inverted_depth = Config {
        z_near: 10.0,
        z_far: 1.0,
        ..Default::default()
    };
    let error = inverted_depth.validate().expect_err("far before near");
    assert_eq!(error.to_string(), "invalid depth range: near 10 far 1");
}

#[test]
fn should_apply_environment_overrides() {
    // the only test of this binary touching the environment
    unsafe {
        std::env::set_var(ASSET_ROOT_ENV, "/tmp/bindless-assets");
        std::env::set_var(RENDER_MODE_ENV, "forward");
    }
    let config = Config::from_env().expect("valid overrides");
    assert_eq!(config.asset_root, PathBuf::from("/tmp/bindless-assets"));
    assert_eq!(config.render_mode, RenderMode::Forward);

    unsafe {
        std::env::set_var(RENDER_MODE_ENV, "wireframe");
    }
    assert!(Config::from_env().is_err());

    unsafe {
        std::env::remove_var(ASSET_ROOT_ENV);
        std::env::remove_var(RENDER_MODE_ENV);
    }
}
