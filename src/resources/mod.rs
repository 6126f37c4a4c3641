//! Asset loading.
//!
//! Everything read from disk goes through this module: OBJ meshes, material
//! textures and the radiance map. Loaded data stays on the CPU until the scene
//! is made resident.

use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
};

use anyhow::Context;

use crate::{
    config::Config,
    data_structures::{
        instance::{configure_model_instances, mesh_slot},
        model::Mesh,
    },
    resources::{shapes::ShapeBuilder, texture::TextureTable},
    scene::{Scene, heap::SceneHeaps},
};

pub mod material;
pub mod mesh;
pub mod shapes;
pub mod texture;

fn asset_path(asset_root: &Path, file_name: impl AsRef<Path>) -> PathBuf {
    asset_root.join(file_name)
}

pub async fn load_string(asset_root: &Path, file_name: &str) -> anyhow::Result<String> {
    let path = asset_path(asset_root, file_name);
    tokio::fs::read_to_string(&path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))
}

pub async fn load_binary(asset_root: &Path, file_name: &str) -> anyhow::Result<Vec<u8>> {
    let path = asset_path(asset_root, file_name);
    tokio::fs::read(&path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))
}

/// Like [`load_binary`] but a missing file is `Ok(None)`.
pub async fn try_load_binary(asset_root: &Path, file_name: &Path) -> anyhow::Result<Option<Vec<u8>>> {
    let path = asset_path(asset_root, file_name);
    match tokio::fs::read(&path).await {
        Ok(data) => Ok(Some(data)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e).with_context(|| format!("Failed to read {}", path.display())),
    }
}

/// Loads the default scene: the configured OBJ model, a sphere and a floor
/// plane, placed by [`configure_model_instances`], plus the sky. The radiance
/// map is decoded while the meshes load.
pub async fn load_scene(config: &Config) -> anyhow::Result<Scene> {
    let mut heaps = SceneHeaps::new();
    let mut textures = TextureTable::new(&config.asset_root);
    let shapes = ShapeBuilder::default();

    let load_meshes = async {
        let mut meshes: Vec<Mesh> = Vec::with_capacity(3);
        let model = mesh::load_obj_mesh(&config.asset_root, &config.model_file, &mut heaps, &mut textures)
            .await
            .with_context(|| format!("Failed to load model {}", config.model_file))?;
        debug_assert_eq!(meshes.len(), mesh_slot::FIRETRUCK as usize);
        meshes.push(model);
        debug_assert_eq!(meshes.len(), mesh_slot::SPHERE as usize);
        meshes.push(shapes.sphere().upload(&mut heaps, &mut textures).await?);
        debug_assert_eq!(meshes.len(), mesh_slot::PLANE as usize);
        meshes.push(shapes.plane().upload(&mut heaps, &mut textures).await?);
        anyhow::Ok(meshes)
    };
    let load_sky = texture::load_radiance_texture(&config.asset_root, &config.sky_file);
    let (meshes, sky) = futures::try_join!(load_meshes, load_sky)?;
    let skybox = shapes.skybox()?;

    let instances = configure_model_instances(config.max_model_instances);
    log::info!(
        "Loaded {} meshes, {} textures and {} instances",
        meshes.len(),
        textures.len(),
        instances.len()
    );
    Ok(Scene::new(heaps, meshes, instances, textures, sky, skybox)?)
}
