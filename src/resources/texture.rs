//! Material texture lookup and the radiance map loader.

use std::{
    collections::HashMap,
    path::{Path, PathBuf},
};

use anyhow::{Context, bail};
use half::f16;

use crate::{
    data_structures::texture::{TextureHandle, TextureImage},
    resources::try_load_binary,
};

/// Names resolved without touching the filesystem.
pub const BUILTIN_TEXTURES: [&str; 4] = ["white", "black", "checkerboard_gray", "flat_normal"];

const CHECKER_SIZE: u32 = 64;
const CHECKER_CELL: u32 = 8;

fn builtin_texture(name: &str, srgb: bool) -> Option<TextureImage> {
    let image = match name {
        "white" => TextureImage::solid(name, 1, 1, [255, 255, 255, 255], srgb),
        "black" => TextureImage::solid(name, 1, 1, [0, 0, 0, 255], srgb),
        // The blue/purple-ish colour that represents "no deformation" in normal maps
        "flat_normal" => TextureImage::solid(name, 1, 1, [127, 127, 255, 255], srgb),
        "checkerboard_gray" => {
            let img = image::RgbaImage::from_fn(CHECKER_SIZE, CHECKER_SIZE, |x, y| {
                let v = if (x / CHECKER_CELL + y / CHECKER_CELL) % 2 == 0 {
                    96
                } else {
                    176
                };
                image::Rgba([v, v, v, 255])
            });
            TextureImage::from_rgba8(name, &img, srgb)
        }
        _ => return None,
    };
    Some(image)
}

/// Files tried, in order, for a texture name found in a material.
pub fn candidate_paths(name: &str) -> Vec<PathBuf> {
    let mut candidates = vec![PathBuf::from(name)];
    let last = name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(name)
        .to_string();
    if last != name {
        candidates.push(PathBuf::from(&last));
    }
    for extension in ["png", "jpg"] {
        candidates.push(PathBuf::from(format!("{last}.{extension}")));
    }
    candidates
}

/// Every material texture of a scene. A handle is the texture's position in
/// [`images`](Self::images) and therefore in the material binding array.
#[derive(Debug)]
pub struct TextureTable {
    asset_root: PathBuf,
    images: Vec<TextureImage>,
    cache: HashMap<(String, bool), TextureHandle>,
}

impl TextureTable {
    pub fn new(asset_root: impl Into<PathBuf>) -> Self {
        Self {
            asset_root: asset_root.into(),
            images: Vec::new(),
            cache: HashMap::new(),
        }
    }

    pub fn asset_root(&self) -> &Path {
        &self.asset_root
    }

    pub fn images(&self) -> &[TextureImage] {
        &self.images
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    pub fn get(&self, handle: TextureHandle) -> Option<&TextureImage> {
        self.images.get(handle.index())
    }

    pub fn handles(&self) -> impl Iterator<Item = TextureHandle> + '_ {
        (0..self.images.len() as u32).map(TextureHandle)
    }

    pub fn insert(&mut self, name: &str, image: TextureImage) -> TextureHandle {
        let srgb = image.format.is_srgb();
        let handle = TextureHandle(self.images.len() as u32);
        self.images.push(image);
        self.cache.insert((name.to_string(), srgb), handle);
        handle
    }

    /// Looks `name` up as a built-in, then as a file under the asset root.
    /// Returns `Ok(None)` if nothing matches; decode failures are errors.
    pub async fn resolve(&mut self, name: &str, srgb: bool) -> anyhow::Result<Option<TextureHandle>> {
        let key = (name.to_string(), srgb);
        if let Some(handle) = self.cache.get(&key) {
            return Ok(Some(*handle));
        }

        if let Some(image) = builtin_texture(name, srgb) {
            return Ok(Some(self.insert(name, image)));
        }

        for candidate in candidate_paths(name) {
            let Some(bytes) = try_load_binary(&self.asset_root, &candidate).await? else {
                continue;
            };
            let img = image::load_from_memory(&bytes)
                .with_context(|| format!("Failed to decode texture {}", candidate.display()))?;
            log::debug!("Loaded texture {name} from {}", candidate.display());
            let image = TextureImage::from_rgba8(name, &img.to_rgba8(), srgb);
            return Ok(Some(self.insert(name, image)));
        }
        Ok(None)
    }
}

/// Loads an equirectangular radiance map as `Rgba16Float`.
pub async fn load_radiance_texture(asset_root: &Path, file_name: &str) -> anyhow::Result<TextureImage> {
    let is_hdr = Path::new(file_name)
        .extension()
        .is_some_and(|extension| extension.eq_ignore_ascii_case("hdr"));
    if !is_hdr {
        bail!("Only (.hdr) files are supported.");
    }
    let bytes = try_load_binary(asset_root, Path::new(file_name))
        .await?
        .with_context(|| format!("Radiance map {file_name} not found"))?;
    let img = image::load_from_memory_with_format(&bytes, image::ImageFormat::Hdr)
        .with_context(|| format!("Failed to decode radiance map {file_name}"))?;
    Ok(radiance_image(file_name, &img.to_rgba32f()))
}

/// Packs float RGBA pixels into half floats.
pub fn radiance_image(label: &str, img: &image::Rgba32FImage) -> TextureImage {
    let halves: Vec<f16> = img.as_raw().iter().map(|v| f16::from_f32(*v)).collect();
    TextureImage {
        label: label.to_string(),
        width: img.width(),
        height: img.height(),
        format: wgpu::TextureFormat::Rgba16Float,
        data: bytemuck::cast_slice(&halves).to_vec(),
    }
}
