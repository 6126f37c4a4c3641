//! Materials and how their properties become texture handles.

use thiserror::Error;

use crate::{
    data_structures::{
        arguments::{MATERIAL_TEXTURE_COUNT, TextureSlot},
        texture::TextureHandle,
    },
    resources::texture::TextureTable,
};

#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    /// A texture name or path.
    String(String),
    Float(f32),
}

#[derive(Debug, Clone, PartialEq)]
pub struct MaterialProperty {
    pub slot: TextureSlot,
    pub value: PropertyValue,
}

/// Material as authored: an ordered list of properties per slot.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MaterialDescriptor {
    pub name: String,
    pub properties: Vec<MaterialProperty>,
}

#[derive(Debug, Error, PartialEq)]
pub enum MaterialError {
    #[error("Submesh doesn't have a material")]
    MissingMaterial { submesh: String },
    #[error("Texture for semantic {slot} string: {name} not found")]
    TextureNotFound { slot: TextureSlot, name: String },
    #[error("No material property found for {slot}")]
    MissingProperty { slot: TextureSlot },
}

// MTL keys per slot, in lookup order.
const BASE_COLOR_KEYS: &[&str] = &["map_Kd"];
const METALLIC_KEYS: &[&str] = &["map_Pm", "map_metallic"];
const ROUGHNESS_KEYS: &[&str] = &["map_Pr", "map_roughness"];
const NORMAL_KEYS: &[&str] = &["map_Bump", "bump", "norm", "map_tangentSpaceNormal"];
const AMBIENT_OCCLUSION_KEYS: &[&str] = &["map_Ka", "map_ao"];

impl MaterialDescriptor {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            properties: Vec::new(),
        }
    }

    pub fn with_texture(mut self, slot: TextureSlot, texture: &str) -> Self {
        self.properties.push(MaterialProperty {
            slot,
            value: PropertyValue::String(texture.to_string()),
        });
        self
    }

    pub fn with_value(mut self, slot: TextureSlot, value: f32) -> Self {
        self.properties.push(MaterialProperty {
            slot,
            value: PropertyValue::Float(value),
        });
        self
    }

    pub fn properties(&self, slot: TextureSlot) -> impl Iterator<Item = &MaterialProperty> {
        self.properties.iter().filter(move |p| p.slot == slot)
    }

    /// Material of the procedural shapes; only the base colour differs.
    pub fn procedural(name: &str, base_color: &str) -> Self {
        Self::new(name)
            .with_texture(TextureSlot::BaseColor, base_color)
            .with_texture(TextureSlot::Metallic, "white")
            .with_texture(TextureSlot::Roughness, "black")
            .with_texture(TextureSlot::Normal, "BodyNormalMap")
            .with_texture(TextureSlot::AmbientOcclusion, "white")
    }

    /// Collects the texture properties of an MTL material. Scalar `Pm`/`Pr`
    /// values are kept as non-texture properties.
    pub fn from_obj(material: &tobj::Material) -> Self {
        let mut descriptor = Self::new(&material.name);
        let lookup = |key: &str| -> Option<String> {
            let known = match key {
                "map_Kd" => material.diffuse_texture.clone(),
                "map_Ka" => material.ambient_texture.clone(),
                "map_Bump" | "bump" => material.normal_texture.clone(),
                _ => None,
            };
            known.or_else(|| material.unknown_param.get(key).cloned())
        };

        let slots = [
            (TextureSlot::BaseColor, BASE_COLOR_KEYS),
            (TextureSlot::Metallic, METALLIC_KEYS),
            (TextureSlot::Roughness, ROUGHNESS_KEYS),
            (TextureSlot::Normal, NORMAL_KEYS),
            (TextureSlot::AmbientOcclusion, AMBIENT_OCCLUSION_KEYS),
        ];
        for (slot, keys) in slots {
            for key in keys {
                if let Some(texture) = lookup(key) {
                    descriptor = descriptor.with_texture(slot, texture_file(&texture));
                }
            }
        }
        for (slot, key) in [(TextureSlot::Metallic, "Pm"), (TextureSlot::Roughness, "Pr")] {
            if let Some(value) = material.unknown_param.get(key).and_then(|v| v.trim().parse().ok()) {
                descriptor = descriptor.with_value(slot, value);
            }
        }
        descriptor
    }
}

/// MTL texture statements may carry options before the file name.
fn texture_file(statement: &str) -> &str {
    statement.split_whitespace().last().unwrap_or(statement)
}

/// Resolves one texture per slot.
///
/// For each slot the first string property wins; scalar properties are
/// skipped. A string that resolves to nothing is an error, as is a slot
/// without any string property.
pub async fn resolve_material(
    submesh: &str,
    material: Option<&MaterialDescriptor>,
    textures: &mut TextureTable,
) -> anyhow::Result<[TextureHandle; MATERIAL_TEXTURE_COUNT]> {
    let material = material.ok_or_else(|| MaterialError::MissingMaterial {
        submesh: submesh.to_string(),
    })?;

    let mut handles = [TextureHandle(0); MATERIAL_TEXTURE_COUNT];
    for slot in TextureSlot::ALL {
        let name = material
            .properties(slot)
            .find_map(|p| match &p.value {
                PropertyValue::String(name) => Some(name.as_str()),
                PropertyValue::Float(_) => None,
            })
            .ok_or(MaterialError::MissingProperty { slot })?;
        let handle = textures
            .resolve(name, slot.is_srgb())
            .await?
            .ok_or_else(|| MaterialError::TextureNotFound {
                slot,
                name: name.to_string(),
            })?;
        handles[slot.index()] = handle;
    }
    log::debug!("Resolved material {} of submesh {submesh}", material.name);
    Ok(handles)
}
