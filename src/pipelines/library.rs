//! WGSL modules and entry point lookup.
//!
//! Shader modules are assembled from a handful of shared snippets. The
//! library compiles each module once; pipelines then ask it for functions by
//! module and entry point name.

use std::collections::HashMap;

use anyhow::{Context, bail};

pub const FORWARD_MODULE: &str = "forward";
pub const GBUFFER_MODULE: &str = "gbuffer";
pub const DEFERRED_MODULE: &str = "deferred";
pub const SKYBOX_MODULE: &str = "skybox";
pub const POST_MODULE: &str = "post";

pub const FORWARD_SOURCE: &str = concat!(
    include_str!("frame.wgsl"),
    include_str!("scene_common.wgsl"),
    include_str!("forward.wgsl"),
);
pub const GBUFFER_SOURCE: &str = concat!(
    include_str!("frame.wgsl"),
    include_str!("scene_common.wgsl"),
    include_str!("gbuffer.wgsl"),
);
pub const DEFERRED_SOURCE: &str = concat!(
    include_str!("fullscreen.wgsl"),
    include_str!("frame.wgsl"),
    include_str!("deferred.wgsl"),
);
pub const SKYBOX_SOURCE: &str = concat!(include_str!("frame.wgsl"), include_str!("skybox.wgsl"));
pub const POST_SOURCE: &str = concat!(include_str!("fullscreen.wgsl"), include_str!("post.wgsl"));

/// Every module of the library as `(name, source)`.
pub const SHADER_SOURCES: [(&str, &str); 5] = [
    (FORWARD_MODULE, FORWARD_SOURCE),
    (GBUFFER_MODULE, GBUFFER_SOURCE),
    (DEFERRED_MODULE, DEFERRED_SOURCE),
    (SKYBOX_MODULE, SKYBOX_SOURCE),
    (POST_MODULE, POST_SOURCE),
];

const STAGE_ATTRIBUTES: [&str; 3] = ["@vertex", "@fragment", "@compute"];

/// Whether `source` declares a shader stage entry point called `name`.
///
/// Looks for `fn name(` whose attributes, everything since the end of the
/// previous item, include a stage attribute.
pub fn declares_entry_point(source: &str, name: &str) -> bool {
    let needle = format!("fn {name}");
    let mut search_from = 0;
    while let Some(found) = source[search_from..].find(&needle) {
        let start = search_from + found;
        let end = start + needle.len();
        search_from = end;

        let boundary_before = source[..start]
            .chars()
            .next_back()
            .is_none_or(|c| !(c.is_alphanumeric() || c == '_'));
        let opens_parameters = source[end..].trim_start().starts_with('(');
        if !(boundary_before && opens_parameters) {
            continue;
        }

        let item_start = source[..start].rfind([';', '}']).map_or(0, |i| i + 1);
        let attributes = &source[item_start..start];
        if STAGE_ATTRIBUTES.iter().any(|stage| attributes.contains(stage)) {
            return true;
        }
    }
    false
}

/// A resolved entry point.
#[derive(Clone, Copy)]
pub struct ShaderFunction<'a> {
    pub module: &'a wgpu::ShaderModule,
    pub entry_point: &'a str,
}

struct LibraryModule {
    source: &'static str,
    module: wgpu::ShaderModule,
}

pub struct ShaderLibrary {
    modules: HashMap<&'static str, LibraryModule>,
}

impl ShaderLibrary {
    pub fn new(device: &wgpu::Device) -> Self {
        let modules = SHADER_SOURCES
            .iter()
            .map(|(name, source)| {
                let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
                    label: Some(name),
                    source: wgpu::ShaderSource::Wgsl((*source).into()),
                });
                (*name, LibraryModule { source, module })
            })
            .collect();
        Self { modules }
    }

    /// Looks up entry point `name` of `module`. Fails if the module does not
    /// declare it.
    pub fn function<'a>(&'a self, module: &str, name: &'a str) -> anyhow::Result<ShaderFunction<'a>> {
        let library_module = self
            .modules
            .get(module)
            .with_context(|| format!("Shader module `{module}` is not in the library"))?;
        if !declares_entry_point(library_module.source, name) {
            bail!("Shader module `{module}` has no entry point `{name}`");
        }
        Ok(ShaderFunction {
            module: &library_module.module,
            entry_point: name,
        })
    }
}
