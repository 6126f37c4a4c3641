//! Bloom threshold, the render target mip chains and the final tone-mapping
//! merge.
//!
//! The HDR target carries a second level that the `rt_mipmap` pipeline fills
//! by downsampling; the threshold pass reads that half resolution level. The
//! bloom target is a pyramid of its own, downsampled the same way, and the
//! merge averages every bloom level into the final image.

use wgpu::util::DeviceExt;

use crate::{
    config::Config,
    data_structures::texture::{Texture, create_clamped_sampler},
    pipelines::{
        basic::{HDR_FORMAT, mk_render_pipeline, opaque_target},
        library::{POST_MODULE, ShaderLibrary},
    },
};

pub const BLOOM_FORMAT: wgpu::TextureFormat = HDR_FORMAT;

/// Mirrors `PostData` in `post.wgsl`.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct PostUniform {
    pub exposure: f32,
    pub bloom_threshold: f32,
    pub bloom_strength: f32,
    _padding: f32,
}

impl PostUniform {
    pub fn from_config(config: &Config) -> Self {
        Self {
            exposure: config.exposure,
            bloom_threshold: config.bloom_threshold,
            bloom_strength: config.bloom_strength,
            _padding: 0.0,
        }
    }
}

/// Levels of the HDR chain: full resolution plus the level bloom starts from.
pub const HDR_MIP_LEVELS: u32 = 2;
/// Upper bound of the bloom pyramid.
pub const BLOOM_MIP_LEVELS: u32 = 5;

/// Bloom is computed at half resolution.
pub fn bloom_size(size: [u32; 2]) -> [u32; 2] {
    [(size[0] / 2).max(1), (size[1] / 2).max(1)]
}

/// Number of mips of a `size` target: the full chain down to 1x1, capped at
/// `max_levels`.
pub fn rt_mip_level_count(size: [u32; 2], max_levels: u32) -> u32 {
    let full_chain = u32::BITS - size[0].max(size[1]).max(1).leading_zeros();
    full_chain.min(max_levels).max(1)
}

fn texture_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Texture {
            multisampled: false,
            view_dimension: wgpu::TextureViewDimension::D2,
            sample_type: wgpu::TextureSampleType::Float { filterable: true },
        },
        count: None,
    }
}

pub fn mk_bind_group_layout(device: &wgpu::Device, with_bloom: bool) -> wgpu::BindGroupLayout {
    let mut entries = vec![
        texture_entry(0),
        wgpu::BindGroupLayoutEntry {
            binding: 1,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
            count: None,
        },
        wgpu::BindGroupLayoutEntry {
            binding: 2,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        },
    ];
    if with_bloom {
        entries.push(texture_entry(3));
    }
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some(if with_bloom {
            "Post Merge Bind Group Layout"
        } else {
            "Bloom Threshold Bind Group Layout"
        }),
        entries: &entries,
    })
}

/// Post-processing state that does not depend on the surface size.
pub struct PostResources {
    pub threshold_layout: wgpu::BindGroupLayout,
    pub merge_layout: wgpu::BindGroupLayout,
    pub uniform_buffer: wgpu::Buffer,
    pub sampler: wgpu::Sampler,
}

impl PostResources {
    pub fn new(device: &wgpu::Device, uniform: PostUniform) -> Self {
        Self {
            threshold_layout: mk_bind_group_layout(device, false),
            merge_layout: mk_bind_group_layout(device, true),
            uniform_buffer: device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Post Uniform Buffer"),
                contents: bytemuck::cast_slice(&[uniform]),
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            }),
            sampler: create_clamped_sampler(device, "Post Sampler"),
        }
    }

    /// Binds one texture view for the threshold and downsample passes.
    pub fn source_bind_group(&self, device: &wgpu::Device, label: &str, source: &wgpu::TextureView) -> wgpu::BindGroup {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(label),
            layout: &self.threshold_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(source),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: self.uniform_buffer.as_entire_binding(),
                },
            ],
        })
    }

    /// `bloom` must view the whole bloom pyramid.
    pub fn merge_bind_group(
        &self,
        device: &wgpu::Device,
        hdr: &wgpu::TextureView,
        bloom: &wgpu::TextureView,
    ) -> wgpu::BindGroup {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Post Merge Bind Group"),
            layout: &self.merge_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(hdr),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: self.uniform_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: wgpu::BindingResource::TextureView(bloom),
                },
            ],
        })
    }
}

/// A render target whose lower mips are generated from level 0.
pub struct MipChain {
    /// `target.view` is level 0, the attachment earlier passes draw into.
    pub target: Texture,
    /// Every level at once, for sampling with an explicit LOD.
    pub full_view: wgpu::TextureView,
    levels: Vec<wgpu::TextureView>,
    /// Entry `i` reads level `i`; its pass writes level `i + 1`.
    downsample_bind_groups: Vec<wgpu::BindGroup>,
}

impl MipChain {
    pub fn new(
        device: &wgpu::Device,
        post: &PostResources,
        size: [u32; 2],
        format: wgpu::TextureFormat,
        max_levels: u32,
        label: &str,
    ) -> Self {
        let level_count = rt_mip_level_count(size, max_levels);
        let target = Texture::create_mipmapped_render_target(device, size, format, level_count, label);
        let full_view = target.texture.create_view(&wgpu::TextureViewDescriptor::default());
        let levels: Vec<wgpu::TextureView> = (0..level_count).map(|level| target.mip_view(level)).collect();
        let downsample_bind_groups = levels
            .iter()
            .take(levels.len() - 1)
            .map(|source| post.source_bind_group(device, "RT Mipmap Bind Group", source))
            .collect();
        Self {
            target,
            full_view,
            levels,
            downsample_bind_groups,
        }
    }

    pub fn level_count(&self) -> u32 {
        self.levels.len() as u32
    }

    /// The smallest level of the chain.
    pub fn last_level(&self) -> &wgpu::TextureView {
        &self.levels[self.levels.len() - 1]
    }

    /// One pass per level below 0, each reading the level above it.
    pub fn encode_downsample(&self, encoder: &mut wgpu::CommandEncoder, rt_mipmap: &wgpu::RenderPipeline) {
        for (bind_group, destination) in self.downsample_bind_groups.iter().zip(&self.levels[1..]) {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("RT Mipmap Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: destination,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                occlusion_query_set: None,
                timestamp_writes: None,
            });
            render_pass.set_pipeline(rt_mipmap);
            render_pass.set_bind_group(0, bind_group, &[]);
            render_pass.draw(0..3, 0..1);
        }
    }
}

pub fn mk_bloom_threshold_pipeline(
    device: &wgpu::Device,
    library: &ShaderLibrary,
    layout: &wgpu::BindGroupLayout,
) -> anyhow::Result<wgpu::RenderPipeline> {
    let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("Bloom Threshold Pipeline Layout"),
        bind_group_layouts: &[layout],
        push_constant_ranges: &[],
    });
    Ok(mk_render_pipeline(
        device,
        "Bloom Threshold Pipeline",
        &pipeline_layout,
        library.function(POST_MODULE, "vs_fullscreen")?,
        library.function(POST_MODULE, "fs_bloom_threshold")?,
        &[opaque_target(BLOOM_FORMAT)],
        None,
        &[],
        None,
    ))
}

/// Downsamples one mip into the next. Shares the threshold layout and only
/// reads the source texture and sampler.
pub fn mk_rt_mipmap_pipeline(
    device: &wgpu::Device,
    library: &ShaderLibrary,
    layout: &wgpu::BindGroupLayout,
) -> anyhow::Result<wgpu::RenderPipeline> {
    let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("RT Mipmap Pipeline Layout"),
        bind_group_layouts: &[layout],
        push_constant_ranges: &[],
    });
    Ok(mk_render_pipeline(
        device,
        "RT Mipmap Pipeline",
        &pipeline_layout,
        library.function(POST_MODULE, "vs_fullscreen")?,
        library.function(POST_MODULE, "fs_rt_downsample")?,
        &[opaque_target(HDR_FORMAT)],
        None,
        &[],
        None,
    ))
}

/// Tone maps HDR + bloom into `output_format`, the surface format.
pub fn mk_post_merge_pipeline(
    device: &wgpu::Device,
    library: &ShaderLibrary,
    layout: &wgpu::BindGroupLayout,
    output_format: wgpu::TextureFormat,
) -> anyhow::Result<wgpu::RenderPipeline> {
    let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("Post Merge Pipeline Layout"),
        bind_group_layouts: &[layout],
        push_constant_ranges: &[],
    });
    Ok(mk_render_pipeline(
        device,
        "Post Merge Pipeline",
        &pipeline_layout,
        library.function(POST_MODULE, "vs_fullscreen")?,
        library.function(POST_MODULE, "fs_post_merge")?,
        &[opaque_target(output_format)],
        None,
        &[],
        None,
    ))
}
