//! Render pipelines.
//!
//! - `library` compiles the WGSL modules and resolves entry points
//! - `basic` holds the forward pass and the shared pipeline builder
//! - `gbuffer` and `deferred` make up the hybrid path
//! - `skybox` draws the radiance map behind everything
//! - `post` does the render target mip chains, bloom and tone mapping
//! - `frame` and `light` are the per-frame uniforms

pub mod basic;
pub mod deferred;
pub mod frame;
pub mod gbuffer;
pub mod library;
pub mod light;
pub mod post;
pub mod skybox;

use library::ShaderLibrary;

/// Every pipeline of the renderer, built once against the scene's bind group
/// layout.
pub struct Pipelines {
    pub forward: wgpu::RenderPipeline,
    pub gbuffer: wgpu::RenderPipeline,
    pub deferred: wgpu::RenderPipeline,
    pub skybox: wgpu::RenderPipeline,
    pub rt_mipmap: wgpu::RenderPipeline,
    pub bloom_threshold: wgpu::RenderPipeline,
    pub post_merge: wgpu::RenderPipeline,
    pub gbuffer_layout: wgpu::BindGroupLayout,
    pub sky_layout: wgpu::BindGroupLayout,
}

impl Pipelines {
    /// `scene_layout` and `frame_layout` are groups 0 and 1 of every scene
    /// pipeline; the sky is group 2.
    pub fn new(
        device: &wgpu::Device,
        library: &ShaderLibrary,
        scene_layout: &wgpu::BindGroupLayout,
        frame_layout: &wgpu::BindGroupLayout,
        post: &post::PostResources,
        surface_format: wgpu::TextureFormat,
    ) -> anyhow::Result<Self> {
        let sky_layout = skybox::mk_bind_group_layout(device);
        let gbuffer_layout = gbuffer::mk_bind_group_layout(device);

        let scene_pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Scene Pipeline Layout"),
            bind_group_layouts: &[scene_layout, frame_layout, &sky_layout],
            push_constant_ranges: &[],
        });

        let forward = basic::mk_forward_pipeline(device, library, &scene_pipeline_layout)?;
        let gbuffer = gbuffer::mk_gbuffer_pipeline(device, library, &scene_pipeline_layout)?;
        let skybox = skybox::mk_skybox_pipeline(device, library, &scene_pipeline_layout)?;
        let deferred =
            deferred::mk_deferred_pipeline(device, library, &gbuffer_layout, frame_layout, &sky_layout)?;
        let rt_mipmap = post::mk_rt_mipmap_pipeline(device, library, &post.threshold_layout)?;
        let bloom_threshold = post::mk_bloom_threshold_pipeline(device, library, &post.threshold_layout)?;
        let post_merge = post::mk_post_merge_pipeline(device, library, &post.merge_layout, surface_format)?;

        Ok(Self {
            forward,
            gbuffer,
            deferred,
            skybox,
            rt_mipmap,
            bloom_threshold,
            post_merge,
            gbuffer_layout,
            sky_layout,
        })
    }
}
