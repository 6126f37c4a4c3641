use crate::pipelines::{
    basic::{HDR_FORMAT, mk_render_pipeline, opaque_target},
    library::{DEFERRED_MODULE, ShaderLibrary},
};

/// Full-screen lighting of the G-buffer into the HDR target. Pixels without
/// geometry are discarded and keep the clear colour.
pub fn mk_deferred_pipeline(
    device: &wgpu::Device,
    library: &ShaderLibrary,
    gbuffer_layout: &wgpu::BindGroupLayout,
    frame_layout: &wgpu::BindGroupLayout,
    sky_layout: &wgpu::BindGroupLayout,
) -> anyhow::Result<wgpu::RenderPipeline> {
    let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("Deferred Pipeline Layout"),
        bind_group_layouts: &[gbuffer_layout, frame_layout, sky_layout],
        push_constant_ranges: &[],
    });
    Ok(mk_render_pipeline(
        device,
        "Deferred Lighting Pipeline",
        &layout,
        library.function(DEFERRED_MODULE, "vs_fullscreen")?,
        library.function(DEFERRED_MODULE, "fs_deferred")?,
        &[opaque_target(HDR_FORMAT)],
        None,
        &[],
        None,
    ))
}
