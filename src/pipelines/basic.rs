use crate::{
    data_structures::{
        model::{GenericVertex, PositionVertex, Vertex},
        texture::Texture,
    },
    pipelines::library::{FORWARD_MODULE, ShaderFunction, ShaderLibrary},
};

pub const HDR_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba16Float;

/// Depth test used by opaque scene geometry.
pub fn opaque_depth() -> wgpu::DepthStencilState {
    wgpu::DepthStencilState {
        format: Texture::DEPTH_FORMAT,
        depth_write_enabled: true,
        depth_compare: wgpu::CompareFunction::Less,
        stencil: wgpu::StencilState::default(),
        bias: wgpu::DepthBiasState::default(),
    }
}

/// Overwrites the target. Every pass writes opaque colour, so no blend state is set.
pub fn opaque_target(format: wgpu::TextureFormat) -> Option<wgpu::ColorTargetState> {
    Some(wgpu::ColorTargetState {
        format,
        blend: None,
        write_mask: wgpu::ColorWrites::ALL,
    })
}

/// The forward pass: shades scene geometry straight into the HDR target.
/// Vertices are fed from heap slices bound as vertex buffers.
pub fn mk_forward_pipeline(
    device: &wgpu::Device,
    library: &ShaderLibrary,
    layout: &wgpu::PipelineLayout,
) -> anyhow::Result<wgpu::RenderPipeline> {
    Ok(mk_render_pipeline(
        device,
        "Forward Pipeline",
        layout,
        library.function(FORWARD_MODULE, "vs_forward")?,
        library.function(FORWARD_MODULE, "fs_forward")?,
        &[opaque_target(HDR_FORMAT)],
        Some(opaque_depth()),
        &[PositionVertex::desc(), GenericVertex::desc()],
        Some(wgpu::Face::Back),
    ))
}

#[allow(clippy::too_many_arguments)]
pub fn mk_render_pipeline(
    device: &wgpu::Device,
    label: &str,
    layout: &wgpu::PipelineLayout,
    vertex: ShaderFunction,
    fragment: ShaderFunction,
    targets: &[Option<wgpu::ColorTargetState>],
    depth_stencil: Option<wgpu::DepthStencilState>,
    vertex_layouts: &[wgpu::VertexBufferLayout],
    cull_mode: Option<wgpu::Face>,
) -> wgpu::RenderPipeline {
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        cache: None,
        label: Some(label),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: vertex.module,
            entry_point: Some(vertex.entry_point),
            buffers: vertex_layouts,
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: fragment.module,
            entry_point: Some(fragment.entry_point),
            targets,
            compilation_options: Default::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode,
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },
        depth_stencil,
        multisample: wgpu::MultisampleState {
            count: 1,
            mask: !0,
            alpha_to_coverage_enabled: false,
        },
        multiview: None,
    })
}
