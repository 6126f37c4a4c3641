use crate::{
    data_structures::texture::Texture,
    pipelines::{
        basic::{mk_render_pipeline, opaque_depth, opaque_target},
        library::{GBUFFER_MODULE, ShaderLibrary},
    },
};

/// rgb albedo, a ambient occlusion
pub const ALBEDO_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;
/// xyz normal, w metallic
pub const NORMAL_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba16Float;
/// xyz world position, w roughness
pub const POSITION_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba32Float;

pub const GBUFFER_FORMATS: [wgpu::TextureFormat; 3] = [ALBEDO_FORMAT, NORMAL_FORMAT, POSITION_FORMAT];

/// Render targets of the geometry pass.
pub struct GBuffer {
    pub albedo: Texture,
    pub normal: Texture,
    pub position: Texture,
    pub depth: Texture,
}

impl GBuffer {
    pub fn new(device: &wgpu::Device, size: [u32; 2]) -> Self {
        Self {
            albedo: Texture::create_render_target(device, size, ALBEDO_FORMAT, "G-Buffer Albedo"),
            normal: Texture::create_render_target(device, size, NORMAL_FORMAT, "G-Buffer Normal"),
            position: Texture::create_render_target(device, size, POSITION_FORMAT, "G-Buffer Position"),
            depth: Texture::create_depth_texture(device, size, "G-Buffer Depth"),
        }
    }

    pub fn color_attachments(&self) -> [Option<wgpu::RenderPassColorAttachment<'_>>; 3] {
        [&self.albedo, &self.normal, &self.position].map(|target| {
            Some(wgpu::RenderPassColorAttachment {
                view: &target.view,
                resolve_target: None,
                depth_slice: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
                    store: wgpu::StoreOp::Store,
                },
            })
        })
    }
}

/// Layout the lighting pass reads the G-buffer through.
pub fn mk_bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    let entry = |binding| wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Texture {
            multisampled: false,
            view_dimension: wgpu::TextureViewDimension::D2,
            // Rgba32Float is not filterable; the lighting pass only loads texels
            sample_type: wgpu::TextureSampleType::Float { filterable: false },
        },
        count: None,
    };
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("G-Buffer Bind Group Layout"),
        entries: &[entry(0), entry(1), entry(2)],
    })
}

pub fn mk_bind_group(device: &wgpu::Device, layout: &wgpu::BindGroupLayout, gbuffer: &GBuffer) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("G-Buffer Bind Group"),
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(&gbuffer.albedo.view),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::TextureView(&gbuffer.normal.view),
            },
            wgpu::BindGroupEntry {
                binding: 2,
                resource: wgpu::BindingResource::TextureView(&gbuffer.position.view),
            },
        ],
    })
}

/// Geometry pass. Vertices are pulled through the argument graph, so the
/// pipeline has no vertex buffers.
pub fn mk_gbuffer_pipeline(
    device: &wgpu::Device,
    library: &ShaderLibrary,
    layout: &wgpu::PipelineLayout,
) -> anyhow::Result<wgpu::RenderPipeline> {
    Ok(mk_render_pipeline(
        device,
        "G-Buffer Pipeline",
        layout,
        library.function(GBUFFER_MODULE, "vs_gbuffer")?,
        library.function(GBUFFER_MODULE, "fs_gbuffer")?,
        &GBUFFER_FORMATS.map(opaque_target),
        Some(opaque_depth()),
        &[],
        Some(wgpu::Face::Back),
    ))
}
