#[cfg(feature = "integration-tests")]
use bindless_hybrid::{
    config::{Config, RenderMode},
    context::HeadlessContext,
    pipelines::{
        basic::HDR_FORMAT,
        library::ShaderLibrary,
        post::{self, MipChain, PostResources, PostUniform},
    },
    render::Renderer,
};

#[cfg(feature = "integration-tests")]
use crate::common::test_utils::{asset_dir, small_scene};
#[cfg(feature = "integration-tests")]
mod common;

#[cfg(feature = "integration-tests")]
const SIZE: [u32; 2] = [64, 64];
#[cfg(feature = "integration-tests")]
const OUTPUT_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;

#[cfg(feature = "integration-tests")]
fn output_texture(device: &wgpu::Device) -> wgpu::Texture {
    device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Test Output"),
        size: wgpu::Extent3d {
            width: SIZE[0],
            height: SIZE[1],
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: OUTPUT_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
        view_formats: &[],
    })
}

#[cfg(feature = "integration-tests")]
async fn read_back(ctx: &HeadlessContext, texture: &wgpu::Texture) -> Vec<u8> {
    let bytes_per_row = 4 * SIZE[0];
    let output_buffer = ctx.device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Test Readback"),
        size: (bytes_per_row * SIZE[1]) as wgpu::BufferAddress,
        usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
        mapped_at_creation: false,
    });
    let mut encoder = ctx
        .device
        .create_command_encoder(&wgpu::CommandEncoderDescriptor { label: None });
    encoder.copy_texture_to_buffer(
        wgpu::TexelCopyTextureInfo {
            aspect: wgpu::TextureAspect::All,
            texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
        },
        wgpu::TexelCopyBufferInfo {
            buffer: &output_buffer,
            layout: wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(bytes_per_row),
                rows_per_image: Some(SIZE[1]),
            },
        },
        texture.size(),
    );
    ctx.queue.submit(std::iter::once(encoder.finish()));

    let (tx, rx) = futures_intrusive::channel::shared::oneshot_channel();
    let buffer_slice = output_buffer.slice(..);
    buffer_slice.map_async(wgpu::MapMode::Read, move |result| {
        tx.send(result).unwrap();
    });
    ctx.device
        .poll(wgpu::PollType::Wait {
            submission_index: None,
            timeout: Some(std::time::Duration::from_secs(3)),
        })
        .unwrap();
    rx.receive().await.unwrap().unwrap();
    let data = buffer_slice.get_mapped_range().to_vec();
    output_buffer.unmap();
    data
}

#[tokio::test]
#[cfg(feature = "integration-tests")]
async fn should_render_both_modes_within_the_frame_budget() {
    let ctx = HeadlessContext::new().await.expect("GPU with bindless support");
    let assets = asset_dir();
    let scene = small_scene(assets.path()).await;
    let config = Config::default();

    let mut renderer =
        Renderer::new(&ctx.device, &ctx.queue, &config, scene, OUTPUT_FORMAT, SIZE).expect("renderer");
    let texture = output_texture(&ctx.device);
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

    for mode in [RenderMode::Hybrid, RenderMode::Forward] {
        renderer.set_render_mode(mode);
        for _ in 0..config.frames_in_flight + 2 {
            renderer.render(&ctx.device, &ctx.queue, &view);
            assert!(renderer.frames().outstanding() <= renderer.frames().slots());
        }
        let pixels = read_back(&ctx, &texture).await;
        assert_eq!(pixels.len(), (SIZE[0] * SIZE[1] * 4) as usize);
        assert!(pixels.chunks_exact(4).all(|p| p[3] == 255), "{mode:?} left transparent pixels");
    }
    assert!(renderer.camera().angle() > 0.0);
}

#[tokio::test]
#[cfg(feature = "integration-tests")]
async fn should_survive_resizes() {
    let ctx = HeadlessContext::new().await.expect("GPU with bindless support");
    let assets = asset_dir();
    let scene = small_scene(assets.path()).await;

    let mut renderer = Renderer::new(&ctx.device, &ctx.queue, &Config::default(), scene, OUTPUT_FORMAT, [32, 32])
        .expect("renderer");
    renderer.resize(&ctx.device, [0, 10]);
    assert_eq!(renderer.size(), [32, 32]);
    renderer.resize(&ctx.device, SIZE);
    assert_eq!(renderer.size(), SIZE);

    let texture = output_texture(&ctx.device);
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    renderer.render(&ctx.device, &ctx.queue, &view);
    let pixels = read_back(&ctx, &texture).await;
    assert!(pixels.chunks_exact(4).all(|p| p[3] == 255));
}

#[tokio::test]
#[cfg(feature = "integration-tests")]
async fn should_reject_an_invalid_config_before_touching_the_scene() {
    let ctx = HeadlessContext::new().await.expect("GPU with bindless support");
    let assets = asset_dir();
    let scene = small_scene(assets.path()).await;
    let config = Config {
        frames_in_flight: 0,
        ..Default::default()
    };

    let error = Renderer::new(&ctx.device, &ctx.queue, &config, scene, OUTPUT_FORMAT, SIZE)
        .err()
        .expect("no frames in flight");
    assert_eq!(error.to_string(), "at least one frame must be allowed in flight");
}

#[tokio::test]
#[cfg(feature = "integration-tests")]
async fn should_fill_every_mip_from_level_zero() {
    let ctx = HeadlessContext::new().await.expect("GPU with bindless support");
    let library = ShaderLibrary::new(&ctx.device);
    let post_resources = PostResources::new(&ctx.device, PostUniform::from_config(&Config::default()));
    let rt_mipmap =
        post::mk_rt_mipmap_pipeline(&ctx.device, &library, &post_resources.threshold_layout).expect("pipeline");
    let chain = MipChain::new(&ctx.device, &post_resources, [32, 32], HDR_FORMAT, 4, "Test Chain");
    assert_eq!(chain.level_count(), 4);
    assert_eq!(chain.target.texture.mip_level_count(), 4);

    let mut encoder = ctx
        .device
        .create_command_encoder(&wgpu::CommandEncoderDescriptor { label: None });
    encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
        label: Some("Test Clear"),
        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
            view: &chain.target.view,
            resolve_target: None,
            ops: wgpu::Operations {
                load: wgpu::LoadOp::Clear(wgpu::Color {
                    r: 0.5,
                    g: 0.25,
                    b: 2.0,
                    a: 1.0,
                }),
                store: wgpu::StoreOp::Store,
            },
            depth_slice: None,
        })],
        depth_stencil_attachment: None,
        occlusion_query_set: None,
        timestamp_writes: None,
    });
    chain.encode_downsample(&mut encoder, &rt_mipmap);

    // level 3 of a 32x32 target is 4x4 texels of four f16 channels
    let bytes_per_row = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
    let buffer = ctx.device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Test Mip Readback"),
        size: (bytes_per_row * 4) as wgpu::BufferAddress,
        usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
        mapped_at_creation: false,
    });
    encoder.copy_texture_to_buffer(
        wgpu::TexelCopyTextureInfo {
            aspect: wgpu::TextureAspect::All,
            texture: &chain.target.texture,
            mip_level: 3,
            origin: wgpu::Origin3d::ZERO,
        },
        wgpu::TexelCopyBufferInfo {
            buffer: &buffer,
            layout: wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(bytes_per_row),
                rows_per_image: Some(4),
            },
        },
        wgpu::Extent3d {
            width: 4,
            height: 4,
            depth_or_array_layers: 1,
        },
    );
    ctx.queue.submit(std::iter::once(encoder.finish()));

    let (tx, rx) = futures_intrusive::channel::shared::oneshot_channel();
    let slice = buffer.slice(..);
    slice.map_async(wgpu::MapMode::Read, move |result| {
        tx.send(result).unwrap();
    });
    ctx.device
        .poll(wgpu::PollType::Wait {
            submission_index: None,
            timeout: Some(std::time::Duration::from_secs(3)),
        })
        .unwrap();
    rx.receive().await.unwrap().unwrap();
    let data = slice.get_mapped_range();
    for row in data.chunks_exact(bytes_per_row as usize) {
        for texel in row[..4 * 8].chunks_exact(8) {
            let channels: Vec<f32> = texel
                .chunks_exact(2)
                .map(|c| half::f16::from_le_bytes([c[0], c[1]]).to_f32())
                .collect();
            assert_eq!(channels, [0.5, 0.25, 2.0, 1.0]);
        }
    }
}
