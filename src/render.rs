//! Frame composition.
//!
//! [`Renderer`] owns everything a frame needs once a [`Scene`] has been loaded:
//! the resident argument graph, the pipelines, the per-slot uniforms and the
//! size dependent render targets. A frame is encoded as a fixed sequence of
//! passes that depends on the [`RenderMode`]:
//!
//! - `Hybrid` fills the G-buffer, lights it with a full-screen pass and then
//!   draws the sky forward, depth tested against the G-buffer depth
//! - `Forward` shades geometry straight into the HDR target, followed by the
//!   sky in the same pass
//!
//! Both modes finish the same way: the HDR target is downsampled to half
//! resolution, thresholded into the bloom pyramid, the pyramid is downsampled
//! and finally everything is tone mapped into the output view.

use instant::Duration;

use crate::{
    camera::{CameraUniform, OrbitCamera, Projection},
    config::{Config, RenderMode},
    frames::InFlightFrames,
    pipelines::{
        Pipelines,
        basic::HDR_FORMAT,
        frame::FrameResources,
        gbuffer::{self, GBuffer},
        library::ShaderLibrary,
        light::LightUniform,
        post::{self, BLOOM_FORMAT, BLOOM_MIP_LEVELS, HDR_MIP_LEVELS, MipChain, PostResources, PostUniform},
        skybox::SkyResources,
    },
    scene::{
        Scene,
        arguments::{SceneArguments, build_scene_arguments},
        gpu::ResidentScene,
        heap::HeapKind,
        residency::ResidencySet,
    },
};

/// How long a frame waits on the device for a free slot before polling again.
const SLOT_WAIT_TIMEOUT: Duration = Duration::from_millis(100);

/// Size dependent textures and the bind groups that read them.
struct RenderTargets {
    size: [u32; 2],
    hdr: MipChain,
    bloom: MipChain,
    /// The G-buffer depth doubles as the forward depth buffer.
    gbuffer: GBuffer,
    gbuffer_bind_group: wgpu::BindGroup,
    threshold_bind_group: wgpu::BindGroup,
    merge_bind_group: wgpu::BindGroup,
}

impl RenderTargets {
    fn new(device: &wgpu::Device, size: [u32; 2], pipelines: &Pipelines, post: &PostResources) -> Self {
        let size = [size[0].max(1), size[1].max(1)];
        let hdr = MipChain::new(device, post, size, HDR_FORMAT, HDR_MIP_LEVELS, "HDR Target");
        let bloom = MipChain::new(
            device,
            post,
            post::bloom_size(size),
            BLOOM_FORMAT,
            BLOOM_MIP_LEVELS,
            "Bloom Target",
        );
        let gbuffer = GBuffer::new(device, size);
        let gbuffer_bind_group = gbuffer::mk_bind_group(device, &pipelines.gbuffer_layout, &gbuffer);
        // a 1x1 target has no half resolution level; bloom then reads level 0
        let threshold_bind_group = post.source_bind_group(device, "Bloom Threshold Bind Group", hdr.last_level());
        let merge_bind_group = post.merge_bind_group(device, &hdr.target.view, &bloom.full_view);
        Self {
            size,
            hdr,
            bloom,
            gbuffer,
            gbuffer_bind_group,
            threshold_bind_group,
            merge_bind_group,
        }
    }
}

pub struct Renderer {
    render_mode: RenderMode,
    clear_colour: wgpu::Color,
    arguments: SceneArguments,
    residency: ResidencySet,
    resident: ResidentScene,
    pipelines: Pipelines,
    frame_resources: FrameResources,
    frames: InFlightFrames,
    sky: SkyResources,
    post: PostResources,
    targets: RenderTargets,
    camera: OrbitCamera,
    projection: Projection,
    camera_uniform: CameraUniform,
    light: LightUniform,
}

impl Renderer {
    /// Checks `config`, builds the argument graph of `scene`, makes it resident
    /// and creates the pipelines. `output_format` is the format of the views passed to
    /// [`render`](Self::render).
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        config: &Config,
        mut scene: Scene,
        output_format: wgpu::TextureFormat,
        size: [u32; 2],
    ) -> anyhow::Result<Self> {
        config.validate()?;
        let arguments = build_scene_arguments(&mut scene)?;

        let mut residency = ResidencySet::with_chunk_size("Scene Residency Set", config.residency_chunk_size);
        let chunks = residency.add_scene_resources(&arguments);
        residency.commit();
        log::info!(
            "Committed {} resources in {chunks} chunks to `{}`",
            residency.allocation_count(),
            residency.label()
        );
        residency.verify(&scene.heaps, &arguments)?;
        let resident = residency.request_residency(device, queue, &scene, &arguments)?;

        let library = ShaderLibrary::new(device);
        let frame_resources = FrameResources::new(device, config.frames_in_flight);
        let post = PostResources::new(device, PostUniform::from_config(config));
        let pipelines = Pipelines::new(
            device,
            &library,
            &resident.bind_group_layout,
            &frame_resources.bind_group_layout,
            &post,
            output_format,
        )?;
        let sky = SkyResources::new(device, queue, &pipelines.sky_layout, &scene.sky, &scene.skybox);
        let targets = RenderTargets::new(device, size, &pipelines, &post);

        log::info!(
            "Renderer ready: {:?} mode, {} draws, {} frames in flight",
            config.render_mode,
            arguments.draws.len(),
            config.frames_in_flight
        );

        Ok(Self {
            render_mode: config.render_mode,
            clear_colour: config.clear_colour,
            arguments,
            residency,
            resident,
            pipelines,
            frames: InFlightFrames::new(frame_resources.slot_count()),
            frame_resources,
            sky,
            post,
            targets,
            camera: OrbitCamera::from_config(config),
            projection: Projection::from_config(config, size[0], size[1]),
            camera_uniform: CameraUniform::new(),
            light: LightUniform::from_config(config),
        })
    }

    pub fn render_mode(&self) -> RenderMode {
        self.render_mode
    }

    pub fn set_render_mode(&mut self, mode: RenderMode) {
        if mode != self.render_mode {
            log::info!("Switching render mode to {mode:?}");
            self.render_mode = mode;
        }
    }

    pub fn size(&self) -> [u32; 2] {
        self.targets.size
    }

    pub fn camera(&self) -> &OrbitCamera {
        &self.camera
    }

    pub fn arguments(&self) -> &SceneArguments {
        &self.arguments
    }

    pub fn residency(&self) -> &ResidencySet {
        &self.residency
    }

    pub fn frames(&self) -> &InFlightFrames {
        &self.frames
    }

    pub fn resize(&mut self, device: &wgpu::Device, size: [u32; 2]) {
        if size[0] == 0 || size[1] == 0 || size == self.targets.size {
            return;
        }
        self.projection.resize(size[0], size[1]);
        self.targets = RenderTargets::new(device, size, &self.pipelines, &self.post);
    }

    /// Encodes and submits one frame into `target`, then moves the camera.
    ///
    /// Blocks while all frame slots are still in use by the GPU.
    pub fn render(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, target: &wgpu::TextureView) {
        let slot = self.frames.begin(|| {
            if let Err(e) = device.poll(wgpu::PollType::Wait {
                submission_index: None,
                timeout: Some(SLOT_WAIT_TIMEOUT),
            }) {
                log::warn!("Waiting for a free frame slot: {e}");
            }
        });

        self.camera_uniform.update(&self.camera, &self.projection);
        self.frame_resources
            .write(queue, &slot, &self.camera_uniform, &self.light);
        let frame_bind_group = self.frame_resources.bind_group(&slot);

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Render Encoder"),
        });

        match self.render_mode {
            RenderMode::Hybrid => {
                self.encode_gbuffer_pass(&mut encoder, frame_bind_group);
                self.encode_lighting_pass(&mut encoder, frame_bind_group);
                self.encode_sky_pass(&mut encoder, frame_bind_group);
            }
            RenderMode::Forward => self.encode_forward_pass(&mut encoder, frame_bind_group),
        }
        self.encode_post_passes(&mut encoder, target);

        queue.submit(std::iter::once(encoder.finish()));
        queue.on_submitted_work_done(self.frames.completion(slot));

        self.camera.advance();
    }

    fn bind_scene_groups(&self, render_pass: &mut wgpu::RenderPass<'_>, frame_bind_group: &wgpu::BindGroup) {
        render_pass.set_bind_group(0, &self.resident.bind_group, &[]);
        render_pass.set_bind_group(1, frame_bind_group, &[]);
        render_pass.set_bind_group(2, &self.sky.bind_group, &[]);
    }

    fn hdr_attachment(&self, load: wgpu::LoadOp<wgpu::Color>) -> Option<wgpu::RenderPassColorAttachment<'_>> {
        Some(wgpu::RenderPassColorAttachment {
            view: &self.targets.hdr.target.view,
            resolve_target: None,
            ops: wgpu::Operations {
                load,
                store: wgpu::StoreOp::Store,
            },
            depth_slice: None,
        })
    }

    fn depth_attachment(&self, load: wgpu::LoadOp<f32>) -> Option<wgpu::RenderPassDepthStencilAttachment<'_>> {
        Some(wgpu::RenderPassDepthStencilAttachment {
            view: &self.targets.gbuffer.depth.view,
            depth_ops: Some(wgpu::Operations {
                load,
                store: wgpu::StoreOp::Store,
            }),
            stencil_ops: None,
        })
    }

    fn encode_gbuffer_pass(&self, encoder: &mut wgpu::CommandEncoder, frame_bind_group: &wgpu::BindGroup) {
        let color_attachments = self.targets.gbuffer.color_attachments();
        let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("G-Buffer Pass"),
            color_attachments: &color_attachments,
            depth_stencil_attachment: self.depth_attachment(wgpu::LoadOp::Clear(1.0)),
            occlusion_query_set: None,
            timestamp_writes: None,
        });
        render_pass.set_pipeline(&self.pipelines.gbuffer);
        self.bind_scene_groups(&mut render_pass, frame_bind_group);
        // vertices are pulled in the shader, so a draw is just a vertex count
        for (draw, _) in &self.resident.draws {
            render_pass.draw(0..draw.index_count, draw.instances());
        }
    }

    fn encode_lighting_pass(&self, encoder: &mut wgpu::CommandEncoder, frame_bind_group: &wgpu::BindGroup) {
        let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Deferred Lighting Pass"),
            color_attachments: &[self.hdr_attachment(wgpu::LoadOp::Clear(self.clear_colour))],
            depth_stencil_attachment: None,
            occlusion_query_set: None,
            timestamp_writes: None,
        });
        render_pass.set_pipeline(&self.pipelines.deferred);
        render_pass.set_bind_group(0, &self.targets.gbuffer_bind_group, &[]);
        render_pass.set_bind_group(1, frame_bind_group, &[]);
        render_pass.set_bind_group(2, &self.sky.bind_group, &[]);
        render_pass.draw(0..3, 0..1);
    }

    fn encode_sky_pass(&self, encoder: &mut wgpu::CommandEncoder, frame_bind_group: &wgpu::BindGroup) {
        let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Sky Pass"),
            color_attachments: &[self.hdr_attachment(wgpu::LoadOp::Load)],
            depth_stencil_attachment: self.depth_attachment(wgpu::LoadOp::Load),
            occlusion_query_set: None,
            timestamp_writes: None,
        });
        render_pass.set_pipeline(&self.pipelines.skybox);
        self.bind_scene_groups(&mut render_pass, frame_bind_group);
        self.sky.draw(&mut render_pass);
    }

    fn encode_forward_pass(&self, encoder: &mut wgpu::CommandEncoder, frame_bind_group: &wgpu::BindGroup) {
        let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Forward Pass"),
            color_attachments: &[self.hdr_attachment(wgpu::LoadOp::Clear(self.clear_colour))],
            depth_stencil_attachment: self.depth_attachment(wgpu::LoadOp::Clear(1.0)),
            occlusion_query_set: None,
            timestamp_writes: None,
        });
        render_pass.set_pipeline(&self.pipelines.forward);
        self.bind_scene_groups(&mut render_pass, frame_bind_group);
        let positions = self.resident.heap(HeapKind::Positions);
        let generics = self.resident.heap(HeapKind::Generics);
        let indices = self.resident.heap(HeapKind::Indices);
        for (draw, range) in &self.resident.draws {
            render_pass.set_vertex_buffer(0, positions.slice(range.positions..));
            render_pass.set_vertex_buffer(1, generics.slice(range.generics..));
            render_pass.set_index_buffer(
                indices.slice(range.indices..range.indices + range.index_bytes),
                range.index_format,
            );
            render_pass.draw_indexed(0..draw.index_count, 0, draw.instances());
        }

        render_pass.set_pipeline(&self.pipelines.skybox);
        self.sky.draw(&mut render_pass);
    }

    fn encode_post_passes(&self, encoder: &mut wgpu::CommandEncoder, target: &wgpu::TextureView) {
        self.targets.hdr.encode_downsample(encoder, &self.pipelines.rt_mipmap);
        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Bloom Threshold Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &self.targets.bloom.target.view,
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
            render_pass.set_pipeline(&self.pipelines.bloom_threshold);
            render_pass.set_bind_group(0, &self.targets.threshold_bind_group, &[]);
            render_pass.draw(0..3, 0..1);
        }
        self.targets.bloom.encode_downsample(encoder, &self.pipelines.rt_mipmap);

        let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Post Merge Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(self.clear_colour),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            occlusion_query_set: None,
            timestamp_writes: None,
        });
        render_pass.set_pipeline(&self.pipelines.post_merge);
        render_pass.set_bind_group(0, &self.targets.merge_bind_group, &[]);
        render_pass.draw(0..3, 0..1);
    }
}
