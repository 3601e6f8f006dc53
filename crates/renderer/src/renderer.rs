//! Main renderer managing wgpu state, the shaded scene pass and the picking pass.

use crate::{
    frame::{Frame, FrameUniform, RenderMode},
    mesh::Mesh,
    object::{ObjectUniform, SphereObject},
    overlay::{Overlay, OverlayVertex},
    picking::{PickId, Picker},
    pipeline::{
        create_frame_bind_group_layout, create_object_bind_group_layout, create_overlay_bind_group_layout,
        create_overlay_pipeline, create_sphere_pipeline, OBJECT_UNIFORM_STRIDE,
    },
    shaders::ShaderSet,
    texture::Texture,
};
use anyhow::{Context, Result};
use bytemuck::Zeroable;
use std::collections::HashMap;
use std::sync::Arc;
use wgpu::util::DeviceExt;
use winit::window::Window;

/// Background behind the HUD when no overlay is drawn.
pub const CLEAR_COLOUR: wgpu::Color = wgpu::Color {
    r: 0.0,
    g: 0.4,
    b: 0.7,
    a: 1.0,
};

/// Bytes per row of the pick readback buffer (wgpu's copy alignment).
const READBACK_ROW_BYTES: u32 = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;

/// Uploaded HUD geometry and the overlay generation it was built from.
struct OverlayBuffers {
    generation: u64,
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    num_indices: u32,
}

/// Per-object uniform slots, grown on demand.
struct ObjectSlots {
    buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    capacity: u32,
}

impl ObjectSlots {
    fn new(device: &wgpu::Device, layout: &wgpu::BindGroupLayout, capacity: u32) -> Self {
        let capacity = capacity.max(1).next_power_of_two();
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Object Uniform Buffer"),
            size: capacity as wgpu::BufferAddress * OBJECT_UNIFORM_STRIDE,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Object Bind Group"),
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer: &buffer,
                    offset: 0,
                    size: wgpu::BufferSize::new(std::mem::size_of::<ObjectUniform>() as u64),
                }),
            }],
        });
        Self { buffer, bind_group, capacity }
    }
}

/// Explicit draw state handed to each object while a scene pass is open.
pub struct DrawContext<'a, 'pass> {
    pass: &'a mut wgpu::RenderPass<'pass>,
    queue: &'a wgpu::Queue,
    slots: &'a ObjectSlots,
    meshes: &'a HashMap<PickId, Mesh>,
    next_slot: u32,
}

impl DrawContext<'_, '_> {
    /// Write the object's uniforms into the next free slot and issue one indexed draw.
    pub fn draw_sphere(&mut self, object: &SphereObject) {
        let Some(mesh) = self.meshes.get(&object.pick_id()) else {
            log::warn!("No GPU mesh for object {}; skipping draw", object.pick_id());
            return;
        };
        if self.next_slot >= self.slots.capacity {
            log::warn!("Object uniform slots exhausted; skipping draw of {}", object.pick_id());
            return;
        }
        let offset = self.next_slot as wgpu::BufferAddress * OBJECT_UNIFORM_STRIDE;
        self.queue
            .write_buffer(&self.slots.buffer, offset, bytemuck::bytes_of(&object.uniform()));
        self.pass.set_bind_group(1, &self.slots.bind_group, &[offset as u32]);
        self.pass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
        self.pass.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        self.pass.draw_indexed(0..mesh.num_indices, 0, 0..1);
        self.next_slot += 1;
    }
}

/// Main renderer state.
pub struct Renderer {
    pub surface: wgpu::Surface<'static>,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
    pub size: winit::dpi::PhysicalSize<u32>,
    pub window: Arc<Window>,

    // Pipelines
    sphere_pipeline: wgpu::RenderPipeline,
    pick_pipeline: wgpu::RenderPipeline,
    overlay_pipeline: wgpu::RenderPipeline,

    // Bind groups and layouts
    frame_buffer: wgpu::Buffer,
    frame_bind_group: wgpu::BindGroup,
    object_bind_group_layout: wgpu::BindGroupLayout,
    object_slots: ObjectSlots,
    overlay_bind_group: wgpu::BindGroup,

    /// GPU meshes by pick id; an id's colours never change once assigned.
    meshes: HashMap<PickId, Mesh>,
    overlay_buffers: Option<OverlayBuffers>,

    depth_texture: Texture,

    // Picking
    pick_target: Texture,
    pick_depth: Texture,
    readback_buffer: wgpu::Buffer,
}

impl Renderer {
    /// Create a new renderer for the given window.
    ///
    /// Fails if no adapter is available or if either shader program does not compile and link.
    pub async fn new(window: Arc<Window>, shaders: &ShaderSet, vsync: bool) -> Result<Self> {
        let sphere_env = shaders.sphere_environment().context("sphere shader program")?;
        let overlay_env = shaders.overlay_environment().context("overlay shader program")?;

        let size = window.inner_size();

        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let surface = instance.create_surface(window.clone())?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or_else(|| anyhow::anyhow!("Failed to find suitable GPU adapter"))?;

        log::info!("Using GPU: {:?}", adapter.get_info().name);

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("Main Device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    memory_hints: Default::default(),
                },
                None,
            )
            .await?;

        // Colours are authored in display space, so prefer a non-sRGB surface.
        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| !f.is_srgb())
            .copied()
            .or_else(|| surface_caps.formats.first().copied())
            .context("surface reports no supported formats")?;

        let present_mode = if vsync {
            wgpu::PresentMode::AutoVsync
        } else {
            wgpu::PresentMode::AutoNoVsync
        };

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode,
            alpha_mode: surface_caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let frame_bind_group_layout = create_frame_bind_group_layout(&device);
        let object_bind_group_layout = create_object_bind_group_layout(&device);
        let overlay_bind_group_layout = create_overlay_bind_group_layout(&device);

        let frame_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Frame Uniform Buffer"),
            contents: bytemuck::bytes_of(&FrameUniform::zeroed()),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let frame_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Frame Bind Group"),
            layout: &frame_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: frame_buffer.as_entire_binding(),
            }],
        });
        let object_slots = ObjectSlots::new(&device, &object_bind_group_layout, 16);

        let font = Texture::font_atlas(&device, &queue);
        let overlay_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Overlay Bind Group"),
            layout: &overlay_bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&font.view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&font.sampler),
                },
            ],
        });

        let sphere_pipeline = create_sphere_pipeline(
            &device,
            &sphere_env,
            config.format,
            &frame_bind_group_layout,
            &object_bind_group_layout,
            "Sphere",
        );
        let pick_pipeline = create_sphere_pipeline(
            &device,
            &sphere_env,
            Texture::PICK_FORMAT,
            &frame_bind_group_layout,
            &object_bind_group_layout,
            "Pick",
        );
        let overlay_pipeline = create_overlay_pipeline(&device, &overlay_env, config.format, &overlay_bind_group_layout);

        let depth_texture = Texture::create_depth_texture(&device, config.width, config.height, "Depth Texture");
        let pick_target = Texture::create_pick_target(&device, config.width, config.height);
        let pick_depth = Texture::create_depth_texture(&device, config.width, config.height, "Pick Depth Texture");
        let readback_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Pick Readback Buffer"),
            size: READBACK_ROW_BYTES as wgpu::BufferAddress,
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });

        Ok(Self {
            surface,
            device,
            queue,
            config,
            size,
            window,
            sphere_pipeline,
            pick_pipeline,
            overlay_pipeline,
            frame_buffer,
            frame_bind_group,
            object_bind_group_layout,
            object_slots,
            overlay_bind_group,
            meshes: HashMap::new(),
            overlay_buffers: None,
            depth_texture,
            pick_target,
            pick_depth,
            readback_buffer,
        })
    }

    /// Handle window resize.
    pub fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 {
            self.size = new_size;
            self.config.width = new_size.width;
            self.config.height = new_size.height;
            self.surface.configure(&self.device, &self.config);
            self.depth_texture =
                Texture::create_depth_texture(&self.device, self.config.width, self.config.height, "Depth Texture");
            self.pick_target = Texture::create_pick_target(&self.device, self.config.width, self.config.height);
            self.pick_depth = Texture::create_depth_texture(
                &self.device,
                self.config.width,
                self.config.height,
                "Pick Depth Texture",
            );
        }
    }

    /// Reconfigure the surface at its current size (after `Lost`/`Outdated`).
    pub fn reconfigure(&mut self) {
        self.resize(self.size);
    }

    /// Get window dimensions.
    pub fn dimensions(&self) -> (u32, u32) {
        (self.config.width, self.config.height)
    }

    /// Upload meshes, grow uniform slots and refresh HUD buffers for this frame.
    fn prepare(&mut self, frame: &Frame<'_>, with_overlay: bool) {
        for object in &frame.objects {
            if !self.meshes.contains_key(&object.pick_id()) {
                log::debug!("Uploading mesh for object {}", object.pick_id());
                self.meshes.insert(object.pick_id(), object.mesh().upload(&self.device));
            }
        }

        let needed = frame.objects.len() as u32;
        if needed > self.object_slots.capacity {
            self.object_slots = ObjectSlots::new(&self.device, &self.object_bind_group_layout, needed);
        }

        if !with_overlay {
            return;
        }
        if let Some(overlay) = frame.overlay {
            let stale = self
                .overlay_buffers
                .as_ref()
                .map_or(true, |b| b.generation != overlay.generation);
            if stale {
                self.overlay_buffers = Some(self.upload_overlay(overlay));
            }
        }
    }

    fn upload_overlay(&self, overlay: &Overlay) -> OverlayBuffers {
        let vertices: &[OverlayVertex] = &overlay.text.vertices;
        let vertex_buffer = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Overlay Vertex Buffer"),
            contents: bytemuck::cast_slice(vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Overlay Index Buffer"),
            contents: bytemuck::cast_slice(&overlay.text.indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        OverlayBuffers {
            generation: overlay.generation,
            vertex_buffer,
            index_buffer,
            num_indices: overlay.text.indices.len() as u32,
        }
    }

    fn write_frame_uniform(&self, frame: &Frame<'_>, mode: RenderMode) {
        let uniform = FrameUniform::new(frame.camera, &frame.light, mode);
        self.queue.write_buffer(&self.frame_buffer, 0, bytemuck::bytes_of(&uniform));
    }

    fn draw_objects(&self, pass: &mut wgpu::RenderPass<'_>, frame: &Frame<'_>) {
        pass.set_bind_group(0, &self.frame_bind_group, &[]);
        let mut ctx = DrawContext {
            pass,
            queue: &self.queue,
            slots: &self.object_slots,
            meshes: &self.meshes,
            next_slot: 0,
        };
        for object in &frame.objects {
            object.draw(&mut ctx);
        }
    }

    /// Draw one frame: the HUD overlay first, then every object in list order.
    ///
    /// Surface errors come back as `wgpu::SurfaceError` inside the `anyhow::Error`.
    pub fn render(&mut self, frame: &Frame<'_>) -> Result<()> {
        self.prepare(frame, true);
        self.write_frame_uniform(frame, RenderMode::Shaded);

        let output = self.surface.get_current_texture()?;
        let view = output.texture.create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = self.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Render Encoder"),
        });

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Overlay Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(CLEAR_COLOUR),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            if let (Some(_), Some(buffers)) = (frame.overlay, &self.overlay_buffers) {
                if buffers.num_indices > 0 {
                    pass.set_pipeline(&self.overlay_pipeline);
                    pass.set_bind_group(0, &self.overlay_bind_group, &[]);
                    pass.set_vertex_buffer(0, buffers.vertex_buffer.slice(..));
                    pass.set_index_buffer(buffers.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                    pass.draw_indexed(0..buffers.num_indices, 0, 0..1);
                }
            }
        }

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Scene Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_texture.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            pass.set_pipeline(&self.sphere_pipeline);
            self.draw_objects(&mut pass, frame);
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();
        Ok(())
    }
}

impl Picker for Renderer {
    /// Render object ids into the offscreen target and read back the pixel under `(x, y)`.
    fn pick(&mut self, frame: &Frame<'_>, x: u32, y: u32) -> Result<PickId> {
        if x >= self.config.width || y >= self.config.height {
            return Ok(PickId::BACKGROUND);
        }
        self.prepare(frame, false);
        self.write_frame_uniform(frame, RenderMode::PickId);

        let mut encoder = self.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Pick Encoder"),
        });
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Pick Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &self.pick_target.view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.pick_depth.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            pass.set_pipeline(&self.pick_pipeline);
            pass.set_scissor_rect(x, y, 1, 1);
            self.draw_objects(&mut pass, frame);
        }

        // Texture rows run top-down, matching window coordinates.
        encoder.copy_texture_to_buffer(
            wgpu::ImageCopyTexture {
                texture: &self.pick_target.texture,
                mip_level: 0,
                origin: wgpu::Origin3d { x, y, z: 0 },
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::ImageCopyBuffer {
                buffer: &self.readback_buffer,
                layout: wgpu::ImageDataLayout {
                    offset: 0,
                    bytes_per_row: Some(READBACK_ROW_BYTES),
                    rows_per_image: Some(1),
                },
            },
            wgpu::Extent3d {
                width: 1,
                height: 1,
                depth_or_array_layers: 1,
            },
        );
        self.queue.submit(std::iter::once(encoder.finish()));
        self.write_frame_uniform(frame, RenderMode::Shaded);

        let slice = self.readback_buffer.slice(..);
        let (tx, rx) = std::sync::mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = tx.send(result);
        });
        self.device.poll(wgpu::Maintain::Wait);
        rx.recv().context("pick readback callback dropped")??;

        let rgba = {
            let data = slice.get_mapped_range();
            [data[0], data[1], data[2], data[3]]
        };
        self.readback_buffer.unmap();

        let id = PickId::from_rgba(rgba);
        log::debug!("Picked {id} at ({x}, {y})");
        Ok(id)
    }
}
