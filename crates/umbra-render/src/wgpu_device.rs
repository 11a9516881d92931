//! A [`GraphicsDevice`] on top of wgpu.
//!
//! wgpu bakes depth, stencil, culling and blend state into pipelines, so the
//! device tracks the current [`PipelineState`] and builds one pipeline per
//! distinct state on first use. Every draw is recorded as its own render pass
//! on the frame encoder, which keeps the draws in issue order and lets a
//! stencil clear land between any two of them.

use std::collections::HashMap;
use std::num::NonZeroU64;

use glam::{Mat4, Vec3, Vec4};
use umbra_core::{SurfaceData, Winding};
use wgpu::util::DeviceExt;

use crate::device::GraphicsDevice;
use crate::error::{RenderError, RenderResult};
use crate::state::{
    BlendMode, CompareFunction, Face, Lighting, PipelineState, Primitive, StencilOperation,
};

const COLOR_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;
const DEPTH_STENCIL_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth24PlusStencil8;

/// Vertex fed to the scene shader.
#[repr(C)]
#[derive(Clone, Copy, Debug, bytemuck::Pod, bytemuck::Zeroable)]
struct GpuVertex {
    position: [f32; 4],
    normal: [f32; 3],
}

impl GpuVertex {
    const ATTRIBUTES: [wgpu::VertexAttribute; 2] =
        wgpu::vertex_attr_array![0 => Float32x4, 1 => Float32x3];

    fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Self>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }

    fn flat(position: Vec4) -> Self {
        Self {
            position: position.to_array(),
            normal: [0.0; 3],
        }
    }
}

/// Per-draw uniforms, mirrors `DrawUniforms` in the shader.
#[repr(C)]
#[derive(Clone, Copy, Debug, bytemuck::Pod, bytemuck::Zeroable)]
struct DrawUniforms {
    view_proj: [[f32; 4]; 4],
    model: [[f32; 4]; 4],
    color: [f32; 4],
    light_vector: [f32; 4],
    light_color: [f32; 4],
    spot: [f32; 4],
    mode: [u32; 4],
}

const MODE_UNLIT: u32 = 0;
const MODE_AMBIENT: u32 = 1;
const MODE_DIRECT: u32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Topology {
    Triangles,
    Lines,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Target {
    Color,
    Pick,
}

/// Everything a pipeline is built from. The stencil reference is dynamic
/// state in wgpu and is zeroed here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct PipelineKey {
    state: PipelineState,
    topology: Topology,
    target: Target,
}

impl PipelineKey {
    fn new(state: &PipelineState, topology: Topology, target: Target) -> Self {
        let mut state = *state;
        state.stencil.reference = 0;
        Self {
            state,
            topology,
            target,
        }
    }
}

/// Offscreen wgpu renderer with a color, a pick and a depth-stencil target.
pub struct WgpuDevice {
    device: wgpu::Device,
    queue: wgpu::Queue,
    width: u32,
    height: u32,
    color_texture: wgpu::Texture,
    color_view: wgpu::TextureView,
    pick_texture: wgpu::Texture,
    pick_view: wgpu::TextureView,
    depth_view: wgpu::TextureView,
    shader: wgpu::ShaderModule,
    bind_group_layout: wgpu::BindGroupLayout,
    pipeline_layout: wgpu::PipelineLayout,
    pipelines: HashMap<PipelineKey, wgpu::RenderPipeline>,
    state: PipelineState,
    lighting: Lighting,
    model: Mat4,
    view_proj: Mat4,
    encoder: Option<wgpu::CommandEncoder>,
}

impl WgpuDevice {
    /// Creates a headless device rendering to `width x height` targets.
    pub async fn new_headless(width: u32, height: u32) -> RenderResult<Self> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..wgpu::InstanceDescriptor::default()
        });

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .map_err(|_| RenderError::AdapterCreationFailed)?;

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("umbra device (headless)"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: wgpu::MemoryHints::default(),
                trace: wgpu::Trace::default(),
                experimental_features: wgpu::ExperimentalFeatures::default(),
            })
            .await?;

        Ok(Self::from_device(device, queue, width, height))
    }

    /// Wraps an existing device and queue.
    #[must_use]
    pub fn from_device(device: wgpu::Device, queue: wgpu::Queue, width: u32, height: u32) -> Self {
        let width = width.max(1);
        let height = height.max(1);

        let color_texture = Self::create_target(
            &device,
            "shadow color target",
            COLOR_FORMAT,
            width,
            height,
            wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
        );
        let pick_texture = Self::create_target(
            &device,
            "shadow pick target",
            COLOR_FORMAT,
            width,
            height,
            wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
        );
        let depth_texture = Self::create_target(
            &device,
            "shadow depth stencil",
            DEPTH_STENCIL_FORMAT,
            width,
            height,
            wgpu::TextureUsages::RENDER_ATTACHMENT,
        );

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("shadow scene shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/shadow_scene.wgsl").into()),
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("shadow scene bind group layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: NonZeroU64::new(
                        std::mem::size_of::<DrawUniforms>() as u64
                    ),
                },
                count: None,
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("shadow scene pipeline layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        Self {
            color_view: color_texture.create_view(&wgpu::TextureViewDescriptor::default()),
            pick_view: pick_texture.create_view(&wgpu::TextureViewDescriptor::default()),
            depth_view: depth_texture.create_view(&wgpu::TextureViewDescriptor::default()),
            color_texture,
            pick_texture,
            device,
            queue,
            width,
            height,
            shader,
            bind_group_layout,
            pipeline_layout,
            pipelines: HashMap::new(),
            state: PipelineState::default(),
            lighting: Lighting::Unlit,
            model: Mat4::IDENTITY,
            view_proj: Mat4::IDENTITY,
            encoder: None,
        }
    }

    fn create_target(
        device: &wgpu::Device,
        label: &str,
        format: wgpu::TextureFormat,
        width: u32,
        height: u32,
        usage: wgpu::TextureUsages,
    ) -> wgpu::Texture {
        device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage,
            view_formats: &[],
        })
    }

    /// Returns the target dimensions.
    #[must_use]
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Returns the number of pipelines built so far.
    #[must_use]
    pub fn num_pipelines(&self) -> usize {
        self.pipelines.len()
    }

    /// Starts a frame: clears color to `clear_color`, depth to one, stencil
    /// and pick ids to zero.
    pub fn begin_frame(&mut self, clear_color: Vec4) {
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("shadow frame encoder"),
            });

        {
            let _clear = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Frame Clear Pass"),
                color_attachments: &[
                    Some(wgpu::RenderPassColorAttachment {
                        view: &self.color_view,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load: wgpu::LoadOp::Clear(wgpu::Color {
                                r: f64::from(clear_color.x),
                                g: f64::from(clear_color.y),
                                b: f64::from(clear_color.z),
                                a: f64::from(clear_color.w),
                            }),
                            store: wgpu::StoreOp::Store,
                        },
                        depth_slice: None,
                    }),
                    Some(wgpu::RenderPassColorAttachment {
                        view: &self.pick_view,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load: wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
                            store: wgpu::StoreOp::Store,
                        },
                        depth_slice: None,
                    }),
                ],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(0),
                        store: wgpu::StoreOp::Store,
                    }),
                }),
                ..Default::default()
            });
        }

        if self.encoder.replace(encoder).is_some() {
            log::warn!("begin_frame called twice, previous frame discarded");
        }
    }

    /// Submits the recorded frame.
    pub fn end_frame(&mut self) -> RenderResult<()> {
        let encoder = self.encoder.take().ok_or(RenderError::NoFrame)?;
        self.queue.submit(std::iter::once(encoder.finish()));
        Ok(())
    }

    /// Reads back the color target as tightly packed RGBA8 rows.
    pub fn read_pixels(&self) -> RenderResult<Vec<u8>> {
        self.read_region(&self.color_texture, 0, 0, self.width, self.height)
    }

    /// Reads the pick color under pixel `(x, y)`.
    pub fn read_pick(&self, x: u32, y: u32) -> RenderResult<[u8; 3]> {
        if x >= self.width || y >= self.height {
            return Err(RenderError::ReadbackFailed(format!(
                "pixel ({x}, {y}) outside {}x{} target",
                self.width, self.height
            )));
        }
        let data = self.read_region(&self.pick_texture, x, y, 1, 1)?;
        Ok([data[0], data[1], data[2]])
    }

    fn read_region(
        &self,
        texture: &wgpu::Texture,
        x: u32,
        y: u32,
        width: u32,
        height: u32,
    ) -> RenderResult<Vec<u8>> {
        if self.encoder.is_some() {
            return Err(RenderError::ReadbackFailed(
                "frame still in progress".to_string(),
            ));
        }

        let bytes_per_row = Self::aligned_bytes_per_row(width);
        let buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("shadow readback buffer"),
            size: u64::from(bytes_per_row * height),
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("shadow readback encoder"),
            });

        encoder.copy_texture_to_buffer(
            wgpu::TexelCopyTextureInfo {
                texture,
                mip_level: 0,
                origin: wgpu::Origin3d { x, y, z: 0 },
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::TexelCopyBufferInfo {
                buffer: &buffer,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(bytes_per_row),
                    rows_per_image: Some(height),
                },
            },
            wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
        );

        self.queue.submit(std::iter::once(encoder.finish()));

        let buffer_slice = buffer.slice(..);
        let (tx, rx) = std::sync::mpsc::channel();
        buffer_slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = tx.send(result);
        });
        let _ = self.device.poll(wgpu::PollType::wait_indefinitely());
        rx.recv()
            .map_err(|e| RenderError::ReadbackFailed(e.to_string()))?
            .map_err(|e| RenderError::ReadbackFailed(e.to_string()))?;

        let data = buffer_slice.get_mapped_range();
        let row_bytes = (width * 4) as usize;
        let mut result = Vec::with_capacity(row_bytes * height as usize);
        for row in 0..height {
            let start = (row * bytes_per_row) as usize;
            result.extend_from_slice(&data[start..start + row_bytes]);
        }
        drop(data);
        buffer.unmap();

        Ok(result)
    }

    fn aligned_bytes_per_row(width: u32) -> u32 {
        let unaligned = width * 4;
        let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
        unaligned.div_ceil(align) * align
    }

    fn uniforms(&self, color: Vec4, lighting: Lighting) -> DrawUniforms {
        let (mode, light_vector, light_color, spot) = match lighting {
            Lighting::Unlit => (MODE_UNLIT, Vec4::ZERO, Vec4::ZERO, Vec4::ZERO),
            Lighting::Ambient(ambient) => (MODE_AMBIENT, Vec4::ZERO, ambient.extend(1.0), Vec4::ZERO),
            Lighting::Direct(light) => (
                MODE_DIRECT,
                light.vector,
                light.color.extend(1.0),
                light.spot_direction.extend(light.cos_cut_off),
            ),
        };
        DrawUniforms {
            view_proj: self.view_proj.to_cols_array_2d(),
            model: self.model.to_cols_array_2d(),
            color: color.to_array(),
            light_vector: light_vector.to_array(),
            light_color: light_color.to_array(),
            spot: spot.to_array(),
            mode: [mode, 0, 0, 0],
        }
    }

    fn create_pipeline(&self, key: &PipelineKey) -> wgpu::RenderPipeline {
        let state = &key.state;

        let blend = match (key.target, state.blend) {
            (Target::Color, Some(BlendMode::Additive)) => Some(wgpu::BlendState {
                color: wgpu::BlendComponent {
                    src_factor: wgpu::BlendFactor::One,
                    dst_factor: wgpu::BlendFactor::One,
                    operation: wgpu::BlendOperation::Add,
                },
                alpha: wgpu::BlendComponent {
                    src_factor: wgpu::BlendFactor::One,
                    dst_factor: wgpu::BlendFactor::One,
                    operation: wgpu::BlendOperation::Add,
                },
            }),
            (Target::Color, Some(BlendMode::Alpha)) => Some(wgpu::BlendState::ALPHA_BLENDING),
            _ => None,
        };

        let write_mask = if state.color_write {
            wgpu::ColorWrites::ALL
        } else {
            wgpu::ColorWrites::empty()
        };

        let (depth_compare, depth_write_enabled) = if state.depth_test {
            (compare_function(state.depth_compare), state.depth_write)
        } else {
            (wgpu::CompareFunction::Always, false)
        };

        let stencil = if state.stencil.enabled {
            let face = wgpu::StencilFaceState {
                compare: compare_function(state.stencil.compare),
                fail_op: stencil_operation(state.stencil.fail_op),
                depth_fail_op: stencil_operation(state.stencil.depth_fail_op),
                pass_op: stencil_operation(state.stencil.pass_op),
            };
            wgpu::StencilState {
                front: face,
                back: face,
                read_mask: state.stencil.read_mask,
                write_mask: state.stencil.write_mask,
            }
        } else {
            wgpu::StencilState::default()
        };

        let (topology, cull_mode) = match key.topology {
            Topology::Triangles => (
                wgpu::PrimitiveTopology::TriangleList,
                state.cull.map(|face| match face {
                    Face::Front => wgpu::Face::Front,
                    Face::Back => wgpu::Face::Back,
                }),
            ),
            Topology::Lines => (wgpu::PrimitiveTopology::LineList, None),
        };

        let front_face = match state.front_face {
            Winding::CounterClockwise => wgpu::FrontFace::Ccw,
            Winding::Clockwise => wgpu::FrontFace::Cw,
        };

        log::debug!("building pipeline for {key:?}");

        self.device
            .create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some("shadow scene pipeline"),
                layout: Some(&self.pipeline_layout),
                vertex: wgpu::VertexState {
                    module: &self.shader,
                    entry_point: Some("vs_main"),
                    buffers: &[GpuVertex::layout()],
                    compilation_options: wgpu::PipelineCompilationOptions::default(),
                },
                fragment: Some(wgpu::FragmentState {
                    module: &self.shader,
                    entry_point: Some("fs_main"),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: COLOR_FORMAT,
                        blend,
                        write_mask,
                    })],
                    compilation_options: wgpu::PipelineCompilationOptions::default(),
                }),
                primitive: wgpu::PrimitiveState {
                    topology,
                    strip_index_format: None,
                    front_face,
                    cull_mode,
                    polygon_mode: wgpu::PolygonMode::Fill,
                    unclipped_depth: false,
                    conservative: false,
                },
                depth_stencil: Some(wgpu::DepthStencilState {
                    format: DEPTH_STENCIL_FORMAT,
                    depth_write_enabled,
                    depth_compare,
                    stencil,
                    bias: wgpu::DepthBiasState::default(),
                }),
                multisample: wgpu::MultisampleState::default(),
                multiview: None,
                cache: None,
            })
    }

    fn submit(
        &mut self,
        vertices: &[GpuVertex],
        topology: Topology,
        target: Target,
        uniforms: &DrawUniforms,
    ) -> RenderResult<()> {
        if self.encoder.is_none() {
            return Err(RenderError::NoFrame);
        }
        if vertices.is_empty() {
            return Ok(());
        }

        let key = PipelineKey::new(&self.state, topology, target);
        if !self.pipelines.contains_key(&key) {
            let pipeline = self.create_pipeline(&key);
            self.pipelines.insert(key, pipeline);
        }

        let vertex_buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("shadow draw vertices"),
                contents: bytemuck::cast_slice(vertices),
                usage: wgpu::BufferUsages::VERTEX,
            });
        let uniform_buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("shadow draw uniforms"),
                contents: bytemuck::cast_slice(std::slice::from_ref(uniforms)),
                usage: wgpu::BufferUsages::UNIFORM,
            });
        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("shadow draw bind group"),
            layout: &self.bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        let view = match target {
            Target::Color => &self.color_view,
            Target::Pick => &self.pick_view,
        };
        let pipeline = self
            .pipelines
            .get(&key)
            .ok_or_else(|| RenderError::DrawFailed("pipeline missing".to_string()))?;
        let encoder = self.encoder.as_mut().ok_or(RenderError::NoFrame)?;

        let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Shadow Draw Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &self.depth_view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                }),
            }),
            ..Default::default()
        });

        render_pass.set_pipeline(pipeline);
        render_pass.set_bind_group(0, &bind_group, &[]);
        render_pass.set_vertex_buffer(0, vertex_buffer.slice(..));
        render_pass.set_stencil_reference(self.state.stencil.reference);
        render_pass.draw(0..vertices.len() as u32, 0..1);

        Ok(())
    }
}

impl GraphicsDevice for WgpuDevice {
    fn stencil_bits(&self) -> u8 {
        8
    }

    fn set_stencil_test(&mut self, enabled: bool) -> RenderResult<()> {
        self.state.stencil.enabled = enabled;
        Ok(())
    }

    fn set_stencil_func(
        &mut self,
        compare: CompareFunction,
        reference: u32,
        read_mask: u32,
    ) -> RenderResult<()> {
        self.state.stencil.compare = compare;
        self.state.stencil.reference = reference;
        self.state.stencil.read_mask = read_mask;
        Ok(())
    }

    fn set_stencil_op(
        &mut self,
        fail: StencilOperation,
        depth_fail: StencilOperation,
        pass: StencilOperation,
    ) -> RenderResult<()> {
        self.state.stencil.fail_op = fail;
        self.state.stencil.depth_fail_op = depth_fail;
        self.state.stencil.pass_op = pass;
        Ok(())
    }

    fn set_stencil_write_mask(&mut self, mask: u32) -> RenderResult<()> {
        self.state.stencil.write_mask = mask;
        Ok(())
    }

    fn clear_stencil(&mut self, value: u32) -> RenderResult<()> {
        let encoder = self.encoder.as_mut().ok_or(RenderError::NoFrame)?;
        let _clear = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Stencil Clear Pass"),
            color_attachments: &[],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &self.depth_view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(value),
                    store: wgpu::StoreOp::Store,
                }),
            }),
            ..Default::default()
        });
        Ok(())
    }

    fn set_depth_test(&mut self, enabled: bool) -> RenderResult<()> {
        self.state.depth_test = enabled;
        Ok(())
    }

    fn set_depth_func(&mut self, compare: CompareFunction) -> RenderResult<()> {
        self.state.depth_compare = compare;
        Ok(())
    }

    fn set_depth_mask(&mut self, write: bool) -> RenderResult<()> {
        self.state.depth_write = write;
        Ok(())
    }

    fn set_cull_face(&mut self, face: Option<Face>) -> RenderResult<()> {
        self.state.cull = face;
        Ok(())
    }

    fn set_front_face(&mut self, winding: Winding) -> RenderResult<()> {
        self.state.front_face = winding;
        Ok(())
    }

    fn set_color_mask(&mut self, write: bool) -> RenderResult<()> {
        self.state.color_write = write;
        Ok(())
    }

    fn set_blend(&mut self, blend: Option<BlendMode>) -> RenderResult<()> {
        self.state.blend = blend;
        Ok(())
    }

    fn set_lighting(&mut self, lighting: Lighting) -> RenderResult<()> {
        self.lighting = lighting;
        Ok(())
    }

    fn set_model_transform(&mut self, model: Mat4) -> RenderResult<()> {
        self.model = model;
        Ok(())
    }

    fn set_view_projection(&mut self, view: Mat4, projection: Mat4) -> RenderResult<()> {
        self.view_proj = projection * view;
        Ok(())
    }

    fn draw_surface(&mut self, surface: &SurfaceData<'_>) -> RenderResult<()> {
        if surface.normals.len() != surface.positions.len() {
            return Err(RenderError::DrawFailed(format!(
                "{} normals for {} positions",
                surface.normals.len(),
                surface.positions.len()
            )));
        }
        let vertices: Vec<GpuVertex> = surface
            .positions
            .iter()
            .zip(surface.normals)
            .map(|(p, n)| GpuVertex {
                position: p.extend(1.0).to_array(),
                normal: n.to_array(),
            })
            .collect();
        let uniforms = self.uniforms(surface.color, self.lighting);
        self.submit(&vertices, Topology::Triangles, Target::Color, &uniforms)
    }

    fn draw_homogeneous(
        &mut self,
        points: &[Vec4],
        primitive: Primitive,
        color: Vec4,
    ) -> RenderResult<()> {
        let (vertices, topology): (Vec<GpuVertex>, _) = match primitive {
            Primitive::Triangles => (
                points.iter().copied().map(GpuVertex::flat).collect(),
                Topology::Triangles,
            ),
            Primitive::Lines => (
                points.iter().copied().map(GpuVertex::flat).collect(),
                Topology::Lines,
            ),
            Primitive::Quads => (
                points
                    .chunks_exact(4)
                    .flat_map(|q| [q[0], q[1], q[2], q[0], q[2], q[3]])
                    .map(GpuVertex::flat)
                    .collect(),
                Topology::Triangles,
            ),
        };
        let uniforms = self.uniforms(color, Lighting::Unlit);
        self.submit(&vertices, topology, Target::Color, &uniforms)
    }

    fn draw_indexed(&mut self, points: &[Vec3], indices: &[u32], color: Vec4) -> RenderResult<()> {
        let vertices = indices
            .iter()
            .map(|&i| {
                points
                    .get(i as usize)
                    .map(|p| GpuVertex::flat(p.extend(1.0)))
                    .ok_or_else(|| {
                        RenderError::DrawFailed(format!(
                            "index {i} out of range for {} points",
                            points.len()
                        ))
                    })
            })
            .collect::<RenderResult<Vec<_>>>()?;
        let uniforms = self.uniforms(color, Lighting::Unlit);
        self.submit(&vertices, Topology::Triangles, Target::Color, &uniforms)
    }

    fn draw_pick(&mut self, surface: &SurfaceData<'_>, color: [u8; 3]) -> RenderResult<()> {
        let vertices: Vec<GpuVertex> = surface
            .positions
            .iter()
            .map(|p| GpuVertex::flat(p.extend(1.0)))
            .collect();
        let pick_color = Vec4::new(
            f32::from(color[0]) / 255.0,
            f32::from(color[1]) / 255.0,
            f32::from(color[2]) / 255.0,
            1.0,
        );
        let uniforms = self.uniforms(pick_color, Lighting::Unlit);
        self.submit(&vertices, Topology::Triangles, Target::Pick, &uniforms)
    }
}

fn compare_function(compare: CompareFunction) -> wgpu::CompareFunction {
    match compare {
        CompareFunction::Never => wgpu::CompareFunction::Never,
        CompareFunction::Less => wgpu::CompareFunction::Less,
        CompareFunction::Equal => wgpu::CompareFunction::Equal,
        CompareFunction::LessEqual => wgpu::CompareFunction::LessEqual,
        CompareFunction::Greater => wgpu::CompareFunction::Greater,
        CompareFunction::NotEqual => wgpu::CompareFunction::NotEqual,
        CompareFunction::GreaterEqual => wgpu::CompareFunction::GreaterEqual,
        CompareFunction::Always => wgpu::CompareFunction::Always,
    }
}

fn stencil_operation(op: StencilOperation) -> wgpu::StencilOperation {
    match op {
        StencilOperation::Keep => wgpu::StencilOperation::Keep,
        StencilOperation::Zero => wgpu::StencilOperation::Zero,
        StencilOperation::Replace => wgpu::StencilOperation::Replace,
        StencilOperation::Invert => wgpu::StencilOperation::Invert,
        StencilOperation::IncrementClamp => wgpu::StencilOperation::IncrementClamp,
        StencilOperation::DecrementClamp => wgpu::StencilOperation::DecrementClamp,
        StencilOperation::IncrementWrap => wgpu::StencilOperation::IncrementWrap,
        StencilOperation::DecrementWrap => wgpu::StencilOperation::DecrementWrap,
    }
}
