//! wgpu GPU backend implementation.
//!
//! This backend uses wgpu for cross-platform GPU access, supporting
//! Vulkan, Metal, DX12, and WebGPU.
//!
//! Each bake draw records one render pass into a 2D view of the bound layer
//! and mip, and submits it immediately. Capture matrices are flipped in `y`
//! before upload so that row 0 of every render target holds NDC `y = -1`,
//! the same layout cube sampling and the CPU backend use.
//!
//! `Rgba32Float` is not filterable without an optional feature, so textures
//! requested in that format are stored as `Rgba16Float`.

use std::collections::HashMap;

use half::f16;
use prism_core::math::{Mat4, mat4_to_cols_array_2d};
use prism_core::mesh::{PrimitiveTopology, VertexAttributeFormat, VertexStepMode};
use prism_core::profile_scope;
use wgpu::util::DeviceExt;

use super::{
    BackendId, BakeBackend, BakeUniforms, BufferId, ColorAttachment, DrawCommand, TexelData,
    TextureId,
};
use crate::error::GraphicsError;
use crate::mesh::{GpuMesh, IndexFormat};
use crate::shader::{FRAGMENT_ENTRY, ShaderProgram, VERTEX_ENTRY};
use crate::types::{
    BufferDescriptor, BufferUsage, Extent2d, TextureDescriptor, TextureDimension, TextureFormat,
    TextureUsage,
};

const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth24Plus;
const COPY_ROW_ALIGNMENT: u32 = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct PipelineKey {
    program: ShaderProgram,
    format: wgpu::TextureFormat,
    topology: PrimitiveTopology,
}

struct TextureEntry {
    texture: wgpu::Texture,
    descriptor: TextureDescriptor,
    format: wgpu::TextureFormat,
}

struct DepthTarget {
    extent: Extent2d,
    view: wgpu::TextureView,
}

/// wgpu-based GPU backend.
pub struct WgpuBackend {
    #[allow(dead_code)]
    instance: wgpu::Instance,
    adapter: wgpu::Adapter,
    device: wgpu::Device,
    queue: wgpu::Queue,
    id: BackendId,
    next_id: u64,
    textures: HashMap<TextureId, TextureEntry>,
    buffers: HashMap<BufferId, wgpu::Buffer>,
    shader_modules: HashMap<ShaderProgram, wgpu::ShaderModule>,
    pipelines: HashMap<PipelineKey, wgpu::RenderPipeline>,
    sampler: wgpu::Sampler,
    depth: Option<DepthTarget>,
    attachment: Option<ColorAttachment>,
}

impl std::fmt::Debug for WgpuBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WgpuBackend")
            .field("adapter", &self.adapter.get_info().name)
            .field("textures", &self.textures.len())
            .field("pipelines", &self.pipelines.len())
            .finish()
    }
}

impl WgpuBackend {
    /// Create a new wgpu backend on the first compatible adapter.
    pub fn new() -> Result<Self, GraphicsError> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            flags: wgpu::InstanceFlags::default(),
            backend_options: wgpu::BackendOptions::default(),
            memory_budget_thresholds: wgpu::MemoryBudgetThresholds::default(),
        });

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: None,
            force_fallback_adapter: false,
        }))
        .map_err(|e| GraphicsError::BackendUnavailable(format!("No compatible GPU adapter: {e}")))?;

        log::info!("wgpu adapter: {:?}", adapter.get_info());

        let (device, queue) = pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor {
            label: Some("Prism Bake Device"),
            required_features: wgpu::Features::empty(),
            required_limits: wgpu::Limits::default(),
            memory_hints: wgpu::MemoryHints::default(),
            experimental_features: wgpu::ExperimentalFeatures::default(),
            trace: wgpu::Trace::Off,
        }))
        .map_err(|e| GraphicsError::BackendUnavailable(format!("Device creation failed: {e}")))?;

        // u repeats for the equirect seam; cube and 2D lookups clamp
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Bake Sampler"),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::MipmapFilterMode::Linear,
            ..Default::default()
        });

        Ok(Self {
            instance,
            adapter,
            device,
            queue,
            id: BackendId::next(),
            next_id: 0,
            textures: HashMap::new(),
            buffers: HashMap::new(),
            shader_modules: HashMap::new(),
            pipelines: HashMap::new(),
            sampler,
            depth: None,
            attachment: None,
        })
    }

    /// Get the wgpu device.
    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    /// Get the wgpu queue.
    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    fn allocate_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn entry(&self, texture: TextureId) -> Result<&TextureEntry, GraphicsError> {
        self.textures.get(&texture).ok_or_else(|| {
            GraphicsError::InvariantViolation(format!("unknown texture {}", texture.raw()))
        })
    }

    fn buffer(&self, buffer: BufferId) -> Result<&wgpu::Buffer, GraphicsError> {
        self.buffers.get(&buffer).ok_or_else(|| {
            GraphicsError::InvariantViolation(format!("unknown buffer {}", buffer.raw()))
        })
    }

    /// The bound attachment with its entry, checked against the depth target.
    fn bound_target(&self) -> Result<(ColorAttachment, &TextureEntry), GraphicsError> {
        let attachment = self.attachment.ok_or_else(|| {
            GraphicsError::InvariantViolation("no color attachment bound".to_string())
        })?;
        let entry = self.entry(attachment.texture)?;
        let extent = entry.descriptor.mip_extent(attachment.mip);
        match &self.depth {
            Some(depth) if depth.extent == extent => Ok((attachment, entry)),
            other => Err(GraphicsError::InvariantViolation(format!(
                "depth target {:?} does not match attachment {extent}",
                other.as_ref().map(|d| d.extent)
            ))),
        }
    }

    fn shader_module(&mut self, program: ShaderProgram) -> &wgpu::ShaderModule {
        let device = &self.device;
        self.shader_modules.entry(program).or_insert_with(|| {
            device.create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some(program.name()),
                source: wgpu::ShaderSource::Wgsl(program.source().into()),
            })
        })
    }

    fn pipeline(
        &mut self,
        program: ShaderProgram,
        format: wgpu::TextureFormat,
        mesh: Option<&GpuMesh>,
    ) -> PipelineKey {
        let topology = mesh.map(GpuMesh::topology).unwrap_or_default();
        let key = PipelineKey {
            program,
            format,
            topology,
        };
        if self.pipelines.contains_key(&key) {
            return key;
        }

        log::debug!("Creating {program} pipeline for {format:?}");
        self.shader_module(program);
        let module = &self.shader_modules[&program];

        let attributes: Vec<wgpu::VertexAttribute> = mesh
            .map(|m| {
                m.layout()
                    .attributes
                    .iter()
                    .map(|attr| wgpu::VertexAttribute {
                        format: convert_vertex_format(attr.format),
                        offset: attr.offset as u64,
                        shader_location: attr.semantic.index(),
                    })
                    .collect()
            })
            .unwrap_or_default();
        let vertex_buffers: Vec<wgpu::VertexBufferLayout> = mesh
            .and_then(|m| m.layout().buffers.first().copied())
            .map(|buffer| wgpu::VertexBufferLayout {
                array_stride: buffer.stride as u64,
                step_mode: match buffer.step_mode {
                    VertexStepMode::Vertex => wgpu::VertexStepMode::Vertex,
                    VertexStepMode::Instance => wgpu::VertexStepMode::Instance,
                },
                attributes: &attributes,
            })
            .into_iter()
            .collect();

        let color_targets = [Some(wgpu::ColorTargetState {
            format,
            blend: Some(wgpu::BlendState::REPLACE),
            write_mask: wgpu::ColorWrites::ALL,
        })];

        let depth_stencil = (program != ShaderProgram::Downsample).then(|| wgpu::DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: true,
            depth_compare: wgpu::CompareFunction::LessEqual,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        });

        let pipeline = self
            .device
            .create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(program.name()),
                layout: None,
                vertex: wgpu::VertexState {
                    module,
                    entry_point: Some(VERTEX_ENTRY),
                    buffers: &vertex_buffers,
                    compilation_options: wgpu::PipelineCompilationOptions::default(),
                },
                fragment: Some(wgpu::FragmentState {
                    module,
                    entry_point: Some(FRAGMENT_ENTRY),
                    targets: &color_targets,
                    compilation_options: wgpu::PipelineCompilationOptions::default(),
                }),
                primitive: wgpu::PrimitiveState {
                    topology: convert_topology(topology),
                    strip_index_format: None,
                    front_face: wgpu::FrontFace::Ccw,
                    cull_mode: None,
                    polygon_mode: wgpu::PolygonMode::Fill,
                    unclipped_depth: false,
                    conservative: false,
                },
                depth_stencil,
                multisample: wgpu::MultisampleState::default(),
                multiview_mask: None,
                cache: None,
            });
        self.pipelines.insert(key, pipeline);
        key
    }

    fn submit(&self, encoder: wgpu::CommandEncoder) {
        self.queue.submit(std::iter::once(encoder.finish()));
    }

    fn wait_idle(&self) -> Result<(), GraphicsError> {
        self.device
            .poll(wgpu::PollType::wait_indefinitely())
            .map(|_| ())
            .map_err(|e| GraphicsError::BackendUnavailable(format!("device poll failed: {e}")))
    }
}

/// A 2D view of one layer and mip.
fn slice_view(texture: &wgpu::Texture, layer: u32, mip: u32) -> wgpu::TextureView {
    texture.create_view(&wgpu::TextureViewDescriptor {
        label: Some("Bake Slice View"),
        dimension: Some(wgpu::TextureViewDimension::D2),
        base_mip_level: mip,
        mip_level_count: Some(1),
        base_array_layer: layer,
        array_layer_count: Some(1),
        ..Default::default()
    })
}

/// A view over every layer and mip, typed as the texture's dimension.
fn sampled_view(entry: &TextureEntry) -> wgpu::TextureView {
    let dimension = match entry.descriptor.dimension {
        TextureDimension::D2 => wgpu::TextureViewDimension::D2,
        TextureDimension::Cube => wgpu::TextureViewDimension::Cube,
    };
    entry.texture.create_view(&wgpu::TextureViewDescriptor {
        label: Some("Bake Source View"),
        dimension: Some(dimension),
        ..Default::default()
    })
}

/// Flip clip-space `y` so render rows follow NDC `y = -1` first.
fn flip_y(uniforms: &BakeUniforms) -> BakeUniforms {
    let cols = &uniforms.view_proj;
    let view_proj = Mat4::from_fn(|row, col| cols[col][row]);
    let flip = Mat4::new_nonuniform_scaling(&prism_core::math::Vec3::new(1.0, -1.0, 1.0));
    BakeUniforms {
        view_proj: mat4_to_cols_array_2d(&(flip * view_proj)),
        ..*uniforms
    }
}

impl BakeBackend for WgpuBackend {
    fn name(&self) -> &'static str {
        "wgpu Backend"
    }

    fn id(&self) -> BackendId {
        self.id
    }

    fn create_texture(
        &mut self,
        descriptor: &TextureDescriptor,
    ) -> Result<TextureId, GraphicsError> {
        let limits = self.device.limits();
        let size = descriptor.size;
        if size.area() == 0
            || size.width > limits.max_texture_dimension_2d
            || size.height > limits.max_texture_dimension_2d
            || descriptor.mip_level_count == 0
            || descriptor.mip_level_count > size.max_mip_levels()
        {
            return Err(GraphicsError::ResourceExhaustion(format!(
                "texture {:?} ({size}, {} mips) exceeds device limits",
                descriptor.label, descriptor.mip_level_count
            )));
        }

        let format = convert_texture_format(descriptor.format);
        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: descriptor.label.as_deref(),
            size: wgpu::Extent3d {
                width: size.width,
                height: size.height,
                depth_or_array_layers: descriptor.layer_count(),
            },
            mip_level_count: descriptor.mip_level_count,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: convert_texture_usage(descriptor.usage),
            view_formats: &[],
        });

        let id = TextureId::new(self.allocate_id());
        self.textures.insert(
            id,
            TextureEntry {
                texture,
                descriptor: descriptor.clone(),
                format,
            },
        );
        Ok(id)
    }

    fn destroy_texture(&mut self, texture: TextureId) -> Result<(), GraphicsError> {
        let entry = self.textures.remove(&texture).ok_or_else(|| {
            GraphicsError::InvariantViolation(format!("unknown texture {}", texture.raw()))
        })?;
        if self.attachment.is_some_and(|a| a.texture == texture) {
            self.attachment = None;
        }
        entry.texture.destroy();
        Ok(())
    }

    fn write_texture(
        &mut self,
        texture: TextureId,
        layer: u32,
        mip: u32,
        data: TexelData<'_>,
    ) -> Result<(), GraphicsError> {
        let entry = self.entry(texture)?;
        let extent = entry.descriptor.mip_extent(mip);
        if data.texel_count() != extent.area() {
            return Err(GraphicsError::InvariantViolation(format!(
                "expected {} texels, got {}",
                extent.area(),
                data.texel_count()
            )));
        }

        let bytes = encode_texels(entry.format, data);
        let bytes_per_pixel = texel_size(entry.format);
        self.queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &entry.texture,
                mip_level: mip,
                origin: wgpu::Origin3d {
                    x: 0,
                    y: 0,
                    z: layer,
                },
                aspect: wgpu::TextureAspect::All,
            },
            &bytes,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(extent.width * bytes_per_pixel),
                rows_per_image: Some(extent.height),
            },
            wgpu::Extent3d {
                width: extent.width,
                height: extent.height,
                depth_or_array_layers: 1,
            },
        );
        Ok(())
    }

    fn create_buffer(
        &mut self,
        descriptor: &BufferDescriptor,
        contents: &[u8],
    ) -> Result<BufferId, GraphicsError> {
        if contents.len() as u64 > self.device.limits().max_buffer_size {
            return Err(GraphicsError::ResourceExhaustion(format!(
                "buffer {:?} of {} bytes exceeds device limits",
                descriptor.label,
                contents.len()
            )));
        }
        let buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: descriptor.label.as_deref(),
                contents,
                usage: convert_buffer_usage(descriptor.usage),
            });
        let id = BufferId::new(self.allocate_id());
        self.buffers.insert(id, buffer);
        Ok(id)
    }

    fn resize_depth(&mut self, extent: Extent2d) -> Result<(), GraphicsError> {
        if self.depth.as_ref().is_some_and(|d| d.extent == extent) {
            return Ok(());
        }
        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Bake Depth"),
            size: wgpu::Extent3d {
                width: extent.width,
                height: extent.height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        self.depth = Some(DepthTarget { extent, view });
        Ok(())
    }

    fn set_color_attachment(
        &mut self,
        attachment: Option<ColorAttachment>,
    ) -> Result<(), GraphicsError> {
        if let Some(attachment) = &attachment {
            let entry = self.entry(attachment.texture)?;
            if attachment.layer >= entry.descriptor.layer_count()
                || attachment.mip >= entry.descriptor.mip_level_count
            {
                return Err(GraphicsError::InvariantViolation(format!(
                    "attachment layer {} mip {} out of range",
                    attachment.layer, attachment.mip
                )));
            }
        }
        self.attachment = attachment;
        Ok(())
    }

    fn clear_color_attachment(&mut self, color: [f32; 4]) -> Result<(), GraphicsError> {
        let (attachment, entry) = self.bound_target()?;
        let view = slice_view(&entry.texture, attachment.layer, attachment.mip);
        let depth = self.depth.as_ref().map(|d| &d.view);

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Bake Clear Encoder"),
            });
        {
            let _pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Bake Clear"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: color[0] as f64,
                            g: color[1] as f64,
                            b: color[2] as f64,
                            a: color[3] as f64,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: depth.map(|view| wgpu::RenderPassDepthStencilAttachment {
                    view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });
        }
        self.submit(encoder);
        Ok(())
    }

    fn draw(&mut self, command: &DrawCommand<'_>) -> Result<(), GraphicsError> {
        profile_scope!("wgpu_draw");
        let (attachment, target_format) = {
            let (attachment, entry) = self.bound_target()?;
            (attachment, entry.format)
        };
        let program = command.program;
        if !program.is_bake_program() {
            return Err(GraphicsError::Unsupported(format!(
                "wgpu bake backend cannot draw {program}"
            )));
        }

        let key = self.pipeline(program, target_format, Some(command.mesh));
        let pipeline = &self.pipelines[&key];

        let uniforms = flip_y(&command.uniforms);
        let uniform_buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Bake Uniforms"),
                contents: bytemuck::bytes_of(&uniforms),
                usage: wgpu::BufferUsages::UNIFORM,
            });

        let source_view = match program {
            ShaderProgram::BrdfIntegration => None,
            _ => {
                let binding = command.inputs.iter().find(|b| b.slot == 0).ok_or_else(|| {
                    GraphicsError::InvariantViolation(format!("{program} needs a source texture"))
                })?;
                Some(sampled_view(self.entry(binding.texture)?))
            }
        };

        let mut entries = vec![wgpu::BindGroupEntry {
            binding: 0,
            resource: uniform_buffer.as_entire_binding(),
        }];
        if let Some(view) = &source_view {
            entries.push(wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::TextureView(view),
            });
            entries.push(wgpu::BindGroupEntry {
                binding: 2,
                resource: wgpu::BindingResource::Sampler(&self.sampler),
            });
        }
        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Bake Bind Group"),
            layout: &pipeline.get_bind_group_layout(0),
            entries: &entries,
        });

        let target = self.entry(attachment.texture)?;
        let view = slice_view(&target.texture, attachment.layer, attachment.mip);
        let depth = self.depth.as_ref().map(|d| &d.view);
        let vertex_buffer = self.buffer(command.mesh.vertex_buffer())?;
        let index_buffer = match command.mesh.index_buffer() {
            Some(id) => Some(self.buffer(id)?),
            None => None,
        };

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Bake Draw Encoder"),
            });
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some(program.name()),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: depth.map(|view| wgpu::RenderPassDepthStencilAttachment {
                    view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });
            pass.set_pipeline(pipeline);
            pass.set_bind_group(0, &bind_group, &[]);
            pass.set_vertex_buffer(0, vertex_buffer.slice(..));
            match index_buffer {
                Some(index_buffer) => {
                    let format = match command.mesh.index_format().unwrap_or_default() {
                        IndexFormat::Uint32 => wgpu::IndexFormat::Uint32,
                    };
                    pass.set_index_buffer(index_buffer.slice(..), format);
                    pass.draw_indexed(0..command.mesh.index_count(), 0, 0..1);
                }
                None => pass.draw(0..command.mesh.vertex_count(), 0..1),
            }
        }
        self.submit(encoder);
        Ok(())
    }

    fn generate_mipmaps(&mut self, texture: TextureId) -> Result<(), GraphicsError> {
        profile_scope!("wgpu_generate_mipmaps");
        let format = self.entry(texture)?.format;
        if !self
            .entry(texture)?
            .descriptor
            .usage
            .contains(TextureUsage::RENDER_ATTACHMENT)
        {
            return Err(GraphicsError::Unsupported(
                "mipmap generation needs a render attachment texture".to_string(),
            ));
        }
        let key = self.pipeline(ShaderProgram::Downsample, format, None);
        let pipeline = &self.pipelines[&key];
        let entry = self.entry(texture)?;
        let layout = pipeline.get_bind_group_layout(0);

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Mipmap Encoder"),
            });
        for layer in 0..entry.descriptor.layer_count() {
            for mip in 1..entry.descriptor.mip_level_count {
                let source = slice_view(&entry.texture, layer, mip - 1);
                let target = slice_view(&entry.texture, layer, mip);
                let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
                    label: Some("Downsample Bind Group"),
                    layout: &layout,
                    entries: &[
                        wgpu::BindGroupEntry {
                            binding: 0,
                            resource: wgpu::BindingResource::TextureView(&source),
                        },
                        wgpu::BindGroupEntry {
                            binding: 1,
                            resource: wgpu::BindingResource::Sampler(&self.sampler),
                        },
                    ],
                });
                let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("Downsample"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view: &target,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                            store: wgpu::StoreOp::Store,
                        },
                        depth_slice: None,
                    })],
                    depth_stencil_attachment: None,
                    timestamp_writes: None,
                    occlusion_query_set: None,
                    multiview_mask: None,
                });
                pass.set_pipeline(pipeline);
                pass.set_bind_group(0, &bind_group, &[]);
                pass.draw(0..3, 0..1);
            }
        }
        self.submit(encoder);
        Ok(())
    }

    fn read_texture(
        &mut self,
        texture: TextureId,
        layer: u32,
        mip: u32,
    ) -> Result<Vec<[f32; 4]>, GraphicsError> {
        let entry = self.entry(texture)?;
        if layer >= entry.descriptor.layer_count() || mip >= entry.descriptor.mip_level_count {
            return Err(GraphicsError::InvariantViolation(format!(
                "layer {layer} mip {mip} out of range"
            )));
        }
        let extent = entry.descriptor.mip_extent(mip);
        let bytes_per_pixel = texel_size(entry.format);
        let unpadded = extent.width * bytes_per_pixel;
        let padded = unpadded.div_ceil(COPY_ROW_ALIGNMENT) * COPY_ROW_ALIGNMENT;

        let staging = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Texture Readback Buffer"),
            size: padded as u64 * extent.height as u64,
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Texture Readback Encoder"),
            });
        encoder.copy_texture_to_buffer(
            wgpu::TexelCopyTextureInfo {
                texture: &entry.texture,
                mip_level: mip,
                origin: wgpu::Origin3d {
                    x: 0,
                    y: 0,
                    z: layer,
                },
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::TexelCopyBufferInfo {
                buffer: &staging,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(padded),
                    rows_per_image: Some(extent.height),
                },
            },
            wgpu::Extent3d {
                width: extent.width,
                height: extent.height,
                depth_or_array_layers: 1,
            },
        );
        let format = entry.format;
        self.submit(encoder);

        let slice = staging.slice(..);
        let (tx, rx) = std::sync::mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = tx.send(result);
        });
        self.wait_idle()?;
        match rx.recv() {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                return Err(GraphicsError::ResourceExhaustion(format!(
                    "readback mapping failed: {e}"
                )));
            }
            Err(e) => {
                return Err(GraphicsError::ResourceExhaustion(format!(
                    "readback never completed: {e}"
                )));
            }
        }

        let texels = {
            let mapped = slice.get_mapped_range();
            mapped
                .chunks_exact(padded as usize)
                .flat_map(|row| decode_texels(format, &row[..unpadded as usize]))
                .collect()
        };
        staging.unmap();
        Ok(texels)
    }

    fn flush(&mut self) -> Result<(), GraphicsError> {
        self.wait_idle()
    }
}

fn texel_size(format: wgpu::TextureFormat) -> u32 {
    match format {
        wgpu::TextureFormat::Rgba16Float => 8,
        wgpu::TextureFormat::Rgba32Float => 16,
        _ => 4,
    }
}

fn encode_texels(format: wgpu::TextureFormat, data: TexelData<'_>) -> Vec<u8> {
    match (format, data) {
        (
            wgpu::TextureFormat::Rgba8Unorm | wgpu::TextureFormat::Rgba8UnormSrgb,
            TexelData::Rgba8(bytes),
        ) => bytes.to_vec(),
        (wgpu::TextureFormat::Rgba8Unorm | wgpu::TextureFormat::Rgba8UnormSrgb, data) => data
            .to_rgba_f32()
            .iter()
            .flatten()
            .map(|v| (v.clamp(0.0, 1.0) * 255.0).round() as u8)
            .collect(),
        (wgpu::TextureFormat::Rg16Float, data) => data
            .to_rgba_f32()
            .iter()
            .flat_map(|t| [t[0], t[1]])
            .flat_map(|v| f16::from_f32(v).to_le_bytes())
            .collect(),
        (_, data) => data
            .to_rgba_f32()
            .iter()
            .flatten()
            .flat_map(|v| f16::from_f32(*v).to_le_bytes())
            .collect(),
    }
}

fn decode_texels(format: wgpu::TextureFormat, row: &[u8]) -> Vec<[f32; 4]> {
    let half = |b: &[u8]| f16::from_le_bytes([b[0], b[1]]).to_f32();
    match format {
        wgpu::TextureFormat::Rgba8Unorm | wgpu::TextureFormat::Rgba8UnormSrgb => row
            .chunks_exact(4)
            .map(|c| [c[0], c[1], c[2], c[3]].map(|v| v as f32 / 255.0))
            .collect(),
        wgpu::TextureFormat::Rg16Float => row
            .chunks_exact(4)
            .map(|c| [half(&c[0..2]), half(&c[2..4]), 0.0, 1.0])
            .collect(),
        _ => row
            .chunks_exact(8)
            .map(|c| {
                [
                    half(&c[0..2]),
                    half(&c[2..4]),
                    half(&c[4..6]),
                    half(&c[6..8]),
                ]
            })
            .collect(),
    }
}

fn convert_buffer_usage(usage: BufferUsage) -> wgpu::BufferUsages {
    let mut result = wgpu::BufferUsages::empty();

    if usage.contains(BufferUsage::VERTEX) {
        result |= wgpu::BufferUsages::VERTEX;
    }
    if usage.contains(BufferUsage::INDEX) {
        result |= wgpu::BufferUsages::INDEX;
    }
    if usage.contains(BufferUsage::COPY_DST) {
        result |= wgpu::BufferUsages::COPY_DST;
    }

    result
}

fn convert_texture_format(format: TextureFormat) -> wgpu::TextureFormat {
    match format {
        TextureFormat::Rgba8Unorm => wgpu::TextureFormat::Rgba8Unorm,
        TextureFormat::Rgba8UnormSrgb => wgpu::TextureFormat::Rgba8UnormSrgb,
        TextureFormat::Rgba16Float | TextureFormat::Rgba32Float => {
            wgpu::TextureFormat::Rgba16Float
        }
        TextureFormat::Rg16Float => wgpu::TextureFormat::Rg16Float,
        TextureFormat::Depth24Plus => wgpu::TextureFormat::Depth24Plus,
    }
}

fn convert_texture_usage(usage: TextureUsage) -> wgpu::TextureUsages {
    let mut result = wgpu::TextureUsages::empty();

    if usage.contains(TextureUsage::COPY_SRC) {
        result |= wgpu::TextureUsages::COPY_SRC;
    }
    if usage.contains(TextureUsage::COPY_DST) {
        result |= wgpu::TextureUsages::COPY_DST;
    }
    if usage.contains(TextureUsage::TEXTURE_BINDING) {
        result |= wgpu::TextureUsages::TEXTURE_BINDING;
    }
    if usage.contains(TextureUsage::RENDER_ATTACHMENT) {
        result |= wgpu::TextureUsages::RENDER_ATTACHMENT;
    }

    result
}

fn convert_vertex_format(format: VertexAttributeFormat) -> wgpu::VertexFormat {
    match format {
        VertexAttributeFormat::Float2 => wgpu::VertexFormat::Float32x2,
        VertexAttributeFormat::Float3 => wgpu::VertexFormat::Float32x3,
        VertexAttributeFormat::Float4 => wgpu::VertexFormat::Float32x4,
    }
}

fn convert_topology(topology: PrimitiveTopology) -> wgpu::PrimitiveTopology {
    match topology {
        PrimitiveTopology::TriangleList => wgpu::PrimitiveTopology::TriangleList,
        PrimitiveTopology::TriangleStrip => wgpu::PrimitiveTopology::TriangleStrip,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flip_negates_clip_y() {
        let flipped = flip_y(&BakeUniforms::default());
        assert_eq!(flipped.view_proj[1][1], -1.0);
        assert_eq!(flipped.view_proj[0][0], 1.0);
    }

    #[test]
    fn half_texels_round_trip_through_bytes() {
        let texels = [1.0f32, 0.5, 0.25, 1.0];
        let bytes = encode_texels(
            wgpu::TextureFormat::Rgba16Float,
            TexelData::Rgba32Float(&texels),
        );
        assert_eq!(bytes.len(), 8);
        assert_eq!(
            decode_texels(wgpu::TextureFormat::Rgba16Float, &bytes),
            vec![[1.0, 0.5, 0.25, 1.0]]
        );
    }

    #[test]
    fn rg_texels_drop_blue_and_alpha() {
        let texels = [0.5f32, 0.25, 9.0, 9.0];
        let bytes = encode_texels(wgpu::TextureFormat::Rg16Float, TexelData::Rgba32Float(&texels));
        assert_eq!(bytes.len(), 4);
        assert_eq!(
            decode_texels(wgpu::TextureFormat::Rg16Float, &bytes),
            vec![[0.5, 0.25, 0.0, 1.0]]
        );
    }
}
