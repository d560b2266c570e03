// GPU side of the plot: one pipeline per drawable kind, per-drawable vertex and
// uniform buffers, a depth buffer, and PNG readback for screenshots.
//
// Frame flow:
//   Scene::render() → RenderPass (pure data)
//   Renderer::draw(RenderPass) → write each command's uniforms, then one wgpu render pass
//                                 with one non-indexed draw per command

use std::collections::HashMap;
use std::path::Path;
use wgpu::util::DeviceExt;
use super::error::{PlotError, Result};
use super::mesh::{AxisVertex, CubeVertex, SurfaceVertex};
use super::scene::{FrameUniforms, PipelineKind, RenderPass, Scene, Topology};

pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

struct DepthBuffer {
    _texture: wgpu::Texture,
    view: wgpu::TextureView,
}

impl DepthBuffer {
    fn new(device: &wgpu::Device, width: u32, height: u32) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Depth Texture"),
            size: wgpu::Extent3d {
                width: width.max(1),
                height: height.max(1),
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
        Self { _texture: texture, view }
    }
}

/// GPU resources owned by one registered drawable.
struct GpuDrawable {
    vertex_buffer: wgpu::Buffer,
    uniform_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

pub struct Renderer {
    format: wgpu::TextureFormat,
    clear_color: wgpu::Color,
    uniform_layout: wgpu::BindGroupLayout,
    pipelines: HashMap<PipelineKind, wgpu::RenderPipeline>,
    drawables: HashMap<String, GpuDrawable>,
    depth: DepthBuffer,
}

impl Renderer {
    pub fn new(device: &wgpu::Device, format: wgpu::TextureFormat, width: u32, height: u32, background: [f64; 3]) -> Self {
        let uniform_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
            label: Some("uniform_bind_group_layout"),
        });

        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Plot Pipeline Layout"),
            bind_group_layouts: &[&uniform_layout],
            push_constant_ranges: &[],
        });

        let pipelines = [
            (PipelineKind::Surface, include_str!("../shaders/surface.wgsl"), SurfaceVertex::desc()),
            (PipelineKind::Axes, include_str!("../shaders/axes.wgsl"), AxisVertex::desc()),
            (PipelineKind::Cube, include_str!("../shaders/cube.wgsl"), CubeVertex::desc()),
        ]
        .into_iter()
        .map(|(kind, source, buffer)| (kind, create_pipeline(device, &layout, format, kind, source, buffer)))
        .collect();

        let [r, g, b] = background;
        Self {
            format,
            clear_color: wgpu::Color { r, g, b, a: 1.0 },
            uniform_layout,
            pipelines,
            drawables: HashMap::new(),
            depth: DepthBuffer::new(device, width, height),
        }
    }

    /// Create buffers for every drawable in the scene. Call again after registering
    /// or replacing drawables; existing buffers are rebuilt.
    pub fn upload(&mut self, device: &wgpu::Device, scene: &Scene) {
        self.drawables.clear();
        for (id, drawable) in scene.iter() {
            let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(&format!("{id} Vertex Buffer")),
                contents: drawable.vertex_bytes(),
                usage: wgpu::BufferUsages::VERTEX,
            });
            let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
                label: Some(&format!("{id} Uniform Buffer")),
                size: std::mem::size_of::<FrameUniforms>() as wgpu::BufferAddress,
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            });
            let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
                layout: &self.uniform_layout,
                entries: &[wgpu::BindGroupEntry {
                    binding: 0,
                    resource: uniform_buffer.as_entire_binding(),
                }],
                label: Some(&format!("{id} Bind Group")),
            });
            self.drawables.insert(id.to_string(), GpuDrawable { vertex_buffer, uniform_buffer, bind_group });
        }
        log::debug!("uploaded {} drawables", self.drawables.len());
    }

    pub fn resize(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        self.depth = DepthBuffer::new(device, width, height);
    }

    /// Write uniforms and record the draw commands into `target`. Returns the number
    /// of draw calls issued.
    pub fn draw(
        &self,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        target: &wgpu::TextureView,
        pass: &RenderPass,
    ) -> u32 {
        self.record(queue, encoder, target, &self.depth.view, pass)
    }

    fn record(
        &self,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        target: &wgpu::TextureView,
        depth: &wgpu::TextureView,
        pass: &RenderPass,
    ) -> u32 {
        // All buffer writes land before the pass is submitted
        for command in &pass.commands {
            if let Some(gpu) = self.drawables.get(&command.id) {
                queue.write_buffer(&gpu.uniform_buffer, 0, bytemuck::cast_slice(&[command.uniforms]));
            }
        }

        let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Plot Render Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(self.clear_color),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: depth,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            occlusion_query_set: None,
            timestamp_writes: None,
        });

        let mut draw_calls = 0;
        for command in &pass.commands {
            let (Some(gpu), Some(pipeline)) = (self.drawables.get(&command.id), self.pipelines.get(&command.kind)) else {
                log::warn!("skipping '{}': not uploaded", command.id);
                continue;
            };
            render_pass.set_pipeline(pipeline);
            render_pass.set_bind_group(0, &gpu.bind_group, &[]);
            render_pass.set_vertex_buffer(0, gpu.vertex_buffer.slice(..));
            render_pass.draw(0..command.vertex_count, 0..1);
            draw_calls += 1;
        }
        draw_calls
    }

    /// Render `pass` offscreen at `width` x `height` and save it as a PNG.
    pub fn screenshot(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        pass: &RenderPass,
        width: u32,
        height: u32,
        path: &Path,
    ) -> Result<()> {
        if width == 0 || height == 0 {
            return Err(PlotError::Screenshot(format!("cannot capture a {width} x {height} frame")));
        }
        let swap_red_blue = match self.format {
            wgpu::TextureFormat::Rgba8Unorm | wgpu::TextureFormat::Rgba8UnormSrgb => false,
            wgpu::TextureFormat::Bgra8Unorm | wgpu::TextureFormat::Bgra8UnormSrgb => true,
            other => return Err(PlotError::Screenshot(format!("unsupported surface format {other:?}"))),
        };

        let size = wgpu::Extent3d { width, height, depth_or_array_layers: 1 };
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Screenshot Texture"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: self.format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let depth = DepthBuffer::new(device, width, height);

        let unpadded_bytes_per_row = 4 * width;
        let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
        let padded_bytes_per_row = unpadded_bytes_per_row.div_ceil(align) * align;
        let readback = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Screenshot Readback"),
            size: (padded_bytes_per_row * height) as wgpu::BufferAddress,
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Screenshot Encoder"),
        });
        self.record(queue, &mut encoder, &view, &depth.view, pass);
        encoder.copy_texture_to_buffer(
            wgpu::ImageCopyTexture {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::ImageCopyBuffer {
                buffer: &readback,
                layout: wgpu::ImageDataLayout {
                    offset: 0,
                    bytes_per_row: Some(padded_bytes_per_row),
                    rows_per_image: Some(height),
                },
            },
            size,
        );
        queue.submit(std::iter::once(encoder.finish()));

        let slice = readback.slice(..);
        let (tx, rx) = std::sync::mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = tx.send(result);
        });
        device.poll(wgpu::Maintain::Wait);
        rx.recv()
            .map_err(|_| PlotError::Screenshot("readback callback dropped".into()))?
            .map_err(|e| PlotError::Screenshot(format!("buffer map failed: {e}")))?;

        let pixels = {
            let data = slice.get_mapped_range();
            unpad_rows(&data, unpadded_bytes_per_row as usize, padded_bytes_per_row as usize, height as usize, swap_red_blue)
        };
        readback.unmap();

        let image = image::RgbaImage::from_raw(width, height, pixels)
            .ok_or_else(|| PlotError::Screenshot("pixel buffer size mismatch".into()))?;
        image.save(path)?;
        log::info!("saved screenshot {}", path.display());
        Ok(())
    }
}

fn create_pipeline(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
    format: wgpu::TextureFormat,
    kind: PipelineKind,
    source: &str,
    buffer: wgpu::VertexBufferLayout<'static>,
) -> wgpu::RenderPipeline {
    let label = format!("{kind:?} Pipeline");
    let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(&label),
        source: wgpu::ShaderSource::Wgsl(source.into()),
    });

    let (topology, cull_mode) = match kind {
        // visible from below
        PipelineKind::Surface => (Topology::Triangles, None),
        PipelineKind::Axes => (Topology::Lines, None),
        PipelineKind::Cube => (Topology::Triangles, Some(wgpu::Face::Back)),
    };

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(&label),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: &shader,
            entry_point: Some("vs_main"),
            buffers: &[buffer],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: &shader,
            entry_point: Some("fs_main"),
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: Some(wgpu::BlendState::REPLACE),
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology: primitive_topology(topology),
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode,
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },
        depth_stencil: Some(wgpu::DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: true,
            depth_compare: wgpu::CompareFunction::Less,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }),
        multisample: wgpu::MultisampleState {
            count: 1,
            mask: !0,
            alpha_to_coverage_enabled: false,
        },
        multiview: None,
        cache: None,
    })
}

/// Pick the swapchain format. Colormap colors and the clear color are display
/// (gamma-encoded) values, so they must land in a non-sRGB target unconverted.
pub fn preferred_surface_format(formats: &[wgpu::TextureFormat]) -> Option<wgpu::TextureFormat> {
    let format = formats.iter().copied().find(|f| !f.is_srgb()).or_else(|| formats.first().copied())?;
    if format.is_srgb() {
        log::warn!("no non-sRGB surface format available, colors will render lighter ({format:?})");
    }
    Some(format)
}

pub fn primitive_topology(topology: Topology) -> wgpu::PrimitiveTopology {
    match topology {
        Topology::Triangles => wgpu::PrimitiveTopology::TriangleList,
        Topology::Lines => wgpu::PrimitiveTopology::LineList,
    }
}

/// Strip the row padding required by buffer copies; optionally swizzle BGRA to RGBA.
fn unpad_rows(data: &[u8], row_bytes: usize, padded_row_bytes: usize, rows: usize, swap_red_blue: bool) -> Vec<u8> {
    let mut pixels = Vec::with_capacity(row_bytes * rows);
    for row in data.chunks(padded_row_bytes).take(rows) {
        pixels.extend_from_slice(&row[..row_bytes]);
    }
    if swap_red_blue {
        for px in pixels.chunks_exact_mut(4) {
            px.swap(0, 2);
        }
    }
    pixels
}
