use glam::Mat4;
use image::RgbaImage;
use raw_window_handle::{HasDisplayHandle, HasWindowHandle};
use wgpu::util::DeviceExt;

use crate::backend::{
    Diagnostics, GraphicsBackend, ProgramHandle, ShaderHandle, ShaderStage, TextureHandle,
    check_texture_size,
};
use crate::error::SpriteError;
use crate::vertex::Vertex;

struct GpuTexture {
    _texture: wgpu::Texture,
    bind_group: wgpu::BindGroup,
}

// Commands recorded between `clear` and `submit`.
struct PendingFrame {
    clear: Option<[f32; 4]>,
    draws: Vec<(u32, u32)>,
}

/// wgpu implementation of [`GraphicsBackend`] drawing into a window surface.
///
/// `wgpu::Surface` carries a lifetime parameter because (on some platforms) the surface
/// must not outlive the underlying windowing resources. We create the surface from an owned
/// clone of `window` (typically an `Arc<Window>`), which allows us to store it as `'static`.
pub struct WgpuBackend<W> {
    // These fields are kept to ensure the underlying windowing resources outlive the surface.
    _window: W,
    _instance: wgpu::Instance,
    surface: wgpu::Surface<'static>,
    _adapter: wgpu::Adapter,
    device: wgpu::Device,
    queue: wgpu::Queue,
    surface_config: wgpu::SurfaceConfiguration,

    transform_bind_group_layout: wgpu::BindGroupLayout,
    transform_buffer: wgpu::Buffer,
    transform_bind_group: wgpu::BindGroup,
    tex_bind_group_layout: wgpu::BindGroupLayout,

    vertex_buffer: Option<wgpu::Buffer>,

    shaders: Vec<(ShaderStage, wgpu::ShaderModule)>,
    pipelines: Vec<wgpu::RenderPipeline>,
    textures: Vec<GpuTexture>,
    active_pipeline: Option<usize>,
    bound_texture: Option<usize>,

    pending: Option<PendingFrame>,
}

impl<W> WgpuBackend<W>
where
    W: HasWindowHandle + HasDisplayHandle + wgpu::WasmNotSendSync + Sync + Clone + 'static,
{
    pub async fn new(window: W, width: u32, height: u32) -> Result<Self, SpriteError> {
        let backends = wgpu::Backends::all();
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends,
            ..Default::default()
        });

        let surface = instance
            .create_surface(window.clone())
            .map_err(|_| SpriteError::Surface("failed to create surface".into()))?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .map_err(|_| SpriteError::Surface("no suitable adapter".into()))?;

        let info = adapter.get_info();
        log::info!("GPU adapter: {:?} ({:?})", info.name, info.backend);

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("spriteforge_device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                ..Default::default()
            })
            .await?;

        let transform_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("transform_bind_group_layout"),
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: wgpu::BufferSize::new(
                            std::mem::size_of::<[f32; 16]>() as u64,
                        ),
                    },
                    count: None,
                }],
            });

        let identity_cols = Mat4::IDENTITY.to_cols_array();
        let transform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("transform_buffer"),
            contents: bytemuck::cast_slice(&identity_cols),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let transform_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("transform_bind_group"),
            layout: &transform_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: transform_buffer.as_entire_binding(),
            }],
        });

        let tex_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("tex_bind_group_layout"),
                entries: &[
                    wgpu::BindGroupLayoutEntry {
                        binding: 0,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Texture {
                            multisampled: false,
                            view_dimension: wgpu::TextureViewDimension::D2,
                            sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        },
                        count: None,
                    },
                    wgpu::BindGroupLayoutEntry {
                        binding: 1,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                        count: None,
                    },
                ],
            });

        // Choose a surface format
        let caps = surface.get_capabilities(&adapter);
        let surface_format = caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .or_else(|| caps.formats.first().copied())
            .ok_or_else(|| SpriteError::Surface("surface reports no formats".into()))?;

        let surface_config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: width.max(1),
            height: height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![surface_format],
            desired_maximum_frame_latency: 2,
        };

        surface.configure(&device, &surface_config);

        Ok(Self {
            _window: window,
            _instance: instance,
            surface,
            _adapter: adapter,
            device,
            queue,
            surface_config,
            transform_bind_group_layout,
            transform_buffer,
            transform_bind_group,
            tex_bind_group_layout,
            vertex_buffer: None,
            shaders: Vec::new(),
            pipelines: Vec::new(),
            textures: Vec::new(),
            active_pipeline: None,
            bound_texture: None,
            pending: None,
        })
    }

    // Run `f` inside a validation error scope and surface any error as diagnostics.
    fn validated<T>(&self, f: impl FnOnce(&wgpu::Device) -> T) -> Result<T, Diagnostics> {
        self.device.push_error_scope(wgpu::ErrorFilter::Validation);
        let value = f(&self.device);
        match pollster::block_on(self.device.pop_error_scope()) {
            Some(err) => Err(Diagnostics(err.to_string())),
            None => Ok(value),
        }
    }

    fn encode_frame(&self, frame: &PendingFrame) -> Result<(), SpriteError> {
        // acquire next texture
        let output = match self.surface.get_current_texture() {
            Ok(t) => t,
            Err(e) => {
                self.surface.configure(&self.device, &self.surface_config);
                return Err(SpriteError::Surface(format!("{:?}", e)));
            }
        };

        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("command_encoder"),
            });

        let load = match frame.clear {
            Some(c) => wgpu::LoadOp::Clear(wgpu::Color {
                r: c[0] as f64,
                g: c[1] as f64,
                b: c[2] as f64,
                a: c[3] as f64,
            }),
            None => wgpu::LoadOp::Load,
        };

        let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("sprite_pass"),
            occlusion_query_set: None,
            timestamp_writes: None,
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &view,
                resolve_target: None,
                depth_slice: None,
                ops: wgpu::Operations {
                    load,
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
        });

        let pipeline = self.active_pipeline.and_then(|i| self.pipelines.get(i));
        let texture = self.bound_texture.and_then(|i| self.textures.get(i));

        match (pipeline, texture, &self.vertex_buffer) {
            (Some(pipeline), Some(texture), Some(vertex_buffer)) => {
                rpass.set_pipeline(pipeline);
                rpass.set_bind_group(0, &self.transform_bind_group, &[]);
                rpass.set_bind_group(1, &texture.bind_group, &[]);
                rpass.set_vertex_buffer(0, vertex_buffer.slice(..));

                for &(offset, count) in &frame.draws {
                    rpass.draw(offset..offset + count, 0..1);
                }
            }
            _ if !frame.draws.is_empty() => {
                log::warn!("Draw skipped: pipeline, texture or vertex buffer missing");
            }
            _ => {}
        }

        drop(rpass);

        self.queue.submit(Some(encoder.finish()));
        output.present();

        Ok(())
    }
}

impl<W> GraphicsBackend for WgpuBackend<W>
where
    W: HasWindowHandle + HasDisplayHandle + wgpu::WasmNotSendSync + Sync + Clone + 'static,
{
    fn upload_vertices(&mut self, vertices: &[Vertex]) -> Result<(), SpriteError> {
        if vertices.is_empty() {
            return Err(SpriteError::InvalidInput("no vertices to upload".into()));
        }
        let buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("atlas_vertex_buffer"),
                contents: bytemuck::cast_slice(vertices),
                usage: wgpu::BufferUsages::VERTEX,
            });
        self.vertex_buffer = Some(buffer);
        Ok(())
    }

    fn compile_shader(
        &mut self,
        stage: ShaderStage,
        source: &str,
    ) -> Result<ShaderHandle, Diagnostics> {
        let label = match stage {
            ShaderStage::Vertex => "sprite_vertex_shader",
            ShaderStage::Fragment => "sprite_fragment_shader",
        };
        let module = self.validated(|device| {
            device.create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some(label),
                source: wgpu::ShaderSource::Wgsl(source.into()),
            })
        })?;

        self.shaders.push((stage, module));
        Ok(ShaderHandle((self.shaders.len() - 1) as u32))
    }

    fn link_program(
        &mut self,
        vertex: ShaderHandle,
        fragment: ShaderHandle,
    ) -> Result<ProgramHandle, Diagnostics> {
        let lookup = |handle: ShaderHandle, want: ShaderStage| match self
            .shaders
            .get(handle.0 as usize)
        {
            Some((stage, module)) if *stage == want => Ok(module),
            Some((stage, _)) => Err(Diagnostics(format!(
                "shader {} is a {stage:?} shader, expected {want:?}",
                handle.0
            ))),
            None => Err(Diagnostics(format!("unknown shader handle {}", handle.0))),
        };
        let vs = lookup(vertex, ShaderStage::Vertex)?;
        let fs = lookup(fragment, ShaderStage::Fragment)?;
        let format = self.surface_config.format;

        let pipeline = self.validated(|device| {
            let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("sprite_pipeline_layout"),
                bind_group_layouts: &[
                    &self.transform_bind_group_layout,
                    &self.tex_bind_group_layout,
                ],
                push_constant_ranges: &[],
            });

            device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some("sprite_pipeline"),
                layout: Some(&layout),
                cache: None,
                vertex: wgpu::VertexState {
                    module: vs,
                    entry_point: Some("vs_main"),
                    buffers: &[Vertex::desc()],
                    compilation_options: wgpu::PipelineCompilationOptions::default(),
                },
                fragment: Some(wgpu::FragmentState {
                    module: fs,
                    entry_point: Some("fs_main"),
                    compilation_options: wgpu::PipelineCompilationOptions::default(),
                    targets: &[Some(wgpu::ColorTargetState {
                        format,
                        blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                }),
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleStrip,
                    strip_index_format: None,
                    front_face: wgpu::FrontFace::Ccw,
                    cull_mode: None,
                    unclipped_depth: false,
                    polygon_mode: wgpu::PolygonMode::Fill,
                    conservative: false,
                },
                depth_stencil: None,
                multisample: wgpu::MultisampleState::default(),
                multiview: None,
            })
        })?;

        self.pipelines.push(pipeline);
        Ok(ProgramHandle((self.pipelines.len() - 1) as u32))
    }

    fn use_program(&mut self, program: ProgramHandle) {
        let index = program.0 as usize;
        if index < self.pipelines.len() {
            self.active_pipeline = Some(index);
        } else {
            log::warn!("use_program: unknown program {}", program.0);
        }
    }

    fn create_texture(&mut self, image: &RgbaImage) -> Result<TextureHandle, SpriteError> {
        let (width, height) = image.dimensions();
        check_texture_size(width, height, self.device.limits().max_texture_dimension_2d)?;
        let size = wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        };

        let texture = self
            .validated(|device| {
                device.create_texture(&wgpu::TextureDescriptor {
                    label: Some("sprite_sheet"),
                    size,
                    mip_level_count: 1,
                    sample_count: 1,
                    dimension: wgpu::TextureDimension::D2,
                    format: wgpu::TextureFormat::Rgba8UnormSrgb,
                    usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
                    view_formats: &[],
                })
            })
            .map_err(|d| SpriteError::InvalidInput(format!("sprite sheet rejected: {d}")))?;

        self.queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            image.as_raw(),
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4 * width),
                rows_per_image: Some(height),
            },
            size,
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        // Pixel art: no filtering between texels, no bleeding past the strip.
        let sampler = self.device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("sprite_sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Nearest,
            min_filter: wgpu::FilterMode::Nearest,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &self.tex_bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&sampler),
                },
            ],
            label: Some("sprite_sheet_bind_group"),
        });

        self.textures.push(GpuTexture {
            _texture: texture,
            bind_group,
        });
        Ok(TextureHandle((self.textures.len() - 1) as u32))
    }

    fn bind_texture(&mut self, texture: TextureHandle) {
        let index = texture.0 as usize;
        if index < self.textures.len() {
            self.bound_texture = Some(index);
        } else {
            log::warn!("bind_texture: unknown texture {}", texture.0);
        }
    }

    fn set_uniform_matrix4(&mut self, matrix: Mat4) {
        let cols = matrix.to_cols_array();
        self.queue
            .write_buffer(&self.transform_buffer, 0, bytemuck::cast_slice(&cols));
    }

    fn clear(&mut self, color: [f32; 4]) {
        self.pending = Some(PendingFrame {
            clear: Some(color),
            draws: Vec::new(),
        });
    }

    fn draw_triangle_strip(&mut self, vertex_offset: u32, vertex_count: u32) {
        self.pending
            .get_or_insert_with(|| PendingFrame {
                clear: None,
                draws: Vec::new(),
            })
            .draws
            .push((vertex_offset, vertex_count));
    }

    fn submit(&mut self) -> Result<(), SpriteError> {
        match self.pending.take() {
            Some(frame) => self.encode_frame(&frame),
            None => Ok(()),
        }
    }

    fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.surface_config.width = width;
        self.surface_config.height = height;
        self.surface.configure(&self.device, &self.surface_config);
    }
}
