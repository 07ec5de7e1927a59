//! Rendering system with wgpu pipelines for sky, terrain, ocean, boat and rain.
//!
//! The render system only reads the world: per-cell instance buffers are
//! re-uploaded when the terrain grid swaps in a new tile generation, and
//! uniform blocks are repacked from the frame snapshot before each draw.

use std::sync::Arc;

use bytemuck::{Pod, Zeroable};
use thiserror::Error;
use wgpu::util::DeviceExt;

use crate::assets::{Mesh, MeshVertex};
use crate::terrain::{TerrainInstance, TerrainTile};
use crate::uniforms::{boat_uniforms, scene_uniforms, wave_uniforms, UniformBlock};
use crate::weather::RainInstance;
use crate::world::World;

const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Render system creation errors
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("failed to create surface: {0}")]
    Surface(#[from] wgpu::CreateSurfaceError),

    #[error("no suitable GPU adapter found")]
    NoAdapter,

    #[error("failed to request device: {0}")]
    Device(#[from] wgpu::RequestDeviceError),
}

/// Corner of the unit cell quad shared by terrain and ocean
///
/// `corner` indexes the per-instance corner data: self, +X, +Z, diagonal.
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct QuadVertex {
    pub position: [f32; 2],
    pub corner: u32,
}

/// Per-instance offset of one translucent ocean cell
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct OceanInstance {
    pub offset: [f32; 3],
}

fn quad_vertices(block_size: f32) -> [QuadVertex; 4] {
    [
        QuadVertex {
            position: [0.0, 0.0],
            corner: 0,
        },
        QuadVertex {
            position: [block_size, 0.0],
            corner: 1,
        },
        QuadVertex {
            position: [0.0, block_size],
            corner: 2,
        },
        QuadVertex {
            position: [block_size, block_size],
            corner: 3,
        },
    ]
}

const QUAD_INDICES: [u16; 6] = [0, 2, 1, 1, 2, 3];

const QUAD_ATTRIBUTES: [wgpu::VertexAttribute; 2] =
    wgpu::vertex_attr_array![0 => Float32x2, 1 => Uint32];

const TERRAIN_ATTRIBUTES: [wgpu::VertexAttribute; 6] = wgpu::vertex_attr_array![
    2 => Float32x3,
    3 => Float32x4,
    4 => Float32x3,
    5 => Float32x3,
    6 => Float32x3,
    7 => Float32x3,
];

const OCEAN_ATTRIBUTES: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![2 => Float32x3];

const MESH_ATTRIBUTES: [wgpu::VertexAttribute; 2] =
    wgpu::vertex_attr_array![0 => Float32x4, 1 => Float32x3];

const STREAK_ATTRIBUTES: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![0 => Float32x3];

const DROP_ATTRIBUTES: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![1 => Float32x3];

fn vertex_layout<T>(
    step_mode: wgpu::VertexStepMode,
    attributes: &[wgpu::VertexAttribute],
) -> wgpu::VertexBufferLayout<'_> {
    wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<T>() as wgpu::BufferAddress,
        step_mode,
        attributes,
    }
}

/// Depth attachment sized to the surface, rebuilt on resize
struct DepthTexture {
    view: wgpu::TextureView,
}

impl DepthTexture {
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
        Self { view }
    }
}

/// Fixed-function state that differs between pipelines
struct PipelineSpec<'a> {
    label: &'a str,
    source: &'a str,
    buffers: &'a [wgpu::VertexBufferLayout<'a>],
    topology: wgpu::PrimitiveTopology,
    blend: Option<wgpu::BlendState>,
    depth_write: bool,
    depth_compare: wgpu::CompareFunction,
    cull_mode: Option<wgpu::Face>,
}

/// Uniform buffer backed by a [`UniformBlock`]
struct UniformBinding {
    block: UniformBlock,
    buffer: wgpu::Buffer,
}

impl UniformBinding {
    fn new(device: &wgpu::Device, block: UniformBlock) -> Self {
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(block.label()),
            size: block.size() as wgpu::BufferAddress,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        Self { block, buffer }
    }
}

/// Boat mesh buffers
struct BoatBuffers {
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
}

/// Rendering system managing wgpu device, pipelines, and buffers
pub struct RenderSystem {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    depth: DepthTexture,

    sky_pipeline: wgpu::RenderPipeline,
    terrain_pipeline: wgpu::RenderPipeline,
    ocean_pipeline: wgpu::RenderPipeline,
    boat_pipeline: wgpu::RenderPipeline,
    rain_pipeline: wgpu::RenderPipeline,

    uniforms: [UniformBinding; 3],
    bind_group: wgpu::BindGroup,

    quad_vertex_buffer: wgpu::Buffer,
    quad_index_buffer: wgpu::Buffer,
    terrain_instances: wgpu::Buffer,
    ocean_instances: wgpu::Buffer,
    cell_count: u32,
    uploaded_tile: Arc<TerrainTile>,

    streak_buffer: wgpu::Buffer,
    rain_instances: wgpu::Buffer,
    drop_count: u32,
    raining: bool,

    boat: Option<BoatBuffers>,
    ocean_alpha: f64,
}

impl RenderSystem {
    /// Create the render system for `world`, optionally with a boat mesh
    pub async fn new(
        window: Arc<winit::window::Window>,
        world: &World,
        boat_mesh: Option<&Mesh>,
    ) -> Result<Self, RenderError> {
        let size = window.inner_size();

        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        // Window must have 'static lifetime via Arc
        let surface = instance.create_surface(window)?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or(RenderError::NoAdapter)?;

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

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .copied()
            .unwrap_or(surface_caps.formats[0]);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);
        let depth = DepthTexture::new(&device, config.width, config.height);

        // Uniforms: scene, waves, boat at bindings 0, 1, 2
        let uniforms = [
            UniformBinding::new(&device, scene_uniforms()),
            UniformBinding::new(&device, wave_uniforms()),
            UniformBinding::new(&device, boat_uniforms()),
        ];

        let layout_entries: Vec<wgpu::BindGroupLayoutEntry> = (0..uniforms.len() as u32)
            .map(|binding| wgpu::BindGroupLayoutEntry {
                binding,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            })
            .collect();

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Uniform Bind Group Layout"),
            entries: &layout_entries,
        });

        let group_entries: Vec<wgpu::BindGroupEntry> = uniforms
            .iter()
            .enumerate()
            .map(|(binding, u)| wgpu::BindGroupEntry {
                binding: binding as u32,
                resource: u.buffer.as_entire_binding(),
            })
            .collect();

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Uniform Bind Group"),
            layout: &bind_group_layout,
            entries: &group_entries,
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Render Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let make_pipeline = |spec: PipelineSpec| {
            let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some(spec.label),
                source: wgpu::ShaderSource::Wgsl(spec.source.into()),
            });
            device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(spec.label),
                layout: Some(&pipeline_layout),
                vertex: wgpu::VertexState {
                    module: &shader,
                    entry_point: Some("vs_main"),
                    buffers: spec.buffers,
                    compilation_options: Default::default(),
                },
                fragment: Some(wgpu::FragmentState {
                    module: &shader,
                    entry_point: Some("fs_main"),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: config.format,
                        blend: spec.blend,
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                    compilation_options: Default::default(),
                }),
                primitive: wgpu::PrimitiveState {
                    topology: spec.topology,
                    strip_index_format: None,
                    front_face: wgpu::FrontFace::Ccw,
                    cull_mode: spec.cull_mode,
                    polygon_mode: wgpu::PolygonMode::Fill,
                    unclipped_depth: false,
                    conservative: false,
                },
                depth_stencil: Some(wgpu::DepthStencilState {
                    format: DEPTH_FORMAT,
                    depth_write_enabled: spec.depth_write,
                    depth_compare: spec.depth_compare,
                    stencil: wgpu::StencilState::default(),
                    bias: wgpu::DepthBiasState::default(),
                }),
                multisample: wgpu::MultisampleState::default(),
                multiview: None,
                cache: None,
            })
        };

        let quad_layout = vertex_layout::<QuadVertex>(wgpu::VertexStepMode::Vertex, &QUAD_ATTRIBUTES);

        let sky_pipeline = make_pipeline(PipelineSpec {
            label: "Sky Pipeline",
            source: concat!(include_str!("shaders/common.wgsl"), include_str!("shaders/sky.wgsl")),
            buffers: &[],
            topology: wgpu::PrimitiveTopology::TriangleList,
            blend: None,
            depth_write: false,
            depth_compare: wgpu::CompareFunction::Always,
            cull_mode: None,
        });

        let terrain_pipeline = make_pipeline(PipelineSpec {
            label: "Terrain Pipeline",
            source: concat!(
                include_str!("shaders/common.wgsl"),
                include_str!("shaders/terrain.wgsl")
            ),
            buffers: &[
                quad_layout.clone(),
                vertex_layout::<TerrainInstance>(
                    wgpu::VertexStepMode::Instance,
                    &TERRAIN_ATTRIBUTES,
                ),
            ],
            topology: wgpu::PrimitiveTopology::TriangleList,
            blend: None,
            depth_write: true,
            depth_compare: wgpu::CompareFunction::Less,
            cull_mode: None,
        });

        // Ocean alpha comes from the blend constant set per pass
        let ocean_blend = wgpu::BlendState {
            color: wgpu::BlendComponent {
                src_factor: wgpu::BlendFactor::Constant,
                dst_factor: wgpu::BlendFactor::OneMinusConstant,
                operation: wgpu::BlendOperation::Add,
            },
            alpha: wgpu::BlendComponent::OVER,
        };
        let ocean_pipeline = make_pipeline(PipelineSpec {
            label: "Ocean Pipeline",
            source: concat!(include_str!("shaders/common.wgsl"), include_str!("shaders/ocean.wgsl")),
            buffers: &[
                quad_layout,
                vertex_layout::<OceanInstance>(wgpu::VertexStepMode::Instance, &OCEAN_ATTRIBUTES),
            ],
            topology: wgpu::PrimitiveTopology::TriangleList,
            blend: Some(ocean_blend),
            depth_write: false,
            depth_compare: wgpu::CompareFunction::Less,
            cull_mode: None,
        });

        let boat_pipeline = make_pipeline(PipelineSpec {
            label: "Boat Pipeline",
            source: concat!(include_str!("shaders/common.wgsl"), include_str!("shaders/boat.wgsl")),
            buffers: &[vertex_layout::<MeshVertex>(
                wgpu::VertexStepMode::Vertex,
                &MESH_ATTRIBUTES,
            )],
            topology: wgpu::PrimitiveTopology::TriangleList,
            blend: None,
            depth_write: true,
            depth_compare: wgpu::CompareFunction::Less,
            cull_mode: Some(wgpu::Face::Back),
        });

        let rain_pipeline = make_pipeline(PipelineSpec {
            label: "Rain Pipeline",
            source: concat!(include_str!("shaders/common.wgsl"), include_str!("shaders/rain.wgsl")),
            buffers: &[
                vertex_layout::<[f32; 3]>(wgpu::VertexStepMode::Vertex, &STREAK_ATTRIBUTES),
                vertex_layout::<RainInstance>(wgpu::VertexStepMode::Instance, &DROP_ATTRIBUTES),
            ],
            topology: wgpu::PrimitiveTopology::LineList,
            blend: Some(wgpu::BlendState::ALPHA_BLENDING),
            depth_write: false,
            depth_compare: wgpu::CompareFunction::Less,
            cull_mode: None,
        });

        // Terrain and ocean share the cell quad
        let tile = world.terrain().snapshot();
        let quad_vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Quad Vertex Buffer"),
            contents: bytemuck::cast_slice(&quad_vertices(tile.block_size())),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let quad_index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Quad Index Buffer"),
            contents: bytemuck::cast_slice(&QUAD_INDICES),
            usage: wgpu::BufferUsages::INDEX,
        });
        let terrain_instances = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Terrain Instance Buffer"),
            contents: bytemuck::cast_slice(&tile.instances()),
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        });
        let ocean_instances = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Ocean Instance Buffer"),
            contents: bytemuck::cast_slice(&ocean_instances(&tile)),
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        });

        let rain = world.weather().rain();
        let streak = rain.streak();
        let streak_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Rain Streak Buffer"),
            contents: bytemuck::cast_slice(&streak),
            usage: wgpu::BufferUsages::VERTEX,
        });
        // A zero-sized vertex buffer cannot be bound; keep one slot
        let mut drops = rain.instances();
        let drop_count = drops.len() as u32;
        if drops.is_empty() {
            drops.push(RainInstance::zeroed());
        }
        let rain_instances = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Rain Instance Buffer"),
            contents: bytemuck::cast_slice(&drops),
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        });

        let boat = boat_mesh.filter(|m| !m.faces.is_empty()).map(|mesh| BoatBuffers {
            vertex_buffer: device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Boat Vertex Buffer"),
                contents: bytemuck::cast_slice(&mesh.vertex_data()),
                usage: wgpu::BufferUsages::VERTEX,
            }),
            index_buffer: device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Boat Index Buffer"),
                contents: bytemuck::cast_slice(&mesh.index_data()),
                usage: wgpu::BufferUsages::INDEX,
            }),
            index_count: (mesh.faces.len() * 3) as u32,
        });

        log::info!(
            "Render system ready: {:?}, {}x{}, {} cells",
            config.format,
            config.width,
            config.height,
            tile.cells().len()
        );

        Ok(Self {
            surface,
            device,
            queue,
            config,
            depth,
            sky_pipeline,
            terrain_pipeline,
            ocean_pipeline,
            boat_pipeline,
            rain_pipeline,
            uniforms,
            bind_group,
            quad_vertex_buffer,
            quad_index_buffer,
            terrain_instances,
            ocean_instances,
            cell_count: tile.cells().len() as u32,
            uploaded_tile: tile,
            streak_buffer,
            rain_instances,
            drop_count,
            raining: world.weather().is_raining(),
            boat,
            ocean_alpha: world.render_config().ocean_alpha as f64,
        })
    }

    /// Reconfigure the surface and depth buffer for a new window size
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.config.width = width;
        self.config.height = height;
        self.surface.configure(&self.device, &self.config);
        self.depth = DepthTexture::new(&self.device, width, height);
    }

    /// Reconfigure with the current size, e.g. after the surface was lost
    pub fn reconfigure(&mut self) {
        self.resize(self.config.width, self.config.height);
    }

    /// Upload everything that changed in `world` since the last frame
    pub fn update(&mut self, world: &World) {
        let frame = world.frame();
        for binding in &self.uniforms {
            self.queue
                .write_buffer(&binding.buffer, 0, &binding.block.pack(&frame));
        }

        let tile = world.terrain().snapshot();
        if !Arc::ptr_eq(&tile, &self.uploaded_tile) {
            self.queue.write_buffer(
                &self.terrain_instances,
                0,
                bytemuck::cast_slice(&tile.instances()),
            );
            self.queue.write_buffer(
                &self.ocean_instances,
                0,
                bytemuck::cast_slice(&ocean_instances(&tile)),
            );
            self.uploaded_tile = tile;
        }

        self.raining = world.weather().is_raining();
        if self.raining && self.drop_count > 0 {
            self.queue.write_buffer(
                &self.rain_instances,
                0,
                bytemuck::cast_slice(&world.weather().rain().instances()),
            );
        }
    }

    /// Render a frame
    pub fn render(&self) -> Result<(), wgpu::SurfaceError> {
        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            render_pass.set_bind_group(0, &self.bind_group, &[]);

            // Sky first, behind everything
            render_pass.set_pipeline(&self.sky_pipeline);
            render_pass.draw(0..3, 0..1);

            render_pass.set_pipeline(&self.terrain_pipeline);
            render_pass.set_vertex_buffer(0, self.quad_vertex_buffer.slice(..));
            render_pass.set_vertex_buffer(1, self.terrain_instances.slice(..));
            render_pass.set_index_buffer(self.quad_index_buffer.slice(..), wgpu::IndexFormat::Uint16);
            render_pass.draw_indexed(0..QUAD_INDICES.len() as u32, 0, 0..self.cell_count);

            if let Some(boat) = &self.boat {
                render_pass.set_pipeline(&self.boat_pipeline);
                render_pass.set_vertex_buffer(0, boat.vertex_buffer.slice(..));
                render_pass.set_index_buffer(boat.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                render_pass.draw_indexed(0..boat.index_count, 0, 0..1);
            }

            // Translucent passes last
            let alpha = self.ocean_alpha;
            render_pass.set_blend_constant(wgpu::Color {
                r: alpha,
                g: alpha,
                b: alpha,
                a: alpha,
            });
            render_pass.set_pipeline(&self.ocean_pipeline);
            render_pass.set_vertex_buffer(0, self.quad_vertex_buffer.slice(..));
            render_pass.set_vertex_buffer(1, self.ocean_instances.slice(..));
            render_pass.set_index_buffer(self.quad_index_buffer.slice(..), wgpu::IndexFormat::Uint16);
            render_pass.draw_indexed(0..QUAD_INDICES.len() as u32, 0, 0..self.cell_count);

            if self.raining && self.drop_count > 0 {
                render_pass.set_pipeline(&self.rain_pipeline);
                render_pass.set_vertex_buffer(0, self.streak_buffer.slice(..));
                render_pass.set_vertex_buffer(1, self.rain_instances.slice(..));
                render_pass.draw(0..2, 0..self.drop_count);
            }
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        Ok(())
    }
}

/// Ocean instances in the tile's sorted order
fn ocean_instances(tile: &TerrainTile) -> Vec<OceanInstance> {
    tile.sorted_offsets()
        .iter()
        .map(|o| OceanInstance {
            offset: [o.x, 0.0, o.z],
        })
        .collect()
}
