// Viewer for the three demos: instanced rendering, one draw call per mesh kind
// Keys: 1/2/3 switch demo, P pause, F3 overlay. Demo controls live in
// engine::controller.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use codeblocks::engine::{
    CameraView, DemoKind, SimConfig, Showcase,
    camera::ndc_to_screen,
    clock::FrameStats,
    controller::{Key, Viewport},
    debug_overlay::{DebugOverlay, DebugStats},
    input::{InputEvent, InputState},
    mesh::{self, GpuVertex, RenderMesh},
    showcase::{MeshKind, SceneInstance},
};
use glam::Mat4;
use wgpu::util::DeviceExt;
use winit::{
    event::{Event as WinitEvent, WindowEvent},
    event_loop::EventLoop,
    window::Window,
};

const DEFAULT_CONFIG: &str = "codeblocks.toml";
const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

// ============================================================================
// INSTANCE DATA (per-object)
// ============================================================================

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
struct InstanceData {
    model: [[f32; 4]; 4],
    color: [f32; 4],
}

impl InstanceData {
    const ATTRIBUTES: [wgpu::VertexAttribute; 5] = wgpu::vertex_attr_array![
        3 => Float32x4, 4 => Float32x4, 5 => Float32x4, 6 => Float32x4, // model matrix columns
        7 => Float32x4,                                                  // color
    ];

    fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<InstanceData>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

impl From<&SceneInstance> for InstanceData {
    fn from(instance: &SceneInstance) -> Self {
        Self {
            model: instance.model.to_cols_array_2d(),
            color: instance.color,
        }
    }
}

// ============================================================================
// UNIFORM DATA (camera + light)
// ============================================================================

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
struct Uniforms {
    view_proj: [[f32; 4]; 4],
    light_dir: [f32; 4],
}

impl Uniforms {
    fn new() -> Self {
        Self {
            view_proj: Mat4::IDENTITY.to_cols_array_2d(),
            light_dir: [0.0, 1.0, 0.0, 0.0],
        }
    }
}

// ============================================================================
// GPU MESHES
// ============================================================================

struct GpuMesh {
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    num_indices: u32,
}

impl GpuMesh {
    fn upload(device: &wgpu::Device, label: &str, mesh: &RenderMesh) -> Self {
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents: mesh.vertex_bytes(),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents: mesh.index_bytes(),
            usage: wgpu::BufferUsages::INDEX,
        });
        Self { vertex_buffer, index_buffer, num_indices: mesh.index_count() as u32 }
    }
}

fn builtin_meshes(device: &wgpu::Device) -> HashMap<MeshKind, GpuMesh> {
    let mut meshes = HashMap::new();
    let cone = mesh::triangulate_smooth(&mesh::cone(0.1, 0.3, 8));
    let sphere = mesh::triangulate_smooth(&mesh::uv_sphere(1.0, 24, 16));
    let cube = mesh::triangulate_smooth(&mesh::unit_cube());
    let plane = mesh::triangulate_smooth(&mesh::plane(1.0));
    meshes.insert(MeshKind::Cone, GpuMesh::upload(device, "Cone Mesh", &cone));
    meshes.insert(MeshKind::Sphere, GpuMesh::upload(device, "Sphere Mesh", &sphere));
    meshes.insert(MeshKind::Cube, GpuMesh::upload(device, "Cube Mesh", &cube));
    meshes.insert(MeshKind::Plane, GpuMesh::upload(device, "Plane Mesh", &plane));
    meshes
}

fn create_depth_view(device: &wgpu::Device, config: &wgpu::SurfaceConfiguration) -> wgpu::TextureView {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Depth Texture"),
        size: wgpu::Extent3d {
            width: config.width.max(1),
            height: config.height.max(1),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    texture.create_view(&wgpu::TextureViewDescriptor::default())
}

// ============================================================================
// APPLICATION STATE
// ============================================================================

struct State {
    window: Arc<Window>,
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    size: winit::dpi::PhysicalSize<u32>,
    render_pipeline: wgpu::RenderPipeline,
    depth_view: wgpu::TextureView,
    meshes: HashMap<MeshKind, GpuMesh>,
    instance_buffer: wgpu::Buffer,
    max_instances: usize,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,

    showcase: Showcase,
    input: InputState,
    overlay: DebugOverlay,
    frame_stats: FrameStats,
    instances: Vec<SceneInstance>,
    draw_calls: u32,
}

impl State {
    async fn new(window: Arc<Window>, sim_config: SimConfig) -> Result<Self, Box<dyn std::error::Error>> {
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
            .ok_or("no compatible GPU adapter")?;

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: None,
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    memory_hints: wgpu::MemoryHints::default(),
                },
                None,
            )
            .await?;

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .unwrap_or(surface_caps.formats[0]);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width,
            height: size.height,
            present_mode: surface_caps.present_modes[0],
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };

        surface.configure(&device, &config);

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shader.wgsl").into()),
        });

        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Uniform Buffer"),
            contents: bytemuck::cast_slice(&[Uniforms::new()]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let uniform_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                }],
                label: Some("uniform_bind_group_layout"),
            });

        let uniform_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &uniform_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
            label: Some("uniform_bind_group"),
        });

        let render_pipeline_layout =
            device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("Render Pipeline Layout"),
                bind_group_layouts: &[&uniform_bind_group_layout],
                push_constant_ranges: &[],
            });

        let render_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Render Pipeline"),
            layout: Some(&render_pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[GpuVertex::desc(), InstanceData::desc()],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: config.format,
                    // Water is the only translucent instance; it is drawn last.
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: Some(wgpu::Face::Back),
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
        });

        let max_instances = 10000;
        let instance_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Instance Buffer"),
            size: (max_instances * std::mem::size_of::<InstanceData>()) as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let depth_view = create_depth_view(&device, &config);
        let meshes = builtin_meshes(&device);
        let overlay = DebugOverlay::new(&window, &device, surface_format);

        let mut showcase = Showcase::new(sim_config, DemoKind::Physics);
        showcase.demo_mut().camera_mut().set_aspect(size.width, size.height);

        Ok(Self {
            window,
            surface,
            device,
            queue,
            config,
            size,
            render_pipeline,
            depth_view,
            meshes,
            instance_buffer,
            max_instances,
            uniform_buffer,
            uniform_bind_group,
            showcase,
            input: InputState::new((size.width, size.height)),
            overlay,
            frame_stats: FrameStats::new(Instant::now()),
            instances: Vec::new(),
            draw_calls: 0,
        })
    }

    fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 {
            self.size = new_size;
            self.config.width = new_size.width;
            self.config.height = new_size.height;
            self.surface.configure(&self.device, &self.config);
            self.depth_view = create_depth_view(&self.device, &self.config);
            self.showcase
                .demo_mut()
                .camera_mut()
                .set_aspect(new_size.width, new_size.height);
        }
    }

    fn viewport(&self) -> Viewport {
        Viewport::new(self.size.width, self.size.height)
    }

    fn handle_input(&mut self, event: &WindowEvent) {
        let Some(input) = self.input.process_event(event) else {
            return;
        };
        match input {
            InputEvent::Key(key) if key.key == Key::F3 => self.overlay.toggle(),
            InputEvent::Key(key) => {
                let before = self.showcase.kind();
                self.showcase.key(&key);
                if self.showcase.kind() != before {
                    self.on_demo_switched();
                }
            }
            InputEvent::Pointer(pointer) => {
                let viewport = self.viewport();
                self.showcase.pointer(&pointer, viewport);
            }
        }
    }

    fn on_demo_switched(&mut self) {
        self.meshes.remove(&MeshKind::Terrain);
        self.showcase
            .demo_mut()
            .camera_mut()
            .set_aspect(self.size.width, self.size.height);
    }

    fn update(&mut self) {
        self.showcase.frame_at(Instant::now());
        if let Some(terrain) = self.showcase.demo_mut().take_dirty_mesh() {
            let gpu = GpuMesh::upload(&self.device, "Terrain Mesh", &terrain);
            self.meshes.insert(MeshKind::Terrain, gpu);
        }
    }

    fn render(&mut self) -> Result<(), wgpu::SurfaceError> {
        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        // Collect instances grouped by mesh, keeping first-seen order so the
        // translucent water stays last.
        self.instances.clear();
        self.showcase.demo_mut().instances(&mut self.instances);
        let mut order: Vec<MeshKind> = Vec::new();
        for instance in &self.instances {
            if !order.contains(&instance.mesh) {
                order.push(instance.mesh);
            }
        }
        let mut instance_data: Vec<InstanceData> = Vec::with_capacity(self.instances.len());
        let mut batches: Vec<(MeshKind, std::ops::Range<u32>)> = Vec::new();
        for kind in order {
            let start = instance_data.len() as u32;
            instance_data.extend(self.instances.iter().filter(|i| i.mesh == kind).map(InstanceData::from));
            batches.push((kind, start..instance_data.len() as u32));
        }
        if instance_data.len() > self.max_instances {
            log::warn!("{} instances exceed buffer of {}", instance_data.len(), self.max_instances);
            instance_data.truncate(self.max_instances);
        }
        if !instance_data.is_empty() {
            self.queue
                .write_buffer(&self.instance_buffer, 0, bytemuck::cast_slice(&instance_data));
        }

        let camera = self.showcase.demo().camera();
        let light = self.showcase.demo().light();
        let uniforms = Uniforms {
            view_proj: camera.view_projection().to_cols_array_2d(),
            light_dir: light.extend(0.0).to_array(),
        };
        self.queue.write_buffer(&self.uniform_buffer, 0, bytemuck::cast_slice(&[uniforms]));

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        let limit = instance_data.len() as u32;
        self.draw_calls = 0;
        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: 0.05,
                            g: 0.05,
                            b: 0.1,
                            a: 1.0,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            render_pass.set_pipeline(&self.render_pipeline);
            render_pass.set_bind_group(0, &self.uniform_bind_group, &[]);
            render_pass.set_vertex_buffer(1, self.instance_buffer.slice(..));

            for (kind, range) in batches {
                let Some(mesh) = self.meshes.get(&kind) else {
                    continue;
                };
                let range = range.start.min(limit)..range.end.min(limit);
                if range.is_empty() {
                    continue;
                }
                render_pass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
                render_pass.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                render_pass.draw_indexed(0..mesh.num_indices, 0, range);
                self.draw_calls += 1;
            }
        }

        self.render_overlay(&mut encoder, &view);

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        Ok(())
    }

    fn render_overlay(&mut self, encoder: &mut wgpu::CommandEncoder, view: &wgpu::TextureView) {
        let scale = self.window.scale_factor() as f32;
        let (width, height) = (self.size.width as f32, self.size.height as f32);
        let demo = self.showcase.demo();
        let cut_path: Option<Vec<egui::Pos2>> = demo.cut_path().map(|points| {
            points
                .iter()
                .map(|p| {
                    let screen = ndc_to_screen(demo.camera().project(*p).truncate(), width, height);
                    egui::pos2(screen.x / scale, screen.y / scale)
                })
                .collect()
        });
        let camera_distance = demo.camera().distance();
        let paused = self.showcase.is_paused();
        let kind = self.showcase.kind();
        let demo_stats = self.showcase.demo_mut().stats();

        let stats = DebugStats {
            fps: self.frame_stats.fps,
            frame_time_avg_ms: self.frame_stats.avg_ms,
            frame_time_min_ms: self.frame_stats.best_ms,
            frame_time_max_ms: self.frame_stats.worst_ms,
            demo: kind,
            paused,
            object_count: demo_stats.objects,
            detail: demo_stats.detail,
            draw_calls: self.draw_calls,
            resolution: (self.size.width, self.size.height),
            camera_distance,
        };
        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [self.config.width, self.config.height],
            pixels_per_point: scale,
        };

        let actions = self.overlay.render(
            &self.device,
            &self.queue,
            encoder,
            &self.window,
            view,
            &screen_descriptor,
            &stats,
            self.showcase.demo_mut().flocking_mut(),
            cut_path.as_deref(),
        );

        if actions.toggle_pause {
            self.showcase.toggle_pause();
        }
        if let Some(kind) = actions.switch_to {
            if kind != self.showcase.kind() {
                self.showcase.switch(kind);
                self.on_demo_switched();
            }
        }
    }
}

// ============================================================================
// MAIN
// ============================================================================

/// Config from the first CLI argument, else `codeblocks.toml` if present,
/// else defaults.
fn load_config() -> SimConfig {
    let path = match std::env::args().nth(1) {
        Some(arg) => PathBuf::from(arg),
        None if Path::new(DEFAULT_CONFIG).exists() => PathBuf::from(DEFAULT_CONFIG),
        None => return SimConfig::default(),
    };
    match SimConfig::load(&path) {
        Ok(config) => config,
        Err(err) => {
            log::warn!("{err}; using default config");
            SimConfig::default()
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let sim_config = load_config();
    let event_loop = EventLoop::new()?;

    let window_attributes = Window::default_attributes()
        .with_title("codeblocks - boids / islands / physics")
        .with_inner_size(winit::dpi::LogicalSize::new(1280, 720));

    let window = Arc::new(event_loop.create_window(window_attributes)?);

    let mut state = pollster::block_on(State::new(window.clone(), sim_config))?;

    event_loop.run(move |event, control_flow| {
        match event {
            WinitEvent::WindowEvent {
                ref event,
                window_id,
            } if window_id == window.id() => {
                let response = state.overlay.handle_window_event(&window, event);
                match event {
                    WindowEvent::CloseRequested => control_flow.exit(),
                    WindowEvent::Resized(physical_size) => {
                        state.resize(*physical_size);
                        state.handle_input(event);
                    }
                    WindowEvent::RedrawRequested => {
                        state.update();
                        match state.render() {
                            Ok(_) => {}
                            Err(wgpu::SurfaceError::Lost) => state.resize(state.size),
                            Err(wgpu::SurfaceError::OutOfMemory) => control_flow.exit(),
                            Err(e) => log::error!("{:?}", e),
                        }

                        if state.frame_stats.record(Instant::now()) {
                            log::debug!(
                                "FPS: {} | Demo: {} | Draw calls: {}",
                                state.frame_stats.fps,
                                state.showcase.kind().label(),
                                state.draw_calls
                            );
                        }
                    }
                    _ if response.consumed => {}
                    _ => state.handle_input(event),
                }
            }
            WinitEvent::AboutToWait => {
                window.request_redraw();
            }
            _ => {}
        }
    })?;

    Ok(())
}
