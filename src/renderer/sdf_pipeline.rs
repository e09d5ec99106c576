//! Fullscreen-triangle scene renderer
//!
//! One draw call per frame: the fragment shader evaluates sky, pipes, ground
//! and bird as distance fields. The CPU side only uploads three buffers.

use bytemuck::{Pod, Zeroable};

use glam::Vec2;

use super::ripple::TapRipple;
use crate::session::GamePhase;
use crate::sim::World;

/// Maximum number of obstacles uploaded per frame
const MAX_OBSTACLES: usize = 16;

// Layouts mirror the structs in sdf_shader.wgsl byte for byte.

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct Globals {
    resolution: [f32; 2],  // offset 0
    field: [f32; 2],       // offset 8
    time: f32,             // offset 16
    ground_y: f32,         // offset 20
    obstacle_width: f32,   // offset 24
    obstacle_count: u32,   // offset 28
    phase: u32,            // offset 32
    tap_x: f32,            // offset 36
    tap_y: f32,            // offset 40
    tap_progress: f32,     // offset 44, negative when no ring
}

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct AvatarUniform {
    pos: [f32; 2],
    size: [f32; 2],
    rotation: f32,
    velocity: f32,
    _pad: [f32; 2],
}

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct ObstacleData {
    x: f32,
    gap_top: f32,
    gap_height: f32,
    scored: u32,
}

fn phase_index(phase: GamePhase) -> u32 {
    match phase {
        GamePhase::Idle => 0,
        GamePhase::Running => 1,
        GamePhase::Paused => 2,
        GamePhase::Ended => 3,
    }
}

fn globals_for(
    world: &World,
    phase: GamePhase,
    size: (u32, u32),
    time: f32,
    tap: Option<(Vec2, f32)>,
) -> Globals {
    let (tap_pos, tap_progress) = tap.unwrap_or((Vec2::ZERO, -1.0));
    Globals {
        resolution: [size.0 as f32, size.1 as f32],
        field: [world.field.width, world.field.height],
        time,
        ground_y: world.field.ground_y(),
        obstacle_width: world.profile.obstacle_width,
        obstacle_count: world.obstacles.len().min(MAX_OBSTACLES) as u32,
        phase: phase_index(phase),
        tap_x: tap_pos.x,
        tap_y: tap_pos.y,
        tap_progress,
    }
}

fn avatar_for(world: &World) -> AvatarUniform {
    let avatar = &world.avatar;
    AvatarUniform {
        pos: avatar.pos.to_array(),
        size: avatar.size.to_array(),
        rotation: avatar.rotation,
        velocity: avatar.velocity,
        _pad: [0.0; 2],
    }
}

/// Obstacles padded out to the fixed buffer length
fn obstacles_for(world: &World) -> Vec<ObstacleData> {
    let mut data = vec![ObstacleData::zeroed(); MAX_OBSTACLES];
    for (slot, obstacle) in data.iter_mut().zip(world.obstacles.iter()) {
        *slot = ObstacleData {
            x: obstacle.x,
            gap_top: obstacle.gap_top,
            gap_height: obstacle.gap_height,
            scored: obstacle.scored as u32,
        };
    }
    data
}

/// The three scene buffers and the bind group exposing them to the shader
struct SceneBuffers {
    globals: wgpu::Buffer,
    avatar: wgpu::Buffer,
    obstacles: wgpu::Buffer,
    layout: wgpu::BindGroupLayout,
    bind_group: wgpu::BindGroup,
}

fn fragment_buffer_entry(binding: u32, ty: wgpu::BufferBindingType) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Buffer {
            ty,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

impl SceneBuffers {
    fn new(device: &wgpu::Device) -> Self {
        let uniform = |label: &str, size: usize| {
            device.create_buffer(&wgpu::BufferDescriptor {
                label: Some(label),
                size: size as u64,
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            })
        };
        let globals = uniform("scene_globals", std::mem::size_of::<Globals>());
        let avatar = uniform("scene_avatar", std::mem::size_of::<AvatarUniform>());
        let obstacles = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("scene_obstacles"),
            size: (std::mem::size_of::<ObstacleData>() * MAX_OBSTACLES) as u64,
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("scene_layout"),
            entries: &[
                fragment_buffer_entry(0, wgpu::BufferBindingType::Uniform),
                fragment_buffer_entry(1, wgpu::BufferBindingType::Uniform),
                fragment_buffer_entry(2, wgpu::BufferBindingType::Storage { read_only: true }),
            ],
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("scene_bindings"),
            layout: &layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: globals.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: avatar.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: obstacles.as_entire_binding(),
                },
            ],
        });

        Self {
            globals,
            avatar,
            obstacles,
            layout,
            bind_group,
        }
    }

    fn upload(&self, queue: &wgpu::Queue, world: &World, globals: &Globals) {
        queue.write_buffer(&self.globals, 0, bytemuck::bytes_of(globals));
        queue.write_buffer(&self.avatar, 0, bytemuck::bytes_of(&avatar_for(world)));
        queue.write_buffer(&self.obstacles, 0, bytemuck::cast_slice(&obstacles_for(world)));
    }
}

/// Prefer an sRGB surface format so shader colours are linear
fn surface_config(caps: &wgpu::SurfaceCapabilities, width: u32, height: u32) -> wgpu::SurfaceConfiguration {
    let format = caps
        .formats
        .iter()
        .copied()
        .find(wgpu::TextureFormat::is_srgb)
        .unwrap_or(caps.formats[0]);
    log::info!("Surface format {:?} (of {:?})", format, caps.formats);

    wgpu::SurfaceConfiguration {
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        format,
        width,
        height,
        present_mode: wgpu::PresentMode::AutoVsync,
        alpha_mode: caps.alpha_modes[0],
        view_formats: vec![],
        desired_maximum_frame_latency: 2,
    }
}

fn scene_pipeline(
    device: &wgpu::Device,
    format: wgpu::TextureFormat,
    layout: &wgpu::BindGroupLayout,
) -> wgpu::RenderPipeline {
    let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("scene_shader"),
        source: wgpu::ShaderSource::Wgsl(include_str!("sdf_shader.wgsl").into()),
    });
    let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("scene_pipeline_layout"),
        bind_group_layouts: &[layout],
        immediate_size: 0,
    });

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some("scene_pipeline"),
        layout: Some(&pipeline_layout),
        // Vertices come from vertex_index, nothing to bind
        vertex: wgpu::VertexState {
            module: &module,
            entry_point: Some("vs_main"),
            buffers: &[],
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: &module,
            entry_point: Some("fs_main"),
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: None,
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: Default::default(),
        }),
        primitive: wgpu::PrimitiveState::default(),
        depth_stencil: None,
        multisample: wgpu::MultisampleState::default(),
        multiview_mask: None,
        cache: None,
    })
}

/// GPU device, surface and the single scene pipeline
pub struct SceneRenderer {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    pipeline: wgpu::RenderPipeline,
    buffers: SceneBuffers,
    /// Drawable size in physical pixels
    pub size: (u32, u32),
    /// Clock origin for shader animation, in ms
    epoch_ms: f64,
    ripple: Option<TapRipple>,
}

impl SceneRenderer {
    pub async fn new(
        surface: wgpu::Surface<'static>,
        adapter: &wgpu::Adapter,
        width: u32,
        height: u32,
    ) -> Result<Self, wgpu::RequestDeviceError> {
        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("flappy-device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::downlevel_webgl2_defaults(),
                memory_hints: Default::default(),
                trace: Default::default(),
                experimental_features: Default::default(),
            })
            .await?;

        let config = surface_config(&surface.get_capabilities(adapter), width, height);
        surface.configure(&device, &config);

        let buffers = SceneBuffers::new(&device);
        let pipeline = scene_pipeline(&device, config.format, &buffers.layout);

        Ok(Self {
            surface,
            device,
            queue,
            config,
            pipeline,
            buffers,
            size: (width, height),
            epoch_ms: 0.0,
            ripple: None,
        })
    }

    /// Reconfigure the surface; zero sizes are ignored
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.size = (width, height);
        self.config.width = width;
        self.config.height = height;
        self.surface.configure(&self.device, &self.config);
    }

    pub fn set_epoch(&mut self, epoch_ms: f64) {
        self.epoch_ms = epoch_ms;
    }

    /// Show a touch ring at `pos` (field coordinates), replacing any current one
    pub fn show_tap(&mut self, pos: Vec2, now_ms: f64) {
        self.ripple = Some(TapRipple::new(pos, now_ms));
    }

    /// Upload the world and draw one frame at `time_ms`
    pub fn render(&mut self, world: &World, phase: GamePhase, time_ms: f64) -> Result<(), wgpu::SurfaceError> {
        let seconds = ((time_ms - self.epoch_ms) / 1000.0) as f32;
        let tap = self
            .ripple
            .and_then(|r| r.progress(time_ms).map(|progress| (r.pos, progress)));
        if tap.is_none() {
            self.ripple = None;
        }
        let globals = globals_for(world, phase, self.size, seconds, tap);
        self.buffers.upload(&self.queue, world, &globals);

        let frame = self.surface.get_current_texture()?;
        let view = frame.texture.create_view(&Default::default());
        let mut encoder = self.device.create_command_encoder(&Default::default());
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("scene_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    depth_slice: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });
            pass.set_pipeline(&self.pipeline);
            pass.set_bind_group(0, &self.buffers.bind_group, &[]);
            pass.draw(0..3, 0..1);
        }
        self.queue.submit([encoder.finish()]);
        frame.present();
        Ok(())
    }
}
