//! WebGPU renderer for the particle scene.
//!
//! Static attribute buffers (tree, spiral, strands, topper mesh) are
//! uploaded once at init. Per-frame data is limited to small uniform
//! blocks plus the sprite and trail instance buffers, which are always
//! written at full pool size so the draw-call shape never varies.

use glam::{Mat4, Vec3};
use rand::rngs::StdRng;
use rand::SeedableRng;
use scene_core::ambient::{
    SPIRAL_BASE_RADIUS, SPIRAL_COUNT, SPIRAL_HEIGHT, SPIRAL_LINE_WIDTH, SPIRAL_RISE_SPEED,
    SPIRAL_ROTATION_SPEED, SPIRAL_TURNS, STRAND_BASE_RADIUS, STRAND_HEIGHT,
};
use scene_core::trails::{METEOR_POOL, STREAK_POOL};
use scene_core::{
    constellation_stars, topper_mesh, tree_group_offset, Camera, SpiralGeometry, StrandGeometry,
    TreeGeometry, BLINK_AMPLITUDE, BLINK_SPEED, BREATHING_AMPLITUDE, BREATHING_SPEED, DUST_COUNT,
    GLOW_INTENSITY, GRAIN_NOISE, STARFIELD_COUNT, TREE_BASE_RADIUS, TREE_HEIGHT,
    TREE_PARTICLE_COUNT,
};
use web_sys as web;
use wgpu::util::DeviceExt;

mod post;
mod targets;

use post::{PostStack, PostUniforms, BLOOM_STRENGTH, BLOOM_THRESHOLD, GRAIN_AMOUNT};
use targets::{RenderTargets, HDR_FORMAT};

const SPIRAL_FLICKER_SPEED: f32 = 3.5;
const SPIRAL_FLICKER_INTENSITY: f32 = 0.3;
const TOPPER_COLOR: [f32; 4] = [1.0, 0.84, 0.55, 1.0];
const TOPPER_EMISSIVE_COLOR: [f32; 3] = [1.0, 0.9, 0.7];

// Midnight backdrop behind everything.
const CLEAR_COLOR: wgpu::Color = wgpu::Color {
    r: 0.004,
    g: 0.005,
    b: 0.028,
    a: 1.0,
};

const ADDITIVE: wgpu::BlendState = wgpu::BlendState {
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
};

// ===================== uniform blocks =====================

#[repr(C)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
struct TreeUniforms {
    view: [[f32; 4]; 4],
    proj: [[f32; 4]; 4],
    model: [[f32; 4]; 4],
    time: f32,
    scatter: f32,
    blink_speed: f32,
    blink_amplitude: f32,
    breathing_speed: f32,
    breathing_amplitude: f32,
    glow: f32,
    grain: f32,
}

#[repr(C)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
struct RibbonUniforms {
    view: [[f32; 4]; 4],
    proj: [[f32; 4]; 4],
    model: [[f32; 4]; 4],
    time: f32,
    height: f32,
    base_radius: f32,
    turns: f32,
    rotation_speed: f32,
    rise_speed: f32,
    flicker_speed: f32,
    flicker_intensity: f32,
    glow: f32,
    line_width: f32,
    _pad: [f32; 2],
}

#[repr(C)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
struct StrandUniforms {
    view: [[f32; 4]; 4],
    proj: [[f32; 4]; 4],
    model: [[f32; 4]; 4],
    time: f32,
    height: f32,
    base_radius: f32,
    _pad: f32,
}

#[repr(C)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
struct MatrixUniforms {
    view: [[f32; 4]; 4],
    proj: [[f32; 4]; 4],
    model: [[f32; 4]; 4],
}

#[repr(C)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
struct TopperUniforms {
    view: [[f32; 4]; 4],
    proj: [[f32; 4]; 4],
    model: [[f32; 4]; 4],
    color: [f32; 4],
    emissive: [f32; 4],
}

// ===================== instance data =====================

#[repr(C)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
struct TreeInstance {
    rest_pos: [f32; 3],
    seed: f32,
    scatter_pos: [f32; 3],
    size: f32,
    color: [f32; 3],
    _pad: f32,
}

#[repr(C)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
struct RibbonInstance {
    progress: f32,
    seed: f32,
    size: f32,
    offset: [f32; 3],
    _pad: [f32; 2],
}

#[repr(C)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
struct StrandInstance {
    progress: f32,
    angle: f32,
    line_index: f32,
    seed: f32,
}

/// Soft round point: dust motes and constellation stars.
#[repr(C)]
#[derive(Copy, Clone, Default, bytemuck::Pod, bytemuck::Zeroable)]
pub struct SpriteInstance {
    pub pos: [f32; 3],
    pub size: f32,
    pub color: [f32; 3],
    pub alpha: f32,
}

/// Elongated box with a full model matrix: streaks and meteors.
#[repr(C)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct TrailInstance {
    pub model: [[f32; 4]; 4],
    pub color: [f32; 4],
}

impl TrailInstance {
    pub fn new(model: Mat4, color: Vec3) -> Self {
        Self {
            model: model.to_cols_array_2d(),
            color: [color.x, color.y, color.z, 1.0],
        }
    }

    /// Zero-scale transform; keeps the slot in the draw call without
    /// producing any fragments.
    pub fn hidden() -> Self {
        Self::new(Mat4::from_scale(Vec3::ZERO), Vec3::ZERO)
    }
}

const TREE_ATTRS: [wgpu::VertexAttribute; 5] = wgpu::vertex_attr_array![
    1 => Float32x3, 2 => Float32, 3 => Float32x3, 4 => Float32, 5 => Float32x3];
const RIBBON_ATTRS: [wgpu::VertexAttribute; 4] =
    wgpu::vertex_attr_array![1 => Float32, 2 => Float32, 3 => Float32, 4 => Float32x3];
const STRAND_ATTRS: [wgpu::VertexAttribute; 4] =
    wgpu::vertex_attr_array![1 => Float32, 2 => Float32, 3 => Float32, 4 => Float32];
const SPRITE_ATTRS: [wgpu::VertexAttribute; 4] =
    wgpu::vertex_attr_array![1 => Float32x3, 2 => Float32, 3 => Float32x3, 4 => Float32];
const TRAIL_ATTRS: [wgpu::VertexAttribute; 5] = wgpu::vertex_attr_array![
    1 => Float32x4, 2 => Float32x4, 3 => Float32x4, 4 => Float32x4, 5 => Float32x4];

const QUAD_ATTRS: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![0 => Float32x2];
const MESH_ATTRS: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![0 => Float32x3];

const QUAD_LAYOUT: wgpu::VertexBufferLayout<'static> = wgpu::VertexBufferLayout {
    array_stride: 8,
    step_mode: wgpu::VertexStepMode::Vertex,
    attributes: &QUAD_ATTRS,
};
const MESH_LAYOUT: wgpu::VertexBufferLayout<'static> = wgpu::VertexBufferLayout {
    array_stride: 12,
    step_mode: wgpu::VertexStepMode::Vertex,
    attributes: &MESH_ATTRS,
};

fn instance_layout<'a>(
    stride: usize,
    attributes: &'a [wgpu::VertexAttribute],
) -> wgpu::VertexBufferLayout<'a> {
    wgpu::VertexBufferLayout {
        array_stride: stride as u64,
        step_mode: wgpu::VertexStepMode::Instance,
        attributes,
    }
}

/// Everything the renderer needs from the animators for one frame.
pub struct SceneFrame {
    pub time: f32,
    pub scatter: f32,
    pub rotation: f32,
    /// While the hand is open the spiral, strands and streaks are
    /// suppressed so the dispersal reads clearly.
    pub hide_ornaments: bool,
    /// Dust motes, then the starfield backdrop, then the constellation.
    pub sprites: Vec<SpriteInstance>,
    /// Streak slots followed by meteor slots, always at full pool size.
    pub trails: Vec<TrailInstance>,
    pub topper_model: Mat4,
    pub topper_emissive: f32,
}

struct ElementPass {
    pipeline: wgpu::RenderPipeline,
    uniforms: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    instances: wgpu::Buffer,
    count: u32,
}

pub struct GpuState<'a> {
    surface: wgpu::Surface<'a>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    width: u32,
    height: u32,
    camera: Camera,

    quad_vb: wgpu::Buffer,
    box_vb: wgpu::Buffer,
    topper_vb: wgpu::Buffer,
    topper_vertex_count: u32,

    tree: ElementPass,
    ribbon: ElementPass,
    strand: ElementPass,
    sprite: ElementPass,
    trail: ElementPass,
    topper_pipeline: wgpu::RenderPipeline,
    topper_uniforms: wgpu::Buffer,
    topper_bind_group: wgpu::BindGroup,

    targets: RenderTargets,
    post: PostStack,
}

impl<'a> GpuState<'a> {
    pub async fn new(canvas: &'a web::HtmlCanvasElement) -> anyhow::Result<Self> {
        let width = canvas.width();
        let height = canvas.height();

        let instance = wgpu::Instance::default();
        let surface = instance.create_surface(wgpu::SurfaceTarget::Canvas(canvas.clone()))?;
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or_else(|| anyhow::anyhow!("No WebGPU adapter"))?;
        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    required_features: wgpu::Features::empty(),
                    // Default limits avoid passing unknown fields to older WebGPU impls
                    required_limits: wgpu::Limits::default(),
                    memory_hints: wgpu::MemoryHints::Performance,
                    label: None,
                },
                None,
            )
            .await
            .map_err(|e| anyhow::anyhow!(format!("request_device error: {:?}", e)))?;
        let caps = surface.get_capabilities(&adapter);
        let format = caps
            .formats
            .iter()
            .copied()
            .find(|f| {
                matches!(
                    f,
                    wgpu::TextureFormat::Bgra8UnormSrgb | wgpu::TextureFormat::Rgba8UnormSrgb
                )
            })
            .unwrap_or(caps.formats[0]);
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width,
            height,
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode: caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let targets = RenderTargets::create(&device, width, height);
        let post = PostStack::new(&device, format, &targets);

        // Shared geometry: a unit billboard quad and a unit box.
        let quad_vertices: [f32; 12] = [
            -0.5, -0.5, 0.5, -0.5, 0.5, 0.5, -0.5, -0.5, 0.5, 0.5, -0.5, 0.5,
        ];
        let quad_vb = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("quad_vb"),
            contents: bytemuck::cast_slice(&quad_vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let box_vertices = unit_box_vertices();
        let box_vb = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("box_vb"),
            contents: bytemuck::cast_slice(&box_vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });

        // One bind group layout shape serves every element pass.
        let element_bgl = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("element_bgl"),
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
        });
        let element_pl = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("element_pl"),
            bind_group_layouts: &[&element_bgl],
            push_constant_ranges: &[],
        });

        let make_pipeline = |label: &str,
                             shader_src: &str,
                             slot0: wgpu::VertexBufferLayout,
                             slot1: Option<wgpu::VertexBufferLayout>| {
            let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some(label),
                source: wgpu::ShaderSource::Wgsl(shader_src.into()),
            });
            let mut buffers = vec![slot0];
            if let Some(s1) = slot1 {
                buffers.push(s1);
            }
            device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(label),
                layout: Some(&element_pl),
                vertex: wgpu::VertexState {
                    module: &shader,
                    entry_point: Some("vs_main"),
                    buffers: &buffers,
                    compilation_options: wgpu::PipelineCompilationOptions::default(),
                },
                primitive: wgpu::PrimitiveState::default(),
                depth_stencil: None,
                multisample: wgpu::MultisampleState::default(),
                fragment: Some(wgpu::FragmentState {
                    module: &shader,
                    entry_point: Some("fs_main"),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: HDR_FORMAT,
                        blend: Some(ADDITIVE),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                    compilation_options: wgpu::PipelineCompilationOptions::default(),
                }),
                cache: None,
                multiview: None,
            })
        };

        let make_uniforms = |label: &str, size: usize| {
            let buffer = device.create_buffer(&wgpu::BufferDescriptor {
                label: Some(label),
                size: size as u64,
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            });
            let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some(label),
                layout: &element_bgl,
                entries: &[wgpu::BindGroupEntry {
                    binding: 0,
                    resource: buffer.as_entire_binding(),
                }],
            });
            (buffer, bind_group)
        };

        // Static scene geometry.
        let mut rng = StdRng::from_entropy();
        let tree_geo =
            TreeGeometry::generate(TREE_PARTICLE_COUNT, TREE_HEIGHT, TREE_BASE_RADIUS, &mut rng);
        let tree_instances: Vec<TreeInstance> = (0..tree_geo.len())
            .map(|i| TreeInstance {
                rest_pos: tree_geo.positions[i].to_array(),
                seed: tree_geo.seeds[i],
                scatter_pos: tree_geo.scatter_targets[i].to_array(),
                size: tree_geo.sizes[i],
                color: tree_geo.colors[i].to_array(),
                _pad: 0.0,
            })
            .collect();

        let spiral_geo = SpiralGeometry::generate(SPIRAL_COUNT, &mut rng);
        let spiral_instances: Vec<RibbonInstance> = (0..spiral_geo.len())
            .map(|i| RibbonInstance {
                progress: spiral_geo.progress[i],
                seed: spiral_geo.seeds[i],
                size: spiral_geo.sizes[i],
                offset: spiral_geo.offsets[i].to_array(),
                _pad: [0.0; 2],
            })
            .collect();

        let strand_geo = StrandGeometry::generate(&mut rng);
        let strand_instances: Vec<StrandInstance> = (0..strand_geo.len())
            .map(|i| StrandInstance {
                progress: strand_geo.progress[i],
                angle: strand_geo.angles[i],
                line_index: strand_geo.strand_index[i],
                seed: strand_geo.seeds[i],
            })
            .collect();

        let static_instances = |label: &str, contents: &[u8]| {
            device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(label),
                contents,
                usage: wgpu::BufferUsages::VERTEX,
            })
        };
        let dynamic_instances = |label: &str, size: usize| {
            device.create_buffer(&wgpu::BufferDescriptor {
                label: Some(label),
                size: size as u64,
                usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            })
        };

        let (tree_ub, tree_bg) = make_uniforms("tree_uniforms", std::mem::size_of::<TreeUniforms>());
        let tree = ElementPass {
            pipeline: make_pipeline(
                "tree_pipeline",
                scene_core::TREE_WGSL,
                QUAD_LAYOUT,
                Some(instance_layout(std::mem::size_of::<TreeInstance>(), &TREE_ATTRS)),
            ),
            uniforms: tree_ub,
            bind_group: tree_bg,
            instances: static_instances("tree_instances", bytemuck::cast_slice(&tree_instances)),
            count: tree_instances.len() as u32,
        };

        let (ribbon_ub, ribbon_bg) =
            make_uniforms("ribbon_uniforms", std::mem::size_of::<RibbonUniforms>());
        let ribbon = ElementPass {
            pipeline: make_pipeline(
                "ribbon_pipeline",
                scene_core::RIBBON_WGSL,
                QUAD_LAYOUT,
                Some(instance_layout(std::mem::size_of::<RibbonInstance>(), &RIBBON_ATTRS)),
            ),
            uniforms: ribbon_ub,
            bind_group: ribbon_bg,
            instances: static_instances("ribbon_instances", bytemuck::cast_slice(&spiral_instances)),
            count: spiral_instances.len() as u32,
        };

        let (strand_ub, strand_bg) =
            make_uniforms("strand_uniforms", std::mem::size_of::<StrandUniforms>());
        let strand = ElementPass {
            pipeline: make_pipeline(
                "strand_pipeline",
                scene_core::STRAND_WGSL,
                QUAD_LAYOUT,
                Some(instance_layout(std::mem::size_of::<StrandInstance>(), &STRAND_ATTRS)),
            ),
            uniforms: strand_ub,
            bind_group: strand_bg,
            instances: static_instances("strand_instances", bytemuck::cast_slice(&strand_instances)),
            count: strand_instances.len() as u32,
        };

        let sprite_capacity = DUST_COUNT + STARFIELD_COUNT + constellation_stars().len();
        let (sprite_ub, sprite_bg) =
            make_uniforms("sprite_uniforms", std::mem::size_of::<MatrixUniforms>());
        let sprite = ElementPass {
            pipeline: make_pipeline(
                "sprite_pipeline",
                scene_core::SPRITE_WGSL,
                QUAD_LAYOUT,
                Some(instance_layout(std::mem::size_of::<SpriteInstance>(), &SPRITE_ATTRS)),
            ),
            uniforms: sprite_ub,
            bind_group: sprite_bg,
            instances: dynamic_instances(
                "sprite_instances",
                std::mem::size_of::<SpriteInstance>() * sprite_capacity,
            ),
            count: sprite_capacity as u32,
        };

        let trail_capacity = STREAK_POOL + METEOR_POOL;
        let (trail_ub, trail_bg) =
            make_uniforms("trail_uniforms", std::mem::size_of::<MatrixUniforms>());
        let trail = ElementPass {
            pipeline: make_pipeline(
                "trail_pipeline",
                scene_core::TRAIL_WGSL,
                MESH_LAYOUT,
                Some(instance_layout(std::mem::size_of::<TrailInstance>(), &TRAIL_ATTRS)),
            ),
            uniforms: trail_ub,
            bind_group: trail_bg,
            instances: dynamic_instances(
                "trail_instances",
                std::mem::size_of::<TrailInstance>() * trail_capacity,
            ),
            count: trail_capacity as u32,
        };

        let topper_vertices: Vec<[f32; 3]> = topper_mesh().iter().map(|v| v.to_array()).collect();
        let topper_vb = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("topper_vb"),
            contents: bytemuck::cast_slice(&topper_vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let topper_pipeline = make_pipeline("topper_pipeline", scene_core::TOPPER_WGSL, MESH_LAYOUT, None);
        let (topper_uniforms, topper_bind_group) =
            make_uniforms("topper_uniforms", std::mem::size_of::<TopperUniforms>());

        let camera = Camera::scene_default(width as f32 / height.max(1) as f32);

        Ok(Self {
            surface,
            device,
            queue,
            config,
            width,
            height,
            camera,
            quad_vb,
            box_vb,
            topper_vb,
            topper_vertex_count: topper_vertices.len() as u32,
            tree,
            ribbon,
            strand,
            sprite,
            trail,
            topper_pipeline,
            topper_uniforms,
            topper_bind_group,
            targets,
            post,
        })
    }

    pub fn resize_if_needed(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        if width != self.width || height != self.height {
            self.width = width;
            self.height = height;
            self.config.width = width;
            self.config.height = height;
            self.surface.configure(&self.device, &self.config);
            self.camera.aspect = width as f32 / height as f32;
            self.targets = RenderTargets::create(&self.device, width, height);
            self.post.rebuild_bind_groups(&self.device, &self.targets);
        }
    }

    pub fn render(&mut self, frame: &SceneFrame) -> Result<(), wgpu::SurfaceError> {
        let surface_tex = self.surface.get_current_texture()?;
        let surface_view = surface_tex
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let view = self.camera.view_matrix().to_cols_array_2d();
        let proj = self.camera.projection_matrix().to_cols_array_2d();
        let group = Mat4::from_translation(tree_group_offset())
            * Mat4::from_rotation_y(frame.rotation);
        let group_m = group.to_cols_array_2d();
        let identity = Mat4::IDENTITY.to_cols_array_2d();

        self.queue.write_buffer(
            &self.tree.uniforms,
            0,
            bytemuck::bytes_of(&TreeUniforms {
                view,
                proj,
                model: group_m,
                time: frame.time,
                scatter: frame.scatter,
                blink_speed: BLINK_SPEED,
                blink_amplitude: BLINK_AMPLITUDE,
                breathing_speed: BREATHING_SPEED,
                breathing_amplitude: BREATHING_AMPLITUDE,
                glow: GLOW_INTENSITY,
                grain: GRAIN_NOISE,
            }),
        );
        self.queue.write_buffer(
            &self.ribbon.uniforms,
            0,
            bytemuck::bytes_of(&RibbonUniforms {
                view,
                proj,
                model: group_m,
                time: frame.time,
                height: SPIRAL_HEIGHT,
                base_radius: SPIRAL_BASE_RADIUS,
                turns: SPIRAL_TURNS,
                rotation_speed: SPIRAL_ROTATION_SPEED,
                rise_speed: SPIRAL_RISE_SPEED,
                flicker_speed: SPIRAL_FLICKER_SPEED,
                flicker_intensity: SPIRAL_FLICKER_INTENSITY,
                glow: GLOW_INTENSITY,
                line_width: SPIRAL_LINE_WIDTH,
                _pad: [0.0; 2],
            }),
        );
        self.queue.write_buffer(
            &self.strand.uniforms,
            0,
            bytemuck::bytes_of(&StrandUniforms {
                view,
                proj,
                model: group_m,
                time: frame.time,
                height: STRAND_HEIGHT,
                base_radius: STRAND_BASE_RADIUS,
                _pad: 0.0,
            }),
        );
        self.queue.write_buffer(
            &self.sprite.uniforms,
            0,
            bytemuck::bytes_of(&MatrixUniforms {
                view,
                proj,
                model: identity,
            }),
        );
        self.queue.write_buffer(
            &self.trail.uniforms,
            0,
            bytemuck::bytes_of(&MatrixUniforms {
                view,
                proj,
                model: identity,
            }),
        );
        self.queue.write_buffer(
            &self.topper_uniforms,
            0,
            bytemuck::bytes_of(&TopperUniforms {
                view,
                proj,
                model: frame.topper_model.to_cols_array_2d(),
                color: TOPPER_COLOR,
                emissive: [
                    TOPPER_EMISSIVE_COLOR[0],
                    TOPPER_EMISSIVE_COLOR[1],
                    TOPPER_EMISSIVE_COLOR[2],
                    frame.topper_emissive,
                ],
            }),
        );

        let sprite_count = (frame.sprites.len() as u32).min(self.sprite.count);
        self.queue.write_buffer(
            &self.sprite.instances,
            0,
            bytemuck::cast_slice(&frame.sprites[..sprite_count as usize]),
        );
        let trail_count = (frame.trails.len() as u32).min(self.trail.count);
        self.queue.write_buffer(
            &self.trail.instances,
            0,
            bytemuck::cast_slice(&frame.trails[..trail_count as usize]),
        );

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("scene_encoder"),
            });
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("scene_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &self.targets.hdr_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(CLEAR_COLOR),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            let draw_quads = |pass: &mut wgpu::RenderPass<'_>, element: &ElementPass| {
                pass.set_pipeline(&element.pipeline);
                pass.set_bind_group(0, &element.bind_group, &[]);
                pass.set_vertex_buffer(0, self.quad_vb.slice(..));
                pass.set_vertex_buffer(1, element.instances.slice(..));
                pass.draw(0..6, 0..element.count);
            };

            draw_quads(&mut pass, &self.tree);
            if !frame.hide_ornaments {
                draw_quads(&mut pass, &self.ribbon);
                draw_quads(&mut pass, &self.strand);
            }
            pass.set_pipeline(&self.sprite.pipeline);
            pass.set_bind_group(0, &self.sprite.bind_group, &[]);
            pass.set_vertex_buffer(0, self.quad_vb.slice(..));
            pass.set_vertex_buffer(1, self.sprite.instances.slice(..));
            pass.draw(0..6, 0..sprite_count);

            pass.set_pipeline(&self.trail.pipeline);
            pass.set_bind_group(0, &self.trail.bind_group, &[]);
            pass.set_vertex_buffer(0, self.box_vb.slice(..));
            pass.set_vertex_buffer(1, self.trail.instances.slice(..));
            pass.draw(0..36, 0..trail_count);

            pass.set_pipeline(&self.topper_pipeline);
            pass.set_bind_group(0, &self.topper_bind_group, &[]);
            pass.set_vertex_buffer(0, self.topper_vb.slice(..));
            pass.draw(0..self.topper_vertex_count, 0..1);
        }
        self.queue.submit(Some(encoder.finish()));

        // Post chain. Each stage submits separately so its uniform
        // write lands before the pass that reads it.
        let mut post_uniforms = PostUniforms {
            resolution: [self.width as f32 / 2.0, self.height as f32 / 2.0],
            time: frame.time,
            threshold: BLOOM_THRESHOLD,
            blur_dir: [0.0, 0.0],
            bloom_strength: BLOOM_STRENGTH,
            grain_amount: GRAIN_AMOUNT,
        };
        let stage = |uniforms: PostUniforms,
                         label: &str,
                         target: &wgpu::TextureView,
                         pipeline: &wgpu::RenderPipeline,
                         bg0: &wgpu::BindGroup,
                         bg1: Option<&wgpu::BindGroup>| {
            self.queue
                .write_buffer(&self.post.uniform_buffer, 0, bytemuck::bytes_of(&uniforms));
            let mut encoder = self
                .device
                .create_command_encoder(&wgpu::CommandEncoderDescriptor { label: Some(label) });
            self.post.blit(&mut encoder, label, target, pipeline, bg0, bg1);
            self.queue.submit(Some(encoder.finish()));
        };

        stage(
            post_uniforms,
            "bright_pass",
            &self.targets.bloom_a_view,
            &self.post.bright_pipeline,
            &self.post.bg_hdr,
            None,
        );
        post_uniforms.blur_dir = [1.0, 0.0];
        stage(
            post_uniforms,
            "blur_h",
            &self.targets.bloom_b_view,
            &self.post.blur_pipeline,
            &self.post.bg_from_bloom_a,
            None,
        );
        post_uniforms.blur_dir = [0.0, 1.0];
        stage(
            post_uniforms,
            "blur_v",
            &self.targets.bloom_a_view,
            &self.post.blur_pipeline,
            &self.post.bg_from_bloom_b,
            None,
        );
        post_uniforms.blur_dir = [0.0, 0.0];
        post_uniforms.resolution = [self.width as f32, self.height as f32];
        stage(
            post_uniforms,
            "composite",
            &surface_view,
            &self.post.composite_pipeline,
            &self.post.bg_hdr,
            Some(&self.post.bg_bloom_a_only),
        );

        surface_tex.present();
        Ok(())
    }
}

/// 36-vertex unit cube centered at the origin, as a plain triangle
/// list. Trails stretch it along Z via their instance matrix.
fn unit_box_vertices() -> Vec<[f32; 3]> {
    let p = 0.5_f32;
    let corners = [
        [-p, -p, -p],
        [p, -p, -p],
        [p, p, -p],
        [-p, p, -p],
        [-p, -p, p],
        [p, -p, p],
        [p, p, p],
        [-p, p, p],
    ];
    const FACES: [[usize; 4]; 6] = [
        [0, 1, 2, 3],
        [5, 4, 7, 6],
        [4, 0, 3, 7],
        [1, 5, 6, 2],
        [3, 2, 6, 7],
        [4, 5, 1, 0],
    ];
    let mut out = Vec::with_capacity(36);
    for f in FACES {
        out.push(corners[f[0]]);
        out.push(corners[f[1]]);
        out.push(corners[f[2]]);
        out.push(corners[f[0]]);
        out.push(corners[f[2]]);
        out.push(corners[f[3]]);
    }
    out
}
