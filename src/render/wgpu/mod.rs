//! wgpu Backend
//!
//! A small forward renderer for the intro scene.
//!
//! # Overview
//!
//! - One frame uniform (camera, fog, up to four directional and four point
//!   lights) in bind group 0
//! - One dynamic per-draw uniform (model matrix, material color) in bind
//!   group 1, 256-byte stride
//! - Interleaved `position + normal` vertex buffers per geometry key,
//!   re-uploaded when the CPU attribute version changes
//! - Pipelines cached per topology / blending / cull / depth-write
//! - One depth-only shadow map for the key light in bind group 2
//!
//! Opaque draws go first, transparent and additive ones after. Shadow
//! casters are drawn into the shadow map before the main pass, reusing
//! their per-draw uniforms. Points are rasterized at one pixel.

mod context;

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3, Vec4};
use raw_window_handle::{HasDisplayHandle, HasWindowHandle};
use rustc_hash::FxHashMap;
use wgpu::util::DeviceExt;

use crate::errors::Result;
use crate::host::Viewport;
use crate::render::{RenderBackend, SurfaceId};
use crate::resources::color::srgb_to_linear;
use crate::resources::{
    Blending, Geometry, GeometryGroup, GeometryKey, Material, MaterialFlags, MaterialKey,
    MaterialKind, ResourceArena, Side,
};
use crate::scene::{Camera, LightKind, NodeKind, Scene, ShadowLight};
use crate::settings::RendererOptions;

pub use context::{DEPTH_FORMAT, WgpuContext};

const MAX_DIRECTIONAL: usize = 4;
const MAX_POINT: usize = 4;
const DRAW_STRIDE: u64 = 256;
const INITIAL_DRAW_CAPACITY: u64 = 64;
const SHADOW_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

// ============================================================================
// Uniform layouts
// ============================================================================

#[repr(C)]
#[derive(Debug, Clone, Copy, Default, Pod, Zeroable)]
struct LightUniform {
    position: [f32; 4],
    color: [f32; 4],
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default, Pod, Zeroable)]
struct FrameUniforms {
    view_projection: [[f32; 4]; 4],
    camera_position: [f32; 4],
    ambient: [f32; 4],
    fog_color: [f32; 4],
    fog_range: [f32; 4],
    counts: [u32; 4],
    directional: [LightUniform; MAX_DIRECTIONAL],
    point: [LightUniform; MAX_POINT],
    shadow_view_projection: [[f32; 4]; 4],
    /// x: depth bias, y: normal bias, z: texel size.
    shadow_params: [f32; 4],
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default, Pod, Zeroable)]
struct DrawUniforms {
    model: [[f32; 4]; 4],
    normal_matrix: [[f32; 4]; 4],
    color: [f32; 4],
    emissive: [f32; 4],
    params: [f32; 4],
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
struct Vertex {
    position: [f32; 3],
    normal: [f32; 3],
}

const VERTEX_ATTRIBUTES: [wgpu::VertexAttribute; 2] =
    wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3];

// ============================================================================
// GPU-side resources
// ============================================================================

struct GpuGeometry {
    vertex_buffer: wgpu::Buffer,
    vertex_count: u32,
    index_buffer: Option<(wgpu::Buffer, u32)>,
    topology: wgpu::PrimitiveTopology,
    groups: Vec<GeometryGroup>,
    version: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct PipelineKey {
    topology: wgpu::PrimitiveTopology,
    blending: Blending,
    transparent: bool,
    side: Side,
    depth_write: bool,
}

struct DrawCall {
    geometry: GeometryKey,
    pipeline: PipelineKey,
    range: Option<(u32, u32)>,
    uniforms: DrawUniforms,
    casts_shadow: bool,
}

/// Depth target of the shadow pass and its sampling bind group.
struct ShadowMap {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    size: u32,
    bind_group: wgpu::BindGroup,
}

impl ShadowMap {
    fn new(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        sampler: &wgpu::Sampler,
        size: u32,
    ) -> Self {
        let size = size.clamp(1, device.limits().max_texture_dimension_2d);
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Shadow Map"),
            size: wgpu::Extent3d {
                width: size,
                height: size,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: SHADOW_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Shadow BindGroup"),
            layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(sampler),
                },
            ],
        });
        Self {
            texture,
            view,
            size,
            bind_group,
        }
    }
}

fn geometry_version(geometry: &Geometry) -> u64 {
    ["position", "normal"]
        .iter()
        .filter_map(|name| geometry.attribute(name))
        .map(|attribute| attribute.version)
        .max()
        .unwrap_or_default()
}

fn interleave(geometry: &Geometry) -> Vec<Vertex> {
    let positions = geometry.attribute("position");
    let normals = geometry.attribute("normal");
    (0..geometry.vertex_count())
        .map(|i| Vertex {
            position: positions
                .and_then(|a| a.read_vec3(i))
                .unwrap_or_default()
                .to_array(),
            normal: normals
                .and_then(|a| a.read_vec3(i))
                .unwrap_or(Vec3::Y)
                .to_array(),
        })
        .collect()
}

fn to_wgpu_color(color: Vec4) -> wgpu::Color {
    let rgb = srgb_to_linear(color.truncate());
    wgpu::Color {
        r: f64::from(rgb.x),
        g: f64::from(rgb.y),
        b: f64::from(rgb.z),
        a: f64::from(color.w),
    }
}

// ============================================================================
// Renderer
// ============================================================================

/// Renders the intro into a window surface through wgpu.
pub struct WgpuRenderer {
    context: WgpuContext,
    surface_id: SurfaceId,
    exposure: f32,
    clear_color: wgpu::Color,

    shader: wgpu::ShaderModule,
    draw_layout: wgpu::BindGroupLayout,
    pipeline_layout: wgpu::PipelineLayout,
    pipelines: FxHashMap<PipelineKey, wgpu::RenderPipeline>,

    shadows: bool,
    shadow_layout: wgpu::BindGroupLayout,
    shadow_sampler: wgpu::Sampler,
    shadow_pipeline: wgpu::RenderPipeline,
    shadow_map: ShadowMap,

    frame_buffer: wgpu::Buffer,
    frame_bind_group: wgpu::BindGroup,
    draw_buffer: wgpu::Buffer,
    draw_bind_group: wgpu::BindGroup,
    draw_capacity: u64,
    draw_staging: Vec<u8>,

    geometries: FxHashMap<GeometryKey, GpuGeometry>,
    materials: FxHashMap<MaterialKey, ()>,
    disposed: bool,
}

impl WgpuRenderer {
    pub async fn new<W>(window: W, options: &RendererOptions, viewport: Viewport) -> Result<Self>
    where
        W: HasWindowHandle + HasDisplayHandle + Send + Sync + 'static,
    {
        let context = WgpuContext::new(window, options, viewport).await?;
        let device = &context.device;

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Intro Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shader.wgsl").into()),
        });

        let frame_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Frame BindGroup Layout"),
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
        });

        let draw_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Draw BindGroup Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: true,
                    min_binding_size: wgpu::BufferSize::new(
                        std::mem::size_of::<DrawUniforms>() as u64,
                    ),
                },
                count: None,
            }],
        });

        let shadow_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Shadow BindGroup Layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Depth,
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Comparison),
                    count: None,
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Intro Pipeline Layout"),
            bind_group_layouts: &[Some(&frame_layout), Some(&draw_layout), Some(&shadow_layout)],
            immediate_size: 0,
        });

        let shadow_pipeline = Self::create_shadow_pipeline(device, &shader, &frame_layout, &draw_layout);
        let shadow_sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Shadow Sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            compare: Some(wgpu::CompareFunction::LessEqual),
            ..Default::default()
        });
        // Stand-in until the first frame with a shadow light.
        let shadow_map = ShadowMap::new(device, &shadow_layout, &shadow_sampler, 1);

        let frame_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Frame Uniforms"),
            contents: bytemuck::bytes_of(&FrameUniforms::default()),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let frame_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Frame BindGroup"),
            layout: &frame_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: frame_buffer.as_entire_binding(),
            }],
        });

        let (draw_buffer, draw_bind_group) =
            Self::create_draw_buffer(device, &draw_layout, INITIAL_DRAW_CAPACITY);

        Ok(Self {
            context,
            surface_id: SurfaceId::next(),
            exposure: options.tone_mapping_exposure,
            clear_color: wgpu::Color::WHITE,
            shader,
            draw_layout,
            pipeline_layout,
            pipelines: FxHashMap::default(),
            shadows: options.shadows,
            shadow_layout,
            shadow_sampler,
            shadow_pipeline,
            shadow_map,
            frame_buffer,
            frame_bind_group,
            draw_buffer,
            draw_bind_group,
            draw_capacity: INITIAL_DRAW_CAPACITY,
            draw_staging: Vec::new(),
            geometries: FxHashMap::default(),
            materials: FxHashMap::default(),
            disposed: false,
        })
    }

    fn create_draw_buffer(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        capacity: u64,
    ) -> (wgpu::Buffer, wgpu::BindGroup) {
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Draw Uniforms"),
            size: capacity * DRAW_STRIDE,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Draw BindGroup"),
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer: &buffer,
                    offset: 0,
                    size: wgpu::BufferSize::new(std::mem::size_of::<DrawUniforms>() as u64),
                }),
            }],
        });
        (buffer, bind_group)
    }

    fn create_shadow_pipeline(
        device: &wgpu::Device,
        shader: &wgpu::ShaderModule,
        frame_layout: &wgpu::BindGroupLayout,
        draw_layout: &wgpu::BindGroupLayout,
    ) -> wgpu::RenderPipeline {
        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Shadow Pipeline Layout"),
            bind_group_layouts: &[Some(frame_layout), Some(draw_layout)],
            immediate_size: 0,
        });
        device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Shadow Pipeline"),
            layout: Some(&layout),
            vertex: wgpu::VertexState {
                module: shader,
                entry_point: Some("vs_shadow"),
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<Vertex>() as u64,
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &VERTEX_ATTRIBUTES,
                }],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            fragment: None,
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: SHADOW_FORMAT,
                depth_write_enabled: Some(true),
                depth_compare: Some(wgpu::CompareFunction::LessEqual),
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState {
                    constant: 2,
                    slope_scale: 2.0,
                    clamp: 0.0,
                },
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        })
    }

    /// Resizes the shadow map to the light's requested resolution.
    fn ensure_shadow_map(&mut self, size: u32) {
        let device = &self.context.device;
        let size = size.clamp(1, device.limits().max_texture_dimension_2d);
        if self.shadow_map.size == size {
            return;
        }
        log::debug!("wgpu renderer: shadow map {size}x{size}");
        let previous = std::mem::replace(
            &mut self.shadow_map,
            ShadowMap::new(device, &self.shadow_layout, &self.shadow_sampler, size),
        );
        previous.texture.destroy();
    }

    #[must_use]
    pub fn context(&self) -> &WgpuContext {
        &self.context
    }

    // ========================================================================
    // Geometry upload
    // ========================================================================

    fn upload(&self, geometry: &Geometry) -> GpuGeometry {
        let device = &self.context.device;
        let vertices = interleave(geometry);
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(geometry.label.as_ref()),
            contents: bytemuck::cast_slice(&vertices),
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        });
        let index_buffer = geometry.indices().map(|indices| {
            let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(geometry.label.as_ref()),
                contents: bytemuck::cast_slice(indices),
                usage: wgpu::BufferUsages::INDEX,
            });
            (buffer, indices.len() as u32)
        });

        GpuGeometry {
            vertex_buffer,
            vertex_count: vertices.len() as u32,
            index_buffer,
            topology: geometry.topology,
            groups: geometry.groups().to_vec(),
            version: geometry_version(geometry),
        }
    }

    /// Re-uploads vertex data whose CPU version moved (the particle field).
    fn sync_geometries(&mut self, resources: &ResourceArena) {
        for (&key, gpu) in &mut self.geometries {
            let Some(geometry) = resources.geometry(key) else {
                continue;
            };
            let version = geometry_version(geometry);
            if version == gpu.version {
                continue;
            }
            let vertices = interleave(geometry);
            if vertices.len() as u32 == gpu.vertex_count {
                self.context
                    .queue
                    .write_buffer(&gpu.vertex_buffer, 0, bytemuck::cast_slice(&vertices));
            } else {
                gpu.vertex_buffer =
                    self.context
                        .device
                        .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                            label: Some(geometry.label.as_ref()),
                            contents: bytemuck::cast_slice(&vertices),
                            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
                        });
                gpu.vertex_count = vertices.len() as u32;
            }
            gpu.version = version;
        }
    }

    // ========================================================================
    // Pipelines
    // ========================================================================

    fn ensure_pipeline(&mut self, key: PipelineKey) {
        if self.pipelines.contains_key(&key) {
            return;
        }

        let blend = match (key.blending, key.transparent) {
            (Blending::Additive, _) => wgpu::BlendState {
                color: wgpu::BlendComponent {
                    src_factor: wgpu::BlendFactor::SrcAlpha,
                    dst_factor: wgpu::BlendFactor::One,
                    operation: wgpu::BlendOperation::Add,
                },
                alpha: wgpu::BlendComponent {
                    src_factor: wgpu::BlendFactor::One,
                    dst_factor: wgpu::BlendFactor::One,
                    operation: wgpu::BlendOperation::Add,
                },
            },
            (Blending::Normal, true) => wgpu::BlendState::ALPHA_BLENDING,
            (Blending::Normal, false) => wgpu::BlendState::REPLACE,
        };
        let cull_mode = match key.side {
            Side::Front => Some(wgpu::Face::Back),
            Side::Back => Some(wgpu::Face::Front),
            Side::Double => None,
        };

        let pipeline =
            self.context
                .device
                .create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                    label: Some("Intro Pipeline"),
                    layout: Some(&self.pipeline_layout),
                    vertex: wgpu::VertexState {
                        module: &self.shader,
                        entry_point: Some("vs_main"),
                        buffers: &[wgpu::VertexBufferLayout {
                            array_stride: std::mem::size_of::<Vertex>() as u64,
                            step_mode: wgpu::VertexStepMode::Vertex,
                            attributes: &VERTEX_ATTRIBUTES,
                        }],
                        compilation_options: wgpu::PipelineCompilationOptions::default(),
                    },
                    fragment: Some(wgpu::FragmentState {
                        module: &self.shader,
                        entry_point: Some("fs_main"),
                        targets: &[Some(wgpu::ColorTargetState {
                            format: self.context.color_format(),
                            blend: Some(blend),
                            write_mask: wgpu::ColorWrites::ALL,
                        })],
                        compilation_options: wgpu::PipelineCompilationOptions::default(),
                    }),
                    primitive: wgpu::PrimitiveState {
                        topology: key.topology,
                        front_face: wgpu::FrontFace::Ccw,
                        cull_mode,
                        ..Default::default()
                    },
                    depth_stencil: Some(wgpu::DepthStencilState {
                        format: DEPTH_FORMAT,
                        depth_write_enabled: Some(key.depth_write),
                        depth_compare: Some(wgpu::CompareFunction::LessEqual),
                        stencil: wgpu::StencilState::default(),
                        bias: wgpu::DepthBiasState::default(),
                    }),
                    multisample: wgpu::MultisampleState::default(),
                    multiview_mask: None,
                    cache: None,
                });

        self.pipelines.insert(key, pipeline);
    }

    // ========================================================================
    // Frame assembly
    // ========================================================================

    /// Fills the frame uniform. With `shadow` set, `counts.z` holds the
    /// shadowed directional slot plus one.
    fn frame_uniforms(
        &self,
        scene: &Scene,
        camera: &Camera,
        shadow: Option<&ShadowLight<'_>>,
    ) -> FrameUniforms {
        let mut frame = FrameUniforms {
            view_projection: camera.view_projection_matrix().to_cols_array_2d(),
            camera_position: camera.position().extend(1.0).to_array(),
            ..Default::default()
        };
        frame.fog_range[2] = self.exposure;

        if let Some(fog) = scene.fog {
            frame.fog_color = srgb_to_linear(fog.color).extend(1.0).to_array();
            frame.fog_range[0] = fog.near;
            frame.fog_range[1] = fog.far;
        }

        let mut ambient = Vec3::ZERO;
        let (mut directional, mut point) = (0usize, 0usize);
        for (light, position) in scene.lights() {
            let radiance = srgb_to_linear(light.color) * light.intensity;
            match light.kind {
                LightKind::Ambient => ambient += radiance,
                LightKind::Directional { target } if directional < MAX_DIRECTIONAL => {
                    frame.directional[directional] = LightUniform {
                        position: (position - target).normalize_or_zero().extend(0.0).to_array(),
                        color: radiance.extend(1.0).to_array(),
                    };
                    directional += 1;
                    if let Some(shadow) = shadow.filter(|s| std::ptr::eq(s.light, light)) {
                        frame.counts[2] = directional as u32;
                        frame.shadow_view_projection = shadow.view_projection.to_cols_array_2d();
                        frame.shadow_params = [
                            shadow.config.bias,
                            shadow.config.normal_bias,
                            1.0 / self.shadow_map.size as f32,
                            0.0,
                        ];
                    }
                }
                LightKind::Point { range } if point < MAX_POINT => {
                    frame.point[point] = LightUniform {
                        position: position.extend(range).to_array(),
                        color: radiance.extend(1.0).to_array(),
                    };
                    point += 1;
                }
                _ => log::debug!("wgpu renderer: light limit reached, extra light ignored"),
            }
        }
        frame.ambient = ambient.extend(1.0).to_array();
        frame.counts[0] = directional as u32;
        frame.counts[1] = point as u32;
        frame
    }

    fn collect_draws(scene: &Scene, resources: &ResourceArena) -> Vec<DrawCall> {
        let mut opaque = Vec::new();
        let mut transparent = Vec::new();

        for item in scene.draw_items() {
            let Some(geometry) = resources.geometry(item.renderable.geometry) else {
                continue;
            };
            let model = Mat4::from(item.world_matrix);
            let normal_matrix = model.inverse().transpose();

            let ranges: Vec<(Option<(u32, u32)>, usize)> = if geometry.groups().is_empty() {
                vec![(None, 0)]
            } else {
                geometry
                    .groups()
                    .iter()
                    .map(|g| (Some((g.start, g.count)), g.material_index))
                    .collect()
            };

            for (range, material_index) in ranges {
                let Some(material) = item
                    .renderable
                    .materials
                    .get(material_index)
                    .and_then(|key| resources.material(key))
                else {
                    continue;
                };
                if material.opacity <= 0.0 {
                    continue;
                }

                let pipeline = Self::pipeline_key(item.kind, geometry, material);
                let casts_shadow = item.renderable.cast_shadow
                    && matches!(item.kind, NodeKind::Mesh(_))
                    && pipeline.topology == wgpu::PrimitiveTopology::TriangleList
                    && !material.is_transparent();
                let call = DrawCall {
                    geometry: item.renderable.geometry,
                    pipeline,
                    range,
                    uniforms: Self::draw_uniforms(
                        model,
                        normal_matrix,
                        material,
                        item.renderable.receive_shadow,
                    ),
                    casts_shadow,
                };
                if material.is_transparent() || material.blending == Blending::Additive {
                    transparent.push(call);
                } else {
                    opaque.push(call);
                }
            }
        }

        opaque.extend(transparent);
        opaque
    }

    fn pipeline_key(kind: &NodeKind, geometry: &Geometry, material: &Material) -> PipelineKey {
        let topology = match kind {
            NodeKind::Points(_) => wgpu::PrimitiveTopology::PointList,
            NodeKind::LineSegments(_) => wgpu::PrimitiveTopology::LineList,
            _ => geometry.topology,
        };
        PipelineKey {
            topology,
            blending: material.blending,
            transparent: material.is_transparent(),
            side: material.side,
            depth_write: material.flags.contains(MaterialFlags::DEPTH_WRITE)
                && !material.is_transparent(),
        }
    }

    fn draw_uniforms(
        model: Mat4,
        normal_matrix: Mat4,
        material: &Material,
        receive_shadow: bool,
    ) -> DrawUniforms {
        let (mut params, emissive) = match material.kind {
            MaterialKind::Phong {
                shininess,
                specular,
                emissive,
            } => (
                [1.0, shininess, specular.max_element(), 0.0],
                srgb_to_linear(emissive),
            ),
            _ => ([0.0; 4], Vec3::ZERO),
        };
        params[3] = if receive_shadow { 1.0 } else { 0.0 };
        DrawUniforms {
            model: model.to_cols_array_2d(),
            normal_matrix: normal_matrix.to_cols_array_2d(),
            color: srgb_to_linear(material.color)
                .extend(material.opacity)
                .to_array(),
            emissive: emissive.extend(0.0).to_array(),
            params,
        }
    }

    fn write_draw_uniforms(&mut self, draws: &[DrawCall]) {
        let needed = draws.len() as u64;
        if needed > self.draw_capacity {
            let capacity = needed.next_power_of_two();
            let (buffer, bind_group) =
                Self::create_draw_buffer(&self.context.device, &self.draw_layout, capacity);
            self.draw_buffer = buffer;
            self.draw_bind_group = bind_group;
            self.draw_capacity = capacity;
        }

        self.draw_staging.clear();
        self.draw_staging.resize((needed * DRAW_STRIDE) as usize, 0);
        for (i, draw) in draws.iter().enumerate() {
            let offset = i * DRAW_STRIDE as usize;
            let bytes = bytemuck::bytes_of(&draw.uniforms);
            self.draw_staging[offset..offset + bytes.len()].copy_from_slice(bytes);
        }
        if !self.draw_staging.is_empty() {
            self.context
                .queue
                .write_buffer(&self.draw_buffer, 0, &self.draw_staging);
        }
    }
}

impl WgpuRenderer {
    /// Depth-only pass of the shadow casters from the key light.
    fn encode_shadow_pass(&self, encoder: &mut wgpu::CommandEncoder, draws: &[DrawCall]) {
        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Shadow Depth Pass"),
            color_attachments: &[],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &self.shadow_map.view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            ..Default::default()
        });
        pass.set_pipeline(&self.shadow_pipeline);
        pass.set_bind_group(0, &self.frame_bind_group, &[]);

        for (i, draw) in draws.iter().enumerate().filter(|(_, d)| d.casts_shadow) {
            let Some(gpu) = self.geometries.get(&draw.geometry) else {
                continue;
            };
            let offset = (i as u64 * DRAW_STRIDE) as u32;
            pass.set_bind_group(1, &self.draw_bind_group, &[offset]);
            pass.set_vertex_buffer(0, gpu.vertex_buffer.slice(..));
            Self::issue_draw(&mut pass, gpu, draw.range);
        }
    }

    fn issue_draw(pass: &mut wgpu::RenderPass<'_>, gpu: &GpuGeometry, range: Option<(u32, u32)>) {
        match &gpu.index_buffer {
            Some((index_buffer, count)) => {
                let (start, len) = range.unwrap_or((0, *count));
                pass.set_index_buffer(index_buffer.slice(..), wgpu::IndexFormat::Uint16);
                pass.draw_indexed(start..start + len, 0, 0..1);
            }
            None => {
                let (start, len) = range.unwrap_or((0, gpu.vertex_count));
                pass.draw(start..start + len, 0..1);
            }
        }
    }
}

impl RenderBackend for WgpuRenderer {
    fn surface(&self) -> SurfaceId {
        self.surface_id
    }

    fn allocate_geometry(&mut self, key: GeometryKey, geometry: &Geometry) -> Result<()> {
        let gpu = self.upload(geometry);
        self.geometries.insert(key, gpu);
        Ok(())
    }

    fn allocate_material(&mut self, key: MaterialKey, _material: &Material) -> Result<()> {
        self.materials.insert(key, ());
        Ok(())
    }

    fn release_geometry(&mut self, key: GeometryKey) {
        if let Some(gpu) = self.geometries.remove(&key) {
            gpu.vertex_buffer.destroy();
            if let Some((index_buffer, _)) = gpu.index_buffer {
                index_buffer.destroy();
            }
        }
    }

    fn release_material(&mut self, key: MaterialKey) {
        self.materials.remove(&key);
    }

    fn set_size(&mut self, viewport: Viewport) {
        self.context.resize(viewport.width, viewport.height);
    }

    fn set_clear_color(&mut self, color: Vec4) {
        self.clear_color = to_wgpu_color(color);
    }

    fn render(&mut self, scene: &Scene, camera: &Camera, resources: &ResourceArena) {
        if self.disposed {
            return;
        }
        self.sync_geometries(resources);

        let draws = Self::collect_draws(scene, resources);
        for draw in &draws {
            self.ensure_pipeline(draw.pipeline);
        }
        self.write_draw_uniforms(&draws);

        let shadow = if self.shadows { scene.shadow_light() } else { None };
        if let Some(shadow) = &shadow {
            self.ensure_shadow_map(shadow.config.map_size);
        }
        let frame = self.frame_uniforms(scene, camera, shadow.as_ref());
        self.context
            .queue
            .write_buffer(&self.frame_buffer, 0, bytemuck::bytes_of(&frame));

        let output = match self.context.surface.get_current_texture() {
            Ok(output) => output,
            Err(wgpu::SurfaceError::Lost) => {
                let (width, height) = self.context.size();
                self.context.resize(width, height);
                return;
            }
            Err(e) => {
                log::error!("Render error: {e:?}");
                return;
            }
        };
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder =
            self.context
                .device
                .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("Intro Encoder"),
                });

        if shadow.is_some() {
            self.encode_shadow_pass(&mut encoder, &draws);
        }

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Intro Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.clear_color),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.context.depth_texture_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                ..Default::default()
            });

            pass.set_bind_group(0, &self.frame_bind_group, &[]);
            pass.set_bind_group(2, &self.shadow_map.bind_group, &[]);

            for (i, draw) in draws.iter().enumerate() {
                let (Some(gpu), Some(pipeline)) = (
                    self.geometries.get(&draw.geometry),
                    self.pipelines.get(&draw.pipeline),
                ) else {
                    continue;
                };
                let offset = (i as u64 * DRAW_STRIDE) as u32;
                pass.set_pipeline(pipeline);
                pass.set_bind_group(1, &self.draw_bind_group, &[offset]);
                pass.set_vertex_buffer(0, gpu.vertex_buffer.slice(..));
                Self::issue_draw(&mut pass, gpu, draw.range);
            }
        }

        self.context.queue.submit(std::iter::once(encoder.finish()));
        output.present();
    }

    fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        for (_, gpu) in self.geometries.drain() {
            gpu.vertex_buffer.destroy();
            if let Some((index_buffer, _)) = gpu.index_buffer {
                index_buffer.destroy();
            }
        }
        self.materials.clear();
        self.pipelines.clear();
        self.draw_buffer.destroy();
        self.frame_buffer.destroy();
        self.shadow_map.texture.destroy();
        self.disposed = true;
        log::info!("wgpu renderer disposed");
    }
}
