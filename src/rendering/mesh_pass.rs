use std::collections::HashMap;
use std::sync::Arc;

use glam::{Mat4, Vec3, Vec4};
use wgpu::{
    util::DeviceExt, Device, MultisampleState, PipelineCompilationOptions, RenderPass,
    RenderPassDescriptor, ShaderSource,
};

use crate::{
    assets::model::{MeshGeometry, MeshVertex},
    editor::background::Color,
    rendering::{
        pass::Pass,
        render_common::RenderCommon,
        shader_loader::{PipelineCache, PipelineCacheBuilder, PipelineId, ShaderDefinition},
        texture::DepthTexture,
    },
    scene_graph::{ObjectId, Scene},
};

const MESH_SHADER: ShaderDefinition = ShaderDefinition {
    name: "Mesh",
    path: "mesh.wgsl",
};

const INITIAL_INSTANCE_CAPACITY: u64 = 64;

impl MeshVertex {
    const ATTRIBUTES: [wgpu::VertexAttribute; 3] =
        wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3, 2 => Float32x3];

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<MeshVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MeshInstance {
    pub model: Mat4,
}

impl MeshInstance {
    const ATTRIBUTES: [wgpu::VertexAttribute; 4] = wgpu::vertex_attr_array![
        5 => Float32x4,
        6 => Float32x4,
        7 => Float32x4,
        8 => Float32x4
    ];

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<MeshInstance>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

/// Fixed sandbox lighting. Colors are linear and premultiplied by intensity;
/// `point_position.w` is the point light's range.
#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable, PartialEq)]
pub struct LightUniform {
    pub ambient: Vec4,
    pub sky: Vec4,
    pub ground: Vec4,
    pub sun_direction: Vec4,
    pub sun_color: Vec4,
    pub point_position: Vec4,
    pub point_color: Vec4,
}

fn light_color(color: Color, intensity: f32) -> Vec4 {
    (Vec3::from_array(color.to_linear()) * intensity).extend(1.0)
}

impl LightUniform {
    /// White ambient and hemisphere fill, a directional key light and a point
    /// light at the origin where the sun usually sits.
    pub fn sandbox() -> Self {
        Self {
            ambient: light_color(Color::WHITE, 0.6),
            sky: light_color(Color::WHITE, 0.8),
            ground: light_color(Color::rgb8(0x44, 0x44, 0x44), 0.8),
            sun_direction: Vec3::new(500.0, 1000.0, 750.0).normalize().extend(0.0),
            sun_color: light_color(Color::WHITE, 1.0),
            point_position: Vec3::ZERO.extend(50_000.0),
            point_color: light_color(Color::WHITE, 2.0),
        }
    }
}

/// One object to draw this frame.
pub struct MeshDraw {
    pub object: ObjectId,
    pub geometry: Arc<MeshGeometry>,
    pub model: Mat4,
}

pub fn collect_mesh_draws(scene: &Scene) -> Vec<MeshDraw> {
    scene
        .visible_meshes()
        .into_iter()
        .map(|(object, geometry, model)| MeshDraw {
            object,
            geometry,
            model,
        })
        .collect()
}

struct GpuPrimitive {
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
}

struct GpuMesh {
    primitives: Vec<GpuPrimitive>,
}

impl GpuMesh {
    fn upload(device: &Device, object: ObjectId, geometry: &MeshGeometry) -> Self {
        let primitives = geometry
            .primitives
            .iter()
            .enumerate()
            .map(|(index, primitive)| {
                let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some(&format!("Vertex buffer ({:?}, primitive {})", object, index)),
                    contents: bytemuck::cast_slice(&primitive.vertices),
                    usage: wgpu::BufferUsages::VERTEX,
                });

                let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some(&format!("Index buffer ({:?}, primitive {})", object, index)),
                    contents: bytemuck::cast_slice(&primitive.indices),
                    usage: wgpu::BufferUsages::INDEX,
                });

                GpuPrimitive {
                    vertex_buffer,
                    index_buffer,
                    index_count: primitive.indices.len() as u32,
                }
            })
            .collect();

        Self { primitives }
    }
}

pub struct MeshPassTargets {
    pub color: wgpu::TextureView,
    pub depth: wgpu::TextureView,
    pub clear_color: wgpu::Color,
}

/// Draws placed models with fixed lighting. Clears the target, so it runs
/// before the line pass.
///
/// Geometry is uploaded the first time an object is drawn and kept for the
/// rest of the session, like the scene keeps the object itself.
pub struct MeshPass {
    pipeline_id: PipelineId,
    common: Arc<RenderCommon>,
    light_bind_group: wgpu::BindGroup,
    meshes: HashMap<ObjectId, GpuMesh>,
    instance_buffer: wgpu::Buffer,
    instance_capacity: u64,
    draws: Vec<ObjectId>,
}

fn create_instance_buffer(device: &Device, capacity: u64) -> wgpu::Buffer {
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Mesh Instance Buffer"),
        size: capacity * std::mem::size_of::<MeshInstance>() as u64,
        usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

impl MeshPass {
    pub fn upload(&mut self, device: &Device, queue: &wgpu::Queue, draws: &[MeshDraw]) {
        for draw in draws {
            self.meshes.entry(draw.object).or_insert_with(|| {
                log::debug!("Uploading geometry for {:?}", draw.object);
                GpuMesh::upload(device, draw.object, &draw.geometry)
            });
        }

        let instances: Vec<MeshInstance> = draws
            .iter()
            .map(|draw| MeshInstance { model: draw.model })
            .collect();
        let needed = instances.len() as u64;

        if needed > self.instance_capacity {
            self.instance_capacity = needed.next_power_of_two();
            self.instance_buffer = create_instance_buffer(device, self.instance_capacity);
            log::debug!("Mesh instance buffer grown to {}", self.instance_capacity);
        }

        if !instances.is_empty() {
            queue.write_buffer(&self.instance_buffer, 0, bytemuck::cast_slice(&instances));
        }
        self.draws = draws.iter().map(|draw| draw.object).collect();
    }

    pub fn draw(&self, render_pass: &mut RenderPass) {
        if self.draws.is_empty() {
            return;
        }

        render_pass.set_bind_group(0, &self.common.camera_bind_group, &[]);
        render_pass.set_bind_group(1, &self.light_bind_group, &[]);
        render_pass.set_vertex_buffer(1, self.instance_buffer.slice(..));

        for (instance, object) in self.draws.iter().enumerate() {
            let Some(mesh) = self.meshes.get(object) else {
                continue;
            };

            let instance = instance as u32;
            for primitive in &mesh.primitives {
                render_pass.set_vertex_buffer(0, primitive.vertex_buffer.slice(..));
                render_pass
                    .set_index_buffer(primitive.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                render_pass.draw_indexed(0..primitive.index_count, 0, instance..instance + 1);
            }
        }
    }
}

impl Pass for MeshPass {
    type Targets = MeshPassTargets;

    fn create(
        device: &Device,
        common: Arc<RenderCommon>,
        cache_builder: &mut PipelineCacheBuilder,
    ) -> anyhow::Result<MeshPass> {
        let light_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Light Uniform Buffer"),
            contents: bytemuck::cast_slice(&[LightUniform::sandbox()]),
            usage: wgpu::BufferUsages::UNIFORM,
        });

        let light_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Light Bind Group Layout"),
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                }],
            });

        let light_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Light Bind Group"),
            layout: &light_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: light_buffer.as_entire_binding(),
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Mesh Pipeline Layout"),
            bind_group_layouts: &[&common.camera_bind_group_layout, &light_bind_group_layout],
            push_constant_ranges: &[],
        });

        let format = common.surface_format();

        let pipeline_id = cache_builder.add_shader(
            MESH_SHADER,
            Box::new(
                move |device: &Device, shader_def: &ShaderDefinition, source: &str| {
                    let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
                        label: Some(shader_def.name),
                        source: ShaderSource::Wgsl(source.into()),
                    });

                    let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                        label: Some("Mesh Pass Pipeline"),
                        layout: Some(&pipeline_layout),
                        vertex: wgpu::VertexState {
                            module: &shader,
                            entry_point: Some("vs_main"),
                            buffers: &[MeshVertex::layout(), MeshInstance::layout()],
                            compilation_options: PipelineCompilationOptions::default(),
                        },
                        fragment: Some(wgpu::FragmentState {
                            module: &shader,
                            entry_point: Some("fs_main"),
                            targets: &[Some(wgpu::ColorTargetState {
                                format,
                                blend: Some(wgpu::BlendState::REPLACE),
                                write_mask: wgpu::ColorWrites::ALL,
                            })],
                            compilation_options: PipelineCompilationOptions::default(),
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
                            format: DepthTexture::DEPTH_FORMAT,
                            depth_write_enabled: true,
                            depth_compare: wgpu::CompareFunction::Less,
                            stencil: wgpu::StencilState::default(),
                            bias: wgpu::DepthBiasState::default(),
                        }),
                        multisample: MultisampleState::default(),
                        multiview: None,
                        cache: None,
                    });

                    Ok(pipeline)
                },
            ),
        );

        Ok(Self {
            pipeline_id,
            common,
            light_bind_group,
            meshes: HashMap::new(),
            instance_buffer: create_instance_buffer(device, INITIAL_INSTANCE_CAPACITY),
            instance_capacity: INITIAL_INSTANCE_CAPACITY,
            draws: Vec::new(),
        })
    }

    fn render<'a, F>(
        &self,
        targets: &Self::Targets,
        encoder: &mut wgpu::CommandEncoder,
        pipeline_cache: &PipelineCache,
        render_callback: F,
    ) where
        F: FnOnce(&mut RenderPass) + 'a,
    {
        let mut render_pass = encoder.begin_render_pass(&RenderPassDescriptor {
            label: Some("Mesh Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &targets.color,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(targets.clear_color),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &targets.depth,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            occlusion_query_set: None,
            timestamp_writes: None,
        });

        let Some(pipeline) = pipeline_cache.get(self.pipeline_id) else {
            return;
        };

        render_pass.set_pipeline(pipeline);
        render_callback(&mut render_pass);
    }
}
