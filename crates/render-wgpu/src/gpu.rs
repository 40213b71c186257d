use crate::camera::Lens;
use crate::instances::{Instance, SceneInstances};
use crate::shaders;
use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};
use orbitwalk_common::CameraPose;
use orbitwalk_kernel::Scene;
use orbitwalk_render::Renderer;
use wgpu::util::DeviceExt;

const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;
const SKY: wgpu::Color = wgpu::Color {
    r: 0.45,
    g: 0.6,
    b: 0.8,
    a: 1.0,
};
const GRID_COLOR: [f32; 4] = [0.5, 0.5, 0.5, 1.0];
/// Grid lines per side of the ground origin, and the gap between them.
const GRID_HALF_LINES: i32 = 100;
const GRID_SPACING: f32 = 2.0;

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct MeshVertex {
    position: [f32; 3],
    normal: [f32; 3],
}

impl MeshVertex {
    const ATTRIBUTES: [wgpu::VertexAttribute; 2] =
        wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3];

    fn new(position: Vec3, normal: Vec3) -> Self {
        Self {
            position: position.to_array(),
            normal: normal.to_array(),
        }
    }
}

/// Per-instance placement: model matrix columns, then color.
#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct Placement {
    model: [[f32; 4]; 4],
    color: [f32; 4],
}

impl Placement {
    const ATTRIBUTES: [wgpu::VertexAttribute; 5] = wgpu::vertex_attr_array![
        2 => Float32x4,
        3 => Float32x4,
        4 => Float32x4,
        5 => Float32x4,
        6 => Float32x4,
    ];

    fn ground(scene: &Scene) -> Self {
        Self {
            model: scene.ground.model_matrix().to_cols_array_2d(),
            color: GRID_COLOR,
        }
    }
}

impl From<&Instance> for Placement {
    fn from(instance: &Instance) -> Self {
        Self {
            model: instance.model.to_cols_array_2d(),
            color: instance.kind.color(),
        }
    }
}

/// Unit cube centered on the origin, four vertices per face so each face
/// keeps a flat normal. Faces wind counter-clockwise seen from outside.
fn cube_mesh() -> (Vec<MeshVertex>, Vec<u16>) {
    let normals = [Vec3::X, Vec3::NEG_X, Vec3::Y, Vec3::NEG_Y, Vec3::Z, Vec3::NEG_Z];
    let mut vertices = Vec::with_capacity(24);
    let mut indices = Vec::with_capacity(36);
    for normal in normals {
        let u = if normal.x != 0.0 { Vec3::Z } else { Vec3::X };
        // (u, v, normal) is right-handed.
        let v = normal.cross(u);
        let base = vertices.len() as u16;
        for (a, b) in [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)] {
            let corner = (normal + u * a + v * b) * 0.5;
            vertices.push(MeshVertex::new(corner, normal));
        }
        indices.extend([0, 1, 2, 2, 3, 0].map(|i| base + i));
    }
    (vertices, indices)
}

/// Square line grid on the ground-local XZ plane. Lines are unlit.
fn grid_mesh(half_lines: i32, spacing: f32) -> Vec<MeshVertex> {
    let extent = half_lines as f32 * spacing;
    (-half_lines..=half_lines)
        .flat_map(|i| {
            let at = i as f32 * spacing;
            [
                Vec3::new(-extent, 0.0, at),
                Vec3::new(extent, 0.0, at),
                Vec3::new(at, 0.0, -extent),
                Vec3::new(at, 0.0, extent),
            ]
        })
        .map(|p| MeshVertex::new(p, Vec3::ZERO))
        .collect()
}

/// Instance slots to allocate so `needed` placements fit, or `None` when the
/// current buffer is already big enough.
fn grown_capacity(current: usize, needed: usize) -> Option<usize> {
    (needed > current).then(|| needed.next_power_of_two())
}

fn pipeline(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
    shader: &wgpu::ShaderModule,
    format: wgpu::TextureFormat,
    topology: wgpu::PrimitiveTopology,
) -> wgpu::RenderPipeline {
    let label = format!("rig_{topology:?}");
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(&label),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: Some("vs_main"),
            compilation_options: Default::default(),
            buffers: &[
                wgpu::VertexBufferLayout {
                    array_stride: size_of::<MeshVertex>() as u64,
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &MeshVertex::ATTRIBUTES,
                },
                wgpu::VertexBufferLayout {
                    array_stride: size_of::<Placement>() as u64,
                    step_mode: wgpu::VertexStepMode::Instance,
                    attributes: &Placement::ATTRIBUTES,
                },
            ],
        },
        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: Some("fs_main"),
            compilation_options: Default::default(),
            targets: &[Some(format.into())],
        }),
        primitive: wgpu::PrimitiveState {
            topology,
            cull_mode: (topology == wgpu::PrimitiveTopology::TriangleList)
                .then_some(wgpu::Face::Back),
            ..Default::default()
        },
        depth_stencil: Some(wgpu::DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: true,
            depth_compare: wgpu::CompareFunction::Less,
            stencil: Default::default(),
            bias: Default::default(),
        }),
        multisample: Default::default(),
        multiview: None,
        cache: None,
    })
}

fn placement_buffer(device: &wgpu::Device, slots: usize) -> wgpu::Buffer {
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("placements"),
        size: (slots * size_of::<Placement>()) as u64,
        usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

fn depth_view(device: &wgpu::Device, width: u32, height: u32) -> wgpu::TextureView {
    device
        .create_texture(&wgpu::TextureDescriptor {
            label: Some("depth"),
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
        })
        .create_view(&Default::default())
}

/// wgpu backend for the rig.
///
/// Slot 0 of the placement buffer holds the ground grid; the cubes laid out
/// by [`SceneInstances`] follow it.
pub struct WgpuRenderer {
    layout: SceneInstances,
    lines: wgpu::RenderPipeline,
    solids: wgpu::RenderPipeline,
    frame_buffer: wgpu::Buffer,
    frame_bind_group: wgpu::BindGroup,
    cube_vertices: wgpu::Buffer,
    cube_indices: wgpu::Buffer,
    cube_index_count: u32,
    grid_vertices: wgpu::Buffer,
    grid_vertex_count: u32,
    placements: wgpu::Buffer,
    placement_slots: usize,
    depth: wgpu::TextureView,
    surface_format: wgpu::TextureFormat,
}

impl WgpuRenderer {
    pub fn new(
        device: &wgpu::Device,
        surface_format: wgpu::TextureFormat,
        width: u32,
        height: u32,
    ) -> Self {
        let frame_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("frame_uniform"),
            contents: bytemuck::bytes_of(&Mat4::IDENTITY.to_cols_array_2d()),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let frame_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("frame_layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });
        let frame_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("frame_bind_group"),
            layout: &frame_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: frame_buffer.as_entire_binding(),
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("rig_layout"),
            bind_group_layouts: &[&frame_layout],
            push_constant_ranges: &[],
        });
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("rig_shader"),
            source: wgpu::ShaderSource::Wgsl(shaders::RIG_SHADER.into()),
        });
        let lines = pipeline(
            device,
            &pipeline_layout,
            &shader,
            surface_format,
            wgpu::PrimitiveTopology::LineList,
        );
        let solids = pipeline(
            device,
            &pipeline_layout,
            &shader,
            surface_format,
            wgpu::PrimitiveTopology::TriangleList,
        );

        let (cube, cube_index_list) = cube_mesh();
        let grid = grid_mesh(GRID_HALF_LINES, GRID_SPACING);
        let vertex_buffer = |label, vertices: &[MeshVertex]| {
            device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(label),
                contents: bytemuck::cast_slice(vertices),
                usage: wgpu::BufferUsages::VERTEX,
            })
        };
        let cube_vertices = vertex_buffer("cube_vertices", &cube);
        let grid_vertices = vertex_buffer("grid_vertices", &grid);
        let cube_indices = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("cube_indices"),
            contents: bytemuck::cast_slice(&cube_index_list),
            usage: wgpu::BufferUsages::INDEX,
        });

        let layout = SceneInstances::default();
        // Grid, origin marker, landmarks and one attachment.
        let placement_slots = (layout.landmark_count() + 3).next_power_of_two();

        Self {
            lines,
            solids,
            frame_buffer,
            frame_bind_group,
            cube_vertices,
            cube_indices,
            cube_index_count: cube_index_list.len() as u32,
            grid_vertices,
            grid_vertex_count: grid.len() as u32,
            placements: placement_buffer(device, placement_slots),
            placement_slots,
            depth: depth_view(device, width, height),
            surface_format,
            layout,
        }
    }

    pub fn resize(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        self.depth = depth_view(device, width, height);
    }

    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.surface_format
    }

    /// Draw the scene through `camera`: ground grid first, then every cube.
    pub fn render(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        view: &wgpu::TextureView,
        lens: &Lens,
        scene: &Scene,
        camera: &CameraPose,
    ) {
        let placements: Vec<Placement> = std::iter::once(Placement::ground(scene))
            .chain(self.layout.render(scene, camera).iter().map(Placement::from))
            .collect();
        if let Some(slots) = grown_capacity(self.placement_slots, placements.len()) {
            tracing::debug!(slots, "growing placement buffer");
            self.placements = placement_buffer(device, slots);
            self.placement_slots = slots;
        }

        queue.write_buffer(
            &self.frame_buffer,
            0,
            bytemuck::bytes_of(&lens.view_projection(camera).to_cols_array_2d()),
        );
        queue.write_buffer(&self.placements, 0, bytemuck::cast_slice(&placements));

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("rig_encoder"),
        });
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("rig_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(SKY),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                ..Default::default()
            });
            pass.set_bind_group(0, &self.frame_bind_group, &[]);
            pass.set_vertex_buffer(1, self.placements.slice(..));

            pass.set_pipeline(&self.lines);
            pass.set_vertex_buffer(0, self.grid_vertices.slice(..));
            pass.draw(0..self.grid_vertex_count, 0..1);

            pass.set_pipeline(&self.solids);
            pass.set_vertex_buffer(0, self.cube_vertices.slice(..));
            pass.set_index_buffer(self.cube_indices.slice(..), wgpu::IndexFormat::Uint16);
            pass.draw_indexed(0..self.cube_index_count, 0, 1..placements.len() as u32);
        }
        queue.submit(std::iter::once(encoder.finish()));
    }
}
