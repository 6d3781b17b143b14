use wgpu::util::DeviceExt;

use super::{Program, ProgramError};

/// Per-vertex data for one named attribute.
#[derive(Debug, Copy, Clone)]
pub enum VertexData<'a> {
    Float(&'a [f32]),
    Vec2(&'a [[f32; 2]]),
    Vec3(&'a [[f32; 3]]),
    Vec4(&'a [[f32; 4]]),
}

impl VertexData<'_> {
    pub fn format(&self) -> wgpu::VertexFormat {
        match self {
            VertexData::Float(_) => wgpu::VertexFormat::Float32,
            VertexData::Vec2(_) => wgpu::VertexFormat::Float32x2,
            VertexData::Vec3(_) => wgpu::VertexFormat::Float32x3,
            VertexData::Vec4(_) => wgpu::VertexFormat::Float32x4,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            VertexData::Float(v) => v.len(),
            VertexData::Vec2(v) => v.len(),
            VertexData::Vec3(v) => v.len(),
            VertexData::Vec4(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn bytes(&self) -> &[u8] {
        match self {
            VertexData::Float(v) => bytemuck::cast_slice(*v),
            VertexData::Vec2(v) => bytemuck::cast_slice(*v),
            VertexData::Vec3(v) => bytemuck::cast_slice(*v),
            VertexData::Vec4(v) => bytemuck::cast_slice(*v),
        }
    }
}

/// Full-viewport corners in clip space, counter-clockwise from bottom-left.
pub const FULLSCREEN_POSITIONS: [[f32; 2]; 4] = [[-1.0, -1.0], [1.0, -1.0], [1.0, 1.0], [-1.0, 1.0]];

/// Texture coordinates for [`FULLSCREEN_POSITIONS`]; origin top-left, so a
/// pass that copies a texture through this quad keeps row order.
pub const FULLSCREEN_UVS: [[f32; 2]; 4] = [[0.0, 1.0], [1.0, 1.0], [1.0, 0.0], [0.0, 0.0]];

pub const FULLSCREEN_INDICES: [u32; 6] = [0, 1, 2, 2, 0, 3];

/// Indexed triangle geometry whose attributes are bound to one program's
/// vertex inputs.
///
/// Attribute names are resolved to buffer slots once, here; drawing never
/// looks names up again. Vertex and index buffers are owned by the quad.
pub struct Quad {
    vertex_buffers: Vec<wgpu::Buffer>,
    index_buffer: wgpu::Buffer,
    index_count: u32,
}

impl Quad {
    /// Uploads `attributes` and `indices` for drawing with `program`.
    ///
    /// Every attribute must name a vertex input of `program` with a matching
    /// type, every input must receive data, and all arrays must have the same
    /// vertex count.
    pub fn new(
        device: &wgpu::Device,
        program: &Program,
        attributes: &[(&str, VertexData<'_>)],
        indices: &[u32],
    ) -> Result<Self, ProgramError> {
        let layout = program.layout();
        let label = layout.label();
        let inputs = layout.vertex_inputs();

        let mut slots: Vec<Option<&VertexData<'_>>> = vec![None; inputs.len()];
        let mut vertex_count: Option<usize> = None;

        for (name, data) in attributes {
            let Some(slot) = layout.vertex_slot(name) else {
                return Err(ProgramError::AttributeNotFound {
                    program: label.to_string(),
                    attribute: name.to_string(),
                });
            };

            let expected = inputs[slot].format;
            if data.format() != expected {
                return Err(ProgramError::AttributeFormat {
                    program: label.to_string(),
                    attribute: name.to_string(),
                    expected,
                    actual: data.format(),
                });
            }

            match vertex_count {
                None => vertex_count = Some(data.len()),
                Some(n) if n != data.len() => {
                    return Err(ProgramError::VertexCountMismatch {
                        program: label.to_string(),
                        attribute: name.to_string(),
                        expected: n,
                        actual: data.len(),
                    });
                }
                Some(_) => {}
            }

            slots[slot] = Some(data);
        }

        let mut vertex_buffers = Vec::with_capacity(inputs.len());
        for (input, data) in inputs.iter().zip(slots) {
            let Some(data) = data else {
                return Err(ProgramError::AttributeUnbound {
                    program: label.to_string(),
                    attribute: input.name.clone(),
                });
            };
            vertex_buffers.push(device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(&format!("{label} {} vbo", input.name)),
                contents: data.bytes(),
                usage: wgpu::BufferUsages::VERTEX,
            }));
        }

        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label} ibo")),
            contents: bytemuck::cast_slice(indices),
            usage: wgpu::BufferUsages::INDEX,
        });

        Ok(Self {
            vertex_buffers,
            index_buffer,
            index_count: indices.len() as u32,
        })
    }

    /// The two-triangle quad covering the whole target, fed through the
    /// `scr_pos` and `vert_uv_pos` inputs.
    pub fn fullscreen(device: &wgpu::Device, program: &Program) -> Result<Self, ProgramError> {
        Self::new(
            device,
            program,
            &[
                ("scr_pos", VertexData::Vec2(&FULLSCREEN_POSITIONS)),
                ("vert_uv_pos", VertexData::Vec2(&FULLSCREEN_UVS)),
            ],
            &FULLSCREEN_INDICES,
        )
    }

    pub fn index_count(&self) -> u32 {
        self.index_count
    }

    /// Binds the buffers and issues the indexed draw into an open pass.
    pub fn record(&self, pass: &mut wgpu::RenderPass<'_>) {
        for (slot, vbo) in self.vertex_buffers.iter().enumerate() {
            pass.set_vertex_buffer(slot as u32, vbo.slice(..));
        }
        pass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        pass.draw_indexed(0..self.index_count, 0, 0..1);
    }
}
