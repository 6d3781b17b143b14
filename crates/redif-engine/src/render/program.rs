use std::collections::HashSet;

use super::reflect::{FRAGMENT_ENTRY, VERTEX_ENTRY};
use super::{scoped_pass, ProgramError, ProgramLayout, ProgramSource, Quad, Texture, UniformValue};

/// One `var<uniform>` block: GPU buffer plus CPU shadow.
struct UniformBuffer {
    buffer: wgpu::Buffer,
    shadow: Vec<u8>,
    dirty: bool,
}

/// A texture currently assigned to a texture input.
struct BoundTexture {
    label: String,
    view: wgpu::TextureView,
    sampler: wgpu::Sampler,
}

/// A compiled shader program: reflected layout, render pipeline for one
/// target format, uniform storage and texture bindings.
///
/// Uniform and texture inputs are addressed by name, as declared in WGSL.
/// Values are staged on the CPU and reach the GPU on [`Program::flush`]
/// (which [`Program::draw`] calls).
pub struct Program {
    device: wgpu::Device,
    layout: ProgramLayout,
    target_format: wgpu::TextureFormat,
    pipeline: wgpu::RenderPipeline,
    bind_group_layout: wgpu::BindGroupLayout,

    uniforms: Vec<UniformBuffer>,
    textures: Vec<Option<BoundTexture>>,
    bind_group: Option<wgpu::BindGroup>,

    warned: HashSet<String>,
    warned_unbound: bool,
}

impl Program {
    /// Reflects `source` and builds its pipeline for `target_format`.
    ///
    /// Compile and link failures are returned with the shader front end's
    /// diagnostic; nothing is created on the device in that case.
    pub fn new(
        device: &wgpu::Device,
        source: &ProgramSource<'_>,
        target_format: wgpu::TextureFormat,
    ) -> Result<Self, ProgramError> {
        let layout = ProgramLayout::reflect(source)?;
        let label = layout.label().to_string();

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(&label),
            source: wgpu::ShaderSource::Wgsl(layout.source().into()),
        });

        let mut entries = Vec::new();
        for block in layout.uniform_blocks() {
            entries.push(wgpu::BindGroupLayoutEntry {
                binding: block.binding,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            });
        }
        for tex in layout.textures() {
            entries.push(wgpu::BindGroupLayoutEntry {
                binding: tex.binding,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    sample_type: wgpu::TextureSampleType::Float { filterable: true },
                    view_dimension: wgpu::TextureViewDimension::D2,
                    multisampled: false,
                },
                count: None,
            });
            entries.push(wgpu::BindGroupLayoutEntry {
                binding: tex.sampler_binding,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                count: None,
            });
        }

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some(&format!("{label} bgl")),
            entries: &entries,
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some(&format!("{label} pipeline layout")),
            bind_group_layouts: &[&bind_group_layout],
            immediate_size: 0,
        });

        // One buffer slot per attribute, in location order.
        let attributes: Vec<[wgpu::VertexAttribute; 1]> = layout
            .vertex_inputs()
            .iter()
            .map(|input| {
                [wgpu::VertexAttribute {
                    format: input.format,
                    offset: 0,
                    shader_location: input.location,
                }]
            })
            .collect();
        let buffers: Vec<wgpu::VertexBufferLayout<'_>> = layout
            .vertex_inputs()
            .iter()
            .zip(&attributes)
            .map(|(input, attrs)| wgpu::VertexBufferLayout {
                array_stride: input.format.size(),
                step_mode: wgpu::VertexStepMode::Vertex,
                attributes: attrs,
            })
            .collect();

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(&format!("{label} pipeline")),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some(VERTEX_ENTRY),
                compilation_options: Default::default(),
                buffers: &buffers,
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some(FRAGMENT_ENTRY),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: target_format,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });

        let uniforms = layout
            .uniform_blocks()
            .iter()
            .map(|block| {
                let size = u64::from(block.size.max(16)).next_multiple_of(16);
                UniformBuffer {
                    buffer: device.create_buffer(&wgpu::BufferDescriptor {
                        label: Some(&format!("{label} {} ubo", block.name)),
                        size,
                        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                        mapped_at_creation: false,
                    }),
                    shadow: vec![0; size as usize],
                    dirty: true,
                }
            })
            .collect();

        let textures = layout.textures().iter().map(|_| None).collect();

        log::debug!("program `{label}` built for {target_format:?}");

        Ok(Self {
            device: device.clone(),
            layout,
            target_format,
            pipeline,
            bind_group_layout,
            uniforms,
            textures,
            bind_group: None,
            warned: HashSet::new(),
            warned_unbound: false,
        })
    }

    pub fn label(&self) -> &str {
        self.layout.label()
    }

    pub fn layout(&self) -> &ProgramLayout {
        &self.layout
    }

    pub fn target_format(&self) -> wgpu::TextureFormat {
        self.target_format
    }

    /// Assigns a uniform member or texture input by name.
    ///
    /// Returns `false`, leaving the program unchanged, when the name is not an
    /// input of this program or the value's shape differs from the declared
    /// one. Each such name is warned about once.
    pub fn set_uniform(&mut self, name: &str, value: UniformValue<'_>) -> bool {
        match value {
            UniformValue::Texture(texture) => self.set_texture(name, texture),
            _ => self.set_numeric(name, value),
        }
    }

    fn set_numeric(&mut self, name: &str, value: UniformValue<'_>) -> bool {
        let Some((block, member)) = self.layout.uniform(name) else {
            if self.layout.texture_slot(name).is_some() {
                self.warn_once(name, format_args!("`{name}` is a texture input, got {value:?}"));
            } else {
                self.warn_once(name, format_args!("uniform `{name}` not found"));
            }
            return false;
        };

        if value.shape() != Some(member.shape) {
            let declared = member.shape;
            self.warn_once(
                name,
                format_args!("uniform `{name}` is {declared:?}, got {value:?}"),
            );
            return false;
        }

        let offset = member.offset as usize;
        let ubo = &mut self.uniforms[block];
        value.write_bytes(&mut ubo.shadow[offset..]);
        ubo.dirty = true;
        true
    }

    fn set_texture(&mut self, name: &str, texture: &Texture) -> bool {
        let Some(slot) = self.layout.texture_slot(name) else {
            if let Some((_, member)) = self.layout.uniform(name) {
                let declared = member.shape;
                self.warn_once(
                    name,
                    format_args!("uniform `{name}` is {declared:?}, got texture `{}`", texture.label()),
                );
            } else {
                self.warn_once(name, format_args!("texture input `{name}` not found"));
            }
            return false;
        };

        self.textures[slot] = Some(BoundTexture {
            label: texture.label().to_string(),
            view: texture.view().clone(),
            sampler: texture.sampler().clone(),
        });
        self.bind_group = None;
        true
    }

    fn warn_once(&mut self, name: &str, msg: std::fmt::Arguments<'_>) {
        if self.warned.insert(name.to_string()) {
            log::warn!("program `{}`: {msg}; ignored", self.layout.label());
        }
    }

    /// Writes every modified uniform block to the GPU.
    pub fn flush(&mut self, queue: &wgpu::Queue) {
        for ubo in self.uniforms.iter_mut().filter(|u| u.dirty) {
            queue.write_buffer(&ubo.buffer, 0, &ubo.shadow);
            ubo.dirty = false;
        }
    }

    /// Flushes uniforms, then draws `quad` into `view` in its own pass.
    ///
    /// `view` must have the format this program was built for. The draw is
    /// skipped with a warning while a texture input is still unassigned.
    pub fn draw(
        &mut self,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        view: &wgpu::TextureView,
        quad: &Quad,
    ) {
        self.flush(queue);

        if self.bind_group.is_none() {
            self.bind_group = self.build_bind_group();
        }
        let Some(bind_group) = self.bind_group.as_ref() else {
            if !self.warned_unbound {
                self.warned_unbound = true;
                log::warn!(
                    "program `{}`: texture inputs unassigned; draw skipped",
                    self.layout.label()
                );
            }
            return;
        };

        let mut pass = scoped_pass(encoder, view, self.layout.label());
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, bind_group, &[]);
        quad.record(&mut pass);
    }

    fn build_bind_group(&self) -> Option<wgpu::BindGroup> {
        let mut entries = Vec::new();
        for (block, ubo) in self.layout.uniform_blocks().iter().zip(&self.uniforms) {
            entries.push(wgpu::BindGroupEntry {
                binding: block.binding,
                resource: ubo.buffer.as_entire_binding(),
            });
        }
        for (tex, bound) in self.layout.textures().iter().zip(&self.textures) {
            let bound = bound.as_ref()?;
            entries.push(wgpu::BindGroupEntry {
                binding: tex.binding,
                resource: wgpu::BindingResource::TextureView(&bound.view),
            });
            entries.push(wgpu::BindGroupEntry {
                binding: tex.sampler_binding,
                resource: wgpu::BindingResource::Sampler(&bound.sampler),
            });
        }

        log::debug!(
            "program `{}`: bind group built ({})",
            self.layout.label(),
            self.textures
                .iter()
                .flatten()
                .map(|b| b.label.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        );

        Some(self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(&format!("{} bind group", self.layout.label())),
            layout: &self.bind_group_layout,
            entries: &entries,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::HeadlessGpu;
    use crate::render::{Filter, TextureTarget};

    const VERTEX: &str = r#"
struct VertexOutput {
    @builtin(position) clip: vec4<f32>,
    @location(0) uv: vec2<f32>,
}

@vertex
fn vs_main(@location(0) scr_pos: vec2<f32>, @location(1) vert_uv_pos: vec2<f32>) -> VertexOutput {
    var out: VertexOutput;
    out.clip = vec4<f32>(scr_pos, 0.0, 1.0);
    out.uv = vert_uv_pos;
    return out;
}
"#;

    const TINT: &str = r#"
struct Params {
    color: vec4<f32>,
}

@group(0) @binding(0) var<uniform> params: Params;
@group(0) @binding(1) var tex: texture_2d<f32>;
@group(0) @binding(2) var tex_sampler: sampler;

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    return params.color * textureSample(tex, tex_sampler, in.uv);
}
"#;

    fn gpu() -> Option<HeadlessGpu> {
        let gpu = HeadlessGpu::try_default();
        if gpu.is_none() {
            eprintln!("no GPU adapter; skipping");
        }
        gpu
    }

    fn tint(gpu: &HeadlessGpu) -> Program {
        let source = ProgramSource { label: "tint", vertex: VERTEX, geometry: None, fragment: TINT };
        match Program::new(gpu.device(), &source, wgpu::TextureFormat::Rgba16Float) {
            Ok(program) => program,
            Err(e) => panic!("{e}"),
        }
    }

    fn white(gpu: &HeadlessGpu) -> Texture {
        Texture::from_rgba8(gpu.device(), gpu.queue(), "white", 1, 1, &[255; 4], Filter::Nearest)
            .unwrap()
    }

    #[test]
    fn rejected_sets_leave_the_program_drawable() {
        let Some(gpu) = gpu() else { return };
        let mut program = tint(&gpu);
        let white = white(&gpu);

        assert!(!program.set_uniform("light", UniformValue::Vec3([0.0, 0.0, -1.0])));
        assert!(!program.set_uniform("color", UniformValue::Float(1.0)));
        assert!(!program.set_uniform("tex", UniformValue::Float(1.0)));
        assert!(!program.set_uniform("color", UniformValue::Texture(&white)));
        assert!(!program.set_uniform("pal", UniformValue::Texture(&white)));

        assert!(program.set_uniform("tex", UniformValue::Texture(&white)));
        assert!(program.set_uniform("color", UniformValue::Vec4([0.25, 0.5, 0.75, 1.0])));

        let target = TextureTarget::new(gpu.device(), "tint target", 4, 4);
        let quad = Quad::fullscreen(gpu.device(), &program).unwrap();
        gpu.submit_with("tint", |encoder| {
            program.draw(gpu.queue(), encoder, target.view(), &quad);
        });

        let texels = target.texture().read_texels(gpu.device(), gpu.queue()).unwrap();
        assert_eq!(texels.len(), 16);
        assert!(texels.iter().all(|t| *t == [0.25, 0.5, 0.75, 1.0]), "{texels:?}");
    }

    #[test]
    fn draw_without_textures_is_skipped() {
        let Some(gpu) = gpu() else { return };
        let mut program = tint(&gpu);
        assert!(program.set_uniform("color", UniformValue::Vec4([1.0; 4])));

        let target = TextureTarget::new(gpu.device(), "tint target", 2, 2);
        target.texture().write_texels(gpu.queue(), &[[0.5; 4]; 4]).unwrap();
        let quad = Quad::fullscreen(gpu.device(), &program).unwrap();
        gpu.submit_with("tint", |encoder| {
            program.draw(gpu.queue(), encoder, target.view(), &quad);
        });

        let texels = target.texture().read_texels(gpu.device(), gpu.queue()).unwrap();
        assert_eq!(texels, vec![[0.5; 4]; 4]);
    }
}
