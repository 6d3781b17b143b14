//! Shader reflection.
//!
//! A program is one WGSL module composed from its vertex and fragment sources
//! (`vs_main` / `fs_main`). naga parses and validates it here, on the CPU, and
//! the module's interface is read back into a [`ProgramLayout`]: named vertex
//! inputs, named uniform block members with byte offsets, and named textures.
//! Names are resolved once, at construction, with no device involved.
//!
//! Binding conventions:
//! - all resources live in bind group 0
//! - a texture `name` is sampled through a sampler named `name_sampler`

use naga::{AddressSpace, Binding, ImageClass, ImageDimension, ScalarKind, ShaderStage, TypeInner};

use super::{ProgramError, Stage, UniformShape};

pub const VERTEX_ENTRY: &str = "vs_main";
pub const FRAGMENT_ENTRY: &str = "fs_main";

const SAMPLER_SUFFIX: &str = "_sampler";

/// Source text for one program.
#[derive(Debug, Clone, Copy)]
pub struct ProgramSource<'a> {
    pub label: &'a str,
    pub vertex: &'a str,
    /// The wgpu backend has no geometry stage; any source given here is
    /// rejected.
    pub geometry: Option<&'a str>,
    pub fragment: &'a str,
}

/// A vertex stage input.
#[derive(Debug, Clone, PartialEq)]
pub struct VertexInput {
    pub name: String,
    pub location: u32,
    pub format: wgpu::VertexFormat,
}

/// A named member of a uniform block.
#[derive(Debug, Clone, PartialEq)]
pub struct UniformMember {
    pub name: String,
    pub offset: u32,
    pub shape: UniformShape,
}

/// A `var<uniform>` struct binding.
#[derive(Debug, Clone, PartialEq)]
pub struct UniformBlock {
    pub name: String,
    pub binding: u32,
    /// Struct size in bytes, including trailing padding.
    pub size: u32,
    pub members: Vec<UniformMember>,
}

impl UniformBlock {
    pub fn member(&self, name: &str) -> Option<&UniformMember> {
        self.members.iter().find(|m| m.name == name)
    }
}

/// A sampled 2D float texture and its paired sampler.
#[derive(Debug, Clone, PartialEq)]
pub struct TextureBinding {
    pub name: String,
    pub binding: u32,
    pub sampler_binding: u32,
}

/// Reflected interface of a composed program.
#[derive(Debug, Clone)]
pub struct ProgramLayout {
    label: String,
    source: String,
    vertex_inputs: Vec<VertexInput>,
    uniform_blocks: Vec<UniformBlock>,
    textures: Vec<TextureBinding>,
}

impl ProgramLayout {
    /// Composes, parses, validates and reflects `source`.
    ///
    /// The vertex source is parsed on its own first so a broken vertex stage
    /// is reported as such; errors in the composed module are attributed to
    /// the fragment stage, and validation failures are link errors.
    pub fn reflect(source: &ProgramSource<'_>) -> Result<Self, ProgramError> {
        let program = source.label.to_string();

        if source.geometry.is_some() {
            return Err(ProgramError::UnsupportedStage { program, stage: Stage::Geometry });
        }

        if let Err(e) = naga::front::wgsl::parse_str(source.vertex) {
            return Err(ProgramError::Compile {
                program,
                stage: Stage::Vertex,
                diagnostic: e.emit_to_string(source.vertex),
            });
        }

        let composed = format!("{}\n{}", source.vertex, source.fragment);
        let module = naga::front::wgsl::parse_str(&composed).map_err(|e| ProgramError::Compile {
            program: program.clone(),
            stage: Stage::Fragment,
            diagnostic: e.emit_to_string(&composed),
        })?;

        naga::valid::Validator::new(
            naga::valid::ValidationFlags::all(),
            naga::valid::Capabilities::default(),
        )
        .validate(&module)
        .map_err(|e| ProgramError::Link {
            program: program.clone(),
            diagnostic: e.emit_to_string(&composed),
        })?;

        let link = |diagnostic: String| ProgramError::Link {
            program: program.clone(),
            diagnostic,
        };

        let vertex = module
            .entry_points
            .iter()
            .find(|ep| ep.name == VERTEX_ENTRY && ep.stage == ShaderStage::Vertex)
            .ok_or_else(|| link(format!("missing vertex entry point `{VERTEX_ENTRY}`")))?;

        if !module
            .entry_points
            .iter()
            .any(|ep| ep.name == FRAGMENT_ENTRY && ep.stage == ShaderStage::Fragment)
        {
            return Err(link(format!("missing fragment entry point `{FRAGMENT_ENTRY}`")));
        }

        let mut vertex_inputs = Vec::new();
        for arg in &vertex.function.arguments {
            match &arg.binding {
                Some(Binding::Location { location, .. }) => {
                    let name = arg
                        .name
                        .clone()
                        .ok_or_else(|| link(format!("unnamed vertex input at location {location}")))?;
                    let format = vertex_format(&module.types[arg.ty].inner)
                        .ok_or_else(|| link(format!("vertex input `{name}` has an unsupported type")))?;
                    vertex_inputs.push(VertexInput { name, location: *location, format });
                }
                Some(Binding::BuiltIn(_)) => {}
                None => {
                    let TypeInner::Struct { members, .. } = &module.types[arg.ty].inner else {
                        return Err(link("vertex argument without binding".to_string()));
                    };
                    for member in members {
                        let Some(Binding::Location { location, .. }) = &member.binding else {
                            continue;
                        };
                        let name = member.name.clone().ok_or_else(|| {
                            link(format!("unnamed vertex input at location {location}"))
                        })?;
                        let format = vertex_format(&module.types[member.ty].inner).ok_or_else(|| {
                            link(format!("vertex input `{name}` has an unsupported type"))
                        })?;
                        vertex_inputs.push(VertexInput { name, location: *location, format });
                    }
                }
            }
        }
        vertex_inputs.sort_by_key(|v| v.location);

        let mut uniform_blocks = Vec::new();
        let mut images: Vec<(String, u32)> = Vec::new();
        let mut samplers: Vec<(String, u32)> = Vec::new();

        for (_, var) in module.global_variables.iter() {
            let Some(binding) = &var.binding else { continue };
            let name = var.name.clone().unwrap_or_default();
            if binding.group != 0 {
                return Err(link(format!(
                    "`{name}` is in bind group {}; only group 0 is supported",
                    binding.group
                )));
            }

            match (var.space, &module.types[var.ty].inner) {
                (AddressSpace::Uniform, TypeInner::Struct { members, span }) => {
                    let members = members
                        .iter()
                        .filter_map(|m| {
                            let shape = uniform_shape(&module.types[m.ty].inner);
                            if shape.is_none() {
                                log::debug!(
                                    "program `{program}`: uniform member {:?} has an unsupported type; not settable",
                                    m.name
                                );
                            }
                            Some(UniformMember {
                                name: m.name.clone()?,
                                offset: m.offset,
                                shape: shape?,
                            })
                        })
                        .collect();
                    uniform_blocks.push(UniformBlock {
                        name,
                        binding: binding.binding,
                        size: *span,
                        members,
                    });
                }
                (
                    AddressSpace::Handle,
                    TypeInner::Image {
                        dim: ImageDimension::D2,
                        arrayed: false,
                        class: ImageClass::Sampled { kind: ScalarKind::Float, multi: false },
                    },
                ) => images.push((name, binding.binding)),
                (AddressSpace::Handle, TypeInner::Sampler { comparison: false }) => {
                    samplers.push((name, binding.binding))
                }
                _ => {
                    return Err(link(format!(
                        "resource `{name}` has an unsupported type; expected a uniform struct, \
                         texture_2d<f32> or sampler"
                    )));
                }
            }
        }

        let mut textures = Vec::with_capacity(images.len());
        for (name, binding) in images {
            let sampler_name = format!("{name}{SAMPLER_SUFFIX}");
            let Some(pos) = samplers.iter().position(|(s, _)| *s == sampler_name) else {
                return Err(link(format!("texture `{name}` has no `{sampler_name}`")));
            };
            let (_, sampler_binding) = samplers.swap_remove(pos);
            textures.push(TextureBinding { name, binding, sampler_binding });
        }
        if let Some((orphan, _)) = samplers.first() {
            return Err(link(format!("sampler `{orphan}` has no matching texture")));
        }

        log::debug!(
            "program `{program}` reflected: {} vertex inputs, {} uniform blocks, {} textures",
            vertex_inputs.len(),
            uniform_blocks.len(),
            textures.len()
        );

        Ok(Self {
            label: program,
            source: composed,
            vertex_inputs,
            uniform_blocks,
            textures,
        })
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// The composed WGSL handed to the device.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Vertex inputs ordered by location. The index into this slice is the
    /// vertex buffer slot the attribute is fed from.
    pub fn vertex_inputs(&self) -> &[VertexInput] {
        &self.vertex_inputs
    }

    /// Resolves an attribute name to its vertex buffer slot.
    pub fn vertex_slot(&self, name: &str) -> Option<usize> {
        self.vertex_inputs.iter().position(|v| v.name == name)
    }

    pub fn uniform_blocks(&self) -> &[UniformBlock] {
        &self.uniform_blocks
    }

    /// Finds a uniform member by name across all blocks: `(block index, member)`.
    pub fn uniform(&self, name: &str) -> Option<(usize, &UniformMember)> {
        self.uniform_blocks
            .iter()
            .enumerate()
            .find_map(|(i, b)| b.member(name).map(|m| (i, m)))
    }

    pub fn textures(&self) -> &[TextureBinding] {
        &self.textures
    }

    pub fn texture_slot(&self, name: &str) -> Option<usize> {
        self.textures.iter().position(|t| t.name == name)
    }
}

fn vertex_format(inner: &TypeInner) -> Option<wgpu::VertexFormat> {
    match inner {
        TypeInner::Scalar(s) if *s == naga::Scalar::F32 => Some(wgpu::VertexFormat::Float32),
        TypeInner::Vector { size, scalar } if *scalar == naga::Scalar::F32 => Some(match size {
            naga::VectorSize::Bi => wgpu::VertexFormat::Float32x2,
            naga::VectorSize::Tri => wgpu::VertexFormat::Float32x3,
            naga::VectorSize::Quad => wgpu::VertexFormat::Float32x4,
        }),
        _ => None,
    }
}

fn uniform_shape(inner: &TypeInner) -> Option<UniformShape> {
    match inner {
        TypeInner::Scalar(s) if *s == naga::Scalar::F32 => Some(UniformShape::Float),
        TypeInner::Vector { size, scalar } if *scalar == naga::Scalar::F32 => Some(match size {
            naga::VectorSize::Bi => UniformShape::Vec2,
            naga::VectorSize::Tri => UniformShape::Vec3,
            naga::VectorSize::Quad => UniformShape::Vec4,
        }),
        TypeInner::Matrix {
            columns: naga::VectorSize::Quad,
            rows: naga::VectorSize::Quad,
            scalar,
        } if *scalar == naga::Scalar::F32 => Some(UniformShape::Mat4),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

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

    const FRAGMENT: &str = r#"
struct Params {
    size: vec2<f32>,
    scale: f32,
    light: vec3<f32>,
    view: mat4x4<f32>,
}

@group(0) @binding(0) var<uniform> params: Params;
@group(0) @binding(1) var tex: texture_2d<f32>;
@group(0) @binding(2) var tex_sampler: sampler;

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    let c = textureSample(tex, tex_sampler, in.uv);
    return c * params.scale + vec4<f32>(params.light, params.size.x) + params.view[0];
}
"#;

    fn source<'a>(vertex: &'a str, fragment: &'a str) -> ProgramSource<'a> {
        ProgramSource { label: "test", vertex, geometry: None, fragment }
    }

    #[test]
    fn reflects_vertex_inputs_in_location_order() {
        let layout = ProgramLayout::reflect(&source(VERTEX, FRAGMENT)).unwrap();
        let names: Vec<_> = layout.vertex_inputs().iter().map(|v| v.name.as_str()).collect();
        assert_eq!(names, ["scr_pos", "vert_uv_pos"]);
        assert_eq!(layout.vertex_slot("vert_uv_pos"), Some(1));
        assert_eq!(layout.vertex_inputs()[0].format, wgpu::VertexFormat::Float32x2);
        assert_eq!(layout.vertex_slot("missing"), None);
    }

    #[test]
    fn reflects_uniform_members_with_wgsl_offsets() {
        let layout = ProgramLayout::reflect(&source(VERTEX, FRAGMENT)).unwrap();
        let block = &layout.uniform_blocks()[0];
        assert_eq!(block.binding, 0);

        let (_, size) = layout.uniform("size").unwrap();
        let (_, scale) = layout.uniform("scale").unwrap();
        let (_, light) = layout.uniform("light").unwrap();
        let (_, view) = layout.uniform("view").unwrap();
        assert_eq!((size.offset, size.shape), (0, UniformShape::Vec2));
        assert_eq!((scale.offset, scale.shape), (8, UniformShape::Float));
        // vec3 aligns to 16
        assert_eq!((light.offset, light.shape), (16, UniformShape::Vec3));
        assert_eq!((view.offset, view.shape), (32, UniformShape::Mat4));
        assert_eq!(block.size, 96);
        assert!(layout.uniform("nope").is_none());
    }

    #[test]
    fn pairs_textures_with_samplers() {
        let layout = ProgramLayout::reflect(&source(VERTEX, FRAGMENT)).unwrap();
        assert_eq!(
            layout.textures(),
            &[TextureBinding { name: "tex".into(), binding: 1, sampler_binding: 2 }]
        );
    }

    #[test]
    fn fragment_syntax_error_is_a_fragment_compile_error() {
        let err = ProgramLayout::reflect(&source(VERTEX, "fn fs_main( {")).unwrap_err();
        match err {
            ProgramError::Compile { stage, diagnostic, .. } => {
                assert_eq!(stage, Stage::Fragment);
                assert!(!diagnostic.is_empty());
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn vertex_syntax_error_is_a_vertex_compile_error() {
        let err = ProgramLayout::reflect(&source("@vertex fn vs_main( ->", FRAGMENT)).unwrap_err();
        assert!(matches!(err, ProgramError::Compile { stage: Stage::Vertex, .. }));
    }

    #[test]
    fn type_error_is_a_link_error() {
        let bad = r#"
@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    let x: f32 = in.uv;
    return vec4<f32>(x);
}
"#;
        let err = ProgramLayout::reflect(&source(VERTEX, bad)).unwrap_err();
        assert!(
            matches!(err, ProgramError::Compile { .. } | ProgramError::Link { .. }),
            "{err}"
        );
    }

    #[test]
    fn missing_fragment_entry_is_a_link_error() {
        let no_entry = "fn helper() -> f32 { return 1.0; }";
        let err = ProgramLayout::reflect(&source(VERTEX, no_entry)).unwrap_err();
        assert!(matches!(err, ProgramError::Link { .. }), "{err}");
    }

    #[test]
    fn geometry_stage_is_rejected() {
        let mut src = source(VERTEX, FRAGMENT);
        src.geometry = Some("void main() {}");
        let err = ProgramLayout::reflect(&src).unwrap_err();
        assert_eq!(
            err,
            ProgramError::UnsupportedStage { program: "test".into(), stage: Stage::Geometry }
        );
    }

    #[test]
    fn texture_without_sampler_is_a_link_error() {
        let frag = r#"
@group(0) @binding(1) var pal: texture_2d<f32>;

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    return textureLoad(pal, vec2<i32>(0, 0), 0);
}
"#;
        let err = ProgramLayout::reflect(&source(VERTEX, frag)).unwrap_err();
        assert!(matches!(err, ProgramError::Link { .. }), "{err}");
    }
}
