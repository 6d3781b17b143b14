use std::fmt;

/// Programmable pipeline stage named in construction errors.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Stage {
    Vertex,
    Geometry,
    Fragment,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Vertex => "vertex",
            Stage::Geometry => "geometry",
            Stage::Fragment => "fragment",
        };
        f.write_str(name)
    }
}

/// Fatal error raised while building a [`Program`](super::Program) or a
/// [`Quad`](super::Quad) bound to it.
///
/// `diagnostic` carries the shader front end's rendered report (source excerpt
/// and caret), ready to print as-is.
#[derive(Debug, Clone, PartialEq)]
pub enum ProgramError {
    /// A stage failed to parse.
    Compile {
        program: String,
        stage: Stage,
        diagnostic: String,
    },
    /// The composed module failed validation or lacks a required entry point
    /// or binding convention.
    Link { program: String, diagnostic: String },
    /// The backend has no such stage.
    UnsupportedStage { program: String, stage: Stage },
    /// Vertex data names an attribute the vertex stage does not consume.
    AttributeNotFound { program: String, attribute: String },
    /// The vertex stage consumes an attribute that no vertex data was given for.
    AttributeUnbound { program: String, attribute: String },
    /// Vertex data shape differs from the attribute's declared type.
    AttributeFormat {
        program: String,
        attribute: String,
        expected: wgpu::VertexFormat,
        actual: wgpu::VertexFormat,
    },
    /// Attribute arrays disagree on the number of vertices.
    VertexCountMismatch { program: String, attribute: String, expected: usize, actual: usize },
}

impl fmt::Display for ProgramError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Compile { program, stage, diagnostic } => {
                write!(f, "program `{program}`: {stage} stage compilation error\n{diagnostic}")
            }
            Self::Link { program, diagnostic } => {
                write!(f, "program `{program}`: link error\n{diagnostic}")
            }
            Self::UnsupportedStage { program, stage } => {
                write!(f, "program `{program}`: {stage} stage is not supported by this backend")
            }
            Self::AttributeNotFound { program, attribute } => {
                write!(f, "program `{program}`: attribute `{attribute}` not found")
            }
            Self::AttributeUnbound { program, attribute } => {
                write!(f, "program `{program}`: attribute `{attribute}` has no vertex data")
            }
            Self::AttributeFormat { program, attribute, expected, actual } => write!(
                f,
                "program `{program}`: attribute `{attribute}` expects {expected:?}, got {actual:?}"
            ),
            Self::VertexCountMismatch { program, attribute, expected, actual } => write!(
                f,
                "program `{program}`: attribute `{attribute}` has {actual} vertices, expected {expected}"
            ),
        }
    }
}

impl std::error::Error for ProgramError {}

/// Error raised by host-side texel transfers.
#[derive(Debug, Clone, PartialEq)]
pub enum TextureError {
    /// Host data length does not match `width * height` (texels or bytes).
    SizeMismatch { expected: usize, actual: usize },
    /// The operation requires a floating-point texture.
    NotFloat { label: String },
    /// Mapping the staging buffer failed.
    Readback(String),
}

impl fmt::Display for TextureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SizeMismatch { expected, actual } => {
                write!(f, "texel data has length {actual}, expected {expected}")
            }
            Self::NotFloat { label } => {
                write!(f, "texture `{label}` is not a floating-point texture")
            }
            Self::Readback(msg) => write!(f, "texture readback failed: {msg}"),
        }
    }
}

impl std::error::Error for TextureError {}
