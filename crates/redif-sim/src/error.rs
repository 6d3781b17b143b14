use std::fmt;
use std::path::PathBuf;

use redif_engine::render::{ProgramError, TextureError};

/// Errors raised by the simulation layer.
#[derive(Debug)]
pub enum SimError {
    /// Reading a file failed.
    Io { path: PathBuf, source: std::io::Error },
    /// A palette image could not be decoded.
    Image { path: PathBuf, source: image::ImageError },
    /// A configuration file is malformed.
    Config { path: PathBuf, message: String },
    /// A shader program failed to build.
    Program(ProgramError),
    /// Host data does not fit a GPU texture, or copying one back failed.
    Texture(TextureError),
    /// A field's dimensions differ from the simulation's.
    FieldSize { expected: (u32, u32), actual: (u32, u32) },
}

impl fmt::Display for SimError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, source } => write!(f, "{}: {source}", path.display()),
            Self::Image { path, source } => {
                write!(f, "{}: cannot decode image: {source}", path.display())
            }
            Self::Config { path, message } => {
                write!(f, "{}: invalid configuration: {message}", path.display())
            }
            Self::Program(e) => e.fmt(f),
            Self::Texture(e) => e.fmt(f),
            Self::FieldSize { expected, actual } => write!(
                f,
                "field is {}x{}, simulation is {}x{}",
                actual.0, actual.1, expected.0, expected.1
            ),
        }
    }
}

impl std::error::Error for SimError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Image { source, .. } => Some(source),
            Self::Config { .. } => None,
            Self::Program(e) => Some(e),
            Self::Texture(e) => Some(e),
            Self::FieldSize { .. } => None,
        }
    }
}

impl From<ProgramError> for SimError {
    fn from(e: ProgramError) -> Self {
        Self::Program(e)
    }
}

impl From<TextureError> for SimError {
    fn from(e: TextureError) -> Self {
        Self::Texture(e)
    }
}
