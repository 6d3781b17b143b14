//! GPU resource layer.
//!
//! Thin, name-addressed wrappers over wgpu for fragment-program pipelines:
//! textures with their samplers, off-screen targets, shader programs whose
//! inputs are resolved by reflection, and indexed quads bound to a program.
//!
//! Convention:
//! - every program renders a quad into exactly one color target per pass
//! - vertex entry `vs_main`, fragment entry `fs_main`, bind group 0
//! - texture coordinates have their origin at the top-left

mod ctx;
mod error;
mod program;
mod quad;
mod reflect;
mod target;
mod texture;
mod uniform;

pub use ctx::{RenderCtx, RenderTarget};
pub use error::{ProgramError, Stage, TextureError};
pub use program::Program;
pub use quad::{FULLSCREEN_INDICES, FULLSCREEN_POSITIONS, FULLSCREEN_UVS, Quad, VertexData};
pub use reflect::{
    FRAGMENT_ENTRY, ProgramLayout, ProgramSource, TextureBinding, UniformBlock, UniformMember,
    VERTEX_ENTRY, VertexInput,
};
pub use target::{TextureTarget, scoped_pass};
pub use texture::{Filter, Texture, TextureKind};
pub use uniform::{UniformShape, UniformValue};
