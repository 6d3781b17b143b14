//! redif simulator crate.
//!
//! A Gray-Scott reaction-diffusion field evolved on the GPU by a ping-pong
//! feedback loop of fragment programs, with an interactive parameter-space
//! view: feed and kill vary across the window, so one frame shows a whole
//! region of the pattern map.
//!
//! - [`Feedback`]: the two field textures and the loop/compute/render passes
//! - [`ViewState`]: pan/zoom over (kill, feed), brush and light parameters
//! - [`Controls`]: window input to view changes
//! - [`Simulator`]: the windowed application tying them together

pub mod app;
pub mod config;
pub mod controls;
mod error;
pub mod feedback;
pub mod field;
pub mod palette;
pub mod shaders;
pub mod view;

pub use app::Simulator;
pub use config::SimConfig;
pub use controls::Controls;
pub use error::SimError;
pub use feedback::{Buffer, Feedback, FeedbackDesc};
pub use field::{texel_in_disc, Field};
pub use view::{Brush, ViewState};
