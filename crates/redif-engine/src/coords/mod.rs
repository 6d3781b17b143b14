//! Coordinate types shared by the runtime and the simulation.
//!
//! Screen space:
//! - origin top-left
//! - +X right, +Y down
//!
//! Window input arrives in logical pixels; surfaces and field textures are in
//! physical pixels. [`Viewport::map_to`] converts between the two.

mod vec2;
mod viewport;

pub use vec2::Vec2;
pub use viewport::Viewport;
