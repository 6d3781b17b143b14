//! redif engine crate.
//!
//! Platform + GPU runtime underneath the simulator: device and surface
//! management, the window loop, input, frame timing, logging, and the GPU
//! resource layer (`render`) that fragment-program pipelines are built from.

pub mod coords;
pub mod core;
pub mod device;
pub mod input;
pub mod logging;
pub mod render;
pub mod time;
pub mod window;
