//! Coordinate types shared between the runtime and renderers.
//!
//! Geometry handed to the GPU is already in NDC (`-1..1`, +Y up); the only
//! pixel-space type is the drawable viewport.

mod viewport;

pub use viewport::Viewport;
