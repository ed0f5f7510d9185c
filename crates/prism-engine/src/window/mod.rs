//! Window + runtime loop.
//!
//! Owns the `winit` EventLoop and Window, and wires them to the GPU layer.

mod frame_state;
mod runtime;

pub use runtime::{Runtime, RuntimeConfig};
