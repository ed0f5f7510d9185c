//! Color values shared by the runtime and renderers.

pub mod color;

pub use color::Color;
