//! GPU device and window swapchain.

mod gpu;

pub use gpu::{Acquired, Frame, Gpu, GpuInit, Recovery};
