//! Core engine-facing contracts.
//!
//! This module defines the interface between the runtime (platform loop)
//! and the application, and the loop lifecycle both sides observe.

mod app;
mod ctx;

pub use app::{App, AppControl, LoopState};
pub use ctx::FrameCtx;
