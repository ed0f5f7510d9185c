//! GPU rendering subsystem.
//!
//! Convention:
//! - geometry is uploaded in NDC (`-1..1`, +Y up), no per-frame transforms
//! - each renderer owns its GPU resources (pipeline, buffers) for its lifetime
//! - renderers record into the frame's single pass, after its clear

pub mod geometry;
pub mod pipeline;
mod triangle;

pub use geometry::{Vertex, VertexGeometry, VertexLayout, TRIANGLE_VERTICES};
pub use pipeline::{
    build_program, compile, link, CompiledShader, LinkedProgram, PipelineError, ShaderProgram,
    ShaderStage,
};
pub use triangle::{TriangleRenderer, CLEAR_COLOR, FILL_COLOR, FRAGMENT_SHADER, VERTEX_SHADER};
