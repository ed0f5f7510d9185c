use crate::paint::Color;
use crate::render::geometry::{TRIANGLE_VERTICES, Vertex, VertexGeometry};
use crate::render::pipeline::{self, PipelineError, ShaderProgram};

pub const VERTEX_SHADER: &str = include_str!("shaders/triangle.vert.wgsl");
pub const FRAGMENT_SHADER: &str = include_str!("shaders/triangle.frag.wgsl");

/// Color the frame is cleared to before the triangle is drawn.
pub const CLEAR_COLOR: Color = Color::rgba(0.0, 0.0, 1.0, 1.0);

/// Color written by the fragment stage (mirrors `FILL_COLOR` in the shader).
pub const FILL_COLOR: Color = Color::rgba(1.0, 0.5, 0.2, 1.0);

/// Draws the fixed triangle with the fixed shader pair.
///
/// All GPU resources are created once in [`new`](Self::new) and live as long
/// as the renderer.
pub struct TriangleRenderer {
    program: ShaderProgram,
    geometry: VertexGeometry,
}

impl TriangleRenderer {
    /// Builds the shader program and uploads the vertex data.
    ///
    /// Fails if either stage does not compile or the program does not link;
    /// no GPU objects are created in that case.
    pub fn new(
        device: &wgpu::Device,
        surface_format: wgpu::TextureFormat,
    ) -> Result<Self, PipelineError> {
        let linked = pipeline::build_program(VERTEX_SHADER, FRAGMENT_SHADER, Vertex::LAYOUT)?;

        let program = ShaderProgram::new(device, "prism triangle pipeline", &linked, surface_format);
        let geometry = VertexGeometry::upload(device, "prism triangle vbo", &TRIANGLE_VERTICES);

        Ok(Self { program, geometry })
    }

    /// Draws into a pass that is already cleared and has its viewport set.
    pub fn render(&self, pass: &mut wgpu::RenderPass<'_>) {
        pass.set_pipeline(self.program.pipeline());
        self.geometry.bind(pass);
        pass.draw(0..self.geometry.vertex_count(), 0..1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shader_fill_matches_fill_color() {
        assert!(FRAGMENT_SHADER.contains("vec4<f32>(1.0, 0.5, 0.2, 1.0)"));
        assert_eq!(FILL_COLOR, Color::rgba(1.0, 0.5, 0.2, 1.0));
    }

    #[test]
    fn clear_color_is_opaque_blue() {
        assert_eq!(CLEAR_COLOR, Color::rgba(0.0, 0.0, 1.0, 1.0));
    }

    #[test]
    fn fixed_sources_build_a_program() {
        assert!(pipeline::build_program(VERTEX_SHADER, FRAGMENT_SHADER, Vertex::LAYOUT).is_ok());
    }
}
