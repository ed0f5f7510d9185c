//! Shader compile + link.
//!
//! Each stage is compiled on the CPU with naga (parse + validate). Linking
//! checks the interface between the vertex layout, the vertex stage and the
//! fragment stage. Only a successfully linked program can be turned into a
//! `wgpu::RenderPipeline`, so a failed build never reaches the draw call.

use std::collections::BTreeMap;
use std::fmt;

use naga::{
    Binding, BuiltIn, Handle, Interpolation, Sampling, ScalarKind, Type, TypeInner, VectorSize,
};

use super::geometry::VertexLayout;

/// Upper bound on the size of a compile/link diagnostic, in bytes.
pub const INFO_LOG_LIMIT: usize = 512;

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl ShaderStage {
    fn to_naga(self) -> naga::ShaderStage {
        match self {
            ShaderStage::Vertex => naga::ShaderStage::Vertex,
            ShaderStage::Fragment => naga::ShaderStage::Fragment,
        }
    }
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderStage::Vertex => f.write_str("vertex"),
            ShaderStage::Fragment => f.write_str("fragment"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("{stage} shader failed to compile:\n{log}")]
    Compile { stage: ShaderStage, log: String },

    #[error("shader program failed to link:\n{log}")]
    Link { log: String },
}

/// One user-defined `@location` of a stage interface.
#[derive(Debug, Copy, Clone, PartialEq)]
struct Slot {
    /// Attribute format, when the type maps onto one.
    format: Option<wgpu::VertexFormat>,
    interpolation: Interpolation,
    /// `None` for flat slots, where sampling has no effect.
    sampling: Option<Sampling>,
}

impl Slot {
    fn new(inner: &TypeInner, interpolation: Option<Interpolation>, sampling: Option<Sampling>) -> Self {
        let interpolation = interpolation.unwrap_or(match inner.scalar_kind() {
            Some(ScalarKind::Float) => Interpolation::Perspective,
            _ => Interpolation::Flat,
        });
        let sampling = match interpolation {
            Interpolation::Flat => None,
            _ => Some(sampling.unwrap_or(Sampling::Center)),
        };
        Self {
            format: attribute_format(inner),
            interpolation,
            sampling,
        }
    }
}

/// Inputs or outputs of one stage, keyed by `@location`.
#[derive(Debug, Default, Clone, PartialEq)]
struct StageIo {
    locations: BTreeMap<u32, Slot>,
    position: bool,
}

/// A compiled, not yet linked, shader unit.
///
/// Consumed by [`link`]; nothing else can be done with it.
#[derive(Debug)]
pub struct CompiledShader {
    stage: ShaderStage,
    source: String,
    entry_point: String,
    inputs: StageIo,
    outputs: StageIo,
}

impl CompiledShader {
    pub fn stage(&self) -> ShaderStage {
        self.stage
    }

    pub fn entry_point(&self) -> &str {
        &self.entry_point
    }
}

/// Source and entry point of one stage of a linked program.
#[derive(Debug, Clone)]
pub struct LinkedStage {
    pub source: String,
    pub entry_point: String,
}

/// A vertex + fragment pair whose interfaces are known to match.
#[derive(Debug, Clone)]
pub struct LinkedProgram {
    vertex: LinkedStage,
    fragment: LinkedStage,
    layout: VertexLayout,
}

impl LinkedProgram {
    pub fn vertex(&self) -> &LinkedStage {
        &self.vertex
    }

    pub fn fragment(&self) -> &LinkedStage {
        &self.fragment
    }

    pub fn layout(&self) -> VertexLayout {
        self.layout
    }
}

/// Compiles one WGSL stage.
///
/// The source must contain exactly one entry point for `stage`.
pub fn compile(stage: ShaderStage, source: &str) -> Result<CompiledShader, PipelineError> {
    let fail = |log: String| PipelineError::Compile {
        stage,
        log: bound_log(log),
    };

    let module = naga::front::wgsl::parse_str(source).map_err(|e| fail(e.emit_to_string(source)))?;

    naga::valid::Validator::new(
        naga::valid::ValidationFlags::all(),
        naga::valid::Capabilities::empty(),
    )
    .validate(&module)
    .map_err(|e| fail(e.emit_to_string(source)))?;

    let mut entry_points = module
        .entry_points
        .iter()
        .filter(|ep| ep.stage == stage.to_naga());

    let ep = entry_points
        .next()
        .ok_or_else(|| fail(format!("no {stage} entry point")))?;
    if entry_points.next().is_some() {
        return Err(fail(format!("more than one {stage} entry point")));
    }

    let mut inputs = StageIo::default();
    for arg in &ep.function.arguments {
        collect_io(&module, arg.binding.as_ref(), arg.ty, &mut inputs);
    }

    let mut outputs = StageIo::default();
    if let Some(result) = &ep.function.result {
        collect_io(&module, result.binding.as_ref(), result.ty, &mut outputs);
    }

    log::debug!("compiled {stage} shader, entry point `{}`", ep.name);

    Ok(CompiledShader {
        stage,
        source: source.to_owned(),
        entry_point: ep.name.clone(),
        inputs,
        outputs,
    })
}

/// Links a vertex and a fragment unit against the vertex buffer layout.
///
/// Both units are consumed whether or not linking succeeds.
pub fn link(
    vertex: CompiledShader,
    fragment: CompiledShader,
    layout: VertexLayout,
) -> Result<LinkedProgram, PipelineError> {
    let mut problems = Vec::new();

    if vertex.stage != ShaderStage::Vertex {
        problems.push(format!("expected a vertex unit, got a {} unit", vertex.stage));
    }
    if fragment.stage != ShaderStage::Fragment {
        problems.push(format!("expected a fragment unit, got a {} unit", fragment.stage));
    }

    for (&location, slot) in &vertex.inputs.locations {
        match layout.format_at(location) {
            None => problems.push(format!(
                "vertex input @location({location}) is not provided by the vertex layout"
            )),
            Some(provided) if Some(provided) != slot.format => problems.push(format!(
                "vertex input @location({location}) expects {}, layout provides {provided:?}",
                describe(slot.format)
            )),
            Some(_) => {}
        }
    }

    if !vertex.outputs.position {
        problems.push("vertex stage does not write @builtin(position)".to_string());
    }

    for (&location, read) in &fragment.inputs.locations {
        let Some(written) = vertex.outputs.locations.get(&location) else {
            problems.push(format!(
                "fragment input @location({location}) is not written by the vertex stage"
            ));
            continue;
        };
        if written.format != read.format {
            problems.push(format!(
                "fragment input @location({location}) is {}, vertex stage writes {}",
                describe(read.format),
                describe(written.format)
            ));
        }
        if (written.interpolation, written.sampling) != (read.interpolation, read.sampling) {
            problems.push(format!(
                "@location({location}) is interpolated {:?}/{:?} by the vertex stage but {:?}/{:?} by the fragment stage",
                written.interpolation, written.sampling, read.interpolation, read.sampling
            ));
        }
    }

    if !fragment.outputs.locations.contains_key(&0) {
        problems.push("fragment stage does not write color target @location(0)".to_string());
    }

    if !problems.is_empty() {
        return Err(PipelineError::Link {
            log: bound_log(problems.join("\n")),
        });
    }

    log::debug!(
        "linked program `{}` + `{}`",
        vertex.entry_point,
        fragment.entry_point
    );

    Ok(LinkedProgram {
        vertex: LinkedStage {
            source: vertex.source,
            entry_point: vertex.entry_point,
        },
        fragment: LinkedStage {
            source: fragment.source,
            entry_point: fragment.entry_point,
        },
        layout,
    })
}

/// Compiles both stages and links them.
pub fn build_program(
    vertex_source: &str,
    fragment_source: &str,
    layout: VertexLayout,
) -> Result<LinkedProgram, PipelineError> {
    let vertex = compile(ShaderStage::Vertex, vertex_source)?;
    let fragment = compile(ShaderStage::Fragment, fragment_source)?;
    link(vertex, fragment, layout)
}

/// The executable render pipeline of a linked program.
pub struct ShaderProgram {
    pipeline: wgpu::RenderPipeline,
}

impl ShaderProgram {
    /// Creates the GPU pipeline rendering triangle lists into `target_format`.
    pub fn new(
        device: &wgpu::Device,
        label: &str,
        program: &LinkedProgram,
        target_format: wgpu::TextureFormat,
    ) -> Self {
        let vs_module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(label),
            source: wgpu::ShaderSource::Wgsl(program.vertex.source.as_str().into()),
        });
        let fs_module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(label),
            source: wgpu::ShaderSource::Wgsl(program.fragment.source.as_str().into()),
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some(label),
            bind_group_layouts: &[],
            immediate_size: 0,
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(label),
            layout: Some(&pipeline_layout),

            vertex: wgpu::VertexState {
                module: &vs_module,
                entry_point: Some(program.vertex.entry_point.as_str()),
                compilation_options: Default::default(),
                buffers: &[program.layout.to_wgpu()],
            },

            fragment: Some(wgpu::FragmentState {
                module: &fs_module,
                entry_point: Some(program.fragment.entry_point.as_str()),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: target_format,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),

            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },

            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });

        log::info!("created render pipeline \"{label}\" for {target_format:?}");

        Self { pipeline }
    }

    pub fn pipeline(&self) -> &wgpu::RenderPipeline {
        &self.pipeline
    }
}

fn collect_io(module: &naga::Module, binding: Option<&Binding>, ty: Handle<Type>, io: &mut StageIo) {
    let inner = &module.types[ty].inner;
    match binding {
        Some(Binding::Location {
            location,
            interpolation,
            sampling,
            ..
        }) => {
            io.locations
                .insert(*location, Slot::new(inner, *interpolation, *sampling));
        }
        Some(Binding::BuiltIn(BuiltIn::Position { .. })) => io.position = true,
        Some(Binding::BuiltIn(_)) => {}
        None => {
            if let TypeInner::Struct { members, .. } = inner {
                for member in members {
                    collect_io(module, member.binding.as_ref(), member.ty, io);
                }
            }
        }
    }
}

fn attribute_format(inner: &TypeInner) -> Option<wgpu::VertexFormat> {
    use wgpu::VertexFormat as F;

    let (scalar, components) = match *inner {
        TypeInner::Scalar(scalar) => (scalar, 1),
        TypeInner::Vector { size, scalar } => {
            let n = match size {
                VectorSize::Bi => 2,
                VectorSize::Tri => 3,
                VectorSize::Quad => 4,
            };
            (scalar, n)
        }
        _ => return None,
    };

    if scalar.width != 4 {
        return None;
    }

    Some(match (scalar.kind, components) {
        (ScalarKind::Float, 1) => F::Float32,
        (ScalarKind::Float, 2) => F::Float32x2,
        (ScalarKind::Float, 3) => F::Float32x3,
        (ScalarKind::Float, 4) => F::Float32x4,
        (ScalarKind::Sint, 1) => F::Sint32,
        (ScalarKind::Sint, 2) => F::Sint32x2,
        (ScalarKind::Sint, 3) => F::Sint32x3,
        (ScalarKind::Sint, 4) => F::Sint32x4,
        (ScalarKind::Uint, 1) => F::Uint32,
        (ScalarKind::Uint, 2) => F::Uint32x2,
        (ScalarKind::Uint, 3) => F::Uint32x3,
        (ScalarKind::Uint, 4) => F::Uint32x4,
        _ => return None,
    })
}

fn describe(format: Option<wgpu::VertexFormat>) -> String {
    match format {
        Some(f) => format!("{f:?}"),
        None => "a non-attribute type".to_string(),
    }
}

/// Truncates `log` to [`INFO_LOG_LIMIT`] bytes on a char boundary.
fn bound_log(mut log: String) -> String {
    if log.len() > INFO_LOG_LIMIT {
        let mut end = INFO_LOG_LIMIT;
        while !log.is_char_boundary(end) {
            end -= 1;
        }
        log.truncate(end);
    }
    log
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::geometry::Vertex;

    const VS: &str = include_str!("shaders/triangle.vert.wgsl");
    const FS: &str = include_str!("shaders/triangle.frag.wgsl");

    #[test]
    fn triangle_stages_compile() {
        let vs = compile(ShaderStage::Vertex, VS).expect("vertex shader compiles");
        assert_eq!(vs.stage(), ShaderStage::Vertex);
        assert_eq!(vs.entry_point(), "vs_main");

        let fs = compile(ShaderStage::Fragment, FS).expect("fragment shader compiles");
        assert_eq!(fs.entry_point(), "fs_main");
    }

    #[test]
    fn triangle_program_links() {
        let program = build_program(VS, FS, Vertex::LAYOUT).expect("program links");
        assert_eq!(program.vertex().entry_point, "vs_main");
        assert_eq!(program.fragment().entry_point, "fs_main");
        assert_eq!(program.layout(), Vertex::LAYOUT);
    }

    #[test]
    fn syntax_error_fails_compile_for_that_stage() {
        let broken = "@fragment fn fs_main() -> @location(0) vec4<f32> { return vec4<f32>(1.0 }";
        match compile(ShaderStage::Fragment, broken) {
            Err(PipelineError::Compile { stage, log }) => {
                assert_eq!(stage, ShaderStage::Fragment);
                assert!(!log.is_empty());
            }
            other => panic!("expected compile error, got {other:?}"),
        }
    }

    #[test]
    fn type_error_fails_validation() {
        let bad = "@vertex fn vs_main() -> @builtin(position) vec4<f32> { return 1u; }";
        assert!(matches!(
            compile(ShaderStage::Vertex, bad),
            Err(PipelineError::Compile { stage: ShaderStage::Vertex, .. })
        ));
    }

    #[test]
    fn missing_entry_point_is_a_compile_error() {
        let err = compile(ShaderStage::Vertex, FS).unwrap_err();
        assert!(err.to_string().contains("no vertex entry point"), "{err}");
    }

    #[test]
    fn fragment_input_not_written_by_vertex_fails_link() {
        let fs = "@fragment fn fs_main(@location(1) tint: vec4<f32>) -> @location(0) vec4<f32> { return tint; }";
        let vs = compile(ShaderStage::Vertex, VS).unwrap();
        let fs = compile(ShaderStage::Fragment, fs).unwrap();

        match link(vs, fs, Vertex::LAYOUT) {
            Err(PipelineError::Link { log }) => assert!(log.contains("@location(1)"), "{log}"),
            other => panic!("expected link error, got {other:?}"),
        }
    }

    #[test]
    fn vertex_input_format_must_match_layout() {
        let vs = "@vertex fn vs_main(@location(0) p: vec2<f32>) -> @builtin(position) vec4<f32> { return vec4<f32>(p, 0.0, 1.0); }";
        let vs = compile(ShaderStage::Vertex, vs).unwrap();
        let fs = compile(ShaderStage::Fragment, FS).unwrap();

        let err = link(vs, fs, Vertex::LAYOUT).unwrap_err();
        assert!(matches!(err, PipelineError::Link { .. }));
        assert!(err.to_string().contains("Float32x2"), "{err}");
    }

    #[test]
    fn struct_outputs_feed_fragment_inputs() {
        let vs = r#"
            struct VsOut {
                @builtin(position) pos: vec4<f32>,
                @location(0) uv: vec2<f32>,
            };

            @vertex
            fn vs_main(@location(0) p: vec3<f32>) -> VsOut {
                var out: VsOut;
                out.pos = vec4<f32>(p, 1.0);
                out.uv = p.xy;
                return out;
            }
        "#;
        let fs = "@fragment fn fs_main(@location(0) uv: vec2<f32>) -> @location(0) vec4<f32> { return vec4<f32>(uv, 0.0, 1.0); }";

        let vs = compile(ShaderStage::Vertex, vs).unwrap();
        let fs = compile(ShaderStage::Fragment, fs).unwrap();
        assert!(link(vs, fs, Vertex::LAYOUT).is_ok());
    }

    #[test]
    fn interpolation_mismatch_fails_link() {
        let vs = r#"
            struct VsOut {
                @builtin(position) pos: vec4<f32>,
                @location(0) @interpolate(flat) tint: vec4<f32>,
            };

            @vertex
            fn vs_main(@location(0) p: vec3<f32>) -> VsOut {
                var out: VsOut;
                out.pos = vec4<f32>(p, 1.0);
                out.tint = vec4<f32>(1.0);
                return out;
            }
        "#;
        let fs = "@fragment fn fs_main(@location(0) tint: vec4<f32>) -> @location(0) vec4<f32> { return tint; }";

        let vs = compile(ShaderStage::Vertex, vs).unwrap();
        let fs = compile(ShaderStage::Fragment, fs).unwrap();

        match link(vs, fs, Vertex::LAYOUT) {
            Err(PipelineError::Link { log }) => assert!(log.contains("interpolated Flat"), "{log}"),
            other => panic!("expected link error, got {other:?}"),
        }
    }

    #[test]
    fn swapped_units_fail_link() {
        let vs = compile(ShaderStage::Vertex, VS).unwrap();
        let fs = compile(ShaderStage::Fragment, FS).unwrap();
        let err = link(fs, vs, Vertex::LAYOUT).unwrap_err();
        assert!(err.to_string().contains("expected a vertex unit"), "{err}");
    }

    #[test]
    fn diagnostics_are_bounded() {
        let log = bound_log("é".repeat(INFO_LOG_LIMIT));
        assert!(log.len() <= INFO_LOG_LIMIT);
        assert!(log.chars().all(|c| c == 'é'));

        assert_eq!(bound_log("short".into()), "short");
    }

    #[test]
    fn fragment_fill_color_is_orange() {
        let module = naga::front::wgsl::parse_str(FS).unwrap();
        let (_, constant) = module
            .constants
            .iter()
            .find(|(_, c)| c.name.as_deref() == Some("FILL_COLOR"))
            .expect("FILL_COLOR constant");

        let naga::Expression::Compose { components, .. } = &module.global_expressions[constant.init]
        else {
            panic!("FILL_COLOR is not a composed vector");
        };

        let channels: Vec<f64> = components
            .iter()
            .map(|&h| match module.global_expressions[h] {
                naga::Expression::Literal(naga::Literal::F32(v)) => v as f64,
                naga::Expression::Literal(naga::Literal::AbstractFloat(v)) => v,
                ref other => panic!("unexpected component {other:?}"),
            })
            .collect();

        assert_eq!(channels, vec![1.0, 0.5, 0.2f32 as f64, 1.0]);
    }
}
