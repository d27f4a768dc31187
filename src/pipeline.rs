use std::fmt::{Display, Formatter};

use serde::Serialize;
use thiserror::Error;

use gl_wrapper::device::Device;
use gl_wrapper::geometry::{upload_attribute, AttributeBuffer, GeometryError};
use gl_wrapper::program::{ProgramBuilder, ProgramError, ShaderKind};
use gl_wrapper::renderer::{draw, init_surface, DrawError, SurfaceState};

use crate::scene::{Scene, SceneError};
use crate::sources::{ShaderLibrary, ShaderSource};
use crate::transform::TransformSet;

/// How far the one-shot draw sequence got.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Stage {
    Uninitialized,
    ContextReady,
    ProgramLinked,
    BuffersBound,
    FrameDrawn,
}

impl Display for Stage {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Stage::Uninitialized => "uninitialized",
            Stage::ContextReady => "context ready",
            Stage::ProgramLinked => "program linked",
            Stage::BuffersBound => "buffers bound",
            Stage::FrameDrawn => "frame drawn",
        };

        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum StepError {
    #[error(transparent)]
    Scene(#[from] SceneError),
    #[error(transparent)]
    Program(#[from] ProgramError),
    #[error(transparent)]
    Geometry(#[from] GeometryError),
    #[error(transparent)]
    Draw(#[from] DrawError),
}

#[derive(Debug, Error)]
#[error("pipeline stopped at `{stage}`: {source}")]
pub struct PipelineError {
    pub stage: Stage,
    pub source: StepError,
}

trait AtStage<T> {
    fn at(self, stage: Stage) -> Result<T, PipelineError>;
}

impl<T, E: Into<StepError>> AtStage<T> for Result<T, E> {
    fn at(self, stage: Stage) -> Result<T, PipelineError> {
        self.map_err(|e| PipelineError {
            stage,
            source: e.into(),
        })
    }
}

#[derive(Debug)]
pub struct FrameReport {
    pub stage: Stage,
    pub vertices: usize,
    pub attributes: Vec<AttributeBuffer>,
    pub mvp: [f32; 16],
}

/// What a scene would draw, worked out without touching a device.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub vertices: usize,
    pub attributes: Vec<(String, u8)>,
    pub vertex_shader: String,
    pub fragment_shader: String,
    pub mvp: [f32; 16],
}

struct Checked<'a> {
    vertices: usize,
    vert: &'a ShaderSource,
    frag: &'a ShaderSource,
}

// Everything that can fail before the first device call.
fn preflight<'a>(scene: &Scene, library: &'a ShaderLibrary) -> Result<Checked<'a>, StepError> {
    let vertices = scene.validate()?;

    let vert = library.get(&scene.shaders.vertex.id)?;
    let frag = library.get(&scene.shaders.fragment.id)?;

    for (expected, source) in [(ShaderKind::Vertex, vert), (ShaderKind::Fragment, frag)] {
        let found = source.kind()?;

        if found != expected {
            return Err(ProgramError::KindMismatch { expected, found }.into());
        }
    }

    Ok(Checked {
        vertices,
        vert,
        frag,
    })
}

/// Validates `scene` against `library` and composes its transform.
pub fn summarize(scene: &Scene, library: &ShaderLibrary) -> Result<Summary, PipelineError> {
    let checked = preflight(scene, library).at(Stage::Uninitialized)?;
    let transforms = TransformSet::compose(&scene.camera, &scene.projection, scene.aspect());

    Ok(Summary {
        vertices: checked.vertices,
        attributes: scene
            .attributes
            .iter()
            .map(|a| (a.name.clone(), a.components))
            .collect(),
        vertex_shader: checked.vert.id.clone(),
        fragment_shader: checked.frag.id.clone(),
        mvp: transforms.combined_columns(),
    })
}

/// Drives `scene` through clear, program build, attribute upload, transform
/// composition and the draw call, in that order and exactly once.
///
/// The scene, its shader tags and slot kinds are validated before the first
/// device call.
pub fn draw_once<D: Device>(
    device: &mut D,
    scene: &Scene,
    library: &ShaderLibrary,
) -> Result<FrameReport, PipelineError> {
    let mut stage = Stage::Uninitialized;

    let Checked {
        vertices,
        vert,
        frag,
    } = preflight(scene, library).at(stage)?;

    init_surface(device, &SurfaceState::from(scene.surface));
    advance(&mut stage, Stage::ContextReady);

    let program = ProgramBuilder::new(&vert.text, &frag.text)
        .build(device)
        .at(stage)?;
    advance(&mut stage, Stage::ProgramLinked);

    let attributes = scene
        .vertex_attributes()
        .into_iter()
        .map(|attr| upload_attribute(device, &program, attr))
        .collect::<Result<Vec<_>, _>>()
        .at(stage)?;
    advance(&mut stage, Stage::BuffersBound);

    let transforms = TransformSet::compose(&scene.camera, &scene.projection, scene.aspect());
    let mvp = transforms.combined_columns();

    draw(device, &program, &scene.uniform, &mvp, vertices).at(stage)?;
    advance(&mut stage, Stage::FrameDrawn);

    Ok(FrameReport {
        stage,
        vertices,
        attributes,
        mvp,
    })
}

fn advance(stage: &mut Stage, next: Stage) {
    tracing::debug!(from = %stage, to = %next, "pipeline advanced");
    *stage = next;
}
