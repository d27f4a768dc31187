use std::fmt::{Display, Formatter};
use std::str::FromStr;

use thiserror::Error;

use crate::device::{Device, ProgramId, ShaderId};

pub const VERTEX_TAG: &str = "x-shader/x-vertex";
pub const FRAGMENT_TAG: &str = "x-shader/x-fragment";

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ShaderKind {
    Vertex,
    Fragment,
}

impl ShaderKind {
    /// Maps a script type tag to a shader kind. Unknown tags are an error.
    pub fn from_tag(tag: &str) -> Result<Self, ProgramError> {
        match tag {
            VERTEX_TAG => Ok(Self::Vertex),
            FRAGMENT_TAG => Ok(Self::Fragment),
            other => Err(ProgramError::UnsupportedKind(other.to_string())),
        }
    }

    pub fn tag(&self) -> &'static str {
        match self {
            Self::Vertex => VERTEX_TAG,
            Self::Fragment => FRAGMENT_TAG,
        }
    }
}

impl FromStr for ShaderKind {
    type Err = ProgramError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_tag(s)
    }
}

impl Display for ShaderKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Vertex => write!(f, "vertex"),
            Self::Fragment => write!(f, "fragment"),
        }
    }
}

#[derive(Debug, Error)]
pub enum ProgramError {
    #[error("unsupported shader kind `{0}`")]
    UnsupportedKind(String),
    #[error("{kind} shader failed to compile: {log}")]
    Compilation { kind: ShaderKind, log: String },
    #[error("program failed to link: {0}")]
    Linking(String),
    #[error("expected a {expected} shader, got a {found} shader")]
    KindMismatch {
        expected: ShaderKind,
        found: ShaderKind,
    },
}

/// A successfully compiled shader object, waiting to be linked.
#[derive(Debug)]
pub struct Shader {
    id: ShaderId,
    kind: ShaderKind,
}

impl Shader {
    pub fn id(&self) -> ShaderId {
        self.id
    }

    pub fn kind(&self) -> ShaderKind {
        self.kind
    }
}

#[derive(Debug)]
pub struct Program {
    id: ProgramId,
}

impl Program {
    pub fn id(&self) -> ProgramId {
        self.id
    }
}

fn diagnostic(log: String, fallback: &str) -> String {
    if log.trim().is_empty() {
        fallback.to_string()
    } else {
        log
    }
}

pub fn compile_shader<D: Device>(
    device: &mut D,
    kind: ShaderKind,
    source: &str,
) -> Result<Shader, ProgramError> {
    let id = device.create_shader(kind);

    if !device.compile_shader(id, source) {
        let log = diagnostic(device.shader_info_log(id), "driver reported no compile log");
        device.delete_shader(id);

        tracing::error!(%kind, "{log}");
        return Err(ProgramError::Compilation { kind, log });
    }

    tracing::debug!(%kind, shader = id.0, "shader compiled");

    Ok(Shader { id, kind })
}

/// Links a vertex and fragment shader and makes the result the current program.
///
/// Both shader objects are released whether or not linking succeeds.
pub fn link_program<D: Device>(
    device: &mut D,
    vertex: Shader,
    fragment: Shader,
) -> Result<Program, ProgramError> {
    let checks = [
        (ShaderKind::Vertex, vertex.kind),
        (ShaderKind::Fragment, fragment.kind),
    ];

    if let Some((expected, found)) = checks.into_iter().find(|(e, f)| e != f) {
        device.delete_shader(vertex.id);
        device.delete_shader(fragment.id);
        return Err(ProgramError::KindMismatch { expected, found });
    }

    let id = device.create_program();
    device.attach_shader(id, vertex.id);
    device.attach_shader(id, fragment.id);

    let linked = device.link_program(id);

    device.delete_shader(vertex.id);
    device.delete_shader(fragment.id);

    if !linked {
        let log = diagnostic(device.program_info_log(id), "driver reported no link log");
        device.delete_program(id);

        tracing::error!("{log}");
        return Err(ProgramError::Linking(log));
    }

    device.use_program(id);
    tracing::debug!(program = id.0, "program linked and in use");

    Ok(Program { id })
}

pub struct ProgramBuilder<'a> {
    vert: (ShaderKind, &'a str),
    frag: (ShaderKind, &'a str),
}

impl<'a> ProgramBuilder<'a> {
    pub fn new(vert_src: &'a str, frag_src: &'a str) -> Self {
        Self {
            vert: (ShaderKind::Vertex, vert_src),
            frag: (ShaderKind::Fragment, frag_src),
        }
    }

    /// Overrides the kinds the two sources are compiled as, typically with
    /// kinds parsed from their tags. Linking still requires vertex then fragment.
    pub fn with_kinds(mut self, vert: ShaderKind, frag: ShaderKind) -> Self {
        self.vert.0 = vert;
        self.frag.0 = frag;
        self
    }

    pub fn build<D: Device>(self, device: &mut D) -> Result<Program, ProgramError> {
        let vert = compile_shader(device, self.vert.0, self.vert.1)?;

        let frag = match compile_shader(device, self.frag.0, self.frag.1) {
            Ok(f) => f,
            Err(e) => {
                device.delete_shader(vert.id);
                return Err(e);
            }
        };

        link_program(device, vert, frag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recording::{Call, RecordingDevice};

    const VERT: &str = "void main() { gl_Position = vec4(0.0); }";
    const FRAG: &str = "void main() { }";

    #[test]
    fn tag_selects_kind() {
        assert_eq!(
            ShaderKind::from_tag("x-shader/x-vertex").unwrap(),
            ShaderKind::Vertex
        );
        assert_eq!(
            "x-shader/x-fragment".parse::<ShaderKind>().unwrap(),
            ShaderKind::Fragment
        );
    }

    #[test]
    fn unknown_tag_fails_loudly() {
        match ShaderKind::from_tag("bogus") {
            Err(ProgramError::UnsupportedKind(tag)) => assert_eq!(tag, "bogus"),
            other => panic!("unexpected result {other:?}"),
        }
    }

    #[test]
    fn valid_pair_links_and_is_used() {
        let mut device = RecordingDevice::new();

        let program = ProgramBuilder::new(VERT, FRAG).build(&mut device).unwrap();

        assert_eq!(device.current_program(), Some(program.id()));
        assert!(device.calls().contains(&Call::UseProgram(program.id())));
        assert_eq!(device.live_shaders(), 0);
    }

    #[test]
    fn syntax_error_reports_diagnostic() {
        let mut device = RecordingDevice::new();

        let err = compile_shader(&mut device, ShaderKind::Fragment, "void main() {").unwrap_err();

        match err {
            ProgramError::Compilation { kind, log } => {
                assert_eq!(kind, ShaderKind::Fragment);
                assert!(!log.is_empty());
            }
            other => panic!("unexpected error {other:?}"),
        }
        assert_eq!(device.live_shaders(), 0);
    }

    #[test]
    fn broken_fragment_releases_vertex() {
        let mut device = RecordingDevice::new();

        let res = ProgramBuilder::new(VERT, "#error nope\nvoid main() {}").build(&mut device);

        assert!(matches!(res, Err(ProgramError::Compilation { .. })));
        assert_eq!(device.live_shaders(), 0);
        assert_eq!(device.current_program(), None);
    }

    #[test]
    fn link_failure_reports_diagnostic() {
        let mut device = RecordingDevice::new().failing_link("mvpMatrix type mismatch");

        let err = ProgramBuilder::new(VERT, FRAG).build(&mut device).unwrap_err();

        match err {
            ProgramError::Linking(log) => assert_eq!(log, "mvpMatrix type mismatch"),
            other => panic!("unexpected error {other:?}"),
        }
        assert_eq!(device.current_program(), None);
    }

    #[test]
    fn swapped_shaders_are_rejected() {
        let mut device = RecordingDevice::new();

        let vert = compile_shader(&mut device, ShaderKind::Vertex, VERT).unwrap();
        let frag = compile_shader(&mut device, ShaderKind::Fragment, FRAG).unwrap();

        let err = link_program(&mut device, frag, vert).unwrap_err();

        assert!(matches!(
            err,
            ProgramError::KindMismatch {
                expected: ShaderKind::Vertex,
                found: ShaderKind::Fragment
            }
        ));
        assert_eq!(device.live_shaders(), 0);
    }

    #[test]
    fn builder_honours_tagged_kinds() {
        let mut device = RecordingDevice::new();

        let err = ProgramBuilder::new(VERT, FRAG)
            .with_kinds(ShaderKind::Vertex, ShaderKind::Vertex)
            .build(&mut device)
            .unwrap_err();

        assert!(matches!(
            err,
            ProgramError::KindMismatch {
                expected: ShaderKind::Fragment,
                found: ShaderKind::Vertex
            }
        ));
        assert_eq!(device.current_program(), None);
    }
}
