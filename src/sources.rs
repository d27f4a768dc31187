use std::collections::HashMap;
use std::path::Path;

use gl_wrapper::program::{ShaderKind, FRAGMENT_TAG, VERTEX_TAG};

use crate::scene::SceneError;

pub const VERTEX_ID: &str = "vshader";
pub const FRAGMENT_ID: &str = "fshader";

/// Shader text as found in its container, with the kind still a raw tag.
#[derive(Debug, Clone, PartialEq)]
pub struct ShaderSource {
    pub id: String,
    pub tag: String,
    pub text: String,
}

impl ShaderSource {
    pub fn new(id: &str, tag: &str, text: &str) -> Self {
        Self {
            id: id.to_string(),
            tag: tag.to_string(),
            text: text.to_string(),
        }
    }

    pub fn kind(&self) -> Result<ShaderKind, SceneError> {
        ShaderKind::from_tag(&self.tag).map_err(|e| SceneError::Shader(self.id.clone(), e))
    }
}

/// Shader sources addressed by identifier.
#[derive(Debug, Clone)]
pub struct ShaderLibrary {
    sources: HashMap<String, ShaderSource>,
}

impl ShaderLibrary {
    pub fn empty() -> Self {
        Self {
            sources: HashMap::new(),
        }
    }

    /// The shaders compiled into the binary.
    pub fn embedded() -> Self {
        let mut lib = Self::empty();

        lib.insert(ShaderSource::new(
            VERTEX_ID,
            VERTEX_TAG,
            include_str!("../shaders/triangle.vert"),
        ));
        lib.insert(ShaderSource::new(
            FRAGMENT_ID,
            FRAGMENT_TAG,
            include_str!("../shaders/triangle.frag"),
        ));

        lib
    }

    pub fn insert(&mut self, source: ShaderSource) -> Option<ShaderSource> {
        self.sources.insert(source.id.clone(), source)
    }

    /// Reads a shader from disk, replacing any source with the same id.
    pub fn load_file<P: AsRef<Path>>(&mut self, id: &str, tag: &str, path: P) -> Result<(), SceneError> {
        let text = std::fs::read_to_string(path.as_ref())
            .map_err(|e| SceneError::Input(path.as_ref().to_path_buf(), e))?;

        self.insert(ShaderSource::new(id, tag, &text));

        Ok(())
    }

    pub fn get(&self, id: &str) -> Result<&ShaderSource, SceneError> {
        self.sources
            .get(id)
            .ok_or_else(|| SceneError::UnknownShader(id.to_string()))
    }
}

impl Default for ShaderLibrary {
    fn default() -> Self {
        Self::embedded()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gl_wrapper::program::ProgramError;

    #[test]
    fn embedded_shaders_carry_their_kind() {
        let lib = ShaderLibrary::embedded();

        assert_eq!(lib.get(VERTEX_ID).unwrap().kind().unwrap(), ShaderKind::Vertex);
        assert_eq!(lib.get(FRAGMENT_ID).unwrap().kind().unwrap(), ShaderKind::Fragment);
    }

    #[test]
    fn embedded_vertex_shader_declares_pipeline_names() {
        let lib = ShaderLibrary::embedded();
        let text = &lib.get(VERTEX_ID).unwrap().text;

        for name in ["position", "color", "mvpMatrix"] {
            assert!(text.contains(name), "missing {name}");
        }
    }

    #[test]
    fn bogus_tag_is_an_error() {
        let src = ShaderSource::new("fshader", "bogus", "void main() {}");

        match src.kind() {
            Err(SceneError::Shader(id, ProgramError::UnsupportedKind(tag))) => {
                assert_eq!(id, "fshader");
                assert_eq!(tag, "bogus");
            }
            other => panic!("unexpected result {other:?}"),
        }
    }

    #[test]
    fn unknown_id_is_an_error() {
        let lib = ShaderLibrary::embedded();

        assert!(matches!(lib.get("gshader"), Err(SceneError::UnknownShader(id)) if id == "gshader"));
    }
}
