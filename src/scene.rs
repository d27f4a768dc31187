use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use gl_wrapper::geometry::{check_layout, GeometryError, VertexAttribute};
use gl_wrapper::program::{ProgramError, FRAGMENT_TAG, VERTEX_TAG};
use gl_wrapper::renderer::SurfaceState;

use crate::sources::{ShaderLibrary, FRAGMENT_ID, VERTEX_ID};
use crate::transform::{Camera, Projection};

#[derive(Debug, Error)]
pub enum SceneError {
    #[error("could not read {0:?}: {1}")]
    Input(PathBuf, #[source] std::io::Error),
    #[error("invalid scene description: {0}")]
    Format(#[from] json5::Error),
    #[error("shader `{0}`: {1}")]
    Shader(String, #[source] ProgramError),
    #[error("no shader source with id `{0}`")]
    UnknownShader(String),
    #[error(transparent)]
    Layout(#[from] GeometryError),
    #[error("invalid surface size {0}x{1}")]
    Surface(u32, u32),
    #[error("invalid projection: {0}")]
    Projection(&'static str),
    #[error("invalid camera: {0}")]
    Camera(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Surface {
    pub width: u32,
    pub height: u32,
    pub clear_color: [f32; 4],
    pub clear_depth: f32,
}

impl Default for Surface {
    fn default() -> Self {
        let state = SurfaceState::default();

        Self {
            width: state.width,
            height: state.height,
            clear_color: state.clear_color,
            clear_depth: state.clear_depth,
        }
    }
}

impl From<Surface> for SurfaceState {
    fn from(s: Surface) -> Self {
        Self {
            width: s.width,
            height: s.height,
            clear_color: s.clear_color,
            clear_depth: s.clear_depth,
        }
    }
}

/// Points a pipeline slot at a source in the [`ShaderLibrary`], optionally
/// loading it from a file first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShaderRef {
    pub id: String,
    #[serde(default)]
    pub tag: Option<String>,
    #[serde(default)]
    pub path: Option<PathBuf>,
}

impl ShaderRef {
    pub fn embedded(id: &str) -> Self {
        Self {
            id: id.to_string(),
            tag: None,
            path: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShaderSlots {
    pub vertex: ShaderRef,
    pub fragment: ShaderRef,
}

impl Default for ShaderSlots {
    fn default() -> Self {
        Self {
            vertex: ShaderRef::embedded(VERTEX_ID),
            fragment: ShaderRef::embedded(FRAGMENT_ID),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attribute {
    pub name: String,
    pub components: u8,
    pub values: Vec<f32>,
}

impl Attribute {
    pub fn as_vertex_attribute(&self) -> VertexAttribute<'_> {
        VertexAttribute::new(&self.name, self.components, &self.values)
    }
}

#[rustfmt::skip]
fn triangle() -> Vec<Attribute> {
    vec![
        Attribute {
            name: "position".into(),
            components: 3,
            values: vec![
                0.0, 2.0, 0.0,
                1.5, 0.0, 0.0,
                -0.5, 0.0, 0.0,
            ],
        },
        Attribute {
            name: "color".into(),
            components: 4,
            values: vec![
                1.0, 0.1, 0.0, 1.0,
                0.0, 1.0, 0.0, 1.0,
                0.0, 0.0, 1.0, 1.0,
            ],
        },
    ]
}

/// Everything the draw pipeline needs, with the tutorial triangle as default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Scene {
    pub surface: Surface,
    pub shaders: ShaderSlots,
    pub attributes: Vec<Attribute>,
    /// Attribute the draw call takes its vertex count from.
    pub position: String,
    pub camera: Camera,
    pub projection: Projection,
    pub uniform: String,
}

impl Default for Scene {
    fn default() -> Self {
        Self {
            surface: Surface::default(),
            shaders: ShaderSlots::default(),
            attributes: triangle(),
            position: "position".into(),
            camera: Camera::default(),
            projection: Projection::default(),
            uniform: "mvpMatrix".into(),
        }
    }
}

impl Scene {
    pub fn aspect(&self) -> f32 {
        self.surface.width as f32 / self.surface.height as f32
    }

    pub fn vertex_attributes(&self) -> Vec<VertexAttribute<'_>> {
        self.attributes
            .iter()
            .map(Attribute::as_vertex_attribute)
            .collect()
    }

    /// Checks everything that can be checked without a GPU and returns the
    /// number of vertices to draw.
    pub fn validate(&self) -> Result<usize, SceneError> {
        if self.surface.width == 0 || self.surface.height == 0 {
            return Err(SceneError::Surface(self.surface.width, self.surface.height));
        }

        self.projection.check().map_err(SceneError::Projection)?;
        self.camera.check().map_err(SceneError::Camera)?;

        check_layout(&self.vertex_attributes(), &self.position).map_err(SceneError::from)
    }
}

pub struct SceneLoader {}

impl SceneLoader {
    pub fn new() -> Self {
        Self {}
    }

    /// Reads a json5 scene and any shader files it references. Relative shader
    /// paths are resolved against the scene file's directory.
    pub fn load_path<P: AsRef<Path>>(&self, path: P) -> Result<(Scene, ShaderLibrary), SceneError> {
        let path = path.as_ref();
        let scene_str = std::fs::read_to_string(path)
            .map_err(|e| SceneError::Input(path.to_path_buf(), e))?;

        let base = path.parent().unwrap_or_else(|| Path::new(""));

        self.load_str(&scene_str, base)
    }

    pub fn load_str(&self, scene_str: &str, base: &Path) -> Result<(Scene, ShaderLibrary), SceneError> {
        let scene = json5::from_str::<Scene>(scene_str)?;

        let mut library = ShaderLibrary::embedded();

        for (slot, default_tag) in [
            (&scene.shaders.vertex, VERTEX_TAG),
            (&scene.shaders.fragment, FRAGMENT_TAG),
        ] {
            if let Some(file) = &slot.path {
                let tag = slot.tag.as_deref().unwrap_or(default_tag);
                library.load_file(&slot.id, tag, base.join(file))?;
            } else if let Some(tag) = &slot.tag {
                let mut source = library.get(&slot.id)?.clone();
                source.tag = tag.clone();
                library.insert(source);
            }
        }

        Ok((scene, library))
    }
}

impl Default for SceneLoader {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gl_wrapper::program::ShaderKind;

    #[test]
    fn defaults_are_the_tutorial_triangle() {
        let scene = Scene::default();

        assert_eq!((scene.surface.width, scene.surface.height), (1024, 768));
        assert_eq!(scene.surface.clear_color, [0.0, 0.0, 0.0, 1.0]);
        assert_eq!(scene.surface.clear_depth, 1.0);
        assert_eq!(scene.camera.eye, [0.0, 1.0, 3.0]);
        assert_eq!(scene.projection.fov_y, 90.0);
        assert_eq!(scene.position, "position");
        assert_eq!(scene.attributes.len(), 2);
        assert_eq!(scene.attributes[0].name, "position");
        assert_eq!(scene.attributes[0].components, 3);
        assert_eq!(
            scene.attributes[0].values,
            [0.0, 2.0, 0.0, 1.5, 0.0, 0.0, -0.5, 0.0, 0.0]
        );
        assert_eq!(scene.attributes[1].name, "color");
        assert_eq!(scene.attributes[1].components, 4);
        assert_eq!(
            scene.attributes[1].values,
            [1.0, 0.1, 0.0, 1.0, 0.0, 1.0, 0.0, 1.0, 0.0, 0.0, 1.0, 1.0]
        );
        assert_eq!(scene.uniform, "mvpMatrix");
        assert_eq!(scene.validate().unwrap(), 3);
    }

    #[test]
    fn short_color_is_rejected() {
        let mut scene = Scene::default();
        scene.attributes[1].values.truncate(8);

        assert!(matches!(
            scene.validate(),
            Err(SceneError::Layout(GeometryError::VertexCountMismatch { found: 2, .. }))
        ));
    }

    #[test]
    fn position_only_scene_is_valid() {
        let mut scene = Scene::default();
        scene.attributes.retain(|a| a.name == "position");

        assert_eq!(scene.validate().unwrap(), 3);
    }

    #[test]
    fn inverted_depth_range_is_rejected() {
        let mut scene = Scene::default();
        scene.projection.near = 100.0;
        scene.projection.far = 0.1;

        assert!(matches!(scene.validate(), Err(SceneError::Projection(_))));
    }

    #[test]
    fn unbounded_far_plane_is_rejected() {
        let mut scene = Scene::default();
        scene.projection.far = f32::INFINITY;

        assert!(matches!(scene.validate(), Err(SceneError::Projection(_))));
    }

    #[test]
    fn camera_on_its_target_is_rejected() {
        let mut scene = Scene::default();
        scene.camera.eye = [0.0, 0.0, 0.0];

        assert!(matches!(scene.validate(), Err(SceneError::Camera(_))));
    }

    #[test]
    fn camera_looking_along_up_is_rejected() {
        let mut scene = Scene::default();
        scene.camera.eye = [0.0, 3.0, 0.0];

        assert!(matches!(scene.validate(), Err(SceneError::Camera(_))));
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let (scene, _) = SceneLoader::new()
            .load_str("{ camera: { eye: [0.0, 0.0, 5.0] } }", Path::new(""))
            .unwrap();

        assert_eq!(scene.camera.eye, [0.0, 0.0, 5.0]);
        assert_eq!(scene.camera.up, [0.0, 1.0, 0.0]);
        assert_eq!(scene.attributes, Scene::default().attributes);
        assert_eq!(scene.surface, Surface::default());
    }

    #[test]
    fn retagged_shader_fails_at_kind_lookup() {
        let (scene, library) = SceneLoader::new()
            .load_str(
                r#"{ shaders: { fragment: { id: "fshader", tag: "bogus" } } }"#,
                Path::new(""),
            )
            .unwrap();

        let source = library.get(&scene.shaders.fragment.id).unwrap();

        assert!(matches!(
            source.kind(),
            Err(SceneError::Shader(_, ProgramError::UnsupportedKind(_)))
        ));
        assert_eq!(
            library.get(VERTEX_ID).unwrap().kind().unwrap(),
            ShaderKind::Vertex
        );
    }

    #[test]
    fn missing_shader_file_is_reported() {
        let res = SceneLoader::new().load_str(
            r#"{ shaders: { vertex: { id: "vshader", path: "does/not/exist.vert" } } }"#,
            Path::new("/nonexistent"),
        );

        assert!(matches!(res, Err(SceneError::Input(..))));
    }

    #[test]
    fn malformed_file_is_a_format_error() {
        let res = SceneLoader::new().load_str("{ camera: ", Path::new(""));

        assert!(matches!(res, Err(SceneError::Format(_))));
    }
}
