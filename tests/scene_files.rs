use std::path::PathBuf;

use gl_wrapper::recording::{Call, RecordingDevice};
use gl_wrapper::program::ProgramError;

use tridraw::pipeline::StepError;
use tridraw::{draw_once, SceneError, SceneLoader, Stage};

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

#[test]
fn position_only_scene_draws_with_file_shaders() {
    let (scene, library) = SceneLoader::new()
        .load_path(fixture("position_only.json5"))
        .unwrap();

    assert_eq!(scene.surface.width, 800);
    assert!(library.get("flat-vs").unwrap().text.contains("in vec3 position"));

    let mut device = RecordingDevice::new()
        .with_attributes(&["position"])
        .with_uniforms(&["mvpMatrix"]);

    let report = draw_once(&mut device, &scene, &library).unwrap();

    assert_eq!(report.stage, Stage::FrameDrawn);
    assert_eq!(report.attributes.len(), 1);
    assert_eq!(report.attributes[0].components(), 3);
    assert!(device.calls().contains(&Call::Viewport(800, 600)));
    assert!(device.calls().contains(&Call::DrawTriangles(0, 3)));
}

#[test]
fn bogus_tag_in_file_fails_before_drawing() {
    let (scene, library) = SceneLoader::new()
        .load_path(fixture("bogus_tag.json5"))
        .unwrap();

    let mut device = RecordingDevice::new()
        .with_attributes(&["position", "color"])
        .with_uniforms(&["mvpMatrix"]);

    let err = draw_once(&mut device, &scene, &library).unwrap_err();

    assert_eq!(err.stage, Stage::Uninitialized);
    assert!(matches!(
        err.source,
        StepError::Scene(SceneError::Shader(_, ProgramError::UnsupportedKind(ref tag))) if tag == "bogus"
    ));
    assert!(device.calls().is_empty());
}

#[test]
fn missing_scene_file_is_an_input_error() {
    let res = SceneLoader::new().load_path(fixture("nope.json5"));

    assert!(matches!(res, Err(SceneError::Input(..))));
}
