pub mod pipeline;
pub mod scene;
pub mod sources;
pub mod transform;

pub use pipeline::{draw_once, summarize, FrameReport, PipelineError, Stage, Summary};
pub use scene::{Scene, SceneError, SceneLoader};
pub use sources::{ShaderLibrary, ShaderSource};
pub use transform::TransformSet;
