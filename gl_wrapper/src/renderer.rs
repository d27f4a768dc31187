use thiserror::Error;

use crate::device::Device;
use crate::program::Program;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceState {
    pub width: u32,
    pub height: u32,
    pub clear_color: [f32; 4],
    pub clear_depth: f32,
}

impl Default for SurfaceState {
    fn default() -> Self {
        Self {
            width: 1024,
            height: 768,
            clear_color: [0.0, 0.0, 0.0, 1.0],
            clear_depth: 1.0,
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum DrawError {
    #[error("program has no active uniform `{0}`")]
    MissingUniform(String),
    #[error("nothing to draw")]
    NoVertices,
}

/// Sizes the viewport and clears color and depth to the surface's values.
pub fn init_surface<D: Device>(device: &mut D, surface: &SurfaceState) {
    device.viewport(surface.width, surface.height);
    device.clear(surface.clear_color, surface.clear_depth);

    tracing::debug!(
        width = surface.width,
        height = surface.height,
        "surface cleared"
    );
}

/// Uploads `matrix` to the named uniform, draws `vertices` as a triangle list
/// and flushes.
pub fn draw<D: Device>(
    device: &mut D,
    program: &Program,
    uniform: &str,
    matrix: &[f32; 16],
    vertices: usize,
) -> Result<(), DrawError> {
    if vertices == 0 {
        return Err(DrawError::NoVertices);
    }

    let location = device
        .uniform_location(program.id(), uniform)
        .ok_or_else(|| DrawError::MissingUniform(uniform.to_string()))?;

    device.uniform_matrix4(location, matrix);
    device.draw_triangles(0, vertices as u32);
    device.flush();

    tracing::debug!(vertices, "triangles submitted");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::program::ProgramBuilder;
    use crate::recording::{Call, RecordingDevice};

    const IDENTITY: [f32; 16] = [
        1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0,
    ];

    #[test]
    fn surface_clears_color_and_depth() {
        let mut device = RecordingDevice::new();

        init_surface(&mut device, &SurfaceState::default());

        assert_eq!(
            device.calls(),
            &[
                Call::Viewport(1024, 768),
                Call::Clear([0.0, 0.0, 0.0, 1.0], 1.0)
            ]
        );
    }

    #[test]
    fn draw_uploads_matrix_then_flushes() {
        let mut device = RecordingDevice::new().with_uniforms(&["mvpMatrix"]);
        let program = ProgramBuilder::new("void main() {}", "void main() {}")
            .build(&mut device)
            .unwrap();

        draw(&mut device, &program, "mvpMatrix", &IDENTITY, 3).unwrap();

        let tail = &device.calls()[device.calls().len() - 3..];
        assert!(matches!(tail[0], Call::UniformMatrix4(_, m) if m == IDENTITY));
        assert_eq!(tail[1], Call::DrawTriangles(0, 3));
        assert_eq!(tail[2], Call::Flush);
    }

    #[test]
    fn missing_uniform_draws_nothing() {
        let mut device = RecordingDevice::new();
        let program = ProgramBuilder::new("void main() {}", "void main() {}")
            .build(&mut device)
            .unwrap();

        let err = draw(&mut device, &program, "mvpMatrix", &IDENTITY, 3).unwrap_err();

        assert_eq!(err, DrawError::MissingUniform("mvpMatrix".into()));
        assert!(!device
            .calls()
            .iter()
            .any(|c| matches!(c, Call::DrawTriangles(..))));
    }
}
