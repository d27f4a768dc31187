use cgmath::{perspective, Deg, InnerSpace, Matrix4, Point3, SquareMatrix, Vector3};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Camera {
    pub eye: [f32; 3],
    pub target: [f32; 3],
    pub up: [f32; 3],
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            eye: [0.0, 1.0, 3.0],
            target: [0.0, 0.0, 0.0],
            up: [0.0, 1.0, 0.0],
        }
    }
}

impl Camera {
    pub fn view(&self) -> Matrix4<f32> {
        Matrix4::look_at_rh(
            Point3::from(self.eye),
            Point3::from(self.target),
            Vector3::from(self.up),
        )
    }

    /// Rejects placements that leave the view matrix undefined.
    pub fn check(&self) -> Result<(), &'static str> {
        let finite = [self.eye, self.target, self.up]
            .iter()
            .flatten()
            .all(|v| v.is_finite());

        if !finite {
            return Err("eye, target and up must be finite");
        }

        let forward = Vector3::from(self.target) - Vector3::from(self.eye);
        let up = Vector3::from(self.up);

        if !(forward.magnitude2() > f32::EPSILON) {
            return Err("eye and target coincide");
        }

        if !(up.magnitude2() > f32::EPSILON) {
            return Err("up vector has zero length");
        }

        if !(forward.normalize().cross(up.normalize()).magnitude2() > 1e-6) {
            return Err("up vector is parallel to the view direction");
        }

        Ok(())
    }
}

/// Perspective projection; `fov_y` is the vertical field of view in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Projection {
    pub fov_y: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for Projection {
    fn default() -> Self {
        Self {
            fov_y: 90.0,
            near: 0.1,
            far: 100.0,
        }
    }
}

impl Projection {
    pub fn matrix(&self, aspect: f32) -> Matrix4<f32> {
        perspective(Deg(self.fov_y), aspect, self.near, self.far)
    }

    pub fn check(&self) -> Result<(), &'static str> {
        if !(self.fov_y > 0.0 && self.fov_y < 180.0) {
            return Err("field of view must be within (0, 180)");
        }

        if !(self.near > 0.0 && self.far > self.near && self.far.is_finite()) {
            return Err("expected 0 < near < far < infinity");
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransformSet {
    pub model: Matrix4<f32>,
    pub view: Matrix4<f32>,
    pub projection: Matrix4<f32>,
    pub combined: Matrix4<f32>,
}

impl TransformSet {
    /// Builds the three matrices from scratch and multiplies them as
    /// `projection * view * model`.
    pub fn compose(camera: &Camera, projection: &Projection, aspect: f32) -> Self {
        let model = Matrix4::identity();
        let view = camera.view();
        let projection = projection.matrix(aspect);

        Self {
            model,
            view,
            projection,
            combined: projection * view * model,
        }
    }

    /// The combined matrix in column-major order, ready for a uniform upload.
    pub fn combined_columns(&self) -> [f32; 16] {
        let columns: &[f32; 16] = self.combined.as_ref();
        *columns
    }
}
