//! Decomposed transforms handed to render backends.
//!
//! Renderers usually take a rigid transform plus a separate non-uniform scale
//! rather than an arbitrary matrix, so every world matrix produced by the scene
//! traversal goes through [`Instance::from_matrix`] before it reaches a backend.

use cgmath::{InnerSpace, Matrix3, Matrix4, One, Quaternion, SquareMatrix, Vector3};

/// Translation, rotation (as quaternion) and non-uniform scale.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Instance {
    pub position: Vector3<f64>,
    pub rotation: Quaternion<f64>,
    pub scale: Vector3<f64>,
}

impl Instance {
    /// Create a new instance with identity transformation (no move, rotate, or scale).
    pub fn new() -> Self {
        Self {
            position: Vector3::new(0.0, 0.0, 0.0),
            // `Quaternion::one()` is the identity quaternion (no rotation)
            rotation: Quaternion::one(),
            scale: Vector3::new(1.0, 1.0, 1.0),
        }
    }

    pub fn to_matrix(&self) -> Matrix4<f64> {
        Matrix4::from_translation(self.position)
            * Matrix4::from(self.rotation)
            * Matrix4::from_nonuniform_scale(self.scale.x, self.scale.y, self.scale.z)
    }

    /// Splits an affine matrix into `T * R * S`.
    ///
    /// Scale is the length of each basis column. A mirrored basis (negative
    /// determinant) is expressed as a negative X scale so that the remaining
    /// rotation stays proper. If any axis has collapsed to zero length the
    /// rotation is undefined and left as identity.
    pub fn from_matrix(matrix: &Matrix4<f64>) -> Self {
        let position = matrix.w.truncate();
        let x = matrix.x.truncate();
        let y = matrix.y.truncate();
        let z = matrix.z.truncate();

        let mut scale = Vector3::new(x.magnitude(), y.magnitude(), z.magnitude());
        if Matrix3::from_cols(x, y, z).determinant() < 0.0 {
            scale.x = -scale.x;
        }

        let rotation = if scale.x == 0.0 || scale.y == 0.0 || scale.z == 0.0 {
            Quaternion::one()
        } else {
            let basis = Matrix3::from_cols(x / scale.x, y / scale.y, z / scale.z);
            Quaternion::from(basis).normalize()
        };

        Self {
            position,
            rotation,
            scale,
        }
    }
}

impl Default for Instance {
    fn default() -> Self {
        Self::new()
    }
}
