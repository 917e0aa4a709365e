//! Affine transformations placing instances in the world

use nalgebra::{Matrix3, Point3, Vector3};
use serde::{Deserialize, Serialize};

/// An affine transformation: a linear part followed by a translation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Affine {
    pub linear: Matrix3<f32>,
    pub translation: Vector3<f32>,
}

impl Affine {
    /// Create an identity transformation
    pub fn identity() -> Self {
        Self {
            linear: Matrix3::identity(),
            translation: Vector3::zeros(),
        }
    }

    /// Create a translation transformation
    pub fn translation(translation: Vector3<f32>) -> Self {
        Self {
            linear: Matrix3::identity(),
            translation,
        }
    }

    /// Build a transformation from twelve floats: the three columns of the
    /// linear part followed by the translation
    pub fn from_columns(values: &[f32; 12]) -> Self {
        Self {
            linear: Matrix3::from_column_slice(&values[..9]),
            translation: Vector3::new(values[9], values[10], values[11]),
        }
    }

    /// Inverse of [`Affine::from_columns`]
    pub fn to_columns(&self) -> [f32; 12] {
        let mut values = [0.0; 12];
        values[..9].copy_from_slice(self.linear.as_slice());
        values[9..].copy_from_slice(self.translation.as_slice());
        values
    }

    /// Apply the transformation to a point
    pub fn transform_point(&self, point: &Point3<f32>) -> Point3<f32> {
        Point3::from(self.linear * point.coords + self.translation)
    }

    /// Compose this transformation with another; `other` is applied first
    pub fn compose(self, other: Self) -> Self {
        Self {
            linear: self.linear * other.linear,
            translation: self.linear * other.translation + self.translation,
        }
    }

    /// Exact identity check
    pub fn is_identity(&self) -> bool {
        *self == Self::identity()
    }
}

impl Default for Affine {
    fn default() -> Self {
        Self::identity()
    }
}

impl std::ops::Mul for Affine {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self::Output {
        self.compose(rhs)
    }
}
