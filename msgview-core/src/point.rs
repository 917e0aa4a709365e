//! Point and vector aliases used throughout the scene graph

use nalgebra::{Point3, Vector3};

/// A 3D point with floating point coordinates
pub type Point3f = Point3<f32>;

/// A 3D vector with floating point components
pub type Vector3f = Vector3<f32>;

/// A 2D texture coordinate
pub type TexCoord = [f32; 2];
