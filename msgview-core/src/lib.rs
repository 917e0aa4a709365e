//! Core data structures for msgview
//! 
//! This crate provides the mini scene graph the viewer imports files into:
//! materials, triangle meshes, instances placing meshes in the world, and
//! the model that owns all of them.

pub mod point;
pub mod bbox;
pub mod material;
pub mod mesh;
pub mod model;
pub mod transform;
pub mod error;

pub use point::*;
pub use bbox::*;
pub use material::*;
pub use mesh::*;
pub use model::*;
pub use transform::*;
pub use error::*;

/// Re-export commonly used types from nalgebra
pub use nalgebra::{Point3, Vector3, Matrix3};
