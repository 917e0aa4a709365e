//! Mesh data structures and functionality

use crate::point::*;
use crate::bbox::{Bounded, BoundingBox};
use serde::{Deserialize, Serialize};

/// A triangle referencing three vertices of its mesh
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Triangle {
    pub v0: u32,
    pub v1: u32,
    pub v2: u32,
}

impl Triangle {
    pub fn new(v0: u32, v1: u32, v2: u32) -> Self {
        Self { v0, v1, v2 }
    }

    pub fn indices(&self) -> [u32; 3] {
        [self.v0, self.v1, self.v2]
    }
}

/// A triangle mesh with optional per-vertex normals and texture coordinates.
///
/// `normal` and `texcoord` are either empty or exactly as long as `position`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Mesh {
    pub name: String,
    pub position: Vec<Point3f>,
    pub normal: Vec<Vector3f>,
    pub texcoord: Vec<TexCoord>,
    pub triangle: Vec<Triangle>,
    /// Index into the owning model's material list
    pub material: Option<usize>,
}

impl Mesh {
    /// Create a new empty mesh
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Number of triangles
    pub fn size(&self) -> usize {
        self.triangle.len()
    }

    /// Get the number of vertices
    pub fn vertex_count(&self) -> usize {
        self.position.len()
    }

    /// Check if the mesh is empty
    pub fn is_empty(&self) -> bool {
        self.position.is_empty() || self.triangle.is_empty()
    }

    /// Add a vertex to the mesh
    pub fn add_vertex(&mut self, vertex: Point3f) -> u32 {
        let index = self.position.len() as u32;
        self.position.push(vertex);
        index
    }

    /// Add a triangle to the mesh
    pub fn add_triangle(&mut self, triangle: Triangle) {
        self.triangle.push(triangle);
    }

    /// Check that every triangle references an existing vertex and that the
    /// optional attribute arrays match the vertex count. Returns a description
    /// of the first problem found.
    pub fn validate(&self) -> std::result::Result<(), String> {
        let count = self.position.len();

        if !self.normal.is_empty() && self.normal.len() != count {
            return Err(format!(
                "mesh '{}' has {} normals for {} vertices",
                self.name,
                self.normal.len(),
                count
            ));
        }
        if !self.texcoord.is_empty() && self.texcoord.len() != count {
            return Err(format!(
                "mesh '{}' has {} texture coordinates for {} vertices",
                self.name,
                self.texcoord.len(),
                count
            ));
        }

        for (i, tri) in self.triangle.iter().enumerate() {
            if tri.indices().iter().any(|&v| v as usize >= count) {
                return Err(format!(
                    "mesh '{}': triangle {} references a vertex out of range (vertex count {})",
                    self.name, i, count
                ));
            }
        }

        Ok(())
    }
}

impl Bounded for Mesh {
    fn bounding_box(&self) -> BoundingBox {
        self.position.iter().collect()
    }
}
