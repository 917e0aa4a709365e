//! Triangle mesh geometry

use crate::material::Material;
use msgview_core::{BoundingBox, Error, Point3f, Result};
use std::sync::Arc;

/// A triangle mesh handed to the renderer. Vertex and index arrays are
/// shared, so several geometries (or the caller) can hold the same data.
#[derive(Debug, Clone, Default)]
pub struct TriangleMesh {
    position: Option<Arc<[Point3f]>>,
    index: Option<Arc<[[u32; 3]]>>,
    material: Option<Arc<Material>>,
    committed: bool,
}

impl TriangleMesh {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_position(&mut self, position: Arc<[Point3f]>) {
        self.position = Some(position);
        self.committed = false;
    }

    pub fn set_index(&mut self, index: Arc<[[u32; 3]]>) {
        self.index = Some(index);
        self.committed = false;
    }

    pub fn set_material(&mut self, material: Arc<Material>) {
        self.material = Some(material);
        self.committed = false;
    }

    /// Check that both arrays are set and every index is in range
    pub fn commit(&mut self) -> Result<()> {
        let position = self
            .position
            .as_ref()
            .ok_or_else(|| Error::Render("triangle mesh has no 'position' data".to_string()))?;
        let index = self
            .index
            .as_ref()
            .ok_or_else(|| Error::Render("triangle mesh has no 'index' data".to_string()))?;

        let count = position.len();
        if let Some((i, tri)) = index
            .iter()
            .enumerate()
            .find(|(_, tri)| tri.iter().any(|&v| v as usize >= count))
        {
            return Err(Error::Render(format!(
                "triangle {} index {:?} is out of range for {} vertices",
                i, tri, count
            )));
        }

        self.committed = true;
        Ok(())
    }

    pub fn is_committed(&self) -> bool {
        self.committed
    }

    pub fn positions(&self) -> &[Point3f] {
        self.position.as_deref().unwrap_or(&[])
    }

    pub fn indices(&self) -> &[[u32; 3]] {
        self.index.as_deref().unwrap_or(&[])
    }

    pub fn material(&self) -> Option<&Arc<Material>> {
        self.material.as_ref()
    }

    pub fn num_triangles(&self) -> usize {
        self.indices().len()
    }

    /// Corners of triangle `prim`
    pub fn triangle(&self, prim: usize) -> [Point3f; 3] {
        let [a, b, c] = self.indices()[prim];
        let p = self.positions();
        [p[a as usize], p[b as usize], p[c as usize]]
    }

    pub fn triangle_bounds(&self, prim: usize) -> BoundingBox {
        self.triangle(prim).iter().collect()
    }
}
