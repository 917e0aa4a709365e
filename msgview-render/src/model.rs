//! The renderable model: a set of geometries plus the acceleration structure
//! built over them at commit time

use crate::bvh::{BoundingVolumeHierarchy, Primitives};
use crate::geometry::TriangleMesh;
use crate::ray::Ray;
use msgview_core::{BoundingBox, Error, Point3f, Result, Vector3f};

/// A ray/surface intersection
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hit {
    pub t: f32,
    pub u: f32,
    pub v: f32,
    /// Index of the geometry in the model
    pub geom_id: u32,
    /// Index of the triangle within its geometry
    pub prim_id: u32,
    /// Unnormalized geometric normal
    pub ng: Vector3f,
}

struct Triangles {
    vertices: Vec<[Point3f; 3]>,
    // (geometry, primitive) per flattened triangle
    ids: Vec<(u32, u32)>,
}

impl Primitives for Triangles {
    fn intersect(&self, index: u32, ray: &Ray) -> Option<(f32, f32, f32)> {
        let [p0, p1, p2] = &self.vertices[index as usize];
        let hit = ray.intersect_triangle(p0, p1, p2)?;
        Some((hit.t, hit.u, hit.v))
    }
}

struct Scene {
    triangles: Triangles,
    bvh: BoundingVolumeHierarchy,
}

#[derive(Default)]
pub struct Model {
    geometry: Vec<TriangleMesh>,
    scene: Option<Scene>,
}

impl Model {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a geometry, returning its geometry id
    pub fn add_geometry(&mut self, geometry: TriangleMesh) -> u32 {
        self.geometry.push(geometry);
        self.scene = None;
        (self.geometry.len() - 1) as u32
    }

    pub fn geometry(&self, geom_id: u32) -> Option<&TriangleMesh> {
        self.geometry.get(geom_id as usize)
    }

    pub fn num_geometries(&self) -> usize {
        self.geometry.len()
    }

    pub fn is_committed(&self) -> bool {
        self.scene.is_some()
    }

    /// Commit every geometry, then flatten their triangles and build the BVH
    pub fn commit(&mut self) -> Result<()> {
        for (id, geometry) in self.geometry.iter_mut().enumerate() {
            if !geometry.is_committed() {
                geometry
                    .commit()
                    .map_err(|e| Error::Render(format!("geometry {}: {}", id, e)))?;
            }
        }

        let total = self.geometry.iter().map(TriangleMesh::num_triangles).sum();
        let mut triangles = Triangles {
            vertices: Vec::with_capacity(total),
            ids: Vec::with_capacity(total),
        };
        let mut bounds = Vec::with_capacity(total);

        for (geom_id, geometry) in self.geometry.iter().enumerate() {
            for prim_id in 0..geometry.num_triangles() {
                let corners = geometry.triangle(prim_id);
                bounds.push(corners.iter().collect::<BoundingBox>());
                triangles.vertices.push(corners);
                triangles.ids.push((geom_id as u32, prim_id as u32));
            }
        }

        let start = std::time::Instant::now();
        let bvh = BoundingVolumeHierarchy::new(&bounds);
        log::debug!(
            "built BVH over {} triangles in {:.1?} (depth {}, {} leaves)",
            total,
            start.elapsed(),
            bvh.depth(),
            bvh.leaf_count()
        );

        self.scene = Some(Scene { triangles, bvh });
        Ok(())
    }

    /// World bounds of the committed model
    pub fn bounds(&self) -> Option<BoundingBox> {
        self.scene.as_ref().map(|scene| *scene.bvh.bounds())
    }

    /// Closest hit along `ray`, `None` on a miss or if the model is not committed
    pub fn intersect(&self, ray: &Ray) -> Option<Hit> {
        let scene = self.scene.as_ref()?;
        let hit = scene.bvh.intersect(ray, &scene.triangles)?;

        let (geom_id, prim_id) = scene.triangles.ids[hit.index as usize];
        let [p0, p1, p2] = &scene.triangles.vertices[hit.index as usize];
        Some(Hit {
            t: hit.t,
            u: hit.u,
            v: hit.v,
            geom_id,
            prim_id,
            ng: (p1 - p0).cross(&(p2 - p0)),
        })
    }

    pub fn occluded(&self, ray: &Ray) -> bool {
        self.scene
            .as_ref()
            .is_some_and(|scene| scene.bvh.occluded(ray, &scene.triangles))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn square(z: f32) -> TriangleMesh {
        let mut mesh = TriangleMesh::new();
        mesh.set_position(Arc::from(vec![
            Point3f::new(-1.0, -1.0, z),
            Point3f::new(1.0, -1.0, z),
            Point3f::new(1.0, 1.0, z),
            Point3f::new(-1.0, 1.0, z),
        ]));
        mesh.set_index(Arc::from(vec![[0, 1, 2], [0, 2, 3]]));
        mesh
    }

    #[test]
    fn test_uncommitted_model_hits_nothing() {
        let mut model = Model::new();
        model.add_geometry(square(1.0));
        assert!(!model.is_committed());
        assert!(model.intersect(&Ray::new(Point3f::origin(), Vector3f::z())).is_none());
    }

    #[test]
    fn test_closest_geometry_wins() {
        let mut model = Model::new();
        model.add_geometry(square(3.0));
        model.add_geometry(square(2.0));
        model.commit().unwrap();

        let hit = model
            .intersect(&Ray::new(Point3f::new(0.3, -0.5, 0.0), Vector3f::z()))
            .unwrap();
        assert_eq!(hit.geom_id, 1);
        assert_eq!(hit.prim_id, 0);
        assert!((hit.t - 2.0).abs() < 1e-6);
        assert!(hit.ng.z.abs() > 0.0);

        let bounds = model.bounds().unwrap();
        assert_eq!(bounds.min.z, 2.0);
        assert_eq!(bounds.max.z, 3.0);
    }

    #[test]
    fn test_adding_geometry_invalidates_commit() {
        let mut model = Model::new();
        model.add_geometry(square(1.0));
        model.commit().unwrap();
        model.add_geometry(square(2.0));
        assert!(!model.is_committed());
    }

    #[test]
    fn test_commit_reports_bad_geometry() {
        let mut model = Model::new();
        model.add_geometry(TriangleMesh::new());
        assert!(matches!(model.commit(), Err(Error::Render(_))));
    }

    #[test]
    fn test_occlusion() {
        let mut model = Model::new();
        model.add_geometry(square(1.0));
        model.commit().unwrap();
        assert!(model.occluded(&Ray::new(Point3f::origin(), Vector3f::z())));
        assert!(!model.occluded(&Ray::new(Point3f::origin(), -Vector3f::z())));
    }
}
