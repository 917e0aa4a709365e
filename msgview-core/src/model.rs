//! The mini scene graph model: materials, meshes and their instances

use crate::bbox::{Bounded, BoundingBox};
use crate::material::Material;
use crate::mesh::Mesh;
use crate::transform::Affine;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One placement of a mesh in the world
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Instance {
    pub mesh_id: usize,
    pub xfm: Affine,
}

impl Instance {
    /// An instance of `mesh_id` with the identity transform
    pub fn new(mesh_id: usize) -> Self {
        Self {
            mesh_id,
            xfm: Affine::identity(),
        }
    }

    pub fn with_transform(mesh_id: usize, xfm: Affine) -> Self {
        Self { mesh_id, xfm }
    }
}

/// A complete scene: the materials, the meshes, and the instances that place
/// meshes in the world. Meshes refer to materials and instances refer to
/// meshes by index.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Model {
    pub material: Vec<Material>,
    pub mesh: Vec<Mesh>,
    pub instance: Vec<Instance>,
}

impl Model {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a mesh without instantiating it, returning its id
    pub fn add_mesh(&mut self, mesh: Mesh) -> usize {
        self.mesh.push(mesh);
        self.mesh.len() - 1
    }

    /// Add a mesh together with an identity instance of it
    pub fn add_mesh_instance(&mut self, mesh: Mesh) -> usize {
        let mesh_id = self.add_mesh(mesh);
        self.instance.push(Instance::new(mesh_id));
        mesh_id
    }

    /// Add a material, returning its id
    pub fn add_material(&mut self, material: Material) -> usize {
        self.material.push(material);
        self.material.len() - 1
    }

    /// Find a material by name
    pub fn find_material(&self, name: &str) -> Option<usize> {
        self.material.iter().position(|m| m.name == name)
    }

    /// True if the model has no instanced triangles
    pub fn is_empty(&self) -> bool {
        self.stats().instanced_triangles == 0
    }

    /// True if some instance `i` is not the identity placement of mesh `i`.
    /// Meshes past the last instance are not checked.
    pub fn has_instancing(&self) -> bool {
        self.instance
            .iter()
            .enumerate()
            .any(|(i, inst)| *inst != Instance::new(i))
    }

    /// Gather the counts printed after loading a model
    pub fn stats(&self) -> ModelStats {
        let mesh_sizes: Vec<usize> = self.mesh.iter().map(Mesh::size).collect();
        let instance_sizes: Vec<usize> = self
            .instance
            .iter()
            .map(|inst| self.mesh.get(inst.mesh_id).map_or(0, Mesh::size))
            .collect();

        ModelStats {
            num_materials: self.material.len(),
            unique_triangles: mesh_sizes.iter().sum(),
            instanced_triangles: instance_sizes.iter().sum(),
            mesh_sizes,
            instance_sizes,
        }
    }
}

impl Bounded for Model {
    fn bounding_box(&self) -> BoundingBox {
        let mut bounds = BoundingBox::empty();

        if self.instance.is_empty() {
            for mesh in &self.mesh {
                bounds = bounds.union(&mesh.bounding_box());
            }
            return bounds;
        }

        for inst in &self.instance {
            if let Some(mesh) = self.mesh.get(inst.mesh_id) {
                for p in &mesh.position {
                    bounds.extend(&inst.xfm.transform_point(p));
                }
            }
        }
        bounds
    }
}

/// Summary counts of a model
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelStats {
    pub num_materials: usize,
    /// Triangle count of each mesh
    pub mesh_sizes: Vec<usize>,
    /// Triangle count of the mesh behind each instance
    pub instance_sizes: Vec<usize>,
    pub unique_triangles: usize,
    pub instanced_triangles: usize,
}

const LISTED_SIZES: usize = 10;

fn write_sizes(f: &mut fmt::Formatter<'_>, sizes: &[usize]) -> fmt::Result {
    write!(f, "{} ", sizes.len())?;
    for (i, size) in sizes.iter().enumerate() {
        if i < LISTED_SIZES {
            write!(f, "[{}]", size)?;
        } else {
            write!(f, "...")?;
            break;
        }
    }
    writeln!(f)
}

impl fmt::Display for ModelStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "  - num materials: {}", self.num_materials)?;
        write!(f, "  - num meshes   : ")?;
        write_sizes(f, &self.mesh_sizes)?;
        write!(f, "  - num instances: ")?;
        write_sizes(f, &self.instance_sizes)?;
        writeln!(f, "  - num unique triangles   : {}", self.unique_triangles)?;
        write!(f, "  - num instanced triangles: {}", self.instanced_triangles)
    }
}
