//! OBJ format support

use crate::{IoError, SceneImporter};
use msgview_core::{Material, Mesh, Model, Point3f, Result, Triangle, Vector3f};
use obj::{IndexTuple, Obj, ObjData, ObjMaterial};
use std::collections::HashMap;
use std::path::Path;

pub struct ObjReader;

impl SceneImporter for ObjReader {
    fn import<P: AsRef<Path>>(model: &mut Model, path: P) -> Result<()> {
        let path = path.as_ref();
        let mut obj = Obj::load(path).map_err(|e| IoError::parse(path, e.to_string()))?;

        if !obj.data.material_libs.is_empty() {
            if let Err(e) = obj.load_mtls() {
                log::warn!("{}: could not load material libraries: {:?}", path.display(), e);
            }
        }

        let added = Self::add_to_model(model, &obj.data).map_err(|message| IoError::parse(path, message))?;
        log::debug!("{}: {} meshes", path.display(), added);
        Ok(())
    }
}

impl ObjReader {
    /// Parse OBJ text without resolving material libraries
    pub fn read_model<R: std::io::Read>(input: R) -> Result<Model> {
        let data = ObjData::load_buf(input).map_err(|e| IoError::parse("<buffer>", e.to_string()))?;
        let mut model = Model::new();
        Self::add_to_model(&mut model, &data).map_err(|message| IoError::parse("<buffer>", message))?;
        Ok(model)
    }

    /// Append one mesh per non-empty group, returning how many were added
    fn add_to_model(model: &mut Model, data: &ObjData) -> std::result::Result<usize, String> {
        let mut added = 0;

        for object in &data.objects {
            for group in &object.groups {
                if group.polys.is_empty() {
                    continue;
                }

                let name = if group.name.is_empty() || group.name == "default" {
                    object.name.clone()
                } else {
                    format!("{}/{}", object.name, group.name)
                };

                let mut builder = GroupBuilder::new(data, name);
                for poly in &group.polys {
                    builder.add_polygon(&poly.0)?;
                }

                let mut mesh = builder.finish();
                mesh.material = group.material.as_ref().and_then(|m| resolve_material(model, m));
                model.add_mesh_instance(mesh);
                added += 1;
            }
        }

        Ok(added)
    }
}

fn resolve_material(model: &mut Model, material: &ObjMaterial) -> Option<usize> {
    match material {
        ObjMaterial::Mtl(mtl) => {
            if let Some(id) = model.find_material(&mtl.name) {
                return Some(id);
            }
            let defaults = Material::default();
            Some(model.add_material(Material {
                name: mtl.name.clone(),
                kd: mtl.kd.unwrap_or(defaults.kd),
                ks: mtl.ks.unwrap_or(defaults.ks),
                ns: mtl.ns.unwrap_or(defaults.ns),
                d: mtl.d.unwrap_or(defaults.d),
            }))
        }
        ObjMaterial::Ref(name) => {
            let found = model.find_material(name);
            if found.is_none() {
                log::warn!("material '{}' is not defined in any loaded material library", name);
            }
            found
        }
    }
}

/// Builds one mesh out of a group, giving each distinct
/// position/texcoord/normal combination its own vertex
struct GroupBuilder<'a> {
    data: &'a ObjData,
    mesh: Mesh,
    vertices: HashMap<(usize, Option<usize>, Option<usize>), u32>,
    has_normals: bool,
    has_texcoords: bool,
}

impl<'a> GroupBuilder<'a> {
    fn new(data: &'a ObjData, name: String) -> Self {
        Self {
            data,
            mesh: Mesh::new(name),
            vertices: HashMap::new(),
            has_normals: true,
            has_texcoords: true,
        }
    }

    fn vertex(&mut self, tuple: &IndexTuple) -> std::result::Result<u32, String> {
        let IndexTuple(p, t, n) = *tuple;
        if let Some(&index) = self.vertices.get(&(p, t, n)) {
            return Ok(index);
        }

        let position = self
            .data
            .position
            .get(p)
            .ok_or_else(|| format!("position index {} out of range", p + 1))?;
        let index = self.mesh.add_vertex(Point3f::from(*position));

        match t.and_then(|t| self.data.texture.get(t)) {
            Some(uv) => self.mesh.texcoord.push(*uv),
            None => self.has_texcoords = false,
        }
        match n.and_then(|n| self.data.normal.get(n)) {
            Some(normal) => self.mesh.normal.push(Vector3f::from(*normal)),
            None => self.has_normals = false,
        }

        self.vertices.insert((p, t, n), index);
        Ok(index)
    }

    fn add_polygon(&mut self, corners: &[IndexTuple]) -> std::result::Result<(), String> {
        if corners.len() < 3 {
            return Ok(());
        }

        let first = self.vertex(&corners[0])?;
        let mut previous = self.vertex(&corners[1])?;
        for corner in &corners[2..] {
            let current = self.vertex(corner)?;
            self.mesh.add_triangle(Triangle::new(first, previous, current));
            previous = current;
        }
        Ok(())
    }

    fn finish(mut self) -> Mesh {
        // attributes are all-or-nothing per mesh
        if !self.has_normals {
            self.mesh.normal.clear();
        }
        if !self.has_texcoords {
            self.mesh.texcoord.clear();
        }
        self.mesh
    }
}
