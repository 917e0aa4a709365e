//! RIVL format support
//!
//! A RIVL scene is an XML node list plus a binary sidecar (`<file>.bin`) that
//! holds the bulk mesh data. Every top-level element is a node with an `id`;
//! the last node is the scene root. Supported nodes:
//!
//! - `Material` with `<param name=".." type="float|float3">values</param>` children
//! - `Texture2D` (skipped)
//! - `Transform child="id"` whose text holds 12 floats: three columns, then translation
//! - `Group` whose text lists child ids
//! - `Mesh` with `vertex`, `normal`, `texcoord` and `prim` children giving byte
//!   offsets (`ofs`) and element counts (`num`) into the sidecar, and a
//!   `materiallist` of material ids. Primitives are four i32s: three vertex
//!   indices and a material slot.
//!
//! Each mesh node becomes one mesh, instanced once per path reaching it.

use crate::{IoError, SceneImporter};
use byteorder::{LittleEndian, ReadBytesExt};
use msgview_core::{Affine, Instance, Material, Mesh, Model, Point3f, Result, Triangle, Vector3f};
use roxmltree::{Document, Node};
use std::collections::HashMap;
use std::io::Cursor;
use std::path::{Path, PathBuf};

/// Nesting deeper than this is treated as a reference cycle
const MAX_DEPTH: usize = 256;

pub struct RivlReader;

impl SceneImporter for RivlReader {
    fn import<P: AsRef<Path>>(model: &mut Model, path: P) -> Result<()> {
        let path = path.as_ref();
        let xml = std::fs::read_to_string(path)?;

        let bin_path = sidecar_path(path);
        let bin = if bin_path.exists() {
            std::fs::read(&bin_path)?
        } else {
            log::warn!("{}: no binary file {}", path.display(), bin_path.display());
            Vec::new()
        };

        Self::import_document(model, &xml, &bin).map_err(|message| IoError::parse(path, message))?;
        Ok(())
    }
}

/// `scene.xml` keeps its data in `scene.xml.bin`
pub fn sidecar_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".bin");
    PathBuf::from(name)
}

impl RivlReader {
    /// Import an XML document whose mesh data lives in `bin`
    pub fn import_document(model: &mut Model, xml: &str, bin: &[u8]) -> std::result::Result<(), String> {
        let doc = Document::parse(xml).map_err(|e| format!("malformed XML: {}", e))?;

        let mut nodes = HashMap::new();
        let mut root = None;
        for node in doc.root_element().children().filter(Node::is_element) {
            let id = node_id(&node)?;
            if nodes.insert(id, node).is_some() {
                return Err(format!("duplicate node id {}", id));
            }
            root = Some(id);
        }

        let root = root.ok_or("scene contains no nodes")?;
        let mut importer = Importer {
            nodes,
            bin,
            model,
            meshes: HashMap::new(),
            materials: HashMap::new(),
        };
        importer.traverse(root, Affine::identity(), 0)
    }
}

struct Importer<'a, 'input> {
    nodes: HashMap<usize, Node<'a, 'input>>,
    bin: &'a [u8],
    model: &'a mut Model,
    /// node id -> mesh id in the model
    meshes: HashMap<usize, usize>,
    /// node id -> material id in the model
    materials: HashMap<usize, usize>,
}

impl<'a, 'input> Importer<'a, 'input> {
    fn node(&self, id: usize) -> std::result::Result<Node<'a, 'input>, String> {
        self.nodes.get(&id).copied().ok_or_else(|| format!("reference to unknown node {}", id))
    }

    fn traverse(&mut self, id: usize, xfm: Affine, depth: usize) -> std::result::Result<(), String> {
        if depth > MAX_DEPTH {
            return Err(format!("node {} nested too deeply (cyclic references?)", id));
        }

        let node = self.node(id)?;
        match node.tag_name().name() {
            "Group" => {
                for child in parse_list::<usize>(node.text().unwrap_or(""))
                    .map_err(|e| format!("group {}: {}", id, e))?
                {
                    self.traverse(child, xfm, depth + 1)?;
                }
            }
            "Transform" => {
                let child = node
                    .attribute("child")
                    .ok_or_else(|| format!("transform {} has no child", id))?
                    .trim()
                    .parse::<usize>()
                    .map_err(|_| format!("transform {} has an invalid child id", id))?;
                let values = parse_list::<f32>(node.text().unwrap_or(""))
                    .map_err(|e| format!("transform {}: {}", id, e))?;
                let columns: [f32; 12] = values
                    .try_into()
                    .map_err(|v: Vec<f32>| format!("transform {} has {} values, expected 12", id, v.len()))?;
                self.traverse(child, xfm * Affine::from_columns(&columns), depth + 1)?;
            }
            "Mesh" => {
                let mesh_id = match self.meshes.get(&id) {
                    Some(&mesh_id) => mesh_id,
                    None => {
                        let mesh = self.read_mesh(id, node)?;
                        let mesh_id = self.model.add_mesh(mesh);
                        self.meshes.insert(id, mesh_id);
                        mesh_id
                    }
                };
                self.model.instance.push(Instance::with_transform(mesh_id, xfm));
            }
            "Material" | "Texture2D" => {}
            other => log::warn!("ignoring unknown RIVL node type '{}' (id {})", other, id),
        }

        Ok(())
    }

    fn read_mesh(&mut self, id: usize, node: Node) -> std::result::Result<Mesh, String> {
        let mut mesh = Mesh::new(format!("rivl_mesh_{}", id));
        let mut material_ids = Vec::new();

        for child in node.children().filter(Node::is_element) {
            match child.tag_name().name() {
                "vertex" => {
                    mesh.position = self.read_floats::<3>(id, &child)?.into_iter().map(Point3f::from).collect();
                }
                "normal" => {
                    mesh.normal = self.read_floats::<3>(id, &child)?.into_iter().map(Vector3f::from).collect();
                }
                "texcoord" => {
                    mesh.texcoord = self.read_floats::<2>(id, &child)?;
                }
                "prim" => {
                    mesh.triangle = self
                        .read_ints::<4>(id, &child)?
                        .into_iter()
                        .map(|p| {
                            if p[..3].iter().any(|&v| v < 0) {
                                return Err(format!("mesh {} has a negative vertex index", id));
                            }
                            Ok(Triangle::new(p[0] as u32, p[1] as u32, p[2] as u32))
                        })
                        .collect::<std::result::Result<_, _>>()?;
                }
                "materiallist" => {
                    material_ids = parse_list::<usize>(child.text().unwrap_or(""))
                        .map_err(|e| format!("mesh {} material list: {}", id, e))?;
                }
                other => log::debug!("mesh {}: skipping '{}'", id, other),
            }
        }

        // triangles of one mesh share a single material: the first in the list
        if let Some(&material_node) = material_ids.first() {
            mesh.material = Some(self.material(material_node)?);
        }

        mesh.validate()?;
        Ok(mesh)
    }

    fn material(&mut self, id: usize) -> std::result::Result<usize, String> {
        if let Some(&material_id) = self.materials.get(&id) {
            return Ok(material_id);
        }

        let node = self.node(id)?;
        if node.tag_name().name() != "Material" {
            return Err(format!("node {} is referenced as a material but is a {}", id, node.tag_name().name()));
        }

        let mut material = Material::named(node.attribute("name").map_or_else(|| format!("material_{}", id), str::to_string));
        for param in node.children().filter(|c| c.has_tag_name("param")) {
            let name = param.attribute("name").unwrap_or("").to_ascii_lowercase();
            let values = parse_list::<f32>(param.text().unwrap_or(""))
                .map_err(|e| format!("material {} parameter '{}': {}", id, name, e))?;
            match (name.as_str(), values.as_slice()) {
                ("kd", &[r, g, b]) => material.kd = [r, g, b],
                ("ks", &[r, g, b]) => material.ks = [r, g, b],
                ("ns", &[v]) => material.ns = v,
                ("d", &[v]) => material.d = v,
                _ => log::debug!("material {}: ignoring parameter '{}'", id, name),
            }
        }

        let material_id = self.model.add_material(material);
        self.materials.insert(id, material_id);
        Ok(material_id)
    }

    /// Byte range of a data child, checked against the sidecar size
    fn data_range(&self, id: usize, child: &Node, stride: usize) -> std::result::Result<&'a [u8], String> {
        let attr = |name: &str| -> std::result::Result<usize, String> {
            child
                .attribute(name)
                .ok_or_else(|| format!("mesh {}: <{}> has no '{}'", id, child.tag_name().name(), name))?
                .trim()
                .parse()
                .map_err(|_| format!("mesh {}: <{}> has an invalid '{}'", id, child.tag_name().name(), name))
        };
        let ofs = attr("ofs")?;
        let num = attr("num")?;

        let end = num
            .checked_mul(stride)
            .and_then(|len| len.checked_add(ofs))
            .filter(|&end| end <= self.bin.len())
            .ok_or_else(|| {
                format!(
                    "mesh {}: <{}> data exceeds the binary file ({} bytes)",
                    id,
                    child.tag_name().name(),
                    self.bin.len()
                )
            })?;
        Ok(&self.bin[ofs..end])
    }

    fn read_floats<const N: usize>(&self, id: usize, child: &Node) -> std::result::Result<Vec<[f32; N]>, String> {
        let bytes = self.data_range(id, child, N * 4)?;
        let mut cursor = Cursor::new(bytes);
        let mut out = vec![[0.0f32; N]; bytes.len() / (N * 4)];
        for item in out.iter_mut() {
            cursor.read_f32_into::<LittleEndian>(item).map_err(|e| e.to_string())?;
        }
        Ok(out)
    }

    fn read_ints<const N: usize>(&self, id: usize, child: &Node) -> std::result::Result<Vec<[i32; N]>, String> {
        let bytes = self.data_range(id, child, N * 4)?;
        let mut cursor = Cursor::new(bytes);
        let mut out = vec![[0i32; N]; bytes.len() / (N * 4)];
        for item in out.iter_mut() {
            cursor.read_i32_into::<LittleEndian>(item).map_err(|e| e.to_string())?;
        }
        Ok(out)
    }
}

fn node_id(node: &Node) -> std::result::Result<usize, String> {
    node.attribute("id")
        .ok_or_else(|| format!("<{}> node has no id", node.tag_name().name()))?
        .trim()
        .parse()
        .map_err(|_| format!("<{}> node has an invalid id", node.tag_name().name()))
}

fn parse_list<T: std::str::FromStr>(text: &str) -> std::result::Result<Vec<T>, String> {
    text.split_whitespace()
        .map(|s| s.parse().map_err(|_| format!("invalid value '{}'", s)))
        .collect()
}
