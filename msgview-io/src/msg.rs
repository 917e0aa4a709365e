//! MSG format support
//!
//! MSG is a little-endian binary dump of a mini scene graph:
//!
//! ```text
//! magic "MSG\0" | version u32
//! u32 material count, per material: name, kd f32x3, ks f32x3, ns f32, d f32
//! u32 mesh count, per mesh: name, material i32 (-1 for none),
//!     u32 n + n*f32x3 positions, u32 n + n*f32x3 normals,
//!     u32 n + n*f32x2 texcoords, u32 n + n*u32x3 triangles
//! u32 instance count, per instance: mesh u32, 9 f32 linear (columns), 3 f32 translation
//! ```
//!
//! Strings are a u32 byte length followed by UTF-8.

use crate::{IoError, SceneImporter};
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use msgview_core::{Affine, Instance, Material, Mesh, Model, Point3f, Result, Triangle, Vector3f};
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

pub const MAGIC: &[u8; 4] = b"MSG\0";
pub const VERSION: u32 = 1;

// Upper bound on any single element count
const MAX_COUNT: u32 = 1 << 28;

// Counts come from the file, so buffers only reserve this many elements up
// front and grow as records are actually read.
const PREALLOC_LIMIT: usize = 4096;

pub struct MsgReader;
pub struct MsgWriter;

impl SceneImporter for MsgReader {
    fn import<P: AsRef<Path>>(model: &mut Model, path: P) -> Result<()> {
        let path = path.as_ref();
        let mut reader = BufReader::new(File::open(path)?);
        Self::read_into(model, &mut reader).map_err(|e| match e {
            DecodeError::Io(e) if e.kind() != std::io::ErrorKind::UnexpectedEof => IoError::Io(e),
            DecodeError::Io(_) => IoError::parse(path, "unexpected end of file"),
            DecodeError::Invalid(message) => IoError::parse(path, message),
        })?;
        Ok(())
    }
}

#[derive(Debug)]
enum DecodeError {
    Io(std::io::Error),
    Invalid(String),
}

impl From<std::io::Error> for DecodeError {
    fn from(e: std::io::Error) -> Self {
        DecodeError::Io(e)
    }
}

type Decode<T> = std::result::Result<T, DecodeError>;

impl MsgReader {
    /// Append the scene read from `reader` to `model`. Material and mesh ids
    /// in the stream are rebased onto the existing contents.
    fn read_into<R: Read>(model: &mut Model, reader: &mut R) -> Decode<()> {
        let mut magic = [0u8; 4];
        reader.read_exact(&mut magic)?;
        if &magic != MAGIC {
            return Err(DecodeError::Invalid("not an MSG file (bad magic)".to_string()));
        }
        let version = reader.read_u32::<LittleEndian>()?;
        if version != VERSION {
            return Err(DecodeError::Invalid(format!("unsupported MSG version {}", version)));
        }

        let material_base = model.material.len();
        let mesh_base = model.mesh.len();

        let num_materials = read_count(reader)?;
        let mut materials = Vec::with_capacity(num_materials.min(PREALLOC_LIMIT));
        for _ in 0..num_materials {
            materials.push(Material {
                name: read_string(reader)?,
                kd: read_f32x3(reader)?,
                ks: read_f32x3(reader)?,
                ns: reader.read_f32::<LittleEndian>()?,
                d: reader.read_f32::<LittleEndian>()?,
            });
        }

        let num_meshes = read_count(reader)?;
        let mut meshes = Vec::with_capacity(num_meshes.min(PREALLOC_LIMIT));
        for _ in 0..num_meshes {
            let mut mesh = Mesh::new(read_string(reader)?);

            mesh.material = match reader.read_i32::<LittleEndian>()? {
                -1 => None,
                id if id >= 0 && (id as usize) < num_materials => Some(material_base + id as usize),
                id => {
                    return Err(DecodeError::Invalid(format!(
                        "mesh '{}' references material {} of {}",
                        mesh.name, id, num_materials
                    )))
                }
            };

            mesh.position = read_array(reader, |r| read_f32x3(r).map(Point3f::from))?;
            mesh.normal = read_array(reader, |r| read_f32x3(r).map(Vector3f::from))?;
            mesh.texcoord = read_array(reader, |r| {
                Ok([r.read_f32::<LittleEndian>()?, r.read_f32::<LittleEndian>()?])
            })?;
            mesh.triangle = read_array(reader, |r| {
                Ok(Triangle::new(
                    r.read_u32::<LittleEndian>()?,
                    r.read_u32::<LittleEndian>()?,
                    r.read_u32::<LittleEndian>()?,
                ))
            })?;

            mesh.validate().map_err(DecodeError::Invalid)?;
            meshes.push(mesh);
        }

        let num_instances = read_count(reader)?;
        let mut instances = Vec::with_capacity(num_instances.min(PREALLOC_LIMIT));
        for _ in 0..num_instances {
            let mesh_id = reader.read_u32::<LittleEndian>()? as usize;
            if mesh_id >= num_meshes {
                return Err(DecodeError::Invalid(format!(
                    "instance references mesh {} of {}",
                    mesh_id, num_meshes
                )));
            }
            let mut columns = [0.0f32; 12];
            reader.read_f32_into::<LittleEndian>(&mut columns)?;
            instances.push(Instance::with_transform(mesh_base + mesh_id, Affine::from_columns(&columns)));
        }

        model.material.extend(materials);
        model.mesh.extend(meshes);
        model.instance.extend(instances);
        Ok(())
    }
}

fn read_count<R: Read>(reader: &mut R) -> Decode<usize> {
    let n = reader.read_u32::<LittleEndian>()?;
    if n > MAX_COUNT {
        return Err(DecodeError::Invalid(format!("element count {} is implausibly large", n)));
    }
    Ok(n as usize)
}

/// A u32 count followed by that many elements
fn read_array<R: Read, T>(reader: &mut R, mut read_one: impl FnMut(&mut R) -> Decode<T>) -> Decode<Vec<T>> {
    let n = read_count(reader)?;
    let mut items = Vec::with_capacity(n.min(PREALLOC_LIMIT));
    for _ in 0..n {
        items.push(read_one(reader)?);
    }
    Ok(items)
}

fn read_f32x3<R: Read>(reader: &mut R) -> Decode<[f32; 3]> {
    let mut v = [0.0f32; 3];
    reader.read_f32_into::<LittleEndian>(&mut v)?;
    Ok(v)
}

fn read_string<R: Read>(reader: &mut R) -> Decode<String> {
    let len = read_count(reader)?;
    let mut bytes = Vec::with_capacity(len.min(PREALLOC_LIMIT));
    reader.by_ref().take(len as u64).read_to_end(&mut bytes)?;
    if bytes.len() != len {
        return Err(DecodeError::Io(std::io::ErrorKind::UnexpectedEof.into()));
    }
    String::from_utf8(bytes).map_err(|e| DecodeError::Invalid(format!("invalid UTF-8 in name: {}", e)))
}

impl MsgWriter {
    /// Write `model` to `path` in MSG format
    pub fn write_model<P: AsRef<Path>>(model: &Model, path: P) -> Result<()> {
        let path = path.as_ref();
        let write = || -> std::io::Result<()> {
            let mut writer = BufWriter::new(File::create(path)?);
            Self::write(model, &mut writer)?;
            writer.flush()
        };
        write().map_err(|e| IoError::write(path, e))?;
        log::debug!("wrote {} meshes to {}", model.mesh.len(), path.display());
        Ok(())
    }

    /// Serialize `model` into any writer
    pub fn write<W: Write>(model: &Model, writer: &mut W) -> std::io::Result<()> {
        writer.write_all(MAGIC)?;
        writer.write_u32::<LittleEndian>(VERSION)?;

        writer.write_u32::<LittleEndian>(model.material.len() as u32)?;
        for material in &model.material {
            write_string(writer, &material.name)?;
            write_f32s(writer, &material.kd)?;
            write_f32s(writer, &material.ks)?;
            writer.write_f32::<LittleEndian>(material.ns)?;
            writer.write_f32::<LittleEndian>(material.d)?;
        }

        writer.write_u32::<LittleEndian>(model.mesh.len() as u32)?;
        for mesh in &model.mesh {
            write_string(writer, &mesh.name)?;
            writer.write_i32::<LittleEndian>(mesh.material.map_or(-1, |id| id as i32))?;

            writer.write_u32::<LittleEndian>(mesh.position.len() as u32)?;
            for p in &mesh.position {
                write_f32s(writer, p.coords.as_slice())?;
            }
            writer.write_u32::<LittleEndian>(mesh.normal.len() as u32)?;
            for n in &mesh.normal {
                write_f32s(writer, n.as_slice())?;
            }
            writer.write_u32::<LittleEndian>(mesh.texcoord.len() as u32)?;
            for uv in &mesh.texcoord {
                write_f32s(writer, uv)?;
            }
            writer.write_u32::<LittleEndian>(mesh.triangle.len() as u32)?;
            for tri in &mesh.triangle {
                for v in tri.indices() {
                    writer.write_u32::<LittleEndian>(v)?;
                }
            }
        }

        writer.write_u32::<LittleEndian>(model.instance.len() as u32)?;
        for inst in &model.instance {
            writer.write_u32::<LittleEndian>(inst.mesh_id as u32)?;
            write_f32s(writer, &inst.xfm.to_columns())?;
        }

        Ok(())
    }
}

fn write_string<W: Write>(writer: &mut W, s: &str) -> std::io::Result<()> {
    writer.write_u32::<LittleEndian>(s.len() as u32)?;
    writer.write_all(s.as_bytes())
}

fn write_f32s<W: Write>(writer: &mut W, values: &[f32]) -> std::io::Result<()> {
    for v in values {
        writer.write_f32::<LittleEndian>(*v)?;
    }
    Ok(())
}
