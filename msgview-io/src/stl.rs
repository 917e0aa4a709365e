//! STL format support
//!
//! Reads both binary and ASCII stereolithography files. Every file becomes a
//! single mesh; shared corners are welded by exact position so the renderer
//! gets an indexed mesh instead of a triangle soup. Facet normals are ignored.

use crate::{IoError, SceneImporter};
use byteorder::{LittleEndian, ReadBytesExt};
use msgview_core::{Mesh, Model, Point3f, Result, Triangle};
use std::collections::HashMap;
use std::io::Cursor;
use std::path::Path;

const HEADER_LEN: usize = 80;
const RECORD_LEN: usize = 50;

pub struct StlReader;

impl SceneImporter for StlReader {
    fn import<P: AsRef<Path>>(model: &mut Model, path: P) -> Result<()> {
        let path = path.as_ref();
        let mesh = Self::read_mesh(path)?;
        log::debug!("{}: {} triangles", path.display(), mesh.size());
        model.add_mesh_instance(mesh);
        Ok(())
    }
}

impl StlReader {
    /// Read a single STL file into a mesh named after the file
    pub fn read_mesh<P: AsRef<Path>>(path: P) -> Result<Mesh> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();

        Ok(Self::parse(&bytes, name).map_err(|message| IoError::parse(path, message))?)
    }

    /// Parse STL content, detecting binary versus ASCII encoding
    pub fn parse(bytes: &[u8], name: impl Into<String>) -> std::result::Result<Mesh, String> {
        let mut builder = WeldingBuilder::new(name.into());

        if is_binary(bytes) {
            parse_binary(bytes, &mut builder)?;
        } else if starts_with_solid(bytes) {
            let text = std::str::from_utf8(bytes).map_err(|e| format!("ASCII STL is not valid UTF-8: {}", e))?;
            parse_ascii(text, &mut builder)?;
        } else if bytes.len() < HEADER_LEN + 4 {
            return Err(format!("file too short for a binary STL ({} bytes)", bytes.len()));
        } else {
            let count = declared_count(bytes);
            return Err(format!(
                "binary STL declares {} triangles but holds {} bytes of records",
                count,
                bytes.len() - HEADER_LEN - 4
            ));
        }

        Ok(builder.finish())
    }
}

fn declared_count(bytes: &[u8]) -> usize {
    let mut cursor = Cursor::new(&bytes[HEADER_LEN..]);
    cursor.read_u32::<LittleEndian>().unwrap_or(0) as usize
}

// Binary files may also begin with "solid" in their header, so the size check
// takes precedence over the keyword.
fn is_binary(bytes: &[u8]) -> bool {
    bytes.len() >= HEADER_LEN + 4 && HEADER_LEN + 4 + RECORD_LEN * declared_count(bytes) == bytes.len()
}

fn starts_with_solid(bytes: &[u8]) -> bool {
    let start = bytes.iter().position(|b| !b.is_ascii_whitespace()).unwrap_or(bytes.len());
    bytes[start..].starts_with(b"solid")
}

fn parse_binary(bytes: &[u8], builder: &mut WeldingBuilder) -> std::result::Result<(), String> {
    let count = declared_count(bytes);
    let mut cursor = Cursor::new(&bytes[HEADER_LEN + 4..]);
    let read_vec = |cursor: &mut Cursor<&[u8]>| -> std::io::Result<Point3f> {
        Ok(Point3f::new(
            cursor.read_f32::<LittleEndian>()?,
            cursor.read_f32::<LittleEndian>()?,
            cursor.read_f32::<LittleEndian>()?,
        ))
    };

    for i in 0..count {
        let record = (|| -> std::io::Result<[Point3f; 3]> {
            let _normal = read_vec(&mut cursor)?;
            let corners = [read_vec(&mut cursor)?, read_vec(&mut cursor)?, read_vec(&mut cursor)?];
            let _attributes = cursor.read_u16::<LittleEndian>()?;
            Ok(corners)
        })()
        .map_err(|e| format!("triangle {}: {}", i, e))?;

        builder.add_triangle(record);
    }

    Ok(())
}

fn parse_ascii(text: &str, builder: &mut WeldingBuilder) -> std::result::Result<(), String> {
    let mut tokens = text.split_whitespace();
    let mut corners = Vec::with_capacity(3);

    while let Some(token) = tokens.next() {
        if token != "vertex" {
            continue;
        }

        let mut coord = [0.0f32; 3];
        for c in coord.iter_mut() {
            let value = tokens.next().ok_or("unexpected end of file inside a vertex")?;
            *c = value
                .parse()
                .map_err(|_| format!("invalid vertex coordinate '{}'", value))?;
        }
        corners.push(Point3f::new(coord[0], coord[1], coord[2]));

        if corners.len() == 3 {
            builder.add_triangle([corners[0], corners[1], corners[2]]);
            corners.clear();
        }
    }

    if !corners.is_empty() {
        return Err(format!("facet with only {} vertices", corners.len()));
    }

    Ok(())
}

/// Accumulates triangles, merging bit-identical corner positions
struct WeldingBuilder {
    mesh: Mesh,
    index: HashMap<[u32; 3], u32>,
}

impl WeldingBuilder {
    fn new(name: String) -> Self {
        Self {
            mesh: Mesh::new(name),
            index: HashMap::new(),
        }
    }

    fn vertex(&mut self, p: Point3f) -> u32 {
        let key = [p.x.to_bits(), p.y.to_bits(), p.z.to_bits()];
        let mesh = &mut self.mesh;
        *self.index.entry(key).or_insert_with(|| mesh.add_vertex(p))
    }

    fn add_triangle(&mut self, corners: [Point3f; 3]) {
        let v0 = self.vertex(corners[0]);
        let v1 = self.vertex(corners[1]);
        let v2 = self.vertex(corners[2]);
        self.mesh.add_triangle(Triangle::new(v0, v1, v2));
    }

    fn finish(self) -> Mesh {
        self.mesh
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use byteorder::WriteBytesExt;

    const ASCII_TETRA: &str = "solid tetra
  facet normal 0 0 -1
    outer loop
      vertex 0 0 0
      vertex 0 1 0
      vertex 1 0 0
    endloop
  endfacet
  facet normal 0 -1 0
    outer loop
      vertex 0 0 0
      vertex 1 0 0
      vertex 0 0 1
    endloop
  endfacet
endsolid tetra
";

    fn binary_stl(header: &[u8], triangles: &[[[f32; 3]; 3]]) -> Vec<u8> {
        let mut bytes = vec![0u8; HEADER_LEN];
        bytes[..header.len()].copy_from_slice(header);
        bytes.write_u32::<LittleEndian>(triangles.len() as u32).unwrap();
        for tri in triangles {
            for _ in 0..3 {
                bytes.write_f32::<LittleEndian>(0.0).unwrap();
            }
            for corner in tri {
                for c in corner {
                    bytes.write_f32::<LittleEndian>(*c).unwrap();
                }
            }
            bytes.write_u16::<LittleEndian>(0).unwrap();
        }
        bytes
    }

    #[test]
    fn test_ascii_welds_shared_corners() {
        let mesh = StlReader::parse(ASCII_TETRA.as_bytes(), "tetra").unwrap();
        assert_eq!(mesh.name, "tetra");
        assert_eq!(mesh.size(), 2);
        assert_eq!(mesh.vertex_count(), 4);
        assert_eq!(mesh.triangle[1], Triangle::new(0, 2, 3));
        assert!(mesh.validate().is_ok());
    }

    #[test]
    fn test_binary_with_solid_header() {
        let bytes = binary_stl(
            b"solid but actually binary",
            &[[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]]],
        );
        let mesh = StlReader::parse(&bytes, "bin").unwrap();
        assert_eq!(mesh.size(), 1);
        assert_eq!(mesh.position[1], Point3f::new(1.0, 0.0, 0.0));
    }

    #[test]
    fn test_binary_truncated() {
        let mut bytes = binary_stl(b"", &[[[0.0; 3]; 3], [[1.0; 3]; 3]]);
        bytes.truncate(bytes.len() - 10);
        let err = StlReader::parse(&bytes, "broken").unwrap_err();
        assert!(err.contains("declares 2 triangles"));
    }

    #[test]
    fn test_ascii_incomplete_facet() {
        let text = "solid x\nfacet normal 0 0 1\nouter loop\nvertex 0 0 0\nvertex 1 0 0\nendloop\nendfacet\nendsolid\n";
        assert!(StlReader::parse(text.as_bytes(), "x").is_err());
    }

    #[test]
    fn test_empty_binary_is_an_empty_mesh() {
        let bytes = binary_stl(b"", &[]);
        let mesh = StlReader::parse(&bytes, "empty").unwrap();
        assert!(mesh.is_empty());
    }
}
