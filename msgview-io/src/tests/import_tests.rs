//! Import tests against files on disk

use crate::*;
use approx::assert_relative_eq;
use msgview_core::{Affine, Bounded, Error, Material, Mesh, Model, Point3f, Triangle, Vector3f};
use std::fs;
use tempfile::TempDir;

const TRIANGLE_STL: &str = "solid t
facet normal 0 0 1
outer loop
vertex 0 0 0
vertex 2 0 0
vertex 0 2 0
endloop
endfacet
endsolid t
";

#[test]
fn test_dispatch_by_extension() {
    assert_eq!(SceneFormat::from_path("a/b/model.STL"), Some(SceneFormat::Stl));
    assert_eq!(SceneFormat::from_path("scene.xml"), Some(SceneFormat::Rivl));
    assert_eq!(SceneFormat::from_path("walk.astl"), Some(SceneFormat::AnimatedStl));
    assert_eq!(SceneFormat::from_path("noext"), None);

    let mut model = Model::new();
    match import_file(&mut model, "model.ply") {
        Err(Error::UnsupportedFormat(message)) => {
            assert_eq!(message, "unrecognized file format in filename 'model.ply'")
        }
        other => panic!("unexpected result: {:?}", other),
    }
}

#[test]
fn test_stl_file_adds_one_instanced_mesh() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("tri.stl");
    fs::write(&path, TRIANGLE_STL).unwrap();

    let mut model = Model::new();
    import_file(&mut model, &path).unwrap();
    import_file(&mut model, &path).unwrap();

    assert_eq!(model.mesh.len(), 2);
    assert_eq!(model.mesh[0].name, "tri");
    assert!(!model.has_instancing());
    assert_eq!(model.bounding_box().max, Point3f::new(2.0, 2.0, 0.0));
}

#[test]
fn test_missing_file_is_an_io_error() {
    let dir = TempDir::new().unwrap();
    let mut model = Model::new();
    let result = import_file(&mut model, dir.path().join("absent.stl"));
    assert!(matches!(result, Err(Error::Io(_))));
}

#[test]
fn test_obj_with_material_library() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("scene.mtl"),
        "newmtl gold\nKd 1.0 0.8 0.2\nKs 0.5 0.5 0.5\nNs 40\nd 0.5\n",
    )
    .unwrap();
    fs::write(
        dir.path().join("scene.obj"),
        "mtllib scene.mtl\nv 0 0 0\nv 1 0 0\nv 0 1 0\nusemtl gold\nf 1 2 3\n",
    )
    .unwrap();

    let mut model = Model::new();
    import_file(&mut model, dir.path().join("scene.obj")).unwrap();

    assert_eq!(model.mesh.len(), 1);
    let material = &model.material[model.mesh[0].material.unwrap()];
    assert_eq!(material.name, "gold");
    for (got, want) in material.kd.iter().zip([1.0, 0.8, 0.2]) {
        assert_relative_eq!(*got, want);
    }
    assert_relative_eq!(material.ns, 40.0);
    assert_relative_eq!(material.d, 0.5);
}

#[test]
fn test_msg_file_written_and_imported() {
    let mut source = Model::new();
    let mat = source.add_material(Material::named("blue"));
    let mut mesh = Mesh::new("tri");
    mesh.add_vertex(Point3f::new(0.0, 0.0, 0.0));
    mesh.add_vertex(Point3f::new(1.0, 0.0, 0.0));
    mesh.add_vertex(Point3f::new(0.0, 1.0, 0.0));
    mesh.normal = vec![Vector3f::z(); 3];
    mesh.add_triangle(Triangle::new(0, 1, 2));
    mesh.material = Some(mat);
    source.add_mesh_instance(mesh);

    let dir = TempDir::new().unwrap();
    let path = dir.path().join("scene.msg");
    MsgWriter::write_model(&source, &path).unwrap();

    let mut model = Model::new();
    import_file(&mut model, &path).unwrap();
    assert_eq!(model.stats(), source.stats());
    assert_eq!(model.mesh[0].normal.len(), 3);
    assert_eq!(model.material[0].name, "blue");
    assert_eq!(model.instance[0].xfm, Affine::identity());
}

#[test]
fn test_corrupt_msg_names_the_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("bad.msg");
    fs::write(&path, b"MSG\0\x01\x00\x00\x00\x05").unwrap();

    let mut model = Model::new();
    match import_file(&mut model, &path) {
        Err(Error::InvalidData(message)) => {
            assert!(message.contains("bad.msg"), "{}", message);
            assert!(message.contains("unexpected end of file"), "{}", message);
        }
        other => panic!("unexpected result: {:?}", other),
    }
}

#[test]
fn test_msg_with_huge_mesh_count_is_invalid_data() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("huge.msg");
    let mut bytes = b"MSG\0".to_vec();
    bytes.extend_from_slice(&1u32.to_le_bytes());
    bytes.extend_from_slice(&0u32.to_le_bytes());
    bytes.extend_from_slice(&(1u32 << 28).to_le_bytes());
    fs::write(&path, bytes).unwrap();

    let mut model = Model::new();
    assert!(matches!(import_file(&mut model, &path), Err(Error::InvalidData(_))));
    assert!(model.mesh.is_empty());
}

#[test]
fn test_msg_write_failure_names_the_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("missing").join("scene.msg");

    match MsgWriter::write_model(&Model::new(), &path) {
        Err(Error::Io(e)) => {
            assert_eq!(e.kind(), std::io::ErrorKind::NotFound);
            assert!(e.to_string().contains("could not write"), "{}", e);
            assert!(e.to_string().contains("scene.msg"), "{}", e);
        }
        other => panic!("unexpected result: {:?}", other),
    }
}

#[test]
fn test_animation_frames() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("f0.stl"), TRIANGLE_STL).unwrap();
    fs::write(dir.path().join("f1.stl"), TRIANGLE_STL).unwrap();
    fs::write(dir.path().join("walk.astl"), "# frames\nf0.stl\n\nf1.stl\n").unwrap();

    let mut frames = Vec::new();
    import_stl_animation(&mut frames, dir.path().join("walk.astl")).unwrap();
    assert_eq!(frames.len(), 2);
    assert!(frames.iter().all(|f| f.stats().instanced_triangles == 1));

    let mut model = Model::new();
    assert!(matches!(
        import_file(&mut model, dir.path().join("walk.astl")),
        Err(Error::Unsupported(_))
    ));
}

#[test]
fn test_empty_animation_list() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("none.astl"), "# nothing here\n").unwrap();

    let mut frames = Vec::new();
    assert!(import_stl_animation(&mut frames, dir.path().join("none.astl")).is_err());
    assert!(frames.is_empty());
}
