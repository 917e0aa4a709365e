//! End-to-end runs of the msgview binary in headless mode

use msgview_core::{Affine, Instance, Mesh, Model, Point3f, Triangle, Vector3f};
use msgview_io::MsgWriter;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

const BACKGROUND: [u8; 4] = [26, 26, 26, 255];
const INSTANCING_ERROR: &str =
    "msgview fatal error : found a scene that seems to contain instances, but msgview does not yet support instancing";

fn msgview_logged(args: &[&str], log_level: &str) -> Output {
    Command::new(env!("CARGO_BIN_EXE_msgview"))
        .args(args)
        .env("RUST_LOG", log_level)
        .output()
        .expect("failed to run msgview")
}

fn msgview(args: &[&str]) -> Output {
    msgview_logged(args, "warn")
}

/// Tetrahedron mesh matching the STL written by `write_tetrahedron`
fn tetrahedron_mesh() -> Mesh {
    let mut mesh = Mesh::new("tetra");
    for p in [[1.0f32, 1.0, 1.0], [-1.0, -1.0, 1.0], [-1.0, 1.0, -1.0], [1.0, -1.0, -1.0]] {
        mesh.add_vertex(Point3f::from(p));
    }
    for [a, b, c] in [[0, 1, 2], [0, 3, 1], [0, 2, 3], [1, 3, 2]] {
        mesh.add_triangle(Triangle::new(a, b, c));
    }
    mesh
}

/// Binary STL of a tetrahedron around the origin
fn write_tetrahedron(path: &Path) {
    let p = [[1.0f32, 1.0, 1.0], [-1.0, -1.0, 1.0], [-1.0, 1.0, -1.0], [1.0, -1.0, -1.0]];
    let faces = [[0, 1, 2], [0, 3, 1], [0, 2, 3], [1, 3, 2]];

    let mut bytes = vec![0u8; 80];
    bytes.extend_from_slice(&(faces.len() as u32).to_le_bytes());
    for face in faces {
        bytes.extend_from_slice(&[0u8; 12]);
        for v in face {
            for c in p[v] {
                bytes.extend_from_slice(&c.to_le_bytes());
            }
        }
        bytes.extend_from_slice(&[0u8; 2]);
    }
    std::fs::write(path, bytes).unwrap();
}

#[test]
fn test_renders_stl_to_png() {
    let dir = TempDir::new().unwrap();
    let stl = dir.path().join("tetra.stl");
    let png = dir.path().join("out.png");
    write_tetrahedron(&stl);

    let output = msgview(&[
        "--size",
        "64x48",
        "-o",
        png.to_str().unwrap(),
        stl.to_str().unwrap(),
    ]);
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("num unique triangles   : 4"));

    let image = image::open(&png).unwrap().to_rgba8();
    assert_eq!(image.dimensions(), (64, 48));

    // the tetrahedron is framed in the middle; the corner shows the background
    assert_eq!(image.get_pixel(0, 0).0, BACKGROUND);
    assert_ne!(image.get_pixel(32, 24).0, BACKGROUND);
}

#[test]
fn test_ao_module_renderer() {
    let dir = TempDir::new().unwrap();
    let stl = dir.path().join("tetra.stl");
    let png = dir.path().join("ao.png");
    write_tetrahedron(&stl);

    let output = msgview(&[
        "--plugin",
        "ao",
        "--renderer",
        "ao2",
        "--size",
        "16x16",
        "-o",
        png.to_str().unwrap(),
        stl.to_str().unwrap(),
    ]);
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    assert!(png.exists());
}

#[test]
fn test_no_input_is_fatal() {
    let output = msgview(&[]);
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("msgview fatal error : no (valid) input files specified - model contains no triangles"));
    assert!(stderr.contains("Usage"));
}

#[test]
fn test_unknown_extension_is_fatal() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("scene.xyz");
    std::fs::write(&file, "1 2 3\n").unwrap();

    let output = msgview(&["-o", "unused.png", file.to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("unrecognized file format in filename"));
}

#[test]
fn test_unknown_renderer_is_fatal() {
    let dir = TempDir::new().unwrap();
    let stl = dir.path().join("tetra.stl");
    write_tetrahedron(&stl);

    let output = msgview(&["--renderer", "pathtracer", "-o", "unused.png", stl.to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("could not create renderer 'pathtracer'"));
}

#[test]
fn test_animation_renders_first_frame() {
    let dir = TempDir::new().unwrap();
    write_tetrahedron(&dir.path().join("a.stl"));
    write_tetrahedron(&dir.path().join("b.stl"));
    let list = dir.path().join("anim.astl");
    std::fs::write(&list, "# two frames\na.stl\n\nb.stl\n").unwrap();
    let png = dir.path().join("anim.png");

    let output = msgview(&["--size", "8x8", "-o", png.to_str().unwrap(), list.to_str().unwrap()]);
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    assert!(png.exists());
}

#[test]
fn test_mesh_without_material_renders_red() {
    let dir = TempDir::new().unwrap();
    let stl = dir.path().join("tetra.stl");
    let png = dir.path().join("red.png");
    write_tetrahedron(&stl);

    let output = msgview_logged(
        &["--renderer", "obj", "--size", "64x48", "-o", png.to_str().unwrap(), stl.to_str().unwrap()],
        "info",
    );
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("adding default material"), "{}", stderr);
    assert!(stderr.contains("has no material"), "{}", stderr);

    let image = image::open(&png).unwrap().to_rgba8();
    let [r, g, b, a] = image.get_pixel(32, 24).0;
    assert!(r > 0, "center pixel {:?}", (r, g, b, a));
    assert_eq!((g, b, a), (0, 0, 255));
}

#[test]
fn test_renders_msg_file() {
    let dir = TempDir::new().unwrap();
    let msg = dir.path().join("scene.msg");
    let png = dir.path().join("msg.png");

    let mut model = Model::new();
    model.add_mesh_instance(tetrahedron_mesh());
    MsgWriter::write_model(&model, &msg).unwrap();

    let output = msgview(&["--size", "64x48", "-o", png.to_str().unwrap(), msg.to_str().unwrap()]);
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    assert!(String::from_utf8_lossy(&output.stdout).contains("num unique triangles   : 4"));

    let image = image::open(&png).unwrap().to_rgba8();
    assert_ne!(image.get_pixel(32, 24).0, BACKGROUND);
}

#[test]
fn test_instanced_msg_is_fatal() {
    let dir = TempDir::new().unwrap();
    let msg = dir.path().join("instanced.msg");

    let mut model = Model::new();
    let id = model.add_mesh_instance(tetrahedron_mesh());
    model.instance.push(Instance::with_transform(
        id,
        Affine::translation(Vector3f::new(3.0, 0.0, 0.0)),
    ));
    MsgWriter::write_model(&model, &msg).unwrap();

    let output = msgview(&["-o", "unused.png", msg.to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stdout).contains("num instanced triangles: 8"));
    assert!(String::from_utf8_lossy(&output.stderr).contains(INSTANCING_ERROR));
    assert!(!Path::new("unused.png").exists());
}

#[test]
fn test_rivl_with_transform_is_fatal() {
    let dir = TempDir::new().unwrap();
    let xml = dir.path().join("scene.xml");

    // one triangle, referenced directly and through a translation
    let mut bin = Vec::new();
    for v in [0.0f32, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0] {
        bin.extend_from_slice(&v.to_le_bytes());
    }
    for v in [0i32, 1, 2, 0] {
        bin.extend_from_slice(&v.to_le_bytes());
    }
    std::fs::write(dir.path().join("scene.xml.bin"), bin).unwrap();
    std::fs::write(
        &xml,
        r#"<?xml version="1.0"?>
<BGFscene>
  <Material id="0" name="paint">
    <param name="kd" type="float3">0.1 0.2 0.3</param>
  </Material>
  <Mesh id="1">
    <vertex ofs="0" num="3"/>
    <prim ofs="36" num="1"/>
    <materiallist>0</materiallist>
  </Mesh>
  <Transform id="2" child="1">1 0 0 0 1 0 0 0 1 5 0 0</Transform>
  <Group id="3">1 2</Group>
</BGFscene>
"#,
    )
    .unwrap();

    let output = msgview(&["-o", "unused.png", xml.to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains(INSTANCING_ERROR));
}
