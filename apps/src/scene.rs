//! Turning an imported scene graph into renderer objects

use msgview_core::{Model, Result, Triangle};
use msgview_render::{Material, PerspectiveCamera, TriangleMesh};
use msgview_visualization::ViewPort;
use std::sync::Arc;

const MISSING_MATERIAL_KD: [f32; 3] = [1.0, 0.0, 0.0];

fn render_material(model: &Model, mesh_name: &str, material: Option<usize>) -> Result<Material> {
    let mut render_material = Material::new(msgview_render::material::OBJ_MATERIAL).ok_or_else(|| {
        msgview_core::Error::Render("could not create OBJMaterial".to_string())
    })?;

    match material.and_then(|id| model.material.get(id)) {
        Some(m) => {
            render_material.set_kd(m.kd);
            render_material.set_ks(m.ks);
            render_material.set_ns(m.ns);
            render_material.set_d(m.d);
        }
        None => {
            log::warn!("mesh '{}' has no material, rendering it red", mesh_name);
            render_material.set_kd(MISSING_MATERIAL_KD);
        }
    }
    Ok(render_material)
}

/// One committed triangle mesh per scene mesh, in mesh order. Instances are
/// not applied; callers reject instanced scenes first.
pub fn build_render_model(model: &Model) -> Result<msgview_render::Model> {
    let mut render_model = msgview_render::Model::new();

    for mesh in &model.mesh {
        let mut geometry = TriangleMesh::new();
        geometry.set_position(Arc::from(mesh.position.as_slice()));
        geometry.set_index(mesh.triangle.iter().map(Triangle::indices).collect());
        geometry.set_material(Arc::new(render_material(model, &mesh.name, mesh.material)?));
        geometry.commit()?;
        render_model.add_geometry(geometry);
    }

    render_model.commit()?;
    Ok(render_model)
}

/// Copy the view into the camera and commit it
pub fn apply_viewport(camera: &mut PerspectiveCamera, viewport: &ViewPort) -> Result<()> {
    camera.set_pos(viewport.from);
    camera.set_dir(viewport.at - viewport.from);
    camera.set_up(viewport.up);
    camera.set_aspect(viewport.aspect);
    camera.commit()
}

#[cfg(test)]
mod tests {
    use super::*;
    use msgview_core::{Mesh, Point3f, Vector3f};

    fn triangle_mesh(name: &str, z: f32) -> Mesh {
        let mut mesh = Mesh::new(name);
        mesh.add_vertex(Point3f::new(-1.0, -1.0, z));
        mesh.add_vertex(Point3f::new(1.0, -1.0, z));
        mesh.add_vertex(Point3f::new(0.0, 1.0, z));
        mesh.add_triangle(Triangle::new(0, 1, 2));
        mesh
    }

    #[test]
    fn test_materials_are_copied() {
        let mut model = Model::new();
        let blue = model.add_material(msgview_core::Material {
            name: "blue".to_string(),
            kd: [0.0, 0.0, 1.0],
            ks: [0.5, 0.5, 0.5],
            ns: 20.0,
            d: 0.5,
        });
        let mut with_material = triangle_mesh("a", 1.0);
        with_material.material = Some(blue);
        model.add_mesh_instance(with_material);
        model.add_mesh_instance(triangle_mesh("b", 2.0));

        let render_model = build_render_model(&model).unwrap();
        assert!(render_model.is_committed());
        assert_eq!(render_model.num_geometries(), 2);

        let a = render_model.geometry(0).unwrap().material().unwrap();
        assert_eq!(a.kd, Vector3f::new(0.0, 0.0, 1.0));
        assert_eq!(a.ns, 20.0);
        assert_eq!(a.d, 0.5);

        let b = render_model.geometry(1).unwrap().material().unwrap();
        assert_eq!(b.kd, Vector3f::new(1.0, 0.0, 0.0));
    }

    #[test]
    fn test_geometry_shares_mesh_data() {
        let mut model = Model::new();
        model.add_mesh_instance(triangle_mesh("a", 1.0));
        let render_model = build_render_model(&model).unwrap();

        let geometry = render_model.geometry(0).unwrap();
        assert_eq!(geometry.positions(), model.mesh[0].position.as_slice());
        assert_eq!(geometry.indices(), &[[0, 1, 2]]);
    }

    #[test]
    fn test_bad_index_is_rejected() {
        let mut model = Model::new();
        let mut mesh = triangle_mesh("broken", 0.0);
        mesh.add_triangle(Triangle::new(0, 1, 9));
        model.add_mesh_instance(mesh);
        assert!(build_render_model(&model).is_err());
    }

    #[test]
    fn test_apply_viewport() {
        let mut viewport = ViewPort::default();
        viewport.from = Point3f::new(0.0, 0.0, -5.0);
        viewport.aspect = 2.0;

        let mut camera = PerspectiveCamera::new();
        apply_viewport(&mut camera, &viewport).unwrap();
        assert!(camera.is_committed());
        assert_eq!(camera.pos, viewport.from);
        assert_eq!(camera.dir, Vector3f::new(0.0, 0.0, 5.0));
        assert_eq!(camera.aspect, 2.0);
    }
}
