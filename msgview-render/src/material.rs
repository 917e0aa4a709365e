//! Renderer-side materials

use nalgebra::Vector3;

/// The only material type the renderers understand
pub const OBJ_MATERIAL: &str = "OBJMaterial";

/// Wavefront-style surface parameters used by the `obj` renderer. The
/// other renderers ignore materials.
#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    pub kd: Vector3<f32>,
    pub ks: Vector3<f32>,
    pub ns: f32,
    pub d: f32,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            kd: Vector3::new(0.8, 0.8, 0.8),
            ks: Vector3::zeros(),
            ns: 10.0,
            d: 1.0,
        }
    }
}

impl Material {
    /// Create a material of the given type; `None` for unknown types
    pub fn new(material_type: &str) -> Option<Self> {
        (material_type == OBJ_MATERIAL).then(Self::default)
    }

    pub fn set_kd(&mut self, kd: [f32; 3]) {
        self.kd = Vector3::from(kd);
    }

    pub fn set_ks(&mut self, ks: [f32; 3]) {
        self.ks = Vector3::from(ks);
    }

    pub fn set_ns(&mut self, ns: f32) {
        self.ns = ns;
    }

    pub fn set_d(&mut self, d: f32) {
        self.d = d.clamp(0.0, 1.0);
    }
}
