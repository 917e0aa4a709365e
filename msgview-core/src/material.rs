//! Surface materials

use serde::{Deserialize, Serialize};

/// A Wavefront-style material: diffuse and specular reflectance, specular
/// exponent and opacity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Material {
    pub name: String,
    /// Diffuse color
    pub kd: [f32; 3],
    /// Specular color
    pub ks: [f32; 3],
    /// Specular exponent
    pub ns: f32,
    /// Opacity, 1 is fully opaque
    pub d: f32,
}

impl Material {
    /// Create a named material with default reflectance
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

impl Default for Material {
    fn default() -> Self {
        Self {
            name: "default".to_string(),
            kd: [0.7, 0.7, 0.7],
            ks: [0.0, 0.0, 0.0],
            ns: 10.0,
            d: 1.0,
        }
    }
}
