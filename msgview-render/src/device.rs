//! The rendering device: registry of renderer types and loadable modules

use crate::renderer::{Renderer, Shader};
use crate::shaders::{AmbientOcclusion, EyeLight, EyeLightGeomId, GeomId, GeometricNormal, ObjShader, PrimId};
use msgview_core::{Error, Result};
use std::collections::BTreeMap;
use std::sync::Arc;

pub type ShaderFactory = fn() -> Arc<dyn Shader>;

/// Renderer types available without loading any module
const BUILTIN_RENDERERS: &[(&str, ShaderFactory)] = &[
    ("raycast", || Arc::new(EyeLight)),
    ("raycast_eyelight", || Arc::new(EyeLight)),
    ("raycast_Ng", || Arc::new(GeometricNormal)),
    ("raycast_primID", || Arc::new(PrimId)),
    ("raycast_geomID", || Arc::new(GeomId)),
    ("raycast_eyelight_geomID", || Arc::new(EyeLightGeomId)),
    ("obj", || Arc::new(ObjShader)),
    ("OBJ", || Arc::new(ObjShader)),
];

const AO_RENDERERS: &[(&str, ShaderFactory)] = &[
    ("ao", || Arc::new(AmbientOcclusion::new(4))),
    ("ao1", || Arc::new(AmbientOcclusion::new(1))),
    ("ao2", || Arc::new(AmbientOcclusion::new(2))),
    ("ao4", || Arc::new(AmbientOcclusion::new(4))),
    ("ao8", || Arc::new(AmbientOcclusion::new(8))),
    ("ao16", || Arc::new(AmbientOcclusion::new(16))),
];

/// Optional modules and the renderer types each one registers
const MODULES: &[(&str, &[(&str, ShaderFactory)])] = &[("ao", AO_RENDERERS)];

pub struct Device {
    renderers: BTreeMap<String, ShaderFactory>,
    modules: Vec<String>,
}

impl Default for Device {
    fn default() -> Self {
        Self::new()
    }
}

impl Device {
    pub fn new() -> Self {
        let mut device = Self {
            renderers: BTreeMap::new(),
            modules: Vec::new(),
        };
        device.register(BUILTIN_RENDERERS);
        device
    }

    fn register(&mut self, renderers: &[(&str, ShaderFactory)]) {
        for (name, factory) in renderers {
            self.renderers.insert(name.to_string(), *factory);
        }
    }

    /// Enable an optional module. Loading a module twice is a no-op.
    pub fn load_module(&mut self, name: &str) -> Result<()> {
        if self.modules.iter().any(|m| m == name) {
            return Ok(());
        }
        let (_, renderers) = MODULES
            .iter()
            .find(|(module, _)| *module == name)
            .ok_or_else(|| Error::Render(format!("could not load module '{}'", name)))?;

        self.register(renderers);
        self.modules.push(name.to_string());
        log::info!("loaded module '{}'", name);
        Ok(())
    }

    pub fn loaded_modules(&self) -> &[String] {
        &self.modules
    }

    /// Names of every renderer type that can currently be created
    pub fn renderer_types(&self) -> impl Iterator<Item = &str> {
        self.renderers.keys().map(String::as_str)
    }

    pub fn new_renderer(&self, renderer_type: &str) -> Result<Renderer> {
        let factory = self
            .renderers
            .get(renderer_type)
            .ok_or_else(|| Error::Render(format!("could not create renderer '{}'", renderer_type)))?;
        Ok(Renderer::new(renderer_type, factory()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_renderers() {
        let device = Device::new();
        for name in [
            "raycast_eyelight",
            "raycast_Ng",
            "raycast_primID",
            "raycast_geomID",
            "raycast_eyelight_geomID",
            "obj",
        ] {
            assert_eq!(device.new_renderer(name).unwrap().renderer_type(), name);
        }
    }

    #[test]
    fn test_unknown_renderer() {
        let device = Device::new();
        match device.new_renderer("pathtracer") {
            Err(Error::Render(message)) => assert_eq!(message, "could not create renderer 'pathtracer'"),
            other => panic!("unexpected result: {:?}", other.map(|r| r.renderer_type().to_string())),
        }
    }

    #[test]
    fn test_ao_module() {
        let mut device = Device::new();
        assert!(device.new_renderer("ao4").is_err());

        device.load_module("ao").unwrap();
        device.load_module("ao").unwrap();
        assert_eq!(device.loaded_modules(), ["ao".to_string()]);
        for name in ["ao1", "ao2", "ao4", "ao8", "ao16"] {
            assert!(device.new_renderer(name).is_ok());
        }
        assert!(device.renderer_types().any(|t| t == "ao16"));
    }

    #[test]
    fn test_unknown_module() {
        let mut device = Device::new();
        assert!(matches!(device.load_module("volume"), Err(Error::Render(_))));
        assert!(device.loaded_modules().is_empty());
    }
}
