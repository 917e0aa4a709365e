//! Renderers: a shader bound to a model, a camera and a background color

use crate::camera::PerspectiveCamera;
use crate::framebuffer::{pack_rgba8, FrameBuffer};
use crate::model::Model;
use crate::ray::Ray;
use msgview_core::{Error, Result};
use nalgebra::Vector4;
use rayon::prelude::*;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

pub const DEFAULT_BACKGROUND: [f32; 4] = [0.1, 0.1, 0.1, 1.0];

/// Per-pixel state handed to a shader
pub struct ShadingContext<'a> {
    pub model: &'a Model,
    pub background: Vector4<f32>,
    /// Offset for rays spawned from a surface, relative to the scene size
    pub epsilon: f32,
    pub frame_id: u64,
    pub pixel: (u32, u32),
}

/// Computes the color seen along a primary ray
pub trait Shader: Send + Sync {
    fn shade(&self, ray: &Ray, ctx: &ShadingContext) -> Vector4<f32>;
}

pub struct Renderer {
    renderer_type: String,
    shader: Arc<dyn Shader>,
    model: Option<Arc<Model>>,
    camera: Option<PerspectiveCamera>,
    background: Vector4<f32>,
    committed: bool,
    frame_id: AtomicU64,
}

impl Renderer {
    pub(crate) fn new(renderer_type: &str, shader: Arc<dyn Shader>) -> Self {
        Self {
            renderer_type: renderer_type.to_string(),
            shader,
            model: None,
            camera: None,
            background: Vector4::from(DEFAULT_BACKGROUND),
            committed: false,
            frame_id: AtomicU64::new(0),
        }
    }

    pub fn renderer_type(&self) -> &str {
        &self.renderer_type
    }

    pub fn set_model(&mut self, model: Arc<Model>) {
        self.model = Some(model);
        self.committed = false;
    }

    pub fn set_camera(&mut self, camera: PerspectiveCamera) {
        self.camera = Some(camera);
        self.committed = false;
    }

    /// The bound camera, for updating its parameters in place. Commit the
    /// camera after changing it.
    pub fn camera_mut(&mut self) -> Option<&mut PerspectiveCamera> {
        self.camera.as_mut()
    }

    pub fn camera(&self) -> Option<&PerspectiveCamera> {
        self.camera.as_ref()
    }

    pub fn set_background(&mut self, color: [f32; 4]) {
        self.background = Vector4::from(color);
    }

    pub fn commit(&mut self) -> Result<()> {
        let model = self
            .model
            .as_ref()
            .ok_or_else(|| Error::Render(format!("renderer '{}' has no model", self.renderer_type)))?;
        if !model.is_committed() {
            return Err(Error::Render("model must be committed before rendering".to_string()));
        }
        if self.camera.is_none() {
            return Err(Error::Render(format!("renderer '{}' has no camera", self.renderer_type)));
        }
        self.committed = true;
        Ok(())
    }

    /// Number of frames rendered so far
    pub fn frame_count(&self) -> u64 {
        self.frame_id.load(Ordering::Relaxed)
    }

    /// Cast one primary ray through the center of every pixel
    pub fn render_frame(&self, fb: &mut FrameBuffer) -> Result<()> {
        if !self.committed {
            return Err(Error::Render(format!("renderer '{}' is not committed", self.renderer_type)));
        }
        let (Some(model), Some(camera)) = (self.model.as_deref(), self.camera.as_ref()) else {
            return Err(Error::Render(format!("renderer '{}' is incomplete", self.renderer_type)));
        };
        if !model.is_committed() {
            return Err(Error::Render("model must be committed before rendering".to_string()));
        }
        if !camera.is_committed() {
            return Err(Error::Render("camera must be committed before rendering".to_string()));
        }

        let frame_id = self.frame_id.fetch_add(1, Ordering::Relaxed);
        let epsilon = model
            .bounds()
            .map_or(1e-4, |b| (b.size().norm() * 1e-5).max(1e-6));
        let (width, height) = fb.size();
        let shader = self.shader.as_ref();
        let background = self.background;

        fb.par_rows_mut().enumerate().for_each(|(y, row)| {
            for (x, pixel) in row.iter_mut().enumerate() {
                let (x, y) = (x as u32, y as u32);
                let color = match camera.pixel_ray(x, y, width, height) {
                    Some(ray) => {
                        let ctx = ShadingContext {
                            model,
                            background,
                            epsilon,
                            frame_id,
                            pixel: (x, y),
                        };
                        shader.shade(&ray, &ctx)
                    }
                    None => background,
                };
                *pixel = pack_rgba8(&color);
            }
        });

        Ok(())
    }
}
