//! Feeds ray-cast frames to the viewer window

use crate::scene::apply_viewport;
use msgview_render::{FrameBuffer, Model, Renderer};
use msgview_visualization::{DisplayFrame, FrameSource, ViewPort};
use std::sync::Arc;

pub struct RenderedFrames {
    renderer: Renderer,
    fb: Option<FrameBuffer>,
    /// Models shown one per displayed frame, in a loop
    animation: Vec<Arc<Model>>,
    next_frame: usize,
}

impl RenderedFrames {
    pub fn new(renderer: Renderer, animation: Vec<Arc<Model>>) -> Self {
        Self {
            renderer,
            fb: None,
            animation,
            next_frame: 0,
        }
    }

    fn advance_animation(&mut self) -> msgview_core::Result<()> {
        if self.animation.is_empty() {
            return Ok(());
        }
        let model = self.animation[self.next_frame].clone();
        self.next_frame = (self.next_frame + 1) % self.animation.len();
        self.renderer.set_model(model);
        self.renderer.commit()
    }
}

impl FrameSource for RenderedFrames {
    fn reshape(&mut self, size: (u32, u32), viewport: &ViewPort) {
        self.fb = match FrameBuffer::new(size.0, size.1) {
            Ok(fb) => Some(fb),
            Err(e) => {
                log::warn!("{}", e);
                None
            }
        };
        if let Some(camera) = self.renderer.camera_mut() {
            camera.set_aspect(viewport.aspect);
            if let Err(e) = camera.commit() {
                log::error!("{}", e);
            }
        }
    }

    fn display(&mut self, viewport: &mut ViewPort) -> Option<DisplayFrame<'_>> {
        if viewport.modified {
            if let Some(camera) = self.renderer.camera_mut() {
                if let Err(e) = apply_viewport(camera, viewport) {
                    log::error!("{}", e);
                }
            }
            viewport.modified = false;
        }

        if let Err(e) = self.advance_animation() {
            log::error!("{}", e);
            return None;
        }

        let fb = self.fb.as_mut()?;
        if let Err(e) = self.renderer.render_frame(fb) {
            log::error!("{}", e);
            return None;
        }

        let frame = fb.map();
        Some(DisplayFrame {
            width: frame.width(),
            height: frame.height(),
            rgba: frame.as_bytes(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use msgview_core::Point3f;
    use msgview_render::{Device, PerspectiveCamera, TriangleMesh};

    fn wall(z: f32) -> Arc<Model> {
        let mut mesh = TriangleMesh::new();
        mesh.set_position(Arc::from(vec![
            Point3f::new(-100.0, -100.0, z),
            Point3f::new(100.0, -100.0, z),
            Point3f::new(0.0, 100.0, z),
        ]));
        mesh.set_index(Arc::from(vec![[0u32, 1, 2]]));
        let mut model = Model::new();
        model.add_geometry(mesh);
        model.commit().unwrap();
        Arc::new(model)
    }

    fn source(animation: Vec<Arc<Model>>) -> RenderedFrames {
        let mut renderer = Device::new().new_renderer("raycast_geomID").unwrap();
        renderer.set_model(wall(5.0));
        renderer.set_camera(PerspectiveCamera::new());
        RenderedFrames::new(renderer, animation)
    }

    fn viewport() -> ViewPort {
        let mut vp = ViewPort::default();
        vp.from = Point3f::new(0.0, 0.0, -1.0);
        vp.aspect = 2.0;
        vp.update_frame();
        vp
    }

    #[test]
    fn test_no_frame_before_reshape() {
        let mut source = source(Vec::new());
        let mut vp = viewport();
        assert!(source.display(&mut vp).is_none());
    }

    #[test]
    fn test_display_consumes_modified_view() {
        let mut source = source(Vec::new());
        source.renderer.commit().unwrap();
        let mut vp = viewport();
        source.reshape((8, 4), &vp);

        let frame = source.display(&mut vp).unwrap();
        assert_eq!((frame.width, frame.height), (8, 4));
        assert_eq!(frame.rgba.len(), 8 * 4 * 4);
        assert!(!vp.modified);
        assert_eq!(source.renderer.camera().unwrap().aspect, 2.0);
    }

    #[test]
    fn test_animation_cycles_models() {
        let mut source = source(vec![wall(3.0), wall(4.0)]);
        let mut vp = viewport();
        source.reshape((4, 4), &vp);

        for _ in 0..3 {
            assert!(source.display(&mut vp).is_some());
        }
        assert_eq!(source.next_frame, 1);
        assert_eq!(source.renderer.frame_count(), 3);
    }
}
