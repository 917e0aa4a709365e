//! Pinhole perspective camera

use crate::ray::Ray;
use msgview_core::{Error, Point3f, Result, Vector3f};

const DEFAULT_FOVY: f32 = 60.0;

#[derive(Debug, Clone)]
pub struct PerspectiveCamera {
    pub pos: Point3f,
    pub dir: Vector3f,
    pub up: Vector3f,
    /// Width over height of the image plane
    pub aspect: f32,
    /// Vertical field of view in degrees
    pub fovy: f32,
    frame: Option<ImagePlane>,
}

/// Image plane spanned at distance 1 in front of the camera
#[derive(Debug, Clone, Copy, PartialEq)]
struct ImagePlane {
    dir_00: Vector3f,
    dir_du: Vector3f,
    dir_dv: Vector3f,
}

impl Default for PerspectiveCamera {
    fn default() -> Self {
        Self {
            pos: Point3f::origin(),
            dir: Vector3f::z(),
            up: Vector3f::y(),
            aspect: 1.0,
            fovy: DEFAULT_FOVY,
            frame: None,
        }
    }
}

impl PerspectiveCamera {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_pos(&mut self, pos: Point3f) {
        self.pos = pos;
        self.frame = None;
    }

    pub fn set_dir(&mut self, dir: Vector3f) {
        self.dir = dir;
        self.frame = None;
    }

    pub fn set_up(&mut self, up: Vector3f) {
        self.up = up;
        self.frame = None;
    }

    pub fn set_aspect(&mut self, aspect: f32) {
        self.aspect = aspect;
        self.frame = None;
    }

    pub fn set_fovy(&mut self, fovy: f32) {
        self.fovy = fovy;
        self.frame = None;
    }

    pub fn is_committed(&self) -> bool {
        self.frame.is_some()
    }

    /// Derive the image plane from the current parameters
    pub fn commit(&mut self) -> Result<()> {
        let dir = self
            .dir
            .try_normalize(f32::EPSILON)
            .ok_or_else(|| Error::Render("camera direction must not be zero".to_string()))?;
        let right = dir
            .cross(&self.up)
            .try_normalize(f32::EPSILON)
            .ok_or_else(|| Error::Render("camera up vector is parallel to its direction".to_string()))?;
        if !(self.aspect > 0.0) {
            return Err(Error::Render(format!("invalid camera aspect ratio {}", self.aspect)));
        }
        if !(self.fovy > 0.0 && self.fovy < 180.0) {
            return Err(Error::Render(format!("invalid camera field of view {}", self.fovy)));
        }

        let size_y = 2.0 * (0.5 * self.fovy.to_radians()).tan();
        let size_x = size_y * self.aspect;

        let dir_du = right * size_x;
        let dir_dv = right.cross(&dir) * size_y;
        let dir_00 = dir - 0.5 * dir_du - 0.5 * dir_dv;

        self.frame = Some(ImagePlane { dir_00, dir_du, dir_dv });
        Ok(())
    }

    /// Primary ray through normalized screen coordinates, `(0, 0)` at the
    /// bottom left corner and `(1, 1)` at the top right. `None` until committed.
    pub fn ray(&self, s: f32, t: f32) -> Option<Ray> {
        let frame = self.frame?;
        let direction = (frame.dir_00 + s * frame.dir_du + t * frame.dir_dv).normalize();
        Some(Ray::new(self.pos, direction))
    }

    /// Ray through the center of pixel `(x, y)` of a `width` x `height` image
    /// whose row 0 is the top row
    pub fn pixel_ray(&self, x: u32, y: u32, width: u32, height: u32) -> Option<Ray> {
        let s = (x as f32 + 0.5) / width as f32;
        let t = 1.0 - (y as f32 + 0.5) / height as f32;
        self.ray(s, t)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_center_ray_follows_dir() {
        let mut camera = PerspectiveCamera::new();
        camera.set_pos(Point3f::new(-1.0, 1.0, -1.0));
        camera.set_dir(Vector3f::new(1.0, -1.0, 1.0));
        camera.commit().unwrap();

        let ray = camera.ray(0.5, 0.5).unwrap();
        assert_eq!(ray.origin, Point3f::new(-1.0, 1.0, -1.0));
        assert_relative_eq!(ray.direction, Vector3f::new(1.0, -1.0, 1.0).normalize(), epsilon = 1e-6);
    }

    #[test]
    fn test_top_row_looks_up() {
        let mut camera = PerspectiveCamera::new();
        camera.commit().unwrap();

        let top = camera.pixel_ray(50, 0, 100, 100).unwrap();
        let bottom = camera.pixel_ray(50, 99, 100, 100).unwrap();
        assert!(top.direction.y > 0.0);
        assert!(bottom.direction.y < 0.0);
    }

    #[test]
    fn test_field_of_view() {
        let mut camera = PerspectiveCamera::new();
        camera.set_fovy(90.0);
        camera.set_aspect(2.0);
        camera.commit().unwrap();

        // top edge is 45 degrees above the view direction
        let top = camera.ray(0.5, 1.0).unwrap();
        assert_relative_eq!(top.direction.y, top.direction.z, epsilon = 1e-6);

        // with aspect 2 the horizontal half extent is 2
        let side = camera.ray(1.0, 0.5).unwrap();
        assert_relative_eq!(side.direction.x.abs() / side.direction.z, 2.0, epsilon = 1e-5);
    }

    #[test]
    fn test_invalid_parameters() {
        let mut camera = PerspectiveCamera::new();
        camera.set_dir(Vector3f::zeros());
        assert!(camera.commit().is_err());
        assert!(camera.ray(0.5, 0.5).is_none());

        camera.set_dir(Vector3f::y());
        assert!(camera.commit().is_err());

        camera.set_dir(Vector3f::z());
        camera.set_aspect(0.0);
        assert!(camera.commit().is_err());

        camera.set_aspect(1.0);
        camera.commit().unwrap();
        assert!(camera.is_committed());
    }
}
