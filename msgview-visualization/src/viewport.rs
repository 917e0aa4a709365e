//! The interactive view: where the camera is, what it looks at and how fast
//! it moves

use msgview_core::{BoundingBox, Point3f, Vector3f};

/// Orthonormal camera frame derived from a [`ViewPort`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frame {
    pub right: Vector3f,
    pub up: Vector3f,
    pub dir: Vector3f,
}

impl Default for Frame {
    fn default() -> Self {
        // looking down +Z with +Y up
        Self {
            right: -Vector3f::x(),
            up: Vector3f::y(),
            dir: Vector3f::z(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ViewPort {
    pub from: Point3f,
    pub at: Point3f,
    pub up: Vector3f,
    /// Width over height
    pub aspect: f32,
    /// Vertical opening angle in degrees
    pub opening_angle: f32,
    /// World units moved per pixel of mouse motion
    pub motion_speed: f32,
    /// Set whenever the view changes; cleared by whoever consumes the change
    pub modified: bool,
    pub frame: Frame,
}

impl Default for ViewPort {
    fn default() -> Self {
        let mut viewport = Self {
            from: Point3f::new(0.0, 0.0, -1.0),
            at: Point3f::origin(),
            up: Vector3f::y(),
            aspect: 1.0,
            opening_angle: 60.0,
            motion_speed: 0.001,
            modified: true,
            frame: Frame::default(),
        };
        viewport.update_frame();
        viewport
    }
}

impl ViewPort {
    pub fn new() -> Self {
        Self::default()
    }

    /// Direction from the eye to the look-at point, not normalized
    pub fn direction(&self) -> Vector3f {
        self.at - self.from
    }

    pub fn distance(&self) -> f32 {
        self.direction().norm()
    }

    /// Recompute the frame from `from`, `at` and `up`. A degenerate
    /// configuration keeps the previous frame.
    pub fn update_frame(&mut self) {
        let Some(dir) = self.direction().try_normalize(f32::EPSILON) else {
            return;
        };
        let Some(right) = dir.cross(&self.up).try_normalize(f32::EPSILON) else {
            return;
        };
        self.frame = Frame {
            right,
            up: right.cross(&dir),
            dir,
        };
    }

    /// Place the camera so the whole box is in view
    pub fn set_world_bounds(&mut self, bounds: &BoundingBox) {
        let bounds = if bounds.is_empty() {
            BoundingBox::new(Point3f::new(-1.0, -1.0, -1.0), Point3f::new(1.0, 1.0, 1.0))
        } else {
            *bounds
        };

        let center = bounds.center();
        let size = bounds.size();
        let min_extent = 0.3 * size.norm();
        let diag = size.map(|e| e.max(min_extent));

        self.at = center;
        self.from = center - 0.75 * Vector3f::new(-0.6 * diag.x, -1.2 * diag.y, 0.8 * diag.z);
        self.up = Vector3f::y();
        self.motion_speed = (diag.norm() * 0.001).max(f32::EPSILON);
        self.modified = true;
        self.update_frame();
    }

    pub fn set_aspect(&mut self, aspect: f32) {
        if aspect > 0.0 && aspect != self.aspect {
            self.aspect = aspect;
            self.modified = true;
        }
    }

    /// Move `from` and `at` together
    pub fn translate(&mut self, delta: Vector3f) {
        self.from += delta;
        self.at += delta;
        self.modified = true;
    }
}

impl std::fmt::Display for ViewPort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "from ({}, {}, {}) at ({}, {}, {}) up ({}, {}, {}) aspect {} angle {}",
            self.from.x,
            self.from.y,
            self.from.z,
            self.at.x,
            self.at.y,
            self.at.z,
            self.up.x,
            self.up.y,
            self.up.z,
            self.aspect,
            self.opening_angle
        )
    }
}
