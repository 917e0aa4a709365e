//! Rays and ray/triangle intersection

use msgview_core::{Point3f, Vector3f};

#[derive(Debug, Clone, Copy)]
pub struct Ray {
    pub origin: Point3f,
    pub direction: Vector3f,
    /// Hits closer than this are ignored
    pub t_min: f32,
    /// Hits farther than this are ignored
    pub t_max: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TriangleHit {
    pub t: f32,
    pub u: f32,
    pub v: f32,
}

impl Ray {
    pub fn new(origin: Point3f, direction: Vector3f) -> Self {
        Self {
            origin,
            direction,
            t_min: 0.0,
            t_max: f32::INFINITY,
        }
    }

    /// A ray leaving a surface point, offset to avoid hitting that surface again
    pub fn spawn(origin: Point3f, direction: Vector3f, epsilon: f32) -> Self {
        Self {
            origin,
            direction,
            t_min: epsilon,
            t_max: f32::INFINITY,
        }
    }

    pub fn at(&self, t: f32) -> Point3f {
        self.origin + self.direction * t
    }

    // Möller–Trumbore intersection algorithm
    pub fn intersect_triangle(&self, p0: &Point3f, p1: &Point3f, p2: &Point3f) -> Option<TriangleHit> {
        let edge1 = p1 - p0;
        let edge2 = p2 - p0;

        let h = self.direction.cross(&edge2);
        let a = edge1.dot(&h);
        if a.abs() < f32::EPSILON * edge1.norm() * edge2.norm() {
            return None;
        }

        let f = 1.0 / a;
        let s = self.origin - p0;
        let u = f * s.dot(&h);
        if !(0.0..=1.0).contains(&u) {
            return None;
        }

        let q = s.cross(&edge1);
        let v = f * self.direction.dot(&q);
        if v < 0.0 || u + v > 1.0 {
            return None;
        }

        let t = f * edge2.dot(&q);
        if t > self.t_min && t < self.t_max {
            Some(TriangleHit { t, u, v })
        } else {
            None
        }
    }
}
