//! Axis-aligned bounding boxes

use crate::point::*;
use serde::{Deserialize, Serialize};

/// An axis-aligned bounding box. A freshly created box is empty
/// (`min > max` on every axis) and absorbs the first point added to it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min: Point3f,
    pub max: Point3f,
}

impl BoundingBox {
    /// Create an empty bounding box
    pub fn empty() -> Self {
        Self {
            min: Point3f::new(f32::MAX, f32::MAX, f32::MAX),
            max: Point3f::new(f32::MIN, f32::MIN, f32::MIN),
        }
    }

    /// Create a bounding box from its corners
    pub fn new(min: Point3f, max: Point3f) -> Self {
        Self { min, max }
    }

    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }

    /// Grow the box to contain `point`
    pub fn extend(&mut self, point: &Point3f) {
        self.min = self.min.inf(point);
        self.max = self.max.sup(point);
    }

    pub fn union(&self, other: &Self) -> Self {
        Self {
            min: self.min.inf(&other.min),
            max: self.max.sup(&other.max),
        }
    }

    pub fn center(&self) -> Point3f {
        nalgebra::center(&self.min, &self.max)
    }

    /// Extent of the box along each axis; zero for an empty box
    pub fn size(&self) -> Vector3f {
        if self.is_empty() {
            return Vector3f::zeros();
        }
        self.max - self.min
    }
}

impl Default for BoundingBox {
    fn default() -> Self {
        Self::empty()
    }
}

impl<'a> FromIterator<&'a Point3f> for BoundingBox {
    fn from_iter<I: IntoIterator<Item = &'a Point3f>>(iter: I) -> Self {
        let mut bounds = BoundingBox::empty();
        for point in iter {
            bounds.extend(point);
        }
        bounds
    }
}

/// Trait for scene objects occupying a region of space
pub trait Bounded {
    /// Get the bounding box of the object
    fn bounding_box(&self) -> BoundingBox;

    /// Get the center point of the object
    fn center(&self) -> Point3f {
        self.bounding_box().center()
    }
}
