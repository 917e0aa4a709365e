//! Mouse and keyboard camera manipulators

use crate::viewport::ViewPort;
use msgview_core::Vector3f;
use nalgebra::{Rotation3, Unit};

/// Radians turned per pixel of mouse motion
const ROTATE_SPEED: f32 = 0.005;
/// Dolly distance per pixel, in multiples of the motion speed
const DOLLY_SPEED: f32 = 4.0;
/// Distance moved by one key press, in multiples of the motion speed
const KEY_STEP: f32 = 10.0;
/// Closest the inspect camera may get to its center
const MIN_DISTANCE: f32 = 1e-3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragButton {
    Left,
    Middle,
    Right,
}

/// Turns input into viewport changes. `dx` and `dy` are the cursor motion in
/// pixels, positive to the right and downwards.
pub trait Manipulator {
    fn drag(&mut self, viewport: &mut ViewPort, button: DragButton, dx: f32, dy: f32);

    /// Handle a key press; returns false if the key means nothing to this
    /// manipulator
    fn key(&mut self, _viewport: &mut ViewPort, _key: char) -> bool {
        false
    }

    fn name(&self) -> &'static str;
}

fn rotate_around(v: &Vector3f, axis: &Vector3f, angle: f32) -> Vector3f {
    match Unit::try_new(*axis, f32::EPSILON) {
        Some(axis) => Rotation3::from_axis_angle(&axis, angle) * v,
        None => *v,
    }
}

/// Yaw about the viewport's up vector and pitch about the frame's right
/// vector, refusing to pitch over the poles
fn turn(viewport: &ViewPort, v: &Vector3f, dx: f32, dy: f32) -> Vector3f {
    let yawed = rotate_around(v, &viewport.up, -dx * ROTATE_SPEED);
    let right = rotate_around(&viewport.frame.right, &viewport.up, -dx * ROTATE_SPEED);
    let pitched = rotate_around(&yawed, &right, -dy * ROTATE_SPEED);

    let up = viewport.up.try_normalize(f32::EPSILON).unwrap_or_else(Vector3f::y);
    let horizontal = |v: &Vector3f| v - up * v.dot(&up);
    let same_side = horizontal(&pitched).dot(&horizontal(&yawed)) > 0.0;
    match pitched.try_normalize(f32::EPSILON) {
        Some(d) if same_side && d.dot(&up).abs() < 0.999 => pitched,
        _ => yawed,
    }
}

/// Orbits around the look-at point
#[derive(Debug, Default, Clone, Copy)]
pub struct InspectCenter;

impl Manipulator for InspectCenter {
    fn drag(&mut self, viewport: &mut ViewPort, button: DragButton, dx: f32, dy: f32) {
        match button {
            DragButton::Left => {
                let offset = turn(viewport, &(viewport.from - viewport.at), dx, -dy);
                viewport.from = viewport.at + offset;
            }
            DragButton::Right => {
                let distance = viewport.distance();
                let new_distance = distance + dy * DOLLY_SPEED * viewport.motion_speed;
                if new_distance < MIN_DISTANCE {
                    return;
                }
                viewport.from = viewport.at - viewport.frame.dir * new_distance;
            }
            DragButton::Middle => {
                let frame = viewport.frame;
                let delta = (-dx * frame.right + dy * frame.up) * viewport.motion_speed;
                viewport.from += delta;
                viewport.at += delta;
            }
        }
        viewport.modified = true;
        viewport.update_frame();
    }

    fn name(&self) -> &'static str {
        "inspect"
    }
}

/// Turns in place and moves with W/S/A/D
#[derive(Debug, Default, Clone, Copy)]
pub struct Fly;

impl Manipulator for Fly {
    fn drag(&mut self, viewport: &mut ViewPort, button: DragButton, dx: f32, dy: f32) {
        match button {
            DragButton::Left => {
                let dir = turn(viewport, &viewport.direction(), dx, dy);
                viewport.at = viewport.from + dir;
            }
            DragButton::Right => {
                let step = viewport.frame.dir * (-dy * DOLLY_SPEED * viewport.motion_speed);
                viewport.translate(step);
            }
            DragButton::Middle => {
                let frame = viewport.frame;
                viewport.translate((-dx * frame.right + dy * frame.up) * viewport.motion_speed);
            }
        }
        viewport.modified = true;
        viewport.update_frame();
    }

    fn key(&mut self, viewport: &mut ViewPort, key: char) -> bool {
        let step = KEY_STEP * viewport.motion_speed;
        let frame = viewport.frame;
        let delta = match key.to_ascii_lowercase() {
            'w' => frame.dir * step,
            's' => -frame.dir * step,
            'd' => frame.right * step,
            'a' => -frame.right * step,
            _ => return false,
        };
        viewport.translate(delta);
        true
    }

    fn name(&self) -> &'static str {
        "fly"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use msgview_core::Point3f;

    fn viewport() -> ViewPort {
        let mut vp = ViewPort::default();
        vp.from = Point3f::new(0.0, 0.0, -10.0);
        vp.motion_speed = 0.01;
        vp.update_frame();
        vp.modified = false;
        vp
    }

    #[test]
    fn test_orbit_keeps_distance_and_center() {
        let mut vp = viewport();
        InspectCenter.drag(&mut vp, DragButton::Left, 40.0, 25.0);

        assert!(vp.modified);
        assert_eq!(vp.at, Point3f::origin());
        assert_relative_eq!(vp.distance(), 10.0, epsilon = 1e-4);
        assert!(vp.from.x.abs() > 0.1);
        assert_relative_eq!(vp.frame.dir, (vp.at - vp.from).normalize(), epsilon = 1e-5);
    }

    #[test]
    fn test_orbit_stops_at_pole() {
        let mut vp = viewport();
        for _ in 0..200 {
            InspectCenter.drag(&mut vp, DragButton::Left, 0.0, 50.0);
        }
        let dir = vp.frame.dir;
        assert!(dir.dot(&Vector3f::y()).abs() < 0.9995);
        assert_relative_eq!(vp.distance(), 10.0, epsilon = 1e-3);
    }

    #[test]
    fn test_dolly() {
        let mut vp = viewport();
        InspectCenter.drag(&mut vp, DragButton::Right, 0.0, -50.0);
        assert_relative_eq!(vp.distance(), 8.0, epsilon = 1e-4);

        // never passes through the center
        InspectCenter.drag(&mut vp, DragButton::Right, 0.0, -1000.0);
        assert_relative_eq!(vp.distance(), 8.0, epsilon = 1e-4);
    }

    #[test]
    fn test_pan_moves_both_points() {
        let mut vp = viewport();
        let offset = vp.from - vp.at;
        InspectCenter.drag(&mut vp, DragButton::Middle, 100.0, 0.0);
        assert_relative_eq!(vp.from - vp.at, offset, epsilon = 1e-5);
        assert_relative_eq!(vp.at.x, 1.0, epsilon = 1e-5);
    }

    #[test]
    fn test_fly_keys() {
        let mut vp = viewport();
        assert!(Fly.key(&mut vp, 'w'));
        assert_relative_eq!(vp.from.z, -9.9, epsilon = 1e-5);
        assert_relative_eq!(vp.at.z, 0.1, epsilon = 1e-5);

        assert!(Fly.key(&mut vp, 'S'));
        assert_relative_eq!(vp.from.z, -10.0, epsilon = 1e-5);

        assert!(!Fly.key(&mut vp, 'x'));
        assert!(!InspectCenter.key(&mut vp, 'w'));
    }

    #[test]
    fn test_fly_turns_in_place() {
        let mut vp = viewport();
        Fly.drag(&mut vp, DragButton::Left, 60.0, 0.0);
        assert_eq!(vp.from, Point3f::new(0.0, 0.0, -10.0));
        assert!(vp.frame.dir.x.abs() > 0.1);
    }
}
