//! Interactive display for msgview
//!
//! Renders nothing itself: a [`FrameSource`] produces RGBA8 frames for the
//! current [`ViewPort`] and the [`ViewerWindow`] shows them with wgpu,
//! feeding mouse and keyboard input to a camera manipulator:
//! - inspect mode orbits around the center of the scene
//! - fly mode turns in place and moves with W/S/A/D

pub mod blit;
pub mod fps;
pub mod manipulator;
pub mod viewport;
pub mod window;

pub use blit::DisplayFrame;
pub use fps::FpsCounter;
pub use manipulator::{DragButton, Fly, InspectCenter, Manipulator};
pub use viewport::{Frame, ViewPort};
pub use window::{FrameSource, ViewerConfig, ViewerWindow};
