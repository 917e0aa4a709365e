//! CPU ray-casting engine for msgview
//!
//! The object model follows a commit-based rendering API: create a
//! [`Device`], build [`TriangleMesh`] geometries into a [`Model`], set up a
//! [`PerspectiveCamera`], then ask the device for a [`Renderer`] by type name
//! and render into a [`FrameBuffer`]. Every object must be committed after
//! its parameters change and before it is used.

pub mod bvh;
pub mod camera;
pub mod device;
pub mod framebuffer;
pub mod geometry;
pub mod material;
pub mod model;
pub mod ray;
pub mod renderer;
pub mod shaders;

pub use camera::PerspectiveCamera;
pub use device::Device;
pub use framebuffer::{FrameBuffer, MappedFrame};
pub use geometry::TriangleMesh;
pub use material::Material;
pub use model::{Hit, Model};
pub use ray::Ray;
pub use renderer::{Renderer, Shader, ShadingContext, DEFAULT_BACKGROUND};
