//! Frame buffers holding packed RGBA8 pixels

use msgview_core::{Error, Result};
use nalgebra::Vector4;

pub struct FrameBuffer {
    width: u32,
    height: u32,
    pixels: Vec<u32>,
}

impl FrameBuffer {
    pub fn new(width: u32, height: u32) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(Error::Render(format!("invalid frame buffer size {}x{}", width, height)));
        }
        Ok(Self {
            width,
            height,
            pixels: vec![0; width as usize * height as usize],
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Borrow the pixels for reading. The renderer cannot write to the
    /// buffer while the guard is alive.
    pub fn map(&self) -> MappedFrame<'_> {
        MappedFrame { frame: self }
    }

    pub(crate) fn par_rows_mut(&mut self) -> rayon::slice::ChunksMut<'_, u32> {
        use rayon::prelude::*;
        self.pixels.par_chunks_mut(self.width as usize)
    }
}

/// Read access to a rendered frame. Row 0 is the top of the image.
pub struct MappedFrame<'a> {
    frame: &'a FrameBuffer,
}

impl<'a> MappedFrame<'a> {
    pub fn width(&self) -> u32 {
        self.frame.width
    }

    pub fn height(&self) -> u32 {
        self.frame.height
    }

    /// Pixels packed as RGBA8 in memory order
    pub fn pixels(&self) -> &'a [u32] {
        &self.frame.pixels
    }

    /// Pixel bytes, four per pixel in R, G, B, A order
    pub fn as_bytes(&self) -> &'a [u8] {
        bytemuck::cast_slice(&self.frame.pixels)
    }

    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        self.frame.pixels[(y * self.frame.width + x) as usize].to_le_bytes()
    }
}

/// Pack a linear color with components in [0, 1] so that its bytes read
/// R, G, B, A in memory
pub fn pack_rgba8(color: &Vector4<f32>) -> u32 {
    let channel = |c: f32| (c.clamp(0.0, 1.0) * 255.0 + 0.5) as u8;
    u32::from_le_bytes([channel(color.x), channel(color.y), channel(color.z), channel(color.w)])
}
