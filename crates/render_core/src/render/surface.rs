//! Presentation surface boundary
//!
//! The device never creates windows. Whoever owns the window hands the
//! device something implementing [`RenderSurface`] at construction, and the
//! device presents into it at the end of each frame.

use raw_window_handle::RawWindowHandle;

/// Something frames can be presented to
pub trait RenderSurface: Send {
    /// Drawable size in pixels
    fn size(&self) -> (u32, u32);

    /// Native window handle for backends that talk to a window system
    fn raw_window_handle(&self) -> Option<RawWindowHandle> {
        None
    }

    /// Make the finished frame visible
    fn swap_buffers(&mut self) -> Result<(), String>;
}

/// Off-screen surface that only counts presented frames
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeadlessSurface {
    width: u32,
    height: u32,
    frames_presented: u64,
}

impl HeadlessSurface {
    /// Surface with the given size
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height, frames_presented: 0 }
    }

    /// Number of successful swaps
    pub fn frames_presented(&self) -> u64 {
        self.frames_presented
    }

    /// Change the drawable size
    pub fn resize(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
    }
}

impl Default for HeadlessSurface {
    fn default() -> Self {
        Self::new(800, 600)
    }
}

impl RenderSurface for HeadlessSurface {
    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn swap_buffers(&mut self) -> Result<(), String> {
        if self.width == 0 || self.height == 0 {
            return Err(format!("cannot present to a {}x{} surface", self.width, self.height));
        }
        self.frames_presented += 1;
        Ok(())
    }
}
