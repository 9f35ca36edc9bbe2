// src/backends/image.rs

//! In-memory backend: a plain heap pixel buffer, always 32-bit ARGB.
//!
//! The contrast case for `FbDevBackend`: no device to negotiate with, so
//! the geometry setters only record values and `recreate_surface` is how a
//! resize actually happens.

use crate::backends::Backend;
use crate::error::BackendError;
use crate::format::PixelFormat;
use crate::surface::Surface;
use log::trace;

/// Surface backend over a heap allocation.
#[derive(Debug)]
pub struct ImageBackend {
    width: u32,
    height: u32,
    surface: Option<Surface>,
}

impl ImageBackend {
    /// Creates a backend of the given dimensions. No pixel buffer is
    /// allocated until the first surface is created.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            surface: None,
        }
    }
}

impl Backend for ImageBackend {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn format(&self) -> PixelFormat {
        PixelFormat::Argb32
    }

    /// Records the new width. Takes effect at the next
    /// [`recreate_surface`](Backend::recreate_surface); the held surface is
    /// not resized in place.
    fn set_width(&mut self, width: u32) -> Result<(), BackendError> {
        self.width = width;
        Ok(())
    }

    fn set_height(&mut self, height: u32) -> Result<(), BackendError> {
        self.height = height;
        Ok(())
    }

    /// This backend is fixed 32-bit ARGB; any other format is rejected.
    fn set_format(&mut self, format: PixelFormat) -> Result<(), BackendError> {
        match format {
            PixelFormat::Argb32 => Ok(()),
            _ => Err(BackendError::UnsupportedFormat),
        }
    }

    fn create_surface(&mut self) -> Result<&mut Surface, BackendError> {
        let surface = Surface::new_owned(PixelFormat::Argb32, self.width, self.height);
        trace!("allocated {}x{} image surface", self.width, self.height);
        Ok(self.surface.insert(surface))
    }

    fn recreate_surface(&mut self) -> Result<&mut Surface, BackendError> {
        // Release the old buffer before allocating at the current geometry.
        self.surface = None;
        self.create_surface()
    }

    fn destroy_surface(&mut self) {
        if self.surface.take().is_some() {
            trace!("image surface released");
        }
    }

    fn surface(&self) -> Option<&Surface> {
        self.surface.as_ref()
    }
}
