// src/backends/mod.rs

//! Defines the `Backend` trait implemented by the storage backends, and
//! re-exports the two implementations: `FbDevBackend` (framebuffer device)
//! and `ImageBackend` (in-memory buffer).

use crate::error::BackendError;
use crate::format::PixelFormat;
use crate::surface::Surface;

pub mod fbdev;
pub mod image;

pub use fbdev::FbDevBackend;
pub use image::ImageBackend;

/// Capability contract shared by the surface backends.
///
/// The two implementations share no representation, only this shape: the
/// device-backed variant mirrors live hardware state, the memory-backed
/// variant owns a plain allocation. A caller constructs one, optionally
/// adjusts geometry or format, then calls [`create_surface`] and hands the
/// resulting [`Surface`] to the drawing layer.
///
/// [`create_surface`]: Backend::create_surface
pub trait Backend {
    /// Current width in pixels.
    fn width(&self) -> u32;

    /// Current height in pixels.
    fn height(&self) -> u32;

    /// Current pixel format.
    fn format(&self) -> PixelFormat;

    /// Requests a new width. The device backend renegotiates with the
    /// driver before updating its mirror; the image backend records the
    /// value for the next [`recreate_surface`](Backend::recreate_surface).
    fn set_width(&mut self, width: u32) -> Result<(), BackendError>;

    /// Requests a new height. Same contract as [`set_width`](Backend::set_width).
    fn set_height(&mut self, height: u32) -> Result<(), BackendError>;

    /// Requests a new pixel format.
    fn set_format(&mut self, format: PixelFormat) -> Result<(), BackendError>;

    /// Creates a drawable surface over the backend's current buffer and
    /// stores it on the backend. Any previously held surface is released
    /// first.
    fn create_surface(&mut self) -> Result<&mut Surface, BackendError>;

    /// Creates a fresh surface at the current geometry, releasing the old
    /// one. For the device backend this is the same operation as
    /// [`create_surface`](Backend::create_surface), which always re-reads
    /// live device state.
    fn recreate_surface(&mut self) -> Result<&mut Surface, BackendError>;

    /// Releases the held surface, if any. Idempotent.
    fn destroy_surface(&mut self);

    /// The currently held surface, if one exists.
    fn surface(&self) -> Option<&Surface>;
}
