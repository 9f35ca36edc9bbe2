// src/lib.rs

//! Pixel-surface backends for a 2D canvas.
//!
//! Two backends satisfy the same [`Backend`] capability contract:
//!
//! - [`FbDevBackend`] opens a Linux framebuffer device node (`/dev/fb0` by
//!   default), negotiates geometry and color depth with the driver over
//!   ioctl, and exposes the memory-mapped device buffer as a drawable
//!   [`Surface`]. Writes through the surface are direct hardware I/O.
//! - [`ImageBackend`] allocates a plain in-memory pixel buffer, always
//!   32-bit ARGB. No device, no negotiation; resizing is reallocation.
//!
//! The drawable surface is an opaque handle (pointer, format, dimensions,
//! stride) intended to be handed to a 2D drawing library; this crate does
//! not draw.

pub mod backends;
pub mod config;
pub mod error;
pub mod format;
pub mod surface;

pub use backends::{Backend, FbDevBackend, ImageBackend};
pub use error::BackendError;
pub use format::PixelFormat;
pub use surface::Surface;
