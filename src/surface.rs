// src/surface.rs

//! The drawable surface handle handed to the 2D drawing layer.

use crate::format::PixelFormat;
use std::ptr::NonNull;

/// Pixel storage behind a surface.
#[derive(Debug)]
enum SurfaceData {
    /// Heap buffer owned by the surface itself (image backend).
    Owned(Box<[u8]>),
    /// Raw view into device memory. The backend that created the surface
    /// owns the mapping and outlives the view.
    Mapped { ptr: NonNull<u8>, len: usize },
}

/// A drawable view over a pixel buffer: dimensions, scanline stride, pixel
/// format, and the pixels themselves.
///
/// Dropping an owned surface frees its buffer; dropping a mapped surface
/// releases only the view, never the underlying device mapping.
#[derive(Debug)]
pub struct Surface {
    data: SurfaceData,
    format: PixelFormat,
    width: u32,
    height: u32,
    stride: u32,
}

impl Surface {
    /// Allocates a zeroed, tightly-packed surface owned by the handle.
    ///
    /// Panics if the requested dimensions produce a stride or buffer size
    /// outside the representable range; the caller gets a clean abort, not
    /// a wrapped allocation.
    pub(crate) fn new_owned(format: PixelFormat, width: u32, height: u32) -> Self {
        let row_bytes = width as usize * format.bytes_per_pixel() as usize;
        let stride = u32::try_from(row_bytes).expect("surface stride exceeds u32");
        let len = row_bytes
            .checked_mul(height as usize)
            .expect("surface buffer size overflows usize");
        let data = vec![0u8; len].into_boxed_slice();
        Self {
            data: SurfaceData::Owned(data),
            format,
            width,
            height,
            stride,
        }
    }

    /// Wraps externally owned pixel memory without taking ownership.
    ///
    /// # Safety
    /// `ptr..ptr+len` must be valid for reads and writes for the whole
    /// lifetime of the surface. The framebuffer backend guarantees this by
    /// holding its device mapping at least as long as the surface handle.
    pub(crate) unsafe fn from_raw_parts(
        ptr: NonNull<u8>,
        len: usize,
        format: PixelFormat,
        width: u32,
        height: u32,
        stride: u32,
    ) -> Self {
        Self {
            data: SurfaceData::Mapped { ptr, len },
            format,
            width,
            height,
            stride,
        }
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Bytes per scanline. For device surfaces this is the hardware pitch
    /// and may exceed `width * bytes_per_pixel`.
    pub fn stride(&self) -> u32 {
        self.stride
    }

    /// The raw pixel bytes, row-major with `stride` bytes per row.
    pub fn data(&self) -> &[u8] {
        match &self.data {
            SurfaceData::Owned(buf) => buf,
            SurfaceData::Mapped { ptr, len } => unsafe {
                std::slice::from_raw_parts(ptr.as_ptr(), *len)
            },
        }
    }

    /// Mutable access to the pixel bytes. For device surfaces, writes land
    /// directly in device memory.
    pub fn data_mut(&mut self) -> &mut [u8] {
        match &mut self.data {
            SurfaceData::Owned(buf) => buf,
            SurfaceData::Mapped { ptr, len } => unsafe {
                std::slice::from_raw_parts_mut(ptr.as_ptr(), *len)
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn owned_surface_is_zeroed_and_sized() {
        let surface = Surface::new_owned(PixelFormat::Argb32, 16, 8);
        assert_eq!(surface.width(), 16);
        assert_eq!(surface.height(), 8);
        assert_eq!(surface.stride(), 64);
        assert_eq!(surface.data().len(), 64 * 8);
        assert!(surface.data().iter().all(|&b| b == 0));
    }

    #[test]
    fn owned_surface_writes_stick() {
        let mut surface = Surface::new_owned(PixelFormat::Rgb565, 4, 4);
        surface.data_mut()[0] = 0xab;
        assert_eq!(surface.data()[0], 0xab);
    }

    #[test]
    #[should_panic(expected = "surface stride exceeds u32")]
    fn absurd_width_fails_instead_of_wrapping() {
        // Height 0 keeps the allocation empty, so only the stride check can
        // reject this; a 32-bit multiply would wrap to a plausible value.
        Surface::new_owned(PixelFormat::Argb32, u32::MAX, 0);
    }

    #[test]
    fn mapped_surface_is_a_view() {
        let mut backing = vec![0u8; 64 * 8];
        let ptr = NonNull::new(backing.as_mut_ptr()).unwrap();
        let mut surface = unsafe {
            Surface::from_raw_parts(ptr, backing.len(), PixelFormat::Argb32, 16, 8, 64)
        };
        surface.data_mut()[3] = 0xff;
        drop(surface);
        // Dropping the view must leave the backing memory intact.
        assert_eq!(backing[3], 0xff);
    }
}
