// src/backends/fbdev.rs

//! Framebuffer-device backend.
//!
//! Opens a Linux fbdev node, negotiates geometry and color depth with the
//! driver over ioctl, and maps the device memory into the process so that
//! writes through the surface land directly in video memory. The mapping is
//! `MAP_SHARED`: no explicit flush is needed for pixels to reach the
//! display.
//!
//! The device is the source of truth. Another process (or the console
//! subsystem) can change the video mode underneath us, so every setter and
//! every surface creation re-reads the variable screen info instead of
//! trusting the cached mirror on this struct.

use crate::backends::Backend;
use crate::error::BackendError;
use crate::format::PixelFormat;
use crate::surface::Surface;
use log::{debug, trace, warn};
use nix::errno::Errno;
use nix::fcntl::{open, OFlag};
use nix::sys::mman::{mmap, munmap, MapFlags, ProtFlags};
use nix::sys::stat::Mode;
use std::num::NonZeroUsize;
use std::os::fd::{AsRawFd, OwnedFd};
use std::path::Path;
use std::ptr::NonNull;

/// Conventional primary framebuffer device node.
pub const DEFAULT_DEVICE_PATH: &str = "/dev/fb0";

const MSG_READ_FIXED: &str = "Error reading fixed framebuffer information";
const MSG_READ_VAR: &str = "Error reading variable framebuffer information";
const MSG_WRITE_VAR: &str = "Error setting variable framebuffer information";

// `<linux/fb.h>` ABI: the libc crate does not export the framebuffer
// structs or ioctl request numbers, so they are mirrored here verbatim.
const FBIOGET_VSCREENINFO: libc::c_ulong = 0x4600;
const FBIOPUT_VSCREENINFO: libc::c_ulong = 0x4601;
const FBIOGET_FSCREENINFO: libc::c_ulong = 0x4602;

#[repr(C)]
#[derive(Debug, Clone, Copy)]
struct fb_bitfield {
    offset: u32,
    length: u32,
    msb_right: u32,
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
struct fb_fix_screeninfo {
    id: [u8; 16],
    smem_start: libc::c_ulong,
    smem_len: u32,
    r#type: u32,
    type_aux: u32,
    visual: u32,
    xpanstep: u16,
    ypanstep: u16,
    ywrapstep: u16,
    line_length: u32,
    mmio_start: libc::c_ulong,
    mmio_len: u32,
    accel: u32,
    capabilities: u16,
    reserved: [u16; 2],
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
struct fb_var_screeninfo {
    xres: u32,
    yres: u32,
    xres_virtual: u32,
    yres_virtual: u32,
    xoffset: u32,
    yoffset: u32,
    bits_per_pixel: u32,
    grayscale: u32,
    red: fb_bitfield,
    green: fb_bitfield,
    blue: fb_bitfield,
    transp: fb_bitfield,
    nonstd: u32,
    activate: u32,
    height: u32,
    width: u32,
    accel_flags: u32,
    pixclock: u32,
    left_margin: u32,
    right_margin: u32,
    upper_margin: u32,
    lower_margin: u32,
    hsync_len: u32,
    vsync_len: u32,
    sync: u32,
    vmode: u32,
    rotate: u32,
    colorspace: u32,
    reserved: [u32; 4],
}

nix::ioctl_read_bad!(fbioget_fscreeninfo, FBIOGET_FSCREENINFO, fb_fix_screeninfo);
nix::ioctl_read_bad!(fbioget_vscreeninfo, FBIOGET_VSCREENINFO, fb_var_screeninfo);
nix::ioctl_write_ptr_bad!(fbioput_vscreeninfo, FBIOPUT_VSCREENINFO, fb_var_screeninfo);

/// Owns one `mmap`ed span of device memory and unmaps it, with the length
/// recorded at mapping time, on drop.
#[derive(Debug)]
struct MappedRegion {
    ptr: NonNull<libc::c_void>,
    len: usize,
}

impl MappedRegion {
    fn map_device(fd: &OwnedFd, len: usize) -> Result<Self, BackendError> {
        let length = NonZeroUsize::new(len).ok_or(BackendError::DeviceMap(Errno::EINVAL))?;
        let ptr = unsafe {
            mmap(
                None,
                length,
                ProtFlags::PROT_READ | ProtFlags::PROT_WRITE,
                MapFlags::MAP_SHARED,
                fd,
                0,
            )
        }
        .map_err(BackendError::DeviceMap)?;
        Ok(Self { ptr, len })
    }

    fn base(&self) -> NonNull<u8> {
        self.ptr.cast()
    }
}

impl Drop for MappedRegion {
    fn drop(&mut self) {
        if let Err(err) = unsafe { munmap(self.ptr, self.len) } {
            warn!("munmap of {} byte framebuffer mapping failed: {}", self.len, err);
        } else {
            trace!("unmapped {} bytes of framebuffer memory", self.len);
        }
    }
}

/// Surface backend over a memory-mapped framebuffer device.
///
/// Field order is load-bearing for teardown: the surface view is released
/// first, then the mapping is unmapped, then the device fd closes. The same
/// order holds on partial-construction failure, where whichever resources
/// were already acquired are released by their own drops.
#[derive(Debug)]
pub struct FbDevBackend {
    surface: Option<Surface>,
    map: MappedRegion,
    fd: OwnedFd,
    /// Hardware scanline pitch in bytes, fixed for the device's lifetime.
    line_length: u32,
    width: u32,
    height: u32,
    format: PixelFormat,
}

impl FbDevBackend {
    /// Opens the primary framebuffer device, [`DEFAULT_DEVICE_PATH`].
    pub fn new() -> Result<Self, BackendError> {
        Self::open_path(DEFAULT_DEVICE_PATH)
    }

    /// Opens the framebuffer device at `path`, maps its memory, and reads
    /// the current video mode.
    pub fn open_path(path: impl AsRef<Path>) -> Result<Self, BackendError> {
        let path = path.as_ref();
        let fd = open(path, OFlag::O_RDWR, Mode::empty()).map_err(|errno| {
            BackendError::DeviceOpen {
                path: path.to_path_buf(),
                source: errno,
            }
        })?;
        debug!("opened framebuffer device {} (fd {})", path.display(), fd.as_raw_fd());

        let finfo = read_fixed_info(&fd)?;
        let map = MappedRegion::map_device(&fd, finfo.smem_len as usize)?;
        trace!(
            "mapped {} bytes of framebuffer memory, line length {} bytes",
            finfo.smem_len,
            finfo.line_length
        );

        let vinfo = read_var_info(&fd)?;
        let format = PixelFormat::from_bits_per_pixel(vinfo.bits_per_pixel)?;
        debug!(
            "framebuffer mode {}x{} at {} bpp ({:?})",
            vinfo.xres, vinfo.yres, vinfo.bits_per_pixel, format
        );

        Ok(Self {
            surface: None,
            map,
            fd,
            line_length: finfo.line_length,
            width: vinfo.xres,
            height: vinfo.yres,
            format,
        })
    }

    /// Total bytes of device memory mapped at construction. The mapping is
    /// never resized afterwards.
    pub fn mapped_len(&self) -> usize {
        self.map.len
    }

    fn read_var(&self) -> Result<fb_var_screeninfo, BackendError> {
        read_var_info(&self.fd)
    }

    fn write_var(&self, vinfo: &fb_var_screeninfo) -> Result<(), BackendError> {
        unsafe { fbioput_vscreeninfo(self.fd.as_raw_fd(), vinfo) }.map_err(|errno| {
            BackendError::DeviceWrite {
                msg: MSG_WRITE_VAR,
                source: errno,
            }
        })?;
        Ok(())
    }
}

impl Backend for FbDevBackend {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn format(&self) -> PixelFormat {
        self.format
    }

    /// Pushes a new horizontal resolution to the driver.
    ///
    /// The mapping made at construction is never resized; a mode that needs
    /// more device memory than was mapped is not validated here and is the
    /// caller's responsibility.
    fn set_width(&mut self, width: u32) -> Result<(), BackendError> {
        let mut vinfo = self.read_var()?;
        vinfo.xres = width;
        self.write_var(&vinfo)?;
        // Mirror updated only after the device accepted the mode.
        self.width = width;
        trace!("framebuffer width set to {}", width);
        Ok(())
    }

    /// Pushes a new vertical resolution to the driver. Same mapping caveat
    /// as [`set_width`](Backend::set_width).
    fn set_height(&mut self, height: u32) -> Result<(), BackendError> {
        let mut vinfo = self.read_var()?;
        vinfo.yres = height;
        self.write_var(&vinfo)?;
        self.height = height;
        trace!("framebuffer height set to {}", height);
        Ok(())
    }

    fn set_format(&mut self, format: PixelFormat) -> Result<(), BackendError> {
        let mut vinfo = self.read_var()?;
        vinfo.bits_per_pixel = format.bits_per_pixel();
        self.write_var(&vinfo)?;
        self.format = format;
        trace!("framebuffer format set to {:?}", format);
        Ok(())
    }

    /// Builds a drawable surface directly over the mapped device memory,
    /// using the mode the device reports right now rather than the cached
    /// mirror. Replaces (and thereby releases) any previously held surface.
    fn create_surface(&mut self) -> Result<&mut Surface, BackendError> {
        let vinfo = self.read_var()?;
        let format = PixelFormat::from_bits_per_pixel(vinfo.bits_per_pixel)?;

        // Refresh the mirror while we hold fresh device state.
        self.width = vinfo.xres;
        self.height = vinfo.yres;
        self.format = format;

        let surface = unsafe {
            Surface::from_raw_parts(
                self.map.base(),
                self.map.len,
                format,
                vinfo.xres,
                vinfo.yres,
                self.line_length,
            )
        };
        Ok(self.surface.insert(surface))
    }

    fn recreate_surface(&mut self) -> Result<&mut Surface, BackendError> {
        self.create_surface()
    }

    fn destroy_surface(&mut self) {
        if self.surface.take().is_some() {
            trace!("framebuffer surface released");
        }
    }

    fn surface(&self) -> Option<&Surface> {
        self.surface.as_ref()
    }
}

fn read_fixed_info(fd: &OwnedFd) -> Result<fb_fix_screeninfo, BackendError> {
    let mut finfo: fb_fix_screeninfo = unsafe { std::mem::zeroed() };
    unsafe { fbioget_fscreeninfo(fd.as_raw_fd(), &mut finfo) }.map_err(|errno| {
        BackendError::DeviceQuery {
            msg: MSG_READ_FIXED,
            source: errno,
        }
    })?;
    Ok(finfo)
}

fn read_var_info(fd: &OwnedFd) -> Result<fb_var_screeninfo, BackendError> {
    let mut vinfo: fb_var_screeninfo = unsafe { std::mem::zeroed() };
    unsafe { fbioget_vscreeninfo(fd.as_raw_fd(), &mut vinfo) }.map_err(|errno| {
        BackendError::DeviceQuery {
            msg: MSG_READ_VAR,
            source: errno,
        }
    })?;
    Ok(vinfo)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test_log::test]
    fn open_nonexistent_device_names_the_path() {
        let err = FbDevBackend::open_path("/dev/fb99").unwrap_err();
        match &err {
            BackendError::DeviceOpen { path, .. } => {
                assert_eq!(path.to_str(), Some("/dev/fb99"));
            }
            other => panic!("expected DeviceOpen, got {:?}", other),
        }
        assert!(err.to_string().contains("/dev/fb99"));
    }

    #[test_log::test]
    fn mapped_region_guard_unmaps_on_drop() {
        // /dev/zero stands in for a device node: a shared mapping of it is
        // ordinary memory, so the guard's full life cycle can run without a
        // framebuffer present.
        let fd = open("/dev/zero", OFlag::O_RDWR, Mode::empty()).unwrap();
        let region = MappedRegion::map_device(&fd, 4096).unwrap();
        assert_eq!(region.len, 4096);
        unsafe {
            region.base().as_ptr().write(0x5a);
            assert_eq!(region.base().as_ptr().read(), 0x5a);
        }
        drop(region);
    }

    #[test]
    fn zero_length_mapping_is_a_map_error() {
        let fd = open("/dev/zero", OFlag::O_RDWR, Mode::empty()).unwrap();
        assert!(matches!(
            MappedRegion::map_device(&fd, 0),
            Err(BackendError::DeviceMap(_))
        ));
    }

    /// Builds a backend over `/dev/zero`, which accepts a shared mapping
    /// but rejects framebuffer ioctls. Every mode renegotiation fails, so
    /// the cached mirror must keep its seeded values.
    fn zero_backed(width: u32, height: u32, format: PixelFormat) -> FbDevBackend {
        let fd = open("/dev/zero", OFlag::O_RDWR, Mode::empty()).unwrap();
        let map = MappedRegion::map_device(&fd, 4096).unwrap();
        FbDevBackend {
            surface: None,
            map,
            fd,
            line_length: width * format.bytes_per_pixel(),
            width,
            height,
            format,
        }
    }

    #[test_log::test]
    fn failed_width_renegotiation_leaves_mirror_unchanged() {
        let mut backend = zero_backed(640, 480, PixelFormat::Rgb565);
        assert!(matches!(
            backend.set_width(200),
            Err(BackendError::DeviceQuery { .. })
        ));
        assert_eq!(backend.width(), 640);
    }

    #[test_log::test]
    fn failed_height_renegotiation_leaves_mirror_unchanged() {
        let mut backend = zero_backed(640, 480, PixelFormat::Rgb565);
        assert!(matches!(
            backend.set_height(200),
            Err(BackendError::DeviceQuery { .. })
        ));
        assert_eq!(backend.height(), 480);
    }

    #[test]
    fn failed_format_renegotiation_leaves_mirror_unchanged() {
        let mut backend = zero_backed(640, 480, PixelFormat::Rgb565);
        assert!(matches!(
            backend.set_format(PixelFormat::Argb32),
            Err(BackendError::DeviceQuery { .. })
        ));
        assert_eq!(backend.format(), PixelFormat::Rgb565);
    }

    #[test]
    fn destroy_surface_without_one_is_a_no_op() {
        let mut backend = zero_backed(640, 480, PixelFormat::Argb32);
        backend.destroy_surface();
        backend.destroy_surface();
        assert!(backend.surface().is_none());
    }
}
