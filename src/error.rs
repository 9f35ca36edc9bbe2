// src/error.rs

//! Error taxonomy for the surface backends.
//!
//! Every failure is raised at the point it happens and unwinds to the
//! caller; nothing is retried and no default geometry or format is ever
//! substituted for a failed negotiation.

use nix::errno::Errno;
use std::path::PathBuf;
use thiserror::Error;

/// Errors produced by the surface backends.
#[derive(Debug, Error)]
pub enum BackendError {
    /// The device node could not be opened (bad path, permissions).
    #[error("cannot open framebuffer device \"{}\": {source}", .path.display())]
    DeviceOpen {
        path: PathBuf,
        #[source]
        source: Errno,
    },

    /// A read-style device control request failed.
    #[error("{msg}: {source}")]
    DeviceQuery {
        msg: &'static str,
        #[source]
        source: Errno,
    },

    /// A write-style device control request failed.
    #[error("{msg}: {source}")]
    DeviceWrite {
        msg: &'static str,
        #[source]
        source: Errno,
    },

    /// Mapping the device memory into the process address space failed.
    #[error("Failed to map framebuffer device to memory: {0}")]
    DeviceMap(#[source] Errno),

    /// The device reported (or the caller requested) a color depth with no
    /// surface representation. Only 16 bpp (RGB 5-6-5) and 32 bpp (ARGB)
    /// are supported.
    #[error("Only valid formats are RGB16_565 & ARGB32")]
    UnsupportedFormat,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_error_names_the_path() {
        let err = BackendError::DeviceOpen {
            path: PathBuf::from("/dev/fb99"),
            source: Errno::ENOENT,
        };
        assert!(err.to_string().contains("/dev/fb99"));
    }

    #[test]
    fn query_error_carries_its_message() {
        let err = BackendError::DeviceQuery {
            msg: "Error reading variable framebuffer information",
            source: Errno::EINVAL,
        };
        assert!(err
            .to_string()
            .starts_with("Error reading variable framebuffer information"));
    }

    #[test]
    fn unsupported_format_message_is_stable() {
        assert_eq!(
            BackendError::UnsupportedFormat.to_string(),
            "Only valid formats are RGB16_565 & ARGB32"
        );
    }
}
