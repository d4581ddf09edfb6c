//! Sanity checks on embedded ICC profile headers, for log output only.
//!
//! Profiles are always carried through byte-for-byte; nothing here alters or rejects them.

use thiserror::Error;

/// Length of the fixed ICC profile header.
pub const HEADER_LEN: usize = 128;

/// Fields of a well-formed profile header worth reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IccHeader {
    /// Major and minor version, e.g. `(4, 3)`.
    pub version: (u8, u8),
    /// Device class signature, e.g. `b"mntr"`.
    pub device_class: [u8; 4],
    /// Data colour space signature, e.g. `b"RGB "`.
    pub color_space: [u8; 4],
}

impl IccHeader {
    pub fn color_space_name(&self) -> String {
        signature_text(&self.color_space)
    }

    pub fn device_class_name(&self) -> String {
        signature_text(&self.device_class)
    }
}

/// Why a profile's header does not look like ICC.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HeaderIssue {
    #[error("{0} bytes is shorter than the 128-byte header")]
    Truncated(usize),
    #[error("header declares {declared} bytes but the profile has {actual}")]
    SizeMismatch { declared: u32, actual: usize },
    #[error("missing 'acsp' signature")]
    MissingSignature,
}

/// Reads the header of `icc`.
pub fn read_header(icc: &[u8]) -> Result<IccHeader, HeaderIssue> {
    let header: &[u8; HEADER_LEN] = icc
        .get(..HEADER_LEN)
        .and_then(|h| h.try_into().ok())
        .ok_or(HeaderIssue::Truncated(icc.len()))?;

    let declared = u32::from_be_bytes(sig(header, 0));
    if declared as usize != icc.len() {
        return Err(HeaderIssue::SizeMismatch {
            declared,
            actual: icc.len(),
        });
    }
    if &sig(header, 36) != b"acsp" {
        return Err(HeaderIssue::MissingSignature);
    }

    Ok(IccHeader {
        // Minor version lives in the high nibble of byte 9.
        version: (header[8], header[9] >> 4),
        device_class: sig(header, 12),
        color_space: sig(header, 16),
    })
}

fn sig(header: &[u8; HEADER_LEN], at: usize) -> [u8; 4] {
    [header[at], header[at + 1], header[at + 2], header[at + 3]]
}

fn signature_text(sig: &[u8; 4]) -> String {
    String::from_utf8_lossy(sig).trim_end().to_string()
}
