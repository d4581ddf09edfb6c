use std::error::Error as StdError;
use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::types::{Compression, ItemId};

/// Status reported by the codec library for a failed call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodecError {
    /// Top-level error code returned by the codec.
    pub code: i32,
    /// Finer-grained reason within `code`.
    pub subcode: i32,
    /// Optional human-readable detail string when provided by the library.
    pub detail: Option<String>,
}

impl CodecError {
    pub fn new(code: i32, subcode: i32, detail: impl Into<String>) -> Self {
        Self {
            code,
            subcode,
            detail: Some(detail.into()),
        }
    }

    pub(crate) fn alloc() -> Self {
        Self::new(-1, 0, "allocation failed")
    }

    pub(crate) fn invalid_param(msg: impl Into<String>) -> Self {
        Self::new(-2, 0, msg)
    }
}

impl fmt::Display for CodecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.detail {
            Some(detail) => write!(f, "{} (code {}.{})", detail, self.code, self.subcode),
            None => write!(f, "code {}.{}", self.code, self.subcode),
        }
    }
}

impl StdError for CodecError {}

/// Which side of the round trip touched a plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Decode,
    Encode,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stage::Decode => "decoded image",
            Stage::Encode => "image to encode",
        })
    }
}

/// Every way a decode or encode run can fail. All of them end the run.
#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to open container {}: {source}", path.display())]
    ContainerOpen {
        path: PathBuf,
        #[source]
        source: CodecError,
    },

    #[error("container has no top-level images")]
    NoImages,

    #[error("failed to acquire handle for image {id}: {source}")]
    HandleAcquisition {
        id: ItemId,
        #[source]
        source: CodecError,
    },

    #[error("failed to decode image: {0}")]
    Decode(#[source] CodecError),

    #[error("failed to read color profile: {0}")]
    ProfileRead(#[source] CodecError),

    #[error("no {compression} encoder available: {source}")]
    EncoderUnavailable {
        compression: Compression,
        #[source]
        source: CodecError,
    },

    #[error("failed to create image: {0}")]
    ImageCreate(#[source] CodecError),

    #[error("failed to allocate image plane: {0}")]
    PlaneAlloc(#[source] CodecError),

    #[error(
        "plane of {len} bytes with stride {stride} cannot hold {rows} rows of {row_bytes} bytes"
    )]
    PlaneAccess {
        len: usize,
        stride: usize,
        rows: usize,
        row_bytes: usize,
    },

    #[error("failed to encode image: {0}")]
    Encode(#[source] CodecError),

    #[error("failed to attach color profile: {0}")]
    ProfileAttach(#[source] CodecError),

    #[error("failed to write {}: {source}", path.display())]
    OutputWrite {
        path: PathBuf,
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },

    #[error("codec returned no pixel plane for the {0}")]
    NullPlane(Stage),

    #[error("invalid raw image: {0}")]
    InvalidImage(String),
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn output(
        path: impl Into<PathBuf>,
        source: impl Into<Box<dyn StdError + Send + Sync>>,
    ) -> Self {
        Error::OutputWrite {
            path: path.into(),
            source: source.into(),
        }
    }
}

/// Converts a libheif status struct into a `CodecError`.
#[cfg(feature = "libheif")]
pub(crate) fn check(err: crate::sys::heif_error) -> std::result::Result<(), CodecError> {
    use crate::sys::heif_error_code;
    use std::ffi::CStr;

    if err.code == heif_error_code::heif_error_Ok {
        return Ok(());
    }
    let detail = if err.message.is_null() {
        None
    } else {
        // SAFETY: libheif messages are static or context-owned NUL-terminated strings.
        let s = unsafe { CStr::from_ptr(err.message) }
            .to_string_lossy()
            .into_owned();
        if s.is_empty() { None } else { Some(s) }
    };
    Err(CodecError {
        code: err.code as i32,
        subcode: err.subcode as i32,
        detail,
    })
}
