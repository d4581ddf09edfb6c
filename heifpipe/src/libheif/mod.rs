//! [`Codec`] implementation backed by libheif.
//!
//! Each wrapper owns exactly one libheif object and releases it in `Drop`.

use std::ffi::CString;
use std::marker::PhantomData;
use std::path::Path;
use std::ptr;

#[cfg(test)]
use std::cell::Cell;

use crate::codec::{Codec, CodecResult};
use crate::error::{CodecError, check};
use crate::sys;
use crate::types::{Chroma, Colorspace, Compression};

mod context;
mod encoder;
mod handle;
mod image;

pub use context::Context;
pub use encoder::Encoder;
pub use handle::ImageHandle;
pub use image::Image;

#[cfg(test)]
thread_local! {
    static LIVE_OBJECTS: Cell<isize> = const { Cell::new(0) };
}

/// Records creation (`+1`) or release (`-1`) of a libheif object on this thread.
#[cfg(test)]
pub(crate) fn track(delta: isize) {
    LIVE_OBJECTS.with(|c| c.set(c.get() + delta));
}

#[cfg(not(test))]
#[inline(always)]
pub(crate) fn track(_delta: isize) {}

/// Initialized libheif. Contexts are created through the [`Codec`] impl.
///
/// Every object handed out borrows the `LibHeif` it came from, so libheif stays
/// initialized until the last of them is released:
///
/// ```compile_fail
/// use heifpipe::codec::Codec;
///
/// let codec = heifpipe::libheif::LibHeif::new().unwrap();
/// let writer = codec.writer().unwrap();
/// drop(codec);
/// drop(writer);
/// ```
pub struct LibHeif {
    _private: (),
}

impl LibHeif {
    pub fn new() -> Result<Self, CodecError> {
        check(unsafe { sys::heif_init(ptr::null_mut()) })?;
        Ok(Self { _private: () })
    }
}

impl Drop for LibHeif {
    fn drop(&mut self) {
        unsafe { sys::heif_deinit() }
    }
}

impl Codec for LibHeif {
    type Container<'a> = Context<'a>;
    type Writer<'a> = Context<'a>;

    fn open(&self, path: &Path) -> CodecResult<Context<'_>> {
        let mut ctx = Context::new(self)?;
        ctx.read_from_file(path)?;
        Ok(ctx)
    }

    fn writer(&self) -> CodecResult<Context<'_>> {
        Context::new(self)
    }
}

/// Marks a wrapper as living no longer than the [`LibHeif`] it was created from.
pub(crate) type Borrowed<'a> = PhantomData<&'a LibHeif>;

pub(crate) fn c_path(path: &Path) -> CodecResult<CString> {
    let s = path
        .to_str()
        .ok_or_else(|| CodecError::invalid_param(format!("non UTF-8 path: {:?}", path)))?;
    CString::new(s).map_err(|_| CodecError::invalid_param("path contains a NUL byte"))
}

pub(crate) fn sys_colorspace(colorspace: Colorspace) -> sys::heif_colorspace {
    match colorspace {
        Colorspace::Rgb => sys::heif_colorspace::heif_colorspace_RGB,
    }
}

pub(crate) fn sys_chroma(chroma: Chroma) -> sys::heif_chroma {
    match chroma {
        Chroma::InterleavedRgb => sys::heif_chroma::heif_chroma_interleaved_RGB,
        Chroma::InterleavedRgba => sys::heif_chroma::heif_chroma_interleaved_RGBA,
        Chroma::InterleavedRrggbbaaBe => sys::heif_chroma::heif_chroma_interleaved_RRGGBBAA_BE,
    }
}

pub(crate) fn sys_compression(compression: Compression) -> sys::heif_compression_format {
    match compression {
        Compression::Hevc => sys::heif_compression_format::heif_compression_HEVC,
    }
}
