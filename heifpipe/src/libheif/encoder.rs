use std::ffi::c_int;
use std::ptr::NonNull;

use super::{Borrowed, track};
use crate::codec::{CodecResult, EncoderHandle};
use crate::error::{CodecError, check};
use crate::sys;

/// A `heif_encoder` plugin instance.
pub struct Encoder<'a> {
    raw: NonNull<sys::heif_encoder>,
    _lib: Borrowed<'a>,
}

impl Encoder<'_> {
    pub(crate) fn from_raw(ptr: *mut sys::heif_encoder) -> CodecResult<Self> {
        let raw = NonNull::new(ptr)
            .ok_or_else(|| CodecError::invalid_param("libheif returned a null encoder"))?;
        track(1);
        Ok(Encoder {
            raw,
            _lib: Borrowed::default(),
        })
    }

    pub(crate) fn as_mut_ptr(&mut self) -> *mut sys::heif_encoder {
        self.raw.as_ptr()
    }
}

impl EncoderHandle for Encoder<'_> {
    fn set_lossless(&mut self, enable: bool) -> CodecResult<()> {
        let err = unsafe { sys::heif_encoder_set_lossless(self.raw.as_ptr(), enable as c_int) };
        check(err)
    }
}

impl Drop for Encoder<'_> {
    fn drop(&mut self) {
        unsafe { sys::heif_encoder_release(self.raw.as_ptr()) }
        track(-1);
    }
}
