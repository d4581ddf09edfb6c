use std::ffi::{CString, c_int, c_void};
use std::ptr::{self, NonNull};
use std::slice;

use super::{Borrowed, sys_chroma, sys_colorspace, track};
use crate::codec::{CodecResult, DecodedImage, WritableImage};
use crate::error::{CodecError, check};
use crate::sys;
use crate::types::{Chroma, Colorspace, Plane, PlaneMut};

const INTERLEAVED: sys::heif_channel = sys::heif_channel::heif_channel_interleaved;

fn dimension(value: u32) -> CodecResult<c_int> {
    c_int::try_from(value)
        .map_err(|_| CodecError::invalid_param(format!("dimension {} out of range", value)))
}

/// A `heif_image`: decoded pixels, or pixels being prepared for encoding.
pub struct Image<'a> {
    raw: NonNull<sys::heif_image>,
    _lib: Borrowed<'a>,
}

impl Image<'_> {
    pub(crate) fn new(
        width: u32,
        height: u32,
        colorspace: Colorspace,
        chroma: Chroma,
    ) -> CodecResult<Self> {
        let mut raw = ptr::null_mut();
        let err = unsafe {
            sys::heif_image_create(
                dimension(width)?,
                dimension(height)?,
                sys_colorspace(colorspace),
                sys_chroma(chroma),
                &mut raw,
            )
        };
        check(err)?;
        Self::from_raw(raw)
    }

    pub(crate) fn from_raw(ptr: *mut sys::heif_image) -> CodecResult<Self> {
        let raw = NonNull::new(ptr)
            .ok_or_else(|| CodecError::invalid_param("libheif returned a null image"))?;
        track(1);
        Ok(Image {
            raw,
            _lib: Borrowed::default(),
        })
    }

    pub(crate) fn as_ptr(&self) -> *const sys::heif_image {
        self.raw.as_ptr()
    }

    fn plane_rows(&self) -> usize {
        let rows = unsafe { sys::heif_image_get_height(self.raw.as_ptr(), INTERLEAVED) };
        rows.max(0) as usize
    }
}

impl DecodedImage for Image<'_> {
    fn plane(&self) -> Option<Plane<'_>> {
        let mut stride: c_int = 0;
        let data = unsafe {
            sys::heif_image_get_plane_readonly(self.raw.as_ptr(), INTERLEAVED, &mut stride)
        };
        if data.is_null() || stride <= 0 {
            return None;
        }
        let stride = stride as usize;
        let len = stride.checked_mul(self.plane_rows())?;
        // SAFETY: libheif allocates `stride` bytes for every row of the plane, and the
        // plane lives as long as the image, which the returned borrow is tied to.
        let data = unsafe { slice::from_raw_parts(data, len) };
        Some(Plane { data, stride })
    }

    fn bits_per_sample(&self) -> u32 {
        let bits =
            unsafe { sys::heif_image_get_bits_per_pixel_range(self.raw.as_ptr(), INTERLEAVED) };
        bits.max(0) as u32
    }
}

impl WritableImage for Image<'_> {
    fn add_plane(&mut self, width: u32, height: u32, bits_per_pixel: u32) -> CodecResult<()> {
        let bits = c_int::try_from(bits_per_pixel)
            .map_err(|_| CodecError::invalid_param("bit depth out of range"))?;
        let err = unsafe {
            sys::heif_image_add_plane(
                self.raw.as_ptr(),
                INTERLEAVED,
                dimension(width)?,
                dimension(height)?,
                bits,
            )
        };
        check(err)
    }

    fn plane_mut(&mut self) -> Option<PlaneMut<'_>> {
        let mut stride: c_int = 0;
        let data =
            unsafe { sys::heif_image_get_plane(self.raw.as_ptr(), INTERLEAVED, &mut stride) };
        if data.is_null() || stride <= 0 {
            return None;
        }
        let stride = stride as usize;
        let len = stride.checked_mul(self.plane_rows())?;
        // SAFETY: as in `plane`; the exclusive borrow of `self` guarantees unique access.
        let data = unsafe { slice::from_raw_parts_mut(data, len) };
        Some(PlaneMut { data, stride })
    }

    fn set_raw_color_profile(&mut self, tag: &[u8; 4], bytes: &[u8]) -> CodecResult<()> {
        let tag = CString::new(tag.to_vec())
            .map_err(|_| CodecError::invalid_param("profile tag contains a NUL byte"))?;
        let err = unsafe {
            sys::heif_image_set_raw_color_profile(
                self.raw.as_ptr(),
                tag.as_ptr(),
                bytes.as_ptr() as *const c_void,
                bytes.len(),
            )
        };
        check(err)
    }
}

impl Drop for Image<'_> {
    fn drop(&mut self) {
        unsafe { sys::heif_image_release(self.raw.as_ptr()) }
        track(-1);
    }
}
