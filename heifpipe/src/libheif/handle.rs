use std::ffi::c_void;
use std::ptr::{self, NonNull};

use super::{Borrowed, Image, sys_chroma, sys_colorspace, track};
use crate::codec::{self, CodecResult};
use crate::error::{CodecError, check};
use crate::sys;
use crate::types::{Chroma, Colorspace};

/// A `heif_image_handle`: either a top-level image of a read context, or the image
/// added to a writer context by an encode.
pub struct ImageHandle<'a> {
    raw: NonNull<sys::heif_image_handle>,
    _lib: Borrowed<'a>,
}

impl ImageHandle<'_> {
    pub(crate) fn from_raw(ptr: *mut sys::heif_image_handle) -> CodecResult<Self> {
        let raw = NonNull::new(ptr)
            .ok_or_else(|| CodecError::invalid_param("libheif returned a null image handle"))?;
        track(1);
        Ok(ImageHandle {
            raw,
            _lib: Borrowed::default(),
        })
    }
}

impl<'a> codec::ImageHandle for ImageHandle<'a> {
    type Image = Image<'a>;

    fn width(&self) -> u32 {
        let w = unsafe { sys::heif_image_handle_get_width(self.raw.as_ptr()) };
        u32::try_from(w).unwrap_or(0)
    }

    fn height(&self) -> u32 {
        let h = unsafe { sys::heif_image_handle_get_height(self.raw.as_ptr()) };
        u32::try_from(h).unwrap_or(0)
    }

    fn has_alpha(&self) -> bool {
        unsafe { sys::heif_image_handle_has_alpha_channel(self.raw.as_ptr()) != 0 }
    }

    fn is_premultiplied_alpha(&self) -> bool {
        unsafe { sys::heif_image_handle_is_premultiplied_alpha(self.raw.as_ptr()) != 0 }
    }

    fn raw_color_profile_size(&self) -> usize {
        unsafe { sys::heif_image_handle_get_raw_color_profile_size(self.raw.as_ptr()) }
    }

    fn raw_color_profile(&self) -> CodecResult<Vec<u8>> {
        let size = self.raw_color_profile_size();
        let mut buf = vec![0u8; size];
        if size == 0 {
            return Ok(buf);
        }
        // SAFETY: libheif writes exactly `size` bytes, the size it just reported.
        let err = unsafe {
            sys::heif_image_handle_get_raw_color_profile(
                self.raw.as_ptr(),
                buf.as_mut_ptr() as *mut c_void,
            )
        };
        check(err)?;
        Ok(buf)
    }

    fn decode(&self, colorspace: Colorspace, chroma: Chroma) -> CodecResult<Image<'a>> {
        let mut raw = ptr::null_mut();
        let err = unsafe {
            sys::heif_decode_image(
                self.raw.as_ptr(),
                &mut raw,
                sys_colorspace(colorspace),
                sys_chroma(chroma),
                ptr::null(),
            )
        };
        check(err)?;
        Image::from_raw(raw)
    }
}

impl Drop for ImageHandle<'_> {
    fn drop(&mut self) {
        unsafe { sys::heif_image_handle_release(self.raw.as_ptr()) }
        track(-1);
    }
}
