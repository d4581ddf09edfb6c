use std::path::Path;
use std::ptr::{self, NonNull};

use super::{Borrowed, Encoder, Image, ImageHandle, LibHeif, c_path, sys_compression, track};
use crate::codec::{CodecResult, Container, Writer};
use crate::error::{CodecError, check};
use crate::sys;
use crate::types::{Chroma, Colorspace, Compression, ItemId};

/// A `heif_context`, used either to read a container or to assemble a new one.
pub struct Context<'a> {
    raw: NonNull<sys::heif_context>,
    _lib: Borrowed<'a>,
}

impl<'a> Context<'a> {
    pub fn new(_lib: &'a LibHeif) -> CodecResult<Self> {
        let ptr = unsafe { sys::heif_context_alloc() };
        let raw = NonNull::new(ptr).ok_or_else(CodecError::alloc)?;
        track(1);
        Ok(Context {
            raw,
            _lib: Borrowed::default(),
        })
    }

    pub fn read_from_file(&mut self, path: &Path) -> CodecResult<()> {
        let path = c_path(path)?;
        let err = unsafe {
            sys::heif_context_read_from_file(self.raw.as_ptr(), path.as_ptr(), ptr::null())
        };
        check(err)
    }
}

impl<'a> Container for Context<'a> {
    type Handle = ImageHandle<'a>;

    fn top_level_image_ids(&self) -> Vec<ItemId> {
        let count = unsafe { sys::heif_context_get_number_of_top_level_images(self.raw.as_ptr()) };
        if count <= 0 {
            return Vec::new();
        }
        let mut ids: Vec<sys::heif_item_id> = vec![0; count as usize];
        let filled = unsafe {
            sys::heif_context_get_list_of_top_level_image_IDs(
                self.raw.as_ptr(),
                ids.as_mut_ptr(),
                count,
            )
        };
        ids.truncate(filled.max(0) as usize);
        ids
    }

    fn image_handle(&self, id: ItemId) -> CodecResult<ImageHandle<'a>> {
        let mut raw = ptr::null_mut();
        let err = unsafe { sys::heif_context_get_image_handle(self.raw.as_ptr(), id, &mut raw) };
        check(err)?;
        ImageHandle::from_raw(raw)
    }
}

impl<'a> Writer for Context<'a> {
    type Encoder = Encoder<'a>;
    type Image = Image<'a>;
    type Encoded = ImageHandle<'a>;

    fn encoder_for(&self, compression: Compression) -> CodecResult<Encoder<'a>> {
        let mut raw = ptr::null_mut();
        let err = unsafe {
            sys::heif_context_get_encoder_for_format(
                self.raw.as_ptr(),
                sys_compression(compression),
                &mut raw,
            )
        };
        check(err)?;
        Encoder::from_raw(raw)
    }

    fn create_image(
        &self,
        width: u32,
        height: u32,
        colorspace: Colorspace,
        chroma: Chroma,
    ) -> CodecResult<Image<'a>> {
        Image::new(width, height, colorspace, chroma)
    }

    fn encode(
        &mut self,
        image: &Image<'a>,
        encoder: &mut Encoder<'a>,
    ) -> CodecResult<ImageHandle<'a>> {
        let mut raw = ptr::null_mut();
        let err = unsafe {
            sys::heif_context_encode_image(
                self.raw.as_ptr(),
                image.as_ptr(),
                encoder.as_mut_ptr(),
                ptr::null(),
                &mut raw,
            )
        };
        check(err)?;
        ImageHandle::from_raw(raw)
    }

    fn write_to_file(&self, path: &Path) -> CodecResult<()> {
        let path = c_path(path)?;
        let err = unsafe { sys::heif_context_write_to_file(self.raw.as_ptr(), path.as_ptr()) };
        check(err)
    }
}

impl Drop for Context<'_> {
    fn drop(&mut self) {
        unsafe { sys::heif_context_free(self.raw.as_ptr()) }
        track(-1);
    }
}
