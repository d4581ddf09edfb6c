//! The codec library as seen by the decode and encode pipelines.
//!
//! Every object handed out by these traits owns a codec resource and releases it when
//! dropped, so the pipelines never call a release function themselves.

use std::path::Path;

use crate::error::CodecError;
use crate::types::{Chroma, Colorspace, Compression, ItemId, Plane, PlaneMut};

pub type CodecResult<T> = std::result::Result<T, CodecError>;

/// Entry point: opens containers for reading and creates writer contexts.
///
/// Containers and writers may borrow the codec, so it cannot be torn down while any of
/// its objects are alive.
pub trait Codec {
    type Container<'a>: Container
    where
        Self: 'a;
    type Writer<'a>: Writer
    where
        Self: 'a;

    fn open(&self, path: &Path) -> CodecResult<Self::Container<'_>>;

    fn writer(&self) -> CodecResult<Self::Writer<'_>>;
}

/// A container opened for reading.
pub trait Container {
    type Handle: ImageHandle;

    /// Top-level image IDs in the order the codec lists them.
    fn top_level_image_ids(&self) -> Vec<ItemId>;

    fn image_handle(&self, id: ItemId) -> CodecResult<Self::Handle>;
}

/// One top-level image of an open container.
pub trait ImageHandle {
    type Image: DecodedImage;

    fn width(&self) -> u32;

    fn height(&self) -> u32;

    fn has_alpha(&self) -> bool;

    fn is_premultiplied_alpha(&self) -> bool;

    /// Size of the embedded ICC profile in bytes; zero when there is none.
    fn raw_color_profile_size(&self) -> usize;

    fn raw_color_profile(&self) -> CodecResult<Vec<u8>>;

    fn decode(&self, colorspace: Colorspace, chroma: Chroma) -> CodecResult<Self::Image>;
}

/// Pixels produced by [`ImageHandle::decode`].
pub trait DecodedImage {
    /// The interleaved plane, or `None` when the codec did not produce one.
    fn plane(&self) -> Option<Plane<'_>>;

    /// Significant bits per sample in the interleaved plane.
    fn bits_per_sample(&self) -> u32;
}

/// Encoder instance for one compression family.
pub trait EncoderHandle {
    fn set_lossless(&mut self, enable: bool) -> CodecResult<()>;
}

/// Image object built up for encoding.
pub trait WritableImage {
    fn add_plane(&mut self, width: u32, height: u32, bits_per_pixel: u32) -> CodecResult<()>;

    /// The interleaved plane added by [`WritableImage::add_plane`], if any.
    fn plane_mut(&mut self) -> Option<PlaneMut<'_>>;

    fn set_raw_color_profile(&mut self, tag: &[u8; 4], bytes: &[u8]) -> CodecResult<()>;
}

/// A context that accumulates encoded images and writes them out as one container.
pub trait Writer {
    type Encoder: EncoderHandle;
    type Image: WritableImage;
    /// Handle to an image added to this context; released when dropped.
    type Encoded;

    fn encoder_for(&self, compression: Compression) -> CodecResult<Self::Encoder>;

    fn create_image(
        &self,
        width: u32,
        height: u32,
        colorspace: Colorspace,
        chroma: Chroma,
    ) -> CodecResult<Self::Image>;

    fn encode(
        &mut self,
        image: &Self::Image,
        encoder: &mut Self::Encoder,
    ) -> CodecResult<Self::Encoded>;

    fn write_to_file(&self, path: &Path) -> CodecResult<()>;
}
