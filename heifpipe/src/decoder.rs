use std::path::Path;

use tracing::{debug, info, warn};

use crate::codec::{Codec, Container, DecodedImage, ImageHandle};
use crate::error::{CodecError, Error, Result, Stage};
use crate::icc;
use crate::plane::{narrow_to_compact, to_compact};
use crate::types::{
    ColorProfile, Colorspace, Decoded, PixelConfiguration, PlaneGeometry, RawImage,
};

/// Reads the alpha attributes of `handle`.
pub fn resolve_pixel_configuration<H: ImageHandle + ?Sized>(handle: &H) -> PixelConfiguration {
    PixelConfiguration::new(handle.has_alpha(), handle.is_premultiplied_alpha())
}

/// Decodes the first top-level image of the container at `path` into packed 8-bit pixels,
/// together with its embedded ICC profile if it has one.
///
/// Every codec object acquired here is released before this returns, on success or failure.
pub fn decode<C: Codec>(codec: &C, path: &Path) -> Result<Decoded> {
    let container = codec.open(path).map_err(|source| Error::ContainerOpen {
        path: path.to_path_buf(),
        source,
    })?;

    let ids = container.top_level_image_ids();
    let &id = ids.first().ok_or(Error::NoImages)?;
    if ids.len() > 1 {
        debug!(count = ids.len(), "container has several top-level images, using the first");
    }

    let handle = container
        .image_handle(id)
        .map_err(|source| Error::HandleAcquisition { id, source })?;
    let width = handle.width();
    let height = handle.height();
    let config = resolve_pixel_configuration(&handle);
    let chroma = config.chroma();
    debug!(id, width, height, ?chroma, "decoding image");

    let image = handle
        .decode(Colorspace::Rgb, chroma)
        .map_err(Error::Decode)?;
    let plane = image.plane().ok_or(Error::NullPlane(Stage::Decode))?;
    debug!(stride = plane.stride, "decoded plane");

    let geometry = PlaneGeometry::new(width as usize, height as usize, config.channels());
    let pixels = match chroma.bytes_per_sample() {
        1 => to_compact(plane, geometry)?,
        _ => narrow_to_compact(plane, geometry, image.bits_per_sample())?,
    };
    let raw = RawImage::new(width, height, config.channels(), pixels)?;

    let color_profile = read_color_profile(&handle)?;

    Ok(Decoded {
        image: raw,
        color_profile,
    })
}

fn read_color_profile<H: ImageHandle>(handle: &H) -> Result<Option<ColorProfile>> {
    let size = handle.raw_color_profile_size();
    if size == 0 {
        info!("image doesn't contain color profile data");
        return Ok(None);
    }

    let bytes = handle.raw_color_profile().map_err(Error::ProfileRead)?;
    if bytes.len() != size {
        return Err(Error::ProfileRead(CodecError::invalid_param(format!(
            "expected {} profile bytes, got {}",
            size,
            bytes.len()
        ))));
    }

    match icc::read_header(&bytes) {
        Ok(header) => debug!(
            size,
            version = ?header.version,
            class = %header.device_class_name(),
            color_space = %header.color_space_name(),
            "read ICC profile"
        ),
        Err(issue) => warn!(
            size,
            %issue,
            "embedded color profile is not a well-formed ICC profile"
        ),
    }
    Ok(Some(ColorProfile::new(bytes)))
}
