use std::fs;
use std::path::Path;

use tracing::{debug, info};

use crate::codec::{Codec, EncoderHandle, WritableImage, Writer};
use crate::error::{Error, Result, Stage};
use crate::plane::to_strided;
use crate::types::{
    Chroma, ColorProfile, Colorspace, Compression, Decoded, RAW_PROFILE_TAG, RawImage,
};

/// Where [`encode`] writes its output, relative to the working directory.
pub const DEFAULT_OUTPUT: &str = "out.heic";

/// Compression family used for every encode.
pub const COMPRESSION: Compression = Compression::Hevc;

/// Encodes a decoded image to [`DEFAULT_OUTPUT`].
pub fn encode<C: Codec>(codec: &C, decoded: &Decoded) -> Result<()> {
    encode_to(
        codec,
        &decoded.image,
        decoded.color_profile.as_ref(),
        Path::new(DEFAULT_OUTPUT),
    )
}

/// Losslessly encodes `image` into a new container at `path`.
///
/// The profile is attached to the image before it is encoded, and only when it is present
/// and non-empty. The container is written to a temporary file next to `path` and renamed
/// into place, so a failed run never leaves a partial file at `path`. The file ends up with
/// the mode a plain create would give it, or keeps the mode of the file it replaces.
pub fn encode_to<C: Codec>(
    codec: &C,
    image: &RawImage,
    profile: Option<&ColorProfile>,
    path: &Path,
) -> Result<()> {
    let mut writer = codec
        .writer()
        .map_err(|source| Error::EncoderUnavailable {
            compression: COMPRESSION,
            source,
        })?;
    let mut encoder = writer
        .encoder_for(COMPRESSION)
        .map_err(|source| Error::EncoderUnavailable {
            compression: COMPRESSION,
            source,
        })?;
    encoder.set_lossless(true).map_err(Error::Encode)?;

    let chroma = Chroma::packed_for(image.channels());
    let mut img = writer
        .create_image(image.width(), image.height(), Colorspace::Rgb, chroma)
        .map_err(Error::ImageCreate)?;
    let bits_per_pixel = (image.channels() * 8) as u32;
    img.add_plane(image.width(), image.height(), bits_per_pixel)
        .map_err(Error::PlaneAlloc)?;

    let plane = img.plane_mut().ok_or(Error::NullPlane(Stage::Encode))?;
    debug!(
        width = image.width(),
        height = image.height(),
        ?chroma,
        stride = plane.stride,
        "filling plane"
    );
    to_strided(image.pixels(), image.geometry(), plane)?;

    if let Some(profile) = profile.filter(|p| !p.is_empty()) {
        img.set_raw_color_profile(RAW_PROFILE_TAG, profile.bytes())
            .map_err(Error::ProfileAttach)?;
        debug!(size = profile.len(), "attached color profile");
    }

    let _encoded = writer.encode(&img, &mut encoder).map_err(Error::Encode)?;

    write_atomically(&writer, path)?;
    info!(path = %path.display(), "wrote output");
    Ok(())
}

fn write_atomically<W: Writer>(writer: &W, path: &Path) -> Result<()> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let mut builder = tempfile::Builder::new();
    builder.prefix(".heifpipe-").suffix(".heic");
    // tempfile defaults to 0600; ask for 0666 and let the umask apply.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        builder.permissions(fs::Permissions::from_mode(0o666));
    }
    let tmp = builder
        .tempfile_in(dir)
        .map_err(|e| Error::output(path, e))?
        .into_temp_path();

    writer
        .write_to_file(&tmp)
        .map_err(|e| Error::output(path, e))?;
    if let Ok(existing) = fs::metadata(path) {
        fs::set_permissions(&tmp, existing.permissions()).map_err(|e| Error::output(path, e))?;
    }
    tmp.persist(path).map_err(|e| Error::output(path, e.error))?;
    Ok(())
}
