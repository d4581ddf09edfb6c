//! Lossless round trip of a single HEIF image through a packed 8-bit RGB(A) buffer.
//!
//! [`decode`] opens a container, decodes its first top-level image into a tightly
//! packed [`RawImage`] and reads the embedded ICC profile, if any. [`encode`] turns that
//! [`Decoded`] value back into a container, losslessly, with the profile re-attached.
//!
//! Both pipelines are generic over the [`Codec`] traits. With the default `libheif`
//! feature, [`libheif::LibHeif`] implements them on top of libheif; every libheif object
//! is owned by a wrapper that releases it on drop.
//!
//! ```no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let codec = heifpipe::libheif::LibHeif::new()?;
//! let decoded = heifpipe::decode(&codec, "photo.heic".as_ref())?;
//! heifpipe::encode(&codec, &decoded)?;
//! # Ok(())
//! # }
//! ```

/// Low-level bindings to libheif. Most users should favor the safe wrappers in
/// [`libheif`].
#[cfg(feature = "libheif")]
pub use heifpipe_sys as sys;

pub mod codec;
mod decoder;
mod encoder;
mod error;
pub mod icc;
#[cfg(feature = "libheif")]
pub mod libheif;
pub mod plane;
mod types;

pub use codec::Codec;
pub use decoder::{decode, resolve_pixel_configuration};
pub use encoder::{COMPRESSION, DEFAULT_OUTPUT, encode, encode_to};
pub use error::{CodecError, Error, Result, Stage};
pub use types::*;
