//! Row copies between packed pixel buffers and strided codec planes.

use crate::error::{Error, Result};
use crate::types::{Plane, PlaneGeometry, PlaneMut};

fn check_bounds(len: usize, stride: usize, rows: usize, row_bytes: usize) -> Result<()> {
    let needed = match rows {
        0 => Some(0),
        _ => stride
            .checked_mul(rows - 1)
            .and_then(|v| v.checked_add(row_bytes)),
    };
    if stride < row_bytes || needed.is_none_or(|needed| needed > len) {
        return Err(Error::PlaneAccess {
            len,
            stride,
            rows,
            row_bytes,
        });
    }
    Ok(())
}

/// Copies the visible part of every row out of a strided 8-bit plane, dropping row padding.
pub fn to_compact(src: Plane<'_>, geometry: PlaneGeometry) -> Result<Vec<u8>> {
    let row_bytes = geometry.row_bytes();
    check_bounds(src.data.len(), src.stride, geometry.height, row_bytes)?;
    if row_bytes == 0 || geometry.height == 0 {
        return Ok(Vec::new());
    }

    let mut out = vec![0u8; row_bytes * geometry.height];
    for (dst, row) in out
        .chunks_exact_mut(row_bytes)
        .zip(src.data.chunks(src.stride))
    {
        dst.copy_from_slice(&row[..row_bytes]);
    }
    Ok(out)
}

/// Copies packed rows into a strided plane. Padding bytes in `dst` are left untouched.
pub fn to_strided(packed: &[u8], geometry: PlaneGeometry, dst: PlaneMut<'_>) -> Result<()> {
    let row_bytes = geometry.row_bytes();
    if packed.len() != row_bytes * geometry.height {
        return Err(Error::InvalidImage(format!(
            "packed buffer holds {} bytes, plane needs {}",
            packed.len(),
            row_bytes * geometry.height
        )));
    }
    check_bounds(dst.data.len(), dst.stride, geometry.height, row_bytes)?;
    if row_bytes == 0 || geometry.height == 0 {
        return Ok(());
    }

    for (row, out) in packed
        .chunks_exact(row_bytes)
        .zip(dst.data.chunks_mut(dst.stride))
    {
        out[..row_bytes].copy_from_slice(row);
    }
    Ok(())
}

/// Like [`to_compact`] for planes of big-endian 16-bit samples holding `bits_per_sample`
/// significant bits; each sample is reduced to its top 8 bits.
pub fn narrow_to_compact(
    src: Plane<'_>,
    geometry: PlaneGeometry,
    bits_per_sample: u32,
) -> Result<Vec<u8>> {
    let row_bytes = geometry.row_bytes();
    let wide_row_bytes = row_bytes * 2;
    check_bounds(src.data.len(), src.stride, geometry.height, wide_row_bytes)?;
    if row_bytes == 0 || geometry.height == 0 {
        return Ok(Vec::new());
    }

    let shift = bits_per_sample.saturating_sub(8);
    let mut out = vec![0u8; row_bytes * geometry.height];
    for (dst, row) in out
        .chunks_exact_mut(row_bytes)
        .zip(src.data.chunks(src.stride))
    {
        for (d, sample) in dst.iter_mut().zip(row[..wide_row_bytes].chunks_exact(2)) {
            let value = u16::from_be_bytes([sample[0], sample[1]]) >> shift;
            *d = value.min(u8::MAX as u16) as u8;
        }
    }
    Ok(out)
}
