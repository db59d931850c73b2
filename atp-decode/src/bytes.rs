//! Big-endian integer reads from a byte slice. Pure, allocation-free.

use crate::error::DecodeError;

/// Reads an unsigned byte at `offset`.
pub fn read_u8(bytes: &[u8], offset: usize) -> Result<u8, DecodeError> {
    need(bytes, offset, 1)?;
    Ok(bytes[offset])
}

/// Reads a big-endian unsigned 16-bit integer at `offset`.
pub fn read_u16(bytes: &[u8], offset: usize) -> Result<u16, DecodeError> {
    need(bytes, offset, 2)?;
    Ok(u16::from_be_bytes([bytes[offset], bytes[offset + 1]]))
}

/// Reads a big-endian signed 16-bit integer at `offset`. The top bit of
/// the first byte is the sign bit.
pub fn read_i16(bytes: &[u8], offset: usize) -> Result<i16, DecodeError> {
    read_u16(bytes, offset).map(|v| v as i16)
}

/// Reads a big-endian unsigned 24-bit integer at `offset`, widened to `u32`.
pub fn read_u24(bytes: &[u8], offset: usize) -> Result<u32, DecodeError> {
    need(bytes, offset, 3)?;
    Ok(u32::from_be_bytes([
        0,
        bytes[offset],
        bytes[offset + 1],
        bytes[offset + 2],
    ]))
}

/// Reads a big-endian unsigned 32-bit integer at `offset`.
pub fn read_u32(bytes: &[u8], offset: usize) -> Result<u32, DecodeError> {
    need(bytes, offset, 4)?;
    Ok(u32::from_be_bytes([
        bytes[offset],
        bytes[offset + 1],
        bytes[offset + 2],
        bytes[offset + 3],
    ]))
}

/// Reads a big-endian signed 32-bit integer at `offset`. The top bit of
/// the first byte is the sign bit.
pub fn read_i32(bytes: &[u8], offset: usize) -> Result<i32, DecodeError> {
    read_u32(bytes, offset).map(|v| v as i32)
}

fn need(bytes: &[u8], offset: usize, width: usize) -> Result<(), DecodeError> {
    if bytes.len() < offset + width {
        Err(DecodeError::Truncated {
            offset,
            need: width,
        })
    } else {
        Ok(())
    }
}

/// The position-counter wrap threshold: the onboard counter wraps at
/// one billion meters.
pub const POSITION_WRAP: u32 = 1_000_000_000;

/// Applies the fixed wrap correction to a raw position field.
pub fn unwrap_position(raw: u32) -> u32 {
    if raw >= POSITION_WRAP {
        raw - POSITION_WRAP
    } else {
        raw
    }
}
