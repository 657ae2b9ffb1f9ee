//! Byte-order helpers and the additive frame checksum.
//!
//! Readers advance the cursor of any [`bytes::Buf`]. Callers must make sure
//! enough bytes remain (see [`ensure_remaining`]); the frame and command
//! layers validate lengths before anything is read.

use crate::error::AppaError;
use bytes::{Buf, BufMut};
use tracing::error;

/// Additive checksum: sum of all bytes modulo 256.
pub fn checksum(bytes: &[u8]) -> u8 {
    if bytes.is_empty() {
        error!("checksum requested over an empty buffer");
        return 0;
    }
    bytes.iter().fold(0u8, |acc, b| acc.wrapping_add(*b))
}

pub fn ensure_remaining(buf: &impl Buf, expected: usize) -> Result<(), AppaError> {
    if buf.remaining() < expected {
        return Err(AppaError::InsufficientData {
            expected,
            actual: buf.remaining(),
        });
    }
    Ok(())
}

pub fn read_u8(buf: &mut impl Buf) -> u8 {
    buf.get_u8()
}

pub fn read_u16_le(buf: &mut impl Buf) -> u16 {
    buf.get_u16_le()
}

/// Storage metadata is the one place the meters use big-endian words.
pub fn read_u16_be(buf: &mut impl Buf) -> u16 {
    buf.get_u16()
}

/// Signed 24-bit little-endian, sign-extended from bit 23.
pub fn i24_from_le_bytes(bytes: [u8; 3]) -> i32 {
    let raw = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], 0]);
    ((raw << 8) as i32) >> 8
}

pub fn write_u8(buf: &mut impl BufMut, value: u8) {
    buf.put_u8(value);
}

pub fn write_u16_le(buf: &mut impl BufMut, value: u16) {
    buf.put_u16_le(value);
}
