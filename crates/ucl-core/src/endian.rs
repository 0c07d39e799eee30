//! Conversions between host integers/floats and big-endian wire order.
//!
//! MessagePack stores every multi-byte field big-endian. `to_be_bytes` and
//! `from_be_bytes` compile down to a byte swap on little-endian hosts and to a
//! plain copy on big-endian ones, so none of these functions branch at runtime.

#[inline]
pub fn to_wire16(value: u16) -> [u8; 2] {
    value.to_be_bytes()
}

#[inline]
pub fn to_wire32(value: u32) -> [u8; 4] {
    value.to_be_bytes()
}

#[inline]
pub fn to_wire64(value: u64) -> [u8; 8] {
    value.to_be_bytes()
}

#[inline]
pub fn from_wire16(bytes: [u8; 2]) -> u16 {
    u16::from_be_bytes(bytes)
}

#[inline]
pub fn from_wire32(bytes: [u8; 4]) -> u32 {
    u32::from_be_bytes(bytes)
}

#[inline]
pub fn from_wire64(bytes: [u8; 8]) -> u64 {
    u64::from_be_bytes(bytes)
}

/// Encode a double through its IEEE-754 bit pattern.
#[inline]
pub fn to_wire_f64(value: f64) -> [u8; 8] {
    to_wire64(value.to_bits())
}

#[inline]
pub fn from_wire_f64(bytes: [u8; 8]) -> f64 {
    f64::from_bits(from_wire64(bytes))
}

/// Read a big-endian unsigned field of 1, 2, 4 or 8 bytes.
///
/// Returns `None` for any other width.
pub fn from_wire_var(bytes: &[u8]) -> Option<u64> {
    match *bytes {
        [b] => Some(u64::from(b)),
        [a, b] => Some(u64::from(from_wire16([a, b]))),
        [a, b, c, d] => Some(u64::from(from_wire32([a, b, c, d]))),
        [a, b, c, d, e, f, g, h] => Some(from_wire64([a, b, c, d, e, f, g, h])),
        _ => None,
    }
}
