//! Additive checksum primitive.

/// Additive mod-256 checksum over a byte range.
///
/// The algorithm is fixed by the wire format: the sum of all byte values
/// truncated to 8 bits (`sum(bytes) % 256`). It must match the sensor
/// firmware bit for bit; there is no negotiation.
pub fn additive_checksum(bytes: &[u8]) -> u8 {
    bytes.iter().fold(0u8, |acc, b| acc.wrapping_add(*b))
}
