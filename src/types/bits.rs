//! Bit extraction and the packed channel identifier byte.

use serde::{Deserialize, Serialize};

/// Extract a packed sub-field from a byte: apply `mask`, then shift right.
///
/// Always succeeds for any byte value. Whether the extracted index is
/// semantically in range is the dispatcher's concern; it validates decoded
/// channel indices against the configured channel counts.
pub fn extract_bits(byte: u8, mask: u8, shift: u8) -> u8 {
    (byte & mask) >> shift
}

/// Transmitter index mask: upper three bits of the ident byte.
pub const TX_MASK: u8 = 0b1110_0000;
/// Transmitter index shift.
pub const TX_SHIFT: u8 = 5;
/// Receiver index mask: middle three bits.
pub const RX_MASK: u8 = 0b0001_1100;
/// Receiver index shift.
pub const RX_SHIFT: u8 = 2;
/// Axis index mask: low two bits.
pub const AXIS_MASK: u8 = 0b0000_0011;
/// Axis index shift.
pub const AXIS_SHIFT: u8 = 0;

/// Channel identity packed into the decay-frame ident byte.
///
/// Three-bit transmitter index, three-bit receiver index and two-bit axis
/// index share one byte on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PackedChannel {
    /// Transmitter index (0-7).
    pub tx: u8,
    /// Receiver index (0-7).
    pub rx: u8,
    /// Axis index (0-3).
    pub axis: u8,
}

impl PackedChannel {
    /// Decompose an ident byte into its channel indices.
    pub fn from_ident(byte: u8) -> Self {
        Self {
            tx: extract_bits(byte, TX_MASK, TX_SHIFT),
            rx: extract_bits(byte, RX_MASK, RX_SHIFT),
            axis: extract_bits(byte, AXIS_MASK, AXIS_SHIFT),
        }
    }

    /// Pack the channel indices back into an ident byte.
    ///
    /// Indices are truncated to their wire bit widths.
    pub fn to_ident(self) -> u8 {
        ((self.tx << TX_SHIFT) & TX_MASK)
            | ((self.rx << RX_SHIFT) & RX_MASK)
            | (self.axis & AXIS_MASK)
    }
}

impl std::fmt::Display for PackedChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "tx{}rx{}a{}", self.tx, self.rx, self.axis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn extract_bits_basic() {
        assert_eq!(extract_bits(0b1010_0000, TX_MASK, TX_SHIFT), 0b101);
        assert_eq!(extract_bits(0b0001_0100, RX_MASK, RX_SHIFT), 0b101);
        assert_eq!(extract_bits(0b0000_0011, AXIS_MASK, AXIS_SHIFT), 0b11);
    }

    #[test]
    fn ident_roundtrip_all_bytes() {
        for byte in 0u8..=255 {
            let ch = PackedChannel::from_ident(byte);
            assert_eq!(ch.to_ident(), byte);
        }
    }

    proptest! {
        #[test]
        fn extracted_fields_stay_within_bit_width(byte in any::<u8>()) {
            let ch = PackedChannel::from_ident(byte);
            prop_assert!(ch.tx <= 7);
            prop_assert!(ch.rx <= 7);
            prop_assert!(ch.axis <= 3);
        }

        #[test]
        fn extract_bits_never_exceeds_mask(byte in any::<u8>()) {
            // For every (mask, shift) pair used by the schemas the extracted
            // value fits in the mask's width.
            for (mask, shift) in [(TX_MASK, TX_SHIFT), (RX_MASK, RX_SHIFT), (AXIS_MASK, AXIS_SHIFT)] {
                let value = extract_bits(byte, mask, shift);
                prop_assert!(value <= mask >> shift);
            }
        }
    }
}
