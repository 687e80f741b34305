//! Core types for telemetry frame representation.
//!
//! This module provides the foundational data structures of the decode
//! layer:
//! - [`RawFrame`] is the transport-supplied input unit: bytes plus device
//!   key plus receipt timestamp.
//! - [`DecodedMessage`] is the output: a tagged union over the protocol's
//!   message families, fully detached from the schema that decoded it.
//! - [`PackedChannel`] and [`extract_bits`] handle the bit-packed channel
//!   identity byte of decay frames.
//! - [`additive_checksum`] is the protocol's mod-256 integrity sum.
//! - [`FieldKind`]/[`Value`] describe the big-endian scalar kinds a schema
//!   layout is built from.

mod bits;
mod checksum;
mod message;
mod raw_frame;
mod value;

pub use bits::{
    AXIS_MASK, AXIS_SHIFT, PackedChannel, RX_MASK, RX_SHIFT, TX_MASK, TX_SHIFT, extract_bits,
};
pub use checksum::additive_checksum;
pub use message::{
    AppScratchpad, CommandRequest, CommandResponse, ConfigStatus, DecaySample, DecodedMessage,
    FirmwareVersion, MsapCommand, MsapResponse, ScratchpadStatus,
};
pub use raw_frame::{DeviceKey, RawFrame, Timestamp};
pub use value::{FieldKind, Value};
