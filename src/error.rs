//! Error types for frame decoding.
//!
//! Every failure mode of the decode pipeline is a distinct, named variant of
//! [`DecodeError`]; there is no catch-all. Errors are returned as values
//! from the decoder and dispatcher; nothing in the decode path panics or
//! raises across the dispatch boundary.
//!
//! Each variant that originates from a concrete frame carries a bounded
//! [`FrameBytes`] snippet of the offending bytes so the caller can log a
//! precise diagnostic rather than a generic "parse failed".
//!
//! ```rust
//! use emlink::{DecodeError, FrameBytes};
//!
//! let err = DecodeError::TooShort {
//!     schema: "conf_v5",
//!     needed: 21,
//!     got: 4,
//!     frame: FrameBytes::capture(b"CONF"),
//! };
//! assert!(!err.is_corruption());
//! assert!(err.to_string().contains("conf_v5"));
//! ```

use std::fmt;
use thiserror::Error;

use crate::types::DeviceKey;

/// Result type alias for decode operations.
pub type Result<T, E = DecodeError> = std::result::Result<T, E>;

/// Maximum number of raw bytes retained for diagnostics.
const SNIPPET_LEN: usize = 32;

/// Bounded copy of the offending raw bytes, kept for diagnostics.
///
/// Retains at most the first 32 bytes of the frame plus the original total
/// length; displays as hex.
#[derive(Clone, PartialEq, Eq)]
pub struct FrameBytes {
    bytes: Vec<u8>,
    total_len: usize,
}

impl FrameBytes {
    /// Capture a diagnostic snippet from a raw frame.
    pub fn capture(raw: &[u8]) -> Self {
        Self { bytes: raw[..raw.len().min(SNIPPET_LEN)].to_vec(), total_len: raw.len() }
    }

    /// The captured bytes (possibly truncated).
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Length of the original frame before truncation.
    pub fn total_len(&self) -> usize {
        self.total_len
    }
}

impl fmt::Display for FrameBytes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, b) in self.bytes.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{:02x}", b)?;
        }
        if self.total_len > self.bytes.len() {
            write!(f, " ..+{}", self.total_len - self.bytes.len())?;
        }
        write!(f, "]")
    }
}

impl fmt::Debug for FrameBytes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FrameBytes({} bytes) {}", self.total_len, self)
    }
}

/// Main error type for frame decoding and dispatch.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum DecodeError {
    /// Fewer bytes available than the schema's fixed length requires.
    #[error("frame too short for {schema}: need {needed} bytes, got {got} {frame}")]
    TooShort { schema: &'static str, needed: usize, got: usize, frame: FrameBytes },

    /// Leading bytes do not match the schema preamble.
    #[error("preamble mismatch for {schema}: expected {expected:02x?} {frame}")]
    PreambleMismatch { schema: &'static str, expected: &'static [u8], frame: FrameBytes },

    /// No schema in the registry matches the frame at all.
    #[error("unknown message kind for marker {marker:02x?} (tried {tried:?}) {frame}")]
    UnknownMessageKind { marker: Vec<u8>, tried: Vec<&'static str>, frame: FrameBytes },

    /// Computed checksum disagrees with the embedded checksum byte.
    #[error("checksum mismatch in {schema}: embedded {embedded:#04x}, computed {computed:#04x} {frame}")]
    ChecksumMismatch { schema: &'static str, embedded: u8, computed: u8, frame: FrameBytes },

    /// Frame length or embedded length byte disagrees with the schema layout.
    #[error("length mismatch in {schema}: declared {declared}, expected {expected} {frame}")]
    LengthMismatch { schema: &'static str, declared: usize, expected: usize, frame: FrameBytes },

    /// The version discriminator field does not carry the schema's version.
    #[error("version mismatch in {schema}: expected {expected}, found {found} {frame}")]
    VersionMismatch { schema: &'static str, expected: u8, found: u8, frame: FrameBytes },

    /// The frame terminator byte is missing or wrong.
    #[error("bad terminator in {schema}: expected {expected:#04x}, found {found:#04x} {frame}")]
    BadTerminator { schema: &'static str, expected: u8, found: u8, frame: FrameBytes },

    /// A length-parameterized frame arrived before any configuration
    /// established a bin count for the device.
    #[error("no configuration recorded for device {device}; cannot size {schema} tail")]
    MissingContext { device: DeviceKey, schema: &'static str },

    /// A decoded channel index exceeds the configured channel counts.
    #[error("device {device}: {field} index {value} out of range (max {max})")]
    ChannelOutOfRange { device: DeviceKey, field: &'static str, value: u8, max: u8 },

    /// A schema and its message constructor disagree about field names.
    /// Indicates a defective schema definition, not a malformed frame.
    #[error("schema {schema} decoded no field named '{field}'")]
    MissingField { schema: &'static str, field: &'static str },

    /// A field decoded under a different kind than the one requested.
    /// Indicates a defective schema definition, not a malformed frame.
    #[error("schema {schema} field '{field}' is not a {requested} field")]
    FieldKindMismatch { schema: &'static str, field: &'static str, requested: &'static str },

    /// Two schemas registered with the same preamble and version.
    /// Raised only during registry construction, before any decoding.
    #[error("duplicate schema registration: {name} (preamble {preamble:02x?}, version {version})")]
    DuplicateSchema { name: &'static str, preamble: &'static [u8], version: u8 },
}

impl DecodeError {
    /// Whether this error indicates on-the-wire data corruption, as opposed
    /// to a frame of an unknown or mismatched shape.
    pub fn is_corruption(&self) -> bool {
        matches!(self, DecodeError::ChecksumMismatch { .. } | DecodeError::BadTerminator { .. })
    }

    /// Whether this error can only occur during registry construction.
    pub fn is_startup(&self) -> bool {
        matches!(self, DecodeError::DuplicateSchema { .. })
    }

    /// The diagnostic byte snippet, for variants that carry one.
    pub fn offending_bytes(&self) -> Option<&FrameBytes> {
        match self {
            DecodeError::TooShort { frame, .. }
            | DecodeError::PreambleMismatch { frame, .. }
            | DecodeError::UnknownMessageKind { frame, .. }
            | DecodeError::ChecksumMismatch { frame, .. }
            | DecodeError::LengthMismatch { frame, .. }
            | DecodeError::VersionMismatch { frame, .. }
            | DecodeError::BadTerminator { frame, .. } => Some(frame),
            DecodeError::MissingContext { .. }
            | DecodeError::ChannelOutOfRange { .. }
            | DecodeError::MissingField { .. }
            | DecodeError::FieldKindMismatch { .. }
            | DecodeError::DuplicateSchema { .. } => None,
        }
    }
}
