//! Frame schema descriptors.
//!
//! A [`FrameSchema`] is a static, versioned description of one wire format:
//! preamble, ordered big-endian field layout, checksum rule, optional
//! length-parameterized tail, terminator. The decoder interprets schemas
//! generically; adding a protocol version means adding a schema entry to
//! the registry, not new imperative parsing code.
//!
//! Schemas are immutable once registered; see [`registry::SchemaRegistry`].

mod builtin;
mod registry;

pub use builtin::{
    COUNTS_TO_MILLIVOLTS, FRAME_TERMINATOR, MSAP_BEGIN_REQUEST, MSAP_BEGIN_RESPONSE,
    MSAP_SCRATCHPAD_STATUS_REQUEST, MSAP_SCRATCHPAD_STATUS_RESPONSE,
};
pub use registry::SchemaRegistry;

use crate::types::FieldKind;

/// One named field in a schema's fixed header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    /// Field name; message constructors look fields up by it.
    pub name: &'static str,
    /// Wire kind (width and signedness).
    pub kind: FieldKind,
}

/// Where a variable tail gets its element count from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LengthSource {
    /// Count is embedded in the fixed header under this field name.
    Field(&'static str),
    /// Count must be supplied by the caller from previously decoded
    /// configuration state (the session's bin count).
    External,
}

/// Descriptor for a frame's variable-length tail.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TailSpec {
    /// Wire kind of each tail element.
    pub kind: FieldKind,
    /// Element count source.
    pub length: LengthSource,
    /// Counts-to-physical-units factor, if the schema defines one.
    /// A protocol calibration constant, never per-call configuration.
    pub scale: Option<f64>,
}

/// Checksum rule: which header field holds the checksum.
///
/// Coverage is every byte after the checksum byte up to but excluding the
/// terminator; the encoder and decoder share this rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChecksumSpec {
    /// Name of the checksum field in the fixed header.
    pub field: &'static str,
}

/// Message family a schema decodes into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    ConfigStatus,
    DecaySample,
    BeginRequest,
    BeginResponse,
    ScratchpadStatusRequest,
    ScratchpadStatusResponse,
}

/// Static, versioned descriptor for one wire format.
#[derive(Debug, Clone)]
pub struct FrameSchema {
    /// Short identifier used in errors and logs (e.g. `conf_v5`).
    pub name: &'static str,
    /// Message family this schema decodes into.
    pub kind: MessageKind,
    /// Expected leading byte sequence.
    pub preamble: &'static [u8],
    /// Format version; schemas sharing a preamble differ by version.
    pub version: u8,
    /// Ordered fixed-header layout, starting immediately after the preamble.
    pub fields: &'static [FieldSpec],
    /// Checksum rule, when the format embeds one.
    pub checksum: Option<ChecksumSpec>,
    /// Header field that must equal `version` for this schema to apply.
    pub version_field: Option<&'static str>,
    /// Header field carrying the declared payload length (MSAP length byte).
    pub declared_len_field: Option<&'static str>,
    /// Variable tail following the fixed header.
    pub tail: Option<TailSpec>,
    /// Trailing terminator byte, when the format has one.
    pub terminator: Option<u8>,
}

impl FrameSchema {
    /// Byte length of the fixed portion: preamble plus all header fields.
    pub fn fixed_length(&self) -> usize {
        self.preamble.len() + self.fields.iter().map(|f| f.kind.width()).sum::<usize>()
    }

    /// Absolute byte offset of a named header field within the frame.
    pub fn offset_of(&self, name: &str) -> Option<usize> {
        let mut offset = self.preamble.len();
        for field in self.fields {
            if field.name == name {
                return Some(offset);
            }
            offset += field.kind.width();
        }
        None
    }

    /// Spec of a named header field.
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Payload length the declared-length field is expected to carry:
    /// everything after the length field itself, excluding the terminator.
    ///
    /// Only meaningful for schemas with `declared_len_field`; tails are
    /// included when present.
    pub fn expected_declared_len(&self, tail_len: usize) -> Option<usize> {
        let name = self.declared_len_field?;
        let offset = self.offset_of(name)?;
        let width = self.field(name)?.kind.width();
        let tail_bytes = self.tail.map(|t| t.kind.width() * tail_len).unwrap_or(0);
        Some(self.fixed_length() - offset - width + tail_bytes)
    }
}
