//! Built-in wire catalogue: the schemas this crate ships with.
//!
//! Layouts here are bit-for-bit contractual with deployed hardware. Field
//! order, widths, and the checksum coverage rule must not change; a new
//! firmware format gets a new schema entry instead.

use super::{ChecksumSpec, FieldSpec, FrameSchema, LengthSource, MessageKind, TailSpec};
use crate::types::FieldKind;

/// Line-feed terminator carried by the textual-serial frame variants.
pub const FRAME_TERMINATOR: u8 = 0x0A;

/// Calibration factor converting raw decay counts to millivolts.
///
/// Full scale is 5000 mV over a signed 16-bit count range.
pub const COUNTS_TO_MILLIVOLTS: f64 = 5000.0 / 32768.0;

/// MSAP opcode: begin an over-the-air update transaction.
pub const MSAP_BEGIN_REQUEST: u8 = 0x01;
/// MSAP opcode: begin-request acknowledgement.
pub const MSAP_BEGIN_RESPONSE: u8 = 0x81;
/// MSAP opcode: query scratchpad status.
pub const MSAP_SCRATCHPAD_STATUS_REQUEST: u8 = 0x19;
/// MSAP opcode: scratchpad status report, short or long format.
pub const MSAP_SCRATCHPAD_STATUS_RESPONSE: u8 = 0x99;

const CONF_PREAMBLE: &[u8] = b"CONF";
const DECAY_PREAMBLE: &[u8] = b"t";

static CONF_V3_FIELDS: [FieldSpec; 10] = [
    FieldSpec { name: "config_version", kind: FieldKind::U8 },
    FieldSpec { name: "system_id", kind: FieldKind::U16 },
    FieldSpec { name: "fiducial", kind: FieldKind::U16 },
    FieldSpec { name: "firmware_rev", kind: FieldKind::U16 },
    FieldSpec { name: "tx_count", kind: FieldKind::U8 },
    FieldSpec { name: "rx_count", kind: FieldKind::U8 },
    FieldSpec { name: "axis_count", kind: FieldKind::U8 },
    FieldSpec { name: "sample_timer", kind: FieldKind::U16 },
    FieldSpec { name: "holdoff", kind: FieldKind::U16 },
    FieldSpec { name: "bin_count", kind: FieldKind::U8 },
];

// v5 is the v3 layout with checksum and checksum_version prepended.
static CONF_V5_FIELDS: [FieldSpec; 12] = [
    FieldSpec { name: "checksum", kind: FieldKind::U8 },
    FieldSpec { name: "checksum_version", kind: FieldKind::U8 },
    FieldSpec { name: "config_version", kind: FieldKind::U8 },
    FieldSpec { name: "system_id", kind: FieldKind::U16 },
    FieldSpec { name: "fiducial", kind: FieldKind::U16 },
    FieldSpec { name: "firmware_rev", kind: FieldKind::U16 },
    FieldSpec { name: "tx_count", kind: FieldKind::U8 },
    FieldSpec { name: "rx_count", kind: FieldKind::U8 },
    FieldSpec { name: "axis_count", kind: FieldKind::U8 },
    FieldSpec { name: "sample_timer", kind: FieldKind::U16 },
    FieldSpec { name: "holdoff", kind: FieldKind::U16 },
    FieldSpec { name: "bin_count", kind: FieldKind::U8 },
];

static DECAY_V1_FIELDS: [FieldSpec; 2] = [
    FieldSpec { name: "ident", kind: FieldKind::U8 },
    FieldSpec { name: "fiducial", kind: FieldKind::U16 },
];

static DECAY_V2_FIELDS: [FieldSpec; 3] = [
    FieldSpec { name: "checksum", kind: FieldKind::U8 },
    FieldSpec { name: "ident", kind: FieldKind::U8 },
    FieldSpec { name: "fiducial", kind: FieldKind::U16 },
];

static MSAP_LEN_ONLY_FIELDS: [FieldSpec; 1] = [FieldSpec { name: "length", kind: FieldKind::U8 }];

static MSAP_BEGIN_RESP_FIELDS: [FieldSpec; 2] = [
    FieldSpec { name: "length", kind: FieldKind::U8 },
    FieldSpec { name: "result", kind: FieldKind::U8 },
];

static SCRATCHPAD_SHORT_FIELDS: [FieldSpec; 14] = [
    FieldSpec { name: "length", kind: FieldKind::U8 },
    FieldSpec { name: "stored_len", kind: FieldKind::U32 },
    FieldSpec { name: "stored_crc", kind: FieldKind::U16 },
    FieldSpec { name: "stored_seq", kind: FieldKind::U8 },
    FieldSpec { name: "stored_type", kind: FieldKind::U8 },
    FieldSpec { name: "stored_status", kind: FieldKind::U8 },
    FieldSpec { name: "processed_len", kind: FieldKind::U32 },
    FieldSpec { name: "processed_crc", kind: FieldKind::U16 },
    FieldSpec { name: "processed_seq", kind: FieldKind::U8 },
    FieldSpec { name: "firmware_area_id", kind: FieldKind::U32 },
    FieldSpec { name: "fw_major", kind: FieldKind::U8 },
    FieldSpec { name: "fw_minor", kind: FieldKind::U8 },
    FieldSpec { name: "fw_maintenance", kind: FieldKind::U8 },
    FieldSpec { name: "fw_development", kind: FieldKind::U8 },
];

static SCRATCHPAD_LONG_FIELDS: [FieldSpec; 22] = [
    FieldSpec { name: "length", kind: FieldKind::U8 },
    FieldSpec { name: "stored_len", kind: FieldKind::U32 },
    FieldSpec { name: "stored_crc", kind: FieldKind::U16 },
    FieldSpec { name: "stored_seq", kind: FieldKind::U8 },
    FieldSpec { name: "stored_type", kind: FieldKind::U8 },
    FieldSpec { name: "stored_status", kind: FieldKind::U8 },
    FieldSpec { name: "processed_len", kind: FieldKind::U32 },
    FieldSpec { name: "processed_crc", kind: FieldKind::U16 },
    FieldSpec { name: "processed_seq", kind: FieldKind::U8 },
    FieldSpec { name: "firmware_area_id", kind: FieldKind::U32 },
    FieldSpec { name: "fw_major", kind: FieldKind::U8 },
    FieldSpec { name: "fw_minor", kind: FieldKind::U8 },
    FieldSpec { name: "fw_maintenance", kind: FieldKind::U8 },
    FieldSpec { name: "fw_development", kind: FieldKind::U8 },
    FieldSpec { name: "app_processed_len", kind: FieldKind::U32 },
    FieldSpec { name: "app_processed_crc", kind: FieldKind::U16 },
    FieldSpec { name: "app_processed_seq", kind: FieldKind::U8 },
    FieldSpec { name: "app_area_id", kind: FieldKind::U32 },
    FieldSpec { name: "app_major", kind: FieldKind::U8 },
    FieldSpec { name: "app_minor", kind: FieldKind::U8 },
    FieldSpec { name: "app_maintenance", kind: FieldKind::U8 },
    FieldSpec { name: "app_development", kind: FieldKind::U8 },
];

/// `CONF` status frame, v3 layout. No checksum.
pub(super) fn conf_v3() -> FrameSchema {
    FrameSchema {
        name: "conf_v3",
        kind: MessageKind::ConfigStatus,
        preamble: CONF_PREAMBLE,
        version: 3,
        fields: &CONF_V3_FIELDS,
        checksum: None,
        version_field: Some("config_version"),
        declared_len_field: None,
        tail: Some(TailSpec {
            kind: FieldKind::U16,
            length: LengthSource::Field("bin_count"),
            scale: None,
        }),
        terminator: Some(FRAME_TERMINATOR),
    }
}

/// `CONF` status frame, v5 layout. Adds leading checksum and
/// checksum-version bytes ahead of the v3 field set.
pub(super) fn conf_v5() -> FrameSchema {
    FrameSchema {
        name: "conf_v5",
        kind: MessageKind::ConfigStatus,
        preamble: CONF_PREAMBLE,
        version: 5,
        fields: &CONF_V5_FIELDS,
        checksum: Some(ChecksumSpec { field: "checksum" }),
        version_field: Some("config_version"),
        declared_len_field: None,
        tail: Some(TailSpec {
            kind: FieldKind::U16,
            length: LengthSource::Field("bin_count"),
            scale: None,
        }),
        terminator: Some(FRAME_TERMINATOR),
    }
}

/// `t` decay frame, v1 layout. Bin count comes from session state.
pub(super) fn decay_v1() -> FrameSchema {
    FrameSchema {
        name: "decay_v1",
        kind: MessageKind::DecaySample,
        preamble: DECAY_PREAMBLE,
        version: 1,
        fields: &DECAY_V1_FIELDS,
        checksum: None,
        version_field: None,
        declared_len_field: None,
        tail: Some(TailSpec {
            kind: FieldKind::I16,
            length: LengthSource::External,
            scale: Some(COUNTS_TO_MILLIVOLTS),
        }),
        terminator: Some(FRAME_TERMINATOR),
    }
}

/// `t` decay frame, v2 layout. Adds a leading checksum byte.
pub(super) fn decay_v2() -> FrameSchema {
    FrameSchema {
        name: "decay_v2",
        kind: MessageKind::DecaySample,
        preamble: DECAY_PREAMBLE,
        version: 2,
        fields: &DECAY_V2_FIELDS,
        checksum: Some(ChecksumSpec { field: "checksum" }),
        version_field: None,
        declared_len_field: None,
        tail: Some(TailSpec {
            kind: FieldKind::I16,
            length: LengthSource::External,
            scale: Some(COUNTS_TO_MILLIVOLTS),
        }),
        terminator: Some(FRAME_TERMINATOR),
    }
}

fn msap(
    name: &'static str,
    kind: MessageKind,
    opcode: &'static [u8],
    version: u8,
    fields: &'static [FieldSpec],
) -> FrameSchema {
    FrameSchema {
        name,
        kind,
        preamble: opcode,
        version,
        fields,
        checksum: None,
        version_field: None,
        declared_len_field: Some("length"),
        tail: None,
        terminator: None,
    }
}

/// MSAP begin request: opcode + zero-length payload.
pub(super) fn msap_begin_request() -> FrameSchema {
    msap("msap_begin_req", MessageKind::BeginRequest, &[MSAP_BEGIN_REQUEST], 1, &MSAP_LEN_ONLY_FIELDS)
}

/// MSAP begin response: opcode + one result byte.
pub(super) fn msap_begin_response() -> FrameSchema {
    msap(
        "msap_begin_resp",
        MessageKind::BeginResponse,
        &[MSAP_BEGIN_RESPONSE],
        1,
        &MSAP_BEGIN_RESP_FIELDS,
    )
}

/// MSAP scratchpad-status request: opcode + zero-length payload.
pub(super) fn msap_status_request() -> FrameSchema {
    msap(
        "msap_status_req",
        MessageKind::ScratchpadStatusRequest,
        &[MSAP_SCRATCHPAD_STATUS_REQUEST],
        1,
        &MSAP_LEN_ONLY_FIELDS,
    )
}

/// MSAP scratchpad-status response, short (24-byte payload) format.
pub(super) fn msap_status_response_short() -> FrameSchema {
    msap(
        "msap_status_resp_short",
        MessageKind::ScratchpadStatusResponse,
        &[MSAP_SCRATCHPAD_STATUS_RESPONSE],
        1,
        &SCRATCHPAD_SHORT_FIELDS,
    )
}

/// MSAP scratchpad-status response, long (39-byte payload) format with
/// the application-processed scratchpad block appended.
pub(super) fn msap_status_response_long() -> FrameSchema {
    msap(
        "msap_status_resp_long",
        MessageKind::ScratchpadStatusResponse,
        &[MSAP_SCRATCHPAD_STATUS_RESPONSE],
        2,
        &SCRATCHPAD_LONG_FIELDS,
    )
}
