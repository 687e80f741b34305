//! Frame encoders: the inverse of every built-in schema.
//!
//! Encoders exist for tests and simulators; the decode path never calls
//! them. Checksums are computed with the same coverage rule the decoder
//! verifies: every byte after the checksum byte, terminator excluded.

use crate::schema::{
    FRAME_TERMINATOR, MSAP_BEGIN_REQUEST, MSAP_BEGIN_RESPONSE, MSAP_SCRATCHPAD_STATUS_REQUEST,
    MSAP_SCRATCHPAD_STATUS_RESPONSE,
};
use crate::types::{ScratchpadStatus, additive_checksum};

/// Checksum algorithm version byte emitted in v5 configuration frames.
const CHECKSUM_VERSION: u8 = 1;

/// Encode a v3 configuration frame (no checksum).
#[allow(clippy::too_many_arguments)]
pub fn conf_v3(
    system_id: u16,
    fiducial: u16,
    firmware_rev: u16,
    tx_count: u8,
    rx_count: u8,
    axis_count: u8,
    sample_timer: u16,
    holdoff: u16,
    bin_boundaries: &[u16],
) -> Vec<u8> {
    let mut out = Vec::with_capacity(20 + 2 * bin_boundaries.len());
    out.extend_from_slice(b"CONF");
    out.push(3);
    push_conf_body(
        &mut out,
        system_id,
        fiducial,
        firmware_rev,
        tx_count,
        rx_count,
        axis_count,
        sample_timer,
        holdoff,
        bin_boundaries,
    );
    out.push(FRAME_TERMINATOR);
    out
}

/// Encode a v5 configuration frame with a valid additive checksum.
#[allow(clippy::too_many_arguments)]
pub fn conf_v5(
    system_id: u16,
    fiducial: u16,
    firmware_rev: u16,
    tx_count: u8,
    rx_count: u8,
    axis_count: u8,
    sample_timer: u16,
    holdoff: u16,
    bin_boundaries: &[u16],
) -> Vec<u8> {
    let mut out = Vec::with_capacity(22 + 2 * bin_boundaries.len());
    out.extend_from_slice(b"CONF");
    out.push(0); // checksum placeholder
    out.push(CHECKSUM_VERSION);
    out.push(5);
    push_conf_body(
        &mut out,
        system_id,
        fiducial,
        firmware_rev,
        tx_count,
        rx_count,
        axis_count,
        sample_timer,
        holdoff,
        bin_boundaries,
    );
    out[4] = additive_checksum(&out[5..]);
    out.push(FRAME_TERMINATOR);
    out
}

#[allow(clippy::too_many_arguments)]
fn push_conf_body(
    out: &mut Vec<u8>,
    system_id: u16,
    fiducial: u16,
    firmware_rev: u16,
    tx_count: u8,
    rx_count: u8,
    axis_count: u8,
    sample_timer: u16,
    holdoff: u16,
    bin_boundaries: &[u16],
) {
    out.extend_from_slice(&system_id.to_be_bytes());
    out.extend_from_slice(&fiducial.to_be_bytes());
    out.extend_from_slice(&firmware_rev.to_be_bytes());
    out.push(tx_count);
    out.push(rx_count);
    out.push(axis_count);
    out.extend_from_slice(&sample_timer.to_be_bytes());
    out.extend_from_slice(&holdoff.to_be_bytes());
    out.push(bin_boundaries.len() as u8);
    for boundary in bin_boundaries {
        out.extend_from_slice(&boundary.to_be_bytes());
    }
}

/// Encode a v1 decay frame (no checksum).
pub fn decay_v1(ident: u8, fiducial: u16, counts: &[i16]) -> Vec<u8> {
    let mut out = Vec::with_capacity(5 + 2 * counts.len());
    out.push(b't');
    out.push(ident);
    out.extend_from_slice(&fiducial.to_be_bytes());
    for count in counts {
        out.extend_from_slice(&count.to_be_bytes());
    }
    out.push(FRAME_TERMINATOR);
    out
}

/// Encode a v2 decay frame with a valid additive checksum.
pub fn decay_v2(ident: u8, fiducial: u16, counts: &[i16]) -> Vec<u8> {
    let mut out = Vec::with_capacity(6 + 2 * counts.len());
    out.push(b't');
    out.push(0); // checksum placeholder
    out.push(ident);
    out.extend_from_slice(&fiducial.to_be_bytes());
    for count in counts {
        out.extend_from_slice(&count.to_be_bytes());
    }
    out[1] = additive_checksum(&out[2..]);
    out.push(FRAME_TERMINATOR);
    out
}

/// Encode an MSAP begin request.
pub fn msap_begin_request() -> Vec<u8> {
    vec![MSAP_BEGIN_REQUEST, 0]
}

/// Encode an MSAP begin response carrying a result code.
pub fn msap_begin_response(result: u8) -> Vec<u8> {
    vec![MSAP_BEGIN_RESPONSE, 1, result]
}

/// Encode an MSAP scratchpad-status request.
pub fn msap_status_request() -> Vec<u8> {
    vec![MSAP_SCRATCHPAD_STATUS_REQUEST, 0]
}

/// Encode an MSAP scratchpad-status response.
///
/// The declared length is 24 (short format) or, when `status.app` is
/// present, 39 (long format).
pub fn msap_status_response(status: &ScratchpadStatus) -> Vec<u8> {
    let declared: u8 = if status.app.is_some() { 39 } else { 24 };
    let mut out = Vec::with_capacity(2 + declared as usize);
    out.push(MSAP_SCRATCHPAD_STATUS_RESPONSE);
    out.push(declared);
    out.extend_from_slice(&status.stored_len.to_be_bytes());
    out.extend_from_slice(&status.stored_crc.to_be_bytes());
    out.push(status.stored_seq);
    out.push(status.stored_type);
    out.push(status.stored_status);
    out.extend_from_slice(&status.processed_len.to_be_bytes());
    out.extend_from_slice(&status.processed_crc.to_be_bytes());
    out.push(status.processed_seq);
    out.extend_from_slice(&status.firmware_area_id.to_be_bytes());
    out.push(status.firmware_version.major);
    out.push(status.firmware_version.minor);
    out.push(status.firmware_version.maintenance);
    out.push(status.firmware_version.development);
    if let Some(app) = &status.app {
        out.extend_from_slice(&app.processed_len.to_be_bytes());
        out.extend_from_slice(&app.processed_crc.to_be_bytes());
        out.push(app.processed_seq);
        out.extend_from_slice(&app.area_id.to_be_bytes());
        out.push(app.version.major);
        out.push(app.version.minor);
        out.push(app.version.maintenance);
        out.push(app.version.development);
    }
    out
}
