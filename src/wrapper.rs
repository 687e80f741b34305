//! UDP log wrapper: the 36-byte header recorded around each frame.
//!
//! Recorded telemetry logs store each frame behind a fixed big-endian
//! wrapper carrying routing identity (system and sensor ids), an MCU
//! timestamp, and a payload length plus wrapping 32-bit payload checksum.
//! The wrapper supplies the [`DeviceKey`] and receipt [`Timestamp`] that
//! the inner frame formats do not carry themselves.
//!
//! Layout, all big-endian: 6-byte ASCII message type, u16 pad, u16 sensor
//! id, u16 system id, u16 fiducial, 2-byte ASCII status, u32 MCU seconds,
//! u32 MCU milliseconds, u32 pad, u32 payload length, u32 payload checksum.

use thiserror::Error;

use crate::types::{DeviceKey, Timestamp};

/// Byte length of the wrapper header.
pub const WRAPPER_LEN: usize = 36;

/// Errors from wrapper parsing. Distinct from frame decode errors; a bad
/// wrapper means the log record is unusable before any frame decoding.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum WrapperError {
    /// Fewer bytes than the header plus the declared payload.
    #[error("wrapper record too short: need {needed} bytes, got {got}")]
    TooShort { needed: usize, got: usize },

    /// Declared payload length exceeds what follows the header.
    #[error("wrapper payload truncated: declared {declared} bytes, {available} available")]
    PayloadTruncated { declared: usize, available: usize },

    /// Payload checksum disagrees with the wrapping 32-bit sum.
    #[error("wrapper checksum mismatch: embedded {embedded:#010x}, computed {computed:#010x}")]
    ChecksumMismatch { embedded: u32, computed: u32 },
}

/// Parsed wrapper header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UdpWrapper {
    msg_type: [u8; 6],
    status: [u8; 2],
    pub sensor_id: u16,
    pub system_id: u16,
    pub fiducial: u16,
    pub mcu_seconds: u32,
    pub mcu_millis: u32,
    pub payload_len: u32,
    pub checksum: u32,
}

impl UdpWrapper {
    /// Message type tag, trailing NULs and spaces trimmed.
    pub fn msg_type(&self) -> &str {
        trim_ascii(&self.msg_type)
    }

    /// Two-character status tag, trimmed.
    pub fn status(&self) -> &str {
        trim_ascii(&self.status)
    }

    /// MCU timestamp in seconds.
    pub fn mcu_time(&self) -> Timestamp {
        Timestamp(self.mcu_seconds as f64 + self.mcu_millis as f64 / 1000.0)
    }

    /// Device key derived from the routing identity.
    pub fn device_key(&self) -> DeviceKey {
        DeviceKey::from_ids(self.system_id, self.sensor_id)
    }
}

fn trim_ascii(bytes: &[u8]) -> &str {
    let end = bytes.iter().position(|&b| b == 0 || b == b' ').unwrap_or(bytes.len());
    std::str::from_utf8(&bytes[..end]).unwrap_or("")
}

/// Wrapping 32-bit sum of the payload bytes.
pub fn payload_checksum(payload: &[u8]) -> u32 {
    payload.iter().fold(0u32, |sum, &b| sum.wrapping_add(u32::from(b)))
}

fn read_u16(buf: &[u8], offset: usize) -> u16 {
    u16::from_be_bytes([buf[offset], buf[offset + 1]])
}

fn read_u32(buf: &[u8], offset: usize) -> u32 {
    u32::from_be_bytes([buf[offset], buf[offset + 1], buf[offset + 2], buf[offset + 3]])
}

/// Parse one wrapped record from the front of `buf`.
///
/// Returns the wrapper and the payload slice. Verifies the payload length
/// and checksum; any trailing bytes beyond the declared payload are left
/// for the caller (log files concatenate records).
pub fn parse(buf: &[u8]) -> Result<(UdpWrapper, &[u8]), WrapperError> {
    if buf.len() < WRAPPER_LEN {
        return Err(WrapperError::TooShort { needed: WRAPPER_LEN, got: buf.len() });
    }
    let mut msg_type = [0u8; 6];
    msg_type.copy_from_slice(&buf[0..6]);
    let mut status = [0u8; 2];
    status.copy_from_slice(&buf[14..16]);
    let wrapper = UdpWrapper {
        msg_type,
        status,
        sensor_id: read_u16(buf, 8),
        system_id: read_u16(buf, 10),
        fiducial: read_u16(buf, 12),
        mcu_seconds: read_u32(buf, 16),
        mcu_millis: read_u32(buf, 20),
        payload_len: read_u32(buf, 28),
        checksum: read_u32(buf, 32),
    };
    let declared = wrapper.payload_len as usize;
    let available = buf.len() - WRAPPER_LEN;
    if declared > available {
        return Err(WrapperError::PayloadTruncated { declared, available });
    }
    let payload = &buf[WRAPPER_LEN..WRAPPER_LEN + declared];
    let computed = payload_checksum(payload);
    if computed != wrapper.checksum {
        return Err(WrapperError::ChecksumMismatch { embedded: wrapper.checksum, computed });
    }
    Ok((wrapper, payload))
}

/// Encode a wrapped record: header plus payload, checksum filled in.
pub fn wrap(
    msg_type: &str,
    sensor_id: u16,
    system_id: u16,
    fiducial: u16,
    status: &str,
    mcu_seconds: u32,
    mcu_millis: u32,
    payload: &[u8],
) -> Vec<u8> {
    let mut out = Vec::with_capacity(WRAPPER_LEN + payload.len());
    let mut tag = [0u8; 6];
    let n = msg_type.len().min(6);
    tag[..n].copy_from_slice(&msg_type.as_bytes()[..n]);
    out.extend_from_slice(&tag);
    out.extend_from_slice(&[0, 0]); // pad
    out.extend_from_slice(&sensor_id.to_be_bytes());
    out.extend_from_slice(&system_id.to_be_bytes());
    out.extend_from_slice(&fiducial.to_be_bytes());
    let mut st = [0u8; 2];
    let n = status.len().min(2);
    st[..n].copy_from_slice(&status.as_bytes()[..n]);
    out.extend_from_slice(&st);
    out.extend_from_slice(&mcu_seconds.to_be_bytes());
    out.extend_from_slice(&mcu_millis.to_be_bytes());
    out.extend_from_slice(&[0, 0, 0, 0]); // pad
    out.extend_from_slice(&(payload.len() as u32).to_be_bytes());
    out.extend_from_slice(&payload_checksum(payload).to_be_bytes());
    out.extend_from_slice(payload);
    out
}
