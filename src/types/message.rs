//! Decoded message types.
//!
//! [`DecodedMessage`] is the tagged union handed to the dispatcher's caller.
//! Every variant owns its data outright, with no references back to the schema
//! that produced it, and carries the transport-supplied device key and
//! receipt timestamp.

use serde::{Deserialize, Serialize};

use super::{DeviceKey, PackedChannel, Timestamp};
use crate::postprocess::{self, NamedVector};
use crate::session::ChannelConfig;

/// The decode result: one value per successfully decoded frame.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum DecodedMessage {
    /// `CONF` configuration-status frame.
    ConfigStatus(ConfigStatus),
    /// `t` time-decay sample frame.
    DecaySample(DecaySample),
    /// MSAP command request frame.
    CommandRequest(CommandRequest),
    /// MSAP command response frame.
    CommandResponse(CommandResponse),
}

impl DecodedMessage {
    /// Device the frame was received from.
    pub fn device(&self) -> &DeviceKey {
        match self {
            DecodedMessage::ConfigStatus(m) => &m.device,
            DecodedMessage::DecaySample(m) => &m.device,
            DecodedMessage::CommandRequest(m) => &m.device,
            DecodedMessage::CommandResponse(m) => &m.device,
        }
    }

    /// Transport receipt timestamp.
    pub fn received_at(&self) -> Timestamp {
        match self {
            DecodedMessage::ConfigStatus(m) => m.received_at,
            DecodedMessage::DecaySample(m) => m.received_at,
            DecodedMessage::CommandRequest(m) => m.received_at,
            DecodedMessage::CommandResponse(m) => m.received_at,
        }
    }

    /// Short name of the message kind, for logging.
    pub fn kind_name(&self) -> &'static str {
        match self {
            DecodedMessage::ConfigStatus(_) => "config_status",
            DecodedMessage::DecaySample(_) => "decay_sample",
            DecodedMessage::CommandRequest(_) => "command_request",
            DecodedMessage::CommandResponse(_) => "command_response",
        }
    }
}

/// Decoded `CONF` configuration-status frame.
///
/// Establishes the bin count and channel counts that size and validate
/// subsequent decay frames from the same device.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigStatus {
    pub device: DeviceKey,
    pub received_at: Timestamp,
    /// Config format version (3 or 5).
    pub config_version: u8,
    /// Checksum algorithm version byte; absent in v3 frames.
    pub checksum_version: Option<u8>,
    pub system_id: u16,
    pub fiducial: u16,
    pub firmware_rev: u16,
    pub tx_count: u8,
    pub rx_count: u8,
    pub axis_count: u8,
    /// Sample timer period, microseconds.
    pub sample_timer: u16,
    /// Transmit holdoff, microseconds.
    pub holdoff: u16,
    /// Time-decay bin boundaries, microseconds, one per bin.
    pub bin_boundaries: Vec<u16>,
}

impl ConfigStatus {
    /// Number of decay bins this configuration declares.
    pub fn bin_count(&self) -> usize {
        self.bin_boundaries.len()
    }
}

/// Decoded `t` time-decay sample frame.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecaySample {
    pub device: DeviceKey,
    pub received_at: Timestamp,
    /// Decay format version (1 or 2).
    pub version: u8,
    /// Transmitter / receiver / axis identity from the packed ident byte.
    pub channel: PackedChannel,
    pub fiducial: u16,
    /// Raw decay-bin counts as decoded from the wire.
    pub counts: Vec<i16>,
    /// Counts converted to millivolts with the schema's calibration factor.
    pub millivolts: Vec<f64>,
}

impl DecaySample {
    /// Reshape the millivolt vector into a named mapping using the bin
    /// boundaries from a configuration frame.
    ///
    /// Bins beyond the configured boundary table are preserved in the
    /// `unknown_field` bucket rather than dropped.
    pub fn named_bins(&self, config: &ChannelConfig) -> NamedVector {
        let names = postprocess::bin_names(&config.bin_boundaries);
        postprocess::reshape(&self.millivolts, &names)
    }
}

/// MSAP request opcodes understood by the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MsapCommand {
    /// Begin an over-the-air update transaction.
    Begin,
    /// Query scratchpad status.
    ScratchpadStatus,
}

/// Decoded MSAP command request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandRequest {
    pub device: DeviceKey,
    pub received_at: Timestamp,
    pub command: MsapCommand,
}

/// Decoded MSAP command response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum MsapResponse {
    /// Begin-response result code.
    Begin { result: u8 },
    /// Scratchpad status, short or long format.
    ScratchpadStatus(Box<ScratchpadStatus>),
}

/// Decoded MSAP command response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandResponse {
    pub device: DeviceKey,
    pub received_at: Timestamp,
    pub response: MsapResponse,
}

/// Firmware version quadruplet reported in scratchpad status responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FirmwareVersion {
    pub major: u8,
    pub minor: u8,
    pub maintenance: u8,
    pub development: u8,
}

impl std::fmt::Display for FirmwareVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}.{}.{}", self.major, self.minor, self.maintenance, self.development)
    }
}

/// Scratchpad status reported by the long-format response for the
/// application-processed image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppScratchpad {
    pub processed_len: u32,
    pub processed_crc: u16,
    pub processed_seq: u8,
    pub area_id: u32,
    pub version: FirmwareVersion,
}

/// MSAP scratchpad-status response payload.
///
/// The short (24-byte) format covers the stored and processed images; the
/// long (39-byte) format appends the application-processed block, surfaced
/// here as `app`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScratchpadStatus {
    pub stored_len: u32,
    pub stored_crc: u16,
    pub stored_seq: u8,
    pub stored_type: u8,
    pub stored_status: u8,
    pub processed_len: u32,
    pub processed_crc: u16,
    pub processed_seq: u8,
    pub firmware_area_id: u32,
    pub firmware_version: FirmwareVersion,
    /// Present only in the long format.
    pub app: Option<AppScratchpad>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_config() -> ChannelConfig {
        ChannelConfig {
            config_version: 5,
            bin_boundaries: vec![10, 20, 30, 40],
            tx_count: 2,
            rx_count: 2,
            axis_count: 3,
            sample_timer: 100,
            holdoff: 50,
        }
    }

    #[test]
    fn named_bins_uses_boundary_names() {
        let sample = DecaySample {
            device: DeviceKey::from("d1"),
            received_at: Timestamp(1.0),
            version: 2,
            channel: PackedChannel { tx: 0, rx: 1, axis: 2 },
            fiducial: 9,
            counts: vec![100, -50, 0, 32767],
            millivolts: vec![1.0, -0.5, 0.0, 327.67],
        };
        let named = sample.named_bins(&sample_config());
        assert_eq!(named.named.len(), 4);
        assert!(named.unknown_field.is_empty());
        assert_eq!(named.named["bin_00010us"], 1.0);
    }

    #[test]
    fn named_bins_preserves_extra_bins() {
        let sample = DecaySample {
            device: DeviceKey::from("d1"),
            received_at: Timestamp(1.0),
            version: 2,
            channel: PackedChannel { tx: 0, rx: 0, axis: 0 },
            fiducial: 0,
            counts: vec![1, 2, 3, 4, 5],
            millivolts: vec![1.0, 2.0, 3.0, 4.0, 5.0],
        };
        let named = sample.named_bins(&sample_config());
        assert_eq!(named.named.len() + named.unknown_field.len(), 5);
        assert_eq!(named.unknown_field, vec![5.0]);
    }

    #[test]
    fn kind_names_and_accessors() {
        let msg = DecodedMessage::CommandRequest(CommandRequest {
            device: DeviceKey::from("d2"),
            received_at: Timestamp(2.5),
            command: MsapCommand::Begin,
        });
        assert_eq!(msg.kind_name(), "command_request");
        assert_eq!(msg.device().to_string(), "d2");
        assert_eq!(msg.received_at().seconds(), 2.5);
    }

    #[test]
    fn firmware_version_display() {
        let v = FirmwareVersion { major: 5, minor: 1, maintenance: 0, development: 12 };
        assert_eq!(v.to_string(), "5.1.0.12");
    }
}
