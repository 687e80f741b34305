//! Message dispatcher: schema selection, decode, session update.
//!
//! [`Dispatcher::dispatch`] is the single entry point per incoming frame. It
//! looks up candidate schemas by the frame's leading marker, tries them
//! newest version first, converts the winning [`Record`] into a
//! [`DecodedMessage`], and folds configuration frames into the session so
//! later decay frames from the same device can be sized.
//!
//! The per-device session entry is locked across the whole call, so the bin
//! count read for tail sizing cannot be changed by a concurrent
//! configuration frame mid-decode.

use tracing::{debug, warn};

use crate::decoder::{self, Record};
use crate::error::{DecodeError, FrameBytes, Result};
use crate::schema::{FrameSchema, LengthSource, MessageKind, SchemaRegistry};
use crate::session::{self, ChannelConfig, ProtocolSession};
use crate::types::{
    AppScratchpad, CommandRequest, CommandResponse, ConfigStatus, DecaySample, DecodedMessage,
    DeviceKey, FirmwareVersion, MsapCommand, MsapResponse, PackedChannel, RawFrame,
    ScratchpadStatus,
};

/// Frame dispatcher owning the schema registry and per-device session state.
pub struct Dispatcher {
    registry: SchemaRegistry,
    session: ProtocolSession,
}

impl Dispatcher {
    /// Dispatcher over a custom registry.
    pub fn new(registry: SchemaRegistry) -> Self {
        Self { registry, session: ProtocolSession::new() }
    }

    /// Dispatcher over the built-in wire catalogue.
    pub fn with_builtin() -> Result<Self> {
        Ok(Self::new(SchemaRegistry::builtin()?))
    }

    /// The schema registry in use.
    pub fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }

    /// Per-device session state accumulated from configuration frames.
    pub fn session(&self) -> &ProtocolSession {
        &self.session
    }

    /// Decode one raw frame into a tagged message, or a well-defined error.
    ///
    /// Candidate schemas are tried newest version first. When every
    /// candidate fails, the most informative failure is returned: a failure
    /// from a schema that got past header validation beats a bare
    /// length/preamble rejection, and among those the schema whose fixed
    /// length best matches the frame wins. If no candidate even fit the
    /// frame's shape, the result is [`DecodeError::UnknownMessageKind`].
    pub fn dispatch(&self, raw: &RawFrame) -> Result<DecodedMessage> {
        let data = &raw.data[..];
        let candidates = self.registry.lookup(data);
        if candidates.is_empty() {
            warn!(device = %raw.device, "frame matches no registered preamble");
            return Err(DecodeError::UnknownMessageKind {
                marker: self.registry.marker(data),
                tried: Vec::new(),
                frame: FrameBytes::capture(data),
            });
        }

        let entry = self.session.entry(&raw.device);
        let mut state = session::lock(&entry);

        let mut tried = Vec::with_capacity(candidates.len());
        let mut best_deep: Option<(usize, DecodeError)> = None;
        for schema in candidates {
            tried.push(schema.name);
            let external = match schema.tail.map(|t| t.length) {
                Some(LengthSource::External) => state.config.as_ref().map(|c| c.bin_count()),
                _ => None,
            };
            let err = match decoder::decode(schema, raw, external) {
                Ok(record) => {
                    let message = build_message(schema, &record, raw)?;
                    if let (DecodedMessage::DecaySample(sample), Some(config)) =
                        (&message, state.config.as_ref())
                    {
                        validate_channel(&raw.device, sample.channel, config)?;
                    }
                    if let DecodedMessage::ConfigStatus(status) = &message {
                        state.apply_config(&raw.device, ChannelConfig::from(status));
                    }
                    state.mark_decoded(raw.received_at);
                    debug!(device = %raw.device, kind = message.kind_name(), schema = schema.name, "frame decoded");
                    return Ok(message);
                }
                Err(err) => err,
            };
            if is_shallow(schema, &err) {
                continue;
            }
            let distance = schema.fixed_length().abs_diff(data.len());
            let closer = best_deep.as_ref().is_none_or(|(d, _)| distance < *d);
            if closer {
                best_deep = Some((distance, err));
            }
        }

        match best_deep {
            Some((_, err)) => Err(err),
            None => Err(DecodeError::UnknownMessageKind {
                marker: self.registry.marker(data),
                tried,
                frame: FrameBytes::capture(data),
            }),
        }
    }
}

/// Whether a failure says nothing beyond "this frame is not that shape":
/// a wrong preamble, too few bytes for the schema's header at all, or a
/// declared-length byte selecting some other layout. When every candidate
/// fails shallow the frame as a whole is an unknown kind.
fn is_shallow(schema: &FrameSchema, err: &DecodeError) -> bool {
    let min_len = schema.fixed_length() + usize::from(schema.terminator.is_some());
    match err {
        DecodeError::PreambleMismatch { .. } => true,
        DecodeError::TooShort { got, .. } => *got < min_len,
        DecodeError::LengthMismatch { .. } => schema.declared_len_field.is_some(),
        _ => false,
    }
}

fn validate_channel(
    device: &DeviceKey,
    channel: PackedChannel,
    config: &ChannelConfig,
) -> Result<()> {
    let checks = [
        ("tx", channel.tx, config.tx_count),
        ("rx", channel.rx, config.rx_count),
        ("axis", channel.axis, config.axis_count),
    ];
    for (field, value, count) in checks {
        if value >= count {
            return Err(DecodeError::ChannelOutOfRange {
                device: device.clone(),
                field,
                value,
                max: count.saturating_sub(1),
            });
        }
    }
    Ok(())
}

fn build_message(schema: &FrameSchema, record: &Record, raw: &RawFrame) -> Result<DecodedMessage> {
    let device = raw.device.clone();
    let received_at = raw.received_at;
    let message = match schema.kind {
        MessageKind::ConfigStatus => {
            let checksum_version = match schema.checksum {
                Some(_) => Some(record.u8_field("checksum_version")?),
                None => None,
            };
            DecodedMessage::ConfigStatus(ConfigStatus {
                device,
                received_at,
                config_version: record.u8_field("config_version")?,
                checksum_version,
                system_id: record.u16_field("system_id")?,
                fiducial: record.u16_field("fiducial")?,
                firmware_rev: record.u16_field("firmware_rev")?,
                tx_count: record.u8_field("tx_count")?,
                rx_count: record.u8_field("rx_count")?,
                axis_count: record.u8_field("axis_count")?,
                sample_timer: record.u16_field("sample_timer")?,
                holdoff: record.u16_field("holdoff")?,
                bin_boundaries: record.tail_u16(),
            })
        }
        MessageKind::DecaySample => DecodedMessage::DecaySample(DecaySample {
            device,
            received_at,
            version: record.version,
            channel: PackedChannel::from_ident(record.u8_field("ident")?),
            fiducial: record.u16_field("fiducial")?,
            counts: record.tail_i16(),
            millivolts: record.scaled_tail.clone().unwrap_or_default(),
        }),
        MessageKind::BeginRequest => DecodedMessage::CommandRequest(CommandRequest {
            device,
            received_at,
            command: MsapCommand::Begin,
        }),
        MessageKind::ScratchpadStatusRequest => DecodedMessage::CommandRequest(CommandRequest {
            device,
            received_at,
            command: MsapCommand::ScratchpadStatus,
        }),
        MessageKind::BeginResponse => DecodedMessage::CommandResponse(CommandResponse {
            device,
            received_at,
            response: MsapResponse::Begin { result: record.u8_field("result")? },
        }),
        MessageKind::ScratchpadStatusResponse => {
            let app = match record.value("app_processed_len") {
                Ok(_) => Some(AppScratchpad {
                    processed_len: record.u32_field("app_processed_len")?,
                    processed_crc: record.u16_field("app_processed_crc")?,
                    processed_seq: record.u8_field("app_processed_seq")?,
                    area_id: record.u32_field("app_area_id")?,
                    version: FirmwareVersion {
                        major: record.u8_field("app_major")?,
                        minor: record.u8_field("app_minor")?,
                        maintenance: record.u8_field("app_maintenance")?,
                        development: record.u8_field("app_development")?,
                    },
                }),
                Err(_) => None,
            };
            let status = ScratchpadStatus {
                stored_len: record.u32_field("stored_len")?,
                stored_crc: record.u16_field("stored_crc")?,
                stored_seq: record.u8_field("stored_seq")?,
                stored_type: record.u8_field("stored_type")?,
                stored_status: record.u8_field("stored_status")?,
                processed_len: record.u32_field("processed_len")?,
                processed_crc: record.u16_field("processed_crc")?,
                processed_seq: record.u8_field("processed_seq")?,
                firmware_area_id: record.u32_field("firmware_area_id")?,
                firmware_version: FirmwareVersion {
                    major: record.u8_field("fw_major")?,
                    minor: record.u8_field("fw_minor")?,
                    maintenance: record.u8_field("fw_maintenance")?,
                    development: record.u8_field("fw_development")?,
                },
                app,
            };
            DecodedMessage::CommandResponse(CommandResponse {
                device,
                received_at,
                response: MsapResponse::ScratchpadStatus(Box::new(status)),
            })
        }
    };
    Ok(message)
}
