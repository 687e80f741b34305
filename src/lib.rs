//! Decode and validation layer for fixed-format EM sensor telemetry.
//!
//! `emlink` turns raw binary frames from electromagnetic decay sensors into
//! typed, validated messages. It covers the three wire families the sensor
//! fleet speaks:
//!
//! - **`CONF` status frames** establishing per-device configuration (bin
//!   boundaries, channel counts, timers), in the v3 and v5 layouts
//! - **`t` decay frames** carrying per-channel decay-bin counts, sized by
//!   the most recent configuration from the same device
//! - **MSAP command/response frames** for the over-the-air update lifecycle
//!   (begin, scratchpad status in short and long formats)
//!
//! Frame layouts are declarative [`schema::FrameSchema`] entries interpreted
//! by one generic decoder; the [`Dispatcher`] selects schemas by marker and
//! version, maintains per-device session state, and hands back tagged
//! [`DecodedMessage`] values or structured [`DecodeError`]s. Nothing in the
//! decode path panics on malformed input.
//!
//! # Example (dispatch a recorded frame)
//!
//! ```rust
//! use emlink::{Dispatcher, DecodedMessage, RawFrame, DeviceKey, Timestamp, encode};
//!
//! fn main() -> emlink::Result<()> {
//!     let dispatcher = Dispatcher::with_builtin()?;
//!     let bytes = encode::conf_v5(7, 1, 0x0100, 2, 2, 3, 100, 50, &[10, 20, 30, 40]);
//!     let frame = RawFrame::new(bytes, DeviceKey::from("udp:7:1"), Timestamp(0.0));
//!
//!     match dispatcher.dispatch(&frame)? {
//!         DecodedMessage::ConfigStatus(status) => {
//!             assert_eq!(status.bin_count(), 4);
//!         }
//!         other => panic!("unexpected message: {}", other.kind_name()),
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Example (replay a recorded log)
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use emlink::{Dispatcher, Driver, sources::LogReplaySource};
//! use futures::StreamExt;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let source = LogReplaySource::open("session.emlog", Duration::from_millis(10)).await?;
//!     let channels = Driver::spawn(source, Dispatcher::with_builtin()?);
//!
//!     let mut stream = channels.message_stream();
//!     while let Some(Some(message)) = stream.next().await {
//!         println!("{} from {}", message.kind_name(), message.device());
//!     }
//!     Ok(())
//! }
//! ```

// Core types and error handling
mod error;
pub mod types;

// Decode pipeline
mod decoder;
mod dispatch;
pub mod postprocess;
pub mod schema;
mod session;

// Encode and log-wrapper helpers
pub mod encode;
pub mod wrapper;

// Stream-based source architecture
pub mod driver;
pub mod source;
pub mod sources;

// Core exports
pub use error::{DecodeError, FrameBytes, Result};
pub use types::*;

// Pipeline exports
pub use decoder::{Record, decode};
pub use dispatch::Dispatcher;
pub use schema::SchemaRegistry;
pub use session::{ChannelConfig, DeviceState, ProtocolSession};

// Source and driver exports
pub use driver::{Driver, DriverChannels};
pub use source::{FrameSource, SourceError};
