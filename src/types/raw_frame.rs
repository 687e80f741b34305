//! Raw frame and transport-supplied identity types.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Stable per-device key supplied by the transport alongside each frame.
///
/// Decay frames do not embed a device identity, so the transport must
/// provide one; session state (bin counts, channel counts) is keyed by it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeviceKey(pub String);

impl DeviceKey {
    /// Key derived from the UDP wrapper's system and sensor identifiers.
    pub fn from_ids(system_id: u16, sensor_id: u16) -> Self {
        Self(format!("udp:{}:{}", system_id, sensor_id))
    }
}

impl From<&str> for DeviceKey {
    fn from(key: &str) -> Self {
        Self(key.to_string())
    }
}

impl std::fmt::Display for DeviceKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Receipt timestamp in seconds, supplied by the transport.
///
/// Monotonic or wall clock depending on the transport; the decode layer only
/// propagates it.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Timestamp(pub f64);

impl Timestamp {
    /// Seconds value.
    pub fn seconds(self) -> f64 {
        self.0
    }
}

/// An immutable byte sequence as received from the transport.
///
/// Owned by the dispatcher for the duration of one decode call and not
/// retained afterward. The buffer is shared via `Arc` so sources can hand
/// frames to the driver without copying.
#[derive(Debug, Clone)]
pub struct RawFrame {
    /// Frame bytes, preamble through terminator.
    pub data: Arc<[u8]>,
    /// Transport-supplied device identity.
    pub device: DeviceKey,
    /// Transport-supplied receipt timestamp.
    pub received_at: Timestamp,
}

impl RawFrame {
    /// Wrap transport bytes with their device key and receipt time.
    pub fn new(data: Vec<u8>, device: DeviceKey, received_at: Timestamp) -> Self {
        Self { data: data.into(), device, received_at }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn device_key_from_ids() {
        let key = DeviceKey::from_ids(3, 17);
        assert_eq!(key.to_string(), "udp:3:17");
    }

    #[test]
    fn raw_frame_shares_buffer() {
        let frame = RawFrame::new(vec![1, 2, 3], DeviceKey::from("d1"), Timestamp(0.5));
        let clone = frame.clone();
        assert!(Arc::ptr_eq(&frame.data, &clone.data));
        assert_eq!(frame.received_at.seconds(), 0.5);
    }
}
