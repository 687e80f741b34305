//! Per-device protocol session state.
//!
//! Decay frames carry no bin count of their own; the count is established by
//! an earlier configuration frame from the same device. [`ProtocolSession`]
//! keys that state by the transport-supplied [`DeviceKey`] and hands the
//! dispatcher a per-device entry it can hold across one decode call, so a
//! concurrent configuration update cannot change the bin count between
//! sizing and unpacking a tail.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, RwLock};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::types::{ConfigStatus, DeviceKey, Timestamp};

/// Channel configuration established by a configuration frame.
///
/// Everything later decay frames from the device need: tail sizing from the
/// boundary table, channel-index validation from the counts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelConfig {
    pub config_version: u8,
    /// Bin boundary table, microseconds; its length is the bin count.
    pub bin_boundaries: Vec<u16>,
    pub tx_count: u8,
    pub rx_count: u8,
    pub axis_count: u8,
    pub sample_timer: u16,
    pub holdoff: u16,
}

impl ChannelConfig {
    /// Number of decay bins this configuration declares.
    pub fn bin_count(&self) -> usize {
        self.bin_boundaries.len()
    }
}

impl From<&ConfigStatus> for ChannelConfig {
    fn from(status: &ConfigStatus) -> Self {
        Self {
            config_version: status.config_version,
            bin_boundaries: status.bin_boundaries.clone(),
            tx_count: status.tx_count,
            rx_count: status.rx_count,
            axis_count: status.axis_count,
            sample_timer: status.sample_timer,
            holdoff: status.holdoff,
        }
    }
}

/// Mutable per-device state behind the session's per-device lock.
#[derive(Debug, Default)]
pub struct DeviceState {
    /// Latest configuration seen from the device, if any.
    pub config: Option<ChannelConfig>,
    /// Receipt time of the most recent successfully decoded frame.
    pub last_seen: Option<Timestamp>,
    /// Successfully decoded frames from this device.
    pub frames_decoded: u64,
}

impl DeviceState {
    /// Record a fresh configuration, replacing any previous one.
    pub fn apply_config(&mut self, device: &DeviceKey, config: ChannelConfig) {
        let changed = self.config.as_ref() != Some(&config);
        if changed {
            info!(
                device = %device,
                bins = config.bin_count(),
                version = config.config_version,
                "device configuration updated"
            );
        }
        self.config = Some(config);
    }

    /// Note a successful decode.
    pub fn mark_decoded(&mut self, at: Timestamp) {
        self.last_seen = Some(at);
        self.frames_decoded += 1;
    }
}

/// Shared map of device state, safe for concurrent dispatchers.
///
/// The outer map lock is held only to find or create an entry; all decode
/// work happens under the per-device mutex.
#[derive(Debug, Default)]
pub struct ProtocolSession {
    devices: RwLock<HashMap<DeviceKey, Arc<Mutex<DeviceState>>>>,
}

impl ProtocolSession {
    /// Empty session with no known devices.
    pub fn new() -> Self {
        Self::default()
    }

    /// Entry for `device`, created empty on first sight.
    pub fn entry(&self, device: &DeviceKey) -> Arc<Mutex<DeviceState>> {
        if let Some(entry) = read_lock(&self.devices).get(device) {
            return Arc::clone(entry);
        }
        let mut devices = write_lock(&self.devices);
        Arc::clone(devices.entry(device.clone()).or_default())
    }

    /// Latest configuration for `device`, if one has been decoded.
    pub fn config_for(&self, device: &DeviceKey) -> Option<ChannelConfig> {
        let entry = read_lock(&self.devices).get(device).cloned()?;
        let state = lock(&entry);
        state.config.clone()
    }

    /// Bin count for `device`, if configured.
    pub fn bin_count_for(&self, device: &DeviceKey) -> Option<usize> {
        self.config_for(device).map(|c| c.bin_count())
    }

    /// Devices seen so far, in no particular order.
    pub fn known_devices(&self) -> Vec<DeviceKey> {
        read_lock(&self.devices).keys().cloned().collect()
    }

    /// Number of devices seen so far.
    pub fn device_count(&self) -> usize {
        read_lock(&self.devices).len()
    }

    /// Drop all state for `device`. Returns whether anything was removed.
    /// Teardown is always caller-initiated; the session never expires
    /// entries on its own.
    pub fn remove(&self, device: &DeviceKey) -> bool {
        write_lock(&self.devices).remove(device).is_some()
    }
}

// Lock poisoning means another dispatcher panicked mid-update; device state
// stays usable, so recover the guard rather than propagate the panic.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

fn read_lock<T>(lock: &RwLock<T>) -> std::sync::RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(|e| e.into_inner())
}

fn write_lock<T>(lock: &RwLock<T>) -> std::sync::RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(|e| e.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(bins: &[u16]) -> ChannelConfig {
        ChannelConfig {
            config_version: 5,
            bin_boundaries: bins.to_vec(),
            tx_count: 2,
            rx_count: 2,
            axis_count: 3,
            sample_timer: 100,
            holdoff: 50,
        }
    }

    #[test]
    fn unknown_device_has_no_config() {
        let session = ProtocolSession::new();
        assert!(session.config_for(&DeviceKey::from("d1")).is_none());
        assert_eq!(session.device_count(), 0);
    }

    #[test]
    fn entry_creates_and_persists_state() {
        let session = ProtocolSession::new();
        let device = DeviceKey::from("d1");
        {
            let entry = session.entry(&device);
            let mut state = lock(&entry);
            state.apply_config(&device, config(&[10, 20, 30, 40]));
            state.mark_decoded(Timestamp(1.0));
        }
        assert_eq!(session.bin_count_for(&device), Some(4));
        assert_eq!(session.device_count(), 1);
        let entry = session.entry(&device);
        assert_eq!(lock(&entry).frames_decoded, 1);
    }

    #[test]
    fn devices_are_independent() {
        let session = ProtocolSession::new();
        let d1 = DeviceKey::from("d1");
        let d2 = DeviceKey::from("d2");
        {
            let entry = session.entry(&d1);
            lock(&entry).apply_config(&d1, config(&[10]));
        }
        assert_eq!(session.bin_count_for(&d1), Some(1));
        assert!(session.bin_count_for(&d2).is_none());
    }

    #[test]
    fn remove_forgets_device() {
        let session = ProtocolSession::new();
        let device = DeviceKey::from("d1");
        let entry = session.entry(&device);
        lock(&entry).apply_config(&device, config(&[10]));
        assert!(session.remove(&device));
        assert!(!session.remove(&device));
        assert!(session.config_for(&device).is_none());
    }

    #[test]
    fn reconfiguration_replaces_bin_table() {
        let session = ProtocolSession::new();
        let device = DeviceKey::from("d1");
        let entry = session.entry(&device);
        lock(&entry).apply_config(&device, config(&[10, 20]));
        lock(&entry).apply_config(&device, config(&[10, 20, 30]));
        assert_eq!(session.bin_count_for(&device), Some(3));
    }
}
