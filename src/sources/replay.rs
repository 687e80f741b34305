//! Replay source over recorded wrapper+payload logs.

use std::collections::VecDeque;
use std::path::Path;
use std::time::Duration;

use tokio::time::{Interval, MissedTickBehavior, interval};
use tracing::info;

use crate::source::{FrameSource, SourceError};
use crate::types::RawFrame;
use crate::wrapper::{self, WRAPPER_LEN};

/// Replays frames from a recorded log of concatenated wrapped records.
///
/// The whole log is parsed up front; a malformed record fails `open` rather
/// than surfacing mid-replay. Each frame carries the device key and MCU
/// timestamp from its wrapper. Frames are delivered at a fixed pace.
#[derive(Debug)]
pub struct LogReplaySource {
    frames: VecDeque<RawFrame>,
    pace: Duration,
    // Created on first use; interval construction needs a runtime.
    ticker: Option<Interval>,
}

impl LogReplaySource {
    /// Open a recorded log file, replaying one frame per `pace`.
    pub async fn open(path: impl AsRef<Path>, pace: Duration) -> Result<Self, SourceError> {
        let buf = tokio::fs::read(path.as_ref()).await?;
        let source = Self::from_bytes(&buf, pace)?;
        info!(
            path = %path.as_ref().display(),
            frames = source.remaining(),
            "opened replay log"
        );
        Ok(source)
    }

    /// Build a replay source from an in-memory log image.
    pub fn from_bytes(buf: &[u8], pace: Duration) -> Result<Self, SourceError> {
        let mut frames = VecDeque::new();
        let mut offset = 0;
        while offset < buf.len() {
            let (header, payload) = wrapper::parse(&buf[offset..])?;
            frames.push_back(RawFrame::new(
                payload.to_vec(),
                header.device_key(),
                header.mcu_time(),
            ));
            offset += WRAPPER_LEN + payload.len();
        }
        Ok(Self { frames, pace: pace.max(Duration::from_millis(1)), ticker: None })
    }

    /// Frames not yet replayed.
    pub fn remaining(&self) -> usize {
        self.frames.len()
    }
}

#[async_trait::async_trait]
impl FrameSource for LogReplaySource {
    async fn next_frame(&mut self) -> Result<Option<RawFrame>, SourceError> {
        if self.frames.is_empty() {
            return Ok(None);
        }
        let pace = self.pace;
        let ticker = self.ticker.get_or_insert_with(|| {
            let mut ticker = interval(pace);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            ticker
        });
        ticker.tick().await;
        Ok(self.frames.pop_front())
    }

    fn name(&self) -> &'static str {
        "replay"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encode;

    fn log_with(frames: &[(u16, Vec<u8>)]) -> Vec<u8> {
        let mut buf = Vec::new();
        for (fiducial, payload) in frames {
            buf.extend_from_slice(&wrapper::wrap(
                "EMDATA", 3, 17, *fiducial, "OK", 100, 0, payload,
            ));
        }
        buf
    }

    #[tokio::test(start_paused = true)]
    async fn replays_all_records_then_ends() {
        let conf = encode::conf_v5(17, 1, 1, 2, 2, 3, 100, 50, &[10, 20]);
        let decay = encode::decay_v2(0, 2, &[5, -5]);
        let log = log_with(&[(1, conf.clone()), (2, decay.clone())]);

        let mut source =
            LogReplaySource::from_bytes(&log, Duration::from_millis(10)).unwrap();
        assert_eq!(source.remaining(), 2);

        let first = source.next_frame().await.unwrap().unwrap();
        assert_eq!(&first.data[..], &conf[..]);
        assert_eq!(first.device.to_string(), "udp:17:3");

        let second = source.next_frame().await.unwrap().unwrap();
        assert_eq!(&second.data[..], &decay[..]);

        assert!(source.next_frame().await.unwrap().is_none());
    }

    #[test]
    fn corrupt_record_fails_open() {
        let mut log = log_with(&[(1, b"t\x00\x00\x01\x0a".to_vec())]);
        log[WRAPPER_LEN] ^= 0xFF;
        let err = LogReplaySource::from_bytes(&log, Duration::from_millis(1)).unwrap_err();
        assert!(matches!(err, SourceError::Wrapper(_)));
    }

    #[tokio::test]
    async fn open_reads_file_from_disk() {
        let dir = std::env::temp_dir();
        let path = dir.join(format!("emlink-replay-{}.bin", std::process::id()));
        let log = log_with(&[(1, encode::decay_v1(0, 1, &[1]))]);
        tokio::fs::write(&path, &log).await.unwrap();

        let source = LogReplaySource::open(&path, Duration::from_millis(1)).await.unwrap();
        assert_eq!(source.remaining(), 1);
        tokio::fs::remove_file(&path).await.unwrap();
    }
}
