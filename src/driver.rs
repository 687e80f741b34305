//! Driver spawns and manages the frame decode task.

use std::sync::Arc;

use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::dispatch::Dispatcher;
use crate::source::FrameSource;
use crate::types::DecodedMessage;

/// Result of spawning the driver task.
pub struct DriverChannels {
    /// Receiver for decoded messages, latest-wins.
    pub messages: watch::Receiver<Option<Arc<DecodedMessage>>>,
    /// Cancellation token for graceful shutdown.
    pub cancel: CancellationToken,
}

impl DriverChannels {
    /// The message channel as a `Stream`. Each subscriber observes the
    /// latest message at subscription time, then every subsequent change;
    /// intermediate messages may be skipped under backpressure.
    pub fn message_stream(&self) -> WatchStream<Option<Arc<DecodedMessage>>> {
        WatchStream::new(self.messages.clone())
    }
}

/// Driver spawns and manages the frame decode task.
///
/// The spawned task owns the source and the dispatcher: it reads raw
/// frames, decodes them, and publishes messages on a watch channel. Decode
/// failures are logged and counted but never stop the task; source errors
/// are retried with backoff up to a bounded count.
pub struct Driver;

impl Driver {
    /// Spawn the frame reader task for `source`, decoding via `dispatcher`.
    ///
    /// Returns a watch receiver for decoded messages plus a cancellation
    /// token for graceful shutdown.
    pub fn spawn<S>(source: S, dispatcher: Dispatcher) -> DriverChannels
    where
        S: FrameSource,
    {
        let (message_tx, message_rx) = watch::channel(None);
        let cancel = CancellationToken::new();
        let cancel_reader = cancel.clone();

        tokio::spawn(async move {
            Self::frame_reader_task(source, dispatcher, message_tx, cancel_reader).await;
        });

        DriverChannels { messages: message_rx, cancel }
    }

    async fn frame_reader_task<S>(
        mut source: S,
        dispatcher: Dispatcher,
        message_tx: watch::Sender<Option<Arc<DecodedMessage>>>,
        cancel: CancellationToken,
    ) where
        S: FrameSource,
    {
        info!(source = source.name(), "frame reader task started");
        let mut frame_count = 0u64;
        let mut decode_failures = 0u64;
        let mut error_count = 0u32;
        const MAX_ERRORS: u32 = 10;

        loop {
            if cancel.is_cancelled() {
                info!("frame reader cancelled");
                break;
            }

            let result = tokio::select! {
                _ = cancel.cancelled() => {
                    info!("frame reader cancelled during read");
                    break;
                }
                result = source.next_frame() => result,
            };

            match result {
                Ok(Some(raw)) => {
                    error_count = 0;
                    match dispatcher.dispatch(&raw) {
                        Ok(message) => {
                            frame_count += 1;
                            debug!(
                                device = %raw.device,
                                kind = message.kind_name(),
                                "frame {} decoded",
                                frame_count
                            );
                            if message_tx.send(Some(Arc::new(message))).is_err() {
                                debug!("message receiver dropped, shutting down");
                                break;
                            }
                        }
                        Err(e) => {
                            // Malformed frames are expected on real links.
                            decode_failures += 1;
                            warn!(device = %raw.device, error = %e, "frame discarded");
                        }
                    }
                }
                Ok(None) => {
                    info!(
                        "source ended after {} frames ({} discarded)",
                        frame_count, decode_failures
                    );
                    let _ = message_tx.send(None);
                    break;
                }
                Err(e) => {
                    error_count += 1;
                    error!("source error ({}/{}): {}", error_count, MAX_ERRORS, e);

                    if error_count >= MAX_ERRORS {
                        error!("too many source errors, shutting down");
                        let _ = message_tx.send(None);
                        break;
                    }

                    // Exponential backoff: 50ms, 100ms, 200ms, ...
                    let backoff = std::time::Duration::from_millis(50 * (1 << error_count.min(5)));
                    tokio::time::sleep(backoff).await;
                }
            }
        }

        info!("frame reader task ended (processed {} frames)", frame_count);
    }
}
