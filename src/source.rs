//! Frame source trait for transports feeding the driver.

use thiserror::Error;

use crate::types::RawFrame;
use crate::wrapper::WrapperError;

/// Errors from a frame source, distinct from frame decode errors: a source
/// error means bytes could not be obtained, not that they failed to decode.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum SourceError {
    /// Underlying I/O failure.
    #[error("frame source i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// A recorded log record had a bad wrapper.
    #[error(transparent)]
    Wrapper(#[from] WrapperError),
}

/// Trait for raw frame sources.
///
/// Sources abstract over where frames come from (recorded logs, sockets,
/// test scripts) and handle their own timing internally; a replay source
/// paces itself, a live source waits on its transport.
#[async_trait::async_trait]
pub trait FrameSource: Send + 'static {
    /// Get the next raw frame.
    ///
    /// Returns:
    /// - `Ok(Some(frame))` - next frame available
    /// - `Ok(None)` - stream ended (normal termination)
    /// - `Err(e)` - source failure, possibly transient
    async fn next_frame(&mut self) -> Result<Option<RawFrame>, SourceError>;

    /// Short label for log messages.
    fn name(&self) -> &'static str;
}
