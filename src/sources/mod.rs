//! Built-in frame source implementations.

mod replay;

pub use replay::LogReplaySource;
