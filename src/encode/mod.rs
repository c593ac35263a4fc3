//! Frame sinks.
//!
//! Sinks consume composited frames in timeline order and are driven by the
//! [`Recorder`](crate::Recorder).

/// `ffmpeg`-based sink (MP4 output via system `ffmpeg`).
pub mod ffmpeg;
/// PNG image sequence sink.
pub mod png;
/// Generic frame sink trait and built-in sinks.
pub mod sink;
