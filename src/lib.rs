//! frame-seeker steps a seekable media source through evenly spaced timestamps.
//!
//! The core is [`SeekDriver`]: it pauses the source, seeks to each multiple of a fixed
//! [`FrameStep`] from a start position to the end of the media, and hands every position to a
//! [`FrameConsumer`] together with its progress in `[0, 1]`. Runs can be cancelled from the same
//! task with [`SeekDriver::stop`].
//!
//! On top of the driver sits a small recording pipeline:
//!
//! - A [`Recorder`] captures each visited frame from a [`VideoFrames`] source
//! - An [`Overlay`] is composited on top (premultiplied source-over)
//! - The result is streamed into a [`FrameSink`] (PNG sequence, MP4 via `ffmpeg`, or memory)
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod config;
mod foundation;

pub(crate) mod effects;
/// Frame sinks for recorded output.
pub mod encode;
pub(crate) mod media;
pub(crate) mod record;
pub(crate) mod seek;

pub use crate::config::SeekerConfig;
pub use crate::foundation::core::{Canvas, Fps, FrameIndex, FrameRGBA, FrameStep};
pub use crate::foundation::error::{SeekError, SeekResult};

pub use crate::effects::composite::{overlay_frame, premultiply_in_place};
pub use crate::encode::ffmpeg::{FfmpegSink, FfmpegSinkOpts};
pub use crate::encode::png::PngSequenceSink;
pub use crate::encode::sink::{FrameSink, InMemorySink, SinkConfig};
pub use crate::media::simulated::{SimulatedOpts, SimulatedSource, synthetic_pixel};
pub use crate::media::source::{
    ListenerId, MediaSource, SeekedEvent, SeekedSubscription, VideoFrames,
};
pub use crate::record::overlay::{NoOverlay, Overlay, StaticOverlay};
pub use crate::record::recorder::{RecordReport, RecordSession, Recorder};
pub use crate::seek::completion::{CompletionHandle, RunOutcome};
pub use crate::seek::driver::{DriveMode, DriverOpts, FnConsumer, FrameConsumer, SeekDriver};
