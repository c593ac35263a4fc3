use tokio::sync::mpsc;

use crate::foundation::core::{Canvas, FrameRGBA};
use crate::foundation::error::SeekResult;

/// Opaque handle identifying one seeked-listener registration on a [`MediaSource`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(pub u64);

/// Notification emitted by a media source once a seek has completed.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SeekedEvent {
    /// Position the source settled on, in seconds.
    pub position: f64,
}

/// A live seeked-listener registration.
///
/// Events arrive on `events` until the registration is removed with
/// [`MediaSource::unsubscribe_seeked`] or the source is dropped.
#[derive(Debug)]
pub struct SeekedSubscription {
    /// Registration handle to pass back to `unsubscribe_seeked`.
    pub id: ListenerId,
    /// Stream of seek completions.
    pub events: mpsc::UnboundedReceiver<SeekedEvent>,
}

/// A time-seekable media resource.
///
/// The source is shared: several consumers may hold it and listen for seek completions at the
/// same time. All methods therefore take `&self`.
///
/// Contract expected by [`SeekDriver`](crate::SeekDriver):
/// - `ready` resolves once metadata (including `duration`) is available;
/// - `set_current_time` starts an asynchronous seek whose completion is announced to every
///   registered listener;
/// - `duration` may be non-finite until `ready` has resolved.
#[async_trait::async_trait]
pub trait MediaSource: Send + Sync {
    /// Wait until metadata is loaded and the source can be seeked.
    async fn ready(&self) -> SeekResult<()>;

    /// Total duration in seconds.
    fn duration(&self) -> f64;

    /// Current playback position in seconds.
    fn current_time(&self) -> f64;

    /// Command a seek to `secs`. Completion is reported through seeked listeners.
    fn set_current_time(&self, secs: f64) -> SeekResult<()>;

    /// Pause playback.
    fn pause(&self) -> SeekResult<()>;

    /// Register a seeked listener.
    fn subscribe_seeked(&self) -> SeekedSubscription;

    /// Remove a listener registered with [`MediaSource::subscribe_seeked`].
    fn unsubscribe_seeked(&self, id: ListenerId);
}

/// A source that can hand out the picture at its current position.
pub trait VideoFrames: Send + Sync {
    /// Natural size of the video frames.
    fn frame_size(&self) -> Canvas;

    /// Capture the frame at the current position as premultiplied RGBA8.
    fn capture_frame(&self) -> SeekResult<FrameRGBA>;
}
