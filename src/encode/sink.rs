use crate::foundation::core::{FrameIndex, FrameRGBA, FrameStep};
use crate::foundation::error::{SeekError, SeekResult};

/// Configuration provided to a [`FrameSink`] before the first frame of a recording.
#[derive(Debug, Clone, PartialEq)]
pub struct SinkConfig {
    /// Output width in pixels.
    pub width: u32,
    /// Output height in pixels.
    pub height: u32,
    /// Time between consecutive frames.
    pub step: FrameStep,
}

/// Sink contract for consuming composited frames in timeline order.
///
/// Ordering contract: `push_frame` is called in strictly increasing `FrameIndex` order.
pub trait FrameSink: Send {
    /// Called once before any frames are pushed.
    fn begin(&mut self, cfg: SinkConfig) -> SeekResult<()>;
    /// Push one frame in strictly increasing timeline order.
    fn push_frame(&mut self, idx: FrameIndex, frame: &FrameRGBA) -> SeekResult<()>;
    /// Called once after the last frame is pushed.
    fn end(&mut self) -> SeekResult<()>;
}

impl<K: FrameSink + ?Sized> FrameSink for Box<K> {
    fn begin(&mut self, cfg: SinkConfig) -> SeekResult<()> {
        (**self).begin(cfg)
    }

    fn push_frame(&mut self, idx: FrameIndex, frame: &FrameRGBA) -> SeekResult<()> {
        (**self).push_frame(idx, frame)
    }

    fn end(&mut self) -> SeekResult<()> {
        (**self).end()
    }
}

/// In-memory sink for tests and debugging.
#[derive(Debug, Default)]
pub struct InMemorySink {
    cfg: Option<SinkConfig>,
    frames: Vec<(FrameIndex, FrameRGBA)>,
    ended: bool,
}

impl InMemorySink {
    /// Create a new in-memory sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the sink configuration captured in `begin`, if any.
    pub fn config(&self) -> Option<SinkConfig> {
        self.cfg.clone()
    }

    /// Borrow the captured frames.
    pub fn frames(&self) -> &[(FrameIndex, FrameRGBA)] {
        &self.frames
    }

    /// Whether `end` has been called since the last `begin`.
    pub fn is_ended(&self) -> bool {
        self.ended
    }
}

impl FrameSink for InMemorySink {
    fn begin(&mut self, cfg: SinkConfig) -> SeekResult<()> {
        self.cfg = Some(cfg);
        self.frames.clear();
        self.ended = false;
        Ok(())
    }

    fn push_frame(&mut self, idx: FrameIndex, frame: &FrameRGBA) -> SeekResult<()> {
        if let Some((last, _)) = self.frames.last()
            && idx <= *last
        {
            return Err(SeekError::frame("in-memory sink received out-of-order frame index"));
        }
        self.frames.push((idx, frame.clone()));
        Ok(())
    }

    fn end(&mut self) -> SeekResult<()> {
        self.ended = true;
        Ok(())
    }
}
