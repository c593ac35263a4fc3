use std::sync::Arc;

use crate::effects::composite::overlay_frame;
use crate::encode::sink::{FrameSink, SinkConfig};
use crate::foundation::core::{FrameIndex, FrameStep};
use crate::foundation::error::{SeekError, SeekResult};
use crate::media::source::{MediaSource, VideoFrames};
use crate::record::overlay::Overlay;
use crate::seek::completion::RunOutcome;
use crate::seek::driver::{DriveMode, DriverOpts, FrameConsumer, SeekDriver};

/// Frame consumer that captures the source picture, composites an overlay on top and pushes the
/// result to a [`FrameSink`].
///
/// The sink is started lazily with the size of the first captured frame and must be finalized
/// with [`Recorder::finish`].
pub struct Recorder<S, K, O> {
    source: Arc<S>,
    sink: K,
    overlay: O,
    step: FrameStep,
    next: FrameIndex,
    started: bool,
}

impl<S: VideoFrames, K: FrameSink, O: Overlay> Recorder<S, K, O> {
    /// Create a recorder; `step` is forwarded to the sink as the output frame spacing.
    pub fn new(source: Arc<S>, sink: K, overlay: O, step: FrameStep) -> Self {
        Self {
            source,
            sink,
            overlay,
            step,
            next: FrameIndex(0),
            started: false,
        }
    }

    /// Number of frames pushed to the sink so far.
    pub fn frames_written(&self) -> u64 {
        self.next.0
    }

    /// Borrow the sink.
    pub fn sink(&self) -> &K {
        &self.sink
    }

    /// Take the sink back.
    pub fn into_sink(self) -> K {
        self.sink
    }

    /// Finalize the sink if anything was written. Safe to call more than once.
    pub fn finish(&mut self) -> SeekResult<()> {
        if !self.started {
            return Ok(());
        }
        self.started = false;
        self.sink.end()
    }

    fn capture(&mut self, progress: f64) -> SeekResult<()> {
        let mut frame = self.source.capture_frame()?;
        if !self.started {
            self.sink.begin(SinkConfig {
                width: frame.width,
                height: frame.height,
                step: self.step,
            })?;
            self.started = true;
            self.next = FrameIndex(0);
        }
        if let Some(layer) = self.overlay.render(progress, frame.canvas())? {
            overlay_frame(&mut frame, layer)?;
        }
        self.sink.push_frame(self.next, &frame)?;
        self.next = FrameIndex(self.next.0 + 1);
        Ok(())
    }
}

#[async_trait::async_trait]
impl<S: VideoFrames, K: FrameSink, O: Overlay> FrameConsumer for Recorder<S, K, O> {
    async fn on_frame(&mut self, progress: f64) -> SeekResult<()> {
        self.capture(progress)
    }
}

/// Summary of one recording.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
pub struct RecordReport {
    /// How the traversal ended.
    pub outcome: RunOutcome,
    /// Frames handed to the sink.
    pub frames_written: u64,
}

/// Records a [`MediaSource`] into a [`FrameSink`], one composited frame per step.
///
/// `stop` may be called while `record` is pending; the partial recording is still finalized.
pub struct RecordSession<S, K, O>
where
    S: MediaSource + VideoFrames,
    K: FrameSink,
    O: Overlay,
{
    driver: SeekDriver<S, Recorder<S, K, O>>,
}

impl<S, K, O> RecordSession<S, K, O>
where
    S: MediaSource + VideoFrames,
    K: FrameSink,
    O: Overlay,
{
    /// Create a session recording `source` into `sink`.
    pub fn new(source: Arc<S>, sink: K, overlay: O, opts: DriverOpts) -> Self {
        let recorder = Recorder::new(Arc::clone(&source), sink, overlay, opts.step);
        Self {
            driver: SeekDriver::with_opts(source, opts, recorder),
        }
    }

    /// Record from `start_time` to the end of the media and finalize the sink.
    ///
    /// On error the sink is still finalized on a best-effort basis and the run error is
    /// returned.
    pub async fn record(&self, start_time: f64, mode: DriveMode) -> SeekResult<RecordReport> {
        if self.driver.is_running() {
            return Err(SeekError::Busy);
        }
        self.driver.consumer().await.next = FrameIndex(0);
        let result = self.driver.run(start_time, mode).await;
        let mut recorder = self.driver.consumer().await;
        match result {
            Ok(outcome) => {
                recorder.finish()?;
                let report = RecordReport {
                    outcome,
                    frames_written: recorder.frames_written(),
                };
                tracing::info!(
                    outcome = ?report.outcome,
                    frames = report.frames_written,
                    "recording done"
                );
                Ok(report)
            }
            Err(err) => {
                if let Err(end_err) = recorder.finish() {
                    tracing::warn!(error = %end_err, "failed to finalize sink after error");
                }
                Err(err)
            }
        }
    }

    /// Cancel a pending [`RecordSession::record`] and wait for it to wind down.
    pub async fn stop(&self) {
        self.driver.stop().await;
    }

    /// The underlying driver.
    pub fn driver(&self) -> &SeekDriver<S, Recorder<S, K, O>> {
        &self.driver
    }

    /// Take the sink back once recording is over.
    pub fn into_sink(self) -> K {
        self.driver.into_consumer().into_sink()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/record/recorder.rs"]
mod tests;
