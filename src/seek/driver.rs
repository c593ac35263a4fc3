use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::watch;

use crate::foundation::core::FrameStep;
use crate::foundation::error::{SeekError, SeekResult};
use crate::media::source::{MediaSource, SeekedEvent, SeekedSubscription};
use crate::seek::completion::{Completion, CompletionHandle, RunOutcome};

/// Per-frame hook invoked once per visited timestamp.
///
/// `progress` is `timestamp / duration`, in `[0, 1]`. Calls never overlap and arrive in strictly
/// increasing timestamp order. An error aborts the run and is returned from
/// [`SeekDriver::start`] unchanged.
#[async_trait::async_trait]
pub trait FrameConsumer: Send {
    /// Consume the frame at `progress`.
    async fn on_frame(&mut self, progress: f64) -> SeekResult<()>;
}

#[async_trait::async_trait]
impl<C: FrameConsumer + ?Sized> FrameConsumer for Box<C> {
    async fn on_frame(&mut self, progress: f64) -> SeekResult<()> {
        (**self).on_frame(progress).await
    }
}

/// [`FrameConsumer`] backed by an async closure.
pub struct FnConsumer<F>(pub F);

#[async_trait::async_trait]
impl<F, Fut> FrameConsumer for FnConsumer<F>
where
    F: FnMut(f64) -> Fut + Send,
    Fut: Future<Output = SeekResult<()>> + Send,
{
    async fn on_frame(&mut self, progress: f64) -> SeekResult<()> {
        (self.0)(progress).await
    }
}

/// How a run advances from one position to the next.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DriveMode {
    /// Wait for the source's seeked notification before consuming each frame.
    #[default]
    Confirmed,
    /// Consume the next frame right after commanding the seek.
    Immediate,
}

impl From<bool> for DriveMode {
    fn from(wait_for_confirmation: bool) -> Self {
        if wait_for_confirmation {
            Self::Confirmed
        } else {
            Self::Immediate
        }
    }
}

/// Options for [`SeekDriver`].
#[derive(Clone, Debug, Default)]
pub struct DriverOpts {
    /// Distance between visited timestamps.
    pub step: FrameStep,
    /// Fail a confirmed-mode run when a seek is not confirmed within this window.
    pub seek_timeout: Option<Duration>,
}

#[derive(Debug, Default)]
struct DriverState {
    running: Option<CompletionHandle>,
}

/// Steps a [`MediaSource`] through evenly spaced timestamps, handing each one to a
/// [`FrameConsumer`].
///
/// Every method takes `&self`, so a caller can `stop` a run from the same task that awaits
/// `start` (e.g. with `tokio::join!`). At most one run is in flight; a second `start` while one
/// is active fails with [`SeekError::Busy`].
pub struct SeekDriver<S: MediaSource, C: FrameConsumer> {
    source: Arc<S>,
    opts: DriverOpts,
    consumer: tokio::sync::Mutex<C>,
    state: Mutex<DriverState>,
    stop_tx: watch::Sender<bool>,
}

impl<S: MediaSource, C: FrameConsumer> SeekDriver<S, C> {
    /// Create a driver visiting every `step` seconds.
    pub fn new(source: Arc<S>, step: FrameStep, consumer: C) -> Self {
        Self::with_opts(
            source,
            DriverOpts {
                step,
                ..DriverOpts::default()
            },
            consumer,
        )
    }

    /// Create a driver with explicit options.
    pub fn with_opts(source: Arc<S>, opts: DriverOpts, consumer: C) -> Self {
        let (stop_tx, _) = watch::channel(false);
        Self {
            source,
            opts,
            consumer: tokio::sync::Mutex::new(consumer),
            state: Mutex::new(DriverState::default()),
            stop_tx,
        }
    }

    /// Round `time` to the nearest multiple of the frame step.
    pub fn snap(&self, time: f64) -> f64 {
        self.opts.step.snap(time)
    }

    /// Configured frame step.
    pub fn step(&self) -> FrameStep {
        self.opts.step
    }

    /// The driven source.
    pub fn source(&self) -> &Arc<S> {
        &self.source
    }

    /// Whether a run is in flight.
    pub fn is_running(&self) -> bool {
        self.lock_state().running.is_some()
    }

    /// Completion signal of the in-flight run, if any.
    pub fn completion(&self) -> Option<CompletionHandle> {
        self.lock_state().running.clone()
    }

    /// Borrow the consumer. Waits for an in-flight run to release it.
    pub async fn consumer(&self) -> tokio::sync::MutexGuard<'_, C> {
        self.consumer.lock().await
    }

    /// Take the consumer back, e.g. to finalize a recording.
    pub fn into_consumer(self) -> C {
        self.consumer.into_inner()
    }

    /// Traverse from `start_time` to the end of the media.
    ///
    /// Resolves `true` when the end was reached and `false` when the run was stopped.
    pub async fn start(&self, start_time: f64, wait_for_confirmation: bool) -> SeekResult<bool> {
        let outcome = self
            .run(start_time, DriveMode::from(wait_for_confirmation))
            .await?;
        Ok(outcome == RunOutcome::Completed)
    }

    /// Typed form of [`SeekDriver::start`].
    ///
    /// Never returns `Ok(RunOutcome::Failed)`; failures come back as `Err`.
    #[tracing::instrument(skip(self), fields(step = self.opts.step.secs()))]
    pub async fn run(&self, start_time: f64, mode: DriveMode) -> SeekResult<RunOutcome> {
        let mut guard = self.begin_run()?;
        let result = self.drive(start_time, mode).await;
        let outcome = match &result {
            Ok(outcome) => *outcome,
            Err(err) => {
                tracing::warn!(error = %err, "seek run failed");
                RunOutcome::Failed
            }
        };
        guard.outcome = Some(outcome);
        drop(guard);
        result
    }

    /// Cancel the in-flight run and wait until it has fully wound down.
    ///
    /// Returns immediately, without touching the source, when no run is active. Otherwise the
    /// run observes the request at its next step boundary; at most one consumer call that was
    /// already in progress still completes. When this returns, the run has resolved, its
    /// listener is removed and no further seeks will be issued.
    pub async fn stop(&self) {
        let Some(handle) = self.request_stop() else {
            return;
        };
        let outcome = handle.wait().await;
        tracing::debug!(?outcome, "stop joined seek run");
    }

    /// Flag the in-flight run for cancellation and return its completion handle.
    ///
    /// The flag is only ever changed under the state lock, so a request always targets the run
    /// whose handle is returned and never one that starts afterwards.
    fn request_stop(&self) -> Option<CompletionHandle> {
        let st = self.lock_state();
        let handle = st.running.clone()?;
        self.stop_tx.send_replace(true);
        Some(handle)
    }

    fn begin_run(&self) -> SeekResult<RunGuard<'_, S, C>> {
        let mut st = self.lock_state();
        if st.running.is_some() {
            return Err(SeekError::Busy);
        }
        let completion = Completion::new();
        st.running = Some(completion.handle());
        self.stop_tx.send_replace(false);
        Ok(RunGuard {
            driver: self,
            completion,
            outcome: None,
        })
    }

    async fn drive(&self, start_time: f64, mode: DriveMode) -> SeekResult<RunOutcome> {
        tokio::select! {
            biased;
            _ = self.stop_requested() => {
                tracing::debug!("stopped while waiting for media readiness");
                return Ok(RunOutcome::Cancelled);
            }
            ready = self.source.ready() => ready?,
        }

        let duration = self.source.duration();
        if !duration.is_finite() || duration <= 0.0 {
            return Err(SeekError::media(format!(
                "media duration must be positive and finite, got {duration}"
            )));
        }
        if !start_time.is_finite() || !(0.0..=duration).contains(&start_time) {
            return Err(SeekError::validation(format!(
                "start time {start_time} is outside [0, {duration}]"
            )));
        }
        self.source.pause()?;

        let mut consumer = self.consumer.lock().await;
        let mut cursor = Cursor::new(self.opts.step, start_time, duration);
        let mut listener = match mode {
            DriveMode::Confirmed => Some(SeekedListener::register(self.source.as_ref())),
            DriveMode::Immediate => None,
        };
        self.source.set_current_time(cursor.position())?;

        loop {
            let trigger = match listener.as_mut() {
                Some(listener) => self.await_seeked(listener, cursor.position()).await?,
                None => Trigger::Immediate,
            };
            if let Step::Finished(outcome) =
                self.run_step(&mut cursor, &mut *consumer, trigger).await?
            {
                tracing::info!(?outcome, frames = cursor.visited, "seek run finished");
                return Ok(outcome);
            }
        }
    }

    /// One step of the traversal, whatever woke it.
    async fn run_step(
        &self,
        cursor: &mut Cursor,
        consumer: &mut C,
        trigger: Trigger,
    ) -> SeekResult<Step> {
        if self.is_stop_requested() {
            return Ok(Step::Finished(RunOutcome::Cancelled));
        }
        if let Trigger::Seeked(ev) = trigger
            && (ev.position - cursor.position()).abs() > self.opts.step.secs() / 2.0
        {
            tracing::trace!(
                confirmed = ev.position,
                expected = cursor.position(),
                "seeked notification for a different position"
            );
        }

        tracing::debug!(
            index = cursor.index,
            position = cursor.position(),
            ?trigger,
            "frame"
        );
        consumer.on_frame(cursor.progress()).await?;
        cursor.visited += 1;

        if cursor.is_last() {
            return Ok(Step::Finished(RunOutcome::Completed));
        }
        cursor.advance();
        self.source.set_current_time(cursor.position())?;
        Ok(Step::Continue)
    }

    async fn await_seeked(
        &self,
        listener: &mut SeekedListener<'_, S>,
        position: f64,
    ) -> SeekResult<Trigger> {
        if self.is_stop_requested() {
            return Ok(Trigger::StopRequested);
        }
        let wait = async {
            tokio::select! {
                biased;
                _ = self.stop_requested() => Ok(Trigger::StopRequested),
                ev = listener.sub.events.recv() => ev
                    .map(Trigger::Seeked)
                    .ok_or_else(|| SeekError::media("seeked notifications closed by the source")),
            }
        };
        match self.opts.seek_timeout {
            Some(limit) => tokio::time::timeout(limit, wait)
                .await
                .map_err(|_| SeekError::SeekTimeout {
                    position,
                    timeout_ms: u64::try_from(limit.as_millis()).unwrap_or(u64::MAX),
                })?,
            None => wait.await,
        }
    }

    fn is_stop_requested(&self) -> bool {
        *self.stop_tx.borrow()
    }

    async fn stop_requested(&self) {
        let mut rx = self.stop_tx.subscribe();
        // The sender lives in `self`, so the channel cannot close while we wait.
        let _ = rx.wait_for(|stop| *stop).await;
    }

    fn lock_state(&self) -> MutexGuard<'_, DriverState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Clears the in-flight state and resolves the run's completion on every exit path, including
/// the `run` future being dropped mid-flight.
struct RunGuard<'a, S: MediaSource, C: FrameConsumer> {
    driver: &'a SeekDriver<S, C>,
    completion: Completion,
    outcome: Option<RunOutcome>,
}

impl<S: MediaSource, C: FrameConsumer> Drop for RunGuard<'_, S, C> {
    fn drop(&mut self) {
        {
            let mut st = self.driver.lock_state();
            st.running = None;
            self.driver.stop_tx.send_replace(false);
        }
        self.completion
            .resolve(self.outcome.unwrap_or(RunOutcome::Cancelled));
    }
}

/// Seeked-listener registration removed exactly once, when the run lets go of it.
struct SeekedListener<'a, S: MediaSource + ?Sized> {
    source: &'a S,
    sub: SeekedSubscription,
}

impl<'a, S: MediaSource + ?Sized> SeekedListener<'a, S> {
    fn register(source: &'a S) -> Self {
        let sub = source.subscribe_seeked();
        Self { source, sub }
    }
}

impl<S: MediaSource + ?Sized> Drop for SeekedListener<'_, S> {
    fn drop(&mut self) {
        self.source.unsubscribe_seeked(self.sub.id);
    }
}

#[derive(Clone, Copy, Debug)]
enum Trigger {
    Immediate,
    Seeked(SeekedEvent),
    StopRequested,
}

enum Step {
    Continue,
    Finished(RunOutcome),
}

/// Position of a run on the step grid.
#[derive(Debug)]
struct Cursor {
    step: FrameStep,
    duration: f64,
    index: u64,
    visited: u64,
}

impl Cursor {
    fn new(step: FrameStep, start_time: f64, duration: f64) -> Self {
        let mut cursor = Self {
            step,
            duration,
            index: (duration / step.secs()).floor() as u64,
            visited: 0,
        };
        // A start snapped onto or past the end begins at the last frame a full run would visit.
        while cursor.index > 0 && !cursor.is_before_end(cursor.index) {
            cursor.index -= 1;
        }
        cursor.index = cursor.index.min(step.index_of(start_time));
        cursor
    }

    fn is_before_end(&self, index: u64) -> bool {
        self.step.time_at(index) < self.duration - self.step.secs() * 1e-9
    }

    fn position(&self) -> f64 {
        self.step.time_at(self.index)
    }

    fn progress(&self) -> f64 {
        (self.position() / self.duration).clamp(0.0, 1.0)
    }

    /// A grid point at (or within rounding of) `duration` is past the last frame.
    fn is_last(&self) -> bool {
        !self.is_before_end(self.index + 1)
    }

    fn advance(&mut self) {
        self.index += 1;
    }
}

#[cfg(test)]
#[path = "../../tests/unit/seek/driver.rs"]
mod tests;
