use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::{mpsc, watch};

use crate::foundation::core::{Canvas, FrameRGBA};
use crate::foundation::error::{SeekError, SeekResult};
use crate::media::source::{
    ListenerId, MediaSource, SeekedEvent, SeekedSubscription, VideoFrames,
};

/// Options for [`SimulatedSource`].
#[derive(Clone, Debug)]
pub struct SimulatedOpts {
    /// Media duration in seconds.
    pub duration: f64,
    /// Size of the synthetic video frames.
    pub canvas: Canvas,
    /// Delay between a seek command and its seeked notification.
    pub seek_latency: Duration,
    /// When `false` seeks move the position but are never confirmed.
    pub confirm_seeks: bool,
    /// Whether metadata is available immediately.
    pub ready: bool,
}

impl Default for SimulatedOpts {
    fn default() -> Self {
        Self {
            duration: 1.0,
            canvas: Canvas {
                width: 64,
                height: 36,
            },
            seek_latency: Duration::ZERO,
            confirm_seeks: true,
            ready: true,
        }
    }
}

#[derive(Debug, Default)]
struct State {
    position: f64,
    paused: bool,
    pause_calls: u64,
    seeks: Vec<f64>,
    listeners: BTreeMap<ListenerId, mpsc::UnboundedSender<SeekedEvent>>,
    next_listener: u64,
    subscribed: u64,
    unsubscribed: u64,
}

impl State {
    fn broadcast(&self, ev: SeekedEvent) {
        for tx in self.listeners.values() {
            let _ = tx.send(ev);
        }
    }
}

/// In-process media source with a synthetic picture.
///
/// Behaves like a browser video element as far as the seek driver is concerned: readiness is
/// gated, seeks are confirmed through a broadcast notification (optionally after a delay), and
/// listeners from unrelated consumers coexist. It also keeps counters so callers can inspect how
/// the source was driven.
#[derive(Debug)]
pub struct SimulatedSource {
    opts: SimulatedOpts,
    state: Arc<Mutex<State>>,
    ready_tx: watch::Sender<bool>,
}

impl SimulatedSource {
    /// Create a new source.
    pub fn new(opts: SimulatedOpts) -> SeekResult<Self> {
        if !opts.duration.is_finite() || opts.duration <= 0.0 {
            return Err(SeekError::validation(format!(
                "simulated duration must be positive and finite, got {}",
                opts.duration
            )));
        }
        if opts.canvas.width == 0 || opts.canvas.height == 0 {
            return Err(SeekError::validation(
                "simulated canvas width/height must be non-zero",
            ));
        }
        let (ready_tx, _) = watch::channel(opts.ready);
        Ok(Self {
            opts,
            state: Arc::new(Mutex::new(State::default())),
            ready_tx,
        })
    }

    /// Ready source of `duration` seconds with default frame size and instant seeks.
    pub fn with_duration(duration: f64) -> SeekResult<Self> {
        Self::new(SimulatedOpts {
            duration,
            ..SimulatedOpts::default()
        })
    }

    /// Publish metadata, releasing every pending [`MediaSource::ready`] call.
    pub fn mark_ready(&self) {
        self.ready_tx.send_replace(true);
    }

    /// Resume playback (only flips the paused flag).
    pub fn play(&self) {
        self.lock().paused = false;
    }

    /// Whether playback is paused.
    pub fn is_paused(&self) -> bool {
        self.lock().paused
    }

    /// Number of `pause` calls received.
    pub fn pause_count(&self) -> u64 {
        self.lock().pause_calls
    }

    /// Every position assigned through `set_current_time`, in order.
    pub fn seek_history(&self) -> Vec<f64> {
        self.lock().seeks.clone()
    }

    /// Total listener registrations.
    pub fn subscribe_count(&self) -> u64 {
        self.lock().subscribed
    }

    /// Total listener removals.
    pub fn unsubscribe_count(&self) -> u64 {
        self.lock().unsubscribed
    }

    /// Listeners currently registered.
    pub fn listener_count(&self) -> usize {
        self.lock().listeners.len()
    }

    /// Announce a seek completion to every listener without moving the position.
    ///
    /// Models another consumer of the shared source triggering a notification.
    pub fn emit_seeked(&self) {
        let st = self.lock();
        st.broadcast(SeekedEvent {
            position: st.position,
        });
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn is_ready(&self) -> bool {
        *self.ready_tx.borrow()
    }
}

#[async_trait::async_trait]
impl MediaSource for SimulatedSource {
    async fn ready(&self) -> SeekResult<()> {
        let mut rx = self.ready_tx.subscribe();
        rx.wait_for(|ready| *ready)
            .await
            .map_err(|_| SeekError::media("source closed before metadata was loaded"))?;
        Ok(())
    }

    fn duration(&self) -> f64 {
        if self.is_ready() {
            self.opts.duration
        } else {
            f64::NAN
        }
    }

    fn current_time(&self) -> f64 {
        self.lock().position
    }

    fn set_current_time(&self, secs: f64) -> SeekResult<()> {
        if !secs.is_finite() {
            return Err(SeekError::media(format!("cannot seek to {secs}")));
        }
        let position = secs.clamp(0.0, self.opts.duration);
        let mut st = self.lock();
        st.position = position;
        st.seeks.push(position);

        if !self.opts.confirm_seeks {
            return Ok(());
        }
        let ev = SeekedEvent { position };
        if self.opts.seek_latency.is_zero() {
            st.broadcast(ev);
            return Ok(());
        }
        drop(st);

        let handle = tokio::runtime::Handle::try_current().map_err(|_| {
            SeekError::media("delayed seek confirmation requires a running tokio runtime")
        })?;
        let state = Arc::clone(&self.state);
        let latency = self.opts.seek_latency;
        handle.spawn(async move {
            tokio::time::sleep(latency).await;
            state
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .broadcast(ev);
        });
        Ok(())
    }

    fn pause(&self) -> SeekResult<()> {
        let mut st = self.lock();
        st.paused = true;
        st.pause_calls += 1;
        Ok(())
    }

    fn subscribe_seeked(&self) -> SeekedSubscription {
        let (tx, events) = mpsc::unbounded_channel();
        let mut st = self.lock();
        let id = ListenerId(st.next_listener);
        st.next_listener += 1;
        st.subscribed += 1;
        st.listeners.insert(id, tx);
        SeekedSubscription { id, events }
    }

    fn unsubscribe_seeked(&self, id: ListenerId) {
        let mut st = self.lock();
        if st.listeners.remove(&id).is_some() {
            st.unsubscribed += 1;
        }
    }
}

impl VideoFrames for SimulatedSource {
    fn frame_size(&self) -> Canvas {
        self.opts.canvas
    }

    fn capture_frame(&self) -> SeekResult<FrameRGBA> {
        if !self.is_ready() {
            return Err(SeekError::frame("no video frame before metadata is loaded"));
        }
        let px = synthetic_pixel(self.current_time(), self.opts.duration);
        let canvas = self.opts.canvas;
        Ok(FrameRGBA {
            width: canvas.width,
            height: canvas.height,
            data: px.repeat((canvas.width as usize) * (canvas.height as usize)),
            premultiplied: true,
        })
    }
}

/// Opaque color a [`SimulatedSource`] shows at `position`.
///
/// Red ramps up and green ramps down over the duration, so each position is recognisable in
/// captured frames.
pub fn synthetic_pixel(position: f64, duration: f64) -> [u8; 4] {
    let p = if duration > 0.0 {
        (position / duration).clamp(0.0, 1.0)
    } else {
        0.0
    };
    let r = (p * 255.0).round() as u8;
    [r, 255 - r, 64, 255]
}

#[cfg(test)]
#[path = "../../tests/unit/media/simulated.rs"]
mod tests;
