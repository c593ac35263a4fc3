use crate::foundation::error::{SeekError, SeekResult};

/// 0-based index of a frame written during a recording.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct FrameIndex(pub u64);

/// Frames-per-second represented as a rational `num/den`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Fps {
    /// Numerator (frames).
    pub num: u32,
    /// Denominator (seconds), must be non-zero.
    pub den: u32,
}

impl Fps {
    /// Create a validated FPS value.
    pub fn new(num: u32, den: u32) -> SeekResult<Self> {
        if den == 0 {
            return Err(SeekError::validation("Fps den must be > 0"));
        }
        if num == 0 {
            return Err(SeekError::validation("Fps num must be > 0"));
        }
        Ok(Self { num, den })
    }

    /// Convert to floating-point FPS.
    pub fn as_f64(self) -> f64 {
        f64::from(self.num) / f64::from(self.den)
    }

    /// Duration of one frame in seconds.
    pub fn frame_duration_secs(self) -> f64 {
        f64::from(self.den) / f64::from(self.num)
    }
}

/// Spacing between two visited timestamps, in seconds.
///
/// Every timestamp a run visits lies on the grid `k * step` anchored at zero. Positions are
/// derived from the integer grid index rather than by repeated addition, so long runs do not
/// drift.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct FrameStep(f64);

impl FrameStep {
    /// Create a validated step. Must be finite and strictly positive.
    pub fn new(secs: f64) -> SeekResult<Self> {
        if !secs.is_finite() || secs <= 0.0 {
            return Err(SeekError::validation(format!(
                "frame step must be a positive finite number of seconds, got {secs}"
            )));
        }
        Ok(Self(secs))
    }

    /// One frame of `fps`.
    pub fn from_fps(fps: Fps) -> SeekResult<Self> {
        let fps = Fps::new(fps.num, fps.den)?;
        Self::new(fps.frame_duration_secs())
    }

    /// Step length in seconds.
    pub fn secs(self) -> f64 {
        self.0
    }

    /// Nominal frame rate implied by this step.
    pub fn frames_per_sec(self) -> f64 {
        1.0 / self.0
    }

    /// Round `t` to the nearest multiple of the step.
    pub fn snap(self, t: f64) -> f64 {
        (t / self.0).round() * self.0
    }

    /// Grid index of the multiple nearest to `t`.
    pub fn index_of(self, t: f64) -> u64 {
        (t / self.0).round().max(0.0) as u64
    }

    /// Timestamp of grid index `idx`. Equal to `snap` of any time that rounds to `idx`.
    pub fn time_at(self, idx: u64) -> f64 {
        idx as f64 * self.0
    }
}

impl Default for FrameStep {
    fn default() -> Self {
        Self(1.0 / 30.0)
    }
}

impl TryFrom<f64> for FrameStep {
    type Error = SeekError;

    fn try_from(secs: f64) -> SeekResult<Self> {
        Self::new(secs)
    }
}

impl From<FrameStep> for f64 {
    fn from(step: FrameStep) -> f64 {
        step.0
    }
}

/// Frame dimensions in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Canvas {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Canvas {
    /// Byte length of a tightly packed RGBA8 buffer of this size.
    pub fn rgba_len(self) -> usize {
        (self.width as usize) * (self.height as usize) * 4
    }
}

/// A video frame as RGBA8 pixels.
///
/// Frames travelling between sources, overlays and sinks are **premultiplied alpha**; the flag
/// makes this explicit at API boundaries.
#[derive(Clone, Debug, PartialEq)]
pub struct FrameRGBA {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// RGBA8 bytes, tightly packed, row-major.
    pub data: Vec<u8>,
    /// Whether the `data` is premultiplied alpha.
    pub premultiplied: bool,
}

impl FrameRGBA {
    /// Fully transparent frame.
    pub fn transparent(canvas: Canvas) -> Self {
        Self {
            width: canvas.width,
            height: canvas.height,
            data: vec![0; canvas.rgba_len()],
            premultiplied: true,
        }
    }

    /// Frame size.
    pub fn canvas(&self) -> Canvas {
        Canvas {
            width: self.width,
            height: self.height,
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
