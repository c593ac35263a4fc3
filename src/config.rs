use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use std::time::Duration;

use crate::foundation::core::{Fps, FrameStep};
use crate::foundation::error::{SeekError, SeekResult};
use crate::seek::driver::{DriveMode, DriverOpts};

/// Run settings loaded from JSON.
///
/// Every field is optional. Command-line flags override file values.
///
/// ```json
/// { "fps": { "num": 30, "den": 1 }, "mode": "immediate", "seek_timeout_ms": 500 }
/// ```
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SeekerConfig {
    /// Frame rate the step is derived from. Mutually exclusive with `step`.
    pub fps: Option<Fps>,
    /// Explicit step in seconds. Mutually exclusive with `fps`.
    pub step: Option<FrameStep>,
    /// Where runs begin, in seconds. Snapped to the step grid by the driver.
    pub start_time: f64,
    /// Whether to wait for seek confirmation between frames.
    pub mode: DriveMode,
    /// Fail a confirmed run when a seek is not confirmed within this many milliseconds.
    pub seek_timeout_ms: Option<u64>,
}

impl SeekerConfig {
    /// Parse from a JSON string.
    pub fn from_json_str(s: &str) -> SeekResult<Self> {
        serde_json::from_str(s).map_err(|e| SeekError::serde(format!("parse config JSON: {e}")))
    }

    /// Parse from a JSON reader.
    pub fn from_reader(r: impl Read) -> SeekResult<Self> {
        serde_json::from_reader(r).map_err(|e| SeekError::serde(format!("parse config JSON: {e}")))
    }

    /// Load from a JSON file.
    pub fn from_path(path: impl AsRef<Path>) -> SeekResult<Self> {
        use anyhow::Context as _;
        let path = path.as_ref();
        let f = File::open(path).with_context(|| format!("open config '{}'", path.display()))?;
        Self::from_reader(BufReader::new(f))
    }

    /// Resolve the frame step; defaults to one frame at 30 fps.
    pub fn frame_step(&self) -> SeekResult<FrameStep> {
        match (self.fps, self.step) {
            (Some(_), Some(_)) => Err(SeekError::validation(
                "config sets both 'fps' and 'step'; pick one",
            )),
            (Some(fps), None) => FrameStep::from_fps(fps),
            (None, Some(step)) => Ok(step),
            (None, None) => Ok(FrameStep::default()),
        }
    }

    /// Build driver options from this config.
    pub fn driver_opts(&self) -> SeekResult<DriverOpts> {
        if !self.start_time.is_finite() || self.start_time < 0.0 {
            return Err(SeekError::validation(format!(
                "start_time must be a non-negative finite number, got {}",
                self.start_time
            )));
        }
        Ok(DriverOpts {
            step: self.frame_step()?,
            seek_timeout: self.seek_timeout_ms.map(Duration::from_millis),
        })
    }
}

#[cfg(test)]
#[path = "../tests/unit/config.rs"]
mod tests;
