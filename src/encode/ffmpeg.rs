use std::ffi::OsString;
use std::io::Write as _;
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};

use anyhow::Context as _;

use crate::effects::composite::{over, premultiply_in_place};
use crate::encode::sink::{FrameSink, SinkConfig};
use crate::foundation::core::{FrameIndex, FrameRGBA, FrameStep};
use crate::foundation::error::{SeekError, SeekResult};

/// Options for [`FfmpegSink`].
#[derive(Clone, Debug)]
pub struct FfmpegSinkOpts {
    /// Output MP4 file path.
    pub out_path: PathBuf,
    /// Replace an existing file at `out_path`.
    pub overwrite: bool,
    /// Color behind transparent pixels (straight RGB; alpha is ignored).
    pub bg_rgba: [u8; 4],
}

impl FfmpegSinkOpts {
    /// Overwriting MP4 output on black.
    pub fn new(out_path: impl Into<PathBuf>) -> Self {
        Self {
            out_path: out_path.into(),
            overwrite: true,
            bg_rgba: [0, 0, 0, 255],
        }
    }
}

/// Hands recorded frames to a system `ffmpeg` process as raw RGBA on stdin.
///
/// Encoding is entirely up to `ffmpeg`; this sink only flattens alpha and keeps the frame rate in
/// line with the recording step. A sink dropped before [`FrameSink::end`] kills the process.
pub struct FfmpegSink {
    opts: FfmpegSinkOpts,
    child: Option<Child>,
    scratch: Vec<u8>,
    last_idx: Option<FrameIndex>,
}

impl FfmpegSink {
    /// Create a sink; `ffmpeg` is spawned on `begin`.
    pub fn new(opts: FfmpegSinkOpts) -> Self {
        Self {
            opts,
            child: None,
            scratch: Vec::new(),
            last_idx: None,
        }
    }
}

/// Reject geometry `libx264`/`yuv420p` cannot encode.
pub fn validate_config(cfg: &SinkConfig) -> SeekResult<()> {
    if cfg.width == 0 || cfg.height == 0 {
        return Err(SeekError::validation(
            "ffmpeg sink width/height must be non-zero",
        ));
    }
    if !cfg.width.is_multiple_of(2) || !cfg.height.is_multiple_of(2) {
        return Err(SeekError::validation(
            "ffmpeg sink width/height must be even (required for yuv420p mp4 output)",
        ));
    }
    Ok(())
}

/// Command line reading `cfg`-sized raw frames from stdin at one frame per step.
fn ffmpeg_args(cfg: &SinkConfig, opts: &FfmpegSinkOpts) -> Vec<OsString> {
    let size = format!("{}x{}", cfg.width, cfg.height);
    let rate = rate_arg(cfg.step);
    let mut args: Vec<OsString> = [
        if opts.overwrite { "-y" } else { "-n" },
        "-loglevel",
        "error",
        "-f",
        "rawvideo",
        "-pix_fmt",
        "rgba",
        "-s",
        size.as_str(),
        "-r",
        rate.as_str(),
        "-i",
        "pipe:0",
        "-an",
        "-c:v",
        "libx264",
        "-pix_fmt",
        "yuv420p",
        "-movflags",
        "+faststart",
    ]
    .into_iter()
    .map(OsString::from)
    .collect();
    args.push(opts.out_path.clone().into_os_string());
    args
}

/// `-r` value for one frame per `step`.
fn rate_arg(step: FrameStep) -> String {
    let fps = step.frames_per_sec();
    if (fps - fps.round()).abs() < 1e-6 {
        format!("{}", fps.round() as u64)
    } else {
        format!("{fps:.6}")
    }
}

/// Composite `frame` onto an opaque `bg` so the encoder never sees alpha.
fn flatten_onto(dst: &mut [u8], frame: &FrameRGBA, bg: [u8; 4]) {
    let bg = [bg[0], bg[1], bg[2], 255];
    for (d, s) in dst.chunks_exact_mut(4).zip(frame.data.chunks_exact(4)) {
        let mut px = [s[0], s[1], s[2], s[3]];
        if !frame.premultiplied {
            premultiply_in_place(&mut px);
        }
        d.copy_from_slice(&over(bg, px));
    }
}

impl FrameSink for FfmpegSink {
    fn begin(&mut self, cfg: SinkConfig) -> SeekResult<()> {
        validate_config(&cfg)?;
        let out = &self.opts.out_path;
        if !self.opts.overwrite && out.exists() {
            return Err(SeekError::validation(format!(
                "output file '{}' already exists",
                out.display()
            )));
        }
        if let Some(parent) = out.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create output dir '{}'", parent.display()))?;
        }

        let child = Command::new("ffmpeg")
            .args(ffmpeg_args(&cfg, &self.opts))
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                SeekError::frame(format!("failed to spawn ffmpeg (is it on PATH?): {e}"))
            })?;
        tracing::debug!(
            out = %out.display(),
            width = cfg.width,
            height = cfg.height,
            "spawned ffmpeg"
        );

        self.scratch = vec![0u8; cfg.width as usize * cfg.height as usize * 4];
        self.child = Some(child);
        self.last_idx = None;
        Ok(())
    }

    fn push_frame(&mut self, idx: FrameIndex, frame: &FrameRGBA) -> SeekResult<()> {
        let Some(stdin) = self.child.as_mut().and_then(|c| c.stdin.as_mut()) else {
            return Err(SeekError::frame("ffmpeg sink not started"));
        };
        if self.last_idx.is_some_and(|last| idx <= last) {
            return Err(SeekError::frame(
                "ffmpeg sink received out-of-order frame index",
            ));
        }
        if frame.data.len() != self.scratch.len() {
            return Err(SeekError::validation(format!(
                "frame {}x{} does not match the {}-byte ffmpeg input",
                frame.width,
                frame.height,
                self.scratch.len()
            )));
        }
        self.last_idx = Some(idx);

        flatten_onto(&mut self.scratch, frame, self.opts.bg_rgba);
        stdin
            .write_all(&self.scratch)
            .map_err(|e| SeekError::frame(format!("failed to write frame to ffmpeg: {e}")))
    }

    fn end(&mut self) -> SeekResult<()> {
        let child = self
            .child
            .take()
            .ok_or_else(|| SeekError::frame("ffmpeg sink not started"))?;
        // Closes stdin, then collects stderr while waiting.
        let output = child
            .wait_with_output()
            .map_err(|e| SeekError::frame(format!("failed to wait for ffmpeg: {e}")))?;
        if !output.status.success() {
            return Err(SeekError::frame(format!(
                "ffmpeg exited with status {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        tracing::debug!(
            out = %self.opts.out_path.display(),
            frames = self.last_idx.map_or(0, |i| i.0 + 1),
            "ffmpeg finished"
        );
        Ok(())
    }
}

impl Drop for FfmpegSink {
    fn drop(&mut self) {
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/encode/ffmpeg.rs"]
mod tests;
