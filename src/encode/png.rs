use std::path::{Path, PathBuf};

use anyhow::Context as _;

use crate::encode::sink::{FrameSink, SinkConfig};
use crate::foundation::core::{FrameIndex, FrameRGBA};
use crate::foundation::error::{SeekError, SeekResult};

/// Writes every frame as `frame_NNNNNN.png` into a directory.
///
/// Premultiplied frames are converted back to straight alpha before encoding.
#[derive(Debug)]
pub struct PngSequenceSink {
    dir: PathBuf,
    cfg: Option<SinkConfig>,
    scratch: Vec<u8>,
    written: Vec<PathBuf>,
}

impl PngSequenceSink {
    /// Create a sink writing into `dir` (created on `begin`).
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            cfg: None,
            scratch: Vec::new(),
            written: Vec::new(),
        }
    }

    /// Paths written so far, in frame order.
    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }

    /// File name used for frame `idx`.
    pub fn frame_path(dir: &Path, idx: FrameIndex) -> PathBuf {
        dir.join(format!("frame_{:06}.png", idx.0))
    }
}

impl FrameSink for PngSequenceSink {
    fn begin(&mut self, cfg: SinkConfig) -> SeekResult<()> {
        if cfg.width == 0 || cfg.height == 0 {
            return Err(SeekError::validation(
                "png sink width/height must be non-zero",
            ));
        }
        std::fs::create_dir_all(&self.dir)
            .with_context(|| format!("failed to create output directory '{}'", self.dir.display()))?;
        self.scratch = vec![0u8; (cfg.width as usize) * (cfg.height as usize) * 4];
        self.written.clear();
        self.cfg = Some(cfg);
        Ok(())
    }

    fn push_frame(&mut self, idx: FrameIndex, frame: &FrameRGBA) -> SeekResult<()> {
        let cfg = self
            .cfg
            .as_ref()
            .ok_or_else(|| SeekError::frame("png sink not started"))?;
        if frame.width != cfg.width || frame.height != cfg.height {
            return Err(SeekError::validation(format!(
                "frame size mismatch: got {}x{}, expected {}x{}",
                frame.width, frame.height, cfg.width, cfg.height
            )));
        }
        if frame.data.len() != self.scratch.len() {
            return Err(SeekError::validation(
                "frame.data size mismatch with width*height*4",
            ));
        }

        if frame.premultiplied {
            unpremultiply(&mut self.scratch, &frame.data);
        } else {
            self.scratch.copy_from_slice(&frame.data);
        }

        let path = Self::frame_path(&self.dir, idx);
        image::save_buffer_with_format(
            &path,
            &self.scratch,
            frame.width,
            frame.height,
            image::ColorType::Rgba8,
            image::ImageFormat::Png,
        )
        .with_context(|| format!("write png '{}'", path.display()))?;
        tracing::trace!(path = %path.display(), "wrote frame");
        self.written.push(path);
        Ok(())
    }

    fn end(&mut self) -> SeekResult<()> {
        self.cfg = None;
        Ok(())
    }
}

fn unpremultiply(dst: &mut [u8], src_premul: &[u8]) {
    for (d, s) in dst.chunks_exact_mut(4).zip(src_premul.chunks_exact(4)) {
        let a = u32::from(s[3]);
        match a {
            0 => d.copy_from_slice(&[0, 0, 0, 0]),
            255 => d.copy_from_slice(s),
            _ => {
                for i in 0..3 {
                    d[i] = ((u32::from(s[i]) * 255 + a / 2) / a).min(255) as u8;
                }
                d[3] = s[3];
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/encode/png.rs"]
mod tests;
