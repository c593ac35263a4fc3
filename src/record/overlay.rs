use std::path::Path;

use anyhow::Context as _;

use crate::effects::composite::premultiply_in_place;
use crate::foundation::core::{Canvas, FrameRGBA};
use crate::foundation::error::{SeekError, SeekResult};

/// Layer drawn on top of every recorded video frame (text, stickers, widgets).
pub trait Overlay: Send {
    /// Premultiplied overlay for the frame at `progress`, or `None` to leave the frame as is.
    fn render(&mut self, progress: f64, canvas: Canvas) -> SeekResult<Option<&FrameRGBA>>;
}

/// Records the bare video.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoOverlay;

impl Overlay for NoOverlay {
    fn render(&mut self, _progress: f64, _canvas: Canvas) -> SeekResult<Option<&FrameRGBA>> {
        Ok(None)
    }
}

/// The same overlay image on every frame.
#[derive(Clone, Debug)]
pub struct StaticOverlay {
    frame: FrameRGBA,
}

impl StaticOverlay {
    /// Wrap an already premultiplied frame.
    pub fn new(frame: FrameRGBA) -> SeekResult<Self> {
        if !frame.premultiplied {
            return Err(SeekError::validation("static overlay must be premultiplied"));
        }
        if frame.data.len() != frame.canvas().rgba_len() {
            return Err(SeekError::validation(
                "static overlay data size mismatch with width*height*4",
            ));
        }
        Ok(Self { frame })
    }

    /// Load a PNG (straight alpha) from disk.
    pub fn from_path(path: impl AsRef<Path>) -> SeekResult<Self> {
        let path = path.as_ref();
        let img = image::open(path)
            .with_context(|| format!("read overlay '{}'", path.display()))?
            .to_rgba8();
        let (width, height) = img.dimensions();
        let mut data = img.into_raw();
        premultiply_in_place(&mut data);
        Self::new(FrameRGBA {
            width,
            height,
            data,
            premultiplied: true,
        })
    }

    /// Overlay size.
    pub fn canvas(&self) -> Canvas {
        self.frame.canvas()
    }
}

impl Overlay for StaticOverlay {
    fn render(&mut self, _progress: f64, canvas: Canvas) -> SeekResult<Option<&FrameRGBA>> {
        if canvas != self.frame.canvas() {
            return Err(SeekError::frame(format!(
                "overlay is {}x{} but the video is {}x{}",
                self.frame.width, self.frame.height, canvas.width, canvas.height
            )));
        }
        Ok(Some(&self.frame))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/record/overlay.rs"]
mod tests;
