use crate::foundation::core::FrameRGBA;
use crate::foundation::error::{SeekError, SeekResult};
use crate::foundation::math::{add_sat_u8, mul_div255_u16, mul_div255_u8};

/// One premultiplied RGBA8 pixel.
pub(crate) type PremulRgba8 = [u8; 4];

/// Premultiplied source-over of one pixel.
pub(crate) fn over(dst: PremulRgba8, src: PremulRgba8) -> PremulRgba8 {
    match src[3] {
        0 => dst,
        255 => src,
        sa => {
            let inv = 255u16 - u16::from(sa);
            std::array::from_fn(|i| {
                add_sat_u8(u16::from(src[i]), mul_div255_u16(u16::from(dst[i]), inv))
            })
        }
    }
}

/// Composite `overlay` on top of `frame`. Both must be premultiplied and the same size.
pub fn overlay_frame(frame: &mut FrameRGBA, overlay: &FrameRGBA) -> SeekResult<()> {
    if frame.width != overlay.width || frame.height != overlay.height {
        return Err(SeekError::frame(format!(
            "overlay size {}x{} does not match video frame {}x{}",
            overlay.width, overlay.height, frame.width, frame.height
        )));
    }
    if frame.data.len() != frame.canvas().rgba_len() || overlay.data.len() != frame.data.len() {
        return Err(SeekError::frame("frame data size mismatch with width*height*4"));
    }
    if !frame.premultiplied || !overlay.premultiplied {
        return Err(SeekError::frame(
            "overlay compositing expects premultiplied frames",
        ));
    }
    for (d, s) in frame.data.chunks_exact_mut(4).zip(overlay.data.chunks_exact(4)) {
        let out = over([d[0], d[1], d[2], d[3]], [s[0], s[1], s[2], s[3]]);
        d.copy_from_slice(&out);
    }
    Ok(())
}

/// Convert straight-alpha RGBA8 to premultiplied in place.
pub fn premultiply_in_place(data: &mut [u8]) {
    for px in data.chunks_exact_mut(4) {
        let a = u16::from(px[3]);
        if a == 255 {
            continue;
        }
        for c in &mut px[..3] {
            *c = mul_div255_u8(u16::from(*c), a);
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/effects/composite.rs"]
mod tests;
