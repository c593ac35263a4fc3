use super::*;
use crate::foundation::core::Canvas;

fn solid(w: u32, h: u32, px: [u8; 4]) -> FrameRGBA {
    FrameRGBA {
        width: w,
        height: h,
        data: px.repeat((w * h) as usize),
        premultiplied: true,
    }
}

#[test]
fn over_src_alpha_0_is_noop() {
    let dst = [10, 20, 30, 40];
    let src = [255, 255, 255, 0];
    assert_eq!(over(dst, src), dst);
}

#[test]
fn over_src_opaque_replaces_dst() {
    let dst = [0, 0, 0, 255];
    let src = [255, 0, 0, 255];
    assert_eq!(over(dst, src), src);
}

#[test]
fn over_half_alpha_blends_onto_opaque_video() {
    // Premultiplied white @ ~50% over opaque black.
    let out = over([0, 0, 0, 255], [128, 128, 128, 128]);
    assert_eq!(out, [128, 128, 128, 255]);
}

#[test]
fn overlay_frame_keeps_video_where_overlay_is_clear() {
    let canvas = Canvas {
        width: 2,
        height: 1,
    };
    let mut frame = solid(2, 1, [10, 20, 30, 255]);
    let mut overlay = FrameRGBA::transparent(canvas);
    overlay.data[4..8].copy_from_slice(&[0, 0, 255, 255]);

    overlay_frame(&mut frame, &overlay).unwrap();
    assert_eq!(&frame.data[..4], &[10, 20, 30, 255]);
    assert_eq!(&frame.data[4..], &[0, 0, 255, 255]);
}

#[test]
fn overlay_frame_rejects_size_mismatch() {
    let mut frame = solid(2, 2, [0, 0, 0, 255]);
    let overlay = solid(1, 2, [0, 0, 0, 0]);
    assert!(overlay_frame(&mut frame, &overlay).is_err());
}

#[test]
fn overlay_frame_rejects_straight_alpha() {
    let mut frame = solid(1, 1, [0, 0, 0, 255]);
    let mut overlay = solid(1, 1, [255, 0, 0, 128]);
    overlay.premultiplied = false;
    assert!(overlay_frame(&mut frame, &overlay).is_err());
}

#[test]
fn premultiply_scales_color_by_alpha() {
    let mut data = vec![255, 128, 0, 128, 9, 8, 7, 255];
    premultiply_in_place(&mut data);
    assert_eq!(data, vec![128, 64, 0, 128, 9, 8, 7, 255]);
}

#[test]
fn over_keeps_partially_covered_alpha() {
    // 25% premultiplied red over 50% premultiplied blue.
    let out = over([0, 0, 128, 128], [64, 0, 0, 64]);
    assert_eq!(out, [64, 0, 96, 160]);
}
