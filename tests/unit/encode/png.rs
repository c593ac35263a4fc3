use super::*;
use crate::foundation::core::FrameStep;

fn cfg(w: u32, h: u32) -> SinkConfig {
    SinkConfig {
        width: w,
        height: h,
        step: FrameStep::default(),
    }
}

#[test]
fn unpremultiply_restores_straight_color() {
    let src = [64u8, 0, 0, 128, 1, 2, 3, 255, 9, 9, 9, 0];
    let mut dst = [0u8; 12];
    unpremultiply(&mut dst, &src);
    assert_eq!(&dst[..4], &[128, 0, 0, 128]);
    assert_eq!(&dst[4..8], &[1, 2, 3, 255]);
    assert_eq!(&dst[8..], &[0, 0, 0, 0]);
}

#[test]
fn writes_numbered_pngs() {
    let dir = PathBuf::from("target").join("png_sink_unit");
    let _ = std::fs::remove_dir_all(&dir);

    let mut sink = PngSequenceSink::new(&dir);
    sink.begin(cfg(2, 2)).unwrap();
    let frame = FrameRGBA {
        width: 2,
        height: 2,
        data: [255u8, 0, 0, 255].repeat(4),
        premultiplied: true,
    };
    sink.push_frame(FrameIndex(0), &frame).unwrap();
    sink.push_frame(FrameIndex(1), &frame).unwrap();
    sink.end().unwrap();

    assert_eq!(sink.written().len(), 2);
    let first = PngSequenceSink::frame_path(&dir, FrameIndex(0));
    assert!(first.ends_with("frame_000000.png"));
    let img = image::open(&first).unwrap().to_rgba8();
    assert_eq!(img.dimensions(), (2, 2));
    assert_eq!(img.get_pixel(1, 1).0, [255, 0, 0, 255]);
}

#[test]
fn rejects_frames_before_begin_and_wrong_size() {
    let mut sink = PngSequenceSink::new(PathBuf::from("target").join("png_sink_reject"));
    let frame = FrameRGBA {
        width: 1,
        height: 1,
        data: vec![0; 4],
        premultiplied: true,
    };
    assert!(sink.push_frame(FrameIndex(0), &frame).is_err());
    sink.begin(cfg(2, 1)).unwrap();
    assert!(sink.push_frame(FrameIndex(0), &frame).is_err());
    assert!(sink.begin(cfg(0, 1)).is_err());
}
