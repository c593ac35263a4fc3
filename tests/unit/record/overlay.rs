use super::*;
use std::path::PathBuf;

#[test]
fn no_overlay_renders_nothing() {
    let canvas = Canvas {
        width: 4,
        height: 4,
    };
    assert!(NoOverlay.render(0.5, canvas).unwrap().is_none());
}

#[test]
fn static_overlay_checks_canvas() {
    let canvas = Canvas {
        width: 2,
        height: 2,
    };
    let mut ov = StaticOverlay::new(FrameRGBA::transparent(canvas)).unwrap();
    assert!(ov.render(0.0, canvas).unwrap().is_some());
    assert!(
        ov.render(
            0.0,
            Canvas {
                width: 4,
                height: 2
            }
        )
        .is_err()
    );
}

#[test]
fn static_overlay_rejects_bad_frames() {
    let mut frame = FrameRGBA::transparent(Canvas {
        width: 2,
        height: 1,
    });
    frame.premultiplied = false;
    assert!(StaticOverlay::new(frame.clone()).is_err());
    frame.premultiplied = true;
    frame.data.pop();
    assert!(StaticOverlay::new(frame).is_err());
}

#[test]
fn png_overlay_is_premultiplied_on_load() {
    let dir = PathBuf::from("target").join("overlay_unit");
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("half_red.png");
    image::save_buffer_with_format(
        &path,
        &[255, 0, 0, 128],
        1,
        1,
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .unwrap();

    let mut ov = StaticOverlay::from_path(&path).unwrap();
    let canvas = ov.canvas();
    let frame = ov.render(0.0, canvas).unwrap().unwrap();
    assert_eq!(frame.data, vec![128, 0, 0, 128]);
}
