use super::*;

#[test]
fn frame_step_rejects_non_positive_and_non_finite() {
    assert!(FrameStep::new(0.0).is_err());
    assert!(FrameStep::new(-0.5).is_err());
    assert!(FrameStep::new(f64::NAN).is_err());
    assert!(FrameStep::new(f64::INFINITY).is_err());
    assert!(FrameStep::new(0.04).is_ok());
}

#[test]
fn snap_is_idempotent() {
    let step = FrameStep::new(1.0 / 30.0).unwrap();
    for t in [0.0, 0.01, 0.0166, 0.5, 0.98, 1.0, 12.3456, 3599.99] {
        let once = step.snap(t);
        assert_eq!(step.snap(once), once, "t={t}");
    }
}

#[test]
fn snap_lands_on_the_step_grid() {
    let step = FrameStep::new(0.04).unwrap();
    for t in [0.0, 0.019, 0.021, 0.5, 7.777, 100.003] {
        let s = step.snap(t);
        let k = s / step.secs();
        assert!((k - k.round()).abs() < 1e-9, "t={t} snapped={s}");
        assert!((s - t).abs() <= step.secs() / 2.0 + 1e-12);
    }
}

#[test]
fn time_at_matches_snap_of_index() {
    let step = FrameStep::new(1.0 / 30.0).unwrap();
    for idx in 0..300u64 {
        let t = step.time_at(idx);
        assert_eq!(step.index_of(t), idx);
        assert_eq!(step.snap(t), t);
    }
}

#[test]
fn frame_step_from_rational_fps() {
    let step = FrameStep::from_fps(Fps::new(25, 1).unwrap()).unwrap();
    assert_eq!(step.secs(), 0.04);
    assert!(FrameStep::from_fps(Fps { num: 0, den: 1 }).is_err());
}

#[test]
fn frame_step_deserialize_validates() {
    let ok: FrameStep = serde_json::from_str("0.5").unwrap();
    assert_eq!(ok.secs(), 0.5);
    assert!(serde_json::from_str::<FrameStep>("0").is_err());
    assert!(serde_json::from_str::<FrameStep>("-1.0").is_err());
}

#[test]
fn transparent_frame_matches_canvas() {
    let canvas = Canvas {
        width: 3,
        height: 2,
    };
    let f = FrameRGBA::transparent(canvas);
    assert_eq!(f.data.len(), canvas.rgba_len());
    assert!(f.data.iter().all(|&b| b == 0));
    assert_eq!(f.canvas(), canvas);
}
