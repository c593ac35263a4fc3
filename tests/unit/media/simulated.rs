use super::*;

#[tokio::test]
async fn duration_hidden_until_ready() {
    let src = SimulatedSource::new(SimulatedOpts {
        ready: false,
        ..SimulatedOpts::default()
    })
    .unwrap();
    assert!(src.duration().is_nan());
    assert!(src.capture_frame().is_err());

    let (ready, ()) = tokio::join!(src.ready(), async { src.mark_ready() });
    ready.unwrap();
    assert_eq!(src.duration(), 1.0);
}

#[test]
fn rejects_bad_options() {
    assert!(SimulatedSource::with_duration(0.0).is_err());
    assert!(SimulatedSource::with_duration(f64::NAN).is_err());
    assert!(
        SimulatedSource::new(SimulatedOpts {
            canvas: Canvas {
                width: 0,
                height: 4
            },
            ..SimulatedOpts::default()
        })
        .is_err()
    );
}

#[test]
fn instant_seek_notifies_every_listener() {
    let src = SimulatedSource::with_duration(2.0).unwrap();
    let mut a = src.subscribe_seeked();
    let mut b = src.subscribe_seeked();
    src.set_current_time(0.5).unwrap();

    assert_eq!(a.events.try_recv().unwrap().position, 0.5);
    assert_eq!(b.events.try_recv().unwrap().position, 0.5);
    assert_eq!(src.current_time(), 0.5);
}

#[test]
fn seek_clamps_to_media_bounds() {
    let src = SimulatedSource::with_duration(2.0).unwrap();
    src.set_current_time(5.0).unwrap();
    src.set_current_time(-1.0).unwrap();
    assert_eq!(src.seek_history(), vec![2.0, 0.0]);
    assert!(src.set_current_time(f64::NAN).is_err());
}

#[test]
fn unsubscribe_is_counted_once() {
    let src = SimulatedSource::with_duration(1.0).unwrap();
    let sub = src.subscribe_seeked();
    src.unsubscribe_seeked(sub.id);
    src.unsubscribe_seeked(sub.id);
    assert_eq!(src.subscribe_count(), 1);
    assert_eq!(src.unsubscribe_count(), 1);
    assert_eq!(src.listener_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn delayed_seek_confirms_after_latency() {
    let src = SimulatedSource::new(SimulatedOpts {
        seek_latency: Duration::from_millis(40),
        ..SimulatedOpts::default()
    })
    .unwrap();
    let mut sub = src.subscribe_seeked();
    src.set_current_time(0.25).unwrap();
    assert!(sub.events.try_recv().is_err());

    let ev = sub.events.recv().await.unwrap();
    assert_eq!(ev.position, 0.25);
}

#[test]
fn unconfirmed_source_moves_without_notifying() {
    let src = SimulatedSource::new(SimulatedOpts {
        confirm_seeks: false,
        ..SimulatedOpts::default()
    })
    .unwrap();
    let mut sub = src.subscribe_seeked();
    src.set_current_time(0.5).unwrap();
    assert_eq!(src.current_time(), 0.5);
    assert!(sub.events.try_recv().is_err());
}

#[test]
fn captured_frame_tracks_position() {
    let src = SimulatedSource::with_duration(1.0).unwrap();
    src.set_current_time(1.0).unwrap();
    let frame = src.capture_frame().unwrap();
    assert_eq!(frame.width, 64);
    assert_eq!(frame.height, 36);
    assert_eq!(&frame.data[..4], &[255, 0, 64, 255]);
    assert_eq!(synthetic_pixel(0.0, 1.0), [0, 255, 64, 255]);
}

#[test]
fn pause_and_play_toggle() {
    let src = SimulatedSource::with_duration(1.0).unwrap();
    src.pause().unwrap();
    assert!(src.is_paused());
    src.play();
    assert!(!src.is_paused());
    assert_eq!(src.pause_count(), 1);
}
