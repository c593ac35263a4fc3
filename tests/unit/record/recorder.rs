use super::*;
use std::time::Duration;

use crate::encode::sink::InMemorySink;
use crate::foundation::core::{Canvas, FrameRGBA};
use crate::media::simulated::{SimulatedOpts, SimulatedSource, synthetic_pixel};
use crate::record::overlay::{NoOverlay, StaticOverlay};

const CANVAS: Canvas = Canvas {
    width: 4,
    height: 2,
};

fn source(latency_ms: u64) -> Arc<SimulatedSource> {
    Arc::new(
        SimulatedSource::new(SimulatedOpts {
            duration: 1.0,
            canvas: CANVAS,
            seek_latency: Duration::from_millis(latency_ms),
            ..SimulatedOpts::default()
        })
        .unwrap(),
    )
}

/// Opaque white on the left column, clear elsewhere.
fn left_column_overlay() -> StaticOverlay {
    let mut frame = FrameRGBA::transparent(CANVAS);
    for y in 0..CANVAS.height as usize {
        let i = y * CANVAS.width as usize * 4;
        frame.data[i..i + 4].copy_from_slice(&[255, 255, 255, 255]);
    }
    StaticOverlay::new(frame).unwrap()
}

fn opts(step: f64) -> DriverOpts {
    DriverOpts {
        step: FrameStep::new(step).unwrap(),
        ..DriverOpts::default()
    }
}

#[tokio::test]
async fn records_one_composited_frame_per_step() {
    let src = source(0);
    let session = RecordSession::new(
        Arc::clone(&src),
        InMemorySink::new(),
        left_column_overlay(),
        opts(0.25),
    );

    let report = session.record(0.0, DriveMode::Confirmed).await.unwrap();
    assert_eq!(report.outcome, RunOutcome::Completed);
    assert_eq!(report.frames_written, 4);

    let sink = session.into_sink();
    assert!(sink.is_ended());
    let cfg = sink.config().unwrap();
    assert_eq!((cfg.width, cfg.height), (4, 2));
    assert_eq!(cfg.step.secs(), 0.25);

    for (n, (idx, frame)) in sink.frames().iter().enumerate() {
        assert_eq!(idx.0, n as u64);
        assert_eq!(&frame.data[..4], &[255, 255, 255, 255]);
        let expected = synthetic_pixel(n as f64 * 0.25, 1.0);
        assert_eq!(&frame.data[4..8], &expected);
    }
}

#[tokio::test(start_paused = true)]
async fn cancelled_recording_still_finalizes_the_sink() {
    let src = source(10);
    let session = RecordSession::new(Arc::clone(&src), InMemorySink::new(), NoOverlay, opts(0.1));

    let (report, ()) = tokio::join!(session.record(0.0, DriveMode::Confirmed), async {
        tokio::time::sleep(Duration::from_millis(25)).await;
        session.stop().await;
    });
    let report = report.unwrap();
    assert_eq!(report.outcome, RunOutcome::Cancelled);
    assert!((1..10).contains(&report.frames_written));

    let sink = session.into_sink();
    assert!(sink.is_ended());
    assert_eq!(sink.frames().len() as u64, report.frames_written);
}

#[tokio::test]
async fn overlay_mismatch_fails_the_run_and_closes_the_sink() {
    let src = source(0);
    let wrong = StaticOverlay::new(FrameRGBA::transparent(Canvas {
        width: 2,
        height: 2,
    }))
    .unwrap();
    let session = RecordSession::new(Arc::clone(&src), InMemorySink::new(), wrong, opts(0.5));

    let err = session.record(0.0, DriveMode::Immediate).await.unwrap_err();
    assert!(matches!(err, SeekError::Frame(_)));
    assert!(!session.driver().is_running());
    assert_eq!(src.current_time(), 0.0);
    assert!(session.into_sink().is_ended());
}

#[tokio::test]
async fn second_recording_restarts_frame_numbering() {
    let src = source(0);
    let session = RecordSession::new(Arc::clone(&src), InMemorySink::new(), NoOverlay, opts(0.5));

    let first = session.record(0.0, DriveMode::Immediate).await.unwrap();
    let second = session.record(0.5, DriveMode::Immediate).await.unwrap();
    assert_eq!(first.frames_written, 2);
    assert_eq!(second.frames_written, 1);

    let sink = session.into_sink();
    assert_eq!(sink.frames().len(), 1);
    assert_eq!(sink.frames()[0].0, FrameIndex(0));
}
