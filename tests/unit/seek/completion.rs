use super::*;

#[tokio::test]
async fn first_resolution_wins() {
    let c = Completion::new();
    let h = c.handle();
    assert!(c.resolve(RunOutcome::Cancelled));
    assert!(!c.resolve(RunOutcome::Completed));
    assert_eq!(h.try_outcome(), Some(RunOutcome::Cancelled));
    assert_eq!(h.wait().await, RunOutcome::Cancelled);
}

#[tokio::test]
async fn every_handle_observes_the_same_outcome() {
    let c = Completion::new();
    let a = c.handle();
    let b = a.clone();
    assert_eq!(a.try_outcome(), None);

    let (ra, rb, ()) = tokio::join!(a.wait(), b.wait(), async {
        c.resolve(RunOutcome::Completed);
    });
    assert_eq!(ra, RunOutcome::Completed);
    assert_eq!(rb, RunOutcome::Completed);
}

#[tokio::test]
async fn dropping_unresolved_completion_releases_waiters() {
    let c = Completion::new();
    let h = c.handle();
    drop(c);
    assert_eq!(h.wait().await, RunOutcome::Cancelled);
}

#[tokio::test]
async fn drop_keeps_earlier_outcome() {
    let c = Completion::new();
    let h = c.handle();
    c.resolve(RunOutcome::Failed);
    drop(c);
    assert_eq!(h.wait().await, RunOutcome::Failed);
}
