use tokio::sync::watch;

/// Terminal state of one seek run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunOutcome {
    /// The traversal reached the end of the media.
    Completed,
    /// The traversal was stopped before reaching the end.
    Cancelled,
    /// The traversal aborted with an error (consumer, source or timeout).
    Failed,
}

/// Write side of a run's completion signal.
///
/// Only the first resolution is recorded; later calls are no-ops. Dropping an unresolved
/// completion resolves it as [`RunOutcome::Cancelled`] so joiners never hang on an abandoned run.
#[derive(Debug)]
pub(crate) struct Completion {
    tx: watch::Sender<Option<RunOutcome>>,
}

impl Completion {
    pub(crate) fn new() -> Self {
        let (tx, _) = watch::channel(None);
        Self { tx }
    }

    /// Record `outcome` unless the run was already resolved. Returns `true` if this call won.
    pub(crate) fn resolve(&self, outcome: RunOutcome) -> bool {
        self.tx.send_if_modified(|slot| {
            if slot.is_some() {
                return false;
            }
            *slot = Some(outcome);
            true
        })
    }

    pub(crate) fn handle(&self) -> CompletionHandle {
        CompletionHandle {
            rx: self.tx.subscribe(),
        }
    }
}

impl Drop for Completion {
    fn drop(&mut self) {
        self.resolve(RunOutcome::Cancelled);
    }
}

/// Read side of a run's completion signal. Cheap to clone; every clone observes the same outcome.
#[derive(Clone, Debug)]
pub struct CompletionHandle {
    rx: watch::Receiver<Option<RunOutcome>>,
}

impl CompletionHandle {
    /// Outcome if the run has already finished.
    pub fn try_outcome(&self) -> Option<RunOutcome> {
        *self.rx.borrow()
    }

    /// Wait for the run to finish.
    pub async fn wait(mut self) -> RunOutcome {
        match self.rx.wait_for(Option::is_some).await {
            Ok(slot) => (*slot).unwrap_or(RunOutcome::Cancelled),
            // The sender resolves on drop, so a closed channel without a value means the run was
            // abandoned.
            Err(_) => RunOutcome::Cancelled,
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/seek/completion.rs"]
mod tests;
