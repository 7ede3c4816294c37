// shopfront/src/workflow/control.rs

//! Flow signals from handlers and the outcome of a run.

/// Returned by a handler to let the run proceed or end it early.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepControl {
  Continue,
  /// End the run after this handler. Remaining handlers and stages are skipped.
  Stop,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowOutcome<S> {
  /// Every stage ran.
  Completed,
  /// A handler in stage `at` returned `StepControl::Stop`.
  Stopped { at: S },
}

/// A handler error, tagged with the stage it happened in so callers can pick
/// a recovery per stage.
#[derive(Debug)]
pub struct Halted<S, Err> {
  pub stage: S,
  pub error: Err,
}

impl<S: std::fmt::Debug, Err: std::fmt::Display> std::fmt::Display for Halted<S, Err> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "halted in stage {:?}: {}", self.stage, self.error)
  }
}
