// shopfront/src/workflow/execution.rs

//! `Workflow::run`: executes stages in order against one shared context.

use tracing::{event, Instrument, Level};

use super::context_data::ContextData;
use super::control::{Halted, StepControl, WorkflowOutcome};
use super::definition::{Stage, Workflow};

enum StageResult<Err> {
  Continue,
  Stop,
  Failed(Err),
}

impl<TData, S, Err> Workflow<TData, S, Err>
where
  TData: Send + Sync + 'static,
  S: Stage,
  Err: std::error::Error + Send + Sync + 'static,
{
  /// Runs every stage in declaration order.
  ///
  /// A stage with no handlers is a wiring error and panics. A handler error
  /// in a regular stage ends the run with [`Halted`]; in a best-effort stage it
  /// is logged and the run continues with the next stage.
  pub async fn run(&self, ctx: ContextData<TData>) -> Result<WorkflowOutcome<S>, Halted<S, Err>> {
    event!(Level::DEBUG, workflow = self.name, "Workflow run starting.");

    for def in &self.stages {
      let stage = def.stage;
      let on = self.on.get(&stage).map(Vec::as_slice).unwrap_or_default();
      let after = self.after.get(&stage).map(Vec::as_slice).unwrap_or_default();
      assert!(
        !on.is_empty() || !after.is_empty(),
        "workflow '{}': stage {stage:?} has no handlers",
        self.name
      );

      let span = tracing::info_span!("workflow_stage", workflow = self.name, stage = stage.name());
      let result = async {
        for handler in on.iter().chain(after.iter()) {
          match handler(ctx.clone()).await {
            Ok(StepControl::Continue) => {}
            Ok(StepControl::Stop) => return StageResult::Stop,
            Err(e) => return StageResult::Failed(e),
          }
        }
        StageResult::Continue
      }
      .instrument(span)
      .await;

      match result {
        StageResult::Continue => {
          event!(Level::DEBUG, workflow = self.name, stage = stage.name(), "Stage finished.");
        }
        StageResult::Stop => {
          event!(Level::INFO, workflow = self.name, stage = stage.name(), "Workflow stopped by handler.");
          return Ok(WorkflowOutcome::Stopped { at: stage });
        }
        StageResult::Failed(error) if def.best_effort => {
          event!(
            Level::WARN,
            workflow = self.name,
            stage = stage.name(),
            error = %error,
            "Best-effort stage failed; continuing."
          );
        }
        StageResult::Failed(error) => {
          event!(Level::ERROR, workflow = self.name, stage = stage.name(), error = %error, "Stage failed.");
          return Err(Halted { stage, error });
        }
      }
    }

    event!(Level::DEBUG, workflow = self.name, "Workflow run completed.");
    Ok(WorkflowOutcome::Completed)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
  enum Step {
    One,
    Two,
    Three,
  }

  impl Stage for Step {
    fn name(&self) -> &'static str {
      match self {
        Step::One => "one",
        Step::Two => "two",
        Step::Three => "three",
      }
    }
  }

  #[derive(Debug, thiserror::Error)]
  #[error("boom: {0}")]
  struct Boom(&'static str);

  type Trace = Vec<&'static str>;

  fn record(label: &'static str) -> impl Fn(ContextData<Trace>) -> std::future::Ready<Result<StepControl, Boom>> {
    move |ctx: ContextData<Trace>| {
      ctx.write().push(label);
      std::future::ready(Ok(StepControl::Continue))
    }
  }

  fn fail(label: &'static str) -> impl Fn(ContextData<Trace>) -> std::future::Ready<Result<StepControl, Boom>> {
    move |ctx: ContextData<Trace>| {
      ctx.write().push(label);
      std::future::ready(Err(Boom(label)))
    }
  }

  #[tokio::test]
  async fn runs_on_then_after_handlers_in_stage_order() {
    let mut wf = Workflow::<Trace, Step, Boom>::new("t", &[(Step::One, false), (Step::Two, false)]);
    wf.after(Step::One, record("one.after"));
    wf.on(Step::Two, record("two.on"));
    wf.on(Step::One, record("one.on"));

    let ctx = ContextData::new(Vec::new());
    let outcome = wf.run(ctx.clone()).await.unwrap();

    assert_eq!(outcome, WorkflowOutcome::Completed);
    assert_eq!(*ctx.read(), vec!["one.on", "one.after", "two.on"]);
  }

  #[tokio::test]
  async fn failure_reports_the_stage_and_skips_the_rest() {
    let mut wf = Workflow::<Trace, Step, Boom>::new("t", &[(Step::One, false), (Step::Two, false), (Step::Three, false)]);
    wf.on(Step::One, record("one"));
    wf.on(Step::Two, fail("two"));
    wf.on(Step::Three, record("three"));

    let ctx = ContextData::new(Vec::new());
    let halted = wf.run(ctx.clone()).await.unwrap_err();

    assert_eq!(halted.stage, Step::Two);
    assert_eq!(halted.error.0, "two");
    assert_eq!(*ctx.read(), vec!["one", "two"]);
  }

  #[tokio::test]
  async fn best_effort_stage_failure_does_not_halt() {
    let mut wf = Workflow::<Trace, Step, Boom>::new("t", &[(Step::One, true), (Step::Two, false)]);
    wf.on(Step::One, fail("one"));
    wf.on(Step::Two, record("two"));

    let ctx = ContextData::new(Vec::new());
    assert_eq!(wf.run(ctx.clone()).await.unwrap(), WorkflowOutcome::Completed);
    assert_eq!(*ctx.read(), vec!["one", "two"]);
  }

  #[tokio::test]
  async fn stop_ends_the_run_early() {
    let mut wf = Workflow::<Trace, Step, Boom>::new("t", &[(Step::One, false), (Step::Two, false)]);
    wf.on(Step::One, |_ctx: ContextData<Trace>| async { Ok::<_, Boom>(StepControl::Stop) });
    wf.on(Step::Two, record("two"));

    let ctx = ContextData::new(Vec::new());
    assert_eq!(wf.run(ctx.clone()).await.unwrap(), WorkflowOutcome::Stopped { at: Step::One });
    assert!(ctx.read().is_empty());
  }

  #[test]
  #[should_panic(expected = "not part of this workflow")]
  fn registering_an_unknown_stage_panics() {
    let mut wf = Workflow::<Trace, Step, Boom>::new("t", &[(Step::One, false)]);
    wf.on(Step::Two, record("two"));
  }
}
