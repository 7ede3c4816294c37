// shopfront/src/workflow/definition.rs

//! The `Workflow<TData, S, Err>` definition and handler registration.

use std::collections::HashMap;
use std::fmt::Debug;
use std::future::Future;
use std::hash::Hash;
use std::pin::Pin;

use super::context_data::ContextData;
use super::control::StepControl;

/// A stage identifier. Usually a fieldless enum.
pub trait Stage: Copy + Eq + Hash + Debug + Send + Sync + 'static {
  fn name(&self) -> &'static str;
}

/// Boxed async handler over the shared context.
pub type Handler<TData, Err> = Box<
  dyn Fn(ContextData<TData>) -> Pin<Box<dyn Future<Output = Result<StepControl, Err>> + Send>> + Send + Sync,
>;

#[derive(Debug, Clone, Copy)]
pub struct StageDef<S> {
  pub stage: S,
  /// A failing handler in a best-effort stage is logged and the run goes on.
  pub best_effort: bool,
}

pub struct Workflow<TData, S, Err>
where
  TData: Send + Sync + 'static,
  S: Stage,
{
  pub(crate) name: &'static str,
  pub(crate) stages: Vec<StageDef<S>>,
  pub(crate) on: HashMap<S, Vec<Handler<TData, Err>>>,
  pub(crate) after: HashMap<S, Vec<Handler<TData, Err>>>,
}

impl<TData, S, Err> Workflow<TData, S, Err>
where
  TData: Send + Sync + 'static,
  S: Stage,
  Err: std::error::Error + Send + Sync + 'static,
{
  /// Creates a workflow over `stages` given as `(stage, best_effort)` pairs.
  ///
  /// Panics if a stage is listed twice; that is a wiring mistake.
  pub fn new(name: &'static str, stages: &[(S, bool)]) -> Self {
    let mut defs: Vec<StageDef<S>> = Vec::with_capacity(stages.len());
    for (stage, best_effort) in stages {
      assert!(
        !defs.iter().any(|d| d.stage == *stage),
        "workflow '{name}': stage {stage:?} listed twice"
      );
      defs.push(StageDef { stage: *stage, best_effort: *best_effort });
    }
    Self {
      name,
      stages: defs,
      on: HashMap::new(),
      after: HashMap::new(),
    }
  }

  pub fn stages(&self) -> impl Iterator<Item = S> + '_ {
    self.stages.iter().map(|d| d.stage)
  }

  fn ensure_stage_exists(&self, stage: S) {
    assert!(
      self.stages.iter().any(|d| d.stage == stage),
      "workflow '{}': stage {stage:?} is not part of this workflow",
      self.name
    );
  }

  /// Registers a main handler for `stage`.
  pub fn on<F, E>(&mut self, stage: S, handler_fn: impl Fn(ContextData<TData>) -> F + Send + Sync + 'static)
  where
    F: Future<Output = Result<StepControl, E>> + Send + 'static,
    E: Into<Err> + Send + Sync + 'static,
  {
    self.ensure_stage_exists(stage);
    self.on.entry(stage).or_default().push(wrap(handler_fn));
  }

  /// Registers a handler that runs after every `on` handler of `stage` succeeded.
  pub fn after<F, E>(&mut self, stage: S, handler_fn: impl Fn(ContextData<TData>) -> F + Send + Sync + 'static)
  where
    F: Future<Output = Result<StepControl, E>> + Send + 'static,
    E: Into<Err> + Send + Sync + 'static,
  {
    self.ensure_stage_exists(stage);
    self.after.entry(stage).or_default().push(wrap(handler_fn));
  }
}

fn wrap<TData, Err, F, E>(handler_fn: impl Fn(ContextData<TData>) -> F + Send + Sync + 'static) -> Handler<TData, Err>
where
  TData: Send + Sync + 'static,
  F: Future<Output = Result<StepControl, E>> + Send + 'static,
  E: Into<Err> + Send + Sync + 'static,
{
  Box::new(move |ctx| {
    let fut = handler_fn(ctx);
    Box::pin(async move { fut.await.map_err(Into::into) })
  })
}
