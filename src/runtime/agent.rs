//! Executable agent built from a validated configuration.

use std::sync::Arc;

use crate::{
    Result,
    common::Vars,
    events::{EventSink, NullSink},
    model::GraphConfig,
    runtime::{
        GraphExecutor,
        executor::{DEFAULT_MAX_STEPS, NodeInvoker, RunOutcome},
    },
};

/// Runnable agent: a validated [`GraphConfig`] wired to a node invoker.
///
/// Cloning is cheap (shared config and invoker), so the evaluation harness
/// can fan runs out across tasks; each run still gets its own isolated
/// context.
#[derive(Clone)]
pub struct GraphAgent {
    config: Arc<GraphConfig>,
    invoker: Arc<dyn NodeInvoker>,
    sink: Arc<dyn EventSink>,
    max_steps: usize,
}

impl GraphAgent {
    /// Wires a validated configuration to the node execution capability.
    ///
    /// Every node is probed through [`NodeInvoker::check`]; a wiring
    /// failure (e.g. an unregistered tool) fails construction.
    pub fn new(
        config: GraphConfig,
        invoker: Arc<dyn NodeInvoker>,
    ) -> Result<Self> {
        for (name, node) in &config.nodes {
            invoker.check(name, node)?;
        }

        Ok(Self {
            config: Arc::new(config),
            invoker,
            sink: Arc::new(NullSink),
            max_steps: DEFAULT_MAX_STEPS,
        })
    }

    pub fn with_sink(
        mut self,
        sink: Arc<dyn EventSink>,
    ) -> Self {
        self.sink = sink;
        self
    }

    pub fn with_max_steps(
        mut self,
        max_steps: usize,
    ) -> Self {
        self.max_steps = max_steps;
        self
    }

    pub fn config(&self) -> &GraphConfig {
        &self.config
    }

    /// Executes one workflow run against a fresh context.
    pub async fn run(
        &self,
        inputs: Vars,
    ) -> RunOutcome {
        GraphExecutor::new(&self.config, self.invoker.as_ref())
            .with_sink(self.sink.as_ref())
            .with_max_steps(self.max_steps)
            .execute(inputs)
            .await
    }
}
