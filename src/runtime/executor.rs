//! Graph execution engine.
//!
//! The executor walks a validated [`GraphConfig`] against an accumulating
//! variable context: invoke the current node through the external
//! [`NodeInvoker`], merge its outputs, resolve the flow rule, repeat. The
//! step bound is the sole termination guarantee — cycles are an intended
//! pattern (self-revision loops), so there is no cycle detection.
//!
//! A run is strictly sequential: routing depends on outputs that are not
//! known before invocation. Independent runs may execute concurrently,
//! each with its own isolated context.

use async_trait::async_trait;

use crate::{
    Result,
    common::Vars,
    events::{EventSink, NullSink, RunEvent},
    model::{END_NODE, FlowRule, GraphConfig, NodeConfig, NodeName},
    runtime::Context,
};

/// Default bound on node invocations per run.
pub const DEFAULT_MAX_STEPS: usize = 15;

static NULL_SINK: NullSink = NullSink;

/// External node execution capability.
///
/// Given a node and the subset of the context matching its declared
/// inputs, produces a mapping covering its declared outputs. The concrete
/// mechanism (model invocation, retries, auth) lives entirely behind this
/// trait. Implementations must be safe for concurrent invocation.
#[async_trait]
pub trait NodeInvoker: Send + Sync {
    /// Invokes one node with its declared inputs.
    async fn invoke(
        &self,
        name: &str,
        node: &NodeConfig,
        inputs: Vars,
    ) -> Result<Vars>;

    /// Wiring probe called at agent build time, before any run.
    ///
    /// Lets an invoker reject a node it cannot serve (unknown execution
    /// strategy, unregistered tool). The default accepts everything.
    fn check(
        &self,
        name: &str,
        node: &NodeConfig,
    ) -> Result<()> {
        let _ = (name, node);
        Ok(())
    }
}

/// Terminal state of one execution run.
///
/// All variants are returned statuses, never `Err`: even a failed run
/// hands back the context and trace accumulated so far, so callers can
/// use partial results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunStatus {
    /// The run reached the `"end"` sentinel.
    Completed,
    /// The step bound was hit before `"end"`. Not an error.
    StepLimitExceeded,
    /// Routing reached an undefined node. Defensive; unreachable for
    /// configurations built through `GraphConfig::parse`.
    RoutingError {
        node: NodeName,
    },
    /// The node execution capability failed.
    ExecutionError {
        node: NodeName,
        error: String,
    },
}

impl RunStatus {
    /// `true` for the two successful-return statuses.
    pub fn is_success(&self) -> bool {
        matches!(self, RunStatus::Completed | RunStatus::StepLimitExceeded)
    }

    pub fn label(&self) -> &'static str {
        match self {
            RunStatus::Completed => "completed",
            RunStatus::StepLimitExceeded => "step_limit_exceeded",
            RunStatus::RoutingError {
                ..
            } => "routing_error",
            RunStatus::ExecutionError {
                ..
            } => "execution_error",
        }
    }

    /// Error text for failed statuses.
    pub fn error_text(&self) -> Option<String> {
        match self {
            RunStatus::RoutingError {
                node,
            } => Some(format!("routing reached undefined node '{}'", node)),
            RunStatus::ExecutionError {
                node,
                error,
            } => Some(format!("node '{}' failed: {}", node, error)),
            _ => None,
        }
    }
}

/// Result of one execution run: final context, visited-node trace and
/// terminal status.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub context: Vars,
    pub trace: Vec<NodeName>,
    pub status: RunStatus,
}

/// Single-run state machine over a validated graph.
pub struct GraphExecutor<'a> {
    config: &'a GraphConfig,
    invoker: &'a dyn NodeInvoker,
    sink: &'a dyn EventSink,
    max_steps: usize,
}

impl<'a> GraphExecutor<'a> {
    pub fn new(
        config: &'a GraphConfig,
        invoker: &'a dyn NodeInvoker,
    ) -> Self {
        Self {
            config,
            invoker,
            sink: &NULL_SINK,
            max_steps: DEFAULT_MAX_STEPS,
        }
    }

    pub fn with_sink(
        mut self,
        sink: &'a dyn EventSink,
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

    /// Runs the workflow to completion or step limit.
    pub async fn execute(
        &self,
        inputs: Vars,
    ) -> RunOutcome {
        let mut ctx = Context::new(inputs);
        let mut current = self.config.start_node.clone();
        let mut steps = 0usize;

        let status = loop {
            if current == END_NODE {
                break RunStatus::Completed;
            }
            if steps >= self.max_steps {
                break RunStatus::StepLimitExceeded;
            }

            // Trace is appended pre-invocation so a failing node still
            // shows up in the path.
            ctx.visit(&current);

            let Some(node) = self.config.node(&current) else {
                break RunStatus::RoutingError {
                    node: current,
                };
            };

            self.sink.on_run(ctx.run_id(), &RunEvent::NodeStarted {
                node: current.clone(),
            });

            let inputs = ctx.subset(&node.signature.inputs);
            match self.invoker.invoke(&current, node, inputs).await {
                Ok(outputs) => {
                    ctx.merge_outputs(&outputs);
                    self.sink.on_run(ctx.run_id(), &RunEvent::NodeCompleted {
                        node: current.clone(),
                    });
                }
                Err(e) => {
                    let error = e.to_string();
                    self.sink.on_run(ctx.run_id(), &RunEvent::NodeFailed {
                        node: current.clone(),
                        error: error.clone(),
                    });
                    break RunStatus::ExecutionError {
                        node: current,
                        error,
                    };
                }
            }

            current = match self.config.rule(&current) {
                None => END_NODE.to_string(),
                Some(FlowRule::Sequence(seq)) => seq.next.clone(),
                Some(FlowRule::Branch(branch)) => branch.resolve(ctx.vars()).to_string(),
            };
            steps += 1;
        };

        self.sink.on_run(ctx.run_id(), &RunEvent::Finished {
            status: status.clone(),
        });

        let (context, trace) = ctx.into_parts();
        RunOutcome {
            context,
            trace,
            status,
        }
    }
}
