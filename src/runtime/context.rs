//! Per-run execution context.

use crate::{common::Vars, model::NodeName, utils};

/// Mutable state of exactly one execution run.
///
/// A context is seeded with the run's initial inputs, accumulates node
/// outputs (last-write-wins) and the visited-node trace, and is discarded
/// when the run ends. Contexts are never shared across runs.
pub struct Context {
    run_id: String,
    vars: Vars,
    trace: Vec<NodeName>,
}

impl Context {
    /// create a fresh context seeded with the run inputs
    pub fn new(inputs: Vars) -> Self {
        Self {
            run_id: utils::longid(),
            vars: inputs,
            trace: Vec::new(),
        }
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn vars(&self) -> &Vars {
        &self.vars
    }

    pub fn trace(&self) -> &[NodeName] {
        &self.trace
    }

    /// record a node visit (pre-invocation)
    pub fn visit(
        &mut self,
        node: &str,
    ) {
        self.trace.push(node.to_string());
    }

    /// merge node outputs into the context, overwriting on collision
    pub fn merge_outputs(
        &mut self,
        outputs: &Vars,
    ) {
        self.vars.merge(outputs);
    }

    /// Projects the context onto a node's declared inputs.
    ///
    /// Variables absent from the context are simply omitted; defaulting is
    /// the invoker's own contract.
    pub fn subset(
        &self,
        inputs: &[String],
    ) -> Vars {
        inputs.iter().filter_map(|name| self.vars.get(name).map(|v| (name.clone(), v.clone()))).collect()
    }

    pub(crate) fn into_parts(self) -> (Vars, Vec<NodeName>) {
        (self.vars, self.trace)
    }
}
