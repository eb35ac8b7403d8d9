use crate::{model::NodeName, runtime::RunStatus};

/// Events emitted during one graph execution run.
#[derive(Debug, Clone)]
pub enum RunEvent {
    /// A node is about to be invoked.
    NodeStarted {
        node: NodeName,
    },
    /// A node's outputs were merged into the context.
    NodeCompleted {
        node: NodeName,
    },
    /// The node execution capability reported a failure; the run halts
    /// with partial results.
    NodeFailed {
        node: NodeName,
        error: String,
    },
    /// The run reached a terminal state.
    Finished {
        status: RunStatus,
    },
}
