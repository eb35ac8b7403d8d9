mod flow;
mod graph;
mod node;

pub use flow::{BranchFlow, FlowRule, SequenceFlow};
pub use graph::{END_NODE, GraphConfig, Version};
pub use node::{NodeConfig, NodeKind, NodeName, Signature};
