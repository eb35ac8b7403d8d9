//! Flow rules routing execution between nodes.
//!
//! A flow rule is attached to a source node and decides where execution
//! goes after that node completes: either an unconditional jump
//! ([`SequenceFlow`]) or a context-value-driven choice ([`BranchFlow`]).
//!
//! The wire format infers the variant from field presence (`next` for a
//! sequence, `"type": "branch"` for a branch) the same way the declarative
//! documents are written; internally the variant is an explicit enum
//! discriminant, resolved exactly once at the serde boundary.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize, de};

use crate::{
    common::Vars,
    model::{graph::END_NODE, node::NodeName},
};

/// Unconditional jump to the next node (or `"end"`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequenceFlow {
    pub next: NodeName,
}

/// Context-value-driven choice between targets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchFlow {
    /// Context variable consulted at runtime.
    pub source_var: String,
    /// Match-key to target node, in match-priority order.
    pub branches: IndexMap<String, NodeName>,
    /// Fallback target when no branch key matches.
    pub default: NodeName,
}

impl BranchFlow {
    /// Resolves the next node from the current context.
    ///
    /// The source variable's value is trimmed and uppercased, then the
    /// branch keys are scanned in insertion order; the first key whose
    /// uppercased form is a substring of the normalized value wins. This
    /// tolerates verbose model output ("test FAILED today" matches the
    /// key "FAILED") without requiring exact-format compliance.
    pub fn resolve(
        &self,
        context: &Vars,
    ) -> &str {
        let value = context.get_str(&self.source_var).unwrap_or_default();
        let normalized = value.trim().to_uppercase();

        for (key, target) in &self.branches {
            if normalized.contains(&key.trim().to_uppercase()) {
                return target;
            }
        }
        &self.default
    }
}

/// Routing rule attached to a node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowRule {
    Sequence(SequenceFlow),
    Branch(BranchFlow),
}

impl FlowRule {
    /// create a sequence rule
    pub fn sequence(next: impl Into<NodeName>) -> Self {
        Self::Sequence(SequenceFlow {
            next: next.into(),
        })
    }
}

#[derive(Deserialize)]
struct RawFlowRule {
    #[serde(rename = "type")]
    kind: Option<String>,
    next: Option<NodeName>,
    source_var: Option<String>,
    branches: Option<IndexMap<String, NodeName>>,
    default: Option<NodeName>,
}

impl<'de> Deserialize<'de> for FlowRule {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = RawFlowRule::deserialize(deserializer)?;

        match raw.kind.as_deref() {
            Some("branch") => {
                let source_var = raw.source_var.ok_or_else(|| de::Error::custom("branch flow requires 'source_var'"))?;
                let branches = raw.branches.ok_or_else(|| de::Error::custom("branch flow requires 'branches'"))?;
                Ok(FlowRule::Branch(BranchFlow {
                    source_var,
                    branches,
                    default: raw.default.unwrap_or_else(|| END_NODE.to_string()),
                }))
            }
            Some("sequence") | None => {
                let next = raw.next.ok_or_else(|| de::Error::custom("sequence flow requires 'next'"))?;
                Ok(FlowRule::Sequence(SequenceFlow {
                    next,
                }))
            }
            Some(other) => Err(de::Error::custom(format!("unknown flow rule type: {}", other))),
        }
    }
}

impl Serialize for FlowRule {
    fn serialize<S>(
        &self,
        serializer: S,
    ) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        #[derive(Serialize)]
        struct SequenceWire<'a> {
            next: &'a str,
        }

        #[derive(Serialize)]
        struct BranchWire<'a> {
            #[serde(rename = "type")]
            kind: &'static str,
            source_var: &'a str,
            branches: &'a IndexMap<String, NodeName>,
            default: &'a str,
        }

        match self {
            FlowRule::Sequence(seq) => SequenceWire {
                next: &seq.next,
            }
            .serialize(serializer),
            FlowRule::Branch(branch) => BranchWire {
                kind: "branch",
                source_var: &branch.source_var,
                branches: &branch.branches,
                default: &branch.default,
            }
            .serialize(serializer),
        }
    }
}
