//! Declarative agent graph configuration ("agent DNA").
//!
//! A [`GraphConfig`] is constructed once from a declarative JSON document
//! and fully validated at construction time: [`GraphConfig::parse`] either
//! yields a config satisfying every graph invariant or fails with a schema
//! error listing every violation found. Instances are treated as immutable
//! afterwards; an outer-loop mutation produces an entirely new,
//! independently re-validated instance.

use std::{fs, path::Path};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    EvoflowError, Result,
    model::{
        flow::FlowRule,
        node::{NodeConfig, NodeName},
    },
};

/// Reserved terminal sentinel: a flow target of `"end"` halts the run.
pub const END_NODE: &str = "end";

/// Configuration version, string or integer on the wire.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(untagged)]
pub enum Version {
    Number(i64),
    Text(String),
}

impl Default for Version {
    fn default() -> Self {
        Version::Number(1)
    }
}

/// Complete declarative description of an agent graph.
///
/// Mapping order is preserved everywhere: node declaration order in
/// `nodes`, rule order in `flow`, and match priority inside branch rules.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct GraphConfig {
    /// opaque agent identifier
    pub agent_id: String,
    /// configuration version
    #[serde(default)]
    pub version: Version,
    /// node the run starts at
    pub start_node: NodeName,
    /// node name to node definition
    pub nodes: IndexMap<NodeName, NodeConfig>,
    /// node name to routing rule; a node absent here is implicitly terminal
    pub flow: IndexMap<NodeName, FlowRule>,
}

impl GraphConfig {
    /// JSON Schema for the structural shape of the document.
    pub fn schema() -> Value {
        serde_json::json!({
            "type": "object",
            "required": ["agent_id", "start_node", "nodes", "flow"],
            "properties": {
                "agent_id": { "type": "string" },
                "version": { "type": ["string", "integer"] },
                "start_node": { "type": "string" },
                "nodes": {
                    "type": "object",
                    "additionalProperties": { "type": "object" }
                },
                "flow": {
                    "type": "object",
                    "additionalProperties": { "type": "object" }
                }
            }
        })
    }

    /// Parses and fully validates a declarative document.
    ///
    /// Validation is exhaustive: structural problems, malformed
    /// signatures, an unresolved start node and dangling flow targets are
    /// all collected before failing, so a single parse pass surfaces every
    /// defect. This matters because LLM-authored configurations are
    /// re-validated through this path and the architect needs to see all
    /// problems, not just the first.
    pub fn parse(value: Value) -> Result<Self> {
        let schema = Self::schema();
        let validator = jsonschema::validator_for(&schema).map_err(|e| EvoflowError::Schema(e.to_string()))?;

        let structural: Vec<String> = validator.iter_errors(&value).map(|e| format!("{} at '{}'", e, e.instance_path())).collect();
        if !structural.is_empty() {
            return Err(EvoflowError::Schema(structural.join("; ")));
        }

        let mut config = serde_json::from_value::<GraphConfig>(value).map_err(|e| EvoflowError::Schema(e.to_string()))?;
        for node in config.nodes.values_mut() {
            node.dedup_tools();
        }

        config.validate()?;
        Ok(config)
    }

    /// parse from a JSON string
    pub fn from_json(text: &str) -> Result<Self> {
        let value = serde_json::from_str::<Value>(text).map_err(|e| EvoflowError::Schema(format!("invalid JSON: {}", e)))?;
        Self::parse(value)
    }

    /// Checks graph integrity, reporting every violation at once.
    ///
    /// Checked, in order: each node's signature names at least one input
    /// and one output; `start_node` resolves to a defined node or `"end"`;
    /// every flow target (sequence next, each branch value, default)
    /// resolves to a defined node or `"end"`.
    pub fn validate(&self) -> Result<()> {
        let mut violations = Vec::new();
        let resolves = |target: &str| self.nodes.contains_key(target) || target == END_NODE;

        for (name, node) in &self.nodes {
            if node.signature.inputs.is_empty() {
                violations.push(format!("node '{}': signature declares no inputs", name));
            }
            if node.signature.outputs.is_empty() {
                violations.push(format!("node '{}': signature declares no outputs", name));
            }
        }

        if !resolves(&self.start_node) {
            violations.push(format!("start node '{}' is not defined in 'nodes'", self.start_node));
        }

        for (name, rule) in &self.flow {
            match rule {
                FlowRule::Sequence(seq) => {
                    if !resolves(&seq.next) {
                        violations.push(format!("node '{}' points to undefined node '{}'", name, seq.next));
                    }
                }
                FlowRule::Branch(branch) => {
                    for (key, target) in &branch.branches {
                        if !resolves(target) {
                            violations.push(format!("node '{}' branch '{}' points to undefined node '{}'", name, key, target));
                        }
                    }
                    if !resolves(&branch.default) {
                        violations.push(format!("node '{}' default branch points to undefined node '{}'", name, branch.default));
                    }
                }
            }
        }

        if violations.is_empty() {
            Ok(())
        } else {
            Err(EvoflowError::Schema(violations.join("; ")))
        }
    }

    /// look up a node by name
    pub fn node(
        &self,
        name: &str,
    ) -> Option<&NodeConfig> {
        self.nodes.get(name)
    }

    /// look up the flow rule for a node
    pub fn rule(
        &self,
        name: &str,
    ) -> Option<&FlowRule> {
        self.flow.get(name)
    }

    /// serialize to pretty-printed JSON
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Writes the configuration as pretty-printed JSON, the same
    /// declarative form `parse` accepts.
    pub fn save_to<T: AsRef<Path>>(
        &self,
        path: T,
    ) -> Result<()> {
        fs::write(path.as_ref(), self.to_json_pretty()?)?;
        Ok(())
    }
}
