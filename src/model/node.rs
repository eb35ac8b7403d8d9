//! Node definitions for the agent graph.
//!
//! A node is one unit of LLM work: an execution strategy, an input/output
//! signature, an instruction (system prompt) and an optional tool set.

use serde::{Deserialize, Serialize, de};

/// Unique name of a node within a graph.
pub type NodeName = String;

/// Execution strategy of a node.
///
/// The strategy tells the external node invoker how to turn the node's
/// signature and instruction into a callable prediction.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq, strum::AsRefStr, strum::EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum NodeKind {
    /// Direct prediction without intermediate reasoning.
    #[default]
    Direct,
    /// Chain-of-thought style reasoning before the answer.
    Reasoning,
    /// Reasoning interleaved with tool calls; the only strategy for which
    /// the node's tool set is meaningful.
    ReasoningTools,
}

/// Input/output signature of a node.
///
/// The wire format is the arrow string `"input_a, input_b -> output"`; the
/// structured object form `{"inputs": [...], "outputs": [...]}` is accepted
/// as well. The ambiguity is resolved once, at the serde boundary.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Signature {
    pub inputs: Vec<String>,
    pub outputs: Vec<String>,
}

impl Signature {
    /// Parses the arrow form `"a, b -> c"`.
    ///
    /// Either side may come out empty here; emptiness is reported by the
    /// graph validator so a single parse pass can surface every defect.
    pub fn parse(text: &str) -> Result<Self, String> {
        let Some((lhs, rhs)) = text.split_once("->") else {
            return Err(format!("signature must contain '->', got: {}", text));
        };

        Ok(Self {
            inputs: split_names(lhs),
            outputs: split_names(rhs),
        })
    }

    /// Renders the arrow form.
    pub fn to_arrow(&self) -> String {
        format!("{} -> {}", self.inputs.join(", "), self.outputs.join(", "))
    }
}

fn split_names(side: &str) -> Vec<String> {
    side.split(',').map(|s| s.trim()).filter(|s| !s.is_empty()).map(|s| s.to_string()).collect()
}

impl Serialize for Signature {
    fn serialize<S>(
        &self,
        serializer: S,
    ) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_arrow())
    }
}

impl<'de> Deserialize<'de> for Signature {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawSignature {
            Arrow(String),
            Structured {
                inputs: Vec<String>,
                outputs: Vec<String>,
            },
        }

        match RawSignature::deserialize(deserializer)? {
            RawSignature::Arrow(text) => Signature::parse(&text).map_err(de::Error::custom),
            RawSignature::Structured {
                inputs,
                outputs,
            } => Ok(Signature {
                inputs,
                outputs,
            }),
        }
    }
}

/// Declarative configuration of a single node.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct NodeConfig {
    /// execution strategy
    #[serde(rename = "type")]
    pub kind: NodeKind,
    /// input/output signature
    pub signature: Signature,
    /// system prompt guiding the node
    pub instruction: String,
    /// tool identifiers available to the node (ordered set)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<String>,
}

impl NodeConfig {
    /// Drops duplicate tool identifiers, keeping first occurrence order.
    pub(crate) fn dedup_tools(&mut self) {
        let mut seen = Vec::with_capacity(self.tools.len());
        self.tools.retain(|t| {
            if seen.contains(t) {
                false
            } else {
                seen.push(t.clone());
                true
            }
        });
    }
}
