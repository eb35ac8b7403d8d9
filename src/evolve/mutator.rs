//! Outer-loop architecture mutation.
//!
//! The mutator hands the current configuration and the evaluation
//! diagnosis to an external reasoning collaborator (the "architect") and
//! turns its free-text answer into a freshly validated [`GraphConfig`] or
//! a typed [`MutationError`]. No partial or best-effort configuration is
//! ever returned: success means a fully valid replacement, failure means
//! none.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::{
    MutationError, Result,
    evolve::harness::Diagnosis,
    model::GraphConfig,
};

/// External reasoning collaborator that proposes a new graph topology.
#[async_trait]
pub trait ArchitectCollaborator: Send + Sync {
    /// Given the serialized current configuration and the diagnosis
    /// report, returns a proposal: a rationale plus the refined
    /// configuration text, possibly fenced in markdown.
    async fn refine(
        &self,
        current_dna: &str,
        diagnosis: &str,
    ) -> Result<MutationProposal>;
}

/// Raw proposal returned by the architect.
#[derive(Debug, Clone)]
pub struct MutationProposal {
    /// Proposed configuration document, possibly wrapped in a code fence.
    pub config_text: String,
    /// Short explanation of the change.
    pub rationale: String,
}

/// Converts architect output into validated configurations.
pub struct ArchitectureMutator {
    collaborator: Arc<dyn ArchitectCollaborator>,
}

impl ArchitectureMutator {
    pub fn new(collaborator: Arc<dyn ArchitectCollaborator>) -> Self {
        Self {
            collaborator,
        }
    }

    /// Proposes a replacement configuration.
    ///
    /// Steps: serialize the current config, call the collaborator, strip
    /// any surrounding code fence, parse as JSON, re-validate through
    /// [`GraphConfig::parse`]. Returns the validated config together with
    /// the architect's rationale.
    pub async fn propose(
        &self,
        current: &GraphConfig,
        diagnosis: &Diagnosis,
    ) -> std::result::Result<(GraphConfig, String), MutationError> {
        let serialized = current.to_json_pretty().map_err(|e| MutationError::CollaboratorFailure(e.to_string()))?;

        let proposal = self
            .collaborator
            .refine(&serialized, &diagnosis.render())
            .await
            .map_err(|e| MutationError::CollaboratorFailure(e.to_string()))?;

        let cleaned = strip_code_fence(&proposal.config_text);
        let value = serde_json::from_str::<Value>(cleaned).map_err(|e| MutationError::MalformedOutput(e.to_string()))?;

        let config = GraphConfig::parse(value).map_err(|e| MutationError::SchemaViolation(e.to_string()))?;
        Ok((config, proposal.rationale))
    }
}

/// Strips a surrounding markdown code fence (with optional `json` info
/// string) from the collaborator's output.
fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };

    let body = match rest.split_once('\n') {
        Some((_, body)) => body,
        None => rest.strip_prefix("json").unwrap_or(rest),
    };
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}
