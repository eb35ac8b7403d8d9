//! # Evoflow
//!
//! Evoflow is a lightweight, self-evolving LLM agent graph engine written in Rust.
//! A declarative configuration (the agent "DNA") describes named processing
//! nodes and the routing rules between them; the execution engine walks the
//! graph against an accumulating variable context; the evolution controller
//! alternates between tuning node prompts (inner loop) and rewriting graph
//! topology (outer loop) from evaluation feedback.
//!
//! ## Core Features
//!
//! - **Validated Graph DNA**: configurations are parsed and exhaustively
//!   validated in one pass; no partially-valid graph is ever observable
//! - **Bounded Execution**: cycles are an intended pattern (self-revision
//!   loops); the per-run step bound is the sole termination guarantee
//! - **Dual-Loop Evolution**: prompt optimization and architecture mutation
//!   with atomic build-then-swap configuration replacement and rollback
//! - **Pluggable Collaborators**: node invocation, the prompt optimizer and
//!   the architect are injected async traits; no model transport lives here
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use evoflow::{EvolutionController, GraphAgent, GraphConfig, Vars};
//!
//! let config = GraphConfig::from_json(json_str)?;
//! let agent = GraphAgent::new(config.clone(), invoker.clone())?;
//! let outcome = agent.run(Vars::from(serde_json::json!({"question": "..."}))).await;
//!
//! // Evolve the agent against a labeled trainset
//! let evolved = EvolutionController::new(config, trainset, metric, invoker, architect)
//!     .evolve()
//!     .await?;
//! evolved.config.save_to("best_agent_dna.json")?;
//! ```

mod common;
mod config;
mod error;
mod events;
mod evolve;
mod model;
mod runtime;
mod utils;

pub use common::Vars;
pub use config::Config;
pub use error::{EvoflowError, MutationError};
pub use events::{EventSink, EvolutionEvent, NullSink, RunEvent, TracingSink};
pub use evolve::{
    ArchitectCollaborator, ArchitectureMutator, Diagnosis, EvaluationHarness, EvolutionController, Evolved, Example, FailureCase, Generation,
    MetricFn, MutationProposal, PromptOptimizer,
};
pub use model::*;
pub use runtime::{DEFAULT_MAX_STEPS, GraphAgent, GraphExecutor, NodeInvoker, RunOutcome, RunStatus};

/// Result type alias for Evoflow operations.
pub type Result<T> = std::result::Result<T, EvoflowError>;
