//! Dual-loop evolutionary optimization.
//!
//! The outer loop rewrites graph topology through an external reasoning
//! collaborator; the inner loop tunes node prompts/demonstrations through
//! an external optimizer. Evaluation feedback from the harness drives
//! both.

mod controller;
mod harness;
mod mutator;

pub use controller::{EvolutionController, Evolved, Generation, PromptOptimizer};
pub use harness::{Diagnosis, EvaluationHarness, Example, FailureCase, MetricFn};
pub use mutator::{ArchitectCollaborator, ArchitectureMutator, MutationProposal};
