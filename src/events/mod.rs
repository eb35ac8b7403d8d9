//! Event types for graph execution and evolution.
//!
//! The executor and the evolution controller narrate progress through an
//! injected [`EventSink`] instead of printing, so both stay side-effect
//! free and independently testable. [`NullSink`] discards everything;
//! [`TracingSink`] forwards to the `tracing` subscriber.

mod evolution;
mod run;

pub use evolution::*;
pub use run::*;

use tracing::{debug, info, warn};

/// Observer for structured engine events.
///
/// Both methods default to no-ops so implementations can subscribe to one
/// side only. Sinks may be called from concurrent evaluation runs and must
/// be thread safe.
pub trait EventSink: Send + Sync {
    /// Called for every event of one execution run.
    fn on_run(
        &self,
        run_id: &str,
        event: &RunEvent,
    ) {
        let _ = (run_id, event);
    }

    /// Called for every event of the evolution loop.
    fn on_evolution(
        &self,
        event: &EvolutionEvent,
    ) {
        let _ = event;
    }
}

/// Sink that discards all events.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl EventSink for NullSink {}

/// Sink that forwards events to the `tracing` subscriber.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn on_run(
        &self,
        run_id: &str,
        event: &RunEvent,
    ) {
        match event {
            RunEvent::NodeStarted {
                node,
            } => debug!(run_id, %node, "node started"),
            RunEvent::NodeCompleted {
                node,
            } => debug!(run_id, %node, "node completed"),
            RunEvent::NodeFailed {
                node,
                error,
            } => warn!(run_id, %node, %error, "node failed"),
            RunEvent::Finished {
                status,
            } => debug!(run_id, status = status.label(), "run finished"),
        }
    }

    fn on_evolution(
        &self,
        event: &EvolutionEvent,
    ) {
        match event {
            EvolutionEvent::GenerationStarted {
                generation,
            } => info!(generation, "generation started"),
            EvolutionEvent::InnerLoopFallback {
                generation,
                reason,
            } => warn!(generation, %reason, "inner loop failed, keeping unoptimized agent"),
            EvolutionEvent::Evaluated {
                generation,
                score,
                failures,
            } => info!(generation, score, failures, "generation evaluated"),
            EvolutionEvent::TargetReached {
                generation,
                score,
            } => info!(generation, score, "target score reached"),
            EvolutionEvent::MutationAccepted {
                generation,
                rationale,
            } => info!(generation, %rationale, "architecture mutation accepted"),
            EvolutionEvent::MutationRejected {
                generation,
                error,
            } => warn!(generation, %error, "architecture mutation rejected"),
            EvolutionEvent::Finished {
                generations,
            } => info!(generations, "evolution finished"),
        }
    }
}
