/// Events emitted by the evolution controller, one generation at a time.
#[derive(Debug, Clone)]
pub enum EvolutionEvent {
    GenerationStarted {
        generation: usize,
    },
    /// The inner-loop optimizer failed; the generation continues with the
    /// unoptimized agent (warning, not fatal).
    InnerLoopFallback {
        generation: usize,
        reason: String,
    },
    Evaluated {
        generation: usize,
        score: f64,
        failures: usize,
    },
    TargetReached {
        generation: usize,
        score: f64,
    },
    MutationAccepted {
        generation: usize,
        rationale: String,
    },
    /// The proposal failed to parse or validate; evolution stops with the
    /// last validated good state.
    MutationRejected {
        generation: usize,
        error: String,
    },
    Finished {
        generations: usize,
    },
}
