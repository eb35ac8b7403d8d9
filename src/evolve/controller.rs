//! Dual-loop evolution controller.
//!
//! One generation = instantiate the agent from the active configuration,
//! tune prompts through the inner-loop optimizer (best effort), evaluate
//! through the harness, then either stop (target reached) or ask the
//! architecture mutator for a new topology. The active configuration is
//! only ever replaced by a freshly validated one (build-then-swap); a
//! failed mutation leaves the prior configuration and agent untouched.

use std::sync::Arc;

use async_trait::async_trait;

use crate::{
    Config, EvoflowError, Result,
    events::{EventSink, EvolutionEvent, NullSink},
    evolve::{
        harness::{EvaluationHarness, Example, MetricFn},
        mutator::{ArchitectCollaborator, ArchitectureMutator},
    },
    model::GraphConfig,
    runtime::{GraphAgent, NodeInvoker},
    utils,
};

/// External inner-loop optimizer tuning a runnable's prompts and
/// demonstrations without changing graph topology. Best effort: a failure
/// falls back to the unoptimized agent.
#[async_trait]
pub trait PromptOptimizer: Send + Sync {
    async fn optimize(
        &self,
        agent: &GraphAgent,
        trainset: &[Example],
        metric: &MetricFn,
    ) -> Result<GraphAgent>;
}

/// One entry of the append-only evolution history.
#[derive(Debug, Clone)]
pub struct Generation {
    /// Generation index, strictly increasing.
    pub index: usize,
    /// Snapshot of the configuration this generation ran with.
    pub config: GraphConfig,
    /// Evaluation score of this generation.
    pub score: f64,
    /// Timestamp in milliseconds.
    pub timestamp: i64,
}

/// Final state of an evolution run: always a usable agent/config pair —
/// the success state, the last good state before a failed mutation, or
/// the final generation's state at exhaustion.
pub struct Evolved {
    pub agent: GraphAgent,
    pub config: GraphConfig,
    pub history: Vec<Generation>,
}

/// Orchestrates generations of graph/agent improvement.
pub struct EvolutionController {
    config: GraphConfig,
    trainset: Vec<Example>,
    metric: MetricFn,
    invoker: Arc<dyn NodeInvoker>,
    mutator: ArchitectureMutator,
    optimizer: Option<Arc<dyn PromptOptimizer>>,
    harness: EvaluationHarness,
    settings: Config,
    sink: Arc<dyn EventSink>,
}

impl EvolutionController {
    pub fn new(
        config: GraphConfig,
        trainset: Vec<Example>,
        metric: MetricFn,
        invoker: Arc<dyn NodeInvoker>,
        architect: Arc<dyn ArchitectCollaborator>,
    ) -> Self {
        Self {
            config,
            trainset,
            metric,
            invoker,
            mutator: ArchitectureMutator::new(architect),
            optimizer: None,
            harness: EvaluationHarness::new(),
            settings: Config::default(),
            sink: Arc::new(NullSink),
        }
    }

    pub fn with_optimizer(
        mut self,
        optimizer: Arc<dyn PromptOptimizer>,
    ) -> Self {
        self.optimizer = Some(optimizer);
        self
    }

    pub fn with_settings(
        mut self,
        settings: Config,
    ) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_sink(
        mut self,
        sink: Arc<dyn EventSink>,
    ) -> Self {
        self.sink = sink;
        self
    }

    /// Runs the evolution to completion.
    ///
    /// Terminates with a usable `(agent, config)` pair in every case
    /// except a capability wiring failure, which is fatal. Generations are
    /// strictly sequential: generation N+1's mutation depends on
    /// generation N's diagnosis.
    pub async fn evolve(mut self) -> Result<Evolved> {
        let mut history: Vec<Generation> = Vec::new();
        let mut last_good: Option<GraphAgent> = None;

        for generation in 0..self.settings.max_generations {
            self.sink.on_evolution(&EvolutionEvent::GenerationStarted {
                generation,
            });

            // Stage 1: wiring. The config is already validated; only an
            // external-capability failure can surface here, and it is
            // fatal to the whole evolution.
            let agent = GraphAgent::new(self.config.clone(), self.invoker.clone())?
                .with_max_steps(self.settings.max_steps)
                .with_sink(self.sink.clone());

            // Stage 2: inner loop, serialized before any evaluation run
            // reads the agent's learned state.
            let agent = match &self.optimizer {
                Some(optimizer) => match optimizer.optimize(&agent, &self.trainset, &self.metric).await {
                    Ok(improved) => improved,
                    Err(e) => {
                        self.sink.on_evolution(&EvolutionEvent::InnerLoopFallback {
                            generation,
                            reason: e.to_string(),
                        });
                        agent
                    }
                },
                None => agent,
            };

            // Stage 3: evaluate and record.
            let diagnosis = self.harness.evaluate(&agent, &self.trainset, &self.metric).await;
            self.sink.on_evolution(&EvolutionEvent::Evaluated {
                generation,
                score: diagnosis.score,
                failures: diagnosis.failure_count,
            });

            history.push(Generation {
                index: generation,
                config: self.config.clone(),
                score: diagnosis.score,
                timestamp: utils::time_millis(),
            });
            last_good = Some(agent.clone());

            if diagnosis.score >= self.settings.score_threshold {
                self.sink.on_evolution(&EvolutionEvent::TargetReached {
                    generation,
                    score: diagnosis.score,
                });
                self.sink.on_evolution(&EvolutionEvent::Finished {
                    generations: history.len(),
                });
                return Ok(Evolved {
                    agent,
                    config: self.config,
                    history,
                });
            }

            // Stage 4: outer loop. Swap in the replacement only after it
            // passed full validation; on failure keep the prior state and
            // stop.
            if generation + 1 < self.settings.max_generations {
                match self.mutator.propose(&self.config, &diagnosis).await {
                    Ok((new_config, rationale)) => {
                        self.sink.on_evolution(&EvolutionEvent::MutationAccepted {
                            generation,
                            rationale,
                        });
                        self.config = new_config;
                    }
                    Err(e) => {
                        self.sink.on_evolution(&EvolutionEvent::MutationRejected {
                            generation,
                            error: e.to_string(),
                        });
                        break;
                    }
                }
            }
        }

        self.sink.on_evolution(&EvolutionEvent::Finished {
            generations: history.len(),
        });

        let agent = last_good.ok_or_else(|| EvoflowError::Engine("evolution ran zero generations".to_string()))?;
        Ok(Evolved {
            agent,
            config: self.config,
            history,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        Mutex,
        atomic::{AtomicUsize, Ordering},
    };

    use serde_json::json;

    use super::*;
    use crate::{common::Vars, evolve::mutator::MutationProposal, model::NodeConfig};

    /// Solves correctly only the questions it has "learned".
    struct LookupInvoker {
        known: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl NodeInvoker for LookupInvoker {
        async fn invoke(
            &self,
            _name: &str,
            _node: &NodeConfig,
            inputs: Vars,
        ) -> Result<Vars> {
            let q = inputs.get_str("q").unwrap_or_default();
            let answer = if self.known.lock().unwrap().contains(&q) {
                format!("certainly answer-{}", q)
            } else {
                "unknown".to_string()
            };
            Ok(Vars::from(json!({ "answer": answer })))
        }
    }

    /// Architect whose proposals come from a canned queue.
    struct QueueArchitect {
        proposals: Mutex<Vec<Result<MutationProposal>>>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ArchitectCollaborator for QueueArchitect {
        async fn refine(
            &self,
            _current_dna: &str,
            _diagnosis: &str,
        ) -> Result<MutationProposal> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let mut proposals = self.proposals.lock().unwrap();
            if proposals.is_empty() {
                return Err(EvoflowError::Node("architect exhausted".to_string()));
            }
            proposals.remove(0)
        }
    }

    fn base_config(agent_id: &str) -> GraphConfig {
        GraphConfig::parse(json!({
            "agent_id": agent_id,
            "start_node": "solver",
            "nodes": {
                "solver": { "type": "direct", "signature": "q -> answer", "instruction": "i" }
            },
            "flow": { "solver": { "next": "end" } }
        }))
        .unwrap()
    }

    fn trainset() -> Vec<Example> {
        vec![
            Example::new(Vars::from(json!({"q": "a"})), Vars::from(json!({"answer": "answer-a"}))),
            Example::new(Vars::from(json!({"q": "b"})), Vars::from(json!({"answer": "answer-b"}))),
        ]
    }

    fn contains_metric() -> MetricFn {
        Arc::new(|example: &Example, prediction: &Vars| {
            let expected = example.expected.get_str("answer").unwrap_or_default();
            prediction.get_str("answer").unwrap_or_default().contains(&expected)
        })
    }

    fn settings(max_generations: usize) -> Config {
        Config {
            max_generations,
            ..Config::default()
        }
    }

    #[tokio::test]
    async fn test_threshold_reached_in_first_generation() {
        let invoker = Arc::new(LookupInvoker {
            known: Mutex::new(vec!["a".to_string(), "b".to_string()]),
        });
        let architect = Arc::new(QueueArchitect {
            proposals: Mutex::new(vec![]),
            calls: AtomicUsize::new(0),
        });

        let evolved = EvolutionController::new(base_config("g0"), trainset(), contains_metric(), invoker, architect.clone())
            .with_settings(settings(3))
            .evolve()
            .await
            .unwrap();

        assert_eq!(evolved.history.len(), 1);
        assert_eq!(evolved.history[0].score, 100.0);
        assert_eq!(evolved.config.agent_id, "g0");
        // The architect was never consulted.
        assert_eq!(architect.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_mutation_failure_keeps_last_good_state() {
        let invoker = Arc::new(LookupInvoker {
            known: Mutex::new(vec![]),
        });
        let architect = Arc::new(QueueArchitect {
            proposals: Mutex::new(vec![Ok(MutationProposal {
                config_text: "not json at all".to_string(),
                rationale: "n/a".to_string(),
            })]),
            calls: AtomicUsize::new(0),
        });

        let evolved = EvolutionController::new(base_config("g0"), trainset(), contains_metric(), invoker, architect)
            .with_settings(settings(3))
            .evolve()
            .await
            .unwrap();

        // Evolution stopped after the rejected proposal; the active
        // configuration is untouched.
        assert_eq!(evolved.history.len(), 1);
        assert_eq!(evolved.config.agent_id, "g0");
        assert_eq!(evolved.config, base_config("g0"));
    }

    #[tokio::test]
    async fn test_accepted_mutation_swaps_config_for_next_generation() {
        let invoker = Arc::new(LookupInvoker {
            known: Mutex::new(vec![]),
        });
        let refined = base_config("g1");
        let architect = Arc::new(QueueArchitect {
            proposals: Mutex::new(vec![Ok(MutationProposal {
                config_text: refined.to_json_pretty().unwrap(),
                rationale: "rename".to_string(),
            })]),
            calls: AtomicUsize::new(0),
        });

        let evolved = EvolutionController::new(base_config("g0"), trainset(), contains_metric(), invoker, architect.clone())
            .with_settings(settings(2))
            .evolve()
            .await
            .unwrap();

        assert_eq!(evolved.history.len(), 2);
        assert_eq!(evolved.history[0].config.agent_id, "g0");
        assert_eq!(evolved.history[1].config.agent_id, "g1");
        // Exhaustion returns the final generation's state.
        assert_eq!(evolved.config.agent_id, "g1");
        // No proposal is requested after the last generation.
        assert_eq!(architect.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_schema_violating_proposal_is_rejected_atomically() {
        let invoker = Arc::new(LookupInvoker {
            known: Mutex::new(vec![]),
        });
        let broken = json!({
            "agent_id": "g1",
            "start_node": "ghost",
            "nodes": {
                "solver": { "type": "direct", "signature": "q -> answer", "instruction": "i" }
            },
            "flow": {}
        });
        let architect = Arc::new(QueueArchitect {
            proposals: Mutex::new(vec![Ok(MutationProposal {
                config_text: broken.to_string(),
                rationale: "oops".to_string(),
            })]),
            calls: AtomicUsize::new(0),
        });

        let evolved = EvolutionController::new(base_config("g0"), trainset(), contains_metric(), invoker, architect)
            .with_settings(settings(5))
            .evolve()
            .await
            .unwrap();

        assert_eq!(evolved.config.agent_id, "g0");
        assert_eq!(evolved.history.len(), 1);
    }

    struct TeachingOptimizer {
        invoker: Arc<LookupInvoker>,
    }

    #[async_trait]
    impl PromptOptimizer for TeachingOptimizer {
        async fn optimize(
            &self,
            agent: &GraphAgent,
            trainset: &[Example],
            _metric: &MetricFn,
        ) -> Result<GraphAgent> {
            // Simulates demonstration learning by teaching the invoker
            // the training questions.
            let mut known = self.invoker.known.lock().unwrap();
            for example in trainset {
                if let Some(q) = example.inputs.get_str("q") {
                    known.push(q);
                }
            }
            Ok(agent.clone())
        }
    }

    #[tokio::test]
    async fn test_inner_loop_improves_score() {
        let invoker = Arc::new(LookupInvoker {
            known: Mutex::new(vec![]),
        });
        let architect = Arc::new(QueueArchitect {
            proposals: Mutex::new(vec![]),
            calls: AtomicUsize::new(0),
        });
        let optimizer = Arc::new(TeachingOptimizer {
            invoker: invoker.clone(),
        });

        let evolved = EvolutionController::new(base_config("g0"), trainset(), contains_metric(), invoker, architect)
            .with_settings(settings(3))
            .with_optimizer(optimizer)
            .evolve()
            .await
            .unwrap();

        assert_eq!(evolved.history.len(), 1);
        assert_eq!(evolved.history[0].score, 100.0);
    }

    struct FailingOptimizer;

    #[async_trait]
    impl PromptOptimizer for FailingOptimizer {
        async fn optimize(
            &self,
            _agent: &GraphAgent,
            _trainset: &[Example],
            _metric: &MetricFn,
        ) -> Result<GraphAgent> {
            Err(EvoflowError::Runtime("bootstrap diverged".to_string()))
        }
    }

    #[tokio::test]
    async fn test_optimizer_failure_falls_back_to_unoptimized_agent() {
        let invoker = Arc::new(LookupInvoker {
            known: Mutex::new(vec!["a".to_string(), "b".to_string()]),
        });
        let architect = Arc::new(QueueArchitect {
            proposals: Mutex::new(vec![]),
            calls: AtomicUsize::new(0),
        });

        let evolved = EvolutionController::new(base_config("g0"), trainset(), contains_metric(), invoker, architect)
            .with_settings(settings(1))
            .with_optimizer(Arc::new(FailingOptimizer))
            .evolve()
            .await
            .unwrap();

        // The generation still ran and evaluated with the original agent.
        assert_eq!(evolved.history.len(), 1);
        assert_eq!(evolved.history[0].score, 100.0);
    }

    #[tokio::test]
    async fn test_history_indices_are_strictly_increasing() {
        let invoker = Arc::new(LookupInvoker {
            known: Mutex::new(vec![]),
        });
        let architect = Arc::new(QueueArchitect {
            proposals: Mutex::new(vec![
                Ok(MutationProposal {
                    config_text: base_config("g1").to_json_pretty().unwrap(),
                    rationale: "r1".to_string(),
                }),
                Ok(MutationProposal {
                    config_text: base_config("g2").to_json_pretty().unwrap(),
                    rationale: "r2".to_string(),
                }),
            ]),
            calls: AtomicUsize::new(0),
        });

        let evolved = EvolutionController::new(base_config("g0"), trainset(), contains_metric(), invoker, architect)
            .with_settings(settings(3))
            .evolve()
            .await
            .unwrap();

        let indices: Vec<usize> = evolved.history.iter().map(|g| g.index).collect();
        assert_eq!(indices, vec![0, 1, 2]);
    }
}
