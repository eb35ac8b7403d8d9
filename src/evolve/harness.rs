//! Evaluation harness: runs an agent against a labeled example set and
//! produces a score plus a structured failure diagnosis.

use std::{fmt::Write as _, sync::Arc};

use futures::future::join_all;

use crate::{
    common::Vars,
    model::NodeName,
    runtime::GraphAgent,
};

/// Number of failing cases surfaced to the architect. The diagnosis is a
/// bounded sample, not the full failure set.
const MAX_REPORTED_FAILURES: usize = 3;

/// One labeled example: run inputs and the expected output fields.
#[derive(Debug, Clone, PartialEq)]
pub struct Example {
    pub inputs: Vars,
    pub expected: Vars,
}

impl Example {
    pub fn new(
        inputs: Vars,
        expected: Vars,
    ) -> Self {
        Self {
            inputs,
            expected,
        }
    }
}

/// Metric deciding whether a prediction satisfies an example.
pub type MetricFn = Arc<dyn Fn(&Example, &Vars) -> bool + Send + Sync>;

/// One failing case captured for the diagnosis.
#[derive(Debug, Clone)]
pub struct FailureCase {
    pub input: Vars,
    pub expected: Vars,
    /// Produced output, when the run got far enough to produce one.
    pub got: Option<Vars>,
    /// Node path taken, when available.
    pub trace: Vec<NodeName>,
    /// Executor error text for runs that failed outright.
    pub error: Option<String>,
}

/// Structured evaluation report consumed by the outer loop.
#[derive(Debug, Clone)]
pub struct Diagnosis {
    /// Overall score: `100 × correct / total` (0 for an empty set).
    pub score: f64,
    /// Total number of failing cases.
    pub failure_count: usize,
    /// At most the first three failing cases, in example order.
    pub samples: Vec<FailureCase>,
}

impl Diagnosis {
    /// Renders the report as the text fed to the architect collaborator.
    pub fn render(&self) -> String {
        let mut out = format!("Current Score: {:.2}%\nFailure Count: {}\n", self.score, self.failure_count);

        if !self.samples.is_empty() {
            out.push_str("Top 3 Bad Cases:\n");
            let blocks: Vec<String> = self.samples.iter().map(render_case).collect();
            out.push_str(&blocks.join("\n---\n"));
        }
        out
    }
}

fn render_case(case: &FailureCase) -> String {
    let mut block = format!("Input: {}\nExpected: {}", case.input, case.expected);
    match &case.got {
        Some(got) => {
            let _ = write!(block, "\nGot: {}", got);
        }
        None => block.push_str("\nGot: N/A"),
    }
    if !case.trace.is_empty() {
        let _ = write!(block, "\nPath: {}", case.trace.join(" -> "));
    }
    if let Some(error) = &case.error {
        let _ = write!(block, "\nRuntime Error: {}", error);
    }
    block
}

/// Runs an agent over an example set.
///
/// Runs fan out across tokio tasks — contexts are isolated per run and the
/// agent's learned state is read-only during evaluation, so evaluation
/// within one generation may execute in parallel. Result order follows the
/// example order regardless of completion order.
#[derive(Debug, Clone, Default)]
pub struct EvaluationHarness;

impl EvaluationHarness {
    pub fn new() -> Self {
        Self
    }

    /// Evaluates the agent, producing the score and failure diagnosis.
    ///
    /// An executor-reported failure (execution or routing error) counts as
    /// a failing case recording the error text; otherwise the metric
    /// decides.
    pub async fn evaluate(
        &self,
        agent: &GraphAgent,
        examples: &[Example],
        metric: &MetricFn,
    ) -> Diagnosis {
        let mut handles = Vec::with_capacity(examples.len());
        for example in examples {
            let agent = agent.clone();
            let inputs = example.inputs.clone();
            handles.push(tokio::spawn(async move { agent.run(inputs).await }));
        }
        let outcomes = join_all(handles).await;

        let total = examples.len();
        let mut correct = 0usize;
        let mut failures = Vec::new();

        for (example, joined) in examples.iter().zip(outcomes) {
            match joined {
                Ok(outcome) if outcome.status.is_success() => {
                    if metric(example, &outcome.context) {
                        correct += 1;
                    } else {
                        failures.push(FailureCase {
                            input: example.inputs.clone(),
                            expected: example.expected.clone(),
                            got: Some(outcome.context),
                            trace: outcome.trace,
                            error: None,
                        });
                    }
                }
                Ok(outcome) => failures.push(FailureCase {
                    input: example.inputs.clone(),
                    expected: example.expected.clone(),
                    got: Some(outcome.context),
                    trace: outcome.trace,
                    error: outcome.status.error_text(),
                }),
                Err(e) => failures.push(FailureCase {
                    input: example.inputs.clone(),
                    expected: example.expected.clone(),
                    got: None,
                    trace: Vec::new(),
                    error: Some(format!("Runtime Error: {}", e)),
                }),
            }
        }

        let score = if total > 0 {
            (correct as f64 / total as f64) * 100.0
        } else {
            0.0
        };
        let failure_count = failures.len();
        failures.truncate(MAX_REPORTED_FAILURES);

        Diagnosis {
            score,
            failure_count,
            samples: failures,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use async_trait::async_trait;
    use serde_json::json;

    use super::*;
    use crate::{EvoflowError, Result, model::{GraphConfig, NodeConfig}};

    /// Answers with the value of the "q" input, or fails for inputs
    /// listed in `fail_on`.
    struct EchoInvoker {
        answers: HashMap<String, String>,
        fail_on: Vec<String>,
    }

    #[async_trait]
    impl crate::runtime::NodeInvoker for EchoInvoker {
        async fn invoke(
            &self,
            _name: &str,
            _node: &NodeConfig,
            inputs: Vars,
        ) -> Result<Vars> {
            let q = inputs.get_str("q").unwrap_or_default();
            if self.fail_on.contains(&q) {
                return Err(EvoflowError::Node("model unavailable".to_string()));
            }
            let answer = self.answers.get(&q).cloned().unwrap_or_default();
            Ok(Vars::from(json!({ "answer": answer })))
        }
    }

    fn agent(invoker: EchoInvoker) -> GraphAgent {
        let config = GraphConfig::parse(json!({
            "agent_id": "t",
            "start_node": "solver",
            "nodes": {
                "solver": { "type": "direct", "signature": "q -> answer", "instruction": "i" }
            },
            "flow": { "solver": { "next": "end" } }
        }))
        .unwrap();
        GraphAgent::new(config, std::sync::Arc::new(invoker)).unwrap()
    }

    fn example(q: &str, answer: &str) -> Example {
        Example::new(Vars::from(json!({ "q": q })), Vars::from(json!({ "answer": answer })))
    }

    fn exact_metric() -> MetricFn {
        Arc::new(|example: &Example, prediction: &Vars| example.expected.get_str("answer") == prediction.get_str("answer"))
    }

    #[tokio::test]
    async fn test_two_of_three_scores_two_thirds() {
        let agent = agent(EchoInvoker {
            answers: HashMap::from([
                ("a".to_string(), "1".to_string()),
                ("b".to_string(), "2".to_string()),
                ("c".to_string(), "wrong".to_string()),
            ]),
            fail_on: vec![],
        });
        let examples = vec![example("a", "1"), example("b", "2"), example("c", "3")];

        let diagnosis = EvaluationHarness::new().evaluate(&agent, &examples, &exact_metric()).await;

        assert!((diagnosis.score - 66.66666666666667).abs() < 1e-9);
        assert_eq!(diagnosis.failure_count, 1);
        assert_eq!(diagnosis.samples.len(), 1);
        assert_eq!(diagnosis.samples[0].trace, vec!["solver"]);
    }

    #[tokio::test]
    async fn test_executor_failure_is_a_failing_case() {
        let agent = agent(EchoInvoker {
            answers: HashMap::new(),
            fail_on: vec!["a".to_string()],
        });
        let examples = vec![example("a", "1")];

        let diagnosis = EvaluationHarness::new().evaluate(&agent, &examples, &exact_metric()).await;

        assert_eq!(diagnosis.score, 0.0);
        let error = diagnosis.samples[0].error.as_deref().unwrap();
        assert!(error.contains("model unavailable"));
    }

    #[tokio::test]
    async fn test_samples_are_bounded_to_first_three() {
        let agent = agent(EchoInvoker {
            answers: HashMap::new(),
            fail_on: vec![],
        });
        let examples: Vec<Example> = (0..5).map(|i| example(&format!("q{}", i), "right")).collect();

        let diagnosis = EvaluationHarness::new().evaluate(&agent, &examples, &exact_metric()).await;

        assert_eq!(diagnosis.failure_count, 5);
        assert_eq!(diagnosis.samples.len(), 3);
        // First failures in example order, not completion order.
        assert_eq!(diagnosis.samples[0].input.get_str("q").as_deref(), Some("q0"));
        assert_eq!(diagnosis.samples[2].input.get_str("q").as_deref(), Some("q2"));
    }

    #[tokio::test]
    async fn test_empty_example_set_scores_zero() {
        let agent = agent(EchoInvoker {
            answers: HashMap::new(),
            fail_on: vec![],
        });
        let diagnosis = EvaluationHarness::new().evaluate(&agent, &[], &exact_metric()).await;
        assert_eq!(diagnosis.score, 0.0);
        assert_eq!(diagnosis.failure_count, 0);
    }

    #[test]
    fn test_render_layout() {
        let diagnosis = Diagnosis {
            score: 50.0,
            failure_count: 1,
            samples: vec![FailureCase {
                input: Vars::from(json!({"q": "a"})),
                expected: Vars::from(json!({"answer": "1"})),
                got: Some(Vars::from(json!({"answer": "2"}))),
                trace: vec!["solver".to_string(), "critic".to_string()],
                error: None,
            }],
        };

        let text = diagnosis.render();
        assert!(text.starts_with("Current Score: 50.00%\nFailure Count: 1\n"));
        assert!(text.contains("Top 3 Bad Cases:"));
        assert!(text.contains("Path: solver -> critic"));
    }
}
