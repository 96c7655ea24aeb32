// Scripted provider and dataset for solver tests

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Mutex;

use blueprint::dataset::{Dataset, Problem, SampleIo, TestVerdict};
use blueprint::providers::{
    Completion, CompletionRequest, LlmProvider, ProviderError, RetryPolicy, Usage,
};

/// Answers each stage's prompt with canned output.
///
/// Plans are labelled `PLAN-<n>` in exemplar order. Code for plan n starts
/// as `CODE-<n>-0`; each repair bumps the revision.
pub struct ScriptedProvider {
    pub exemplars: usize,
    /// Confidence returned by the n-th verification call
    pub confidences: Vec<u8>,
    /// Drop the closing `</root>` from the retrieval answer
    pub truncate_retrieval: bool,
    /// Fail the retrieval call
    pub fail_retrieval: bool,
    /// Answer verification in untagged prose
    pub prose_verification: bool,
    pub log: Mutex<Vec<(String, String)>>,
    state: Mutex<State>,
}

#[derive(Default)]
struct State {
    plans: usize,
    verifications: usize,
    revisions: std::collections::HashMap<usize, usize>,
}

impl ScriptedProvider {
    pub fn new(exemplars: usize, confidences: Vec<u8>) -> Self {
        Self {
            exemplars,
            confidences,
            truncate_retrieval: false,
            fail_retrieval: false,
            prose_verification: false,
            log: Mutex::new(Vec::new()),
            state: Mutex::new(State::default()),
        }
    }

    /// Stages called, in order
    pub fn stages(&self) -> Vec<String> {
        self.log
            .lock()
            .unwrap()
            .iter()
            .map(|(stage, _)| stage.clone())
            .collect()
    }

    pub fn count(&self, stage: &str) -> usize {
        self.stages().iter().filter(|s| *s == stage).count()
    }

    pub fn prompts(&self, stage: &str) -> Vec<String> {
        self.log
            .lock()
            .unwrap()
            .iter()
            .filter(|(s, _)| s == stage)
            .map(|(_, p)| p.clone())
            .collect()
    }

    fn retrieval(&self) -> String {
        let mut out = String::from("<root>\n");
        for n in 1..=self.exemplars {
            out.push_str(&format!(
                "<problem>\n<description>Exemplar {n}</description>\n<code>x = {n} < {m}</code>\n\
                 <techniques>loops</techniques>\n<planning>step {n}</planning>\n</problem>\n",
                n = n,
                m = n + 1
            ));
        }
        out.push_str("<algorithm>Greedy & sorting</algorithm>\n");
        out.push_str("<learned_techniques>Use early exits</learned_techniques>\n");
        if !self.truncate_retrieval {
            out.push_str("</root>");
        }
        out
    }
}

fn plan_number(prompt: &str) -> usize {
    let start = prompt.find("PLAN-").expect("prompt names a plan") + "PLAN-".len();
    prompt[start..]
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect::<String>()
        .parse()
        .expect("plan number")
}

#[async_trait]
impl LlmProvider for ScriptedProvider {
    async fn complete_once(
        &self,
        request: &CompletionRequest,
    ) -> Result<Completion, ProviderError> {
        let prompt = request.messages[0].content.clone();

        let (stage, text) = if prompt.starts_with("Given a problem, recall") {
            if self.fail_retrieval {
                return Err(ProviderError::Api {
                    status: 400,
                    body: "bad request".into(),
                });
            }
            ("retrieval", self.retrieval())
        } else if prompt.starts_with("Given a competitive programming problem") {
            let mut state = self.state.lock().unwrap();
            state.plans += 1;
            ("planning", format!("PLAN-{}: do the thing", state.plans))
        } else if prompt.starts_with("Assess the plan") {
            let mut state = self.state.lock().unwrap();
            let confidence = self.confidences.get(state.verifications).copied().unwrap_or(50);
            state.verifications += 1;
            let answer = if self.prose_verification {
                format!("The plan covers the edge cases. Confidence: {}", confidence)
            } else {
                format!(
                    "<root>\n<analysis>Looks fine for n < 10</analysis>\n<confidence>{}</confidence>\n</root>",
                    confidence
                )
            };
            ("verification", answer)
        } else if prompt.starts_with("Write ") {
            let n = plan_number(&prompt);
            ("coding", format!("```python\nCODE-{}-0\n```", n))
        } else if prompt.starts_with("You wrote") {
            let n = plan_number(&prompt);
            let mut state = self.state.lock().unwrap();
            let revision = state.revisions.entry(n).or_insert(0);
            *revision += 1;
            (
                "repair",
                format!("PLAN-{} revised\n```python\nCODE-{}-{}\n```", n, n, revision),
            )
        } else {
            panic!("unexpected prompt: {}", prompt);
        };

        self.log
            .lock()
            .unwrap()
            .push((stage.to_string(), prompt));

        Ok(Completion {
            text,
            usage: Usage {
                prompt_tokens: 10,
                completion_tokens: 5,
            },
        })
    }

    fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::none()
    }

    fn name(&self) -> &str {
        "scripted"
    }

    fn model(&self) -> &str {
        "scripted-model"
    }
}

/// Passes exactly the listed code strings and records every evaluation.
pub struct ScriptedDataset {
    passing: HashSet<String>,
    pub evaluated: Mutex<Vec<String>>,
    pub stdio: bool,
}

impl ScriptedDataset {
    pub fn passing(codes: &[&str]) -> Self {
        Self {
            passing: codes.iter().map(|c| c.to_string()).collect(),
            evaluated: Mutex::new(Vec::new()),
            stdio: false,
        }
    }

    pub fn evaluated(&self) -> Vec<String> {
        self.evaluated.lock().unwrap().clone()
    }
}

#[async_trait]
impl Dataset for ScriptedDataset {
    fn prompt(&self, problem: &Problem) -> String {
        problem.prompt.clone()
    }

    async fn evaluate_sample_io(
        &self,
        _problem: &Problem,
        code: &str,
        _language: &str,
    ) -> TestVerdict {
        self.evaluated.lock().unwrap().push(code.to_string());
        if self.passing.contains(code) {
            TestVerdict::pass("all passed")
        } else {
            TestVerdict::fail(format!("Tests failed:\n{} printed the wrong answer", code))
        }
    }

    fn io_convention(&self) -> Option<&str> {
        self.stdio.then_some("Read from stdin.")
    }
}

pub fn problem(id: &str) -> Problem {
    Problem {
        id: id.to_string(),
        prompt: format!("Problem {}: add two numbers", id),
        sample_io: vec![SampleIo::Case {
            input: "1 2".into(),
            output: vec!["3".into()],
        }],
    }
}
