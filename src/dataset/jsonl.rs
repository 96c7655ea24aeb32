// JSONL-backed dataset

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::fs;
use std::path::Path;

use super::evaluator::{outputs_match, ProcessEvaluator};
use super::{Dataset, Problem, SampleIo, TestVerdict, STDIO_CONVENTION};
use crate::config::EvaluatorConfig;

/// Problems read from a JSON Lines file, one object per line
pub struct JsonlDataset {
    problems: Vec<Problem>,
    evaluator: ProcessEvaluator,
    stdio: bool,
}

impl JsonlDataset {
    pub fn load(path: &Path, config: &EvaluatorConfig) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read problems from {}", path.display()))?;
        let problems = parse_problems(&contents)
            .with_context(|| format!("Invalid problem file {}", path.display()))?;

        tracing::info!("Loaded {} problem(s) from {}", problems.len(), path.display());

        Ok(Self::from_problems(problems, config))
    }

    pub fn from_problems(problems: Vec<Problem>, config: &EvaluatorConfig) -> Self {
        Self {
            problems,
            evaluator: ProcessEvaluator::new(config),
            stdio: config.stdio,
        }
    }

    pub fn problems(&self) -> &[Problem] {
        &self.problems
    }

    async fn run_cases(&self, code: &str, language: &str, cases: &[&SampleIo]) -> TestVerdict {
        let mut passed_log = String::new();
        let mut failed_log = String::new();

        for sample in cases {
            let SampleIo::Case { input, .. } = sample else {
                continue;
            };
            let expected = sample.expected();

            match self.evaluator.run(language, code, Some(input.as_str())).await {
                Ok(output) if output.success() && outputs_match(&output.stdout, expected) => {
                    passed_log.push_str(&format!("Input:\n{}\nOutput:\n{}\n", input, expected));
                }
                Ok(output) => {
                    failed_log.push_str(&format!(
                        "Input:\n{}\nExpected output:\n{}\nYour output:\n{}\n",
                        input, expected, output.stdout
                    ));
                    if !output.stderr.trim().is_empty() {
                        failed_log.push_str(&format!("Error:\n{}\n", output.stderr.trim_end()));
                    }
                }
                Err(e) => {
                    failed_log.push_str(&format!("Input:\n{}\nCould not run: {:#}\n", input, e));
                }
            }
        }

        verdict(passed_log, failed_log)
    }

    async fn run_asserts(&self, code: &str, language: &str, asserts: &[&str]) -> TestVerdict {
        let program = format!("{}\n\n{}\n", code, asserts.join("\n"));
        let listing = asserts.join("\n");

        match self.evaluator.run(language, &program, None).await {
            Ok(output) if output.success() => verdict(listing, String::new()),
            Ok(output) => verdict(
                String::new(),
                format!("{}\nError:\n{}\n", listing, output.stderr.trim_end()),
            ),
            Err(e) => verdict(String::new(), format!("{}\nCould not run: {:#}\n", listing, e)),
        }
    }
}

fn verdict(passed_log: String, failed_log: String) -> TestVerdict {
    let log = format!(
        "Tests passed:\n{}\n\nTests failed:\n{}",
        passed_log.trim_end(),
        failed_log.trim_end()
    );
    if failed_log.is_empty() {
        TestVerdict::pass(log)
    } else {
        TestVerdict::fail(log)
    }
}

fn parse_problems(contents: &str) -> Result<Vec<Problem>> {
    contents
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(idx, line)| {
            serde_json::from_str(line).with_context(|| format!("line {}", idx + 1))
        })
        .collect()
}

#[async_trait]
impl Dataset for JsonlDataset {
    fn prompt(&self, problem: &Problem) -> String {
        problem.prompt.clone()
    }

    async fn evaluate_sample_io(
        &self,
        problem: &Problem,
        code: &str,
        language: &str,
    ) -> TestVerdict {
        if problem.sample_io.is_empty() {
            return TestVerdict::pass("No sample tests");
        }

        let asserts: Vec<&str> = problem
            .sample_io
            .iter()
            .filter_map(|s| match s {
                SampleIo::Text(text) => Some(text.as_str()),
                SampleIo::Case { .. } => None,
            })
            .collect();
        let cases: Vec<&SampleIo> = problem
            .sample_io
            .iter()
            .filter(|s| matches!(s, SampleIo::Case { .. }))
            .collect();

        let mut verdicts = Vec::new();
        if !asserts.is_empty() {
            verdicts.push(self.run_asserts(code, language, &asserts).await);
        }
        if !cases.is_empty() {
            verdicts.push(self.run_cases(code, language, &cases).await);
        }

        let passed = verdicts.iter().all(|v| v.passed);
        let log = verdicts
            .into_iter()
            .map(|v| v.log)
            .collect::<Vec<_>>()
            .join("\n\n");

        tracing::debug!("Sample tests for {}: passed={}", problem.id, passed);
        TestVerdict { passed, log }
    }

    fn io_convention(&self) -> Option<&str> {
        self.stdio.then_some(STDIO_CONVENTION)
    }
}
