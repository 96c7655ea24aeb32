// Problem dataset
//
// Problems, their sample tests, and the `Dataset` trait the solver uses to
// build prompts and check candidate programs.

pub mod evaluator;
pub mod jsonl;

pub use evaluator::{ProcessEvaluator, RunOutput};
pub use jsonl::JsonlDataset;

use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize};

/// Appended to code-generation and repair prompts for stdin/stdout problems.
pub const STDIO_CONVENTION: &str = "## Note: Strictly follow the input and output format. \
Take input from stdin and output to stdout. If writing a function, after the function \
definition, take input using `input()`, call the function, and print the result. \
Avoid extra print statements.";

/// One programming problem
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Problem {
    #[serde(alias = "task_id", deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(alias = "description")]
    pub prompt: String,
    #[serde(default)]
    pub sample_io: Vec<SampleIo>,
}

/// A sample test: an assert-style line, or an stdin/stdout record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SampleIo {
    Case {
        input: String,
        #[serde(deserialize_with = "one_or_many")]
        output: Vec<String>,
    },
    Text(String),
}

impl SampleIo {
    /// First expected output of a record; empty for text samples.
    pub fn expected(&self) -> &str {
        match self {
            SampleIo::Case { output, .. } => output.first().map(String::as_str).unwrap_or(""),
            SampleIo::Text(_) => "",
        }
    }
}

/// Outcome of running a candidate against the sample tests
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestVerdict {
    pub passed: bool,
    pub log: String,
}

impl TestVerdict {
    pub fn pass(log: impl Into<String>) -> Self {
        Self {
            passed: true,
            log: log.into(),
        }
    }

    pub fn fail(log: impl Into<String>) -> Self {
        Self {
            passed: false,
            log: log.into(),
        }
    }
}

#[async_trait]
pub trait Dataset: Send + Sync {
    /// Problem text as shown to the model
    fn prompt(&self, problem: &Problem) -> String;

    /// Run `code` against the problem's sample tests. Execution failures
    /// are reported as failing verdicts.
    async fn evaluate_sample_io(&self, problem: &Problem, code: &str, language: &str)
        -> TestVerdict;

    /// Extra instruction about program I/O, if this dataset has one
    fn io_convention(&self) -> Option<&str> {
        None
    }
}

/// Render sample tests for inclusion in a prompt.
pub fn render_sample_io(samples: &[SampleIo]) -> String {
    samples
        .iter()
        .map(|sample| match sample {
            SampleIo::Text(text) => text.clone(),
            SampleIo::Case { input, .. } => {
                format!("Input:\n{}\nExpected output:\n{}", input, sample.expected())
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(s) => vec![s],
        OneOrMany::Many(v) => v,
    })
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number id, got {}",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_problem_aliases() {
        let problem: Problem = serde_json::from_str(
            r#"{"task_id": 4012, "description": "Add two numbers", "sample_io": ["assert add(1, 2) == 3"]}"#,
        )
        .unwrap();
        assert_eq!(problem.id, "4012");
        assert_eq!(problem.prompt, "Add two numbers");
        assert_eq!(
            problem.sample_io,
            vec![SampleIo::Text("assert add(1, 2) == 3".into())]
        );
    }

    #[test]
    fn test_output_string_or_list() {
        let samples: Vec<SampleIo> = serde_json::from_str(
            r#"[{"input": "1 2\n", "output": ["3\n"]}, {"input": "2 2\n", "output": "4\n"}]"#,
        )
        .unwrap();
        assert_eq!(samples[0].expected(), "3\n");
        assert_eq!(samples[1].expected(), "4\n");
    }

    #[test]
    fn test_render_text_samples() {
        let samples = vec![
            SampleIo::Text("assert f(1) == 1".into()),
            SampleIo::Text("assert f(2) == 4".into()),
        ];
        assert_eq!(
            render_sample_io(&samples),
            "assert f(1) == 1\nassert f(2) == 4"
        );
    }

    #[test]
    fn test_render_records() {
        let samples = vec![SampleIo::Case {
            input: "3".into(),
            output: vec!["9".into(), "ignored".into()],
        }];
        assert_eq!(render_sample_io(&samples), "Input:\n3\nExpected output:\n9");
    }

    #[test]
    fn test_render_empty() {
        assert_eq!(render_sample_io(&[]), "");
    }
}
