// Candidate program execution
//
// Writes a candidate to a temp file, runs it with the configured interpreter,
// and collects its output. A run that exceeds the timeout is killed.

use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::io::Write;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use crate::config::{EvaluatorConfig, LanguageCommand};

const MAX_CAPTURED_CHARS: usize = 4_000;

/// What a single run produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOutput {
    pub stdout: String,
    pub stderr: String,
    /// `None` when the process was killed or exited via a signal
    pub exit_code: Option<i32>,
    pub timed_out: bool,
}

impl RunOutput {
    pub fn success(&self) -> bool {
        !self.timed_out && self.exit_code == Some(0)
    }
}

pub struct ProcessEvaluator {
    commands: BTreeMap<String, LanguageCommand>,
    timeout: Duration,
}

impl ProcessEvaluator {
    pub fn new(config: &EvaluatorConfig) -> Self {
        Self {
            commands: config.commands.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Run `source` as a `language` program, feeding `stdin` if given.
    pub async fn run(&self, language: &str, source: &str, stdin: Option<&str>) -> Result<RunOutput> {
        let command = self
            .commands
            .get(language)
            .with_context(|| format!("No evaluator command configured for '{}'", language))?;

        let mut file = tempfile::Builder::new()
            .prefix("blueprint-")
            .suffix(&format!(".{}", command.extension))
            .tempfile()
            .context("Failed to create temp file for candidate")?;
        file.write_all(source.as_bytes())
            .context("Failed to write candidate source")?;
        file.flush()?;

        let mut child = Command::new(&command.program)
            .args(&command.args)
            .arg(file.path())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("Failed to spawn '{}'", command.program))?;

        // Feed stdin from a separate task so a chatty child can't block on a full pipe
        if let Some(mut pipe) = child.stdin.take() {
            let input = stdin.unwrap_or_default().to_string();
            tokio::spawn(async move {
                let _ = pipe.write_all(input.as_bytes()).await;
            });
        }

        match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Ok(output) => {
                let output = output.context("Failed to collect program output")?;
                Ok(RunOutput {
                    stdout: truncate(String::from_utf8_lossy(&output.stdout).into_owned()),
                    stderr: truncate(String::from_utf8_lossy(&output.stderr).into_owned()),
                    exit_code: output.status.code(),
                    timed_out: false,
                })
            }
            Err(_) => {
                tracing::debug!("Candidate exceeded {:?}; killed", self.timeout);
                Ok(RunOutput {
                    stdout: String::new(),
                    stderr: format!("Time limit exceeded ({}s)", self.timeout.as_secs_f32()),
                    exit_code: None,
                    timed_out: true,
                })
            }
        }
    }
}

fn truncate(mut text: String) -> String {
    if text.chars().count() > MAX_CAPTURED_CHARS {
        text = text.chars().take(MAX_CAPTURED_CHARS).collect();
        text.push_str("\n[output truncated]");
    }
    text
}

/// Compare program output ignoring trailing whitespace on each line and
/// trailing blank lines.
pub fn outputs_match(actual: &str, expected: &str) -> bool {
    normalize_output(actual) == normalize_output(expected)
}

fn normalize_output(text: &str) -> Vec<&str> {
    let mut lines: Vec<&str> = text.lines().map(str::trim_end).collect();
    while lines.last().is_some_and(|l| l.is_empty()) {
        lines.pop();
    }
    lines
}
