// Append-only JSONL results store

use anyhow::{Context, Result};
use std::collections::HashSet;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use super::types::{OutcomeRecord, ResultSummary};

pub struct ResultStore {
    path: PathBuf,
    records: Vec<OutcomeRecord>,
    task_ids: HashSet<String>,
}

impl ResultStore {
    /// Open `path`, loading earlier records. With `discard_previous_run` an
    /// existing file is deleted instead.
    pub fn open(path: impl Into<PathBuf>, discard_previous_run: bool) -> Result<Self> {
        let path = path.into();

        let records = if path.exists() {
            if discard_previous_run {
                fs::remove_file(&path)
                    .with_context(|| format!("Failed to remove {}", path.display()))?;
                tracing::info!("Discarded previous results at {}", path.display());
                Vec::new()
            } else {
                read_records(&path)?
            }
        } else {
            Vec::new()
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        let task_ids = records.iter().map(|r| r.task_id.clone()).collect();
        Ok(Self {
            path,
            records,
            task_ids,
        })
    }

    /// Append a record to memory and to the file
    pub fn add(&mut self, record: OutcomeRecord) -> Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("Failed to open results file: {}", self.path.display()))?;

        let json = serde_json::to_string(&record).context("Failed to serialize result")?;
        writeln!(file, "{}", json).context("Failed to write result")?;

        self.task_ids.insert(record.task_id.clone());
        self.records.push(record);
        Ok(())
    }

    pub fn contains(&self, task_id: &str) -> bool {
        self.task_ids.contains(task_id)
    }

    pub fn records(&self) -> &[OutcomeRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn summary(&self) -> ResultSummary {
        ResultSummary::from_records(&self.records)
    }
}

fn read_records(path: &Path) -> Result<Vec<OutcomeRecord>> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read results file: {}", path.display()))?;

    contents
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(idx, line)| {
            serde_json::from_str(line).with_context(|| {
                format!("Failed to parse {} line {}", path.display(), idx + 1)
            })
        })
        .collect()
}
