//! Crew output log
//!
//! Appends every completed task output as one JSON line.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::{Result, TaskOutput};

/// One line of the output log
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputLogEntry {
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub output: TaskOutput,
}

/// Append-only JSON-lines file
#[derive(Debug, Clone)]
pub struct OutputLog {
    path: PathBuf,
}

impl OutputLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one output
    pub fn append(&self, output: &TaskOutput) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let entry = OutputLogEntry {
            timestamp: Utc::now(),
            output: output.clone(),
        };
        let line = serde_json::to_string(&entry)?;

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{}", line)?;
        Ok(())
    }

    /// Read back all entries
    pub fn read_all(&self) -> Result<Vec<OutputLogEntry>> {
        let content = fs::read_to_string(&self.path)?;
        content
            .lines()
            .filter(|l| !l.trim().is_empty())
            .map(|l| serde_json::from_str::<OutputLogEntry>(l).map_err(Into::into))
            .collect()
    }
}
