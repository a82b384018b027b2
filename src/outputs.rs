use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

use tracing::debug;

use crate::error::{Error, Result};

/// Result of one ingested submission, reported back to the invoking workflow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub short_title: String,
    pub category_name: String,
    pub category_slug: String,
    pub group_name: String,
    pub url: String,
}

impl Outcome {
    pub fn output_lines(&self) -> Vec<String> {
        [
            ("short_title", &self.short_title),
            ("category_name", &self.category_name),
            ("url", &self.url),
        ]
        .iter()
        .map(|(key, value)| format!("{}={}", key, single_line(value)))
        .collect()
    }
}

fn single_line(value: &str) -> String {
    value.split(['\r', '\n']).filter(|p| !p.is_empty()).collect::<Vec<_>>().join(" ")
}

/// Append `key=value` lines to the workflow output file, or print them.
pub fn emit(outcome: &Outcome, output_file: Option<&Path>) -> Result<()> {
    let lines = outcome.output_lines();
    let Some(path) = output_file else {
        for line in &lines {
            println!("{}", line);
        }
        return Ok(());
    };

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| Error::io(path, e))?;
    for line in &lines {
        writeln!(file, "{}", line).map_err(|e| Error::io(path, e))?;
    }
    debug!(path = %path.display(), "Wrote workflow outputs");
    Ok(())
}

/// Single-line failure marker understood by the workflow runner.
pub fn error_marker(err: &dyn std::fmt::Display) -> String {
    format!("::error::{}", single_line(&err.to_string()))
}
