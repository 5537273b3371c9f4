// File: src/snapshot.rs
//
// Snapshot runner for EngPy scripts.
//
// Each `name.eng` in a directory is run with its output captured and
// compared against `name.out`. A run that fails appends the error's one-line
// rendering to the captured output, so error cases can be snapshotted too.
// Missing `.out` files are written from the actual output, as are all of
// them when updating.

use crate::errors::EngError;
use crate::interpreter::{Environment, Limits};
use colored::Colorize;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::debug;

pub const SCRIPT_EXTENSION: &str = "eng";
pub const SNAPSHOT_EXTENSION: &str = "out";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SnapshotReport {
    pub total: usize,
    pub passed: usize,
    pub failures: Vec<PathBuf>,
}

impl SnapshotReport {
    pub fn all_passed(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Runs `source` in a fresh environment and returns its trimmed output,
/// including the error line if the run failed
pub fn capture(source: &str, limits: Limits) -> String {
    let mut out = Vec::new();
    let mut env = Environment::new();
    if let Err(err) = crate::run_source(source, &mut env, &mut out, limits) {
        let _ = writeln!(out, "{}", err.plain());
    }
    String::from_utf8_lossy(&out).trim().to_string()
}

/// Runs every script in `dir`, sorted by file name
pub fn run_all(dir: &Path, update: bool, limits: Limits) -> Result<SnapshotReport, EngError> {
    let mut scripts: Vec<PathBuf> = fs::read_dir(dir)?
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| path.extension().is_some_and(|ext| ext == SCRIPT_EXTENSION))
        .collect();
    scripts.sort();
    debug!(dir = %dir.display(), scripts = scripts.len(), update, "running snapshots");

    let mut report = SnapshotReport::default();

    for path in scripts {
        report.total += 1;
        let source = fs::read_to_string(&path)?;
        let expected_path = path.with_extension(SNAPSHOT_EXTENSION);

        let start = Instant::now();
        let actual = capture(&source, limits);

        let expected = if expected_path.exists() && !update {
            fs::read_to_string(&expected_path)?.trim().to_string()
        } else {
            fs::write(&expected_path, format!("{}\n", actual))?;
            actual.clone()
        };

        if actual == expected {
            println!("{} {} ({:.2?})", "[✓]".green(), path.display(), start.elapsed());
            report.passed += 1;
        } else {
            println!("{} {}", "[✗]".red(), path.display());
            println!("Expected:\n{}\nGot:\n{}\n", expected, actual);
            report.failures.push(path);
        }
    }

    println!("\n[✓] Passed {}/{} tests", report.passed, report.total);
    Ok(report)
}
