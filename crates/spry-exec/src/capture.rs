//! C10: named outputs from a task's shell execution, written to files
//! or stashed in an in-memory dictionary for downstream interpolation.

use std::collections::HashMap;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde_json::Value;
use spry_pi::Pi;

/// A task's captured shell execution: kept in full (exit code and
/// stderr included) on the Rust side so a CLI or test harness can
/// inspect it directly. Only `stdout` is threaded into the
/// interpolation binding environment, as plain text (see
/// `Interpolator` and literal scenario S6).
#[derive(Clone, Debug)]
pub struct TaskExecCapture {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: Option<i32>,
}

impl TaskExecCapture {
    pub fn text(&self) -> &str {
        &self.stdout
    }

    pub fn json(&self) -> Result<Value, serde_json::Error> {
        serde_json::from_str(&self.stdout)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CaptureInstruction {
    /// A `"./..."` path: the capture's stdout is written to this file.
    File(PathBuf),
    /// Any other string: a key under which the capture is stashed in
    /// `capturedTaskExecs`.
    Key(String),
}

/// Parse a task's `--capture` / `-C` flag into its ordered instructions.
/// A boolean-valued occurrence defaults to the task's own `identity`.
pub fn capture_instructions(pi: &Pi, identity: &str) -> Vec<CaptureInstruction> {
    pi.get_text_flag_values("capture", &["C"])
        .into_iter()
        .map(|value| {
            let value = if value == "true" { identity.to_string() } else { value };
            match value.strip_prefix("./") {
                Some(rest) => CaptureInstruction::File(Path::new(".").join(rest)),
                None => CaptureInstruction::Key(value),
            }
        })
        .collect()
}

#[derive(Clone, Debug, Default)]
pub struct GitignoreOutcome {
    pub added: Vec<String>,
    pub preserved: Vec<String>,
}

/// Append `entry` to the gitignore at `path` unless it is already
/// present (testable property 10). Idempotent: a repeated call against
/// the same entry reports it as `preserved`, never duplicates the line.
pub fn append_gitignore(path: &Path, entry: &str) -> std::io::Result<GitignoreOutcome> {
    let existing = std::fs::read_to_string(path).unwrap_or_default();
    let mut outcome = GitignoreOutcome::default();

    let lines: HashSet<&str> = existing.lines().collect();
    if lines.contains(entry) {
        outcome.preserved.push(entry.to_string());
        return Ok(outcome);
    }

    let mut content = existing;
    if !content.is_empty() && !content.ends_with('\n') {
        content.push('\n');
    }
    content.push_str(entry);
    content.push('\n');
    std::fs::write(path, content)?;
    outcome.added.push(entry.to_string());
    Ok(outcome)
}

/// Write `text` to `path`, ensuring a trailing newline and that the
/// parent directory exists.
pub fn write_capture_file(path: &Path, text: &str) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let mut content = text.to_string();
    if !content.ends_with('\n') {
        content.push('\n');
    }
    std::fs::write(path, content)
}

/// Resolve the gitignore path to append to for one `--gitignore[=file]`
/// occurrence.
fn gitignore_target(pi: &Pi, default_path: &Path) -> PathBuf {
    pi.get_text_flag("gitignore", &[])
        .filter(|v| v != "true")
        .map(PathBuf::from)
        .unwrap_or_else(|| default_path.to_path_buf())
}

/// Run every capture instruction for one task's completed execution, in
/// declaration order (§4.10). File captures are written immediately;
/// key captures are inserted into `captured` for downstream tasks.
pub fn apply_captures(
    pi: &Pi,
    identity: &str,
    capture: &TaskExecCapture,
    captured: &mut HashMap<String, TaskExecCapture>,
    default_gitignore: &Path,
) -> std::io::Result<GitignoreOutcome> {
    let mut outcome = GitignoreOutcome::default();
    for instruction in capture_instructions(pi, identity) {
        match instruction {
            CaptureInstruction::File(path) => {
                write_capture_file(&path, &capture.stdout)?;
                if pi.has_flag("gitignore", &[]) {
                    let gi_path = gitignore_target(pi, default_gitignore);
                    let sub = append_gitignore(&gi_path, &path.to_string_lossy())?;
                    outcome.added.extend(sub.added);
                    outcome.preserved.extend(sub.preserved);
                }
            }
            CaptureInstruction::Key(key) => {
                captured.insert(key, capture.clone());
            }
        }
    }
    Ok(outcome)
}
