//! C9: language-dispatched subprocess spawning with buffered
//! stdout/stderr capture.

use std::process::Stdio;

use tokio::io::AsyncReadExt;
use tokio::process::Command;

use crate::capture::TaskExecCapture;

#[derive(Clone, Debug)]
pub enum ShellEvent {
    Start { id: String, command: String },
    Stdout { id: String, chunk: Vec<u8> },
    Stderr { id: String, chunk: Vec<u8> },
    Exit { id: String, code: Option<i32> },
}

/// Resolve a language tag to the program/arg-prefix used to invoke
/// `source`. Seed mapping: `shell`/`sh`/`bash` → the system shell's
/// `-c` form.
fn shell_invocation(language: &str) -> Option<(&'static str, &'static str)> {
    match language {
        "shell" | "sh" | "bash" => {
            if cfg!(windows) {
                Some(("cmd", "/C"))
            } else {
                Some(("/bin/sh", "-c"))
            }
        }
        _ => None,
    }
}

/// Spawn `source` under the shell mapped from `language`, await
/// completion, and return the buffered capture. A non-zero exit is not
/// surfaced as an `Err` here — it's information for `runTask` to judge
/// (§4.9).
pub async fn run_shell(
    id: &str,
    language: &str,
    source: &str,
    on_event: &mut dyn FnMut(ShellEvent),
) -> std::io::Result<TaskExecCapture> {
    let (program, flag) = shell_invocation(language).ok_or_else(|| {
        std::io::Error::new(std::io::ErrorKind::Unsupported, format!("no shell mapping for language `{language}`"))
    })?;

    on_event(ShellEvent::Start { id: id.to_string(), command: format!("{program} {flag} {source}") });

    let mut child = Command::new(program)
        .arg(flag)
        .arg(source)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()?;

    let mut stdout_pipe = child.stdout.take().expect("stdout was piped");
    let mut stderr_pipe = child.stderr.take().expect("stderr was piped");

    let stdout_fut = async {
        let mut buf = Vec::new();
        stdout_pipe.read_to_end(&mut buf).await?;
        std::io::Result::Ok(buf)
    };
    let stderr_fut = async {
        let mut buf = Vec::new();
        stderr_pipe.read_to_end(&mut buf).await?;
        std::io::Result::Ok(buf)
    };
    let (stdout_buf, stderr_buf) = tokio::try_join!(stdout_fut, stderr_fut)?;

    on_event(ShellEvent::Stdout { id: id.to_string(), chunk: stdout_buf.clone() });
    on_event(ShellEvent::Stderr { id: id.to_string(), chunk: stderr_buf.clone() });

    let status = child.wait().await?;
    let code = status.code();
    on_event(ShellEvent::Exit { id: id.to_string(), code });

    Ok(TaskExecCapture {
        stdout: String::from_utf8_lossy(&stdout_buf).to_string(),
        stderr: String::from_utf8_lossy(&stderr_buf).to_string(),
        exit_code: code,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn captures_stdout_and_exit_code() {
        let mut events = Vec::new();
        let capture = run_shell("t", "shell", "echo hi", &mut |e| events.push(e)).await.unwrap();
        assert_eq!(capture.stdout.trim_end(), "hi");
        assert_eq!(capture.exit_code, Some(0));
        assert!(matches!(events.first(), Some(ShellEvent::Start { .. })));
        assert!(matches!(events.last(), Some(ShellEvent::Exit { code: Some(0), .. })));
    }

    #[tokio::test]
    async fn nonzero_exit_is_reported_not_erred() {
        let mut events = Vec::new();
        let capture = run_shell("t", "shell", "exit 3", &mut |e| events.push(e)).await.unwrap();
        assert_eq!(capture.exit_code, Some(3));
    }

    #[tokio::test]
    async fn unmapped_language_is_an_io_error() {
        let mut events = Vec::new();
        let err = run_shell("t", "python", "print(1)", &mut |e| events.push(e)).await.unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::Unsupported);
    }
}
