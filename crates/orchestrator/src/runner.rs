//! Bounded execution of external programs.

use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::error::{OrchestratorError, Result};

/// How long readers may keep draining pipes after a timed-out child is killed.
/// A grandchild can hold a pipe open well past that.
const DRAIN_GRACE: Duration = Duration::from_millis(100);

/// Runs an external program and returns its combined output.
///
/// Implementations never retry and never interpret the output; a non-zero
/// exit or a timeout is an error carrying whatever the program printed.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(&self, timeout: Duration, program: &str, args: &[String]) -> Result<String>;
}

/// [`CommandRunner`] backed by real child processes.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessRunner;

impl ProcessRunner {
    pub fn new() -> Self {
        Self
    }
}

type Captured = Arc<Mutex<Vec<u8>>>;

/// Copy `reader` into `buf` chunk by chunk, so a partial read survives the
/// task being aborted.
fn spawn_reader<R>(reader: Option<R>, buf: Captured) -> JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let Some(mut reader) = reader else {
            return;
        };
        let mut chunk = [0u8; 4096];
        loop {
            match reader.read(&mut chunk).await {
                Ok(0) | Err(_) => break,
                Ok(n) => buf.lock().await.extend_from_slice(&chunk[..n]),
            }
        }
    })
}

async fn drain(task: &mut JoinHandle<()>) {
    if task.is_finished() {
        return;
    }
    if tokio::time::timeout(DRAIN_GRACE, &mut *task).await.is_err() {
        task.abort();
    }
}

async fn combined(stdout: &Captured, stderr: &Captured) -> String {
    let mut combined = String::from_utf8_lossy(&stdout.lock().await).into_owned();
    combined.push_str(&String::from_utf8_lossy(&stderr.lock().await));
    combined
}

#[async_trait]
impl CommandRunner for ProcessRunner {
    async fn run(&self, timeout: Duration, program: &str, args: &[String]) -> Result<String> {
        debug!(program = %program, ?args, ?timeout, "Running command");

        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| OrchestratorError::CommandSpawn {
                program: program.to_string(),
                source,
            })?;

        let stdout: Captured = Arc::default();
        let stderr: Captured = Arc::default();
        let mut stdout_task = spawn_reader(child.stdout.take(), Arc::clone(&stdout));
        let mut stderr_task = spawn_reader(child.stderr.take(), Arc::clone(&stderr));

        let finished = tokio::time::timeout(timeout, async {
            let status = child.wait().await?;
            drain_to_end(&mut stdout_task).await;
            drain_to_end(&mut stderr_task).await;
            Ok::<_, std::io::Error>(status)
        })
        .await;

        let status = match finished {
            Ok(Ok(status)) => status,
            Ok(Err(source)) => {
                return Err(OrchestratorError::CommandSpawn {
                    program: program.to_string(),
                    source,
                })
            }
            Err(_) => {
                if let Err(e) = child.start_kill() {
                    warn!(program = %program, error = %e, "Failed to kill timed out command");
                }
                let _ = tokio::time::timeout(DRAIN_GRACE, child.wait()).await;
                drain(&mut stdout_task).await;
                drain(&mut stderr_task).await;

                return Err(OrchestratorError::CommandTimeout {
                    program: program.to_string(),
                    timeout,
                    output: combined(&stdout, &stderr).await,
                });
            }
        };

        let output = combined(&stdout, &stderr).await;

        if !status.success() {
            return Err(OrchestratorError::command_failed(
                program,
                status.to_string(),
                output,
            ));
        }

        Ok(output)
    }
}

/// Await a reader until its pipe closes. Safe to call on a finished task.
async fn drain_to_end(task: &mut JoinHandle<()>) {
    if !task.is_finished() {
        let _ = (&mut *task).await;
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn sh(script: &str) -> Vec<String> {
        vec!["-c".to_string(), script.to_string()]
    }

    #[tokio::test]
    async fn test_captures_stdout_and_stderr() {
        let output = ProcessRunner::new()
            .run(Duration::from_secs(5), "sh", &sh("echo out; echo err 1>&2"))
            .await
            .unwrap();

        assert!(output.contains("out"));
        assert!(output.contains("err"));
    }

    #[tokio::test]
    async fn test_non_zero_exit_keeps_output() {
        let err = ProcessRunner::new()
            .run(Duration::from_secs(5), "sh", &sh("echo boom; exit 3"))
            .await
            .unwrap_err();

        match err {
            OrchestratorError::CommandFailed {
                program,
                status,
                output,
            } => {
                assert_eq!(program, "sh");
                assert!(status.contains('3'));
                assert!(output.contains("boom"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_timeout_is_reported() {
        let started = std::time::Instant::now();
        let err = ProcessRunner::new()
            .run(Duration::from_millis(100), "sleep", &["5".to_string()])
            .await
            .unwrap_err();

        assert!(matches!(err, OrchestratorError::CommandTimeout { .. }));
        assert!(started.elapsed() < Duration::from_secs(4));
    }

    #[tokio::test]
    async fn test_timeout_keeps_partial_output() {
        let started = std::time::Instant::now();
        let err = ProcessRunner::new()
            .run(
                Duration::from_millis(300),
                "sh",
                &sh("echo partial-diagnostic; echo to-stderr 1>&2; sleep 5"),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, OrchestratorError::CommandTimeout { .. }));
        let output = err.output().unwrap();
        assert!(output.contains("partial-diagnostic"));
        assert!(output.contains("to-stderr"));
        assert!(err.to_string().contains("partial-diagnostic"));
        assert!(started.elapsed() < Duration::from_secs(4));
    }

    #[tokio::test]
    async fn test_missing_program() {
        let err = ProcessRunner::new()
            .run(
                Duration::from_secs(1),
                "shipyard-definitely-not-a-real-binary",
                &[],
            )
            .await
            .unwrap_err();

        assert!(matches!(err, OrchestratorError::CommandSpawn { .. }));
    }
}
