use std::path::Path;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};
use tracing::{error, info, warn};

use super::expand::expand_env_vars;
use super::output::truncate_tail;
use super::{CommandExecutor, ExecutionResult, NOT_STARTED};
use crate::config::ExecutorConfig;

/// Runs commands through a fixed, non-interactive system shell.
#[derive(Debug, Clone)]
pub struct ShellExecutor {
    max_output_chars: usize,
}

impl ShellExecutor {
    pub fn new(max_output_chars: usize) -> Self {
        Self { max_output_chars }
    }

    pub fn from_config(cfg: &ExecutorConfig) -> Self {
        Self::new(cfg.max_output_chars)
    }

    pub fn max_output_chars(&self) -> usize {
        self.max_output_chars
    }

    #[cfg(windows)]
    fn shell_command(command: &str) -> Command {
        let mut cmd = Command::new("powershell.exe");
        cmd.args(["-NoProfile", "-NonInteractive", "-Command", command]);
        cmd
    }

    #[cfg(not(windows))]
    fn shell_command(command: &str) -> Command {
        let mut cmd = Command::new("sh");
        cmd.arg("-c").arg(command);
        // own process group so a timeout can take down the whole tree
        cmd.process_group(0);
        cmd
    }

    async fn run(
        &self,
        command: &str,
        cwd: &Path,
        timeout: Duration,
    ) -> std::io::Result<ExecutionResult> {
        let mut child = Self::shell_command(command)
            .current_dir(cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        let out_task = tokio::spawn(read_pipe(child.stdout.take()));
        let err_task = tokio::spawn(read_pipe(child.stderr.take()));
        let out_abort = out_task.abort_handle();
        let err_abort = err_task.abort_handle();

        let waited = tokio::time::timeout(timeout, async {
            let status = child.wait().await?;
            let stdout = out_task.await.unwrap_or_default();
            let stderr = err_task.await.unwrap_or_default();
            Ok::<_, std::io::Error>((status, stdout, stderr))
        })
        .await;

        match waited {
            Ok(collected) => {
                let (status, stdout, stderr) = collected?;
                let code = returncode(status);
                let result = ExecutionResult::completed(
                    code,
                    truncate_tail(&String::from_utf8_lossy(&stdout), self.max_output_chars),
                    truncate_tail(&String::from_utf8_lossy(&stderr), self.max_output_chars),
                );
                if !result.ok {
                    warn!(
                        returncode = result.returncode,
                        stderr = %result.stderr,
                        "command finished with non-zero exit code"
                    );
                }
                Ok(result)
            }
            Err(_) => {
                terminate(&mut child).await;
                out_abort.abort();
                err_abort.abort();
                error!(
                    command = %command,
                    timeout_secs = timeout.as_secs_f64(),
                    "command timed out"
                );
                Ok(ExecutionResult::failure(format!(
                    "Error: Command timed out after {} seconds.",
                    timeout.as_secs_f64()
                )))
            }
        }
    }
}

#[async_trait]
impl CommandExecutor for ShellExecutor {
    async fn execute(&self, command: &str, cwd: &Path, timeout: Duration) -> ExecutionResult {
        if command.trim().is_empty() {
            return ExecutionResult::failure("Error: Empty command provided.");
        }

        let expanded = expand_env_vars(command);
        if expanded != command {
            info!(
                original = %command,
                expanded = %expanded,
                "expanded environment variables in command"
            );
        }

        if !cwd.is_dir() {
            error!(cwd = %cwd.display(), "execution failed, working directory does not exist");
            return missing_directory(cwd);
        }

        info!(command = %expanded, cwd = %cwd.display(), "executing command");
        match self.run(&expanded, cwd, timeout).await {
            Ok(result) => result,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound && !cwd.is_dir() => {
                missing_directory(cwd)
            }
            Err(e) => {
                error!(command = %expanded, error = %e, "unexpected error while executing command");
                ExecutionResult::failure(format!("An unexpected error occurred: {e}"))
            }
        }
    }
}

/// Exit code, or `128 + signal` for a signalled process like a shell reports it.
fn returncode(status: ExitStatus) -> i32 {
    status
        .code()
        .or_else(|| termination_signal(status).map(|sig| 128 + sig))
        .unwrap_or(NOT_STARTED)
}

#[cfg(unix)]
fn termination_signal(status: ExitStatus) -> Option<i32> {
    use std::os::unix::process::ExitStatusExt;
    status.signal()
}

#[cfg(not(unix))]
fn termination_signal(_status: ExitStatus) -> Option<i32> {
    None
}

fn missing_directory(cwd: &Path) -> ExecutionResult {
    ExecutionResult::failure(format!(
        "Error: The specified directory does not exist: {}",
        cwd.display()
    ))
}

async fn read_pipe<R: AsyncRead + Unpin>(pipe: Option<R>) -> Vec<u8> {
    let mut buf = Vec::new();
    if let Some(mut pipe) = pipe {
        if let Err(e) = pipe.read_to_end(&mut buf).await {
            warn!(error = %e, "failed to read process output");
        }
    }
    buf
}

async fn terminate(child: &mut Child) {
    kill_process_group(child);
    if let Err(e) = child.kill().await {
        warn!(error = %e, "failed to kill timed out process");
    }
}

#[cfg(unix)]
fn kill_process_group(child: &Child) {
    if let Some(pid) = child.id() {
        // SAFETY: killpg only sends a signal; the group was created at spawn.
        let rc = unsafe { libc::killpg(pid as libc::pid_t, libc::SIGKILL) };
        if rc != 0 {
            warn!(pid, "failed to signal process group");
        }
    }
}

#[cfg(not(unix))]
fn kill_process_group(_child: &Child) {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::TRUNCATION_MARKER;
    use tempfile::TempDir;

    const TIMEOUT: Duration = Duration::from_secs(20);

    #[tokio::test]
    async fn test_empty_command_rejected_without_spawning() {
        let dir = TempDir::new().unwrap();
        let result = ShellExecutor::new(8000).execute("   ", dir.path(), TIMEOUT).await;
        assert_eq!(result.returncode, NOT_STARTED);
        assert!(!result.ok);
        assert_eq!(result.stderr, "Error: Empty command provided.");
    }

    #[tokio::test]
    async fn test_missing_directory_is_a_failure_result() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nope");
        let result = ShellExecutor::new(8000)
            .execute("git status", &missing, TIMEOUT)
            .await;
        assert_eq!(result.returncode, -1);
        assert!(!result.ok);
        assert!(result.stderr.contains("does not exist"));
        assert!(result.stderr.contains("nope"));
    }

    #[cfg(unix)]
    #[test]
    fn test_returncode_from_exit_status() {
        use std::os::unix::process::ExitStatusExt;
        assert_eq!(returncode(ExitStatus::from_raw(3 << 8)), 3);
        assert_eq!(returncode(ExitStatus::from_raw(libc::SIGKILL)), 128 + libc::SIGKILL);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_runs_in_given_directory() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("dummy_file.txt"), "test content").unwrap();

        let result = ShellExecutor::new(8000).execute("ls", dir.path(), TIMEOUT).await;

        assert!(result.ok, "stderr: {}", result.stderr);
        assert_eq!(result.returncode, 0);
        assert!(result.stdout.contains("dummy_file.txt"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_non_zero_exit_code_reported() {
        let dir = TempDir::new().unwrap();
        let result = ShellExecutor::new(8000)
            .execute("echo boom >&2; exit 3", dir.path(), TIMEOUT)
            .await;
        assert_eq!(result.returncode, 3);
        assert!(!result.ok);
        assert_eq!(result.stderr.trim(), "boom");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_timeout_kills_process() {
        let dir = TempDir::new().unwrap();
        let started = std::time::Instant::now();
        let result = ShellExecutor::new(8000)
            .execute("sleep 30", dir.path(), Duration::from_millis(300))
            .await;
        assert_eq!(result.returncode, -1);
        assert!(!result.ok);
        assert!(result.stderr.contains("timed out"));
        assert!(started.elapsed() < Duration::from_secs(10));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_output_truncated_to_tail() {
        let dir = TempDir::new().unwrap();
        let result = ShellExecutor::new(10)
            .execute("printf 'abcdefghijklmnopqrstuvwxyz'", dir.path(), TIMEOUT)
            .await;
        assert!(result.ok);
        assert_eq!(result.stdout, format!("{TRUNCATION_MARKER}qrstuvwxyz"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_environment_variables_expanded() {
        let dir = TempDir::new().unwrap();
        let result = ShellExecutor::new(8000)
            .execute("echo %PATH%", dir.path(), TIMEOUT)
            .await;
        assert!(result.ok);
        assert!(!result.stdout.contains("%PATH%"));
    }
}
