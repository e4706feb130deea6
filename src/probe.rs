//! Probe layer: the only place that touches the live host.
//!
//! Collectors never spawn processes or read the environment themselves; the
//! driver constructs one probe and passes it to every collector. The trait
//! seam is what makes the whole pipeline testable against a fake host.

use async_trait::async_trait;
use thiserror::Error;
use tokio::process::Command;
use tracing::debug;

#[derive(Debug, Error)]
pub enum ProbeError {
    /// The program does not exist on this host.
    #[error("`{0}` is not available on this host")]
    Missing(String),

    /// The program ran but the invoking principal was refused.
    #[error("`{program}` refused access: {detail}")]
    Denied { program: String, detail: String },

    /// The program ran and reported failure.
    #[error("`{program}` exited with {status}: {detail}")]
    Failed {
        program: String,
        status: i32,
        detail: String,
    },
}

#[async_trait]
pub trait SystemProbe: Send + Sync {
    /// Run a native query command and return its stdout.
    async fn command_output(&self, program: &str, args: &[&str]) -> Result<String, ProbeError>;

    /// Read one variable from the current process environment.
    fn env_var(&self, name: &str) -> Option<String>;
}

/// Run a one-line PowerShell query through the probe.
pub async fn powershell(probe: &dyn SystemProbe, script: &str) -> Result<String, ProbeError> {
    probe
        .command_output(
            "powershell",
            &["-NoProfile", "-NonInteractive", "-Command", script],
        )
        .await
}

/// Production probe backed by real child processes.
pub struct LiveProbe;

#[async_trait]
impl SystemProbe for LiveProbe {
    async fn command_output(&self, program: &str, args: &[&str]) -> Result<String, ProbeError> {
        let output = Command::new(program).args(args).output().await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ProbeError::Missing(program.to_string())
            } else {
                ProbeError::Failed {
                    program: program.to_string(),
                    status: -1,
                    detail: e.to_string(),
                }
            }
        })?;

        if output.status.success() {
            return Ok(String::from_utf8_lossy(&output.stdout).to_string());
        }

        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        let status = output.status.code().unwrap_or(-1);
        debug!(program, status, "probe command failed");

        if looks_like_access_denied(&stderr) {
            Err(ProbeError::Denied {
                program: program.to_string(),
                detail: first_line(&stderr),
            })
        } else {
            Err(ProbeError::Failed {
                program: program.to_string(),
                status,
                detail: first_line(&stderr),
            })
        }
    }

    fn env_var(&self, name: &str) -> Option<String> {
        std::env::var(name).ok().filter(|v| !v.is_empty())
    }
}

fn looks_like_access_denied(stderr: &str) -> bool {
    let lower = stderr.to_lowercase();
    lower.contains("access is denied")
        || lower.contains("access denied")
        || lower.contains("permissiondenied")
        || lower.contains("unauthorizedaccess")
}

fn first_line(text: &str) -> String {
    text.lines().next().unwrap_or("no error output").to_string()
}
