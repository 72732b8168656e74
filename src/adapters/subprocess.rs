//! Subprocess advisor adapter.
//!
//! Spawns a configured command, writes the role preamble and query to
//! its stdin, and reads the analysis from stdout. Useful for wrapping
//! local model CLIs without an HTTP surface.

use std::process::Stdio;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio::time::timeout;

use super::{Advisor, AdvisorReport};

/// Advisor backed by a local command.
pub struct SubprocessAdvisor {
    advisor_id: String,
    role: String,
    /// Program to spawn
    command: String,
    /// Arguments passed to the program
    args: Vec<String>,
}

impl SubprocessAdvisor {
    pub fn new(
        advisor_id: impl Into<String>,
        role: impl Into<String>,
        command: impl Into<String>,
        args: Vec<String>,
    ) -> Self {
        Self {
            advisor_id: advisor_id.into(),
            role: role.into(),
            command: command.into(),
            args,
        }
    }

    /// Spawn the command, pipe the prompt to stdin, collect stdout.
    async fn execute_subprocess(&self, prompt: &str, call_timeout: Duration) -> Result<String> {
        let mut child = Command::new(&self.command)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .with_context(|| {
                format!(
                    "Failed to spawn advisor process '{}' for '{}'",
                    self.command, self.advisor_id
                )
            })?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(prompt.as_bytes())
                .await
                .context("Failed to write to advisor stdin")?;
            // Drop stdin to signal EOF
        }

        let output = timeout(call_timeout, child.wait_with_output())
            .await
            .with_context(|| {
                format!(
                    "Advisor '{}' timed out after {:?}",
                    self.advisor_id, call_timeout
                )
            })?
            .with_context(|| format!("Failed to wait for advisor process '{}'", self.advisor_id))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let exit_code = output.status.code().unwrap_or(-1);
            anyhow::bail!(
                "Advisor '{}' failed with exit code {}: {}",
                self.advisor_id,
                exit_code,
                stderr.trim()
            );
        }

        let stdout =
            String::from_utf8(output.stdout).context("Advisor output is not valid UTF-8")?;

        Ok(stdout)
    }
}

#[async_trait]
impl Advisor for SubprocessAdvisor {
    fn id(&self) -> &str {
        &self.advisor_id
    }

    fn role(&self) -> &str {
        &self.role
    }

    async fn analyze(
        &self,
        query: &str,
        context: &str,
        timeout: Duration,
    ) -> Result<AdvisorReport> {
        let prompt = if context.is_empty() {
            format!("You are a {} advisor.\n\n{}", self.role, query)
        } else {
            format!(
                "You are a {} advisor.\nContext: {}\n\n{}",
                self.role, context, query
            )
        };

        let analysis = self.execute_subprocess(&prompt, timeout).await?;
        Ok(AdvisorReport::from_text(analysis))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_subprocess_advisor_identity() {
        let advisor = SubprocessAdvisor::new("risk", "risk assessment", "cat", vec![]);
        assert_eq!(advisor.id(), "risk");
        assert_eq!(advisor.role(), "risk assessment");
    }

    #[tokio::test]
    async fn test_subprocess_echoes_prompt() {
        // `cat` echoes stdin, so the analysis is the prompt itself
        let advisor = SubprocessAdvisor::new("echo", "echo", "cat", vec![]);
        let report = advisor
            .analyze("What should I do?", "", Duration::from_secs(5))
            .await
            .unwrap();
        assert!(report.analysis.contains("What should I do?"));
    }

    #[tokio::test]
    async fn test_missing_binary_fails() {
        let advisor = SubprocessAdvisor::new("ghost", "ghost", "/nonexistent/advisor", vec![]);
        let result = advisor.analyze("q", "", Duration::from_secs(1)).await;
        assert!(result.is_err());
    }
}
