// Shell-command generator
// Pipes each item's input to a command and takes its stdout as the result

use async_trait::async_trait;
use serde::Serialize;
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use crate::domain::BatchItem;
use crate::error::GenerateError;
use crate::generator::{GenerateResult, Generator};

pub const ENV_ITEM_ID: &str = "BATCHGEN_ITEM_ID";
pub const ENV_ITEM_TYPE: &str = "BATCHGEN_ITEM_TYPE";

/// Configuration for a command generator
#[derive(Debug, Clone)]
pub struct CommandConfig {
    /// The command to execute (run via `sh -c`)
    pub command: String,
    /// Environment variables to set
    pub env: Vec<(String, String)>,
    /// Timeout in milliseconds (default: 60000)
    pub timeout_ms: u64,
}

impl Default for CommandConfig {
    fn default() -> Self {
        Self {
            command: String::new(),
            env: Vec::new(),
            timeout_ms: 60000,
        }
    }
}

impl CommandConfig {
    /// Create a new command config with the given command
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            ..Default::default()
        }
    }

    /// Add an environment variable
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    /// Set the timeout in milliseconds
    pub fn timeout_ms(mut self, ms: u64) -> Self {
        self.timeout_ms = ms;
        self
    }
}

/// Generator that runs a shell command once per item.
///
/// The item's input is written to stdin as JSON, trimmed stdout becomes the result,
/// and a non-zero exit becomes a failure carrying stderr.
pub struct CommandGenerator {
    config: CommandConfig,
}

impl CommandGenerator {
    pub fn new(config: CommandConfig) -> Self {
        Self { config }
    }

    /// Create a command generator with defaults
    pub fn simple(command: impl Into<String>) -> Self {
        Self::new(CommandConfig::new(command))
    }

    pub fn command(&self) -> &str {
        &self.config.command
    }

    async fn execute(&self, id: &str, item_type: &str, stdin: Vec<u8>) -> std::io::Result<std::process::Output> {
        let mut cmd = Command::new("sh");
        cmd.arg("-c").arg(&self.config.command);
        cmd.env(ENV_ITEM_ID, id).env(ENV_ITEM_TYPE, item_type);

        for (key, value) in &self.config.env {
            cmd.env(key, value);
        }

        cmd.stdin(Stdio::piped()).stdout(Stdio::piped()).stderr(Stdio::piped());
        cmd.kill_on_drop(true);

        let mut child = cmd.spawn()?;
        if let Some(mut pipe) = child.stdin.take() {
            // A command that ignores stdin may close it early; that is not a failure
            if let Err(e) = pipe.write_all(&stdin).await
                && e.kind() != std::io::ErrorKind::BrokenPipe
            {
                return Err(e);
            }
        }

        let timeout = tokio::time::Duration::from_millis(self.config.timeout_ms);
        match tokio::time::timeout(timeout, child.wait_with_output()).await {
            Ok(result) => result,
            Err(_) => Err(std::io::Error::new(
                std::io::ErrorKind::TimedOut,
                format!("Command timed out after {}ms", self.config.timeout_ms),
            )),
        }
    }
}

#[async_trait]
impl<I> Generator<I, String> for CommandGenerator
where
    I: Serialize + Send + Sync + 'static,
{
    async fn generate(&self, item: BatchItem<I, String>) -> GenerateResult<String> {
        let stdin = serde_json::to_vec(&item.input)?;
        let output = self.execute(&item.id, &item.item_type, stdin).await?;

        if output.status.success() {
            return Ok(String::from_utf8_lossy(&output.stdout).trim().to_string());
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        let mut message = format!("Command exited with code: {:?}", output.status.code());
        if !stderr.trim().is_empty() {
            message.push_str(&format!(": {}", stderr.trim()));
        }
        Err(GenerateError::new(message))
    }
}
