//! Local host execution

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use crate::common::{Error, Result};

use super::Client;

/// Runs commands on the machine the engine itself runs on
///
/// Commands go through `sh -c`, so shell syntax in test commands works
/// the same locally as it does on a remote shell.
pub struct LocalClient {
    connected: bool,
}

impl LocalClient {
    pub fn new() -> Self {
        Self { connected: false }
    }
}

impl Default for LocalClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Client for LocalClient {
    fn resource(&self) -> &str {
        "localhost"
    }

    fn connected(&self) -> bool {
        self.connected
    }

    async fn connect(&mut self) -> Result<()> {
        self.connected = true;
        Ok(())
    }

    async fn disconnect(&mut self) {
        self.connected = false;
    }

    async fn execute(&mut self, command: &str) -> Result<String> {
        debug!("executing '{}' locally", command);
        let output = Command::new("sh").arg("-c").arg(command).output().await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let reason = match stderr.trim() {
                "" => match output.status.code() {
                    Some(code) => format!("command exited with code {code}"),
                    None => "command terminated by signal".to_string(),
                },
                message => message.to_string(),
            };
            return Err(Error::CommandFailed(reason));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_execute_captures_stdout() {
        let mut client = LocalClient::new();
        client.connect().await.unwrap();
        assert!(client.connected());

        let output = client.execute("echo hello").await.unwrap();
        assert_eq!(output, "hello\n");

        client.disconnect().await;
        assert!(!client.connected());
    }

    #[tokio::test]
    async fn test_shell_syntax_is_honoured() {
        let mut client = LocalClient::new();
        client.connect().await.unwrap();

        let output = client.execute("echo a && echo b").await.unwrap();
        assert_eq!(output, "a\nb\n");
    }

    #[tokio::test]
    async fn test_failing_command_reports_stderr() {
        let mut client = LocalClient::new();
        client.connect().await.unwrap();

        let err = client.execute("echo broken >&2; exit 3").await.unwrap_err();
        assert!(matches!(err, Error::CommandFailed(ref m) if m == "broken"));
    }

    #[tokio::test]
    async fn test_failing_command_without_stderr_reports_code() {
        let mut client = LocalClient::new();
        client.connect().await.unwrap();

        let err = client.execute("exit 7").await.unwrap_err();
        assert!(matches!(err, Error::CommandFailed(ref m) if m.contains("code 7")));
    }
}
