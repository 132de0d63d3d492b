//! Serial console execution

use std::time::Duration;

use async_trait::async_trait;
use tokio_serial::{SerialPortBuilderExt, SerialStream};
use tracing::debug;

use crate::common::{Error, Result};

use super::session::{self, PromptConfig, Session};
use super::{Client, Credentials};

const DEFAULT_BAUD_RATE: u32 = 115200;

/// Runs commands on a shell behind a serial console
///
/// With uboot prompt settings this same client drives a bootloader
/// shell; the expect loop does not care which program answers.
pub struct SerialClient {
    resource: String,
    baud_rate: u32,
    credentials: Credentials,
    prompts: PromptConfig,
    connect_timeout: Duration,
    session: Option<Session<SerialStream>>,
}

impl SerialClient {
    pub fn new(
        resource: &str,
        credentials: Credentials,
        prompts: PromptConfig,
        connect_timeout: Duration,
    ) -> Self {
        Self {
            resource: resource.to_string(),
            baud_rate: DEFAULT_BAUD_RATE,
            credentials,
            prompts,
            connect_timeout,
            session: None,
        }
    }
}

#[async_trait]
impl Client for SerialClient {
    fn resource(&self) -> &str {
        &self.resource
    }

    fn connected(&self) -> bool {
        self.session.is_some()
    }

    async fn connect(&mut self) -> Result<()> {
        let stream = tokio_serial::new(&self.resource, self.baud_rate)
            .timeout(Duration::from_secs(1))
            .open_native_async()
            .map_err(|e| Error::connect_failed(&self.resource, e.to_string()))?;

        // Wake-up and login run under the connect timeout; commands
        // get the command timeout afterwards
        let mut session = Session::new(stream, self.connect_timeout);
        session.send("").await?;
        session::login(&mut session, &self.prompts, &self.credentials).await?;
        session.set_timeout(self.prompts.timeout);

        self.session = Some(session);
        debug!("connected to serial console {}", self.resource);
        Ok(())
    }

    async fn disconnect(&mut self) {
        if let Some(mut session) = self.session.take() {
            session::logout(&mut session, &self.prompts).await;
        }
    }

    async fn execute(&mut self, command: &str) -> Result<String> {
        let session = self
            .session
            .as_mut()
            .ok_or_else(|| Error::CommandFailed("not connected".to_string()))?;
        session::run_command(session, &self.prompts, command).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::config::PromptOverrides;

    #[tokio::test]
    async fn test_connect_fails_on_missing_device() {
        let prompts = PromptConfig::serial(&PromptOverrides::default(), 1).unwrap();
        let mut client = SerialClient::new(
            "/dev/nonexistent0",
            Credentials::default(),
            prompts,
            Duration::from_secs(1),
        );

        let err = client.connect().await.unwrap_err();
        assert!(matches!(err, Error::ConnectFailed { .. }));
        assert!(!client.connected());
    }

    #[tokio::test]
    async fn test_execute_without_session_fails() {
        let prompts = PromptConfig::uboot(&PromptOverrides::default(), 1).unwrap();
        let mut client = SerialClient::new(
            "/dev/ttyUSB0",
            Credentials::default(),
            prompts,
            Duration::from_secs(1),
        );

        let err = client.execute("printenv").await.unwrap_err();
        assert!(matches!(err, Error::CommandFailed(_)));
    }
}
