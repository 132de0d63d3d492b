//! Telnet execution

use std::time::Duration;

use async_trait::async_trait;
use tokio::net::TcpStream;
use tracing::debug;

use crate::common::{Error, Result};

use super::session::{self, PromptConfig, Session};
use super::{Client, Credentials};

const DEFAULT_PORT: u16 = 23;

/// Runs commands on a shell behind a telnet daemon
///
/// Option negotiation is not attempted; inbound IAC sequences are
/// stripped and the server's defaults are accepted by silence.
pub struct TelnetClient {
    resource: String,
    port: u16,
    credentials: Credentials,
    prompts: PromptConfig,
    connect_timeout: Duration,
    session: Option<Session<TcpStream>>,
}

impl TelnetClient {
    pub fn new(
        resource: &str,
        port: Option<u16>,
        credentials: Credentials,
        prompts: PromptConfig,
        connect_timeout: Duration,
    ) -> Self {
        Self {
            resource: resource.to_string(),
            port: port.unwrap_or(DEFAULT_PORT),
            credentials,
            prompts,
            connect_timeout,
            session: None,
        }
    }
}

#[async_trait]
impl Client for TelnetClient {
    fn resource(&self) -> &str {
        &self.resource
    }

    fn connected(&self) -> bool {
        self.session.is_some()
    }

    async fn connect(&mut self) -> Result<()> {
        let address = format!("{}:{}", self.resource, self.port);
        let stream = tokio::time::timeout(self.connect_timeout, TcpStream::connect(&address))
            .await
            .map_err(|_| Error::connect_failed(&address, "connection timed out"))?
            .map_err(|e| Error::connect_failed(&address, e.to_string()))?;

        // The login sequence counts against the connect timeout;
        // commands get the command timeout afterwards
        let mut session = Session::new(stream, self.connect_timeout).with_iac_stripping();
        session::login(&mut session, &self.prompts, &self.credentials).await?;
        session.set_timeout(self.prompts.timeout);

        self.session = Some(session);
        debug!("connected to telnet daemon at {}", address);
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
