//! SSH execution via libssh2

use std::io::Read;
use std::net::TcpStream;
use std::time::Duration;

use async_trait::async_trait;
use ssh2::{DisconnectCode, Session};
use tokio::task;
use tracing::debug;

use crate::common::{config::Timeouts, Error, Result};

use super::{Client, Credentials};

const DEFAULT_PORT: u16 = 22;

/// Runs commands on a remote host over SSH with password authentication
///
/// libssh2 is synchronous, so every session operation runs inside
/// `block_in_place` to keep the runtime's worker threads responsive.
pub struct SshClient {
    resource: String,
    port: u16,
    credentials: Credentials,
    timeouts: Timeouts,
    session: Option<Session>,
}

impl SshClient {
    pub fn new(
        resource: &str,
        port: Option<u16>,
        credentials: Credentials,
        timeouts: Timeouts,
    ) -> Self {
        Self {
            resource: resource.to_string(),
            port: port.unwrap_or(DEFAULT_PORT),
            credentials,
            timeouts,
            session: None,
        }
    }

    fn open_session(&self) -> Result<Session> {
        let address = format!("{}:{}", self.resource, self.port);
        let username = self.credentials.require_username()?;
        let password = self.credentials.require_password()?;

        let stream = TcpStream::connect(&address)
            .map_err(|e| Error::connect_failed(&address, e.to_string()))?;

        let mut session =
            Session::new().map_err(|e| Error::connect_failed(&address, e.to_string()))?;
        session.set_tcp_stream(stream);
        session.set_timeout(
            Duration::from_secs(self.timeouts.connect_secs)
                .as_millis()
                .min(u32::MAX as u128) as u32,
        );
        session
            .handshake()
            .map_err(|e| Error::connect_failed(&address, e.to_string()))?;
        session
            .userauth_password(username, password)
            .map_err(|e| Error::connect_failed(&address, e.to_string()))?;

        session.set_timeout(
            Duration::from_secs(self.timeouts.command_secs)
                .as_millis()
                .min(u32::MAX as u128) as u32,
        );
        Ok(session)
    }

    fn run(&self, session: &Session, command: &str) -> Result<String> {
        // Login shell, so the remote PATH and environment match an
        // interactive session
        let wrapped = format!("/bin/sh -l -c '{command}'");
        debug!("executing '{}' on {}", command, self.resource);

        let mut channel = session
            .channel_session()
            .map_err(|e| Error::CommandFailed(e.to_string()))?;
        channel
            .exec(&wrapped)
            .map_err(|e| Error::CommandFailed(e.to_string()))?;

        let mut stdout = String::new();
        channel
            .read_to_string(&mut stdout)
            .map_err(|e| Error::CommandFailed(e.to_string()))?;
        let mut stderr = String::new();
        channel
            .stderr()
            .read_to_string(&mut stderr)
            .map_err(|e| Error::CommandFailed(e.to_string()))?;

        channel
            .wait_close()
            .map_err(|e| Error::CommandFailed(e.to_string()))?;
        let status = channel
            .exit_status()
            .map_err(|e| Error::CommandFailed(e.to_string()))?;

        if status != 0 {
            let reason = stderr
                .lines()
                .rev()
                .find(|l| !l.trim().is_empty())
                .map(str::to_string)
                .unwrap_or_else(|| format!("command exited with code {status}"));
            return Err(Error::CommandFailed(reason));
        }

        Ok(stdout)
    }
}

#[async_trait]
impl Client for SshClient {
    fn resource(&self) -> &str {
        &self.resource
    }

    fn connected(&self) -> bool {
        self.session.is_some()
    }

    async fn connect(&mut self) -> Result<()> {
        // Credential errors surface before any blocking work
        self.credentials.require_username()?;
        self.credentials.require_password()?;

        let session = task::block_in_place(|| self.open_session())?;
        self.session = Some(session);
        debug!("connected to {}:{}", self.resource, self.port);
        Ok(())
    }

    async fn disconnect(&mut self) {
        if let Some(session) = self.session.take() {
            task::block_in_place(|| {
                if let Err(e) =
                    session.disconnect(Some(DisconnectCode::ByApplication), "closing", None)
                {
                    debug!("ssh disconnect from {} failed: {}", self.resource, e);
                }
            });
        }
    }

    async fn execute(&mut self, command: &str) -> Result<String> {
        let session = self
            .session
            .as_ref()
            .ok_or_else(|| Error::CommandFailed("not connected".to_string()))?;
        task::block_in_place(|| self.run(session, command))
    }
}
