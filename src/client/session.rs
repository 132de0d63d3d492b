//! Interactive line-oriented sessions
//!
//! Serial, telnet and bootloader transports all speak to a shell over a
//! character stream: send a line, collect everything echoed back until
//! the shell prompt reappears. `Session` implements that expect loop
//! generically over any `AsyncRead + AsyncWrite` stream; the prompt
//! patterns, login sequence and inter-command delay are per-instance
//! configuration.

use std::time::Duration;

use regex::Regex;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::time::Instant;
use tracing::debug;

use crate::common::{config::PromptOverrides, Error, Result};

use super::Credentials;

/// EOT, sent to terminate a login shell on disconnect
const INTERRUPT_SEQUENCE: &[u8] = b"\x04";

/// Prompt patterns and timing for one interactive transport instance
#[derive(Debug, Clone)]
pub struct PromptConfig {
    /// Pattern marking the shell prompt
    pub shell_prompt: Regex,
    /// Pattern marking the login prompt; setting it enables the login
    /// sequence on connect
    pub login_prompt: Option<Regex>,
    /// Pattern marking the password prompt
    pub password_prompt: Option<Regex>,
    /// Delay before each command, letting slow consoles settle
    pub command_delay: Duration,
    /// Bounded wait for any expected pattern
    pub timeout: Duration,
}

impl PromptConfig {
    /// Defaults for a serial console: plain `# ` prompt, no login
    pub fn serial(overrides: &PromptOverrides, timeout_secs: u64) -> Result<Self> {
        Self::build(overrides, "# ", None, None, Duration::from_millis(100), timeout_secs)
    }

    /// Defaults for a telnet session: login + password prompts enabled
    pub fn telnet(overrides: &PromptOverrides, timeout_secs: u64) -> Result<Self> {
        Self::build(
            overrides,
            r"[\w]+@[\w-]+:~# ",
            Some(r"[\w-]+ login: "),
            Some("Password: "),
            Duration::ZERO,
            timeout_secs,
        )
    }

    /// Defaults for a U-Boot shell: `=> `-style prompt, no login
    pub fn uboot(overrides: &PromptOverrides, timeout_secs: u64) -> Result<Self> {
        Self::build(
            overrides,
            r"[\w]+ > ",
            None,
            None,
            Duration::from_millis(100),
            timeout_secs,
        )
    }

    fn build(
        overrides: &PromptOverrides,
        shell: &str,
        login: Option<&str>,
        password: Option<&str>,
        command_delay: Duration,
        timeout_secs: u64,
    ) -> Result<Self> {
        let shell = overrides.shell.as_deref().unwrap_or(shell);
        let login = overrides.login.as_deref().or(login);
        let password = overrides.password.as_deref().or(password);

        Ok(Self {
            shell_prompt: compile(shell)?,
            login_prompt: login.map(compile).transpose()?,
            password_prompt: password.map(compile).transpose()?,
            command_delay,
            timeout: Duration::from_secs(timeout_secs),
        })
    }
}

fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|e| Error::InvalidPattern {
        pattern: pattern.to_string(),
        error: e.to_string(),
    })
}

/// Telnet inbound filter state: IAC command and option-negotiation
/// sequences are interleaved with the data stream and may be split
/// across reads
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum IacState {
    Normal,
    Command,
    Negotiation,
}

/// An expect-style session over a character stream
pub struct Session<S> {
    stream: S,
    buffer: String,
    timeout: Duration,
    strip_iac: bool,
    iac_state: IacState,
}

impl<S: AsyncRead + AsyncWrite + Unpin + Send> Session<S> {
    pub fn new(stream: S, timeout: Duration) -> Self {
        Self {
            stream,
            buffer: String::new(),
            timeout,
            strip_iac: false,
            iac_state: IacState::Normal,
        }
    }

    /// Enable telnet IAC stripping on the inbound stream
    pub fn with_iac_stripping(mut self) -> Self {
        self.strip_iac = true;
        self
    }

    /// Discard everything captured since the last expect
    pub fn reset(&mut self) {
        self.buffer.clear();
    }

    /// Replace the bound on pattern waits; connect sequences run under
    /// the connect timeout, commands under the command timeout
    pub fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = timeout;
    }

    /// Send a line, including the line terminator
    ///
    /// Line and terminator go out as one write so the peer sees a
    /// single frame.
    pub async fn send(&mut self, line: &str) -> Result<()> {
        debug!("sending '{}'", line);
        let mut frame = Vec::with_capacity(line.len() + 1);
        frame.extend_from_slice(line.as_bytes());
        frame.push(b'\n');
        self.stream.write_all(&frame).await?;
        self.stream.flush().await?;
        Ok(())
    }

    /// Send raw bytes without a terminator (interrupt sequences)
    pub async fn send_raw(&mut self, bytes: &[u8]) -> Result<()> {
        self.stream.write_all(bytes).await?;
        self.stream.flush().await?;
        Ok(())
    }

    /// Wait for a pattern to appear on the stream
    ///
    /// Returns every line captured since the last reset, minus the
    /// first (the echoed command) and the last (the prompt line
    /// itself). The wait is bounded by the session timeout.
    pub async fn expect(&mut self, pattern: &Regex) -> Result<Vec<String>> {
        debug!("expecting '{}'", pattern.as_str());
        let deadline = Instant::now() + self.timeout;
        let mut chunk = [0u8; 4096];

        loop {
            if let Some(end) = pattern.find(&self.buffer).map(|m| m.end()) {
                let consumed: String = self.buffer.drain(..end).collect();
                return Ok(inner_lines(&consumed));
            }

            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(Error::Timeout(self.timeout.as_secs()));
            }
            let read = tokio::time::timeout(remaining, self.stream.read(&mut chunk))
                .await
                .map_err(|_| Error::Timeout(self.timeout.as_secs()))??;
            if read == 0 {
                return Err(Error::CommandFailed("connection closed by peer".to_string()));
            }
            self.feed(&chunk[..read]);
        }
    }

    fn feed(&mut self, bytes: &[u8]) {
        if self.strip_iac {
            let mut data = Vec::with_capacity(bytes.len());
            for &b in bytes {
                match self.iac_state {
                    IacState::Normal => {
                        if b == 0xFF {
                            self.iac_state = IacState::Command;
                        } else {
                            data.push(b);
                        }
                    }
                    IacState::Command => match b {
                        // Escaped 0xFF data byte
                        0xFF => {
                            data.push(0xFF);
                            self.iac_state = IacState::Normal;
                        }
                        // WILL/WONT/DO/DONT carry one option byte
                        0xFB..=0xFE => self.iac_state = IacState::Negotiation,
                        _ => self.iac_state = IacState::Normal,
                    },
                    IacState::Negotiation => self.iac_state = IacState::Normal,
                }
            }
            self.buffer.push_str(&String::from_utf8_lossy(&data));
        } else {
            self.buffer.push_str(&String::from_utf8_lossy(bytes));
        }
    }
}

/// Split captured output into lines and drop the echoed command line
/// and the trailing prompt line
fn inner_lines(captured: &str) -> Vec<String> {
    let lines: Vec<String> = captured
        .split('\n')
        .map(|l| l.trim_end_matches('\r').to_string())
        .collect();
    if lines.len() <= 2 {
        return Vec::new();
    }
    lines[1..lines.len() - 1].to_vec()
}

/// Run the login sequence configured for this transport
///
/// No-op when no login prompt is configured (bootloader shells, raw
/// serial consoles).
pub async fn login<S>(
    session: &mut Session<S>,
    prompts: &PromptConfig,
    credentials: &Credentials,
) -> Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    let Some(login_prompt) = &prompts.login_prompt else {
        return Ok(());
    };

    let username = credentials.require_username()?.to_string();
    session.expect(login_prompt).await?;
    session.send(&username).await?;

    if let Some(password) = credentials.password.clone() {
        if let Some(password_prompt) = &prompts.password_prompt {
            session.expect(password_prompt).await?;
        }
        session.send(&password).await?;
    }

    session.expect(&prompts.shell_prompt).await?;
    Ok(())
}

/// Terminate the login shell; best-effort
pub async fn logout<S>(session: &mut Session<S>, prompts: &PromptConfig)
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    if prompts.login_prompt.is_some() {
        if let Err(e) = session.send_raw(INTERRUPT_SEQUENCE).await {
            debug!("failed to send interrupt sequence: {}", e);
        }
    }
}

/// Execute one command through the session
pub async fn run_command<S>(
    session: &mut Session<S>,
    prompts: &PromptConfig,
    command: &str,
) -> Result<String>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    if !prompts.command_delay.is_zero() {
        tokio::time::sleep(prompts.command_delay).await;
    }
    session.reset();
    session.send(command).await?;
    let lines = session.expect(&prompts.shell_prompt).await?;
    Ok(lines.join("\n"))
}
