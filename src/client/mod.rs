//! Transport clients
//!
//! A client gives the engine a uniform connect/execute/disconnect
//! capability against one execution context: the local machine, an SSH
//! host, or a device behind a serial console, telnet daemon or
//! bootloader shell. Clients are selected once, at construction time, by
//! a scheme-keyed factory; nothing downstream inspects the variant.

pub mod local;
pub mod serial;
pub mod session;
pub mod ssh;
pub mod telnet;

use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use crate::common::{config::Config, Error, Result};
use crate::target::TargetUri;

pub use local::LocalClient;
pub use serial::SerialClient;
pub use session::PromptConfig;
pub use ssh::SshClient;
pub use telnet::TelnetClient;

/// Optional username/password pair for a transport
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    pub username: Option<String>,
    pub password: Option<String>,
}

impl Credentials {
    pub fn new(username: Option<String>, password: Option<String>) -> Self {
        Self { username, password }
    }

    /// Username, or `MissingCredentials` if absent
    pub fn require_username(&self) -> Result<&str> {
        self.username
            .as_deref()
            .ok_or(Error::MissingCredentials("missing username"))
    }

    /// Password, or `MissingCredentials` if absent
    pub fn require_password(&self) -> Result<&str> {
        self.password
            .as_deref()
            .ok_or(Error::MissingCredentials("missing password"))
    }
}

/// Uniform capability for interacting with a local or remote machine
///
/// `disconnect` is deliberately infallible: teardown is best-effort and
/// must tolerate a client that never connected. Clients log their own
/// close failures instead of raising them.
#[async_trait]
pub trait Client: Send {
    /// Resource locator this client talks to (hostname, device path, or
    /// "localhost")
    fn resource(&self) -> &str;

    /// Whether the client currently holds a usable session
    fn connected(&self) -> bool;

    /// Establish the session
    async fn connect(&mut self) -> Result<()>;

    /// Tear the session down; never fails
    async fn disconnect(&mut self);

    /// Run one command and return its output
    async fn execute(&mut self, command: &str) -> Result<String>;
}

/// Create a client for a target URI
///
/// Scheme mapping: `local` ⇒ host process execution, `ssh` ⇒ SSH,
/// `serial`/`stty` ⇒ serial console, `telnet` ⇒ telnet, `uboot` ⇒
/// bootloader shell over serial. Anything else is `UnsupportedScheme`.
pub fn create_client(uri: &TargetUri, config: &Config) -> Result<Box<dyn Client>> {
    let credentials = Credentials::new(uri.username.clone(), uri.password.clone());
    let timeouts = config.timeouts.clone();
    let connect_timeout = Duration::from_secs(timeouts.connect_secs);

    let client: Box<dyn Client> = match uri.scheme.as_str() {
        "local" => Box::new(LocalClient::new()),
        "ssh" => Box::new(SshClient::new(&uri.resource, uri.port, credentials, timeouts)),
        "serial" | "stty" => {
            let prompts = PromptConfig::serial(&config.prompts, timeouts.command_secs)?;
            Box::new(SerialClient::new(
                &uri.resource,
                credentials,
                prompts,
                connect_timeout,
            ))
        }
        "telnet" => {
            let prompts = PromptConfig::telnet(&config.prompts, timeouts.command_secs)?;
            Box::new(TelnetClient::new(
                &uri.resource,
                uri.port,
                credentials,
                prompts,
                connect_timeout,
            ))
        }
        "uboot" => {
            let prompts = PromptConfig::uboot(&config.prompts, timeouts.command_secs)?;
            Box::new(SerialClient::new(
                &uri.resource,
                credentials,
                prompts,
                connect_timeout,
            ))
        }
        scheme => return Err(Error::UnsupportedScheme(scheme.to_string())),
    };

    debug!("created client for scheme '{}'", uri.scheme);
    Ok(client)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(uri: &str) -> TargetUri {
        TargetUri::parse(uri).unwrap()
    }

    #[test]
    fn test_factory_accepts_known_schemes() {
        let config = Config::default();
        for uri in [
            "local://localhost",
            "ssh://devboard",
            "serial:///dev/ttyUSB0",
            "stty:///dev/ttyS0",
            "telnet://10.0.0.2",
            "uboot:///dev/ttyUSB1",
        ] {
            assert!(create_client(&parse(uri), &config).is_ok(), "{uri}");
        }
    }

    #[test]
    fn test_factory_rejects_unknown_scheme() {
        let config = Config::default();
        let Err(err) = create_client(&parse("ftp://devboard"), &config) else {
            panic!("the ftp scheme must be rejected");
        };
        assert!(matches!(err, Error::UnsupportedScheme(s) if s == "ftp"));
    }

    #[test]
    fn test_require_credentials() {
        let creds = Credentials::new(Some("root".into()), None);
        assert_eq!(creds.require_username().unwrap(), "root");
        assert!(matches!(
            creds.require_password(),
            Err(Error::MissingCredentials(_))
        ));
    }
}
