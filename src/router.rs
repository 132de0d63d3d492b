//! Command routing across execution contexts
//!
//! Test commands run against the remote target by default, but setup
//! and teardown steps often need the local machine too (start a TFTP
//! server, toggle a relay). A command may therefore carry a context
//! prefix, `host(mkdir /srv/tftp)`, naming the client it should run
//! on. The router owns all registered clients and their connection
//! lifecycle.

use tracing::debug;

use crate::client::Client;
use crate::common::{Error, Result};

/// Context name for the machine the engine runs on
pub const HOST_CONTEXT: &str = "host";
/// Context name for the default remote target
pub const TARGET_CONTEXT: &str = "target";

/// Dispatches commands to named clients by prefix
pub struct CommandRouter {
    clients: Vec<(String, Box<dyn Client>)>,
    default_context: String,
}

impl CommandRouter {
    /// Router with a single default context
    pub fn new(name: &str, client: Box<dyn Client>) -> Self {
        Self {
            clients: vec![(name.to_string(), client)],
            default_context: name.to_string(),
        }
    }

    /// Register an additional context; keeps the original default
    pub fn register(&mut self, name: &str, client: Box<dyn Client>) {
        self.clients.push((name.to_string(), client));
    }

    /// Connect every client, in registration order
    pub async fn setup(&mut self) -> Result<()> {
        for (name, client) in &mut self.clients {
            debug!("connecting context '{}' ({})", name, client.resource());
            client.connect().await?;
        }
        Ok(())
    }

    /// Disconnect every client; best-effort, never fails
    pub async fn teardown(&mut self) {
        for (name, client) in &mut self.clients {
            debug!("disconnecting context '{}'", name);
            client.disconnect().await;
        }
    }

    /// Route one command to the context its prefix names
    ///
    /// Without a prefix the command goes to the default context. A
    /// prefix naming no registered context is an error; the payload is
    /// passed through verbatim, including any nested parentheses.
    pub async fn execute(&mut self, command: &str) -> Result<String> {
        let (context, payload) = split_context(command)
            .unwrap_or((self.default_context.as_str(), command));

        let client = self
            .clients
            .iter_mut()
            .find(|(name, _)| name == context)
            .map(|(_, client)| client)
            .ok_or_else(|| Error::UnknownContext(context.to_string()))?;

        client.execute(payload).await
    }
}

/// Parse a `name(payload)` context prefix
///
/// Returns `None` when the command carries no well-formed prefix, in
/// which case the whole string is the payload.
fn split_context(command: &str) -> Option<(&str, &str)> {
    let open = command.find('(')?;
    let name = &command[..open];

    let mut chars = name.chars();
    let first = chars.next()?;
    if !(first.is_ascii_alphabetic() || first == '_') {
        return None;
    }
    if !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return None;
    }
    if !command.ends_with(')') {
        return None;
    }

    Some((name, &command[open + 1..command.len() - 1]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::{Arc, Mutex};

    /// Records every call it receives and answers with a canned string
    struct FakeClient {
        label: &'static str,
        log: Arc<Mutex<Vec<String>>>,
        connected: bool,
        fail_connect: bool,
    }

    impl FakeClient {
        fn new(label: &'static str, log: Arc<Mutex<Vec<String>>>) -> Box<Self> {
            Box::new(Self {
                label,
                log,
                connected: false,
                fail_connect: false,
            })
        }

        fn failing(label: &'static str, log: Arc<Mutex<Vec<String>>>) -> Box<Self> {
            let mut client = Self::new(label, log);
            client.fail_connect = true;
            client
        }
    }

    #[async_trait]
    impl Client for FakeClient {
        fn resource(&self) -> &str {
            self.label
        }

        fn connected(&self) -> bool {
            self.connected
        }

        async fn connect(&mut self) -> Result<()> {
            self.log.lock().unwrap().push(format!("connect {}", self.label));
            if self.fail_connect {
                return Err(Error::connect_failed(self.label, "connection refused"));
            }
            self.connected = true;
            Ok(())
        }

        async fn disconnect(&mut self) {
            self.connected = false;
            self.log
                .lock()
                .unwrap()
                .push(format!("disconnect {}", self.label));
        }

        async fn execute(&mut self, command: &str) -> Result<String> {
            self.log
                .lock()
                .unwrap()
                .push(format!("{}: {}", self.label, command));
            Ok(format!("{} ran {}", self.label, command))
        }
    }

    fn router_with_host() -> (CommandRouter, Arc<Mutex<Vec<String>>>) {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut router =
            CommandRouter::new(TARGET_CONTEXT, FakeClient::new("target", log.clone()));
        router.register(HOST_CONTEXT, FakeClient::new("host", log.clone()));
        (router, log)
    }

    #[tokio::test]
    async fn test_unprefixed_commands_go_to_default_context() {
        let (mut router, log) = router_with_host();
        router.execute("uname -r").await.unwrap();
        assert_eq!(log.lock().unwrap().as_slice(), ["target: uname -r"]);
    }

    #[tokio::test]
    async fn test_prefix_selects_context() {
        let (mut router, log) = router_with_host();
        router.execute("host(systemctl start tftpd)").await.unwrap();
        router.execute("target(reboot)").await.unwrap();
        assert_eq!(
            log.lock().unwrap().as_slice(),
            ["host: systemctl start tftpd", "target: reboot"]
        );
    }

    #[tokio::test]
    async fn test_nested_parentheses_stay_in_payload() {
        let (mut router, log) = router_with_host();
        router.execute("host(echo $(date))").await.unwrap();
        assert_eq!(log.lock().unwrap().as_slice(), ["host: echo $(date)"]);
    }

    #[tokio::test]
    async fn test_unknown_context_is_an_error() {
        let (mut router, _log) = router_with_host();
        let err = router.execute("relay(power off)").await.unwrap_err();
        assert!(matches!(err, Error::UnknownContext(ref c) if c == "relay"));
    }

    #[tokio::test]
    async fn test_malformed_prefix_is_plain_payload() {
        let (mut router, log) = router_with_host();
        // Not an identifier before '(' and no closing ')'
        router.execute("echo (hi").await.unwrap();
        router.execute("2host(x)").await.unwrap();
        assert_eq!(
            log.lock().unwrap().as_slice(),
            ["target: echo (hi", "target: 2host(x)"]
        );
    }

    #[tokio::test]
    async fn test_teardown_disconnects_all_after_failed_connect() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut router =
            CommandRouter::new(TARGET_CONTEXT, FakeClient::failing("target", log.clone()));
        router.register(HOST_CONTEXT, FakeClient::new("host", log.clone()));

        let err = router.setup().await.unwrap_err();
        assert!(matches!(err, Error::ConnectFailed { .. }));

        // Teardown tolerates clients that never connected
        router.teardown().await;
        assert_eq!(
            log.lock().unwrap().as_slice(),
            ["connect target", "disconnect target", "disconnect host"]
        );
    }

    #[tokio::test]
    async fn test_setup_and_teardown_cover_all_contexts() {
        let (mut router, log) = router_with_host();
        router.setup().await.unwrap();
        router.teardown().await;
        assert_eq!(
            log.lock().unwrap().as_slice(),
            [
                "connect target",
                "connect host",
                "disconnect target",
                "disconnect host"
            ]
        );
    }
}
