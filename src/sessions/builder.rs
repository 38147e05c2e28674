use crate::sessions::config::SessionConfig;
use crate::sessions::network_session::NetworkSession;
use crate::{DriftlineError, Transport};

/// The [`SessionBuilder`] builds a [`NetworkSession`].
///
/// After setting all appropriate values, use
/// [`start_session`](SessionBuilder::start_session) to consume the builder and
/// create the session over a transport of your choice.
///
/// # Example
///
/// ```
/// use driftline::{loopback_pair, SessionBuilder, SessionConfig};
///
/// let (transport, _server) = loopback_pair();
/// let mut session = SessionBuilder::new()
///     .with_config(SessionConfig::lan())
///     .with_auth_token("secret")
///     .start_session(transport)
///     .unwrap();
/// session.connect().unwrap();
/// ```
#[derive(Debug, Clone, Default)]
#[must_use = "SessionBuilder must be consumed by calling start_session"]
pub struct SessionBuilder {
    config: SessionConfig,
    auth_token: Option<String>,
}

impl SessionBuilder {
    /// Construct a new builder with all values set to their defaults.
    pub fn new() -> Self {
        Self {
            config: SessionConfig::default(),
            auth_token: None,
        }
    }

    /// Sets the session configuration. See [`SessionConfig`] for defaults and
    /// presets.
    pub fn with_config(mut self, config: SessionConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the auth token attached to connect requests.
    pub fn with_auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    /// Consumes the builder and starts a session over the given transport.
    /// The session starts disconnected; call [`NetworkSession::connect`] to
    /// begin the handshake.
    ///
    /// # Errors
    ///
    /// Returns [`DriftlineError::ConfigOutOfRange`] if the configuration fails
    /// [`SessionConfig::validate`].
    pub fn start_session<T: Transport>(
        self,
        transport: T,
    ) -> Result<NetworkSession<T>, DriftlineError> {
        self.config.validate()?;
        Ok(NetworkSession::new(transport, self.config, self.auth_token))
    }
}
