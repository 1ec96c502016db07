//! SSH transport implementation using russh.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use log::{debug, warn};
use russh::client::{self, Handle, Msg};
use russh::keys::{PrivateKeyWithHashAlg, PublicKey, load_secret_key};
use russh::{Channel, ChannelStream};
use secrecy::ExposeSecret;

use super::config::{AuthMethod, HostKeyVerification, SshConfig};
use crate::error::{Result, TransportError};

/// An authenticated SSH connection, possibly tunnelled through a jump host.
pub struct SshTransport {
    /// The russh session handle.
    session: Handle<SshHandler>,

    /// Configuration used for this connection.
    config: SshConfig,

    /// Jump host carrying this connection; must outlive `session`.
    jump: Option<Box<SshTransport>>,
}

impl SshTransport {
    /// Connect to the SSH server and authenticate.
    pub async fn connect(config: SshConfig) -> Result<Self> {
        let session = Self::handshake(&config, None).await?;
        Ok(Self {
            session,
            config,
            jump: None,
        })
    }

    /// Connect through a jump host.
    ///
    /// Authenticates to the jump host, opens a `direct-tcpip` channel to the
    /// device and runs the device's SSH handshake over that channel.
    pub async fn connect_via(jump: SshConfig, config: SshConfig) -> Result<Self> {
        let jump = Self::connect(jump).await?;
        debug!(
            "Opening tunnel to {} via {}",
            config.socket_addr(),
            jump.config.socket_addr()
        );

        let channel = jump
            .session
            .channel_open_direct_tcpip(config.host.clone(), u32::from(config.port), "127.0.0.1", 0)
            .await
            .map_err(TransportError::Ssh)?;

        let session = Self::handshake(&config, Some(channel.into_stream())).await?;
        Ok(Self {
            session,
            config,
            jump: Some(Box::new(jump)),
        })
    }

    /// Run the SSH handshake over TCP, or over `stream` when tunnelling, and
    /// authenticate.
    async fn handshake(
        config: &SshConfig,
        stream: Option<ChannelStream<Msg>>,
    ) -> Result<Handle<SshHandler>> {
        let ssh_config = Arc::new(client::Config {
            inactivity_timeout: Some(config.timeout),
            ..Default::default()
        });

        let host_key_error: Arc<Mutex<Option<TransportError>>> = Arc::new(Mutex::new(None));

        let handler = SshHandler {
            host: config.host.clone(),
            port: config.port,
            host_key_verification: config.host_key_verification,
            known_hosts_path: config.known_hosts_path.clone(),
            host_key_error: host_key_error.clone(),
        };

        let connecting = async {
            match stream {
                Some(stream) => client::connect_stream(ssh_config, stream, handler).await,
                None => {
                    client::connect(ssh_config, (config.host.as_str(), config.port), handler).await
                }
            }
        };

        let mut session = tokio::time::timeout(config.timeout, connecting)
            .await
            .map_err(|_| TransportError::Timeout(config.timeout))?
            .map_err(|e| {
                // Prefer the detailed host-key error over russh's generic one.
                if let Some(hk_err) = host_key_error.lock().ok().and_then(|mut slot| slot.take()) {
                    return hk_err;
                }
                match e {
                    russh::Error::IO(source) => TransportError::ConnectionFailed {
                        host: config.host.clone(),
                        port: config.port,
                        source,
                    },
                    other => TransportError::Ssh(other),
                }
            })?;

        tokio::time::timeout(config.timeout, Self::authenticate(&mut session, config))
            .await
            .map_err(|_| TransportError::Timeout(config.timeout))??;

        Ok(session)
    }

    /// Open a new PTY shell channel on this connection.
    pub async fn open_channel(&self) -> Result<Channel<Msg>> {
        let channel = self
            .session
            .channel_open_session()
            .await
            .map_err(TransportError::Ssh)?;

        channel
            .request_pty(
                true,
                "xterm",
                self.config.terminal_width,
                self.config.terminal_height,
                0,
                0,
                &[],
            )
            .await
            .map_err(TransportError::Ssh)?;

        channel
            .request_shell(true)
            .await
            .map_err(TransportError::Ssh)?;

        Ok(channel)
    }

    /// Authenticate with the server.
    async fn authenticate(session: &mut Handle<SshHandler>, config: &SshConfig) -> Result<()> {
        let username = config.username();
        let success = match &config.credential.auth {
            AuthMethod::Password(password) => session
                .authenticate_password(username, password.expose_secret())
                .await
                .map_err(TransportError::Ssh)?
                .success(),
            AuthMethod::PrivateKey { path, passphrase } => {
                let passphrase = passphrase.as_ref().map(|p| p.expose_secret());
                let key = load_secret_key(path, passphrase)
                    .map_err(|e| TransportError::Key(e.to_string()))?;

                // Get the best RSA hash algorithm supported by the server
                let hash_alg = session
                    .best_supported_rsa_hash()
                    .await
                    .map_err(TransportError::Ssh)?
                    .flatten();

                session
                    .authenticate_publickey(
                        username,
                        PrivateKeyWithHashAlg::new(Arc::new(key), hash_alg),
                    )
                    .await
                    .map_err(TransportError::Ssh)?
                    .success()
            }
        };

        if !success {
            return Err(TransportError::AuthenticationFailed {
                user: username.to_string(),
            }
            .into());
        }

        Ok(())
    }

    /// Close the connection, then the jump host connection if any.
    pub async fn close(self) -> Result<()> {
        let closed = self
            .session
            .disconnect(russh::Disconnect::ByApplication, "", "en")
            .await
            .map_err(TransportError::Ssh);

        if let Some(jump) = self.jump {
            if let Err(e) = Box::pin(jump.close()).await {
                debug!("Closing jump host connection: {}", e);
            }
        }

        closed?;
        Ok(())
    }
}

/// SSH client handler for russh.
struct SshHandler {
    host: String,
    port: u16,
    host_key_verification: HostKeyVerification,
    known_hosts_path: Option<PathBuf>,
    /// Stores a detailed host-key error so connect() can surface it
    /// instead of the generic russh::Error::UnknownKey.
    host_key_error: Arc<Mutex<Option<TransportError>>>,
}

impl SshHandler {
    /// Check the host key against known_hosts.
    ///
    /// Returns `Ok(true)` if matched, `Ok(false)` if host not found,
    /// `Err(TransportError::HostKeyChanged)` if key changed.
    fn check_known_hosts(&self, pubkey: &PublicKey) -> std::result::Result<bool, TransportError> {
        let result = if let Some(ref path) = self.known_hosts_path {
            russh::keys::check_known_hosts_path(&self.host, self.port, pubkey, path)
        } else {
            russh::keys::check_known_hosts(&self.host, self.port, pubkey)
        };

        match result {
            Ok(matched) => Ok(matched),
            Err(russh::keys::Error::KeyChanged { line }) => Err(TransportError::HostKeyChanged {
                host: self.host.clone(),
                port: self.port,
                line,
            }),
            Err(e) => Err(TransportError::KnownHosts(e.to_string())),
        }
    }

    /// Save a new host key to known_hosts.
    fn learn_host_key(&self, pubkey: &PublicKey) -> std::result::Result<(), TransportError> {
        let result = if let Some(ref path) = self.known_hosts_path {
            russh::keys::known_hosts::learn_known_hosts_path(&self.host, self.port, pubkey, path)
        } else {
            russh::keys::known_hosts::learn_known_hosts(&self.host, self.port, pubkey)
        };

        result.map_err(|e| TransportError::KnownHosts(e.to_string()))
    }

    /// Record why the key was rejected.
    fn reject(&self, err: TransportError) -> bool {
        warn!("Rejecting host key for {}:{}: {}", self.host, self.port, err);
        if let Ok(mut slot) = self.host_key_error.lock() {
            *slot = Some(err);
        }
        false
    }
}

impl client::Handler for SshHandler {
    type Error = russh::Error;

    async fn check_server_key(
        &mut self,
        server_public_key: &PublicKey,
    ) -> std::result::Result<bool, Self::Error> {
        let accepted = match self.host_key_verification {
            HostKeyVerification::Disabled => true,

            HostKeyVerification::AcceptNew => match self.check_known_hosts(server_public_key) {
                Ok(true) => true,
                Ok(false) => {
                    if let Err(e) = self.learn_host_key(server_public_key) {
                        warn!("Failed to save host key: {}", e);
                    }
                    true
                }
                Err(e) => self.reject(e),
            },

            HostKeyVerification::Strict => match self.check_known_hosts(server_public_key) {
                Ok(true) => true,
                Ok(false) => self.reject(TransportError::HostKeyUnknown {
                    host: self.host.clone(),
                    port: self.port,
                }),
                Err(e) => self.reject(e),
            },
        };
        Ok(accepted)
    }
}
