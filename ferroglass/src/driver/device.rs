//! Driver for one device session.

use std::sync::Arc;
use std::time::{Duration, Instant};

use log::debug;

use super::response::Response;
use crate::channel::PtyChannel;
use crate::error::{ChannelError, Result};
use crate::platform::{DefaultBehavior, PlatformDefinition, VendorBehavior};
use crate::transport::{SshConfig, SshTransport};

/// Drives a device CLI over SSH according to its platform definition.
///
/// Handles:
/// - connecting, directly or through a jump host
/// - waiting for the prompt and running the platform's on-open commands
/// - command execution with prompt detection
/// - output normalization and failure-pattern detection
pub struct DeviceDriver {
    ssh_config: SshConfig,
    jump_host: Option<SshConfig>,
    platform: Arc<PlatformDefinition>,
    behavior: Arc<dyn VendorBehavior>,
    transport: Option<SshTransport>,
    channel: Option<PtyChannel>,

    /// Timeout for each prompt wait.
    timeout: Duration,
}

impl DeviceDriver {
    /// Create a driver. The PTY size comes from the platform definition.
    pub fn new(ssh_config: SshConfig, platform: Arc<PlatformDefinition>) -> Self {
        let ssh_config =
            ssh_config.with_terminal_size(platform.terminal_width, platform.terminal_height);
        let behavior = platform
            .behavior
            .clone()
            .unwrap_or_else(|| Arc::new(DefaultBehavior));

        Self {
            timeout: ssh_config.timeout,
            ssh_config,
            jump_host: None,
            platform,
            behavior,
            transport: None,
            channel: None,
        }
    }

    /// Connect through a jump host.
    pub fn with_jump_host(mut self, jump_host: SshConfig) -> Self {
        self.jump_host = Some(jump_host);
        self
    }

    /// Set the prompt wait timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Whether a session is open.
    pub fn is_open(&self) -> bool {
        self.channel.is_some()
    }

    /// Platform definition in use.
    pub fn platform(&self) -> &PlatformDefinition {
        &self.platform
    }

    /// Connect, wait for the first prompt and prepare the CLI.
    pub async fn open(&mut self) -> Result<()> {
        if self.is_open() {
            return Ok(());
        }

        let transport = match &self.jump_host {
            Some(jump) => SshTransport::connect_via(jump.clone(), self.ssh_config.clone()).await?,
            None => SshTransport::connect(self.ssh_config.clone()).await?,
        };
        let mut channel = PtyChannel::new(transport.open_channel().await?);
        self.transport = Some(transport);

        let banner = channel
            .read_until(&self.platform.prompt_pattern, self.timeout)
            .await?;
        debug!(
            "{}: connected, {} byte banner",
            self.ssh_config.socket_addr(),
            banner.len()
        );
        self.channel = Some(channel);

        // A rejected pager command would leave later output stuck at --More--.
        for command in self.platform.on_open_commands.clone() {
            self.send_command(&command).await?.into_output()?;
        }
        Ok(())
    }

    /// Send a command and wait for the prompt.
    pub async fn send_command(&mut self, command: &str) -> Result<Response> {
        let channel = self.channel.as_mut().ok_or(ChannelError::Closed)?;
        let start = Instant::now();

        channel.send_line(command).await?;
        let data = channel
            .read_until(&self.platform.prompt_pattern, self.timeout)
            .await?;

        let elapsed = start.elapsed();
        let raw_result = String::from_utf8_lossy(&data).to_string();
        let prompt = raw_result
            .rsplit('\n')
            .next()
            .unwrap_or_default()
            .trim()
            .to_string();

        let normalized = self.behavior.normalize_output(&raw_result, command);
        let result = self.behavior.post_process_output(&normalized);
        let failure_message = self.platform.detect_failure(&result).map(str::to_string);

        debug!(
            "{}: '{}' returned {} bytes in {:?}",
            self.ssh_config.socket_addr(),
            command,
            result.len(),
            elapsed
        );

        Ok(Response {
            command: command.to_string(),
            result,
            raw_result,
            prompt,
            elapsed,
            failure_message,
        })
    }

    /// Send several commands in order on the same session.
    ///
    /// Stops at the first transport error; failed commands are returned as
    /// responses with `failure_message` set.
    pub async fn send_commands(&mut self, commands: &[String]) -> Result<Vec<Response>> {
        let mut responses = Vec::with_capacity(commands.len());
        for command in commands {
            responses.push(self.send_command(command).await?);
        }
        Ok(responses)
    }

    /// Close the channel and the connection.
    pub async fn close(&mut self) -> Result<()> {
        if let Some(channel) = self.channel.take() {
            if let Err(e) = channel.close().await {
                debug!("{}: closing channel: {}", self.ssh_config.socket_addr(), e);
            }
        }
        if let Some(transport) = self.transport.take() {
            transport.close().await?;
        }
        Ok(())
    }
}
