//! PTY channel for interactive device sessions.

use std::time::Duration;

use bytes::Bytes;
use log::trace;
use regex::bytes::Regex;
use russh::client::Msg;
use russh::{Channel, ChannelMsg};

use super::buffer::PatternBuffer;
use crate::error::ChannelError;

/// An interactive shell channel with prompt-based reads.
pub struct PtyChannel {
    channel: Channel<Msg>,
    buffer: PatternBuffer,
}

impl PtyChannel {
    /// Wrap an open shell channel.
    pub fn new(channel: Channel<Msg>) -> Self {
        Self {
            channel,
            buffer: PatternBuffer::default(),
        }
    }

    /// Send raw input.
    pub async fn send(&mut self, input: &str) -> Result<(), ChannelError> {
        trace!("send: {:?}", input);
        self.channel
            .data(input.as_bytes())
            .await
            .map_err(ChannelError::Ssh)
    }

    /// Send a command followed by a newline.
    pub async fn send_line(&mut self, command: &str) -> Result<(), ChannelError> {
        self.send(&format!("{command}\n")).await
    }

    /// Read until `pattern` matches at the end of the received output.
    ///
    /// Returns everything up to and including the prompt. Fails with
    /// [`ChannelError::PatternTimeout`] if the prompt does not show up within
    /// `timeout`, and [`ChannelError::Closed`] if the device hangs up first.
    pub async fn read_until(
        &mut self,
        pattern: &Regex,
        timeout: Duration,
    ) -> Result<Bytes, ChannelError> {
        let deadline = tokio::time::Instant::now() + timeout;

        loop {
            if let Some(end) = self.buffer.find_prompt(pattern) {
                return Ok(self.buffer.take_through(end));
            }

            let msg = tokio::time::timeout_at(deadline, self.channel.wait())
                .await
                .map_err(|_| ChannelError::PatternTimeout(timeout))?;

            match msg {
                Some(ChannelMsg::Data { data }) => self.receive(&data),
                Some(ChannelMsg::ExtendedData { data, .. }) => self.receive(&data),
                Some(ChannelMsg::Eof | ChannelMsg::Close) | None => {
                    return Err(ChannelError::Closed);
                }
                Some(_) => {}
            }
        }
    }

    fn receive(&mut self, data: &[u8]) {
        trace!("recv: {:?}", String::from_utf8_lossy(data));
        self.buffer.extend(data);
    }

    /// Signal end of input and close the channel.
    pub async fn close(self) -> Result<(), ChannelError> {
        self.channel.eof().await.map_err(ChannelError::Ssh)?;
        self.channel.close().await.map_err(ChannelError::Ssh)
    }
}
