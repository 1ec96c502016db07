//! Output of one command.

use std::time::Duration;

use crate::error::DeviceError;

/// Response from a command execution.
#[derive(Debug, Clone)]
pub struct Response {
    /// The command that was executed.
    pub command: String,

    /// Normalized output: command echo and trailing prompt removed, vendor
    /// noise dropped.
    pub result: String,

    /// The raw output before normalization.
    pub raw_result: String,

    /// The prompt that was matched at the end.
    pub prompt: String,

    /// Time taken to execute the command.
    pub elapsed: Duration,

    /// Failure pattern found in the output, if any.
    pub failure_message: Option<String>,
}

impl Response {
    /// Check if the response indicates success.
    pub fn is_success(&self) -> bool {
        self.failure_message.is_none()
    }

    /// Normalized output, or a command error when a failure pattern matched.
    pub fn into_output(self) -> Result<String, DeviceError> {
        match self.failure_message {
            None => Ok(self.result),
            Some(pattern) => Err(DeviceError::CommandError {
                message: format!(
                    "'{}' failed ({}): {}",
                    self.command,
                    pattern,
                    first_line_containing(&self.result, &pattern)
                ),
            }),
        }
    }
}

fn first_line_containing<'a>(output: &'a str, pattern: &str) -> &'a str {
    output
        .lines()
        .find(|line| line.contains(pattern))
        .map(str::trim)
        .unwrap_or_default()
}
