//! Scripted device session for tests and offline use.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use log::debug;

use super::DeviceSession;
use crate::error::DeviceError;
use crate::model::Device;

/// What a scripted device does when asked to run commands.
#[derive(Debug, Clone)]
enum Behavior {
    Answer,
    Fail(DeviceError),
    Hang,
}

#[derive(Debug, Clone)]
struct Script {
    behavior: Behavior,
    delay: Duration,
    output: Option<String>,
}

impl Default for Script {
    fn default() -> Self {
        Self {
            behavior: Behavior::Answer,
            delay: Duration::ZERO,
            output: None,
        }
    }
}

/// A [`DeviceSession`] that answers from canned output.
///
/// For each command the output is chosen as: the first registered command
/// substring the command contains, else the device's output, else the
/// default output. A command with none of those fails with
/// [`DeviceError::CommandError`].
///
/// Per-device errors, delays and hangs apply to the whole call. A hanging
/// device never answers, whatever timeout it is given.
#[derive(Debug, Default)]
pub struct FakeSession {
    devices: HashMap<String, Script>,
    commands: Vec<(String, String)>,
    default_output: Option<String>,
    calls: AtomicUsize,
    executed: Mutex<Vec<(String, Vec<String>)>>,
}

impl FakeSession {
    pub fn new() -> Self {
        Self::default()
    }

    fn script(&mut self, device: impl Into<String>) -> &mut Script {
        self.devices.entry(device.into()).or_default()
    }

    /// Output returned for every command sent to `device`.
    pub fn with_output(mut self, device: impl Into<String>, output: impl Into<String>) -> Self {
        self.script(device).output = Some(output.into());
        self
    }

    /// Output for any command containing `substring`, on every device.
    pub fn with_command_output(
        mut self,
        substring: impl Into<String>,
        output: impl Into<String>,
    ) -> Self {
        self.commands.push((substring.into(), output.into()));
        self
    }

    /// Output for commands nothing else matches.
    pub fn with_default_output(mut self, output: impl Into<String>) -> Self {
        self.default_output = Some(output.into());
        self
    }

    /// Make `device` fail.
    pub fn with_error(mut self, device: impl Into<String>, error: DeviceError) -> Self {
        self.script(device).behavior = Behavior::Fail(error);
        self
    }

    /// Make `device` take `delay` before answering.
    pub fn with_delay(mut self, device: impl Into<String>, delay: Duration) -> Self {
        self.script(device).delay = delay;
        self
    }

    /// Make `device` never answer.
    pub fn with_hang(mut self, device: impl Into<String>) -> Self {
        self.script(device).behavior = Behavior::Hang;
        self
    }

    /// Number of `execute` calls so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Device names and commands of every call so far, in call order.
    pub fn executed(&self) -> Vec<(String, Vec<String>)> {
        self.executed
            .lock()
            .map(|log| log.clone())
            .unwrap_or_default()
    }

    fn output_for(&self, script: Option<&Script>, command: &str) -> Option<String> {
        self.commands
            .iter()
            .find(|(substring, _)| command.contains(substring.as_str()))
            .map(|(_, output)| output.clone())
            .or_else(|| script.and_then(|s| s.output.clone()))
            .or_else(|| self.default_output.clone())
    }
}

#[async_trait]
impl DeviceSession for FakeSession {
    async fn execute(
        &self,
        device: &Device,
        commands: &[String],
        _timeout: Duration,
    ) -> Result<Vec<String>, DeviceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut log) = self.executed.lock() {
            log.push((device.name.clone(), commands.to_vec()));
        }
        debug!("fake session: {} <- {:?}", device.name, commands);

        let script = self.devices.get(&device.name);
        let delay = script.map(|s| s.delay).unwrap_or_default();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        match script.map(|s| &s.behavior) {
            Some(Behavior::Hang) => std::future::pending().await,
            Some(Behavior::Fail(error)) => Err(error.clone()),
            Some(Behavior::Answer) | None => commands
                .iter()
                .map(|command| {
                    self.output_for(script, command)
                        .ok_or_else(|| DeviceError::CommandError {
                            message: format!("no canned output for '{command}'"),
                        })
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::model::Credential;
    use crate::platform::PlatformFamily;
    use crate::transport::AuthMethod;

    fn device(name: &str) -> Device {
        let credential = Arc::new(Credential::new("c", "lg", AuthMethod::password("pw")));
        Device::new(name, "192.0.2.1", PlatformFamily::Frr, credential)
    }

    fn commands(list: &[&str]) -> Vec<String> {
        list.iter().map(|c| c.to_string()).collect()
    }

    #[tokio::test]
    async fn test_output_precedence() {
        let session = FakeSession::new()
            .with_output("r1", "device output")
            .with_command_output("ping", "ping output")
            .with_default_output("default output");

        let out = session
            .execute(&device("r1"), &commands(&["ping 8.8.8.8", "show bgp"]), Duration::from_secs(1))
            .await
            .unwrap();
        assert_eq!(out, vec!["ping output", "device output"]);

        let out = session
            .execute(&device("r2"), &commands(&["show bgp"]), Duration::from_secs(1))
            .await
            .unwrap();
        assert_eq!(out, vec!["default output"]);

        assert_eq!(session.calls(), 2);
        assert_eq!(session.executed()[1].0, "r2");
    }

    #[tokio::test]
    async fn test_missing_output_is_command_error() {
        let session = FakeSession::new();
        let err = session
            .execute(&device("r1"), &commands(&["show bgp"]), Duration::from_secs(1))
            .await
            .unwrap_err();
        assert!(matches!(err, DeviceError::CommandError { .. }));
    }

    #[tokio::test]
    async fn test_scripted_error() {
        let session = FakeSession::new().with_error(
            "r1",
            DeviceError::AuthFailure {
                message: "denied".to_string(),
            },
        );
        let err = session
            .execute(&device("r1"), &commands(&["show bgp"]), Duration::from_secs(1))
            .await
            .unwrap_err();
        assert!(matches!(err, DeviceError::AuthFailure { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_delay_and_hang() {
        let session = FakeSession::new()
            .with_output("slow", "done")
            .with_delay("slow", Duration::from_secs(2))
            .with_hang("stuck");

        let start = tokio::time::Instant::now();
        let out = session
            .execute(&device("slow"), &commands(&["show bgp"]), Duration::from_secs(10))
            .await
            .unwrap();
        assert_eq!(out, vec!["done"]);
        assert!(start.elapsed() >= Duration::from_secs(2));

        let stuck = tokio::time::timeout(
            Duration::from_secs(30),
            session.execute(&device("stuck"), &commands(&["show bgp"]), Duration::from_secs(1)),
        )
        .await;
        assert!(stuck.is_err());
    }
}
