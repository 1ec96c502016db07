//! Concurrent fan-out of a query to its devices.
//!
//! Every command for every device is rendered before anything is sent, so an
//! unsupported (platform, query type) pair rejects the query without
//! contacting any device. Each device then runs in its own task. The
//! coordinator waits for all of them or for its own deadline, whichever
//! comes first; a device still running at the deadline is recorded as a
//! timeout and its task is left to finish on its own.

use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use futures_util::future::join_all;
use log::{debug, warn};
use serde::Deserialize;
use tokio::time::Instant;

use crate::cache::Fingerprint;
use crate::command::CommandBuilder;
use crate::error::{DeviceError, QueryError};
use crate::hook::OutputHook;
use crate::model::{
    Device, DeviceResult, Outcome, Query, QueryType, RawResult, ResponseEnvelope, millis,
};
use crate::parse;
use crate::platform::PlatformRegistry;
use crate::session::DeviceSession;

/// Dispatch time limits.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// Bound on a whole query's dispatch, in seconds.
    #[serde(deserialize_with = "crate::config::seconds")]
    pub timeout: Duration,

    /// Bound on one device's session, in seconds.
    #[serde(deserialize_with = "crate::config::seconds")]
    pub device_timeout: Duration,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(90),
            device_timeout: Duration::from_secs(60),
        }
    }
}

/// Fans queries out to devices and aggregates the answers.
#[derive(Clone)]
pub struct Dispatcher {
    session: Arc<dyn DeviceSession>,
    registry: Arc<PlatformRegistry>,
    builder: CommandBuilder,
    config: DispatchConfig,
    output_hooks: Vec<Arc<dyn OutputHook>>,
}

impl Dispatcher {
    /// Create a dispatcher with default time limits.
    pub fn new(session: Arc<dyn DeviceSession>, registry: Arc<PlatformRegistry>) -> Self {
        Self {
            session,
            builder: CommandBuilder::new(Arc::clone(&registry)),
            registry,
            config: DispatchConfig::default(),
            output_hooks: Vec::new(),
        }
    }

    /// Use another platform table.
    pub fn with_registry(mut self, registry: Arc<PlatformRegistry>) -> Self {
        self.builder = CommandBuilder::new(Arc::clone(&registry));
        self.registry = registry;
        self
    }

    /// Run `hook` on every command output before it is parsed.
    pub fn with_output_hook(mut self, hook: Arc<dyn OutputHook>) -> Self {
        self.output_hooks.push(hook);
        self
    }

    /// Set the time limits.
    pub fn with_config(mut self, config: DispatchConfig) -> Self {
        self.config = config;
        self
    }

    /// Time limits in use.
    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    /// Render the commands for every device, in device order.
    pub fn plan(&self, query: &Query) -> Result<Vec<Vec<String>>, QueryError> {
        query
            .devices()
            .iter()
            .map(|device| {
                self.builder
                    .build(query.query_type(), query.target(), query.vrf(), device)
            })
            .collect()
    }

    /// Run a query on all its devices and build the envelope.
    ///
    /// Fails only when commands cannot be built; device failures become
    /// entries in the envelope.
    pub async fn execute(&self, query: &Query) -> Result<ResponseEnvelope, QueryError> {
        let plan = self.plan(query)?;
        let started = Instant::now();

        let raw = self.run(query.devices(), plan).await;
        let results = raw
            .into_iter()
            .map(|r| self.to_device_result(query.query_type(), r))
            .collect();

        Ok(ResponseEnvelope {
            id: Fingerprint::of(query).to_string(),
            query_type: query.query_type(),
            target: query.target().to_string(),
            vrf: query.vrf().name.clone(),
            results,
            runtime_ms: millis(started.elapsed()),
            timestamp: unix_now(),
            cached: false,
        })
    }

    /// Execute every device's commands concurrently.
    ///
    /// Results come back in `devices` order regardless of completion order.
    async fn run(&self, devices: &[Arc<Device>], plan: Vec<Vec<String>>) -> Vec<RawResult> {
        let started = Instant::now();
        let deadline = started + self.config.timeout;
        let global_timeout = self.config.timeout;
        let device_timeout = self.config.device_timeout;

        let pending = devices.iter().cloned().zip(plan).map(|(device, commands)| {
            let session = Arc::clone(&self.session);
            let task_device = Arc::clone(&device);
            let task_commands = commands.clone();

            let handle = tokio::spawn(async move {
                let start = Instant::now();
                debug!("{}: running {:?}", task_device.name, task_commands);
                let output = tokio::time::timeout(
                    device_timeout,
                    session.execute(&task_device, &task_commands, device_timeout),
                )
                .await
                .unwrap_or_else(|_| Err(DeviceError::timeout(device_timeout)));
                debug!("{}: finished in {:?}", task_device.name, start.elapsed());
                (output, start.elapsed())
            });

            async move {
                let (output, elapsed) = match tokio::time::timeout_at(deadline, handle).await {
                    Ok(Ok(done)) => done,
                    Ok(Err(join_err)) => (
                        Err(DeviceError::Unreachable {
                            message: format!("device task failed: {join_err}"),
                        }),
                        started.elapsed(),
                    ),
                    Err(_) => (Err(DeviceError::timeout(global_timeout)), started.elapsed()),
                };
                RawResult {
                    device,
                    commands,
                    output,
                    elapsed,
                }
            }
        });

        join_all(pending).await
    }

    fn post_process(
        &self,
        device: &Device,
        query_type: QueryType,
        outputs: Vec<String>,
    ) -> Result<Vec<String>, DeviceError> {
        outputs
            .into_iter()
            .map(|output| {
                self.output_hooks
                    .iter()
                    .try_fold(output, |output, hook| hook.process(device, query_type, output))
            })
            .collect()
    }

    fn to_device_result(&self, query_type: QueryType, raw: RawResult) -> DeviceResult {
        let device = &raw.device;
        let processed = raw
            .output
            .and_then(|outputs| self.post_process(device, query_type, outputs));
        let outcome = match processed {
            Ok(outputs) => {
                let parser = if device.structured_output {
                    self.registry.parser(device.platform, query_type)
                } else {
                    None
                };
                let result = parse::parse(parser, query_type, &outputs);
                if result.is_degraded() {
                    debug!(
                        "{}: no parser for {} on {}; returning raw output",
                        device.name, query_type, device.platform
                    );
                } else if !result.any_line_matched() {
                    debug!("{}: no line of {} output was recognized", device.name, query_type);
                }
                Outcome::Success(result)
            }
            Err(e) => {
                warn!("{}: {} failed: {}", device.name, query_type, e);
                Outcome::Failure(e)
            }
        };

        DeviceResult {
            device: device.name.clone(),
            display_name: device.display_name.clone(),
            commands: raw.commands,
            outcome,
            elapsed_ms: millis(raw.elapsed),
        }
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}
