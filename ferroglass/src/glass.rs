//! The looking glass: validation, policy, cache and dispatch in one place.
//!
//! A request flows through [`LookingGlass::query`] as:
//!
//! 0. input hooks, which may rewrite the target or reject the request
//! 1. target syntax check ([`QueryError::InvalidTarget`])
//! 2. device resolution ([`QueryError::NoDevices`], [`QueryError::UnknownDevice`])
//! 3. policy, per device ([`QueryError::PolicyDenied`])
//! 4. cache lookup
//! 5. command rendering ([`QueryError::UnsupportedQuery`]) and dispatch,
//!    with output hooks applied before parsing
//! 6. cache store
//!
//! Steps 0-3 and the rendering half of 5 never contact a device.

use std::sync::{Arc, RwLock};

use indexmap::IndexMap;
use log::{debug, info};

use crate::cache::{CacheConfig, Fingerprint, MemoryCache, ResultCache};
use crate::config::Config;
use crate::dispatch::{DispatchConfig, Dispatcher};
use crate::error::{ConfigError, Error, QueryError};
use crate::hook::{InputHook, OutputHook};
use crate::model::{
    Device, DeviceView, Query, QueryRequest, ResponseEnvelope, Target, Vrf, VrfView,
};
use crate::platform::PlatformRegistry;
use crate::policy;
use crate::session::{DeviceSession, SshSessionAdapter};

/// Immutable device and VRF tables.
///
/// Built once (usually by [`Config::into_directory`]) and swapped whole on
/// reload. Iteration follows insertion order.
#[derive(Debug, Clone, Default)]
pub struct Directory {
    devices: IndexMap<String, Arc<Device>>,
    vrfs: IndexMap<String, Arc<Vrf>>,
}

impl Directory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a VRF.
    pub fn with_vrf(mut self, vrf: Vrf) -> Result<Self, ConfigError> {
        if self.vrfs.contains_key(&vrf.name) {
            return Err(ConfigError::Duplicate {
                kind: "VRF",
                name: vrf.name,
            });
        }
        self.vrfs.insert(vrf.name.clone(), Arc::new(vrf));
        Ok(self)
    }

    /// Add a device. Every VRF it serves must already be present.
    pub fn with_device(mut self, device: Device) -> Result<Self, ConfigError> {
        if let Some(missing) = device.vrfs.iter().find(|v| !self.vrfs.contains_key(&v.name)) {
            return Err(ConfigError::UnknownReference {
                kind: "VRF",
                name: missing.name.clone(),
                referenced_by: format!("device '{}'", device.name),
            });
        }
        if self.devices.contains_key(&device.name) {
            return Err(ConfigError::Duplicate {
                kind: "device",
                name: device.name,
            });
        }
        self.devices.insert(device.name.clone(), Arc::new(device));
        Ok(self)
    }

    pub fn device(&self, name: &str) -> Option<&Arc<Device>> {
        self.devices.get(name)
    }

    pub fn vrf(&self, name: &str) -> Option<&Arc<Vrf>> {
        self.vrfs.get(name)
    }

    pub fn devices(&self) -> impl Iterator<Item = &Arc<Device>> {
        self.devices.values()
    }

    pub fn vrfs(&self) -> impl Iterator<Item = &Arc<Vrf>> {
        self.vrfs.values()
    }
}

/// Looking-glass query service.
///
/// Cheap to share behind an `Arc`; every method takes `&self`, and queries
/// run concurrently.
///
/// # Example
///
/// ```rust,no_run
/// use ferroglass::{Config, LookingGlass, QueryRequest, QueryType};
///
/// # async fn run() -> Result<(), ferroglass::Error> {
/// let glass = LookingGlass::from_config(Config::from_path("lg.yaml")?)?;
/// let request = QueryRequest::new(QueryType::BgpRoute, "8.8.8.8").devices(["mx1", "rtr2"]);
/// let envelope = glass.query(request).await?;
/// for result in &envelope.results {
///     println!("{}: {:?}", result.display_name, result.outcome);
/// }
/// # Ok(())
/// # }
/// ```
pub struct LookingGlass {
    directory: RwLock<Arc<Directory>>,
    dispatcher: Dispatcher,
    cache: Arc<dyn ResultCache>,
    cache_config: CacheConfig,
    input_hooks: Vec<Arc<dyn InputHook>>,
}

impl LookingGlass {
    /// Looking glass over `directory` with the built-in platforms, default
    /// time limits and an in-memory cache.
    pub fn new(directory: Directory, session: Arc<dyn DeviceSession>) -> Self {
        let cache_config = CacheConfig::default();
        Self {
            directory: RwLock::new(Arc::new(directory)),
            dispatcher: Dispatcher::new(session, PlatformRegistry::builtin()),
            cache: Arc::new(MemoryCache::from_config(&cache_config)),
            cache_config,
            input_hooks: Vec::new(),
        }
    }

    /// Build an SSH-backed looking glass from a configuration file's model.
    pub fn from_config(config: Config) -> Result<Self, Error> {
        let registry = PlatformRegistry::builtin();
        let session =
            SshSessionAdapter::new(Arc::clone(&registry)).with_options(config.ssh.clone());
        let cache = config.cache.clone();
        let dispatch = config.dispatch.clone();

        Ok(Self::new(config.into_directory()?, Arc::new(session))
            .with_registry(registry)
            .with_cache_config(cache)
            .with_dispatch_config(dispatch))
    }

    /// Use another result store. Entries still live for the configured TTL.
    pub fn with_cache(mut self, cache: Arc<dyn ResultCache>) -> Self {
        self.cache = cache;
        self
    }

    /// Set the cache settings and start a fresh in-memory cache with them.
    pub fn with_cache_config(mut self, config: CacheConfig) -> Self {
        self.cache = Arc::new(MemoryCache::from_config(&config));
        self.cache_config = config;
        self
    }

    /// Set the dispatch time limits.
    pub fn with_dispatch_config(mut self, config: DispatchConfig) -> Self {
        self.dispatcher = self.dispatcher.with_config(config);
        self
    }

    /// Use another platform table.
    pub fn with_registry(mut self, registry: Arc<PlatformRegistry>) -> Self {
        self.dispatcher = self.dispatcher.with_registry(registry);
        self
    }

    /// Run `hook` on every request target before it is parsed.
    pub fn with_input_hook(mut self, hook: impl InputHook + 'static) -> Self {
        self.input_hooks.push(Arc::new(hook));
        self
    }

    /// Run `hook` on every command output before it is parsed.
    pub fn with_output_hook(mut self, hook: impl OutputHook + 'static) -> Self {
        self.dispatcher = self.dispatcher.with_output_hook(Arc::new(hook));
        self
    }

    /// Directory in effect right now.
    pub fn snapshot(&self) -> Arc<Directory> {
        let guard = self.directory.read().unwrap_or_else(|e| e.into_inner());
        Arc::clone(&*guard)
    }

    /// Replace the device and VRF tables. Queries already running keep the
    /// tables they started with.
    pub fn reload(&self, directory: Directory) {
        let mut guard = self.directory.write().unwrap_or_else(|e| e.into_inner());
        *guard = Arc::new(directory);
        info!(
            "directory reloaded: {} devices, {} VRFs",
            guard.devices.len(),
            guard.vrfs.len()
        );
    }

    /// Public view of every device.
    pub fn devices(&self) -> Vec<DeviceView> {
        self.snapshot().devices().map(|d| d.view()).collect()
    }

    /// Public view of every VRF.
    pub fn vrfs(&self) -> Vec<VrfView> {
        self.snapshot().vrfs().map(|v| v.view()).collect()
    }

    /// Turn a request into a policy-approved [`Query`].
    ///
    /// Duplicate device names are dropped, keeping the first occurrence.
    /// Every device must pass policy; one denial rejects the request.
    pub fn validate(&self, request: &QueryRequest) -> Result<Query, QueryError> {
        let directory = self.snapshot();
        let raw = self
            .input_hooks
            .iter()
            .try_fold(request.target.clone(), |target, hook| {
                hook.rewrite(request.query_type, target)
            })?;
        let target = Target::parse(request.query_type, &raw)?;

        if request.devices.is_empty() {
            return Err(QueryError::NoDevices);
        }

        let mut devices: Vec<Arc<Device>> = Vec::with_capacity(request.devices.len());
        for name in &request.devices {
            if devices.iter().any(|d| &d.name == name) {
                continue;
            }
            let device = directory
                .device(name)
                .ok_or_else(|| QueryError::UnknownDevice { name: name.clone() })?;
            devices.push(Arc::clone(device));
        }

        let vrf = directory.vrf(&request.vrf);
        for device in &devices {
            policy::evaluate(
                vrf.map(|v| &**v),
                &request.vrf,
                device,
                request.query_type,
                &target,
            )
            .into_result()?;
        }

        // evaluate() already denied an unknown VRF.
        let vrf = vrf.cloned().ok_or_else(|| QueryError::PolicyDenied {
            reason: format!("no matching VRF '{}'", request.vrf),
        })?;

        Ok(Query::new(request.query_type, target, vrf, devices))
    }

    /// Run a request end to end.
    ///
    /// Returns a rejection, or an envelope with one entry per distinct device
    /// in request order. Every envelope is cached, partial ones included.
    pub async fn query(&self, request: QueryRequest) -> Result<ResponseEnvelope, QueryError> {
        let query = match self.validate(&request) {
            Ok(query) => query,
            Err(e) => {
                debug!("rejected {} {:?}: {}", request.query_type, request.target, e);
                return Err(e);
            }
        };
        let key = Fingerprint::of(&query);
        info!("query {} [{}]", query.summary(), key);

        if let Some(mut envelope) = self.cache.get(&key).await {
            debug!("cache hit {}", key);
            order_like(&mut envelope, &query);
            envelope.cached = true;
            envelope.runtime_ms = 0;
            info!("query {} answered from cache", key);
            return Ok(envelope);
        }
        debug!("cache miss {}", key);

        let envelope = self.dispatcher.execute(&query).await?;
        info!(
            "query {} finished in {} ms: {}/{} devices succeeded",
            key,
            envelope.runtime_ms,
            envelope.success_count(),
            envelope.results.len()
        );

        self.cache
            .put(key, envelope.clone(), self.cache_config.timeout)
            .await;

        Ok(envelope)
    }
}

/// Put a cached envelope's entries in the query's device order.
fn order_like(envelope: &mut ResponseEnvelope, query: &Query) {
    let names = query.device_names();
    envelope.results.sort_by_key(|r| {
        names
            .iter()
            .position(|n| *n == r.device)
            .unwrap_or(usize::MAX)
    });
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::error::DeviceError;
    use crate::model::{Credential, DeviceVrf, Outcome, QueryType};
    use crate::platform::PlatformFamily;
    use crate::policy::{Action, Rule};
    use crate::session::FakeSession;
    use crate::transport::AuthMethod;

    const IOS_ROUTE: &str = "\
BGP routing table entry for 8.8.8.0/24, version 12
Paths: (1 available, best #1, table default)
  15169
    203.0.113.1 from 203.0.113.1 (8.8.8.8)
      Origin IGP, metric 0, localpref 100, valid, external, best
";

    fn device(name: &str, platform: PlatformFamily) -> Device {
        let credential = Arc::new(Credential::new("c", "lg", AuthMethod::password("pw")));
        Device::new(name, "192.0.2.1", platform, credential).with_vrf(DeviceVrf::new("default"))
    }

    fn directory(names: &[&str]) -> Directory {
        let vrf = Vrf::new("default").with_rule(Rule::network("10.0.0.0/8", Action::Deny).unwrap());
        let mut directory = Directory::new().with_vrf(vrf).unwrap();
        for name in names {
            directory = directory
                .with_device(device(name, PlatformFamily::CiscoIos))
                .unwrap();
        }
        directory
            .with_device(device("bird1", PlatformFamily::Bird))
            .unwrap()
    }

    fn glass(session: FakeSession, names: &[&str]) -> (Arc<FakeSession>, LookingGlass) {
        let session = Arc::new(session);
        let glass = LookingGlass::new(directory(names), session.clone());
        (session, glass)
    }

    #[test]
    fn test_directory_rejects_bad_entries() {
        let err = directory(&["r1"])
            .with_device(device("r1", PlatformFamily::Frr))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Duplicate { kind: "device", .. }));

        let credential = Arc::new(Credential::new("c", "lg", AuthMethod::password("pw")));
        let orphan = Device::new("r9", "192.0.2.9", PlatformFamily::Frr, credential)
            .with_vrf(DeviceVrf::new("customer-z"));
        let err = directory(&[]).with_device(orphan).unwrap_err();
        assert!(matches!(err, ConfigError::UnknownReference { kind: "VRF", .. }));

        let err = directory(&[]).with_vrf(Vrf::new("default")).unwrap_err();
        assert!(matches!(err, ConfigError::Duplicate { kind: "VRF", .. }));
    }

    #[tokio::test]
    async fn test_denied_prefix_never_reaches_devices() {
        let (session, glass) = glass(FakeSession::new().with_output("r1", IOS_ROUTE), &["r1"]);

        let err = glass
            .query(QueryRequest::new(QueryType::BgpRoute, "10.1.2.3").device("r1"))
            .await
            .unwrap_err();
        assert!(matches!(err, QueryError::PolicyDenied { .. }));
        assert_eq!(session.calls(), 0);

        let envelope = glass
            .query(QueryRequest::new(QueryType::BgpRoute, "8.8.8.8").device("r1"))
            .await
            .unwrap();
        assert_eq!(envelope.success_count(), 1);
        assert_eq!(session.calls(), 1);
    }

    #[tokio::test]
    async fn test_rejections() {
        let (session, glass) = glass(FakeSession::new().with_default_output(""), &["r1"]);

        let err = glass
            .query(QueryRequest::new(QueryType::BgpRoute, "not-an-ip").device("r1"))
            .await
            .unwrap_err();
        assert!(matches!(err, QueryError::InvalidTarget { .. }));

        let err = glass
            .query(QueryRequest::new(QueryType::BgpRoute, "8.8.8.8"))
            .await
            .unwrap_err();
        assert_eq!(err, QueryError::NoDevices);

        let err = glass
            .query(QueryRequest::new(QueryType::BgpRoute, "8.8.8.8").device("r7"))
            .await
            .unwrap_err();
        assert_eq!(err, QueryError::UnknownDevice { name: "r7".to_string() });

        let err = glass
            .query(
                QueryRequest::new(QueryType::BgpRoute, "8.8.8.8")
                    .vrf("customer-z")
                    .device("r1"),
            )
            .await
            .unwrap_err();
        match err {
            QueryError::PolicyDenied { reason } => assert!(reason.contains("no matching VRF")),
            other => panic!("unexpected {other:?}"),
        }

        let err = glass
            .query(QueryRequest::new(QueryType::BgpAspath, "^15169$").devices(["r1", "bird1"]))
            .await
            .unwrap_err();
        assert!(matches!(err, QueryError::UnsupportedQuery { .. }));

        assert_eq!(session.calls(), 0);
    }

    #[tokio::test]
    async fn test_repeat_query_is_served_from_cache() {
        let (session, glass) = glass(FakeSession::new().with_default_output(IOS_ROUTE), &["r1", "r2"]);

        let first = glass
            .query(QueryRequest::new(QueryType::BgpRoute, "8.8.8.8").devices(["r1", "r2"]))
            .await
            .unwrap();
        let second = glass
            .query(QueryRequest::new(QueryType::BgpRoute, "8.8.8.8").devices(["r1", "r2"]))
            .await
            .unwrap();

        assert!(!first.cached);
        assert!(second.cached);
        assert_eq!(second.runtime_ms, 0);
        assert_eq!(first.timestamp, second.timestamp);
        assert_eq!(
            serde_json::to_vec(&first.results).unwrap(),
            serde_json::to_vec(&second.results).unwrap()
        );
        assert_eq!(session.calls(), 2);
    }

    #[tokio::test]
    async fn test_cache_hit_follows_request_order() {
        let (session, glass) = glass(FakeSession::new().with_default_output(IOS_ROUTE), &["r1", "r2"]);

        glass
            .query(QueryRequest::new(QueryType::BgpRoute, "8.8.8.0/24").devices(["r1", "r2"]))
            .await
            .unwrap();
        let reordered = glass
            .query(QueryRequest::new(QueryType::BgpRoute, "8.8.8.9/24").devices(["r2", "r1", "r2"]))
            .await
            .unwrap();

        assert!(reordered.cached);
        let names: Vec<&str> = reordered.results.iter().map(|r| r.device.as_str()).collect();
        assert_eq!(names, vec!["r2", "r1"]);
        assert_eq!(session.calls(), 2);
    }

    #[tokio::test]
    async fn test_partial_envelope_is_cached() {
        let (session, glass) = glass(
            FakeSession::new()
                .with_output("r1", IOS_ROUTE)
                .with_error("r2", DeviceError::AuthFailure { message: "denied".to_string() }),
            &["r1", "r2"],
        );
        let request = QueryRequest::new(QueryType::BgpRoute, "8.8.8.8").devices(["r1", "r2"]);

        let first = glass.query(request.clone()).await.unwrap();
        assert!(first.is_partial());
        let second = glass.query(request).await.unwrap();
        assert!(second.cached);
        assert!(second.is_partial());
        assert_eq!(
            second.result_for("r2").map(|r| &r.outcome),
            Some(&Outcome::Failure(DeviceError::AuthFailure { message: "denied".to_string() }))
        );
        assert!(second.result_for("r9").is_none());
        assert_eq!(session.calls(), 2);
    }

    #[tokio::test]
    async fn test_input_hooks_run_before_policy() {
        let (session, glass) = glass(FakeSession::new().with_default_output(IOS_ROUTE), &["r1"]);
        let glass = glass
            .with_input_hook(|_: QueryType, target: String| -> Result<String, QueryError> {
                Ok(target.trim_start_matches("host:").to_string())
            })
            .with_input_hook(|query_type: QueryType, target: String| -> Result<String, QueryError> {
                if query_type == QueryType::Ping && target.starts_with("192.0.2.") {
                    return Err(QueryError::PolicyDenied {
                        reason: "documentation range".to_string(),
                    });
                }
                Ok(target)
            });

        let envelope = glass
            .query(QueryRequest::new(QueryType::BgpRoute, "host:8.8.8.8").device("r1"))
            .await
            .unwrap();
        assert_eq!(envelope.target, "8.8.8.8");

        // The rewritten target still goes through policy.
        let err = glass
            .query(QueryRequest::new(QueryType::BgpRoute, "host:10.0.0.1").device("r1"))
            .await
            .unwrap_err();
        assert!(matches!(err, QueryError::PolicyDenied { .. }));

        let err = glass
            .query(QueryRequest::new(QueryType::Ping, "192.0.2.55").device("r1"))
            .await
            .unwrap_err();
        assert_eq!(
            err,
            QueryError::PolicyDenied { reason: "documentation range".to_string() }
        );
        assert_eq!(session.calls(), 1);
    }

    #[tokio::test]
    async fn test_output_hook_registered_on_glass() {
        let (_, glass) = glass(FakeSession::new().with_default_output(IOS_ROUTE), &["r1"]);
        let glass = glass.with_output_hook(
            |_: &Device, _: QueryType, _: String| -> Result<String, DeviceError> {
                Err(DeviceError::CommandError { message: "filtered".to_string() })
            },
        );

        let envelope = glass
            .query(QueryRequest::new(QueryType::BgpRoute, "8.8.8.8").device("r1"))
            .await
            .unwrap();
        assert_eq!(
            envelope.results[0].outcome,
            Outcome::Failure(DeviceError::CommandError { message: "filtered".to_string() })
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_device_does_not_block_envelope() {
        let (_, glass) = glass(
            FakeSession::new()
                .with_output("a", IOS_ROUTE)
                .with_delay("a", Duration::from_secs(1))
                .with_hang("b"),
            &["a", "b"],
        );
        let glass = glass.with_dispatch_config(DispatchConfig {
            timeout: Duration::from_secs(5),
            device_timeout: Duration::from_secs(60),
        });

        let start = tokio::time::Instant::now();
        let envelope = glass
            .query(QueryRequest::new(QueryType::BgpRoute, "8.8.8.8").devices(["a", "b"]))
            .await
            .unwrap();
        let waited = start.elapsed();

        assert!(waited >= Duration::from_secs(5) && waited < Duration::from_secs(6));
        assert!(envelope.results[0].outcome.is_success());
        assert_eq!(
            envelope.results[1].outcome,
            Outcome::Failure(DeviceError::Timeout { after_ms: 5000 })
        );
    }

    #[tokio::test]
    async fn test_reload_swaps_directory() {
        let (_, glass) = glass(FakeSession::new().with_default_output(IOS_ROUTE), &["r1"]);
        let before = glass.snapshot();

        let err = glass
            .query(QueryRequest::new(QueryType::BgpRoute, "8.8.8.8").device("r2"))
            .await
            .unwrap_err();
        assert!(matches!(err, QueryError::UnknownDevice { .. }));

        glass.reload(directory(&["r1", "r2"]));
        let envelope = glass
            .query(QueryRequest::new(QueryType::BgpRoute, "8.8.8.8").device("r2"))
            .await
            .unwrap();
        assert_eq!(envelope.results[0].device, "r2");

        assert!(before.device("r2").is_none());
        let names: Vec<String> = glass.devices().into_iter().map(|d| d.name).collect();
        assert_eq!(names, vec!["r1", "r2", "bird1"]);
        assert_eq!(glass.vrfs()[0].name, "default");
    }

    #[tokio::test]
    async fn test_from_config() {
        let yaml = "\
credentials:
  - {name: lg, username: lg, password: pw}
vrfs:
  - name: default
devices:
  - {name: r1, address: 192.0.2.1, platform: frr, credential: lg, vrfs: [{name: default}]}
dispatch:
  timeout: 7
";
        let glass = LookingGlass::from_config(Config::from_yaml_str(yaml).unwrap()).unwrap();
        assert_eq!(glass.dispatcher.config().timeout, Duration::from_secs(7));
        assert_eq!(glass.devices()[0].platform, "frr");
        assert!(glass.validate(&QueryRequest::new(QueryType::Ping, "8.8.8.8").device("r1")).is_ok());
    }
}
