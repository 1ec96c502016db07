//! Turns a validated query into the command lines for one device.

use std::sync::Arc;

use crate::error::QueryError;
use crate::model::{Device, QueryType, Target, Vrf};
use crate::platform::{PlatformFamily, PlatformRegistry};

/// Builds device commands from the platform registry's templates.
#[derive(Debug, Clone)]
pub struct CommandBuilder {
    registry: Arc<PlatformRegistry>,
}

impl CommandBuilder {
    /// Create a builder over a registry.
    pub fn new(registry: Arc<PlatformRegistry>) -> Self {
        Self { registry }
    }

    /// Whether the platform has a template for the query type.
    pub fn supports(&self, family: PlatformFamily, query_type: QueryType) -> bool {
        self.registry.template(family, query_type).is_some()
    }

    /// Render the commands for one device, in execution order.
    ///
    /// The source address comes from the device's membership in `vrf`,
    /// matching the target's address family. Fails with
    /// [`QueryError::UnsupportedQuery`] when the platform has no template
    /// for the query type or the template yields nothing for this target.
    pub fn build(
        &self,
        query_type: QueryType,
        target: &Target,
        vrf: &Vrf,
        device: &Device,
    ) -> Result<Vec<String>, QueryError> {
        let unsupported = || QueryError::UnsupportedQuery {
            platform: device.platform.to_string(),
            query_type,
        };

        let template = self
            .registry
            .template(device.platform, query_type)
            .ok_or_else(unsupported)?;

        let source = device.source_address(&vrf.name, target.family());
        let commands = template.render(target, vrf, source);
        if commands.is_empty() {
            return Err(unsupported());
        }
        Ok(commands)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Credential, DeviceVrf};
    use crate::transport::AuthMethod;

    fn device(platform: PlatformFamily) -> Device {
        let credential = Arc::new(Credential::new("c", "lg", AuthMethod::password("pw")));
        Device::new("r1", "192.0.2.1", platform, credential).with_vrf(DeviceVrf {
            name: "default".to_string(),
            source_v4: Some("192.0.2.1".parse().unwrap()),
            source_v6: Some("2001:db8::1".parse().unwrap()),
        })
    }

    #[test]
    fn test_build_route_lookup() {
        let builder = CommandBuilder::new(PlatformRegistry::builtin());
        let target = Target::parse(QueryType::BgpRoute, "8.8.8.0/24").unwrap();
        let commands = builder
            .build(
                QueryType::BgpRoute,
                &target,
                &Vrf::new("default"),
                &device(PlatformFamily::Juniper),
            )
            .unwrap();
        assert_eq!(
            commands,
            vec!["show route table inet.0 8.8.8.0/24 protocol bgp detail"]
        );
    }

    #[test]
    fn test_build_picks_source_by_family() {
        let builder = CommandBuilder::new(PlatformRegistry::builtin());
        let target = Target::parse(QueryType::Ping, "2001:4860:4860::8888").unwrap();
        let commands = builder
            .build(
                QueryType::Ping,
                &target,
                &Vrf::new("default"),
                &device(PlatformFamily::CiscoIos),
            )
            .unwrap();
        assert_eq!(
            commands,
            vec!["ping 2001:4860:4860::8888 repeat 5 source 2001:db8::1"]
        );
    }

    #[test]
    fn test_unsupported_query() {
        let builder = CommandBuilder::new(PlatformRegistry::builtin());
        let target = Target::parse(QueryType::BgpAspath, "_65000_").unwrap();
        let err = builder
            .build(
                QueryType::BgpAspath,
                &target,
                &Vrf::new("default"),
                &device(PlatformFamily::Bird),
            )
            .unwrap_err();
        assert_eq!(
            err,
            QueryError::UnsupportedQuery {
                platform: "bird".to_string(),
                query_type: QueryType::BgpAspath,
            }
        );
        assert!(!builder.supports(PlatformFamily::Bird, QueryType::BgpAspath));
        assert!(builder.supports(PlatformFamily::Bird, QueryType::Ping));
    }
}
