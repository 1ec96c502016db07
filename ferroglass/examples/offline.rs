//! Offline example: run queries against scripted routers.
//!
//! No network access is needed; [`FakeSession`] answers with canned output.
//! Shows policy denial, unsupported query types, partial failure and the
//! result cache.
//!
//! # Usage
//!
//! ```bash
//! RUST_LOG=debug cargo run --example offline
//! ```

use std::sync::Arc;
use std::time::Duration;

use ferroglass::policy::{Action, Rule};
use ferroglass::{
    AuthMethod, Credential, Device, DeviceError, DeviceVrf, Directory, DispatchConfig,
    FakeSession, LookingGlass, PlatformFamily, QueryRequest, QueryType, ResponseEnvelope, Vrf,
};

const JUNOS_ROUTE: &str = "\
inet.0: 912345 destinations, 1824690 routes (912345 active, 0 holddown, 0 hidden)
+ = Active Route, - = Last Active, * = Both

8.8.8.0/24 (2 entries, 1 announced)
        *BGP    Preference: 170/-101
                Next hop: 203.0.113.1 via xe-0/0/0.0, selected
                State: <Active Ext>
                Age: 3w2d 4:10:12
                AS path: 15169 I
                Communities: 65000:100
                Localpref: 100
";

const LINUX_PING: &str = "\
PING 8.8.8.8 (8.8.8.8) from 192.0.2.2 : 56(84) bytes of data.
64 bytes from 8.8.8.8: icmp_seq=1 ttl=117 time=1.21 ms
64 bytes from 8.8.8.8: icmp_seq=2 ttl=117 time=1.18 ms

--- 8.8.8.8 ping statistics ---
2 packets transmitted, 2 received, 0% packet loss, time 1001ms
rtt min/avg/max/mdev = 1.180/1.195/1.210/0.015 ms
";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let credential = Arc::new(Credential::new("lg", "looking-glass", AuthMethod::password("unused")));
    let default = Vrf::new("default")
        .with_display_name("Global")
        .with_rule(Rule::network("10.0.0.0/8", Action::Deny)?);

    let directory = Directory::new()
        .with_vrf(default)?
        .with_device(
            Device::new("mx1", "192.0.2.1", PlatformFamily::Juniper, credential.clone())
                .with_vrf(DeviceVrf::new("default")),
        )?
        .with_device(
            Device::new("frr1", "192.0.2.2", PlatformFamily::Frr, credential.clone())
                .with_vrf(DeviceVrf::new("default")),
        )?
        .with_device(
            Device::new("bird1", "192.0.2.3", PlatformFamily::Bird, credential)
                .with_vrf(DeviceVrf::new("default")),
        )?;

    let session = FakeSession::new()
        .with_output("mx1", JUNOS_ROUTE)
        .with_command_output("ping", LINUX_PING)
        .with_error(
            "bird1",
            DeviceError::Unreachable {
                message: "connection refused".to_string(),
            },
        )
        .with_delay("frr1", Duration::from_millis(200));

    let glass = LookingGlass::new(directory, Arc::new(session)).with_dispatch_config(DispatchConfig {
        timeout: Duration::from_secs(5),
        device_timeout: Duration::from_secs(2),
    });

    let requests = [
        QueryRequest::new(QueryType::BgpRoute, "8.8.8.8").device("mx1"),
        QueryRequest::new(QueryType::BgpRoute, "8.8.8.8").device("mx1"),
        QueryRequest::new(QueryType::BgpRoute, "10.1.2.3").device("mx1"),
        QueryRequest::new(QueryType::BgpAspath, "^15169$").devices(["mx1", "bird1"]),
        QueryRequest::new(QueryType::Ping, "8.8.8.8").devices(["frr1", "bird1"]),
    ];

    for request in requests {
        println!("\n>>> {} {} on {:?}", request.query_type, request.target, request.devices);
        match glass.query(request).await {
            Ok(envelope) => print_envelope(&envelope)?,
            Err(e) => println!("rejected: {e}"),
        }
    }

    Ok(())
}

fn print_envelope(envelope: &ResponseEnvelope) -> Result<(), serde_json::Error> {
    println!(
        "{}/{} devices succeeded, cached: {}",
        envelope.success_count(),
        envelope.results.len(),
        envelope.cached
    );
    println!("{}", serde_json::to_string_pretty(&envelope.results)?);
    Ok(())
}
