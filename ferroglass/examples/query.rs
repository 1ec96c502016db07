//! Run one looking-glass query against real routers over SSH.
//!
//! # Usage
//!
//! ```bash
//! cargo run --example query -- --config lg.yaml --type bgp_route --target 8.8.8.8 --device mx1 --device rtr2
//! ```
//!
//! See `examples/lg.yaml` for the configuration format.

use std::env;
use std::path::PathBuf;

use ferroglass::{Config, LookingGlass, Outcome, QueryRequest, QueryType, StructuredResult};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging (set RUST_LOG=debug for verbose output)
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse()?;

    let glass = LookingGlass::from_config(Config::from_path(&args.config)?)?;
    if args.devices.is_empty() {
        println!("Devices:");
        for device in glass.devices() {
            println!(
                "  {:<12} {:<24} {:<12} {}",
                device.name,
                device.display_name,
                device.platform,
                device.vrfs.join(",")
            );
        }
        return Ok(());
    }

    let request = QueryRequest::new(args.query_type, &args.target)
        .vrf(&args.vrf)
        .devices(&args.devices);

    let envelope = match glass.query(request).await {
        Ok(envelope) => envelope,
        Err(e) => {
            eprintln!("Rejected: {e}");
            std::process::exit(2);
        }
    };

    println!(
        "{} {} (vrf {}) in {} ms{}",
        envelope.query_type,
        envelope.target,
        envelope.vrf,
        envelope.runtime_ms,
        if envelope.cached { ", cached" } else { "" }
    );

    for result in &envelope.results {
        println!("\n{} [{}]", result.display_name, result.commands.join("; "));
        println!("{}", "-".repeat(50));
        match &result.outcome {
            Outcome::Success(StructuredResult::Routes { table, .. }) => {
                for route in &table.routes {
                    println!(
                        "{} {:<20} via {:<16} path {:?}",
                        if route.active { "*" } else { " " },
                        route.prefix,
                        route.next_hop.as_deref().unwrap_or("-"),
                        route.as_path
                    );
                }
                if table.routes.is_empty() {
                    println!("no routes");
                }
            }
            Outcome::Success(StructuredResult::Ping { stats }) => {
                println!(
                    "{}/{} received, {:.1}% loss, avg {:?} ms",
                    stats.received, stats.transmitted, stats.loss_percent, stats.rtt_avg_ms
                );
            }
            Outcome::Success(StructuredResult::Traceroute { path }) => {
                for hop in &path.hops {
                    println!(
                        "{:>2}  {:<40} {:?}",
                        hop.hop,
                        hop.host.as_deref().or(hop.address.as_deref()).unwrap_or("*"),
                        hop.rtts_ms
                    );
                }
            }
            Outcome::Success(StructuredResult::Raw { output, .. }) => println!("{output}"),
            Outcome::Failure(e) => println!("failed: {e}"),
        }
    }

    Ok(())
}

/// Simple argument parser
struct Args {
    config: PathBuf,
    query_type: QueryType,
    target: String,
    vrf: String,
    devices: Vec<String>,
}

impl Args {
    fn parse() -> Result<Self, Box<dyn std::error::Error>> {
        let args: Vec<String> = env::args().collect();
        let mut config = PathBuf::from("lg.yaml");
        let mut query_type = QueryType::BgpRoute;
        let mut target = String::new();
        let mut vrf = "default".to_string();
        let mut devices = Vec::new();

        let mut i = 1;
        while i < args.len() {
            let value = args.get(i + 1).cloned();
            match (args[i].as_str(), value) {
                ("--config" | "-c", Some(v)) => config = PathBuf::from(v),
                ("--type" | "-t", Some(v)) => query_type = v.parse()?,
                ("--target" | "-q", Some(v)) => target = v,
                ("--vrf", Some(v)) => vrf = v,
                ("--device" | "-d", Some(v)) => devices.push(v),
                ("--help", _) => {
                    Self::print_help();
                    std::process::exit(0);
                }
                (other, _) => {
                    eprintln!("Unknown or incomplete argument: {other}");
                    i += 1;
                    continue;
                }
            }
            i += 2;
        }

        Ok(Self {
            config,
            query_type,
            target,
            vrf,
            devices,
        })
    }

    fn print_help() {
        println!(
            r#"ferroglass query example

USAGE:
    cargo run --example query -- [OPTIONS]

OPTIONS:
    -c, --config <PATH>      Configuration file [default: lg.yaml]
    -t, --type <TYPE>        bgp_route, bgp_community, bgp_aspath, ping, traceroute [default: bgp_route]
    -q, --target <TARGET>    Prefix, community, AS-path regex or host
        --vrf <VRF>          VRF [default: default]
    -d, --device <NAME>      Device to query; repeat for several. Without any, list devices.
    --help                   Print this help message
"#
        );
    }
}
