//! Ping summaries.
//!
//! Recognizes the Unix/JunOS summary
//! (`5 packets transmitted, 5 received, 0% packet loss` followed by
//! `rtt min/avg/max/mdev = ...`) and the Cisco one
//! (`Success rate is 100 percent (5/5), round-trip min/avg/max = 1/2/4 ms`).

use std::sync::LazyLock;

use regex::Regex;

use crate::model::PingStats;

static UNIX_SUMMARY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d+) packets transmitted, (\d+) (?:packets )?received,.*?([\d.]+)% packet loss")
        .expect("static regex")
});

static UNIX_RTT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:rtt|round-trip) min/avg/max(?:/\w+)? = ([\d.]+)/([\d.]+)/([\d.]+)")
        .expect("static regex")
});

static CISCO_SUMMARY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Success rate is (\d+) percent \((\d+)/(\d+)\)(?:, round-trip min/avg/max = (\d+)/(\d+)/(\d+) ms)?")
        .expect("static regex")
});

static HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:PING \S+|Sending \d+, \d+-byte ICMP Echos to)").expect("static regex")
});

/// Parse ping output.
pub(super) fn parse(output: &str) -> PingStats {
    let mut stats = PingStats::default();

    for line in output.lines() {
        let line = line.trim();

        if let Some(caps) = UNIX_SUMMARY.captures(line) {
            stats.transmitted = caps[1].parse().unwrap_or_default();
            stats.received = caps[2].parse().unwrap_or_default();
            stats.loss_percent = caps[3].parse().unwrap_or_default();
            stats.any_line_matched = true;
        } else if let Some(caps) = UNIX_RTT.captures(line) {
            stats.rtt_min_ms = caps[1].parse().ok();
            stats.rtt_avg_ms = caps[2].parse().ok();
            stats.rtt_max_ms = caps[3].parse().ok();
            stats.any_line_matched = true;
        } else if let Some(caps) = CISCO_SUMMARY.captures(line) {
            let rate: f64 = caps[1].parse().unwrap_or_default();
            stats.received = caps[2].parse().unwrap_or_default();
            stats.transmitted = caps[3].parse().unwrap_or_default();
            stats.loss_percent = 100.0 - rate;
            stats.rtt_min_ms = caps.get(4).and_then(|m| m.as_str().parse().ok());
            stats.rtt_avg_ms = caps.get(5).and_then(|m| m.as_str().parse().ok());
            stats.rtt_max_ms = caps.get(6).and_then(|m| m.as_str().parse().ok());
            stats.any_line_matched = true;
        } else if HEADER.is_match(line) {
            stats.any_line_matched = true;
        }
    }

    stats
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linux_ping() {
        let output = "\
PING 8.8.8.8 (8.8.8.8) from 192.0.2.1 : 56(84) bytes of data.
64 bytes from 8.8.8.8: icmp_seq=1 ttl=117 time=1.23 ms

--- 8.8.8.8 ping statistics ---
5 packets transmitted, 4 received, 20% packet loss, time 4005ms
rtt min/avg/max/mdev = 1.100/1.230/1.400/0.100 ms
";
        let stats = parse(output);
        assert!(stats.any_line_matched);
        assert_eq!(stats.transmitted, 5);
        assert_eq!(stats.received, 4);
        assert_eq!(stats.loss_percent, 20.0);
        assert_eq!(stats.rtt_min_ms, Some(1.1));
        assert_eq!(stats.rtt_avg_ms, Some(1.23));
        assert_eq!(stats.rtt_max_ms, Some(1.4));
    }

    #[test]
    fn test_junos_ping() {
        let output = "\
PING 8.8.8.8 (8.8.8.8): 56 data bytes
!!!!!
--- 8.8.8.8 ping statistics ---
5 packets transmitted, 5 packets received, 0% packet loss
round-trip min/avg/max/stddev = 1.046/1.233/1.446/0.132 ms
";
        let stats = parse(output);
        assert_eq!(stats.received, 5);
        assert_eq!(stats.loss_percent, 0.0);
        assert_eq!(stats.rtt_max_ms, Some(1.446));
    }

    #[test]
    fn test_cisco_ping() {
        let output = "\
Type escape sequence to abort.
Sending 5, 100-byte ICMP Echos to 8.8.8.8, timeout is 2 seconds:
!!!!!
Success rate is 100 percent (5/5), round-trip min/avg/max = 1/2/4 ms
";
        let stats = parse(output);
        assert_eq!(stats.transmitted, 5);
        assert_eq!(stats.received, 5);
        assert_eq!(stats.loss_percent, 0.0);
        assert_eq!(stats.rtt_avg_ms, Some(2.0));
    }

    #[test]
    fn test_cisco_all_lost() {
        let stats = parse("Success rate is 0 percent (0/5)\n");
        assert!(stats.any_line_matched);
        assert_eq!(stats.loss_percent, 100.0);
        assert_eq!(stats.rtt_min_ms, None);
    }

    #[test]
    fn test_unrecognized() {
        let stats = parse("ping: unknown host nowhere.invalid\n");
        assert!(!stats.any_line_matched);
        assert_eq!(stats.transmitted, 0);
    }
}
