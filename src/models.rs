//! Response types for the snapshot API.
//!
//! Every type here is a plain value: snapshots are assembled fresh per
//! request and own no references into the collectors. Wire field names are
//! stable for clients; serde renames cover the places where Rust naming
//! differs.

use serde::Serialize;

/// Full point-in-time snapshot returned by the system endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    pub cpu: CpuSummary,
    pub memory: MemorySummary,
    pub processes: Vec<ProcessRecord>,
    pub network: NetworkSummary,
    pub speedtest: SpeedTestResult,
    pub system: HostDetails,
}

/// Aggregate CPU facts: utilization plus static identification.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CpuSummary {
    pub model: String,
    pub cores: usize,
    pub frequency: String,
    pub cache: String,
    /// Utilization percentage, 0-100. Average since boot; see
    /// [`crate::resources::cpu_usage_percent`].
    pub usage: f64,
    pub aes: bool,
    pub vmx: bool,
}

/// Memory accounting derived from the kernel's key/value source.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MemorySummary {
    pub total: u64,
    pub used: u64,
    pub available: u64,
    pub percent: f64,
}

/// One process from the per-process accounting files.
#[derive(Debug, Clone, Serialize)]
pub struct ProcessRecord {
    pub pid: i32,
    pub name: String,
    /// Cumulative CPU time in seconds (user + system ticks).
    pub cpu: f64,
    /// Resident memory in bytes.
    pub memory: f64,
    /// Single-letter kernel state code.
    pub status: String,
}

/// Interface counters plus the per-connection tables.
#[derive(Debug, Clone, Default, Serialize)]
pub struct NetworkSummary {
    pub interfaces: Vec<InterfaceRecord>,
    pub tcp: Vec<ConnectionRecord>,
    pub udp: Vec<ConnectionRecord>,
    pub tcp_count: usize,
    pub udp_count: usize,
}

/// Counters for one non-loopback network interface.
#[derive(Debug, Clone, Serialize)]
pub struct InterfaceRecord {
    pub name: String,
    pub bytes_sent: u64,
    pub bytes_recv: u64,
    /// Link speed in bits/second, best-effort.
    pub speed: u64,
}

/// One row of a TCP or UDP connection table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConnectionRecord {
    pub local_addr: String,
    pub remote_addr: String,
    pub status: String,
    /// Owning process id, 0 when unresolvable.
    pub pid: i32,
}

/// Last known speed measurement. Exactly one instance exists process-wide,
/// mutated only under the coordinator's lock.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SpeedTestResult {
    pub running: bool,
    pub download: f64,
    pub upload: f64,
    pub ping: f64,
    pub server: String,
    pub last_updated: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub error: String,
}

/// Static and slow-changing host facts. Every field degrades to
/// `"Unknown"` when its source is absent.
#[derive(Debug, Clone, Serialize)]
pub struct HostDetails {
    pub os: String,
    pub kernel: String,
    pub arch: String,
    pub uptime: String,
    pub load_average: String,
    #[serde(rename = "tcp_cc")]
    pub tcp_congestion: String,
    pub virtualization: String,
    pub ipv4_status: String,
    pub ipv6_status: String,
    pub organization: String,
    pub location: String,
    pub region: String,
    pub total_disk: String,
    pub used_disk: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn speedtest_error_omitted_when_empty() {
        let value = serde_json::to_value(SpeedTestResult::default()).unwrap();
        assert!(value.get("error").is_none());

        let with_error = SpeedTestResult {
            error: "boom".into(),
            ..Default::default()
        };
        let value = serde_json::to_value(with_error).unwrap();
        assert_eq!(value["error"], "boom");
    }

    #[test]
    fn host_details_uses_wire_name_for_congestion_control() {
        let details = HostDetails {
            os: String::new(),
            kernel: String::new(),
            arch: String::new(),
            uptime: String::new(),
            load_average: String::new(),
            tcp_congestion: "bbr".into(),
            virtualization: String::new(),
            ipv4_status: String::new(),
            ipv6_status: String::new(),
            organization: String::new(),
            location: String::new(),
            region: String::new(),
            total_disk: String::new(),
            used_disk: String::new(),
        };
        let value = serde_json::to_value(details).unwrap();
        assert_eq!(value["tcp_cc"], "bbr");
    }
}
