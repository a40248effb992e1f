//! Per-interface byte counters from the network device table.
//!
//! The counters table carries two header lines, then one line per
//! interface: the name (with a trailing colon) followed by fixed-position
//! receive and transmit counters. The loopback interface is always
//! excluded. Link speed comes from a per-interface sysfs file and defaults
//! to a nominal 1 Gbit/s when the kernel does not expose it.

use std::path::Path;

use crate::models::InterfaceRecord;
use crate::procfs;

/// Nominal link speed assumed when the kernel exposes none.
pub const DEFAULT_LINK_SPEED_BPS: u64 = 1_000_000_000;

/// Field layout of the counters table after whitespace splitting.
const MIN_FIELDS: usize = 10;
const RECV_BYTES_FIELD: usize = 1;
const SENT_BYTES_FIELD: usize = 9;

/// Collects one record per non-loopback interface. A missing counters
/// table yields an empty list.
pub fn collect(dev_table: &Path, sys_class_net: &Path) -> Vec<InterfaceRecord> {
    procfs::read_table(dev_table, 2, MIN_FIELDS)
        .iter()
        .filter_map(|fields| record_from_fields(fields))
        .map(|mut record| {
            record.speed = link_speed(sys_class_net, &record.name);
            record
        })
        .collect()
}

/// Extracts name and byte counters from one table row; `None` for the
/// loopback interface.
fn record_from_fields(fields: &[String]) -> Option<InterfaceRecord> {
    let name = fields[0].trim_end_matches(':');
    if name == "lo" {
        return None;
    }

    Some(InterfaceRecord {
        name: name.to_string(),
        bytes_recv: fields[RECV_BYTES_FIELD].parse().unwrap_or(0),
        bytes_sent: fields[SENT_BYTES_FIELD].parse().unwrap_or(0),
        speed: DEFAULT_LINK_SPEED_BPS,
    })
}

/// Best-effort link speed lookup: the sysfs value is Mbit/s.
fn link_speed(sys_class_net: &Path, name: &str) -> u64 {
    procfs::read_trimmed(&sys_class_net.join(name).join("speed"))
        .and_then(|raw| raw.parse::<u64>().ok())
        .map(|mbit| mbit * 1_000_000)
        .unwrap_or(DEFAULT_LINK_SPEED_BPS)
}
