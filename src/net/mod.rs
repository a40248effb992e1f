//! Network metrics: interface counters and connection tables.

pub mod addr;
pub mod connections;
pub mod interfaces;

use std::path::Path;

use crate::models::NetworkSummary;

/// Assembles the full network summary from the kernel tables under
/// `proc_root` and the per-interface attributes under `sys_root`.
pub fn collect(proc_root: &Path, sys_root: &Path) -> NetworkSummary {
    let tcp = connections::collect(&proc_root.join("net/tcp"));
    let udp = connections::collect(&proc_root.join("net/udp"));
    let tcp_count = tcp.len();
    let udp_count = udp.len();

    NetworkSummary {
        interfaces: interfaces::collect(&proc_root.join("net/dev"), &sys_root.join("class/net")),
        tcp,
        udp,
        tcp_count,
        udp_count,
    }
}
