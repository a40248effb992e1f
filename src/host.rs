//! Static and slow-changing host facts.
//!
//! Everything here is best-effort: each fact falls back to `"Unknown"`
//! (or an offline marker) when its source is absent, so the snapshot
//! stays complete on restricted hosts. External commands run through the
//! [`CommandRunner`] capability; none of them is on a hot path and each
//! is bounded by the tool's own behavior.

use std::ffi::CString;
use std::fs;
use std::path::Path;

use tracing::debug;

use crate::command::{capture, CommandRunner};
use crate::models::HostDetails;

const UNKNOWN: &str = "Unknown";

/// Assembles all host identity facts.
pub fn host_details(runner: &dyn CommandRunner, proc_root: &Path) -> HostDetails {
    let (total_disk, used_disk) = disk_totals();

    HostDetails {
        os: os_release(),
        kernel: kernel(runner),
        arch: arch(runner),
        uptime: uptime(proc_root),
        load_average: load_average(proc_root),
        tcp_congestion: tcp_congestion(runner),
        virtualization: virtualization(runner, proc_root),
        ipv4_status: probe_status(runner, &["-4", "-c", "1", "-W", "4", "8.8.8.8"]),
        ipv6_status: probe_status(runner, &["-6", "-c", "1", "-W", "4", "2001:4860:4860::8888"]),
        organization: geo_fact(runner, "org"),
        location: location(runner),
        region: geo_fact(runner, "region"),
        total_disk,
        used_disk,
    }
}

/// Pretty name from the os-release file.
fn os_release() -> String {
    if let Ok(content) = fs::read_to_string("/etc/os-release") {
        for line in content.lines() {
            if let Some(value) = line.strip_prefix("PRETTY_NAME=") {
                return value.trim_matches('"').to_string();
            }
        }
    }
    UNKNOWN.to_string()
}

fn kernel(runner: &dyn CommandRunner) -> String {
    capture(runner, "uname", &["-r"]).unwrap_or_else(|| UNKNOWN.to_string())
}

/// Machine architecture with a word-size suffix.
fn arch(runner: &dyn CommandRunner) -> String {
    match capture(runner, "uname", &["-m"]) {
        Some(arch) => {
            let bits = if arch.contains("64") { "64" } else { "32" };
            format!("{arch} ({bits} Bit)")
        }
        None => UNKNOWN.to_string(),
    }
}

fn uptime(proc_root: &Path) -> String {
    if let Ok(content) = fs::read_to_string(proc_root.join("uptime")) {
        if let Some(seconds) = content
            .split_whitespace()
            .next()
            .and_then(|v| v.parse::<f64>().ok())
        {
            return format_uptime(seconds);
        }
    }
    UNKNOWN.to_string()
}

fn format_uptime(seconds: f64) -> String {
    let total = seconds as u64;
    let days = total / 86_400;
    let hours = (total % 86_400) / 3_600;
    let minutes = (total % 3_600) / 60;
    format!("{days} days, {hours} hour {minutes} min")
}

/// First three fields of the loadavg source, comma-joined.
fn load_average(proc_root: &Path) -> String {
    if let Ok(content) = fs::read_to_string(proc_root.join("loadavg")) {
        let fields: Vec<&str> = content.split_whitespace().collect();
        if fields.len() >= 3 {
            return format!("{}, {}, {}", fields[0], fields[1], fields[2]);
        }
    }
    UNKNOWN.to_string()
}

fn tcp_congestion(runner: &dyn CommandRunner) -> String {
    capture(runner, "sysctl", &["-n", "net.ipv4.tcp_congestion_control"])
        .unwrap_or_else(|| UNKNOWN.to_string())
}

/// Virtualization hint: cpuinfo markers, then DMI product name, then the
/// xen directory, then pid-1 cgroup membership. `"Dedicated"` when
/// nothing matches.
fn virtualization(runner: &dyn CommandRunner, proc_root: &Path) -> String {
    if let Ok(content) = fs::read_to_string(proc_root.join("cpuinfo")) {
        let content = content.to_lowercase();
        if content.contains("vmware") {
            return "VMware".to_string();
        }
        if content.contains("kvm") {
            return "KVM".to_string();
        }
    }

    if let Some(product) = capture(runner, "dmidecode", &["-s", "system-product-name"]) {
        let product = product.to_lowercase();
        if product.contains("vmware") {
            return "VMware".to_string();
        }
        if product.contains("kvm") {
            return "KVM".to_string();
        }
        if product.contains("virtualbox") {
            return "VirtualBox".to_string();
        }
    }

    if proc_root.join("xen").exists() {
        return "Xen".to_string();
    }

    if let Ok(content) = fs::read_to_string(proc_root.join("1/cgroup")) {
        if content.contains("docker") {
            return "Docker".to_string();
        }
        if content.contains("lxc") {
            return "LXC".to_string();
        }
    }

    "Dedicated".to_string()
}

/// Reachability probe: one bounded ping, reported as an online marker.
fn probe_status(runner: &dyn CommandRunner, args: &[&str]) -> String {
    let online = matches!(runner.invoke("ping", args), Ok(output) if output.success);
    if online {
        "\u{2713} Online".to_string()
    } else {
        "\u{2717} Offline".to_string()
    }
}

/// One field of the geolocation lookup, captured as opaque text.
fn geo_fact(runner: &dyn CommandRunner, field: &str) -> String {
    let url = format!("http://ipinfo.io/{field}");
    capture(runner, "wget", &["-q", "-T10", "-O-", &url]).unwrap_or_else(|| UNKNOWN.to_string())
}

/// `city / country`, both fields required.
fn location(runner: &dyn CommandRunner) -> String {
    let city = capture(runner, "wget", &["-q", "-T10", "-O-", "http://ipinfo.io/city"]);
    let country = capture(
        runner,
        "wget",
        &["-q", "-T10", "-O-", "http://ipinfo.io/country"],
    );
    match (city, country) {
        (Some(city), Some(country)) => format!("{city} / {country}"),
        _ => UNKNOWN.to_string(),
    }
}

/// Total and used bytes of the root filesystem, human-readable.
fn disk_totals() -> (String, String) {
    match disk_usage("/") {
        Some((total, used)) => (format_bytes(total), format_bytes(used)),
        None => (UNKNOWN.to_string(), UNKNOWN.to_string()),
    }
}

fn disk_usage(path: &str) -> Option<(u64, u64)> {
    let c_path = CString::new(path).ok()?;
    // SAFETY: c_path is a valid NUL-terminated string and stat is a
    // zeroed out-parameter the call fully initializes on success.
    let mut stat: libc::statvfs = unsafe { std::mem::zeroed() };
    let rc = unsafe { libc::statvfs(c_path.as_ptr(), &mut stat) };
    if rc != 0 {
        debug!("statvfs({}) failed", path);
        return None;
    }

    let block = stat.f_frsize as u64;
    let total = stat.f_blocks as u64 * block;
    let available = stat.f_bavail as u64 * block;
    Some((total, total.saturating_sub(available)))
}

/// Binary-unit rendering, one decimal place above bytes.
pub fn format_bytes(bytes: u64) -> String {
    const UNIT: u64 = 1024;
    if bytes < UNIT {
        return format!("{bytes} B");
    }

    let mut div = UNIT;
    let mut exp = 0usize;
    let mut n = bytes / UNIT;
    while n >= UNIT {
        div *= UNIT;
        exp += 1;
        n /= UNIT;
    }

    const SUFFIXES: [char; 6] = ['K', 'M', 'G', 'T', 'P', 'E'];
    format!("{:.1} {}B", bytes as f64 / div as f64, SUFFIXES[exp])
}
