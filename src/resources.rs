//! CPU, memory, and process metrics from the process pseudo-filesystem.
//!
//! All collectors here are fail-soft: a missing source yields a zeroed
//! summary or an empty list, and a record that fails to parse (a process
//! that exited mid-enumeration, a short line) is skipped silently.

use std::fs;
use std::path::Path;

use ahash::AHashMap as HashMap;
use once_cell::sync::Lazy;
use tracing::debug;

use crate::models::{CpuSummary, MemorySummary, ProcessRecord};

/// Hard cap on the process listing. Records are kept in kernel
/// enumeration order, never sorted by resource usage.
pub const MAX_PROCESS_RECORDS: usize = 20;

/// Full CPU summary: identification from the cpuinfo source plus the
/// utilization figure.
pub fn cpu_summary(proc_root: &Path) -> CpuSummary {
    let mut summary = match fs::read_to_string(proc_root.join("cpuinfo")) {
        Ok(content) => parse_cpuinfo(&content),
        Err(e) => {
            debug!("cpuinfo unavailable: {}", e);
            CpuSummary::default()
        }
    };

    if summary.model.is_empty() {
        summary.model = "Unknown CPU".to_string();
    }
    summary.usage = cpu_usage_percent(proc_root);
    summary
}

/// CPU utilization percentage from a single read of the aggregate
/// cumulative tick counters.
///
/// One read of counters that accumulate since boot yields the average
/// utilization since boot, not an instantaneous rate. That is the
/// deliberate semantic of this value: clients of the snapshot contract
/// receive the same figure across restarts of the service, and no
/// sampling delay enters the request path. An instantaneous rate would
/// require two reads separated by an interval and differencing both the
/// total and the idle buckets.
pub fn cpu_usage_percent(proc_root: &Path) -> f64 {
    match fs::read_to_string(proc_root.join("stat")) {
        Ok(content) => parse_cpu_usage(content.lines().next().unwrap_or("")),
        Err(e) => {
            debug!("stat counters unavailable: {}", e);
            0.0
        }
    }
}

/// `(total - idle) / total * 100` over the aggregate counter line.
/// The idle bucket is the 4th tick field (index 4 including the label).
fn parse_cpu_usage(line: &str) -> f64 {
    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() < 8 {
        return 0.0;
    }

    let idle: u64 = fields[4].parse().unwrap_or(0);
    let total: u64 = fields[1..]
        .iter()
        .map(|v| v.parse::<u64>().unwrap_or(0))
        .sum();

    if total == 0 {
        return 0.0;
    }
    (total - idle) as f64 / total as f64 * 100.0
}

/// Static CPU identification from the cpuinfo key/value lines.
fn parse_cpuinfo(content: &str) -> CpuSummary {
    let mut summary = CpuSummary {
        cores: content
            .lines()
            .filter(|line| line.starts_with("processor"))
            .count(),
        ..Default::default()
    };

    for line in content.lines() {
        if line.starts_with("model name") {
            if let Some((_, value)) = line.split_once(':') {
                summary.model = value.trim().to_string();
            }
        } else if line.starts_with("cpu MHz") {
            if let Some((_, value)) = line.split_once(':') {
                let freq = value.trim();
                if !freq.is_empty() {
                    summary.frequency = format!("{freq} MHz");
                }
            }
        } else if line.starts_with("cache size") {
            if let Some((_, value)) = line.split_once(':') {
                summary.cache = value.trim().to_string();
            }
        } else if line.starts_with("flags") {
            let flags = line.to_lowercase();
            summary.aes = flags.contains("aes");
            summary.vmx = flags.contains("vmx") || flags.contains("svm");
            // Per-processor blocks repeat; the first flags line settles it.
            break;
        }
    }

    summary
}

/// Memory summary from the key/value accounting source.
pub fn memory_summary(proc_root: &Path) -> MemorySummary {
    match fs::read_to_string(proc_root.join("meminfo")) {
        Ok(content) => parse_meminfo(&content),
        Err(e) => {
            debug!("meminfo unavailable: {}", e);
            MemorySummary::default()
        }
    }
}

/// Parses `Key: value kB` lines into byte figures; `used` is derived as
/// `total - available` exactly.
fn parse_meminfo(content: &str) -> MemorySummary {
    let mut values: HashMap<&str, u64> = HashMap::new();
    for line in content.lines() {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < 2 {
            continue;
        }
        let key = fields[0].trim_end_matches(':');
        let kb: u64 = fields[1].parse().unwrap_or(0);
        values.insert(key, kb * 1024);
    }

    let total = values.get("MemTotal").copied().unwrap_or(0);
    let available = values.get("MemAvailable").copied().unwrap_or(0);
    let used = total.saturating_sub(available);
    let percent = if total > 0 {
        used as f64 / total as f64 * 100.0
    } else {
        0.0
    };

    MemorySummary {
        total,
        used,
        available,
        percent,
    }
}

/// Enumerates per-process accounting records in directory order, capped
/// at [`MAX_PROCESS_RECORDS`].
pub fn process_list(proc_root: &Path) -> Vec<ProcessRecord> {
    let mut records = Vec::new();
    let entries = match fs::read_dir(proc_root) {
        Ok(entries) => entries,
        Err(e) => {
            debug!("process root unreadable: {}", e);
            return records;
        }
    };

    for entry in entries.flatten() {
        let name = entry.file_name();
        let Some(name) = name.to_str() else { continue };
        let Ok(pid) = name.parse::<i32>() else {
            continue;
        };

        // The process may exit between enumeration and this read.
        let Ok(stat) = fs::read_to_string(entry.path().join("stat")) else {
            continue;
        };
        if let Some(record) = parse_stat_record(pid, &stat) {
            records.push(record);
            if records.len() >= MAX_PROCESS_RECORDS {
                break;
            }
        }
    }

    records
}

/// Parses one single-line accounting record by fixed field index.
fn parse_stat_record(pid: i32, line: &str) -> Option<ProcessRecord> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() < 24 {
        return None;
    }

    let name = fields[1]
        .trim_matches(|c| c == '(' || c == ')')
        .to_string();
    let status = fields[2].to_string();

    let utime: u64 = fields[13].parse().unwrap_or(0);
    let stime: u64 = fields[14].parse().unwrap_or(0);
    let cpu = (utime + stime) as f64 / clock_ticks_per_second() as f64;

    let rss_pages: u64 = fields[23].parse().unwrap_or(0);
    let memory = (rss_pages * page_size_bytes()) as f64;

    Some(ProcessRecord {
        pid,
        name,
        cpu,
        memory,
        status,
    })
}

// Runtime constants queried once; both values are fixed for the life of
// the process.
static CLOCK_TICKS: Lazy<u64> = Lazy::new(|| {
    // SAFETY: sysconf takes no pointers and has no preconditions.
    let ticks = unsafe { libc::sysconf(libc::_SC_CLK_TCK) };
    if ticks > 0 {
        ticks as u64
    } else {
        100
    }
});

static PAGE_SIZE: Lazy<u64> = Lazy::new(|| {
    // SAFETY: sysconf takes no pointers and has no preconditions.
    let size = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };
    if size > 0 {
        size as u64
    } else {
        4096
    }
});

/// Scheduler ticks per second, from sysconf with the conventional
/// fallback of 100.
pub fn clock_ticks_per_second() -> u64 {
    *CLOCK_TICKS
}

/// Resident page size in bytes, from sysconf with a 4 KiB fallback.
pub fn page_size_bytes() -> u64 {
    *PAGE_SIZE
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn cpu_usage_is_average_since_boot() {
        // user nice system idle iowait irq softirq steal
        let line = "cpu  300 0 100 500 50 20 30 0";
        // total = 1000, idle bucket = 500 -> 50% since boot.
        assert!((parse_cpu_usage(line) - 50.0).abs() < f64::EPSILON);
    }

    #[test]
    fn short_counter_line_reads_as_zero() {
        assert_eq!(parse_cpu_usage("cpu 1 2 3"), 0.0);
        assert_eq!(parse_cpu_usage(""), 0.0);
    }

    #[test]
    fn zeroed_counters_read_as_zero() {
        assert_eq!(parse_cpu_usage("cpu 0 0 0 0 0 0 0 0"), 0.0);
    }

    #[test]
    fn cpuinfo_details_are_extracted() {
        let content = "\
processor\t: 0\n\
model name\t: Example CPU @ 3.50GHz\n\
cpu MHz\t\t: 3500.000\n\
cache size\t: 16384 KB\n\
flags\t\t: fpu vme aes vmx sse2\n\
processor\t: 1\n\
model name\t: Example CPU @ 3.50GHz\n";
        let summary = parse_cpuinfo(content);
        assert_eq!(summary.model, "Example CPU @ 3.50GHz");
        assert_eq!(summary.cores, 2);
        assert_eq!(summary.frequency, "3500.000 MHz");
        assert_eq!(summary.cache, "16384 KB");
        assert!(summary.aes);
        assert!(summary.vmx);
    }

    #[test]
    fn svm_flag_counts_as_hardware_virtualization() {
        let content = "processor : 0\nflags : fpu svm sse2\n";
        let summary = parse_cpuinfo(content);
        assert!(!summary.aes);
        assert!(summary.vmx);
    }

    #[test]
    fn meminfo_used_is_total_minus_available() {
        let content = "\
MemTotal:       16384000 kB\n\
MemFree:         8192000 kB\n\
MemAvailable:   12288000 kB\n\
SwapTotal:       4096000 kB\n";
        let summary = parse_meminfo(content);
        assert_eq!(summary.total, 16_384_000 * 1024);
        assert_eq!(summary.available, 12_288_000 * 1024);
        assert_eq!(summary.used, summary.total - summary.available);
        assert!((summary.percent - 25.0).abs() < f64::EPSILON);
    }

    #[test]
    fn empty_meminfo_reads_as_zeroed_summary() {
        let summary = parse_meminfo("");
        assert_eq!(summary.total, 0);
        assert_eq!(summary.percent, 0.0);
    }

    #[test]
    fn stat_record_parses_fixed_fields() {
        let line = "1234 (example) S 1 1234 1234 0 -1 4194304 100 0 0 0 \
250 150 0 0 20 0 1 0 100 10000000 2048 18446744073709551615";
        let record = parse_stat_record(1234, line).unwrap();
        assert_eq!(record.pid, 1234);
        assert_eq!(record.name, "example");
        assert_eq!(record.status, "S");
        let expected_cpu = 400.0 / clock_ticks_per_second() as f64;
        assert!((record.cpu - expected_cpu).abs() < f64::EPSILON);
        assert_eq!(record.memory, (2048 * page_size_bytes()) as f64);
    }

    #[test]
    fn short_stat_record_is_rejected() {
        assert!(parse_stat_record(1, "1 (x) S 0 0").is_none());
    }

    #[test]
    fn process_listing_never_exceeds_cap() {
        let dir = tempfile::tempdir().unwrap();
        for pid in 1..=40 {
            let proc_dir = dir.path().join(pid.to_string());
            fs::create_dir_all(&proc_dir).unwrap();
            let stat = format!(
                "{pid} (worker-{pid}) S 1 {pid} {pid} 0 -1 4194304 0 0 0 0 \
10 5 0 0 20 0 1 0 100 1000000 512 18446744073709551615"
            );
            fs::write(proc_dir.join("stat"), stat).unwrap();
        }

        let records = process_list(dir.path());
        assert_eq!(records.len(), MAX_PROCESS_RECORDS);
    }

    #[test]
    fn non_numeric_and_unreadable_entries_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("sys")).unwrap();
        // Numeric directory without a stat file: process exited mid-scan.
        fs::create_dir_all(dir.path().join("99")).unwrap();
        let proc_dir = dir.path().join("42");
        fs::create_dir_all(&proc_dir).unwrap();
        fs::write(
            proc_dir.join("stat"),
            "42 (svc) R 1 42 42 0 -1 4194304 0 0 0 0 \
1 1 0 0 20 0 1 0 100 1000000 256 18446744073709551615",
        )
        .unwrap();

        let records = process_list(dir.path());
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].pid, 42);
        assert_eq!(records[0].name, "svc");
    }

    #[test]
    fn missing_proc_root_yields_empty_list() {
        assert!(process_list(Path::new("/no/such/proc/root")).is_empty());
    }
}
