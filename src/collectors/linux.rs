use super::MetricsCollector;
use crate::model::Field;
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::Path;

/// Bytes per sector as reported by /proc/diskstats, independent of the
/// device's real sector size.
const SECTOR_SIZE: f64 = 512.0;

pub struct LinuxCollector;

impl LinuxCollector {
    pub fn new() -> Self {
        Self
    }
}

impl Default for LinuxCollector {
    fn default() -> Self {
        Self::new()
    }
}

// ── parsers ─────────────────────────────────────────────────────────────

/// Parse /proc/meminfo into the virtual memory breakdown.
///
/// `cached` folds in reclaimable slab, and `used` is what remains after
/// free memory, buffers and page cache are taken out of the total.
pub fn parse_meminfo(content: &str) -> io::Result<Vec<Field>> {
    let mut kb: HashMap<&str, u64> = HashMap::new();
    for line in content.lines() {
        if let Some((key, rest)) = line.split_once(':') {
            if let Some(value) = rest.split_whitespace().next().and_then(|v| v.parse().ok()) {
                kb.insert(key.trim(), value);
            }
        }
    }

    let get = |key: &str| kb.get(key).map(|v| (*v * 1024) as f64);
    let total = get("MemTotal")
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidData, "MemTotal missing from /proc/meminfo"))?;
    let free = get("MemFree").unwrap_or(0.0);
    let buffers = get("Buffers").unwrap_or(0.0);
    let cached = get("Cached").unwrap_or(0.0) + get("SReclaimable").unwrap_or(0.0);
    // Kernels before 3.14 have no MemAvailable.
    let available = get("MemAvailable").unwrap_or(free + buffers + cached);
    let mut used = total - free - buffers - cached;
    if used < 0.0 {
        used = total - free;
    }
    let percent = if total > 0.0 {
        ((total - available) / total * 1000.0).round() / 10.0
    } else {
        0.0
    };

    Ok(vec![
        ("total", total),
        ("available", available),
        ("percent", percent),
        ("used", used),
        ("free", free),
        ("active", get("Active").unwrap_or(0.0)),
        ("inactive", get("Inactive").unwrap_or(0.0)),
        ("buffers", buffers),
        ("cached", cached),
        ("shared", get("Shmem").unwrap_or(0.0)),
        ("slab", get("Slab").unwrap_or(0.0)),
    ])
}

/// Sum /proc/diskstats over whole block devices (partitions are excluded so
/// nothing is counted twice).
pub fn parse_diskstats(content: &str, is_device: impl Fn(&str) -> bool) -> Vec<Field> {
    // Fields (0-indexed):
    //  2  name
    //  3  reads completed     4  reads merged    5  sectors read     6  ms reading
    //  7  writes completed    8  writes merged   9  sectors written 10  ms writing
    // 12  io_ticks (ms spent doing I/Os)
    let mut totals = [0u64; 9];
    for line in content.lines() {
        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.len() < 13 || !is_device(parts[2]) {
            continue;
        }
        let col = |i: usize| parts[i].parse::<u64>().unwrap_or(0);
        let row = [
            col(3),
            col(7),
            col(5),
            col(9),
            col(6),
            col(10),
            col(4),
            col(8),
            col(12),
        ];
        for (total, v) in totals.iter_mut().zip(row) {
            *total = total.wrapping_add(v);
        }
    }

    vec![
        ("read_count", totals[0] as f64),
        ("write_count", totals[1] as f64),
        ("read_bytes", totals[2] as f64 * SECTOR_SIZE),
        ("write_bytes", totals[3] as f64 * SECTOR_SIZE),
        ("read_time", totals[4] as f64),
        ("write_time", totals[5] as f64),
        ("read_merged_count", totals[6] as f64),
        ("write_merged_count", totals[7] as f64),
        ("busy_time", totals[8] as f64),
    ]
}

/// Count the CPUs in a `Cpus_allowed_list` value such as `0-3,8,10-11`.
pub fn parse_cpu_list(list: &str) -> io::Result<usize> {
    let invalid = || io::Error::new(io::ErrorKind::InvalidData, format!("bad cpu list '{}'", list));
    let mut count = 0;
    for part in list.trim().split(',').filter(|p| !p.is_empty()) {
        match part.split_once('-') {
            Some((lo, hi)) => {
                let lo: usize = lo.parse().map_err(|_| invalid())?;
                let hi: usize = hi.parse().map_err(|_| invalid())?;
                if hi < lo {
                    return Err(invalid());
                }
                count += hi - lo + 1;
            }
            None => {
                part.parse::<usize>().map_err(|_| invalid())?;
                count += 1;
            }
        }
    }
    if count == 0 {
        return Err(invalid());
    }
    Ok(count)
}

// ── block-device detection ──────────────────────────────────────────────

/// Return `true` if `name` looks like a whole block device rather than a
/// partition.  Uses /sys/block/<name> when available, otherwise falls back
/// to name-pattern heuristics.
fn is_block_device(name: &str) -> bool {
    if Path::new(&format!("/sys/block/{}", name)).exists() {
        return true;
    }
    is_block_device_name(name)
}

/// Name heuristics for when /sys is unavailable (e.g. some containers).
fn is_block_device_name(name: &str) -> bool {
    let third_alpha = |prefix: &str, len: usize| {
        name.starts_with(prefix) && name.len() == len && name.as_bytes()[len - 1].is_ascii_alphabetic()
    };
    // sda, vda, xvda (not sda1)
    if third_alpha("sd", 3) || third_alpha("vd", 3) || third_alpha("xvd", 4) {
        return true;
    }
    // nvme0n1 (not nvme0n1p1)
    if name.starts_with("nvme") && name.contains('n') && !name.contains('p') {
        return true;
    }
    // mmcblk0 (not mmcblk0p1)
    if name.starts_with("mmcblk") && !name.contains('p') {
        return true;
    }
    name.starts_with("dm-")
}

// ── trait implementation ────────────────────────────────────────────────

impl MetricsCollector for LinuxCollector {
    fn memory(&mut self) -> io::Result<Vec<Field>> {
        parse_meminfo(&fs::read_to_string("/proc/meminfo")?)
    }

    fn disk_io(&mut self) -> io::Result<Vec<Field>> {
        let content = fs::read_to_string("/proc/diskstats")?;
        Ok(parse_diskstats(&content, is_block_device))
    }

    /// Affinity mask of this process from /proc/self/status.
    fn available_cpus(&self) -> io::Result<usize> {
        let status = fs::read_to_string("/proc/self/status")?;
        let list = status
            .lines()
            .find_map(|line| line.strip_prefix("Cpus_allowed_list:"))
            .ok_or_else(|| io::Error::new(io::ErrorKind::Unsupported, "Cpus_allowed_list not reported"))?;
        parse_cpu_list(list)
    }
}
