use std::path::Path;

use activity_stream_core::SystemMetrics;
use chrono::Utc;
use sysinfo::{Disks, System};

/// Source of the once-per-cycle host utilization sample.
pub trait MetricsSource {
    fn sample(&mut self) -> SystemMetrics;
}

/// Host metrics through `sysinfo`. The first CPU reading after start is 0
/// because usage is measured between two refreshes.
pub struct SysinfoSampler {
    system: System,
    disks: Disks,
}

impl SysinfoSampler {
    pub fn new() -> Self {
        let mut system = System::new();
        system.refresh_cpu_usage();
        system.refresh_memory();
        Self {
            system,
            disks: Disks::new_with_refreshed_list(),
        }
    }

    fn memory_pct(&self) -> f64 {
        percent(self.system.used_memory(), self.system.total_memory())
    }

    /// Usage of the filesystem mounted at `/`, or of all disks together when
    /// no root mount is listed.
    fn disk_pct(&self) -> f64 {
        let list = self.disks.list();
        if let Some(root) = list.iter().find(|d| d.mount_point() == Path::new("/")) {
            let total = root.total_space();
            return percent(total.saturating_sub(root.available_space()), total);
        }
        let total: u64 = list.iter().map(|d| d.total_space()).sum();
        let available: u64 = list.iter().map(|d| d.available_space()).sum();
        percent(total.saturating_sub(available), total)
    }
}

impl Default for SysinfoSampler {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsSource for SysinfoSampler {
    fn sample(&mut self) -> SystemMetrics {
        self.system.refresh_cpu_usage();
        self.system.refresh_memory();
        self.disks.refresh_list();

        SystemMetrics::new(
            self.system.global_cpu_usage() as f64,
            self.memory_pct(),
            self.disk_pct(),
            Utc::now(),
        )
    }
}

fn percent(used: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        used as f64 / total as f64 * 100.0
    }
}
