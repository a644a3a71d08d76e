//! Process-level memory counters reported by the OS
//!
//! Best effort: anything the platform cannot provide reads as zero.

use sysinfo::{ProcessRefreshKind, ProcessesToUpdate, System};

/// Memory counters for the current process
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProcessCounters {
    /// Resident set size in bytes
    pub resident_bytes: u64,
    /// Virtual memory size in bytes
    pub virtual_bytes: u64,
    /// Peak resident set size in bytes
    pub max_resident_bytes: u64,
    pub minor_page_faults: u64,
    pub major_page_faults: u64,
}

/// Reads process counters, reusing one `sysinfo::System` between calls
pub struct ProcessReader {
    system: System,
}

impl ProcessReader {
    pub fn new() -> Self {
        Self {
            system: System::new(),
        }
    }

    pub fn read(&mut self) -> ProcessCounters {
        let (resident_bytes, virtual_bytes) = self.read_sysinfo();
        let usage = read_rusage();

        ProcessCounters {
            resident_bytes,
            virtual_bytes,
            max_resident_bytes: usage.max_resident_bytes,
            minor_page_faults: usage.minor_page_faults,
            major_page_faults: usage.major_page_faults,
        }
    }

    fn read_sysinfo(&mut self) -> (u64, u64) {
        let pid = match sysinfo::get_current_pid() {
            Ok(pid) => pid,
            Err(e) => {
                tracing::debug!("Current pid unavailable: {}", e);
                return (0, 0);
            }
        };

        self.system.refresh_processes_specifics(
            ProcessesToUpdate::Some(&[pid]),
            true,
            ProcessRefreshKind::nothing().with_memory(),
        );

        match self.system.process(pid) {
            Some(process) => (process.memory(), process.virtual_memory()),
            None => (0, 0),
        }
    }
}

impl Default for ProcessReader {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Default)]
struct Rusage {
    max_resident_bytes: u64,
    minor_page_faults: u64,
    major_page_faults: u64,
}

#[cfg(unix)]
fn read_rusage() -> Rusage {
    use std::mem::MaybeUninit;

    let mut info: MaybeUninit<libc::rusage> = MaybeUninit::uninit();
    // SAFETY: getrusage fills the struct on success; we only read it then.
    let info = unsafe {
        if libc::getrusage(libc::RUSAGE_SELF, info.as_mut_ptr()) != 0 {
            return Rusage::default();
        }
        info.assume_init()
    };

    // ru_maxrss is in bytes on macOS, kilobytes elsewhere
    let max_rss = info.ru_maxrss.max(0) as u64;
    let max_resident_bytes = if cfg!(target_os = "macos") {
        max_rss
    } else {
        max_rss * 1024
    };

    Rusage {
        max_resident_bytes,
        minor_page_faults: info.ru_minflt.max(0) as u64,
        major_page_faults: info.ru_majflt.max(0) as u64,
    }
}

#[cfg(not(unix))]
fn read_rusage() -> Rusage {
    Rusage::default()
}
