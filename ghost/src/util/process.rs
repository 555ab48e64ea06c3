//! Process lookup and existence probing.

use sysinfo::System;

/// Check if a process with the given PID exists.
///
/// Uses `libc::kill(pid, 0)` which sends a null signal to check existence.
/// `EPERM` means the process exists but belongs to someone else.
///
/// # Returns
/// * `true` - Process exists
/// * `false` - Process does not exist (or PID is not a valid target)
pub fn is_process_alive(pid: u32) -> bool {
    // 0 and negative values address process groups, not a single process.
    let Ok(raw) = i32::try_from(pid) else {
        return false;
    };
    if raw == 0 {
        return false;
    }

    if unsafe { libc::kill(raw, 0) } == 0 {
        return true;
    }
    std::io::Error::last_os_error().raw_os_error() == Some(libc::EPERM)
}

/// Longest process name the kernel keeps (`TASK_COMM_LEN - 1`).
pub const COMM_NAME_MAX: usize = 15;

/// `name` as the kernel reports it, cut to [`COMM_NAME_MAX`] bytes.
pub fn comm_name(name: &str) -> &str {
    if name.len() <= COMM_NAME_MAX {
        return name;
    }
    let mut end = COMM_NAME_MAX;
    while !name.is_char_boundary(end) {
        end -= 1;
    }
    &name[..end]
}

/// Find the PID of a running process by its name.
///
/// Names longer than the kernel's comm field also match their truncated
/// form. Returns the lowest PID when several processes share the name.
pub fn find_process_by_name(name: &str) -> Option<u32> {
    let mut sys = System::new();
    sys.refresh_processes();

    let comm = comm_name(name);
    sys.processes()
        .values()
        .filter(|process| process.name() == name || process.name() == comm)
        .map(|process| process.pid().as_u32())
        .min()
}

/// View of the host process table.
pub trait ProcessTable: Send + Sync {
    fn find_by_name(&self, name: &str) -> Option<u32>;

    fn is_alive(&self, pid: u32) -> bool;
}

/// Process table backed by the running system.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemProcessTable;

impl ProcessTable for SystemProcessTable {
    fn find_by_name(&self, name: &str) -> Option<u32> {
        find_process_by_name(name)
    }

    fn is_alive(&self, pid: u32) -> bool {
        is_process_alive(pid)
    }
}
