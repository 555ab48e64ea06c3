//! Kernel command line inspection.

use std::path::Path;

/// Whether `cmdline` contains `word` as a whole whitespace-separated argument.
pub fn cmdline_has_word(cmdline: &str, word: &str) -> bool {
    cmdline.split_whitespace().any(|arg| arg == word)
}

/// Whether the kernel command line at `path` contains `word`.
///
/// An unreadable command line is logged and treated as not containing it.
pub fn kernel_cmdline_has(path: &Path, word: &str) -> bool {
    match std::fs::read_to_string(path) {
        Ok(cmdline) => cmdline_has_word(&cmdline, word),
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "Failed to read kernel command line"
            );
            false
        }
    }
}
