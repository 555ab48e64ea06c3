mod cmdline;
mod process;
mod tool;

pub use cmdline::{cmdline_has_word, kernel_cmdline_has};
pub use process::{
    COMM_NAME_MAX, ProcessTable, SystemProcessTable, comm_name, find_process_by_name,
    is_process_alive,
};
pub use tool::{StdoutSink, SystemToolRunner, ToolExit, ToolInvocation, ToolOutput, ToolRunner};

/// English ordinal suffix for `n` ("st", "nd", "rd", "th").
pub fn ordinal_suffix(n: u64) -> &'static str {
    match (n % 10, n % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    }
}
