//! ghost: boot-time diagnostics collector.
//!
//! On every boot the collector allocates a boot index, prunes old boot
//! records when the archive outgrows its disk quota, creates a record for
//! this boot and then polls the service manager until each enabled
//! diagnostic (boot-animation timing, service start-up chart, bootchart
//! output) has been captured or the polling budget runs out.

pub mod archive;
pub mod collector;
pub mod config;
pub mod constants;
pub mod disk;
pub mod errors;
pub mod logging;
pub mod poll;
pub mod property;
pub mod util;

#[cfg(test)]
pub(crate) mod testing;

pub use collector::{Collector, CollectorOptions, CollectorReport, DiskProbeKind};
pub use config::GhostConfig;
pub use errors::{GhostError, GhostResult};
