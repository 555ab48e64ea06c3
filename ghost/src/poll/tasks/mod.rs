//! The diagnostic tasks.

mod bootchart;
mod boottime;
mod plotchart;

pub use bootchart::BootChartTask;
pub use boottime::{BootTimeTask, format_platform_seconds};
pub use plotchart::PlotChartTask;
