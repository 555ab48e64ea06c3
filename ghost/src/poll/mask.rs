//! Pending-task bookkeeping.

use std::fmt;

use crate::config::GhostConfig;

/// The optional diagnostic tasks, in evaluation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskKind {
    BootTime,
    PlotChart,
    BootChart,
}

impl TaskKind {
    pub const COUNT: usize = 3;

    pub const ALL: [TaskKind; Self::COUNT] =
        [TaskKind::BootTime, TaskKind::PlotChart, TaskKind::BootChart];

    fn slot(self) -> usize {
        self as usize
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TaskKind::BootTime => "boottime",
            TaskKind::PlotChart => "plotchart",
            TaskKind::BootChart => "bootchart",
        }
    }
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Set of tasks still pending.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TaskSet {
    pending: [bool; TaskKind::COUNT],
}

impl TaskSet {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Tasks enabled by the configuration.
    pub fn from_config(config: &GhostConfig) -> Self {
        let mut set = Self::empty();
        if config.boottime {
            set.insert(TaskKind::BootTime);
        }
        if config.plotchart {
            set.insert(TaskKind::PlotChart);
        }
        if config.bootchart {
            set.insert(TaskKind::BootChart);
        }
        set
    }

    pub fn contains(&self, kind: TaskKind) -> bool {
        self.pending[kind.slot()]
    }

    pub fn insert(&mut self, kind: TaskKind) {
        self.pending[kind.slot()] = true;
    }

    /// Clear `kind`. Returns whether it was pending.
    pub fn remove(&mut self, kind: TaskKind) -> bool {
        std::mem::replace(&mut self.pending[kind.slot()], false)
    }

    pub fn is_empty(&self) -> bool {
        !self.pending.iter().any(|pending| *pending)
    }

    pub fn len(&self) -> usize {
        self.pending.iter().filter(|pending| **pending).count()
    }

    /// Pending tasks in evaluation order.
    pub fn iter(&self) -> impl Iterator<Item = TaskKind> + '_ {
        TaskKind::ALL.into_iter().filter(|kind| self.contains(*kind))
    }
}

impl fmt::Display for TaskSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.iter().map(TaskKind::as_str).collect();
        write!(f, "[{}]", names.join(", "))
    }
}
