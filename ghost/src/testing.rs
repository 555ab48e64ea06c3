//! In-crate fakes for the external collaborators.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::disk::{DiskProbe, FilesystemUsage};
use crate::errors::{GhostError, GhostResult};
use crate::property::{PropertyKind, PropertySource, PropertyTarget, PropertyValue};
use crate::util::{ProcessTable, ToolExit, ToolInvocation, ToolOutput, ToolRunner};

pub(crate) fn exited(code: i32, stdout: &str) -> ToolOutput {
    ToolOutput {
        exit: ToolExit::Exited(code),
        stdout: stdout.as_bytes().to_vec(),
        stderr: Vec::new(),
    }
}

pub(crate) fn signaled(signal: i32) -> ToolOutput {
    ToolOutput {
        exit: ToolExit::Signaled(Some(signal)),
        stdout: Vec::new(),
        stderr: Vec::new(),
    }
}

type Responder = dyn Fn(&ToolInvocation) -> GhostResult<ToolOutput> + Send + Sync;

/// Tool runner answering from a closure and recording every invocation.
pub(crate) struct FakeToolRunner {
    responder: Box<Responder>,
    calls: Mutex<Vec<ToolInvocation>>,
}

impl FakeToolRunner {
    pub(crate) fn new(
        responder: impl Fn(&ToolInvocation) -> GhostResult<ToolOutput> + Send + Sync + 'static,
    ) -> Arc<Self> {
        Arc::new(Self {
            responder: Box::new(responder),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub(crate) fn calls(&self) -> Vec<ToolInvocation> {
        self.calls.lock().clone()
    }

    pub(crate) fn calls_to(&self, program: &str) -> Vec<ToolInvocation> {
        self.calls
            .lock()
            .iter()
            .filter(|call| call.program == program)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl ToolRunner for FakeToolRunner {
    async fn run(&self, invocation: &ToolInvocation) -> GhostResult<ToolOutput> {
        self.calls.lock().push(invocation.clone());
        (self.responder)(invocation)
    }
}

/// Property source backed by a mutable table.
#[derive(Default)]
pub(crate) struct FakePropertySource {
    values: Mutex<HashMap<(String, String), PropertyValue>>,
    queries: Mutex<Vec<(String, String)>>,
}

impl FakePropertySource {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub(crate) fn set(&self, target: PropertyTarget<'_>, property: &str, value: PropertyValue) {
        self.values
            .lock()
            .insert((target.to_string(), property.to_string()), value);
    }

    pub(crate) fn set_str(&self, target: PropertyTarget<'_>, property: &str, value: &str) {
        self.set(target, property, PropertyValue::Str(value.to_string()));
    }

    pub(crate) fn unset(&self, target: PropertyTarget<'_>, property: &str) {
        self.values
            .lock()
            .remove(&(target.to_string(), property.to_string()));
    }

    pub(crate) fn query_count(&self) -> usize {
        self.queries.lock().len()
    }
}

#[async_trait]
impl PropertySource for FakePropertySource {
    async fn get(
        &self,
        target: PropertyTarget<'_>,
        property: &str,
        _kind: PropertyKind,
    ) -> GhostResult<PropertyValue> {
        let key = (target.to_string(), property.to_string());
        self.queries.lock().push(key.clone());
        self.values
            .lock()
            .get(&key)
            .cloned()
            .ok_or_else(|| GhostError::Property(format!("{} of {} unavailable", property, target)))
    }
}

/// Process table with scripted names and liveness.
#[derive(Default)]
pub(crate) struct FakeProcessTable {
    names: Mutex<HashMap<String, u32>>,
    alive: Mutex<HashSet<u32>>,
}

impl FakeProcessTable {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub(crate) fn spawn(&self, name: &str, pid: u32) {
        self.names.lock().insert(name.to_string(), pid);
        self.alive.lock().insert(pid);
    }

    pub(crate) fn exit(&self, pid: u32) {
        self.alive.lock().remove(&pid);
    }
}

impl ProcessTable for FakeProcessTable {
    fn find_by_name(&self, name: &str) -> Option<u32> {
        self.names.lock().get(name).copied()
    }

    fn is_alive(&self, pid: u32) -> bool {
        self.alive.lock().contains(&pid)
    }
}

/// Disk probe with a fixed capacity whose tree usage is the sum of the sized
/// paths that still exist under the measured root.
pub(crate) struct FakeDiskProbe {
    total_blocks: u64,
    sizes: Mutex<Vec<(PathBuf, u64)>>,
}

impl FakeDiskProbe {
    pub(crate) fn new(total_blocks: u64) -> Self {
        Self {
            total_blocks,
            sizes: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn size_path(&self, path: impl Into<PathBuf>, kib: u64) {
        self.sizes.lock().push((path.into(), kib));
    }
}

#[async_trait]
impl DiskProbe for FakeDiskProbe {
    async fn filesystem(&self, path: &Path) -> GhostResult<FilesystemUsage> {
        Ok(FilesystemUsage {
            filesystem: "fake".to_string(),
            total_blocks: self.total_blocks,
            used_blocks: 0,
            available_blocks: self.total_blocks,
            use_percent: Some(0),
            mount_point: path.display().to_string(),
        })
    }

    async fn tree_usage(&self, path: &Path) -> GhostResult<u64> {
        Ok(self
            .sizes
            .lock()
            .iter()
            .filter(|(sized, _)| sized.starts_with(path) && sized.symlink_metadata().is_ok())
            .map(|(_, kib)| kib)
            .sum())
    }
}

/// Start a copy of `sleep` installed as `dir/name`, and wait until the
/// kernel reports it under that name.
pub(crate) fn spawn_renamed_sleep(dir: &Path, name: &str) -> std::process::Child {
    let sleep = ["/bin/sleep", "/usr/bin/sleep"]
        .into_iter()
        .map(Path::new)
        .find(|path| path.exists())
        .expect("sleep binary");
    let program = dir.join(name);
    std::fs::copy(sleep, &program).unwrap();

    // A concurrent fork may still hold the copy open for writing.
    let mut attempts = 0;
    let child = loop {
        match std::process::Command::new(&program).arg("30").spawn() {
            Ok(child) => break child,
            Err(e) if e.raw_os_error() == Some(libc::ETXTBSY) && attempts < 50 => {
                attempts += 1;
                std::thread::sleep(Duration::from_millis(20));
            }
            Err(e) => panic!("failed to spawn {}: {}", program.display(), e),
        }
    };

    let comm_path = format!("/proc/{}/comm", child.id());
    let expected = crate::util::comm_name(name);
    for _ in 0..100 {
        let comm = std::fs::read_to_string(&comm_path).unwrap_or_default();
        if comm.trim_end() == expected {
            break;
        }
        std::thread::sleep(Duration::from_millis(20));
    }
    child
}
