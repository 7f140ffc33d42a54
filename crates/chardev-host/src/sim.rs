//! In-memory host kernel.
//!
//! [`SimKernel`] implements [`HostKernel`] without a real kernel behind it:
//! majors, classes and device nodes live in tables, every registration call
//! is journaled, and a [`FaultPlan`] can make individual steps fail. Device
//! nodes are reachable through [`SimKernel::open`], which routes I/O to the
//! [`FileOperations`] bound to the node's major.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::error::{HostError, Result};
use crate::handle::{ClassHandle, DeviceNumber, Major, NodeHandle};
use crate::traits::{FileOperations, HostKernel};
use crate::uaccess::UserSlice;

/// Dynamic major range of the simulated kernel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimConfig {
    /// First major handed out; allocation scans downwards from here.
    pub first_dynamic_major: u32,
    /// Lowest major that may be handed out.
    pub last_dynamic_major: u32,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            first_dynamic_major: 254,
            last_dynamic_major: 234,
        }
    }
}

impl SimConfig {
    pub fn with_major_range(mut self, first: u32, last: u32) -> Self {
        self.first_dynamic_major = first;
        self.last_dynamic_major = last;
        self
    }
}

/// Registration step a fault can be injected into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HostStep {
    AllocateMajor,
    CreateClass,
    CreateDeviceNode,
}

impl HostStep {
    pub fn as_str(self) -> &'static str {
        match self {
            HostStep::AllocateMajor => "allocate_major",
            HostStep::CreateClass => "create_class",
            HostStep::CreateDeviceNode => "create_device_node",
        }
    }
}

/// Failures to inject, each consumed by the next matching call.
#[derive(Debug, Clone, Default)]
pub struct FaultPlan {
    faults: Vec<(HostStep, i32)>,
}

impl FaultPlan {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the next call of `step` with `errno`.
    pub fn fail_next(mut self, step: HostStep, errno: i32) -> Self {
        self.faults.push((step, errno));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.faults.is_empty()
    }

    fn take(&mut self, step: HostStep) -> Option<i32> {
        let idx = self.faults.iter().position(|(s, _)| *s == step)?;
        Some(self.faults.remove(idx).1)
    }
}

/// One journaled registration call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostCall {
    AllocateMajor { name: String, major: u32 },
    CreateClass { name: String },
    CreateDeviceNode { name: String, devt: DeviceNumber },
    DestroyDeviceNode { name: String },
    UnregisterClass { name: String },
    ReleaseMajor { name: String, major: u32 },
    Failed { step: HostStep, errno: i32 },
}

impl HostCall {
    /// Short operation name, for tables and filters.
    pub fn op(&self) -> &'static str {
        match self {
            HostCall::AllocateMajor { .. } => "allocate_major",
            HostCall::CreateClass { .. } => "create_class",
            HostCall::CreateDeviceNode { .. } => "create_device_node",
            HostCall::DestroyDeviceNode { .. } => "destroy_device_node",
            HostCall::UnregisterClass { .. } => "unregister_class",
            HostCall::ReleaseMajor { .. } => "release_major",
            HostCall::Failed { .. } => "failed",
        }
    }
}

impl fmt::Display for HostCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HostCall::AllocateMajor { name, major } => {
                write!(f, "allocate_major {name} -> {major}")
            }
            HostCall::CreateClass { name } => write!(f, "create_class {name}"),
            HostCall::CreateDeviceNode { name, devt } => {
                write!(f, "create_device_node /dev/{name} ({devt})")
            }
            HostCall::DestroyDeviceNode { name } => write!(f, "destroy_device_node /dev/{name}"),
            HostCall::UnregisterClass { name } => write!(f, "unregister_class {name}"),
            HostCall::ReleaseMajor { name, major } => write!(f, "release_major {name} ({major})"),
            HostCall::Failed { step, errno } => write!(f, "{} failed (errno {errno})", step.as_str()),
        }
    }
}

struct Device {
    name: String,
    fops: Arc<dyn FileOperations>,
}

struct Node {
    id: u64,
    class_id: u64,
    devt: DeviceNumber,
}

#[derive(Default)]
struct SimState {
    majors: BTreeMap<u32, Device>,
    classes: BTreeMap<u64, String>,
    nodes: BTreeMap<String, Node>,
    next_id: u64,
    journal: Vec<HostCall>,
    faults: FaultPlan,
}

impl SimState {
    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn injected(&mut self, step: HostStep) -> Result<()> {
        match self.faults.take(step) {
            Some(errno) => {
                debug!(step = step.as_str(), errno, "injected host fault");
                self.journal.push(HostCall::Failed { step, errno });
                Err(HostError::from_errno(errno))
            }
            None => Ok(()),
        }
    }
}

/// Simulated host kernel.
pub struct SimKernel {
    config: SimConfig,
    state: Mutex<SimState>,
}

impl Default for SimKernel {
    fn default() -> Self {
        Self::new()
    }
}

impl SimKernel {
    pub fn new() -> Self {
        Self::with_config(SimConfig::default())
    }

    pub fn with_config(config: SimConfig) -> Self {
        Self {
            config,
            state: Mutex::new(SimState::default()),
        }
    }

    /// Replace the pending fault plan.
    pub fn with_faults(self, plan: FaultPlan) -> Self {
        self.set_faults(plan);
        self
    }

    pub fn set_faults(&self, plan: FaultPlan) {
        self.state.lock().faults = plan;
    }

    /// Every registration call made so far, in order.
    pub fn journal(&self) -> Vec<HostCall> {
        self.state.lock().journal.clone()
    }

    /// Number of journaled calls with the given operation name.
    pub fn count(&self, op: &str) -> usize {
        self.state
            .lock()
            .journal
            .iter()
            .filter(|call| call.op() == op)
            .count()
    }

    pub fn is_major_registered(&self, major: u32) -> bool {
        self.state.lock().majors.contains_key(&major)
    }

    pub fn registered_majors(&self) -> Vec<u32> {
        self.state.lock().majors.keys().copied().collect()
    }

    pub fn class_names(&self) -> Vec<String> {
        self.state.lock().classes.values().cloned().collect()
    }

    pub fn device_nodes(&self) -> Vec<String> {
        self.state.lock().nodes.keys().cloned().collect()
    }

    /// Open a device node by path, e.g. `/dev/chardev`.
    pub fn open(&self, path: &str) -> Result<OpenFile> {
        let fops = {
            let state = self.state.lock();
            let node = path
                .strip_prefix("/dev/")
                .and_then(|name| state.nodes.get(name))
                .ok_or_else(|| HostError::NoDevice(path.to_string()))?;
            let device = state
                .majors
                .get(&node.devt.major)
                .ok_or_else(|| HostError::NoDevice(path.to_string()))?;
            Arc::clone(&device.fops)
        };

        // Driver callbacks run without the host lock held.
        fops.open()?;
        debug!(path, "opened device node");
        Ok(OpenFile {
            fops,
            path: path.to_string(),
            pos: 0,
            open: true,
        })
    }
}

impl HostKernel for SimKernel {
    fn allocate_major(&self, name: &str, fops: Arc<dyn FileOperations>) -> Result<Major> {
        let mut state = self.state.lock();
        state.injected(HostStep::AllocateMajor)?;

        let first = self.config.first_dynamic_major;
        let last = self.config.last_dynamic_major;
        let number = (last..=first)
            .rev()
            .find(|n| !state.majors.contains_key(n))
            .ok_or_else(|| HostError::MajorsExhausted {
                name: name.to_string(),
            })?;

        state.majors.insert(
            number,
            Device {
                name: name.to_string(),
                fops,
            },
        );
        state.journal.push(HostCall::AllocateMajor {
            name: name.to_string(),
            major: number,
        });
        Ok(Major::new(number, name))
    }

    fn create_class(&self, name: &str) -> Result<ClassHandle> {
        let mut state = self.state.lock();
        state.injected(HostStep::CreateClass)?;

        if state.classes.values().any(|existing| existing == name) {
            return Err(HostError::AlreadyExists {
                kind: "class",
                name: name.to_string(),
            });
        }

        let id = state.next_id();
        state.classes.insert(id, name.to_string());
        state.journal.push(HostCall::CreateClass {
            name: name.to_string(),
        });
        Ok(ClassHandle::new(id, name))
    }

    fn create_device_node(
        &self,
        class: &ClassHandle,
        devt: DeviceNumber,
        name: &str,
    ) -> Result<NodeHandle> {
        let mut state = self.state.lock();
        state.injected(HostStep::CreateDeviceNode)?;

        if !state.classes.contains_key(&class.id()) {
            return Err(HostError::Errno(libc::EINVAL));
        }
        if !state.majors.contains_key(&devt.major) {
            return Err(HostError::Errno(libc::ENODEV));
        }
        if state.nodes.contains_key(name) {
            return Err(HostError::AlreadyExists {
                kind: "device node",
                name: name.to_string(),
            });
        }

        let id = state.next_id();
        state.nodes.insert(
            name.to_string(),
            Node {
                id,
                class_id: class.id(),
                devt,
            },
        );
        state.journal.push(HostCall::CreateDeviceNode {
            name: name.to_string(),
            devt,
        });
        Ok(NodeHandle::new(id, name, devt))
    }

    fn destroy_device_node(&self, class: &ClassHandle, node: NodeHandle) {
        let mut state = self.state.lock();
        let matches = state
            .nodes
            .get(node.name())
            .is_some_and(|n| n.id == node.id() && n.class_id == class.id());
        if !matches {
            warn!(name = node.name(), "destroying unknown device node");
            return;
        }
        state.nodes.remove(node.name());
        state.journal.push(HostCall::DestroyDeviceNode {
            name: node.name().to_string(),
        });
    }

    fn unregister_class(&self, class: ClassHandle) {
        let mut state = self.state.lock();
        if state.classes.remove(&class.id()).is_none() {
            warn!(name = class.name(), "unregistering unknown class");
            return;
        }
        if state.nodes.values().any(|n| n.class_id == class.id()) {
            warn!(name = class.name(), "class unregistered with live device nodes");
        }
        state.journal.push(HostCall::UnregisterClass {
            name: class.name().to_string(),
        });
    }

    fn release_major(&self, major: Major) {
        let mut state = self.state.lock();
        match state.majors.remove(&major.number()) {
            Some(device) if device.name == major.name() => {
                state.journal.push(HostCall::ReleaseMajor {
                    name: major.name().to_string(),
                    major: major.number(),
                });
            }
            Some(device) => {
                warn!(
                    major = major.number(),
                    registered = %device.name,
                    requested = major.name(),
                    "major released under the wrong name"
                );
                state.majors.insert(major.number(), device);
            }
            None => warn!(major = major.number(), "releasing unknown major"),
        }
    }
}

/// An open device node. Dropping it releases the file.
pub struct OpenFile {
    fops: Arc<dyn FileOperations>,
    path: String,
    pos: i64,
    open: bool,
}

impl OpenFile {
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn read(&mut self, buf: &mut dyn UserSlice) -> Result<usize> {
        self.fops.read(buf, &mut self.pos)
    }

    pub fn write(&mut self, data: &[u8]) -> Result<usize> {
        self.fops.write(data, &mut self.pos)
    }

    /// Close the file and report the driver's release result.
    pub fn close(mut self) -> Result<()> {
        self.open = false;
        self.fops.release()
    }
}

impl Drop for OpenFile {
    fn drop(&mut self) {
        if self.open {
            if let Err(err) = self.fops.release() {
                debug!(path = %self.path, %err, "release failed on drop");
            }
        }
    }
}

impl fmt::Debug for OpenFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenFile")
            .field("path", &self.path)
            .field("pos", &self.pos)
            .finish()
    }
}
