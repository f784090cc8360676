//! The present task record.
//!
//! A [`PresentTask`] is one node in the frame's work graph: a unit of CPU or
//! GPU work, or a composite group of such units. Tasks declare the external
//! resources they read and write as IO slots; the auto-wiring engine in
//! [`wiring`] uses those declarations to infer producer/consumer dependencies
//! from shared resource identity.
//!
//! Tasks are shared-ownership values: cloning a handle retains the task,
//! dropping one releases it. A group retains all of its member tasks and a
//! GPU task exclusively owns its recorded command buffer, which returns to
//! its pool when the task is destroyed.

use std::sync::{Arc, Mutex};

use anyhow::Result;
use static_assertions::assert_impl_all;

use crate::command_buffer::{CommandBuffer, PooledCommandBuffer};
use crate::error::Error;
use crate::resource::IoResource;

pub mod group;
pub mod io;
pub mod wiring;

pub use group::{GroupMapping, IngroupConnection, MemberIo};
pub use io::IoDirection;
pub use wiring::{BlackBoxPolicy, SubtaskRole};

use group::GroupState;

/// Type of a present task. Immutable after construction.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum TaskType {
    /// Work executed on the CPU by the frame executor.
    Cpu,
    /// A recorded command buffer submitted to the GPU.
    Gpu,
    /// A composite of member tasks with internal wiring.
    Group,
}

/// Defines the CPU work a [`TaskType::Cpu`] task performs when the frame
/// executor reaches it.
pub trait CpuExecutor: Send {
    /// Run the CPU work for this task.
    fn execute(&mut self) -> Result<()>;
}

impl<F> CpuExecutor for F
where
    F: FnMut() -> Result<()> + Send,
{
    /// Run the CPU work for this task by calling the given function.
    fn execute(&mut self) -> Result<()> {
        self()
    }
}

pub(crate) type BoxedCpuFn = Box<dyn CpuExecutor>;

#[derive(Derivative)]
#[derivative(Debug)]
pub(crate) struct CpuTask {
    #[derivative(Debug = "ignore")]
    pub(crate) execute: Mutex<BoxedCpuFn>,
    pub(crate) inputs: Vec<IoResource>,
    pub(crate) outputs: Vec<IoResource>,
}

#[derive(Derivative)]
#[derivative(Debug)]
pub(crate) struct GpuTask {
    #[derivative(Debug = "ignore")]
    pub(crate) command_buffer: PooledCommandBuffer,
    pub(crate) inputs: Vec<IoResource>,
    pub(crate) outputs: Vec<IoResource>,
}

impl CpuTask {
    pub(crate) fn io_list(&self, direction: IoDirection) -> &[IoResource] {
        match direction {
            IoDirection::Input => &self.inputs,
            IoDirection::Output => &self.outputs,
        }
    }
}

impl GpuTask {
    pub(crate) fn io_list(&self, direction: IoDirection) -> &[IoResource] {
        match direction {
            IoDirection::Input => &self.inputs,
            IoDirection::Output => &self.outputs,
        }
    }
}

#[derive(Debug)]
pub(crate) enum TaskPayload {
    Cpu(CpuTask),
    Gpu(GpuTask),
    Group(Mutex<GroupState>),
}

#[derive(Debug)]
pub(crate) struct TaskInner {
    name: String,
    payload: TaskPayload,
}

#[cfg(feature = "log-objects")]
impl Drop for TaskInner {
    fn drop(&mut self) {
        trace!("Destroyed task `{}`", self.name);
    }
}

/// Handle to a present task. Cloning the handle retains the task, dropping a
/// handle releases it; the task is destroyed when the last handle goes away,
/// releasing owned command buffers and, for groups, member tasks.
#[derive(Debug, Clone)]
pub struct PresentTask {
    inner: Arc<TaskInner>,
}

assert_impl_all!(PresentTask: Send, Sync);

fn validate_io_list(name: &str, list: &[IoResource]) -> Result<()> {
    for (index, slot) in list.iter().enumerate() {
        if list[..index].iter().any(|other| other.id() == slot.id()) {
            return Err(Error::DuplicateIo(name.to_owned()).into());
        }
    }
    Ok(())
}

impl PresentTask {
    fn from_payload(name: String, payload: TaskPayload) -> Self {
        #[cfg(feature = "log-objects")]
        trace!("Created task `{name}`");
        Self {
            inner: Arc::new(TaskInner {
                name,
                payload,
            }),
        }
    }

    /// Create a CPU task. The executor is invoked by the external frame
    /// executor; the task graph itself never runs it.
    /// # Errors
    /// - Fails if an IO list declares the same object twice.
    pub fn cpu(
        name: impl Into<String>,
        executor: impl CpuExecutor + 'static,
        inputs: Vec<IoResource>,
        outputs: Vec<IoResource>,
    ) -> Result<Self> {
        let name = name.into();
        validate_io_list(&name, &inputs)?;
        validate_io_list(&name, &outputs)?;
        Ok(Self::from_payload(
            name,
            TaskPayload::Cpu(CpuTask {
                execute: Mutex::new(Box::new(executor)),
                inputs,
                outputs,
            }),
        ))
    }

    /// Create a GPU task from a recorded command buffer. The task takes
    /// ownership of the buffer; destroying the task releases the buffer back
    /// to its pool.
    /// # Errors
    /// - Fails if the command buffer did not finish recording, or if an IO
    ///   list declares the same object twice. Nothing is partially
    ///   constructed on failure.
    pub fn gpu(
        name: impl Into<String>,
        command_buffer: PooledCommandBuffer,
        inputs: Vec<IoResource>,
        outputs: Vec<IoResource>,
    ) -> Result<Self> {
        let name = name.into();
        validate_io_list(&name, &inputs)?;
        validate_io_list(&name, &outputs)?;
        if !command_buffer.is_recorded() {
            return Err(Error::CommandBufferNotRecorded.into());
        }
        Ok(Self::from_payload(
            name,
            TaskPayload::Gpu(GpuTask {
                command_buffer,
                inputs,
                outputs,
            }),
        ))
    }

    /// Create a group task from member tasks, internal connections and
    /// group-level IO mapping tables. Every member task is retained.
    /// # Errors
    /// - Fails if the member list is empty or contains the same task twice,
    ///   if a connection or mapping references an invalid member or IO index,
    ///   if a group-level IO index has no mapping, if fan-in mappings for the
    ///   same group index resolve to incompatible objects, or if the
    ///   connection set is cyclic.
    pub fn group(
        name: impl Into<String>,
        tasks: &[PresentTask],
        connections: Vec<IngroupConnection>,
        input_mappings: Vec<GroupMapping>,
        output_mappings: Vec<GroupMapping>,
    ) -> Result<Self> {
        let (unique_input_count, unique_output_count) =
            group::validate(tasks, &connections, &input_mappings, &output_mappings)?;
        Ok(Self::from_payload(
            name.into(),
            TaskPayload::Group(Mutex::new(GroupState {
                tasks: tasks.to_vec(),
                connections,
                input_mappings,
                output_mappings,
                unique_input_count,
                unique_output_count,
            })),
        ))
    }

    /// Get the debug name of this task.
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Get the type of this task.
    pub fn task_type(&self) -> TaskType {
        match &self.inner.payload {
            TaskPayload::Cpu(_) => TaskType::Cpu,
            TaskPayload::Gpu(_) => TaskType::Gpu,
            TaskPayload::Group(_) => TaskType::Group,
        }
    }

    /// Number of handles currently retaining this task.
    pub fn reference_count(&self) -> usize {
        Arc::strong_count(&self.inner)
    }

    /// Whether two handles refer to the same task.
    pub fn same_task(&self, other: &PresentTask) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Get the command buffer owned by this GPU task, `None` for other task
    /// types.
    pub fn command_buffer(&self) -> Option<&CommandBuffer> {
        match &self.inner.payload {
            TaskPayload::Gpu(task) => Some(&task.command_buffer),
            _ => None,
        }
    }

    /// Run the CPU work of this task. Meant to be called by the external
    /// frame executor when it reaches this task.
    /// # Errors
    /// - Fails if this is not a CPU task, or if the executor itself fails.
    pub fn execute_cpu(&self) -> Result<()> {
        match &self.inner.payload {
            TaskPayload::Cpu(task) => {
                let mut execute = task.execute.lock().map_err(Error::from)?;
                execute.execute()
            }
            _ => Err(self.type_mismatch(TaskType::Cpu)),
        }
    }

    /// Number of member tasks of this group.
    /// # Errors
    /// - Fails if this is not a group task.
    pub fn subtask_count(&self) -> Result<usize> {
        self.with_group(|state| state.tasks.len())
    }

    /// Get a handle to a member task of this group.
    /// # Errors
    /// - Fails if this is not a group task or the index is out of range.
    pub fn subtask(&self, index: usize) -> Result<PresentTask> {
        self.with_group(|state| {
            state.tasks.get(index).cloned().ok_or(Error::InvalidMemberIndex {
                index,
                count: state.tasks.len(),
            })
        })?
        .map_err(Into::into)
    }

    /// Get handles to all member tasks of this group.
    /// # Errors
    /// - Fails if this is not a group task.
    pub fn subtasks(&self) -> Result<Vec<PresentTask>> {
        self.with_group(|state| state.tasks.clone())
    }

    /// Get the internal producer/consumer connections of this group.
    /// # Errors
    /// - Fails if this is not a group task.
    pub fn ingroup_connections(&self) -> Result<Vec<IngroupConnection>> {
        self.with_group(|state| state.connections.clone())
    }

    /// Get the group-level IO mapping table for a direction.
    /// # Errors
    /// - Fails if this is not a group task.
    pub fn io_mappings(&self, direction: IoDirection) -> Result<Vec<GroupMapping>> {
        self.with_group(|state| state.mappings(direction).to_vec())
    }

    /// Whether this task is, or transitively contains, `other`. Used to keep
    /// the task graph acyclic when wiring groups.
    pub(crate) fn contains(&self, other: &PresentTask) -> bool {
        if self.same_task(other) {
            return true;
        }
        if let TaskPayload::Group(state) = &self.inner.payload {
            if let Ok(state) = state.lock() {
                return state.tasks.iter().any(|task| task.contains(other));
            }
        }
        false
    }

    pub(crate) fn payload(&self) -> &TaskPayload {
        &self.inner.payload
    }

    pub(crate) fn type_mismatch(&self, expected: TaskType) -> anyhow::Error {
        Error::TaskTypeMismatch {
            name: self.name().to_owned(),
            expected,
        }
        .into()
    }

    pub(crate) fn with_group<R>(&self, f: impl FnOnce(&GroupState) -> R) -> Result<R> {
        match &self.inner.payload {
            TaskPayload::Group(state) => {
                let state = state.lock().map_err(Error::from)?;
                Ok(f(&state))
            }
            _ => Err(self.type_mismatch(TaskType::Group)),
        }
    }

    pub(crate) fn with_group_mut<R>(
        &self,
        f: impl FnOnce(&mut GroupState) -> Result<R>,
    ) -> Result<R> {
        match &self.inner.payload {
            TaskPayload::Group(state) => {
                let mut state = state.lock().map_err(Error::from)?;
                f(&mut state)
            }
            _ => Err(self.type_mismatch(TaskType::Group)),
        }
    }
}
