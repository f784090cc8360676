//! IO resolution: index-based lookup of a task's inputs and outputs by object
//! identity, including the texture/view alias rule and recursive resolution
//! through nested group tasks down to the leaf task that owns the IO.

use anyhow::Result;

use crate::error::Error;
use crate::resource::IoResource;
use crate::task::{PresentTask, TaskPayload};

/// Which of a task's two IO lists an operation refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IoDirection {
    /// The task reads the resource.
    Input,
    /// The task writes the resource.
    Output,
}

impl IoDirection {
    /// The opposite direction. A producer's outputs are matched against
    /// consumers' inputs and vice versa.
    pub fn complement(self) -> Self {
        match self {
            IoDirection::Input => IoDirection::Output,
            IoDirection::Output => IoDirection::Input,
        }
    }
}

impl PresentTask {
    /// Number of IOs this task exposes in the given direction. For group
    /// tasks this is the number of *unique* group-level IOs, not the sum of
    /// member IO counts.
    pub fn io_count(&self, direction: IoDirection) -> Result<usize> {
        match self.payload() {
            TaskPayload::Cpu(task) => Ok(task.io_list(direction).len()),
            TaskPayload::Gpu(task) => Ok(task.io_list(direction).len()),
            TaskPayload::Group(state) => {
                let state = state.lock().map_err(Error::from)?;
                Ok(state.unique_count(direction))
            }
        }
    }

    /// Get the object exposed at an IO index.
    ///
    /// For group tasks this resolves through one mapping hop to the owning
    /// member, recursing if that member is itself a group, until the concrete
    /// object is read from the leaf task that declared it.
    /// # Errors
    /// - Fails if the index is out of range for this task and direction.
    pub fn io(&self, direction: IoDirection, index: usize) -> Result<IoResource> {
        match self.payload() {
            TaskPayload::Cpu(task) => task.io_list(direction).get(index).cloned().ok_or_else(|| {
                Error::InvalidIoIndex {
                    name: self.name().to_owned(),
                    index,
                }
                .into()
            }),
            TaskPayload::Gpu(task) => task.io_list(direction).get(index).cloned().ok_or_else(|| {
                Error::InvalidIoIndex {
                    name: self.name().to_owned(),
                    index,
                }
                .into()
            }),
            TaskPayload::Group(state) => {
                let state = state.lock().map_err(Error::from)?;
                if index >= state.unique_count(direction) {
                    return Err(Error::InvalidIoIndex {
                        name: self.name().to_owned(),
                        index,
                    }
                    .into());
                }
                let mapping = state
                    .mappings(direction)
                    .iter()
                    .find(|mapping| mapping.group_io_index == index)
                    .copied()
                    .ok_or(Error::UnmappedGroupIo(index))?;
                state.tasks[mapping.task_index].io(mapping.io_direction, mapping.io_index)
            }
        }
    }

    /// Find the IO index at which this task exposes `object` in the given
    /// direction, under the alias rule: a texture matches any view over it.
    ///
    /// For group tasks each mapping's resolved object is tested and the match
    /// is translated back to the group-level index. Returns `None` if the
    /// object was never declared. Recursion terminates because the task graph
    /// is acyclic by construction.
    pub fn io_index(&self, direction: IoDirection, object: &IoResource) -> Result<Option<usize>> {
        match self.payload() {
            TaskPayload::Cpu(task) => Ok(task
                .io_list(direction)
                .iter()
                .position(|slot| slot.aliases(object))),
            TaskPayload::Gpu(task) => Ok(task
                .io_list(direction)
                .iter()
                .position(|slot| slot.aliases(object))),
            TaskPayload::Group(state) => {
                let state = state.lock().map_err(Error::from)?;
                for mapping in state.mappings(direction) {
                    let slot =
                        state.tasks[mapping.task_index].io(mapping.io_direction, mapping.io_index)?;
                    if slot.aliases(object) {
                        return Ok(Some(mapping.group_io_index));
                    }
                }
                Ok(None)
            }
        }
    }
}
