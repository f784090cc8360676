//! Exposes the deimos error type

use std::sync::PoisonError;

use thiserror::Error;

use crate::resource::ObjectType;
use crate::task::TaskType;

/// Error type that deimos can return.
#[derive(Error, Debug)]
pub enum Error {
    /// An IO list declares the same object twice.
    #[error("Task `{0}` declares duplicate IO for the same object.")]
    DuplicateIo(String),
    /// A command buffer state transition was requested that is not legal from its current state.
    #[error("Illegal command buffer transition: {0}")]
    CommandBufferState(&'static str),
    /// GPU tasks can only be created from a command buffer that finished recording.
    #[error("Command buffer is not in the recorded state.")]
    CommandBufferNotRecorded,
    /// Operation called on a task of the wrong type.
    #[error("Task `{name}` is not a {expected:?} task.")]
    TaskTypeMismatch {
        /// Name of the offending task.
        name: String,
        /// Task type the operation requires.
        expected: TaskType,
    },
    /// Group tasks must have at least one member task.
    #[error("Group task has no member tasks.")]
    EmptyGroup,
    /// The same task was inserted into a group twice.
    #[error("Task `{0}` is already a member of this group.")]
    DuplicateSubtask(String),
    /// Task graph contains a cycle and is impossible to resolve.
    #[error("Task graph contains cycle.")]
    GraphHasCycle,
    /// A mapping or connection references a member task index that does not exist.
    #[error("Member task index {index} out of range for group of {count} tasks.")]
    InvalidMemberIndex {
        /// The offending member index.
        index: usize,
        /// Number of member tasks in the group.
        count: usize,
    },
    /// An IO index is out of range for the referenced task.
    #[error("IO index {index} out of range for task `{name}`.")]
    InvalidIoIndex {
        /// Name of the referenced task.
        name: String,
        /// The offending IO index.
        index: usize,
    },
    /// A group-level IO index has no mapping that resolves it.
    #[error("Group-level IO index {0} has no mapping.")]
    UnmappedGroupIo(usize),
    /// Fan-in mappings for the same group-level IO index resolve to incompatible objects.
    #[error("Mappings for group-level IO index {index} resolve to incompatible objects ({first:?} vs {second:?}).")]
    IncompatibleMapping {
        /// The group-level IO index with conflicting mappings.
        index: usize,
        /// Object type the first mapping resolves to.
        first: ObjectType,
        /// Object type the conflicting mapping resolves to.
        second: ObjectType,
    },
    /// Node not found in graph. Generally this should not happen.
    #[error("Implementation error. Node not found. Please open an issue.")]
    NodeNotFound,
    /// Poisoned mutex
    #[error("Poisoned mutex")]
    PoisonError,
}

impl<T> From<PoisonError<T>> for Error {
    fn from(_: PoisonError<T>) -> Self {
        Error::PoisonError
    }
}
