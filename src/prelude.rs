//! Re-exports the most commonly used deimos types.

pub use crate::command_buffer::{
    CommandBuffer, CommandBufferPool, CommandBufferState, PooledCommandBuffer,
};
pub use crate::error::Error;
pub use crate::graph::{ExecutionGraph, ExecutionNode, GraphViz};
pub use crate::resource::pool::{Pool, Poolable, Pooled};
pub use crate::resource::{Buffer, IoResource, ObjectType, ResourceId, Texture, TextureView};
pub use crate::task::group::{GroupMapping, IngroupConnection, MemberIo};
pub use crate::task::io::IoDirection;
pub use crate::task::wiring::{BlackBoxPolicy, SubtaskRole};
pub use crate::task::{CpuExecutor, PresentTask, TaskType};
