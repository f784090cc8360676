//! Opaque command buffer records.
//!
//! A command buffer is a pre-recorded sequence of GPU commands. The individual
//! commands are not modeled here; the present-task graph only cares about the
//! record itself and whether it finished recording, since a GPU task can only
//! be created from a buffer in the [`Recorded`](CommandBufferState::Recorded)
//! state. Records are reusable and are handed out by a [`CommandBufferPool`];
//! releasing one resets it back to its initial state.

use std::sync::atomic::{AtomicU64, Ordering};

use anyhow::Result;

use crate::error::Error;
use crate::resource::pool::{Pool, Poolable, Pooled};

static NEXT_COMMAND_BUFFER_ID: AtomicU64 = AtomicU64::new(1);

/// Recording state of a command buffer.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub enum CommandBufferState {
    /// Freshly created or reset, not recording.
    #[default]
    Initial,
    /// Between [`CommandBuffer::begin()`] and [`CommandBuffer::finish()`].
    Recording,
    /// Recording finished, the buffer can back a GPU task.
    Recorded,
}

/// A reusable command buffer record.
#[derive(Debug)]
pub struct CommandBuffer {
    id: u64,
    state: CommandBufferState,
}

/// Pool handing out reusable [`CommandBuffer`] records.
pub type CommandBufferPool = Pool<CommandBuffer>;

/// An owned command buffer record. Dropping it releases the record back to the
/// pool it came from.
pub type PooledCommandBuffer = Pooled<CommandBuffer>;

impl CommandBuffer {
    /// Create a new command buffer record in the initial state.
    pub fn new() -> Self {
        let id = NEXT_COMMAND_BUFFER_ID.fetch_add(1, Ordering::Relaxed);
        #[cfg(feature = "log-objects")]
        trace!("Created new command buffer {id}");
        Self {
            id,
            state: CommandBufferState::Initial,
        }
    }

    /// Get the unique id of this record.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Get the current recording state.
    pub fn state(&self) -> CommandBufferState {
        self.state
    }

    /// Begin recording.
    /// # Errors
    /// - Fails if the buffer is not in the initial state.
    pub fn begin(&mut self) -> Result<()> {
        match self.state {
            CommandBufferState::Initial => {
                self.state = CommandBufferState::Recording;
                Ok(())
            }
            _ => Err(Error::CommandBufferState("begin() requires the initial state").into()),
        }
    }

    /// Finish recording and move the record into the recorded state.
    /// # Errors
    /// - Fails if the buffer is not recording.
    pub fn finish(&mut self) -> Result<()> {
        match self.state {
            CommandBufferState::Recording => {
                self.state = CommandBufferState::Recorded;
                Ok(())
            }
            _ => Err(Error::CommandBufferState("finish() requires the recording state").into()),
        }
    }

    /// Reset the record back to the initial state. Valid from every state.
    pub fn reset(&mut self) {
        self.state = CommandBufferState::Initial;
    }

    /// Whether this record finished recording.
    pub fn is_recorded(&self) -> bool {
        self.state == CommandBufferState::Recorded
    }
}

impl Default for CommandBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl Poolable for CommandBuffer {
    fn on_release(&mut self) {
        #[cfg(feature = "log-objects")]
        trace!("Released command buffer {} back to its pool", self.id);
        self.reset();
    }
}

impl CommandBufferPool {
    /// Create a command buffer pool with `count` preallocated records.
    pub fn with_capacity(count: usize) -> Result<Self> {
        Pool::new(|| Ok(CommandBuffer::new()), Some(count))
    }

    /// Grab a record from the pool, allocating a new one if the free-list is
    /// empty.
    pub fn allocate(&self) -> Result<PooledCommandBuffer> {
        CommandBuffer::new_in_pool(self)
    }
}
