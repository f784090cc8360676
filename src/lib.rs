//! Present-task graph construction with automatic dependency wiring
//!
//! Deimos describes a frame's CPU and GPU work as a directed graph of typed,
//! data-dependent tasks. Rendering code builds leaf tasks that declare which
//! external resources they read and write, composes them into groups, and
//! hands the resulting root task to a frame executor. Dependencies are never
//! spelled out by hand: the wiring engine infers producer → consumer edges
//! from shared resource identity, with a texture and any view over it
//! counting as the same dependency.
//!
//! The graph is a build-time description. Deimos does not schedule, submit or
//! synchronize anything itself; it only records *what reads and writes what*,
//! precisely enough for an external scheduler to insert barriers.
//!
//! # Example
//!
//! Two GPU tasks, wired automatically because one writes the texture the
//! other samples through a view:
//! ```
//! use deimos::prelude::*;
//!
//! // Resource identities live in an external resource context; deimos only
//! // records them.
//! let color = Texture::new("color");
//! let color_view = color.view("color-view");
//!
//! let pool = CommandBufferPool::with_capacity(2)?;
//! let mut scene_commands = pool.allocate()?;
//! scene_commands.begin()?;
//! scene_commands.finish()?;
//! let mut post_commands = pool.allocate()?;
//! post_commands.begin()?;
//! post_commands.finish()?;
//!
//! let scene = PresentTask::gpu("scene", scene_commands, vec![], vec![(&color).into()])?;
//! let post = PresentTask::gpu(
//!     "post",
//!     post_commands,
//!     vec![(&color_view).into()],
//!     vec![],
//! )?;
//!
//! let frame = PresentTask::black_box("frame", &[scene, post], BlackBoxPolicy::WireDependencies)?;
//! assert_eq!(frame.io_count(IoDirection::Input)?, 0);
//! assert_eq!(frame.io_count(IoDirection::Output)?, 1);
//! assert_eq!(frame.ingroup_connections()?.len(), 1);
//! # anyhow::Ok(())
//! ```
//!
//! For further reading, check out the following modules
//! - [`task`] for the task record, its factories and IO resolution.
//! - [`task::wiring`] for the auto-wiring engine and the black-box factory.
//! - [`resource`] for resource identity handles and the alias rule.
//! - [`command_buffer`] for the pooled command buffer records GPU tasks own.
//! - [`graph`] for flattening a task into an executor-facing graph.

#[macro_use]
extern crate derivative;
#[macro_use]
extern crate log;

pub mod prelude;
pub use crate::prelude::*;

pub mod command_buffer;
pub mod error;
pub mod graph;
pub mod resource;
pub mod task;
