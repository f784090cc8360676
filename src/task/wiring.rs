//! The auto-wiring engine.
//!
//! Rendering code rarely wants to hand-enumerate group mappings. The two
//! entry points here infer the wiring from shared resource identity instead:
//! [`PresentTask::add_subtask`] attaches a task to an existing group and
//! connects it to every member it produces for or consumes from, and
//! [`PresentTask::black_box`] synthesizes a whole group from an unordered
//! task set by computing its deduplicated unique IO sets.

use std::collections::HashMap;

use anyhow::Result;

use crate::error::Error;
use crate::resource::ResourceId;
use crate::task::group::{GroupMapping, IngroupConnection, MemberIo};
use crate::task::io::IoDirection;
use crate::task::PresentTask;

/// Role of a task newly attached to a group, deciding the orientation of the
/// inferred connections.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SubtaskRole {
    /// The new task supplies data to existing members: its outputs are
    /// matched against their inputs.
    Producer,
    /// The new task consumes data from existing members: its inputs are
    /// matched against their outputs.
    Consumer,
}

impl SubtaskRole {
    /// The IO direction of the new task that is relevant for this role.
    fn relevant_direction(self) -> IoDirection {
        match self {
            SubtaskRole::Producer => IoDirection::Output,
            SubtaskRole::Consumer => IoDirection::Input,
        }
    }
}

/// How [`PresentTask::black_box`] treats producer/consumer relationships
/// hidden inside the task set.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum BlackBoxPolicy {
    /// The task set is promised independent (or intentionally unordered): no
    /// ingroup connections are synthesized. Members may execute concurrently.
    Parallel,
    /// Synthesize one producer → consumer connection for every member input
    /// that is satisfied by another member's output.
    WireDependencies,
}

impl PresentTask {
    /// Attach a task to this group and wire it to the existing members.
    ///
    /// The new task's relevant IO set (outputs for [`SubtaskRole::Producer`],
    /// inputs for [`SubtaskRole::Consumer`]) is matched under the alias rule
    /// against every previously existing member's complementary IO list; each
    /// match becomes one ingroup connection. Group-level mappings that
    /// pointed at a matched member IO are rebased onto the new task, so the
    /// group keeps exposing the resource at the same group-level index
    /// through the member that now touches it.
    ///
    /// Returns the number of connections created. A call creating none is
    /// legal but logged as a performance warning, since it usually means an
    /// unrelated task was attached.
    /// # Errors
    /// - Fails if this is not a group task, if the task is already a member,
    ///   or if attaching it would make the graph cyclic.
    pub fn add_subtask(&self, task: &PresentTask, role: SubtaskRole) -> Result<usize> {
        // A task containing this group (or the group itself) would make IO
        // resolution non-terminating.
        if task.contains(self) {
            return Err(Error::GraphHasCycle.into());
        }

        let direction = role.relevant_direction();
        let complement = direction.complement();

        self.with_group_mut(|state| {
            if state.tasks.iter().any(|member| member.same_task(task)) {
                return Err(Error::DuplicateSubtask(task.name().to_owned()).into());
            }

            let new_index = state.tasks.len();
            let mut connections = Vec::new();
            let mut superseded = Vec::new();

            for io_index in 0..task.io_count(direction)? {
                let object = task.io(direction, io_index)?;
                for (member_index, member) in state.tasks.iter().enumerate() {
                    for member_io in 0..member.io_count(complement)? {
                        if !member.io(complement, member_io)?.aliases(&object) {
                            continue;
                        }
                        let new_io = MemberIo::new(new_index, io_index);
                        let existing_io = MemberIo::new(member_index, member_io);
                        connections.push(match role {
                            SubtaskRole::Producer => IngroupConnection::new(new_io, existing_io),
                            SubtaskRole::Consumer => IngroupConnection::new(existing_io, new_io),
                        });
                        superseded.push((existing_io, io_index));
                    }
                }
            }

            state.tasks.push(task.clone());

            // Rebase group-level exposure: mappings that pointed at a member
            // IO now wired internally move to the new edge's endpoint on the
            // new task, keeping their group-level index.
            for (existing_io, new_io_index) in superseded {
                for table_direction in [IoDirection::Input, IoDirection::Output] {
                    for mapping in state.mappings_mut(table_direction).iter_mut() {
                        if mapping.task_index == existing_io.task_index
                            && mapping.io_index == existing_io.io_index
                            && mapping.io_direction == complement
                        {
                            mapping.task_index = new_index;
                            mapping.io_index = new_io_index;
                            mapping.io_direction = direction;
                        }
                    }
                }
            }

            if connections.is_empty() {
                warn!(
                    "Task `{}` was added to group `{}` as {:?} but no connections were inferred.",
                    task.name(),
                    self.name(),
                    role
                );
            }

            let created = connections.len();
            state.connections.extend(connections);
            Ok(created)
        })
    }

    /// Synthesize a group ("black box") from an unordered task set, computing
    /// its deduplicated unique input/output sets instead of taking explicit
    /// mappings.
    ///
    /// IO objects are deduplicated by identity with aliasing collapsed to the
    /// parent texture, so a view-only exposure and its parent texture share
    /// one group-level IO. A member input whose resource is produced by any
    /// member output is satisfied inside the box and not exposed as
    /// group-level input; whether it also becomes an ingroup connection is
    /// decided by `policy`.
    /// # Errors
    /// - Fails under the same conditions as [`PresentTask::group`].
    pub fn black_box(
        name: impl Into<String>,
        tasks: &[PresentTask],
        policy: BlackBoxPolicy,
    ) -> Result<PresentTask> {
        let name = name.into();

        // Outputs first: their canonical set decides which inputs are
        // satisfied inside the box.
        let mut outputs: Vec<(GroupMapping, ResourceId)> = Vec::new();
        let mut unique_outputs: HashMap<ResourceId, usize> = HashMap::new();
        for (task_index, task) in tasks.iter().enumerate() {
            for io_index in 0..task.io_count(IoDirection::Output)? {
                let canonical = task.io(IoDirection::Output, io_index)?.canonical_id();
                let next = unique_outputs.len();
                let group_io_index = *unique_outputs.entry(canonical).or_insert(next);
                outputs.push((
                    GroupMapping::output(group_io_index, task_index, io_index),
                    canonical,
                ));
            }
        }

        let mut input_mappings = Vec::new();
        let mut unique_inputs: HashMap<ResourceId, usize> = HashMap::new();
        let mut internal_inputs: Vec<(MemberIo, ResourceId)> = Vec::new();
        for (task_index, task) in tasks.iter().enumerate() {
            for io_index in 0..task.io_count(IoDirection::Input)? {
                let canonical = task.io(IoDirection::Input, io_index)?.canonical_id();
                if unique_outputs.contains_key(&canonical) {
                    internal_inputs.push((MemberIo::new(task_index, io_index), canonical));
                    continue;
                }
                let next = unique_inputs.len();
                let group_io_index = *unique_inputs.entry(canonical).or_insert(next);
                input_mappings.push(GroupMapping::input(group_io_index, task_index, io_index));
            }
        }

        let mut connections = Vec::new();
        match policy {
            BlackBoxPolicy::Parallel => {
                if !internal_inputs.is_empty() {
                    debug!(
                        "Black box `{}`: {} input(s) are satisfied inside the task set and will \
                         not be exposed; no connections were synthesized for them.",
                        name,
                        internal_inputs.len()
                    );
                }
            }
            BlackBoxPolicy::WireDependencies => {
                for (consumer, canonical) in &internal_inputs {
                    for (mapping, produced) in &outputs {
                        if produced == canonical && mapping.task_index != consumer.task_index {
                            connections.push(IngroupConnection::new(
                                MemberIo::new(mapping.task_index, mapping.io_index),
                                *consumer,
                            ));
                        }
                    }
                }
            }
        }

        let output_mappings = outputs.into_iter().map(|(mapping, _)| mapping).collect();
        Self::group(name, tasks, connections, input_mappings, output_mappings)
    }
}
