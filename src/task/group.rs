//! Group task state: member tasks, group-level IO mapping tables and the
//! internal producer/consumer connections between members.

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use anyhow::Result;
use petgraph::Graph;

use crate::error::Error;
use crate::resource::IoResource;
use crate::task::io::IoDirection;
use crate::task::PresentTask;

/// One side of an ingroup connection: a member task and an index into one of
/// its IO lists. The producer side of a connection indexes the member's
/// outputs, the consumer side its inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MemberIo {
    /// Index of the member task within the group.
    pub task_index: usize,
    /// Index into the member's IO list.
    pub io_index: usize,
}

impl MemberIo {
    /// Create a new member IO reference.
    pub fn new(task_index: usize, io_index: usize) -> Self {
        Self {
            task_index,
            io_index,
        }
    }
}

/// An internal producer → consumer edge between two member tasks of the same
/// group. Connections order member execution but are not exposed as
/// group-level IO.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngroupConnection {
    /// The member output that produces the shared resource.
    pub producer: MemberIo,
    /// The member input that consumes it.
    pub consumer: MemberIo,
}

impl IngroupConnection {
    /// Create a new connection from a producer output to a consumer input.
    pub fn new(producer: MemberIo, consumer: MemberIo) -> Self {
        Self {
            producer,
            consumer,
        }
    }
}

/// Translation entry from a group-level IO index to a specific member task's
/// local IO index.
///
/// Several mappings may share the same `group_io_index` (fan-in: multiple
/// member IOs recognized as the same external resource). `io_direction`
/// records which side of the member the entry points at; it matches the
/// owning table's direction at construction, but rebasing by
/// [`add_subtask`](PresentTask::add_subtask) can move an exposure to the
/// opposite side of a newly wired member.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GroupMapping {
    /// The group-level IO index this entry resolves.
    pub group_io_index: usize,
    /// Index of the member task within the group.
    pub task_index: usize,
    /// Index into the member's IO list on the `io_direction` side.
    pub io_index: usize,
    /// Which of the member's IO lists `io_index` refers to.
    pub io_direction: IoDirection,
}

impl GroupMapping {
    /// Create a mapping into a member's input list.
    pub fn input(group_io_index: usize, task_index: usize, io_index: usize) -> Self {
        Self {
            group_io_index,
            task_index,
            io_index,
            io_direction: IoDirection::Input,
        }
    }

    /// Create a mapping into a member's output list.
    pub fn output(group_io_index: usize, task_index: usize, io_index: usize) -> Self {
        Self {
            group_io_index,
            task_index,
            io_index,
            io_direction: IoDirection::Output,
        }
    }
}

/// Mutable state of a group task. Owned behind a mutex in the task payload so
/// the auto-wiring engine can append to an already shared group.
#[derive(Debug)]
pub(crate) struct GroupState {
    pub(crate) tasks: Vec<PresentTask>,
    pub(crate) connections: Vec<IngroupConnection>,
    pub(crate) input_mappings: Vec<GroupMapping>,
    pub(crate) output_mappings: Vec<GroupMapping>,
    pub(crate) unique_input_count: usize,
    pub(crate) unique_output_count: usize,
}

impl GroupState {
    pub(crate) fn mappings(&self, direction: IoDirection) -> &[GroupMapping] {
        match direction {
            IoDirection::Input => &self.input_mappings,
            IoDirection::Output => &self.output_mappings,
        }
    }

    pub(crate) fn mappings_mut(&mut self, direction: IoDirection) -> &mut Vec<GroupMapping> {
        match direction {
            IoDirection::Input => &mut self.input_mappings,
            IoDirection::Output => &mut self.output_mappings,
        }
    }

    pub(crate) fn unique_count(&self, direction: IoDirection) -> usize {
        match direction {
            IoDirection::Input => self.unique_input_count,
            IoDirection::Output => self.unique_output_count,
        }
    }
}

fn check_member_io(tasks: &[PresentTask], io: MemberIo, direction: IoDirection) -> Result<()> {
    let task = tasks.get(io.task_index).ok_or(Error::InvalidMemberIndex {
        index: io.task_index,
        count: tasks.len(),
    })?;
    if io.io_index >= task.io_count(direction)? {
        return Err(Error::InvalidIoIndex {
            name: task.name().to_owned(),
            index: io.io_index,
        }
        .into());
    }
    Ok(())
}

fn validate_mappings(tasks: &[PresentTask], mappings: &[GroupMapping]) -> Result<usize> {
    let mut resolved: HashMap<usize, IoResource> = HashMap::new();
    let mut unique_count = 0usize;

    for mapping in mappings {
        let task = tasks.get(mapping.task_index).ok_or(Error::InvalidMemberIndex {
            index: mapping.task_index,
            count: tasks.len(),
        })?;
        if mapping.io_index >= task.io_count(mapping.io_direction)? {
            return Err(Error::InvalidIoIndex {
                name: task.name().to_owned(),
                index: mapping.io_index,
            }
            .into());
        }
        let slot = task.io(mapping.io_direction, mapping.io_index)?;
        // Fan-in entries targeting the same group-level index must denote the
        // same dependency: identical buffer, or texture/view over the same
        // parent texture.
        match resolved.entry(mapping.group_io_index) {
            Entry::Occupied(entry) => {
                if !entry.get().aliases(&slot) {
                    return Err(Error::IncompatibleMapping {
                        index: mapping.group_io_index,
                        first: entry.get().object_type(),
                        second: slot.object_type(),
                    }
                    .into());
                }
            }
            Entry::Vacant(entry) => {
                entry.insert(slot);
            }
        }
        unique_count = unique_count.max(mapping.group_io_index + 1);
    }

    // Every group-level index up to the highest referenced one needs at least
    // one mapping, otherwise resolution of that index has nowhere to go.
    for index in 0..unique_count {
        if !resolved.contains_key(&index) {
            return Err(Error::UnmappedGroupIo(index).into());
        }
    }

    Ok(unique_count)
}

/// Validate a prospective group and compute its unique group-level IO counts.
pub(crate) fn validate(
    tasks: &[PresentTask],
    connections: &[IngroupConnection],
    input_mappings: &[GroupMapping],
    output_mappings: &[GroupMapping],
) -> Result<(usize, usize)> {
    if tasks.is_empty() {
        return Err(Error::EmptyGroup.into());
    }

    for (index, task) in tasks.iter().enumerate() {
        if tasks[..index].iter().any(|other| other.same_task(task)) {
            return Err(Error::DuplicateSubtask(task.name().to_owned()).into());
        }
    }

    for connection in connections {
        check_member_io(tasks, connection.producer, IoDirection::Output)?;
        check_member_io(tasks, connection.consumer, IoDirection::Input)?;
    }

    // The connection set must describe a DAG over the members; the external
    // executor relies on it being resolvable into an execution order.
    let mut graph: Graph<usize, ()> = Graph::new();
    let nodes: Vec<_> = (0..tasks.len()).map(|index| graph.add_node(index)).collect();
    for connection in connections {
        graph.add_edge(
            nodes[connection.producer.task_index],
            nodes[connection.consumer.task_index],
            (),
        );
    }
    if petgraph::algo::is_cyclic_directed(&graph) {
        return Err(Error::GraphHasCycle.into());
    }

    let unique_input_count = validate_mappings(tasks, input_mappings)?;
    let unique_output_count = validate_mappings(tasks, output_mappings)?;

    Ok((unique_input_count, unique_output_count))
}
