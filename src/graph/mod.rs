//! Flattened execution graph.
//!
//! The present-task structure is hierarchical: groups contain members, which
//! may themselves be groups. An executor wants the flat picture — the leaf
//! CPU/GPU tasks and the producer → consumer edges between them. This module
//! resolves every ingroup connection through the group mapping tables down to
//! the owning leaves and materializes the result as a directed graph. The
//! absence of an edge between two leaves is itself a contract: they are
//! unordered and may run concurrently.

use std::fmt::{Display, Formatter};

use anyhow::Result;
use petgraph::dot::Dot;
use petgraph::graph::{EdgeReference, NodeIndex};
use petgraph::{Graph, Incoming};

use crate::error::Error;
use crate::task::io::IoDirection;
use crate::task::{GroupMapping, PresentTask, TaskType};

/// A leaf task in the flattened graph.
#[derive(Debug, Clone)]
pub struct ExecutionNode {
    task: PresentTask,
}

impl ExecutionNode {
    /// Get the leaf CPU or GPU task at this node.
    pub fn task(&self) -> &PresentTask {
        &self.task
    }
}

impl Display for ExecutionNode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.task.task_type() {
            TaskType::Cpu => f.write_fmt(format_args!("CPU: {}", self.task.name())),
            TaskType::Gpu => f.write_fmt(format_args!("GPU: {}", self.task.name())),
            TaskType::Group => unreachable!(),
        }
    }
}

// Resolves (direction, io index) pairs on a task to the leaf node that owns
// the IO, mirroring the group mapping tables.
enum Ports {
    Leaf(NodeIndex),
    Group {
        input_mappings: Vec<GroupMapping>,
        output_mappings: Vec<GroupMapping>,
        members: Vec<Ports>,
    },
}

impl Ports {
    fn resolve(&self, direction: IoDirection, io_index: usize) -> Result<NodeIndex> {
        match self {
            // A leaf owns all of its IO.
            Ports::Leaf(node) => Ok(*node),
            Ports::Group {
                input_mappings,
                output_mappings,
                members,
            } => {
                let table = match direction {
                    IoDirection::Input => input_mappings,
                    IoDirection::Output => output_mappings,
                };
                let mapping = table
                    .iter()
                    .find(|mapping| mapping.group_io_index == io_index)
                    .ok_or(Error::NodeNotFound)?;
                members[mapping.task_index].resolve(mapping.io_direction, mapping.io_index)
            }
        }
    }
}

/// The flattened, executor-facing view of a present task: a directed graph of
/// leaf tasks with one edge per resolved ingroup connection, labeled with the
/// shared resource's debug name.
pub struct ExecutionGraph {
    graph: Graph<ExecutionNode, String>,
}

impl ExecutionGraph {
    /// Flatten a present task (typically the frame's root group) into an
    /// execution graph.
    pub fn from_task(root: &PresentTask) -> Result<Self> {
        let mut graph = Graph::new();
        Self::add_task(&mut graph, root)?;
        Ok(Self {
            graph,
        })
    }

    fn add_task(graph: &mut Graph<ExecutionNode, String>, task: &PresentTask) -> Result<Ports> {
        match task.task_type() {
            TaskType::Cpu | TaskType::Gpu => Ok(Ports::Leaf(graph.add_node(ExecutionNode {
                task: task.clone(),
            }))),
            TaskType::Group => {
                let subtasks = task.subtasks()?;
                let members = subtasks
                    .iter()
                    .map(|subtask| Self::add_task(graph, subtask))
                    .collect::<Result<Vec<_>>>()?;
                for connection in task.ingroup_connections()? {
                    let source = members[connection.producer.task_index]
                        .resolve(IoDirection::Output, connection.producer.io_index)?;
                    let target = members[connection.consumer.task_index]
                        .resolve(IoDirection::Input, connection.consumer.io_index)?;
                    let resource = subtasks[connection.producer.task_index]
                        .io(IoDirection::Output, connection.producer.io_index)?;
                    graph.add_edge(source, target, resource.name().to_owned());
                }
                Ok(Ports::Group {
                    input_mappings: task.io_mappings(IoDirection::Input)?,
                    output_mappings: task.io_mappings(IoDirection::Output)?,
                    members,
                })
            }
        }
    }

    /// Number of leaf tasks in the graph.
    pub fn task_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Number of producer → consumer edges in the graph.
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Get the node weight at an index.
    pub fn node(&self, index: NodeIndex) -> Option<&ExecutionNode> {
        self.graph.node_weight(index)
    }

    /// Return all source nodes in the graph, these are the nodes with no parent node.
    pub fn sources(&self) -> impl Iterator<Item = NodeIndex> + '_ {
        self.graph
            .node_indices()
            .filter(|node| self.graph.edges_directed(*node, Incoming).next().is_none())
    }

    /// A valid execution order for the leaf tasks: every producer precedes
    /// its consumers. Leaves not ordered relative to each other may be
    /// reordered or run concurrently by the executor.
    /// # Errors
    /// - Fails if the graph contains a cycle. Group validation rejects cyclic
    ///   connection sets, so this indicates a corrupted graph.
    pub fn execution_order(&self) -> Result<Vec<NodeIndex>> {
        petgraph::algo::toposort(&self.graph, None).map_err(|_| Error::GraphHasCycle.into())
    }

    fn get_edge_attributes(_: &Graph<ExecutionNode, String>, _: EdgeReference<String>) -> String {
        String::from("")
    }

    fn get_node_attributes(
        _: &Graph<ExecutionNode, String>,
        node: (NodeIndex, &ExecutionNode),
    ) -> String {
        match node.1.task.task_type() {
            TaskType::Gpu => String::from("fillcolor = \"#5e6df7\""),
            TaskType::Cpu => String::from("fillcolor = \"#f75e70\" shape=box"),
            TaskType::Group => unreachable!(),
        }
    }
}

/// Trait that is implemented for the execution graph to help with debugging and visualizing it.
pub trait GraphViz {
    /// Get the string representation of this graph in `dot` format.
    fn dot(&self) -> Result<String>;
}

impl GraphViz for ExecutionGraph {
    fn dot(&self) -> Result<String> {
        Ok(format!(
            "{}",
            Dot::with_attr_getters(
                &self.graph,
                &[],
                &Self::get_edge_attributes,
                &Self::get_node_attributes
            )
        ))
    }
}
