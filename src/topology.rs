// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! Groups the nodes and buses of each voltage level into electrically
//! connected components.

mod creation;
pub mod iterators;

use std::collections::{BTreeSet, HashMap};
use std::fmt::Display;

use crate::{Connection, Network, Terminal, VoltageLevel};

pub use iterators::Components;

/// Identifies a connection point inside a voltage level.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum NodeKey {
    /// A node of a node/breaker voltage level.
    Node { voltage_level_id: String, node: u32 },
    /// A bus of a bus/breaker voltage level.
    Bus { bus_id: String },
    /// The boundary side of a dangling line, which is outside of any voltage
    /// level of the network.
    Boundary { equipment_id: String },
}

impl NodeKey {
    pub fn node(voltage_level_id: impl Into<String>, node: u32) -> Self {
        NodeKey::Node {
            voltage_level_id: voltage_level_id.into(),
            node,
        }
    }

    pub fn bus(bus_id: impl Into<String>) -> Self {
        NodeKey::Bus {
            bus_id: bus_id.into(),
        }
    }

    pub fn boundary(equipment_id: impl Into<String>) -> Self {
        NodeKey::Boundary {
            equipment_id: equipment_id.into(),
        }
    }

    /// Returns the key of the point the terminal is attached to.
    pub fn of_terminal(terminal: &Terminal) -> Self {
        match &terminal.connection {
            Connection::Node(node) => NodeKey::node(terminal.voltage_level_id.as_str(), *node),
            Connection::Bus(bus_id) => NodeKey::bus(bus_id.as_str()),
        }
    }
}

impl Display for NodeKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NodeKey::Node {
                voltage_level_id,
                node,
            } => write!(f, "{voltage_level_id}_{node}"),
            NodeKey::Bus { bus_id } => write!(f, "{bus_id}"),
            NodeKey::Boundary { equipment_id } => write!(f, "{equipment_id}_BOUNDARY"),
        }
    }
}

/// Selects which switches merge the nodes they connect.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MergePolicy {
    /// Internal connections and switches that are not exported: the
    /// components are connectivity nodes.  Exported switches always separate
    /// components, open or closed.
    #[default]
    Connectivity,
    /// Everything merged by `Connectivity`, and closed switches as well: the
    /// components are topological nodes.
    Topology,
}

/// Computes the components of the voltage levels of a network.
pub struct TopologyGrapher<'a> {
    network: &'a Network,
    policy: MergePolicy,
    nodes: HashMap<&'a str, BTreeSet<u32>>,
}

impl<'a> TopologyGrapher<'a> {
    /// Creates a grapher for the given network.
    pub fn new(network: &'a Network, policy: MergePolicy) -> Self {
        Self {
            network,
            policy,
            nodes: network.nodes_by_voltage_level(),
        }
    }

    pub fn policy(&self) -> MergePolicy {
        self.policy
    }

    /// Returns the components of the given voltage level.
    ///
    /// Node/breaker components are searched breadth first from each node not
    /// yet visited, in ascending node order; the first node of a component is
    /// its canonical node.  For bus/breaker voltage levels, each bus is a
    /// component of its own, unless closed switches merge buses under the
    /// `Topology` policy.
    pub fn components(&self, voltage_level: &'a VoltageLevel) -> Components<'a> {
        let (graph, starts) = self.graph_of(voltage_level);
        Components::new(voltage_level, graph, starts)
    }
}
