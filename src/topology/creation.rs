// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! Builds the undirected graph of a voltage level from its internal
//! connections and switches.

use petgraph::graphmap::UnGraphMap;

use crate::{Switch, SwitchEnds, Topology, VoltageLevel};

use super::{MergePolicy, TopologyGrapher};

/// Graph creation.
impl<'a> TopologyGrapher<'a> {
    /// Returns the graph of the voltage level, and the nodes to start
    /// searching from, in ascending order.
    ///
    /// Bus/breaker voltage levels are graphed over the positions of their
    /// buses.
    pub(super) fn graph_of(&self, voltage_level: &VoltageLevel) -> (UnGraphMap<u32, ()>, Vec<u32>) {
        let mut graph = UnGraphMap::new();

        let starts: Vec<u32> = match &voltage_level.topology {
            Topology::NodeBreaker { .. } => self
                .nodes
                .get(voltage_level.id.as_str())
                .map(|nodes| nodes.iter().copied().collect())
                .unwrap_or_default(),
            Topology::BusBreaker { buses } => (0..buses.len() as u32).collect(),
        };
        for node in &starts {
            graph.add_node(*node);
        }

        if let Topology::NodeBreaker {
            internal_connections,
        } = &voltage_level.topology
        {
            for ic in internal_connections {
                graph.add_edge(ic.node1, ic.node2, ());
            }
        }

        for switch in self.network.switches_of(&voltage_level.id) {
            if !self.merges(switch) {
                continue;
            }
            match &switch.ends {
                SwitchEnds::Nodes(node1, node2) => {
                    graph.add_edge(*node1, *node2, ());
                }
                SwitchEnds::Buses(bus1, bus2) => {
                    match (voltage_level.bus_index(bus1), voltage_level.bus_index(bus2)) {
                        (Some(index1), Some(index2)) => {
                            graph.add_edge(index1, index2, ());
                        }
                        _ => tracing::warn!(
                            "Switch {} connects unknown buses {bus1} and {bus2}, ignoring it.",
                            switch.id
                        ),
                    }
                }
            }
        }

        (graph, starts)
    }

    fn merges(&self, switch: &Switch) -> bool {
        match self.policy {
            MergePolicy::Connectivity => {
                !switch.is_exported() && matches!(switch.ends, SwitchEnds::Nodes(..))
            }
            MergePolicy::Topology => !switch.is_exported() || !switch.open,
        }
    }
}
