// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! Iterators over the components of a voltage level.

use std::{collections::HashSet, vec::IntoIter};

use petgraph::{graphmap::UnGraphMap, visit::Bfs};

use crate::{Topology, VoltageLevel};

use super::NodeKey;

/// A set of nodes (or buses) of one voltage level that are merged together.
#[derive(Clone, Debug, PartialEq)]
pub struct Component<'a> {
    voltage_level: &'a VoltageLevel,
    indices: Vec<u32>,
}

impl<'a> Component<'a> {
    pub fn voltage_level(&self) -> &'a VoltageLevel {
        self.voltage_level
    }

    /// Returns the node indices of the component in search order.  For
    /// bus/breaker voltage levels, these are bus positions.
    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    /// Returns the keys of the component in search order.
    pub fn keys(&self) -> Vec<NodeKey> {
        self.indices.iter().filter_map(|i| self.key(*i)).collect()
    }

    /// Returns the key of the first node of the component.
    pub fn canonical(&self) -> Option<NodeKey> {
        self.indices.first().and_then(|i| self.key(*i))
    }

    fn key(&self, index: u32) -> Option<NodeKey> {
        match &self.voltage_level.topology {
            Topology::NodeBreaker { .. } => Some(NodeKey::node(self.voltage_level.id.as_str(), index)),
            Topology::BusBreaker { buses } => buses
                .get(index as usize)
                .map(|bus| NodeKey::bus(bus.id.as_str())),
        }
    }
}

/// An iterator over the components of a voltage level.
///
/// Components are searched lazily: each call to `next` runs one breadth first
/// search, from the lowest node not yet part of an earlier component.
pub struct Components<'a> {
    voltage_level: &'a VoltageLevel,
    graph: UnGraphMap<u32, ()>,
    starts: IntoIter<u32>,
    visited: HashSet<u32>,
}

impl<'a> Components<'a> {
    pub(crate) fn new(
        voltage_level: &'a VoltageLevel,
        graph: UnGraphMap<u32, ()>,
        starts: Vec<u32>,
    ) -> Self {
        Components {
            voltage_level,
            graph,
            starts: starts.into_iter(),
            visited: HashSet::new(),
        }
    }
}

impl<'a> Iterator for Components<'a> {
    type Item = Component<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        for start in self.starts.by_ref() {
            if self.visited.contains(&start) {
                continue;
            }
            let mut bfs = Bfs::new(&self.graph, start);
            let mut indices = vec![];
            while let Some(node) = bfs.next(&self.graph) {
                self.visited.insert(node);
                indices.push(node);
            }
            return Some(Component {
                voltage_level: self.voltage_level,
                indices,
            });
        }
        None
    }
}
