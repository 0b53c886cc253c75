// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! The registry of the nodes created for the components of the network.

use std::collections::HashMap;

use crate::{Error, NodeKey};

/// A node written for one component.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConnectivityNode {
    /// The external identifier of the node.
    pub id: String,
    pub name: String,
    /// The external identifier of the voltage level containing the node.
    /// `None` for boundary nodes, which are defined in boundary data and
    /// only referenced by the export.
    pub container_id: Option<String>,
}

/// Maps every [`NodeKey`] of a component to the one node created for it.
///
/// The same registry type holds the connectivity nodes of the equipment
/// profile and the topological nodes of the topology profile.
#[derive(Clone, Debug, Default)]
pub struct ConnectivityNodeRegistry {
    nodes: Vec<ConnectivityNode>,
    by_key: HashMap<NodeKey, usize>,
}

impl ConnectivityNodeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the identifier of the node the key belongs to.
    pub fn resolve(&self, key: &NodeKey) -> Option<&str> {
        self.node(key).map(|n| n.id.as_str())
    }

    /// Returns the node the key belongs to.
    pub fn node(&self, key: &NodeKey) -> Option<&ConnectivityNode> {
        self.by_key.get(key).map(|i| &self.nodes[*i])
    }

    /// Registers a node for the given keys, all at once.
    ///
    /// Registering a component again returns the node registered the first
    /// time.  Fails if only some of the keys are registered, or if they
    /// belong to different nodes, and leaves the registry unchanged.
    pub fn register_component(
        &mut self,
        keys: &[NodeKey],
        node: ConnectivityNode,
    ) -> Result<&ConnectivityNode, Error> {
        let Some(first) = keys.first() else {
            return Err(Error::internal(format!(
                "Can't register node {} for an empty component.",
                node.id
            )));
        };
        if let Some(index) = self.by_key.get(first).copied() {
            if keys.iter().all(|k| self.by_key.get(k) == Some(&index)) {
                return Ok(&self.nodes[index]);
            }
            return Err(Error::internal(format!(
                "Component of {first} overlaps with other components."
            )));
        }
        if let Some(key) = keys.iter().find(|k| self.by_key.contains_key(*k)) {
            return Err(Error::internal(format!(
                "Component of {first} overlaps with the component of {key}."
            )));
        }

        let index = self.nodes.len();
        self.nodes.push(node);
        for key in keys {
            self.by_key.insert(key.clone(), index);
        }
        Ok(&self.nodes[index])
    }

    /// Registers a node for a single key, unless the key already has one.
    pub fn ensure_singleton(
        &mut self,
        key: NodeKey,
        make: impl FnOnce() -> Result<ConnectivityNode, Error>,
    ) -> Result<&ConnectivityNode, Error> {
        if let Some(index) = self.by_key.get(&key).copied() {
            return Ok(&self.nodes[index]);
        }
        let node = make()?;
        self.register_component(&[key], node)
    }

    /// Returns an iterator over the nodes, in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &ConnectivityNode> {
        self.nodes.iter()
    }

    /// Returns the keys of each node, in registration order of the nodes.
    pub fn keys_by_node(&self) -> Vec<Vec<&NodeKey>> {
        let mut keys = vec![vec![]; self.nodes.len()];
        for (key, index) in &self.by_key {
            keys[*index].push(key);
        }
        for node_keys in &mut keys {
            node_keys.sort();
        }
        keys
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
