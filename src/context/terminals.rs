// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! The registry of the terminals written for the equipment of the network.

use std::collections::HashMap;

use crate::{AliasType, Error, Identifiable, NamingStrategy, NodeKey, TerminalRef};

use super::ConnectivityNodeRegistry;

/// A registered terminal.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TerminalRecord {
    /// The external identifier of the terminal.
    pub id: String,
    /// The external identifier of the equipment the terminal belongs to.
    pub equipment_id: String,
    /// The external identifier of the connectivity node of the terminal.
    pub node_id: String,
    /// The key the terminal is attached to.
    pub node_key: NodeKey,
    pub sequence_number: u8,
}

/// Maps each connection point of the equipment to the one terminal
/// registered for it.
#[derive(Clone, Debug, Default)]
pub struct TerminalRegistry {
    records: Vec<(TerminalRef, TerminalRecord)>,
    by_ref: HashMap<TerminalRef, usize>,
    next_sequence: HashMap<String, u8>,
}

impl TerminalRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the terminal of the equipment at the given side, and returns
    /// its identifier.
    ///
    /// The terminal gets the next sequence number of the equipment.  Its
    /// identifier is the alias given in `alias_type`, or the
    /// `Terminal<sequence number>` alias when that is `None`.
    ///
    /// Registering a terminal again returns the identifier registered the
    /// first time.  Fails if the key has no connectivity node.
    pub fn terminal_id(
        &mut self,
        naming: &mut NamingStrategy,
        nodes: &ConnectivityNodeRegistry,
        equipment: &dyn Identifiable,
        side: u8,
        node_key: &NodeKey,
        alias_type: Option<AliasType>,
    ) -> Result<&str, Error> {
        let terminal = TerminalRef::new(equipment.id(), side);
        if let Some(index) = self.by_ref.get(&terminal).copied() {
            return Ok(&self.records[index].1.id);
        }

        let node_id = nodes.resolve(node_key).ok_or_else(|| {
            Error::unresolved_node(format!(
                "Terminal {terminal} is attached to {node_key}, which has no connectivity node."
            ))
        })?;
        let sequence_number = self.next_sequence.get(equipment.id()).copied().unwrap_or(1);
        let alias_type = alias_type.unwrap_or(AliasType::Terminal(sequence_number));
        let record = TerminalRecord {
            id: naming.cgmes_id_from_alias(equipment, alias_type)?,
            equipment_id: naming.cgmes_id(equipment)?,
            node_id: node_id.to_string(),
            node_key: node_key.clone(),
            sequence_number,
        };

        self.next_sequence
            .insert(equipment.id().to_string(), sequence_number + 1);
        let index = self.records.len();
        self.by_ref.insert(terminal.clone(), index);
        self.records.push((terminal, record));
        Ok(&self.records[index].1.id)
    }

    /// Returns the identifier of a terminal registered earlier.
    pub fn exported_terminal_id(&self, terminal: &TerminalRef) -> Result<&str, Error> {
        self.record(terminal)
            .map(|r| r.id.as_str())
            .ok_or_else(|| {
                Error::terminal_not_registered(format!(
                    "Terminal {terminal} has not been exported."
                ))
            })
    }

    /// Returns the record of a terminal registered earlier.
    pub fn record(&self, terminal: &TerminalRef) -> Option<&TerminalRecord> {
        self.by_ref.get(terminal).map(|i| &self.records[*i].1)
    }

    /// Returns an iterator over the terminals, in registration order.
    pub fn iter(&self) -> impl Iterator<Item = (&TerminalRef, &TerminalRecord)> {
        self.records.iter().map(|(t, r)| (t, r))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
