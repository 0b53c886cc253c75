// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! Alias types and the table of aliases known to a naming strategy.

use std::collections::BTreeMap;
use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::Error;

/// The kinds of secondary identifiers that can be recorded for an object, to
/// recall an externally significant id across import/export cycles.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AliasType {
    /// The terminal with the given sequence number.
    Terminal(u8),
    /// The transformer end with the given number.
    TransformerEnd(u8),
    /// The phase tap changer of the given transformer end.
    PhaseTapChanger(u8),
    /// The ratio tap changer of the given transformer end.
    RatioTapChanger(u8),
    EquivalentInjection,
    EquivalentInjectionTerminal,
    /// The terminal of a dangling line at its boundary side.
    TerminalBoundary,
    /// The connectivity node of a dangling line at its boundary side.
    ConnectivityNodeBoundary,
    /// The topological node of a dangling line at its boundary side.
    TopologicalNodeBoundary,
}

impl Display for AliasType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AliasType::Terminal(n) => write!(f, "Terminal{n}"),
            AliasType::TransformerEnd(n) => write!(f, "TransformerEnd{n}"),
            AliasType::PhaseTapChanger(n) => write!(f, "PhaseTapChanger{n}"),
            AliasType::RatioTapChanger(n) => write!(f, "RatioTapChanger{n}"),
            AliasType::EquivalentInjection => write!(f, "EquivalentInjection"),
            AliasType::EquivalentInjectionTerminal => write!(f, "EquivalentInjectionTerminal"),
            AliasType::TerminalBoundary => write!(f, "Terminal_Boundary"),
            AliasType::ConnectivityNodeBoundary => write!(f, "ConnectivityNode_Boundary"),
            AliasType::TopologicalNodeBoundary => write!(f, "TopologicalNode_Boundary"),
        }
    }
}

/// An alias recorded for a network object.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AliasEntry {
    pub object_id: String,
    pub alias_type: AliasType,
    pub value: String,
}

impl AliasEntry {
    pub fn new(object_id: impl Into<String>, alias_type: AliasType, value: impl Into<String>) -> Self {
        Self {
            object_id: object_id.into(),
            alias_type,
            value: value.into(),
        }
    }
}

/// Aliases keyed by object id and alias type.
#[derive(Clone, Debug, Default)]
pub(crate) struct AliasTable {
    entries: BTreeMap<(String, AliasType), String>,
}

impl AliasTable {
    /// Builds the table from the given entries.
    ///
    /// Fails if an alias value is empty, or if an object has two different
    /// aliases of the same type.
    pub(crate) fn try_from_entries<'a>(
        entries: impl IntoIterator<Item = &'a AliasEntry>,
    ) -> Result<Self, Error> {
        let mut table = Self::default();
        for entry in entries {
            table.insert(&entry.object_id, entry.alias_type, &entry.value)?;
        }
        Ok(table)
    }

    pub(crate) fn get(&self, object_id: &str, alias_type: AliasType) -> Option<&str> {
        self.entries
            .get(&(object_id.to_string(), alias_type))
            .map(String::as_str)
    }

    /// Records an alias.  Recording the same alias twice is a no-op.
    pub(crate) fn insert(
        &mut self,
        object_id: &str,
        alias_type: AliasType,
        value: &str,
    ) -> Result<(), Error> {
        if value.trim().is_empty() {
            return Err(Error::malformed_alias(format!(
                "Alias {alias_type} of {object_id} is empty."
            )));
        }
        let key = (object_id.to_string(), alias_type);
        match self.entries.get(&key) {
            Some(existing) if existing != value => Err(Error::malformed_alias(format!(
                "{object_id} already has alias {alias_type} = {existing}, can't set it to {value}."
            ))),
            Some(_) => Ok(()),
            None => {
                self.entries.insert(key, value.to_string());
                Ok(())
            }
        }
    }

    /// Returns the recorded aliases in a stable order.
    pub(crate) fn entries(&self) -> impl Iterator<Item = AliasEntry> + '_ {
        self.entries
            .iter()
            .map(|((id, t), v)| AliasEntry::new(id.clone(), *t, v.clone()))
    }
}
