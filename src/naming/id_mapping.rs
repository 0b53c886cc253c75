// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! The table of internal keys and the external identifiers given to them.

use std::collections::{BTreeMap, HashMap};
use std::fmt::Display;
use std::io;

use serde::{Deserialize, Serialize};

use crate::Error;

/// The kind of an internal key.
///
/// Keys of different kinds never share an identifier, even when their text
/// is the same.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IdKind {
    /// The identifier of a network object, or a value read from one of its
    /// properties.
    Object,
    /// An alias of a network object, keyed by object id and alias type.
    Alias,
    /// An object that only exists in the exported documents.
    Derived,
    /// A connectivity or topological node, keyed by the node key of its
    /// canonical member.
    Node,
}

impl Display for IdKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IdKind::Object => write!(f, "object"),
            IdKind::Alias => write!(f, "alias"),
            IdKind::Derived => write!(f, "derived"),
            IdKind::Node => write!(f, "node"),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct IdMappingRow {
    kind: IdKind,
    internal_id: String,
    external_id: String,
}

/// The external identifiers handed out during an export, keyed by the kind
/// and the internal key they were created for.
///
/// The table is written at the end of an export, and can seed the fixed
/// naming strategy of a later export to get the same identifiers back.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct IdMapping {
    ids: BTreeMap<(IdKind, String), String>,
    internal_ids: HashMap<String, (IdKind, String)>,
}

impl IdMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an external identifier for an internal key.
    ///
    /// Recording the same pair twice is a no-op.  Fails if the key already
    /// has a different identifier, or if the identifier is already used by
    /// another key.
    pub fn insert(
        &mut self,
        kind: IdKind,
        internal_id: &str,
        external_id: &str,
    ) -> Result<(), Error> {
        let key = (kind, internal_id.to_string());
        if let Some(existing) = self.ids.get(&key) {
            if existing == external_id {
                return Ok(());
            }
            return Err(Error::id_generation(format!(
                "{internal_id} ({kind}) is already mapped to {existing}, \
                 can't map it to {external_id}."
            )));
        }
        if let Some((other_kind, other)) = self.internal_ids.get(external_id) {
            return Err(Error::id_generation(format!(
                "Identifier {external_id} of {internal_id} ({kind}) is already used by \
                 {other} ({other_kind})."
            )));
        }
        self.internal_ids
            .insert(external_id.to_string(), key.clone());
        self.ids.insert(key, external_id.to_string());
        Ok(())
    }

    /// Returns the external identifier of the given internal key.
    pub fn external_id(&self, kind: IdKind, internal_id: &str) -> Option<&str> {
        self.ids
            .get(&(kind, internal_id.to_string()))
            .map(String::as_str)
    }

    /// Returns the kind and the internal key that the given external
    /// identifier was created for.
    pub fn internal_id(&self, external_id: &str) -> Option<(IdKind, &str)> {
        self.internal_ids
            .get(external_id)
            .map(|(kind, id)| (*kind, id.as_str()))
    }

    /// Returns true if the external identifier is already used.
    pub fn is_used(&self, external_id: &str) -> bool {
        self.internal_ids.contains_key(external_id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Returns an iterator over `(kind, internal key, external id)` rows,
    /// ordered by kind and internal key.
    pub fn iter(&self) -> impl Iterator<Item = (IdKind, &str, &str)> {
        self.ids
            .iter()
            .map(|((kind, k), v)| (*kind, k.as_str(), v.as_str()))
    }

    /// Writes the table as CSV, with a `kind,internal_id,external_id` header.
    pub fn write_csv<W: io::Write>(&self, writer: W) -> Result<(), Error> {
        let mut wtr = csv::Writer::from_writer(writer);
        for (kind, internal_id, external_id) in self.iter() {
            wtr.serialize(IdMappingRow {
                kind,
                internal_id: internal_id.to_string(),
                external_id: external_id.to_string(),
            })?;
        }
        wtr.flush()
            .map_err(|e| Error::writer(format!("Id mapping table: {e}")))
    }

    /// Reads a table written by [`write_csv`][IdMapping::write_csv].
    pub fn read_csv<R: io::Read>(reader: R) -> Result<Self, Error> {
        let mut mapping = Self::new();
        for row in csv::Reader::from_reader(reader).deserialize() {
            let row: IdMappingRow = row?;
            mapping.insert(row.kind, &row.internal_id, &row.external_id)?;
        }
        Ok(mapping)
    }
}
