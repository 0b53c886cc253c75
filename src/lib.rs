// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

/*!
# CGMES Topology Export

This is a library for exporting the connectivity, the topology and the
identifiers of a power network model as CGMES documents.

## The export session

An export is started with [`export_network`], which takes a [`Network`], an
[`ExportConfig`] and a [`DocumentSink`] that hands out one
[`DocumentWriter`] per exported [`Profile`].

Before any document is written, an [`ExportContext`] is built for the
session.  It registers:

- The connectivity nodes of the network, found with a [`TopologyGrapher`]
  that merges the nodes joined by internal connections and unexported
  switches.
- The topological nodes, which additionally merge the nodes joined by closed
  switches.
- A terminal for every side of every piece of equipment, numbered with the
  ordering of the [`EndNumberAssigner`] for transformers.
- The boundary nodes of dangling lines, with a fictitious container when the
  boundary node wasn't preserved from an import.

The documents then only look up the objects that were registered, so that
every reference resolves, whichever profiles are exported.

## Identifiers

All identifiers are handed out by a [`NamingStrategy`].  The identity
strategy keeps the identifiers of the network when they are valid CGMES
identifiers, and the fixed strategy reuses the identifiers of a previous
export, read from an [`IdMapping`].  Objects that have no identifier of their
own, like terminals or tap changers, are identified through the aliases of
their equipment, or derive their identifiers from the identifiers of the
objects they belong to, so that exporting the same network twice gives the
same documents.

## Documents

The following documents are supported:

- [`Profile::Equipment`]: containers, equipment, terminals and connectivity
  nodes.
- [`Profile::Topology`]: topological nodes, and the topological node of every
  terminal.
- [`Profile::SteadyStateHypothesis`]: the input state of a power flow.
- [`Profile::StateVariables`]: the result of a power flow.

The [`RecordingSink`] keeps the documents in memory, which is what the tests
use.
*/

mod config;
pub use config::{ExportConfig, IdGenerationPolicy, NamingStrategyKind, Profile};

mod context;
pub use context::{
    BoundarySide, ConnectivityNode, ConnectivityNodeRegistry, ExportContext,
    FictitiousContainer, SharedObject, TerminalRecord, TerminalRegistry,
};

mod end_numbers;
pub use end_numbers::{EndNumberAssigner, EndNumberPolicy};

mod error;
pub use error::{Error, ErrorKind};

mod export;
pub use export::{export_network, export_network_with};

mod identifiable;
pub use identifiable::Identifiable;

mod naming;
pub use naming::{AliasEntry, AliasType, IdKind, IdMapping, NamingStrategy};

mod network;
pub use network::*;

mod topology;
pub use topology::{iterators, MergePolicy, NodeKey, TopologyGrapher};

mod writer;
pub use writer::{
    Document, DocumentSink, DocumentWriter, Element, RecordingSink, RecordingWriter,
};

#[cfg(test)]
mod test_utils;
