// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! The state shared by all the documents of one export session.

mod connectivity;
mod registration;
mod terminals;
mod written;

pub use connectivity::{ConnectivityNode, ConnectivityNodeRegistry};
pub use terminals::{TerminalRecord, TerminalRegistry};
pub use written::SharedObject;

pub(crate) use written::WrittenObjects;

use std::collections::HashMap;

use crate::{
    end_numbers::{EndNumberAssigner, EndNumberPolicy},
    Error, ExportConfig, Network, NamingStrategy, NodeKey, Profile, Terminal, TerminalRef,
    ThreeWindingsTransformer, TwoWindingsTransformer,
};

/// The fictitious containers created for the boundary side of a dangling
/// line whose boundary node was not preserved.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FictitiousContainer {
    pub region_id: String,
    pub region_name: String,
    pub sub_region_id: String,
    pub sub_region_name: String,
    pub substation_id: String,
    pub substation_name: String,
    pub voltage_level_id: String,
    pub voltage_level_name: String,
}

/// The boundary side of a dangling line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BoundarySide {
    pub topological_node_id: String,
    /// Set when the boundary node is created by the export.
    pub container: Option<FictitiousContainer>,
}

/// Everything an export session knows about the network being exported.
///
/// A context is created for one export, filled by a registration pass over
/// the whole network before any document is written, and dropped after the
/// last document.  Every document of the session reads its identifiers from
/// the same context, so an object has the same identifier in all of them.
pub struct ExportContext<'a> {
    network: &'a Network,
    config: ExportConfig,
    naming: NamingStrategy,
    connectivity_nodes: ConnectivityNodeRegistry,
    topological_nodes: ConnectivityNodeRegistry,
    terminals: TerminalRegistry,
    boundaries: HashMap<String, BoundarySide>,
    written: WrittenObjects,
}

impl<'a> ExportContext<'a> {
    /// Creates a context and registers the nodes and terminals of the
    /// network.
    pub fn new(
        network: &'a Network,
        config: ExportConfig,
        naming: NamingStrategy,
    ) -> Result<Self, Error> {
        let mut context = Self {
            network,
            config,
            naming,
            connectivity_nodes: ConnectivityNodeRegistry::new(),
            topological_nodes: ConnectivityNodeRegistry::new(),
            terminals: TerminalRegistry::new(),
            boundaries: HashMap::new(),
            written: WrittenObjects::default(),
        };
        context.register()?;
        Ok(context)
    }

    pub fn network(&self) -> &'a Network {
        self.network
    }

    pub fn config(&self) -> &ExportConfig {
        &self.config
    }

    pub fn naming(&self) -> &NamingStrategy {
        &self.naming
    }

    pub fn naming_mut(&mut self) -> &mut NamingStrategy {
        &mut self.naming
    }

    /// Ends the session and returns its naming strategy.
    pub fn into_naming(self) -> NamingStrategy {
        self.naming
    }

    pub fn connectivity_nodes(&self) -> &ConnectivityNodeRegistry {
        &self.connectivity_nodes
    }

    pub fn topological_nodes(&self) -> &ConnectivityNodeRegistry {
        &self.topological_nodes
    }

    pub fn terminals(&self) -> &TerminalRegistry {
        &self.terminals
    }

    /// Returns the identifier of the terminal of the equipment at the given
    /// side.
    ///
    /// Fails if the terminal was not registered.
    pub fn exported_terminal_id(&self, terminal: &TerminalRef) -> Result<&str, Error> {
        self.terminals.exported_terminal_id(terminal)
    }

    /// Returns the identifier of the connectivity node of a terminal.
    pub fn connectivity_node_id(&self, terminal: &Terminal) -> Option<&str> {
        self.connectivity_nodes
            .resolve(&NodeKey::of_terminal(terminal))
    }

    /// Returns the identifier of the topological node of a terminal.
    pub fn topological_node_id(&self, terminal: &Terminal) -> Option<&str> {
        self.topological_nodes
            .resolve(&NodeKey::of_terminal(terminal))
    }

    /// Returns the boundary side registered for a dangling line.
    pub fn boundary(&self, dangling_line_id: &str) -> Option<&BoundarySide> {
        self.boundaries.get(dangling_line_id)
    }

    /// Returns the identifier of the base voltage of the given nominal
    /// voltage.
    pub fn base_voltage_id(&mut self, nominal_v: f64) -> Result<String, Error> {
        self.naming.derived_id(&format!("BV_{nominal_v}"))
    }

    /// Marks a shared object as written to the document, and returns true if
    /// it was not written before.
    pub fn mark_written(&mut self, profile: Profile, kind: SharedObject, id: &str) -> bool {
        self.written.mark(profile, kind, id)
    }

    pub(crate) fn written(&self) -> &WrittenObjects {
        &self.written
    }

    fn end_number_policy(&self) -> EndNumberPolicy {
        if self.config.export_transformers_with_highest_voltage_at_end1 {
            EndNumberPolicy::HighestVoltageFirst
        } else {
            EndNumberPolicy::Identity
        }
    }

    /// Returns the end numbers of a two-winding transformer.
    pub fn two_windings_end_numbers(
        &self,
        transformer: &TwoWindingsTransformer,
    ) -> Result<EndNumberAssigner, Error> {
        EndNumberAssigner::for_two_windings_transformer(
            self.end_number_policy(),
            self.network,
            transformer,
        )
    }

    /// Returns the end numbers of a three-winding transformer.
    pub fn three_windings_end_numbers(
        &self,
        transformer: &ThreeWindingsTransformer,
    ) -> Result<EndNumberAssigner, Error> {
        EndNumberAssigner::for_three_windings_transformer(
            self.end_number_policy(),
            self.network,
            transformer,
        )
    }
}
