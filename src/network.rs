// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! The read-only network model consumed by an export session.
//!
//! The export never changes electrical state.  Aliases created during an
//! export are recorded by the naming strategy, not on the model.

mod equipment;
mod model;

pub use equipment::EquipmentRef;
pub use model::*;

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use crate::identifiable::impl_identifiable;
use crate::naming::AliasEntry;
use crate::Error;

/// An electrical network: containers, switches and equipment.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Network {
    pub id: String,
    pub name: Option<String>,
    pub substations: Vec<Substation>,
    pub voltage_levels: Vec<VoltageLevel>,
    pub switches: Vec<Switch>,
    pub busbar_sections: Vec<BusbarSection>,
    pub loads: Vec<Load>,
    pub generators: Vec<Generator>,
    pub shunt_compensators: Vec<ShuntCompensator>,
    pub static_var_compensators: Vec<StaticVarCompensator>,
    pub lines: Vec<Line>,
    pub two_windings_transformers: Vec<TwoWindingsTransformer>,
    pub three_windings_transformers: Vec<ThreeWindingsTransformer>,
    pub dangling_lines: Vec<DanglingLine>,
    pub control_areas: Vec<ControlArea>,
    /// Aliases recorded by a previous import.
    pub aliases: Vec<AliasEntry>,
    pub properties: Properties,
}

impl_identifiable!(Network);

impl Network {
    /// Returns the substation with the given id.
    pub fn substation(&self, id: &str) -> Result<&Substation, Error> {
        self.substations
            .iter()
            .find(|s| s.id == id)
            .ok_or_else(|| Error::object_not_found(format!("Substation {id} not found.")))
    }

    /// Returns the voltage level with the given id.
    pub fn voltage_level(&self, id: &str) -> Result<&VoltageLevel, Error> {
        self.voltage_levels
            .iter()
            .find(|vl| vl.id == id)
            .ok_or_else(|| Error::object_not_found(format!("Voltage level {id} not found.")))
    }

    /// Returns an iterator over the switches of the given voltage level.
    pub fn switches_of<'a>(&'a self, voltage_level_id: &'a str) -> impl Iterator<Item = &'a Switch> {
        self.switches
            .iter()
            .filter(move |sw| sw.voltage_level_id == voltage_level_id)
    }

    /// Returns an iterator over all connectable equipment, class by class, in
    /// the order the classes are exported.
    pub fn connectables(&self) -> impl Iterator<Item = EquipmentRef<'_>> {
        self.busbar_sections
            .iter()
            .map(EquipmentRef::BusbarSection)
            .chain(self.loads.iter().map(EquipmentRef::Load))
            .chain(self.generators.iter().map(EquipmentRef::Generator))
            .chain(self.shunt_compensators.iter().map(EquipmentRef::ShuntCompensator))
            .chain(
                self.static_var_compensators
                    .iter()
                    .map(EquipmentRef::StaticVarCompensator),
            )
            .chain(self.lines.iter().map(EquipmentRef::Line))
            .chain(
                self.two_windings_transformers
                    .iter()
                    .map(EquipmentRef::TwoWindingsTransformer),
            )
            .chain(
                self.three_windings_transformers
                    .iter()
                    .map(EquipmentRef::ThreeWindingsTransformer),
            )
            .chain(self.dangling_lines.iter().map(EquipmentRef::DanglingLine))
    }

    /// Returns the node indices used in each node/breaker voltage level, in
    /// ascending order.
    ///
    /// Nodes are collected from internal connections, switches and the
    /// terminals of the connectable equipment.
    pub fn nodes_by_voltage_level(&self) -> HashMap<&str, BTreeSet<u32>> {
        let mut nodes: HashMap<&str, BTreeSet<u32>> = HashMap::new();
        for vl in &self.voltage_levels {
            if let Topology::NodeBreaker {
                internal_connections,
            } = &vl.topology
            {
                let entry = nodes.entry(vl.id.as_str()).or_default();
                for ic in internal_connections {
                    entry.insert(ic.node1);
                    entry.insert(ic.node2);
                }
            }
        }
        for sw in &self.switches {
            if let SwitchEnds::Nodes(n1, n2) = sw.ends {
                let entry = nodes.entry(sw.voltage_level_id.as_str()).or_default();
                entry.insert(n1);
                entry.insert(n2);
            }
        }
        for equipment in self.connectables() {
            for (_, terminal) in equipment.terminals() {
                if let Connection::Node(node) = terminal.connection {
                    nodes
                        .entry(terminal.voltage_level_id.as_str())
                        .or_default()
                        .insert(node);
                }
            }
        }
        nodes
    }

    /// Returns true if at least one voltage level uses node/breaker topology.
    pub fn has_node_breaker_topology(&self) -> bool {
        self.voltage_levels.iter().any(VoltageLevel::is_node_breaker)
    }

    /// Returns the distinct countries of the substations.
    pub fn countries(&self) -> BTreeSet<&str> {
        self.substations
            .iter()
            .filter_map(|s| s.country.as_deref())
            .collect()
    }
}
