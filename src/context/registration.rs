// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! The registration pass, run once before any document is written.
//!
//! Registration happens in a fixed order: the nodes of each voltage level,
//! the nodes of busbar sections that have none, the terminals of the
//! connectables class by class, the terminals of the switches, and finally
//! the boundary sides of the dangling lines.

use crate::{
    AliasType, DanglingLine, Error, Identifiable, MergePolicy, NodeKey, SwitchEnds, Topology,
    TopologyGrapher, VoltageLevel,
};

use super::{BoundarySide, ConnectivityNode, ExportContext, FictitiousContainer};

/// Registration.
impl<'a> ExportContext<'a> {
    pub(super) fn register(&mut self) -> Result<(), Error> {
        self.register_nodes(MergePolicy::Connectivity)?;
        self.register_busbar_section_nodes(MergePolicy::Connectivity)?;
        self.register_terminals()?;
        self.register_switch_terminals()?;
        self.register_nodes(MergePolicy::Topology)?;
        self.register_busbar_section_nodes(MergePolicy::Topology)?;
        for dangling_line in &self.network.dangling_lines {
            self.register_boundary(dangling_line)?;
        }
        tracing::debug!(
            "Registered {} connectivity nodes, {} topological nodes and {} terminals.",
            self.connectivity_nodes.len(),
            self.topological_nodes.len(),
            self.terminals.len()
        );
        Ok(())
    }

    /// Registers one node per component of each voltage level, in the
    /// connectivity registry or in the topology registry depending on the
    /// policy.
    fn register_nodes(&mut self, policy: MergePolicy) -> Result<(), Error> {
        let grapher = TopologyGrapher::new(self.network, policy);
        let suffix = match policy {
            MergePolicy::Connectivity => "CN",
            MergePolicy::Topology => "TN",
        };
        for voltage_level in &self.network.voltage_levels {
            let container_id = self.naming.cgmes_id(voltage_level)?;
            let mut count = 0;
            for component in grapher.components(voltage_level) {
                let keys = component.keys();
                let Some(canonical) = keys.first() else {
                    continue;
                };
                let node = self.component_node(voltage_level, canonical, suffix, &container_id)?;
                let registry = match policy {
                    MergePolicy::Connectivity => &mut self.connectivity_nodes,
                    MergePolicy::Topology => &mut self.topological_nodes,
                };
                registry.register_component(&keys, node)?;
                count += 1;
            }
            tracing::debug!(
                "Voltage level {} has {count} {suffix} components.",
                voltage_level.id
            );
        }
        Ok(())
    }

    fn component_node(
        &mut self,
        voltage_level: &VoltageLevel,
        canonical: &NodeKey,
        suffix: &str,
        container_id: &str,
    ) -> Result<ConnectivityNode, Error> {
        let (id, name) = match (&voltage_level.topology, canonical) {
            (Topology::BusBreaker { buses }, NodeKey::Bus { bus_id }) => {
                let name = buses
                    .iter()
                    .find(|b| &b.id == bus_id)
                    .map(|b| b.name_or_id().to_string())
                    .unwrap_or_else(|| bus_id.clone());
                (
                    self.naming.cgmes_id_for_str(&format!("{bus_id}_{suffix}"))?,
                    name,
                )
            }
            (_, NodeKey::Node { node, .. }) => (
                self.naming.node_id(&format!("{canonical}_{suffix}"))?,
                node.to_string(),
            ),
            _ => {
                return Err(Error::internal(format!(
                    "Unexpected key {canonical} in voltage level {}.",
                    voltage_level.id
                )))
            }
        };
        Ok(ConnectivityNode {
            id,
            name,
            container_id: Some(container_id.to_string()),
        })
    }

    /// Gives a node of its own to each busbar section whose terminal is not
    /// at a registered node.
    fn register_busbar_section_nodes(&mut self, policy: MergePolicy) -> Result<(), Error> {
        let (registry, suffix) = match policy {
            MergePolicy::Connectivity => (&mut self.connectivity_nodes, "CN"),
            MergePolicy::Topology => (&mut self.topological_nodes, "TN"),
        };
        for busbar_section in &self.network.busbar_sections {
            let key = NodeKey::of_terminal(&busbar_section.terminal);
            if registry.resolve(&key).is_some() {
                continue;
            }
            let voltage_level = self
                .network
                .voltage_level(&busbar_section.terminal.voltage_level_id)?;
            let naming = &mut self.naming;
            registry.ensure_singleton(key, || {
                Ok(ConnectivityNode {
                    id: naming.node_id(&format!("{}_BUSBAR_{suffix}", busbar_section.id))?,
                    name: busbar_section.name_or_id().to_string(),
                    container_id: Some(naming.cgmes_id(voltage_level)?),
                })
            })?;
        }
        Ok(())
    }

    fn register_terminals(&mut self) -> Result<(), Error> {
        for equipment in self.network.connectables() {
            for (side, terminal) in equipment.terminals() {
                self.terminals.terminal_id(
                    &mut self.naming,
                    &self.connectivity_nodes,
                    equipment.identifiable(),
                    side,
                    &NodeKey::of_terminal(terminal),
                    None,
                )?;
            }
        }
        Ok(())
    }

    fn register_switch_terminals(&mut self) -> Result<(), Error> {
        for switch in self.network.switches.iter().filter(|s| s.is_exported()) {
            let keys = match &switch.ends {
                SwitchEnds::Nodes(node1, node2) => [
                    NodeKey::node(switch.voltage_level_id.as_str(), *node1),
                    NodeKey::node(switch.voltage_level_id.as_str(), *node2),
                ],
                SwitchEnds::Buses(bus1, bus2) => {
                    [NodeKey::bus(bus1.as_str()), NodeKey::bus(bus2.as_str())]
                }
            };
            for (side, key) in (1..).zip(&keys) {
                self.terminals.terminal_id(
                    &mut self.naming,
                    &self.connectivity_nodes,
                    switch,
                    side,
                    key,
                    None,
                )?;
            }
        }
        Ok(())
    }

    /// Registers the boundary node and the boundary terminal of a dangling
    /// line.
    ///
    /// The boundary node recorded in the aliases of the dangling line is
    /// used when there is one.  Otherwise a node is created, in fictitious
    /// containers, and recorded as the alias.
    fn register_boundary(&mut self, dangling_line: &DanglingLine) -> Result<(), Error> {
        let node_alias = if self.config.write_connectivity_nodes {
            AliasType::ConnectivityNodeBoundary
        } else {
            AliasType::TopologicalNodeBoundary
        };
        let container = if self.naming.alias(&dangling_line.id, node_alias).is_some() {
            None
        } else {
            tracing::info!(
                "Dangling line {}{} has no boundary node: a fictitious substation and voltage level are created.",
                dangling_line.id,
                dangling_line
                    .ucte_xnode_code
                    .as_ref()
                    .map(|code| format!(" linked to X-node {code}"))
                    .unwrap_or_default()
            );
            Some(self.fictitious_container(dangling_line)?)
        };

        let key = NodeKey::boundary(dangling_line.id.as_str());
        let node = ConnectivityNode {
            id: self
                .naming
                .cgmes_id_from_alias(dangling_line, AliasType::ConnectivityNodeBoundary)?,
            name: format!("{}_NODE", dangling_line.name_or_id()),
            container_id: container.as_ref().map(|c| c.voltage_level_id.clone()),
        };
        self.connectivity_nodes
            .register_component(&[key.clone()], node.clone())?;

        let topological_node_id = self
            .naming
            .cgmes_id_from_alias(dangling_line, AliasType::TopologicalNodeBoundary)?;
        self.topological_nodes.register_component(
            &[key.clone()],
            ConnectivityNode {
                id: topological_node_id.clone(),
                ..node
            },
        )?;

        self.terminals.terminal_id(
            &mut self.naming,
            &self.connectivity_nodes,
            dangling_line,
            2,
            &key,
            Some(AliasType::TerminalBoundary),
        )?;

        self.boundaries.insert(
            dangling_line.id.clone(),
            BoundarySide {
                topological_node_id,
                container,
            },
        );
        Ok(())
    }

    fn fictitious_container(
        &mut self,
        dangling_line: &DanglingLine,
    ) -> Result<FictitiousContainer, Error> {
        let id = &dangling_line.id;
        let name = dangling_line.name_or_id();
        // Regions and sub-regions with the same name are merged by readers,
        // so they are named after the identifier.
        Ok(FictitiousContainer {
            region_id: self.naming.derived_id(&format!("{id}_GR"))?,
            region_name: format!("{id}_GR"),
            sub_region_id: self.naming.derived_id(&format!("{id}_SGR"))?,
            sub_region_name: format!("{id}_SGR"),
            substation_id: self.naming.derived_id(&format!("{id}_SUBSTATION"))?,
            substation_name: format!("{name}_SUBSTATION"),
            voltage_level_id: self.naming.derived_id(&format!("{id}_VL"))?,
            voltage_level_name: format!("{name}_VL"),
        })
    }
}
