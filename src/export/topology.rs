// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! The topology document.
//!
//! Topological nodes merge the connectivity nodes that closed switches join.
//! Every connectivity node and every terminal of the equipment document is
//! attached to its topological node.

use crate::{Error, Network, NodeKey};

use super::Emitter;

/// Topology.
impl Emitter<'_, '_> {
    pub(super) fn write_topology(&mut self) -> Result<(), Error> {
        self.write_topological_nodes()?;
        if self.ctx.config().write_connectivity_nodes {
            self.write_connectivity_node_topology()?;
        }
        self.write_terminal_topology()
    }

    /// Topological nodes without a container are defined by the boundary
    /// data, and are not written.
    fn write_topological_nodes(&mut self) -> Result<(), Error> {
        let network = self.ctx.network();
        let nodes = self
            .ctx
            .topological_nodes()
            .iter()
            .zip(self.ctx.topological_nodes().keys_by_node())
            .filter_map(|(node, keys)| {
                let container_id = node.container_id.clone()?;
                Some((node.clone(), container_id, keys.first().map(|k| (*k).clone())))
            })
            .collect::<Vec<_>>();

        for (node, container_id, key) in nodes {
            let key = key.ok_or_else(|| {
                Error::internal(format!("Topological node {} has no key.", node.id))
            })?;
            let nominal_v = nominal_voltage(network, &key)?;
            let base_voltage_id = self.ctx.base_voltage_id(nominal_v)?;
            self.writer
                .start_identified("TopologicalNode", &node.id, &node.name)?;
            self.writer
                .reference("TopologicalNode.ConnectivityNodeContainer", &container_id)?;
            self.writer
                .reference("TopologicalNode.BaseVoltage", &base_voltage_id)?;
            self.writer.end_element()?;
        }
        tracing::debug!(
            "Wrote {} topological nodes.",
            self.ctx.topological_nodes().len()
        );
        Ok(())
    }

    fn write_connectivity_node_topology(&mut self) -> Result<(), Error> {
        let connectivity_nodes = self.ctx.connectivity_nodes();
        for (node, keys) in connectivity_nodes
            .iter()
            .zip(connectivity_nodes.keys_by_node())
        {
            let topological_node_id = keys
                .first()
                .and_then(|k| self.ctx.topological_nodes().resolve(k))
                .ok_or_else(|| {
                    Error::unresolved_node(format!(
                        "Connectivity node {} has no topological node.",
                        node.id
                    ))
                })?;
            self.writer.start_about("ConnectivityNode", &node.id)?;
            self.writer
                .reference("ConnectivityNode.TopologicalNode", topological_node_id)?;
            self.writer.end_element()?;
        }
        Ok(())
    }

    /// The terminals are written in the order of the equipment document:
    /// the registered terminals, then the terminals of the equivalent
    /// injections.
    fn write_terminal_topology(&mut self) -> Result<(), Error> {
        for (terminal, record) in self.ctx.terminals().iter() {
            let topological_node_id = self
                .ctx
                .topological_nodes()
                .resolve(&record.node_key)
                .ok_or_else(|| {
                    Error::unresolved_node(format!(
                        "Terminal {terminal} is attached to {}, which has no topological node.",
                        record.node_key
                    ))
                })?;
            self.writer.start_about("Terminal", &record.id)?;
            self.writer
                .reference("Terminal.TopologicalNode", topological_node_id)?;
            self.writer.end_element()?;
        }

        let network = self.ctx.network();
        for dangling_line in &network.dangling_lines {
            let (_, terminal_id) = self.equivalent_injection_ids(dangling_line)?;
            let topological_node_id = self
                .ctx
                .boundary(&dangling_line.id)
                .map(|b| b.topological_node_id.clone())
                .ok_or_else(|| {
                    Error::unresolved_node(format!(
                        "Dangling line {} has no boundary node.",
                        dangling_line.id
                    ))
                })?;
            self.writer.start_about("Terminal", &terminal_id)?;
            self.writer
                .reference("Terminal.TopologicalNode", &topological_node_id)?;
            self.writer.end_element()?;
        }
        Ok(())
    }
}

/// Returns the nominal voltage at the given key.
fn nominal_voltage(network: &Network, key: &NodeKey) -> Result<f64, Error> {
    let voltage_level = match key {
        NodeKey::Node {
            voltage_level_id, ..
        } => network.voltage_level(voltage_level_id)?,
        NodeKey::Bus { bus_id } => network
            .voltage_levels
            .iter()
            .find(|vl| vl.bus_index(bus_id).is_some())
            .ok_or_else(|| Error::object_not_found(format!("Bus {bus_id} not found.")))?,
        NodeKey::Boundary { equipment_id } => {
            let dangling_line = network
                .dangling_lines
                .iter()
                .find(|dl| &dl.id == equipment_id)
                .ok_or_else(|| {
                    Error::object_not_found(format!("Dangling line {equipment_id} not found."))
                })?;
            network.voltage_level(&dangling_line.terminal.voltage_level_id)?
        }
    };
    Ok(voltage_level.nominal_v)
}

#[cfg(test)]
mod tests {
    use crate::test_utils::{export_document, NetworkBuilder};
    use crate::{Error, ExportConfig, Profile};

    #[test]
    fn test_topological_nodes() -> Result<(), Error> {
        let mut builder = NetworkBuilder::new("N");
        let vl = builder.node_breaker_vl("S1", "VL1", 400.0);
        builder.switch("BK1", vl, 1, 2, false);
        builder.switch("BK2", vl, 2, 3, false).open = true;
        builder.load("LD1", vl, 1);
        builder.load("LD2", vl, 2);
        builder.load("LD3", vl, 3);
        let bb = builder.bus_breaker_vl("S1", "VL2", 110.0, &["B1", "B2"]);
        builder.load_at_bus("LD4", bb, "B1");
        builder.dangling_line("DL1", vl, 3);
        let network = builder.build();

        let tp = export_document(&network, &ExportConfig::default(), Profile::Topology)?;
        let nodes = tp.elements_of("TopologicalNode").collect::<Vec<_>>();
        // {1, 2}, {3}, B1, B2, and the created boundary node.
        assert_eq!(nodes.len(), 5);
        assert!(nodes[..2]
            .iter()
            .all(|n| n.reference("TopologicalNode.ConnectivityNodeContainer") == Some("VL1")));
        assert_ne!(
            nodes[0].reference("TopologicalNode.BaseVoltage"),
            nodes[2].reference("TopologicalNode.BaseVoltage")
        );

        let eq = export_document(&network, &ExportConfig::default(), Profile::Equipment)?;
        let terminal_node = |equipment: &str| {
            let terminal = eq
                .elements_of("Terminal")
                .find(|t| t.reference("Terminal.ConductingEquipment") == Some(equipment))?;
            tp.element(&terminal.id)?
                .reference("Terminal.TopologicalNode")
        };
        assert!(terminal_node("LD1").is_some());
        assert_eq!(terminal_node("LD1"), terminal_node("LD2"));
        assert_ne!(terminal_node("LD2"), terminal_node("LD3"));
        assert!(terminal_node("LD4").is_some());

        let connectivity_nodes = tp.elements_of("ConnectivityNode").collect::<Vec<_>>();
        assert!(connectivity_nodes.iter().all(|n| n.about));
        assert!(connectivity_nodes
            .iter()
            .all(|n| n.reference("ConnectivityNode.TopologicalNode").is_some()));
        Ok(())
    }

    #[test]
    fn test_equivalent_injection_terminal() -> Result<(), Error> {
        let mut builder = NetworkBuilder::new("N");
        let vl = builder.node_breaker_vl("S1", "VL1", 400.0);
        builder.dangling_line("DL1", vl, 1);
        let network = builder.build();

        let tp = export_document(&network, &ExportConfig::default(), Profile::Topology)?;
        let terminals = tp.elements_of("Terminal").collect::<Vec<_>>();
        assert_eq!(terminals.len(), 3);
        // The boundary terminal and the equivalent injection terminal share
        // the boundary node.
        assert_eq!(
            terminals[1].reference("Terminal.TopologicalNode"),
            terminals[2].reference("Terminal.TopologicalNode")
        );
        assert_ne!(
            terminals[0].reference("Terminal.TopologicalNode"),
            terminals[1].reference("Terminal.TopologicalNode")
        );
        Ok(())
    }
}
