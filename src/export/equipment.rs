// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! The equipment document.
//!
//! Every object of the network is defined here.  The companion documents
//! only add information to the objects defined in this one.

mod boundaries;
mod containers;
mod control_areas;
mod injections;
mod limits;
mod tap_changers;
mod transformers;

use crate::{DocumentWriter, Error, Identifiable, SharedObject};

use super::Emitter;

/// Equipment.
impl Emitter<'_, '_> {
    pub(super) fn write_equipment(&mut self) -> Result<(), Error> {
        if self.ctx.config().write_connectivity_nodes {
            self.write_connectivity_nodes()?;
        }
        self.write_terminals()?;
        self.write_switches()?;

        self.write_substations()?;
        self.write_voltage_levels()?;
        self.write_busbar_sections()?;
        self.write_loads()?;
        self.write_generators()?;
        self.write_shunt_compensators()?;
        self.write_static_var_compensators()?;
        self.write_lines()?;
        self.write_two_windings_transformers()?;
        self.write_three_windings_transformers()?;
        self.write_dangling_lines()?;

        self.write_control_areas()
    }

    /// Boundary nodes without a container are defined by the boundary data,
    /// and are not written.
    fn write_connectivity_nodes(&mut self) -> Result<(), Error> {
        for node in self.ctx.connectivity_nodes().iter() {
            let Some(container_id) = &node.container_id else {
                continue;
            };
            self.writer
                .start_identified("ConnectivityNode", &node.id, &node.name)?;
            self.writer
                .reference("ConnectivityNode.ConnectivityNodeContainer", container_id)?;
            self.writer.end_element()?;
        }
        Ok(())
    }

    fn write_terminals(&mut self) -> Result<(), Error> {
        let write_nodes = self.ctx.config().write_connectivity_nodes;
        for (_, record) in self.ctx.terminals().iter() {
            write_terminal(
                self.writer,
                &record.id,
                &record.equipment_id,
                write_nodes.then_some(record.node_id.as_str()),
                record.sequence_number,
            )?;
        }
        Ok(())
    }

    fn write_switches(&mut self) -> Result<(), Error> {
        let network = self.ctx.network();
        for switch in network.switches.iter().filter(|s| s.is_exported()) {
            let id = self.cgmes_id(switch)?;
            let container_id = self.cgmes_id_for_str(&switch.voltage_level_id)?;
            self.writer
                .start_identified(switch.kind.class_name(), &id, switch.name_or_id())?;
            self.writer
                .reference("Equipment.EquipmentContainer", &container_id)?;
            self.writer.boolean("Switch.normalOpen", switch.open)?;
            self.writer.boolean("Switch.retained", switch.retained)?;
            self.writer.end_element()?;
        }
        Ok(())
    }

    fn write_lines(&mut self) -> Result<(), Error> {
        let network = self.ctx.network();
        for line in &network.lines {
            let nominal_v1 = network.voltage_level(&line.terminal1.voltage_level_id)?.nominal_v;
            let nominal_v2 = network.voltage_level(&line.terminal2.voltage_level_id)?.nominal_v;
            // A line between two nominal voltages has no base voltage.
            let base_voltage_id = if nominal_v1 == nominal_v2 {
                Some(self.base_voltage(nominal_v1)?)
            } else {
                None
            };

            let id = self.cgmes_id(line)?;
            self.writer
                .start_identified("ACLineSegment", &id, line.name_or_id())?;
            if let Some(base_voltage_id) = &base_voltage_id {
                self.writer
                    .reference("ConductingEquipment.BaseVoltage", base_voltage_id)?;
            }
            self.writer.float("ACLineSegment.r", line.r)?;
            self.writer.float("ACLineSegment.x", line.x)?;
            self.writer.float("ACLineSegment.gch", line.g1 + line.g2)?;
            self.writer.float("ACLineSegment.bch", line.b1 + line.b2)?;
            self.writer.end_element()?;

            let terminal1 = self.terminal_id(&line.id, 1)?;
            self.write_limits(&line.limits1, &terminal1)?;
            let terminal2 = self.terminal_id(&line.id, 2)?;
            self.write_limits(&line.limits2, &terminal2)?;
        }
        Ok(())
    }

    /// Writes the base voltage of the given nominal voltage, once per
    /// document, and returns its identifier.
    fn base_voltage(&mut self, nominal_v: f64) -> Result<String, Error> {
        let id = self.ctx.base_voltage_id(nominal_v)?;
        if self.first_write(SharedObject::BaseVoltage, &id) {
            self.writer
                .start_identified("BaseVoltage", &id, &nominal_v.to_string())?;
            self.writer.float("BaseVoltage.nominalVoltage", nominal_v)?;
            self.writer.end_element()?;
        }
        Ok(id)
    }

    fn voltage_level_base_voltage(&mut self, voltage_level_id: &str) -> Result<String, Error> {
        let nominal_v = self.ctx.network().voltage_level(voltage_level_id)?.nominal_v;
        self.base_voltage(nominal_v)
    }

    /// Returns the identifier of the substation of a voltage level, if it
    /// has one.
    fn substation_of(&mut self, voltage_level_id: &str) -> Result<Option<String>, Error> {
        let voltage_level = self.ctx.network().voltage_level(voltage_level_id)?;
        voltage_level
            .substation_id
            .as_deref()
            .map(|id| self.cgmes_id_for_str(id))
            .transpose()
    }
}

fn write_terminal(
    writer: &mut dyn DocumentWriter,
    id: &str,
    equipment_id: &str,
    node_id: Option<&str>,
    sequence_number: u8,
) -> Result<(), Error> {
    writer.start_element("Terminal", id)?;
    writer.reference("Terminal.ConductingEquipment", equipment_id)?;
    if let Some(node_id) = node_id {
        writer.reference("Terminal.ConnectivityNode", node_id)?;
    }
    writer.integer("ACDCTerminal.sequenceNumber", sequence_number.into())?;
    writer.end_element()
}

#[cfg(test)]
mod tests {
    use crate::test_utils::{export_document, NetworkBuilder};
    use crate::{Error, ExportConfig, Profile};

    #[test]
    fn test_connectivity_nodes_and_terminals() -> Result<(), Error> {
        let mut builder = NetworkBuilder::new("N");
        let vl = builder.node_breaker_vl("S1", "VL1", 400.0);
        builder.internal_connection(vl, 1, 2);
        builder.switch("BK1", vl, 2, 3, false);
        builder.load("LD1", vl, 1);
        builder.load("LD2", vl, 3);
        let network = builder.build();

        let eq = export_document(&network, &ExportConfig::default(), Profile::Equipment)?;
        assert_eq!(eq.elements_of("ConnectivityNode").count(), 2);
        assert!(eq
            .elements_of("ConnectivityNode")
            .all(|cn| cn.reference("ConnectivityNode.ConnectivityNodeContainer") == Some("VL1")));

        let terminals = eq.elements_of("Terminal").collect::<Vec<_>>();
        assert_eq!(terminals.len(), 4);
        let ld1 = terminals
            .iter()
            .find(|t| t.reference("Terminal.ConductingEquipment") == Some("LD1"))
            .unwrap();
        let breaker = terminals
            .iter()
            .find(|t| {
                t.reference("Terminal.ConductingEquipment") == Some("BK1")
                    && t.attribute("ACDCTerminal.sequenceNumber") == Some("1")
            })
            .unwrap();
        assert_eq!(
            ld1.reference("Terminal.ConnectivityNode"),
            breaker.reference("Terminal.ConnectivityNode")
        );

        let switch = eq.element("BK1").unwrap();
        assert_eq!(switch.class, "Breaker");
        assert_eq!(switch.attribute("Switch.normalOpen"), Some("false"));
        Ok(())
    }

    #[test]
    fn test_without_connectivity_nodes() -> Result<(), Error> {
        let mut builder = NetworkBuilder::new("N");
        let vl = builder.node_breaker_vl("S1", "VL1", 400.0);
        builder.load("LD1", vl, 1);
        let network = builder.build();

        let config = ExportConfig {
            write_connectivity_nodes: false,
            ..Default::default()
        };
        let eq = export_document(&network, &config, Profile::Equipment)?;
        assert_eq!(eq.elements_of("ConnectivityNode").count(), 0);
        let terminal = eq.elements_of("Terminal").next().unwrap();
        assert_eq!(terminal.reference("Terminal.ConnectivityNode"), None);
        Ok(())
    }

    #[test]
    fn test_lines() -> Result<(), Error> {
        let mut builder = NetworkBuilder::new("N");
        let vl1 = builder.node_breaker_vl("S1", "VL1", 400.0);
        let vl2 = builder.node_breaker_vl("S2", "VL2", 400.0);
        let vl3 = builder.node_breaker_vl("S3", "VL3", 225.0);
        builder.line("L1", (vl1, 1), (vl2, 1));
        builder.line("L2", (vl2, 2), (vl3, 1));
        let network = builder.build();

        let eq = export_document(&network, &ExportConfig::default(), Profile::Equipment)?;
        let l1 = eq.element("L1").unwrap();
        assert!(l1.reference("ConductingEquipment.BaseVoltage").is_some());
        assert_eq!(l1.attribute("ACLineSegment.bch"), Some("0.000002"));
        let l2 = eq.element("L2").unwrap();
        assert_eq!(l2.reference("ConductingEquipment.BaseVoltage"), None);
        assert_eq!(eq.elements_of("BaseVoltage").count(), 2);
        Ok(())
    }
}
