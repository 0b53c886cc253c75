// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! Dangling lines.
//!
//! A dangling line is written as a line segment between its terminal in the
//! network and a boundary node, where an equivalent injection stands for
//! the rest of the interconnection.

use crate::{
    DanglingLine, Error, FictitiousContainer, Identifiable, NodeKey, ReactiveLimits,
};

use super::super::Emitter;
use super::write_terminal;

/// Boundaries.
impl Emitter<'_, '_> {
    pub(super) fn write_dangling_lines(&mut self) -> Result<(), Error> {
        let network = self.ctx.network();
        for dangling_line in &network.dangling_lines {
            let base_voltage_id =
                self.voltage_level_base_voltage(&dangling_line.terminal.voltage_level_id)?;
            let container = self
                .ctx
                .boundary(&dangling_line.id)
                .and_then(|b| b.container.clone());
            if let Some(container) = &container {
                self.write_fictitious_container(container, &base_voltage_id)?;
            }
            self.write_equivalent_injection(
                dangling_line,
                &base_voltage_id,
                container.as_ref().map(|c| c.voltage_level_id.as_str()),
            )?;

            let id = self.cgmes_id(dangling_line)?;
            self.writer
                .start_identified("ACLineSegment", &id, dangling_line.name_or_id())?;
            self.writer
                .reference("ConductingEquipment.BaseVoltage", &base_voltage_id)?;
            self.writer.float("ACLineSegment.r", dangling_line.r)?;
            self.writer.float("ACLineSegment.x", dangling_line.x)?;
            self.writer.float("ACLineSegment.gch", dangling_line.g)?;
            self.writer.float("ACLineSegment.bch", dangling_line.b)?;
            self.writer.end_element()?;

            let terminal_id = self.terminal_id(&dangling_line.id, 1)?;
            self.write_limits(&dangling_line.limits, &terminal_id)?;
        }
        Ok(())
    }

    /// Writes the containers created for a boundary node that was not
    /// preserved from an import.
    fn write_fictitious_container(
        &mut self,
        container: &FictitiousContainer,
        base_voltage_id: &str,
    ) -> Result<(), Error> {
        self.writer.start_identified(
            "GeographicalRegion",
            &container.region_id,
            &container.region_name,
        )?;
        self.writer.end_element()?;

        self.writer.start_identified(
            "SubGeographicalRegion",
            &container.sub_region_id,
            &container.sub_region_name,
        )?;
        self.writer
            .reference("SubGeographicalRegion.Region", &container.region_id)?;
        self.writer.end_element()?;

        self.writer.start_identified(
            "Substation",
            &container.substation_id,
            &container.substation_name,
        )?;
        self.writer
            .reference("Substation.Region", &container.sub_region_id)?;
        self.writer.end_element()?;

        self.writer.start_identified(
            "VoltageLevel",
            &container.voltage_level_id,
            &container.voltage_level_name,
        )?;
        self.writer
            .reference("VoltageLevel.Substation", &container.substation_id)?;
        self.writer
            .reference("VoltageLevel.BaseVoltage", base_voltage_id)?;
        self.writer.end_element()
    }

    fn write_equivalent_injection(
        &mut self,
        dangling_line: &DanglingLine,
        base_voltage_id: &str,
        container_id: Option<&str>,
    ) -> Result<(), Error> {
        let reactive_limits = match &dangling_line.generation {
            Some(generation) => match &generation.reactive_limits {
                ReactiveLimits::MinMax { min_q, max_q } => Some((*min_q, *max_q)),
                ReactiveLimits::Curve { .. } => {
                    return Err(Error::not_supported(format!(
                        "Unexpected type of ReactiveLimits on the dangling line {}",
                        dangling_line.name_or_id()
                    )))
                }
            },
            None => None,
        };

        let (id, terminal_id) = self.equivalent_injection_ids(dangling_line)?;
        self.writer.start_identified(
            "EquivalentInjection",
            &id,
            &format!("{}_EI", dangling_line.name_or_id()),
        )?;
        if let Some(container_id) = container_id {
            self.writer
                .reference("Equipment.EquipmentContainer", container_id)?;
        }
        self.writer
            .reference("ConductingEquipment.BaseVoltage", base_voltage_id)?;
        self.writer.boolean(
            "EquivalentInjection.regulationCapability",
            dangling_line.generation.is_some(),
        )?;
        if let Some(generation) = &dangling_line.generation {
            self.writer.float("EquivalentInjection.minP", generation.min_p)?;
            self.writer.float("EquivalentInjection.maxP", generation.max_p)?;
        }
        if let Some((min_q, max_q)) = reactive_limits {
            self.writer.float("EquivalentInjection.minQ", min_q)?;
            self.writer.float("EquivalentInjection.maxQ", max_q)?;
        }
        self.writer.end_element()?;

        let node_id = if self.ctx.config().write_connectivity_nodes {
            self.ctx
                .connectivity_nodes()
                .resolve(&NodeKey::boundary(dangling_line.id.as_str()))
        } else {
            None
        };
        write_terminal(self.writer, &terminal_id, &id, node_id, 1)
    }
}
