// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! Control areas and their tie flows.

use crate::{ControlArea, Error, Identifiable, TerminalRef};

use super::super::Emitter;

/// Control areas.
impl Emitter<'_, '_> {
    pub(super) fn write_control_areas(&mut self) -> Result<(), Error> {
        let network = self.ctx.network();
        for control_area in &network.control_areas {
            let id = self.cgmes_id(control_area)?;
            self.writer
                .start_identified("ControlArea", &id, control_area.name_or_id())?;
            if let Some(code) = &control_area.energy_identification_code {
                self.writer
                    .attribute("IdentifiedObject.energyIdentCodeEic", code)?;
            }
            self.writer.attribute("ControlArea.type", "Interchange")?;
            self.writer.end_element()?;

            for (index, terminal_id) in self.tie_flow_terminals(control_area).iter().enumerate() {
                let tie_flow_id = self.derived_id(&format!("{}_TieFlow_{index}", control_area.id))?;
                self.writer.start_element("TieFlow", &tie_flow_id)?;
                self.writer.reference("TieFlow.ControlArea", &id)?;
                self.writer.reference("TieFlow.Terminal", terminal_id)?;
                self.writer.boolean("TieFlow.positiveFlowIn", true)?;
                self.writer.end_element()?;
            }
        }
        Ok(())
    }

    /// Returns the terminals where the tie flows of the control area are
    /// measured.
    ///
    /// The tie flow of a boundary is at the boundary side of its dangling
    /// line.  Tie flows that can't be placed on an exported terminal are
    /// skipped.
    fn tie_flow_terminals(&self, control_area: &ControlArea) -> Vec<String> {
        let network = self.ctx.network();
        let mut terminals = vec![];
        for terminal in &control_area.terminals {
            match self.ctx.exported_terminal_id(terminal) {
                Ok(id) => terminals.push(id.to_string()),
                Err(_) => tracing::warn!(
                    "Terminal {terminal} of control area {} has not been exported, \
                     its tie flow is skipped.",
                    control_area.id
                ),
            }
        }
        for boundary in &control_area.boundaries {
            if !network.dangling_lines.iter().any(|dl| &dl.id == boundary) {
                tracing::error!(
                    "Boundary {boundary} of control area {} is not a dangling line, \
                     tie flows at tie lines are not supported.",
                    control_area.id
                );
                continue;
            }
            let terminal = TerminalRef::new(boundary.as_str(), 2);
            match self.ctx.exported_terminal_id(&terminal) {
                Ok(id) => terminals.push(id.to_string()),
                Err(_) => tracing::warn!(
                    "Boundary terminal of {boundary} has not been exported, \
                     its tie flow in control area {} is skipped.",
                    control_area.id
                ),
            }
        }
        terminals
    }
}
