// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! The state variables document: the result of a power flow, as far as the
//! network knows it.

use crate::Error;

use super::{tap_changers, Emitter};

/// State variables.
impl Emitter<'_, '_> {
    pub(super) fn write_state_variables(&mut self) -> Result<(), Error> {
        self.write_power_flows()?;
        self.write_tap_steps()?;
        self.write_statuses()
    }

    /// Only terminals with a known active or reactive power get a flow.
    fn write_power_flows(&mut self) -> Result<(), Error> {
        let network = self.ctx.network();
        let mut count = 0;
        for equipment in network.connectables() {
            for (side, terminal) in equipment.terminals() {
                if terminal.p.is_none() && terminal.q.is_none() {
                    continue;
                }
                let terminal_id = self.terminal_id(equipment.id(), side)?;
                let id = self.derived_id(&format!("{terminal_id}_SvPowerFlow"))?;
                self.writer.start_element("SvPowerFlow", &id)?;
                if let Some(p) = terminal.p {
                    self.writer.float("SvPowerFlow.p", p)?;
                }
                if let Some(q) = terminal.q {
                    self.writer.float("SvPowerFlow.q", q)?;
                }
                self.writer.reference("SvPowerFlow.Terminal", &terminal_id)?;
                self.writer.end_element()?;
                count += 1;
            }
        }
        tracing::debug!("Wrote {count} power flows.");
        Ok(())
    }

    fn write_tap_steps(&mut self) -> Result<(), Error> {
        for tap_changer in tap_changers(self.ctx)? {
            let tap_changer_id = self.tap_changer_id(&tap_changer)?;
            let id = self.derived_id(&format!("{tap_changer_id}_SvTapStep"))?;
            self.writer.start_element("SvTapStep", &id)?;
            self.writer.float(
                "SvTapStep.position",
                tap_changer.kind.tap_changer().tap_position().into(),
            )?;
            self.writer.reference("SvTapStep.TapChanger", &tap_changer_id)?;
            self.writer.end_element()?;
        }
        Ok(())
    }

    /// Equipment is in service when at least one of its terminals is
    /// connected.
    fn write_statuses(&mut self) -> Result<(), Error> {
        let network = self.ctx.network();
        for equipment in network.connectables() {
            let in_service = equipment.terminals().iter().any(|(_, t)| t.connected);
            let equipment_id = self.cgmes_id(equipment.identifiable())?;
            let id = self.derived_id(&format!("{equipment_id}_SvStatus"))?;
            self.writer.start_element("SvStatus", &id)?;
            self.writer.boolean("SvStatus.inService", in_service)?;
            self.writer
                .reference("SvStatus.ConductingEquipment", &equipment_id)?;
            self.writer.end_element()?;
        }
        Ok(())
    }
}
