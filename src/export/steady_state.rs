// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! The steady state hypothesis document.
//!
//! Describes the input of a power flow: connection status, switch
//! positions, injections and regulation targets of the objects of the
//! equipment document.

use std::collections::HashMap;

use crate::{EquipmentRef, Error, SharedObject, SvcRegulationMode};

use super::{tap_changers, Emitter, TapChangerKind};

/// Steady state hypothesis.
impl Emitter<'_, '_> {
    pub(super) fn write_steady_state(&mut self) -> Result<(), Error> {
        self.write_terminal_states()?;
        self.write_switch_states()?;
        self.write_load_states()?;
        self.write_generator_states()?;
        self.write_shunt_compensator_states()?;
        self.write_static_var_compensator_states()?;
        self.write_tap_changer_states()?;
        self.write_equivalent_injection_states()?;
        self.write_control_area_states()
    }

    /// The terminals are written in the order of the equipment document.
    /// Switch terminals, boundary terminals and equivalent injection
    /// terminals are always connected.
    fn write_terminal_states(&mut self) -> Result<(), Error> {
        let network = self.ctx.network();
        let connectables = network
            .connectables()
            .map(|e| (e.id(), e))
            .collect::<HashMap<&str, EquipmentRef>>();

        for (terminal, record) in self.ctx.terminals().iter() {
            let connected = connectables
                .get(terminal.equipment_id.as_str())
                .and_then(|e| e.terminal(terminal.side))
                .map_or(true, |t| t.connected);
            self.writer.start_about("Terminal", &record.id)?;
            self.writer.boolean("ACDCTerminal.connected", connected)?;
            self.writer.end_element()?;
        }
        for dangling_line in &network.dangling_lines {
            let (_, terminal_id) = self.equivalent_injection_ids(dangling_line)?;
            self.writer.start_about("Terminal", &terminal_id)?;
            self.writer.boolean("ACDCTerminal.connected", true)?;
            self.writer.end_element()?;
        }
        Ok(())
    }

    fn write_switch_states(&mut self) -> Result<(), Error> {
        let network = self.ctx.network();
        for switch in network.switches.iter().filter(|s| s.is_exported()) {
            let id = self.cgmes_id(switch)?;
            self.writer.start_about(switch.kind.class_name(), &id)?;
            self.writer.boolean("Switch.open", switch.open)?;
            self.writer.end_element()?;
        }
        Ok(())
    }

    fn write_load_states(&mut self) -> Result<(), Error> {
        let network = self.ctx.network();
        for load in &network.loads {
            let id = self.cgmes_id(load)?;
            self.writer.start_about(load.class_name(), &id)?;
            self.writer.float("EnergyConsumer.p", load.p0)?;
            self.writer.float("EnergyConsumer.q", load.q0)?;
            self.writer.end_element()?;
        }
        Ok(())
    }

    /// Machines follow the load sign convention: a producing generator has a
    /// negative active power.
    fn write_generator_states(&mut self) -> Result<(), Error> {
        let network = self.ctx.network();
        for generator in &network.generators {
            let control_id = self.regulating_control_id(generator, generator.voltage_regulator_on)?;
            if let Some(control_id) = &control_id {
                self.write_regulating_control_state(
                    "RegulatingControl",
                    control_id,
                    generator.voltage_regulator_on,
                    generator.target_v,
                    false,
                )?;
            }
            let id = self.cgmes_id(generator)?;
            self.writer.start_about("SynchronousMachine", &id)?;
            self.writer.float("RotatingMachine.p", 0.0 - generator.target_p)?;
            self.writer.float("RotatingMachine.q", 0.0 - generator.target_q)?;
            self.writer.boolean(
                "RegulatingCondEq.controlEnabled",
                generator.voltage_regulator_on,
            )?;
            self.writer
                .attribute("SynchronousMachine.operatingMode", "generator")?;
            self.writer.end_element()?;
        }
        Ok(())
    }

    fn write_shunt_compensator_states(&mut self) -> Result<(), Error> {
        let network = self.ctx.network();
        for shunt in &network.shunt_compensators {
            let control_id = self.regulating_control_id(shunt, shunt.voltage_regulator_on)?;
            if let Some(control_id) = &control_id {
                self.write_regulating_control_state(
                    "RegulatingControl",
                    control_id,
                    shunt.voltage_regulator_on,
                    shunt.target_v,
                    true,
                )?;
            }
            let id = self.cgmes_id(shunt)?;
            self.writer.start_about(shunt.model.class_name(), &id)?;
            self.writer
                .integer("ShuntCompensator.sections", shunt.section_count.into())?;
            self.writer.boolean(
                "RegulatingCondEq.controlEnabled",
                shunt.voltage_regulator_on,
            )?;
            self.writer.end_element()?;
        }
        Ok(())
    }

    fn write_static_var_compensator_states(&mut self) -> Result<(), Error> {
        let network = self.ctx.network();
        for svc in &network.static_var_compensators {
            let regulating = svc.regulation_mode != SvcRegulationMode::Off;
            let control_id = self.regulating_control_id(svc, regulating)?;
            if let Some(control_id) = &control_id {
                let target = match svc.regulation_mode {
                    SvcRegulationMode::ReactivePower => svc.reactive_power_setpoint,
                    SvcRegulationMode::Voltage | SvcRegulationMode::Off => svc.voltage_setpoint,
                };
                self.write_regulating_control_state(
                    "RegulatingControl",
                    control_id,
                    regulating,
                    target,
                    false,
                )?;
            }
            let id = self.cgmes_id(svc)?;
            self.writer.start_about("StaticVarCompensator", &id)?;
            self.writer.boolean("RegulatingCondEq.controlEnabled", regulating)?;
            self.writer.end_element()?;
        }
        Ok(())
    }

    fn write_tap_changer_states(&mut self) -> Result<(), Error> {
        for tap_changer in tap_changers(self.ctx)? {
            if let Some(control_id) = self.tap_changer_control_id(&tap_changer)? {
                let target = match tap_changer.kind {
                    TapChangerKind::Ratio(t) => t.target_v,
                    TapChangerKind::Phase(t) => t.regulation_value,
                };
                self.write_regulating_control_state(
                    "TapChangerControl",
                    &control_id,
                    tap_changer.kind.regulating(),
                    target,
                    true,
                )?;
            }
            let id = self.tap_changer_id(&tap_changer)?;
            let class = match tap_changer.kind {
                TapChangerKind::Ratio(_) => "RatioTapChanger",
                TapChangerKind::Phase(_) => "PhaseTapChangerTabular",
            };
            self.writer.start_about(class, &id)?;
            self.writer.integer(
                "TapChanger.step",
                tap_changer.kind.tap_changer().tap_position().into(),
            )?;
            self.writer
                .boolean("TapChanger.controlEnabled", tap_changer.kind.regulating())?;
            self.writer.end_element()?;
        }
        Ok(())
    }

    /// The equivalent injection stands for the rest of the interconnection:
    /// it takes what the dangling line consumes, minus what it generates.
    fn write_equivalent_injection_states(&mut self) -> Result<(), Error> {
        let network = self.ctx.network();
        for dangling_line in &network.dangling_lines {
            let (id, _) = self.equivalent_injection_ids(dangling_line)?;
            let generation = dangling_line.generation.as_ref();
            let (target_p, target_q) = generation.map_or((0.0, 0.0), |g| (g.target_p, g.target_q));
            self.writer.start_about("EquivalentInjection", &id)?;
            self.writer
                .float("EquivalentInjection.p", dangling_line.p0 - target_p)?;
            self.writer
                .float("EquivalentInjection.q", dangling_line.q0 - target_q)?;
            self.writer.boolean(
                "EquivalentInjection.regulationStatus",
                generation.is_some_and(|g| g.voltage_regulation_on),
            )?;
            if let Some(target_v) = generation.and_then(|g| g.target_v) {
                self.writer
                    .float("EquivalentInjection.regulationTarget", target_v)?;
            }
            self.writer.end_element()?;
        }
        Ok(())
    }

    fn write_control_area_states(&mut self) -> Result<(), Error> {
        let network = self.ctx.network();
        for control_area in &network.control_areas {
            let id = self.cgmes_id(control_area)?;
            self.writer.start_about("ControlArea", &id)?;
            if let Some(net_interchange) = control_area.net_interchange {
                self.writer
                    .float("ControlArea.netInterchange", net_interchange)?;
            }
            self.writer.end_element()?;
        }
        Ok(())
    }

    /// Writes the state of a regulating control, once per document.
    fn write_regulating_control_state(
        &mut self,
        class: &str,
        id: &str,
        enabled: bool,
        target: Option<f64>,
        discrete: bool,
    ) -> Result<(), Error> {
        if !self.first_write(SharedObject::RegulatingControl, id) {
            return Ok(());
        }
        self.writer.start_about(class, id)?;
        self.writer.boolean("RegulatingControl.enabled", enabled)?;
        self.writer.boolean("RegulatingControl.discrete", discrete)?;
        if let Some(target) = target {
            self.writer.float("RegulatingControl.targetValue", target)?;
        }
        self.writer.end_element()
    }
}
