// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! Tap changers, their tables and their controls.
//!
//! Tap changers are written in tabular form: one table per tap changer, with
//! one point per step.

use crate::{
    Error, PhaseRegulationMode, PhaseTapChanger, RatioTapChanger, SharedObject, TapChanger,
};

use super::super::{EndTapChanger, Emitter, TapChangerKind};

/// Tap changers.
impl Emitter<'_, '_> {
    /// Writes a tap changer attached to the given transformer end.
    pub(super) fn write_tap_changer(
        &mut self,
        tap_changer: &EndTapChanger,
        end_id: &str,
        rated_u: f64,
    ) -> Result<(), Error> {
        let control_id = self.write_tap_changer_control(tap_changer)?;
        let id = self.tap_changer_id(tap_changer)?;
        let table_id = self.derived_id(&format!("{id}_TABLE"))?;
        let name = tap_changer.transformer.name_or_id();
        match tap_changer.kind {
            TapChangerKind::Ratio(ratio_tap_changer) => {
                let neutral_step = ratio_neutral_step(ratio_tap_changer);
                self.writer
                    .start_identified("RatioTapChanger", &id, &format!("{name}_RTC"))?;
                self.write_tap_changer_steps(ratio_tap_changer, neutral_step, rated_u)?;
                self.writer
                    .boolean("TapChanger.ltcFlag", ratio_tap_changer.load_tap_changing_capabilities)?;
                self.writer.float(
                    "RatioTapChanger.stepVoltageIncrement",
                    step_voltage_increment(ratio_tap_changer, neutral_step),
                )?;
                let control_mode = if ratio_tap_changer.regulating {
                    "volt"
                } else {
                    "reactive"
                };
                self.writer
                    .attribute("RatioTapChanger.tculControlMode", control_mode)?;
                self.writer
                    .reference("RatioTapChanger.TransformerEnd", end_id)?;
                self.writer
                    .reference("RatioTapChanger.RatioTapChangerTable", &table_id)?;
                if let Some(control_id) = &control_id {
                    self.writer
                        .reference("TapChanger.TapChangerControl", control_id)?;
                }
                self.writer.end_element()?;
                self.write_ratio_table(ratio_tap_changer, &table_id, name)
            }
            TapChangerKind::Phase(phase_tap_changer) => {
                let neutral_step = phase_neutral_step(phase_tap_changer);
                self.writer.start_identified(
                    "PhaseTapChangerTabular",
                    &id,
                    &format!("{name}_PTC"),
                )?;
                self.write_tap_changer_steps(phase_tap_changer, neutral_step, rated_u)?;
                self.writer.boolean("TapChanger.ltcFlag", false)?;
                self.writer
                    .reference("PhaseTapChanger.TransformerEnd", end_id)?;
                self.writer
                    .reference("PhaseTapChangerTabular.PhaseTapChangerTable", &table_id)?;
                if let Some(control_id) = &control_id {
                    self.writer
                        .reference("TapChanger.TapChangerControl", control_id)?;
                }
                self.writer.end_element()?;
                self.write_phase_table(phase_tap_changer, &table_id, name)
            }
        }
    }

    fn write_tap_changer_steps(
        &mut self,
        tap_changer: &dyn TapChanger,
        neutral_step: i32,
        rated_u: f64,
    ) -> Result<(), Error> {
        self.writer
            .integer("TapChanger.lowStep", tap_changer.low_tap_position().into())?;
        self.writer
            .integer("TapChanger.highStep", tap_changer.high_tap_position().into())?;
        self.writer
            .integer("TapChanger.neutralStep", neutral_step.into())?;
        self.writer
            .integer("TapChanger.normalStep", tap_changer.tap_position().into())?;
        self.writer.float("TapChanger.neutralU", rated_u)
    }

    /// Writes the control of a tap changer, once per document, and returns
    /// its identifier.
    fn write_tap_changer_control(
        &mut self,
        tap_changer: &EndTapChanger,
    ) -> Result<Option<String>, Error> {
        let Some(id) = self.tap_changer_control_id(tap_changer)? else {
            return Ok(None);
        };
        if !self.first_write(SharedObject::RegulatingControl, &id) {
            return Ok(Some(id));
        }
        let (mode, suffix, regulation_terminal) = match tap_changer.kind {
            TapChangerKind::Ratio(ratio_tap_changer) => (
                "voltage",
                "RTC_RC",
                ratio_tap_changer.regulation_terminal.as_ref(),
            ),
            TapChangerKind::Phase(phase_tap_changer) => (
                match phase_tap_changer.regulation_mode {
                    PhaseRegulationMode::CurrentLimiter => "currentFlow",
                    _ => "activePower",
                },
                "PTC_RC",
                phase_tap_changer.regulation_terminal.as_ref(),
            ),
        };
        let terminal_id = self.regulated_terminal_id(tap_changer.transformer, regulation_terminal)?;
        self.writer.start_identified(
            "TapChangerControl",
            &id,
            &format!("{}_{suffix}", tap_changer.transformer.name_or_id()),
        )?;
        self.writer.attribute("RegulatingControl.mode", mode)?;
        self.writer.reference("RegulatingControl.Terminal", &terminal_id)?;
        self.writer.end_element()?;
        Ok(Some(id))
    }

    fn write_ratio_table(
        &mut self,
        tap_changer: &RatioTapChanger,
        table_id: &str,
        name: &str,
    ) -> Result<(), Error> {
        self.writer
            .start_identified("RatioTapChangerTable", table_id, &format!("{name}_TABLE"))?;
        self.writer.end_element()?;
        for (step, point) in (tap_changer.low_tap_position..).zip(&tap_changer.steps) {
            let id = self.derived_id(&format!("{table_id}_{step}"))?;
            self.writer.start_element("RatioTapChangerTablePoint", &id)?;
            self.writer.float("TapChangerTablePoint.r", point.r)?;
            self.writer.float("TapChangerTablePoint.x", point.x)?;
            self.writer.float("TapChangerTablePoint.g", point.g)?;
            self.writer.float("TapChangerTablePoint.b", point.b)?;
            self.writer.float("TapChangerTablePoint.ratio", 1.0 / point.rho)?;
            self.writer.integer("TapChangerTablePoint.step", step.into())?;
            self.writer
                .reference("RatioTapChangerTablePoint.RatioTapChangerTable", table_id)?;
            self.writer.end_element()?;
        }
        Ok(())
    }

    fn write_phase_table(
        &mut self,
        tap_changer: &PhaseTapChanger,
        table_id: &str,
        name: &str,
    ) -> Result<(), Error> {
        self.writer
            .start_identified("PhaseTapChangerTable", table_id, &format!("{name}_TABLE"))?;
        self.writer.end_element()?;
        for (step, point) in (tap_changer.low_tap_position..).zip(&tap_changer.steps) {
            let id = self.derived_id(&format!("{table_id}_{step}"))?;
            self.writer.start_element("PhaseTapChangerTablePoint", &id)?;
            self.writer.float("TapChangerTablePoint.r", point.r)?;
            self.writer.float("TapChangerTablePoint.x", point.x)?;
            self.writer.float("TapChangerTablePoint.g", point.g)?;
            self.writer.float("TapChangerTablePoint.b", point.b)?;
            self.writer.float("TapChangerTablePoint.ratio", 1.0 / point.rho)?;
            self.writer
                .float("PhaseTapChangerTablePoint.angle", 0.0 - point.alpha)?;
            self.writer.integer("TapChangerTablePoint.step", step.into())?;
            self.writer
                .reference("PhaseTapChangerTablePoint.PhaseTapChangerTable", table_id)?;
            self.writer.end_element()?;
        }
        Ok(())
    }
}

/// The neutral step of a ratio tap changer is its first step with a unit
/// ratio, or its highest step.
fn ratio_neutral_step(tap_changer: &RatioTapChanger) -> i32 {
    tap_changer
        .steps
        .iter()
        .position(|s| s.rho == 1.0)
        .map(|i| tap_changer.low_tap_position + i as i32)
        .unwrap_or_else(|| tap_changer.high_tap_position())
}

/// The neutral step of a phase tap changer is its first step without phase
/// shift, or its highest step.
fn phase_neutral_step(tap_changer: &PhaseTapChanger) -> i32 {
    tap_changer
        .steps
        .iter()
        .position(|s| s.alpha == 0.0)
        .map(|i| tap_changer.low_tap_position + i as i32)
        .unwrap_or_else(|| tap_changer.high_tap_position())
}

/// Returns the voltage change per step, in percent of the neutral voltage,
/// measured between the lowest and the neutral step.
fn step_voltage_increment(tap_changer: &RatioTapChanger, neutral_step: i32) -> f64 {
    let Some(low_step) = tap_changer.steps.first() else {
        return 0.0;
    };
    if tap_changer.low_tap_position == neutral_step {
        return 0.0;
    }
    100.0 * (1.0 / low_step.rho - 1.0) / f64::from(tap_changer.low_tap_position - neutral_step)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{export_document, NetworkBuilder};
    use crate::{ExportConfig, PhaseTapChangerStep, Profile, RatioTapChangerStep, TerminalRef};

    fn ratio_step(rho: f64) -> RatioTapChangerStep {
        RatioTapChangerStep {
            rho,
            r: 0.0,
            x: 0.0,
            g: 0.0,
            b: 0.0,
        }
    }

    fn phase_step(alpha: f64) -> PhaseTapChangerStep {
        PhaseTapChangerStep {
            rho: 1.0,
            alpha,
            r: 0.0,
            x: 0.0,
            g: 0.0,
            b: 0.0,
        }
    }

    fn ratio_tap_changer() -> RatioTapChanger {
        RatioTapChanger {
            low_tap_position: -1,
            tap_position: 0,
            steps: vec![ratio_step(0.8), ratio_step(1.0), ratio_step(1.25)],
            regulating: true,
            load_tap_changing_capabilities: true,
            target_v: Some(110.0),
            regulating_control_id: Some("RC_TR1".to_string()),
            regulation_terminal: None,
        }
    }

    fn phase_tap_changer() -> PhaseTapChanger {
        PhaseTapChanger {
            low_tap_position: 0,
            tap_position: 1,
            steps: vec![phase_step(-5.0), phase_step(0.0), phase_step(5.0)],
            regulation_mode: PhaseRegulationMode::ActivePowerControl,
            regulating: false,
            regulation_value: Some(100.0),
            regulating_control_id: Some("PRC_TR1".to_string()),
            regulation_terminal: Some(TerminalRef::new("TR1", 2)),
        }
    }

    #[test]
    fn test_neutral_steps() {
        let mut ratio = ratio_tap_changer();
        assert_eq!(ratio_neutral_step(&ratio), 0);
        assert_eq!(step_voltage_increment(&ratio, 0), -25.0);

        ratio.steps = vec![ratio_step(0.9), ratio_step(1.1)];
        assert_eq!(ratio_neutral_step(&ratio), 0);
        assert_eq!(step_voltage_increment(&ratio, -1), 0.0);

        let phase = phase_tap_changer();
        assert_eq!(phase_neutral_step(&phase), 1);
    }

    #[test]
    fn test_tap_changers() -> Result<(), Error> {
        let mut builder = NetworkBuilder::new("N");
        let vl1 = builder.node_breaker_vl("S1", "VL1", 400.0);
        let vl2 = builder.node_breaker_vl("S1", "VL2", 110.0);
        let transformer = builder.two_windings_transformer("TR1", (vl1, 1), (vl2, 1));
        transformer.ratio_tap_changer = Some(ratio_tap_changer());
        transformer.phase_tap_changer = Some(phase_tap_changer());
        let network = builder.build();

        let eq = export_document(&network, &ExportConfig::default(), Profile::Equipment)?;
        let end1 = eq
            .elements_of("PowerTransformerEnd")
            .find(|e| e.attribute("TransformerEnd.endNumber") == Some("1"))
            .unwrap();

        let ratio = eq.elements_of("RatioTapChanger").next().unwrap();
        assert_eq!(ratio.name(), Some("TR1_RTC"));
        assert_eq!(ratio.attribute("TapChanger.lowStep"), Some("-1"));
        assert_eq!(ratio.attribute("TapChanger.highStep"), Some("1"));
        assert_eq!(ratio.attribute("TapChanger.neutralStep"), Some("0"));
        assert_eq!(ratio.attribute("TapChanger.neutralU"), Some("400"));
        assert_eq!(ratio.attribute("RatioTapChanger.tculControlMode"), Some("volt"));
        assert_eq!(
            ratio.reference("RatioTapChanger.TransformerEnd"),
            Some(end1.id.as_str())
        );
        let control = eq
            .element(ratio.reference("TapChanger.TapChangerControl").unwrap())
            .unwrap();
        assert_eq!(control.id, "RC_TR1");
        assert_eq!(control.attribute("RegulatingControl.mode"), Some("voltage"));

        let table_id = ratio
            .reference("RatioTapChanger.RatioTapChangerTable")
            .unwrap();
        let points = eq
            .elements_of("RatioTapChangerTablePoint")
            .filter(|p| p.reference("RatioTapChangerTablePoint.RatioTapChangerTable") == Some(table_id))
            .collect::<Vec<_>>();
        assert_eq!(points.len(), 3);
        assert_eq!(points[0].attribute("TapChangerTablePoint.ratio"), Some("1.25"));
        assert_eq!(points[0].attribute("TapChangerTablePoint.step"), Some("-1"));

        let phase = eq.elements_of("PhaseTapChangerTabular").next().unwrap();
        assert_eq!(phase.attribute("TapChanger.neutralStep"), Some("1"));
        let control = eq
            .element(phase.reference("TapChanger.TapChangerControl").unwrap())
            .unwrap();
        assert_eq!(control.name(), Some("TR1_PTC_RC"));
        assert_eq!(control.attribute("RegulatingControl.mode"), Some("activePower"));
        let terminal = eq
            .element(control.reference("RegulatingControl.Terminal").unwrap())
            .unwrap();
        assert_eq!(terminal.attribute("ACDCTerminal.sequenceNumber"), Some("2"));
        let angles = eq
            .elements_of("PhaseTapChangerTablePoint")
            .map(|p| p.attribute("PhaseTapChangerTablePoint.angle"))
            .collect::<Vec<_>>();
        assert_eq!(angles, vec![Some("5"), Some("0"), Some("-5")]);
        Ok(())
    }

    #[test]
    fn test_fixed_tap_without_control() -> Result<(), Error> {
        let mut builder = NetworkBuilder::new("N");
        let vl1 = builder.node_breaker_vl("S1", "VL1", 400.0);
        let vl2 = builder.node_breaker_vl("S1", "VL2", 110.0);
        let mut phase = phase_tap_changer();
        phase.regulation_mode = PhaseRegulationMode::FixedTap;
        builder
            .two_windings_transformer("TR1", (vl1, 1), (vl2, 1))
            .phase_tap_changer = Some(phase);
        let network = builder.build();

        let eq = export_document(&network, &ExportConfig::default(), Profile::Equipment)?;
        let phase = eq.elements_of("PhaseTapChangerTabular").next().unwrap();
        assert_eq!(phase.reference("TapChanger.TapChangerControl"), None);
        assert_eq!(eq.elements_of("TapChangerControl").count(), 0);
        Ok(())
    }
}
