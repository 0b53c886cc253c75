// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! Busbar sections, loads, generators and compensators.

use crate::{
    CurvePoint, Error, Generator, Identifiable, ReactiveLimits, ShuntModel, SharedObject,
    SvcRegulationMode, TerminalRef,
};

use super::super::{Emitter, GENERATING_UNIT, REACTIVE_CAPABILITY_CURVE};

/// Injections.
impl Emitter<'_, '_> {
    pub(super) fn write_busbar_sections(&mut self) -> Result<(), Error> {
        let network = self.ctx.network();
        for busbar_section in &network.busbar_sections {
            let voltage_level_id = &busbar_section.terminal.voltage_level_id;
            let base_voltage_id = self.voltage_level_base_voltage(voltage_level_id)?;
            let id = self.cgmes_id(busbar_section)?;
            let container_id = self.cgmes_id_for_str(voltage_level_id)?;

            self.writer
                .start_identified("BusbarSection", &id, busbar_section.name_or_id())?;
            self.writer
                .reference("Equipment.EquipmentContainer", &container_id)?;
            self.writer
                .reference("ConductingEquipment.BaseVoltage", &base_voltage_id)?;
            self.writer.end_element()?;
        }
        Ok(())
    }

    /// Load groups are written after the loads, and only when some load
    /// belongs to them.
    pub(super) fn write_loads(&mut self) -> Result<(), Error> {
        let network = self.ctx.network();
        let mut groups = vec![];
        for load in &network.loads {
            let class = load.class_name();
            let group = match class {
                "EnergyConsumer" => None,
                _ => {
                    let group_class = format!("{class}Group");
                    let group_id = self.derived_id(&group_class)?;
                    if self.first_write(SharedObject::LoadGroup, &group_id) {
                        groups.push((group_class, group_id.clone()));
                    }
                    Some(group_id)
                }
            };
            let id = self.cgmes_id(load)?;
            let container_id = self.cgmes_id_for_str(&load.terminal.voltage_level_id)?;

            self.writer.start_identified(class, &id, load.name_or_id())?;
            self.writer
                .reference("Equipment.EquipmentContainer", &container_id)?;
            if let Some(group_id) = &group {
                self.writer
                    .reference(&format!("{class}.LoadGroup"), group_id)?;
            }
            self.writer.end_element()?;
        }

        for (group_class, group_id) in groups {
            let name = match group_class.as_str() {
                "ConformLoadGroup" => "Conform loads",
                _ => "Non-conform loads",
            };
            self.writer.start_identified(&group_class, &group_id, name)?;
            self.writer.end_element()?;
        }
        Ok(())
    }

    /// Generators sharing a generating unit refer to the same one, which is
    /// named after the first of them.
    pub(super) fn write_generators(&mut self) -> Result<(), Error> {
        let network = self.ctx.network();
        for generator in &network.generators {
            let generating_unit_id = self
                .ctx
                .naming_mut()
                .cgmes_id_from_property(generator, GENERATING_UNIT)?;
            let control_id = self.write_regulating_control(
                generator,
                "voltage",
                generator.voltage_regulator_on,
                generator.regulating_terminal.as_ref(),
            )?;
            let (curve_id, min_q, max_q) = match &generator.reactive_limits {
                ReactiveLimits::MinMax { min_q, max_q } => (None, *min_q, *max_q),
                ReactiveLimits::Curve { points } => (
                    Some(self.write_reactive_capability_curve(generator, points)?),
                    0.0,
                    0.0,
                ),
            };
            let id = self.cgmes_id(generator)?;
            let container_id = self.cgmes_id_for_str(&generator.terminal.voltage_level_id)?;

            self.writer
                .start_identified("SynchronousMachine", &id, generator.name_or_id())?;
            self.writer
                .reference("Equipment.EquipmentContainer", &container_id)?;
            self.writer
                .reference("RotatingMachine.GeneratingUnit", &generating_unit_id)?;
            if let Some(control_id) = &control_id {
                self.writer
                    .reference("RegulatingCondEq.RegulatingControl", control_id)?;
            }
            match &curve_id {
                Some(curve_id) => self
                    .writer
                    .reference("SynchronousMachine.InitialReactiveCapabilityCurve", curve_id)?,
                None => {
                    self.writer.float("SynchronousMachine.minQ", min_q)?;
                    self.writer.float("SynchronousMachine.maxQ", max_q)?;
                }
            }
            if let Some(rated_s) = generator.rated_s {
                self.writer.float("RotatingMachine.ratedS", rated_s)?;
            }
            self.writer.end_element()?;

            if self.first_write(SharedObject::GeneratingUnit, &generating_unit_id) {
                self.write_generating_unit(generator, &generating_unit_id)?;
            }
        }
        Ok(())
    }

    fn write_generating_unit(&mut self, generator: &Generator, id: &str) -> Result<(), Error> {
        let substation_id = self.substation_of(&generator.terminal.voltage_level_id)?;
        self.writer.start_identified(
            generator.energy_source.generating_unit_class(),
            id,
            &format!("GU_{}", generator.name_or_id()),
        )?;
        self.writer
            .float("GeneratingUnit.minOperatingP", generator.min_p)?;
        self.writer
            .float("GeneratingUnit.maxOperatingP", generator.max_p)?;
        self.writer.float("GeneratingUnit.initialP", generator.target_p)?;
        if let Some(substation_id) = &substation_id {
            self.writer
                .reference("Equipment.EquipmentContainer", substation_id)?;
        }
        self.writer.end_element()
    }

    fn write_reactive_capability_curve(
        &mut self,
        generator: &Generator,
        points: &[CurvePoint],
    ) -> Result<String, Error> {
        let id = self
            .ctx
            .naming_mut()
            .cgmes_id_from_property(generator, REACTIVE_CAPABILITY_CURVE)?;
        if !self.first_write(SharedObject::ReactiveCapabilityCurve, &id) {
            return Ok(id);
        }
        self.writer.start_identified(
            "ReactiveCapabilityCurve",
            &id,
            &format!("RCC_{}", generator.name_or_id()),
        )?;
        self.writer
            .attribute("Curve.curveStyle", "straightLineYValues")?;
        self.writer.attribute("Curve.xUnit", "W")?;
        self.writer.attribute("Curve.y1Unit", "VAr")?;
        self.writer.attribute("Curve.y2Unit", "VAr")?;
        self.writer.end_element()?;

        for (index, point) in points.iter().enumerate() {
            let point_id = self.derived_id(&format!("{id}_CurveData_{index}"))?;
            self.writer.start_element("CurveData", &point_id)?;
            self.writer.reference("CurveData.Curve", &id)?;
            self.writer.float("CurveData.xvalue", point.p)?;
            self.writer.float("CurveData.y1value", point.min_q)?;
            self.writer.float("CurveData.y2value", point.max_q)?;
            self.writer.end_element()?;
        }
        Ok(id)
    }

    /// Writes the regulating control of an injection, once per document, and
    /// returns its identifier.
    fn write_regulating_control(
        &mut self,
        equipment: &dyn Identifiable,
        mode: &str,
        regulating: bool,
        regulating_terminal: Option<&TerminalRef>,
    ) -> Result<Option<String>, Error> {
        let Some(id) = self.regulating_control_id(equipment, regulating)? else {
            return Ok(None);
        };
        if self.first_write(SharedObject::RegulatingControl, &id) {
            let terminal_id = self.regulated_terminal_id(equipment, regulating_terminal)?;
            self.writer.start_identified(
                "RegulatingControl",
                &id,
                &format!("{}_RC", equipment.name_or_id()),
            )?;
            self.writer.attribute("RegulatingControl.mode", mode)?;
            self.writer
                .reference("RegulatingControl.Terminal", &terminal_id)?;
            self.writer.end_element()?;
        }
        Ok(Some(id))
    }

    pub(super) fn write_shunt_compensators(&mut self) -> Result<(), Error> {
        let network = self.ctx.network();
        for shunt in &network.shunt_compensators {
            let control_id = self.write_regulating_control(
                shunt,
                "voltage",
                shunt.voltage_regulator_on,
                shunt.regulating_terminal.as_ref(),
            )?;
            let voltage_level = network.voltage_level(&shunt.terminal.voltage_level_id)?;
            let id = self.cgmes_id(shunt)?;
            let container_id = self.cgmes_id(voltage_level)?;
            self.writer
                .start_identified(shunt.model.class_name(), &id, shunt.name_or_id())?;
            self.writer
                .reference("Equipment.EquipmentContainer", &container_id)?;
            self.writer
                .integer("ShuntCompensator.normalSections", shunt.section_count.into())?;
            self.writer.integer(
                "ShuntCompensator.maximumSections",
                shunt.maximum_section_count.into(),
            )?;
            self.writer
                .float("ShuntCompensator.nomU", voltage_level.nominal_v)?;
            if let ShuntModel::Linear {
                b_per_section,
                g_per_section,
            } = shunt.model
            {
                self.writer
                    .float("LinearShuntCompensator.bPerSection", b_per_section)?;
                self.writer
                    .float("LinearShuntCompensator.gPerSection", g_per_section)?;
            }
            if let Some(control_id) = &control_id {
                self.writer
                    .reference("RegulatingCondEq.RegulatingControl", control_id)?;
            }
            self.writer.end_element()?;

            // Points hold what each section adds to the previous ones.
            if let ShuntModel::NonLinear { sections } = &shunt.model {
                let (mut b, mut g) = (0.0, 0.0);
                for (number, section) in (1..).zip(sections) {
                    let point_id = self.derived_id(&format!("{}_Point_{number}", shunt.id))?;
                    self.writer
                        .start_element("NonlinearShuntCompensatorPoint", &point_id)?;
                    self.writer.reference(
                        "NonlinearShuntCompensatorPoint.NonlinearShuntCompensator",
                        &id,
                    )?;
                    self.writer
                        .integer("NonlinearShuntCompensatorPoint.sectionNumber", number)?;
                    self.writer
                        .float("NonlinearShuntCompensatorPoint.b", section.b - b)?;
                    self.writer
                        .float("NonlinearShuntCompensatorPoint.g", section.g - g)?;
                    self.writer.end_element()?;
                    (b, g) = (section.b, section.g);
                }
            }
        }
        Ok(())
    }

    pub(super) fn write_static_var_compensators(&mut self) -> Result<(), Error> {
        let network = self.ctx.network();
        for svc in &network.static_var_compensators {
            let mode = match svc.regulation_mode {
                SvcRegulationMode::ReactivePower => "reactivePower",
                SvcRegulationMode::Voltage | SvcRegulationMode::Off => "voltage",
            };
            let control_id = self.write_regulating_control(
                svc,
                mode,
                svc.regulation_mode != SvcRegulationMode::Off,
                svc.regulating_terminal.as_ref(),
            )?;
            let id = self.cgmes_id(svc)?;
            let container_id = self.cgmes_id_for_str(&svc.terminal.voltage_level_id)?;

            self.writer
                .start_identified("StaticVarCompensator", &id, svc.name_or_id())?;
            self.writer
                .reference("Equipment.EquipmentContainer", &container_id)?;
            self.writer
                .float("StaticVarCompensator.inductiveRating", 1.0 / svc.b_min)?;
            self.writer
                .float("StaticVarCompensator.capacitiveRating", 1.0 / svc.b_max)?;
            if let Some(control_id) = &control_id {
                self.writer
                    .reference("RegulatingCondEq.RegulatingControl", control_id)?;
            }
            if svc.regulation_mode != SvcRegulationMode::Off {
                self.writer
                    .attribute("StaticVarCompensator.sVCControlMode", mode)?;
            }
            if let Some(setpoint) = svc.voltage_setpoint {
                self.writer
                    .float("StaticVarCompensator.voltageSetPoint", setpoint)?;
            }
            self.writer.end_element()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::test_utils::{export_document, NetworkBuilder};
    use crate::{
        CurvePoint, EnergySource, Error, ExportConfig, LoadDetail, Profile, ReactiveLimits,
        ShuntModel, ShuntSection, TerminalRef,
    };

    #[test]
    fn test_generating_unit_dedup() -> Result<(), Error> {
        let mut builder = NetworkBuilder::new("N");
        let vl = builder.node_breaker_vl("S1", "VL1", 400.0);
        for (id, node) in [("G1", 1), ("G2", 2)] {
            let generator = builder.generator(id, vl, node);
            generator.energy_source = EnergySource::Hydro;
            generator
                .properties
                .insert("GeneratingUnit".to_string(), "_GU".to_string());
        }
        builder.generator("G3", vl, 3);
        let network = builder.build();

        let eq = export_document(&network, &ExportConfig::default(), Profile::Equipment)?;
        let units = eq.elements_of("HydroGeneratingUnit").collect::<Vec<_>>();
        assert_eq!(units.len(), 1);
        assert_eq!(units[0].id, "_GU");
        assert_eq!(units[0].name(), Some("GU_G1"));
        assert_eq!(
            units[0].reference("Equipment.EquipmentContainer"),
            Some("S1")
        );
        assert_eq!(eq.elements_of("GeneratingUnit").count(), 1);

        for id in ["G1", "G2"] {
            assert_eq!(
                eq.element(id)
                    .unwrap()
                    .reference("RotatingMachine.GeneratingUnit"),
                Some("_GU")
            );
        }
        Ok(())
    }

    #[test]
    fn test_regulating_controls() -> Result<(), Error> {
        let mut builder = NetworkBuilder::new("N");
        let vl = builder.node_breaker_vl("S1", "VL1", 400.0);
        builder.load("LD1", vl, 4);
        for (id, node) in [("G1", 1), ("G2", 2)] {
            let generator = builder.generator(id, vl, node);
            generator
                .properties
                .insert("RegulatingControl".to_string(), "_RC".to_string());
            generator.regulating_terminal = Some(TerminalRef::new("LD1", 1));
        }
        builder.generator("G3", vl, 3).voltage_regulator_on = false;
        let network = builder.build();

        let eq = export_document(&network, &ExportConfig::default(), Profile::Equipment)?;
        let controls = eq.elements_of("RegulatingControl").collect::<Vec<_>>();
        assert_eq!(controls.len(), 1);
        let load_terminal = eq
            .elements_of("Terminal")
            .find(|t| t.reference("Terminal.ConductingEquipment") == Some("LD1"))
            .unwrap();
        assert_eq!(
            controls[0].reference("RegulatingControl.Terminal"),
            Some(load_terminal.id.as_str())
        );
        assert_eq!(controls[0].attribute("RegulatingControl.mode"), Some("voltage"));
        assert_eq!(
            eq.element("G3")
                .unwrap()
                .reference("RegulatingCondEq.RegulatingControl"),
            None
        );
        Ok(())
    }

    #[test]
    fn test_unexported_regulating_terminal() {
        let mut builder = NetworkBuilder::new("N");
        let vl = builder.node_breaker_vl("S1", "VL1", 400.0);
        builder.generator("G1", vl, 1).regulating_terminal =
            Some(TerminalRef::new("NO_SUCH_EQUIPMENT", 1));
        let network = builder.build();

        assert!(
            export_document(&network, &ExportConfig::default(), Profile::Equipment).is_err_and(
                |e| e
                    == Error::terminal_not_registered(
                        "Terminal NO_SUCH_EQUIPMENT side 1 has not been exported."
                    )
            )
        );
    }

    #[test]
    fn test_reactive_capability_curve() -> Result<(), Error> {
        let mut builder = NetworkBuilder::new("N");
        let vl = builder.node_breaker_vl("S1", "VL1", 400.0);
        builder.generator("G1", vl, 1).reactive_limits = ReactiveLimits::Curve {
            points: vec![
                CurvePoint {
                    p: 0.0,
                    min_q: -10.0,
                    max_q: 10.0,
                },
                CurvePoint {
                    p: 100.0,
                    min_q: -5.0,
                    max_q: 5.0,
                },
            ],
        };
        let network = builder.build();

        let eq = export_document(&network, &ExportConfig::default(), Profile::Equipment)?;
        let curve = eq.named("ReactiveCapabilityCurve", "RCC_G1").unwrap();
        let machine = eq.element("G1").unwrap();
        assert_eq!(
            machine.reference("SynchronousMachine.InitialReactiveCapabilityCurve"),
            Some(curve.id.as_str())
        );
        assert_eq!(machine.attribute("SynchronousMachine.minQ"), None);
        let points = eq.elements_of("CurveData").collect::<Vec<_>>();
        assert_eq!(points.len(), 2);
        assert_eq!(points[1].attribute("CurveData.xvalue"), Some("100"));
        assert_eq!(points[1].attribute("CurveData.y1value"), Some("-5"));
        assert!(points
            .iter()
            .all(|p| p.reference("CurveData.Curve") == Some(curve.id.as_str())));
        Ok(())
    }

    #[test]
    fn test_loads() -> Result<(), Error> {
        let mut builder = NetworkBuilder::new("N");
        let vl = builder.node_breaker_vl("S1", "VL1", 400.0);
        builder.load("LD1", vl, 1);
        builder.load("LD2", vl, 2).detail = Some(LoadDetail {
            fixed_active_power: 0.0,
            variable_active_power: 5.0,
        });
        builder.load("LD3", vl, 3).detail = Some(LoadDetail {
            fixed_active_power: 0.0,
            variable_active_power: 2.0,
        });
        let network = builder.build();

        let eq = export_document(&network, &ExportConfig::default(), Profile::Equipment)?;
        assert_eq!(eq.element("LD1").unwrap().class, "EnergyConsumer");
        assert_eq!(eq.element("LD2").unwrap().class, "ConformLoad");
        let groups = eq.elements_of("ConformLoadGroup").collect::<Vec<_>>();
        assert_eq!(groups.len(), 1);
        assert_eq!(
            eq.element("LD3").unwrap().reference("ConformLoad.LoadGroup"),
            Some(groups[0].id.as_str())
        );
        assert_eq!(eq.elements_of("NonConformLoadGroup").count(), 0);
        Ok(())
    }

    #[test]
    fn test_shunt_compensators() -> Result<(), Error> {
        let mut builder = NetworkBuilder::new("N");
        let vl = builder.node_breaker_vl("S1", "VL1", 225.0);
        builder.shunt("SH1", vl, 1);
        builder.shunt("SH2", vl, 2).model = ShuntModel::NonLinear {
            sections: vec![
                ShuntSection { b: 1.0, g: 0.5 },
                ShuntSection { b: 3.0, g: 0.5 },
            ],
        };
        let network = builder.build();

        let eq = export_document(&network, &ExportConfig::default(), Profile::Equipment)?;
        let linear = eq.element("SH1").unwrap();
        assert_eq!(linear.class, "LinearShuntCompensator");
        assert_eq!(linear.attribute("ShuntCompensator.nomU"), Some("225"));
        assert_eq!(linear.attribute("ShuntCompensator.maximumSections"), Some("2"));

        assert_eq!(eq.element("SH2").unwrap().class, "NonlinearShuntCompensator");
        let points = eq
            .elements_of("NonlinearShuntCompensatorPoint")
            .collect::<Vec<_>>();
        assert_eq!(points.len(), 2);
        assert_eq!(points[1].attribute("NonlinearShuntCompensatorPoint.b"), Some("2"));
        assert_eq!(points[1].attribute("NonlinearShuntCompensatorPoint.g"), Some("0"));
        assert_eq!(
            points[1].attribute("NonlinearShuntCompensatorPoint.sectionNumber"),
            Some("2")
        );
        Ok(())
    }

    #[test]
    fn test_static_var_compensators() -> Result<(), Error> {
        let mut builder = NetworkBuilder::new("N");
        let vl = builder.node_breaker_vl("S1", "VL1", 400.0);
        builder.static_var_compensator("SVC1", vl, 1);
        let network = builder.build();

        let eq = export_document(&network, &ExportConfig::default(), Profile::Equipment)?;
        let svc = eq.element("SVC1").unwrap();
        assert_eq!(svc.attribute("StaticVarCompensator.inductiveRating"), Some("-100"));
        assert_eq!(svc.attribute("StaticVarCompensator.capacitiveRating"), Some("100"));
        assert_eq!(
            svc.attribute("StaticVarCompensator.sVCControlMode"),
            Some("voltage")
        );
        assert!(svc.reference("RegulatingCondEq.RegulatingControl").is_some());
        Ok(())
    }
}
