// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! Operational limits.
//!
//! Each limit is written in a limit set of its own, attached to the terminal
//! it applies to.  The limit types are shared by all the limits of a
//! document: there is one permanent type, and one temporary type per name and
//! acceptable duration.

use crate::{Error, LimitsSet, LoadingLimits, SharedObject, TemporaryLimit};

use super::super::Emitter;

/// Limits.
impl Emitter<'_, '_> {
    pub(super) fn write_limits(&mut self, limits: &LimitsSet, terminal_id: &str) -> Result<(), Error> {
        let kinds = [
            ("ActivePowerLimit", &limits.active_power),
            ("ApparentPowerLimit", &limits.apparent_power),
            ("CurrentLimit", &limits.current),
        ];
        for (class, loading_limits) in kinds {
            if let Some(loading_limits) = loading_limits {
                self.write_loading_limits(class, loading_limits, terminal_id)?;
            }
        }
        Ok(())
    }

    fn write_loading_limits(
        &mut self,
        class: &str,
        limits: &LoadingLimits,
        terminal_id: &str,
    ) -> Result<(), Error> {
        if let Some(value) = limits.permanent_limit {
            let type_id = self.write_permanent_limit_type()?;
            let key = format!("{terminal_id}_{class}_PATL");
            self.write_limit(class, &key, "operational limit patl", value, &type_id, terminal_id)?;
        }
        for (index, temporary_limit) in limits.temporary_limits.iter().enumerate() {
            let type_id = self.write_temporary_limit_type(temporary_limit)?;
            let key = format!("{terminal_id}_{class}_TATL_{index}");
            self.write_limit(
                class,
                &key,
                "operational limit tatl",
                temporary_limit.value,
                &type_id,
                terminal_id,
            )?;
        }
        Ok(())
    }

    fn write_limit(
        &mut self,
        class: &str,
        key: &str,
        set_name: &str,
        value: f64,
        type_id: &str,
        terminal_id: &str,
    ) -> Result<(), Error> {
        let set_id = self.derived_id(&format!("{key}_OLS"))?;
        self.writer
            .start_identified("OperationalLimitSet", &set_id, set_name)?;
        self.writer
            .reference("OperationalLimitSet.Terminal", terminal_id)?;
        self.writer.end_element()?;

        let id = self.derived_id(key)?;
        self.writer.start_element(class, &id)?;
        self.writer.float(&format!("{class}.value"), value)?;
        self.writer
            .reference("OperationalLimit.OperationalLimitType", type_id)?;
        self.writer
            .reference("OperationalLimit.OperationalLimitSet", &set_id)?;
        self.writer.end_element()
    }

    fn write_permanent_limit_type(&mut self) -> Result<String, Error> {
        let id = self.derived_id("OperationalLimitType_PATL")?;
        if self.first_write(SharedObject::OperationalLimitType, &id) {
            self.writer
                .start_identified("OperationalLimitType", &id, "PATL")?;
            self.writer
                .attribute("OperationalLimitType.direction", "absoluteValue")?;
            self.writer
                .attribute("OperationalLimitType.limitType", "patl")?;
            self.writer.end_element()?;
        }
        Ok(id)
    }

    fn write_temporary_limit_type(&mut self, limit: &TemporaryLimit) -> Result<String, Error> {
        let duration = limit
            .acceptable_duration
            .map(|d| d.to_string())
            .unwrap_or_else(|| "infinite".to_string());
        let id = self.derived_id(&format!("OperationalLimitType_TATL_{}_{duration}", limit.name))?;
        if self.first_write(SharedObject::OperationalLimitType, &id) {
            self.writer
                .start_identified("OperationalLimitType", &id, &limit.name)?;
            self.writer
                .attribute("OperationalLimitType.direction", "absoluteValue")?;
            self.writer
                .attribute("OperationalLimitType.limitType", "tatl")?;
            if let Some(duration) = limit.acceptable_duration {
                self.writer
                    .integer("OperationalLimitType.acceptableDuration", duration.into())?;
            }
            self.writer.end_element()?;
        }
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use crate::test_utils::{export_document, NetworkBuilder};
    use crate::{Error, ExportConfig, LoadingLimits, Profile, TemporaryLimit};

    fn current_limits(permanent_limit: f64) -> LoadingLimits {
        LoadingLimits {
            permanent_limit: Some(permanent_limit),
            temporary_limits: vec![TemporaryLimit {
                name: "IT20".to_string(),
                acceptable_duration: Some(1200),
                value: permanent_limit * 1.5,
            }],
        }
    }

    #[test]
    fn test_line_limits() -> Result<(), Error> {
        let mut builder = NetworkBuilder::new("N");
        let vl1 = builder.node_breaker_vl("S1", "VL1", 400.0);
        let vl2 = builder.node_breaker_vl("S2", "VL2", 400.0);
        let line = builder.line("L1", (vl1, 1), (vl2, 1));
        line.limits1.current = Some(current_limits(1000.0));
        line.limits2.current = Some(current_limits(800.0));
        line.limits2.active_power = Some(LoadingLimits {
            permanent_limit: Some(500.0),
            temporary_limits: vec![],
        });
        let network = builder.build();

        let eq = export_document(&network, &ExportConfig::default(), Profile::Equipment)?;
        assert_eq!(eq.elements_of("CurrentLimit").count(), 4);
        assert_eq!(eq.elements_of("ActivePowerLimit").count(), 1);
        assert_eq!(eq.elements_of("OperationalLimitSet").count(), 5);
        // One permanent type, and one temporary type shared by both sides.
        assert_eq!(eq.elements_of("OperationalLimitType").count(), 2);

        let patl = eq.named("OperationalLimitType", "PATL").unwrap();
        let tatl = eq.named("OperationalLimitType", "IT20").unwrap();
        assert_eq!(
            tatl.attribute("OperationalLimitType.acceptableDuration"),
            Some("1200")
        );

        let limit = eq
            .elements_of("CurrentLimit")
            .find(|l| l.attribute("CurrentLimit.value") == Some("1000"))
            .unwrap();
        assert_eq!(
            limit.reference("OperationalLimit.OperationalLimitType"),
            Some(patl.id.as_str())
        );
        let set = eq
            .element(limit.reference("OperationalLimit.OperationalLimitSet").unwrap())
            .unwrap();
        assert_eq!(set.name(), Some("operational limit patl"));
        let terminal = eq.element(set.reference("OperationalLimitSet.Terminal").unwrap()).unwrap();
        assert_eq!(terminal.reference("Terminal.ConductingEquipment"), Some("L1"));
        assert_eq!(terminal.attribute("ACDCTerminal.sequenceNumber"), Some("1"));
        Ok(())
    }
}
