// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! Regions, substations and voltage levels.

use crate::{Error, Identifiable, SharedObject, Substation};

use super::super::Emitter;

const REGION_ID: &str = "regionId";
const REGION_NAME: &str = "regionName";
const SUB_REGION_ID: &str = "subRegionId";
const SUB_REGION_NAME: &str = "subRegionName";

/// Containers.
impl Emitter<'_, '_> {
    pub(super) fn write_substations(&mut self) -> Result<(), Error> {
        let network = self.ctx.network();
        for substation in &network.substations {
            let region_id = self.write_region(substation)?;
            let sub_region_id = self.write_sub_region(substation, &region_id)?;

            let id = self.cgmes_id(substation)?;
            self.writer
                .start_identified("Substation", &id, substation.name_or_id())?;
            self.writer.reference("Substation.Region", &sub_region_id)?;
            self.writer.end_element()?;
        }
        Ok(())
    }

    /// Regions come from the substation properties of an import.  Without
    /// them, there is one region per country.
    fn write_region(&mut self, substation: &Substation) -> Result<String, Error> {
        let id = match substation.property(REGION_ID) {
            Some(_) => self
                .ctx
                .naming_mut()
                .cgmes_id_from_property(substation, REGION_ID)?,
            None => self.derived_id(&format!("{}_GR", country_of(substation)))?,
        };
        if self.first_write(SharedObject::GeographicalRegion, &id) {
            let name = substation
                .property(REGION_NAME)
                .or(substation.country.as_deref())
                .map(str::to_string)
                .unwrap_or_else(|| {
                    tracing::warn!(
                        "Region {id} of substation {} has no name, its identifier is used instead.",
                        substation.id
                    );
                    id.clone()
                });
            self.writer
                .start_identified("GeographicalRegion", &id, &name)?;
            self.writer.end_element()?;
        }
        Ok(id)
    }

    fn write_sub_region(
        &mut self,
        substation: &Substation,
        region_id: &str,
    ) -> Result<String, Error> {
        let id = match substation.property(SUB_REGION_ID) {
            Some(_) => self
                .ctx
                .naming_mut()
                .cgmes_id_from_property(substation, SUB_REGION_ID)?,
            None => self.derived_id(&format!("{}_SGR", country_of(substation)))?,
        };
        if self.first_write(SharedObject::SubGeographicalRegion, &id) {
            let name = match substation.property(SUB_REGION_NAME) {
                Some(name) => name.to_string(),
                None => {
                    tracing::warn!(
                        "Sub-region {id} of substation {} has no name, its identifier is used instead.",
                        substation.id
                    );
                    id.clone()
                }
            };
            self.writer
                .start_identified("SubGeographicalRegion", &id, &name)?;
            self.writer
                .reference("SubGeographicalRegion.Region", region_id)?;
            self.writer.end_element()?;
        }
        Ok(id)
    }

    pub(super) fn write_voltage_levels(&mut self) -> Result<(), Error> {
        let network = self.ctx.network();
        for voltage_level in &network.voltage_levels {
            let base_voltage_id = self.base_voltage(voltage_level.nominal_v)?;
            let id = self.cgmes_id(voltage_level)?;
            let substation_id = voltage_level
                .substation_id
                .as_deref()
                .map(|s| self.cgmes_id_for_str(s))
                .transpose()?;

            self.writer
                .start_identified("VoltageLevel", &id, voltage_level.name_or_id())?;
            if let Some(limit) = voltage_level.low_voltage_limit {
                self.writer.float("VoltageLevel.lowVoltageLimit", limit)?;
            }
            if let Some(limit) = voltage_level.high_voltage_limit {
                self.writer.float("VoltageLevel.highVoltageLimit", limit)?;
            }
            if let Some(substation_id) = &substation_id {
                self.writer.reference("VoltageLevel.Substation", substation_id)?;
            }
            self.writer
                .reference("VoltageLevel.BaseVoltage", &base_voltage_id)?;
            self.writer.end_element()?;
        }
        Ok(())
    }
}

fn country_of(substation: &Substation) -> &str {
    substation.country.as_deref().unwrap_or("default")
}
