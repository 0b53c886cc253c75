// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! Power transformers and their ends.
//!
//! The impedances of the network model are expressed at the rated voltage of
//! the first side.  Each written end carries its share of the impedance at
//! its own rated voltage.

use crate::{Error, Identifiable, LimitsSet, Terminal};

use super::super::{EndTapChanger, Emitter};

/// The values written for one end of a transformer.
struct EndValues<'t> {
    side: u8,
    terminal: &'t Terminal,
    rated_u: f64,
    rated_s: Option<f64>,
    r: f64,
    x: f64,
    g: f64,
    b: f64,
}

impl<'t> EndValues<'t> {
    /// Returns the values of an end whose impedance is given at another
    /// rated voltage, `ratio` being the rated voltage of the end over that
    /// voltage.
    #[allow(clippy::too_many_arguments)]
    fn rescaled(
        side: u8,
        terminal: &'t Terminal,
        rated_u: f64,
        rated_s: Option<f64>,
        ratio: f64,
        (r, x, g, b): (f64, f64, f64, f64),
    ) -> Self {
        let ratio2 = ratio * ratio;
        EndValues {
            side,
            terminal,
            rated_u,
            rated_s,
            r: r * ratio2,
            x: x * ratio2,
            g: g / ratio2,
            b: b / ratio2,
        }
    }
}

/// Transformers.
impl Emitter<'_, '_> {
    pub(super) fn write_two_windings_transformers(&mut self) -> Result<(), Error> {
        let network = self.ctx.network();
        for transformer in &network.two_windings_transformers {
            let id = self.write_power_transformer(
                transformer,
                transformer.substation_id.as_deref(),
                &transformer.terminal1,
            )?;

            let a0 = transformer.rated_u1 / transformer.rated_u2;
            let end_values = [
                EndValues::rescaled(
                    1,
                    &transformer.terminal1,
                    transformer.rated_u1,
                    transformer.rated_s,
                    a0,
                    (transformer.r, transformer.x, transformer.g, transformer.b),
                ),
                EndValues::rescaled(
                    2,
                    &transformer.terminal2,
                    transformer.rated_u2,
                    transformer.rated_s,
                    1.0,
                    (0.0, 0.0, 0.0, 0.0),
                ),
            ];
            let limits = [&transformer.limits1, &transformer.limits2];

            let end_numbers = self.ctx.two_windings_end_numbers(transformer)?;
            for end in 1..=end_numbers.len() as u8 {
                let side = end_numbers.side(end).ok_or_else(|| {
                    Error::internal(format!("Transformer {} has no end {end}.", transformer.id))
                })?;
                let values = &end_values[side as usize - 1];
                let end_id = self.write_transformer_end(transformer, &id, end, values)?;
                if side == 1 {
                    for tap_changer in EndTapChanger::of_end(
                        transformer,
                        end,
                        transformer.ratio_tap_changer.as_ref(),
                        transformer.phase_tap_changer.as_ref(),
                    ) {
                        self.write_tap_changer(&tap_changer, &end_id, values.rated_u)?;
                    }
                }
                self.write_end_limits(transformer, side, limits[side as usize - 1])?;
            }
        }
        Ok(())
    }

    pub(super) fn write_three_windings_transformers(&mut self) -> Result<(), Error> {
        let network = self.ctx.network();
        for transformer in &network.three_windings_transformers {
            let [leg1, ..] = &transformer.legs;
            let id = self.write_power_transformer(
                transformer,
                transformer.substation_id.as_deref(),
                &leg1.terminal,
            )?;

            let end_numbers = self.ctx.three_windings_end_numbers(transformer)?;
            for end in 1..=end_numbers.len() as u8 {
                let side = end_numbers.side(end).ok_or_else(|| {
                    Error::internal(format!("Transformer {} has no end {end}.", transformer.id))
                })?;
                let leg = &transformer.legs[side as usize - 1];
                let values = EndValues::rescaled(
                    side,
                    &leg.terminal,
                    leg.rated_u,
                    leg.rated_s,
                    leg.rated_u / leg1.rated_u,
                    (leg.r, leg.x, leg.g, leg.b),
                );
                let end_id = self.write_transformer_end(transformer, &id, end, &values)?;
                for tap_changer in EndTapChanger::of_end(
                    transformer,
                    end,
                    leg.ratio_tap_changer.as_ref(),
                    leg.phase_tap_changer.as_ref(),
                ) {
                    self.write_tap_changer(&tap_changer, &end_id, leg.rated_u)?;
                }
                self.write_end_limits(transformer, side, &leg.limits)?;
            }
        }
        Ok(())
    }

    /// Writes the transformer itself, and returns its identifier.
    ///
    /// Transformers without a substation are placed in the substation of
    /// their first side.
    fn write_power_transformer(
        &mut self,
        transformer: &dyn Identifiable,
        substation_id: Option<&str>,
        first_terminal: &Terminal,
    ) -> Result<String, Error> {
        let container_id = match substation_id {
            Some(substation_id) => Some(self.cgmes_id_for_str(substation_id)?),
            None => self.substation_of(&first_terminal.voltage_level_id)?,
        };
        let id = self.cgmes_id(transformer)?;
        self.writer
            .start_identified("PowerTransformer", &id, transformer.name_or_id())?;
        if let Some(container_id) = &container_id {
            self.writer
                .reference("Equipment.EquipmentContainer", container_id)?;
        }
        self.writer.end_element()?;
        Ok(id)
    }

    fn write_transformer_end(
        &mut self,
        transformer: &dyn Identifiable,
        transformer_id: &str,
        end: u8,
        values: &EndValues,
    ) -> Result<String, Error> {
        let base_voltage_id = self.voltage_level_base_voltage(&values.terminal.voltage_level_id)?;
        let terminal_id = self.terminal_id(transformer.id(), values.side)?;
        let id = self
            .ctx
            .naming_mut()
            .cgmes_id_from_alias(transformer, crate::AliasType::TransformerEnd(end))?;

        self.writer.start_identified(
            "PowerTransformerEnd",
            &id,
            &format!("{}_{end}", transformer.name_or_id()),
        )?;
        self.writer.float("PowerTransformerEnd.r", values.r)?;
        self.writer.float("PowerTransformerEnd.x", values.x)?;
        self.writer.float("PowerTransformerEnd.g", values.g)?;
        self.writer.float("PowerTransformerEnd.b", values.b)?;
        if let Some(rated_s) = values.rated_s {
            self.writer.float("PowerTransformerEnd.ratedS", rated_s)?;
        }
        self.writer.float("PowerTransformerEnd.ratedU", values.rated_u)?;
        self.writer.integer("TransformerEnd.endNumber", end.into())?;
        self.writer
            .reference("PowerTransformerEnd.PowerTransformer", transformer_id)?;
        self.writer.reference("TransformerEnd.Terminal", &terminal_id)?;
        self.writer
            .reference("TransformerEnd.BaseVoltage", &base_voltage_id)?;
        self.writer.end_element()?;
        Ok(id)
    }

    fn write_end_limits(
        &mut self,
        transformer: &dyn Identifiable,
        side: u8,
        limits: &LimitsSet,
    ) -> Result<(), Error> {
        let terminal_id = self.terminal_id(transformer.id(), side)?;
        self.write_limits(limits, &terminal_id)
    }
}
