// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! Numbering of the ends of multi-terminal equipment.

use crate::{Error, Network, TwoWindingsTransformer, ThreeWindingsTransformer};

/// How the sides of a piece of equipment are turned into end numbers.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum EndNumberPolicy {
    /// The end number of a side is the side itself.
    #[default]
    Identity,
    /// Ends are numbered by descending nominal voltage.  Sides with the same
    /// nominal voltage keep their relative order.
    HighestVoltageFirst,
}

/// Maps the sides of one piece of equipment to end numbers `1..=N`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EndNumberAssigner {
    /// `ends[side - 1]` is the end number of `side`.
    ends: Vec<u8>,
}

impl EndNumberAssigner {
    /// Creates an assigner for equipment whose sides have the given nominal
    /// voltages, in side order.
    pub fn new(policy: EndNumberPolicy, nominal_voltages: &[f64]) -> Self {
        let mut sides = (1..=nominal_voltages.len() as u8).collect::<Vec<_>>();
        if policy == EndNumberPolicy::HighestVoltageFirst {
            // A stable sort keeps ties in ascending side order.
            sides.sort_by(|a, b| {
                nominal_voltages[*b as usize - 1].total_cmp(&nominal_voltages[*a as usize - 1])
            });
        }
        let mut ends = vec![0; sides.len()];
        for (position, side) in sides.iter().enumerate() {
            ends[*side as usize - 1] = position as u8 + 1;
        }
        Self { ends }
    }

    /// Creates the assigner of a two-winding transformer, from the nominal
    /// voltages of the voltage levels at its sides.
    pub fn for_two_windings_transformer(
        policy: EndNumberPolicy,
        network: &Network,
        transformer: &TwoWindingsTransformer,
    ) -> Result<Self, Error> {
        let voltages = [
            network.voltage_level(&transformer.terminal1.voltage_level_id)?.nominal_v,
            network.voltage_level(&transformer.terminal2.voltage_level_id)?.nominal_v,
        ];
        Ok(Self::new(policy, &voltages))
    }

    /// Creates the assigner of a three-winding transformer.
    pub fn for_three_windings_transformer(
        policy: EndNumberPolicy,
        network: &Network,
        transformer: &ThreeWindingsTransformer,
    ) -> Result<Self, Error> {
        let mut voltages = [0.0; 3];
        for (voltage, leg) in voltages.iter_mut().zip(&transformer.legs) {
            *voltage = network.voltage_level(&leg.terminal.voltage_level_id)?.nominal_v;
        }
        Ok(Self::new(policy, &voltages))
    }

    /// Returns the end number of the given side.
    ///
    /// Fails if the equipment has no such side.
    pub fn end_number(&self, side: u8) -> Result<u8, Error> {
        side.checked_sub(1)
            .and_then(|i| self.ends.get(i as usize))
            .copied()
            .ok_or_else(|| {
                Error::internal(format!(
                    "Side {side} is out of range for an equipment with {} ends.",
                    self.ends.len()
                ))
            })
    }

    /// Returns the side that is exported with the given end number.
    pub fn side(&self, end_number: u8) -> Option<u8> {
        self.ends
            .iter()
            .position(|e| *e == end_number)
            .map(|i| i as u8 + 1)
    }

    pub fn len(&self) -> usize {
        self.ends.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ends.is_empty()
    }
}
