// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! A closed view over the connectable equipment of a network.

use super::model::{
    BusbarSection, DanglingLine, Generator, Line, Load, ShuntCompensator, StaticVarCompensator,
    Terminal, ThreeWindingsTransformer, TwoWindingsTransformer,
};
use crate::Identifiable;

/// A reference to a piece of connectable equipment.
///
/// Emitters dispatch on the variant instead of on the concrete type.
#[derive(Clone, Copy, Debug)]
pub enum EquipmentRef<'a> {
    BusbarSection(&'a BusbarSection),
    Load(&'a Load),
    Generator(&'a Generator),
    ShuntCompensator(&'a ShuntCompensator),
    StaticVarCompensator(&'a StaticVarCompensator),
    Line(&'a Line),
    TwoWindingsTransformer(&'a TwoWindingsTransformer),
    ThreeWindingsTransformer(&'a ThreeWindingsTransformer),
    DanglingLine(&'a DanglingLine),
}

impl<'a> EquipmentRef<'a> {
    /// Returns the equipment as an identifiable object.
    pub fn identifiable(&self) -> &'a dyn Identifiable {
        match *self {
            EquipmentRef::BusbarSection(e) => e,
            EquipmentRef::Load(e) => e,
            EquipmentRef::Generator(e) => e,
            EquipmentRef::ShuntCompensator(e) => e,
            EquipmentRef::StaticVarCompensator(e) => e,
            EquipmentRef::Line(e) => e,
            EquipmentRef::TwoWindingsTransformer(e) => e,
            EquipmentRef::ThreeWindingsTransformer(e) => e,
            EquipmentRef::DanglingLine(e) => e,
        }
    }

    pub fn id(&self) -> &'a str {
        self.identifiable().id()
    }

    /// Returns the terminals of the equipment with their sides, in side
    /// order.
    pub fn terminals(&self) -> Vec<(u8, &'a Terminal)> {
        match *self {
            EquipmentRef::BusbarSection(e) => vec![(1, &e.terminal)],
            EquipmentRef::Load(e) => vec![(1, &e.terminal)],
            EquipmentRef::Generator(e) => vec![(1, &e.terminal)],
            EquipmentRef::ShuntCompensator(e) => vec![(1, &e.terminal)],
            EquipmentRef::StaticVarCompensator(e) => vec![(1, &e.terminal)],
            EquipmentRef::Line(e) => vec![(1, &e.terminal1), (2, &e.terminal2)],
            EquipmentRef::TwoWindingsTransformer(e) => vec![(1, &e.terminal1), (2, &e.terminal2)],
            EquipmentRef::ThreeWindingsTransformer(e) => vec![
                (1, &e.legs[0].terminal),
                (2, &e.legs[1].terminal),
                (3, &e.legs[2].terminal),
            ],
            EquipmentRef::DanglingLine(e) => vec![(1, &e.terminal)],
        }
    }

    /// Returns the terminal at the given side, if there is one.
    pub fn terminal(&self, side: u8) -> Option<&'a Terminal> {
        self.terminals()
            .into_iter()
            .find(|(s, _)| *s == side)
            .map(|(_, t)| t)
    }

    /// Returns the equipment class name used in the equipment profile.
    pub fn class_name(&self) -> &'static str {
        match self {
            EquipmentRef::BusbarSection(_) => "BusbarSection",
            EquipmentRef::Load(e) => e.class_name(),
            EquipmentRef::Generator(_) => "SynchronousMachine",
            EquipmentRef::ShuntCompensator(_) => "ShuntCompensator",
            EquipmentRef::StaticVarCompensator(_) => "StaticVarCompensator",
            EquipmentRef::Line(_) => "ACLineSegment",
            EquipmentRef::TwoWindingsTransformer(_) => "PowerTransformer",
            EquipmentRef::ThreeWindingsTransformer(_) => "PowerTransformer",
            EquipmentRef::DanglingLine(_) => "ACLineSegment",
        }
    }

    pub fn is_dangling_line(&self) -> bool {
        matches!(self, EquipmentRef::DanglingLine(_))
    }
}
