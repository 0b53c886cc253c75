// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! This module is only compiled when running unit tests and contains the
//! `NetworkBuilder`, which can declaratively build networks for use in tests.

use crate::naming::{AliasEntry, AliasType};
use crate::{export_network, Document, Error, ExportConfig, Profile, RecordingSink};
use crate::network::{
    Bus, BusbarSection, ControlArea, DanglingLine, Generator, InternalConnection, Leg, LimitsSet,
    Line, Load, Network, ReactiveLimits, ShuntCompensator, ShuntModel, StaticVarCompensator,
    Substation, SvcRegulationMode, Switch, SwitchEnds, SwitchKind, Terminal, ThreeWindingsTransformer,
    Topology, TwoWindingsTransformer, VoltageLevel,
};

/// Represents a voltage level added to the `NetworkBuilder`.
#[derive(Eq, Hash, PartialEq, Copy, Clone, Debug)]
pub(crate) struct VlHandle(usize);

/// A builder for creating networks easily, for use in tests.
pub(crate) struct NetworkBuilder {
    network: Network,
}

impl NetworkBuilder {
    /// Creates a new `NetworkBuilder` for a network with the given id.
    pub(crate) fn new(id: &str) -> Self {
        NetworkBuilder {
            network: Network {
                id: id.to_string(),
                ..Default::default()
            },
        }
    }

    fn ensure_substation(&mut self, substation_id: &str) {
        if !self.network.substations.iter().any(|s| s.id == substation_id) {
            self.network.substations.push(Substation {
                id: substation_id.to_string(),
                ..Default::default()
            });
        }
    }

    fn add_vl(&mut self, substation_id: &str, id: &str, nominal_v: f64, topology: Topology) -> VlHandle {
        self.ensure_substation(substation_id);
        self.network.voltage_levels.push(VoltageLevel {
            id: id.to_string(),
            name: None,
            substation_id: Some(substation_id.to_string()),
            nominal_v,
            low_voltage_limit: None,
            high_voltage_limit: None,
            topology,
            properties: Default::default(),
        });
        VlHandle(self.network.voltage_levels.len() - 1)
    }

    /// Adds a node/breaker voltage level, creating its substation if needed.
    pub(crate) fn node_breaker_vl(&mut self, substation_id: &str, id: &str, nominal_v: f64) -> VlHandle {
        self.add_vl(
            substation_id,
            id,
            nominal_v,
            Topology::NodeBreaker {
                internal_connections: vec![],
            },
        )
    }

    /// Adds a bus/breaker voltage level with the given buses.
    pub(crate) fn bus_breaker_vl(
        &mut self,
        substation_id: &str,
        id: &str,
        nominal_v: f64,
        buses: &[&str],
    ) -> VlHandle {
        let buses = buses
            .iter()
            .map(|b| Bus {
                id: b.to_string(),
                ..Default::default()
            })
            .collect();
        self.add_vl(substation_id, id, nominal_v, Topology::BusBreaker { buses })
    }

    /// Returns the voltage level behind the given handle.
    pub(crate) fn vl(&mut self, vl: VlHandle) -> &mut VoltageLevel {
        &mut self.network.voltage_levels[vl.0]
    }

    fn vl_id(&self, vl: VlHandle) -> String {
        self.network.voltage_levels[vl.0].id.clone()
    }

    fn terminal(&self, vl: VlHandle, node: u32) -> Terminal {
        Terminal::at_node(self.vl_id(vl), node)
    }

    /// Returns the mutable network properties, to be set by the tests.
    pub(crate) fn network(&mut self) -> &mut Network {
        &mut self.network
    }

    pub(crate) fn internal_connection(&mut self, vl: VlHandle, node1: u32, node2: u32) -> &mut Self {
        if let Topology::NodeBreaker {
            internal_connections,
        } = &mut self.vl(vl).topology
        {
            internal_connections.push(InternalConnection { node1, node2 });
        }
        self
    }

    /// Adds a breaker between two nodes.
    pub(crate) fn switch(
        &mut self,
        id: &str,
        vl: VlHandle,
        node1: u32,
        node2: u32,
        fictitious: bool,
    ) -> &mut Switch {
        let voltage_level_id = self.vl_id(vl);
        self.network.switches.push(Switch {
            id: id.to_string(),
            name: None,
            voltage_level_id,
            kind: SwitchKind::Breaker,
            open: false,
            retained: false,
            fictitious,
            ends: SwitchEnds::Nodes(node1, node2),
            properties: Default::default(),
        });
        self.network.switches.last_mut().unwrap()
    }

    /// Adds a breaker between two buses.
    pub(crate) fn bus_switch(&mut self, id: &str, vl: VlHandle, bus1: &str, bus2: &str) -> &mut Switch {
        let voltage_level_id = self.vl_id(vl);
        self.network.switches.push(Switch {
            id: id.to_string(),
            name: None,
            voltage_level_id,
            kind: SwitchKind::Breaker,
            open: false,
            retained: false,
            fictitious: false,
            ends: SwitchEnds::Buses(bus1.to_string(), bus2.to_string()),
            properties: Default::default(),
        });
        self.network.switches.last_mut().unwrap()
    }

    pub(crate) fn busbar_section(&mut self, id: &str, vl: VlHandle, node: u32) -> &mut BusbarSection {
        let terminal = self.terminal(vl, node);
        self.network.busbar_sections.push(BusbarSection {
            id: id.to_string(),
            name: None,
            terminal,
            properties: Default::default(),
        });
        self.network.busbar_sections.last_mut().unwrap()
    }

    fn push_load(&mut self, id: &str, terminal: Terminal) -> &mut Load {
        self.network.loads.push(Load {
            id: id.to_string(),
            name: None,
            terminal,
            p0: 10.0,
            q0: 1.0,
            detail: None,
            properties: Default::default(),
        });
        self.network.loads.last_mut().unwrap()
    }

    pub(crate) fn load(&mut self, id: &str, vl: VlHandle, node: u32) -> &mut Load {
        let terminal = self.terminal(vl, node);
        self.push_load(id, terminal)
    }

    pub(crate) fn load_at_bus(&mut self, id: &str, vl: VlHandle, bus: &str) -> &mut Load {
        let terminal = Terminal::at_bus(self.vl_id(vl), bus);
        self.push_load(id, terminal)
    }

    pub(crate) fn generator(&mut self, id: &str, vl: VlHandle, node: u32) -> &mut Generator {
        let terminal = self.terminal(vl, node);
        self.network.generators.push(Generator {
            id: id.to_string(),
            name: None,
            terminal,
            min_p: 0.0,
            max_p: 100.0,
            target_p: 50.0,
            target_q: 0.0,
            target_v: Some(400.0),
            voltage_regulator_on: true,
            rated_s: None,
            energy_source: Default::default(),
            reactive_limits: ReactiveLimits::MinMax {
                min_q: -50.0,
                max_q: 50.0,
            },
            regulating_terminal: None,
            properties: Default::default(),
        });
        self.network.generators.last_mut().unwrap()
    }

    pub(crate) fn shunt(&mut self, id: &str, vl: VlHandle, node: u32) -> &mut ShuntCompensator {
        let terminal = self.terminal(vl, node);
        self.network.shunt_compensators.push(ShuntCompensator {
            id: id.to_string(),
            name: None,
            terminal,
            section_count: 1,
            maximum_section_count: 2,
            model: ShuntModel::Linear {
                b_per_section: 1e-4,
                g_per_section: 0.0,
            },
            voltage_regulator_on: false,
            target_v: None,
            regulating_terminal: None,
            properties: Default::default(),
        });
        self.network.shunt_compensators.last_mut().unwrap()
    }

    pub(crate) fn static_var_compensator(
        &mut self,
        id: &str,
        vl: VlHandle,
        node: u32,
    ) -> &mut StaticVarCompensator {
        let terminal = self.terminal(vl, node);
        self.network.static_var_compensators.push(StaticVarCompensator {
            id: id.to_string(),
            name: None,
            terminal,
            b_min: -0.01,
            b_max: 0.01,
            regulation_mode: SvcRegulationMode::Voltage,
            voltage_setpoint: Some(400.0),
            reactive_power_setpoint: None,
            regulating_terminal: None,
            properties: Default::default(),
        });
        self.network.static_var_compensators.last_mut().unwrap()
    }

    pub(crate) fn line(&mut self, id: &str, end1: (VlHandle, u32), end2: (VlHandle, u32)) -> &mut Line {
        let terminal1 = self.terminal(end1.0, end1.1);
        let terminal2 = self.terminal(end2.0, end2.1);
        self.network.lines.push(Line {
            id: id.to_string(),
            name: None,
            terminal1,
            terminal2,
            r: 1.0,
            x: 10.0,
            g1: 0.0,
            g2: 0.0,
            b1: 1e-6,
            b2: 1e-6,
            limits1: LimitsSet::default(),
            limits2: LimitsSet::default(),
            properties: Default::default(),
        });
        self.network.lines.last_mut().unwrap()
    }

    pub(crate) fn two_windings_transformer(
        &mut self,
        id: &str,
        end1: (VlHandle, u32),
        end2: (VlHandle, u32),
    ) -> &mut TwoWindingsTransformer {
        let terminal1 = self.terminal(end1.0, end1.1);
        let terminal2 = self.terminal(end2.0, end2.1);
        let rated_u1 = self.network.voltage_levels[end1.0 .0].nominal_v;
        let rated_u2 = self.network.voltage_levels[end2.0 .0].nominal_v;
        let substation_id = self.network.voltage_levels[end1.0 .0].substation_id.clone();
        self.network.two_windings_transformers.push(TwoWindingsTransformer {
            id: id.to_string(),
            name: None,
            substation_id,
            terminal1,
            terminal2,
            r: 0.5,
            x: 20.0,
            g: 0.0,
            b: 0.0,
            rated_u1,
            rated_u2,
            rated_s: None,
            ratio_tap_changer: None,
            phase_tap_changer: None,
            limits1: LimitsSet::default(),
            limits2: LimitsSet::default(),
            properties: Default::default(),
        });
        self.network.two_windings_transformers.last_mut().unwrap()
    }

    pub(crate) fn three_windings_transformer(
        &mut self,
        id: &str,
        ends: [(VlHandle, u32); 3],
    ) -> &mut ThreeWindingsTransformer {
        let legs = ends.map(|(vl, node)| Leg {
            terminal: self.terminal(vl, node),
            r: 0.1,
            x: 5.0,
            g: 0.0,
            b: 0.0,
            rated_u: self.network.voltage_levels[vl.0].nominal_v,
            rated_s: None,
            ratio_tap_changer: None,
            phase_tap_changer: None,
            limits: LimitsSet::default(),
        });
        let substation_id = self.network.voltage_levels[ends[0].0 .0].substation_id.clone();
        self.network.three_windings_transformers.push(ThreeWindingsTransformer {
            id: id.to_string(),
            name: None,
            substation_id,
            legs,
            properties: Default::default(),
        });
        self.network.three_windings_transformers.last_mut().unwrap()
    }

    pub(crate) fn dangling_line(&mut self, id: &str, vl: VlHandle, node: u32) -> &mut DanglingLine {
        let terminal = self.terminal(vl, node);
        self.network.dangling_lines.push(DanglingLine {
            id: id.to_string(),
            name: None,
            terminal,
            r: 1.0,
            x: 10.0,
            g: 0.0,
            b: 0.0,
            p0: 5.0,
            q0: 1.0,
            generation: None,
            ucte_xnode_code: None,
            limits: LimitsSet::default(),
            properties: Default::default(),
        });
        self.network.dangling_lines.last_mut().unwrap()
    }

    pub(crate) fn control_area(&mut self, id: &str) -> &mut ControlArea {
        self.network.control_areas.push(ControlArea {
            id: id.to_string(),
            name: None,
            energy_identification_code: None,
            net_interchange: None,
            terminals: vec![],
            boundaries: vec![],
            properties: Default::default(),
        });
        self.network.control_areas.last_mut().unwrap()
    }

    /// Records an alias, as an import would have done.
    pub(crate) fn alias(&mut self, object_id: &str, alias_type: AliasType, value: &str) -> &mut Self {
        self.network
            .aliases
            .push(AliasEntry::new(object_id, alias_type, value));
        self
    }

    /// Returns the network built so far.
    pub(crate) fn build(&self) -> Network {
        self.network.clone()
    }
}

/// Exports the network with the given config, restricted to one profile, and
/// returns the recorded document.
pub(crate) fn export_document(
    network: &Network,
    config: &ExportConfig,
    profile: Profile,
) -> Result<Document, Error> {
    let config = ExportConfig {
        profiles: [profile].into(),
        ..config.clone()
    };
    let mut sink = RecordingSink::new();
    export_network(network, &config, &mut sink)?;
    sink.document(profile)
        .cloned()
        .ok_or_else(|| Error::internal(format!("No {profile} document.")))
}
