// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! The objects of the network model.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::identifiable::impl_identifiable;

/// Properties attached to network objects.
pub type Properties = BTreeMap<String, String>;

/// Identifies one connection point of a piece of equipment: the equipment's
/// id and the side (1-based) of the connection point.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TerminalRef {
    pub equipment_id: String,
    pub side: u8,
}

impl TerminalRef {
    pub fn new(equipment_id: impl Into<String>, side: u8) -> Self {
        Self {
            equipment_id: equipment_id.into(),
            side,
        }
    }
}

impl std::fmt::Display for TerminalRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} side {}", self.equipment_id, self.side)
    }
}

/// Where a terminal is attached inside its voltage level.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Connection {
    /// A node of a node/breaker voltage level.
    Node(u32),
    /// A bus of a bus/breaker voltage level.
    Bus(String),
}

/// The connection point of a piece of equipment.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Terminal {
    pub voltage_level_id: String,
    pub connection: Connection,
    #[serde(default = "default_true")]
    pub connected: bool,
    #[serde(default)]
    pub p: Option<f64>,
    #[serde(default)]
    pub q: Option<f64>,
}

impl Terminal {
    pub fn at_node(voltage_level_id: impl Into<String>, node: u32) -> Self {
        Self {
            voltage_level_id: voltage_level_id.into(),
            connection: Connection::Node(node),
            connected: true,
            p: None,
            q: None,
        }
    }

    pub fn at_bus(voltage_level_id: impl Into<String>, bus_id: impl Into<String>) -> Self {
        Self {
            voltage_level_id: voltage_level_id.into(),
            connection: Connection::Bus(bus_id.into()),
            connected: true,
            p: None,
            q: None,
        }
    }
}

fn default_true() -> bool {
    true
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Substation {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub properties: Properties,
}

/// A connection between two nodes of a node/breaker voltage level that has no
/// electrical equipment on it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InternalConnection {
    pub node1: u32,
    pub node2: u32,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Bus {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub properties: Properties,
}

/// The switching representation of a voltage level.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Topology {
    /// Equipment is connected to numbered nodes, joined by switches and
    /// internal connections.
    NodeBreaker {
        #[serde(default)]
        internal_connections: Vec<InternalConnection>,
    },
    /// Equipment is connected directly to buses.
    BusBreaker { buses: Vec<Bus> },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VoltageLevel {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub substation_id: Option<String>,
    pub nominal_v: f64,
    #[serde(default)]
    pub low_voltage_limit: Option<f64>,
    #[serde(default)]
    pub high_voltage_limit: Option<f64>,
    pub topology: Topology,
    #[serde(default)]
    pub properties: Properties,
}

impl VoltageLevel {
    pub fn is_node_breaker(&self) -> bool {
        matches!(self.topology, Topology::NodeBreaker { .. })
    }

    /// Returns the position of the given bus in the voltage level, for
    /// bus/breaker voltage levels.
    pub fn bus_index(&self, bus_id: &str) -> Option<u32> {
        match &self.topology {
            Topology::BusBreaker { buses } => buses
                .iter()
                .position(|b| b.id == bus_id)
                .map(|i| i as u32),
            Topology::NodeBreaker { .. } => None,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SwitchKind {
    #[default]
    Breaker,
    Disconnector,
    LoadBreakSwitch,
}

impl SwitchKind {
    pub fn class_name(&self) -> &'static str {
        match self {
            SwitchKind::Breaker => "Breaker",
            SwitchKind::Disconnector => "Disconnector",
            SwitchKind::LoadBreakSwitch => "LoadBreakSwitch",
        }
    }
}

/// The two ends of a switch.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SwitchEnds {
    Nodes(u32, u32),
    Buses(String, String),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Switch {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    pub voltage_level_id: String,
    #[serde(default)]
    pub kind: SwitchKind,
    #[serde(default)]
    pub open: bool,
    #[serde(default)]
    pub retained: bool,
    /// Fictitious switches are not exported on their own: they behave like
    /// internal connections.
    #[serde(default)]
    pub fictitious: bool,
    pub ends: SwitchEnds,
    #[serde(default)]
    pub properties: Properties,
}

impl Switch {
    /// Returns true if the switch is written as a piece of equipment.
    pub fn is_exported(&self) -> bool {
        !self.fictitious
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BusbarSection {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    pub terminal: Terminal,
    #[serde(default)]
    pub properties: Properties,
}

/// Splits the consumption of a load into a part that follows the system load
/// and a part that does not.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LoadDetail {
    pub fixed_active_power: f64,
    pub variable_active_power: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Load {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    pub terminal: Terminal,
    pub p0: f64,
    pub q0: f64,
    #[serde(default)]
    pub detail: Option<LoadDetail>,
    #[serde(default)]
    pub properties: Properties,
}

impl Load {
    /// Returns the class the load is written as.
    ///
    /// Loads that only follow the system load are conform loads, loads that
    /// don't follow it at all are non-conform loads.
    pub fn class_name(&self) -> &'static str {
        match self.detail {
            Some(d) if d.fixed_active_power == 0.0 && d.variable_active_power != 0.0 => {
                "ConformLoad"
            }
            Some(d) if d.fixed_active_power != 0.0 && d.variable_active_power == 0.0 => {
                "NonConformLoad"
            }
            _ => "EnergyConsumer",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CurvePoint {
    pub p: f64,
    pub min_q: f64,
    pub max_q: f64,
}

/// The reactive power limits of a generating piece of equipment.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReactiveLimits {
    MinMax { min_q: f64, max_q: f64 },
    Curve { points: Vec<CurvePoint> },
}

impl ReactiveLimits {
    pub fn kind(&self) -> &'static str {
        match self {
            ReactiveLimits::MinMax { .. } => "MinMax",
            ReactiveLimits::Curve { .. } => "Curve",
        }
    }
}

impl Default for ReactiveLimits {
    fn default() -> Self {
        ReactiveLimits::MinMax {
            min_q: -f64::MAX,
            max_q: f64::MAX,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum EnergySource {
    #[default]
    Other,
    Hydro,
    Nuclear,
    Thermal,
    Wind,
    Solar,
}

impl EnergySource {
    pub fn generating_unit_class(&self) -> &'static str {
        match self {
            EnergySource::Other => "GeneratingUnit",
            EnergySource::Hydro => "HydroGeneratingUnit",
            EnergySource::Nuclear => "NuclearGeneratingUnit",
            EnergySource::Thermal => "ThermalGeneratingUnit",
            EnergySource::Wind => "WindGeneratingUnit",
            EnergySource::Solar => "SolarGeneratingUnit",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Generator {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    pub terminal: Terminal,
    pub min_p: f64,
    pub max_p: f64,
    pub target_p: f64,
    #[serde(default)]
    pub target_q: f64,
    #[serde(default)]
    pub target_v: Option<f64>,
    #[serde(default)]
    pub voltage_regulator_on: bool,
    #[serde(default)]
    pub rated_s: Option<f64>,
    #[serde(default)]
    pub energy_source: EnergySource,
    #[serde(default)]
    pub reactive_limits: ReactiveLimits,
    /// Terminal whose voltage is regulated; the generator's own terminal when
    /// not set.
    #[serde(default)]
    pub regulating_terminal: Option<TerminalRef>,
    #[serde(default)]
    pub properties: Properties,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ShuntSection {
    pub b: f64,
    pub g: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ShuntModel {
    Linear { b_per_section: f64, g_per_section: f64 },
    /// Cumulative susceptance and conductance for each section count.
    NonLinear { sections: Vec<ShuntSection> },
}

impl ShuntModel {
    pub fn class_name(&self) -> &'static str {
        match self {
            ShuntModel::Linear { .. } => "LinearShuntCompensator",
            ShuntModel::NonLinear { .. } => "NonlinearShuntCompensator",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ShuntCompensator {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    pub terminal: Terminal,
    pub section_count: u32,
    pub maximum_section_count: u32,
    pub model: ShuntModel,
    #[serde(default)]
    pub voltage_regulator_on: bool,
    #[serde(default)]
    pub target_v: Option<f64>,
    #[serde(default)]
    pub regulating_terminal: Option<TerminalRef>,
    #[serde(default)]
    pub properties: Properties,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SvcRegulationMode {
    Voltage,
    ReactivePower,
    #[default]
    Off,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StaticVarCompensator {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    pub terminal: Terminal,
    pub b_min: f64,
    pub b_max: f64,
    #[serde(default)]
    pub regulation_mode: SvcRegulationMode,
    #[serde(default)]
    pub voltage_setpoint: Option<f64>,
    #[serde(default)]
    pub reactive_power_setpoint: Option<f64>,
    #[serde(default)]
    pub regulating_terminal: Option<TerminalRef>,
    #[serde(default)]
    pub properties: Properties,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TemporaryLimit {
    pub name: String,
    /// Seconds; `None` means the limit has no time restriction.
    #[serde(default)]
    pub acceptable_duration: Option<u32>,
    pub value: f64,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LoadingLimits {
    #[serde(default)]
    pub permanent_limit: Option<f64>,
    #[serde(default)]
    pub temporary_limits: Vec<TemporaryLimit>,
}

/// The limits attached to one side of a piece of equipment.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LimitsSet {
    #[serde(default)]
    pub active_power: Option<LoadingLimits>,
    #[serde(default)]
    pub apparent_power: Option<LoadingLimits>,
    #[serde(default)]
    pub current: Option<LoadingLimits>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Line {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    pub terminal1: Terminal,
    pub terminal2: Terminal,
    pub r: f64,
    pub x: f64,
    #[serde(default)]
    pub g1: f64,
    #[serde(default)]
    pub g2: f64,
    #[serde(default)]
    pub b1: f64,
    #[serde(default)]
    pub b2: f64,
    #[serde(default)]
    pub limits1: LimitsSet,
    #[serde(default)]
    pub limits2: LimitsSet,
    #[serde(default)]
    pub properties: Properties,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RatioTapChangerStep {
    pub rho: f64,
    #[serde(default)]
    pub r: f64,
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub g: f64,
    #[serde(default)]
    pub b: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RatioTapChanger {
    pub low_tap_position: i32,
    pub tap_position: i32,
    pub steps: Vec<RatioTapChangerStep>,
    #[serde(default)]
    pub regulating: bool,
    #[serde(default)]
    pub load_tap_changing_capabilities: bool,
    #[serde(default)]
    pub target_v: Option<f64>,
    /// Identifier of the regulating control this tap changer was imported
    /// with, if any.
    #[serde(default)]
    pub regulating_control_id: Option<String>,
    #[serde(default)]
    pub regulation_terminal: Option<TerminalRef>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PhaseRegulationMode {
    CurrentLimiter,
    ActivePowerControl,
    #[default]
    FixedTap,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PhaseTapChangerStep {
    pub rho: f64,
    pub alpha: f64,
    #[serde(default)]
    pub r: f64,
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub g: f64,
    #[serde(default)]
    pub b: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PhaseTapChanger {
    pub low_tap_position: i32,
    pub tap_position: i32,
    pub steps: Vec<PhaseTapChangerStep>,
    #[serde(default)]
    pub regulation_mode: PhaseRegulationMode,
    #[serde(default)]
    pub regulating: bool,
    #[serde(default)]
    pub regulation_value: Option<f64>,
    #[serde(default)]
    pub regulating_control_id: Option<String>,
    #[serde(default)]
    pub regulation_terminal: Option<TerminalRef>,
}

/// Common accessors of the two kinds of tap changers.
pub trait TapChanger {
    fn low_tap_position(&self) -> i32;
    fn tap_position(&self) -> i32;
    fn step_count(&self) -> usize;

    fn high_tap_position(&self) -> i32 {
        self.low_tap_position() + self.step_count() as i32 - 1
    }
}

impl TapChanger for RatioTapChanger {
    fn low_tap_position(&self) -> i32 {
        self.low_tap_position
    }

    fn tap_position(&self) -> i32 {
        self.tap_position
    }

    fn step_count(&self) -> usize {
        self.steps.len()
    }
}

impl TapChanger for PhaseTapChanger {
    fn low_tap_position(&self) -> i32 {
        self.low_tap_position
    }

    fn tap_position(&self) -> i32 {
        self.tap_position
    }

    fn step_count(&self) -> usize {
        self.steps.len()
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TwoWindingsTransformer {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub substation_id: Option<String>,
    pub terminal1: Terminal,
    pub terminal2: Terminal,
    pub r: f64,
    pub x: f64,
    #[serde(default)]
    pub g: f64,
    #[serde(default)]
    pub b: f64,
    pub rated_u1: f64,
    pub rated_u2: f64,
    #[serde(default)]
    pub rated_s: Option<f64>,
    #[serde(default)]
    pub ratio_tap_changer: Option<RatioTapChanger>,
    #[serde(default)]
    pub phase_tap_changer: Option<PhaseTapChanger>,
    #[serde(default)]
    pub limits1: LimitsSet,
    #[serde(default)]
    pub limits2: LimitsSet,
    #[serde(default)]
    pub properties: Properties,
}

/// One winding of a three-winding transformer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Leg {
    pub terminal: Terminal,
    pub r: f64,
    pub x: f64,
    #[serde(default)]
    pub g: f64,
    #[serde(default)]
    pub b: f64,
    pub rated_u: f64,
    #[serde(default)]
    pub rated_s: Option<f64>,
    #[serde(default)]
    pub ratio_tap_changer: Option<RatioTapChanger>,
    #[serde(default)]
    pub phase_tap_changer: Option<PhaseTapChanger>,
    #[serde(default)]
    pub limits: LimitsSet,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ThreeWindingsTransformer {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub substation_id: Option<String>,
    pub legs: [Leg; 3],
    #[serde(default)]
    pub properties: Properties,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DanglingLineGeneration {
    pub min_p: f64,
    pub max_p: f64,
    pub target_p: f64,
    #[serde(default)]
    pub target_q: f64,
    #[serde(default)]
    pub target_v: Option<f64>,
    #[serde(default)]
    pub voltage_regulation_on: bool,
    #[serde(default)]
    pub reactive_limits: ReactiveLimits,
}

/// A line with one side in the network and the other side at a boundary
/// point.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DanglingLine {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    pub terminal: Terminal,
    pub r: f64,
    pub x: f64,
    #[serde(default)]
    pub g: f64,
    #[serde(default)]
    pub b: f64,
    #[serde(default)]
    pub p0: f64,
    #[serde(default)]
    pub q0: f64,
    #[serde(default)]
    pub generation: Option<DanglingLineGeneration>,
    #[serde(default)]
    pub ucte_xnode_code: Option<String>,
    #[serde(default)]
    pub limits: LimitsSet,
    #[serde(default)]
    pub properties: Properties,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ControlArea {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub energy_identification_code: Option<String>,
    #[serde(default)]
    pub net_interchange: Option<f64>,
    /// Terminals where tie flows are measured.
    #[serde(default)]
    pub terminals: Vec<TerminalRef>,
    /// Ids of the connectables whose boundary side is a tie flow.
    #[serde(default)]
    pub boundaries: Vec<String>,
    #[serde(default)]
    pub properties: Properties,
}

impl_identifiable!(
    Substation,
    Bus,
    VoltageLevel,
    Switch,
    BusbarSection,
    Load,
    Generator,
    ShuntCompensator,
    StaticVarCompensator,
    Line,
    TwoWindingsTransformer,
    ThreeWindingsTransformer,
    DanglingLine,
    ControlArea,
);
