// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! This module contains the configuration options for an export session.

use std::collections::BTreeSet;
use std::fmt::Display;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::Error;

/// One of the linked documents produced by an export session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Profile {
    /// Equipment.
    #[serde(rename = "EQ")]
    Equipment,
    /// Topology.
    #[serde(rename = "TP")]
    Topology,
    /// Steady state hypothesis.
    #[serde(rename = "SSH")]
    SteadyStateHypothesis,
    /// State variables.
    #[serde(rename = "SV")]
    StateVariables,
}

impl Profile {
    /// All profiles, in the order they are written.
    pub const ALL: [Profile; 4] = [
        Profile::Equipment,
        Profile::Topology,
        Profile::SteadyStateHypothesis,
        Profile::StateVariables,
    ];

    /// Returns the short name of the profile, as used in file names.
    pub fn short_name(&self) -> &'static str {
        match self {
            Profile::Equipment => "EQ",
            Profile::Topology => "TP",
            Profile::SteadyStateHypothesis => "SSH",
            Profile::StateVariables => "SV",
        }
    }
}

impl Display for Profile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.short_name())
    }
}

impl FromStr for Profile {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Profile::ALL
            .into_iter()
            .find(|p| p.short_name().eq_ignore_ascii_case(s))
            .ok_or_else(|| Error::invalid_config(format!("Unknown profile: {s}")))
    }
}

/// Selects how internal identifiers are turned into external ones.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NamingStrategyKind {
    /// Internal identifiers and aliases are used as they are, as long as they
    /// are valid external identifiers.
    #[default]
    Identity,
    /// Identifiers recorded in the id mapping table of a previous export are
    /// reused; everything else is handled as in `Identity`.
    Fixed,
}

impl Display for NamingStrategyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NamingStrategyKind::Identity => write!(f, "identity"),
            NamingStrategyKind::Fixed => write!(f, "fixed"),
        }
    }
}

impl FromStr for NamingStrategyKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "identity" => Ok(NamingStrategyKind::Identity),
            "fixed" => Ok(NamingStrategyKind::Fixed),
            _ => Err(Error::invalid_config(format!(
                "Unknown naming strategy: {s}"
            ))),
        }
    }
}

/// How identifiers are generated for objects that have no identifier of their
/// own.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IdGenerationPolicy {
    /// Name based UUIDs derived from the network id and the object's key, so
    /// that exporting the same network twice gives the same identifiers.
    #[default]
    NameBased,
    /// Random UUIDs.
    Random,
}

/// Configuration options for an export session.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ExportConfig {
    /// Whether transformer ends are numbered by descending nominal voltage
    /// instead of by their side in the network model.
    pub export_transformers_with_highest_voltage_at_end1: bool,

    /// The naming strategy to use.
    pub naming_strategy: NamingStrategyKind,

    /// The profiles to write.
    pub profiles: BTreeSet<Profile>,

    /// Whether identifiers that are not valid external identifiers are
    /// encoded.  When this is `false`, such identifiers fail the export.
    pub encode_ids: bool,

    /// How missing identifiers are generated.
    pub id_generation: IdGenerationPolicy,

    /// Whether connectivity nodes and their terminals are written to the
    /// equipment profile.
    pub write_connectivity_nodes: bool,

    /// The modeling authority set written in the document headers.
    pub modeling_authority_set: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            export_transformers_with_highest_voltage_at_end1: false,
            naming_strategy: NamingStrategyKind::default(),
            profiles: Profile::ALL.into_iter().collect(),
            encode_ids: true,
            id_generation: IdGenerationPolicy::default(),
            write_connectivity_nodes: true,
            modeling_authority_set: String::from("powsybl.org"),
        }
    }
}

impl ExportConfig {
    /// Returns true if the given profile is to be written.
    pub fn exports(&self, profile: Profile) -> bool {
        self.profiles.contains(&profile)
    }

    /// Replaces the profiles to write with the given comma separated list.
    pub fn with_profiles(mut self, profiles: &str) -> Result<Self, Error> {
        self.profiles = profiles
            .split(',')
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(Profile::from_str)
            .collect::<Result<_, _>>()?;
        Ok(self)
    }
}
