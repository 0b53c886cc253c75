// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! Turns the internal identifiers of network objects into external ones.
//!
//! Every identifier written during an export is obtained here, so that the
//! same object always gets the same identifier within a session, and so that
//! no two objects share one.

mod alias;
pub(crate) mod encoding;
mod generator;
mod id_mapping;

pub use alias::{AliasEntry, AliasType};
pub use id_mapping::{IdKind, IdMapping};

use alias::AliasTable;
use encoding::{encode_id, is_valid_id};
use generator::IdGenerator;

use crate::{Error, ExportConfig, Identifiable, Network, NamingStrategyKind};

/// Hands out the external identifiers of one export session.
///
/// With the [`Identity`][NamingStrategyKind::Identity] kind, internal
/// identifiers are used as they are when they are valid, and encoded
/// otherwise.  The [`Fixed`][NamingStrategyKind::Fixed] kind first looks
/// keys up in the id mapping table of a previous export.
///
/// Objects that are derived during the export, and have no identifier of
/// their own, get generated identifiers.
#[derive(Clone, Debug)]
pub struct NamingStrategy {
    kind: NamingStrategyKind,
    encode_ids: bool,
    generator: IdGenerator,
    aliases: AliasTable,
    seed: IdMapping,
    mapping: IdMapping,
}

/// Construction.
impl NamingStrategy {
    /// Creates an identity naming strategy for the given network.
    ///
    /// Fails if the network carries malformed aliases.
    pub fn identity(config: &ExportConfig, network: &Network) -> Result<Self, Error> {
        Ok(Self {
            kind: NamingStrategyKind::Identity,
            encode_ids: config.encode_ids,
            generator: IdGenerator::new(config.id_generation, &network.id),
            aliases: AliasTable::try_from_entries(&network.aliases)?,
            seed: IdMapping::new(),
            mapping: IdMapping::new(),
        })
    }

    /// Creates a fixed naming strategy, seeded with the id mapping table of a
    /// previous export.
    pub fn fixed(config: &ExportConfig, network: &Network, seed: IdMapping) -> Result<Self, Error> {
        Ok(Self {
            kind: NamingStrategyKind::Fixed,
            seed,
            ..Self::identity(config, network)?
        })
    }

    /// Creates the naming strategy selected in the config.
    ///
    /// A fixed strategy without a seed behaves like the identity strategy.
    pub fn from_config(
        config: &ExportConfig,
        network: &Network,
        seed: Option<IdMapping>,
    ) -> Result<Self, Error> {
        match config.naming_strategy {
            NamingStrategyKind::Identity => Self::identity(config, network),
            NamingStrategyKind::Fixed => Self::fixed(config, network, seed.unwrap_or_default()),
        }
    }

    pub fn kind(&self) -> NamingStrategyKind {
        self.kind
    }
}

/// Identifier lookup.
impl NamingStrategy {
    /// Returns the external identifier of the given object.
    pub fn cgmes_id(&mut self, object: &dyn Identifiable) -> Result<String, Error> {
        self.cgmes_id_for_str(object.id())
    }

    /// Returns the external identifier for the given internal key.
    ///
    /// Valid keys are used as they are, and invalid ones are encoded.  When
    /// the result is already the identifier of another key, a generated
    /// identifier is used instead.
    ///
    /// Fails if the key is not a valid identifier and encoding is disabled.
    pub fn cgmes_id_for_str(&mut self, key: &str) -> Result<String, Error> {
        self.resolve(IdKind::Object, key, |naming| {
            let id = naming.to_external(key)?;
            if !naming.mapping.is_used(&id) && !naming.seed.is_used(&id) {
                return Ok(id);
            }
            let generated = naming.generator.generate(IdKind::Object, key);
            tracing::warn!(
                "Identifier {id} of {key} is already used, {generated} is used instead."
            );
            Ok(generated)
        })
    }

    /// Returns the external identifier recorded as the given alias of the
    /// object.
    ///
    /// When the object has no such alias, an identifier is generated and
    /// recorded as the alias, so that later lookups agree.
    pub fn cgmes_id_from_alias(
        &mut self,
        object: &dyn Identifiable,
        alias_type: AliasType,
    ) -> Result<String, Error> {
        let object_id = object.id();
        let key = format!("{object_id}_{alias_type}");
        let id = self.resolve(IdKind::Alias, &key, |naming| match naming.aliases.get(object_id, alias_type) {
            Some(value) => naming.to_external(value),
            None => Ok(naming.generator.generate(IdKind::Alias, &key)),
        })?;
        if self.aliases.get(object_id, alias_type).is_none() {
            self.aliases.insert(object_id, alias_type, &id)?;
        }
        Ok(id)
    }

    /// Returns the external identifier stored in the given property of the
    /// object, or a generated one when the property is not set.
    ///
    /// Objects whose property holds the same value share the identifier.
    pub fn cgmes_id_from_property(
        &mut self,
        object: &dyn Identifiable,
        property: &str,
    ) -> Result<String, Error> {
        match object.property(property) {
            Some(value) => self.cgmes_id_for_str(value),
            None => self.derived_id(&format!("{}_{property}", object.id())),
        }
    }

    /// Returns a generated identifier for an object that only exists in the
    /// exported documents.
    pub fn derived_id(&mut self, key: &str) -> Result<String, Error> {
        self.resolve(IdKind::Derived, key, |naming| {
            Ok(naming.generator.generate(IdKind::Derived, key))
        })
    }

    /// Returns a generated identifier for a connectivity or topological
    /// node, keyed by its canonical member.
    pub fn node_id(&mut self, key: &str) -> Result<String, Error> {
        self.resolve(IdKind::Node, key, |naming| {
            Ok(naming.generator.generate(IdKind::Node, key))
        })
    }

    /// Returns the alias of the given type recorded for an object, if any.
    pub fn alias(&self, object_id: &str, alias_type: AliasType) -> Option<&str> {
        self.aliases.get(object_id, alias_type)
    }

    /// Records an alias for an object.
    pub fn record_alias(
        &mut self,
        object_id: &str,
        alias_type: AliasType,
        value: &str,
    ) -> Result<(), Error> {
        self.aliases.insert(object_id, alias_type, value)
    }

    /// Returns the aliases known after the export, including the ones
    /// generated during it.
    pub fn aliases(&self) -> impl Iterator<Item = AliasEntry> + '_ {
        self.aliases.entries()
    }

    /// Returns the identifiers handed out so far.
    pub fn id_mapping(&self) -> &IdMapping {
        &self.mapping
    }

    pub fn into_id_mapping(self) -> IdMapping {
        self.mapping
    }

    fn resolve(
        &mut self,
        kind: IdKind,
        key: &str,
        make: impl FnOnce(&Self) -> Result<String, Error>,
    ) -> Result<String, Error> {
        if let Some(id) = self.mapping.external_id(kind, key) {
            return Ok(id.to_string());
        }
        let id = match self.seed.external_id(kind, key) {
            Some(id) => id.to_string(),
            None => make(self)?,
        };
        self.mapping.insert(kind, key, &id)?;
        Ok(id)
    }

    fn to_external(&self, value: &str) -> Result<String, Error> {
        if is_valid_id(value) {
            Ok(value.to_string())
        } else if self.encode_ids {
            Ok(encode_id(value))
        } else {
            Err(Error::id_generation(format!(
                "{value} is not a valid identifier and encoding is disabled."
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::NetworkBuilder;

    fn network() -> Network {
        let mut builder = NetworkBuilder::new("N");
        let vl = builder.node_breaker_vl("S1", "VL1", 400.0);
        builder.load("LD 1", vl, 1);
        builder
            .generator("GEN1", vl, 2)
            .properties
            .insert("GeneratingUnit".to_string(), "_GU1".to_string());
        builder.dangling_line("DL1", vl, 3);
        builder.alias("DL1", AliasType::TerminalBoundary, "_DL1_TB");
        builder.build()
    }

    #[test]
    fn test_identity() -> Result<(), Error> {
        let network = network();
        let mut naming = NamingStrategy::identity(&ExportConfig::default(), &network)?;

        assert_eq!(naming.cgmes_id(&network.voltage_levels[0])?, "VL1");
        assert_eq!(naming.cgmes_id(&network.loads[0])?, "_LD.201");
        assert_eq!(naming.cgmes_id(&network.loads[0])?, "_LD.201");
        assert_eq!(naming.cgmes_id_for_str("VL1_1_CN")?, "VL1_1_CN");

        let config = ExportConfig {
            encode_ids: false,
            ..Default::default()
        };
        let mut naming = NamingStrategy::identity(&config, &network)?;
        assert!(naming.cgmes_id(&network.loads[0]).is_err_and(|e| e
            == Error::id_generation(
                "LD 1 is not a valid identifier and encoding is disabled."
            )));
        Ok(())
    }

    #[test]
    fn test_aliases() -> Result<(), Error> {
        let network = network();
        let dl = &network.dangling_lines[0];
        let mut naming = NamingStrategy::identity(&ExportConfig::default(), &network)?;

        assert_eq!(
            naming.cgmes_id_from_alias(dl, AliasType::TerminalBoundary)?,
            "_DL1_TB"
        );

        assert_eq!(naming.alias("DL1", AliasType::ConnectivityNodeBoundary), None);
        let cn = naming.cgmes_id_from_alias(dl, AliasType::ConnectivityNodeBoundary)?;
        assert!(cn.starts_with('_'));
        assert_eq!(
            naming.alias("DL1", AliasType::ConnectivityNodeBoundary),
            Some(cn.as_str())
        );
        assert_eq!(
            naming.cgmes_id_from_alias(dl, AliasType::ConnectivityNodeBoundary)?,
            cn
        );
        assert_eq!(naming.aliases().count(), 2);
        Ok(())
    }

    #[test]
    fn test_properties() -> Result<(), Error> {
        let network = network();
        let mut naming = NamingStrategy::identity(&ExportConfig::default(), &network)?;

        let generator = &network.generators[0];
        assert_eq!(naming.cgmes_id_from_property(generator, "GeneratingUnit")?, "_GU1");
        let rc = naming.cgmes_id_from_property(generator, "RegulatingControl")?;
        assert_eq!(naming.cgmes_id_from_property(generator, "RegulatingControl")?, rc);
        assert_ne!(rc, naming.cgmes_id_from_property(&network.loads[0], "RegulatingControl")?);

        let mut other = network.generators[0].clone();
        other.id = "GEN2".to_string();
        assert_eq!(naming.cgmes_id_from_property(&other, "GeneratingUnit")?, "_GU1");
        Ok(())
    }

    #[test]
    fn test_stable_across_sessions() -> Result<(), Error> {
        let network = network();
        let config = ExportConfig::default();

        let mut first = NamingStrategy::identity(&config, &network)?;
        let mut second = NamingStrategy::identity(&config, &network)?;
        assert_eq!(first.derived_id("VL1_NODE")?, second.derived_id("VL1_NODE")?);
        assert_ne!(first.derived_id("VL1_NODE")?, first.derived_id("VL2_NODE")?);
        Ok(())
    }

    #[test]
    fn test_fixed() -> Result<(), Error> {
        let network = network();
        let config = ExportConfig {
            id_generation: crate::IdGenerationPolicy::Random,
            naming_strategy: NamingStrategyKind::Fixed,
            ..Default::default()
        };

        let mut first = NamingStrategy::from_config(&config, &network, None)?;
        let node = first.derived_id("VL1_NODE")?;
        let load = first.cgmes_id(&network.loads[0])?;

        let mut second =
            NamingStrategy::from_config(&config, &network, Some(first.into_id_mapping()))?;
        assert_eq!(second.kind(), NamingStrategyKind::Fixed);
        assert_eq!(second.derived_id("VL1_NODE")?, node);
        assert_eq!(second.cgmes_id(&network.loads[0])?, load);
        assert_eq!(second.cgmes_id(&network.voltage_levels[0])?, "VL1");
        Ok(())
    }

    #[test]
    fn test_taken_identifiers() -> Result<(), Error> {
        let mut builder = NetworkBuilder::new("N");
        let vl = builder.node_breaker_vl("S1", "VL1", 400.0);
        builder.load("1LD", vl, 1);
        builder.load("_1LD", vl, 2);
        let network = builder.build();
        let mut naming = NamingStrategy::identity(&ExportConfig::default(), &network)?;

        // "1LD" is encoded into the identifier of "_1LD".
        assert_eq!(naming.cgmes_id(&network.loads[0])?, "_1LD");
        let other = naming.cgmes_id(&network.loads[1])?;
        assert_ne!(other, "_1LD");
        assert_eq!(naming.cgmes_id(&network.loads[1])?, other);
        assert_eq!(
            naming.id_mapping().internal_id(&other),
            Some((IdKind::Object, "_1LD"))
        );
        Ok(())
    }

    #[test]
    fn test_key_kinds() -> Result<(), Error> {
        let network = network();
        let mut naming = NamingStrategy::identity(&ExportConfig::default(), &network)?;

        let object = naming.cgmes_id_for_str("VL1_1_CN")?;
        let derived = naming.derived_id("VL1_1_CN")?;
        let node = naming.node_id("VL1_1_CN")?;
        assert_eq!(object, "VL1_1_CN");
        assert_ne!(derived, object);
        assert_ne!(node, object);
        assert_ne!(node, derived);
        assert_eq!(naming.id_mapping().len(), 3);
        Ok(())
    }

    #[test]
    fn test_seeded_collision() -> Result<(), Error> {
        let network = network();
        let mut seed = IdMapping::new();
        seed.insert(IdKind::Derived, "VL1_NODE", "_LD.201")?;
        let mut naming = NamingStrategy::fixed(&ExportConfig::default(), &network, seed)?;

        // The encoded identifier of the load is recorded for another key.
        let load = naming.cgmes_id(&network.loads[0])?;
        assert_ne!(load, "_LD.201");
        assert_eq!(naming.derived_id("VL1_NODE")?, "_LD.201");

        // A seeded identifier can't be given to a second key.
        let mut seed = IdMapping::new();
        seed.insert(IdKind::Derived, "VL1_NODE", "_N1")?;
        seed.insert(IdKind::Derived, "VL2_NODE", "_N2")?;
        let mut naming = NamingStrategy::fixed(&ExportConfig::default(), &network, seed)?;
        naming.derived_id("VL1_NODE")?;
        naming.record_alias("DL1", AliasType::EquivalentInjection, "_N1")?;
        assert!(naming
            .cgmes_id_from_alias(&network.dangling_lines[0], AliasType::EquivalentInjection)
            .is_err_and(|e| e.kind() == crate::ErrorKind::IdGeneration));
        Ok(())
    }
}
