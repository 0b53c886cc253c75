// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! Generation of identifiers for objects that have none of their own.

use uuid::Uuid;

use crate::IdGenerationPolicy;

use super::IdKind;

/// Generates `_`-prefixed UUID identifiers.
#[derive(Clone, Debug)]
pub(crate) struct IdGenerator {
    policy: IdGenerationPolicy,
    namespace: Uuid,
}

impl IdGenerator {
    /// Creates a generator whose name-based identifiers are scoped to the
    /// given network.
    pub(crate) fn new(policy: IdGenerationPolicy, network_id: &str) -> Self {
        Self {
            policy,
            namespace: Uuid::new_v5(&Uuid::NAMESPACE_OID, network_id.as_bytes()),
        }
    }

    /// Generates the identifier for the given key.
    ///
    /// With the name-based policy the same key always gives the same
    /// identifier.  Keys of different kinds give different identifiers.
    pub(crate) fn generate(&self, kind: IdKind, key: &str) -> String {
        let uuid = match self.policy {
            IdGenerationPolicy::NameBased => {
                Uuid::new_v5(&self.namespace, format!("{kind}/{key}").as_bytes())
            }
            IdGenerationPolicy::Random => Uuid::new_v4(),
        };
        format!("_{uuid}")
    }
}
