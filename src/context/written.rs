// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! Bookkeeping of the shared objects already written to each document.

use std::collections::HashSet;

use crate::Profile;

/// Objects that several pieces of equipment can refer to, and that must be
/// written only once per document.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SharedObject {
    BaseVoltage,
    GeographicalRegion,
    SubGeographicalRegion,
    GeneratingUnit,
    RegulatingControl,
    LoadGroup,
    ReactiveCapabilityCurve,
    OperationalLimitType,
}

#[derive(Clone, Debug, Default)]
pub(crate) struct WrittenObjects {
    written: HashSet<(Profile, SharedObject, String)>,
}

impl WrittenObjects {
    /// Marks the object as written to the document, and returns true if it
    /// was not written before.
    pub(crate) fn mark(&mut self, profile: Profile, kind: SharedObject, id: &str) -> bool {
        self.written.insert((profile, kind, id.to_string()))
    }

    /// Returns the number of objects of a kind written to the document.
    pub(crate) fn count(&self, profile: Profile, kind: SharedObject) -> usize {
        self.written
            .iter()
            .filter(|(p, k, _)| *p == profile && *k == kind)
            .count()
    }
}
