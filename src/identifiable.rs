// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! This module contains the trait implemented by every network object that
//! has an identifier of its own.

use std::collections::BTreeMap;

/**
This trait is implemented by every object of the network model that carries an
internal identifier, an optional name and free-form properties.

The naming strategy only sees objects through this trait, so any type that
implements it can be given an external identifier.

<details>
<summary>Example implementation:</summary>

```
use std::collections::BTreeMap;
use cgmes_topology_export::Identifiable;

struct Region {
    code: String,
    label: Option<String>,
    properties: BTreeMap<String, String>,
}

impl Identifiable for Region {
    fn id(&self) -> &str {
        &self.code
    }

    fn name(&self) -> Option<&str> {
        self.label.as_deref()
    }

    fn properties(&self) -> &BTreeMap<String, String> {
        &self.properties
    }
}
```

</details>
*/
pub trait Identifiable {
    /// Returns the internal identifier of the object.
    fn id(&self) -> &str;
    /// Returns the human readable name of the object, if it has one.
    fn name(&self) -> Option<&str>;
    /// Returns the properties attached to the object.
    fn properties(&self) -> &BTreeMap<String, String>;

    /// Returns the name of the object, falling back to its identifier.
    fn name_or_id(&self) -> &str {
        self.name().unwrap_or_else(|| self.id())
    }

    /// Returns the value of the given property, if it is set.
    fn property(&self, key: &str) -> Option<&str> {
        self.properties().get(key).map(String::as_str)
    }
}

/// Implements [`Identifiable`] for structs with `id`, `name` and `properties`
/// fields.
macro_rules! impl_identifiable {
    ($($ty:ty),* $(,)?) => {
        $(
            impl $crate::Identifiable for $ty {
                fn id(&self) -> &str {
                    &self.id
                }

                fn name(&self) -> Option<&str> {
                    self.name.as_deref()
                }

                fn properties(&self) -> &std::collections::BTreeMap<String, String> {
                    &self.properties
                }
            }
        )*
    };
}

pub(crate) use impl_identifiable;
