// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! The interface between the export and the physical document writer.

mod recording;

pub use recording::{Document, Element, RecordingSink, RecordingWriter};

use crate::{Error, Profile};

/**
This trait is implemented by the writers of the documents produced by an
export.

The export only describes elements: a class, an identifier, and a flat list of
attributes and references to other elements.  Elements are never nested.  The
concrete grammar of the output is up to the implementation.

Elements started with [`start_element`][DocumentWriter::start_element] define
a new object.  Elements started with [`start_about`][DocumentWriter::start_about]
add information to an object defined in another document of the same export.

<details>
<summary>Example implementation:</summary>

```
use cgmes_topology_export::{DocumentWriter, Error, Profile};

/// Writes one line per element.
#[derive(Default)]
struct LineWriter {
    lines: Vec<String>,
}

impl DocumentWriter for LineWriter {
    fn start_document(&mut self, profile: Profile, network_id: &str) -> Result<(), Error> {
        self.lines.push(format!("# {network_id} {profile}"));
        Ok(())
    }

    fn start_element(&mut self, class: &str, id: &str) -> Result<(), Error> {
        self.lines.push(format!("{class} {id}"));
        Ok(())
    }

    fn start_about(&mut self, class: &str, id: &str) -> Result<(), Error> {
        self.lines.push(format!("{class} about {id}"));
        Ok(())
    }

    fn attribute(&mut self, name: &str, value: &str) -> Result<(), Error> {
        if let Some(line) = self.lines.last_mut() {
            line.push_str(&format!(" {name}={value}"));
        }
        Ok(())
    }

    fn reference(&mut self, name: &str, target_id: &str) -> Result<(), Error> {
        if let Some(line) = self.lines.last_mut() {
            line.push_str(&format!(" {name}->{target_id}"));
        }
        Ok(())
    }

    fn end_element(&mut self) -> Result<(), Error> {
        Ok(())
    }

    fn end_document(&mut self) -> Result<(), Error> {
        Ok(())
    }
}
```

</details>
*/
pub trait DocumentWriter {
    /// Starts the document of the given profile.
    fn start_document(&mut self, profile: Profile, network_id: &str) -> Result<(), Error>;

    /// Starts an element that defines the object with the given id.
    fn start_element(&mut self, class: &str, id: &str) -> Result<(), Error>;

    /// Starts an element that describes an object defined elsewhere.
    fn start_about(&mut self, class: &str, id: &str) -> Result<(), Error>;

    /// Adds a literal attribute to the current element.
    fn attribute(&mut self, name: &str, value: &str) -> Result<(), Error>;

    /// Adds a reference to another object to the current element.
    fn reference(&mut self, name: &str, target_id: &str) -> Result<(), Error>;

    /// Ends the current element.
    fn end_element(&mut self) -> Result<(), Error>;

    /// Ends the document.
    fn end_document(&mut self) -> Result<(), Error>;

    /// Adds a numeric attribute to the current element.
    fn float(&mut self, name: &str, value: f64) -> Result<(), Error> {
        self.attribute(name, &value.to_string())
    }

    /// Adds an integer attribute to the current element.
    fn integer(&mut self, name: &str, value: i64) -> Result<(), Error> {
        self.attribute(name, &value.to_string())
    }

    /// Adds a boolean attribute to the current element.
    fn boolean(&mut self, name: &str, value: bool) -> Result<(), Error> {
        self.attribute(name, if value { "true" } else { "false" })
    }

    /// Starts an element for an identified object and writes its name.
    fn start_identified(&mut self, class: &str, id: &str, name: &str) -> Result<(), Error> {
        self.start_element(class, id)?;
        self.attribute("IdentifiedObject.name", name)
    }
}

/// Hands out one writer per profile written by an export.
pub trait DocumentSink {
    fn writer(&mut self, profile: Profile) -> Result<&mut dyn DocumentWriter, Error>;
}
