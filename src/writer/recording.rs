// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! An in-memory document writer, that records the elements it is given.

use std::collections::BTreeMap;

use crate::{Error, Profile};

use super::{DocumentSink, DocumentWriter};

/// A recorded element.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Element {
    pub class: String,
    pub id: String,
    /// Whether the element describes an object defined in another document.
    pub about: bool,
    pub attributes: Vec<(String, String)>,
    pub references: Vec<(String, String)>,
}

impl Element {
    /// Returns the value of the first attribute with the given name.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Returns the target of the first reference with the given name.
    pub fn reference(&self, name: &str) -> Option<&str> {
        self.references
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Returns the name written for the element.
    pub fn name(&self) -> Option<&str> {
        self.attribute("IdentifiedObject.name")
    }
}

/// A recorded document.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Document {
    pub profile: Option<Profile>,
    pub network_id: String,
    pub elements: Vec<Element>,
    pub complete: bool,
}

impl Document {
    /// Returns an iterator over the elements of the given class.
    pub fn elements_of<'a>(&'a self, class: &'a str) -> impl Iterator<Item = &'a Element> {
        self.elements.iter().filter(move |e| e.class == class)
    }

    /// Returns the element with the given id.
    pub fn element(&self, id: &str) -> Option<&Element> {
        self.elements.iter().find(|e| e.id == id)
    }

    /// Returns the element of the given class with the given name.
    pub fn named<'a>(&'a self, class: &'a str, name: &str) -> Option<&'a Element> {
        self.elements_of(class).find(move |e| e.name() == Some(name))
    }
}

/// A [`DocumentWriter`] that keeps everything it is given in a [`Document`].
#[derive(Debug, Default)]
pub struct RecordingWriter {
    document: Document,
    current: Option<Element>,
}

impl RecordingWriter {
    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn into_document(self) -> Document {
        self.document
    }

    fn start(&mut self, class: &str, id: &str, about: bool) -> Result<(), Error> {
        if let Some(current) = &self.current {
            return Err(Error::writer(format!(
                "Can't start element {id} inside element {}.",
                current.id
            )));
        }
        if self.document.profile.is_none() || self.document.complete {
            return Err(Error::writer(format!(
                "Can't start element {id} outside of a document."
            )));
        }
        self.current = Some(Element {
            class: class.to_string(),
            id: id.to_string(),
            about,
            ..Default::default()
        });
        Ok(())
    }

    fn current(&mut self) -> Result<&mut Element, Error> {
        self.current
            .as_mut()
            .ok_or_else(|| Error::writer("No element has been started."))
    }
}

impl DocumentWriter for RecordingWriter {
    fn start_document(&mut self, profile: Profile, network_id: &str) -> Result<(), Error> {
        if self.document.profile.is_some() {
            return Err(Error::writer(format!(
                "Document {profile} has already been started."
            )));
        }
        self.document.profile = Some(profile);
        self.document.network_id = network_id.to_string();
        Ok(())
    }

    fn start_element(&mut self, class: &str, id: &str) -> Result<(), Error> {
        self.start(class, id, false)
    }

    fn start_about(&mut self, class: &str, id: &str) -> Result<(), Error> {
        self.start(class, id, true)
    }

    fn attribute(&mut self, name: &str, value: &str) -> Result<(), Error> {
        self.current()?
            .attributes
            .push((name.to_string(), value.to_string()));
        Ok(())
    }

    fn reference(&mut self, name: &str, target_id: &str) -> Result<(), Error> {
        self.current()?
            .references
            .push((name.to_string(), target_id.to_string()));
        Ok(())
    }

    fn end_element(&mut self) -> Result<(), Error> {
        let element = self
            .current
            .take()
            .ok_or_else(|| Error::writer("No element has been started."))?;
        self.document.elements.push(element);
        Ok(())
    }

    fn end_document(&mut self) -> Result<(), Error> {
        if let Some(current) = &self.current {
            return Err(Error::writer(format!(
                "Element {} has not been ended.",
                current.id
            )));
        }
        self.document.complete = true;
        tracing::debug!(
            "Recorded {} elements in document {:?}.",
            self.document.elements.len(),
            self.document.profile
        );
        Ok(())
    }
}

/// A [`DocumentSink`] that records every document in memory.
#[derive(Debug, Default)]
pub struct RecordingSink {
    writers: BTreeMap<Profile, RecordingWriter>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the recorded document of the given profile, if it was written.
    pub fn document(&self, profile: Profile) -> Option<&Document> {
        self.writers.get(&profile).map(RecordingWriter::document)
    }

    /// Returns the profiles that were written, in order.
    pub fn profiles(&self) -> impl Iterator<Item = Profile> + '_ {
        self.writers.keys().copied()
    }
}

impl DocumentSink for RecordingSink {
    fn writer(&mut self, profile: Profile) -> Result<&mut dyn DocumentWriter, Error> {
        Ok(self.writers.entry(profile).or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording() -> Result<(), Error> {
        let mut writer = RecordingWriter::default();
        writer.start_document(Profile::Equipment, "N")?;
        writer.start_identified("Substation", "S1", "Station 1")?;
        writer.reference("Substation.Region", "_SGR")?;
        writer.end_element()?;
        writer.start_element("BaseVoltage", "_BV")?;
        writer.float("BaseVoltage.nominalVoltage", 400.0)?;
        writer.end_element()?;
        writer.end_document()?;

        let document = writer.document();
        assert!(document.complete);
        assert_eq!(document.elements.len(), 2);
        let substation = document.named("Substation", "Station 1").unwrap();
        assert_eq!(substation.reference("Substation.Region"), Some("_SGR"));
        assert_eq!(
            document.element("_BV").unwrap().attribute("BaseVoltage.nominalVoltage"),
            Some("400")
        );
        Ok(())
    }

    #[test]
    fn test_misuse() -> Result<(), Error> {
        let mut writer = RecordingWriter::default();
        assert!(writer
            .start_element("Substation", "S1")
            .is_err_and(|e| e == Error::writer("Can't start element S1 outside of a document.")));

        writer.start_document(Profile::Topology, "N")?;
        writer.start_element("TopologicalNode", "TN1")?;
        assert!(writer
            .start_element("TopologicalNode", "TN2")
            .is_err_and(|e| e == Error::writer("Can't start element TN2 inside element TN1.")));
        assert!(writer
            .end_document()
            .is_err_and(|e| e == Error::writer("Element TN1 has not been ended.")));
        writer.end_element()?;
        assert!(writer
            .end_element()
            .is_err_and(|e| e == Error::writer("No element has been started.")));
        Ok(())
    }
}
