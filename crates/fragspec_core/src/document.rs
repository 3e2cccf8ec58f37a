//! The in-memory API specification document.

use serde_json::{Map, Value};

use crate::error::{FragError, FragResult};
use crate::serializer::{self, Format};

/// Root-level sections handled by bundle and sync.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Paths,
    Definitions,
    Headers,
}

impl Section {
    pub fn key(&self) -> &'static str {
        match self {
            Section::Paths => "paths",
            Section::Definitions => "definitions",
            Section::Headers => "headers",
        }
    }
}

/// A specification document: a mapping at the root, arbitrary tree below.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Document {
    root: Map<String, Value>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap a parsed tree. An empty document (`null`) is an empty mapping.
    pub fn from_value(value: Value) -> FragResult<Self> {
        match value {
            Value::Object(root) => Ok(Self { root }),
            Value::Null => Ok(Self::new()),
            other => Err(FragError::InvalidConfig(format!(
                "document root must be a mapping, found {}",
                kind(&other)
            ))),
        }
    }

    pub fn parse(text: &str) -> FragResult<Self> {
        Self::from_value(serializer::parse(text)?)
    }

    pub fn render(&self, format: Format) -> FragResult<String> {
        serializer::stringify(&self.as_value(), format)
    }

    pub fn as_value(&self) -> Value {
        Value::Object(self.root.clone())
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.root)
    }

    pub fn root(&self) -> &Map<String, Value> {
        &self.root
    }

    pub fn root_mut(&mut self) -> &mut Map<String, Value> {
        &mut self.root
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.root.get(key)
    }

    pub fn section(&self, section: Section) -> Option<&Map<String, Value>> {
        self.root.get(section.key()).and_then(Value::as_object)
    }

    pub fn paths(&self) -> Option<&Map<String, Value>> {
        self.section(Section::Paths)
    }

    pub fn definitions(&self) -> Option<&Map<String, Value>> {
        self.section(Section::Definitions)
    }

    pub fn headers(&self) -> Option<&Map<String, Value>> {
        self.section(Section::Headers)
    }

    /// Whether a section holds at least one entry.
    pub fn has_entries(&self, section: Section) -> bool {
        match self.root.get(section.key()) {
            None | Some(Value::Null) => false,
            Some(Value::Object(map)) => !map.is_empty(),
            Some(Value::Array(items)) => !items.is_empty(),
            Some(_) => true,
        }
    }

    /// Replace a section, keeping its position if it already exists.
    pub fn set_section(&mut self, section: Section, entries: Map<String, Value>) {
        self.root
            .insert(section.key().to_string(), Value::Object(entries));
    }

    /// Remove a section and return its entries.
    pub fn take_section(&mut self, section: Section) -> FragResult<Map<String, Value>> {
        let root = std::mem::take(&mut self.root);
        let mut taken = None;
        for (key, value) in root {
            if key == section.key() {
                taken = Some(value);
            } else {
                self.root.insert(key, value);
            }
        }

        match taken {
            None | Some(Value::Null) => Ok(Map::new()),
            Some(Value::Object(entries)) => Ok(entries),
            Some(other) => Err(FragError::InvalidConfig(format!(
                "section '{}' must be a mapping, found {}",
                section.key(),
                kind(&other)
            ))),
        }
    }

    /// A copy of the document without the given sections.
    pub fn without_sections(&self, sections: &[Section]) -> Document {
        let root = self
            .root
            .iter()
            .filter(|(key, _)| !sections.iter().any(|s| s.key() == key.as_str()))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();
        Document { root }
    }

    /// The operation object at `paths[path][verb]`, if it is a mapping.
    pub fn operation_mut(&mut self, path: &str, verb: &str) -> Option<&mut Map<String, Value>> {
        self.root
            .get_mut(Section::Paths.key())?
            .get_mut(path)?
            .get_mut(verb)?
            .as_object_mut()
    }
}

impl From<Map<String, Value>> for Document {
    fn from(root: Map<String, Value>) -> Self {
        Self { root }
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a sequence",
        Value::Object(_) => "a mapping",
    }
}
