//! Mapping registry
//!
//! The registry is the ordered set of translation rules. Entries sharing a
//! canonical name form a [`FallbackChain`]: the engine tries them in declared
//! order and the first that resolves and is not suppressed wins. Status
//! entries contribute tokens to `ups.status` and are kept apart, one by one.

pub mod eaton;

use crate::convert::{Converter, ConverterCatalog, Formatter};
use crate::error::{BridgeError, Result};
use crate::session::status::UPS_STATUS_VAR;
use crate::transfer::sequence::SequenceDirection;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Behavior flags of a mapping entry
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EntryFlags {
    /// Accepts writes
    pub writable: bool,
    /// Read once per connection, then cached
    #[serde(rename = "static")]
    pub static_value: bool,
    /// Only refreshed on a full update
    pub semi_static: bool,
    /// Evaluated before every entry that is not flagged this way
    pub precedes: bool,
    /// Publishes its admissible labels
    pub enumerated: bool,
    /// Never read from the device; published from its literal default
    pub absent: bool,
}

/// What invoking a command entry does
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandAction {
    /// Write the entry's literal payload to its path
    Write,
    /// Run the composite bypass/ECO sequence
    Sequence(SequenceDirection),
}

/// Role of an entry in the registry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Variable,
    Status,
    Command(CommandAction),
}

/// One translation rule
#[derive(Debug, Clone)]
pub struct MappingEntry {
    pub name: String,
    pub path: String,
    pub kind: EntryKind,
    pub flags: EntryFlags,
    pub formatter: Formatter,
    pub converter: Option<Converter>,
}

impl MappingEntry {
    pub fn variable(name: &str, path: &str) -> Self {
        Self {
            name: name.to_string(),
            path: path.to_string(),
            kind: EntryKind::Variable,
            flags: EntryFlags::default(),
            formatter: Formatter::default(),
            converter: None,
        }
    }

    /// Status entry; its converter yields a status token
    pub fn status(path: &str, converter: Converter) -> Self {
        Self {
            kind: EntryKind::Status,
            converter: Some(converter),
            ..Self::variable(UPS_STATUS_VAR, path)
        }
    }

    /// Command writing `payload` to `path`
    pub fn command(name: &str, path: &str, payload: &str) -> Self {
        Self {
            kind: EntryKind::Command(CommandAction::Write),
            formatter: Formatter::literal(payload),
            ..Self::variable(name, path)
        }
    }

    /// Composite sequence command
    pub fn sequence(name: &str, path: &str, direction: SequenceDirection) -> Self {
        Self {
            kind: EntryKind::Command(CommandAction::Sequence(direction)),
            ..Self::variable(name, path)
        }
    }

    pub fn format(mut self, formatter: Formatter) -> Self {
        self.formatter = formatter;
        self
    }

    pub fn convert(mut self, converter: Converter) -> Self {
        self.converter = Some(converter);
        self
    }

    pub fn writable(mut self) -> Self {
        self.flags.writable = true;
        self
    }

    pub fn static_value(mut self) -> Self {
        self.flags.static_value = true;
        self
    }

    pub fn semi_static(mut self) -> Self {
        self.flags.semi_static = true;
        self
    }

    pub fn precedes(mut self) -> Self {
        self.flags.precedes = true;
        self
    }

    pub fn enumerated(mut self) -> Self {
        self.flags.enumerated = true;
        self
    }

    /// Never read from the device; `default` is published at startup
    pub fn absent(mut self, default: &str) -> Self {
        self.flags.absent = true;
        self.formatter = Formatter::literal(default);
        self
    }

    pub fn is_command(&self) -> bool {
        matches!(self.kind, EntryKind::Command(_))
    }
}

/// Entries sharing one canonical name, in declared order
#[derive(Debug, Clone)]
pub struct FallbackChain {
    pub name: String,
    pub entries: Vec<MappingEntry>,
}

impl FallbackChain {
    fn new(entry: MappingEntry) -> Self {
        Self {
            name: entry.name.clone(),
            entries: vec![entry],
        }
    }

    /// Whether any entry must be evaluated ahead of derived values
    pub fn precedes(&self) -> bool {
        self.entries.iter().any(|entry| entry.flags.precedes)
    }

    pub fn is_writable(&self) -> bool {
        self.entries.iter().any(|entry| entry.flags.writable)
    }

    pub fn is_absent(&self) -> bool {
        self.entries.iter().all(|entry| entry.flags.absent)
    }
}

/// Grouped mapping table
#[derive(Debug, Clone, Default)]
pub struct Registry {
    variables: Vec<FallbackChain>,
    status: Vec<MappingEntry>,
    commands: Vec<FallbackChain>,
}

fn push_grouped(chains: &mut Vec<FallbackChain>, entry: MappingEntry) {
    match chains.iter_mut().find(|chain| chain.name == entry.name) {
        Some(chain) => chain.entries.push(entry),
        None => chains.push(FallbackChain::new(entry)),
    }
}

impl Registry {
    /// Group a flat, ordered entry list. Chains keep the position of their
    /// first entry.
    pub fn new(entries: Vec<MappingEntry>) -> Self {
        let mut registry = Self::default();
        for entry in entries {
            match entry.kind {
                EntryKind::Variable => push_grouped(&mut registry.variables, entry),
                EntryKind::Status => registry.status.push(entry),
                EntryKind::Command(_) => push_grouped(&mut registry.commands, entry),
            }
        }
        registry
    }

    /// Built-in Eaton/MGE table
    pub fn builtin() -> Self {
        Self::new(eaton::entries())
    }

    pub fn variables(&self) -> &[FallbackChain] {
        &self.variables
    }

    pub fn status_entries(&self) -> &[MappingEntry] {
        &self.status
    }

    pub fn commands(&self) -> &[FallbackChain] {
        &self.commands
    }

    pub fn variable(&self, name: &str) -> Option<&FallbackChain> {
        self.variables.iter().find(|chain| chain.name == name)
    }

    pub fn command(&self, name: &str) -> Option<&FallbackChain> {
        self.commands.iter().find(|chain| chain.name == name)
    }

    /// Load a YAML mapping table, resolving converter names in `catalog`
    pub fn from_yaml_file<P: AsRef<Path>>(path: P, catalog: &ConverterCatalog) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            BridgeError::config(format!(
                "failed to read mapping file {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;
        Self::from_yaml_str(&content, catalog)
    }

    pub fn from_yaml_str(content: &str, catalog: &ConverterCatalog) -> Result<Self> {
        let spec: RegistrySpec = serde_yaml::from_str(content)?;
        spec.build(catalog)
    }
}

/// Kind of a YAML entry
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKindSpec {
    #[default]
    Variable,
    Status,
    Command,
}

/// One entry of a YAML mapping table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntrySpec {
    pub name: Option<String>,
    pub path: String,
    #[serde(default)]
    pub kind: EntryKindSpec,
    #[serde(default)]
    pub flags: EntryFlags,
    #[serde(default, with = "serde_yaml::with::singleton_map")]
    pub format: Formatter,
    pub converter: Option<String>,
    /// Command payload, or default of an absent variable
    pub literal: Option<String>,
    pub sequence: Option<SequenceDirection>,
}

/// YAML mapping table
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegistrySpec {
    pub entries: Vec<EntrySpec>,
}

impl EntrySpec {
    fn build(self, catalog: &ConverterCatalog) -> Result<MappingEntry> {
        let converter = match &self.converter {
            Some(name) => Some(catalog.get(name).cloned().ok_or_else(|| {
                BridgeError::config(format!("unknown converter '{}' for {}", name, self.path))
            })?),
            None => None,
        };
        let name = match (self.kind, self.name) {
            (EntryKindSpec::Status, _) => UPS_STATUS_VAR.to_string(),
            (_, Some(name)) => name,
            (_, None) => {
                return Err(BridgeError::config(format!("entry {} has no name", self.path)));
            }
        };
        let kind = match self.kind {
            EntryKindSpec::Variable => EntryKind::Variable,
            EntryKindSpec::Status if converter.is_none() => {
                return Err(BridgeError::config(format!(
                    "status entry {} needs a converter",
                    self.path
                )));
            }
            EntryKindSpec::Status => EntryKind::Status,
            EntryKindSpec::Command => match self.sequence {
                Some(direction) => EntryKind::Command(CommandAction::Sequence(direction)),
                None if self.literal.is_some() => EntryKind::Command(CommandAction::Write),
                None => {
                    return Err(BridgeError::config(format!(
                        "command {} needs a literal or a sequence",
                        name
                    )));
                }
            },
        };
        let formatter = match self.literal {
            Some(text) => Formatter::literal(text),
            None if self.flags.absent => {
                return Err(BridgeError::config(format!(
                    "absent variable {} needs a literal default",
                    name
                )));
            }
            None => self.format,
        };
        Ok(MappingEntry {
            name,
            path: self.path,
            kind,
            flags: self.flags,
            formatter,
            converter,
        })
    }
}

impl RegistrySpec {
    pub fn build(self, catalog: &ConverterCatalog) -> Result<Registry> {
        let entries = self
            .entries
            .into_iter()
            .map(|entry| entry.build(catalog))
            .collect::<Result<Vec<_>>>()?;
        Ok(Registry::new(entries))
    }
}
