//! Value conversion between raw device numbers and published labels
//!
//! A [`Converter`] is either a lookup table (raw value to label, with an
//! optional dynamic hook per row) or a [`DynamicConversion`] implementation.
//! Forward conversion may decline to produce a label; that is a normal
//! outcome and simply means nothing is published this cycle. Backward
//! conversion returns an explicit [`InvalidValue`] on failure.

pub mod catalog;
pub mod eaton;
pub mod format;

use crate::session::Session;
use crate::store::StateStore;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

pub use catalog::ConverterCatalog;
pub use format::Formatter;

/// Rejection of a label by backward conversion
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidValue {
    #[error("unknown label '{label}'")]
    UnknownLabel { label: String },

    #[error("'{label}' is not a number")]
    NotANumber { label: String },

    #[error("conversion cannot be inverted")]
    NotInvertible,

    #[error("not supported on this device: {reason}")]
    Unsupported { reason: String },

    #[error("missing published value: {name}")]
    MissingContext { name: String },
}

impl InvalidValue {
    pub fn unknown_label<S: Into<String>>(label: S) -> Self {
        InvalidValue::UnknownLabel {
            label: label.into(),
        }
    }

    pub fn not_a_number<S: Into<String>>(label: S) -> Self {
        InvalidValue::NotANumber {
            label: label.into(),
        }
    }

    pub fn unsupported<S: Into<String>>(reason: S) -> Self {
        InvalidValue::Unsupported {
            reason: reason.into(),
        }
    }

    pub fn missing_context<S: Into<String>>(name: S) -> Self {
        InvalidValue::MissingContext { name: name.into() }
    }
}

/// What a conversion may look at and touch
pub struct ConvertContext<'a> {
    pub session: &'a mut Session,
    pub store: &'a mut dyn StateStore,
}

impl<'a> ConvertContext<'a> {
    pub fn new(session: &'a mut Session, store: &'a mut dyn StateStore) -> Self {
        Self { session, store }
    }

    /// Published value parsed as a number
    pub fn published_f64(&self, name: &str) -> Option<f64> {
        self.store
            .get(name)
            .and_then(|value| value.trim().parse::<f64>().ok())
    }
}

/// Conversion implemented in code rather than as a table
pub trait DynamicConversion: fmt::Debug + Send + Sync {
    fn forward(&self, raw: f64, ctx: &mut ConvertContext<'_>) -> Option<String>;

    fn backward(&self, _label: &str, _ctx: &mut ConvertContext<'_>) -> Result<f64, InvalidValue> {
        Err(InvalidValue::NotInvertible)
    }
}

/// One row of a [`LookupTable`]
#[derive(Debug, Clone)]
pub struct TableEntry {
    pub raw: i64,
    pub label: String,
    pub hook: Option<Arc<dyn DynamicConversion>>,
}

impl TableEntry {
    pub fn new(raw: i64, label: &str) -> Self {
        Self {
            raw,
            label: label.to_string(),
            hook: None,
        }
    }

    pub fn with_hook(raw: i64, label: &str, hook: Arc<dyn DynamicConversion>) -> Self {
        Self {
            raw,
            label: label.to_string(),
            hook: Some(hook),
        }
    }
}

/// Ordered raw/label pairs. Matching rounds the raw value.
#[derive(Debug, Clone, Default)]
pub struct LookupTable {
    entries: Vec<TableEntry>,
    fallback: Option<Arc<dyn DynamicConversion>>,
}

impl LookupTable {
    pub fn new(entries: Vec<TableEntry>) -> Self {
        Self {
            entries,
            fallback: None,
        }
    }

    /// Plain table from `(raw, label)` pairs
    pub fn from_pairs(pairs: &[(i64, &str)]) -> Self {
        Self::new(
            pairs
                .iter()
                .map(|(raw, label)| TableEntry::new(*raw, label))
                .collect(),
        )
    }

    /// Hook consulted when no row matches
    pub fn with_fallback(mut self, hook: Arc<dyn DynamicConversion>) -> Self {
        self.fallback = Some(hook);
        self
    }

    pub fn entries(&self) -> &[TableEntry] {
        &self.entries
    }

    fn forward(&self, raw: f64, ctx: &mut ConvertContext<'_>) -> Option<String> {
        let key = raw.round() as i64;
        match self.entries.iter().find(|entry| entry.raw == key) {
            Some(entry) => match &entry.hook {
                Some(hook) => hook.forward(raw, ctx),
                None => Some(entry.label.clone()),
            },
            None => self.fallback.as_ref().and_then(|hook| hook.forward(raw, ctx)),
        }
    }

    fn backward(&self, label: &str, ctx: &mut ConvertContext<'_>) -> Result<f64, InvalidValue> {
        if let Some(entry) = self.entries.iter().find(|entry| entry.label == label) {
            return Ok(entry.raw as f64);
        }
        match &self.fallback {
            Some(hook) => hook.backward(label, ctx),
            None => Err(InvalidValue::unknown_label(label)),
        }
    }
}

/// Table or code
#[derive(Debug, Clone)]
pub enum Converter {
    Table(LookupTable),
    Dynamic(Arc<dyn DynamicConversion>),
}

impl Converter {
    pub fn table(pairs: &[(i64, &str)]) -> Self {
        Converter::Table(LookupTable::from_pairs(pairs))
    }

    pub fn dynamic<D: DynamicConversion + 'static>(conversion: D) -> Self {
        Converter::Dynamic(Arc::new(conversion))
    }

    pub fn forward(&self, raw: f64, ctx: &mut ConvertContext<'_>) -> Option<String> {
        match self {
            Converter::Table(table) => table.forward(raw, ctx),
            Converter::Dynamic(conversion) => conversion.forward(raw, ctx),
        }
    }

    pub fn backward(&self, label: &str, ctx: &mut ConvertContext<'_>) -> Result<f64, InvalidValue> {
        match self {
            Converter::Table(table) => table.backward(label, ctx),
            Converter::Dynamic(conversion) => conversion.backward(label, ctx),
        }
    }

    /// Admissible labels, for enumerated variables
    pub fn labels(&self) -> Vec<String> {
        match self {
            Converter::Table(table) => table
                .entries()
                .iter()
                .map(|entry| entry.label.clone())
                .collect(),
            Converter::Dynamic(_) => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::DeviceFamily;
    use crate::session::DeviceProfile;
    use crate::store::MemoryStore;

    #[derive(Debug)]
    struct Doubler;

    impl DynamicConversion for Doubler {
        fn forward(&self, raw: f64, _ctx: &mut ConvertContext<'_>) -> Option<String> {
            Some(format!("{}", raw * 2.0))
        }
    }

    fn session() -> Session {
        Session::new(DeviceProfile::new(DeviceFamily::Default, "test"))
    }

    #[test]
    fn table_rounds_raw_value() {
        let mut session = session();
        let mut store = MemoryStore::new();
        let mut ctx = ConvertContext::new(&mut session, &mut store);
        let conv = Converter::table(&[(0, "disabled"), (1, "enabled")]);
        assert_eq!(conv.forward(0.9999, &mut ctx).as_deref(), Some("enabled"));
        assert_eq!(conv.forward(3.0, &mut ctx), None);
        assert_eq!(conv.backward("disabled", &mut ctx), Ok(0.0));
        assert!(matches!(
            conv.backward("maybe", &mut ctx),
            Err(InvalidValue::UnknownLabel { .. })
        ));
    }

    #[test]
    fn unmatched_raw_dispatches_to_fallback() {
        let mut session = session();
        let mut store = MemoryStore::new();
        let mut ctx = ConvertContext::new(&mut session, &mut store);
        let conv = Converter::Table(
            LookupTable::from_pairs(&[(1, "one")]).with_fallback(Arc::new(Doubler)),
        );
        assert_eq!(conv.forward(1.0, &mut ctx).as_deref(), Some("one"));
        assert_eq!(conv.forward(21.0, &mut ctx).as_deref(), Some("42"));
        assert_eq!(conv.backward("42", &mut ctx), Err(InvalidValue::NotInvertible));
    }

    #[test]
    fn row_hook_overrides_label() {
        let mut session = session();
        let mut store = MemoryStore::new();
        let mut ctx = ConvertContext::new(&mut session, &mut store);
        let conv = Converter::Table(LookupTable::new(vec![TableEntry::with_hook(
            5,
            "five",
            Arc::new(Doubler),
        )]));
        assert_eq!(conv.forward(5.0, &mut ctx).as_deref(), Some("10"));
        assert_eq!(conv.labels(), vec!["five".to_string()]);
    }
}
