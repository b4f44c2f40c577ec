//! Label-to-field projection for flattened CBOR maps
//!
//! A schema is plain data: an ordered list of (map label, output field name)
//! pairs. Projecting a flattened map through a schema yields a record with
//! one slot per field, filled from the first entry whose label matches and
//! explicitly absent otherwise. Labels the schema does not name are ignored;
//! inputs may legitimately carry fields the viewer does not display.

use crate::cbor::CborValue;
use serde::ser::{Serialize, SerializeMap, Serializer};

/// An ordered list of (map label, output field name) pairs
pub type Schema = &'static [(&'static str, &'static str)];

/// The value occupying one field of a projected record
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// No entry carried this field's label
    Absent,
    /// The first entry whose label matched
    Value(CborValue),
    /// Synthesized after projection, e.g. a nested decoded record
    Nested(serde_json::Value),
}

/// A named record produced by projecting a flattened map through a schema
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectedRecord {
    fields: Vec<(&'static str, FieldValue)>,
}

impl ProjectedRecord {
    /// Look up a field by its output name.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.fields
            .iter()
            .find(|(name, _)| *name == field)
            .map(|(_, value)| value)
    }

    /// Attach a synthesized field after projection, replacing any
    /// existing slot with the same name.
    pub fn set_nested(&mut self, field: &'static str, value: serde_json::Value) {
        if let Some(slot) = self
            .fields
            .iter_mut()
            .find(|(name, _)| *name == field)
            .map(|(_, value)| value)
        {
            *slot = FieldValue::Nested(value);
        } else {
            self.fields.push((field, FieldValue::Nested(value)));
        }
    }
}

/// Project a flattened (label, value) sequence onto a schema
///
/// First match per label wins, preserving the input's original ordering
/// semantics. Missing labels yield [`FieldValue::Absent`]; unknown labels
/// in the input are silently ignored.
#[must_use]
pub fn project(schema: Schema, entries: &[(Option<String>, CborValue)]) -> ProjectedRecord {
    let fields = schema
        .iter()
        .map(|&(label, field)| {
            let value = entries
                .iter()
                .find(|(entry_label, _)| entry_label.as_deref() == Some(label))
                .map_or(FieldValue::Absent, |(_, value)| {
                    FieldValue::Value(value.clone())
                });
            (field, value)
        })
        .collect();
    ProjectedRecord { fields }
}

impl Serialize for FieldValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Absent => serializer.serialize_none(),
            Self::Value(value) => value.serialize(serializer),
            Self::Nested(value) => value.serialize(serializer),
        }
    }
}

impl Serialize for ProjectedRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (field, value) in &self.fields {
            map.serialize_entry(field, value)?;
        }
        map.end()
    }
}
