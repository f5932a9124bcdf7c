//! Per-record field projection
//!
//! A [`Mapping`] is a static table of output field names and extraction
//! [`Rule`]s. Projecting a record is pure: no I/O, no failure. Fields whose
//! source was unusable are reported back as degraded so the caller can count
//! them.

pub mod mappings;
mod rule;

pub use rule::{lookup, Evaluated, Fallback, Pick, Rule};

use serde_json::{Map, Value};

/// Output field name plus its extraction rule, in output order
pub type Mapping = [(&'static str, Rule)];

/// A projected record: flat, with the mapping's key set in mapping order
pub type Record = Map<String, Value>;

/// Result of projecting one raw record
#[derive(Debug, Clone, PartialEq)]
pub struct Projection {
    pub record: Record,

    /// Output fields that fell back to their default because the source was mistyped
    pub degraded: Vec<&'static str>,
}

impl Projection {
    pub fn is_degraded(&self) -> bool {
        !self.degraded.is_empty()
    }
}

/// Projects a raw record, reporting degraded fields
///
/// A raw record that is not a JSON object projects to every field's default
/// and is reported as degraded on all fields that could not be read.
pub fn project_record(raw: &Value, mapping: &Mapping) -> Projection {
    let mut record = Map::with_capacity(mapping.len());
    let mut degraded = Vec::new();

    for (name, rule) in mapping {
        let evaluated = if raw.is_object() {
            rule.evaluate(raw)
        } else {
            rule.evaluate(&Value::Null)
        };

        if evaluated.degraded || !raw.is_object() {
            degraded.push(*name);
        }
        record.insert((*name).to_string(), evaluated.value);
    }

    if !degraded.is_empty() {
        tracing::trace!("Projection degraded fields: {:?}", degraded);
    }

    Projection { record, degraded }
}
