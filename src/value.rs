use serde::{ser::SerializeMap, Serialize, Serializer};

use std::{
    cmp::Ordering,
    fmt::{self, Display},
};

use crate::schema::{FieldType, Schema};

/// A single field value: either a number or a piece of text.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Numeric(f64),
    Text(String),
}

impl Value {
    /// Returns the value a missing field of type `kind` takes.
    #[must_use]
    pub fn zero(kind: FieldType) -> Self {
        match kind {
            FieldType::Numeric => Self::Numeric(0.0),
            FieldType::Text => Self::Text(String::new()),
        }
    }

    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Numeric(n) => Some(*n),
            Self::Text(_) => None,
        }
    }

    /// Orders two values of the same type, for sorting.
    ///
    /// Numbers that compare equal with `==` are equal here too, so `-0` and
    /// `0` tie; NaN is placed as [`f64::total_cmp`] places it. Text compares
    /// byte-wise. A number sorts before any text.
    #[must_use]
    pub fn sort_cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            // Adding 0.0 turns -0.0 into 0.0 and leaves every other value alone.
            (Self::Numeric(a), Self::Numeric(b)) => (a + 0.0).total_cmp(&(b + 0.0)),
            (Self::Text(a), Self::Text(b)) => a.cmp(b),
            (Self::Numeric(_), Self::Text(_)) => Ordering::Less,
            (Self::Text(_), Self::Numeric(_)) => Ordering::Greater,
        }
    }
}

impl Display for Value {
    /// Numbers honour the formatter's precision, so `{:.1}` gives `4.9`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Numeric(n) => match f.precision() {
                Some(p) => write!(f, "{n:.p$}"),
                None => write!(f, "{n}"),
            },
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Self::Numeric(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

/// One catalog item: field names paired with their values, in column order.
///
/// Records are built by the CSV source and never modified afterwards.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Record {
    fields: Vec<(String, Value)>,
}

impl Record {
    #[must_use]
    pub fn new(fields: Vec<(String, Value)>) -> Self {
        Self { fields }
    }

    #[must_use]
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, value)| value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// Returns a copy of this record with its fields in `schema` order.
    ///
    /// Fields the record lacks are filled with their zero value.
    #[must_use]
    pub fn reordered(&self, schema: &Schema) -> Self {
        let fields = schema
            .fields()
            .iter()
            .map(|f| {
                let value = self.get(&f.name).cloned().unwrap_or_else(|| Value::zero(f.kind));
                (f.name.clone(), value)
            })
            .collect();
        Self { fields }
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}
