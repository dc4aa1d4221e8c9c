use regex::Regex;

use std::{
    fmt::{self, Display},
    sync::LazyLock,
};

use crate::{Error, Result};

static FIELD_SPEC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\w+)=(\w+)$").expect("field spec pattern should compile"));

/// Splits a `FIELD=ARG` spec, as taken by `--order-by` and `--aggregate`.
///
/// `usage` describes the expected format in the error message.
pub(crate) fn split_field_spec<'a>(spec: &'a str, usage: &str) -> Result<(&'a str, &'a str)> {
    let caps = FIELD_SPEC.captures(spec.trim()).ok_or_else(|| {
        Error::ConditionSyntax(format!("invalid format {spec:?}: expected {usage}"))
    })?;
    let (_, [field, arg]) = caps.extract();
    Ok((field, arg))
}

/// The type of a field, as inferred from the data.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldType {
    Numeric,
    Text,
}

impl Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Numeric => f.write_str("numeric"),
            Self::Text => f.write_str("text"),
        }
    }
}

/// A single named, typed field.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Field {
    pub name: String,
    pub kind: FieldType,
}

/// Maps field names to their types, in header order.
///
/// A schema is inferred once per source with [`Schema::infer`] and is
/// read-only afterwards.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Schema {
    fields: Vec<Field>,
}

impl Schema {
    /// Infers a schema from the header and the first data row.
    ///
    /// A field is [`FieldType::Numeric`] if its trimmed value in `first_row`
    /// parses as a floating-point number, and [`FieldType::Text`] otherwise.
    /// Values missing from a short row count as empty, and so as text.
    ///
    /// # Examples
    ///
    /// ```
    /// # use goods::{FieldType, Schema};
    /// let schema = Schema::infer(&["name", "price"], &["iphone", " 999 "]);
    /// assert_eq!(schema.kind_of("name"), Some(FieldType::Text));
    /// assert_eq!(schema.kind_of("price"), Some(FieldType::Numeric));
    /// ```
    #[must_use]
    pub fn infer<H, V>(headers: &[H], first_row: &[V]) -> Self
    where
        H: AsRef<str>,
        V: AsRef<str>,
    {
        let fields = headers
            .iter()
            .enumerate()
            .map(|(i, name)| {
                let raw = first_row.get(i).map_or("", AsRef::as_ref).trim();
                let kind = if raw.parse::<f64>().is_ok() {
                    FieldType::Numeric
                } else {
                    FieldType::Text
                };
                Field {
                    name: name.as_ref().to_string(),
                    kind,
                }
            })
            .collect();
        Self { fields }
    }

    /// Returns the type of `name`, if the schema has such a field.
    #[must_use]
    pub fn kind_of(&self, name: &str) -> Option<FieldType> {
        self.fields.iter().find(|f| f.name == name).map(|f| f.kind)
    }

    /// Like [`Self::kind_of`], but fails with [`Error::UnknownField`] naming
    /// the allowed fields.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownField`] if `name` isn't in the schema.
    pub fn require(&self, name: &str) -> Result<FieldType> {
        self.kind_of(name).ok_or_else(|| Error::UnknownField {
            field: name.to_string(),
            allowed: self.names().map(str::to_string).collect(),
        })
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Reports whether `other` has the same fields with the same types,
    /// ignoring column order.
    #[must_use]
    pub fn same_fields(&self, other: &Schema) -> bool {
        self.len() == other.len()
            && self
                .fields
                .iter()
                .all(|f| other.kind_of(&f.name) == Some(f.kind))
    }
}
