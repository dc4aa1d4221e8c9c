use std::{
    fmt::{self, Display},
    str::FromStr,
};

use crate::{
    schema::{split_field_spec, Schema},
    value::{Record, Value},
    Error, Result,
};

/// Sort order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

impl Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Asc => f.write_str("asc"),
            Self::Desc => f.write_str("desc"),
        }
    }
}

impl FromStr for Direction {
    type Err = Error;

    /// Accepts exactly `asc` or `desc`.
    fn from_str(s: &str) -> Result<Self> {
        match s {
            "asc" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            _ => Err(Error::InvalidDirection(s.to_string())),
        }
    }
}

/// A `FIELD=asc|desc` sort request, as given to `--order-by`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OrderBy {
    pub field: String,
    pub direction: Direction,
}

impl FromStr for OrderBy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let (field, direction) = split_field_spec(s, "FIELD=asc|desc")?;
        Ok(Self {
            field: field.to_string(),
            direction: direction.parse()?,
        })
    }
}

impl Display for OrderBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.field, self.direction)
    }
}

/// Returns `records` ordered by the value of `field`.
///
/// The sort is stable in both directions: records with equal keys keep their
/// input order. A record without the field sorts as the field's zero value.
///
/// # Errors
///
/// Returns [`Error::UnknownField`] if `field` isn't in `schema`.
pub fn sort(
    records: &[Record],
    schema: &Schema,
    field: &str,
    direction: Direction,
) -> Result<Vec<Record>> {
    let zero = Value::zero(schema.require(field)?);
    let cmp = |a: &Record, b: &Record| {
        let a = a.get(field).unwrap_or(&zero);
        a.sort_cmp(b.get(field).unwrap_or(&zero))
    };
    let mut sorted = records.to_vec();
    match direction {
        Direction::Asc => sorted.sort_by(|a, b| cmp(a, b)),
        Direction::Desc => sorted.sort_by(|a, b| cmp(b, a)),
    }
    Ok(sorted)
}
