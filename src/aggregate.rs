use serde_with::SerializeDisplay;

use std::{
    fmt::{self, Display},
    str::FromStr,
};

use crate::{
    schema::{split_field_spec, FieldType, Schema},
    value::Record,
    Error, Result,
};

/// An aggregate operation over a numeric field.
///
/// Serializes as its name, so it can key the JSON aggregation report.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, SerializeDisplay)]
pub enum AggregateOp {
    Avg,
    Min,
    Max,
}

impl Display for AggregateOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Avg => f.write_str("avg"),
            Self::Min => f.write_str("min"),
            Self::Max => f.write_str("max"),
        }
    }
}

impl FromStr for AggregateOp {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "avg" => Ok(Self::Avg),
            "min" => Ok(Self::Min),
            "max" => Ok(Self::Max),
            _ => Err(Error::UnknownOperation(s.to_string())),
        }
    }
}

/// A `FIELD=avg|min|max` request, as given to `--aggregate`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Aggregation {
    pub field: String,
    pub op: AggregateOp,
}

impl FromStr for Aggregation {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let (field, op) = split_field_spec(s, "FIELD=avg|min|max")?;
        Ok(Self {
            field: field.to_string(),
            op: op.parse()?,
        })
    }
}

impl Display for Aggregation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.field, self.op)
    }
}

/// Reduces the numeric `field` of `records` with `op`.
///
/// Returns `None` when there are no records. The average counts every
/// record, including those whose value was missing and so read as zero.
///
/// # Errors
///
/// Returns [`Error::UnknownField`] if `field` isn't in `schema`, or
/// [`Error::NonNumericField`] if it's a text field.
pub fn aggregate(
    records: &[Record],
    schema: &Schema,
    field: &str,
    op: AggregateOp,
) -> Result<Option<f64>> {
    if schema.require(field)? != FieldType::Numeric {
        return Err(Error::NonNumericField(field.to_string()));
    }
    let mut values = records
        .iter()
        .map(|r| r.get(field).and_then(|v| v.as_f64()).unwrap_or(0.0));
    let Some(first) = values.next() else {
        return Ok(None);
    };
    let (sum, count, min, max) = values.fold((first, 1.0, first, first), |(sum, n, lo, hi), v| {
        (sum + v, n + 1.0, lo.min(v), hi.max(v))
    });
    Ok(Some(match op {
        AggregateOp::Avg => sum / count,
        AggregateOp::Min => min,
        AggregateOp::Max => max,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source;

    #[test]
    fn aggregate_fn_computes_avg_min_max() {
        let batch = source::read_path("testdata/sample.csv").unwrap();
        let agg = |field, op| aggregate(&batch.records, &batch.schema, field, op).unwrap();
        assert_eq!(agg("price", AggregateOp::Avg), Some(150.0));
        assert_eq!(agg("price", AggregateOp::Min), Some(100.0));
        assert_eq!(agg("price", AggregateOp::Max), Some(200.0));
        assert_eq!(agg("rating", AggregateOp::Max), Some(4.9));
        assert_eq!(agg("rating", AggregateOp::Min), Some(4.6));
    }

    #[test]
    fn aggregate_fn_returns_none_for_no_records() {
        let batch = source::read_path("testdata/sample.csv").unwrap();
        assert_eq!(
            aggregate(&[], &batch.schema, "price", AggregateOp::Avg).unwrap(),
            None
        );
    }

    #[test]
    fn aggregate_fn_counts_zero_filled_values_in_average() {
        let batch = source::read_from("name,price\na,10\nb,\nc,20\n".as_bytes()).unwrap();
        assert_eq!(
            aggregate(&batch.records, &batch.schema, "price", AggregateOp::Avg).unwrap(),
            Some(10.0)
        );
    }

    #[test]
    fn aggregate_fn_returns_error_for_text_field() {
        let batch = source::read_path("testdata/sample.csv").unwrap();
        let err = aggregate(&batch.records, &batch.schema, "brand", AggregateOp::Max).unwrap_err();
        assert!(matches!(err, Error::NonNumericField(ref f) if f == "brand"));
    }

    #[test]
    fn aggregate_fn_returns_error_for_unknown_field() {
        let batch = source::read_path("testdata/sample.csv").unwrap();
        assert!(matches!(
            aggregate(&batch.records, &batch.schema, "cost", AggregateOp::Avg),
            Err(Error::UnknownField { .. })
        ));
    }

    #[test]
    fn aggregation_parses_field_and_operation() {
        let agg: Aggregation = "rating=avg".parse().unwrap();
        assert_eq!(agg.field, "rating");
        assert_eq!(agg.op, AggregateOp::Avg);
        assert_eq!(agg.to_string(), "rating=avg");
        assert!(matches!(
            "price=maxx".parse::<Aggregation>(),
            Err(Error::UnknownOperation(ref op)) if op == "maxx"
        ));
        assert!(matches!(
            "gh".parse::<Aggregation>(),
            Err(Error::ConditionSyntax(_))
        ));
    }

    #[test]
    fn aggregate_op_serializes_as_its_name() {
        assert_eq!(serde_json::to_string(&AggregateOp::Min).unwrap(), r#""min""#);
    }
}
