use thiserror::Error;

use crate::schema::FieldType;

/// Errors returned by the `goods` library.
#[derive(Debug, Error)]
pub enum Error {
    /// The condition string, or an `--order-by`/`--aggregate` spec, is malformed.
    #[error("{0}")]
    ConditionSyntax(String),

    /// A field name that is not present in the schema.
    #[error("unknown field {field:?}; allowed fields: {}", .allowed.join(", "))]
    UnknownField { field: String, allowed: Vec<String> },

    /// An operator that is unrecognised, or not valid for the field's type.
    #[error("operator {op:?} is not supported for {kind} field {field:?}")]
    UnsupportedOperator {
        field: String,
        op: String,
        kind: FieldType,
    },

    /// A comparison value that doesn't parse as the field's numeric type.
    #[error("field {field:?} expects a numeric value, got {value:?}")]
    TypeCoercion { field: String, value: String },

    /// Aggregation requested over a text field.
    #[error("only numeric fields can be aggregated; {0:?} is a text field")]
    NonNumericField(String),

    #[error("unknown aggregate operation {0:?} (expected avg, min or max)")]
    UnknownOperation(String),

    #[error("invalid sort direction {0:?} (expected asc or desc)")]
    InvalidDirection(String),

    /// The source has no header row.
    #[error("CSV data has no header row")]
    MissingHeader,

    /// A file's fields differ from those of the first file loaded.
    #[error("fields differ from the schema of the first file")]
    SchemaMismatch,

    /// None of the input files produced any records.
    #[error("no file yielded any records")]
    NoRecords,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Result type for `goods` operations.
pub type Result<T> = std::result::Result<T, Error>;
