use tracing::debug;

use crate::{
    condition::Expression,
    schema::Schema,
    value::Record,
    Result,
};

/// Returns the records that satisfy `condition`, in their original order.
///
/// # Errors
///
/// Returns any error from parsing `condition` with [`Expression::parse`].
pub fn apply(records: &[Record], condition: &str, schema: &Schema) -> Result<Vec<Record>> {
    let expr = Expression::parse(condition, schema)?;
    debug!(condition = %expr, "filtering {} records", records.len());
    Ok(records
        .iter()
        .filter(|record| expr.matches(record))
        .cloned()
        .collect())
}
