use tracing::warn;

use std::{fs::File, io::Read, path::Path};

use crate::{
    schema::{FieldType, Schema},
    value::{Record, Value},
    Error, Result,
};

/// The records read from one source, with the schema inferred for them.
#[derive(Debug, Default)]
pub struct Batch {
    pub schema: Schema,
    pub records: Vec<Record>,
    /// Line numbers of the rows that were skipped.
    pub skipped: Vec<u64>,
}

/// Reads a batch of records from the CSV file at `path`.
///
/// # Errors
///
/// Returns any errors from opening or reading the file, and the errors
/// described for [`read_from`].
pub fn read_path(path: impl AsRef<Path>) -> Result<Batch> {
    read_from(File::open(path)?)
}

/// Reads a batch of records from CSV data with a header row.
///
/// The schema is inferred from the first data row (see [`Schema::infer`]).
/// Values are trimmed; an empty numeric value becomes `0.0`. A row that isn't
/// valid UTF-8, or has a non-numeric value in a numeric field, is skipped
/// with a warning giving its line number, and recorded in
/// [`Batch::skipped`]. Data with a header but no usable rows gives an empty
/// batch.
///
/// # Errors
///
/// Returns [`Error::MissingHeader`] if there is no header row, or any
/// error from the CSV reader.
pub fn read_from(rdr: impl Read) -> Result<Batch> {
    let mut rdr = csv::ReaderBuilder::new().flexible(true).from_reader(rdr);
    let headers: Vec<String> = rdr.headers()?.iter().map(str::to_string).collect();
    if headers.iter().all(|h| h.trim().is_empty()) {
        return Err(Error::MissingHeader);
    }
    let mut schema = None;
    let mut batch = Batch::default();
    for row in rdr.records() {
        let row = match row {
            Ok(row) => row,
            Err(e) if matches!(e.kind(), csv::ErrorKind::Utf8 { .. }) => {
                let line = e.position().map_or(0, csv::Position::line);
                warn!("skipping line {line}: {e}");
                batch.skipped.push(line);
                continue;
            }
            Err(e) => return Err(e.into()),
        };
        let schema = schema
            .get_or_insert_with(|| Schema::infer(&headers, &row.iter().collect::<Vec<_>>()));
        match parse_row(schema, &row) {
            Ok(record) => batch.records.push(record),
            Err(e) => {
                let line = row.position().map_or(0, csv::Position::line);
                warn!("skipping line {line}: {e}");
                batch.skipped.push(line);
            }
        }
    }
    batch.schema = schema.unwrap_or_default();
    Ok(batch)
}

fn parse_row(schema: &Schema, row: &csv::StringRecord) -> Result<Record> {
    let mut fields = Vec::with_capacity(schema.len());
    for (i, field) in schema.fields().iter().enumerate() {
        let raw = row.get(i).unwrap_or_default().trim();
        let value = match field.kind {
            FieldType::Numeric if raw.is_empty() => Value::zero(FieldType::Numeric),
            FieldType::Numeric => {
                Value::Numeric(raw.parse().map_err(|_| Error::TypeCoercion {
                    field: field.name.clone(),
                    value: raw.to_string(),
                })?)
            }
            FieldType::Text => Value::Text(raw.to_string()),
        };
        fields.push((field.name.clone(), value));
    }
    Ok(Record::new(fields))
}
