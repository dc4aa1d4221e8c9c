use tracing::{debug, warn};

use std::{
    collections::BTreeMap,
    fmt::{self, Display},
    fs::{self, File},
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

use crate::{
    aggregate::{self, AggregateOp, Aggregation},
    filter,
    schema::Schema,
    sort::{self, OrderBy},
    source,
    value::{Record, Value},
    Error, Result,
};

/// Holds catalog data: the records read so far, and their schema.
///
/// To create a new, empty `Goods`, use [`Goods::new`].
///
/// To add data, use [`Goods::read_csv`], or load a whole list of files at
/// once with [`Goods::read_files`].
///
/// [`Goods::filter`], [`Goods::sorted`] and [`Goods::aggregate`] never modify
/// the records; they return new values.
///
/// # Examples
///
/// ```
/// # use goods::{AggregateOp, Direction, Goods};
/// let goods = Goods::read_files(&["testdata/sample.csv"]).unwrap();
/// let cheap = goods.filter("price<=150").unwrap();
/// let sorted = cheap.sorted("price", Direction::Desc).unwrap();
/// assert_eq!(sorted.records()[0].get("name").unwrap().to_string(), "xiaomi");
/// assert_eq!(goods.aggregate("price", AggregateOp::Avg).unwrap(), Some(150.0));
/// ```
#[derive(Clone, Debug, Default)]
pub struct Goods {
    schema: Schema,
    records: Vec<Record>,
}

impl Goods {
    /// Creates a new, empty store with no schema.
    #[must_use]
    pub fn new() -> Goods {
        Self::default()
    }

    #[must_use]
    pub fn from_records(schema: Schema, records: Vec<Record>) -> Goods {
        Self { schema, records }
    }

    /// Reads goods data from the CSV file at `path`, and adds it to the
    /// store.
    ///
    /// The first file with any data fixes the schema. A later file with the
    /// same fields in a different column order is accepted, and its records
    /// reordered to match. A file with no data rows adds nothing.
    ///
    /// # Errors
    ///
    /// Returns any errors from reading or parsing the file. Returns
    /// [`Error::SchemaMismatch`] if the file's fields differ from the
    /// existing schema; nothing is added in that case.
    pub fn read_csv(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let batch = source::read_path(&path)?;
        debug!(
            "read {} records from {}",
            batch.records.len(),
            path.as_ref().display()
        );
        if batch.records.is_empty() {
            return Ok(());
        }
        if self.schema.is_empty() {
            self.schema = batch.schema;
            self.records.extend(batch.records);
        } else if self.schema == batch.schema {
            self.records.extend(batch.records);
        } else if self.schema.same_fields(&batch.schema) {
            self.records.extend(batch.records.iter().map(|r| r.reordered(&self.schema)));
        } else {
            return Err(Error::SchemaMismatch);
        }
        Ok(())
    }

    /// Reads each of the CSV files at `paths`, in order.
    ///
    /// A file that can't be read or parsed, or whose fields differ from the
    /// first file's, is skipped with a warning.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoRecords`] if no file yielded any records.
    pub fn read_files<P: AsRef<Path>>(paths: &[P]) -> Result<Goods> {
        let mut goods = Self::new();
        for path in paths {
            if let Err(e) = goods.read_csv(path) {
                warn!("skipping {}: {e}", path.as_ref().display());
            }
        }
        if goods.records.is_empty() {
            return Err(Error::NoRecords);
        }
        Ok(goods)
    }

    #[must_use]
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    #[must_use]
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Returns the goods matching `condition` (see [`crate::condition`]).
    ///
    /// # Errors
    ///
    /// Returns any error from parsing `condition`.
    pub fn filter(&self, condition: &str) -> Result<Goods> {
        let records = filter::apply(&self.records, condition, &self.schema)?;
        Ok(Self::from_records(self.schema.clone(), records))
    }

    /// Returns the goods stably sorted by `field`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownField`] if `field` isn't in the schema.
    pub fn sorted(&self, field: &str, direction: sort::Direction) -> Result<Goods> {
        let records = sort::sort(&self.records, &self.schema, field, direction)?;
        Ok(Self::from_records(self.schema.clone(), records))
    }

    /// Like [`Self::sorted`], taking a parsed `--order-by` spec.
    ///
    /// # Errors
    ///
    /// As for [`Self::sorted`].
    pub fn ordered_by(&self, order: &OrderBy) -> Result<Goods> {
        self.sorted(&order.field, order.direction)
    }

    /// Reduces the numeric `field` with `op`, or returns `None` if there are
    /// no goods.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownField`] or [`Error::NonNumericField`] if
    /// `field` can't be aggregated.
    pub fn aggregate(&self, field: &str, op: AggregateOp) -> Result<Option<f64>> {
        aggregate::aggregate(&self.records, &self.schema, field, op)
    }

    /// Returns a table of the goods, captioned with the filter `condition`.
    #[must_use]
    pub fn table<'a>(&'a self, condition: Option<&'a str>) -> Table<'a> {
        Table {
            caption: Caption::Filtered { condition },
            headers: self.schema.names().map(str::to_string).collect(),
            rows: self
                .records
                .iter()
                .map(|r| r.iter().map(|(_, v)| Cell::new(v, 1)).collect())
                .collect(),
        }
    }

    /// Writes the goods as a JSON array of objects to `path`.
    ///
    /// # Errors
    ///
    /// Returns any errors from creating or writing the file.
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<()> {
        write_json(path, &self.records)
    }
}

/// The outcome of an `--aggregate` request.
#[derive(Clone, Debug, PartialEq)]
pub struct AggregateReport {
    pub aggregation: Aggregation,
    pub result: Option<f64>,
}

impl AggregateReport {
    /// Runs `aggregation` over `goods`.
    ///
    /// # Errors
    ///
    /// As for [`Goods::aggregate`].
    pub fn new(goods: &Goods, aggregation: Aggregation) -> Result<Self> {
        let result = goods.aggregate(&aggregation.field, aggregation.op)?;
        Ok(Self {
            aggregation,
            result,
        })
    }

    /// Returns a one-cell table of the result, captioned with the filter
    /// `condition` and the aggregation.
    #[must_use]
    pub fn table<'a>(&'a self, condition: Option<&'a str>) -> Table<'a> {
        let cell = match self.result {
            Some(n) => Cell::new(&Value::Numeric(n), 2),
            None => Cell::empty(),
        };
        Table {
            caption: Caption::Aggregated {
                condition,
                aggregation: &self.aggregation,
            },
            headers: vec![self.aggregation.op.to_string()],
            rows: vec![vec![cell]],
        }
    }

    /// Writes `{"<op>": <result>}` to `path`.
    ///
    /// # Errors
    ///
    /// Returns any errors from creating or writing the file.
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<()> {
        let doc = BTreeMap::from([(self.aggregation.op, self.result)]);
        write_json(path, &doc)
    }
}

fn write_json(path: impl AsRef<Path>, value: &impl serde::Serialize) -> Result<()> {
    let mut file = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut file, value).map_err(std::io::Error::from)?;
    file.flush()?;
    Ok(())
}

/// Returns where the JSON report named `output` goes inside `dir`, creating
/// `dir` if needed.
///
/// `.json` is appended unless `output` already ends with it.
///
/// # Errors
///
/// Returns any error from creating `dir`.
pub fn json_path(dir: impl AsRef<Path>, output: &str) -> Result<PathBuf> {
    let dir = dir.as_ref();
    fs::create_dir_all(dir)?;
    Ok(if output.ends_with(".json") {
        dir.join(output)
    } else {
        dir.join(format!("{output}.json"))
    })
}

#[derive(Clone, Debug)]
enum Caption<'a> {
    Filtered {
        condition: Option<&'a str>,
    },
    Aggregated {
        condition: Option<&'a str>,
        aggregation: &'a Aggregation,
    },
}

impl Display for Caption<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let describe = |c: &Option<&str>| match c.map(str::trim) {
            Some(c) if !c.is_empty() => c.to_string(),
            _ => "no filter".to_string(),
        };
        match self {
            Self::Filtered { condition } => {
                write!(f, "Filtered goods (condition: {}):", describe(condition))
            }
            Self::Aggregated {
                condition,
                aggregation,
            } => write!(
                f,
                "Aggregated goods (condition: {}, aggregate: {aggregation}):",
                describe(condition)
            ),
        }
    }
}

#[derive(Clone, Debug)]
struct Cell {
    text: String,
    numeric: bool,
}

impl Cell {
    fn new(value: &Value, precision: usize) -> Self {
        Self {
            text: format!("{value:.precision$}"),
            numeric: matches!(value, Value::Numeric(_)),
        }
    }

    fn empty() -> Self {
        Self {
            text: String::new(),
            numeric: false,
        }
    }
}

/// A captioned grid table, ready for printing via its [`Display`]
/// implementation.
#[derive(Clone, Debug)]
pub struct Table<'a> {
    caption: Caption<'a>,
    headers: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl Display for Table<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let widths: Vec<usize> = self
            .headers
            .iter()
            .enumerate()
            .map(|(i, h)| {
                self.rows
                    .iter()
                    .filter_map(|row| row.get(i))
                    .map(|c| c.text.chars().count())
                    .chain([h.chars().count()])
                    .max()
                    .unwrap_or_default()
            })
            .collect();
        writeln!(f, "{}", self.caption)?;
        rule(f, &widths, '-')?;
        for (header, &width) in self.headers.iter().zip(&widths) {
            write!(f, "| {header:width$} ")?;
        }
        writeln!(f, "|")?;
        rule(f, &widths, '=')?;
        for row in &self.rows {
            for (cell, &width) in row.iter().zip(&widths) {
                if cell.numeric {
                    write!(f, "| {:>width$} ", cell.text)?;
                } else {
                    write!(f, "| {:width$} ", cell.text)?;
                }
            }
            writeln!(f, "|")?;
            rule(f, &widths, '-')?;
        }
        Ok(())
    }
}

fn rule(f: &mut fmt::Formatter<'_>, widths: &[usize], fill: char) -> fmt::Result {
    for width in widths {
        write!(f, "+{}", fill.to_string().repeat(width + 2))?;
    }
    writeln!(f, "+")
}
