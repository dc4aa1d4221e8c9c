#![doc = include_str!("../README.md")]

pub mod aggregate;
pub mod condition;
mod error;
pub mod filter;
pub mod report;
pub mod schema;
pub mod sort;
pub mod source;
pub mod value;

pub use aggregate::{AggregateOp, Aggregation};
pub use condition::{Condition, Expression, Operator};
pub use error::{Error, Result};
pub use report::{json_path, AggregateReport, Goods, Table};
pub use schema::{Field, FieldType, Schema};
pub use sort::{Direction, OrderBy};
pub use value::{Record, Value};
