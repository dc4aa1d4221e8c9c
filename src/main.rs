use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tracing_subscriber::EnvFilter;

use std::path::{Path, PathBuf};

use goods::{json_path, AggregateReport, Aggregation, Goods, OrderBy};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ReportKind {
    /// Print a table to the terminal
    Terminal,
    /// Write a JSON file
    Json,
}

#[derive(Parser)]
#[command(version, about = "Filters, sorts and aggregates goods data from CSV files")]
struct Args {
    /// CSV files to read (e.g. data1.csv data2.csv)
    #[arg(required = true, value_parser = csv_file)]
    files: Vec<PathBuf>,

    /// Where to send the report
    #[arg(long, value_enum, default_value_t = ReportKind::Terminal)]
    report: ReportKind,

    /// Name of the JSON report file
    #[arg(long, default_value = "output")]
    output: String,

    /// Directory for JSON reports
    #[arg(long, default_value = "export")]
    export_dir: PathBuf,

    /// Filter condition: clauses joined by ";" (AND) or "|" (OR), e.g.
    /// "brand=xiaomi;rating>=4.8|price<=500"
    #[arg(long = "where", value_name = "CONDITION")]
    condition: Option<String>,

    /// Aggregate a numeric field: FIELD=avg|min|max, e.g. "rating=avg"
    #[arg(long)]
    aggregate: Option<Aggregation>,

    /// Sort by a field: FIELD=asc|desc, e.g. "price=desc"
    #[arg(long)]
    order_by: Option<OrderBy>,
}

fn csv_file(s: &str) -> std::result::Result<PathBuf, String> {
    let path = Path::new(s);
    if !path.exists() {
        return Err(format!("file {s:?} does not exist"));
    }
    if !path.is_file() {
        return Err(format!("{s:?} is not a file"));
    }
    let is_csv = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
    if !is_csv {
        return Err(format!("file {s:?} must have a .csv extension"));
    }
    Ok(path.to_path_buf())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("goods=info")),
        )
        .with_writer(std::io::stderr)
        .init();
    let args = Args::parse();
    let mut goods = Goods::read_files(&args.files)?;
    let condition = args.condition.as_deref().filter(|c| !c.trim().is_empty());
    if let Some(condition) = condition {
        goods = goods.filter(condition).context("invalid filter condition")?;
    }
    if let Some(order) = &args.order_by {
        goods = goods.ordered_by(order).context("invalid sort")?;
    }
    match (args.aggregate, args.report) {
        (Some(aggregation), ReportKind::Terminal) => {
            let report = AggregateReport::new(&goods, aggregation).context("invalid aggregation")?;
            print!("{}", report.table(condition));
        }
        (Some(aggregation), ReportKind::Json) => {
            let report = AggregateReport::new(&goods, aggregation).context("invalid aggregation")?;
            let path = json_path(&args.export_dir, &args.output)?;
            report
                .write_json(&path)
                .with_context(|| format!("writing {}", path.display()))?;
            println!("Report saved to {}", path.display());
        }
        (None, ReportKind::Terminal) => print!("{}", goods.table(condition)),
        (None, ReportKind::Json) => {
            let path = json_path(&args.export_dir, &args.output)?;
            goods
                .write_json(&path)
                .with_context(|| format!("writing {}", path.display()))?;
            println!("Report saved to {}", path.display());
        }
    }
    Ok(())
}
