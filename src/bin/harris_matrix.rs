//! Harris Matrix command line driver
//!
//! Reads relation records, runs the consistency analysis and, when Graphviz
//! coordinates are supplied, lays the matrix out.
//!
//! ## Modes
//!
//! - `harris_matrix records.json`: print the analysis report followed by the
//!   DOT graph to feed to `dot -Tjson`
//! - `harris_matrix records.json graphviz.json`: print the full output as JSON
//!
//! Records are either a JSON list of relation records or a tabular payload
//! with `headers` and `relations`.
//!
//! ## Configuration
//!
//! Environment variables:
//! - `HM_CONTEMPORARY_TIMEOUT_MS`: contemporary cycle watchdog (default: 2000)
//! - `HM_COLUMN_TOLERANCE`: column snapping tolerance (default: 10)
//! - `HM_ROW_TOLERANCE`: row snapping tolerance (default: 5)
//! - `HM_TRACE`: "1" or "true" for per-cycle trace events
//! - `RUST_LOG`: Log level filter (default: harris_matrix=info)
//! - `LOG_FORMAT`: "json" for structured logs, "pretty" for development (default: json)
//!
//! ## Usage
//!
//! ```bash
//! cargo run --bin harris_matrix --features cli -- records.json graphviz.json
//! ```

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use serde::Deserialize;
use tracing::{error, info};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use harris_matrix_kernel::{
    LayoutCoordinates, MatrixConfig, MatrixPipeline, RelationRecord, StaticLayering,
    TabularRelations,
};

/// Accepted shapes of the records file.
#[derive(Deserialize)]
#[serde(untagged)]
enum RecordsFile {
    Records(Vec<RelationRecord>),
    Tabular(TabularRelations),
}

/// Initialize the tracing subscriber with JSON or pretty format.
/// Logs go to stderr; stdout carries the output.
fn init_tracing() {
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "json".to_string());

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "harris_matrix=info,harris_matrix_kernel=warn".into());

    if log_format == "pretty" {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_current_span(true)
                    .flatten_event(true)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|s| s.trim().parse().ok())
}

/// Load configuration from environment.
fn load_config() -> MatrixConfig {
    let defaults = MatrixConfig::default();
    let trace = std::env::var("HM_TRACE")
        .map(|v| matches!(v.trim(), "1" | "true" | "TRUE"))
        .unwrap_or(false);

    MatrixConfig {
        contemporary_timeout_ms: env_parse("HM_CONTEMPORARY_TIMEOUT_MS")
            .unwrap_or(defaults.contemporary_timeout_ms),
        column_tolerance: env_parse("HM_COLUMN_TOLERANCE").unwrap_or(defaults.column_tolerance),
        row_tolerance: env_parse("HM_ROW_TOLERANCE").unwrap_or(defaults.row_tolerance),
        trace,
        ..defaults
    }
}

fn read_records(path: &Path) -> Result<Vec<RelationRecord>, Box<dyn std::error::Error>> {
    let raw = std::fs::read_to_string(path)?;
    Ok(match serde_json::from_str(&raw)? {
        RecordsFile::Records(records) => records,
        RecordsFile::Tabular(table) => table.into_records()?,
    })
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let mut args = std::env::args().skip(1);
    let Some(records_path) = args.next() else {
        eprintln!("usage: harris_matrix <records.json> [graphviz.json]");
        std::process::exit(2);
    };
    let graphviz_path = args.next();

    let config = load_config();
    info!(
        version = env!("CARGO_PKG_VERSION"),
        params_hash = %config.params_hash(),
        "Starting Harris Matrix analysis"
    );

    let start = Instant::now();
    let records = read_records(Path::new(&records_path))?;

    let coordinates = match &graphviz_path {
        Some(path) => LayoutCoordinates::from_graphviz_json(&std::fs::read_to_string(path)?)?,
        None => LayoutCoordinates::new(),
    };
    let pipeline = MatrixPipeline::new(Arc::new(StaticLayering::new(coordinates)), config);

    if graphviz_path.is_none() {
        let analyzed = pipeline.analyze(&records)?;
        println!("{}", serde_json::to_string_pretty(&analyzed.report)?);
        if analyzed.report.is_renderable() {
            print!("{}", analyzed.layering_request().to_dot());
        } else {
            for message in &analyzed.report.errors {
                error!(%message, "matrix cannot be rendered");
            }
        }
    } else {
        let output = pipeline.run(&records).await?;
        println!("{}", serde_json::to_string_pretty(&output)?);
    }

    info!(
        records = records.len(),
        latency_ms = start.elapsed().as_millis() as u64,
        "analysis complete"
    );
    Ok(())
}
