//! Analysis and layout configuration.
//!
//! ## Float Normalization for Deterministic Hashing
//!
//! Tolerances are quantized to integers with [`quantize`] before hashing so
//! that `params_hash` is stable across platforms.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use crate::canonical::{canonical_hash_hex, quantize};
use crate::DEFAULT_CONFIG_VERSION;

/// Configuration for one pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatrixConfig {
    /// Configuration version identifier.
    pub version: String,
    /// Watchdog for the contemporary-cycle search, in milliseconds.
    pub contemporary_timeout_ms: u64,
    /// Maximum x distance of units sharing a column.
    pub column_tolerance: f64,
    /// Maximum y distance of units sharing a row.
    pub row_tolerance: f64,
    /// Emit per-cycle and per-row trace events.
    pub trace: bool,
}

impl Default for MatrixConfig {
    fn default() -> Self {
        Self {
            version: DEFAULT_CONFIG_VERSION.to_string(),
            contemporary_timeout_ms: 2_000,
            column_tolerance: 10.0,
            row_tolerance: 5.0,
            trace: false,
        }
    }
}

/// Quantized fields for deterministic hashing. `trace` does not affect results.
#[derive(Serialize)]
struct QuantizedConfig<'a> {
    version: &'a str,
    contemporary_timeout_ms: u64,
    column_tolerance: i64,
    row_tolerance: i64,
}

impl MatrixConfig {
    /// Watchdog duration for the contemporary-cycle search.
    pub fn contemporary_timeout(&self) -> Duration {
        Duration::from_millis(self.contemporary_timeout_ms)
    }

    /// Set the watchdog duration.
    pub fn with_contemporary_timeout(mut self, timeout: Duration) -> Self {
        self.contemporary_timeout_ms = timeout.as_millis() as u64;
        self
    }

    /// Enable or disable trace events.
    pub fn with_trace(mut self, trace: bool) -> Self {
        self.trace = trace;
        self
    }

    /// Set both grid tolerances.
    pub fn with_tolerances(mut self, column: f64, row: f64) -> Self {
        self.column_tolerance = column;
        self.row_tolerance = row;
        self
    }

    /// Hash of the result-affecting parameters.
    pub fn params_hash(&self) -> String {
        canonical_hash_hex(&QuantizedConfig {
            version: &self.version,
            contemporary_timeout_ms: self.contemporary_timeout_ms,
            column_tolerance: quantize(self.column_tolerance),
            row_tolerance: quantize(self.row_tolerance),
        })
    }
}
