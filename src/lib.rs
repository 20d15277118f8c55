//! # Funder Report Processor
//!
//! A library for turning funder remittance reports (delimited text files) into
//! per-entity pivot summaries with exact decimal totals.
//!
//! ## Core Concepts
//!
//! - **FunderFormat**: static per-funder schema (required columns, semantic column
//!   types, the entity-key column used for grouping, and the fee rule)
//! - **RawRow / NormalizedRow**: raw cell text as read, versus typed values after
//!   currency and identifier cleanup
//! - **AggregatedRecord**: exact per-entity decimal sums, with the fee derived after summation
//! - **PivotTable**: one display row per entity in first-seen order, plus one trailing
//!   "Totals" row
//! - **Exactness**: amounts are `rust_decimal` values; rounding happens once, at display
//!
//! ## Example
//!
//! ```rust,ignore
//! use funder_report_processor::*;
//! use std::path::PathBuf;
//!
//! let registry = FormatRegistry::with_builtins();
//! let format = registry.get("clearview-daily").unwrap();
//! let paths = vec![
//!     PathBuf::from("reports/monday.csv"),
//!     PathBuf::from("reports/tuesday.csv"),
//! ];
//!
//! let summary = process_funder_report(&paths, format).unwrap();
//! println!("{}", summary.pivot.to_csv_string().unwrap());
//! ```

pub mod aggregate;
pub mod encoding;
pub mod error;
pub mod formats;
pub mod normalize;
pub mod pivot;
pub mod reader;
pub mod schema;
pub mod validator;

pub use aggregate::{aggregate, AggregatedRecord};
pub use encoding::{candidate_encodings, TextEncoding};
pub use error::{FunderReportError, Result};
pub use formats::{clearview_daily, clearview_weekly, efin, FormatRegistry};
pub use normalize::*;
pub use pivot::{GrandTotals, PivotRow, PivotTable, TOTALS_LABEL};
pub use reader::*;
pub use schema::*;
pub use validator::{validate_header, ValidationOutcome};

use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Final result of a processing run: the pivot plus its headline figures and
/// metadata for the surrounding application.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportSummary {
    pub funder_name: String,
    pub pivot: PivotTable,
    pub totals: GrandTotals,
    /// Number of entities in the pivot, excluding the totals row.
    pub record_count: usize,
    pub generated_at: DateTime<Utc>,
}

pub struct FunderReportProcessor;

impl FunderReportProcessor {
    /// Runs the full pipeline over one or more report files: validate every
    /// file's header, read and concatenate all rows, normalize, aggregate,
    /// and build the pivot. Any failure aborts the whole batch; no partial
    /// result is ever returned.
    pub fn process(paths: &[PathBuf], format: &FunderFormat) -> Result<ReportSummary> {
        format.validate()?;

        info!(
            "Processing {} file(s) as {} ({})",
            paths.len(),
            format.funder_name,
            format.funder_id
        );

        for path in paths {
            let header = read_header(path)?;
            if let ValidationOutcome::Invalid { missing_columns } = validate_header(&header, format)
            {
                return Err(FunderReportError::MissingColumns {
                    file: path
                        .file_name()
                        .map(|name| name.to_string_lossy().into_owned())
                        .unwrap_or_else(|| path.display().to_string()),
                    columns: missing_columns,
                });
            }
        }
        debug!("All {} file(s) passed schema validation", paths.len());

        let mut raw_rows: Vec<RawRow> = Vec::new();
        for path in paths {
            let mut rows = read_report(path, format)?;
            raw_rows.append(&mut rows);
        }
        debug!(
            "Read {} raw row(s) across {} file(s)",
            raw_rows.len(),
            paths.len()
        );

        let mut skipped = 0usize;
        let normalized: Vec<NormalizedRow> = raw_rows
            .iter()
            .filter_map(|row| {
                let result = normalize_row(row, format);
                if result.is_none() {
                    skipped += 1;
                }
                result
            })
            .collect();
        if skipped > 0 {
            warn!(
                "Skipped {} row(s) with non-numeric {} values",
                skipped, format.entity_key_column
            );
        }

        let records = aggregate(&normalized, format);
        if records.is_empty() {
            return Err(FunderReportError::EmptyResult);
        }

        let pivot = PivotTable::from_records(&records, format);
        let summary = ReportSummary {
            funder_name: format.funder_name.clone(),
            totals: pivot.totals,
            record_count: pivot.record_count(),
            pivot,
            generated_at: Utc::now(),
        };

        info!(
            "Produced {} record(s) for {} (gross {}, fee {}, net {})",
            summary.record_count,
            summary.funder_name,
            summary.totals.gross,
            summary.totals.fee,
            summary.totals.net
        );

        Ok(summary)
    }

    /// Like [`FunderReportProcessor::process`], but additionally cross-checks
    /// the grand totals against a fresh sum over the display rows.
    pub fn process_with_verification(
        paths: &[PathBuf],
        format: &FunderFormat,
    ) -> Result<ReportSummary> {
        let summary = Self::process(paths, format)?;
        summary.pivot.verify_totals()?;
        Ok(summary)
    }
}

pub fn process_funder_report(paths: &[PathBuf], format: &FunderFormat) -> Result<ReportSummary> {
    FunderReportProcessor::process(paths, format)
}

pub fn process_with_verification(
    paths: &[PathBuf],
    format: &FunderFormat,
) -> Result<ReportSummary> {
    FunderReportProcessor::process_with_verification(paths, format)
}
