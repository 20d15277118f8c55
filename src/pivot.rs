use crate::aggregate::AggregatedRecord;
use crate::error::{FunderReportError, Result};
use crate::schema::FunderFormat;
use log::debug;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io;

/// Entity-key value of the trailing grand-total row.
pub const TOTALS_LABEL: &str = "Totals";

const FEE_CAPTION: &str = "Total Servicing Fee";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PivotRow {
    pub entity_key: String,
    pub label: String,
    pub gross: Decimal,
    pub fee: Decimal,
    pub net: Decimal,
}

/// The three grand totals, each computed as the exact sum of its own column
/// over the display rows, never derived from one another.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct GrandTotals {
    pub gross: Decimal,
    pub fee: Decimal,
    pub net: Decimal,
}

/// Pivot summary: one display row per entity in aggregation order, then
/// exactly one trailing grand-total row labeled "Totals".
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PivotTable {
    pub rows: Vec<PivotRow>,
    pub totals: GrandTotals,
    pub gross_caption: String,
    pub net_caption: String,
}

impl PivotTable {
    /// Builds the pivot from aggregated records. This is the only place
    /// display rounding happens: gross and net sums are rounded to 2 decimals
    /// here (fees arrive already rounded), and the grand totals are summed
    /// over the rounded display rows.
    pub fn from_records(records: &[AggregatedRecord], format: &FunderFormat) -> PivotTable {
        let mut rows: Vec<PivotRow> = Vec::with_capacity(records.len() + 1);
        for record in records {
            let gross = record
                .sums
                .get(&format.gross_column)
                .copied()
                .unwrap_or(Decimal::ZERO)
                .round_dp(2);
            let net = record
                .sums
                .get(&format.net_column)
                .copied()
                .unwrap_or(Decimal::ZERO)
                .round_dp(2);
            rows.push(PivotRow {
                entity_key: record.entity_key.clone(),
                label: record.label.clone(),
                gross,
                fee: record.fee,
                net,
            });
        }

        let totals = compute_totals(&rows);
        let mut table = PivotTable {
            rows,
            totals,
            gross_caption: format!("Sum of {}", format.gross_column),
            net_caption: format!("Sum of {}", format.net_column),
        };
        table.rows.push(totals_row(&table.totals));

        debug!(
            "Built pivot with {} display row(s) (gross {}, fee {}, net {})",
            records.len(),
            table.totals.gross,
            table.totals.fee,
            table.totals.net
        );
        table
    }

    /// Rows excluding the grand-total row. Entity keys are canonical integer
    /// strings, so a key can never collide with the "Totals" marker.
    pub fn display_rows(&self) -> Vec<&PivotRow> {
        self.rows
            .iter()
            .filter(|row| row.entity_key != TOTALS_LABEL)
            .collect()
    }

    pub fn record_count(&self) -> usize {
        self.display_rows().len()
    }

    /// Combines two pivots key-wise: display rows are summed per entity key
    /// (grand-total rows excluded from the merge), order is self's rows first
    /// then other's new keys, labels keep the first-seen value, and the
    /// grand totals are recomputed from the merged rows.
    pub fn merge(&self, other: &PivotTable) -> PivotTable {
        let mut rows: Vec<PivotRow> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();

        for row in self.display_rows().into_iter().chain(other.display_rows()) {
            match index.get(&row.entity_key) {
                Some(&position) => {
                    let merged = &mut rows[position];
                    merged.gross += row.gross;
                    merged.fee += row.fee;
                    merged.net += row.net;
                }
                None => {
                    index.insert(row.entity_key.clone(), rows.len());
                    rows.push(row.clone());
                }
            }
        }

        let totals = compute_totals(&rows);
        let mut merged = PivotTable {
            rows,
            totals,
            gross_caption: self.gross_caption.clone(),
            net_caption: self.net_caption.clone(),
        };
        merged.rows.push(totals_row(&merged.totals));
        merged
    }

    /// Cross-checks the stored grand totals against a fresh exact sum over
    /// the display rows, with zero tolerance.
    pub fn verify_totals(&self) -> Result<()> {
        let computed = compute_totals(self.display_rows());
        let checks = [
            (self.gross_caption.as_str(), self.totals.gross, computed.gross),
            (FEE_CAPTION, self.totals.fee, computed.fee),
            (self.net_caption.as_str(), self.totals.net, computed.net),
        ];
        for (column, reported, computed) in checks {
            if reported != computed {
                return Err(FunderReportError::TotalsMismatch {
                    column: column.to_string(),
                    reported,
                    computed,
                });
            }
        }
        Ok(())
    }

    /// Renders the pivot as CSV with 2-decimal amounts, grand-total row last.
    pub fn to_csv_string(&self) -> Result<String> {
        let mut writer = csv::Writer::from_writer(vec![]);

        writer.write_record([
            "Advance ID",
            "Merchant Name",
            self.gross_caption.as_str(),
            FEE_CAPTION,
            self.net_caption.as_str(),
        ])?;

        for row in &self.rows {
            writer.write_record([
                &row.entity_key,
                &row.label,
                &format!("{:.2}", row.gross),
                &format!("{:.2}", row.fee),
                &format!("{:.2}", row.net),
            ])?;
        }

        let bytes = writer
            .into_inner()
            .map_err(|e| FunderReportError::Io(io::Error::new(io::ErrorKind::Other, e.to_string())))?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

fn compute_totals<'a, I>(rows: I) -> GrandTotals
where
    I: IntoIterator<Item = &'a PivotRow>,
{
    let mut totals = GrandTotals {
        gross: Decimal::ZERO,
        fee: Decimal::ZERO,
        net: Decimal::ZERO,
    };
    for row in rows {
        totals.gross += row.gross;
        totals.fee += row.fee;
        totals.net += row.net;
    }
    totals
}

fn totals_row(totals: &GrandTotals) -> PivotRow {
    PivotRow {
        entity_key: TOTALS_LABEL.to_string(),
        label: String::new(),
        gross: totals.gross,
        fee: totals.fee,
        net: totals.net,
    }
}
