use crate::normalize::NormalizedRow;
use crate::schema::{FeeRule, FunderFormat};
use log::debug;
use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashMap};

/// Per-entity aggregate: exact sums of every declared Currency column plus
/// the derived fee. Row order is the first-seen order of the entity keys.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregatedRecord {
    pub entity_key: String,
    pub label: String,
    pub sums: BTreeMap<String, Decimal>,
    pub fee: Decimal,
}

/// Groups normalized rows by entity key and sums every Currency column.
///
/// Rows whose declared Currency fields are all exactly zero are dropped
/// before grouping. Sums are exact decimal additions with no intermediate
/// rounding; the fee is derived from the summed values per the format's fee
/// rule and is the only figure rounded here. The label of a group is the one
/// carried by its first row.
pub fn aggregate(rows: &[NormalizedRow], format: &FunderFormat) -> Vec<AggregatedRecord> {
    let mut records: Vec<AggregatedRecord> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut zero_rows = 0usize;

    for row in rows {
        if row.amounts.values().all(|amount| amount.is_zero()) {
            zero_rows += 1;
            continue;
        }

        match index.get(&row.entity_key) {
            Some(&position) => {
                let record = &mut records[position];
                for (column, amount) in &row.amounts {
                    *record.sums.entry(column.clone()).or_insert(Decimal::ZERO) += *amount;
                }
            }
            None => {
                index.insert(row.entity_key.clone(), records.len());
                records.push(AggregatedRecord {
                    entity_key: row.entity_key.clone(),
                    label: row.label.clone(),
                    sums: row.amounts.clone(),
                    fee: Decimal::ZERO,
                });
            }
        }
    }

    for record in &mut records {
        record.fee = derive_fee(&record.sums, format);
    }

    debug!(
        "Aggregated {} row(s) into {} record(s) ({} all-zero row(s) filtered)",
        rows.len(),
        records.len(),
        zero_rows
    );

    records
}

fn derive_fee(sums: &BTreeMap<String, Decimal>, format: &FunderFormat) -> Decimal {
    let fee = match &format.fee_rule {
        FeeRule::DifferenceOfGrossNet => {
            let gross = sums.get(&format.gross_column).copied().unwrap_or(Decimal::ZERO);
            let net = sums.get(&format.net_column).copied().unwrap_or(Decimal::ZERO);
            (gross - net).abs()
        }
        FeeRule::Column { name, absolute } => {
            let summed = sums.get(name).copied().unwrap_or(Decimal::ZERO);
            if *absolute {
                summed.abs()
            } else {
                summed
            }
        }
    };
    fee.round_dp(2)
}
