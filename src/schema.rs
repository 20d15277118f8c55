use crate::error::{FunderReportError, Result};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "PascalCase")]
pub enum ColumnType {
    #[schemars(
        description = "Entity identifier used as the grouping key. Raw values are coerced to a canonical integer string; rows whose identifier cannot be coerced are excluded as noise."
    )]
    Identifier,

    #[schemars(
        description = "Monetary amount. Raw cell text may carry currency symbols, thousands separators, quote characters, or parenthesized negatives; empty or unparseable cells normalize to 0.00."
    )]
    Currency,

    #[schemars(description = "Free text carried through unchanged (e.g., a status or business name)")]
    Text,

    #[schemars(description = "Date column. Required to be present but not interpreted by the pipeline")]
    Date,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "PascalCase", tag = "rule")]
pub enum FeeRule {
    #[schemars(
        description = "Fee is derived as |summed gross - summed net|, computed after summation and rounded to 2 decimals. Used by funders that do not report a fee column."
    )]
    DifferenceOfGrossNet,

    #[schemars(
        description = "Fee is the sum of a dedicated report column, rounded to 2 decimals after summation."
    )]
    Column {
        #[schemars(description = "Name of the fee column. Must be declared Currency in the type map.")]
        name: String,

        #[schemars(
            description = "If true, the absolute value of the summed fee is taken (for funders that report fees as negative payables)."
        )]
        absolute: bool,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct FunderFormat {
    #[schemars(description = "Stable identifier used to look the format up in the registry (e.g., 'clearview-daily')")]
    pub funder_id: String,

    #[schemars(description = "Human-readable funder name as it appears in reports and summaries")]
    pub funder_name: String,

    #[schemars(
        description = "Ordered list of column names that must all be present in a report header. Matched case- and whitespace-exactly."
    )]
    pub required_columns: Vec<String>,

    #[schemars(
        description = "Semantic type per column. Every key must also appear in required_columns; columns absent from this map are treated as Text."
    )]
    pub column_types: BTreeMap<String, ColumnType>,

    #[schemars(description = "Column whose canonicalized value is the grouping key. Must be declared Identifier.")]
    pub entity_key_column: String,

    #[schemars(
        description = "Optional column holding a display label (e.g., a business name). When absent the entity key doubles as the label."
    )]
    #[serde(default)]
    pub label_column: Option<String>,

    #[schemars(description = "Column summed into the gross total. Must be declared Currency.")]
    pub gross_column: String,

    #[schemars(description = "Column summed into the net total. Must be declared Currency.")]
    pub net_column: String,

    #[schemars(description = "How the per-entity fee is derived from the summed columns")]
    pub fee_rule: FeeRule,
}

impl FunderFormat {
    /// Checks the descriptor's internal consistency before any file is touched.
    /// Every referenced column must exist in the required list with the type
    /// the pipeline expects of it.
    pub fn validate(&self) -> Result<()> {
        for column in self.column_types.keys() {
            if !self.required_columns.contains(column) {
                return Err(self.invalid(format!(
                    "typed column '{}' is not in the required column list",
                    column
                )));
            }
        }

        if self.column_type(&self.entity_key_column) != Some(&ColumnType::Identifier) {
            return Err(self.invalid(format!(
                "entity key column '{}' must be listed as required and declared Identifier",
                self.entity_key_column
            )));
        }

        for column in [&self.gross_column, &self.net_column] {
            if self.column_type(column) != Some(&ColumnType::Currency) {
                return Err(self.invalid(format!(
                    "amount column '{}' must be listed as required and declared Currency",
                    column
                )));
            }
        }

        if let FeeRule::Column { name, .. } = &self.fee_rule {
            if self.column_type(name) != Some(&ColumnType::Currency) {
                return Err(self.invalid(format!(
                    "fee column '{}' must be listed as required and declared Currency",
                    name
                )));
            }
        }

        if let Some(label) = &self.label_column {
            if !self.required_columns.contains(label) {
                return Err(self.invalid(format!(
                    "label column '{}' is not in the required column list",
                    label
                )));
            }
        }

        Ok(())
    }

    /// Declared Currency columns in required-column order.
    pub fn currency_columns(&self) -> Vec<&str> {
        self.required_columns
            .iter()
            .filter(|c| self.column_type(c) == Some(&ColumnType::Currency))
            .map(String::as_str)
            .collect()
    }

    fn column_type(&self, column: &str) -> Option<&ColumnType> {
        if !self.required_columns.iter().any(|c| c == column) {
            return None;
        }
        self.column_types.get(column)
    }

    fn invalid(&self, details: String) -> FunderReportError {
        FunderReportError::InvalidFormat {
            funder: self.funder_id.clone(),
            details,
        }
    }

    pub fn generate_json_schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(FunderFormat)
    }

    pub fn schema_as_json() -> Result<String> {
        let schema = Self::generate_json_schema();
        Ok(serde_json::to_string_pretty(&schema)?)
    }
}
