use crate::error::Result;
use crate::schema::{ColumnType, FeeRule, FunderFormat};
use std::collections::BTreeMap;

fn columns(names: &[&str]) -> Vec<String> {
    names.iter().map(|name| name.to_string()).collect()
}

/// ClearView daily remittance report. Fee is not reported as a column, so it
/// is derived from the gross/net difference.
pub fn clearview_daily() -> FunderFormat {
    let mut column_types = BTreeMap::new();
    column_types.insert("AdvanceID".to_string(), ColumnType::Identifier);
    column_types.insert("Syn Gross Amount".to_string(), ColumnType::Currency);
    column_types.insert("Syn Net Amount".to_string(), ColumnType::Currency);
    column_types.insert("Last Merchant Cleared Date".to_string(), ColumnType::Date);
    column_types.insert("Return Date".to_string(), ColumnType::Date);
    column_types.insert("Syn Cleared Date".to_string(), ColumnType::Date);
    column_types.insert("Advance Status".to_string(), ColumnType::Text);

    FunderFormat {
        funder_id: "clearview-daily".to_string(),
        funder_name: "ClearView".to_string(),
        required_columns: columns(&[
            "Last Merchant Cleared Date",
            "Advance Status",
            "AdvanceID",
            "Frequency",
            "Repayment Type",
            "Draft Amount",
            "Return Code",
            "Return Date",
            "Syn Gross Amount",
            "Syn Net Amount",
            "Syn Cleared Date",
            "Syndicated Amt",
            "Syndicate Purchase Price",
            "Syndicate Net RTR Remain",
        ]),
        column_types,
        entity_key_column: "AdvanceID".to_string(),
        label_column: None,
        gross_column: "Syn Gross Amount".to_string(),
        net_column: "Syn Net Amount".to_string(),
        fee_rule: FeeRule::DifferenceOfGrossNet,
    }
}

/// ClearView weekly settlement report. Reports its fee in a dedicated column.
pub fn clearview_weekly() -> FunderFormat {
    let mut column_types = BTreeMap::new();
    column_types.insert("Deal Id".to_string(), ColumnType::Identifier);
    column_types.insert(
        "Participator Gross Amount".to_string(),
        ColumnType::Currency,
    );
    column_types.insert("Fee".to_string(), ColumnType::Currency);
    column_types.insert("Net Payment Amount".to_string(), ColumnType::Currency);

    FunderFormat {
        funder_id: "clearview-weekly".to_string(),
        funder_name: "ClearView Weekly".to_string(),
        required_columns: columns(&[
            "Deal Id",
            "Participator Gross Amount",
            "Fee",
            "Net Payment Amount",
        ]),
        column_types,
        entity_key_column: "Deal Id".to_string(),
        label_column: None,
        gross_column: "Participator Gross Amount".to_string(),
        net_column: "Net Payment Amount".to_string(),
        fee_rule: FeeRule::Column {
            name: "Fee".to_string(),
            absolute: false,
        },
    }
}

/// eFin payables report. Carries a merchant label column, and reports
/// servicing fees as negative payables, hence the absolute fee rule.
pub fn efin() -> FunderFormat {
    let mut column_types = BTreeMap::new();
    column_types.insert("Advance ID".to_string(), ColumnType::Identifier);
    column_types.insert("Payable Amt (Gross)".to_string(), ColumnType::Currency);
    column_types.insert("Servicing Fee $".to_string(), ColumnType::Currency);
    column_types.insert("Payable Amt (Net)".to_string(), ColumnType::Currency);
    column_types.insert("Funding Date".to_string(), ColumnType::Date);
    column_types.insert("Business Name".to_string(), ColumnType::Text);
    column_types.insert("Advance Status".to_string(), ColumnType::Text);
    column_types.insert("Payable Status".to_string(), ColumnType::Text);

    FunderFormat {
        funder_id: "efin".to_string(),
        funder_name: "eFin".to_string(),
        required_columns: columns(&[
            "Funding Date",
            "Advance ID",
            "Business Name",
            "Advance Status",
            "Payable Amt (Gross)",
            "Servicing Fee $",
            "Payable Amt (Net)",
            "Payable Status",
        ]),
        column_types,
        entity_key_column: "Advance ID".to_string(),
        label_column: Some("Business Name".to_string()),
        gross_column: "Payable Amt (Gross)".to_string(),
        net_column: "Payable Amt (Net)".to_string(),
        fee_rule: FeeRule::Column {
            name: "Servicing Fee $".to_string(),
            absolute: true,
        },
    }
}

/// Lookup table of funder formats keyed by funder id. Pre-seeded with the
/// built-in funders via [`FormatRegistry::with_builtins`]; additional formats
/// can be registered from code or from JSON configuration.
#[derive(Debug, Clone, Default)]
pub struct FormatRegistry {
    formats: BTreeMap<String, FunderFormat>,
}

impl FormatRegistry {
    pub fn new() -> Self {
        FormatRegistry {
            formats: BTreeMap::new(),
        }
    }

    pub fn with_builtins() -> Self {
        let mut registry = FormatRegistry::new();
        for format in [clearview_daily(), clearview_weekly(), efin()] {
            registry.formats.insert(format.funder_id.clone(), format);
        }
        registry
    }

    pub fn get(&self, funder_id: &str) -> Option<&FunderFormat> {
        self.formats.get(funder_id)
    }

    /// Registers a format after checking its internal consistency. An invalid
    /// descriptor is rejected before it can reach the pipeline.
    pub fn register(&mut self, format: FunderFormat) -> Result<()> {
        format.validate()?;
        self.formats.insert(format.funder_id.clone(), format);
        Ok(())
    }

    /// Registers a format from its JSON representation, as produced by the
    /// schema in [`crate::schema::FunderFormat::schema_as_json`].
    pub fn register_json(&mut self, json: &str) -> Result<()> {
        let format: FunderFormat = serde_json::from_str(json)?;
        self.register(format)
    }

    pub fn funder_ids(&self) -> Vec<&str> {
        self.formats.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.formats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.formats.is_empty()
    }
}
