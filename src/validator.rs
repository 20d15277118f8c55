use crate::schema::FunderFormat;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationOutcome {
    Valid,
    Invalid { missing_columns: Vec<String> },
}

impl ValidationOutcome {
    pub fn is_valid(&self) -> bool {
        matches!(self, ValidationOutcome::Valid)
    }
}

/// Checks a parsed header against the format's required columns.
/// Collects every missing column, in the format's declared order, rather than
/// stopping at the first miss; callers report the complete list.
/// Matching is case- and whitespace-exact.
pub fn validate_header(header: &[String], format: &FunderFormat) -> ValidationOutcome {
    let missing_columns: Vec<String> = format
        .required_columns
        .iter()
        .filter(|required| !header.iter().any(|column| column == *required))
        .cloned()
        .collect();

    if missing_columns.is_empty() {
        ValidationOutcome::Valid
    } else {
        ValidationOutcome::Invalid { missing_columns }
    }
}
