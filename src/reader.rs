use crate::encoding::candidate_encodings;
use crate::error::{FunderReportError, Result};
use crate::schema::FunderFormat;
use log::{debug, warn};
use std::collections::HashMap;
use std::path::Path;

/// One data line of a report, keyed by header column name. Cell text is kept
/// raw; typing happens in the normalizer.
pub type RawRow = HashMap<String, String>;

/// Reads a report file into raw rows.
///
/// Candidate encodings are tried in order and the first that decodes wins.
/// Trailer summary lines (a first field like `235 Deal(s)`) are skipped, as
/// are individual rows with fewer fields than the header; a file where more
/// than half the data rows are short is rejected as malformed rather than
/// silently truncated. Rows with extra fields keep the header's columns and
/// drop the surplus. Required columns are not enforced here.
pub fn read_report(path: &Path, format: &FunderFormat) -> Result<Vec<RawRow>> {
    let text = decode_file(path)?;
    if text.trim().is_empty() {
        return Err(FunderReportError::Malformed {
            path: path.to_path_buf(),
            details: "file is empty".to_string(),
        });
    }

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(text.as_bytes());
    let headers = reader.headers()?.clone();

    let mut rows: Vec<RawRow> = Vec::new();
    let mut short_rows = 0usize;
    let mut trailer_rows = 0usize;

    for result in reader.records() {
        let record = result?;

        if record.get(0).map_or(false, |field| field.contains("Deal(s)")) {
            trailer_rows += 1;
            continue;
        }

        if record.len() < headers.len() {
            short_rows += 1;
            continue;
        }

        let mut row = RawRow::new();
        for (i, field) in record.iter().enumerate() {
            if let Some(header) = headers.get(i) {
                row.insert(header.to_string(), field.to_string());
            }
        }
        rows.push(row);
    }

    let data_rows = rows.len() + short_rows;
    if short_rows * 2 > data_rows {
        return Err(FunderReportError::Malformed {
            path: path.to_path_buf(),
            details: format!(
                "{} of {} data rows have mismatched field counts",
                short_rows, data_rows
            ),
        });
    }
    if short_rows > 0 {
        warn!(
            "Skipped {} short row(s) of {} in {}",
            short_rows,
            data_rows,
            path.display()
        );
    }

    debug!(
        "Read {} row(s) from {} ({} short, {} trailer)",
        rows.len(),
        path.display(),
        short_rows,
        trailer_rows
    );
    if !rows.is_empty() {
        let sample: Vec<&str> = rows
            .iter()
            .take(5)
            .filter_map(|row| row.get(&format.entity_key_column))
            .map(String::as_str)
            .collect();
        debug!(
            "Sample {} values from {}: {:?}",
            format.entity_key_column,
            path.display(),
            sample
        );
    }

    Ok(rows)
}

/// Reads just the header row of a report file, for schema validation.
pub fn read_header(path: &Path) -> Result<Vec<String>> {
    let text = decode_file(path)?;
    if text.trim().is_empty() {
        return Err(FunderReportError::Malformed {
            path: path.to_path_buf(),
            details: "file is empty".to_string(),
        });
    }

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(text.as_bytes());
    let headers = reader.headers()?;
    Ok(headers.iter().map(|column| column.to_string()).collect())
}

fn decode_file(path: &Path) -> Result<String> {
    let bytes = std::fs::read(path)?;
    for encoding in candidate_encodings(&bytes) {
        if let Some(text) = encoding.decode(&bytes) {
            debug!("Decoded {} as {}", path.display(), encoding.name());
            return Ok(text);
        }
    }
    Err(FunderReportError::Undecodable {
        path: path.to_path_buf(),
    })
}
