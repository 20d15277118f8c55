use funder_report_processor::*;
use rust_decimal::Decimal;
use std::path::PathBuf;
use tempfile::TempDir;

const DAILY_HEADER: &str = "Last Merchant Cleared Date,Advance Status,AdvanceID,Frequency,\
                            Repayment Type,Draft Amount,Return Code,Return Date,Syn Gross Amount,\
                            Syn Net Amount,Syn Cleared Date,Syndicated Amt,Syndicate Purchase Price,\
                            Syndicate Net RTR Remain";

const WEEKLY_HEADER: &str = "Deal Id,Participator Gross Amount,Fee,Net Payment Amount";

const EFIN_HEADER: &str = "Funding Date,Advance ID,Business Name,Advance Status,\
                           Payable Amt (Gross),Servicing Fee $,Payable Amt (Net),Payable Status";

fn dec(s: &str) -> Decimal {
    s.parse().unwrap()
}

fn write_report(dir: &TempDir, name: &str, contents: &[u8]) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, contents).unwrap();
    path
}

fn daily_line(advance_id: &str, status: &str, gross: &str, net: &str) -> String {
    format!(
        "07/15/2024,{},{},Daily,ACH,150.00,,,{},{},07/15/2024,5000.00,4500.00,1200.00",
        status, advance_id, gross, net
    )
}

#[test]
fn test_clearview_daily_multi_file_batch() {
    let dir = TempDir::new().unwrap();

    let monday = write_report(
        &dir,
        "monday.csv",
        format!(
            "{}\n{}\n{}\n{}\n3 Deal(s)\n",
            DAILY_HEADER,
            daily_line("1001", "Active", "\"$1,200.50\"", "\"1,080.45\""),
            daily_line("1002", "Active", "500.00", "450.00"),
            daily_line("1003", "Closed", "0.00", "0.00"),
        )
        .as_bytes(),
    );
    let tuesday = write_report(
        &dir,
        "tuesday.csv",
        format!(
            "{}\n{}\n{}\n{}\n",
            DAILY_HEADER,
            daily_line("1001", "Active", "300.00", "270.00"),
            daily_line("1004", "Active", "(75.00)", "(67.50)"),
            daily_line("N/A", "Pending", "10.00", "9.00"),
        )
        .as_bytes(),
    );
    let wednesday = write_report(
        &dir,
        "wednesday.csv",
        format!(
            "{}\n{}\n",
            DAILY_HEADER,
            daily_line("1002.0", "Active", "199.50", "179.55"),
        )
        .as_bytes(),
    );

    let registry = FormatRegistry::with_builtins();
    let format = registry.get("clearview-daily").unwrap();

    let summary =
        process_funder_report(&[monday, tuesday, wednesday], format).unwrap();

    assert_eq!(summary.funder_name, "ClearView");
    assert_eq!(summary.record_count, 3, "expected 1001, 1002 and 1004");

    let keys: Vec<&str> = summary
        .pivot
        .display_rows()
        .iter()
        .map(|row| row.entity_key.as_str())
        .collect();
    assert_eq!(keys, vec!["1001", "1002", "1004"]);

    let first = &summary.pivot.rows[0];
    assert_eq!(first.gross, dec("1500.50"));
    assert_eq!(first.net, dec("1350.45"));
    assert_eq!(first.fee, dec("150.05"));

    let third = &summary.pivot.rows[2];
    assert_eq!(third.gross, dec("-75.00"));
    assert_eq!(third.fee, dec("7.50"));

    assert_eq!(summary.totals.gross, dec("2125.00"));
    assert_eq!(summary.totals.fee, dec("227.50"));
    assert_eq!(summary.totals.net, dec("1912.50"));
    summary.pivot.verify_totals().unwrap();

    let csv = summary.pivot.to_csv_string().unwrap();
    assert!(csv.starts_with(
        "Advance ID,Merchant Name,Sum of Syn Gross Amount,Total Servicing Fee,Sum of Syn Net Amount\n"
    ));
    assert!(csv.ends_with("Totals,,2125.00,227.50,1912.50\n"));

    println!("✓ ClearView daily multi-file batch test passed");
}

#[test]
fn test_clearview_weekly_report() {
    let dir = TempDir::new().unwrap();
    let path = write_report(
        &dir,
        "weekly.csv",
        format!(
            "{}\n2001,1000.00,50.00,950.00\n2002,500.00,-25.00,525.00\n2001,200.00,10.00,190.00\n",
            WEEKLY_HEADER
        )
        .as_bytes(),
    );

    let registry = FormatRegistry::with_builtins();
    let format = registry.get("clearview-weekly").unwrap();

    let summary = process_funder_report(&[path], format).unwrap();

    assert_eq!(summary.record_count, 2);
    let first = &summary.pivot.rows[0];
    assert_eq!(first.entity_key, "2001");
    assert_eq!(first.gross, dec("1200.00"));
    assert_eq!(first.fee, dec("60.00"));
    assert_eq!(first.net, dec("1140.00"));

    // Reported fee column keeps its sign for this funder
    let second = &summary.pivot.rows[1];
    assert_eq!(second.fee, dec("-25.00"));

    assert_eq!(summary.totals.gross, dec("1700.00"));
    assert_eq!(summary.totals.fee, dec("35.00"));
    assert_eq!(summary.totals.net, dec("1665.00"));

    println!("✓ ClearView weekly report test passed");
}

#[test]
fn test_efin_report_with_merchant_labels() {
    let dir = TempDir::new().unwrap();

    // Windows-1252 bytes: the merchant name carries accented characters
    let mut contents = format!("{}\n", EFIN_HEADER).into_bytes();
    contents.extend_from_slice(b"07/01/2024,3001,Caf\xE9 Lumi\xE8re,Active,800.00,-40.00,760.00,Paid\n");
    contents.extend_from_slice(b"07/02/2024,3001,CAFE LUMIERE,Active,200.00,-10.00,190.00,Paid\n");
    contents.extend_from_slice(b"07/02/2024,3002,Harbor Diner,Active,300.00,15.00,285.00,Paid\n");
    let path = write_report(&dir, "efin.csv", &contents);

    let registry = FormatRegistry::with_builtins();
    let format = registry.get("efin").unwrap();

    let summary = process_funder_report(&[path], format).unwrap();

    assert_eq!(summary.record_count, 2);

    let first = &summary.pivot.rows[0];
    assert_eq!(first.entity_key, "3001");
    assert_eq!(first.label, "Café Lumière", "first-seen label should win");
    assert_eq!(first.gross, dec("1000.00"));
    // Fees are reported as negative payables; the absolute summed value is kept
    assert_eq!(first.fee, dec("50.00"));
    assert_eq!(first.net, dec("950.00"));

    assert_eq!(summary.totals.fee, dec("65.00"));

    let csv = summary.pivot.to_csv_string().unwrap();
    assert!(csv.contains("3001,Café Lumière,1000.00,50.00,950.00"));

    println!("✓ eFin merchant label test passed");
}

#[test]
fn test_combined_daily_and_weekly_pivot() -> anyhow::Result<()> {
    let dir = TempDir::new().unwrap();
    let daily = write_report(
        &dir,
        "daily.csv",
        format!(
            "{}\n{}\n{}\n",
            DAILY_HEADER,
            daily_line("1001", "Active", "100.00", "90.00"),
            daily_line("1002", "Active", "50.00", "45.00"),
        )
        .as_bytes(),
    );
    let weekly = write_report(
        &dir,
        "weekly.csv",
        format!(
            "{}\n1001,200.00,20.00,180.00\n4001,80.00,8.00,72.00\n",
            WEEKLY_HEADER
        )
        .as_bytes(),
    );

    let registry = FormatRegistry::with_builtins();
    let daily_summary = process_funder_report(
        &[daily],
        registry.get("clearview-daily").unwrap(),
    )?;
    let weekly_summary = process_funder_report(
        &[weekly],
        registry.get("clearview-weekly").unwrap(),
    )?;

    let combined = daily_summary.pivot.merge(&weekly_summary.pivot);

    let keys: Vec<&str> = combined
        .display_rows()
        .iter()
        .map(|row| row.entity_key.as_str())
        .collect();
    assert_eq!(keys, vec!["1001", "1002", "4001"]);

    let overlap = &combined.rows[0];
    assert_eq!(overlap.gross, dec("300.00"));
    assert_eq!(overlap.fee, dec("30.00"));
    assert_eq!(overlap.net, dec("270.00"));

    assert_eq!(combined.totals.gross, dec("430.00"));
    assert_eq!(combined.totals.fee, dec("43.00"));
    assert_eq!(combined.totals.net, dec("387.00"));
    combined.verify_totals()?;

    // The combined table keeps the first table's column captions
    let csv = combined.to_csv_string()?;
    assert!(csv.starts_with(
        "Advance ID,Merchant Name,Sum of Syn Gross Amount,Total Servicing Fee,Sum of Syn Net Amount\n"
    ));

    println!("✓ Combined daily + weekly pivot test passed");
    Ok(())
}

#[test]
fn test_batch_equals_merged_pivots() -> anyhow::Result<()> {
    let dir = TempDir::new().unwrap();
    let first = write_report(
        &dir,
        "first.csv",
        format!(
            "{}\n{}\n{}\n",
            DAILY_HEADER,
            daily_line("1001", "Active", "10.00", "9.00"),
            daily_line("1002", "Active", "20.00", "18.00"),
        )
        .as_bytes(),
    );
    let second = write_report(
        &dir,
        "second.csv",
        format!(
            "{}\n{}\n{}\n",
            DAILY_HEADER,
            daily_line("1001", "Active", "5.00", "4.50"),
            daily_line("1003", "Active", "8.00", "7.20"),
        )
        .as_bytes(),
    );

    let registry = FormatRegistry::with_builtins();
    let format = registry.get("clearview-daily").unwrap();

    // Same-sign amounts, so per-file fees sum to the batch fee
    let batch = process_funder_report(&[first.clone(), second.clone()], format)?;
    let merged = process_funder_report(&[first], format)?
        .pivot
        .merge(&process_funder_report(&[second], format)?.pivot);

    assert_eq!(batch.pivot.to_csv_string()?, merged.to_csv_string()?);
    Ok(())
}

#[test]
fn test_processing_is_idempotent() {
    let dir = TempDir::new().unwrap();
    let path = write_report(
        &dir,
        "daily.csv",
        format!(
            "{}\n{}\n{}\n",
            DAILY_HEADER,
            daily_line("1001", "Active", "123.45", "111.11"),
            daily_line("1002", "Active", "67.89", "61.10"),
        )
        .as_bytes(),
    );

    let registry = FormatRegistry::with_builtins();
    let format = registry.get("clearview-daily").unwrap();

    let first = process_funder_report(std::slice::from_ref(&path), format).unwrap();
    let second = process_funder_report(std::slice::from_ref(&path), format).unwrap();

    assert_eq!(first.pivot, second.pivot);
    assert_eq!(
        first.pivot.to_csv_string().unwrap(),
        second.pivot.to_csv_string().unwrap()
    );
}

#[test]
fn test_missing_columns_reported_in_declared_order() {
    let dir = TempDir::new().unwrap();
    // Header without "Syn Net Amount" and "Syndicated Amt"
    let header = "Last Merchant Cleared Date,Advance Status,AdvanceID,Frequency,Repayment Type,\
                  Draft Amount,Return Code,Return Date,Syn Gross Amount,Syn Cleared Date,\
                  Syndicate Purchase Price,Syndicate Net RTR Remain";
    let path = write_report(
        &dir,
        "incomplete.csv",
        format!("{}\n", header).as_bytes(),
    );

    let registry = FormatRegistry::with_builtins();
    let format = registry.get("clearview-daily").unwrap();

    let err = process_funder_report(&[path], format).unwrap_err();
    match err {
        FunderReportError::MissingColumns { file, columns } => {
            assert_eq!(file, "incomplete.csv");
            assert_eq!(columns, vec!["Syn Net Amount", "Syndicated Amt"]);
        }
        other => panic!("expected MissingColumns, got {:?}", other),
    }
}

#[test]
fn test_mostly_short_file_is_rejected() {
    let dir = TempDir::new().unwrap();
    let path = write_report(
        &dir,
        "truncated.csv",
        format!(
            "{}\n2001,100.00,5.00,95.00\n2002,50.00\n2003\n",
            WEEKLY_HEADER
        )
        .as_bytes(),
    );

    let registry = FormatRegistry::with_builtins();
    let format = registry.get("clearview-weekly").unwrap();

    let err = process_funder_report(&[path], format).unwrap_err();
    assert!(matches!(err, FunderReportError::Malformed { .. }));
}

#[test]
fn test_schema_generation() {
    let schema_json = FunderFormat::schema_as_json().unwrap();

    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("schema_output.json"), schema_json.as_bytes()).unwrap();

    assert!(schema_json.contains("required_columns"));
    assert!(schema_json.contains("entity_key_column"));
    assert!(schema_json.contains("fee_rule"));
    assert!(schema_json.contains("Currency"));
    assert!(schema_json.contains("Identifier"));

    println!("✓ Schema generation test passed");
}
