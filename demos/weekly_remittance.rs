use funder_report_processor::{process_with_verification, FormatRegistry};
use std::fs;

fn main() {
    let registry = FormatRegistry::with_builtins();
    let format = registry
        .get("clearview-weekly")
        .expect("built-in weekly format should exist");

    let dir = tempfile::tempdir().expect("temp dir should create");
    let report = dir.path().join("weekly_remittance.csv");
    fs::write(
        &report,
        "Deal Id,Participator Gross Amount,Fee,Net Payment Amount\n\
         8001,\"$1,250.00\",62.50,\"$1,187.50\"\n\
         8002,400.00,20.00,380.00\n\
         8001,250.00,12.50,237.50\n\
         2 Deal(s),,,\n",
    )
    .expect("fixture should write");

    let summary =
        process_with_verification(&[report], format).expect("report should process cleanly");

    println!("Funder: {}", summary.funder_name);
    println!("Advances: {}", summary.record_count);
    println!(
        "Grand totals: gross {}, fee {}, net {}",
        summary.totals.gross, summary.totals.fee, summary.totals.net
    );
    println!();
    print!(
        "{}",
        summary.pivot.to_csv_string().expect("pivot should export")
    );
}
