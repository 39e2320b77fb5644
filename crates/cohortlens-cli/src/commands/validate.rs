//! The `cohortlens validate` command.

use anyhow::Result;
use comfy_table::{Cell, Table};

use cohortlens_core::corpus::validate_manifest;

use super::{corpus_loader, CorpusArgs};

pub async fn execute(check_sheets: bool, args: CorpusArgs) -> Result<()> {
    let config = args.config()?;
    let (manifest, loader) = corpus_loader(&config)?;

    println!(
        "Corpus: {} sheets, {} exams",
        manifest.sheets.len(),
        manifest.exam_order.len()
    );

    let warnings = validate_manifest(&manifest);
    for w in &warnings {
        let prefix = w
            .path
            .as_ref()
            .map(|p| format!("  [{p}]"))
            .unwrap_or_else(|| "  ".to_string());
        println!("{prefix} WARNING: {}", w.message);
    }

    let mut sheet_problems = 0;
    if check_sheets {
        let (roster, reports) = loader.load_with_reports().await;

        let mut table = Table::new();
        table.set_header(vec!["Sheet", "Exam", "Students", "Problems"]);
        for report in &reports {
            let problems = report
                .problems
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("; ");
            table.add_row(vec![
                Cell::new(&report.path),
                Cell::new(&report.exam_id),
                Cell::new(report.students),
                Cell::new(if problems.is_empty() { "ok".to_string() } else { problems }),
            ]);
            sheet_problems += report.problems.len();
        }
        println!("{table}");
        println!("{} students across {} exams", roster.len(), roster.exams().len());
    }

    let total = warnings.len() + sheet_problems;
    if total == 0 {
        println!("Corpus valid.");
    } else {
        println!("\n{total} warning(s) found.");
    }

    Ok(())
}
