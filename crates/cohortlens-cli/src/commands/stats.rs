//! The `cohortlens stats` command.

use anyhow::Result;
use comfy_table::{Cell, Table};

use cohortlens_core::model::{Area, CohortStatistics};
use cohortlens_core::statistics::{cohort_statistics, growth};

use super::{load_roster, CorpusArgs};

pub async fn execute(area: Area, format: String, args: CorpusArgs) -> Result<()> {
    let (_, roster) = load_roster(&args).await?;
    let stats = cohort_statistics(&roster, area);

    match format.as_str() {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
        "table" => {
            println!("{area} ({} students)", roster.len());
            println!("{}", stats_table(&stats));

            if let Some(g) = growth(&stats) {
                println!(
                    "\nGrowth {} -> {}: {:+.1} points ({:+.1}%), students at 800+: {:+}",
                    g.initial_exam, g.final_exam, g.absolute, g.percent, g.top_band_change
                );
            }
        }
        other => anyhow::bail!("unknown format: '{other}' (expected table or json)"),
    }

    Ok(())
}

fn stats_table(stats: &[CohortStatistics]) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        "Exam", "Date", "Mean TRI", "Mean raw", "<500", "500-600", "600-700", "700-800", "800+",
    ]);

    for s in stats {
        let d = &s.distribution;
        table.add_row(vec![
            Cell::new(&s.exam_name),
            Cell::new(&s.date),
            Cell::new(format!("{:.1}", s.average_tri)),
            Cell::new(format!("{:.1}", s.average_raw)),
            Cell::new(d.below_500),
            Cell::new(d.range_500_to_600),
            Cell::new(d.range_600_to_700),
            Cell::new(d.range_700_to_800),
            Cell::new(d.above_800),
        ]);
    }

    table
}
