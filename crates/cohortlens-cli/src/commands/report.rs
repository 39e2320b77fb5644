//! The `cohortlens report` command.

use std::path::PathBuf;

use anyhow::Result;

use cohortlens_core::model::Area;
use cohortlens_core::narrative::executive_summary;
use cohortlens_core::report::DashboardReport;
use cohortlens_core::statistics::cohort_statistics;

use super::{load_roster, narrative_backend, CorpusArgs};

pub async fn execute(
    area: Option<Area>,
    output: PathBuf,
    format: String,
    with_summary: bool,
    offline: bool,
    args: CorpusArgs,
) -> Result<()> {
    let formats: Vec<&str> = if format == "all" {
        vec!["json", "markdown"]
    } else {
        format.split(',').map(str::trim).collect()
    };
    if let Some(bad) = formats.iter().find(|f| !matches!(**f, "json" | "markdown" | "md")) {
        anyhow::bail!("unknown format: '{bad}' (expected json, markdown or all)");
    }

    let (config, roster) = load_roster(&args).await?;
    let backend = if with_summary && !offline {
        narrative_backend(&config, None)
    } else {
        None
    };

    let areas = match area {
        Some(area) => vec![area],
        None => Area::ALL.to_vec(),
    };

    std::fs::create_dir_all(&output)?;
    let timestamp = chrono::Utc::now().format("%Y-%m-%dT%H%M%S");

    for area in areas {
        let summary = if with_summary {
            let stats = cohort_statistics(&roster, area);
            Some(executive_summary(backend.as_deref(), &stats, area, &config.default_model).await)
        } else {
            None
        };

        let report = DashboardReport::build(&roster, area, summary);

        for fmt in &formats {
            match *fmt {
                "json" => {
                    let path = output.join(format!("report-{}-{timestamp}.json", area.key()));
                    report.save_json(&path)?;
                    eprintln!("Report saved to: {}", path.display());
                }
                _ => {
                    let path = output.join(format!("report-{}-{timestamp}.md", area.key()));
                    std::fs::write(&path, report.to_markdown())?;
                    eprintln!("Markdown report: {}", path.display());
                }
            }
        }
    }

    Ok(())
}
