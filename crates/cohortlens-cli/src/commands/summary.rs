//! The `cohortlens summary` command.

use anyhow::Result;

use cohortlens_core::model::Area;
use cohortlens_core::narrative::{executive_summary, SummarySource};
use cohortlens_core::statistics::cohort_statistics;

use super::{load_roster, narrative_backend, CorpusArgs};

pub async fn execute(
    area: Area,
    provider: Option<String>,
    model: Option<String>,
    offline: bool,
    args: CorpusArgs,
) -> Result<()> {
    let (config, roster) = load_roster(&args).await?;
    let stats = cohort_statistics(&roster, area);

    let backend = if offline {
        None
    } else {
        narrative_backend(&config, provider.as_deref())
    };
    let model = model.unwrap_or_else(|| config.default_model.clone());

    let summary = executive_summary(backend.as_deref(), &stats, area, &model).await;

    match (&summary.source, &backend) {
        (SummarySource::Generated, Some(b)) => {
            eprintln!("Summary generated by {} ({model})", b.name())
        }
        _ => eprintln!("Summary built from cohort statistics"),
    }
    println!("{}", summary.text);

    Ok(())
}
