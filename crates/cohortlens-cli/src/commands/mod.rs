pub mod init;
pub mod report;
pub mod skills;
pub mod stats;
pub mod student;
pub mod summary;
pub mod validate;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Args;

use cohortlens_core::corpus::{CorpusLoader, CorpusManifest};
use cohortlens_core::roster::Roster;
use cohortlens_core::store::RosterStore;
use cohortlens_core::traits::NarrativeGenerator;
use cohortlens_providers::config::{load_config_from, CohortlensConfig};
use cohortlens_providers::{create_generator, create_sheet_source};

/// Options shared by every command that reads the corpus.
#[derive(Args, Debug, Clone)]
pub struct CorpusArgs {
    /// Config file path
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Directory holding the sheet files (overrides the config)
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    /// Corpus manifest TOML (overrides the config)
    #[arg(long)]
    pub corpus: Option<PathBuf>,
}

impl CorpusArgs {
    /// Load the config and apply command-line overrides.
    pub fn config(&self) -> Result<CohortlensConfig> {
        let mut config = load_config_from(self.config.as_deref())?;
        if let Some(dir) = &self.data_dir {
            config.data_dir = dir.clone();
            config.sheet_base_url = None;
        }
        if let Some(corpus) = &self.corpus {
            config.corpus = Some(corpus.clone());
        }
        Ok(config)
    }
}

/// Build a corpus loader from the effective config.
pub fn corpus_loader(config: &CohortlensConfig) -> Result<(CorpusManifest, CorpusLoader)> {
    let manifest = config.manifest()?;
    let source = create_sheet_source(config)?;
    let loader =
        CorpusLoader::new(manifest.clone(), source).with_fetch_timeout(config.fetch_timeout());
    Ok((manifest, loader))
}

/// Load the configured corpus into a roster.
pub async fn load_roster(args: &CorpusArgs) -> Result<(CohortlensConfig, Arc<Roster>)> {
    let config = args.config()?;
    let (_, loader) = corpus_loader(&config)?;
    let store = RosterStore::new(loader);
    let roster = store.load().await;

    if roster.is_empty() {
        eprintln!(
            "Warning: no students loaded. Check the sheets under {}",
            config.data_dir.display()
        );
    }

    Ok((config, roster))
}

/// Resolve the narrative backend, if one is configured and usable.
pub fn narrative_backend(
    config: &CohortlensConfig,
    provider: Option<&str>,
) -> Option<Box<dyn NarrativeGenerator>> {
    let name = provider.unwrap_or(&config.default_provider);
    let Some(provider_config) = config.providers.get(name) else {
        tracing::info!("narrative backend '{name}' not configured, using built-in summary");
        return None;
    };

    match create_generator(provider_config) {
        Ok(generator) => Some(generator),
        Err(e) => {
            tracing::warn!("cannot use narrative backend '{name}': {e:#}");
            None
        }
    }
}
