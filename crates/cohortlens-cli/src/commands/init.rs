//! The `cohortlens init` command.

use std::path::Path;

use anyhow::{Context, Result};

use cohortlens_core::corpus::CorpusManifest;

pub fn execute() -> Result<()> {
    if Path::new("cohortlens.toml").exists() {
        println!("cohortlens.toml already exists, skipping.");
    } else {
        std::fs::write("cohortlens.toml", SAMPLE_CONFIG)?;
        println!("Created cohortlens.toml");
    }

    if Path::new("corpus.toml").exists() {
        println!("corpus.toml already exists, skipping.");
    } else {
        let manifest = toml::to_string_pretty(&CorpusManifest::default())
            .context("failed to serialize corpus manifest")?;
        std::fs::write("corpus.toml", format!("{CORPUS_HEADER}{manifest}"))?;
        println!("Created corpus.toml");
    }

    std::fs::create_dir_all("data")?;

    println!("\nNext steps:");
    println!("  1. Copy the exported result sheets into ./data");
    println!("  2. Set COHORTLENS_GEMINI_KEY (optional, for generated summaries)");
    println!("  3. Run: cohortlens validate --sheets");
    println!("  4. Run: cohortlens stats --area matematica");

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# cohortlens configuration

default_provider = "gemini"
default_model = "gemini-1.5-flash"
corpus = "corpus.toml"
data_dir = "data"
fetch_timeout_secs = 30
# sheet_base_url = "https://example.org/planilhas"

[providers.gemini]
type = "gemini"
api_key = "${GEMINI_API_KEY}"

[providers.ollama]
type = "ollama"
base_url = "http://localhost:11434"
"#;

const CORPUS_HEADER: &str =
    "# Sheets in load order. Areas are listed in the order their blocks appear.\n\n";
