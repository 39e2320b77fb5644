//! cohortlens: command-line dashboards for exam cohorts.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

use cohortlens_core::model::Area;

mod commands;

use commands::CorpusArgs;

#[derive(Parser)]
#[command(name = "cohortlens", version, about = "Cohort analytics for standardized exam sheets")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Per-exam cohort statistics for one area
    Stats {
        /// Subject area (natureza, matematica, linguagens, humanas)
        #[arg(long)]
        area: Area,

        /// Output format: table, json
        #[arg(long, default_value = "table")]
        format: String,

        #[command(flatten)]
        corpus: CorpusArgs,
    },

    /// Cohort skill mastery matrix for one area
    Skills {
        #[arg(long)]
        area: Area,

        /// Output format: table, json
        #[arg(long, default_value = "table")]
        format: String,

        #[command(flatten)]
        corpus: CorpusArgs,
    },

    /// One student's evolution against the cohort
    Student {
        /// Student id or exact name
        student: String,

        #[arg(long)]
        area: Area,

        /// Number of weakest skills to list
        #[arg(long, default_value = "5")]
        weakest: usize,

        #[command(flatten)]
        corpus: CorpusArgs,
    },

    /// Executive summary for one area
    Summary {
        #[arg(long)]
        area: Area,

        /// Narrative backend name from the config (default: default_provider)
        #[arg(long)]
        provider: Option<String>,

        /// Model override
        #[arg(long)]
        model: Option<String>,

        /// Skip the backend and use the built-in summary
        #[arg(long)]
        offline: bool,

        #[command(flatten)]
        corpus: CorpusArgs,
    },

    /// Write dashboard reports
    Report {
        /// Area to report on (all areas if omitted)
        #[arg(long)]
        area: Option<Area>,

        /// Output directory
        #[arg(long, default_value = "./cohortlens-reports")]
        output: PathBuf,

        /// Output format: json, markdown, all
        #[arg(long, default_value = "json")]
        format: String,

        /// Include an executive summary in each report
        #[arg(long)]
        summary: bool,

        /// Use the built-in summary instead of the configured backend
        #[arg(long)]
        offline: bool,

        #[command(flatten)]
        corpus: CorpusArgs,
    },

    /// Check the corpus manifest (and optionally every sheet)
    Validate {
        /// Also fetch and parse every sheet
        #[arg(long)]
        sheets: bool,

        #[command(flatten)]
        corpus: CorpusArgs,
    },

    /// Create a starter config and corpus manifest
    Init,
}

#[tokio::main]
async fn main() {
    let filter = tracing_subscriber::EnvFilter::from_default_env();
    let filter = match "cohortlens=info".parse() {
        Ok(directive) => filter.add_directive(directive),
        Err(_) => filter,
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Stats {
            area,
            format,
            corpus,
        } => commands::stats::execute(area, format, corpus).await,
        Commands::Skills {
            area,
            format,
            corpus,
        } => commands::skills::execute(area, format, corpus).await,
        Commands::Student {
            student,
            area,
            weakest,
            corpus,
        } => commands::student::execute(student, area, weakest, corpus).await,
        Commands::Summary {
            area,
            provider,
            model,
            offline,
            corpus,
        } => commands::summary::execute(area, provider, model, offline, corpus).await,
        Commands::Report {
            area,
            output,
            format,
            summary,
            offline,
            corpus,
        } => commands::report::execute(area, output, format, summary, offline, corpus).await,
        Commands::Validate { sheets, corpus } => commands::validate::execute(sheets, corpus).await,
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
