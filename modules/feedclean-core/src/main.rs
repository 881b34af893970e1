use std::path::PathBuf;

use ai_client::gemini::DEFAULT_MODEL;
use ai_client::Gemini;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use feedclean_common::config::normalize_mute_terms;
use feedclean_common::{FilterMode, SettingValue, Settings};
use feedclean_core::{FeedCleaner, SnapshotTree};

#[derive(Parser)]
#[command(name = "feedclean", about = "Hide low-value posts in a saved feed page")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run one cleaning pass over an HTML snapshot of the feed.
    Scan {
        /// Feed page to read.
        #[arg(long)]
        html: PathBuf,

        /// Where to write the cleaned page. Nothing is written when omitted.
        #[arg(long)]
        out: Option<PathBuf>,

        /// Overrides FEEDCLEAN_FILTER_MODE.
        #[arg(long)]
        mode: Option<FilterMode>,

        /// Overrides FEEDCLEAN_MUTE_WORDS.
        #[arg(long, value_delimiter = ',')]
        mute: Option<Vec<String>>,

        /// File holding the classification prompt template.
        #[arg(long, env = "FEEDCLEAN_PROMPT_FILE")]
        prompt_file: Option<PathBuf>,

        #[arg(long, default_value = DEFAULT_MODEL)]
        model: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("feedclean=info".parse()?))
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Scan {
            html,
            out,
            mode,
            mute,
            prompt_file,
            model,
        } => {
            let mut settings = Settings::from_env();
            if let Some(mode) = mode {
                settings.filter_mode = mode;
            }
            if let Some(terms) = mute {
                settings.mute_terms = normalize_mute_terms(SettingValue::List(terms));
            }
            if let Some(path) = prompt_file {
                settings.prompt_template = std::fs::read_to_string(&path)
                    .with_context(|| format!("reading prompt template {}", path.display()))?;
            }
            settings.log_redacted();

            let generator = match settings.credential.as_deref() {
                Some(key) => Some(Gemini::new(key, model)),
                None => {
                    warn!("GEMINI_API_KEY not set, every post will pass through unscored");
                    None
                }
            };

            let source = std::fs::read_to_string(&html)
                .with_context(|| format!("reading feed snapshot {}", html.display()))?;
            let mut doc = SnapshotTree::parse(&source);

            info!(path = %html.display(), "Feed cleaning starting...");
            let mut cleaner = FeedCleaner::new(&settings, generator);
            let report = cleaner.scan(&mut doc).await;
            info!("Feed cleaning complete. {report}");

            if let Some(path) = out {
                std::fs::write(&path, doc.to_html())
                    .with_context(|| format!("writing cleaned page {}", path.display()))?;
                info!(path = %path.display(), "Cleaned page written");
            }
        }
    }

    Ok(())
}
