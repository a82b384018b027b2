mod classify;
mod error;
mod outputs;
mod pipeline;
mod render;
mod resolver;
mod settings;
mod store;
mod submission;
#[cfg(test)]
mod testutil;

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

use anyhow::Context;
use clap::Parser;
use tracing::info;

use outputs::Outcome;
use pipeline::Pipeline;
use resolver::HttpResolver;
use settings::Settings;

#[derive(Parser)]
#[command(name = "link_ingest", about = "File a submitted link into the bookmark site")]
struct Cli {
    /// Issue title (searched for a URL first)
    #[arg(default_value = "")]
    title: String,
    /// Issue body (URL fallback and `Category:`/`Group:`/`Title:`/`Description:` overrides)
    #[arg(default_value = "")]
    body: String,
    /// Site root (overrides LINK_INGEST_ROOT)
    #[arg(long)]
    root: Option<PathBuf>,
    /// Classify with keyword rules even when an API key is configured
    #[arg(long)]
    no_model: bool,
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .try_init();
}

fn run(cli: Cli) -> anyhow::Result<Outcome> {
    let mut settings = Settings::load().context("Failed to load settings")?;
    if let Some(root) = cli.root {
        settings.root = root;
    }
    info!(root = %settings.root.display(), render_cards = settings.render_cards, "Settings loaded");

    let resolver = HttpResolver::from_settings(&settings).context("Failed to set up page fetcher")?;
    let classifier =
        classify::from_settings(&settings, !cli.no_model).context("Failed to set up classifier")?;
    let pipeline = Pipeline {
        resolver: &resolver,
        classifier: &*classifier,
        site: settings.site(),
        render_cards: settings.render_cards,
    };

    let outcome = pipeline.ingest(&cli.title, &cli.body)?;
    outputs::emit(&outcome, settings.output_file.as_deref())?;
    Ok(outcome)
}

fn main() -> ExitCode {
    init_tracing();
    let t0 = Instant::now();
    let cli = Cli::parse();

    match run(cli) {
        Ok(outcome) => {
            info!(
                title = %outcome.short_title,
                category = %outcome.category_name,
                slug = %outcome.category_slug,
                group = %outcome.group_name,
                url = %outcome.url,
                elapsed_ms = t0.elapsed().as_millis() as u64,
                "Bookmark filed"
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            println!("{}", outputs::error_marker(&format!("{:#}", e)));
            ExitCode::FAILURE
        }
    }
}
