use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

mod commands;
mod state;

use state::AppState;

#[derive(Debug, Parser)]
#[command(
    name = "akania",
    version,
    about = "Extract structured company profiles from the web",
    after_help = "Examples:\n  akania --company \"Flutterwave Nigeria\"\n  akania --batch companies.txt\n  akania --setup\n  akania --create-sample\n  akania --list"
)]
struct Cli {
    /// Extract and store the profile of one company
    #[arg(short, long, value_name = "COMPANY")]
    company: Option<String>,

    /// Extract every company listed in FILE, one per line
    #[arg(short, long, value_name = "FILE", conflicts_with = "company")]
    batch: Option<PathBuf>,

    /// Validate configuration and report component readiness
    #[arg(short, long)]
    setup: bool,

    /// Write sample_companies.txt and .env.example if absent
    #[arg(long)]
    create_sample: bool,

    /// List stored profiles
    #[arg(short, long)]
    list: bool,

    /// Profile directory (overrides AKANIA_DATA_DIR)
    #[arg(long, value_name = "DIR")]
    data_dir: Option<PathBuf>,

    /// Companies processed in parallel in batch mode
    #[arg(long, value_name = "N")]
    concurrency: Option<usize>,

    /// Debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn init_tracing(verbose: bool) -> anyhow::Result<()> {
    let level = if verbose { "akania=debug" } else { "akania=info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.parse()?))
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    dotenvy::dotenv().ok();
    init_tracing(cli.verbose)?;

    if cli.create_sample {
        commands::create_sample_files(&std::env::current_dir()?)?;
        return Ok(ExitCode::SUCCESS);
    }

    let mut config = akania_core::AppConfig::from_env();
    if let Some(dir) = cli.data_dir {
        config.data_dir = dir;
    }
    if let Some(n) = cli.concurrency {
        config.batch_concurrency = n.max(1);
    }
    let state = AppState::new(config);

    let success = if cli.setup {
        commands::validate_setup(&state)
    } else if cli.list {
        commands::list_profiles(&state).await?
    } else if let Some(company) = cli.company {
        commands::extract_single(&state, &company).await?
    } else if let Some(batch) = cli.batch {
        commands::extract_batch(&state, &batch).await?
    } else {
        eprintln!("Nothing to do. Pass --company, --batch, --list, --setup or --create-sample (see --help).");
        false
    };

    Ok(if success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
