//! quicksearch: drives a debounced in-place search form from a script.

mod config;
mod session;
mod snapshot;

use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, ValueEnum};
use log::LevelFilter;
use quicksearch_core::{FormMethod, NativeRequest, SearchState};
use quicksearch_engine::{MemoryPage, ReqwestTransport, SearchRuntime, SearchTransport, SharedPage};
use quicksearch_logging::{search_info, LogDestination, DEFAULT_LOG_FILE};
use tokio::io::BufReader;

use crate::config::AppConfig;
use crate::session::LogEventSink;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogTarget {
    Terminal,
    File,
    Both,
}

/// CLI arguments.
#[derive(Parser, Debug)]
#[command(
    name = "quicksearch",
    version,
    about = "Debounced in-place search form driven by a stdin script"
)]
struct Args {
    /// RON configuration file.
    #[arg(long)]
    config: PathBuf,
    /// Profile preset (`glossary` or `vendor`); overrides the configuration file.
    #[arg(long)]
    profile: Option<String>,
    /// Initial page markup. If omitted the form action is fetched.
    #[arg(long)]
    page: Option<PathBuf>,
    /// Writes the final page markup here on exit.
    #[arg(long)]
    snapshot: Option<PathBuf>,
    #[arg(long, value_enum, default_value_t = LogTarget::Terminal)]
    log: LogTarget,
    /// Log at debug level.
    #[arg(short, long)]
    verbose: bool,
    /// Longest wait for outstanding requests once the script ends, in milliseconds.
    #[arg(long, default_value_t = 10_000)]
    settle_ms: u64,
}

impl LogTarget {
    fn destination(self) -> LogDestination {
        match self {
            LogTarget::Terminal => LogDestination::Terminal,
            LogTarget::File => LogDestination::File(PathBuf::from(DEFAULT_LOG_FILE)),
            LogTarget::Both => LogDestination::Both(PathBuf::from(DEFAULT_LOG_FILE)),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let level = if args.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    if !quicksearch_logging::initialize(&args.log.destination(), level) {
        eprintln!("Warning: logging is disabled");
    }

    let config = AppConfig::load(&args.config)?;
    let profile = config.profile(args.profile.as_deref())?;
    let form = config.form()?;
    let transport = Arc::new(
        ReqwestTransport::new(config.transport_settings()?)
            .context("failed to build HTTP client")?,
    );

    let markup = match &args.page {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("failed to read page {}", path.display()))?,
        None => {
            let request = NativeRequest {
                method: FormMethod::Get,
                url: form.action().to_string(),
                body: None,
            };
            transport
                .navigate(&request)
                .await
                .with_context(|| format!("failed to load page {}", request.url))?
                .markup
        }
    };
    let page: SharedPage = Arc::new(Mutex::new(MemoryPage::parse(&markup)));

    search_info!(
        "profile {} on {} (quiet period {} ms)",
        profile.name,
        form.action(),
        profile.quiet_period.as_millis()
    );
    let handle = SearchRuntime::spawn(
        SearchState::new(profile, form),
        page,
        transport,
        Arc::new(LogEventSink),
    );

    let stdin = BufReader::new(tokio::io::stdin());
    let mut stdout = std::io::stdout();
    let outcome = session::run(
        stdin,
        &mut stdout,
        &handle,
        Duration::from_millis(args.settle_ms),
    )
    .await;

    let final_markup = handle.page_markup();
    handle.shutdown().await;
    let view = outcome?;
    search_info!("session finished: {}", session::summary_line(&view));

    if let Some(target) = &args.snapshot {
        let written = snapshot::write_snapshot(target, &final_markup, Utc::now())
            .with_context(|| format!("failed to write snapshot {}", target.display()))?;
        search_info!("snapshot written to {}", written.display());
    }
    Ok(())
}
