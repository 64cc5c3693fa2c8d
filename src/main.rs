//! marketplace-scout - list the newest Facebook Marketplace items for a search.

use std::io::BufRead;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use log::LevelFilter;
use marketplace_scout::config::env_report;
use marketplace_scout::prompt::resolve_headless;
use marketplace_scout::{
    ExtractionAgent, MarketplaceScout, ScoutConfig, Stagehand, TransportChoice, render_outcome,
};

#[derive(Parser, Debug)]
#[command(name = "marketplace-scout")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Browser profile directory already logged in to Facebook (falls back to USER_DATA_DIR)
    user_data_dir: Option<PathBuf>,

    /// What to search for on Marketplace
    #[arg(long, short = 's')]
    search_item: Option<String>,

    /// Run the browser in the background
    #[arg(long, conflicts_with = "visible")]
    headless: bool,

    /// Show the browser window
    #[arg(long)]
    visible: bool,

    /// Number of listings to extract
    #[arg(long, short = 'n')]
    max_items: Option<usize>,

    /// Print the environment variables the scout reads, then exit
    #[arg(long)]
    print_env: bool,

    /// Increase log output (-v info, -vv debug)
    #[arg(long, short = 'v', action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn apply(&self, config: &mut ScoutConfig) {
        if let Some(dir) = &self.user_data_dir {
            config.user_data_dir = Some(dir.clone());
        }
        if let Some(item) = &self.search_item {
            config.search_item = item.clone();
        }
        if let Some(max_items) = self.max_items {
            config.max_items = max_items;
        }
        config.headless = match (self.headless, self.visible) {
            (true, _) => Some(true),
            (_, true) => Some(false),
            _ => None,
        };
        config.verbose = self.verbose;
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        _ => LevelFilter::Debug,
    };
    let _ = env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .try_init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_logging(cli.verbose);

    if cli.print_env {
        for line in env_report(|key| std::env::var(key).ok()) {
            println!("{line}");
        }
        return Ok(());
    }

    let mut config = ScoutConfig::from_env()?;
    cli.apply(&mut config);
    config.validate()?;

    let headless = resolve_headless(config.headless);

    let mut stagehand = Stagehand::connect(TransportChoice::Rest(config.api_url.clone()), config.credentials()).await?;
    stagehand
        .start(config.session_options(headless))
        .await
        .context("failed to start browser session")?;

    let mut scout = MarketplaceScout::new(stagehand, config.max_items);
    let result = scout.run(&config.search_item).await;

    if let Ok(report) = &result {
        print!("{}", render_outcome(&report.outcome, config.max_items));
        if !headless {
            println!("Press Enter to close the browser...");
            let mut line = String::new();
            let _ = std::io::stdin().lock().read_line(&mut line);
        }
    }

    if let Err(e) = scout.agent_mut().close().await {
        log::warn!("Failed to end session: {e}");
    }

    result.context("marketplace scrape failed")?;
    Ok(())
}
