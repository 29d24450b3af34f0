use crate::adapters::http::HttpOptions;
use crate::core::runner::RunnerOptions;
use crate::utils::error::Result;
use crate::utils::validation::{
    validate_path, validate_positive_number, validate_range, validate_url, Validate,
};
use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "transfer-scout")]
#[command(about = "Scrapes player identities and transfer histories into CSV files")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(long, global = true, help = "Enable verbose output")]
    pub verbose: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Resolve player names to site slugs and Transfermarkt IDs
    Ids(IdsArgs),
    /// Scrape transfer histories for resolved players
    Transfers(TransfersArgs),
    /// Write the canonical header onto a headerless transfer CSV
    RepairHeader(RepairHeaderArgs),
}

#[derive(Debug, Clone, Args)]
pub struct ScrapeArgs {
    #[arg(long, default_value = "https://www.transfermarkt.com")]
    pub base_url: String,

    #[arg(long, default_value_t = 8, help = "Maximum concurrent page fetches")]
    pub concurrency: usize,

    #[arg(
        long,
        default_value_t = 80,
        help = "Pause between task dispatches, in milliseconds"
    )]
    pub delay_ms: u64,

    #[arg(long, default_value_t = 20, help = "Per-request timeout, in seconds")]
    pub timeout_secs: u64,

    #[arg(long, default_value_t = 3, help = "Retries for transient failures")]
    pub retries: u32,

    #[arg(long, default_value_t = 500, help = "Initial retry backoff, in milliseconds")]
    pub retry_delay_ms: u64,
}

impl ScrapeArgs {
    pub fn http_options(&self) -> HttpOptions {
        HttpOptions {
            timeout_secs: self.timeout_secs,
            retry_attempts: self.retries,
            retry_delay_ms: self.retry_delay_ms,
        }
    }

    pub fn runner_options(&self) -> RunnerOptions {
        RunnerOptions {
            concurrency: self.concurrency,
            delay_ms: self.delay_ms,
        }
    }
}

#[derive(Debug, Args)]
pub struct IdsArgs {
    /// Input CSV with a Name column
    #[arg(long)]
    pub names: String,

    #[arg(long, default_value = "transfermarktId.csv")]
    pub output: String,

    /// Skip this many unresolved names (for running the input in pieces)
    #[arg(long, default_value_t = 0)]
    pub offset: usize,

    /// Resolve at most this many names
    #[arg(long)]
    pub limit: Option<usize>,

    #[command(flatten)]
    pub scrape: ScrapeArgs,
}

#[derive(Debug, Args)]
pub struct TransfersArgs {
    /// Identity CSV produced by the ids command
    #[arg(long, default_value = "transfermarktId.csv")]
    pub players: String,

    #[arg(long, default_value = "transferData.csv")]
    pub output: String,

    #[command(flatten)]
    pub scrape: ScrapeArgs,
}

#[derive(Debug, Args)]
pub struct RepairHeaderArgs {
    /// Transfer CSV to repair in place
    #[arg(long)]
    pub file: String,
}

impl Validate for ScrapeArgs {
    fn validate(&self) -> Result<()> {
        validate_url("base_url", &self.base_url)?;
        validate_range("concurrency", self.concurrency, 1, 64)?;
        validate_positive_number("timeout_secs", self.timeout_secs as usize, 1)?;
        Ok(())
    }
}

impl Validate for Cli {
    fn validate(&self) -> Result<()> {
        match &self.command {
            Command::Ids(args) => {
                validate_path("names", &args.names)?;
                validate_path("output", &args.output)?;
                args.scrape.validate()
            }
            Command::Transfers(args) => {
                validate_path("players", &args.players)?;
                validate_path("output", &args.output)?;
                args.scrape.validate()
            }
            Command::RepairHeader(args) => validate_path("file", &args.file),
        }
    }
}
