use clap::Parser;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use transfer_scout::config::{Cli, Command, IdsArgs, RepairHeaderArgs, ScrapeArgs, TransfersArgs};
use transfer_scout::domain::model::TRANSFER_COLUMNS;
use transfer_scout::domain::ports::ScrapeJob;
use transfer_scout::utils::{logger, validation::Validate};
use transfer_scout::{
    CsvStore, HttpFetcher, IdentityJob, JobRunner, JobSummary, LocalStorage, TransferJob,
};
use url::Url;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logger::init_cli_logger(cli.verbose);

    if let Err(e) = cli.validate() {
        tracing::error!("Configuration validation failed: {}", e);
        eprintln!("❌ {}", e);
        std::process::exit(2);
    }

    match cli.command {
        Command::Ids(args) => run_ids(args).await,
        Command::Transfers(args) => run_transfers(args).await,
        Command::RepairHeader(args) => run_repair_header(args).await,
    }
}

async fn run_ids(args: IdsArgs) -> anyhow::Result<()> {
    let fetcher = Arc::new(HttpFetcher::new(args.scrape.http_options())?);
    let storage = LocalStorage::new(".".to_string());
    let base_url = Url::parse(&args.scrape.base_url)?;

    let job = Arc::new(IdentityJob::new(
        fetcher,
        storage,
        &args.names,
        &args.output,
        base_url,
        args.offset,
        args.limit,
    ));

    let summary = run_with_interrupt(job, &args.scrape).await?;
    report(&summary, "players", &args.output);
    Ok(())
}

async fn run_transfers(args: TransfersArgs) -> anyhow::Result<()> {
    let fetcher = Arc::new(HttpFetcher::new(args.scrape.http_options())?);
    let storage = LocalStorage::new(".".to_string());
    let base_url = Url::parse(&args.scrape.base_url)?;

    let job = Arc::new(TransferJob::new(
        fetcher,
        storage,
        &args.players,
        &args.output,
        base_url,
    ));

    let summary = run_with_interrupt(job, &args.scrape).await?;
    report(&summary, "players", &args.output);
    Ok(())
}

async fn run_repair_header(args: RepairHeaderArgs) -> anyhow::Result<()> {
    let storage = LocalStorage::new(".".to_string());
    let store = CsvStore::new(storage, args.file.as_str(), TRANSFER_COLUMNS);

    if store.repair_header().await? {
        println!("✅ Header written to {}", args.file);
    } else {
        println!("Header already present in {}, nothing to do", args.file);
    }
    Ok(())
}

async fn run_with_interrupt<J>(job: Arc<J>, scrape: &ScrapeArgs) -> anyhow::Result<JobSummary>
where
    J: ScrapeJob + 'static,
{
    let runner = JobRunner::new(scrape.runner_options());

    let stop = runner.stop_flag();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupt received, letting in-flight work finish");
            stop.store(true, Ordering::Relaxed);
        }
    });

    Ok(runner.run(job).await?)
}

fn report(summary: &JobSummary, unit: &str, output: &str) {
    println!(
        "✅ {} {} processed, {} rows appended to {} ({} failed)",
        summary.processed, unit, summary.rows_appended, output, summary.failed
    );
    if summary.stopped {
        println!(
            "⚠️ Stopped early: {} of {} pending {} were dispatched",
            summary.processed + summary.failed,
            summary.pending,
            unit
        );
    }
}
