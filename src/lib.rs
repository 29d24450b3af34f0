pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

pub use adapters::http::{HttpFetcher, HttpOptions};
pub use adapters::storage::LocalStorage;
pub use config::{Cli, Command};
pub use core::csv_store::CsvStore;
pub use core::identity::IdentityJob;
pub use core::runner::{JobRunner, JobSummary, RunnerOptions};
pub use core::transfers::TransferJob;
pub use utils::error::{Result, ScrapeError};
