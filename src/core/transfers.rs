use crate::core::csv_store::CsvStore;
use crate::core::html::parse_transfer_rows;
use crate::domain::model::{IdentityRecord, PlayerRef, IDENTITY_COLUMNS, TRANSFER_COLUMNS};
use crate::domain::ports::{Fetcher, ScrapeJob, Storage};
use crate::utils::error::{Result, ScrapeError};
use async_trait::async_trait;
use std::sync::Arc;
use url::Url;

/// Scrapes the transfer-history page of every resolved player not yet in
/// the output file. All rows for one player land in a single append as soon
/// as that player completes, so a crash loses at most in-flight players.
pub struct TransferJob<F: Fetcher, S: Storage> {
    fetcher: Arc<F>,
    players: CsvStore<S>,
    output: CsvStore<S>,
    base_url: Url,
}

impl<F: Fetcher, S: Storage + Clone> TransferJob<F, S> {
    pub fn new(
        fetcher: Arc<F>,
        storage: S,
        players_path: &str,
        output_path: &str,
        base_url: Url,
    ) -> Self {
        Self {
            fetcher,
            players: CsvStore::new(storage.clone(), players_path, IDENTITY_COLUMNS),
            output: CsvStore::new(storage, output_path, TRANSFER_COLUMNS),
            base_url,
        }
    }
}

impl<F: Fetcher, S: Storage> TransferJob<F, S> {
    fn page_url(&self, player: &PlayerRef) -> Result<Url> {
        self.base_url
            .join(&format!(
                "{}/transfers/spieler/{}",
                player.query, player.transfermarkt_id
            ))
            .map_err(|e| ScrapeError::InvalidConfigValueError {
                field: "base_url".to_string(),
                value: self.base_url.to_string(),
                reason: e.to_string(),
            })
    }
}

#[async_trait]
impl<F, S> ScrapeJob for TransferJob<F, S>
where
    F: Fetcher + 'static,
    S: Storage + 'static,
{
    type Item = PlayerRef;

    fn name(&self) -> &'static str {
        "transfer scrape"
    }

    fn label(&self, item: &PlayerRef) -> String {
        item.query.clone()
    }

    /// Resolved players whose query is not yet present in the output file.
    /// Identity rows without a query/ID (search misses) are not scrapeable.
    async fn pending(&self) -> Result<Vec<PlayerRef>> {
        let records: Vec<IdentityRecord> = self.players.read_records().await?;
        let total = records.len();
        let mut seen = self.output.column_values("Query").await?;

        let pending: Vec<PlayerRef> = records
            .into_iter()
            .filter_map(|record| record.player_ref())
            .filter(|player| seen.insert(player.query.clone()))
            .collect();

        tracing::debug!(
            identity_rows = total,
            pending = pending.len(),
            "filtered already-scraped players"
        );
        Ok(pending)
    }

    async fn process(&self, player: PlayerRef) -> Result<usize> {
        let url = self.page_url(&player)?;
        let body = self.fetcher.fetch(url.as_str()).await?;
        let rows = parse_transfer_rows(&body, &player.query)?;

        if rows.is_empty() {
            tracing::warn!(query = %player.query, "page had no transfer history");
            return Ok(0);
        }

        self.output.append(&rows).await?;
        Ok(rows.len())
    }
}
