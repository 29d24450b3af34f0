use crate::core::csv_store::CsvStore;
use crate::core::html::parse_search_result;
use crate::domain::model::{IdentityRecord, IDENTITY_COLUMNS};
use crate::domain::ports::{Fetcher, ScrapeJob, Storage};
use crate::utils::error::{Result, ScrapeError};
use async_trait::async_trait;
use std::sync::Arc;
use url::Url;

const SEARCH_PATH: &str = "schnellsuche/ergebnis/schnellsuche";

/// Resolves player names to (slug, Transfermarkt ID) via the site search
/// and appends one identity row per name as it completes. Misses are
/// appended with empty fields so they are not searched again next run.
pub struct IdentityJob<F: Fetcher, S: Storage> {
    fetcher: Arc<F>,
    names: CsvStore<S>,
    output: CsvStore<S>,
    base_url: Url,
    offset: usize,
    limit: Option<usize>,
}

impl<F: Fetcher, S: Storage + Clone> IdentityJob<F, S> {
    pub fn new(
        fetcher: Arc<F>,
        storage: S,
        names_path: &str,
        output_path: &str,
        base_url: Url,
        offset: usize,
        limit: Option<usize>,
    ) -> Self {
        Self {
            fetcher,
            names: CsvStore::new(storage.clone(), names_path, &["Name"]),
            output: CsvStore::new(storage, output_path, IDENTITY_COLUMNS),
            base_url,
            offset,
            limit,
        }
    }
}

impl<F: Fetcher, S: Storage> IdentityJob<F, S> {
    fn search_url(&self, name: &str) -> Result<Url> {
        let mut url =
            self.base_url
                .join(SEARCH_PATH)
                .map_err(|e| ScrapeError::InvalidConfigValueError {
                    field: "base_url".to_string(),
                    value: self.base_url.to_string(),
                    reason: e.to_string(),
                })?;
        url.query_pairs_mut().append_pair("query", name);
        Ok(url)
    }
}

#[async_trait]
impl<F, S> ScrapeJob for IdentityJob<F, S>
where
    F: Fetcher + 'static,
    S: Storage + 'static,
{
    type Item = String;

    fn name(&self) -> &'static str {
        "identity lookup"
    }

    fn label(&self, item: &String) -> String {
        item.clone()
    }

    /// Input names minus those already in the output file, input duplicates
    /// collapsed, windowed by offset/limit.
    async fn pending(&self) -> Result<Vec<String>> {
        let all = self.names.column_list("Name").await?;
        let mut seen = self.output.column_values("Name").await?;

        let remaining: Vec<String> = all
            .into_iter()
            .filter(|name| !name.is_empty() && seen.insert(name.clone()))
            .collect();

        Ok(remaining
            .into_iter()
            .skip(self.offset)
            .take(self.limit.unwrap_or(usize::MAX))
            .collect())
    }

    async fn process(&self, name: String) -> Result<usize> {
        let url = self.search_url(&name)?;
        let body = self.fetcher.fetch(url.as_str()).await?;

        let record = match parse_search_result(&body, &name) {
            Some(hit) => {
                tracing::debug!(name = %name, query = %hit.query, id = hit.transfermarkt_id, "resolved");
                IdentityRecord::hit(name, hit.query, hit.transfermarkt_id)
            }
            None => {
                tracing::debug!(name = %name, "no exact search match");
                IdentityRecord::miss(name)
            }
        };

        self.output.append(std::slice::from_ref(&record)).await?;
        Ok(1)
    }
}
