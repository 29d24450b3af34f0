use crate::utils::error::Result;
use async_trait::async_trait;

/// Fetches one page body. The seam that keeps every network-dependent
/// path mockable in tests.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String>;
}

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
    fn append_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

/// A scrape operation the runner can drive: `pending` yields the work left
/// after deduplicating against the output file, `process` fetches, parses,
/// and durably appends the rows for one item.
#[async_trait]
pub trait ScrapeJob: Send + Sync {
    type Item: Send + 'static;

    fn name(&self) -> &'static str;

    /// Log label for one work item.
    fn label(&self, item: &Self::Item) -> String;

    async fn pending(&self) -> Result<Vec<Self::Item>>;

    /// Returns the number of rows appended for this item.
    async fn process(&self, item: Self::Item) -> Result<usize>;
}
