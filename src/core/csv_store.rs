use crate::domain::ports::Storage;
use crate::utils::error::{Result, ScrapeError};
use csv::{ReaderBuilder, StringRecord, WriterBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashSet;
use tokio::sync::Mutex;

/// Schema-checked CSV persistence over a [`Storage`] backend.
///
/// Appends are serialized by an internal lock, so concurrent workers can
/// never interleave partial writes. The header is written on first append
/// and validated on every later one.
pub struct CsvStore<S: Storage> {
    storage: S,
    path: String,
    columns: &'static [&'static str],
    write_lock: Mutex<()>,
}

impl<S: Storage> CsvStore<S> {
    pub fn new(storage: S, path: impl Into<String>, columns: &'static [&'static str]) -> Self {
        Self {
            storage,
            path: path.into(),
            columns,
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// `None` when the file does not exist yet or is empty.
    async fn read_existing(&self) -> Result<Option<Vec<u8>>> {
        match self.storage.read_file(&self.path).await {
            Ok(data) if data.is_empty() => Ok(None),
            Ok(data) => Ok(Some(data)),
            Err(ScrapeError::IoError(e)) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Values of one named column, in file order. Empty when the file does
    /// not exist yet. The column must be present in the header.
    pub async fn column_list(&self, column: &str) -> Result<Vec<String>> {
        let Some(data) = self.read_existing().await? else {
            return Ok(Vec::new());
        };

        let mut rdr = ReaderBuilder::new()
            .has_headers(true)
            .from_reader(data.as_slice());
        let headers = rdr.headers()?.clone();
        let index = headers.iter().position(|h| h == column).ok_or_else(|| {
            ScrapeError::SchemaError {
                path: self.path.clone(),
                expected: column.to_string(),
                found: headers.iter().collect::<Vec<_>>().join(","),
            }
        })?;

        let mut values = Vec::new();
        for record in rdr.records() {
            let record = record?;
            if let Some(value) = record.get(index) {
                values.push(value.to_string());
            }
        }
        Ok(values)
    }

    /// The distinct values of one named column. The dedup source between runs.
    pub async fn column_values(&self, column: &str) -> Result<HashSet<String>> {
        Ok(self.column_list(column).await?.into_iter().collect())
    }

    pub async fn read_records<T: DeserializeOwned>(&self) -> Result<Vec<T>> {
        let Some(data) = self.read_existing().await? else {
            return Ok(Vec::new());
        };

        let mut rdr = ReaderBuilder::new()
            .has_headers(true)
            .from_reader(data.as_slice());
        let mut records = Vec::new();
        for record in rdr.deserialize() {
            records.push(record?);
        }
        Ok(records)
    }

    /// Append rows, creating the file with a header when absent. Appending
    /// to a file whose header differs from the schema is an error, never a
    /// silent misaligned append.
    pub async fn append<T: Serialize>(&self, rows: &[T]) -> Result<()> {
        if rows.is_empty() {
            return Ok(());
        }

        let _guard = self.write_lock.lock().await;

        match self.read_existing().await? {
            None => {
                let mut wtr = WriterBuilder::new()
                    .has_headers(false)
                    .from_writer(Vec::new());
                wtr.write_record(self.columns)?;
                for row in rows {
                    wtr.serialize(row)?;
                }
                let data = wtr.into_inner().map_err(|e| e.into_error())?;
                self.storage.write_file(&self.path, &data).await
            }
            Some(existing) => {
                self.check_header(&existing)?;
                let mut wtr = WriterBuilder::new()
                    .has_headers(false)
                    .from_writer(Vec::new());
                for row in rows {
                    wtr.serialize(row)?;
                }
                let data = wtr.into_inner().map_err(|e| e.into_error())?;
                self.storage.append_file(&self.path, &data).await
            }
        }
    }

    fn check_header(&self, existing: &[u8]) -> Result<()> {
        let mut rdr = ReaderBuilder::new().has_headers(true).from_reader(existing);
        let headers = rdr.headers()?;
        if headers.iter().eq(self.columns.iter().copied()) {
            Ok(())
        } else {
            Err(ScrapeError::SchemaError {
                path: self.path.clone(),
                expected: self.columns.join(","),
                found: headers.iter().collect::<Vec<_>>().join(","),
            })
        }
    }

    /// Give a headerless file its canonical header. Returns `false` when the
    /// header is already in place; running this twice never corrupts a file.
    pub async fn repair_header(&self) -> Result<bool> {
        let _guard = self.write_lock.lock().await;

        let data = self.storage.read_file(&self.path).await?;
        let mut rdr = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(data.as_slice());
        let records: Vec<StringRecord> = rdr.records().collect::<csv::Result<_>>()?;

        if let Some(first) = records.first() {
            if first.iter().eq(self.columns.iter().copied()) {
                return Ok(false);
            }
        }

        for (i, record) in records.iter().enumerate() {
            if record.len() != self.columns.len() {
                return Err(ScrapeError::SchemaError {
                    path: self.path.clone(),
                    expected: self.columns.join(","),
                    found: format!("{} columns in row {}", record.len(), i + 1),
                });
            }
        }

        let mut wtr = WriterBuilder::new()
            .has_headers(false)
            .from_writer(Vec::new());
        wtr.write_record(self.columns)?;
        for record in &records {
            wtr.write_record(record)?;
        }
        let repaired = wtr.into_inner().map_err(|e| e.into_error())?;
        self.storage.write_file(&self.path, &repaired).await?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::storage::LocalStorage;
    use crate::domain::model::{IdentityRecord, TransferRow, IDENTITY_COLUMNS, TRANSFER_COLUMNS};
    use tempfile::TempDir;

    fn store(
        temp_dir: &TempDir,
        path: &str,
        columns: &'static [&'static str],
    ) -> CsvStore<LocalStorage> {
        let storage = LocalStorage::new(temp_dir.path().to_str().unwrap().to_string());
        CsvStore::new(storage, path, columns)
    }

    fn read_file(temp_dir: &TempDir, path: &str) -> String {
        std::fs::read_to_string(temp_dir.path().join(path)).unwrap()
    }

    #[tokio::test]
    async fn test_first_append_writes_header() {
        let temp_dir = TempDir::new().unwrap();
        let store = store(&temp_dir, "ids.csv", IDENTITY_COLUMNS);

        store
            .append(&[IdentityRecord::hit(
                "Lionel Messi".to_string(),
                "lionel-messi".to_string(),
                28003,
            )])
            .await
            .unwrap();

        let text = read_file(&temp_dir, "ids.csv");
        assert_eq!(
            text,
            "Name,Query,TransfermarktId\nLionel Messi,lionel-messi,28003\n"
        );
    }

    #[tokio::test]
    async fn test_later_appends_skip_header() {
        let temp_dir = TempDir::new().unwrap();
        let store = store(&temp_dir, "ids.csv", IDENTITY_COLUMNS);

        store
            .append(&[IdentityRecord::miss("A".to_string())])
            .await
            .unwrap();
        store
            .append(&[IdentityRecord::miss("B".to_string())])
            .await
            .unwrap();

        let text = read_file(&temp_dir, "ids.csv");
        assert_eq!(text, "Name,Query,TransfermarktId\nA,,\nB,,\n");
    }

    #[tokio::test]
    async fn test_append_rejects_mismatched_header() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(temp_dir.path().join("ids.csv"), "Wrong,Header\nx,y\n").unwrap();
        let store = store(&temp_dir, "ids.csv", IDENTITY_COLUMNS);

        let err = store
            .append(&[IdentityRecord::miss("A".to_string())])
            .await
            .unwrap_err();
        match err {
            ScrapeError::SchemaError { expected, found, .. } => {
                assert_eq!(expected, "Name,Query,TransfermarktId");
                assert_eq!(found, "Wrong,Header");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_column_values_on_missing_file_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let store = store(&temp_dir, "ids.csv", IDENTITY_COLUMNS);

        assert!(store.column_values("Name").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_column_values_deduplicates() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(
            temp_dir.path().join("transfers.csv"),
            "Query,Season_Name,Date,Old_Club,New_Club,Market_Value,Transfer_Fee\n\
             messi,18/19,a,b,c,d,e\n\
             messi,17/18,a,b,c,d,e\n\
             ronaldo,18/19,a,b,c,d,e\n",
        )
        .unwrap();
        let store = store(&temp_dir, "transfers.csv", TRANSFER_COLUMNS);

        let values = store.column_values("Query").await.unwrap();
        assert_eq!(values.len(), 2);
        assert!(values.contains("messi"));
        assert!(values.contains("ronaldo"));
    }

    #[tokio::test]
    async fn test_column_values_unknown_column_errors() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(temp_dir.path().join("ids.csv"), "Name,Query,TransfermarktId\n").unwrap();
        let store = store(&temp_dir, "ids.csv", IDENTITY_COLUMNS);

        assert!(store.column_values("Nope").await.is_err());
    }

    #[tokio::test]
    async fn test_read_records_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let store = store(&temp_dir, "transfers.csv", TRANSFER_COLUMNS);

        let row = TransferRow {
            query: "lionel-messi".to_string(),
            season_name: "21/22".to_string(),
            date: "Aug 5, 2021".to_string(),
            old_club: "FC Barcelona".to_string(),
            new_club: "Paris SG".to_string(),
            market_value: "€80.00m".to_string(),
            transfer_fee: "free transfer".to_string(),
        };
        store.append(std::slice::from_ref(&row)).await.unwrap();

        let records: Vec<TransferRow> = store.read_records().await.unwrap();
        assert_eq!(records, vec![row]);
    }

    #[tokio::test]
    async fn test_repair_header_adds_missing_header() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(
            temp_dir.path().join("transfers.csv"),
            "messi,18/19,Jul 1,Barca,PSG,€80.00m,free\n",
        )
        .unwrap();
        let store = store(&temp_dir, "transfers.csv", TRANSFER_COLUMNS);

        assert!(store.repair_header().await.unwrap());
        let text = read_file(&temp_dir, "transfers.csv");
        assert_eq!(
            text,
            "Query,Season_Name,Date,Old_Club,New_Club,Market_Value,Transfer_Fee\n\
             messi,18/19,Jul 1,Barca,PSG,€80.00m,free\n"
        );
    }

    #[tokio::test]
    async fn test_repair_header_is_idempotent() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(
            temp_dir.path().join("transfers.csv"),
            "Query,Season_Name,Date,Old_Club,New_Club,Market_Value,Transfer_Fee\n\
             messi,18/19,Jul 1,Barca,PSG,€80.00m,free\n",
        )
        .unwrap();
        let store = store(&temp_dir, "transfers.csv", TRANSFER_COLUMNS);

        assert!(!store.repair_header().await.unwrap());
        assert!(!store.repair_header().await.unwrap());
    }

    #[tokio::test]
    async fn test_repair_header_rejects_ragged_rows() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(temp_dir.path().join("transfers.csv"), "only,three,cols\n").unwrap();
        let store = store(&temp_dir, "transfers.csv", TRANSFER_COLUMNS);

        let err = store.repair_header().await.unwrap_err();
        match err {
            ScrapeError::SchemaError { found, .. } => assert!(found.contains("3 columns")),
            other => panic!("unexpected error: {other}"),
        }
    }
}
