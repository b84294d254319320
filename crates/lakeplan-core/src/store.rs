//! Configuration store access
//!
//! The store is read page by page; [`fetch_all_records`] follows page tokens
//! until the result set is exhausted.

use crate::error::TransportError;
use async_trait::async_trait;
use lakeplan_config::ConfigRecord;
use parking_lot::RwLock;
use std::path::PathBuf;

const STORE: &str = "config store";

/// Default number of records per page
pub const DEFAULT_PAGE_SIZE: usize = 100;

/// One page of a tenant's records
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordPage {
    /// Records on this page
    pub records: Vec<ConfigRecord>,
    /// Token of the next page, `None` on the last page
    pub next_page_token: Option<String>,
}

/// Read-only access to stored configuration records
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ConfigStore: Send + Sync {
    /// Fetch one page of records belonging to `tenant`
    async fn list_records_page(
        &self,
        tenant: &str,
        page_token: Option<String>,
    ) -> Result<RecordPage, TransportError>;
}

/// Fetch every record of a tenant, across all pages
///
/// # Errors
/// - any `TransportError` of the underlying store
pub async fn fetch_all_records(
    store: &dyn ConfigStore,
    tenant: &str,
) -> Result<Vec<ConfigRecord>, TransportError> {
    let mut records = Vec::new();
    let mut page_token = None;
    let mut pages = 0usize;

    loop {
        let page = store.list_records_page(tenant, page_token.take()).await?;
        pages += 1;
        records.extend(page.records);

        match page.next_page_token {
            Some(token) => page_token = Some(token),
            None => break,
        }
    }

    tracing::debug!(tenant, pages, records = records.len(), "Configuration records fetched");
    Ok(records)
}

/// Slice the records of `tenant` into the page addressed by `page_token`
fn paginate(
    records: &[ConfigRecord],
    tenant: &str,
    page_token: Option<&str>,
    page_size: usize,
) -> Result<RecordPage, TransportError> {
    let offset = match page_token {
        Some(token) => token
            .parse::<usize>()
            .map_err(|_| TransportError::malformed(STORE, format!("unknown page token '{token}'")))?,
        None => 0,
    };

    let matching: Vec<&ConfigRecord> = records
        .iter()
        .filter(|record| record.tenant_identifier == tenant)
        .collect();
    let end = offset.saturating_add(page_size.max(1)).min(matching.len());
    let page = matching
        .get(offset..end)
        .unwrap_or_default()
        .iter()
        .map(|record| (*record).clone())
        .collect();

    Ok(RecordPage {
        records: page,
        next_page_token: (end < matching.len()).then(|| end.to_string()),
    })
}

/// Store holding records in memory
#[derive(Debug)]
pub struct InMemoryConfigStore {
    records: RwLock<Vec<ConfigRecord>>,
    page_size: usize,
}

impl InMemoryConfigStore {
    /// Create empty store
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            records: RwLock::new(Vec::new()),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    /// With page size
    #[inline]
    #[must_use]
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// With initial records
    #[inline]
    #[must_use]
    pub fn with_records(self, records: impl IntoIterator<Item = ConfigRecord>) -> Self {
        self.records.write().extend(records);
        self
    }

    /// Add a record
    pub fn insert(&self, record: ConfigRecord) {
        self.records.write().push(record);
    }

    /// Number of stored records across tenants
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    /// Check if the store is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }
}

impl Default for InMemoryConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ConfigStore for InMemoryConfigStore {
    async fn list_records_page(
        &self,
        tenant: &str,
        page_token: Option<String>,
    ) -> Result<RecordPage, TransportError> {
        paginate(&self.records.read(), tenant, page_token.as_deref(), self.page_size)
    }
}

/// Store backed by a JSON array of records on disk
///
/// The file is re-read on every page so edits are visible to the next fetch.
#[derive(Debug, Clone)]
pub struct JsonFileConfigStore {
    path: PathBuf,
    page_size: usize,
}

impl JsonFileConfigStore {
    /// Create store reading `path`
    #[inline]
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    /// With page size
    #[inline]
    #[must_use]
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Backing file
    #[inline]
    #[must_use]
    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    async fn load(&self) -> Result<Vec<ConfigRecord>, TransportError> {
        let raw = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|source| TransportError::Io {
                path: self.path.clone(),
                source,
            })?;
        serde_json::from_str(&raw).map_err(|e| TransportError::malformed(STORE, e.to_string()))
    }
}

#[async_trait]
impl ConfigStore for JsonFileConfigStore {
    async fn list_records_page(
        &self,
        tenant: &str,
        page_token: Option<String>,
    ) -> Result<RecordPage, TransportError> {
        let records = self.load().await?;
        paginate(&records, tenant, page_token.as_deref(), self.page_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lakeplan_config::PipelineType;
    use lakeplan_test_utils::{pipeline_record, table_record, TENANT};
    use std::io::Write;

    fn tenant_records(count: usize) -> Vec<ConfigRecord> {
        let mut records = vec![pipeline_record(TENANT, PipelineType::BulkInsert)];
        records.extend((1..count).map(|i| table_record(TENANT, &format!("table_{i}"))));
        records
    }

    #[tokio::test]
    async fn fetch_follows_page_tokens() {
        let mut store = MockConfigStore::new();
        store
            .expect_list_records_page()
            .withf(|tenant, token| tenant == TENANT && token.is_none())
            .times(1)
            .returning(|_, _| {
                Ok(RecordPage {
                    records: vec![table_record(TENANT, "a")],
                    next_page_token: Some("p2".to_string()),
                })
            });
        store
            .expect_list_records_page()
            .withf(|tenant, token| tenant == TENANT && token.as_deref() == Some("p2"))
            .times(1)
            .returning(|_, _| {
                Ok(RecordPage {
                    records: vec![table_record(TENANT, "b")],
                    next_page_token: None,
                })
            });

        let records = fetch_all_records(&store, TENANT).await.unwrap();
        assert_eq!(records.len(), 2);
    }

    #[tokio::test]
    async fn fetch_propagates_transport_error() {
        let mut store = MockConfigStore::new();
        store
            .expect_list_records_page()
            .returning(|_, _| Err(TransportError::unavailable(STORE, "throttled")));

        let err = fetch_all_records(&store, TENANT).await.unwrap_err();
        assert!(err.to_string().contains("throttled"));
    }

    #[tokio::test]
    async fn in_memory_store_pages_by_size() {
        let store = InMemoryConfigStore::new()
            .with_page_size(2)
            .with_records(tenant_records(5));
        store.insert(table_record("other", "foreign"));

        let first = store.list_records_page(TENANT, None).await.unwrap();
        assert_eq!(first.records.len(), 2);
        assert_eq!(first.next_page_token.as_deref(), Some("2"));

        let all = fetch_all_records(&store, TENANT).await.unwrap();
        assert_eq!(all.len(), 5);
        assert!(all.iter().all(|r| r.tenant_identifier == TENANT));
        assert_eq!(store.len(), 6);
    }

    #[tokio::test]
    async fn unknown_tenant_yields_single_empty_page() {
        let store = InMemoryConfigStore::new().with_records(tenant_records(3));

        let page = store.list_records_page("nobody", None).await.unwrap();
        assert!(page.records.is_empty());
        assert!(page.next_page_token.is_none());
    }

    #[tokio::test]
    async fn bad_page_token_is_malformed() {
        let store = InMemoryConfigStore::new();
        let err = store
            .list_records_page(TENANT, Some("zzz".to_string()))
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::Malformed { .. }));
    }

    #[tokio::test]
    async fn json_file_store_reads_records() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        let json = serde_json::to_string(&tenant_records(3)).unwrap();
        file.write_all(json.as_bytes()).unwrap();

        let store = JsonFileConfigStore::new(file.path()).with_page_size(1);
        let records = fetch_all_records(&store, TENANT).await.unwrap();
        assert_eq!(records.len(), 3);
    }

    #[tokio::test]
    async fn json_file_store_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileConfigStore::new(dir.path().join("missing.json"));

        let err = fetch_all_records(&store, TENANT).await.unwrap_err();
        assert!(matches!(err, TransportError::Io { .. }));
    }
}
