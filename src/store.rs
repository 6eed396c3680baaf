//! Persistence contract (spec.md §6.3). The core never depends on a
//! concrete storage engine; callers inject an `Arc<dyn AvlStore>`.

use crate::error::StoreError;
use crate::record::AvlRecord;
use async_trait::async_trait;
use std::sync::Mutex;

#[async_trait]
pub trait AvlStore: Send + Sync {
    async fn save_batch(&self, records: &[AvlRecord]) -> Result<(), StoreError>;
    async fn save_raw(&self, imei: &str, payload_hex: &str) -> Result<(), StoreError>;
}

/// No-op store used when no real backend is configured.
pub struct NullStore;

#[async_trait]
impl AvlStore for NullStore {
    async fn save_batch(&self, _records: &[AvlRecord]) -> Result<(), StoreError> {
        Ok(())
    }

    async fn save_raw(&self, _imei: &str, _payload_hex: &str) -> Result<(), StoreError> {
        Ok(())
    }
}

/// Records every call for test assertions; never errors.
#[derive(Default)]
pub struct InMemoryStore {
    pub batches: Mutex<Vec<Vec<AvlRecord>>>,
    pub raw: Mutex<Vec<(String, String)>>,
}

#[async_trait]
impl AvlStore for InMemoryStore {
    async fn save_batch(&self, records: &[AvlRecord]) -> Result<(), StoreError> {
        self.batches.lock().unwrap().push(records.to_vec());
        Ok(())
    }

    async fn save_raw(&self, imei: &str, payload_hex: &str) -> Result<(), StoreError> {
        self.raw.lock().unwrap().push((imei.to_owned(), payload_hex.to_owned()));
        Ok(())
    }
}
