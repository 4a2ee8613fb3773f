//! In-memory emulator backends for deterministic testing and demo mode.
//!
//! Both stores keep a call counter per operation so tests can assert that
//! an operation never reached the backend, and support failure injection
//! so fallback paths can be exercised.
//!
//! ## Usage
//!
//! ```rust,ignore
//! let tables = MemoryTableStore::new();
//! tables.put_item("Notes", item).await?;
//! assert_eq!(tables.call_count(), 1);
//!
//! let broken = MemoryTableStore::new().with_failures();
//! assert!(broken.scan("Notes").await.is_err());
//! ```

use async_trait::async_trait;
use serde_json::Value as JsonValue;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use studynotes_core::{AttrValue, Error, Item, ObjectStore, Result, TableStore};

fn item_id(item: &Item) -> Result<String> {
    match item.get("id") {
        Some(AttrValue::S(id)) => Ok(id.clone()),
        _ => Err(Error::InvalidInput("item has no string id attribute".into())),
    }
}

fn item_version(item: &Item) -> Option<i64> {
    match item.get("version") {
        Some(AttrValue::N(n)) => n.parse().ok(),
        _ => None,
    }
}

/// In-memory table store.
#[derive(Clone, Default)]
pub struct MemoryTableStore {
    tables: Arc<Mutex<HashMap<String, BTreeMap<String, Item>>>>,
    calls: Arc<Mutex<HashMap<&'static str, u64>>>,
    fail: Arc<AtomicBool>,
}

impl MemoryTableStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent operation fail as unreachable.
    pub fn with_failures(self) -> Self {
        self.fail.store(true, Ordering::SeqCst);
        self
    }

    /// Flip failure injection on or off at runtime.
    pub fn set_failing(&self, failing: bool) {
        self.fail.store(failing, Ordering::SeqCst);
    }

    /// Total number of backend calls across all operations.
    pub fn call_count(&self) -> u64 {
        self.calls.lock().unwrap().values().sum()
    }

    /// Number of backend calls for one operation name.
    pub fn call_count_for(&self, op: &str) -> u64 {
        self.calls.lock().unwrap().get(op).copied().unwrap_or(0)
    }

    fn record(&self, op: &'static str) -> Result<()> {
        *self.calls.lock().unwrap().entry(op).or_insert(0) += 1;
        if self.fail.load(Ordering::SeqCst) {
            return Err(Error::Unavailable("memory table store failing".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl TableStore for MemoryTableStore {
    async fn put_item(&self, table: &str, item: Item) -> Result<()> {
        self.record("put_item")?;
        let id = item_id(&item)?;
        self.tables
            .lock()
            .unwrap()
            .entry(table.to_string())
            .or_default()
            .insert(id, item);
        Ok(())
    }

    async fn put_item_versioned(
        &self,
        table: &str,
        item: Item,
        expected_version: Option<i64>,
    ) -> Result<bool> {
        self.record("put_item_versioned")?;
        let id = item_id(&item)?;
        let mut tables = self.tables.lock().unwrap();
        let rows = tables.entry(table.to_string()).or_default();
        let current = rows.get(&id).and_then(item_version);
        let matches = match expected_version {
            None => !rows.contains_key(&id),
            Some(v) => current == Some(v),
        };
        if !matches {
            return Ok(false);
        }
        rows.insert(id, item);
        Ok(true)
    }

    async fn get_item(&self, table: &str, id: &str) -> Result<Option<Item>> {
        self.record("get_item")?;
        Ok(self
            .tables
            .lock()
            .unwrap()
            .get(table)
            .and_then(|rows| rows.get(id))
            .cloned())
    }

    async fn query_index(
        &self,
        table: &str,
        _index: &str,
        key_attr: &str,
        key_value: &str,
    ) -> Result<Vec<Item>> {
        self.record("query_index")?;
        Ok(self
            .tables
            .lock()
            .unwrap()
            .get(table)
            .map(|rows| {
                rows.values()
                    .filter(|item| {
                        matches!(item.get(key_attr), Some(AttrValue::S(v)) if v == key_value)
                    })
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn scan(&self, table: &str) -> Result<Vec<Item>> {
        self.record("scan")?;
        Ok(self
            .tables
            .lock()
            .unwrap()
            .get(table)
            .map(|rows| rows.values().cloned().collect())
            .unwrap_or_default())
    }

    async fn delete_item(&self, table: &str, id: &str) -> Result<()> {
        self.record("delete_item")?;
        if let Some(rows) = self.tables.lock().unwrap().get_mut(table) {
            rows.remove(id);
        }
        Ok(())
    }
}

/// In-memory object store.
#[derive(Clone, Default)]
pub struct MemoryObjectStore {
    objects: Arc<Mutex<HashMap<String, (Vec<u8>, String)>>>,
    calls: Arc<Mutex<HashMap<&'static str, u64>>>,
    fail: Arc<AtomicBool>,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent operation fail as unreachable.
    pub fn with_failures(self) -> Self {
        self.fail.store(true, Ordering::SeqCst);
        self
    }

    /// Total number of backend calls across all operations.
    pub fn call_count(&self) -> u64 {
        self.calls.lock().unwrap().values().sum()
    }

    /// Content type stored alongside an object, if present.
    pub fn content_type_of(&self, key: &str) -> Option<String> {
        self.objects
            .lock()
            .unwrap()
            .get(key)
            .map(|(_, ct)| ct.clone())
    }

    fn record(&self, op: &'static str) -> Result<()> {
        *self.calls.lock().unwrap().entry(op).or_insert(0) += 1;
        if self.fail.load(Ordering::SeqCst) {
            return Err(Error::Unavailable("memory object store failing".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn put(&self, key: &str, data: &[u8], content_type: &str) -> Result<()> {
        self.record("put")?;
        self.objects
            .lock()
            .unwrap()
            .insert(key.to_string(), (data.to_vec(), content_type.to_string()));
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>> {
        self.record("get")?;
        self.objects
            .lock()
            .unwrap()
            .get(key)
            .map(|(data, _)| data.clone())
            .ok_or_else(|| Error::ObjectNotFound(key.to_string()))
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.record("delete")?;
        self.objects.lock().unwrap().remove(key);
        Ok(())
    }
}

/// Function invoker that fails every call; used where no function backend
/// is wired up.
#[derive(Clone, Default)]
pub struct NoFunctionInvoker;

#[async_trait]
impl studynotes_core::FunctionInvoker for NoFunctionInvoker {
    async fn invoke(&self, function: &str, _payload: JsonValue) -> Result<JsonValue> {
        Err(Error::Unavailable(format!(
            "no function backend registered for {function}"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use studynotes_core::{note_to_item, seed_notes, RecordStatus};

    #[tokio::test]
    async fn test_put_get_scan_delete() {
        let store = MemoryTableStore::new();
        let item = note_to_item(&seed_notes()[0], RecordStatus::Active);
        store.put_item("Notes", item.clone()).await.unwrap();

        assert_eq!(store.get_item("Notes", "1").await.unwrap(), Some(item));
        assert_eq!(store.scan("Notes").await.unwrap().len(), 1);

        store.delete_item("Notes", "1").await.unwrap();
        assert_eq!(store.get_item("Notes", "1").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_query_index_filters_by_attribute() {
        let store = MemoryTableStore::new();
        for note in seed_notes() {
            store
                .put_item("Notes", note_to_item(&note, RecordStatus::Active))
                .await
                .unwrap();
        }
        let hits = store
            .query_index("Notes", "SubjectIndex", "subjectId", "2")
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);
    }

    #[tokio::test]
    async fn test_versioned_put_detects_conflict() {
        let store = MemoryTableStore::new();
        let mut note = seed_notes()[0].clone();
        note.version = 0;
        let item = note_to_item(&note, RecordStatus::Active);

        // Insert requires the item to be absent.
        assert!(store
            .put_item_versioned("Notes", item.clone(), None)
            .await
            .unwrap());
        assert!(!store
            .put_item_versioned("Notes", item.clone(), None)
            .await
            .unwrap());

        // Update conditioned on the stored version.
        note.version = 1;
        let updated = note_to_item(&note, RecordStatus::Active);
        assert!(store
            .put_item_versioned("Notes", updated.clone(), Some(0))
            .await
            .unwrap());
        assert!(!store
            .put_item_versioned("Notes", updated, Some(0))
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_call_counting_and_failure_injection() {
        let store = MemoryTableStore::new();
        let _ = store.scan("Notes").await;
        let _ = store.get_item("Notes", "1").await;
        assert_eq!(store.call_count(), 2);
        assert_eq!(store.call_count_for("scan"), 1);

        store.set_failing(true);
        assert!(matches!(
            store.scan("Notes").await,
            Err(Error::Unavailable(_))
        ));
    }

    #[tokio::test]
    async fn test_object_store_roundtrip() {
        let store = MemoryObjectStore::new();
        store
            .put("notes/1/a.txt", b"hello", "text/plain")
            .await
            .unwrap();
        assert_eq!(store.get("notes/1/a.txt").await.unwrap(), b"hello");
        assert_eq!(
            store.content_type_of("notes/1/a.txt").as_deref(),
            Some("text/plain")
        );
        store.delete("notes/1/a.txt").await.unwrap();
        assert!(matches!(
            store.get("notes/1/a.txt").await,
            Err(Error::ObjectNotFound(_))
        ));
    }
}
