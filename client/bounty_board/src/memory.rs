//! In-memory [`ObjectStore`] for tests.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::address::Address;
use crate::errors::{BoardError, Result};
use crate::store::{
    DynamicFieldEntry, EventEnvelope, FieldName, ObjectData, ObjectStore, Page, TransactionOutcome,
};

#[derive(Default)]
pub struct MemoryStore {
    objects: HashMap<Address, Value>,
    fields: HashMap<Address, Vec<DynamicFieldEntry>>,
    events: Vec<EventEnvelope>,
    owned: HashMap<Address, Vec<ObjectData>>,
    failing: HashSet<Address>,
    delays: HashMap<Address, Duration>,
    transactions: Mutex<HashMap<String, TransactionOutcome>>,
    calls: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_object(&mut self, id: Address, content: Value) {
        self.objects.insert(id, content);
    }

    /// Register `item` under `key` in the collection `parent`, stored as `object_id`.
    pub fn insert_field(&mut self, parent: Address, key: Address, object_id: Address, item: Value) {
        self.fields.entry(parent).or_default().push(DynamicFieldEntry {
            name: FieldName {
                type_name: "address".to_string(),
                value: json!(key.to_string()),
            },
            object_id,
        });
        self.objects.insert(object_id, item);
    }

    pub fn push_event(&mut self, event_type: &str, parsed_json: Value) {
        self.events.push(EventEnvelope {
            event_type: event_type.to_string(),
            parsed_json: Some(parsed_json),
            timestamp_ms: None,
        });
    }

    pub fn insert_owned(&mut self, owner: Address, object: ObjectData) {
        self.owned.entry(owner).or_default().push(object);
    }

    /// Make every `get_object` for `id` fail with a remote error.
    pub fn fail_object(&mut self, id: Address) {
        self.failing.insert(id);
    }

    pub fn delay_object(&mut self, id: Address, delay: Duration) {
        self.delays.insert(id, delay);
    }

    pub fn record_transaction(&self, digest: &str, outcome: TransactionOutcome) {
        if let Ok(mut txs) = self.transactions.lock() {
            txs.insert(digest.to_string(), outcome);
        }
    }

    /// Number of store calls served so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn touch(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

fn paginate<T: Clone>(items: &[T], cursor: Option<Value>, limit: u32) -> Page<T> {
    let start = cursor.and_then(|c| c.as_u64()).unwrap_or(0) as usize;
    let end = (start + limit.max(1) as usize).min(items.len());
    let data = items.get(start..end).map(<[T]>::to_vec).unwrap_or_default();
    let has_next_page = end < items.len();
    Page {
        data,
        next_cursor: has_next_page.then(|| json!(end)),
        has_next_page,
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn get_object(&self, id: &Address) -> Result<Option<Value>> {
        self.touch();
        if let Some(delay) = self.delays.get(id) {
            tokio::time::sleep(*delay).await;
        }
        if self.failing.contains(id) {
            return Err(BoardError::RemoteCall(format!("injected failure for {id}")));
        }
        Ok(self.objects.get(id).cloned())
    }

    async fn get_dynamic_fields(
        &self,
        parent: &Address,
        cursor: Option<Value>,
        limit: u32,
    ) -> Result<Page<DynamicFieldEntry>> {
        self.touch();
        let entries = self.fields.get(parent).map(Vec::as_slice).unwrap_or_default();
        Ok(paginate(entries, cursor, limit))
    }

    async fn query_events(
        &self,
        event_type: &str,
        cursor: Option<Value>,
        limit: u32,
    ) -> Result<Page<EventEnvelope>> {
        self.touch();
        let matching: Vec<EventEnvelope> = self
            .events
            .iter()
            .filter(|e| e.event_type == event_type)
            .cloned()
            .collect();
        Ok(paginate(&matching, cursor, limit))
    }

    async fn get_owned_objects(
        &self,
        owner: &Address,
        cursor: Option<Value>,
        limit: u32,
    ) -> Result<Page<ObjectData>> {
        self.touch();
        let objects = self.owned.get(owner).map(Vec::as_slice).unwrap_or_default();
        Ok(paginate(objects, cursor, limit))
    }

    async fn get_transaction(&self, digest: &str) -> Result<Option<TransactionOutcome>> {
        self.touch();
        let txs = self
            .transactions
            .lock()
            .map_err(|_| BoardError::RemoteCall("transaction table poisoned".to_string()))?;
        Ok(txs.get(digest).cloned())
    }
}
