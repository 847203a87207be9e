//! Query side of the remote ledger, expressed as a trait so the synchronizer
//! can run against the JSON-RPC client or an in-memory store.

use std::future::Future;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::address::Address;
use crate::errors::{BoardError, Result};

/// One page of a cursor-paginated listing.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub data: Vec<T>,
    #[serde(default)]
    pub next_cursor: Option<Value>,
    #[serde(default)]
    pub has_next_page: bool,
}

/// Name half of a dynamic-field entry: the key's Move type and JSON value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldName {
    #[serde(rename = "type")]
    pub type_name: String,
    pub value: Value,
}

/// An entry of a nested collection: its key inside the parent and the
/// storage identity of the field object holding the item.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DynamicFieldEntry {
    pub name: FieldName,
    pub object_id: Address,
}

impl DynamicFieldEntry {
    /// The collection key as an address, for collections keyed by address.
    pub fn address_key(&self) -> Result<Address> {
        self.name
            .value
            .as_str()
            .ok_or_else(|| {
                BoardError::malformed(format!(
                    "collection key of {} is not a string",
                    self.object_id
                ))
            })
            .and_then(Address::parse)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventEnvelope {
    #[serde(rename = "type")]
    pub event_type: String,
    #[serde(default)]
    pub parsed_json: Option<Value>,
    #[serde(default)]
    pub timestamp_ms: Option<String>,
}

/// An object owned by an account, with whatever content the node returned.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectData {
    pub object_id: Address,
    #[serde(rename = "type", default)]
    pub object_type: Option<String>,
    #[serde(default)]
    pub content: Option<Value>,
}

/// Result of looking up an executed transaction by digest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransactionOutcome {
    Success,
    Failure(String),
}

#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Parsed content of an object, or `None` when the object has none.
    async fn get_object(&self, id: &Address) -> Result<Option<Value>>;

    async fn get_dynamic_fields(
        &self,
        parent: &Address,
        cursor: Option<Value>,
        limit: u32,
    ) -> Result<Page<DynamicFieldEntry>>;

    async fn query_events(
        &self,
        event_type: &str,
        cursor: Option<Value>,
        limit: u32,
    ) -> Result<Page<EventEnvelope>>;

    async fn get_owned_objects(
        &self,
        owner: &Address,
        cursor: Option<Value>,
        limit: u32,
    ) -> Result<Page<ObjectData>>;

    /// `None` until the transaction is known to the node.
    async fn get_transaction(&self, digest: &str) -> Result<Option<TransactionOutcome>>;
}

/// Follow `next_cursor` until the listing is exhausted.
pub async fn collect_pages<T, F, Fut>(mut fetch: F) -> Result<Vec<T>>
where
    F: FnMut(Option<Value>) -> Fut,
    Fut: Future<Output = Result<Page<T>>>,
{
    let mut items = Vec::new();
    let mut cursor: Option<Value> = None;

    loop {
        let page = fetch(cursor.clone()).await?;
        debug!(
            "Fetched page of {} items (has_next_page={})",
            page.data.len(),
            page.has_next_page
        );
        items.extend(page.data);

        match page.next_cursor {
            Some(next) if page.has_next_page && !next.is_null() => {
                if cursor.as_ref() == Some(&next) {
                    return Err(BoardError::RemoteCall(format!(
                        "pagination cursor did not advance: {next}"
                    )));
                }
                cursor = Some(next);
            }
            _ => return Ok(items),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn follows_cursors_until_last_page() {
        let pages = vec![
            Page { data: vec![1, 2], next_cursor: Some(json!("a")), has_next_page: true },
            Page { data: vec![3], next_cursor: Some(json!("b")), has_next_page: true },
            Page { data: vec![4], next_cursor: Some(json!("c")), has_next_page: false },
        ];
        let mut seen = Vec::new();
        let items = collect_pages(|cursor| {
            seen.push(cursor.clone());
            let idx = seen.len() - 1;
            let page = pages[idx].clone();
            async move { Ok(page) }
        })
        .await
        .unwrap();

        assert_eq!(items, vec![1, 2, 3, 4]);
        assert_eq!(seen, vec![None, Some(json!("a")), Some(json!("b"))]);
    }

    #[tokio::test]
    async fn stuck_cursor_is_an_error() {
        let result: Result<Vec<u8>> = collect_pages(|_| async {
            Ok(Page { data: vec![], next_cursor: Some(json!("same")), has_next_page: true })
        })
        .await;
        assert!(matches!(result, Err(BoardError::RemoteCall(_))));
    }

    #[test]
    fn dynamic_field_entry_from_node_json() {
        let entry: DynamicFieldEntry = serde_json::from_value(json!({
            "name": { "type": "address", "value": "0xb1" },
            "bcsName": "ignored",
            "type": "DynamicField",
            "objectType": "0x1::bountyboard::Task",
            "objectId": "0xc1",
            "version": 3,
            "digest": "abc"
        }))
        .unwrap();
        assert_eq!(entry.address_key().unwrap(), Address::parse("0xb1").unwrap());
        assert_eq!(entry.object_id, Address::parse("0xc1").unwrap());
    }
}
