//! Fullnode JSON-RPC client, the production [`ObjectStore`].
//!
//! Every method performs exactly one request. Retry policy belongs to the
//! caller; deadlines and cancellation are applied by the synchronizer and
//! the submitter around these calls.

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use crate::address::Address;
use crate::errors::{BoardError, Result};
use crate::store::{
    DynamicFieldEntry, EventEnvelope, ObjectData, ObjectStore, Page, TransactionOutcome,
};

// ─────────────────────────────────────────────────────────
// JSON-RPC response shapes
// ─────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct RpcResponse<T> {
    pub result: Option<T>,
    pub error: Option<RpcError>,
}

#[derive(Debug, Deserialize)]
pub struct RpcError {
    pub code: i64,
    pub message: String,
}

/// `sui_getObject` result: either `data` or an object-level `error`.
#[derive(Debug, Deserialize)]
pub struct ObjectResponse {
    pub data: Option<ObjectData>,
    pub error: Option<Value>,
}

#[derive(Debug, Deserialize)]
pub struct OwnedObjectResponse {
    pub data: Option<ObjectData>,
}

#[derive(Debug, Deserialize)]
pub struct TransactionBlockResponse {
    pub effects: Option<TransactionEffects>,
}

#[derive(Debug, Deserialize)]
pub struct TransactionEffects {
    pub status: ExecutionStatus,
}

#[derive(Debug, Deserialize)]
pub struct ExecutionStatus {
    pub status: String,
    pub error: Option<String>,
}

// ─────────────────────────────────────────────────────────
// Client
// ─────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct RpcClient {
    client: Client,
    rpc_url: String,
}

impl RpcClient {
    pub fn new(client: Client, rpc_url: impl Into<String>) -> Self {
        Self {
            client,
            rpc_url: rpc_url.into(),
        }
    }

    pub fn rpc_url(&self) -> &str {
        &self.rpc_url
    }

    /// Issue one JSON-RPC call and decode its `result`.
    async fn call<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T> {
        into_result(method, self.send(method, params).await?)
    }

    /// Issue one JSON-RPC call and return the raw envelope.
    async fn send<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<RpcResponse<T>> {
        debug!("RPC {method} {params}");

        let resp = self
            .client
            .post(&self.rpc_url)
            .json(&json!({
                "jsonrpc": "2.0",
                "id": 1,
                "method": method,
                "params": params,
            }))
            .send()
            .await?;

        let status = resp.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(BoardError::RemoteCall(format!("{method}: rate-limited by RPC")));
        }
        if !status.is_success() {
            return Err(BoardError::RemoteCall(format!("{method}: HTTP {status}")));
        }

        Ok(resp.json().await?)
    }
}

fn into_result<T>(method: &str, body: RpcResponse<T>) -> Result<T> {
    if let Some(err) = body.error {
        return Err(BoardError::RemoteCall(format!(
            "{method}: RPC error {}: {}",
            err.code, err.message
        )));
    }
    body.result
        .ok_or_else(|| BoardError::RemoteCall(format!("{method}: empty result")))
}

#[async_trait]
impl ObjectStore for RpcClient {
    async fn get_object(&self, id: &Address) -> Result<Option<Value>> {
        let resp: ObjectResponse = self
            .call(
                "sui_getObject",
                json!([id.to_string(), { "showContent": true, "showType": true }]),
            )
            .await?;

        if let Some(err) = resp.error {
            debug!("Object {id} unavailable: {err}");
            return Ok(None);
        }
        Ok(resp.data.and_then(|d| d.content))
    }

    async fn get_dynamic_fields(
        &self,
        parent: &Address,
        cursor: Option<Value>,
        limit: u32,
    ) -> Result<Page<DynamicFieldEntry>> {
        self.call(
            "suix_getDynamicFields",
            json!([parent.to_string(), cursor, limit]),
        )
        .await
    }

    async fn query_events(
        &self,
        event_type: &str,
        cursor: Option<Value>,
        limit: u32,
    ) -> Result<Page<EventEnvelope>> {
        self.call(
            "suix_queryEvents",
            json!([{ "MoveEventType": event_type }, cursor, limit, false]),
        )
        .await
    }

    async fn get_owned_objects(
        &self,
        owner: &Address,
        cursor: Option<Value>,
        limit: u32,
    ) -> Result<Page<ObjectData>> {
        let page: Page<OwnedObjectResponse> = self
            .call(
                "suix_getOwnedObjects",
                json!([
                    owner.to_string(),
                    { "filter": null, "options": { "showType": true, "showContent": true } },
                    cursor,
                    limit
                ]),
            )
            .await?;

        Ok(Page {
            data: page.data.into_iter().filter_map(|o| o.data).collect(),
            next_cursor: page.next_cursor,
            has_next_page: page.has_next_page,
        })
    }

    async fn get_transaction(&self, digest: &str) -> Result<Option<TransactionOutcome>> {
        let body = self
            .send(
                "sui_getTransactionBlock",
                json!([digest, { "showEffects": true }]),
            )
            .await?;
        transaction_outcome(body)
    }
}

/// The node answers unknown digests with an RPC error rather than a null result.
fn is_unknown_digest(err: &RpcError) -> bool {
    err.message.contains("Could not find the referenced transaction")
}

fn transaction_outcome(
    body: RpcResponse<TransactionBlockResponse>,
) -> Result<Option<TransactionOutcome>> {
    if body.error.as_ref().is_some_and(is_unknown_digest) {
        return Ok(None);
    }
    let block = into_result("sui_getTransactionBlock", body)?;
    Ok(block.effects.map(|e| outcome_from_status(e.status)))
}

fn outcome_from_status(status: ExecutionStatus) -> TransactionOutcome {
    if status.status == "success" {
        TransactionOutcome::Success
    } else {
        TransactionOutcome::Failure(status.error.unwrap_or(status.status))
    }
}

// ─────────────────────────────────────────────────────────
// Unit tests
// ─────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn object_response_with_content() {
        let resp: RpcResponse<ObjectResponse> = serde_json::from_value(json!({
            "jsonrpc": "2.0",
            "id": 1,
            "result": {
                "data": {
                    "objectId": "0xb1",
                    "version": "7",
                    "digest": "d1",
                    "type": "0xa::bountyboard::BountyBoard",
                    "content": { "dataType": "moveObject", "fields": { "name": "b" } }
                }
            }
        }))
        .unwrap();
        let obj = resp.result.unwrap();
        assert!(obj.error.is_none());
        let data = obj.data.unwrap();
        assert_eq!(data.object_id, Address::parse("0xb1").unwrap());
        assert_eq!(data.content.unwrap()["fields"]["name"], "b");
    }

    #[test]
    fn object_response_not_exists() {
        let resp: RpcResponse<ObjectResponse> = serde_json::from_value(json!({
            "jsonrpc": "2.0",
            "id": 1,
            "result": { "error": { "code": "notExists", "object_id": "0xb1" } }
        }))
        .unwrap();
        let obj = resp.result.unwrap();
        assert!(obj.data.is_none());
        assert!(obj.error.is_some());
    }

    #[test]
    fn rpc_error_envelope() {
        let resp: RpcResponse<ObjectResponse> = serde_json::from_value(json!({
            "jsonrpc": "2.0",
            "id": 1,
            "error": { "code": -32602, "message": "Invalid params" }
        }))
        .unwrap();
        assert!(resp.result.is_none());
        assert_eq!(resp.error.unwrap().code, -32602);
    }

    #[test]
    fn event_page_with_object_cursor() {
        let page: Page<EventEnvelope> = serde_json::from_value(json!({
            "data": [{
                "id": { "txDigest": "t1", "eventSeq": "0" },
                "type": "0xa::bountyboard::BoardCreatedEvent<0x2::sui::SUI>",
                "parsedJson": { "board_id": "0xb1" },
                "timestampMs": "1700000000000"
            }],
            "nextCursor": { "txDigest": "t1", "eventSeq": "0" },
            "hasNextPage": false
        }))
        .unwrap();
        assert_eq!(page.data.len(), 1);
        assert_eq!(page.data[0].parsed_json.as_ref().unwrap()["board_id"], "0xb1");
        assert!(!page.has_next_page);
        assert!(page.next_cursor.is_some());
    }

    fn transaction_body(value: Value) -> RpcResponse<TransactionBlockResponse> {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn unknown_digest_is_not_yet_visible() {
        let body = transaction_body(json!({
            "jsonrpc": "2.0",
            "id": 1,
            "error": {
                "code": -32602,
                "message": "Could not find the referenced transaction [TransactionDigest(5dWbr1qLnqC1aVjUDoCxgz3zZHuZJ8yTfcKU5pGU9Y4a)]."
            }
        }));
        assert!(is_unknown_digest(body.error.as_ref().unwrap()));
        assert_eq!(transaction_outcome(body).unwrap(), None);
    }

    #[test]
    fn other_transaction_errors_surface() {
        let body = transaction_body(json!({
            "jsonrpc": "2.0",
            "id": 1,
            "error": { "code": -32602, "message": "Invalid params" }
        }));
        assert!(!is_unknown_digest(body.error.as_ref().unwrap()));
        assert!(matches!(
            transaction_outcome(body),
            Err(BoardError::RemoteCall(msg)) if msg.contains("Invalid params")
        ));
    }

    #[test]
    fn executed_transaction_outcome() {
        let body = transaction_body(json!({
            "jsonrpc": "2.0",
            "id": 1,
            "result": {
                "digest": "5dWbr1qLnqC1aVjUDoCxgz3zZHuZJ8yTfcKU5pGU9Y4a",
                "effects": { "status": { "status": "failure", "error": "MoveAbort(3)" } }
            }
        }));
        assert_eq!(
            transaction_outcome(body).unwrap(),
            Some(TransactionOutcome::Failure("MoveAbort(3)".into()))
        );
    }

    #[test]
    fn execution_status_mapping() {
        let ok = ExecutionStatus { status: "success".into(), error: None };
        assert_eq!(outcome_from_status(ok), TransactionOutcome::Success);

        let failed = ExecutionStatus {
            status: "failure".into(),
            error: Some("MoveAbort(7)".into()),
        };
        assert_eq!(
            outcome_from_status(failed),
            TransactionOutcome::Failure("MoveAbort(7)".into())
        );
    }
}
