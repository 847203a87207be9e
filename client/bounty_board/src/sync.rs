//! Read model synchronizer: resolves ledger addresses into hydrated boards,
//! tasks, submissions and profiles.
//!
//! ## Collections
//!
//! A board's tasks and a task's submissions live in nested tables rather
//! than inline lists. [`Synchronizer::fetch_collection`] resolves them in
//! three steps:
//!
//! 1. list the table's entries, following cursors until exhausted;
//! 2. fetch every entry's object concurrently (at most
//!    [`SyncOptions::concurrency`] in flight), yielding results in entry order;
//! 3. merge each entry's key and storage identity onto its item by position.
//!
//! The first failing item fails the whole collection with
//! [`BoardError::AggregateFailure`]; no partial list is ever returned.
//!
//! Every remote call is raced against [`SyncOptions::request_timeout`] and
//! the synchronizer's cancellation token.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures_util::stream::{self, StreamExt, TryStreamExt};
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::address::Address;
use crate::config::{Config, NetworkConfig};
use crate::errors::{BoardError, Result};
use crate::models::{Board, BoardCreatedEvent, OwnedObject, Profile, Submission, TableHandle, Task};
use crate::registry::board_created_event_type;
use crate::store::{collect_pages, DynamicFieldEntry, ObjectStore};

#[derive(Debug, Clone)]
pub struct SyncOptions {
    pub page_limit: u32,
    pub concurrency: usize,
    pub request_timeout: Duration,
}

impl Default for SyncOptions {
    fn default() -> Self {
        SyncOptions {
            page_limit: 50,
            concurrency: 8,
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl From<&Config> for SyncOptions {
    fn from(config: &Config) -> Self {
        SyncOptions {
            page_limit: config.page_limit,
            concurrency: config.fetch_concurrency,
            request_timeout: config.request_timeout,
        }
    }
}

pub struct Synchronizer<S> {
    store: Arc<S>,
    network: NetworkConfig,
    options: SyncOptions,
    cancel: CancellationToken,
}

impl<S> Clone for Synchronizer<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            network: self.network.clone(),
            options: self.options.clone(),
            cancel: self.cancel.clone(),
        }
    }
}

impl<S: ObjectStore> Synchronizer<S> {
    pub fn new(store: Arc<S>, network: NetworkConfig, options: SyncOptions) -> Self {
        Self {
            store,
            network,
            options,
            cancel: CancellationToken::new(),
        }
    }

    /// A copy whose calls abort with [`BoardError::Cancelled`] once `token` fires.
    pub fn with_cancellation(&self, token: CancellationToken) -> Self {
        Self {
            cancel: token,
            ..self.clone()
        }
    }

    pub async fn fetch_board(&self, address: &str) -> Result<Board> {
        let id = Address::parse(address)?;
        let content = self.fetch_content(&id, "board").await?;
        Board::from_content(&content)
    }

    pub async fn fetch_board_tasks(&self, board: &Board) -> Result<Vec<Task>> {
        self.fetch_collection(
            &board.tasks,
            |id| self.hydrate(id, "task", Task::from_content),
            |mut task, entry| {
                task.task_address = entry.address_key()?;
                task.object_id = entry.object_id;
                Ok(task)
            },
        )
        .await
    }

    /// Fetch one task by the storage identity of its field object.
    pub async fn fetch_task(&self, object_id: &str) -> Result<Task> {
        let id = Address::parse(object_id)?;
        self.hydrate(id, "task", Task::from_content).await
    }

    pub async fn fetch_task_submissions(&self, task: &Task) -> Result<Vec<Submission>> {
        self.fetch_collection(
            &task.submissions,
            |id| self.hydrate(id, "submission", Submission::from_content),
            |submission, _| Ok(submission),
        )
        .await
    }

    pub async fn fetch_submission(&self, object_id: &str) -> Result<Submission> {
        let id = Address::parse(object_id)?;
        self.hydrate(id, "submission", Submission::from_content).await
    }

    pub async fn fetch_profile(&self, address: &str) -> Result<Profile> {
        let id = Address::parse(address)?;
        self.hydrate(id, "profile", Profile::from_content).await
    }

    /// All board-created events of the configured package, oldest first.
    pub async fn fetch_board_created_events(&self) -> Result<Vec<BoardCreatedEvent>> {
        let event_type = board_created_event_type(&self.network.require_package()?);
        let limit = self.options.page_limit;
        let event_type_ref = event_type.as_str();

        let envelopes = collect_pages(move |cursor| {
            self.guarded(self.store.query_events(event_type_ref, cursor, limit))
        })
        .await?;
        debug!("Fetched {} {event_type} events", envelopes.len());

        envelopes
            .iter()
            .filter_map(|e| e.parsed_json.as_ref())
            .map(BoardCreatedEvent::from_parsed_json)
            .collect()
    }

    /// Objects owned by `owner`, with balances for coin objects.
    pub async fn fetch_owned_objects(&self, owner: &str) -> Result<Vec<OwnedObject>> {
        let owner = Address::parse(owner)?;
        let limit = self.options.page_limit;
        let owner_ref = &owner;

        let objects = collect_pages(move |cursor| {
            self.guarded(self.store.get_owned_objects(owner_ref, cursor, limit))
        })
        .await?;
        Ok(objects.into_iter().map(OwnedObject::from).collect())
    }

    /// Resolve a nested table into its hydrated items, in table order.
    pub async fn fetch_collection<T, H, HFut, M>(
        &self,
        table: &TableHandle,
        hydrate: H,
        merge: M,
    ) -> Result<Vec<T>>
    where
        H: Fn(Address) -> HFut,
        HFut: Future<Output = Result<T>>,
        M: Fn(T, &DynamicFieldEntry) -> Result<T>,
    {
        let entries = self.list_entries(&table.id).await?;
        debug!(
            "Table {} lists {} entries (declared size {})",
            table.id,
            entries.len(),
            table.size
        );

        let ids: Vec<Address> = entries.iter().map(|e| e.object_id).collect();
        let items: Vec<T> = stream::iter(ids.into_iter().enumerate())
            .map(|(index, id)| {
                let fetch = hydrate(id);
                async move {
                    fetch.await.map_err(|e| {
                        warn!("Item {index} ({id}) of table {} failed: {e}", table.id);
                        BoardError::AggregateFailure {
                            index,
                            source: Box::new(e),
                        }
                    })
                }
            })
            .buffered(self.options.concurrency.max(1))
            .try_collect()
            .await?;

        entries
            .iter()
            .zip(items)
            .map(|(entry, item)| merge(item, entry))
            .collect()
    }

    async fn list_entries(&self, table: &Address) -> Result<Vec<DynamicFieldEntry>> {
        let limit = self.options.page_limit;
        collect_pages(move |cursor| {
            self.guarded(self.store.get_dynamic_fields(table, cursor, limit))
        })
        .await
    }

    async fn hydrate<T>(
        &self,
        id: Address,
        what: &'static str,
        decode: fn(&Value) -> Result<T>,
    ) -> Result<T> {
        let content = self.fetch_content(&id, what).await?;
        decode(&content)
    }

    async fn fetch_content(&self, id: &Address, what: &str) -> Result<Value> {
        self.guarded(self.store.get_object(id))
            .await?
            .ok_or_else(|| BoardError::NotFound(format!("{what} {id}")))
    }

    async fn guarded<T>(&self, call: impl Future<Output = Result<T>>) -> Result<T> {
        let timeout = self.options.request_timeout;
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(BoardError::Cancelled),
            res = tokio::time::timeout(timeout, call) => {
                res.map_err(|_| BoardError::Timeout(timeout))?
            }
        }
    }
}
