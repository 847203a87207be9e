//! Submission of composed transactions through an external signer.
//!
//! Signing belongs to the wallet; this module only defines the seam and the
//! wait-for-finality loop that follows a successful submission.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::config::Config;
use crate::errors::{BoardError, Result};
use crate::store::{ObjectStore, TransactionOutcome};
use crate::tx::ProgrammableTransaction;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TransactionDigest(pub String);

impl fmt::Display for TransactionDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Wallet-side signing and execution. Failures are returned as
/// [`BoardError::RemoteCall`] and surfaced unchanged.
#[async_trait]
pub trait TransactionSigner: Send + Sync {
    async fn sign_and_execute(&self, tx: &ProgrammableTransaction) -> Result<TransactionDigest>;
}

pub struct Submitter<S, W> {
    store: Arc<S>,
    signer: W,
    poll_interval: Duration,
    finality_timeout: Duration,
    cancel: CancellationToken,
}

impl<S: ObjectStore, W: TransactionSigner> Submitter<S, W> {
    pub fn new(store: Arc<S>, signer: W, config: &Config) -> Self {
        Self {
            store,
            signer,
            poll_interval: config.finality_poll_interval,
            finality_timeout: config.request_timeout,
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_timing(mut self, poll_interval: Duration, finality_timeout: Duration) -> Self {
        self.poll_interval = poll_interval;
        self.finality_timeout = finality_timeout;
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Sign, execute, and wait until the ledger reports the transaction.
    pub async fn submit(&self, tx: &ProgrammableTransaction) -> Result<TransactionDigest> {
        let digest = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => return Err(BoardError::Cancelled),
            res = self.signer.sign_and_execute(tx) => res?,
        };
        info!("Submitted transaction {digest}");

        self.wait_for_finality(&digest).await?;
        info!("Transaction {digest} is final");
        Ok(digest)
    }

    async fn wait_for_finality(&self, digest: &TransactionDigest) -> Result<()> {
        let deadline = Instant::now() + self.finality_timeout;

        loop {
            let poll = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return Err(BoardError::Cancelled),
                res = tokio::time::timeout_at(deadline, self.store.get_transaction(&digest.0)) => res,
            };
            let outcome = poll.map_err(|_| BoardError::Timeout(self.finality_timeout))?;

            match outcome? {
                Some(TransactionOutcome::Success) => return Ok(()),
                Some(TransactionOutcome::Failure(reason)) => {
                    return Err(BoardError::RemoteCall(format!(
                        "transaction {digest} failed: {reason}"
                    )))
                }
                None => debug!("Transaction {digest} not yet visible"),
            }

            if Instant::now() >= deadline {
                return Err(BoardError::Timeout(self.finality_timeout));
            }

            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return Err(BoardError::Cancelled),
                _ = tokio::time::sleep_until(deadline.min(Instant::now() + self.poll_interval)) => {}
            }
        }
    }
}
