//! Bounty board client.
//!
//! Two halves share this crate:
//!
//! * [`sync::Synchronizer`] resolves ledger objects into hydrated read models
//!   (boards, tasks, submissions, profiles, board-created events), following
//!   nested tables with an order-preserving, all-or-nothing collection fetch.
//! * [`builder::TransactionBuilder`] turns one user intent into a composed,
//!   unsigned [`tx::ProgrammableTransaction`] for an external wallet to sign.
//!
//! Both take their network coordinates from an explicit [`config::NetworkConfig`].

pub mod address;
pub mod amount;
pub mod api;
pub mod builder;
pub mod config;
pub mod errors;
pub mod models;
pub mod registry;
pub mod rpc;
pub mod signer;
pub mod store;
pub mod sync;
pub mod tx;
pub mod validation;

#[cfg(any(test, feature = "testutils"))]
pub mod memory;

pub use errors::{BoardError, Result};
