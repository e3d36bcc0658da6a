//! Concurrency layer for graphkern
//!
//! This crate implements pessimistic two-phase locking with:
//! - [`Locks`]: the per-transaction lock client the kernel issues requests through
//! - [`LockManager`]: shared/exclusive lock table with blocking acquisition
//! - Deadlock detection over the wait-for graph
//! - Optional acquisition timeout ([`LockManagerConfig`])
//! - [`TransactionLocks`]: a transaction's handle, releasing everything at transaction end
//!
//! Locks are only ever released as a whole, when the owning transaction ends.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod client;
pub mod config;
pub mod manager;
pub mod transaction;

pub use client::Locks;
pub use config::LockManagerConfig;
pub use manager::LockManager;
pub use transaction::TransactionLocks;
