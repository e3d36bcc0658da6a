//! Lock manager for pessimistic transaction locking
//!
//! Grants shared (READ) and exclusive (WRITE) locks on [`LockResource`]s to
//! transactions, blocking requesters until the lock is compatible.
//!
//! ## Compatibility
//!
//! | Held \ Requested | READ | WRITE |
//! |------------------|------|-------|
//! | none | grant | grant |
//! | READ by others | grant | wait |
//! | WRITE by other | wait | wait |
//!
//! Locks are re-entrant: a transaction holding WRITE may take READ, and the
//! sole READ holder of a resource may upgrade to WRITE.
//!
//! ## Acquisition Sequence
//!
//! ```text
//! 1. Lock the table
//! 2. IF compatible: record grant, return Ok
//! 3. IF waiting would close a wait-for cycle: return Deadlock
//! 4. Record wait-for edge, park on the condvar
//! 5. On wake-up (or timeout) go to 2
//! ```
//!
//! The requester that would close a cycle is the one refused. Its locks are
//! not touched; the owning transaction is expected to end and release them.

use crate::config::LockManagerConfig;
use graphkern_core::{LockError, LockMode, LockRequest, LockResource, TxnId};
use parking_lot::{Condvar, Mutex};
use rustc_hash::{FxHashMap, FxHashSet};
use std::time::Instant;
use tracing::{debug, trace, warn};

/// Holders of one resource
#[derive(Debug, Default)]
struct LockEntry {
    readers: FxHashSet<TxnId>,
    writer: Option<TxnId>,
}

impl LockEntry {
    fn is_free(&self) -> bool {
        self.readers.is_empty() && self.writer.is_none()
    }

    /// Transactions other than `txn` that prevent granting `mode` to it
    fn blockers(&self, txn: TxnId, mode: LockMode) -> Vec<TxnId> {
        let mut blockers = Vec::new();
        if let Some(writer) = self.writer {
            if writer != txn {
                blockers.push(writer);
            }
        }
        if mode == LockMode::Write {
            blockers.extend(self.readers.iter().copied().filter(|r| *r != txn));
        }
        blockers
    }

    fn grant(&mut self, txn: TxnId, mode: LockMode) {
        match mode {
            LockMode::Read => {
                if self.writer != Some(txn) {
                    self.readers.insert(txn);
                }
            }
            LockMode::Write => self.writer = Some(txn),
        }
    }

    fn release(&mut self, txn: TxnId) {
        self.readers.remove(&txn);
        if self.writer == Some(txn) {
            self.writer = None;
        }
    }

    fn holds(&self, txn: TxnId, mode: LockMode) -> bool {
        match mode {
            LockMode::Read => self.writer == Some(txn) || self.readers.contains(&txn),
            LockMode::Write => self.writer == Some(txn),
        }
    }
}

/// Lock table guarded by the manager mutex
#[derive(Debug, Default)]
struct LockTable {
    entries: FxHashMap<LockResource, LockEntry>,
    /// Resources each transaction holds, for release at transaction end
    held: FxHashMap<TxnId, FxHashSet<LockResource>>,
    /// Wait-for edges: the request each blocked transaction is parked on
    waiting: FxHashMap<TxnId, LockRequest>,
}

impl LockTable {
    fn blockers(&self, txn: TxnId, request: LockRequest) -> Vec<TxnId> {
        self.entries
            .get(&request.resource)
            .map(|entry| entry.blockers(txn, request.mode))
            .unwrap_or_default()
    }

    fn can_grant(&self, txn: TxnId, request: LockRequest) -> bool {
        self.blockers(txn, request).is_empty()
    }

    fn try_grant(&mut self, txn: TxnId, request: LockRequest) -> bool {
        if !self.can_grant(txn, request) {
            return false;
        }
        self.entries
            .entry(request.resource)
            .or_default()
            .grant(txn, request.mode);
        self.held.entry(txn).or_default().insert(request.resource);
        self.waiting.remove(&txn);
        true
    }

    /// Depth-first walk of the wait-for graph starting at the holders that
    /// block `request`. Reaching `txn` again means waiting would deadlock.
    fn would_deadlock(&self, txn: TxnId, request: LockRequest) -> bool {
        let mut stack = self.blockers(txn, request);
        let mut visited = FxHashSet::default();
        while let Some(other) = stack.pop() {
            if other == txn {
                return true;
            }
            if !visited.insert(other) {
                continue;
            }
            if let Some(parked_on) = self.waiting.get(&other) {
                stack.extend(self.blockers(other, *parked_on));
            }
        }
        false
    }

    fn release_all(&mut self, txn: TxnId) -> usize {
        self.waiting.remove(&txn);
        let Some(resources) = self.held.remove(&txn) else {
            return 0;
        };
        for resource in &resources {
            let free = match self.entries.get_mut(resource) {
                Some(entry) => {
                    entry.release(txn);
                    entry.is_free()
                }
                None => false,
            };
            if free {
                self.entries.remove(resource);
            }
        }
        resources.len()
    }
}

/// Shared/exclusive lock manager
///
/// One manager serves every transaction of a database. Requests are made on
/// behalf of a [`TxnId`]; all of a transaction's locks are dropped together
/// by [`LockManager::release_all`].
///
/// # Thread Safety
///
/// The lock table sits behind a single mutex; blocked requesters park on a
/// condition variable that is signalled whenever locks are released.
#[derive(Debug)]
pub struct LockManager {
    config: LockManagerConfig,
    table: Mutex<LockTable>,
    released: Condvar,
}

impl LockManager {
    /// Create a lock manager with default options
    pub fn new() -> Self {
        Self::with_config(LockManagerConfig::default())
    }

    /// Create a lock manager with the given options
    pub fn with_config(config: LockManagerConfig) -> Self {
        LockManager {
            config,
            table: Mutex::new(LockTable::default()),
            released: Condvar::new(),
        }
    }

    /// Options this manager runs with
    pub fn config(&self) -> &LockManagerConfig {
        &self.config
    }

    /// Acquire a lock for `txn`, blocking until it is granted
    ///
    /// # Errors
    ///
    /// - [`LockError::Deadlock`] if waiting would close a wait-for cycle
    /// - [`LockError::Timeout`] if the configured timeout elapses first
    ///
    /// On error nothing is granted and no wait-for edge is left behind.
    pub fn acquire(&self, txn: TxnId, request: LockRequest) -> Result<(), LockError> {
        let started = Instant::now();
        let deadline = self.config.acquire_timeout.map(|timeout| started + timeout);
        let mut table = self.table.lock();

        loop {
            if table.try_grant(txn, request) {
                trace!(txn = txn.0, %request, "lock granted");
                return Ok(());
            }

            if self.config.deadlock_detection && table.would_deadlock(txn, request) {
                table.waiting.remove(&txn);
                warn!(txn = txn.0, %request, "deadlock detected, refusing lock request");
                return Err(LockError::Deadlock { txn, request });
            }

            if table.waiting.insert(txn, request).is_none() {
                debug!(
                    txn = txn.0,
                    %request,
                    blockers = ?table.blockers(txn, request),
                    "waiting for lock"
                );
            }

            match deadline {
                Some(deadline) => {
                    let timed_out = self.released.wait_until(&mut table, deadline).timed_out();
                    if timed_out && !table.can_grant(txn, request) {
                        table.waiting.remove(&txn);
                        let waited_ms = started.elapsed().as_millis() as u64;
                        warn!(txn = txn.0, %request, waited_ms, "lock request timed out");
                        return Err(LockError::Timeout { request, waited_ms });
                    }
                }
                None => self.released.wait(&mut table),
            }
        }
    }

    /// Release every lock held by `txn` and wake blocked requesters
    ///
    /// Returns the number of resources released.
    pub fn release_all(&self, txn: TxnId) -> usize {
        let released = self.table.lock().release_all(txn);
        if released > 0 {
            trace!(txn = txn.0, released, "released locks");
        }
        self.released.notify_all();
        released
    }

    /// Check whether `txn` holds `request.resource` in at least `request.mode`
    pub fn holds(&self, txn: TxnId, request: LockRequest) -> bool {
        self.table
            .lock()
            .entries
            .get(&request.resource)
            .map(|entry| entry.holds(txn, request.mode))
            .unwrap_or(false)
    }

    /// Check whether `txn` is currently parked waiting for a lock
    pub fn is_waiting(&self, txn: TxnId) -> bool {
        self.table.lock().waiting.contains_key(&txn)
    }

    /// The request `txn` is parked on, if any
    pub fn waiting_for(&self, txn: TxnId) -> Option<LockRequest> {
        self.table.lock().waiting.get(&txn).copied()
    }

    /// Number of distinct resources `txn` holds
    pub fn lock_count(&self, txn: TxnId) -> usize {
        self.table
            .lock()
            .held
            .get(&txn)
            .map(|resources| resources.len())
            .unwrap_or(0)
    }

    /// Number of resources currently locked by any transaction
    pub fn locked_resources(&self) -> usize {
        self.table.lock().entries.len()
    }
}

impl Default for LockManager {
    fn default() -> Self {
        Self::new()
    }
}
