//! Unified error type for graphkern.
//!
//! The kernel reports failures per capability group ([`EntityError`],
//! [`SchemaReadError`], [`SchemaWriteError`]) with lock failures kept as a
//! distinct variant of each. This module folds them into one [`Error`] for
//! callers of the transaction facade, without losing the distinction
//! between "the lock was refused" and "the operation itself failed".

use graphkern_core::{EntityError, LockError, SchemaReadError, SchemaWriteError};
use thiserror::Error;

/// All graphkern errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// The transaction could not acquire a lock
    #[error("lock failure: {0}")]
    Lock(LockError),

    /// Node or relationship operation failed
    #[error(transparent)]
    Entity(EntityError),

    /// Schema lookup failed
    #[error(transparent)]
    SchemaRead(SchemaReadError),

    /// Schema change failed
    #[error(transparent)]
    SchemaWrite(SchemaWriteError),
}

/// Result type for graphkern operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Check if the failure came from lock acquisition.
    ///
    /// Lock failures (deadlock, timeout, termination) are reported the same
    /// way regardless of which operation requested the lock.
    pub fn is_lock_failure(&self) -> bool {
        self.lock_error().is_some()
    }

    /// The underlying lock error, if any
    pub fn lock_error(&self) -> Option<&LockError> {
        match self {
            Error::Lock(e)
            | Error::Entity(EntityError::Lock(e))
            | Error::SchemaRead(SchemaReadError::Lock(e))
            | Error::SchemaWrite(SchemaWriteError::Lock(e)) => Some(e),
            _ => None,
        }
    }

    /// Check if this is a deadlock refusal.
    pub fn is_deadlock(&self) -> bool {
        matches!(self.lock_error(), Some(LockError::Deadlock { .. }))
    }

    /// Check if this is a not-found error.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Error::Entity(EntityError::EntityNotFound { .. })
                | Error::SchemaRead(SchemaReadError::SchemaRuleNotFound(_))
                | Error::SchemaRead(SchemaReadError::IndexNotFound(_))
        )
    }
}

impl From<LockError> for Error {
    fn from(e: LockError) -> Self {
        Error::Lock(e)
    }
}

impl From<EntityError> for Error {
    fn from(e: EntityError) -> Self {
        Error::Entity(e)
    }
}

impl From<SchemaReadError> for Error {
    fn from(e: SchemaReadError) -> Self {
        Error::SchemaRead(e)
    }
}

impl From<SchemaWriteError> for Error {
    fn from(e: SchemaWriteError) -> Self {
        Error::SchemaWrite(e)
    }
}
