//! Error taxonomy
//!
//! Failures are split by capability group. Every group error carries a
//! distinct `Lock` variant for lock-acquisition failures so that a denied,
//! deadlocked or timed-out lock is never confused with a failure of the
//! operation itself.
//!
//! | Group | Error type | Operation failures |
//! |-------|------------|--------------------|
//! | Entity mutation | [`EntityError`] | EntityNotFound, ConstraintValidation |
//! | Schema read | [`SchemaReadError`] | SchemaRuleNotFound, IndexNotFound |
//! | Schema write | [`SchemaWriteError`] | AlreadyIndexed, AlreadyConstrained, AddIndexFailure, CreateConstraintFailure, DropIndexFailure, DropConstraintFailure |
//! | Schema state | [`LockError`] | none |

use crate::lock::LockRequest;
use crate::schema::{IndexDescriptor, UniquenessConstraint};
use crate::types::{NodeId, TxnId};
use crate::value::Value;
use thiserror::Error;

/// Lock-acquisition failure
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LockError {
    /// Waiting would close a cycle in the wait-for graph
    #[error("deadlock detected: {txn} waiting for {request}")]
    Deadlock {
        /// Transaction whose request was refused
        txn: TxnId,
        /// The refused request
        request: LockRequest,
    },

    /// The request was not granted within the configured timeout
    #[error("timed out after {waited_ms}ms waiting for {request}")]
    Timeout {
        /// The request that timed out
        request: LockRequest,
        /// Time spent waiting
        waited_ms: u64,
    },

    /// The transaction can no longer take locks
    #[error("{txn} has terminated and cannot acquire {request}")]
    Terminated {
        /// Terminated transaction
        txn: TxnId,
        /// The refused request
        request: LockRequest,
    },
}

/// Kind of entity named in an [`EntityError::EntityNotFound`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    /// A node
    Node,
    /// A relationship
    Relationship,
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntityKind::Node => f.write_str("node"),
            EntityKind::Relationship => f.write_str("relationship"),
        }
    }
}

/// Entity mutation failure
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EntityError {
    /// The entity does not exist
    #[error("{kind} {id} not found")]
    EntityNotFound {
        /// Kind of entity
        kind: EntityKind,
        /// Raw entity id
        id: u64,
    },

    /// The change would violate a uniqueness constraint
    #[error("{constraint} violated: {existing} already has value {value}")]
    ConstraintValidation {
        /// Violated constraint
        constraint: UniquenessConstraint,
        /// Node that already holds the value
        existing: NodeId,
        /// Conflicting value
        value: Value,
    },

    /// The entity cannot be changed in its current state
    #[error("invalid operation on {kind} {id}: {reason}")]
    InvalidOperation {
        /// Kind of entity
        kind: EntityKind,
        /// Raw entity id
        id: u64,
        /// Why the operation was refused
        reason: String,
    },

    /// Lock acquisition failed before the operation ran
    #[error(transparent)]
    Lock(#[from] LockError),
}

impl EntityError {
    /// Node-not-found shorthand
    pub fn node_not_found(id: NodeId) -> Self {
        EntityError::EntityNotFound {
            kind: EntityKind::Node,
            id: id.as_u64(),
        }
    }

    /// Relationship-not-found shorthand
    pub fn relationship_not_found(id: crate::types::RelationshipId) -> Self {
        EntityError::EntityNotFound {
            kind: EntityKind::Relationship,
            id: id.as_u64(),
        }
    }
}

/// Schema read failure
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaReadError {
    /// No schema rule matches the request
    #[error("no schema rule found for {0}")]
    SchemaRuleNotFound(String),

    /// The index does not exist
    #[error("{0} not found")]
    IndexNotFound(IndexDescriptor),

    /// Lock acquisition failed before the read ran
    #[error(transparent)]
    Lock(#[from] LockError),
}

/// Schema write failure
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaWriteError {
    /// An index already exists for the label and property
    #[error("already indexed: {0}")]
    AlreadyIndexed(IndexDescriptor),

    /// A uniqueness constraint already exists for the label and property
    #[error("already constrained: {0}")]
    AlreadyConstrained(UniquenessConstraint),

    /// The index could not be created
    #[error("failed to add {descriptor}: {reason}")]
    AddIndexFailure {
        /// Index that failed
        descriptor: IndexDescriptor,
        /// Failure reason
        reason: String,
    },

    /// The constraint could not be created
    #[error("failed to create {constraint}: {reason}")]
    CreateConstraintFailure {
        /// Constraint that failed
        constraint: UniquenessConstraint,
        /// Failure reason
        reason: String,
    },

    /// The index could not be dropped
    #[error("failed to drop {descriptor}: {reason}")]
    DropIndexFailure {
        /// Index that failed
        descriptor: IndexDescriptor,
        /// Failure reason
        reason: String,
    },

    /// The constraint could not be dropped
    #[error("failed to drop {constraint}: {reason}")]
    DropConstraintFailure {
        /// Constraint that failed
        constraint: UniquenessConstraint,
        /// Failure reason
        reason: String,
    },

    /// Lock acquisition failed before the write ran
    #[error(transparent)]
    Lock(#[from] LockError),
}
