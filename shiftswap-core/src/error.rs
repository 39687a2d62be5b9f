//! Error types for ShiftSwap operations

use crate::{EntityKind, RequestId, SlotId, SlotStatus, UserId};
use thiserror::Error;
use uuid::Uuid;

/// Storage layer errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StorageError {
    #[error("Entity not found: {kind} with id {id}")]
    NotFound { kind: EntityKind, id: Uuid },

    #[error("Insert failed for {kind}: {reason}")]
    InsertFailed { kind: EntityKind, reason: String },

    #[error("Update failed for {kind} with id {id}: {reason}")]
    UpdateFailed {
        kind: EntityKind,
        id: Uuid,
        reason: String,
    },

    #[error("Unit of work failed: {reason}")]
    UnitOfWorkFailed { reason: String },

    #[error("Storage lock poisoned")]
    LockPoisoned,
}

/// Validation errors, rejected before storage is touched.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Required field missing: {field}")]
    RequiredFieldMissing { field: String },

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Slot interval is empty or inverted: starts_at {starts_at} >= ends_at {ends_at}")]
    InvalidInterval { starts_at: String, ends_at: String },
}

/// Expected precondition failures: races and caller misuse.
///
/// These are benign, user-facing outcomes. No partial state persists and the
/// caller is expected to retry with fresh data; the coordinator never retries
/// on its own.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PreconditionError {
    #[error("Slot {slot_id} is not offerable by this caller")]
    SlotNotOfferable { slot_id: SlotId },

    #[error("Slot {slot_id} is already referenced by a pending swap request")]
    SlotAlreadyPending { slot_id: SlotId },

    #[error("Swap request {request_id} was already handled")]
    AlreadyHandled { request_id: RequestId },

    #[error("User {user_id} is not allowed to perform this operation")]
    Forbidden { user_id: UserId },

    #[error("{kind} {id} not found")]
    NotFound { kind: EntityKind, id: Uuid },
}

/// Integrity faults: invariants that only break if something else already
/// went wrong. The operation is aborted whole and the offending state is
/// left untouched for administrative resolution.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum IntegrityError {
    #[error(
        "Ownership of slot {slot_id} drifted under request {request_id}: \
         expected {expected_owner}, found {found_owner}"
    )]
    OwnershipDrift {
        request_id: RequestId,
        slot_id: SlotId,
        expected_owner: UserId,
        found_owner: UserId,
    },

    #[error("Slot {slot_id} is in state {found}, expected {expected}")]
    SlotStateDrift {
        slot_id: SlotId,
        expected: SlotStatus,
        found: SlotStatus,
    },

    #[error("Slot {slot_id} is reserved by a live negotiation and cannot be modified")]
    ReservedSlotImmutable { slot_id: SlotId },
}

/// Configuration errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required configuration field: {field}")]
    MissingRequired { field: String },

    #[error("Invalid value for {field}: {value} - {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },
}

/// Master error type for all ShiftSwap errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ShiftSwapError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Precondition failed: {0}")]
    Precondition(#[from] PreconditionError),

    #[error("Integrity fault: {0}")]
    Integrity(#[from] IntegrityError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

impl ShiftSwapError {
    /// Whether this error is an expected, user-facing outcome rather than a
    /// fault. Transport layers map these to 4xx-equivalents.
    pub fn is_benign(&self) -> bool {
        matches!(
            self,
            ShiftSwapError::Validation(_) | ShiftSwapError::Precondition(_)
        )
    }
}

/// Result type alias for ShiftSwap operations.
pub type ShiftSwapResult<T> = Result<T, ShiftSwapError>;

// =============================================================================
// TESTS
// =============================================================================
