//! Owner-facing slot management.
//!
//! Plain per-owner CRUD, with the guards that keep the negotiation core
//! sound: a slot that is part of a live negotiation (`Reserved`) can be
//! neither modified nor deleted, and `Reserved` can never be written
//! directly - only the coordinator's reservation primitives produce it.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use shiftswap_core::{
    IntegrityError, PreconditionError, ShiftSwapResult, Slot, SlotId, SlotStatus, SwapConfig,
    Timestamp, UserId, ValidationError,
};
use shiftswap_storage::{SlotUpdate, SwapStore};

/// Input for slot creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewSlot {
    pub title: String,
    pub starts_at: Timestamp,
    pub ends_at: Timestamp,
    /// Defaults to `Busy`; `Reserved` is rejected
    pub status: Option<SlotStatus>,
}

/// Owner-supplied partial update.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SlotPatch {
    pub title: Option<String>,
    pub starts_at: Option<Timestamp>,
    pub ends_at: Option<Timestamp>,
    /// `Reserved` is rejected; only the coordinator reserves slots
    pub status: Option<SlotStatus>,
    /// Freeform owner notes attached to the slot
    pub metadata: Option<serde_json::Value>,
}

/// Per-owner slot CRUD over the store.
pub struct SlotService {
    store: Arc<dyn SwapStore>,
    config: SwapConfig,
}

impl SlotService {
    /// Create a slot service over the given store.
    pub fn new(store: Arc<dyn SwapStore>, config: SwapConfig) -> Self {
        Self { store, config }
    }

    /// Create a new slot owned by `owner`.
    pub fn create_slot(&self, owner: UserId, new_slot: NewSlot) -> ShiftSwapResult<Slot> {
        if owner.is_nil() {
            return Err(ValidationError::RequiredFieldMissing {
                field: "owner".to_string(),
            }
            .into());
        }
        self.validate_title(&new_slot.title)?;
        self.validate_interval(new_slot.starts_at, new_slot.ends_at)?;

        let status = new_slot.status.unwrap_or_default();
        if status == SlotStatus::Reserved {
            return Err(ValidationError::InvalidValue {
                field: "status".to_string(),
                reason: "a slot cannot be created in the reserved state".to_string(),
            }
            .into());
        }

        let slot = Slot::new(
            owner,
            new_slot.title,
            new_slot.starts_at,
            new_slot.ends_at,
            status,
        );
        self.store.slot_insert(&slot)?;
        info!(slot_id = %slot.slot_id, owner = %owner, status = %slot.status, "slot created");
        Ok(slot)
    }

    /// Update one of the caller's slots.
    ///
    /// Rejected while the slot is `Reserved`: a mutable slot under a live
    /// negotiation would let its title and times drift out from under the
    /// counterpart who agreed to them.
    pub fn update_slot(
        &self,
        owner: UserId,
        slot_id: SlotId,
        patch: SlotPatch,
    ) -> ShiftSwapResult<Slot> {
        let slot = self.owned_slot(owner, slot_id)?;
        if slot.status == SlotStatus::Reserved {
            return Err(IntegrityError::ReservedSlotImmutable { slot_id }.into());
        }
        if patch.status == Some(SlotStatus::Reserved) {
            return Err(ValidationError::InvalidValue {
                field: "status".to_string(),
                reason: "reserved status is set only by the swap coordinator".to_string(),
            }
            .into());
        }
        if let Some(ref title) = patch.title {
            self.validate_title(title)?;
        }
        let starts_at = patch.starts_at.unwrap_or(slot.starts_at);
        let ends_at = patch.ends_at.unwrap_or(slot.ends_at);
        self.validate_interval(starts_at, ends_at)?;

        self.store.slot_update(
            slot_id,
            SlotUpdate {
                title: patch.title,
                starts_at: patch.starts_at,
                ends_at: patch.ends_at,
                owner: None,
                status: patch.status,
                metadata: patch.metadata,
            },
        )
    }

    /// Delete one of the caller's slots. Rejected while `Reserved`.
    pub fn delete_slot(&self, owner: UserId, slot_id: SlotId) -> ShiftSwapResult<()> {
        let slot = self.owned_slot(owner, slot_id)?;
        if slot.status == SlotStatus::Reserved {
            return Err(IntegrityError::ReservedSlotImmutable { slot_id }.into());
        }
        self.store.slot_delete(slot_id)?;
        info!(slot_id = %slot_id, owner = %owner, "slot deleted");
        Ok(())
    }

    /// The caller's slots, ordered by start time.
    pub fn my_slots(&self, owner: UserId) -> ShiftSwapResult<Vec<Slot>> {
        if owner.is_nil() {
            return Err(ValidationError::RequiredFieldMissing {
                field: "owner".to_string(),
            }
            .into());
        }
        self.store.slot_list_by_owner(owner)
    }

    fn owned_slot(&self, owner: UserId, slot_id: SlotId) -> ShiftSwapResult<Slot> {
        if owner.is_nil() || slot_id.is_nil() {
            return Err(ValidationError::RequiredFieldMissing {
                field: if owner.is_nil() { "owner" } else { "slot_id" }.to_string(),
            }
            .into());
        }
        let slot = self.store.slot_get(slot_id)?.ok_or(
            PreconditionError::NotFound {
                kind: shiftswap_core::EntityKind::Slot,
                id: slot_id,
            },
        )?;
        if slot.owner != owner {
            return Err(PreconditionError::Forbidden { user_id: owner }.into());
        }
        Ok(slot)
    }

    fn validate_title(&self, title: &str) -> ShiftSwapResult<()> {
        if title.trim().is_empty() {
            return Err(ValidationError::RequiredFieldMissing {
                field: "title".to_string(),
            }
            .into());
        }
        if title.chars().count() > self.config.max_title_len {
            return Err(ValidationError::InvalidValue {
                field: "title".to_string(),
                reason: format!("longer than {} characters", self.config.max_title_len),
            }
            .into());
        }
        Ok(())
    }

    fn validate_interval(&self, starts_at: Timestamp, ends_at: Timestamp) -> ShiftSwapResult<()> {
        if starts_at >= ends_at {
            return Err(ValidationError::InvalidInterval {
                starts_at: starts_at.to_rfc3339(),
                ends_at: ends_at.to_rfc3339(),
            }
            .into());
        }
        let min = chrono::Duration::minutes(self.config.min_slot_minutes);
        if ends_at - starts_at < min {
            return Err(ValidationError::InvalidValue {
                field: "ends_at".to_string(),
                reason: format!(
                    "slot must be at least {} minutes long",
                    self.config.min_slot_minutes
                ),
            }
            .into());
        }
        Ok(())
    }
}

// ============================================================================
// TESTS
// ============================================================================
