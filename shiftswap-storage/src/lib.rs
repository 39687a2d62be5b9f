//! ShiftSwap Storage - Storage Traits and In-Memory Implementation
//!
//! Defines the storage abstraction for slots and swap negotiations:
//!
//! - [`SwapStore`]: plain reads and per-record writes, plus the
//!   [`SwapStore::unit_of_work`] boundary under which every multi-record
//!   mutation runs. A unit either commits whole or leaves no trace; readers
//!   never observe a half-applied swap.
//! - [`SwapUnit`]: the compare-and-set primitives available inside a unit of
//!   work. Slot status never changes through any other path.
//!
//! The "at most one pending request per slot" rule is a storage-layer
//! constraint: the in-memory implementation keeps a pending-by-slot index
//! that is written in the same mutation as the request row itself. A
//! check-then-insert split would be a race and does not exist here.

mod memory;

pub use memory::InMemoryStore;

use shiftswap_core::{
    RequestId, ShiftSwapResult, Slot, SlotId, SlotStatus, SwapRequest, SwapStatus, Timestamp,
    UserId,
};

// ============================================================================
// UPDATE TYPES
// ============================================================================

/// Update payload for slots.
///
/// This is the trusted internal surface: owner and status writes here bypass
/// the reservation lifecycle, so only the slot service (which enforces the
/// RESERVED guards) and administrative tooling may use it. Negotiation-driven
/// status changes go through [`SwapUnit`] exclusively.
#[derive(Debug, Clone, Default)]
pub struct SlotUpdate {
    pub title: Option<String>,
    pub starts_at: Option<Timestamp>,
    pub ends_at: Option<Timestamp>,
    pub owner: Option<UserId>,
    pub status: Option<SlotStatus>,
    pub metadata: Option<serde_json::Value>,
}

// ============================================================================
// UNIT-OF-WORK PRIMITIVES
// ============================================================================

/// Compare-and-set primitives available inside a unit of work.
///
/// Every method is single-record atomic: it either fully applies or fails
/// without side effect. Failures abort nothing by themselves; the enclosing
/// unit decides, and an `Err` returned from the unit closure rolls the whole
/// unit back.
pub trait SwapUnit {
    /// Fetch a slot, failing if it does not exist.
    fn slot(&self, slot_id: SlotId) -> ShiftSwapResult<Slot>;

    /// Fetch a swap request, failing if it does not exist.
    fn request(&self, request_id: RequestId) -> ShiftSwapResult<SwapRequest>;

    /// Transition `Offerable -> Reserved` iff the slot exists, is owned by
    /// `expected_owner`, and is currently `Offerable`.
    /// Fails `SlotNotOfferable` otherwise.
    fn reserve(&mut self, slot_id: SlotId, expected_owner: UserId) -> ShiftSwapResult<Slot>;

    /// Transition `Offerable -> Reserved` iff the slot exists, is NOT owned
    /// by `requester`, and is currently `Offerable`.
    /// Fails `SlotNotOfferable` otherwise.
    fn reserve_foreign(&mut self, slot_id: SlotId, requester: UserId) -> ShiftSwapResult<Slot>;

    /// Transition `Reserved -> Offerable`. Fails with a state-drift integrity
    /// error if the slot is not currently `Reserved`.
    fn release(&mut self, slot_id: SlotId) -> ShiftSwapResult<Slot>;

    /// Set owner and mark the slot `Busy`. Valid only while `Reserved`, on
    /// the accept path, under coordinator control.
    fn reassign(&mut self, slot_id: SlotId, new_owner: UserId) -> ShiftSwapResult<Slot>;

    /// Atomically verify that neither slot is referenced by a pending request
    /// (in either role) and insert a new pending request claiming both.
    /// Fails `SlotAlreadyPending` naming the contended slot.
    fn create_if_unclaimed(
        &mut self,
        requester: UserId,
        recipient: UserId,
        offered_slot: SlotId,
        target_slot: SlotId,
    ) -> ShiftSwapResult<SwapRequest>;

    /// Compare-and-set the request status out of `Pending` into the terminal
    /// `to` status, stamping `resolved_at` and dropping the slot claims.
    /// Fails `AlreadyHandled` if the request already left `Pending`.
    fn transition(&mut self, request_id: RequestId, to: SwapStatus) -> ShiftSwapResult<SwapRequest>;

    /// All pending requests referencing `slot_id` in either role. Scans the
    /// rows rather than the claims index so that stale state (rows the index
    /// no longer tracks) is still visible to the cascade.
    fn pending_referencing(&self, slot_id: SlotId) -> ShiftSwapResult<Vec<SwapRequest>>;

    /// Cascade backstop for the accept path: force every pending request
    /// other than `keep` that references any slot in `shared` to `Rejected`,
    /// and release its referenced slots back to `Offerable` - except slots
    /// in `shared`, which the accept has just reassigned to `Busy`.
    /// Returns the requests that were swept.
    fn reject_stale_pending(
        &mut self,
        keep: RequestId,
        shared: &[SlotId],
    ) -> ShiftSwapResult<Vec<SwapRequest>>;
}

/// Work closure executed under [`SwapStore::unit_of_work`].
pub type UnitFn<'a> = &'a mut dyn FnMut(&mut dyn SwapUnit) -> ShiftSwapResult<SwapRequest>;

// ============================================================================
// STORE TRAIT
// ============================================================================

/// Storage trait for ShiftSwap entities.
///
/// Single-record reads and writes for the slot service and the listing
/// projections, plus the unit-of-work boundary for everything the swap
/// coordinator does.
pub trait SwapStore: Send + Sync {
    // === Slot Operations ===

    /// Insert a new slot.
    fn slot_insert(&self, slot: &Slot) -> ShiftSwapResult<()>;

    /// Get a slot by id.
    fn slot_get(&self, slot_id: SlotId) -> ShiftSwapResult<Option<Slot>>;

    /// Update a slot, returning the updated record.
    fn slot_update(&self, slot_id: SlotId, update: SlotUpdate) -> ShiftSwapResult<Slot>;

    /// Delete a slot.
    fn slot_delete(&self, slot_id: SlotId) -> ShiftSwapResult<()>;

    /// List a user's slots ordered by start time ascending.
    fn slot_list_by_owner(&self, owner: UserId) -> ShiftSwapResult<Vec<Slot>>;

    /// Marketplace projection: offerable slots not owned by `exclude_owner`,
    /// ordered by start time ascending, capped at `limit`.
    fn slot_list_offerable(&self, exclude_owner: UserId, limit: usize)
        -> ShiftSwapResult<Vec<Slot>>;

    // === Negotiation Reads ===

    /// Get a swap request by id.
    fn request_get(&self, request_id: RequestId) -> ShiftSwapResult<Option<SwapRequest>>;

    /// Requests addressed to `recipient`, newest first.
    fn request_list_by_recipient(&self, recipient: UserId) -> ShiftSwapResult<Vec<SwapRequest>>;

    /// Requests opened by `requester`, newest first.
    fn request_list_by_requester(&self, requester: UserId) -> ShiftSwapResult<Vec<SwapRequest>>;

    // === Unit of Work ===

    /// Run `work` as one atomic, isolated unit over the slot and negotiation
    /// tables. If the closure returns `Err`, every mutation it performed is
    /// discarded; concurrent readers only ever observe committed units.
    fn unit_of_work(&self, work: UnitFn<'_>) -> ShiftSwapResult<SwapRequest>;
}
