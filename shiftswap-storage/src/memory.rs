//! In-memory store with a serialized unit-of-work boundary.
//!
//! The whole ledger lives behind one `RwLock`. Plain reads and single-record
//! writes take the lock per call; a unit of work takes the write lock once,
//! stages its mutations on a copy of the state, and swaps the copy in only
//! when the closure succeeds. Readers never observe a torn multi-record
//! write, and a failed unit leaves no trace.

use std::collections::HashMap;
use std::sync::RwLock;

use chrono::Utc;
use shiftswap_core::{
    EntityKind, IntegrityError, PreconditionError, RequestId, ShiftSwapResult, Slot, SlotId,
    SlotStatus, StorageError, SwapRequest, SwapStatus, UserId,
};

use crate::{SlotUpdate, SwapStore, SwapUnit, UnitFn};

// ============================================================================
// STATE
// ============================================================================

#[derive(Debug, Clone, Default)]
struct LedgerState {
    slots: HashMap<SlotId, Slot>,
    requests: HashMap<RequestId, SwapRequest>,
    /// Claims index: slot id -> the single pending request referencing it,
    /// in either role. Written in the same mutation as the request row.
    pending_by_slot: HashMap<SlotId, RequestId>,
}

/// In-memory [`SwapStore`] implementation.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    state: RwLock<LedgerState>,
}

impl InMemoryStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear all stored data.
    pub fn clear(&self) -> ShiftSwapResult<()> {
        let mut state = self.write()?;
        state.slots.clear();
        state.requests.clear();
        state.pending_by_slot.clear();
        Ok(())
    }

    /// Number of stored slots.
    pub fn slot_count(&self) -> usize {
        self.state.read().map(|s| s.slots.len()).unwrap_or(0)
    }

    /// Number of stored swap requests.
    pub fn request_count(&self) -> usize {
        self.state.read().map(|s| s.requests.len()).unwrap_or(0)
    }

    /// Number of slots currently claimed by a pending request.
    pub fn claimed_slot_count(&self) -> usize {
        self.state.read().map(|s| s.pending_by_slot.len()).unwrap_or(0)
    }

    fn read(&self) -> ShiftSwapResult<std::sync::RwLockReadGuard<'_, LedgerState>> {
        self.state
            .read()
            .map_err(|_| StorageError::LockPoisoned.into())
    }

    fn write(&self) -> ShiftSwapResult<std::sync::RwLockWriteGuard<'_, LedgerState>> {
        self.state
            .write()
            .map_err(|_| StorageError::LockPoisoned.into())
    }
}

// ============================================================================
// UNIT OF WORK
// ============================================================================

struct MemUnit<'a> {
    state: &'a mut LedgerState,
}

impl MemUnit<'_> {
    fn slot_mut(&mut self, slot_id: SlotId) -> ShiftSwapResult<&mut Slot> {
        self.state
            .slots
            .get_mut(&slot_id)
            .ok_or_else(|| {
                StorageError::NotFound {
                    kind: EntityKind::Slot,
                    id: slot_id,
                }
                .into()
            })
    }

    fn unclaim(&mut self, request_id: RequestId, slot_id: SlotId) {
        if self.state.pending_by_slot.get(&slot_id) == Some(&request_id) {
            self.state.pending_by_slot.remove(&slot_id);
        }
    }
}

impl SwapUnit for MemUnit<'_> {
    fn slot(&self, slot_id: SlotId) -> ShiftSwapResult<Slot> {
        self.state.slots.get(&slot_id).cloned().ok_or_else(|| {
            StorageError::NotFound {
                kind: EntityKind::Slot,
                id: slot_id,
            }
            .into()
        })
    }

    fn request(&self, request_id: RequestId) -> ShiftSwapResult<SwapRequest> {
        self.state.requests.get(&request_id).cloned().ok_or_else(|| {
            StorageError::NotFound {
                kind: EntityKind::SwapRequest,
                id: request_id,
            }
            .into()
        })
    }

    fn reserve(&mut self, slot_id: SlotId, expected_owner: UserId) -> ShiftSwapResult<Slot> {
        // Missing, foreign-owned and non-offerable all collapse into the same
        // caller-facing failure, as the reserve contract specifies.
        let not_offerable = || PreconditionError::SlotNotOfferable { slot_id };

        let slot = self
            .state
            .slots
            .get_mut(&slot_id)
            .ok_or_else(not_offerable)?;
        if slot.owner != expected_owner || slot.status != SlotStatus::Offerable {
            return Err(not_offerable().into());
        }
        slot.status = SlotStatus::Reserved;
        slot.updated_at = Utc::now();
        Ok(slot.clone())
    }

    fn reserve_foreign(&mut self, slot_id: SlotId, requester: UserId) -> ShiftSwapResult<Slot> {
        let not_offerable = || PreconditionError::SlotNotOfferable { slot_id };

        let slot = self
            .state
            .slots
            .get_mut(&slot_id)
            .ok_or_else(not_offerable)?;
        if slot.owner == requester || slot.status != SlotStatus::Offerable {
            return Err(not_offerable().into());
        }
        slot.status = SlotStatus::Reserved;
        slot.updated_at = Utc::now();
        Ok(slot.clone())
    }

    fn release(&mut self, slot_id: SlotId) -> ShiftSwapResult<Slot> {
        let slot = self.slot_mut(slot_id)?;
        if slot.status != SlotStatus::Reserved {
            return Err(IntegrityError::SlotStateDrift {
                slot_id,
                expected: SlotStatus::Reserved,
                found: slot.status,
            }
            .into());
        }
        slot.status = SlotStatus::Offerable;
        slot.updated_at = Utc::now();
        Ok(slot.clone())
    }

    fn reassign(&mut self, slot_id: SlotId, new_owner: UserId) -> ShiftSwapResult<Slot> {
        let slot = self.slot_mut(slot_id)?;
        if slot.status != SlotStatus::Reserved {
            return Err(IntegrityError::SlotStateDrift {
                slot_id,
                expected: SlotStatus::Reserved,
                found: slot.status,
            }
            .into());
        }
        slot.owner = new_owner;
        slot.status = SlotStatus::Busy;
        slot.updated_at = Utc::now();
        Ok(slot.clone())
    }

    fn create_if_unclaimed(
        &mut self,
        requester: UserId,
        recipient: UserId,
        offered_slot: SlotId,
        target_slot: SlotId,
    ) -> ShiftSwapResult<SwapRequest> {
        for slot_id in [offered_slot, target_slot] {
            if self.state.pending_by_slot.contains_key(&slot_id) {
                return Err(PreconditionError::SlotAlreadyPending { slot_id }.into());
            }
        }

        let request = SwapRequest::new(requester, recipient, offered_slot, target_slot);
        self.state
            .pending_by_slot
            .insert(offered_slot, request.request_id);
        self.state
            .pending_by_slot
            .insert(target_slot, request.request_id);
        self.state.requests.insert(request.request_id, request.clone());
        Ok(request)
    }

    fn transition(&mut self, request_id: RequestId, to: SwapStatus) -> ShiftSwapResult<SwapRequest> {
        if !to.is_terminal() {
            return Err(StorageError::UpdateFailed {
                kind: EntityKind::SwapRequest,
                id: request_id,
                reason: "transition target must be terminal".to_string(),
            }
            .into());
        }

        let request = self.state.requests.get_mut(&request_id).ok_or(
            StorageError::NotFound {
                kind: EntityKind::SwapRequest,
                id: request_id,
            },
        )?;
        if request.status != SwapStatus::Pending {
            return Err(PreconditionError::AlreadyHandled { request_id }.into());
        }
        request.status = to;
        request.resolved_at = Some(Utc::now());

        let (offered, target) = (request.offered_slot, request.target_slot);
        self.unclaim(request_id, offered);
        self.unclaim(request_id, target);

        self.request(request_id)
    }

    fn pending_referencing(&self, slot_id: SlotId) -> ShiftSwapResult<Vec<SwapRequest>> {
        Ok(self
            .state
            .requests
            .values()
            .filter(|r| r.status == SwapStatus::Pending && r.references(slot_id))
            .cloned()
            .collect())
    }

    fn reject_stale_pending(
        &mut self,
        keep: RequestId,
        shared: &[SlotId],
    ) -> ShiftSwapResult<Vec<SwapRequest>> {
        let stale_ids: Vec<RequestId> = self
            .state
            .requests
            .values()
            .filter(|r| {
                r.request_id != keep
                    && r.status == SwapStatus::Pending
                    && shared.iter().any(|s| r.references(*s))
            })
            .map(|r| r.request_id)
            .collect();

        let now = Utc::now();
        let mut swept = Vec::with_capacity(stale_ids.len());
        for request_id in stale_ids {
            let request = self.state.requests.get_mut(&request_id).ok_or(
                StorageError::NotFound {
                    kind: EntityKind::SwapRequest,
                    id: request_id,
                },
            )?;
            request.status = SwapStatus::Rejected;
            request.resolved_at = Some(now);
            let (offered, target) = (request.offered_slot, request.target_slot);
            swept.push(request.clone());

            for slot_id in [offered, target] {
                self.unclaim(request_id, slot_id);
                if shared.contains(&slot_id) {
                    continue;
                }
                if let Some(slot) = self.state.slots.get_mut(&slot_id) {
                    if slot.status == SlotStatus::Reserved {
                        slot.status = SlotStatus::Offerable;
                        slot.updated_at = now;
                    }
                }
            }
        }
        Ok(swept)
    }
}

// ============================================================================
// STORE IMPLEMENTATION
// ============================================================================

impl SwapStore for InMemoryStore {
    fn slot_insert(&self, slot: &Slot) -> ShiftSwapResult<()> {
        let mut state = self.write()?;
        if state.slots.contains_key(&slot.slot_id) {
            return Err(StorageError::InsertFailed {
                kind: EntityKind::Slot,
                reason: "already exists".to_string(),
            }
            .into());
        }
        state.slots.insert(slot.slot_id, slot.clone());
        Ok(())
    }

    fn slot_get(&self, slot_id: SlotId) -> ShiftSwapResult<Option<Slot>> {
        let state = self.read()?;
        Ok(state.slots.get(&slot_id).cloned())
    }

    fn slot_update(&self, slot_id: SlotId, update: SlotUpdate) -> ShiftSwapResult<Slot> {
        let mut state = self.write()?;
        let slot = state.slots.get_mut(&slot_id).ok_or(StorageError::NotFound {
            kind: EntityKind::Slot,
            id: slot_id,
        })?;

        if let Some(title) = update.title {
            slot.title = title;
        }
        if let Some(starts_at) = update.starts_at {
            slot.starts_at = starts_at;
        }
        if let Some(ends_at) = update.ends_at {
            slot.ends_at = ends_at;
        }
        if let Some(owner) = update.owner {
            slot.owner = owner;
        }
        if let Some(status) = update.status {
            slot.status = status;
        }
        if let Some(metadata) = update.metadata {
            slot.metadata = Some(metadata);
        }
        slot.updated_at = Utc::now();

        Ok(slot.clone())
    }

    fn slot_delete(&self, slot_id: SlotId) -> ShiftSwapResult<()> {
        let mut state = self.write()?;
        state
            .slots
            .remove(&slot_id)
            .map(|_| ())
            .ok_or_else(|| {
                StorageError::NotFound {
                    kind: EntityKind::Slot,
                    id: slot_id,
                }
                .into()
            })
    }

    fn slot_list_by_owner(&self, owner: UserId) -> ShiftSwapResult<Vec<Slot>> {
        let state = self.read()?;
        let mut slots: Vec<Slot> = state
            .slots
            .values()
            .filter(|s| s.owner == owner)
            .cloned()
            .collect();
        slots.sort_by_key(|s| s.starts_at);
        Ok(slots)
    }

    fn slot_list_offerable(
        &self,
        exclude_owner: UserId,
        limit: usize,
    ) -> ShiftSwapResult<Vec<Slot>> {
        let state = self.read()?;
        let mut slots: Vec<Slot> = state
            .slots
            .values()
            .filter(|s| s.status == SlotStatus::Offerable && s.owner != exclude_owner)
            .cloned()
            .collect();
        slots.sort_by_key(|s| s.starts_at);
        slots.truncate(limit);
        Ok(slots)
    }

    fn request_get(&self, request_id: RequestId) -> ShiftSwapResult<Option<SwapRequest>> {
        let state = self.read()?;
        Ok(state.requests.get(&request_id).cloned())
    }

    fn request_list_by_recipient(&self, recipient: UserId) -> ShiftSwapResult<Vec<SwapRequest>> {
        let state = self.read()?;
        let mut requests: Vec<SwapRequest> = state
            .requests
            .values()
            .filter(|r| r.recipient == recipient)
            .cloned()
            .collect();
        requests.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(requests)
    }

    fn request_list_by_requester(&self, requester: UserId) -> ShiftSwapResult<Vec<SwapRequest>> {
        let state = self.read()?;
        let mut requests: Vec<SwapRequest> = state
            .requests
            .values()
            .filter(|r| r.requester == requester)
            .cloned()
            .collect();
        requests.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(requests)
    }

    fn unit_of_work(&self, work: UnitFn<'_>) -> ShiftSwapResult<SwapRequest> {
        let mut guard = self.write()?;
        let mut staged = guard.clone();
        let result = work(&mut MemUnit { state: &mut staged });
        match result {
            Ok(request) => {
                *guard = staged;
                Ok(request)
            }
            Err(e) => Err(e),
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================


// ============================================================================
// PROPERTY-BASED TESTS
// ============================================================================

#[cfg(test)]
mod prop_tests {
    use super::*;
    use chrono::Duration;
    use proptest::prelude::*;
    use shiftswap_core::new_entity_id;

    fn seed_slots(store: &InMemoryStore, owners: &[UserId]) -> Vec<SlotId> {
        let now = Utc::now();
        owners
            .iter()
            .map(|owner| {
                let slot = Slot::new(
                    *owner,
                    "prop shift",
                    now,
                    now + Duration::hours(1),
                    SlotStatus::Offerable,
                );
                store.slot_insert(&slot).expect("insert");
                slot.slot_id
            })
            .collect()
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        /// Property: no interleaving of create attempts ever leaves a slot
        /// referenced by two pending requests, and the claims index always
        /// matches exactly the pending rows.
        #[test]
        fn prop_claims_index_matches_pending_rows(
            pairs in proptest::collection::vec((0usize..6, 0usize..6), 1..20)
        ) {
            let store = InMemoryStore::new();
            let owners: Vec<UserId> = (0..6).map(|_| new_entity_id()).collect();
            let slot_ids = seed_slots(&store, &owners);

            for (a, b) in pairs {
                if a == b {
                    continue;
                }
                // Either succeeds whole or leaves no trace; both are fine.
                let _ = store.unit_of_work(&mut |u| {
                    u.reserve(slot_ids[a], owners[a])?;
                    u.reserve_foreign(slot_ids[b], owners[a])?;
                    u.create_if_unclaimed(owners[a], owners[b], slot_ids[a], slot_ids[b])
                });
            }

            let state = store.state.read().unwrap();
            let mut seen: std::collections::HashMap<SlotId, usize> = Default::default();
            for request in state.requests.values() {
                if request.status == SwapStatus::Pending {
                    *seen.entry(request.offered_slot).or_default() += 1;
                    *seen.entry(request.target_slot).or_default() += 1;
                    prop_assert_eq!(
                        state.pending_by_slot.get(&request.offered_slot),
                        Some(&request.request_id)
                    );
                    prop_assert_eq!(
                        state.pending_by_slot.get(&request.target_slot),
                        Some(&request.request_id)
                    );
                }
            }
            for (_, count) in seen {
                prop_assert_eq!(count, 1);
            }
        }

        /// Property: every pending request's slots are Reserved; slots not
        /// referenced by a pending request are never Reserved.
        #[test]
        fn prop_reserved_iff_pending(
            pairs in proptest::collection::vec((0usize..5, 0usize..5), 1..15),
            resolve_mask in proptest::collection::vec(any::<bool>(), 15)
        ) {
            let store = InMemoryStore::new();
            let owners: Vec<UserId> = (0..5).map(|_| new_entity_id()).collect();
            let slot_ids = seed_slots(&store, &owners);

            let mut created = Vec::new();
            for (a, b) in pairs {
                if a == b {
                    continue;
                }
                if let Ok(request) = store.unit_of_work(&mut |u| {
                    u.reserve(slot_ids[a], owners[a])?;
                    u.reserve_foreign(slot_ids[b], owners[a])?;
                    u.create_if_unclaimed(owners[a], owners[b], slot_ids[a], slot_ids[b])
                }) {
                    created.push(request);
                }
            }

            // Resolve a random subset by rejecting (release both slots).
            for (request, resolve) in created.iter().zip(resolve_mask.iter()) {
                if *resolve {
                    store
                        .unit_of_work(&mut |u| {
                            let r = u.transition(request.request_id, SwapStatus::Rejected)?;
                            u.release(request.offered_slot)?;
                            u.release(request.target_slot)?;
                            Ok(r)
                        })
                        .expect("reject unit");
                }
            }

            let state = store.state.read().unwrap();
            for slot in state.slots.values() {
                let pending_refs = state
                    .requests
                    .values()
                    .filter(|r| r.status == SwapStatus::Pending && r.references(slot.slot_id))
                    .count();
                if slot.status == SlotStatus::Reserved {
                    prop_assert_eq!(pending_refs, 1);
                } else {
                    prop_assert_eq!(pending_refs, 0);
                }
            }
        }
    }
}
