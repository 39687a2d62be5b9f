//! ShiftSwap Test Utilities
//!
//! Centralized test infrastructure for the ShiftSwap workspace:
//! - Slot and request fixtures for common scenarios
//! - Proptest generators for statuses and time intervals
//! - The seeded two-party marketplace most lifecycle tests start from

// Re-export the in-memory store and core types for convenience
pub use shiftswap_core::{
    new_entity_id, Slot, SlotId, SlotStatus, SwapConfig, SwapRequest, SwapStatus, Timestamp,
    UserId,
};
pub use shiftswap_storage::{InMemoryStore, SwapStore};

use chrono::{Duration, Utc};
use proptest::prelude::*;
use std::sync::Arc;

// ============================================================================
// FIXTURES
// ============================================================================

/// A one-hour slot starting now, in the given status.
pub fn slot_with_status(owner: UserId, status: SlotStatus) -> Slot {
    let now = Utc::now();
    Slot::new(owner, "Covered shift", now, now + Duration::hours(1), status)
}

/// An offerable one-hour slot starting now.
pub fn offerable_slot(owner: UserId) -> Slot {
    slot_with_status(owner, SlotStatus::Offerable)
}

/// A busy one-hour slot starting now.
pub fn busy_slot(owner: UserId) -> Slot {
    slot_with_status(owner, SlotStatus::Busy)
}

/// The scenario most lifecycle tests start from: two users, each owning one
/// offerable slot.
#[derive(Debug, Clone)]
pub struct TwoPartyMarket {
    pub u1: UserId,
    pub u2: UserId,
    pub s1: Slot,
    pub s2: Slot,
}

/// Build a store seeded with the two-party scenario.
pub fn two_party_market() -> (Arc<InMemoryStore>, TwoPartyMarket) {
    let store = Arc::new(InMemoryStore::new());
    let u1 = new_entity_id();
    let u2 = new_entity_id();
    let now = Utc::now();
    let s1 = Slot::new(
        u1,
        "Early shift",
        now,
        now + Duration::hours(1),
        SlotStatus::Offerable,
    );
    let s2 = Slot::new(
        u2,
        "Late shift",
        now + Duration::hours(2),
        now + Duration::hours(3),
        SlotStatus::Offerable,
    );
    store.slot_insert(&s1).expect("seed s1");
    store.slot_insert(&s2).expect("seed s2");
    (store, TwoPartyMarket { u1, u2, s1, s2 })
}

// ============================================================================
// PROPTEST GENERATORS
// ============================================================================

/// Any slot status.
pub fn arb_slot_status() -> impl Strategy<Value = SlotStatus> {
    prop_oneof![
        Just(SlotStatus::Busy),
        Just(SlotStatus::Offerable),
        Just(SlotStatus::Reserved),
    ]
}

/// Any swap status.
pub fn arb_swap_status() -> impl Strategy<Value = SwapStatus> {
    prop_oneof![
        Just(SwapStatus::Pending),
        Just(SwapStatus::Accepted),
        Just(SwapStatus::Rejected),
    ]
}

/// A well-formed (start, end) interval: end strictly after start, up to a
/// week long, anchored within a year of now.
pub fn arb_time_interval() -> impl Strategy<Value = (Timestamp, Timestamp)> {
    (-525_600i64..525_600, 1i64..10_080).prop_map(|(offset_min, len_min)| {
        let start = Utc::now() + Duration::minutes(offset_min);
        (start, start + Duration::minutes(len_min))
    })
}

// =============================================================================
// TESTS
// =============================================================================
