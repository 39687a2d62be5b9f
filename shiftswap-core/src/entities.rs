//! Core entity structures

use crate::{
    new_entity_id, RequestId, SlotId, SlotStatus, SwapStatus, Timestamp, UserId,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Slot - a time interval owned by a user, tradeable when `Offerable`.
///
/// The owner field is reassigned atomically by the coordinator when a swap
/// is accepted; no other path may change ownership.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Slot {
    pub slot_id: SlotId,
    pub title: String,
    pub starts_at: Timestamp,
    pub ends_at: Timestamp,
    pub owner: UserId,
    pub status: SlotStatus,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub metadata: Option<serde_json::Value>,
}

impl Slot {
    /// Create a new slot owned by `owner`.
    ///
    /// Interval validation is the slot service's concern; the constructor
    /// only stamps identity and timestamps.
    pub fn new(
        owner: UserId,
        title: impl Into<String>,
        starts_at: Timestamp,
        ends_at: Timestamp,
        status: SlotStatus,
    ) -> Self {
        let now = Utc::now();
        Self {
            slot_id: new_entity_id(),
            title: title.into(),
            starts_at,
            ends_at,
            owner,
            status,
            created_at: now,
            updated_at: now,
            metadata: None,
        }
    }
}

/// SwapRequest - a two-party proposal to exchange ownership of two slots.
///
/// References slots by identifier only; slot ownership can change
/// independently once the request reaches a terminal status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwapRequest {
    pub request_id: RequestId,
    /// User who opened the negotiation and offered one of their own slots
    pub requester: UserId,
    /// Owner of the target slot at creation time
    pub recipient: UserId,
    /// The requester's slot put up for exchange
    pub offered_slot: SlotId,
    /// The recipient's slot the requester wants
    pub target_slot: SlotId,
    pub status: SwapStatus,
    pub created_at: Timestamp,
    /// Stamped when the request leaves `Pending`
    pub resolved_at: Option<Timestamp>,
}

impl SwapRequest {
    /// Create a new pending request.
    pub fn new(
        requester: UserId,
        recipient: UserId,
        offered_slot: SlotId,
        target_slot: SlotId,
    ) -> Self {
        Self {
            request_id: new_entity_id(),
            requester,
            recipient,
            offered_slot,
            target_slot,
            status: SwapStatus::Pending,
            created_at: Utc::now(),
            resolved_at: None,
        }
    }

    /// Whether `slot_id` appears in this request, in either role.
    pub fn references(&self, slot_id: SlotId) -> bool {
        self.offered_slot == slot_id || self.target_slot == slot_id
    }
}

/// Negotiation summary returned by the incoming/outgoing listings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwapSummary {
    pub request_id: RequestId,
    /// The other party: the requester for incoming, the recipient for outgoing
    pub counterpart: UserId,
    pub offered_slot: SlotId,
    pub target_slot: SlotId,
    /// Title snapshots resolved through the ledger at listing time; absent
    /// when a referenced slot has since been deleted
    pub offered_title: Option<String>,
    pub target_title: Option<String>,
    pub status: SwapStatus,
    pub created_at: Timestamp,
}

// =============================================================================
// TESTS
// =============================================================================
