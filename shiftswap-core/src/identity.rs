//! Identity types for ShiftSwap entities

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Opaque user identifier issued by the external identity provider.
/// The core trusts this value as caller identity with no further verification.
pub type UserId = Uuid;

/// Slot identifier using UUIDv7 for timestamp-sortable IDs.
pub type SlotId = Uuid;

/// Swap-request identifier using UUIDv7 for timestamp-sortable IDs.
pub type RequestId = Uuid;

/// Timestamp type using UTC timezone.
pub type Timestamp = DateTime<Utc>;

/// Generate a new UUIDv7 entity id (timestamp-sortable).
pub fn new_entity_id() -> Uuid {
    Uuid::now_v7()
}
