//! ShiftSwap Core - Entity Types
//!
//! Pure data structures with no behavior. All other crates depend on this.
//! This crate contains ONLY data types - no business logic.

mod config;
mod entities;
mod enums;
mod error;
mod identity;

pub use config::SwapConfig;
pub use entities::{Slot, SwapRequest, SwapSummary};
pub use enums::{
    EntityKind, SlotStatus, SlotStatusParseError, SwapStatus, SwapStatusParseError,
};
pub use error::{
    ConfigError, IntegrityError, PreconditionError, ShiftSwapError, ShiftSwapResult,
    StorageError, ValidationError,
};
pub use identity::{new_entity_id, RequestId, SlotId, Timestamp, UserId};

// =============================================================================
// PROPERTY-BASED TESTS
// =============================================================================
