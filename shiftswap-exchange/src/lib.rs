//! ShiftSwap Exchange - Swap Negotiation Core
//!
//! The coordinator is the only component with cross-entity invariants. It
//! orchestrates the reservation of two independently-owned slots and the
//! lifecycle of the negotiation record as one atomic unit:
//!
//! ```text
//! NONE ──initiate──► PENDING ──respond(accept)──► ACCEPTED
//!                       │
//!                       └────respond(reject)────► REJECTED
//!
//! per slot:  OFFERABLE ──reserve──► RESERVED ──release──► OFFERABLE
//!                                       │
//!                                   reassign (accept) ──► BUSY, new owner
//! ```
//!
//! Every multi-record mutation runs under the store's unit of work: either
//! all effects apply or none. Contended operations fail fast with a
//! precondition error; retrying is the caller's responsibility.

mod coordinator;
mod slots;

pub use coordinator::SwapCoordinator;
pub use slots::{NewSlot, SlotPatch, SlotService};
