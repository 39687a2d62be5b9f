//! Enum types for ShiftSwap entities

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// SLOT STATUS
// ============================================================================

/// Lifecycle status of a time slot.
///
/// Status moves only through the ledger's compare-and-set primitives:
/// `Offerable -> Reserved` via reserve, `Reserved -> Offerable` via release,
/// `Reserved -> Busy` via reassign on an accepted swap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum SlotStatus {
    /// Held by its owner, not offered for trade
    #[default]
    Busy,
    /// Published on the marketplace, available for swap offers
    Offerable,
    /// Committed to exactly one live negotiation
    Reserved,
}

impl SlotStatus {
    /// Convert to database string representation.
    pub fn as_db_str(&self) -> &'static str {
        match self {
            SlotStatus::Busy => "Busy",
            SlotStatus::Offerable => "Offerable",
            SlotStatus::Reserved => "Reserved",
        }
    }

    /// Parse from database string representation.
    pub fn from_db_str(s: &str) -> Result<Self, SlotStatusParseError> {
        match s.to_lowercase().as_str() {
            "busy" => Ok(SlotStatus::Busy),
            "offerable" => Ok(SlotStatus::Offerable),
            "reserved" => Ok(SlotStatus::Reserved),
            _ => Err(SlotStatusParseError(s.to_string())),
        }
    }
}

impl fmt::Display for SlotStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_db_str())
    }
}

impl FromStr for SlotStatus {
    type Err = SlotStatusParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_db_str(s)
    }
}

/// Error when parsing an invalid slot status string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotStatusParseError(pub String);

impl fmt::Display for SlotStatusParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid slot status: {}", self.0)
    }
}

impl std::error::Error for SlotStatusParseError {}

// ============================================================================
// SWAP STATUS
// ============================================================================

/// Lifecycle status of a swap negotiation.
///
/// `Accepted` and `Rejected` are terminal; a request transitions out of
/// `Pending` exactly once and is immutable thereafter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum SwapStatus {
    /// Both slots reserved, awaiting the recipient's decision
    #[default]
    Pending,
    /// Recipient accepted; slot ownership was exchanged
    Accepted,
    /// Recipient rejected (or the request was cascaded out); slots released
    Rejected,
}

impl SwapStatus {
    /// Convert to database string representation.
    pub fn as_db_str(&self) -> &'static str {
        match self {
            SwapStatus::Pending => "Pending",
            SwapStatus::Accepted => "Accepted",
            SwapStatus::Rejected => "Rejected",
        }
    }

    /// Parse from database string representation.
    pub fn from_db_str(s: &str) -> Result<Self, SwapStatusParseError> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(SwapStatus::Pending),
            "accepted" => Ok(SwapStatus::Accepted),
            "rejected" => Ok(SwapStatus::Rejected),
            _ => Err(SwapStatusParseError(s.to_string())),
        }
    }

    /// Whether this status is terminal.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, SwapStatus::Pending)
    }
}

impl fmt::Display for SwapStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_db_str())
    }
}

impl FromStr for SwapStatus {
    type Err = SwapStatusParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_db_str(s)
    }
}

/// Error when parsing an invalid swap status string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapStatusParseError(pub String);

impl fmt::Display for SwapStatusParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid swap status: {}", self.0)
    }
}

impl std::error::Error for SwapStatusParseError {}

// ============================================================================
// ENTITY KIND
// ============================================================================

/// Entity type discriminator for error reporting and polymorphic references.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    Slot,
    SwapRequest,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKind::Slot => write!(f, "slot"),
            EntityKind::SwapRequest => write!(f, "swap request"),
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slot_status_roundtrip() {
        for status in [SlotStatus::Busy, SlotStatus::Offerable, SlotStatus::Reserved] {
            let db_str = status.as_db_str();
            let parsed = SlotStatus::from_db_str(db_str).unwrap();
            assert_eq!(status, parsed);
        }
    }

    #[test]
    fn test_slot_status_parse_case_insensitive() {
        assert_eq!(SlotStatus::from_db_str("OFFERABLE").unwrap(), SlotStatus::Offerable);
        assert_eq!("reserved".parse::<SlotStatus>().unwrap(), SlotStatus::Reserved);
    }

    #[test]
    fn test_slot_status_parse_invalid() {
        let err = SlotStatus::from_db_str("tentative").unwrap_err();
        assert!(err.to_string().contains("tentative"));
    }

    #[test]
    fn test_swap_status_roundtrip() {
        for status in [SwapStatus::Pending, SwapStatus::Accepted, SwapStatus::Rejected] {
            let db_str = status.as_db_str();
            let parsed = SwapStatus::from_db_str(db_str).unwrap();
            assert_eq!(status, parsed);
        }
    }

    #[test]
    fn test_swap_status_terminal() {
        assert!(!SwapStatus::Pending.is_terminal());
        assert!(SwapStatus::Accepted.is_terminal());
        assert!(SwapStatus::Rejected.is_terminal());
    }

    #[test]
    fn test_swap_status_parse_invalid() {
        assert!(SwapStatus::from_db_str("cancelled").is_err());
    }
}
