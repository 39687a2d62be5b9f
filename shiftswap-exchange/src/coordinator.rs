//! The swap coordinator: initiation, response, cascade, and the read-only
//! negotiation projections.

use std::sync::Arc;

use tracing::{debug, info, warn};

use shiftswap_core::{
    EntityKind, IntegrityError, PreconditionError, RequestId, ShiftSwapError, ShiftSwapResult,
    Slot, SlotId, SwapConfig, SwapRequest, SwapStatus, SwapSummary, UserId, ValidationError,
};
use shiftswap_storage::SwapStore;

/// Checks an identifier before storage is touched.
fn require_id(field: &str, id: uuid::Uuid) -> ShiftSwapResult<()> {
    if id.is_nil() {
        return Err(ValidationError::RequiredFieldMissing {
            field: field.to_string(),
        }
        .into());
    }
    Ok(())
}

/// Orchestrates two-slot reservations and the negotiation lifecycle.
///
/// All mutations run under the store's unit of work; on any failure the unit
/// rolls back whole, so no partial reservation, orphaned pending record, or
/// slot stuck `Reserved` without a matching request can persist.
pub struct SwapCoordinator {
    store: Arc<dyn SwapStore>,
    config: SwapConfig,
}

impl SwapCoordinator {
    /// Create a coordinator over the given store.
    pub fn new(store: Arc<dyn SwapStore>, config: SwapConfig) -> Self {
        Self { store, config }
    }

    /// Open a negotiation: reserve the requester's slot, reserve the target
    /// slot, and create the pending request, as one atomic unit.
    ///
    /// Reservations are acquired in a fixed order (offered, then target), so
    /// two initiations targeting each other's slots cannot wedge; the second
    /// to reach a contended slot fails fast with `SlotNotOfferable`.
    pub fn initiate_swap(
        &self,
        requester: UserId,
        offered_slot_id: SlotId,
        target_slot_id: SlotId,
    ) -> ShiftSwapResult<SwapRequest> {
        require_id("requester", requester)?;
        require_id("offered_slot_id", offered_slot_id)?;
        require_id("target_slot_id", target_slot_id)?;
        if offered_slot_id == target_slot_id {
            return Err(ValidationError::InvalidValue {
                field: "target_slot_id".to_string(),
                reason: "offered and target slots must differ".to_string(),
            }
            .into());
        }

        let result = self.store.unit_of_work(&mut |unit| {
            unit.reserve(offered_slot_id, requester)?;
            let target_slot = unit.reserve_foreign(target_slot_id, requester)?;
            unit.create_if_unclaimed(requester, target_slot.owner, offered_slot_id, target_slot_id)
        });

        match &result {
            Ok(request) => info!(
                request_id = %request.request_id,
                requester = %requester,
                recipient = %request.recipient,
                "swap initiated"
            ),
            Err(e) if e.is_benign() => {
                debug!(requester = %requester, error = %e, "swap initiation refused")
            }
            Err(e) => warn!(requester = %requester, error = %e, "swap initiation failed"),
        }
        result
    }

    /// Resolve a pending negotiation as its recipient.
    ///
    /// A missing request is `NotFound` for any caller; an existing request
    /// answered by anyone but its recipient is `Forbidden`. A request that
    /// already left `Pending` fails `AlreadyHandled` and changes nothing.
    pub fn respond_swap(
        &self,
        caller: UserId,
        request_id: RequestId,
        accept: bool,
    ) -> ShiftSwapResult<SwapRequest> {
        require_id("caller", caller)?;
        require_id("request_id", request_id)?;

        let request = self.store.request_get(request_id)?.ok_or(
            PreconditionError::NotFound {
                kind: EntityKind::SwapRequest,
                id: request_id,
            },
        )?;
        if request.recipient != caller {
            debug!(request_id = %request_id, caller = %caller, "respond refused: not the recipient");
            return Err(PreconditionError::Forbidden { user_id: caller }.into());
        }
        if request.status.is_terminal() {
            return Err(PreconditionError::AlreadyHandled { request_id }.into());
        }

        let result = if accept {
            self.accept(&request)
        } else {
            self.reject(&request)
        };

        match &result {
            Ok(updated) => info!(
                request_id = %request_id,
                status = %updated.status,
                "swap request resolved"
            ),
            Err(ShiftSwapError::Integrity(e)) => warn!(
                request_id = %request_id,
                error = %e,
                "integrity fault while resolving swap request; left pending"
            ),
            Err(e) => debug!(request_id = %request_id, error = %e, "respond refused"),
        }
        result
    }

    /// Reject path: terminal transition plus release of both reservations.
    /// If a concurrent caller already resolved the request, the transition
    /// fails first and no release runs.
    fn reject(&self, request: &SwapRequest) -> ShiftSwapResult<SwapRequest> {
        self.store.unit_of_work(&mut |unit| {
            let updated = unit.transition(request.request_id, SwapStatus::Rejected)?;
            unit.release(request.offered_slot)?;
            unit.release(request.target_slot)?;
            Ok(updated)
        })
    }

    /// Accept path: terminal transition, ownership re-validation, the double
    /// reassign, and the cascade sweep, all in one unit.
    ///
    /// Ownership can only have drifted if an invariant elsewhere was already
    /// violated; that is surfaced as an integrity fault and the whole unit -
    /// including the transition - rolls back, leaving the request `Pending`
    /// for administrative resolution.
    fn accept(&self, request: &SwapRequest) -> ShiftSwapResult<SwapRequest> {
        self.store.unit_of_work(&mut |unit| {
            let updated = unit.transition(request.request_id, SwapStatus::Accepted)?;

            let offered = unit.slot(request.offered_slot)?;
            if offered.owner != request.requester {
                return Err(IntegrityError::OwnershipDrift {
                    request_id: request.request_id,
                    slot_id: offered.slot_id,
                    expected_owner: request.requester,
                    found_owner: offered.owner,
                }
                .into());
            }
            let target = unit.slot(request.target_slot)?;
            if target.owner != request.recipient {
                return Err(IntegrityError::OwnershipDrift {
                    request_id: request.request_id,
                    slot_id: target.slot_id,
                    expected_owner: request.recipient,
                    found_owner: target.owner,
                }
                .into());
            }

            unit.reassign(request.offered_slot, request.recipient)?;
            unit.reassign(request.target_slot, request.requester)?;

            let swept = unit.reject_stale_pending(
                request.request_id,
                &[request.offered_slot, request.target_slot],
            )?;
            if !swept.is_empty() {
                debug!(
                    request_id = %request.request_id,
                    swept = swept.len(),
                    "cascade-rejected stale pending requests"
                );
            }

            Ok(updated)
        })
    }

    /// Marketplace projection: offerable slots owned by other users, ordered
    /// by start time, capped by configuration.
    pub fn marketplace(&self, caller: UserId) -> ShiftSwapResult<Vec<Slot>> {
        require_id("caller", caller)?;
        self.store
            .slot_list_offerable(caller, self.config.marketplace_limit)
    }

    /// Negotiations addressed to the caller, newest first.
    pub fn list_incoming(&self, caller: UserId) -> ShiftSwapResult<Vec<SwapSummary>> {
        require_id("caller", caller)?;
        self.store
            .request_list_by_recipient(caller)?
            .into_iter()
            .map(|r| {
                let counterpart = r.requester;
                self.summarize(r, counterpart)
            })
            .collect()
    }

    /// Negotiations opened by the caller, newest first.
    pub fn list_outgoing(&self, caller: UserId) -> ShiftSwapResult<Vec<SwapSummary>> {
        require_id("caller", caller)?;
        self.store
            .request_list_by_requester(caller)?
            .into_iter()
            .map(|r| {
                let counterpart = r.recipient;
                self.summarize(r, counterpart)
            })
            .collect()
    }

    fn summarize(
        &self,
        request: SwapRequest,
        counterpart: UserId,
    ) -> ShiftSwapResult<SwapSummary> {
        let offered_title = self.store.slot_get(request.offered_slot)?.map(|s| s.title);
        let target_title = self.store.slot_get(request.target_slot)?.map(|s| s.title);
        Ok(SwapSummary {
            request_id: request.request_id,
            counterpart,
            offered_slot: request.offered_slot,
            target_slot: request.target_slot,
            offered_title,
            target_title,
            status: request.status,
            created_at: request.created_at,
        })
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use shiftswap_core::new_entity_id;
    use shiftswap_storage::InMemoryStore;
    use shiftswap_test_utils::{busy_slot, offerable_slot, two_party_market, TwoPartyMarket};

    fn setup() -> (SwapCoordinator, Arc<InMemoryStore>, TwoPartyMarket) {
        let (store, market) = two_party_market();
        let coordinator = SwapCoordinator::new(store.clone(), SwapConfig::default());
        (coordinator, store, market)
    }

    #[test]
    fn test_initiate_rejects_nil_ids() {
        let (coordinator, _, market) = setup();
        let result =
            coordinator.initiate_swap(uuid::Uuid::nil(), market.s1.slot_id, market.s2.slot_id);
        assert!(matches!(result, Err(ShiftSwapError::Validation(_))));
    }

    #[test]
    fn test_initiate_rejects_self_swap_of_same_slot() {
        let (coordinator, _, market) = setup();
        let result = coordinator.initiate_swap(market.u1, market.s1.slot_id, market.s1.slot_id);
        assert!(matches!(
            result,
            Err(ShiftSwapError::Validation(ValidationError::InvalidValue { .. }))
        ));
    }

    #[test]
    fn test_respond_missing_request_is_not_found() {
        let (coordinator, _, market) = setup();
        let result = coordinator.respond_swap(market.u2, new_entity_id(), true);
        assert!(matches!(
            result,
            Err(ShiftSwapError::Precondition(PreconditionError::NotFound { .. }))
        ));
    }

    #[test]
    fn test_marketplace_excludes_caller_and_busy_slots() {
        let (coordinator, store, market) = setup();
        // A busy slot of u2's never shows up.
        store.slot_insert(&busy_slot(market.u2)).unwrap();

        let listed = coordinator.marketplace(market.u1).unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].slot_id, market.s2.slot_id);
    }

    #[test]
    fn test_marketplace_respects_configured_cap() {
        let (_, store, market) = setup();
        for _ in 0..5 {
            store.slot_insert(&offerable_slot(market.u2)).unwrap();
        }
        let coordinator = SwapCoordinator::new(
            store,
            SwapConfig {
                marketplace_limit: 3,
                ..Default::default()
            },
        );
        assert_eq!(coordinator.marketplace(market.u1).unwrap().len(), 3);
    }

    #[test]
    fn test_listings_carry_title_snapshots_and_counterparts() {
        let (coordinator, _, market) = setup();
        let request = coordinator
            .initiate_swap(market.u1, market.s1.slot_id, market.s2.slot_id)
            .unwrap();

        let incoming = coordinator.list_incoming(market.u2).unwrap();
        assert_eq!(incoming.len(), 1);
        assert_eq!(incoming[0].request_id, request.request_id);
        assert_eq!(incoming[0].counterpart, market.u1);
        assert_eq!(incoming[0].offered_title.as_deref(), Some(market.s1.title.as_str()));

        let outgoing = coordinator.list_outgoing(market.u1).unwrap();
        assert_eq!(outgoing.len(), 1);
        assert_eq!(outgoing[0].counterpart, market.u2);
        assert_eq!(outgoing[0].target_title.as_deref(), Some(market.s2.title.as_str()));

        assert!(coordinator.list_incoming(market.u1).unwrap().is_empty());
        assert!(coordinator.list_outgoing(market.u2).unwrap().is_empty());
    }
}
