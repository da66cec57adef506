//! Lease management: exclusive, time-bounded entity control.
//!
//! A lease grants one controller the exclusive right to submit intents for
//! one entity. At most one active lease exists per entity at any instant.
//! Expiry is passive (wall-clock TTL); expired leases are reclaimed lazily
//! by the operation that touches them and by a sweep the scheduler runs
//! once per tick.
//!
//! Denials are reported, never retried; expiry is terminal and the
//! controller must re-acquire.

use std::collections::BTreeMap;

use glade_types::{ControllerId, EntityId, Lease, LeaseId};
use tracing::debug;

/// Why a lease operation was denied.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LeaseDenied {
    /// Another controller holds an active lease on the entity.
    #[error("already_leased")]
    AlreadyLeased {
        /// The controller currently holding the lease.
        holder: ControllerId,
    },

    /// The lease exists but has passed its expiry.
    #[error("expired")]
    Expired,

    /// No lease with the given id exists.
    #[error("unknown_lease")]
    UnknownLease,
}

impl LeaseDenied {
    /// The machine-readable reason tag carried on the wire.
    pub const fn reason(&self) -> &'static str {
        match self {
            Self::AlreadyLeased { .. } => "already_leased",
            Self::Expired => "expired",
            Self::UnknownLease => "unknown_lease",
        }
    }
}

/// Issues, renews, validates, and expires controller leases.
///
/// Owned by the single-threaded core; adapters reach it only through core
/// commands.
#[derive(Debug)]
pub struct LeaseManager {
    /// Lease time-to-live in milliseconds.
    ttl_ms: i64,
    /// All known leases by id (expired entries linger until reclaimed).
    leases: BTreeMap<LeaseId, Lease>,
    /// The latest lease issued per entity. Only this entry can be active.
    by_entity: BTreeMap<EntityId, LeaseId>,
}

impl LeaseManager {
    /// Create a manager issuing leases with the given TTL.
    pub const fn new(ttl_ms: i64) -> Self {
        Self {
            ttl_ms,
            leases: BTreeMap::new(),
            by_entity: BTreeMap::new(),
        }
    }

    /// Acquire a lease on `entity_id` for `controller_id`.
    ///
    /// Succeeds when the entity has no active lease, or when the active
    /// lease already belongs to the same controller (renewal-on-acquire:
    /// the old lease is superseded by a fresh id and expiry — callers must
    /// use whatever this returns).
    ///
    /// # Errors
    ///
    /// Returns [`LeaseDenied::AlreadyLeased`] when another controller holds
    /// an active lease.
    pub fn acquire(
        &mut self,
        entity_id: &EntityId,
        controller_id: &ControllerId,
        now_ms: i64,
    ) -> Result<Lease, LeaseDenied> {
        if let Some(existing) = self.active_lease(entity_id, now_ms) {
            if existing.controller_id != *controller_id {
                return Err(LeaseDenied::AlreadyLeased {
                    holder: existing.controller_id.clone(),
                });
            }
            // Same controller: supersede the old lease.
            let old_id = existing.lease_id;
            self.leases.remove(&old_id);
        }

        let lease = Lease {
            lease_id: LeaseId::new(),
            entity_id: entity_id.clone(),
            controller_id: controller_id.clone(),
            issued_at_ms: now_ms,
            expires_at_ms: now_ms.saturating_add(self.ttl_ms),
        };
        debug!(
            lease_id = %lease.lease_id,
            entity_id = %entity_id,
            controller_id = %controller_id,
            expires_at_ms = lease.expires_at_ms,
            "Lease acquired"
        );
        self.by_entity.insert(entity_id.clone(), lease.lease_id);
        self.leases.insert(lease.lease_id, lease.clone());
        Ok(lease)
    }

    /// Extend a lease's expiry to `now + TTL`. The lease id is unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`LeaseDenied::UnknownLease`] for an unknown id or
    /// [`LeaseDenied::Expired`] for a lease past its expiry (which is
    /// reclaimed in passing).
    pub fn renew(&mut self, lease_id: LeaseId, now_ms: i64) -> Result<Lease, LeaseDenied> {
        let Some(lease) = self.leases.get(&lease_id) else {
            return Err(LeaseDenied::UnknownLease);
        };
        if lease.is_expired(now_ms) || self.by_entity.get(&lease.entity_id) != Some(&lease_id) {
            self.reclaim(lease_id);
            return Err(LeaseDenied::Expired);
        }
        let expires_at_ms = now_ms.saturating_add(self.ttl_ms);
        if let Some(lease) = self.leases.get_mut(&lease_id) {
            lease.expires_at_ms = expires_at_ms;
            debug!(lease_id = %lease_id, expires_at_ms, "Lease renewed");
            return Ok(lease.clone());
        }
        Err(LeaseDenied::UnknownLease)
    }

    /// Release a lease explicitly. Returns whether a lease was removed.
    pub fn release(&mut self, lease_id: LeaseId) -> bool {
        let Some(lease) = self.leases.remove(&lease_id) else {
            return false;
        };
        if self.by_entity.get(&lease.entity_id) == Some(&lease_id) {
            self.by_entity.remove(&lease.entity_id);
        }
        debug!(lease_id = %lease_id, entity_id = %lease.entity_id, "Lease released");
        true
    }

    /// Whether `lease_id` exists, is unexpired, is the entity's latest
    /// lease, and matches `entity_id`.
    pub fn validate(&self, lease_id: LeaseId, entity_id: &EntityId, now_ms: i64) -> bool {
        self.leases.get(&lease_id).is_some_and(|lease| {
            lease.entity_id == *entity_id
                && !lease.is_expired(now_ms)
                && self.by_entity.get(entity_id) == Some(&lease_id)
        })
    }

    /// The entity's active lease, if any.
    pub fn active_lease(&self, entity_id: &EntityId, now_ms: i64) -> Option<&Lease> {
        let lease_id = self.by_entity.get(entity_id)?;
        let lease = self.leases.get(lease_id)?;
        (!lease.is_expired(now_ms)).then_some(lease)
    }

    /// The id of the entity's active lease, if any.
    pub fn active_lease_id(&self, entity_id: &EntityId, now_ms: i64) -> Option<LeaseId> {
        self.active_lease(entity_id, now_ms).map(|l| l.lease_id)
    }

    /// Reclaim every expired lease. Returns the reclaimed leases.
    ///
    /// The scheduler runs this once per tick; callers must not run it more
    /// often.
    pub fn sweep_expired(&mut self, now_ms: i64) -> Vec<Lease> {
        let expired: Vec<LeaseId> = self
            .leases
            .iter()
            .filter(|(_, lease)| lease.is_expired(now_ms))
            .map(|(id, _)| *id)
            .collect();

        let mut reclaimed = Vec::new();
        for lease_id in expired {
            if let Some(lease) = self.leases.remove(&lease_id) {
                if self.by_entity.get(&lease.entity_id) == Some(&lease_id) {
                    self.by_entity.remove(&lease.entity_id);
                }
                debug!(lease_id = %lease_id, entity_id = %lease.entity_id, "Lease expired");
                reclaimed.push(lease);
            }
        }
        reclaimed
    }

    /// Remove a lease record without logging a release.
    fn reclaim(&mut self, lease_id: LeaseId) {
        if let Some(lease) = self.leases.remove(&lease_id)
            && self.by_entity.get(&lease.entity_id) == Some(&lease_id)
        {
            self.by_entity.remove(&lease.entity_id);
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const TTL: i64 = 30_000;

    fn manager() -> LeaseManager {
        LeaseManager::new(TTL)
    }

    fn entity() -> EntityId {
        EntityId::new("walker-1")
    }

    #[test]
    fn acquire_grants_with_ttl() {
        let mut leases = manager();
        let lease = leases
            .acquire(&entity(), &ControllerId::new("ctl-a"), 1_000)
            .unwrap();
        assert_eq!(lease.expires_at_ms, 1_000 + TTL);
        assert!(leases.validate(lease.lease_id, &entity(), 1_000));
    }

    #[test]
    fn second_controller_is_denied() {
        let mut leases = manager();
        let _ = leases
            .acquire(&entity(), &ControllerId::new("ctl-a"), 1_000)
            .unwrap();
        let denied = leases
            .acquire(&entity(), &ControllerId::new("ctl-b"), 2_000)
            .unwrap_err();
        assert_eq!(
            denied,
            LeaseDenied::AlreadyLeased {
                holder: ControllerId::new("ctl-a"),
            }
        );
        assert_eq!(denied.reason(), "already_leased");
    }

    #[test]
    fn same_controller_reacquire_supersedes() {
        let mut leases = manager();
        let first = leases
            .acquire(&entity(), &ControllerId::new("ctl-a"), 1_000)
            .unwrap();
        let second = leases
            .acquire(&entity(), &ControllerId::new("ctl-a"), 5_000)
            .unwrap();

        assert_ne!(first.lease_id, second.lease_id);
        assert_eq!(second.expires_at_ms, 5_000 + TTL);
        // The superseded id no longer validates.
        assert!(!leases.validate(first.lease_id, &entity(), 6_000));
        assert!(leases.validate(second.lease_id, &entity(), 6_000));
    }

    #[test]
    fn at_most_one_active_lease_per_entity() {
        let mut leases = manager();
        let _ = leases.acquire(&entity(), &ControllerId::new("ctl-a"), 1_000);
        let _ = leases.acquire(&entity(), &ControllerId::new("ctl-a"), 2_000);
        let _ = leases.acquire(&entity(), &ControllerId::new("ctl-b"), 2_500);

        let active: Vec<LeaseId> = leases.active_lease_id(&entity(), 3_000).into_iter().collect();
        assert_eq!(active.len(), 1);
    }

    #[test]
    fn expired_lease_can_be_reacquired_by_anyone() {
        let mut leases = manager();
        let old = leases
            .acquire(&entity(), &ControllerId::new("ctl-a"), 1_000)
            .unwrap();

        let after_expiry = old.expires_at_ms;
        let lease = leases
            .acquire(&entity(), &ControllerId::new("ctl-b"), after_expiry)
            .unwrap();
        assert_eq!(lease.controller_id, ControllerId::new("ctl-b"));
        assert!(!leases.validate(old.lease_id, &entity(), after_expiry));
    }

    #[test]
    fn renew_extends_same_id() {
        let mut leases = manager();
        let lease = leases
            .acquire(&entity(), &ControllerId::new("ctl-a"), 1_000)
            .unwrap();
        let renewed = leases.renew(lease.lease_id, 10_000).unwrap();
        assert_eq!(renewed.lease_id, lease.lease_id);
        assert_eq!(renewed.expires_at_ms, 10_000 + TTL);
    }

    #[test]
    fn renew_after_expiry_is_terminal() {
        let mut leases = manager();
        let lease = leases
            .acquire(&entity(), &ControllerId::new("ctl-a"), 1_000)
            .unwrap();
        let denied = leases.renew(lease.lease_id, lease.expires_at_ms).unwrap_err();
        assert_eq!(denied, LeaseDenied::Expired);
        // The record is reclaimed; a second renew sees an unknown lease.
        let denied = leases.renew(lease.lease_id, lease.expires_at_ms).unwrap_err();
        assert_eq!(denied, LeaseDenied::UnknownLease);
    }

    #[test]
    fn renew_unknown_lease() {
        let mut leases = manager();
        assert_eq!(
            leases.renew(LeaseId::new(), 1_000).unwrap_err(),
            LeaseDenied::UnknownLease
        );
    }

    #[test]
    fn release_frees_the_entity() {
        let mut leases = manager();
        let lease = leases
            .acquire(&entity(), &ControllerId::new("ctl-a"), 1_000)
            .unwrap();
        assert!(leases.release(lease.lease_id));
        assert!(!leases.release(lease.lease_id));

        let lease = leases
            .acquire(&entity(), &ControllerId::new("ctl-b"), 2_000)
            .unwrap();
        assert_eq!(lease.controller_id, ControllerId::new("ctl-b"));
    }

    #[test]
    fn validate_rejects_mismatched_entity() {
        let mut leases = manager();
        let lease = leases
            .acquire(&entity(), &ControllerId::new("ctl-a"), 1_000)
            .unwrap();
        assert!(!leases.validate(lease.lease_id, &EntityId::new("other"), 2_000));
    }

    #[test]
    fn sweep_reclaims_only_expired() {
        let mut leases = manager();
        let expiring = leases
            .acquire(&EntityId::new("a"), &ControllerId::new("ctl-a"), 0)
            .unwrap();
        let _fresh = leases
            .acquire(&EntityId::new("b"), &ControllerId::new("ctl-b"), 20_000)
            .unwrap();

        let reclaimed = leases.sweep_expired(TTL);
        assert_eq!(reclaimed.len(), 1);
        assert_eq!(
            reclaimed.first().map(|l| l.lease_id),
            Some(expiring.lease_id)
        );
        assert!(leases.active_lease(&EntityId::new("b"), TTL).is_some());
        assert!(leases.active_lease(&EntityId::new("a"), TTL).is_none());
    }
}
