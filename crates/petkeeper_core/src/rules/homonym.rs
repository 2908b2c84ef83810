//! Homonym groups: active owners sharing one display identity.
//!
//! # Invariants
//! - Members are active and carry exactly the group identity
//!   (case-sensitive on both fields).
//! - Members are ordered by id.

use crate::model::address::Address;
use crate::model::owner::{Identity, Owner, OwnerId};
use crate::repo::entity_store::EntityStore;
use crate::repo::RepoResult;

/// Active owners carrying one `(name, first_name)` pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HomonymGroup {
    identity: Identity,
    members: Vec<Owner>,
}

impl HomonymGroup {
    /// Builds a group from candidate owners, dropping deceased owners and
    /// owners with a different identity.
    pub fn new(identity: Identity, candidates: Vec<Owner>) -> Self {
        let mut members: Vec<Owner> = candidates
            .into_iter()
            .filter(|owner| owner.is_active() && owner.has_identity(&identity))
            .collect();
        members.sort_by_key(|owner| owner.uuid);
        members.dedup_by_key(|owner| owner.uuid);
        Self { identity, members }
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn members(&self) -> &[Owner] {
        &self.members
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Two or more distinct active people share the identity.
    pub fn is_ambiguous(&self) -> bool {
        self.members.len() >= 2
    }

    pub fn contains(&self, owner_id: OwnerId) -> bool {
        self.members.iter().any(|owner| owner.uuid == owner_id)
    }

    /// Ids of members living at an address structurally equal to `address`.
    pub fn narrow_to_address(&self, address: &Address) -> Vec<OwnerId> {
        self.members
            .iter()
            .filter(|owner| &owner.address == address)
            .map(|owner| owner.uuid)
            .collect()
    }
}

/// Loads the homonym group for `identity`. Read-only.
pub fn resolve_homonyms(store: &dyn EntityStore, identity: &Identity) -> RepoResult<HomonymGroup> {
    let candidates = store.find_active_owners_by_identity(identity)?;
    Ok(HomonymGroup::new(identity.clone(), candidates))
}
