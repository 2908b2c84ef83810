//! Assignment and removal decisions over the relationship graph.
//!
//! # Invariants
//! - A pet with owners may only gain an owner from the household of one of
//!   its current owners (structural address equality).
//! - Removal on behalf of an ambiguous identity must be anchored to the
//!   household of one of the pet's current owners.
//! - Age never participates; gender never participates.

use crate::model::link::is_linked;
use crate::model::owner::Owner;
use crate::model::pet::PetWithOwners;
use crate::rules::homonym::HomonymGroup;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Stable reason a link change was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Denial {
    /// Link already exists for this exact owner.
    AlreadyAssigned,
    /// Owner does not share an address with any current owner.
    AddressMismatch,
    /// Link does not exist for this exact owner.
    NotAssigned,
}

impl Denial {
    /// Stable machine-readable code.
    pub fn code(self) -> &'static str {
        match self {
            Self::AlreadyAssigned => "already-assigned",
            Self::AddressMismatch => "address-mismatch",
            Self::NotAssigned => "not-assigned",
        }
    }
}

impl Display for Denial {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AlreadyAssigned => write!(f, "pet is already assigned to this owner"),
            Self::AddressMismatch => {
                write!(f, "owner does not share an address with the pet's owners")
            }
            Self::NotAssigned => write!(f, "pet is not assigned to this owner"),
        }
    }
}

impl Error for Denial {}

/// Outcome of a rules evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny(Denial),
}

impl Decision {
    pub fn is_allowed(self) -> bool {
        matches!(self, Self::Allow)
    }

    /// Converts the decision into a `Result` for `?` propagation.
    pub fn into_result(self) -> Result<(), Denial> {
        match self {
            Self::Allow => Ok(()),
            Self::Deny(denial) => Err(denial),
        }
    }
}

/// Decides whether `owner` may become an owner of `pet`.
///
/// A pet with no owners can be assigned to anyone.
pub fn can_assign(owner: &Owner, pet: &PetWithOwners) -> Decision {
    if is_linked(owner, &pet.pet) {
        return Decision::Deny(Denial::AlreadyAssigned);
    }
    if !pet.owners.is_empty() && !pet.has_owner_in_household_of(owner) {
        return Decision::Deny(Denial::AddressMismatch);
    }
    Decision::Allow
}

/// Decides whether the `owner` -> `pet` link may be removed.
///
/// `group` is the homonym group of `owner`'s identity. When it is ambiguous
/// the household check runs before the link check, so a homonym living
/// elsewhere is refused with `AddressMismatch` rather than `NotAssigned`.
pub fn can_remove(owner: &Owner, pet: &PetWithOwners, group: &HomonymGroup) -> Decision {
    if group.is_ambiguous() && !pet.has_owner_in_household_of(owner) {
        return Decision::Deny(Denial::AddressMismatch);
    }
    if !is_linked(owner, &pet.pet) {
        return Decision::Deny(Denial::NotAssigned);
    }
    Decision::Allow
}
