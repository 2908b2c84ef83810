//! Pet domain model.
//!
//! # Responsibility
//! - Define the animal record and its inverse link set.
//! - Define the eager-loaded `PetWithOwners` read model used by the rules.
//!
//! # Invariants
//! - `age`, when present, is strictly positive.
//! - `is_deceased` only ever moves from `false` to `true`.
//! - `owners` is changed only through `model::link`.

use crate::model::owner::{Owner, OwnerId};
use crate::model::{require_positive_age, require_text, ValidationError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;

/// Stable identifier for a pet.
pub type PetId = Uuid;

/// Canonical pet record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pet {
    pub uuid: PetId,
    pub name: String,
    pub age: Option<u32>,
    /// Free-text species. Serialized as `type`.
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(rename = "deceased")]
    pub is_deceased: bool,
    pub(crate) owners: BTreeSet<OwnerId>,
}

impl Pet {
    /// Creates an active, unclaimed pet with a generated id.
    pub fn new(name: &str, age: Option<u32>, kind: &str) -> Result<Self, ValidationError> {
        Self::with_id(Uuid::new_v4(), name, age, kind)
    }

    /// Creates an active, unclaimed pet with a caller-provided id.
    pub fn with_id(
        uuid: PetId,
        name: &str,
        age: Option<u32>,
        kind: &str,
    ) -> Result<Self, ValidationError> {
        Ok(Self {
            uuid,
            name: require_text(name, "pet.name")?,
            age: age
                .map(|value| require_positive_age(value, "pet.age"))
                .transpose()?,
            kind: require_text(kind, "pet.type")?,
            is_deceased: false,
            owners: BTreeSet::new(),
        })
    }

    pub(crate) fn restore(
        uuid: PetId,
        name: String,
        age: Option<u32>,
        kind: String,
        is_deceased: bool,
        owners: BTreeSet<OwnerId>,
    ) -> Self {
        Self {
            uuid,
            name,
            age,
            kind,
            is_deceased,
            owners,
        }
    }

    /// Ids of linked owners, deceased owners included.
    pub fn owners(&self) -> &BTreeSet<OwnerId> {
        &self.owners
    }

    pub fn is_owned_by(&self, owner_id: OwnerId) -> bool {
        self.owners.contains(&owner_id)
    }

    pub fn is_unclaimed(&self) -> bool {
        self.owners.is_empty()
    }

    /// Marks this pet as deceased. Links are kept.
    pub fn mark_deceased(&mut self) {
        self.is_deceased = true;
    }

    pub fn is_active(&self) -> bool {
        !self.is_deceased
    }
}

/// Pet loaded together with every linked owner (and their addresses).
///
/// This is the eager read model the rules engine evaluates; `owners` holds
/// one entry per id in `pet.owners()`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PetWithOwners {
    pub pet: Pet,
    pub owners: Vec<Owner>,
}

impl PetWithOwners {
    /// Returns whether any linked owner lives at `owner`'s address.
    pub fn has_owner_in_household_of(&self, owner: &Owner) -> bool {
        self.owners
            .iter()
            .any(|current| current.shares_household_with(owner))
    }
}
