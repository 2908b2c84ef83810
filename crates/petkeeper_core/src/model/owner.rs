//! Owner domain model.
//!
//! # Responsibility
//! - Define the person record that owns pets at one address.
//! - Provide lifecycle helpers for deceased semantics.
//!
//! # Invariants
//! - `(name, first_name)` is a display identity, not a key; homonyms exist.
//! - `is_deceased` only ever moves from `false` to `true`.
//! - `pets` is changed only through `model::link`.

use crate::model::address::Address;
use crate::model::pet::PetId;
use crate::model::{require_positive_age, require_text, ValidationError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;

/// Stable identifier for an owner.
pub type OwnerId = Uuid;

/// Owner gender. Only read-side filters look at it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Gender {
    Male,
    Female,
    Other,
}

impl Gender {
    /// Stable storage/wire spelling.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Male => "MALE",
            Self::Female => "FEMALE",
            Self::Other => "OTHER",
        }
    }

    /// Parses a gender case-insensitively.
    pub fn parse(value: &str) -> Result<Self, ValidationError> {
        match value.trim().to_ascii_uppercase().as_str() {
            "MALE" => Ok(Self::Male),
            "FEMALE" => Ok(Self::Female),
            "OTHER" => Ok(Self::Other),
            _ => Err(ValidationError::UnknownGender(value.to_string())),
        }
    }
}

/// Display identity shared by homonyms.
///
/// Comparison is exact and case-sensitive on both fields.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Identity {
    pub name: String,
    pub first_name: String,
}

impl Identity {
    /// Builds a trimmed identity, rejecting blank parts.
    pub fn new(name: &str, first_name: &str) -> Result<Self, ValidationError> {
        Ok(Self {
            name: require_text(name, "owner.name")?,
            first_name: require_text(first_name, "owner.first_name")?,
        })
    }
}

/// Canonical owner record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Owner {
    pub uuid: OwnerId,
    pub name: String,
    pub first_name: String,
    /// Loaded eagerly with every owner.
    pub address: Address,
    pub age: u32,
    pub gender: Gender,
    #[serde(rename = "deceased")]
    pub is_deceased: bool,
    pub(crate) pets: BTreeSet<PetId>,
}

impl Owner {
    /// Creates an active owner with a generated id and no pets.
    pub fn new(
        identity: Identity,
        address: Address,
        age: u32,
        gender: Gender,
    ) -> Result<Self, ValidationError> {
        Self::with_id(Uuid::new_v4(), identity, address, age, gender)
    }

    /// Creates an active owner with a caller-provided id and no pets.
    pub fn with_id(
        uuid: OwnerId,
        identity: Identity,
        address: Address,
        age: u32,
        gender: Gender,
    ) -> Result<Self, ValidationError> {
        Ok(Self {
            uuid,
            name: identity.name,
            first_name: identity.first_name,
            address,
            age: require_positive_age(age, "owner.age")?,
            gender,
            is_deceased: false,
            pets: BTreeSet::new(),
        })
    }

    /// Rebuilds a persisted owner, including its link set.
    pub(crate) fn restore(
        uuid: OwnerId,
        identity: Identity,
        address: Address,
        age: u32,
        gender: Gender,
        is_deceased: bool,
        pets: BTreeSet<PetId>,
    ) -> Self {
        Self {
            uuid,
            name: identity.name,
            first_name: identity.first_name,
            address,
            age,
            gender,
            is_deceased,
            pets,
        }
    }

    pub fn identity(&self) -> Identity {
        Identity {
            name: self.name.clone(),
            first_name: self.first_name.clone(),
        }
    }

    /// Returns whether this owner carries exactly `identity`.
    pub fn has_identity(&self, identity: &Identity) -> bool {
        self.name == identity.name && self.first_name == identity.first_name
    }

    /// Ids of linked pets, deceased pets included.
    pub fn pets(&self) -> &BTreeSet<PetId> {
        &self.pets
    }

    pub fn owns(&self, pet_id: PetId) -> bool {
        self.pets.contains(&pet_id)
    }

    /// Returns whether both owners live at structurally equal addresses.
    pub fn shares_household_with(&self, other: &Owner) -> bool {
        self.address == other.address
    }

    /// Marks this owner as deceased. Links are kept.
    pub fn mark_deceased(&mut self) {
        self.is_deceased = true;
    }

    pub fn is_active(&self) -> bool {
        !self.is_deceased
    }
}
