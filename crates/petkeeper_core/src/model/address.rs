//! Address domain model.
//!
//! # Responsibility
//! - Define the canonical, deduplicated address record owners live at.
//! - Define the inbound address description resolved into a record.
//!
//! # Invariants
//! - Two addresses are equal iff their `(city, type, address_name, number)`
//!   tuples are equal; the record id never participates in equality.
//! - Stored tuples are canonical: trimmed, whitespace runs collapsed.

use crate::model::{collapse_whitespace, ValidationError};
use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};
use uuid::Uuid;

/// Stable identifier of a canonical address row.
pub type AddressId = Uuid;

/// Canonical address record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Address {
    /// Row identity. Ignored by equality.
    pub uuid: AddressId,
    pub city: String,
    /// Road/street/avenue style descriptor. Serialized as `type`.
    #[serde(rename = "type")]
    pub kind: String,
    pub address_name: String,
    pub number: String,
}

impl Address {
    /// Creates a new address record with a generated id from a canonical draft.
    pub fn from_draft(draft: AddressDraft) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            city: draft.city,
            kind: draft.kind,
            address_name: draft.address_name,
            number: draft.number,
        }
    }

    /// Returns the structural identity tuple.
    pub fn tuple(&self) -> (&str, &str, &str, &str) {
        (
            self.city.as_str(),
            self.kind.as_str(),
            self.address_name.as_str(),
            self.number.as_str(),
        )
    }

    /// Returns whether `draft` describes this exact place.
    pub fn matches(&self, draft: &AddressDraft) -> bool {
        self.tuple() == draft.tuple()
    }
}

impl PartialEq for Address {
    fn eq(&self, other: &Self) -> bool {
        self.tuple() == other.tuple()
    }
}

impl Eq for Address {}

impl Hash for Address {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.tuple().hash(state);
    }
}

/// Inbound address description handed to the address resolver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressDraft {
    pub city: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub address_name: String,
    pub number: String,
}

impl AddressDraft {
    pub fn new(
        city: impl Into<String>,
        kind: impl Into<String>,
        address_name: impl Into<String>,
        number: impl Into<String>,
    ) -> Self {
        Self {
            city: city.into(),
            kind: kind.into(),
            address_name: address_name.into(),
            number: number.into(),
        }
    }

    /// Canonicalizes every field and rejects blank ones.
    ///
    /// Canonical form is what deduplication compares, so `"Main  St"` and
    /// `" Main St"` resolve to the same record.
    pub fn canonicalize(&self) -> Result<Self, ValidationError> {
        Ok(Self {
            city: canonical_field(&self.city, "address.city")?,
            kind: canonical_field(&self.kind, "address.type")?,
            address_name: canonical_field(&self.address_name, "address.address_name")?,
            number: canonical_field(&self.number, "address.number")?,
        })
    }

    fn tuple(&self) -> (&str, &str, &str, &str) {
        (
            self.city.as_str(),
            self.kind.as_str(),
            self.address_name.as_str(),
            self.number.as_str(),
        )
    }
}

fn canonical_field(value: &str, field: &'static str) -> Result<String, ValidationError> {
    let collapsed = collapse_whitespace(value);
    if collapsed.is_empty() {
        return Err(ValidationError::BlankField(field));
    }
    Ok(collapsed)
}

#[cfg(test)]
mod tests {
    use super::{Address, AddressDraft};
    use crate::model::ValidationError;
    use std::collections::HashSet;

    #[test]
    fn equality_is_structural_and_ignores_record_id() {
        let draft = AddressDraft::new("Paris", "rue", "de la Paix", "12");
        let first = Address::from_draft(draft.clone());
        let second = Address::from_draft(draft);
        assert_ne!(first.uuid, second.uuid);
        assert_eq!(first, second);

        let mut set = HashSet::new();
        set.insert(first);
        set.insert(second);
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn any_differing_tuple_field_breaks_equality() {
        let base = Address::from_draft(AddressDraft::new("Paris", "rue", "de la Paix", "12"));
        let other = Address::from_draft(AddressDraft::new("Paris", "rue", "de la Paix", "14"));
        assert_ne!(base, other);
    }

    #[test]
    fn canonicalize_collapses_whitespace_and_rejects_blank_fields() {
        let draft = AddressDraft::new(" Paris ", "rue", "de   la Paix", "12");
        let canonical = draft.canonicalize().unwrap();
        assert_eq!(canonical.address_name, "de la Paix");
        assert_eq!(canonical.city, "Paris");

        let blank = AddressDraft::new("Paris", "  ", "de la Paix", "12");
        assert_eq!(
            blank.canonicalize().unwrap_err(),
            ValidationError::BlankField("address.type")
        );
    }

    #[test]
    fn serializes_kind_as_type() {
        let address = Address::from_draft(AddressDraft::new("Lyon", "avenue", "Foch", "3"));
        let json = serde_json::to_value(&address).unwrap();
        assert_eq!(json["type"], "avenue");
        assert!(json.get("kind").is_none());
    }
}
