//! Serializable projections returned by services.
//!
//! Views are detached snapshots: they carry ids instead of object graphs so
//! an outer layer can serialize them without cycles.

use crate::model::address::{Address, AddressId};
use crate::model::owner::{Gender, Owner, OwnerId};
use crate::model::pet::{Pet, PetId};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AddressView {
    pub id: AddressId,
    pub city: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub address_name: String,
    pub number: String,
}

impl From<&Address> for AddressView {
    fn from(value: &Address) -> Self {
        Self {
            id: value.uuid,
            city: value.city.clone(),
            kind: value.kind.clone(),
            address_name: value.address_name.clone(),
            number: value.number.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PetView {
    pub id: PetId,
    pub name: String,
    pub age: Option<u32>,
    #[serde(rename = "type")]
    pub kind: String,
    pub deceased: bool,
    /// Linked owner ids in ascending order, deceased owners included.
    pub owner_ids: Vec<OwnerId>,
}

impl From<&Pet> for PetView {
    fn from(value: &Pet) -> Self {
        Self {
            id: value.uuid,
            name: value.name.clone(),
            age: value.age,
            kind: value.kind.clone(),
            deceased: value.is_deceased,
            owner_ids: value.owners().iter().copied().collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OwnerView {
    pub id: OwnerId,
    pub name: String,
    pub first_name: String,
    pub address: AddressView,
    pub age: u32,
    pub gender: Gender,
    pub deceased: bool,
    /// Every linked pet, ordered `name ASC, id ASC`.
    pub pets: Vec<PetView>,
}

impl OwnerView {
    /// Builds a view from `owner` and its loaded pets.
    ///
    /// Pets not linked to `owner` are ignored.
    pub fn new(owner: &Owner, pets: &[Pet]) -> Self {
        let mut pets: Vec<PetView> = pets
            .iter()
            .filter(|pet| owner.owns(pet.uuid))
            .map(PetView::from)
            .collect();
        pets.sort_by(|left, right| left.name.cmp(&right.name).then(left.id.cmp(&right.id)));

        Self {
            id: owner.uuid,
            name: owner.name.clone(),
            first_name: owner.first_name.clone(),
            address: AddressView::from(&owner.address),
            age: owner.age,
            gender: owner.gender,
            deceased: owner.is_deceased,
            pets,
        }
    }

    pub fn pet_ids(&self) -> Vec<PetId> {
        self.pets.iter().map(|pet| pet.id).collect()
    }
}
