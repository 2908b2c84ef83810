//! Read-only directory use-cases.
//!
//! # Responsibility
//! - Expose owner/pet lookups and filtered listings as views.
//!
//! # Invariants
//! - Nothing here writes.
//! - Deceased owners and pets are not-found / filtered out.
//! - City filters must not be blank.

use crate::model::owner::OwnerId;
use crate::model::pet::{Pet, PetId};
use crate::model::require_text;
use crate::repo::directory_repo::{DirectoryRepository, ListQuery};
use crate::service::view::{OwnerView, PetView};
use crate::service::{EntityRef, ServiceError, ServiceResult};

/// Directory service facade over repository implementations.
pub struct DirectoryService<R: DirectoryRepository> {
    repo: R,
}

impl<R: DirectoryRepository> DirectoryService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Gets one active owner with its full pet set.
    pub fn owner(&self, owner_id: OwnerId) -> ServiceResult<OwnerView> {
        let owner = self
            .repo
            .active_owner(owner_id)?
            .ok_or(ServiceError::NotFound(EntityRef::Owner(owner_id)))?;
        let ids: Vec<PetId> = owner.pets().iter().copied().collect();
        let pets = self.repo.pets(&ids)?;
        Ok(OwnerView::new(&owner, &pets))
    }

    /// Gets one active pet.
    pub fn pet(&self, pet_id: PetId) -> ServiceResult<PetView> {
        self.repo
            .active_pet(pet_id)?
            .map(|pet| PetView::from(&pet))
            .ok_or(ServiceError::NotFound(EntityRef::Pet(pet_id)))
    }

    /// Active pets of an active owner, ordered by name.
    pub fn pets_of_owner(&self, owner_id: OwnerId) -> ServiceResult<Vec<PetView>> {
        if self.repo.active_owner(owner_id)?.is_none() {
            return Err(ServiceError::NotFound(EntityRef::Owner(owner_id)));
        }
        Ok(to_views(self.repo.active_pets_of_owner(owner_id)?))
    }

    /// Active pets with an active owner in `city` (case-sensitive).
    pub fn pets_in_city(&self, city: &str, query: &ListQuery) -> ServiceResult<Vec<PetView>> {
        let city = require_text(city, "city")?;
        Ok(to_views(self.repo.pets_in_city(&city, query)?))
    }

    /// Active pets with an active female owner. `None` means any city;
    /// a given city is compared case-insensitively.
    pub fn pets_of_women_in_city(
        &self,
        city: Option<&str>,
        query: &ListQuery,
    ) -> ServiceResult<Vec<PetView>> {
        let city = city.map(|value| require_text(value, "city")).transpose()?;
        Ok(to_views(
            self.repo.pets_of_women_in_city(city.as_deref(), query)?,
        ))
    }

    /// Active owners in `city` owning an active pet of `pet_type`.
    pub fn owners_by_pet_type_and_city(
        &self,
        pet_type: &str,
        city: &str,
    ) -> ServiceResult<Vec<OwnerView>> {
        let pet_type = require_text(pet_type, "pet.type")?;
        let city = require_text(city, "city")?;

        let owners = self.repo.owners_by_pet_type_and_city(&pet_type, &city)?;
        let mut views = Vec::with_capacity(owners.len());
        for owner in owners {
            let ids: Vec<PetId> = owner.pets().iter().copied().collect();
            let pets = self.repo.pets(&ids)?;
            views.push(OwnerView::new(&owner, &pets));
        }
        Ok(views)
    }
}

fn to_views(pets: Vec<Pet>) -> Vec<PetView> {
    pets.iter().map(PetView::from).collect()
}
