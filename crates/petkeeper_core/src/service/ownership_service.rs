//! Ownership coordinator.
//!
//! # Responsibility
//! - Run load -> decide -> mutate -> persist for link and lifecycle changes.
//! - Create and update owners and pets.
//!
//! # Invariants
//! - Every operation is one unit of work; a failure leaves the store as it
//!   was before the call.
//! - Inbound values are validated before the unit of work starts.
//! - Deceased records are not-found, except for pet removal and deceased
//!   marking, which accept them.
//! - Links change only through `model::link`, both sides at once.

use crate::model::address::AddressDraft;
use crate::model::link::{link, unlink};
use crate::model::owner::{Gender, Identity, Owner, OwnerId};
use crate::model::pet::{Pet, PetId};
use crate::model::{require_positive_age, require_text};
use crate::repo::entity_store::EntityStore;
use crate::repo::unit_of_work::TransactionalStore;
use crate::rules::homonym::resolve_homonyms;
use crate::rules::ownership::{can_assign, can_remove};
use crate::service::view::{OwnerView, PetView};
use crate::service::{EntityRef, ServiceError, ServiceResult};
use log::{info, warn};
use serde::{Deserialize, Serialize};

/// Inbound owner creation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewOwner {
    pub name: String,
    pub first_name: String,
    pub address: AddressDraft,
    pub age: u32,
    /// `MALE|FEMALE|OTHER`, any case.
    pub gender: String,
}

/// Partial owner update. Absent fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnerPatch {
    pub name: Option<String>,
    pub first_name: Option<String>,
    pub address: Option<AddressDraft>,
    pub age: Option<u32>,
    pub gender: Option<String>,
}

/// Inbound pet creation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPet {
    pub name: String,
    pub age: Option<u32>,
    #[serde(rename = "type")]
    pub kind: String,
}

/// Partial pet update. Absent fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PetPatch {
    pub name: Option<String>,
    pub age: Option<u32>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

/// Raised when a new owner shares its identity with active owners.
///
/// Informational only; creation still succeeds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HomonymWarning {
    pub identity: Identity,
    /// Active owners that already carried the identity.
    pub existing_homonyms: usize,
    /// How many of those live at the new owner's address.
    pub same_address_homonyms: usize,
}

/// Result of `create_owner`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreatedOwner {
    pub owner: OwnerView,
    pub homonym_warning: Option<HomonymWarning>,
}

struct ValidatedOwnerPatch {
    name: Option<String>,
    first_name: Option<String>,
    address: Option<AddressDraft>,
    age: Option<u32>,
    gender: Option<Gender>,
}

struct ValidatedPetPatch {
    name: Option<String>,
    age: Option<u32>,
    kind: Option<String>,
}

/// Ownership coordinator over a transactional store.
pub struct OwnershipService<S: TransactionalStore> {
    store: S,
}

impl<S: TransactionalStore> OwnershipService<S> {
    /// Creates a coordinator using the provided store implementation.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Underlying store, for read-only inspection.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Links an active pet to an active owner.
    ///
    /// Returns the refreshed owner view with its full pet set.
    pub fn assign_pet(&mut self, owner_id: OwnerId, pet_id: PetId) -> ServiceResult<OwnerView> {
        let result = self.store.atomically(|store| -> ServiceResult<OwnerView> {
            let mut owner = active_owner(store, owner_id)?;
            let mut loaded = store
                .find_active_pet_with_owners(pet_id)?
                .ok_or(ServiceError::NotFound(EntityRef::Pet(pet_id)))?;

            can_assign(&owner, &loaded).into_result()?;
            link(&mut owner, &mut loaded.pet);
            store.save_owner(&owner)?;
            owner_view(store, &owner)
        });

        log_outcome("pet_assign", owner_id, pet_id, &result);
        result
    }

    /// Removes the link between an active owner and a pet.
    ///
    /// The pet may be deceased. When the owner's identity is shared by other
    /// active owners, the removal must be anchored to the household of one of
    /// the pet's current owners.
    pub fn remove_pet(&mut self, owner_id: OwnerId, pet_id: PetId) -> ServiceResult<OwnerView> {
        let result = self.store.atomically(|store| -> ServiceResult<OwnerView> {
            let mut owner = active_owner(store, owner_id)?;
            let mut loaded = store
                .find_pet_with_owners(pet_id)?
                .ok_or(ServiceError::NotFound(EntityRef::Pet(pet_id)))?;
            let group = resolve_homonyms(store, &owner.identity())?;

            can_remove(&owner, &loaded, &group).into_result()?;
            unlink(&mut owner, &mut loaded.pet);
            store.save_owner(&owner)?;
            owner_view(store, &owner)
        });

        log_outcome("pet_remove", owner_id, pet_id, &result);
        result
    }

    /// Marks a pet deceased. Repeated calls are silent no-ops.
    pub fn mark_pet_deceased(&mut self, pet_id: PetId) -> ServiceResult<PetView> {
        self.store.atomically(|store| -> ServiceResult<PetView> {
            let mut pet = store
                .find_pet(pet_id)?
                .ok_or(ServiceError::NotFound(EntityRef::Pet(pet_id)))?;
            if pet.is_deceased {
                return Ok(PetView::from(&pet));
            }

            pet.mark_deceased();
            store.save_pet(&pet)?;
            info!("event=pet_deceased module=ownership status=ok pet_id={pet_id}");
            Ok(PetView::from(&pet))
        })
    }

    /// Marks an owner deceased. Repeated calls are silent no-ops.
    ///
    /// Pets and links are left untouched.
    pub fn mark_owner_deceased(&mut self, owner_id: OwnerId) -> ServiceResult<OwnerView> {
        self.store.atomically(|store| -> ServiceResult<OwnerView> {
            let mut owner = store
                .find_owner(owner_id)?
                .ok_or(ServiceError::NotFound(EntityRef::Owner(owner_id)))?;
            if owner.is_deceased {
                return owner_view(store, &owner);
            }

            owner.mark_deceased();
            store.save_owner(&owner)?;
            info!(
                "event=owner_deceased module=ownership status=ok owner_id={owner_id} links={}",
                owner.pets().len()
            );
            owner_view(store, &owner)
        })
    }

    /// Creates an owner at a resolved address.
    ///
    /// Sharing an identity with active owners never blocks creation; it is
    /// reported through `CreatedOwner::homonym_warning`.
    pub fn create_owner(&mut self, request: NewOwner) -> ServiceResult<CreatedOwner> {
        let identity = Identity::new(&request.name, &request.first_name)?;
        let draft = request.address.canonicalize()?;
        let age = require_positive_age(request.age, "owner.age")?;
        let gender = Gender::parse(&request.gender)?;

        self.store.atomically(|store| -> ServiceResult<CreatedOwner> {
            let address = store.resolve_or_create_address(&draft)?;
            let group = resolve_homonyms(store, &identity)?;
            let owner = Owner::new(identity.clone(), address, age, gender)?;
            store.save_owner(&owner)?;

            let homonym_warning = if group.is_empty() {
                None
            } else {
                let warning = HomonymWarning {
                    identity: identity.clone(),
                    existing_homonyms: group.len(),
                    same_address_homonyms: group.narrow_to_address(&owner.address).len(),
                };
                warn!(
                    "event=owner_create module=ownership status=homonym owner_id={} existing={} same_address={}",
                    owner.uuid, warning.existing_homonyms, warning.same_address_homonyms
                );
                Some(warning)
            };

            info!(
                "event=owner_create module=ownership status=ok owner_id={}",
                owner.uuid
            );
            Ok(CreatedOwner {
                owner: owner_view(store, &owner)?,
                homonym_warning,
            })
        })
    }

    /// Applies present fields to an active owner.
    ///
    /// A new address only affects links formed afterwards; existing links
    /// are kept as they are.
    pub fn update_owner(&mut self, owner_id: OwnerId, patch: OwnerPatch) -> ServiceResult<OwnerView> {
        let patch = validate_owner_patch(patch)?;

        self.store.atomically(|store| -> ServiceResult<OwnerView> {
            let mut owner = active_owner(store, owner_id)?;
            if let Some(name) = patch.name {
                owner.name = name;
            }
            if let Some(first_name) = patch.first_name {
                owner.first_name = first_name;
            }
            if let Some(age) = patch.age {
                owner.age = age;
            }
            if let Some(gender) = patch.gender {
                owner.gender = gender;
            }
            if let Some(draft) = patch.address {
                owner.address = store.resolve_or_create_address(&draft)?;
            }

            store.save_owner(&owner)?;
            info!("event=owner_update module=ownership status=ok owner_id={owner_id}");
            owner_view(store, &owner)
        })
    }

    /// Creates an active pet with no owners.
    pub fn create_pet(&mut self, request: NewPet) -> ServiceResult<PetView> {
        let pet = Pet::new(&request.name, request.age, &request.kind)?;

        self.store.atomically(|store| -> ServiceResult<PetView> {
            store.save_pet(&pet)?;
            info!(
                "event=pet_create module=ownership status=ok pet_id={}",
                pet.uuid
            );
            Ok(PetView::from(&pet))
        })
    }

    /// Applies present fields to an active pet.
    pub fn update_pet(&mut self, pet_id: PetId, patch: PetPatch) -> ServiceResult<PetView> {
        let patch = validate_pet_patch(patch)?;

        self.store.atomically(|store| -> ServiceResult<PetView> {
            let mut pet = store
                .find_pet(pet_id)?
                .filter(Pet::is_active)
                .ok_or(ServiceError::NotFound(EntityRef::Pet(pet_id)))?;
            if let Some(name) = patch.name {
                pet.name = name;
            }
            if let Some(age) = patch.age {
                pet.age = Some(age);
            }
            if let Some(kind) = patch.kind {
                pet.kind = kind;
            }

            store.save_pet(&pet)?;
            info!("event=pet_update module=ownership status=ok pet_id={pet_id}");
            Ok(PetView::from(&pet))
        })
    }
}

fn active_owner(store: &dyn EntityStore, owner_id: OwnerId) -> ServiceResult<Owner> {
    store
        .find_active_owner(owner_id)?
        .ok_or(ServiceError::NotFound(EntityRef::Owner(owner_id)))
}

fn owner_view(store: &dyn EntityStore, owner: &Owner) -> ServiceResult<OwnerView> {
    let ids: Vec<PetId> = owner.pets().iter().copied().collect();
    let pets = store.find_pets(&ids)?;
    Ok(OwnerView::new(owner, &pets))
}

fn validate_owner_patch(patch: OwnerPatch) -> ServiceResult<ValidatedOwnerPatch> {
    Ok(ValidatedOwnerPatch {
        name: patch
            .name
            .map(|value| require_text(&value, "owner.name"))
            .transpose()?,
        first_name: patch
            .first_name
            .map(|value| require_text(&value, "owner.first_name"))
            .transpose()?,
        address: patch
            .address
            .map(|draft| draft.canonicalize())
            .transpose()?,
        age: patch
            .age
            .map(|value| require_positive_age(value, "owner.age"))
            .transpose()?,
        gender: patch
            .gender
            .map(|value| Gender::parse(&value))
            .transpose()?,
    })
}

fn validate_pet_patch(patch: PetPatch) -> ServiceResult<ValidatedPetPatch> {
    Ok(ValidatedPetPatch {
        name: patch
            .name
            .map(|value| require_text(&value, "pet.name"))
            .transpose()?,
        age: patch
            .age
            .map(|value| require_positive_age(value, "pet.age"))
            .transpose()?,
        kind: patch
            .kind
            .map(|value| require_text(&value, "pet.type"))
            .transpose()?,
    })
}

fn log_outcome<T>(event: &str, owner_id: OwnerId, pet_id: PetId, result: &ServiceResult<T>) {
    match result {
        Ok(_) => info!(
            "event={event} module=ownership status=ok owner_id={owner_id} pet_id={pet_id}"
        ),
        Err(ServiceError::InvalidOperation(reason)) => warn!(
            "event={event} module=ownership status=denied owner_id={owner_id} pet_id={pet_id} reason={}",
            reason.code()
        ),
        Err(err) => warn!(
            "event={event} module=ownership status=error owner_id={owner_id} pet_id={pet_id} error={err}"
        ),
    }
}
