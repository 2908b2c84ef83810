use petkeeper_core::db::open_db_in_memory;
use petkeeper_core::model::address::AddressDraft;
use petkeeper_core::repo::entity_store::EntityStore;
use petkeeper_core::repo::unit_of_work::{SqliteStore, TransactionalStore};
use petkeeper_core::repo::RepoError;
use petkeeper_core::rules::ownership::Denial;
use petkeeper_core::service::ownership_service::{NewOwner, NewPet, OwnershipService};
use petkeeper_core::service::{EntityRef, Reason, ServiceError};
use petkeeper_core::{OwnerId, Pet, PetId};

type Service<'conn> = OwnershipService<SqliteStore<'conn>>;

fn address(number: &str) -> AddressDraft {
    AddressDraft::new("Springfield", "Avenue", "Evergreen Terrace", number)
}

fn create_owner(service: &mut Service<'_>, first_name: &str, number: &str) -> OwnerId {
    service
        .create_owner(NewOwner {
            name: "Doe".to_string(),
            first_name: first_name.to_string(),
            address: address(number),
            age: 40,
            gender: "FEMALE".to_string(),
        })
        .unwrap()
        .owner
        .id
}

fn create_pet(service: &mut Service<'_>, name: &str) -> PetId {
    service
        .create_pet(NewPet {
            name: name.to_string(),
            age: Some(3),
            kind: "dog".to_string(),
        })
        .unwrap()
        .id
}

fn stored_pet(service: &Service<'_>, pet_id: PetId) -> Pet {
    service
        .store()
        .read(|store| store.find_pet(pet_id))
        .unwrap()
        .expect("pet should exist")
}

fn assert_denied(err: ServiceError, expected: Denial) {
    match err {
        ServiceError::InvalidOperation(Reason::Denied(denial)) => assert_eq!(denial, expected),
        other => panic!("expected {expected:?}, got {other:?}"),
    }
}

#[test]
fn first_owner_assignment_succeeds() {
    let mut conn = open_db_in_memory().unwrap();
    let mut service = OwnershipService::new(SqliteStore::new(&mut conn));
    let owner = create_owner(&mut service, "Jane", "742");
    let pet = create_pet(&mut service, "Rex");

    let view = service.assign_pet(owner, pet).unwrap();
    assert_eq!(view.pet_ids(), vec![pet]);
    assert_eq!(stored_pet(&service, pet).owners().iter().copied().collect::<Vec<_>>(), vec![owner]);
}

#[test]
fn assigning_twice_is_already_assigned() {
    let mut conn = open_db_in_memory().unwrap();
    let mut service = OwnershipService::new(SqliteStore::new(&mut conn));
    let owner = create_owner(&mut service, "Jane", "742");
    let pet = create_pet(&mut service, "Rex");

    service.assign_pet(owner, pet).unwrap();
    let err = service.assign_pet(owner, pet).unwrap_err();
    assert_denied(err, Denial::AlreadyAssigned);
    assert_eq!(stored_pet(&service, pet).owners().len(), 1);
}

#[test]
fn household_members_share_a_pet_and_strangers_are_refused() {
    let mut conn = open_db_in_memory().unwrap();
    let mut service = OwnershipService::new(SqliteStore::new(&mut conn));
    let first = create_owner(&mut service, "Jane", "742");
    let partner = create_owner(&mut service, "John", "742");
    let stranger = create_owner(&mut service, "Jim", "744");
    let pet = create_pet(&mut service, "Rex");

    service.assign_pet(first, pet).unwrap();
    service.assign_pet(partner, pet).unwrap();

    let err = service.assign_pet(stranger, pet).unwrap_err();
    assert_eq!(err.reason_code(), Some("address-mismatch"));

    let owners: Vec<_> = service
        .store()
        .read(|store| -> Result<_, RepoError> {
            let loaded = store.find_pet_with_owners(pet)?.expect("pet should exist");
            Ok(loaded.owners)
        })
        .unwrap();
    assert_eq!(owners.len(), 2);
    assert!(owners.iter().all(|owner| owner.address == owners[0].address));
    assert!(!owners.iter().any(|owner| owner.uuid == stranger));
}

#[test]
fn links_stay_symmetric_across_assign_and_remove() {
    let mut conn = open_db_in_memory().unwrap();
    let mut service = OwnershipService::new(SqliteStore::new(&mut conn));
    let jane = create_owner(&mut service, "Jane", "742");
    let john = create_owner(&mut service, "John", "742");
    let rex = create_pet(&mut service, "Rex");
    let tom = create_pet(&mut service, "Tom");

    service.assign_pet(jane, rex).unwrap();
    service.assign_pet(john, rex).unwrap();
    service.assign_pet(jane, tom).unwrap();
    service.remove_pet(jane, rex).unwrap();

    service
        .store()
        .read(|store| -> Result<(), RepoError> {
            for owner_id in [jane, john] {
                let owner = store.find_owner(owner_id)?.expect("owner should exist");
                for pet_id in [rex, tom] {
                    let pet = store.find_pet(pet_id)?.expect("pet should exist");
                    assert_eq!(owner.owns(pet_id), pet.is_owned_by(owner_id));
                }
            }
            Ok(())
        })
        .unwrap();

    assert!(!stored_pet(&service, rex).is_owned_by(jane));
    assert!(stored_pet(&service, rex).is_owned_by(john));
}

#[test]
fn removing_an_absent_link_is_not_assigned() {
    let mut conn = open_db_in_memory().unwrap();
    let mut service = OwnershipService::new(SqliteStore::new(&mut conn));
    let owner = create_owner(&mut service, "Jane", "742");
    let pet = create_pet(&mut service, "Rex");

    let err = service.remove_pet(owner, pet).unwrap_err();
    assert_denied(err, Denial::NotAssigned);
}

#[test]
fn homonym_removal_is_anchored_to_the_pet_household() {
    let mut conn = open_db_in_memory().unwrap();
    let mut service = OwnershipService::new(SqliteStore::new(&mut conn));
    let jane_a = create_owner(&mut service, "Jane", "1");
    let jane_b = create_owner(&mut service, "Jane", "2");
    let pet = create_pet(&mut service, "Rex");
    service.assign_pet(jane_b, pet).unwrap();

    let err = service.remove_pet(jane_a, pet).unwrap_err();
    assert_denied(err, Denial::AddressMismatch);
    assert!(stored_pet(&service, pet).is_owned_by(jane_b));

    let view = service.remove_pet(jane_b, pet).unwrap();
    assert!(view.pets.is_empty());
    assert!(stored_pet(&service, pet).is_unclaimed());
}

#[test]
fn mark_pet_deceased_is_idempotent() {
    let mut conn = open_db_in_memory().unwrap();
    let mut service = OwnershipService::new(SqliteStore::new(&mut conn));
    let pet = create_pet(&mut service, "Rex");

    let first = service.mark_pet_deceased(pet).unwrap();
    let second = service.mark_pet_deceased(pet).unwrap();
    assert!(first.deceased);
    assert_eq!(first, second);
}

#[test]
fn deceased_pet_can_still_be_removed_but_not_assigned() {
    let mut conn = open_db_in_memory().unwrap();
    let mut service = OwnershipService::new(SqliteStore::new(&mut conn));
    let owner = create_owner(&mut service, "Jane", "742");
    let partner = create_owner(&mut service, "John", "742");
    let pet = create_pet(&mut service, "Rex");
    service.assign_pet(owner, pet).unwrap();
    service.mark_pet_deceased(pet).unwrap();

    let err = service.assign_pet(partner, pet).unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(EntityRef::Pet(id)) if id == pet));

    let view = service.remove_pet(owner, pet).unwrap();
    assert!(view.pets.is_empty());
    let stored = stored_pet(&service, pet);
    assert!(stored.is_deceased);
    assert!(stored.is_unclaimed());
}

#[test]
fn unknown_and_deceased_owners_are_not_found() {
    let mut conn = open_db_in_memory().unwrap();
    let mut service = OwnershipService::new(SqliteStore::new(&mut conn));
    let owner = create_owner(&mut service, "Jane", "742");
    let pet = create_pet(&mut service, "Rex");
    let unknown = uuid::Uuid::new_v4();

    let err = service.assign_pet(unknown, pet).unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(EntityRef::Owner(id)) if id == unknown));

    let err = service.remove_pet(owner, unknown).unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(EntityRef::Pet(id)) if id == unknown));

    service.mark_owner_deceased(owner).unwrap();
    let err = service.assign_pet(owner, pet).unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(EntityRef::Owner(_))));

    let err = service.mark_pet_deceased(unknown).unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(EntityRef::Pet(_))));
}
