use petkeeper_core::db::open_db_in_memory;
use petkeeper_core::model::address::AddressDraft;
use petkeeper_core::model::owner::Gender;
use petkeeper_core::model::ValidationError;
use petkeeper_core::repo::unit_of_work::{SqliteStore, TransactionalStore};
use petkeeper_core::service::ownership_service::{
    NewOwner, NewPet, OwnerPatch, OwnershipService, PetPatch,
};
use petkeeper_core::service::{EntityRef, Reason, ServiceError};
use rusqlite::Connection;

fn new_owner(first_name: &str, number: &str) -> NewOwner {
    NewOwner {
        name: "Martin".to_string(),
        first_name: first_name.to_string(),
        address: AddressDraft::new("Lyon", "rue", "Mercière", number),
        age: 33,
        gender: "Female".to_string(),
    }
}

fn new_pet(name: &str) -> NewPet {
    NewPet {
        name: name.to_string(),
        age: None,
        kind: "cat".to_string(),
    }
}

fn count(conn: &Connection, table: &str) -> i64 {
    conn.query_row(&format!("SELECT COUNT(*) FROM {table};"), [], |row| {
        row.get(0)
    })
    .unwrap()
}

fn validation_of(err: ServiceError) -> ValidationError {
    match err {
        ServiceError::InvalidOperation(Reason::Validation(inner)) => inner,
        other => panic!("expected validation failure, got {other:?}"),
    }
}

#[test]
fn create_owner_parses_gender_and_canonicalizes_address() {
    let mut conn = open_db_in_memory().unwrap();
    let mut service = OwnershipService::new(SqliteStore::new(&mut conn));

    let mut request = new_owner("Claire", "5");
    request.address = AddressDraft::new(" Lyon ", "rue", "Mercière", " 5");
    let created = service.create_owner(request).unwrap();

    assert_eq!(created.owner.gender, Gender::Female);
    assert_eq!(created.owner.address.city, "Lyon");
    assert_eq!(created.owner.address.number, "5");
    assert!(!created.owner.deceased);
}

#[test]
fn invalid_requests_fail_before_any_write() {
    let mut conn = open_db_in_memory().unwrap();
    {
        let mut service = OwnershipService::new(SqliteStore::new(&mut conn));

        assert_eq!(
            validation_of(service.create_owner(new_owner("  ", "5")).unwrap_err()),
            ValidationError::BlankField("owner.first_name")
        );

        let mut zero_age = new_owner("Claire", "5");
        zero_age.age = 0;
        assert_eq!(
            validation_of(service.create_owner(zero_age).unwrap_err()),
            ValidationError::NonPositiveAge("owner.age")
        );

        let mut unknown_gender = new_owner("Claire", "5");
        unknown_gender.gender = "dragon".to_string();
        assert_eq!(
            validation_of(service.create_owner(unknown_gender).unwrap_err()),
            ValidationError::UnknownGender("dragon".to_string())
        );

        let mut blank_street = new_owner("Claire", "5");
        blank_street.address.address_name = "   ".to_string();
        assert_eq!(
            validation_of(service.create_owner(blank_street).unwrap_err()),
            ValidationError::BlankField("address.address_name")
        );

        let mut pet = new_pet("Felix");
        pet.age = Some(0);
        assert_eq!(
            validation_of(service.create_pet(pet).unwrap_err()),
            ValidationError::NonPositiveAge("pet.age")
        );
    }

    assert_eq!(count(&conn, "owners"), 0);
    assert_eq!(count(&conn, "addresses"), 0);
    assert_eq!(count(&conn, "pets"), 0);
}

#[test]
fn mark_owner_deceased_keeps_pets_and_links() {
    let mut conn = open_db_in_memory().unwrap();
    let mut service = OwnershipService::new(SqliteStore::new(&mut conn));
    let owner = service.create_owner(new_owner("Claire", "5")).unwrap().owner.id;
    let pet = service.create_pet(new_pet("Felix")).unwrap().id;
    service.assign_pet(owner, pet).unwrap();

    let view = service.mark_owner_deceased(owner).unwrap();
    assert!(view.deceased);
    assert_eq!(view.pet_ids(), vec![pet]);

    let again = service.mark_owner_deceased(owner).unwrap();
    assert_eq!(view, again);

    let stored = service
        .store()
        .read(|store| store.find_pet(pet))
        .unwrap()
        .expect("pet should exist");
    assert!(stored.is_active());
    assert!(stored.is_owned_by(owner));

    let err = service
        .update_owner(owner, OwnerPatch::default())
        .unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(EntityRef::Owner(_))));
}

#[test]
fn moving_an_owner_keeps_existing_links() {
    let mut conn = open_db_in_memory().unwrap();
    let mut service = OwnershipService::new(SqliteStore::new(&mut conn));
    let claire = service.create_owner(new_owner("Claire", "5")).unwrap().owner.id;
    let paul = service.create_owner(new_owner("Paul", "5")).unwrap().owner.id;
    let newcomer = service.create_owner(new_owner("Anne", "5")).unwrap().owner.id;
    let pet = service.create_pet(new_pet("Felix")).unwrap().id;
    service.assign_pet(claire, pet).unwrap();
    service.assign_pet(paul, pet).unwrap();

    let moved = service
        .update_owner(
            paul,
            OwnerPatch {
                address: Some(AddressDraft::new("Lyon", "rue", "Mercière", "9")),
                age: Some(34),
                ..OwnerPatch::default()
            },
        )
        .unwrap();
    assert_eq!(moved.address.number, "9");
    assert_eq!(moved.age, 34);
    assert_eq!(moved.pet_ids(), vec![pet]);

    // Claire still anchors the household at number 5.
    service.assign_pet(newcomer, pet).unwrap();
}

#[test]
fn update_owner_rejects_invalid_fields() {
    let mut conn = open_db_in_memory().unwrap();
    let mut service = OwnershipService::new(SqliteStore::new(&mut conn));
    let owner = service.create_owner(new_owner("Claire", "5")).unwrap().owner.id;

    let err = service
        .update_owner(
            owner,
            OwnerPatch {
                name: Some(String::new()),
                ..OwnerPatch::default()
            },
        )
        .unwrap_err();
    assert_eq!(validation_of(err), ValidationError::BlankField("owner.name"));

    let renamed = service
        .update_owner(
            owner,
            OwnerPatch {
                first_name: Some(" Clara ".to_string()),
                gender: Some("other".to_string()),
                ..OwnerPatch::default()
            },
        )
        .unwrap();
    assert_eq!(renamed.first_name, "Clara");
    assert_eq!(renamed.gender, Gender::Other);
}

#[test]
fn pets_are_created_and_updated() {
    let mut conn = open_db_in_memory().unwrap();
    let mut service = OwnershipService::new(SqliteStore::new(&mut conn));

    let pet = service.create_pet(new_pet("Felix")).unwrap();
    assert!(pet.owner_ids.is_empty());
    assert_eq!(pet.age, None);

    let updated = service
        .update_pet(
            pet.id,
            PetPatch {
                age: Some(7),
                kind: Some("Maine Coon".to_string()),
                ..PetPatch::default()
            },
        )
        .unwrap();
    assert_eq!(updated.name, "Felix");
    assert_eq!(updated.age, Some(7));
    assert_eq!(updated.kind, "Maine Coon");

    service.mark_pet_deceased(pet.id).unwrap();
    let err = service
        .update_pet(pet.id, PetPatch::default())
        .unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(EntityRef::Pet(_))));
}
