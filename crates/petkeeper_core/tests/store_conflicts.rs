use petkeeper_core::db::open_db_in_memory;
use petkeeper_core::model::address::AddressDraft;
use petkeeper_core::model::link::link;
use petkeeper_core::model::owner::{Gender, Identity, Owner};
use petkeeper_core::model::pet::Pet;
use petkeeper_core::repo::entity_store::{EntityStore, SqliteEntityStore};
use petkeeper_core::repo::unit_of_work::{SqliteStore, TransactionalStore};
use petkeeper_core::repo::RepoError;
use rusqlite::Connection;

fn persisted_owner(store: &dyn EntityStore, first_name: &str, number: &str) -> Owner {
    let address = store
        .resolve_or_create_address(&AddressDraft::new("Rennes", "rue", "Saint-Malo", number))
        .unwrap();
    let owner = Owner::new(
        Identity::new("Durand", first_name).unwrap(),
        address,
        45,
        Gender::Male,
    )
    .unwrap();
    store.save_owner(&owner).unwrap();
    owner
}

fn persisted_pet(store: &dyn EntityStore) -> Pet {
    let pet = Pet::new("Médor", Some(9), "dog").unwrap();
    store.save_pet(&pet).unwrap();
    pet
}

fn link_count(conn: &Connection) -> i64 {
    conn.query_row("SELECT COUNT(*) FROM owner_pets;", [], |row| row.get(0))
        .unwrap()
}

#[test]
fn cross_household_link_is_rejected_at_commit() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteEntityStore::new(&conn);
    let mut home = persisted_owner(&store, "Luc", "1");
    let mut elsewhere = persisted_owner(&store, "Marc", "2");
    let mut pet = persisted_pet(&store);

    link(&mut home, &mut pet);
    store.save_owner(&home).unwrap();

    // Bypasses the rules engine to exercise the storage guard.
    link(&mut elsewhere, &mut pet);
    let err = store.save_owner(&elsewhere).unwrap_err();
    match err {
        RepoError::Conflict(message) => assert!(message.contains("address-mismatch")),
        other => panic!("expected conflict, got {other:?}"),
    }
    assert_eq!(link_count(&conn), 1);
}

#[test]
fn duplicate_link_row_is_a_conflict() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteEntityStore::new(&conn);
    let mut owner = persisted_owner(&store, "Luc", "1");
    let mut pet = persisted_pet(&store);
    link(&mut owner, &mut pet);
    store.save_owner(&owner).unwrap();

    let err = conn
        .execute(
            "INSERT INTO owner_pets (owner_uuid, pet_uuid) VALUES (?1, ?2);",
            [owner.uuid.to_string(), pet.uuid.to_string()],
        )
        .map_err(RepoError::from)
        .unwrap_err();
    assert!(matches!(err, RepoError::Conflict(_)));
}

#[test]
fn deceased_flag_cannot_be_reset() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteEntityStore::new(&conn);
    let mut pet = persisted_pet(&store);
    pet.mark_deceased();
    store.save_pet(&pet).unwrap();

    pet.is_deceased = false;
    assert!(matches!(
        store.save_pet(&pet),
        Err(RepoError::Conflict(_))
    ));

    let mut owner = persisted_owner(&store, "Luc", "1");
    owner.mark_deceased();
    store.save_owner(&owner).unwrap();
    owner.is_deceased = false;
    assert!(matches!(
        store.save_owner(&owner),
        Err(RepoError::Conflict(_))
    ));
}

#[test]
fn failed_unit_of_work_rolls_back_every_write() {
    let mut conn = open_db_in_memory().unwrap();
    let pet_id = {
        let store = SqliteEntityStore::new(&conn);
        let mut owner = persisted_owner(&store, "Luc", "1");
        let mut pet = persisted_pet(&store);
        link(&mut owner, &mut pet);
        store.save_owner(&owner).unwrap();
        pet.uuid
    };

    let mut uow = SqliteStore::new(&mut conn);
    let result = uow.atomically(|store| -> Result<(), RepoError> {
        let mut newcomer = persisted_owner(store, "Marc", "2");
        let mut loaded = store.find_pet_with_owners(pet_id)?.expect("pet should exist");
        link(&mut newcomer, &mut loaded.pet);
        store.save_owner(&newcomer)
    });
    assert!(matches!(result, Err(RepoError::Conflict(_))));

    let owners: i64 = uow
        .connection()
        .query_row(
            "SELECT COUNT(*) FROM owners WHERE first_name = 'Marc';",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(owners, 0);
    assert_eq!(link_count(uow.connection()), 1);
}

#[test]
fn successful_unit_of_work_commits() {
    let mut conn = open_db_in_memory().unwrap();
    let mut uow = SqliteStore::new(&mut conn);

    let owner = uow
        .atomically(|store| -> Result<Owner, RepoError> { Ok(persisted_owner(store, "Luc", "1")) })
        .unwrap();
    let loaded = uow
        .read(|store| store.find_active_owner(owner.uuid))
        .unwrap()
        .expect("committed owner should be visible");
    assert_eq!(loaded.address, owner.address);
    assert!(loaded.pets().is_empty());
}
