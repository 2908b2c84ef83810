//! Entity store contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide the id- and predicate-based lookups the coordinator consumes.
//! - Persist owner aggregates (row + link set) and pet rows.
//!
//! # Invariants
//! - `find_active_*` never return deceased records; the other lookups are
//!   deceased-inclusive.
//! - Owners are always loaded with their address and pet id set.
//! - `*_with_owners` lookups load every linked owner eagerly, deceased owners
//!   included.
//! - `save_owner` only inserts links that are new, so commit-time link
//!   guards fire for new links and never for existing ones.

use crate::model::address::{Address, AddressDraft};
use crate::model::owner::{Gender, Identity, Owner, OwnerId};
use crate::model::pet::{Pet, PetId, PetWithOwners};
use crate::repo::address_repo;
use crate::repo::{bool_to_int, parse_flag, parse_uuid, RepoError, RepoResult};
use log::debug;
use rusqlite::{params, Connection, Row};
use std::collections::BTreeSet;

const OWNER_SELECT_SQL: &str = "SELECT
    o.uuid,
    o.name,
    o.first_name,
    o.age,
    o.gender,
    o.is_deceased,
    a.uuid AS address_uuid,
    a.city AS address_city,
    a.type AS address_type,
    a.address_name AS address_name,
    a.number AS address_number
FROM owners o
INNER JOIN addresses a ON a.uuid = o.address_uuid";

const PET_SELECT_SQL: &str = "SELECT
    uuid,
    name,
    age,
    type,
    is_deceased
FROM pets";

/// Store interface consumed by the ownership coordinator.
pub trait EntityStore {
    /// Loads an active owner with address and pet ids.
    fn find_active_owner(&self, id: OwnerId) -> RepoResult<Option<Owner>>;
    /// Loads an owner regardless of deceased state.
    fn find_owner(&self, id: OwnerId) -> RepoResult<Option<Owner>>;
    /// Lists active owners carrying exactly `identity` (case-sensitive).
    fn find_active_owners_by_identity(&self, identity: &Identity) -> RepoResult<Vec<Owner>>;
    /// Loads an active pet with all linked owners.
    fn find_active_pet_with_owners(&self, id: PetId) -> RepoResult<Option<PetWithOwners>>;
    /// Loads a pet with all linked owners regardless of deceased state.
    fn find_pet_with_owners(&self, id: PetId) -> RepoResult<Option<PetWithOwners>>;
    /// Loads a pet with owner ids regardless of deceased state.
    fn find_pet(&self, id: PetId) -> RepoResult<Option<Pet>>;
    /// Loads every existing pet among `ids`, skipping unknown ids.
    fn find_pets(&self, ids: &[PetId]) -> RepoResult<Vec<Pet>>;
    /// Returns the canonical address for `draft`, creating it when absent.
    fn resolve_or_create_address(&self, draft: &AddressDraft) -> RepoResult<Address>;
    /// Upserts the owner row and reconciles its link set.
    fn save_owner(&self, owner: &Owner) -> RepoResult<()>;
    /// Upserts the pet row. Links are owned by the owner side.
    fn save_pet(&self, pet: &Pet) -> RepoResult<()>;
}

/// SQLite-backed entity store.
///
/// Writes are not wrapped in their own transaction; run them through
/// `unit_of_work::TransactionalStore` to get all-or-nothing semantics.
pub struct SqliteEntityStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteEntityStore<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl EntityStore for SqliteEntityStore<'_> {
    fn find_active_owner(&self, id: OwnerId) -> RepoResult<Option<Owner>> {
        load_owner(self.conn, id, true)
    }

    fn find_owner(&self, id: OwnerId) -> RepoResult<Option<Owner>> {
        load_owner(self.conn, id, false)
    }

    fn find_active_owners_by_identity(&self, identity: &Identity) -> RepoResult<Vec<Owner>> {
        let mut stmt = self.conn.prepare(&format!(
            "{OWNER_SELECT_SQL}
             WHERE o.name = ?1
               AND o.first_name = ?2
               AND o.is_deceased = 0
             ORDER BY o.uuid ASC;"
        ))?;
        let mut rows = stmt.query(params![
            identity.name.as_str(),
            identity.first_name.as_str()
        ])?;

        let mut owners = Vec::new();
        while let Some(row) = rows.next()? {
            owners.push(parse_owner_row(self.conn, row)?);
        }
        Ok(owners)
    }

    fn find_active_pet_with_owners(&self, id: PetId) -> RepoResult<Option<PetWithOwners>> {
        match load_pet(self.conn, id, true)? {
            Some(pet) => Ok(Some(with_owners(self.conn, pet)?)),
            None => Ok(None),
        }
    }

    fn find_pet_with_owners(&self, id: PetId) -> RepoResult<Option<PetWithOwners>> {
        match load_pet(self.conn, id, false)? {
            Some(pet) => Ok(Some(with_owners(self.conn, pet)?)),
            None => Ok(None),
        }
    }

    fn find_pet(&self, id: PetId) -> RepoResult<Option<Pet>> {
        load_pet(self.conn, id, false)
    }

    fn find_pets(&self, ids: &[PetId]) -> RepoResult<Vec<Pet>> {
        load_pets(self.conn, ids)
    }

    fn resolve_or_create_address(&self, draft: &AddressDraft) -> RepoResult<Address> {
        address_repo::resolve_or_create_address(self.conn, draft)
    }

    fn save_owner(&self, owner: &Owner) -> RepoResult<()> {
        self.conn.execute(
            "INSERT INTO owners (
                uuid,
                name,
                first_name,
                address_uuid,
                age,
                gender,
                is_deceased
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            ON CONFLICT (uuid) DO UPDATE SET
                name = excluded.name,
                first_name = excluded.first_name,
                address_uuid = excluded.address_uuid,
                age = excluded.age,
                gender = excluded.gender,
                is_deceased = excluded.is_deceased,
                updated_at = (strftime('%s', 'now') * 1000);",
            params![
                owner.uuid.to_string(),
                owner.name.as_str(),
                owner.first_name.as_str(),
                owner.address.uuid.to_string(),
                owner.age,
                owner.gender.as_str(),
                bool_to_int(owner.is_deceased),
            ],
        )?;

        let persisted = load_owner_pet_ids(self.conn, owner.uuid)?;
        let owner_id = owner.uuid.to_string();

        for stale in persisted.difference(owner.pets()) {
            self.conn.execute(
                "DELETE FROM owner_pets WHERE owner_uuid = ?1 AND pet_uuid = ?2;",
                params![owner_id.as_str(), stale.to_string()],
            )?;
        }

        for added in owner.pets().difference(&persisted) {
            self.conn.execute(
                "INSERT INTO owner_pets (owner_uuid, pet_uuid) VALUES (?1, ?2);",
                params![owner_id.as_str(), added.to_string()],
            )?;
        }

        debug!(
            "event=owner_save module=repo status=ok owner_id={} links={}",
            owner.uuid,
            owner.pets().len()
        );
        Ok(())
    }

    fn save_pet(&self, pet: &Pet) -> RepoResult<()> {
        self.conn.execute(
            "INSERT INTO pets (uuid, name, age, type, is_deceased)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT (uuid) DO UPDATE SET
                name = excluded.name,
                age = excluded.age,
                type = excluded.type,
                is_deceased = excluded.is_deceased,
                updated_at = (strftime('%s', 'now') * 1000);",
            params![
                pet.uuid.to_string(),
                pet.name.as_str(),
                pet.age,
                pet.kind.as_str(),
                bool_to_int(pet.is_deceased),
            ],
        )?;
        Ok(())
    }
}

pub(crate) fn load_owner(
    conn: &Connection,
    id: OwnerId,
    active_only: bool,
) -> RepoResult<Option<Owner>> {
    let mut stmt = conn.prepare(&format!(
        "{OWNER_SELECT_SQL}
         WHERE o.uuid = ?1
           AND (?2 = 0 OR o.is_deceased = 0);"
    ))?;
    let mut rows = stmt.query(params![id.to_string(), bool_to_int(active_only)])?;
    if let Some(row) = rows.next()? {
        return Ok(Some(parse_owner_row(conn, row)?));
    }
    Ok(None)
}

pub(crate) fn load_pet(conn: &Connection, id: PetId, active_only: bool) -> RepoResult<Option<Pet>> {
    let mut stmt = conn.prepare(&format!(
        "{PET_SELECT_SQL}
         WHERE uuid = ?1
           AND (?2 = 0 OR is_deceased = 0);"
    ))?;
    let mut rows = stmt.query(params![id.to_string(), bool_to_int(active_only)])?;
    if let Some(row) = rows.next()? {
        return Ok(Some(parse_pet_row(conn, row)?));
    }
    Ok(None)
}

pub(crate) fn load_pets(conn: &Connection, ids: &[PetId]) -> RepoResult<Vec<Pet>> {
    let mut pets = Vec::with_capacity(ids.len());
    for id in ids {
        if let Some(pet) = load_pet(conn, *id, false)? {
            pets.push(pet);
        }
    }
    Ok(pets)
}

fn with_owners(conn: &Connection, pet: Pet) -> RepoResult<PetWithOwners> {
    let mut owners = Vec::with_capacity(pet.owners().len());
    for owner_id in pet.owners() {
        let owner = load_owner(conn, *owner_id, false)?.ok_or_else(|| {
            RepoError::InvalidData(format!(
                "owner_pets references missing owner `{owner_id}` for pet `{}`",
                pet.uuid
            ))
        })?;
        owners.push(owner);
    }
    Ok(PetWithOwners { pet, owners })
}

fn parse_owner_row(conn: &Connection, row: &Row<'_>) -> RepoResult<Owner> {
    let uuid_text: String = row.get("uuid")?;
    let uuid = parse_uuid(&uuid_text, "owners.uuid")?;

    let gender_text: String = row.get("gender")?;
    let gender = Gender::parse(&gender_text).map_err(|_| {
        RepoError::InvalidData(format!("invalid gender `{gender_text}` in owners.gender"))
    })?;

    let age: u32 = row.get("age")?;
    if age == 0 {
        return Err(RepoError::InvalidData(format!(
            "non-positive age in owners.age for `{uuid_text}`"
        )));
    }

    let address_uuid: String = row.get("address_uuid")?;
    let address = Address {
        uuid: parse_uuid(&address_uuid, "addresses.uuid")?,
        city: row.get("address_city")?,
        kind: row.get("address_type")?,
        address_name: row.get("address_name")?,
        number: row.get("address_number")?,
    };

    let identity = Identity {
        name: row.get("name")?,
        first_name: row.get("first_name")?,
    };

    Ok(Owner::restore(
        uuid,
        identity,
        address,
        age,
        gender,
        parse_flag(row.get("is_deceased")?, "owners.is_deceased")?,
        load_owner_pet_ids(conn, uuid)?,
    ))
}

fn parse_pet_row(conn: &Connection, row: &Row<'_>) -> RepoResult<Pet> {
    let uuid_text: String = row.get("uuid")?;
    let uuid = parse_uuid(&uuid_text, "pets.uuid")?;

    let age: Option<u32> = row.get("age")?;
    if age == Some(0) {
        return Err(RepoError::InvalidData(format!(
            "non-positive age in pets.age for `{uuid_text}`"
        )));
    }

    Ok(Pet::restore(
        uuid,
        row.get("name")?,
        age,
        row.get("type")?,
        parse_flag(row.get("is_deceased")?, "pets.is_deceased")?,
        load_pet_owner_ids(conn, uuid)?,
    ))
}

fn load_owner_pet_ids(conn: &Connection, owner_id: OwnerId) -> RepoResult<BTreeSet<PetId>> {
    let mut stmt = conn.prepare("SELECT pet_uuid FROM owner_pets WHERE owner_uuid = ?1;")?;
    let mut rows = stmt.query([owner_id.to_string()])?;
    let mut ids = BTreeSet::new();
    while let Some(row) = rows.next()? {
        let value: String = row.get(0)?;
        ids.insert(parse_uuid(&value, "owner_pets.pet_uuid")?);
    }
    Ok(ids)
}

fn load_pet_owner_ids(conn: &Connection, pet_id: PetId) -> RepoResult<BTreeSet<OwnerId>> {
    let mut stmt = conn.prepare("SELECT owner_uuid FROM owner_pets WHERE pet_uuid = ?1;")?;
    let mut rows = stmt.query([pet_id.to_string()])?;
    let mut ids = BTreeSet::new();
    while let Some(row) = rows.next()? {
        let value: String = row.get(0)?;
        ids.insert(parse_uuid(&value, "owner_pets.owner_uuid")?);
    }
    Ok(ids)
}
