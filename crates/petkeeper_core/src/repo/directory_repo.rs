//! Read-side directory queries over owners, pets and addresses.
//!
//! # Responsibility
//! - Provide filtered listings used by lookup screens and reports.
//! - Keep join/paging SQL inside the repository boundary.
//!
//! # Invariants
//! - Only active pets and active owners participate in any listing.
//! - Pet listings are distinct and ordered `name ASC, uuid ASC`.
//! - Owner listings are ordered `name ASC, first_name ASC, uuid ASC`.

use crate::model::owner::{Owner, OwnerId};
use crate::model::pet::{Pet, PetId};
use crate::repo::entity_store::{load_owner, load_pet, load_pets};
use crate::repo::{parse_uuid, RepoResult};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection};

const LIST_DEFAULT_LIMIT: u32 = 20;
const LIST_LIMIT_MAX: u32 = 100;

/// Paging options for directory listings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListQuery {
    /// Maximum rows to return. Defaults to 20 and clamps to 100.
    pub limit: Option<u32>,
    /// Number of rows to skip.
    pub offset: u32,
}

/// Repository interface for read-side listings.
pub trait DirectoryRepository {
    /// Loads an active owner with address and pet ids.
    fn active_owner(&self, owner_id: OwnerId) -> RepoResult<Option<Owner>>;
    /// Loads an active pet with owner ids.
    fn active_pet(&self, pet_id: PetId) -> RepoResult<Option<Pet>>;
    /// Loads every existing pet among `ids`.
    fn pets(&self, ids: &[PetId]) -> RepoResult<Vec<Pet>>;
    /// Active pets linked to `owner_id`.
    fn active_pets_of_owner(&self, owner_id: OwnerId) -> RepoResult<Vec<Pet>>;
    /// Active pets with an active owner living in `city` (exact match).
    fn pets_in_city(&self, city: &str, query: &ListQuery) -> RepoResult<Vec<Pet>>;
    /// Active pets with an active female owner, optionally restricted to a
    /// city compared case-insensitively.
    fn pets_of_women_in_city(&self, city: Option<&str>, query: &ListQuery)
        -> RepoResult<Vec<Pet>>;
    /// Active owners in `city` owning an active pet of `pet_type`.
    fn owners_by_pet_type_and_city(&self, pet_type: &str, city: &str) -> RepoResult<Vec<Owner>>;
}

/// SQLite-backed directory repository.
pub struct SqliteDirectoryRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteDirectoryRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    fn pets_from_id_query(&self, sql: &str, bind_values: Vec<Value>) -> RepoResult<Vec<Pet>> {
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut ids = Vec::new();
        while let Some(row) = rows.next()? {
            let value: String = row.get(0)?;
            ids.push(parse_uuid(&value, "pets.uuid")?);
        }
        load_pets(self.conn, &ids)
    }
}

impl DirectoryRepository for SqliteDirectoryRepository<'_> {
    fn active_owner(&self, owner_id: OwnerId) -> RepoResult<Option<Owner>> {
        load_owner(self.conn, owner_id, true)
    }

    fn active_pet(&self, pet_id: PetId) -> RepoResult<Option<Pet>> {
        load_pet(self.conn, pet_id, true)
    }

    fn pets(&self, ids: &[PetId]) -> RepoResult<Vec<Pet>> {
        load_pets(self.conn, ids)
    }

    fn active_pets_of_owner(&self, owner_id: OwnerId) -> RepoResult<Vec<Pet>> {
        self.pets_from_id_query(
            "SELECT p.uuid
             FROM pets p
             INNER JOIN owner_pets op ON op.pet_uuid = p.uuid
             WHERE op.owner_uuid = ?
               AND p.is_deceased = 0
             ORDER BY p.name ASC, p.uuid ASC;",
            vec![Value::Text(owner_id.to_string())],
        )
    }

    fn pets_in_city(&self, city: &str, query: &ListQuery) -> RepoResult<Vec<Pet>> {
        let mut sql = String::from(
            "SELECT DISTINCT p.uuid, p.name
             FROM pets p
             INNER JOIN owner_pets op ON op.pet_uuid = p.uuid
             INNER JOIN owners o ON o.uuid = op.owner_uuid
             INNER JOIN addresses a ON a.uuid = o.address_uuid
             WHERE a.city = ?
               AND p.is_deceased = 0
               AND o.is_deceased = 0
             ORDER BY p.name ASC, p.uuid ASC",
        );
        let mut bind_values = vec![Value::Text(city.to_string())];
        push_paging(&mut sql, &mut bind_values, query);
        self.pets_from_id_query(&sql, bind_values)
    }

    fn pets_of_women_in_city(
        &self,
        city: Option<&str>,
        query: &ListQuery,
    ) -> RepoResult<Vec<Pet>> {
        let mut sql = String::from(
            "SELECT DISTINCT p.uuid, p.name
             FROM pets p
             INNER JOIN owner_pets op ON op.pet_uuid = p.uuid
             INNER JOIN owners o ON o.uuid = op.owner_uuid
             INNER JOIN addresses a ON a.uuid = o.address_uuid
             WHERE o.gender = 'FEMALE'
               AND p.is_deceased = 0
               AND o.is_deceased = 0",
        );
        let mut bind_values = Vec::new();

        if let Some(city) = city {
            sql.push_str(" AND LOWER(a.city) = LOWER(?)");
            bind_values.push(Value::Text(city.to_string()));
        }

        sql.push_str(" ORDER BY p.name ASC, p.uuid ASC");
        push_paging(&mut sql, &mut bind_values, query);
        self.pets_from_id_query(&sql, bind_values)
    }

    fn owners_by_pet_type_and_city(&self, pet_type: &str, city: &str) -> RepoResult<Vec<Owner>> {
        let mut stmt = self.conn.prepare(
            "SELECT DISTINCT o.uuid, o.name, o.first_name
             FROM owners o
             INNER JOIN owner_pets op ON op.owner_uuid = o.uuid
             INNER JOIN pets p ON p.uuid = op.pet_uuid
             INNER JOIN addresses a ON a.uuid = o.address_uuid
             WHERE p.type = ?1
               AND a.city = ?2
               AND o.is_deceased = 0
               AND p.is_deceased = 0
             ORDER BY o.name ASC, o.first_name ASC, o.uuid ASC;",
        )?;
        let mut rows = stmt.query(params![pet_type, city])?;
        let mut ids = Vec::new();
        while let Some(row) = rows.next()? {
            let value: String = row.get(0)?;
            ids.push(parse_uuid(&value, "owners.uuid")?);
        }

        let mut owners = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(owner) = load_owner(self.conn, id, true)? {
                owners.push(owner);
            }
        }
        Ok(owners)
    }
}

/// Normalizes list limit according to directory contract.
pub fn normalize_list_limit(limit: Option<u32>) -> u32 {
    match limit {
        Some(0) => LIST_DEFAULT_LIMIT,
        Some(value) if value > LIST_LIMIT_MAX => LIST_LIMIT_MAX,
        Some(value) => value,
        None => LIST_DEFAULT_LIMIT,
    }
}

fn push_paging(sql: &mut String, bind_values: &mut Vec<Value>, query: &ListQuery) {
    sql.push_str(" LIMIT ?");
    bind_values.push(Value::Integer(i64::from(normalize_list_limit(query.limit))));
    if query.offset > 0 {
        sql.push_str(" OFFSET ?");
        bind_values.push(Value::Integer(i64::from(query.offset)));
    }
}
