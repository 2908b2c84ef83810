//! Address resolver over the `addresses` table.
//!
//! # Responsibility
//! - Return the canonical address row for a description, creating it once.
//!
//! # Invariants
//! - At most one row exists per canonical `(city, type, address_name, number)`.
//! - Resolution is race-free: concurrent creators converge on one row.

use crate::model::address::{Address, AddressDraft, AddressId};
use crate::repo::{parse_uuid, RepoError, RepoResult};
use log::debug;
use rusqlite::{params, Connection, OptionalExtension, Row};

const ADDRESS_SELECT_SQL: &str = "SELECT
    uuid,
    city,
    type,
    address_name,
    number
FROM addresses";

/// Resolves `draft` to its canonical address, inserting it when absent.
pub fn resolve_or_create_address(conn: &Connection, draft: &AddressDraft) -> RepoResult<Address> {
    let canonical = draft.canonicalize()?;
    let candidate = Address::from_draft(canonical);

    let inserted = conn.execute(
        "INSERT INTO addresses (uuid, city, type, address_name, number)
         VALUES (?1, ?2, ?3, ?4, ?5)
         ON CONFLICT (city, type, address_name, number) DO NOTHING;",
        params![
            candidate.uuid.to_string(),
            candidate.city.as_str(),
            candidate.kind.as_str(),
            candidate.address_name.as_str(),
            candidate.number.as_str(),
        ],
    )?;

    let resolved = find_address_by_tuple(conn, &candidate)?.ok_or_else(|| {
        RepoError::InvalidData("address row missing after get-or-create".to_string())
    })?;
    debug!(
        "event=address_resolve module=repo status=ok created={} address_id={}",
        inserted == 1,
        resolved.uuid
    );
    Ok(resolved)
}

/// Loads one address row by id.
pub fn find_address(conn: &Connection, id: AddressId) -> RepoResult<Option<Address>> {
    let row = conn
        .query_row(
            &format!("{ADDRESS_SELECT_SQL} WHERE uuid = ?1;"),
            [id.to_string()],
            read_address_columns,
        )
        .optional()?;
    row.map(parse_address_columns).transpose()
}

fn find_address_by_tuple(conn: &Connection, address: &Address) -> RepoResult<Option<Address>> {
    let (city, kind, address_name, number) = address.tuple();
    let row = conn
        .query_row(
            &format!(
                "{ADDRESS_SELECT_SQL}
                 WHERE city = ?1
                   AND type = ?2
                   AND address_name = ?3
                   AND number = ?4;"
            ),
            params![city, kind, address_name, number],
            read_address_columns,
        )
        .optional()?;
    row.map(parse_address_columns).transpose()
}

type AddressColumns = (String, String, String, String, String);

fn read_address_columns(row: &Row<'_>) -> rusqlite::Result<AddressColumns> {
    Ok((
        row.get("uuid")?,
        row.get("city")?,
        row.get("type")?,
        row.get("address_name")?,
        row.get("number")?,
    ))
}

fn parse_address_columns(columns: AddressColumns) -> RepoResult<Address> {
    let (uuid, city, kind, address_name, number) = columns;
    Ok(Address {
        uuid: parse_uuid(&uuid, "addresses.uuid")?,
        city,
        kind,
        address_name,
        number,
    })
}
