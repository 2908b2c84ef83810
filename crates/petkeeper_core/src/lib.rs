//! Core domain logic for petkeeper.
//! This crate is the single source of truth for ownership invariants.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod rules;
pub mod service;

pub use config::{ConfigError, CoreConfig};
pub use db::{open_db, open_db_in_memory, DbError};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::address::{Address, AddressDraft, AddressId};
pub use model::owner::{Gender, Identity, Owner, OwnerId};
pub use model::pet::{Pet, PetId, PetWithOwners};
pub use model::ValidationError;
pub use repo::directory_repo::{DirectoryRepository, ListQuery, SqliteDirectoryRepository};
pub use repo::entity_store::{EntityStore, SqliteEntityStore};
pub use repo::unit_of_work::{SqliteStore, TransactionalStore};
pub use repo::{RepoError, RepoResult};
pub use rules::homonym::{resolve_homonyms, HomonymGroup};
pub use rules::ownership::{can_assign, can_remove, Decision, Denial};
pub use service::directory_service::DirectoryService;
pub use service::ownership_service::{
    CreatedOwner, HomonymWarning, NewOwner, NewPet, OwnerPatch, OwnershipService, PetPatch,
};
pub use service::view::{AddressView, OwnerView, PetView};
pub use service::{EntityRef, Reason, ServiceError, ServiceResult};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
