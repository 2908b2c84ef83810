//! Transaction boundary for coordinator operations.
//!
//! # Responsibility
//! - Run one load–decide–mutate–persist sequence as a single unit of work.
//!
//! # Invariants
//! - `atomically` commits only when the work returns `Ok`; any `Err` rolls
//!   back every write made through the provided store.
//! - SQLite units of work take the write lock up front (`IMMEDIATE`), so two
//!   writers never interleave between read and write.
//! - Errors are never retried here.

use crate::repo::entity_store::{EntityStore, SqliteEntityStore};
use crate::repo::RepoError;
use log::warn;
use rusqlite::{Connection, TransactionBehavior};

/// Store that can execute work against an `EntityStore` atomically.
pub trait TransactionalStore {
    /// Runs `work` inside one transaction.
    fn atomically<T, E>(
        &mut self,
        work: impl FnOnce(&dyn EntityStore) -> Result<T, E>,
    ) -> Result<T, E>
    where
        E: From<RepoError>;

    /// Runs read-only `work` against the current committed state.
    fn read<T, E>(&self, work: impl FnOnce(&dyn EntityStore) -> Result<T, E>) -> Result<T, E>
    where
        E: From<RepoError>;
}

/// SQLite unit-of-work provider over a migrated connection.
pub struct SqliteStore<'conn> {
    conn: &'conn mut Connection,
}

impl<'conn> SqliteStore<'conn> {
    pub fn new(conn: &'conn mut Connection) -> Self {
        Self { conn }
    }

    /// Read access to the underlying connection.
    pub fn connection(&self) -> &Connection {
        &*self.conn
    }
}

impl TransactionalStore for SqliteStore<'_> {
    fn atomically<T, E>(
        &mut self,
        work: impl FnOnce(&dyn EntityStore) -> Result<T, E>,
    ) -> Result<T, E>
    where
        E: From<RepoError>,
    {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(RepoError::from)?;

        let outcome = {
            let store = SqliteEntityStore::new(&tx);
            work(&store)
        };

        match outcome {
            Ok(value) => {
                tx.commit().map_err(RepoError::from)?;
                Ok(value)
            }
            Err(err) => {
                if let Err(rollback_err) = tx.rollback() {
                    warn!(
                        "event=uow_rollback module=repo status=error error={}",
                        rollback_err
                    );
                }
                Err(err)
            }
        }
    }

    fn read<T, E>(&self, work: impl FnOnce(&dyn EntityStore) -> Result<T, E>) -> Result<T, E>
    where
        E: From<RepoError>,
    {
        let store = SqliteEntityStore::new(&*self.conn);
        work(&store)
    }
}
