//! redb-backed storage.
//!
//! A single table maps state names to encoded [`Packed`] bytes. Each save is
//! one write transaction, so readers see either the previous record or the
//! new one, never a mix.

use super::StateStorage;
use crate::error::PersistenceError;
use crate::formats::{Encoding, Packed};
use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition, TableError};
use std::fmt;
use std::path::Path;

/// Table: state name -> encoded bytes.
const SHARED_STATE: TableDefinition<&str, &[u8]> = TableDefinition::new("shared_state");

fn db_err(err: impl Into<redb::Error>) -> PersistenceError {
    PersistenceError::Database(err.into())
}

/// Shared state stored in a redb database file.
pub struct RedbStorage {
    db: Database,
    encoding: Encoding,
}

impl RedbStorage {
    /// Open or create the database at `path`.
    pub fn open(path: &Path, encoding: Encoding) -> Result<Self, PersistenceError> {
        let db = Database::create(path).map_err(db_err)?;
        Ok(Self { db, encoding })
    }

    #[must_use]
    pub fn encoding(&self) -> Encoding {
        self.encoding
    }
}

impl fmt::Debug for RedbStorage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedbStorage")
            .field("encoding", &self.encoding)
            .finish_non_exhaustive()
    }
}

impl StateStorage for RedbStorage {
    fn load(&self, name: &str) -> Result<Option<Packed>, PersistenceError> {
        let txn = self.db.begin_read().map_err(db_err)?;
        let table = match txn.open_table(SHARED_STATE) {
            Ok(table) => table,
            Err(TableError::TableDoesNotExist(_)) => return Ok(None),
            Err(err) => return Err(db_err(err)),
        };

        let Some(guard) = table.get(name).map_err(db_err)? else {
            return Ok(None);
        };
        // Records are decoded by their own framing so a backend switched
        // between encodings still reads older values.
        let bytes = guard.value();
        Encoding::detect(bytes).decode(bytes).map(Some)
    }

    fn save(&self, name: &str, packed: &Packed) -> Result<(), PersistenceError> {
        let bytes = self.encoding.encode(packed)?;

        let txn = self.db.begin_write().map_err(db_err)?;
        {
            let mut table = txn.open_table(SHARED_STATE).map_err(db_err)?;
            table.insert(name, bytes.as_slice()).map_err(db_err)?;
        }
        txn.commit().map_err(db_err)?;
        Ok(())
    }
}
