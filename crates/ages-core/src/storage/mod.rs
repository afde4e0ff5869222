//! # Storage Module
//!
//! Durable backends for the packed shared state.
//!
//! - [`FileStorage`]: one file per state name, written atomically
//! - [`RedbStorage`]: redb embedded database (ACID, copy-on-write B-trees,
//!   crash safe)
//!
//! Backends only move bytes; encoding is [`crate::formats::Encoding`].

mod file;
mod redb_state;

pub use file::FileStorage;
pub use redb_state::RedbStorage;

use crate::error::PersistenceError;
use crate::formats::Packed;

/// A place the shared state can be loaded from and flushed to.
pub trait StateStorage {
    /// Load the record saved under `name`. `Ok(None)` when nothing was saved.
    fn load(&self, name: &str) -> Result<Option<Packed>, PersistenceError>;

    /// Replace the record saved under `name`.
    fn save(&self, name: &str, packed: &Packed) -> Result<(), PersistenceError>;
}

impl<S: StateStorage + ?Sized> StateStorage for Box<S> {
    fn load(&self, name: &str) -> Result<Option<Packed>, PersistenceError> {
        (**self).load(name)
    }

    fn save(&self, name: &str, packed: &Packed) -> Result<(), PersistenceError> {
        (**self).save(name, packed)
    }
}
