//! # Block Registry
//!
//! Maps block ids to their catalog entries. A registry is constructed explicitly
//! and handed to whatever needs it (usually behind an `Arc`), so each world owns
//! exactly one catalog and no global state is involved. The catalog only grows:
//! there is no removal and registering an id twice is rejected.

use std::collections::{BTreeMap, HashMap};

use log::debug;

use crate::engine_state::error::VoxelError;

use super::block_type::{BlockDescriptor, BUILTIN_BLOCKS};
use super::{BlockCatalogEntry, BlockId};

/// The catalog of every block type known to a world.
#[derive(Debug, Default)]
pub struct BlockRegistry {
    blocks: BTreeMap<BlockId, BlockCatalogEntry>,
    ids_by_name: HashMap<String, BlockId>,
}

impl BlockRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry pre-populated with the built-in registration table.
    pub fn with_builtin_blocks() -> Self {
        let mut registry = Self::new();
        // The built-in table is checked for unique ids by its own tests.
        for descriptor in BUILTIN_BLOCKS.iter() {
            registry.blocks.insert(descriptor.id, descriptor.to_entry());
            registry
                .ids_by_name
                .insert(descriptor.name.to_string(), descriptor.id);
        }
        registry
    }

    /// Adds a block to the catalog.
    ///
    /// # Errors
    /// Returns [`VoxelError::DuplicateBlockId`] if the id is already present. The
    /// existing entry is left untouched.
    pub fn register(&mut self, entry: BlockCatalogEntry) -> Result<(), VoxelError> {
        if self.blocks.contains_key(&entry.id) {
            return Err(VoxelError::DuplicateBlockId(entry.id));
        }

        debug!("Registered block {} as id {}", entry.name, entry.id);
        self.ids_by_name.insert(entry.name.clone(), entry.id);
        self.blocks.insert(entry.id, entry);
        Ok(())
    }

    /// Registers every descriptor of a table, stopping at the first duplicate.
    pub fn register_all(&mut self, descriptors: &[BlockDescriptor]) -> Result<(), VoxelError> {
        for descriptor in descriptors {
            self.register(descriptor.to_entry())?;
        }
        Ok(())
    }

    /// Looks up the catalog entry for a block id.
    ///
    /// # Errors
    /// Returns [`VoxelError::UnknownBlockId`] if nothing was registered under `id`.
    pub fn lookup(&self, id: BlockId) -> Result<&BlockCatalogEntry, VoxelError> {
        self.blocks.get(&id).ok_or(VoxelError::UnknownBlockId(id))
    }

    pub fn lookup_by_name(&self, name: &str) -> Option<&BlockCatalogEntry> {
        self.ids_by_name
            .get(name)
            .and_then(|id| self.blocks.get(id))
    }

    pub fn contains(&self, id: BlockId) -> bool {
        self.blocks.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Iterates over every entry in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = &BlockCatalogEntry> {
        self.blocks.values()
    }
}
