//! # Block Type Module
//!
//! The built-in block types, declared as a static registration table. Every
//! registry built with [`BlockRegistry::with_builtin_blocks`] starts from this
//! table, and additional types can be appended from configuration.
//!
//! [`BlockRegistry::with_builtin_blocks`]: super::BlockRegistry::with_builtin_blocks

use super::{BlockCatalogEntry, BlockId};

/// A compile-time description of a block type.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct BlockDescriptor {
    pub id: BlockId,
    pub name: &'static str,
    pub solid: bool,
    pub transparent: bool,
}

impl BlockDescriptor {
    /// Builds the catalog entry that gets stored in a registry.
    pub fn to_entry(&self) -> BlockCatalogEntry {
        BlockCatalogEntry::new(self.id, self.name, self.solid, self.transparent)
    }
}

/// Empty space. Never drawn and never collided with.
pub const AIR: BlockDescriptor = BlockDescriptor {
    id: 0,
    name: "BlockAir",
    solid: false,
    transparent: true,
};

/// Plain stone, solid and opaque.
pub const STONE: BlockDescriptor = BlockDescriptor {
    id: 1,
    name: "BlockStone",
    solid: true,
    transparent: false,
};

/// Dirt, solid and opaque.
pub const DIRT: BlockDescriptor = BlockDescriptor {
    id: 2,
    name: "BlockDirt",
    solid: true,
    transparent: false,
};

/// The registration table used by [`BlockRegistry::with_builtin_blocks`].
///
/// [`BlockRegistry::with_builtin_blocks`]: super::BlockRegistry::with_builtin_blocks
pub static BUILTIN_BLOCKS: [BlockDescriptor; 3] = [AIR, STONE, DIRT];
