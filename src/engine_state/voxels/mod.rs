//! # Voxel World Core
//!
//! This module contains the data side of the voxel world: what blocks exist, how
//! they are arranged in chunks, columns and regions, and where new or stored
//! blocks come from.
//!
//! ## Architecture
//!
//! * **Block**: the block catalog (`BlockCatalogEntry`, `BlockRegistry`) and face
//!   geometry
//! * **Chunk**: a dense `16x16x16` grid of block ids plus its two meshes
//! * **Column**: `COLUMN_HEIGHT` chunks stacked along z with a player reference count
//! * **Region**: a `16x16` grid of columns, the unit of persistence
//! * **World**: the arena of resident columns
//! * **Generation** / **Persistence**: collaborators that produce column contents
//!
//! ## Data Flow
//!
//! 1. The streaming pipeline asks the region store for a column
//! 2. If the store has nothing, a world generator creates it
//! 3. The column is inserted into the resident arena and meshed
//! 4. When nobody wants it anymore it is torn down, saved and swept

pub mod block;
pub mod chunk;
pub mod column;
pub mod generation;
pub mod persistence;
pub mod region;
pub mod world;

pub use chunk::CHUNK_DIMENSION;
pub use column::COLUMN_HEIGHT;
pub use region::REGION_DIMENSION;
