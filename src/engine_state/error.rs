//! # Error Types
//!
//! Failures raised by the block catalog, the chunk containers and the streaming
//! pipeline. Integrity violations (`VoxelError`) go straight back to the caller.
//! Persistence and generation failures are recoverable: the streaming pipeline
//! retries them with backoff instead of aborting the tick.

use std::{fmt, io};

use cgmath::Point3;

use super::streaming::PlayerId;
use super::voxels::block::BlockId;

/// Integrity and accessor errors for the voxel world.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VoxelError {
    /// A block with this id is already in the registry.
    DuplicateBlockId(BlockId),
    /// No block with this id has been registered.
    UnknownBlockId(BlockId),
    /// The streaming controller already tracks this player.
    DuplicatePlayerId(PlayerId),
    /// The streaming controller has never seen this player.
    UnknownPlayerId(PlayerId),
    /// A region or column accessor was called with an index outside its bounds.
    IndexOutOfRange { index: i32, bound: i32 },
}

impl fmt::Display for VoxelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VoxelError::DuplicateBlockId(id) => write!(f, "block id {id} is already registered"),
            VoxelError::UnknownBlockId(id) => write!(f, "block id {id} is not registered"),
            VoxelError::DuplicatePlayerId(id) => write!(f, "player {id} is already tracked"),
            VoxelError::UnknownPlayerId(id) => write!(f, "player {id} is not tracked"),
            VoxelError::IndexOutOfRange { index, bound } => {
                write!(f, "index {index} is outside of [0, {bound})")
            }
        }
    }
}

impl std::error::Error for VoxelError {}

/// Errors reported by a region store or serializer.
#[derive(Debug)]
pub enum PersistenceError {
    Io(io::Error),
    Malformed(String),
    /// The store has no backing implementation yet.
    NotYetAvailable,
}

impl fmt::Display for PersistenceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PersistenceError::Io(err) => write!(f, "region io failed: {err}"),
            PersistenceError::Malformed(reason) => write!(f, "region data is malformed: {reason}"),
            PersistenceError::NotYetAvailable => write!(f, "region persistence is not available"),
        }
    }
}

impl std::error::Error for PersistenceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PersistenceError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for PersistenceError {
    fn from(err: io::Error) -> Self {
        PersistenceError::Io(err)
    }
}

impl From<serde_json::Error> for PersistenceError {
    fn from(err: serde_json::Error) -> Self {
        PersistenceError::Malformed(err.to_string())
    }
}

/// Errors reported by a world generator.
#[derive(Debug, Clone, PartialEq)]
pub enum GenerationError {
    Failed { position: Point3<i32>, reason: String },
    NotYetAvailable,
}

impl fmt::Display for GenerationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GenerationError::Failed { position, reason } => write!(
                f,
                "generating chunk ({}, {}, {}) failed: {reason}",
                position.x, position.y, position.z
            ),
            GenerationError::NotYetAvailable => write!(f, "world generation is not available"),
        }
    }
}

impl std::error::Error for GenerationError {}

/// Why a column could not be brought into the resident set.
#[derive(Debug)]
pub enum ColumnSourceError {
    Persistence(PersistenceError),
    Generation(GenerationError),
}

impl ColumnSourceError {
    /// Whether neither a store nor a generator could ever produce the column.
    pub fn is_not_yet_available(&self) -> bool {
        matches!(
            self,
            ColumnSourceError::Persistence(PersistenceError::NotYetAvailable)
                | ColumnSourceError::Generation(GenerationError::NotYetAvailable)
        )
    }
}

impl fmt::Display for ColumnSourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnSourceError::Persistence(err) => err.fmt(f),
            ColumnSourceError::Generation(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for ColumnSourceError {}

impl From<PersistenceError> for ColumnSourceError {
    fn from(err: PersistenceError) -> Self {
        ColumnSourceError::Persistence(err)
    }
}

impl From<GenerationError> for ColumnSourceError {
    fn from(err: GenerationError) -> Self {
        ColumnSourceError::Generation(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_missing_sources_count_as_unavailable() {
        let missing_store = ColumnSourceError::from(PersistenceError::NotYetAvailable);
        let missing_generator = ColumnSourceError::from(GenerationError::NotYetAvailable);
        assert!(missing_store.is_not_yet_available());
        assert!(missing_generator.is_not_yet_available());

        let broken = ColumnSourceError::from(PersistenceError::Malformed("truncated".to_string()));
        assert!(!broken.is_not_yet_available());
        assert_eq!(broken.to_string(), "region data is malformed: truncated");

        let failed = ColumnSourceError::from(GenerationError::Failed {
            position: Point3::new(1, 2, 3),
            reason: "bad seed".to_string(),
        });
        assert!(!failed.is_not_yet_available());
        assert_eq!(failed.to_string(), "generating chunk (1, 2, 3) failed: bad seed");
    }
}
