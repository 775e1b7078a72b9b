//! # Region Module
//!
//! A region is a `REGION_DIMENSION x REGION_DIMENSION` grid of chunk columns and
//! the unit the region store reads and writes. Region `(x, y)` holds the columns
//! `[x * R, (x + 1) * R) x [y * R, (y + 1) * R)` and lives in the file `"x,y.r"`
//! under the store's root directory.
//!
//! Columns that were never generated are simply absent.

use std::path::{Path, PathBuf};

use cgmath::Point2;

use super::{chunk::VoxelChunk, column::ChunkColumn};
use crate::engine_state::{
    error::VoxelError,
    streaming::coords::{chunk_to_region, column_in_region, region_to_chunk},
};

/// Edge length of a region in columns.
pub const REGION_DIMENSION: usize = 16;

/// A square block of columns persisted as one file.
#[derive(Debug)]
pub struct Region {
    position: Point2<i32>,
    columns: Vec<Option<ChunkColumn>>,
}

impl Region {
    /// Creates a region without any columns.
    pub fn new(position: Point2<i32>) -> Self {
        Region {
            position,
            columns: (0..REGION_DIMENSION * REGION_DIMENSION).map(|_| None).collect(),
        }
    }

    pub fn position(&self) -> Point2<i32> {
        self.position
    }

    /// The file identifier of a region, `"<x>,<y>.r"`.
    pub fn file_name_for(position: Point2<i32>) -> String {
        format!("{},{}.r", position.x, position.y)
    }

    pub fn file_name(&self) -> String {
        Self::file_name_for(self.position)
    }

    /// Where this region is stored below `root`.
    pub fn path(&self, root: &Path) -> PathBuf {
        root.join(self.file_name())
    }

    fn local_index(x: i32, y: i32) -> Result<usize, VoxelError> {
        let bound = REGION_DIMENSION as i32;
        for index in [x, y] {
            if !(0..bound).contains(&index) {
                return Err(VoxelError::IndexOutOfRange { index, bound });
            }
        }
        Ok(x as usize + REGION_DIMENSION * y as usize)
    }

    /// The column at local position `(x, y)`.
    ///
    /// # Errors
    /// Returns [`VoxelError::IndexOutOfRange`] unless both indices are in
    /// `[0, REGION_DIMENSION)`.
    pub fn get_column(&self, x: i32, y: i32) -> Result<Option<&ChunkColumn>, VoxelError> {
        let index = Self::local_index(x, y)?;
        Ok(self.columns[index].as_ref())
    }

    /// The chunk at local column `(x, y)` and height `z`.
    ///
    /// # Errors
    /// Returns [`VoxelError::IndexOutOfRange`] if `x` or `y` is outside
    /// `[0, REGION_DIMENSION)` or `z` is outside `[0, COLUMN_HEIGHT)`.
    ///
    /// [`COLUMN_HEIGHT`]: super::column::COLUMN_HEIGHT
    pub fn get_chunk(&self, x: i32, y: i32, z: i32) -> Result<Option<&VoxelChunk>, VoxelError> {
        match self.get_column(x, y)? {
            Some(column) => column.chunk(z).map(Some),
            None => ChunkColumn::height_index(z).map(|_| None),
        }
    }

    /// Whether the column with the given chunk coordinate belongs here.
    pub fn contains(&self, column: Point2<i32>) -> bool {
        chunk_to_region(column) == self.position
    }

    /// The column with the given chunk coordinate, if stored.
    pub fn column_at(&self, column: Point2<i32>) -> Option<&ChunkColumn> {
        if !self.contains(column) {
            return None;
        }
        let local = column_in_region(column);
        self.get_column(local.x, local.y).ok().flatten()
    }

    /// Stores a column, replacing any previous version.
    ///
    /// # Errors
    /// Returns [`VoxelError::IndexOutOfRange`] if the column belongs to a
    /// different region.
    pub fn set_column(&mut self, column: ChunkColumn) -> Result<Option<ChunkColumn>, VoxelError> {
        let origin = region_to_chunk(self.position);
        let index = Self::local_index(column.position().x - origin.x, column.position().y - origin.y)?;
        Ok(self.columns[index].replace(column))
    }

    /// All stored columns in local row order.
    pub fn columns(&self) -> impl Iterator<Item = &ChunkColumn> {
        self.columns.iter().flatten()
    }

    pub fn column_count(&self) -> usize {
        self.columns().count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::Point3;

    #[test]
    fn file_names_follow_region_coordinates() {
        let region = Region::new(Point2::new(-1, 4));
        assert_eq!(region.file_name(), "-1,4.r");
        assert_eq!(region.path(Path::new("saves")), PathBuf::from("saves/-1,4.r"));
    }

    #[test]
    fn accessors_are_bounds_checked() {
        let region = Region::new(Point2::new(0, 0));
        assert!(region.get_column(15, 15).unwrap().is_none());
        assert_eq!(
            region.get_column(16, 0).unwrap_err(),
            VoxelError::IndexOutOfRange { index: 16, bound: 16 }
        );
        assert_eq!(
            region.get_column(0, -1).unwrap_err(),
            VoxelError::IndexOutOfRange { index: -1, bound: 16 }
        );
        assert_eq!(
            region.get_chunk(0, 0, 16).unwrap_err(),
            VoxelError::IndexOutOfRange { index: 16, bound: 16 }
        );
    }

    #[test]
    fn columns_are_placed_by_chunk_coordinate() {
        let mut region = Region::new(Point2::new(1, 0));
        assert!(region.contains(Point2::new(20, 5)));

        region.set_column(ChunkColumn::empty(Point2::new(20, 5))).unwrap();
        assert!(region.get_column(4, 5).unwrap().is_some());
        assert_eq!(
            region.get_chunk(4, 5, 2).unwrap().map(|chunk| chunk.position),
            Some(Point3::new(20, 5, 2))
        );
        assert!(region.column_at(Point2::new(20, 5)).is_some());
        assert_eq!(region.column_count(), 1);

        assert!(region.set_column(ChunkColumn::empty(Point2::new(3, 5))).is_err());
    }
}
