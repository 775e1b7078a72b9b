//! Coordinate conversions between world blocks, chunks and regions.
//!
//! All conversions use floor division, so negative coordinates land in the cell
//! that actually contains them: world block `-1` is in chunk `-1`, and chunk
//! `-1` is in region `-1`.

use cgmath::{Point2, Point3};

use crate::engine_state::voxels::{chunk::CHUNK_DIMENSION, region::REGION_DIMENSION};

const S: i32 = CHUNK_DIMENSION as i32;
const R: i32 = REGION_DIMENSION as i32;

/// The chunk containing a world block coordinate.
pub fn world_to_chunk(world: Point3<i32>) -> Point3<i32> {
    Point3::new(
        world.x.div_euclid(S),
        world.y.div_euclid(S),
        world.z.div_euclid(S),
    )
}

/// The world block coordinate of a chunk's origin corner.
pub fn chunk_to_world(chunk: Point3<i32>) -> Point3<i32> {
    Point3::new(chunk.x * S, chunk.y * S, chunk.z * S)
}

/// The region containing a column.
pub fn chunk_to_region(column: Point2<i32>) -> Point2<i32> {
    Point2::new(column.x.div_euclid(R), column.y.div_euclid(R))
}

/// The first column of a region.
pub fn region_to_chunk(region: Point2<i32>) -> Point2<i32> {
    Point2::new(region.x * R, region.y * R)
}

/// The region containing a world block coordinate.
pub fn world_to_region(world: Point3<i32>) -> Point2<i32> {
    chunk_to_region(column_of(world_to_chunk(world)))
}

/// The world block coordinate of a region's origin corner, horizontally.
pub fn region_to_world(region: Point2<i32>) -> Point2<i32> {
    let column = region_to_chunk(region);
    Point2::new(column.x * S, column.y * S)
}

/// The column a chunk belongs to.
pub fn column_of(chunk: Point3<i32>) -> Point2<i32> {
    Point2::new(chunk.x, chunk.y)
}

/// The column containing a continuous world position.
pub fn column_containing(position: Point3<f32>) -> Point2<i32> {
    let block = Point3::new(
        position.x.floor() as i32,
        position.y.floor() as i32,
        position.z.floor() as i32,
    );
    column_of(world_to_chunk(block))
}

/// Position of a column inside its region, each axis in `[0, REGION_DIMENSION)`.
pub fn column_in_region(column: Point2<i32>) -> Point2<i32> {
    Point2::new(column.x.rem_euclid(R), column.y.rem_euclid(R))
}

/// Every column of the square `[-radius, radius)` around `center`, row by row.
pub fn footprint(center: Point2<i32>, radius: i32) -> impl Iterator<Item = Point2<i32>> {
    (-radius..radius)
        .flat_map(move |dy| (-radius..radius).map(move |dx| Point2::new(center.x + dx, center.y + dy)))
}

/// Whether `column` lies in the square `[-radius, radius)` around `center`.
pub fn in_footprint(center: Point2<i32>, radius: i32, column: Point2<i32>) -> bool {
    let dx = column.x - center.x;
    let dy = column.y - center.y;
    (-radius..radius).contains(&dx) && (-radius..radius).contains(&dy)
}
