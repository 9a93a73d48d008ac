//! Grid to world mapping. The lattice spacing equals the segment length.

use nalgebra::Vector3;

use crate::direction::Dir;
use crate::lattice::GridCell;

pub fn grid_to_world(cell: GridCell, segment_length: f32) -> Vector3<f32> {
    Vector3::new(cell.x as f32, cell.y as f32, cell.z as f32) * segment_length
}

/// Centre of the straight segment leaving `cell` along `dir`.
pub fn straight_position(cell: GridCell, dir: Dir, segment_length: f32) -> Vector3<f32> {
    grid_to_world(cell, segment_length) + dir.world() * (segment_length / 2.0)
}
