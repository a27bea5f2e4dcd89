//! Occupancy map, wavefront fields, and obstacle handling

pub mod grid;
pub mod obstacles;
pub mod flow_field;
pub mod voronoi_field;

pub use grid::{Cell, Map};
pub use obstacles::Obstacle;
