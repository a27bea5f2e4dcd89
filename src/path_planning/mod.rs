// Path planning algorithms module

pub mod heuristics;
pub mod hybrid_a_star;
pub mod pipeline;
pub mod reeds_shepp;
pub mod smoother;

pub use hybrid_a_star::{HybridAStar, HybridAStarConfig, PathNode};
pub use pipeline::{Pathfinder, PathfinderConfig, PlannedPath};
pub use smoother::SmootherConfig;
