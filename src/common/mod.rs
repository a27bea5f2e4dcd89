//! Common types, traits, and error definitions for vehicle_pathfinding
//!
//! This module provides the foundational building blocks used across
//! the planning pipeline.

pub mod types;
pub mod traits;
pub mod error;

pub use types::*;
pub use traits::*;
pub use error::*;
