//! Foundation module - core utilities and types
//!
//! - Geometry value types
//! - Identifier allocation
//! - Logging utilities

pub mod id_factory;
pub mod logging;
pub mod math;

pub use id_factory::IdFactory;
pub use math::{Extent2D, Point2D, Vector2};
