//! The domain module holds the simulation core: arena geometry, the two robot models and the
//! records a driver keeps while stepping them.
//!
//! Nothing in here does I/O. Randomness is only drawn when an environment samples its initial
//! state, from a generator owned by that environment.

mod arena;
mod basis;
mod collision;
mod environment;
mod episode;
mod geometry;
pub mod navigation;
pub mod point_navigation;

pub use arena::{Arena, ArenaError, Prepared};
pub use basis::{Angle, DoubleRange, Point, RangeError};
pub use collision::{CollisionPolicy, Movement};
pub use environment::{ConfigurationError, Environment, EnvironmentError};
pub use episode::{EpisodeError, HasRobotPosition, Outcome, Step};
pub use geometry::Segment;
pub use navigation::NavigationEnvironment;
pub use point_navigation::PointNavigationEnvironment;
