//! Minimum-cost rack/transfer planning for two-bed flat/tube knitting
//! machines: given a source and target bed layout, find the cheapest
//! sequence of transfers and rackings that turns one into the other.

pub mod braid;
pub mod enumerator;
pub mod error;
pub mod heuristics;
pub mod machine;
pub mod planner;
pub mod prebuilt;
pub mod state;
pub mod testgen;
pub mod util;

pub use error::{KnittingError, Result};
pub use heuristics::Heuristic;
pub use machine::{Machine, NeedleLabel};
pub use planner::{a_star, ida_star, SearchResult};
pub use state::KnittingState;
