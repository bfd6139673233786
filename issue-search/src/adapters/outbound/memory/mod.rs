//! In-memory tracker loaded from a JSON fixture.
//!
//! Backs the command-line tool and the integration tests with a real query
//! language, per-project browse grants and a restricted customer view.

mod attributes;
mod fixture;
mod query;
mod tracker;

pub use attributes::JsonAttributeSource;
pub use fixture::{Fixture, FixtureError, FixtureProject};
pub use query::{parse_query, MemoryQuery};
pub use tracker::MemoryTracker;
