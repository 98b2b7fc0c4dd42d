//! Pagination, deduplication and enrichment of venue searches.
//!
//! An [`Aggregator`] drives one category search at a time against a
//! [`venuescout_core::VenueSource`]: pages are fetched sequentially, records
//! are deduplicated by id, new records are enriched in bounded concurrent
//! batches, and the accumulated set is disclosed either after every page or
//! only once the run ends.

pub mod constraints;
pub mod engine;
pub mod error;
pub mod registry;
pub mod snapshot;
pub mod state;
pub mod venue_set;

pub use constraints::{Constraints, SearchArea};
pub use engine::{Aggregator, RunHandle};
pub use error::AggregateError;
pub use registry::{RunRegistry, RunToken};
pub use snapshot::{ResumePoint, RunOutcome, RunPhase, RunSnapshot};
pub use state::{RunState, Termination};
pub use venue_set::VenueSet;
