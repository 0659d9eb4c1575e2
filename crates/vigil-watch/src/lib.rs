//! The watch pipeline: persisted watch tables, the target registry, the
//! reconciliation cycle, and archive rotation.
//!
//! One watch target is a subreddit initialised at a point in time. Its state
//! lives in a flat CSV table (one row per tracked identifier) whose history
//! is preserved in an append-only compressed archive. The design assumes a
//! single writer per target; concurrent invocations against the same target
//! must be prevented by the caller's scheduling.

pub mod cycle;
pub mod error;
pub mod registry;
pub mod rotate;
pub mod table;

pub use cycle::{CycleOutcome, run_cycle};
pub use error::{Error, Result};
pub use registry::Registry;
