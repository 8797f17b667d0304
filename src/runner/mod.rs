//! Check runner module.
//!
//! The driver that wires sequencers together and the report types a run
//! produces.

pub mod driver;
pub mod report;

pub use driver::{CheckRunner, RunnerOptions};
pub use report::{CheckRecord, CheckReport, LookupRequest, ResultNode, ResultSet};
