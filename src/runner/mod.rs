pub mod executor;
pub mod graph;
pub mod reporter;
pub mod scheduler;
pub mod types;

pub use executor::RequestExecutor;
pub use graph::DependencyGraph;
pub use reporter::TestReporter;
pub use scheduler::{OutcomeStream, Scheduler};
pub use types::{
    DEPENDS_ON, DUPLICATE_NAME, Outcome, REQUEST_ERROR, RunOptions, SuiteSummary, TestSummary,
    UNKNOWN_EXPECTATION,
};
