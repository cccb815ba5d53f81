pub mod assertion;
pub mod config;
pub mod error;
pub mod http;
pub mod logger;
pub mod parser;
pub mod runner;
pub mod variable;

// Re-export commonly used types
pub use assertion::AssertionRegistry;
pub use config::{ApiflowConfig, ConfigLoader};
pub use error::{ApiflowError, Result};
pub use parser::{Expectation, Suite, TestRequest};
pub use runner::{Outcome, OutcomeStream, RunOptions, Scheduler};
pub use variable::ValueStore;
