pub mod resolver;
pub mod store;

pub use resolver::VariableResolver;
pub use store::ValueStore;
