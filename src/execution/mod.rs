mod executor;

pub use executor::{Executor, QueryResult};
