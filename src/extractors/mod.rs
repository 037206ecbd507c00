//! Request strategies: primary key from the path, query object from parameters.

pub mod identifier;
pub mod query;

pub use identifier::{last_segment, Identifier, PathIdentifier};
pub use query::{Querier, QueryParser};
