//! Safe SQL builder: identifiers from wiring code only, values as parameters.

mod builder;
pub use builder::*;
