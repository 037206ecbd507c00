pub mod common;
pub mod mux;

pub use common::{common_routes, common_routes_with_ready};
pub use mux::{default_mux, Mux, Operation};
