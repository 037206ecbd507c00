//! Ghost: expose any store as CRUD REST endpoints.
//!
//! A [`Store`] for a record type is wrapped in a [`HookStore`], bound to JSON
//! encoding, a path identifier and a query parser by [`ResourceServer`], and
//! served through [`Ghost::into_router`].

pub mod config;
pub mod context;
pub mod encoding;
pub mod error;
pub mod extractors;
pub mod ghost;
pub mod hooks;
pub mod key;
pub mod resource;
pub mod routes;
pub mod server;
pub mod sql;
pub mod store;

pub use config::ServerConfig;
pub use context::Context;
pub use encoding::{Encoding, Json};
pub use error::{default_error_handler, AppError, ConfigError, ErrorHandler};
pub use extractors::{Identifier, PathIdentifier, Querier, QueryParser};
pub use ghost::Ghost;
pub use hooks::{
    AfterCreate, AfterDelete, AfterList, AfterRead, AfterUpdate, BeforeCreate, BeforeDelete,
    BeforeList, BeforeRead, BeforeUpdate, Hooks,
};
pub use key::{PrimaryKey, Sequential};
pub use resource::{Query, Resource};
pub use routes::{common_routes, common_routes_with_ready, default_mux, Mux, Operation};
pub use server::{ResourceRequest, ResourceServer, Server};
pub use store::{
    ensure_database_exists, FieldRule, HookStore, MapStore, PgCreate, PgDelete, PgKey, PgList,
    PgOverrides, PgRead, PgStore, PgUpdate, Store, ValidatingStore, ValidationRules,
};
