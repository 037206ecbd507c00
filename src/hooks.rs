//! Optional lifecycle hooks a resource type can opt into.
//!
//! Each phase is its own capability trait. A resource advertises the ones it
//! implements by overriding the matching accessor on [`Hooks`]; every accessor
//! defaults to `None`, so `impl Hooks<Q, P> for MyRecord {}` opts out of all
//! of them. [`crate::store::HookStore`] queries the accessors on every call.
//!
//! ```ignore
//! #[async_trait]
//! impl BeforeCreate for User {
//!     async fn before_create(&mut self, _ctx: &Context) -> Result<(), AppError> {
//!         self.name = self.name.trim().to_string();
//!         Ok(())
//!     }
//! }
//!
//! impl Hooks<SearchQuery, u64> for User {
//!     fn as_before_create(&mut self) -> Option<&mut dyn BeforeCreate> {
//!         Some(self)
//!     }
//! }
//! ```

use crate::context::Context;
use crate::error::AppError;
use async_trait::async_trait;

#[async_trait]
pub trait BeforeCreate: Send {
    async fn before_create(&mut self, ctx: &Context) -> Result<(), AppError>;
}

#[async_trait]
pub trait AfterCreate: Send {
    async fn after_create(&mut self, ctx: &Context) -> Result<(), AppError>;
}

/// Runs on the zero value before the store is asked for `pkey`.
#[async_trait]
pub trait BeforeRead<Q: Sync, P: Sync>: Send {
    async fn before_read(&mut self, ctx: &Context, pkey: &P, query: &Q) -> Result<(), AppError>;
}

/// Runs on the record returned by the store.
#[async_trait]
pub trait AfterRead<Q: Sync, P: Sync>: Send {
    async fn after_read(&mut self, ctx: &Context, pkey: &P, query: &Q) -> Result<(), AppError>;
}

#[async_trait]
pub trait BeforeUpdate<P: Sync>: Send {
    async fn before_update(&mut self, ctx: &Context, pkey: &P) -> Result<(), AppError>;
}

#[async_trait]
pub trait AfterUpdate<P: Sync>: Send {
    async fn after_update(&mut self, ctx: &Context, pkey: &P) -> Result<(), AppError>;
}

/// Runs on the zero value.
#[async_trait]
pub trait BeforeDelete<P: Sync>: Send {
    async fn before_delete(&mut self, ctx: &Context, pkey: &P) -> Result<(), AppError>;
}

/// Runs on the zero value.
#[async_trait]
pub trait AfterDelete<P: Sync>: Send {
    async fn after_delete(&mut self, ctx: &Context, pkey: &P) -> Result<(), AppError>;
}

/// Runs on the zero value.
#[async_trait]
pub trait BeforeList<Q: Sync>: Send {
    async fn before_list(&mut self, ctx: &Context, query: &Q) -> Result<(), AppError>;
}

/// Runs on the zero value with the listed records, which it may rewrite.
#[async_trait]
pub trait AfterList<Q: Sync, R: Send>: Send {
    async fn after_list(
        &mut self,
        ctx: &Context,
        query: &Q,
        records: &mut Vec<R>,
    ) -> Result<(), AppError>;
}

/// Capability queries for one resource type bound to query `Q` and key `P`.
pub trait Hooks<Q: Sync, P: Sync>: Sized + Send {
    fn as_before_create(&mut self) -> Option<&mut dyn BeforeCreate> {
        None
    }

    fn as_after_create(&mut self) -> Option<&mut dyn AfterCreate> {
        None
    }

    fn as_before_read(&mut self) -> Option<&mut dyn BeforeRead<Q, P>> {
        None
    }

    fn as_after_read(&mut self) -> Option<&mut dyn AfterRead<Q, P>> {
        None
    }

    fn as_before_update(&mut self) -> Option<&mut dyn BeforeUpdate<P>> {
        None
    }

    fn as_after_update(&mut self) -> Option<&mut dyn AfterUpdate<P>> {
        None
    }

    fn as_before_delete(&mut self) -> Option<&mut dyn BeforeDelete<P>> {
        None
    }

    fn as_after_delete(&mut self) -> Option<&mut dyn AfterDelete<P>> {
        None
    }

    fn as_before_list(&mut self) -> Option<&mut dyn BeforeList<Q>> {
        None
    }

    fn as_after_list(&mut self) -> Option<&mut dyn AfterList<Q, Self>> {
        None
    }
}
