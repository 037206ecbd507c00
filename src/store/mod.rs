//! Store contract and its implementations.
//!
//! Decorators ([`HookStore`], [`ValidatingStore`]) implement [`Store`] over an
//! inner store, so they chain in any order.

pub mod hook;
pub mod memory;
pub mod postgres;
pub mod validating;

pub use hook::HookStore;
pub use memory::MapStore;
pub use postgres::{
    ensure_database_exists, PgCreate, PgDelete, PgKey, PgList, PgOverrides, PgRead, PgStore,
    PgUpdate,
};
pub use validating::{FieldRule, ValidatingStore, ValidationRules};

use crate::context::Context;
use crate::error::AppError;
use async_trait::async_trait;
use std::sync::Arc;

/// CRUD backend for one resource type `R`, query type `Q` and key type `P`.
///
/// Implementations are shared across concurrent requests and must make their
/// own state mutation safe.
#[async_trait]
pub trait Store<R, Q, P>: Send + Sync
where
    R: Send + Sync + 'static,
    Q: Send + Sync + 'static,
    P: Send + Sync + 'static,
{
    /// Persist a new record, writing any allocated key back into `resource`.
    async fn create(&self, ctx: &Context, resource: &mut R) -> Result<(), AppError>;

    /// Fetch by key. `AppError::NotFound` when nothing matches.
    async fn read(&self, ctx: &Context, pkey: &P, query: &Q) -> Result<R, AppError>;

    /// Overwrite an existing record. `AppError::NotFound` when `pkey` is absent.
    async fn update(&self, ctx: &Context, pkey: &P, resource: &mut R) -> Result<(), AppError>;

    /// Remove by key. `AppError::NotFound` when `pkey` is absent.
    async fn delete(&self, ctx: &Context, pkey: &P) -> Result<(), AppError>;

    /// All records matching `query`; an empty result is not an error.
    async fn list(&self, ctx: &Context, query: &Q) -> Result<Vec<R>, AppError>;
}

#[async_trait]
impl<R, Q, P, S> Store<R, Q, P> for Arc<S>
where
    R: Send + Sync + 'static,
    Q: Send + Sync + 'static,
    P: Send + Sync + 'static,
    S: Store<R, Q, P> + ?Sized,
{
    async fn create(&self, ctx: &Context, resource: &mut R) -> Result<(), AppError> {
        (**self).create(ctx, resource).await
    }

    async fn read(&self, ctx: &Context, pkey: &P, query: &Q) -> Result<R, AppError> {
        (**self).read(ctx, pkey, query).await
    }

    async fn update(&self, ctx: &Context, pkey: &P, resource: &mut R) -> Result<(), AppError> {
        (**self).update(ctx, pkey, resource).await
    }

    async fn delete(&self, ctx: &Context, pkey: &P) -> Result<(), AppError> {
        (**self).delete(ctx, pkey).await
    }

    async fn list(&self, ctx: &Context, query: &Q) -> Result<Vec<R>, AppError> {
        (**self).list(ctx, query).await
    }
}

#[async_trait]
impl<R, Q, P, S> Store<R, Q, P> for Box<S>
where
    R: Send + Sync + 'static,
    Q: Send + Sync + 'static,
    P: Send + Sync + 'static,
    S: Store<R, Q, P> + ?Sized,
{
    async fn create(&self, ctx: &Context, resource: &mut R) -> Result<(), AppError> {
        (**self).create(ctx, resource).await
    }

    async fn read(&self, ctx: &Context, pkey: &P, query: &Q) -> Result<R, AppError> {
        (**self).read(ctx, pkey, query).await
    }

    async fn update(&self, ctx: &Context, pkey: &P, resource: &mut R) -> Result<(), AppError> {
        (**self).update(ctx, pkey, resource).await
    }

    async fn delete(&self, ctx: &Context, pkey: &P) -> Result<(), AppError> {
        (**self).delete(ctx, pkey).await
    }

    async fn list(&self, ctx: &Context, query: &Q) -> Result<Vec<R>, AppError> {
        (**self).list(ctx, query).await
    }
}
