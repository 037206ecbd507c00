//! Store decorator that runs resource lifecycle hooks around each operation.

use crate::context::Context;
use crate::error::AppError;
use crate::hooks::Hooks;
use crate::store::Store;
use async_trait::async_trait;

/// Wraps a store and, per call, asks the record (or the zero value when no
/// record is known yet) for Before/After capabilities.
///
/// The sequence is before hook, inner store, after hook. The first error
/// aborts it and is returned unchanged. An after-hook failure is reported even
/// though the inner store has already committed.
pub struct HookStore<S> {
    inner: S,
}

impl<S> HookStore<S> {
    pub fn new(inner: S) -> Self {
        HookStore { inner }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    pub fn into_inner(self) -> S {
        self.inner
    }
}

#[async_trait]
impl<R, Q, P, S> Store<R, Q, P> for HookStore<S>
where
    R: Hooks<Q, P> + Default + Send + Sync + 'static,
    Q: Send + Sync + 'static,
    P: Send + Sync + 'static,
    S: Store<R, Q, P>,
{
    async fn create(&self, ctx: &Context, resource: &mut R) -> Result<(), AppError> {
        if let Some(hook) = resource.as_before_create() {
            hook.before_create(ctx).await?;
        }
        self.inner.create(ctx, resource).await?;
        if let Some(hook) = resource.as_after_create() {
            hook.after_create(ctx).await?;
        }
        Ok(())
    }

    async fn read(&self, ctx: &Context, pkey: &P, query: &Q) -> Result<R, AppError> {
        let mut zero = R::default();
        if let Some(hook) = zero.as_before_read() {
            hook.before_read(ctx, pkey, query).await?;
        }
        let mut resource = self.inner.read(ctx, pkey, query).await?;
        if let Some(hook) = resource.as_after_read() {
            hook.after_read(ctx, pkey, query).await?;
        }
        Ok(resource)
    }

    async fn update(&self, ctx: &Context, pkey: &P, resource: &mut R) -> Result<(), AppError> {
        if let Some(hook) = resource.as_before_update() {
            hook.before_update(ctx, pkey).await?;
        }
        self.inner.update(ctx, pkey, resource).await?;
        if let Some(hook) = resource.as_after_update() {
            hook.after_update(ctx, pkey).await?;
        }
        Ok(())
    }

    async fn delete(&self, ctx: &Context, pkey: &P) -> Result<(), AppError> {
        let mut zero = R::default();
        if let Some(hook) = zero.as_before_delete() {
            hook.before_delete(ctx, pkey).await?;
        }
        self.inner.delete(ctx, pkey).await?;
        if let Some(hook) = zero.as_after_delete() {
            hook.after_delete(ctx, pkey).await?;
        }
        Ok(())
    }

    async fn list(&self, ctx: &Context, query: &Q) -> Result<Vec<R>, AppError> {
        let mut zero = R::default();
        if let Some(hook) = zero.as_before_list() {
            hook.before_list(ctx, query).await?;
        }
        let mut records = self.inner.list(ctx, query).await?;
        if let Some(hook) = zero.as_after_list() {
            hook.after_list(ctx, query, &mut records).await?;
        }
        Ok(records)
    }
}
