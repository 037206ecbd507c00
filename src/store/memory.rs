//! In-memory reference store.

use crate::context::Context;
use crate::error::AppError;
use crate::key::Sequential;
use crate::resource::{Query, Resource};
use crate::store::Store;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::marker::PhantomData;
use std::sync::{Mutex, MutexGuard};

struct MapState<R, P> {
    records: BTreeMap<P, R>,
    next_key: P,
}

/// Map-backed store with sequential key allocation.
///
/// One mutex guards both the records and the key counter and is held for the
/// whole of each operation. Deleting an absent key fails with `NotFound`,
/// like updating one. Lists come back in ascending key order.
pub struct MapStore<R, Q, P> {
    state: Mutex<MapState<R, P>>,
    _query: PhantomData<fn() -> Q>,
}

impl<R, Q, P> MapStore<R, Q, P>
where
    R: Resource<P>,
    Q: Query,
    P: Sequential,
{
    pub fn new() -> Self {
        MapStore {
            state: Mutex::new(MapState {
                records: BTreeMap::new(),
                next_key: P::first(),
            }),
            _query: PhantomData,
        }
    }

    /// Number of stored records. Fails if the lock is poisoned.
    pub fn len(&self) -> Result<usize, AppError> {
        Ok(self.lock()?.records.len())
    }

    pub fn is_empty(&self) -> Result<bool, AppError> {
        Ok(self.len()? == 0)
    }

    fn lock(&self) -> Result<MutexGuard<'_, MapState<R, P>>, AppError> {
        self.state
            .lock()
            .map_err(|_| AppError::backend("map store lock poisoned"))
    }
}

impl<R, Q, P> Default for MapStore<R, Q, P>
where
    R: Resource<P>,
    Q: Query,
    P: Sequential,
{
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<R, Q, P> Store<R, Q, P> for MapStore<R, Q, P>
where
    R: Resource<P>,
    Q: Query,
    P: Sequential,
{
    async fn create(&self, ctx: &Context, resource: &mut R) -> Result<(), AppError> {
        ctx.check()?;
        let mut state = self.lock()?;
        let pkey = state.next_key.clone();
        let next = pkey
            .successor()
            .ok_or_else(|| AppError::backend("key space exhausted"))?;
        state.next_key = next;
        resource.set_pkey(pkey.clone());
        tracing::debug!(pkey = %pkey, "allocated key");
        state.records.insert(pkey, resource.clone());
        Ok(())
    }

    async fn read(&self, ctx: &Context, pkey: &P, _query: &Q) -> Result<R, AppError> {
        ctx.check()?;
        let state = self.lock()?;
        state.records.get(pkey).cloned().ok_or(AppError::NotFound)
    }

    async fn update(&self, ctx: &Context, pkey: &P, resource: &mut R) -> Result<(), AppError> {
        ctx.check()?;
        let mut state = self.lock()?;
        let slot = state.records.get_mut(pkey).ok_or(AppError::NotFound)?;
        resource.set_pkey(pkey.clone());
        *slot = resource.clone();
        Ok(())
    }

    async fn delete(&self, ctx: &Context, pkey: &P) -> Result<(), AppError> {
        ctx.check()?;
        let mut state = self.lock()?;
        state.records.remove(pkey).map(|_| ()).ok_or(AppError::NotFound)
    }

    async fn list(&self, ctx: &Context, _query: &Q) -> Result<Vec<R>, AppError> {
        ctx.check()?;
        let state = self.lock()?;
        Ok(state.records.values().cloned().collect())
    }
}
