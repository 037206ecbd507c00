//! Resource and query contracts.

use crate::key::PrimaryKey;
use serde::{de::DeserializeOwned, Serialize};

/// A record type exposed over HTTP.
///
/// `Default` provides the zero value hooks run on when no record is known yet
/// (read, delete, list). `set_pkey` lets a store hand an allocated key back
/// through the same value.
pub trait Resource<P: PrimaryKey>:
    Serialize + DeserializeOwned + Default + Clone + Send + Sync + 'static
{
    fn pkey(&self) -> P;
    fn set_pkey(&mut self, pkey: P);
}

/// Opaque filter object decoded from request parameters.
pub trait Query: DeserializeOwned + Send + Sync + 'static {}

impl<T> Query for T where T: DeserializeOwned + Send + Sync + 'static {}
