//! Query object extraction from URL parameters.

use crate::error::AppError;
use crate::resource::Query;
use axum::http::request::Parts;
use std::marker::PhantomData;

pub trait Querier<Q>: Send + Sync {
    fn query(&self, parts: &Parts) -> Result<Q, AppError>;
}

/// Decodes the URL query string into `Q` field by field. Fields absent from
/// the request need `#[serde(default)]` on `Q`.
pub struct QueryParser<Q> {
    _query: PhantomData<fn() -> Q>,
}

impl<Q> QueryParser<Q> {
    pub fn new() -> Self {
        QueryParser { _query: PhantomData }
    }
}

impl<Q> Default for QueryParser<Q> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Q: Query> Querier<Q> for QueryParser<Q> {
    fn query(&self, parts: &Parts) -> Result<Q, AppError> {
        axum::extract::Query::<Q>::try_from_uri(&parts.uri)
            .map(|axum::extract::Query(q)| q)
            .map_err(|rejection| AppError::Decoding(rejection.body_text()))
    }
}
