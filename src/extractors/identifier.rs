//! Primary key extraction from the request path.

use crate::error::AppError;
use crate::key::PrimaryKey;
use axum::http::request::Parts;
use std::marker::PhantomData;

pub trait Identifier<P>: Send + Sync {
    fn pkey(&self, parts: &Parts) -> Result<P, AppError>;
}

/// Last path segment, percent-decoded, parsed with [`PrimaryKey::parse_key`].
/// `/` and `/users/` carry no key and yield `NotFound`.
pub struct PathIdentifier<P> {
    _key: PhantomData<fn() -> P>,
}

impl<P> PathIdentifier<P> {
    pub fn new() -> Self {
        PathIdentifier { _key: PhantomData }
    }
}

impl<P> Default for PathIdentifier<P> {
    fn default() -> Self {
        Self::new()
    }
}

/// Segment after the final `/`, empty when the path ends with one.
pub fn last_segment(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or("")
}

impl<P: PrimaryKey> Identifier<P> for PathIdentifier<P> {
    fn pkey(&self, parts: &Parts) -> Result<P, AppError> {
        let raw = last_segment(parts.uri.path());
        if raw.is_empty() {
            return Err(AppError::NotFound);
        }
        let segment = urlencoding::decode(raw)
            .map_err(|e| AppError::Decoding(format!("invalid key '{}': {}", raw, e)))?;
        P::parse_key(&segment)
    }
}
