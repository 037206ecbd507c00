//! Wire encoding of resources: one record, a list, an empty body, and the
//! request body decoder.

use crate::error::AppError;
use axum::{
    body::{Body, Bytes},
    http::{header, HeaderValue, StatusCode},
    response::Response,
};
use serde::{de::DeserializeOwned, Serialize};
use std::marker::PhantomData;

pub trait Encoding<R>: Send + Sync {
    fn encode(&self, resource: &R, status: StatusCode) -> Result<Response, AppError>;
    fn encode_list(&self, resources: &[R], status: StatusCode) -> Result<Response, AppError>;
    fn encode_empty(&self, status: StatusCode) -> Result<Response, AppError>;
    fn decode(&self, body: &Bytes) -> Result<R, AppError>;
}

/// JSON with `Content-Type: application/json`. The empty body is `{}`.
pub struct Json<R> {
    _resource: PhantomData<fn() -> R>,
}

impl<R> Json<R> {
    pub fn new() -> Self {
        Json {
            _resource: PhantomData,
        }
    }
}

impl<R> Default for Json<R> {
    fn default() -> Self {
        Self::new()
    }
}

fn json_response(status: StatusCode, bytes: Vec<u8>) -> Response {
    let mut response = Response::new(Body::from(bytes));
    *response.status_mut() = status;
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );
    response
}

impl<R> Encoding<R> for Json<R>
where
    R: Serialize + DeserializeOwned,
{
    fn encode(&self, resource: &R, status: StatusCode) -> Result<Response, AppError> {
        Ok(json_response(status, serde_json::to_vec(resource)?))
    }

    fn encode_list(&self, resources: &[R], status: StatusCode) -> Result<Response, AppError> {
        Ok(json_response(status, serde_json::to_vec(resources)?))
    }

    fn encode_empty(&self, status: StatusCode) -> Result<Response, AppError> {
        Ok(json_response(status, b"{}".to_vec()))
    }

    fn decode(&self, body: &Bytes) -> Result<R, AppError> {
        serde_json::from_slice(body)
            .map_err(|e| AppError::Decoding(format!("invalid request body: {}", e)))
    }
}
