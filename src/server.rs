//! Per-request operation binder: strategies in, store call, encoded response out.

use crate::context::Context;
use crate::encoding::Encoding;
use crate::error::AppError;
use crate::extractors::{Identifier, Querier};
use crate::store::Store;
use async_trait::async_trait;
use axum::{
    body::Bytes,
    http::{request::Parts, StatusCode},
    response::Response,
};
use std::sync::Arc;

/// An inbound request as the dispatch pipeline sees it.
pub struct ResourceRequest {
    pub ctx: Context,
    pub parts: Parts,
    pub body: Bytes,
}

/// The five CRUD operations over HTTP. Errors are returned to the caller
/// unencoded.
#[async_trait]
pub trait Server: Send + Sync {
    async fn create(&self, req: &ResourceRequest) -> Result<Response, AppError>;
    async fn read(&self, req: &ResourceRequest) -> Result<Response, AppError>;
    async fn update(&self, req: &ResourceRequest) -> Result<Response, AppError>;
    async fn delete(&self, req: &ResourceRequest) -> Result<Response, AppError>;
    async fn list(&self, req: &ResourceRequest) -> Result<Response, AppError>;
}

/// Binds one store to one encoding, identifier and querier.
pub struct ResourceServer<R, Q, P> {
    store: Arc<dyn Store<R, Q, P>>,
    encoding: Arc<dyn Encoding<R>>,
    identifier: Arc<dyn Identifier<P>>,
    querier: Arc<dyn Querier<Q>>,
}

impl<R, Q, P> ResourceServer<R, Q, P>
where
    R: Send + Sync + 'static,
    Q: Send + Sync + 'static,
    P: Send + Sync + 'static,
{
    pub fn new(
        store: Arc<dyn Store<R, Q, P>>,
        encoding: Arc<dyn Encoding<R>>,
        identifier: Arc<dyn Identifier<P>>,
        querier: Arc<dyn Querier<Q>>,
    ) -> Self {
        ResourceServer {
            store,
            encoding,
            identifier,
            querier,
        }
    }
}

#[async_trait]
impl<R, Q, P> Server for ResourceServer<R, Q, P>
where
    R: Send + Sync + 'static,
    Q: Send + Sync + 'static,
    P: Send + Sync + 'static,
{
    async fn create(&self, req: &ResourceRequest) -> Result<Response, AppError> {
        let mut resource = self.encoding.decode(&req.body)?;
        self.store.create(&req.ctx, &mut resource).await?;
        self.encoding.encode(&resource, StatusCode::CREATED)
    }

    async fn read(&self, req: &ResourceRequest) -> Result<Response, AppError> {
        let pkey = self.identifier.pkey(&req.parts)?;
        let query = self.querier.query(&req.parts)?;
        let resource = self.store.read(&req.ctx, &pkey, &query).await?;
        self.encoding.encode(&resource, StatusCode::OK)
    }

    async fn update(&self, req: &ResourceRequest) -> Result<Response, AppError> {
        let pkey = self.identifier.pkey(&req.parts)?;
        let mut resource = self.encoding.decode(&req.body)?;
        self.store.update(&req.ctx, &pkey, &mut resource).await?;
        self.encoding.encode(&resource, StatusCode::OK)
    }

    async fn delete(&self, req: &ResourceRequest) -> Result<Response, AppError> {
        let pkey = self.identifier.pkey(&req.parts)?;
        self.store.delete(&req.ctx, &pkey).await?;
        self.encoding.encode_empty(StatusCode::NO_CONTENT)
    }

    async fn list(&self, req: &ResourceRequest) -> Result<Response, AppError> {
        let query = self.querier.query(&req.parts)?;
        let resources = self.store.list(&req.ctx, &query).await?;
        self.encoding.encode_list(&resources, StatusCode::OK)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoding::Json;
    use crate::extractors::{PathIdentifier, QueryParser};
    use crate::resource::Resource;
    use crate::store::MapStore;
    use axum::http::Request;
    use serde::{Deserialize, Serialize};

    #[derive(Clone, Debug, Default, Serialize, Deserialize)]
    struct Book {
        #[serde(default)]
        id: u64,
        title: String,
    }

    impl Resource<u64> for Book {
        fn pkey(&self) -> u64 {
            self.id
        }

        fn set_pkey(&mut self, pkey: u64) {
            self.id = pkey;
        }
    }

    #[derive(Default, Deserialize)]
    #[serde(default)]
    struct NoFilter {}

    fn server() -> ResourceServer<Book, NoFilter, u64> {
        ResourceServer::new(
            Arc::new(MapStore::<Book, NoFilter, u64>::new()),
            Arc::new(Json::new()),
            Arc::new(PathIdentifier::new()),
            Arc::new(QueryParser::new()),
        )
    }

    fn request(uri: &str, body: &'static str) -> ResourceRequest {
        let (parts, ()) = Request::builder().uri(uri).body(()).unwrap().into_parts();
        ResourceRequest {
            ctx: Context::new(),
            parts,
            body: Bytes::from_static(body.as_bytes()),
        }
    }

    async fn json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), 4096).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn operations_use_conventional_status_codes() {
        let s = server();
        let created = s.create(&request("/", r#"{"title":"Dune"}"#)).await.unwrap();
        assert_eq!(created.status(), StatusCode::CREATED);
        assert_eq!(json(created).await, serde_json::json!({"id": 1, "title": "Dune"}));

        let read = s.read(&request("/1", "")).await.unwrap();
        assert_eq!(read.status(), StatusCode::OK);

        let updated = s.update(&request("/1", r#"{"title":"Emma"}"#)).await.unwrap();
        assert_eq!(updated.status(), StatusCode::OK);
        assert_eq!(json(updated).await["id"], 1);

        let listed = s.list(&request("/", "")).await.unwrap();
        assert_eq!(json(listed).await, serde_json::json!([{"id": 1, "title": "Emma"}]));

        let deleted = s.delete(&request("/1", "")).await.unwrap();
        assert_eq!(deleted.status(), StatusCode::NO_CONTENT);
        assert_eq!(json(deleted).await, serde_json::json!({}));
    }

    #[tokio::test]
    async fn extraction_errors_short_circuit() {
        let s = server();
        let err = s.create(&request("/", "not json")).await.unwrap_err();
        assert!(matches!(err, AppError::Decoding(_)));

        let err = s.update(&request("/abc", r#"{"title":"x"}"#)).await.unwrap_err();
        assert!(matches!(err, AppError::Decoding(_)));

        let err = s.delete(&request("/", "")).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound));
    }

    #[tokio::test]
    async fn store_errors_are_returned_unencoded() {
        let s = server();
        let err = s.read(&request("/9", "")).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound));
        let err = s.update(&request("/9", r#"{"title":"x"}"#)).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound));
    }
}
