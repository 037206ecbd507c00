//! Wiring: one resource server behind a mux, an error handler and the
//! per-request context policy, exposed as an axum `Router`.

use crate::config::{ServerConfig, DEFAULT_BODY_LIMIT};
use crate::context::Context;
use crate::encoding::Json;
use crate::error::{default_error_handler, AppError, ErrorHandler};
use crate::extractors::{PathIdentifier, QueryParser};
use crate::hooks::Hooks;
use crate::key::PrimaryKey;
use crate::resource::{Query, Resource};
use crate::routes::mux::{default_mux, Mux, Operation};
use crate::server::{ResourceRequest, ResourceServer, Server};
use crate::store::{HookStore, Store};
use axum::{
    body::Body,
    extract::{Request, State},
    http::StatusCode,
    response::Response,
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::Instrument;

/// CRUD endpoints for one resource type.
///
/// ```ignore
/// let users = Ghost::new::<User, UserQuery, u64>(MapStore::new());
/// let app = Router::new().nest_service("/users", users.into_router());
/// ```
#[derive(Clone)]
pub struct Ghost {
    server: Arc<dyn Server>,
    mux: Mux,
    error_handler: ErrorHandler,
    request_timeout: Option<Duration>,
    body_limit: usize,
}

impl Ghost {
    /// Wraps `store` in a [`HookStore`] and serves it as JSON, keyed by the
    /// last path segment and filtered by the URL query string.
    pub fn new<R, Q, P>(store: impl Store<R, Q, P> + 'static) -> Self
    where
        R: Resource<P> + Hooks<Q, P>,
        Q: Query,
        P: PrimaryKey,
    {
        let store: Arc<dyn Store<R, Q, P>> = Arc::new(HookStore::new(store));
        Self::from_server(ResourceServer::new(
            store,
            Arc::new(Json::<R>::new()),
            Arc::new(PathIdentifier::<P>::new()),
            Arc::new(QueryParser::<Q>::new()),
        ))
    }

    /// Uses a server built with custom strategies as is.
    pub fn from_server(server: impl Server + 'static) -> Self {
        Ghost {
            server: Arc::new(server),
            mux: default_mux,
            error_handler: default_error_handler(),
            request_timeout: None,
            body_limit: DEFAULT_BODY_LIMIT,
        }
    }

    pub fn with_mux(mut self, mux: Mux) -> Self {
        self.mux = mux;
        self
    }

    pub fn with_error_handler(
        mut self,
        handler: impl Fn(AppError) -> Response + Send + Sync + 'static,
    ) -> Self {
        self.error_handler = Arc::new(handler);
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    pub fn with_body_limit(mut self, limit: usize) -> Self {
        self.body_limit = limit;
        self
    }

    /// Applies the request timeout and body limit from `config`.
    pub fn with_config(mut self, config: &ServerConfig) -> Self {
        self.request_timeout = config.request_timeout;
        self.body_limit = config.body_limit;
        self
    }

    /// Serves every path and method through [`Ghost::handle`].
    pub fn into_router(self) -> Router {
        Router::new().fallback(serve).with_state(self)
    }

    pub async fn handle(&self, request: Request<Body>) -> Response {
        let ctx = match self.request_timeout {
            Some(timeout) => Context::with_timeout(timeout),
            None => Context::new(),
        };
        let span = tracing::info_span!(
            "request",
            request_id = %ctx.request_id(),
            method = %request.method(),
            path = %request.uri().path(),
        );
        async move {
            match self.dispatch(ctx, request).await {
                Ok(response) => {
                    tracing::debug!(status = response.status().as_u16(), "request completed");
                    response
                }
                Err(err) => (self.error_handler)(err),
            }
        }
        .instrument(span)
        .await
    }

    async fn dispatch(&self, ctx: Context, request: Request<Body>) -> Result<Response, AppError> {
        let operation = (self.mux)(request.method(), request.uri())?;
        tracing::debug!(%operation, "dispatching");

        let (parts, body) = request.into_parts();
        let body = axum::body::to_bytes(body, self.body_limit).await.map_err(|e| {
            AppError::status(
                StatusCode::PAYLOAD_TOO_LARGE,
                format!("request body rejected: {}", e),
            )
        })?;
        let req = ResourceRequest { ctx, parts, body };

        let call = async {
            match operation {
                Operation::Create => self.server.create(&req).await,
                Operation::Read => self.server.read(&req).await,
                Operation::Update => self.server.update(&req).await,
                Operation::Delete => self.server.delete(&req).await,
                Operation::List => self.server.list(&req).await,
            }
        };

        match req.ctx.deadline() {
            Some(deadline) => match tokio::time::timeout_at(deadline, call).await {
                Ok(result) => result,
                Err(_) => {
                    req.ctx.cancel();
                    Err(AppError::DeadlineExceeded)
                }
            },
            None => call.await,
        }
    }
}

async fn serve(State(ghost): State<Ghost>, request: Request<Body>) -> Response {
    ghost.handle(request).await
}
