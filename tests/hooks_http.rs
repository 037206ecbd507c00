mod common;

use async_trait::async_trait;
use axum::http::{Method, StatusCode};
use axum::Router;
use common::{init_tracing, send, send_json};
use ghost::{
    AfterList, AfterRead, AppError, BeforeCreate, BeforeDelete, Context, Ghost, Hooks, MapStore,
    Resource,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
struct Task {
    #[serde(default)]
    id: u64,
    title: String,
    #[serde(default)]
    done: bool,
    /// Filled in on the way out, never stored.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    summary: Option<String>,
}

impl Resource<u64> for Task {
    fn pkey(&self) -> u64 {
        self.id
    }

    fn set_pkey(&mut self, pkey: u64) {
        self.id = pkey;
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct TaskQuery {
    done: Option<bool>,
    verbose: bool,
}

#[async_trait]
impl BeforeCreate for Task {
    async fn before_create(&mut self, _ctx: &Context) -> Result<(), AppError> {
        if self.title.trim().is_empty() {
            return Err(AppError::status(
                StatusCode::UNPROCESSABLE_ENTITY,
                "title must not be blank",
            ));
        }
        self.title = self.title.trim().to_string();
        Ok(())
    }
}

#[async_trait]
impl AfterRead<TaskQuery, u64> for Task {
    async fn after_read(
        &mut self,
        _ctx: &Context,
        pkey: &u64,
        query: &TaskQuery,
    ) -> Result<(), AppError> {
        if query.verbose {
            self.summary = Some(format!("#{} {}", pkey, self.title));
        }
        Ok(())
    }
}

#[async_trait]
impl BeforeDelete<u64> for Task {
    async fn before_delete(&mut self, _ctx: &Context, pkey: &u64) -> Result<(), AppError> {
        if *pkey == 1 {
            return Err(AppError::status(StatusCode::FORBIDDEN, "task 1 is pinned"));
        }
        Ok(())
    }
}

#[async_trait]
impl AfterList<TaskQuery, Task> for Task {
    async fn after_list(
        &mut self,
        _ctx: &Context,
        query: &TaskQuery,
        records: &mut Vec<Task>,
    ) -> Result<(), AppError> {
        if let Some(done) = query.done {
            records.retain(|t| t.done == done);
        }
        Ok(())
    }
}

impl Hooks<TaskQuery, u64> for Task {
    fn as_before_create(&mut self) -> Option<&mut dyn BeforeCreate> {
        Some(self)
    }

    fn as_after_read(&mut self) -> Option<&mut dyn AfterRead<TaskQuery, u64>> {
        Some(self)
    }

    fn as_before_delete(&mut self) -> Option<&mut dyn BeforeDelete<u64>> {
        Some(self)
    }

    fn as_after_list(&mut self) -> Option<&mut dyn AfterList<TaskQuery, Task>> {
        Some(self)
    }
}

fn tasks() -> Router {
    init_tracing();
    Ghost::new::<Task, TaskQuery, u64>(MapStore::new()).into_router()
}

#[tokio::test]
async fn before_create_rewrites_and_rejects() {
    let app = tasks();

    let created = json!({"title": "  ship it "});
    let (status, body) = send_json(&app, Method::POST, "/", Some(created)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["title"], "ship it");

    let (status, body) = send(&app, Method::POST, "/", Some(json!({"title": "   "}))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body, r#"{"error":"title must not be blank"}"#);

    // the rejected record never reached the store
    let (_, body) = send_json(&app, Method::GET, "/", None).await;
    assert_eq!(body.as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn after_read_sees_key_and_query() {
    let app = tasks();
    send(&app, Method::POST, "/", Some(json!({"title": "write docs"}))).await;

    let (_, plain) = send_json(&app, Method::GET, "/1", None).await;
    assert!(plain.get("summary").is_none());

    let (status, verbose) = send_json(&app, Method::GET, "/1?verbose=true", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(verbose["summary"], "#1 write docs");
}

#[tokio::test]
async fn before_delete_can_veto() {
    let app = tasks();
    send(&app, Method::POST, "/", Some(json!({"title": "pinned"}))).await;
    send(&app, Method::POST, "/", Some(json!({"title": "scratch"}))).await;

    let (status, body) = send(&app, Method::DELETE, "/1", None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body, r#"{"error":"task 1 is pinned"}"#);
    let (status, _) = send(&app, Method::GET, "/1", None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(&app, Method::DELETE, "/2", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = send(&app, Method::GET, "/2", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn after_list_filters_by_query() {
    let app = tasks();
    send(&app, Method::POST, "/", Some(json!({"title": "a", "done": true}))).await;
    send(&app, Method::POST, "/", Some(json!({"title": "b"}))).await;
    send(&app, Method::POST, "/", Some(json!({"title": "c", "done": true}))).await;

    let (_, all) = send_json(&app, Method::GET, "/", None).await;
    assert_eq!(all.as_array().map(Vec::len), Some(3));

    let (status, done) = send_json(&app, Method::GET, "/?done=true", None).await;
    assert_eq!(status, StatusCode::OK);
    let titles: Vec<&str> = done
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, vec!["a", "c"]);

    let (status, _) = send(&app, Method::GET, "/?done=maybe", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
