//! Example consumer: a separate Rust project that uses ghost as a dependency.
//!
//! Run from repo root: `cargo run -p example-consumer`
//! Records live in memory unless `DATABASE_URL` is set, in which case they are
//! kept in `<GHOST_SCHEMA>.users`.

use async_trait::async_trait;
use axum::Router;
use ghost::{
    common_routes, common_routes_with_ready, ensure_database_exists, AppError, BeforeCreate,
    BeforeUpdate, Context, FieldRule, Ghost, Hooks, MapStore, PgOverrides, PgStore, Resource,
    ServerConfig, ValidatingStore, ValidationRules,
};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
struct User {
    #[serde(default)]
    id: i64,
    name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    email: Option<String>,
}

impl Resource<i64> for User {
    fn pkey(&self) -> i64 {
        self.id
    }

    fn set_pkey(&mut self, pkey: i64) {
        self.id = pkey;
    }
}

/// `GET /users?name=ann`
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct UserQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
}

impl User {
    fn normalize(&mut self) {
        self.name = self.name.trim().to_string();
        if let Some(email) = self.email.as_mut() {
            *email = email.trim().to_lowercase();
        }
    }
}

#[async_trait]
impl BeforeCreate for User {
    async fn before_create(&mut self, _ctx: &Context) -> Result<(), AppError> {
        self.normalize();
        Ok(())
    }
}

#[async_trait]
impl BeforeUpdate<i64> for User {
    async fn before_update(&mut self, _ctx: &Context, _pkey: &i64) -> Result<(), AppError> {
        self.normalize();
        Ok(())
    }
}

impl Hooks<UserQuery, i64> for User {
    fn as_before_create(&mut self) -> Option<&mut dyn BeforeCreate> {
        Some(self)
    }

    fn as_before_update(&mut self) -> Option<&mut dyn BeforeUpdate<i64>> {
        Some(self)
    }
}

impl PgOverrides<UserQuery, i64> for User {}

fn user_rules() -> ValidationRules {
    ValidationRules::new()
        .field("name", FieldRule::required().length(Some(1), Some(100)))
        .field("email", FieldRule::default().format("email"))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                tracing_subscriber::EnvFilter::new("ghost=info,example_consumer=info")
            }),
        )
        .init();
    let config = ServerConfig::load()?;

    let (users, common) = match config.database_url.as_deref() {
        Some(database_url) => {
            ensure_database_exists(database_url).await?;
            let pool = sqlx::postgres::PgPoolOptions::new()
                .max_connections(5)
                .connect(database_url)
                .await?;
            let store = PgStore::<User, UserQuery, i64>::new(pool.clone(), &config.schema, "users");
            store.ensure_table().await?;
            tracing::info!(schema = %config.schema, "storing users in postgres");
            let store = ValidatingStore::new(store, user_rules(), ValidationRules::new())
                .with_names("User", "UserQuery");
            (
                Ghost::new::<User, UserQuery, i64>(store),
                common_routes_with_ready(pool),
            )
        }
        None => {
            tracing::info!("DATABASE_URL not set; storing users in memory");
            let store = ValidatingStore::new(
                MapStore::<User, UserQuery, i64>::new(),
                user_rules(),
                ValidationRules::new(),
            )
            .with_names("User", "UserQuery");
            (Ghost::new::<User, UserQuery, i64>(store), common_routes())
        }
    };

    let app = Router::new()
        .nest_service("/users", users.with_config(&config).into_router())
        .merge(common);

    let listener = TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Example consumer listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}
