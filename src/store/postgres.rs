//! PostgreSQL store keeping each record as a JSONB document.

use crate::context::Context;
use crate::error::AppError;
use crate::key::PrimaryKey;
use crate::resource::{Query, Resource};
use crate::sql::{DocumentTable, IdColumn};
use crate::store::Store;
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use sqlx::postgres::{PgPool, PgRow, Postgres};
use sqlx::{ConnectOptions, Row};
use std::marker::PhantomData;
use std::str::FromStr;

/// Key types that map onto the document table's `id` column.
pub trait PgKey:
    PrimaryKey
    + sqlx::Type<Postgres>
    + for<'q> sqlx::Encode<'q, Postgres>
    + for<'r> sqlx::Decode<'r, Postgres>
{
    const ID_COLUMN: IdColumn;
}

impl PgKey for i32 {
    const ID_COLUMN: IdColumn = IdColumn::Serial;
}

impl PgKey for i64 {
    const ID_COLUMN: IdColumn = IdColumn::BigSerial;
}

impl PgKey for String {
    const ID_COLUMN: IdColumn = IdColumn::SequencedText;
}

/// Replaces the generic INSERT. Runs on the in-flight record and must set its key.
#[async_trait]
pub trait PgCreate: Send {
    async fn pg_create(&mut self, ctx: &Context, pool: &PgPool) -> Result<(), AppError>;
}

/// Replaces the generic SELECT by id. Runs on the zero value and fills it in;
/// `NotFound` when nothing matches.
#[async_trait]
pub trait PgRead<Q: Sync, P: Sync>: Send {
    async fn pg_read(
        &mut self,
        ctx: &Context,
        pool: &PgPool,
        pkey: &P,
        query: &Q,
    ) -> Result<(), AppError>;
}

/// Replaces the generic UPDATE. Runs on the in-flight record, already keyed.
#[async_trait]
pub trait PgUpdate<P: Sync>: Send {
    async fn pg_update(
        &mut self,
        ctx: &Context,
        pool: &PgPool,
        pkey: &P,
    ) -> Result<(), AppError>;
}

/// Replaces the generic DELETE. Runs on the zero value.
#[async_trait]
pub trait PgDelete<P: Sync>: Send {
    async fn pg_delete(
        &mut self,
        ctx: &Context,
        pool: &PgPool,
        pkey: &P,
    ) -> Result<(), AppError>;
}

/// Replaces the generic list query. Runs on the zero value.
#[async_trait]
pub trait PgList<Q: Sync, R: Send>: Send {
    async fn pg_list(
        &mut self,
        ctx: &Context,
        pool: &PgPool,
        query: &Q,
    ) -> Result<Vec<R>, AppError>;
}

/// Per-operation SQL overrides for records kept in a [`PgStore`].
///
/// Accessors default to `None`, which keeps the generic document SQL, so
/// `impl PgOverrides<Q, P> for MyRecord {}` overrides nothing. The store asks
/// on every call, the same way [`crate::hooks::Hooks`] is queried.
pub trait PgOverrides<Q: Sync, P: Sync>: Sized + Send {
    fn as_pg_create(&mut self) -> Option<&mut dyn PgCreate> {
        None
    }

    fn as_pg_read(&mut self) -> Option<&mut dyn PgRead<Q, P>> {
        None
    }

    fn as_pg_update(&mut self) -> Option<&mut dyn PgUpdate<P>> {
        None
    }

    fn as_pg_delete(&mut self) -> Option<&mut dyn PgDelete<P>> {
        None
    }

    fn as_pg_list(&mut self) -> Option<&mut dyn PgList<Q, Self>> {
        None
    }
}

/// Store over `<schema>.<table>`. The `id` column is authoritative: it is
/// written into each record read back. Lists filter by JSON containment of the
/// query's non-empty fields and come back in `id` order. Updating or deleting
/// a missing id fails with `NotFound`. A record type can take over any single
/// operation through [`PgOverrides`]; the override gets the pool and decides
/// its own SQL.
pub struct PgStore<R, Q, P> {
    pool: PgPool,
    table: DocumentTable,
    _marker: PhantomData<fn() -> (R, Q, P)>,
}

impl<R, Q, P> PgStore<R, Q, P>
where
    R: Resource<P> + PgOverrides<Q, P>,
    Q: Query + Serialize,
    P: PgKey,
{
    pub fn new(pool: PgPool, schema: impl Into<String>, table: impl Into<String>) -> Self {
        PgStore {
            pool,
            table: DocumentTable::new(schema, table),
            _marker: PhantomData,
        }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Create the schema, table (and sequence for text ids) if missing.
    pub async fn ensure_table(&self) -> Result<(), AppError> {
        for ddl in self.table.create_statements(P::ID_COLUMN) {
            tracing::debug!(sql = %ddl, "ddl");
            sqlx::query(&ddl).execute(&self.pool).await?;
        }
        Ok(())
    }

    fn decode_row(row: &PgRow) -> Result<R, AppError> {
        let pkey: P = row.try_get("id")?;
        let doc: Value = row.try_get("doc")?;
        let mut resource: R = serde_json::from_value(doc)?;
        resource.set_pkey(pkey);
        Ok(resource)
    }
}

/// Containment filter from the query's set fields: nulls, empty strings and
/// empty arrays/objects are dropped. `None` when nothing is left.
fn containment_filter<Q: Serialize>(query: &Q) -> Result<Option<Value>, AppError> {
    let fields = match serde_json::to_value(query)? {
        Value::Object(m) => m,
        _ => return Ok(None),
    };
    let set: serde_json::Map<String, Value> = fields
        .into_iter()
        .filter(|(_, v)| match v {
            Value::Null => false,
            Value::String(s) => !s.is_empty(),
            Value::Array(a) => !a.is_empty(),
            Value::Object(o) => !o.is_empty(),
            _ => true,
        })
        .collect();
    if set.is_empty() {
        Ok(None)
    } else {
        Ok(Some(Value::Object(set)))
    }
}

#[async_trait]
impl<R, Q, P> Store<R, Q, P> for PgStore<R, Q, P>
where
    R: Resource<P> + PgOverrides<Q, P>,
    Q: Query + Serialize,
    P: PgKey,
{
    async fn create(&self, ctx: &Context, resource: &mut R) -> Result<(), AppError> {
        ctx.check()?;
        if let Some(custom) = resource.as_pg_create() {
            tracing::debug!("create overridden");
            return custom.pg_create(ctx, &self.pool).await;
        }
        let doc = serde_json::to_value(&*resource)?;
        let sql = self.table.insert();
        tracing::debug!(sql = %sql, "query");
        let row = sqlx::query(&sql).bind(doc).fetch_one(&self.pool).await?;
        let pkey: P = row.try_get("id")?;
        resource.set_pkey(pkey);
        Ok(())
    }

    async fn read(&self, ctx: &Context, pkey: &P, query: &Q) -> Result<R, AppError> {
        ctx.check()?;
        let mut zero = R::default();
        if let Some(custom) = zero.as_pg_read() {
            tracing::debug!(pkey = %pkey, "read overridden");
            custom.pg_read(ctx, &self.pool, pkey, query).await?;
            zero.set_pkey(pkey.clone());
            return Ok(zero);
        }
        let sql = self.table.select_by_id();
        tracing::debug!(sql = %sql, pkey = %pkey, "query");
        let row = sqlx::query(&sql)
            .bind(pkey.clone())
            .fetch_optional(&self.pool)
            .await?
            .ok_or(AppError::NotFound)?;
        Self::decode_row(&row)
    }

    async fn update(&self, ctx: &Context, pkey: &P, resource: &mut R) -> Result<(), AppError> {
        ctx.check()?;
        resource.set_pkey(pkey.clone());
        if let Some(custom) = resource.as_pg_update() {
            tracing::debug!(pkey = %pkey, "update overridden");
            return custom.pg_update(ctx, &self.pool, pkey).await;
        }
        let doc = serde_json::to_value(&*resource)?;
        let sql = self.table.update();
        tracing::debug!(sql = %sql, pkey = %pkey, "query");
        sqlx::query(&sql)
            .bind(doc)
            .bind(pkey.clone())
            .fetch_optional(&self.pool)
            .await?
            .ok_or(AppError::NotFound)?;
        Ok(())
    }

    async fn delete(&self, ctx: &Context, pkey: &P) -> Result<(), AppError> {
        ctx.check()?;
        let mut zero = R::default();
        if let Some(custom) = zero.as_pg_delete() {
            tracing::debug!(pkey = %pkey, "delete overridden");
            return custom.pg_delete(ctx, &self.pool, pkey).await;
        }
        let sql = self.table.delete();
        tracing::debug!(sql = %sql, pkey = %pkey, "query");
        sqlx::query(&sql)
            .bind(pkey.clone())
            .fetch_optional(&self.pool)
            .await?
            .ok_or(AppError::NotFound)?;
        Ok(())
    }

    async fn list(&self, ctx: &Context, query: &Q) -> Result<Vec<R>, AppError> {
        ctx.check()?;
        let mut zero = R::default();
        if let Some(custom) = zero.as_pg_list() {
            tracing::debug!("list overridden");
            return custom.pg_list(ctx, &self.pool, query).await;
        }
        let filter = containment_filter(query)?;
        let sql = self.table.select_list(filter.is_some());
        tracing::debug!(sql = %sql, filter = ?filter, "query");
        let mut q = sqlx::query(&sql);
        if let Some(filter) = filter {
            q = q.bind(filter);
        }
        let rows = q.fetch_all(&self.pool).await?;
        rows.iter().map(Self::decode_row).collect()
    }
}

/// Ensure the database in `database_url` exists; create it if not. Connects to the
/// default `postgres` database to run CREATE DATABASE. Call before creating the main pool.
pub async fn ensure_database_exists(database_url: &str) -> Result<(), AppError> {
    let (admin_url, db_name) = parse_db_name_from_url(database_url)?;
    if db_name.is_empty() || db_name == "postgres" {
        return Ok(());
    }
    let opts = sqlx::postgres::PgConnectOptions::from_str(&admin_url)
        .map_err(|e| AppError::Decoding(format!("invalid DATABASE_URL: {}", e)))?;
    let mut conn: sqlx::PgConnection = opts.connect().await?;
    let exists: (bool,) =
        sqlx::query_as("SELECT EXISTS(SELECT 1 FROM pg_database WHERE datname = $1)")
            .bind(&db_name)
            .fetch_one(&mut conn)
            .await?;
    if !exists.0 {
        tracing::info!(database = %db_name, "creating database");
        sqlx::query(&format!("CREATE DATABASE {}", quote_ident(&db_name)))
            .execute(&mut conn)
            .await?;
    }
    Ok(())
}

fn parse_db_name_from_url(url: &str) -> Result<(String, String), AppError> {
    let path_start = url
        .rfind('/')
        .ok_or_else(|| AppError::Decoding("DATABASE_URL: no path".into()))?
        + 1;
    let path_and_query = url.get(path_start..).unwrap_or("");
    let db_name = path_and_query.split('?').next().unwrap_or("").trim();
    let base = url.get(..path_start).unwrap_or(url);
    Ok((format!("{}postgres", base), db_name.to_string()))
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
