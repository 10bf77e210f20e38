//! Database Connection Pool Module
//!
//! PostgreSQL connection pooling using deadpool-postgres, plus the
//! PostgreSQL implementations of [`StackRepository`] and [`AuditLog`].
//! Every statement is parameterized; filter predicates are assembled from a
//! fixed set of column expressions.

use std::future::Future;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use deadpool_postgres::{Config, ManagerConfig, Pool, RecyclingMethod, Runtime};
use techstacks_core::{
    AuditError, Choice, ChoiceId, EntityIdType, EntityType, HistoryRecord, HistoryId, NewChoice,
    NewHistoryRecord, NewStack, NewTechnology, Stack, StackId, StackOrder,
    StackOrderField, StackQuery, StorageError, TechStacksError, TechStacksResult, Technology,
    TechnologyId, TechnologyRanking, TechnologyTier, UserRanking, ValidationError,
};
use techstacks_storage::{AuditLog, StackRepository};
use tokio_postgres::error::SqlState;
use tokio_postgres::types::{FromSql, ToSql};
use tokio_postgres::{NoTls, Row};

use crate::error::{ApiError, ApiResult};
use crate::telemetry::METRICS;

const INIT_SCHEMA: &str = include_str!("../migrations/0001_init.sql");

const STACK_COLUMNS: &str = "id, name, slug, details, owner_id, is_locked, created, created_by, \
                             last_modified, last_modified_by";
const TECHNOLOGY_COLUMNS: &str = "id, name, slug, tier, details, owner_id, created, created_by";
const CHOICE_COLUMNS: &str =
    "id, technology_stack_id, technology_id, tier, justification, created, created_by";
const HISTORY_COLUMNS: &str =
    "id, technology_stack_id, operation, snapshot, recorded_at, recorded_by";

// ============================================================================
// CONNECTION POOL CONFIGURATION
// ============================================================================

/// Database connection pool configuration.
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// PostgreSQL host
    pub host: String,
    /// PostgreSQL port
    pub port: u16,
    /// Database name
    pub dbname: String,
    /// Database user
    pub user: String,
    /// Database password
    pub password: String,
    /// Maximum pool size
    pub max_size: usize,
    /// Connection timeout
    pub timeout: Duration,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 5432,
            dbname: "techstacks".to_string(),
            user: "postgres".to_string(),
            password: "".to_string(),
            max_size: 16,
            timeout: Duration::from_secs(30),
        }
    }
}

impl DbConfig {
    /// Create a new database configuration from environment variables.
    ///
    /// - `TECHSTACKS_DB_HOST`, `TECHSTACKS_DB_PORT`, `TECHSTACKS_DB_NAME`
    /// - `TECHSTACKS_DB_USER`, `TECHSTACKS_DB_PASSWORD`
    /// - `TECHSTACKS_DB_POOL_SIZE` (default: 16)
    /// - `TECHSTACKS_DB_TIMEOUT` in seconds (default: 30)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            host: std::env::var("TECHSTACKS_DB_HOST").unwrap_or(defaults.host),
            port: std::env::var("TECHSTACKS_DB_PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.port),
            dbname: std::env::var("TECHSTACKS_DB_NAME").unwrap_or(defaults.dbname),
            user: std::env::var("TECHSTACKS_DB_USER").unwrap_or(defaults.user),
            password: std::env::var("TECHSTACKS_DB_PASSWORD").unwrap_or_default(),
            max_size: std::env::var("TECHSTACKS_DB_POOL_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_size),
            timeout: std::env::var("TECHSTACKS_DB_TIMEOUT")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.timeout),
        }
    }

    /// Create a connection pool from this configuration.
    pub fn create_pool(&self) -> ApiResult<Pool> {
        let mut cfg = Config::new();
        cfg.host = Some(self.host.clone());
        cfg.port = Some(self.port);
        cfg.dbname = Some(self.dbname.clone());
        cfg.user = Some(self.user.clone());
        cfg.password = Some(self.password.clone());
        cfg.connect_timeout = Some(self.timeout);

        cfg.manager = Some(ManagerConfig {
            recycling_method: RecyclingMethod::Fast,
        });
        cfg.pool = Some(deadpool_postgres::PoolConfig::new(self.max_size));

        let pool = cfg
            .create_pool(Some(Runtime::Tokio1), NoTls)
            .map_err(|e| ApiError::database_error(format!("Failed to create pool: {}", e)))?;

        Ok(pool)
    }
}

// ============================================================================
// FILTER PARAMETERS
// ============================================================================

/// A bound parameter for a dynamically assembled filter.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlParam {
    String(String),
    Bool(bool),
}

impl SqlParam {
    pub fn as_to_sql(&self) -> &(dyn ToSql + Sync) {
        match self {
            SqlParam::String(v) => v,
            SqlParam::Bool(v) => v,
        }
    }
}

/// Build the WHERE clause for a stack query. Returns `None` when the query
/// has no predicates. Placeholders are numbered from `$1`.
pub fn build_where(query: &StackQuery) -> (Option<String>, Vec<SqlParam>) {
    let mut conditions = Vec::new();
    let mut params = Vec::new();

    let equals_ci = [
        ("name", &query.name),
        ("slug", &query.slug),
        ("owner_id", &query.owner_id),
        ("created_by", &query.created_by),
    ];
    for (column, value) in equals_ci {
        if let Some(value) = value {
            params.push(SqlParam::String(value.clone()));
            conditions.push(format!("lower({}) = lower(${})", column, params.len()));
        }
    }

    if let Some(needle) = &query.name_contains {
        params.push(SqlParam::String(needle.clone()));
        conditions.push(format!("strpos(lower(name), lower(${})) > 0", params.len()));
    }

    if let Some(locked) = query.is_locked {
        params.push(SqlParam::Bool(locked));
        conditions.push(format!("is_locked = ${}", params.len()));
    }

    if conditions.is_empty() {
        (None, params)
    } else {
        (Some(conditions.join(" AND ")), params)
    }
}

/// ORDER BY clause matching [`StackOrder::compare`]: the field, then id in
/// the same direction.
pub fn order_clause(order: &StackOrder) -> String {
    let column = match order.field {
        StackOrderField::Name => "lower(name)",
        other => other.column(),
    };
    let direction = if order.descending { "DESC" } else { "ASC" };
    if order.field == StackOrderField::Id {
        return format!("id {}", direction);
    }
    format!("{} {}, id {}", column, direction, direction)
}

// ============================================================================
// DATABASE CLIENT WRAPPER
// ============================================================================

/// Database client wrapping a connection pool.
#[derive(Clone)]
pub struct DbClient {
    pool: Pool,
}

impl DbClient {
    /// Create a new database client with the given pool.
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }

    /// Create a new database client from configuration.
    pub fn from_config(config: &DbConfig) -> ApiResult<Self> {
        let pool = config.create_pool()?;
        Ok(Self::new(pool))
    }

    /// Get the current pool size for observability.
    pub fn pool_size(&self) -> usize {
        self.pool.status().size
    }

    /// Apply the bundled schema. Idempotent.
    pub async fn migrate(&self) -> ApiResult<()> {
        let conn = self.pool.get().await?;
        conn.batch_execute(INIT_SCHEMA).await?;
        tracing::info!("Database schema applied");
        Ok(())
    }

    async fn conn(&self) -> TechStacksResult<deadpool_postgres::Object> {
        self.pool.get().await.map_err(|e| {
            StorageError::Unavailable {
                reason: format!("Failed to acquire database connection: {}", e),
            }
            .into()
        })
    }
}

impl std::fmt::Debug for DbClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DbClient")
            .field("pool_size", &self.pool_size())
            .finish()
    }
}

/// Run a database operation and record its outcome and latency.
async fn timed<T, F>(operation: &str, entity: EntityType, fut: F) -> TechStacksResult<T>
where
    F: Future<Output = TechStacksResult<T>>,
{
    let started = Instant::now();
    let result = fut.await;
    if let Ok(metrics) = METRICS.as_ref() {
        metrics.record_db_operation(
            operation,
            entity.label(),
            result.is_ok(),
            started.elapsed().as_secs_f64(),
        );
    }
    result
}

/// Map a driver error. Unique violations become validation errors so the API
/// can answer 409.
fn pg_error(err: tokio_postgres::Error) -> TechStacksError {
    if let Some(db) = err.as_db_error() {
        if db.code() == &SqlState::UNIQUE_VIOLATION {
            return ValidationError::ConstraintViolation {
                constraint: db.constraint().unwrap_or("unique").to_string(),
                reason: db.message().to_string(),
            }
            .into();
        }
    }
    StorageError::Backend {
        reason: err.to_string(),
    }
    .into()
}

fn col<'a, T: FromSql<'a>>(row: &'a Row, name: &str) -> TechStacksResult<T> {
    row.try_get(name).map_err(|e| {
        StorageError::Backend {
            reason: format!("column {}: {}", name, e),
        }
        .into()
    })
}

fn tier_col(row: &Row, name: &str) -> TechStacksResult<TechnologyTier> {
    let raw: String = col(row, name)?;
    raw.parse().map_err(|e: techstacks_core::TierParseError| {
        StorageError::Backend {
            reason: e.to_string(),
        }
        .into()
    })
}

fn ids<T: EntityIdType>(values: &[T]) -> Vec<i64> {
    values.iter().map(EntityIdType::as_i64).collect()
}

fn limit_param(limit: usize) -> i64 {
    i64::try_from(limit).unwrap_or(i64::MAX)
}

fn stack_from_row(row: &Row) -> TechStacksResult<Stack> {
    Ok(Stack {
        id: StackId::new(col(row, "id")?),
        name: col(row, "name")?,
        slug: col(row, "slug")?,
        details: col(row, "details")?,
        owner_id: col(row, "owner_id")?,
        is_locked: col(row, "is_locked")?,
        created: col(row, "created")?,
        created_by: col(row, "created_by")?,
        last_modified: col(row, "last_modified")?,
        last_modified_by: col(row, "last_modified_by")?,
    })
}

fn technology_from_row(row: &Row) -> TechStacksResult<Technology> {
    Ok(Technology {
        id: TechnologyId::new(col(row, "id")?),
        name: col(row, "name")?,
        slug: col(row, "slug")?,
        tier: tier_col(row, "tier")?,
        details: col(row, "details")?,
        owner_id: col(row, "owner_id")?,
        created: col(row, "created")?,
        created_by: col(row, "created_by")?,
    })
}

fn choice_from_row(row: &Row) -> TechStacksResult<Choice> {
    Ok(Choice {
        id: ChoiceId::new(col(row, "id")?),
        stack_id: StackId::new(col(row, "technology_stack_id")?),
        technology_id: TechnologyId::new(col(row, "technology_id")?),
        tier: tier_col(row, "tier")?,
        justification: col(row, "justification")?,
        created: col(row, "created")?,
        created_by: col(row, "created_by")?,
    })
}

fn history_from_row(row: &Row) -> TechStacksResult<HistoryRecord> {
    let operation: String = col(row, "operation")?;
    let snapshot: serde_json::Value = col(row, "snapshot")?;
    Ok(HistoryRecord {
        id: HistoryId::new(col(row, "id")?),
        stack_id: StackId::new(col(row, "technology_stack_id")?),
        operation: operation.parse().map_err(|e: techstacks_core::OperationParseError| {
            AuditError::ReadFailed {
                reason: e.to_string(),
            }
        })?,
        snapshot: serde_json::from_value(snapshot).map_err(|e| AuditError::ReadFailed {
            reason: format!("snapshot: {}", e),
        })?,
        recorded_at: col(row, "recorded_at")?,
        recorded_by: col(row, "recorded_by")?,
    })
}

fn rows_to<T>(rows: &[Row], map: fn(&Row) -> TechStacksResult<T>) -> TechStacksResult<Vec<T>> {
    rows.iter().map(map).collect()
}

// ============================================================================
// STACK REPOSITORY
// ============================================================================

#[async_trait]
impl StackRepository for DbClient {
    async fn stack_insert(&self, new: &NewStack) -> TechStacksResult<StackId> {
        timed("insert", EntityType::Stack, async {
            let conn = self.conn().await?;
            let row = conn
                .query_one(
                    "INSERT INTO technology_stack (name, slug, details, owner_id, is_locked, \
                     created, created_by, last_modified, last_modified_by) \
                     VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) RETURNING id",
                    &[
                        &new.name,
                        &new.slug,
                        &new.details,
                        &new.owner_id,
                        &new.is_locked,
                        &new.created,
                        &new.created_by,
                        &new.last_modified,
                        &new.last_modified_by,
                    ],
                )
                .await
                .map_err(pg_error)?;
            Ok::<_, TechStacksError>(StackId::new(col(&row, "id")?))
        })
        .await
    }

    async fn stack_get(&self, id: StackId) -> TechStacksResult<Option<Stack>> {
        timed("get", EntityType::Stack, async {
            let conn = self.conn().await?;
            let sql = format!("SELECT {} FROM technology_stack WHERE id = $1", STACK_COLUMNS);
            let row = conn
                .query_opt(&sql, &[&id.as_i64()])
                .await
                .map_err(pg_error)?;
            row.as_ref().map(stack_from_row).transpose()
        })
        .await
    }

    async fn stack_get_by_slug(&self, slug: &str) -> TechStacksResult<Option<Stack>> {
        timed("get_by_slug", EntityType::Stack, async {
            let conn = self.conn().await?;
            let sql = format!(
                "SELECT {} FROM technology_stack WHERE lower(slug) = lower($1) ORDER BY id LIMIT 1",
                STACK_COLUMNS
            );
            let row = conn.query_opt(&sql, &[&slug]).await.map_err(pg_error)?;
            row.as_ref().map(stack_from_row).transpose()
        })
        .await
    }

    async fn stack_update(&self, stack: &Stack) -> TechStacksResult<()> {
        timed("update", EntityType::Stack, async {
            let conn = self.conn().await?;
            let updated = conn
                .execute(
                    "UPDATE technology_stack SET name = $2, slug = $3, details = $4, \
                     owner_id = $5, is_locked = $6, created = $7, created_by = $8, \
                     last_modified = $9, last_modified_by = $10 WHERE id = $1",
                    &[
                        &stack.id.as_i64(),
                        &stack.name,
                        &stack.slug,
                        &stack.details,
                        &stack.owner_id,
                        &stack.is_locked,
                        &stack.created,
                        &stack.created_by,
                        &stack.last_modified,
                        &stack.last_modified_by,
                    ],
                )
                .await
                .map_err(pg_error)?;
            if updated == 0 {
                return Err(StorageError::not_found(EntityType::Stack, stack.id).into());
            }
            Ok::<_, TechStacksError>(())
        })
        .await
    }

    async fn stack_delete(&self, id: StackId) -> TechStacksResult<()> {
        timed("delete", EntityType::Stack, async {
            let mut conn = self.conn().await?;
            let tx = conn.transaction().await.map_err(pg_error)?;
            let raw = id.as_i64();

            tx.execute(
                "DELETE FROM technology_choice WHERE technology_stack_id = $1",
                &[&raw],
            )
            .await
            .map_err(pg_error)?;
            tx.execute(
                "DELETE FROM user_favorite_stack WHERE technology_stack_id = $1",
                &[&raw],
            )
            .await
            .map_err(pg_error)?;
            let deleted = tx
                .execute("DELETE FROM technology_stack WHERE id = $1", &[&raw])
                .await
                .map_err(pg_error)?;

            if deleted == 0 {
                // Dropping the transaction rolls it back.
                return Err(TechStacksError::from(StorageError::not_found(
                    EntityType::Stack,
                    id,
                )));
            }
            tx.commit().await.map_err(|e| {
                TechStacksError::from(StorageError::TransactionFailed {
                    reason: e.to_string(),
                })
            })
        })
        .await
    }

    async fn stack_list(&self, limit: usize) -> TechStacksResult<Vec<Stack>> {
        timed("list", EntityType::Stack, async {
            let conn = self.conn().await?;
            let sql = format!(
                "SELECT {} FROM technology_stack ORDER BY id LIMIT $1",
                STACK_COLUMNS
            );
            let rows = conn
                .query(&sql, &[&limit_param(limit)])
                .await
                .map_err(pg_error)?;
            rows_to(&rows, stack_from_row)
        })
        .await
    }

    async fn stack_list_with_choices(&self, limit: usize) -> TechStacksResult<Vec<Stack>> {
        timed("list_with_choices", EntityType::Stack, async {
            let conn = self.conn().await?;
            let columns = STACK_COLUMNS
                .split(", ")
                .map(|c| format!("s.{}", c))
                .collect::<Vec<_>>()
                .join(", ");
            let sql = format!(
                "SELECT {} FROM technology_stack s \
                 JOIN technology_choice c ON c.technology_stack_id = s.id \
                 GROUP BY s.id ORDER BY s.id LIMIT $1",
                columns
            );
            let rows = conn
                .query(&sql, &[&limit_param(limit)])
                .await
                .map_err(pg_error)?;
            rows_to(&rows, stack_from_row)
        })
        .await
    }

    async fn stack_list_recent(&self, limit: usize) -> TechStacksResult<Vec<Stack>> {
        timed("list_recent", EntityType::Stack, async {
            let conn = self.conn().await?;
            let sql = format!(
                "SELECT {} FROM technology_stack ORDER BY id DESC LIMIT $1",
                STACK_COLUMNS
            );
            let rows = conn
                .query(&sql, &[&limit_param(limit)])
                .await
                .map_err(pg_error)?;
            rows_to(&rows, stack_from_row)
        })
        .await
    }

    async fn stack_list_recently_modified(&self, limit: usize) -> TechStacksResult<Vec<Stack>> {
        timed("list_recently_modified", EntityType::Stack, async {
            let conn = self.conn().await?;
            let sql = format!(
                "SELECT {} FROM technology_stack ORDER BY last_modified DESC, id DESC LIMIT $1",
                STACK_COLUMNS
            );
            let rows = conn
                .query(&sql, &[&limit_param(limit)])
                .await
                .map_err(pg_error)?;
            rows_to(&rows, stack_from_row)
        })
        .await
    }

    async fn stack_find(&self, query: &StackQuery) -> TechStacksResult<(Vec<Stack>, usize)> {
        timed("find", EntityType::Stack, async {
            let order = order_clause(&query.order().map_err(TechStacksError::from)?);
            let (where_clause, params) = build_where(query);
            let where_sql = where_clause
                .map(|w| format!(" WHERE {}", w))
                .unwrap_or_default();
            let sql_params: Vec<&(dyn ToSql + Sync)> =
                params.iter().map(SqlParam::as_to_sql).collect();

            let conn = self.conn().await?;
            let count_sql = format!("SELECT COUNT(*) AS total FROM technology_stack{}", where_sql);
            let total: i64 = col(
                &conn
                    .query_one(&count_sql, &sql_params[..])
                    .await
                    .map_err(pg_error)?,
                "total",
            )?;

            let page_sql = format!(
                "SELECT {} FROM technology_stack{} ORDER BY {} LIMIT {} OFFSET {}",
                STACK_COLUMNS,
                where_sql,
                order,
                query.limit(),
                query.offset()
            );
            let rows = conn
                .query(&page_sql, &sql_params[..])
                .await
                .map_err(pg_error)?;
            let total = usize::try_from(total).unwrap_or_default();
            Ok::<_, TechStacksError>((rows_to(&rows, stack_from_row)?, total))
        })
        .await
    }

    async fn choice_insert(&self, new: &NewChoice) -> TechStacksResult<Choice> {
        timed("insert", EntityType::Choice, async {
            let conn = self.conn().await?;
            let sql = format!(
                "INSERT INTO technology_choice (technology_stack_id, technology_id, tier, \
                 justification, created, created_by) VALUES ($1, $2, $3, $4, $5, $6) \
                 RETURNING {}",
                CHOICE_COLUMNS
            );
            let row = conn
                .query_one(
                    &sql,
                    &[
                        &new.stack_id.as_i64(),
                        &new.technology_id.as_i64(),
                        &new.tier.as_db_str(),
                        &new.justification,
                        &new.created,
                        &new.created_by,
                    ],
                )
                .await
                .map_err(pg_error)?;
            choice_from_row(&row)
        })
        .await
    }

    async fn choice_delete(&self, stack_id: StackId, choice_id: ChoiceId) -> TechStacksResult<()> {
        timed("delete", EntityType::Choice, async {
            let conn = self.conn().await?;
            let deleted = conn
                .execute(
                    "DELETE FROM technology_choice WHERE id = $1 AND technology_stack_id = $2",
                    &[&choice_id.as_i64(), &stack_id.as_i64()],
                )
                .await
                .map_err(pg_error)?;
            if deleted == 0 {
                return Err(StorageError::not_found(EntityType::Choice, choice_id).into());
            }
            Ok::<_, TechStacksError>(())
        })
        .await
    }

    async fn choices_for_stacks(&self, stack_ids: &[StackId]) -> TechStacksResult<Vec<Choice>> {
        timed("list", EntityType::Choice, async {
            let conn = self.conn().await?;
            let sql = format!(
                "SELECT {} FROM technology_choice WHERE technology_stack_id = ANY($1) ORDER BY id",
                CHOICE_COLUMNS
            );
            let rows = conn
                .query(&sql, &[&ids(stack_ids)])
                .await
                .map_err(pg_error)?;
            rows_to(&rows, choice_from_row)
        })
        .await
    }

    async fn technology_insert(&self, new: &NewTechnology) -> TechStacksResult<Technology> {
        timed("insert", EntityType::Technology, async {
            let conn = self.conn().await?;
            let sql = format!(
                "INSERT INTO technology (name, slug, tier, details, owner_id, created, created_by) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING {}",
                TECHNOLOGY_COLUMNS
            );
            let row = conn
                .query_one(
                    &sql,
                    &[
                        &new.name,
                        &new.slug,
                        &new.tier.as_db_str(),
                        &new.details,
                        &new.owner_id,
                        &new.created,
                        &new.created_by,
                    ],
                )
                .await
                .map_err(pg_error)?;
            technology_from_row(&row)
        })
        .await
    }

    async fn technology_get(&self, id: TechnologyId) -> TechStacksResult<Option<Technology>> {
        timed("get", EntityType::Technology, async {
            let conn = self.conn().await?;
            let sql = format!("SELECT {} FROM technology WHERE id = $1", TECHNOLOGY_COLUMNS);
            let row = conn
                .query_opt(&sql, &[&id.as_i64()])
                .await
                .map_err(pg_error)?;
            row.as_ref().map(technology_from_row).transpose()
        })
        .await
    }

    async fn technology_list(&self) -> TechStacksResult<Vec<Technology>> {
        timed("list", EntityType::Technology, async {
            let conn = self.conn().await?;
            let sql = format!("SELECT {} FROM technology ORDER BY name", TECHNOLOGY_COLUMNS);
            let rows = conn.query(&sql, &[]).await.map_err(pg_error)?;
            rows_to(&rows, technology_from_row)
        })
        .await
    }

    async fn technologies_by_ids(&self, ids_in: &[TechnologyId]) -> TechStacksResult<Vec<Technology>> {
        timed("list", EntityType::Technology, async {
            let conn = self.conn().await?;
            let sql = format!(
                "SELECT {} FROM technology WHERE id = ANY($1) ORDER BY id",
                TECHNOLOGY_COLUMNS
            );
            let rows = conn
                .query(&sql, &[&ids(ids_in)])
                .await
                .map_err(pg_error)?;
            rows_to(&rows, technology_from_row)
        })
        .await
    }

    async fn favorite_add(&self, user_id: &str, stack_id: StackId) -> TechStacksResult<bool> {
        timed("insert", EntityType::Favorite, async {
            let conn = self.conn().await?;
            let inserted = conn
                .execute(
                    "INSERT INTO user_favorite_stack (user_id, technology_stack_id) \
                     VALUES ($1, $2) ON CONFLICT DO NOTHING",
                    &[&user_id, &stack_id.as_i64()],
                )
                .await
                .map_err(pg_error)?;
            Ok::<_, TechStacksError>(inserted > 0)
        })
        .await
    }

    async fn favorite_remove(&self, user_id: &str, stack_id: StackId) -> TechStacksResult<bool> {
        timed("delete", EntityType::Favorite, async {
            let conn = self.conn().await?;
            let deleted = conn
                .execute(
                    "DELETE FROM user_favorite_stack WHERE user_id = $1 AND technology_stack_id = $2",
                    &[&user_id, &stack_id.as_i64()],
                )
                .await
                .map_err(pg_error)?;
            Ok::<_, TechStacksError>(deleted > 0)
        })
        .await
    }

    async fn top_users(&self, limit: usize) -> TechStacksResult<Vec<UserRanking>> {
        timed("top_users", EntityType::Favorite, async {
            let conn = self.conn().await?;
            let rows = conn
                .query(
                    "SELECT s.owner_id AS user_id, MIN(s.created_by) AS user_name, \
                     COUNT(*) AS favorites_count \
                     FROM user_favorite_stack f \
                     JOIN technology_stack s ON s.id = f.technology_stack_id \
                     GROUP BY s.owner_id \
                     ORDER BY favorites_count DESC, s.owner_id ASC LIMIT $1",
                    &[&limit_param(limit)],
                )
                .await
                .map_err(pg_error)?;
            rows.iter()
                .map(|row| {
                    Ok::<_, TechStacksError>(UserRanking {
                        user_id: col(row, "user_id")?,
                        user_name: col(row, "user_name")?,
                        favorites_count: col(row, "favorites_count")?,
                    })
                })
                .collect::<TechStacksResult<Vec<_>>>()
        })
        .await
    }

    async fn technology_rankings(&self) -> TechStacksResult<Vec<TechnologyRanking>> {
        timed("rankings", EntityType::Technology, async {
            let conn = self.conn().await?;
            let rows = conn
                .query(
                    "SELECT t.id, t.name, t.slug, t.tier, \
                     COUNT(DISTINCT c.technology_stack_id) AS stacks_count \
                     FROM technology t \
                     JOIN technology_choice c ON c.technology_id = t.id \
                     GROUP BY t.id \
                     ORDER BY stacks_count DESC, t.name ASC",
                    &[],
                )
                .await
                .map_err(pg_error)?;
            rows.iter()
                .map(|row| {
                    Ok::<_, TechStacksError>(TechnologyRanking {
                        technology_id: TechnologyId::new(col(row, "id")?),
                        name: col(row, "name")?,
                        slug: col(row, "slug")?,
                        tier: tier_col(row, "tier")?,
                        stacks_count: col(row, "stacks_count")?,
                    })
                })
                .collect::<TechStacksResult<Vec<_>>>()
        })
        .await
    }

    async fn health_check(&self) -> TechStacksResult<bool> {
        let conn = self.conn().await?;
        conn.query_one("SELECT 1", &[]).await.map_err(pg_error)?;
        Ok(true)
    }
}

// ============================================================================
// AUDIT LOG
// ============================================================================

#[async_trait]
impl AuditLog for DbClient {
    async fn append(&self, record: NewHistoryRecord) -> TechStacksResult<HistoryRecord> {
        timed("insert", EntityType::HistoryRecord, async {
            let stack_id = record.stack_id.as_i64();
            let append_failed = |reason: String| -> TechStacksError {
                AuditError::AppendFailed { stack_id, reason }.into()
            };

            let snapshot =
                serde_json::to_value(&record.snapshot).map_err(|e| append_failed(e.to_string()))?;
            let conn = self.conn().await?;
            let row = conn
                .query_one(
                    "INSERT INTO technology_stack_history (technology_stack_id, operation, \
                     snapshot, recorded_at, recorded_by) VALUES ($1, $2, $3, $4, $5) RETURNING id",
                    &[
                        &stack_id,
                        &record.operation.as_db_str(),
                        &snapshot,
                        &record.recorded_at,
                        &record.recorded_by,
                    ],
                )
                .await
                .map_err(|e| append_failed(e.to_string()))?;
            let id: i64 = col(&row, "id")?;
            Ok::<_, TechStacksError>(record.into_record(HistoryId::new(id)))
        })
        .await
    }

    async fn history_for(&self, stack_id: StackId) -> TechStacksResult<Vec<HistoryRecord>> {
        timed("list", EntityType::HistoryRecord, async {
            let conn = self.conn().await?;
            let sql = format!(
                "SELECT {} FROM technology_stack_history WHERE technology_stack_id = $1 ORDER BY id",
                HISTORY_COLUMNS
            );
            let rows = conn
                .query(&sql, &[&stack_id.as_i64()])
                .await
                .map_err(|e| {
                    TechStacksError::from(AuditError::ReadFailed {
                        reason: e.to_string(),
                    })
                })?;
            rows_to(&rows, history_from_row)
        })
        .await
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_db_config_defaults() {
        let config = DbConfig::default();
        assert_eq!(config.port, 5432);
        assert_eq!(config.dbname, "techstacks");
        assert_eq!(config.max_size, 16);
    }

    #[test]
    fn test_build_where_empty_query() {
        let (clause, params) = build_where(&StackQuery::default());
        assert!(clause.is_none());
        assert!(params.is_empty());
    }

    #[test]
    fn test_build_where_numbers_placeholders_in_order() {
        let query = StackQuery {
            slug: Some("go-web-server".to_string()),
            owner_id: Some("u1".to_string()),
            name_contains: Some("Go".to_string()),
            is_locked: Some(false),
            ..StackQuery::default()
        };
        let (clause, params) = build_where(&query);
        assert_eq!(
            clause.as_deref(),
            Some(
                "lower(slug) = lower($1) AND lower(owner_id) = lower($2) \
                 AND strpos(lower(name), lower($3)) > 0 AND is_locked = $4"
            )
        );
        assert_eq!(
            params,
            vec![
                SqlParam::String("go-web-server".to_string()),
                SqlParam::String("u1".to_string()),
                SqlParam::String("Go".to_string()),
                SqlParam::Bool(false),
            ]
        );
    }

    #[test]
    fn test_build_where_never_inlines_values() {
        let query = StackQuery {
            name: Some("x'; DROP TABLE technology_stack; --".to_string()),
            ..StackQuery::default()
        };
        let (clause, _) = build_where(&query);
        assert_eq!(clause.as_deref(), Some("lower(name) = lower($1)"));
    }

    #[test]
    fn test_order_clause() -> TechStacksResult<()> {
        assert_eq!(order_clause(&StackOrder::default()), "id ASC");
        assert_eq!(
            order_clause(&StackOrder::parse("-lastModified")?),
            "last_modified DESC, id DESC"
        );
        assert_eq!(order_clause(&StackOrder::parse("name")?), "lower(name) ASC, id ASC");
        Ok(())
    }

    #[test]
    fn test_schema_declares_every_table() {
        for table in [
            "technology_stack",
            "technology",
            "technology_choice",
            "user_favorite_stack",
            "technology_stack_history",
        ] {
            assert!(
                INIT_SCHEMA.contains(&format!("CREATE TABLE IF NOT EXISTS {} (", table)),
                "missing table {}",
                table
            );
        }
    }
}
