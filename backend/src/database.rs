// PostgreSQL connection pool and operations. Saved routes are always scoped
// by owner: a read or delete that does not match both id and user_id behaves
// as if the row does not exist.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared::{DayRoute, Itinerary};
use sqlx::{postgres::PgPoolOptions, FromRow, PgPool};
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    #[error("database connection error: {0}")]
    Connection(#[from] sqlx::Error),

    #[error("route {0} not found")]
    RouteNotFound(Uuid),

    #[error("a user with this email already exists")]
    EmailTaken,

    #[error("invalid stored data: {0}")]
    InvalidData(String),
}

#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub full_name: String,
    pub partner_name: String,
    pub refresh_token: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Persisted itinerary row. `daily_routes` keeps the exact JSON the client
/// saved, so a list round-trips day/waypoint data without a lossy transform.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct SavedRoute {
    pub id: Uuid,
    pub user_id: Uuid,
    pub destination: String,
    pub trip_type: String,
    pub duration_days: i32,
    pub daily_routes: sqlx::types::JsonValue,
    pub image_url: String,
    pub created_at: DateTime<Utc>,
}

impl SavedRoute {
    pub fn daily_routes(&self) -> Result<Vec<DayRoute>, DatabaseError> {
        serde_json::from_value(self.daily_routes.clone())
            .map_err(|e| DatabaseError::InvalidData(format!("failed to decode daily routes: {e}")))
    }
}

pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Connect eagerly; fails fast when the database is unreachable.
    pub async fn new(database_url: &str) -> Result<Self, DatabaseError> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await?;

        tracing::info!("PostgreSQL connection pool created");
        Ok(Self { pool })
    }

    /// Build a pool without touching the database. Used by tests that
    /// exercise handlers which never reach persistence.
    pub fn connect_lazy(database_url: &str) -> Result<Self, DatabaseError> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect_lazy(database_url)?;
        Ok(Self { pool })
    }

    /// Run schema migrations. The SQL file holds multiple statements, so it
    /// goes through `raw_sql` on a dedicated connection.
    pub async fn migrate(&self) -> Result<(), DatabaseError> {
        let mut conn = self.pool.acquire().await?;
        let migration_sql = include_str!("../migrations/20260815_create_tables.sql");
        sqlx::raw_sql(migration_sql).execute(&mut *conn).await?;

        tracing::info!("database migrations completed");
        Ok(())
    }

    pub async fn create_user(
        &self,
        email: &str,
        password_hash: &str,
        full_name: &str,
        partner_name: &str,
    ) -> Result<User, DatabaseError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (email, password_hash, full_name, partner_name)
            VALUES (lower($1), $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(email.trim())
        .bind(password_hash)
        .bind(full_name.trim())
        .bind(partner_name.trim())
        .fetch_one(&self.pool)
        .await
        .map_err(|err| match &err {
            sqlx::Error::Database(db) if db.code().as_deref() == Some("23505") => {
                DatabaseError::EmailTaken
            }
            _ => DatabaseError::Connection(err),
        })?;

        tracing::info!("user registered: {}", user.id);
        Ok(user)
    }

    pub async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, DatabaseError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = lower($1)")
            .bind(email.trim())
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    pub async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, DatabaseError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    pub async fn set_refresh_token(
        &self,
        user_id: Uuid,
        refresh_token: &str,
    ) -> Result<(), DatabaseError> {
        sqlx::query("UPDATE users SET refresh_token = $2 WHERE id = $1")
            .bind(user_id)
            .bind(refresh_token)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn clear_refresh_token(&self, refresh_token: &str) -> Result<(), DatabaseError> {
        sqlx::query("UPDATE users SET refresh_token = NULL WHERE refresh_token = $1")
            .bind(refresh_token)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Persist an itinerary for its owner.
    pub async fn save_route(
        &self,
        user_id: Uuid,
        itinerary: &Itinerary,
    ) -> Result<SavedRoute, DatabaseError> {
        let daily_routes = serde_json::to_value(&itinerary.daily_routes)
            .map_err(|e| DatabaseError::InvalidData(e.to_string()))?;

        let route = sqlx::query_as::<_, SavedRoute>(
            r#"
            INSERT INTO saved_routes (
                user_id, destination, trip_type, duration_days, daily_routes, image_url
            )
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(&itinerary.destination)
        .bind(itinerary.trip_type.as_str())
        .bind(itinerary.duration_days as i32)
        .bind(daily_routes)
        .bind(itinerary.image_url.clone().unwrap_or_default())
        .fetch_one(&self.pool)
        .await?;

        tracing::info!("route saved: {} for user {}", route.id, user_id);
        Ok(route)
    }

    /// All routes owned by `user_id`, newest first.
    pub async fn list_routes(&self, user_id: Uuid) -> Result<Vec<SavedRoute>, DatabaseError> {
        let routes = sqlx::query_as::<_, SavedRoute>(
            "SELECT * FROM saved_routes WHERE user_id = $1 ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        tracing::debug!("retrieved {} routes for user {}", routes.len(), user_id);
        Ok(routes)
    }

    /// Delete a route, but only when `user_id` owns it.
    pub async fn delete_route(&self, user_id: Uuid, id: Uuid) -> Result<(), DatabaseError> {
        let result = sqlx::query("DELETE FROM saved_routes WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::RouteNotFound(id));
        }

        tracing::info!("route deleted: {}", id);
        Ok(())
    }
}
