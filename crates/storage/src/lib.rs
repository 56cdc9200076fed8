use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow},
    Pool, Row, Sqlite,
};
use std::{
    fs,
    path::{Path, PathBuf},
    str::FromStr,
};
use uuid::Uuid;

use shared::domain::Event;

#[derive(Clone)]
pub struct Storage {
    pool: Pool<Sqlite>,
}

/// Validated fields of an event about to be stored.
#[derive(Debug, Clone)]
pub struct NewEvent {
    pub title: String,
    pub date: String,
    pub location: String,
    pub description: String,
}

#[derive(Debug, Clone)]
pub struct StoredSubscription {
    pub subscription_id: String,
    pub email: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

impl Storage {
    pub async fn new(database_url: &str) -> Result<Self> {
        ensure_sqlite_parent_dir_exists(database_url)?;

        let connect_options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        // Every connection to `sqlite::memory:` opens its own database.
        let pool_options = if is_memory_url(database_url) {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(5)
        };
        let pool = pool_options.connect_with(connect_options).await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self { pool })
    }

    pub async fn health_check(&self) -> Result<()> {
        let _: i64 = sqlx::query_scalar("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .context("sqlite ping failed")?;
        Ok(())
    }

    pub async fn insert_event(&self, new_event: NewEvent) -> Result<Event> {
        let event_id = Uuid::new_v4().to_string();
        let created_at = Utc::now();
        sqlx::query(
            "INSERT INTO events (event_id, title, date, location, description, created_at)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&event_id)
        .bind(&new_event.title)
        .bind(&new_event.date)
        .bind(&new_event.location)
        .bind(&new_event.description)
        .bind(created_at)
        .execute(&self.pool)
        .await
        .context("failed to insert event")?;

        Ok(Event {
            id: Some(event_id),
            title: new_event.title,
            date: new_event.date,
            location: new_event.location,
            description: Some(new_event.description),
            created_at: Some(created_at),
        })
    }

    pub async fn list_events(&self) -> Result<Vec<Event>> {
        let rows = sqlx::query(
            "SELECT event_id, title, date, location, description, created_at
             FROM events
             ORDER BY seq ASC",
        )
        .fetch_all(&self.pool)
        .await
        .context("failed to list events")?;

        rows.iter().map(event_from_row).collect()
    }

    /// Records a pending subscription and returns its id. Subscribing an
    /// address twice returns the id issued the first time.
    pub async fn insert_subscription(&self, email: &str) -> Result<String> {
        let row = sqlx::query(
            "INSERT INTO subscriptions (subscription_id, email, created_at) VALUES (?, ?, ?)
             ON CONFLICT(email) DO UPDATE SET email=excluded.email
             RETURNING subscription_id",
        )
        .bind(format!("sub-{}", Uuid::new_v4()))
        .bind(email)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .with_context(|| format!("failed to record subscription for '{email}'"))?;
        Ok(row.try_get::<String, _>(0)?)
    }

    pub async fn list_subscriptions(&self) -> Result<Vec<StoredSubscription>> {
        let rows = sqlx::query(
            "SELECT subscription_id, email, status, created_at
             FROM subscriptions
             ORDER BY seq ASC",
        )
        .fetch_all(&self.pool)
        .await
        .context("failed to list subscriptions")?;

        rows.iter().map(subscription_from_row).collect()
    }
}

fn event_from_row(row: &SqliteRow) -> Result<Event> {
    Ok(Event {
        id: Some(row.try_get("event_id")?),
        title: row.try_get("title")?,
        date: row.try_get("date")?,
        location: row.try_get("location")?,
        description: Some(row.try_get("description")?),
        created_at: Some(row.try_get("created_at")?),
    })
}

fn subscription_from_row(row: &SqliteRow) -> Result<StoredSubscription> {
    Ok(StoredSubscription {
        subscription_id: row.try_get("subscription_id")?,
        email: row.try_get("email")?,
        status: row.try_get("status")?,
        created_at: row.try_get("created_at")?,
    })
}

fn is_memory_url(database_url: &str) -> bool {
    database_url.starts_with("sqlite::memory:") || database_url.contains("mode=memory")
}

fn ensure_sqlite_parent_dir_exists(database_url: &str) -> Result<()> {
    let Some(path) = sqlite_path(database_url) else {
        return Ok(());
    };

    let Some(parent) = path.parent() else {
        return Ok(());
    };

    fs::create_dir_all(parent).with_context(|| {
        format!(
            "failed to create parent directory '{}' for database url '{database_url}'",
            parent.display()
        )
    })?;

    Ok(())
}

fn sqlite_path(database_url: &str) -> Option<PathBuf> {
    if is_memory_url(database_url) || !database_url.starts_with("sqlite:") {
        return None;
    }

    let path = database_url
        .trim_start_matches("sqlite://")
        .trim_start_matches("sqlite:")
        .split('?')
        .next()
        .unwrap_or_default();

    if path.is_empty() {
        return None;
    }

    Some(Path::new(path).to_path_buf())
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
