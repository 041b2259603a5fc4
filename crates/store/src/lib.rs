//! Notification store: durable persistence for relay notifications.
//!
//! Every operation checks out a pooled connection, runs a single statement or
//! transaction, and returns it. Ids come from SQLite `AUTOINCREMENT`, so they
//! follow commit order and are never reused.

use chrono::Utc;
use sqlx::SqlitePool;

use relay_common::error::AppError;
use relay_common::types::{NewNotification, Notification, NotificationStatus};

/// Durable store for notification records.
#[derive(Debug, Clone)]
pub struct NotificationStore {
    pool: SqlitePool,
}

impl NotificationStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Apply embedded schema migrations.
    pub async fn migrate(&self) -> Result<(), AppError> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Insert a new pending notification and return its id.
    ///
    /// Performs no validation; callers reject empty messages beforehand.
    pub async fn insert(&self, new: &NewNotification) -> Result<i64, AppError> {
        Ok(self.create(new).await?.id)
    }

    /// Insert a new pending notification and return the stored record.
    pub async fn create(&self, new: &NewNotification) -> Result<Notification, AppError> {
        let notification: Notification = sqlx::query_as(
            r#"
            INSERT INTO notifications (created_at, source, title, message, priority, status)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            RETURNING *
            "#,
        )
        .bind(Utc::now())
        .bind(&new.source)
        .bind(&new.title)
        .bind(&new.message)
        .bind(&new.priority)
        .bind(NotificationStatus::Pending)
        .fetch_one(&self.pool)
        .await?;

        tracing::debug!(
            notification_id = notification.id,
            source = %notification.source,
            "Notification stored"
        );

        Ok(notification)
    }

    /// Fetch a single notification by id.
    pub async fn get(&self, id: i64) -> Result<Option<Notification>, AppError> {
        let notification: Option<Notification> =
            sqlx::query_as("SELECT * FROM notifications WHERE id = ?1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(notification)
    }

    /// All pending notifications, oldest first.
    pub async fn get_pending(&self) -> Result<Vec<Notification>, AppError> {
        self.get_pending_from(None).await
    }

    /// Pending notifications, oldest first, optionally restricted to one source.
    pub async fn get_pending_from(
        &self,
        source: Option<&str>,
    ) -> Result<Vec<Notification>, AppError> {
        let notifications: Vec<Notification> = sqlx::query_as(
            r#"
            SELECT * FROM notifications
            WHERE status = ?1 AND (?2 IS NULL OR source = ?2)
            ORDER BY id ASC
            "#,
        )
        .bind(NotificationStatus::Pending)
        .bind(source)
        .fetch_all(&self.pool)
        .await?;

        Ok(notifications)
    }

    /// Number of pending notifications.
    pub async fn count_pending(&self) -> Result<i64, AppError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM notifications WHERE status = ?1")
            .bind(NotificationStatus::Pending)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    /// The `limit` most recently created notifications, newest first.
    pub async fn get_recent(&self, limit: i64) -> Result<Vec<Notification>, AppError> {
        self.get_recent_from(None, limit).await
    }

    /// Most recent notifications, newest first, optionally restricted to one source.
    pub async fn get_recent_from(
        &self,
        source: Option<&str>,
        limit: i64,
    ) -> Result<Vec<Notification>, AppError> {
        let notifications: Vec<Notification> = sqlx::query_as(
            r#"
            SELECT * FROM notifications
            WHERE ?1 IS NULL OR source = ?1
            ORDER BY id DESC
            LIMIT ?2
            "#,
        )
        .bind(source)
        .bind(limit.max(0))
        .fetch_all(&self.pool)
        .await?;

        Ok(notifications)
    }

    /// Mark a notification done with an optional response.
    ///
    /// Re-acknowledging a done notification overwrites `response` and
    /// `responded_at`. Returns `false` when no notification has this id.
    pub async fn mark_done(&self, id: i64, response: Option<&str>) -> Result<bool, AppError> {
        let mut tx = self.pool.begin().await?;

        let created_at: Option<chrono::DateTime<Utc>> =
            sqlx::query_scalar("SELECT created_at FROM notifications WHERE id = ?1")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;

        let Some(created_at) = created_at else {
            tx.rollback().await?;
            return Ok(false);
        };

        // Wall clock may have stepped back since insertion.
        let responded_at = Utc::now().max(created_at);

        sqlx::query(
            r#"
            UPDATE notifications
            SET status = ?1, response = ?2, responded_at = ?3
            WHERE id = ?4
            "#,
        )
        .bind(NotificationStatus::Done)
        .bind(response)
        .bind(responded_at)
        .bind(id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::debug!(notification_id = id, "Notification marked done");
        Ok(true)
    }
}
