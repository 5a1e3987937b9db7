//! PostgreSQL-backed event store
//!
//! Documents live in the `events` and `event_attendees` tables. Mutations
//! fire a `NOTIFY` (see migrations); `subscribe` LISTENs on that channel
//! and re-reads the full collection per notification, so every emission is
//! a complete replacement snapshot in `created_at` order.

use async_trait::async_trait;
use sqlx::postgres::{PgListener, PgPool};
use sqlx::Row;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::models::{Event, ValidatedEvent};
use crate::store::{CounterField, EventStore, Snapshot, Subscription};
use crate::utils::errors::{Result, SpartanvilleError};

/// Notification channel fired by the schema triggers on any event mutation
const EVENTS_CHANNEL: &str = "spartanville_events";

/// Create a new database connection pool
pub async fn create_pool(config: &crate::config::DatabaseConfig) -> Result<PgPool> {
    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(std::time::Duration::from_secs(30))
        .idle_timeout(Some(std::time::Duration::from_secs(600)))
        .max_lifetime(Some(std::time::Duration::from_secs(1800)))
        .connect(&config.url)
        .await?;

    // Test the connection
    sqlx::query("SELECT 1").execute(&pool).await?;

    info!("Database connection pool created");
    Ok(pool)
}

/// Run database migrations
pub async fn run_migrations(pool: &PgPool) -> Result<()> {
    info!("Running database migrations...");

    sqlx::migrate!("./migrations").run(pool).await?;

    info!("Database migrations completed");
    Ok(())
}

const SNAPSHOT_QUERY: &str = r#"
SELECT e.id, e.title, e.date, e.time, e.location, e.image, e.club_association,
       e.attendance_count,
       COALESCE(array_agg(a.user_id ORDER BY a.user_id)
                FILTER (WHERE a.user_id IS NOT NULL), '{}') AS attendees,
       e.created_by, e.created_at
FROM events e
LEFT JOIN event_attendees a ON a.event_id = e.id
GROUP BY e.id
ORDER BY e.created_at ASC, e.id ASC
"#;

#[derive(Clone)]
pub struct PgEventStore {
    pool: PgPool,
}

impl PgEventStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Read the current state of the whole collection
    async fn fetch_snapshot(pool: &PgPool) -> Result<Snapshot> {
        let events = sqlx::query_as::<_, Event>(SNAPSHOT_QUERY)
            .fetch_all(pool)
            .await?;

        Ok(events)
    }
}

#[async_trait]
impl EventStore for PgEventStore {
    async fn subscribe(&self) -> Result<Subscription> {
        let mut listener = PgListener::connect_with(&self.pool).await?;
        listener.listen(EVENTS_CHANNEL).await?;

        let pool = self.pool.clone();
        let (tx, mut rx) = mpsc::channel::<Snapshot>(8);

        let feeder = tokio::spawn(async move {
            match Self::fetch_snapshot(&pool).await {
                Ok(snapshot) => {
                    if tx.send(snapshot).await.is_err() {
                        return;
                    }
                }
                Err(e) => {
                    error!(error = %e, "Failed to read initial event snapshot");
                    return;
                }
            }

            loop {
                match listener.recv().await {
                    Ok(notification) => {
                        debug!(op = notification.payload(), "Event store change notification");
                        match Self::fetch_snapshot(&pool).await {
                            Ok(snapshot) => {
                                if tx.send(snapshot).await.is_err() {
                                    break;
                                }
                            }
                            Err(e) => {
                                // Skip this emission; the next notification re-reads
                                warn!(error = %e, "Failed to refresh event snapshot");
                            }
                        }
                    }
                    Err(e) => {
                        error!(error = %e, "Event store listener closed");
                        break;
                    }
                }
            }
        });

        let stream = async_stream::stream! {
            while let Some(snapshot) = rx.recv().await {
                yield snapshot;
            }
        };

        info!(channel = EVENTS_CHANNEL, "Subscribed to event collection");
        Ok(Subscription::new(Box::pin(stream), Some(feeder)))
    }

    async fn create(&self, event: ValidatedEvent, created_by: Option<&str>) -> Result<String> {
        let row = sqlx::query(
            r#"
            INSERT INTO events (title, date, time, location, image, club_association, created_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id
            "#,
        )
        .bind(&event.title)
        .bind(event.date)
        .bind(event.time)
        .bind(&event.location)
        .bind(&event.image)
        .bind(&event.club_association)
        .bind(created_by)
        .fetch_one(&self.pool)
        .await?;

        let id: String = row.try_get("id")?;
        info!(event_id = %id, title = %event.title, "Event created");
        Ok(id)
    }

    async fn delete(&self, id: &str) -> Result<()> {
        let result = sqlx::query("DELETE FROM events WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(SpartanvilleError::EventNotFound {
                event_id: id.to_string(),
            });
        }

        info!(event_id = id, "Event deleted");
        Ok(())
    }

    async fn increment_field(&self, id: &str, field: CounterField, delta: i64) -> Result<()> {
        // The column name comes from a closed enum, never from input
        let query = format!(
            "UPDATE events SET {col} = GREATEST({col} + $2, 0) WHERE id = $1",
            col = field.column()
        );

        let result = sqlx::query(&query)
            .bind(id)
            .bind(delta)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(SpartanvilleError::EventNotFound {
                event_id: id.to_string(),
            });
        }

        debug!(event_id = id, field = field.column(), delta = delta, "Counter adjusted");
        Ok(())
    }

    async fn set_member(&self, id: &str, user_id: &str, present: bool) -> Result<()> {
        if present {
            sqlx::query(
                r#"
                INSERT INTO event_attendees (event_id, user_id)
                VALUES ($1, $2)
                ON CONFLICT (event_id, user_id) DO NOTHING
                "#,
            )
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        } else {
            sqlx::query("DELETE FROM event_attendees WHERE event_id = $1 AND user_id = $2")
                .bind(id)
                .bind(user_id)
                .execute(&self.pool)
                .await?;
        }

        debug!(event_id = id, user_id = user_id, present = present, "Attendee set updated");
        Ok(())
    }
}

impl std::fmt::Debug for PgEventStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PgEventStore").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counter_column_is_closed() {
        assert_eq!(CounterField::AttendanceCount.column(), "attendance_count");
    }

    #[test]
    fn test_snapshot_query_orders_by_arrival() {
        assert!(SNAPSHOT_QUERY.contains("ORDER BY e.created_at ASC, e.id ASC"));
    }
}
