//! Events repository (Postgres)

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Pool, Postgres, QueryBuilder};
use uuid::Uuid;

use super::{EventStore, JoinOutcome};
use crate::{
    error::AppResult,
    models::event::{EventChanges, EventRecord},
    query::EventFilter,
};

const EVENT_COLUMNS: &str = "id, title, organizer, event_date, location, description, \
                             created_by, attendees, created_at, updated_at";

#[derive(Clone)]
pub struct EventsRepository {
    pool: Pool<Postgres>,
}

impl EventsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    async fn exists(&self, id: Uuid) -> AppResult<bool> {
        let exists = sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM events WHERE id = $1)")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }
}

#[async_trait]
impl EventStore for EventsRepository {
    async fn insert(&self, event: EventRecord) -> AppResult<EventRecord> {
        let row = sqlx::query_as::<_, EventRecord>(&format!(
            r#"
            INSERT INTO events (
                id, title, organizer, event_date, location, description,
                created_by, attendees, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {}
            "#,
            EVENT_COLUMNS
        ))
        .bind(event.id)
        .bind(&event.title)
        .bind(&event.organizer)
        .bind(event.date)
        .bind(&event.location)
        .bind(&event.description)
        .bind(event.created_by)
        .bind(&event.attendees)
        .bind(event.created_at)
        .bind(event.updated_at)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn list_matching(
        &self,
        filter: &EventFilter,
        skip: i64,
        limit: i64,
    ) -> AppResult<Vec<EventRecord>> {
        let mut builder = QueryBuilder::<Postgres>::new(format!("SELECT {} FROM events", EVENT_COLUMNS));
        filter.push_where(&mut builder);
        builder
            .push(" ORDER BY event_date DESC, created_at DESC LIMIT ")
            .push_bind(limit)
            .push(" OFFSET ")
            .push_bind(skip);

        let rows = builder
            .build_query_as::<EventRecord>()
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn count_matching(&self, filter: &EventFilter) -> AppResult<i64> {
        let mut builder = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM events");
        filter.push_where(&mut builder);

        let total = builder
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await?;
        Ok(total)
    }

    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<EventRecord>> {
        let row = sqlx::query_as::<_, EventRecord>(&format!(
            "SELECT {} FROM events WHERE id = $1",
            EVENT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn update(
        &self,
        id: Uuid,
        owner: Uuid,
        changes: &EventChanges,
    ) -> AppResult<Option<EventRecord>> {
        let row = sqlx::query_as::<_, EventRecord>(&format!(
            r#"
            UPDATE events
            SET title = $3, organizer = $4, event_date = $5,
                location = $6, description = $7, updated_at = $8
            WHERE id = $1 AND created_by = $2
            RETURNING {}
            "#,
            EVENT_COLUMNS
        ))
        .bind(id)
        .bind(owner)
        .bind(&changes.title)
        .bind(&changes.organizer)
        .bind(changes.date)
        .bind(&changes.location)
        .bind(&changes.description)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn delete(&self, id: Uuid, owner: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM events WHERE id = $1 AND created_by = $2")
            .bind(id)
            .bind(owner)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn add_attendee(&self, id: Uuid, user_id: Uuid) -> AppResult<JoinOutcome> {
        let row = sqlx::query_as::<_, EventRecord>(&format!(
            r#"
            UPDATE events
            SET attendees = array_append(attendees, $2), updated_at = $3
            WHERE id = $1 AND NOT ($2 = ANY(attendees))
            RETURNING {}
            "#,
            EVENT_COLUMNS
        ))
        .bind(id)
        .bind(user_id)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(event) => Ok(JoinOutcome::Joined(event)),
            None if self.exists(id).await? => Ok(JoinOutcome::AlreadyJoined),
            None => Ok(JoinOutcome::Missing),
        }
    }
}
