//! Repository layer for database operations

pub mod events;
pub mod memory;
pub mod users;

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{
        event::{EventChanges, EventRecord},
        user::{User, UserRef},
    },
    query::EventFilter,
};

/// Result of the conditional attendee insert
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JoinOutcome {
    Joined(EventRecord),
    AlreadyJoined,
    Missing,
}

/// Persistence of event records
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EventStore: Send + Sync {
    async fn insert(&self, event: EventRecord) -> AppResult<EventRecord>;

    /// Matching events ordered by date, newest first
    async fn list_matching(
        &self,
        filter: &EventFilter,
        skip: i64,
        limit: i64,
    ) -> AppResult<Vec<EventRecord>>;

    async fn count_matching(&self, filter: &EventFilter) -> AppResult<i64>;

    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<EventRecord>>;

    /// Replace the mutable fields if `owner` still owns the event
    async fn update(
        &self,
        id: Uuid,
        owner: Uuid,
        changes: &EventChanges,
    ) -> AppResult<Option<EventRecord>>;

    /// Remove the event if `owner` still owns it; returns whether a row was removed
    async fn delete(&self, id: Uuid, owner: Uuid) -> AppResult<bool>;

    /// Append `user_id` to the attendees unless already present, in one write
    async fn add_attendee(&self, id: Uuid, user_id: Uuid) -> AppResult<JoinOutcome>;
}

/// Persistence of user accounts
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert a user; fails with `Conflict` when the email is taken
    async fn insert(&self, user: User) -> AppResult<User>;

    async fn get_by_email(&self, email: &str) -> AppResult<Option<User>>;

    /// Display fields for every existing user among `ids`
    async fn find_refs(&self, ids: &[Uuid]) -> AppResult<Vec<UserRef>>;
}

/// Main repository struct holding the stores
#[derive(Clone)]
pub struct Repository {
    pub events: Arc<dyn EventStore>,
    pub users: Arc<dyn UserStore>,
    pool: Option<Pool<Postgres>>,
}

impl Repository {
    /// Create a Postgres-backed repository with the given pool
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self {
            events: Arc::new(events::EventsRepository::new(pool.clone())),
            users: Arc::new(users::UsersRepository::new(pool.clone())),
            pool: Some(pool),
        }
    }

    /// Create a repository that keeps everything in process memory
    pub fn in_memory() -> Self {
        Self {
            events: Arc::new(memory::MemoryEventStore::default()),
            users: Arc::new(memory::MemoryUserStore::default()),
            pool: None,
        }
    }

    pub fn with_stores(events: Arc<dyn EventStore>, users: Arc<dyn UserStore>) -> Self {
        Self {
            events,
            users,
            pool: None,
        }
    }

    /// Check that the backing database answers
    pub async fn ping(&self) -> AppResult<()> {
        if let Some(ref pool) = self.pool {
            sqlx::query("SELECT 1").execute(pool).await?;
        }
        Ok(())
    }
}
