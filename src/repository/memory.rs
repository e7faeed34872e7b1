//! In-process stores with the same semantics as the Postgres repositories

use std::cmp::Reverse;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{EventStore, JoinOutcome, UserStore};
use crate::{
    error::{AppError, AppResult},
    models::{
        event::{EventChanges, EventRecord},
        user::{User, UserRef},
    },
    query::EventFilter,
};

#[derive(Default)]
pub struct MemoryEventStore {
    events: RwLock<Vec<EventRecord>>,
}

impl MemoryEventStore {
    fn sorted_matches(events: &[EventRecord], filter: &EventFilter) -> Vec<EventRecord> {
        let mut matching: Vec<EventRecord> = events
            .iter()
            .filter(|e| filter.matches(e))
            .cloned()
            .collect();
        matching.sort_by_key(|e| (Reverse(e.date), Reverse(e.created_at)));
        matching
    }
}

#[async_trait]
impl EventStore for MemoryEventStore {
    async fn insert(&self, event: EventRecord) -> AppResult<EventRecord> {
        let mut events = self.events.write().await;
        if events.iter().any(|e| e.id == event.id) {
            return Err(AppError::Conflict(format!("Event {} already exists", event.id)));
        }
        events.push(event.clone());
        Ok(event)
    }

    async fn list_matching(
        &self,
        filter: &EventFilter,
        skip: i64,
        limit: i64,
    ) -> AppResult<Vec<EventRecord>> {
        let events = self.events.read().await;
        let skip = usize::try_from(skip).unwrap_or(usize::MAX);
        let limit = usize::try_from(limit).unwrap_or(0);
        Ok(Self::sorted_matches(&events, filter)
            .into_iter()
            .skip(skip)
            .take(limit)
            .collect())
    }

    async fn count_matching(&self, filter: &EventFilter) -> AppResult<i64> {
        let events = self.events.read().await;
        let count = events.iter().filter(|e| filter.matches(e)).count();
        Ok(i64::try_from(count).unwrap_or(i64::MAX))
    }

    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<EventRecord>> {
        let events = self.events.read().await;
        Ok(events.iter().find(|e| e.id == id).cloned())
    }

    async fn update(
        &self,
        id: Uuid,
        owner: Uuid,
        changes: &EventChanges,
    ) -> AppResult<Option<EventRecord>> {
        let mut events = self.events.write().await;
        let Some(event) = events.iter_mut().find(|e| e.id == id && e.created_by == owner) else {
            return Ok(None);
        };
        event.apply(changes, Utc::now());
        Ok(Some(event.clone()))
    }

    async fn delete(&self, id: Uuid, owner: Uuid) -> AppResult<bool> {
        let mut events = self.events.write().await;
        let before = events.len();
        events.retain(|e| !(e.id == id && e.created_by == owner));
        Ok(events.len() < before)
    }

    async fn add_attendee(&self, id: Uuid, user_id: Uuid) -> AppResult<JoinOutcome> {
        let mut events = self.events.write().await;
        let Some(event) = events.iter_mut().find(|e| e.id == id) else {
            return Ok(JoinOutcome::Missing);
        };
        if event.has_attendee(user_id) {
            return Ok(JoinOutcome::AlreadyJoined);
        }
        event.attendees.push(user_id);
        event.updated_at = Utc::now();
        Ok(JoinOutcome::Joined(event.clone()))
    }
}

#[derive(Default)]
pub struct MemoryUserStore {
    users: RwLock<Vec<User>>,
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn insert(&self, user: User) -> AppResult<User> {
        let mut users = self.users.write().await;
        if users.iter().any(|u| u.email == user.email) {
            return Err(AppError::Conflict("User already exists".to_string()));
        }
        users.push(user.clone());
        Ok(user)
    }

    async fn get_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let users = self.users.read().await;
        Ok(users.iter().find(|u| u.email == email).cloned())
    }

    async fn find_refs(&self, ids: &[Uuid]) -> AppResult<Vec<UserRef>> {
        let users = self.users.read().await;
        Ok(users
            .iter()
            .filter(|u| ids.contains(&u.id))
            .map(UserRef::from)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn record(title: &str, offset_days: i64, owner: Uuid) -> EventRecord {
        let base = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let mut e = EventRecord::new(
            EventChanges {
                title: title.into(),
                organizer: "Org".into(),
                date: base + Duration::days(offset_days),
                location: "Hall".into(),
                description: "Desc".into(),
            },
            owner,
            base,
        );
        e.created_at = base;
        e
    }

    #[tokio::test]
    async fn test_list_is_newest_first_and_paged() {
        let store = MemoryEventStore::default();
        let owner = Uuid::new_v4();
        for day in 0..5 {
            store.insert(record(&format!("E{}", day), day, owner)).await.unwrap();
        }

        let page = store.list_matching(&EventFilter::default(), 1, 2).await.unwrap();
        let titles: Vec<_> = page.iter().map(|e| e.title.as_str()).collect();
        assert_eq!(titles, vec!["E3", "E2"]);
        assert_eq!(store.count_matching(&EventFilter::default()).await.unwrap(), 5);
    }

    #[tokio::test]
    async fn test_owner_conditional_writes() {
        let store = MemoryEventStore::default();
        let owner = Uuid::new_v4();
        let other = Uuid::new_v4();
        let event = store.insert(record("E", 0, owner)).await.unwrap();

        assert!(!store.delete(event.id, other).await.unwrap());
        assert!(store.get_by_id(event.id).await.unwrap().is_some());
        assert!(store.delete(event.id, owner).await.unwrap());
        assert!(store.get_by_id(event.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_add_attendee_outcomes() {
        let store = MemoryEventStore::default();
        let event = store.insert(record("E", 0, Uuid::new_v4())).await.unwrap();
        let user = Uuid::new_v4();

        assert!(matches!(store.add_attendee(event.id, user).await.unwrap(), JoinOutcome::Joined(_)));
        assert_eq!(store.add_attendee(event.id, user).await.unwrap(), JoinOutcome::AlreadyJoined);
        assert_eq!(store.add_attendee(Uuid::new_v4(), user).await.unwrap(), JoinOutcome::Missing);
    }

    #[tokio::test]
    async fn test_duplicate_email_conflicts() {
        let store = MemoryUserStore::default();
        let user = User {
            id: Uuid::new_v4(),
            name: "Ada".into(),
            email: "ada@example.com".into(),
            password: "hash".into(),
            photo_url: None,
            created_at: Utc::now(),
        };
        store.insert(user.clone()).await.unwrap();
        let again = User { id: Uuid::new_v4(), ..user };
        assert!(matches!(store.insert(again).await, Err(AppError::Conflict(_))));
    }
}
