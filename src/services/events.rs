//! Events service

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
    config::EventsConfig,
    error::{AppError, AppResult},
    models::{
        event::{Event, EventPage, EventPayload, EventQuery, EventRecord},
        pagination::PageRequest,
    },
    query::EventFilter,
    repository::{JoinOutcome, Repository},
};

#[derive(Clone)]
pub struct EventsService {
    repository: Repository,
    config: EventsConfig,
}

impl EventsService {
    pub fn new(repository: Repository, config: EventsConfig) -> Self {
        Self { repository, config }
    }

    /// Create an event owned by `actor`
    pub async fn create(&self, actor: Uuid, payload: EventPayload) -> AppResult<Event> {
        let changes = payload.into_changes()?;
        let record = EventRecord::new(changes, actor, Utc::now());
        let record = self.repository.events.insert(record).await?;
        tracing::info!(event_id = %record.id, created_by = %actor, "Event created");
        self.resolve_one(record).await
    }

    /// Search/filter/paginate all events, with date filters evaluated at `now`
    pub async fn list(&self, query: &EventQuery, now: DateTime<Utc>) -> AppResult<EventPage> {
        let filter = self.filter_for(query, None, now);
        self.list_page(&filter, query.page_request()).await
    }

    /// Same as [`list`](Self::list), restricted to events created by `actor`
    pub async fn list_for_user(
        &self,
        actor: Uuid,
        query: &EventQuery,
        now: DateTime<Utc>,
    ) -> AppResult<EventPage> {
        let filter = self.filter_for(query, Some(actor), now);
        self.list_page(&filter, query.page_request()).await
    }

    /// Most recent events by date, no filtering
    pub async fn latest(&self) -> AppResult<Vec<Event>> {
        let records = self
            .repository
            .events
            .list_matching(&EventFilter::default(), 0, i64::from(self.config.latest_count))
            .await?;
        self.resolve(records).await
    }

    pub async fn get_by_id(&self, id: Uuid) -> AppResult<Event> {
        let record = self.load(id).await?;
        self.resolve_one(record).await
    }

    /// Replace the editable fields; only the owner may do this
    pub async fn update(&self, id: Uuid, actor: Uuid, payload: EventPayload) -> AppResult<Event> {
        let record = self.load(id).await?;
        ensure_owner(&record, actor, "update")?;
        let changes = payload.into_changes()?;

        let updated = self
            .repository
            .events
            .update(id, actor, &changes)
            .await?
            .ok_or_else(|| not_found(id))?;
        tracing::info!(event_id = %id, "Event updated");
        self.resolve_one(updated).await
    }

    /// Delete an event; only the owner may do this
    pub async fn delete(&self, id: Uuid, actor: Uuid) -> AppResult<()> {
        let record = self.load(id).await?;
        ensure_owner(&record, actor, "delete")?;

        if !self.repository.events.delete(id, actor).await? {
            return Err(not_found(id));
        }
        tracing::info!(event_id = %id, "Event deleted");
        Ok(())
    }

    /// Register `actor` as an attendee.
    ///
    /// A user who already joined gets `Conflict` and the attendee list is
    /// left untouched. The final write is conditional, so two simultaneous
    /// joins by the same user still add a single entry.
    pub async fn join(&self, id: Uuid, actor: Uuid) -> AppResult<Event> {
        let record = self.load(id).await?;
        if record.has_attendee(actor) {
            return Err(already_joined());
        }

        match self.repository.events.add_attendee(id, actor).await? {
            JoinOutcome::Joined(updated) => {
                tracing::info!(
                    event_id = %id,
                    user_id = %actor,
                    attendees = updated.attendee_count(),
                    "User joined event"
                );
                self.resolve_one(updated).await
            }
            JoinOutcome::AlreadyJoined => Err(already_joined()),
            JoinOutcome::Missing => Err(not_found(id)),
        }
    }

    fn filter_for(&self, query: &EventQuery, owner: Option<Uuid>, now: DateTime<Utc>) -> EventFilter {
        EventFilter::build(
            query.search.as_deref(),
            query.date_filter.as_deref(),
            owner,
            now,
            self.config.week_start,
        )
    }

    async fn list_page(&self, filter: &EventFilter, page: PageRequest) -> AppResult<EventPage> {
        let events = &self.repository.events;
        let (records, total) = tokio::try_join!(
            events.list_matching(filter, page.skip(), page.limit),
            events.count_matching(filter),
        )?;

        Ok(EventPage {
            events: self.resolve(records).await?,
            pagination: page.metadata(total),
        })
    }

    async fn load(&self, id: Uuid) -> AppResult<EventRecord> {
        self.repository
            .events
            .get_by_id(id)
            .await?
            .ok_or_else(|| not_found(id))
    }

    async fn resolve_one(&self, record: EventRecord) -> AppResult<Event> {
        let mut events = self.resolve(vec![record]).await?;
        events
            .pop()
            .ok_or_else(|| AppError::Internal("Event resolution returned nothing".to_string()))
    }

    /// Resolve owner and attendee references with a single user lookup
    async fn resolve(&self, records: Vec<EventRecord>) -> AppResult<Vec<Event>> {
        let mut ids: Vec<Uuid> = records.iter().flat_map(|r| r.referenced_users()).collect();
        ids.sort_unstable();
        ids.dedup();

        let users: HashMap<Uuid, _> = self
            .repository
            .users
            .find_refs(&ids)
            .await?
            .into_iter()
            .map(|u| (u.id, u))
            .collect();

        Ok(records
            .into_iter()
            .map(|r| Event::resolve(r, &users))
            .collect())
    }
}

fn ensure_owner(record: &EventRecord, actor: Uuid, action: &str) -> AppResult<()> {
    if record.created_by == actor {
        Ok(())
    } else {
        Err(AppError::Authorization(format!(
            "Only the event owner can {} this event",
            action
        )))
    }
}

fn not_found(id: Uuid) -> AppError {
    AppError::NotFound(format!("Event {} not found", id))
}

fn already_joined() -> AppError {
    AppError::Conflict("Already joined this event".to_string())
}
