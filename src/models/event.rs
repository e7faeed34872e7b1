//! Event model

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::{
        pagination::{PageRequest, PaginationMeta},
        user::UserRef,
    },
};

/// Event record as persisted
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct EventRecord {
    pub id: Uuid,
    pub title: String,
    pub organizer: String,
    /// Event date and time (UTC)
    #[sqlx(rename = "event_date")]
    pub date: DateTime<Utc>,
    pub location: String,
    pub description: String,
    /// Owner, immutable after creation
    pub created_by: Uuid,
    /// Users who joined, in join order, without duplicates
    pub attendees: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl EventRecord {
    pub fn new(changes: EventChanges, created_by: Uuid, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: changes.title,
            organizer: changes.organizer,
            date: changes.date,
            location: changes.location,
            description: changes.description,
            created_by,
            attendees: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn attendee_count(&self) -> usize {
        self.attendees.len()
    }

    pub fn has_attendee(&self, user_id: Uuid) -> bool {
        self.attendees.contains(&user_id)
    }

    /// Time of day in UTC (HH:MM)
    pub fn time(&self) -> String {
        self.date.format("%H:%M").to_string()
    }

    /// Calendar date in UTC (YYYY-MM-DD)
    pub fn date_only(&self) -> String {
        self.date.format("%Y-%m-%d").to_string()
    }

    pub fn apply(&mut self, changes: &EventChanges, now: DateTime<Utc>) {
        self.title = changes.title.clone();
        self.organizer = changes.organizer.clone();
        self.date = changes.date;
        self.location = changes.location.clone();
        self.description = changes.description.clone();
        self.updated_at = now;
    }

    /// Every user id referenced by this event
    pub fn referenced_users(&self) -> impl Iterator<Item = Uuid> + '_ {
        std::iter::once(self.created_by).chain(self.attendees.iter().copied())
    }
}

/// Validated values of the owner-editable fields
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventChanges {
    pub title: String,
    pub organizer: String,
    pub date: DateTime<Utc>,
    pub location: String,
    pub description: String,
}

/// Create/update event request
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct EventPayload {
    #[serde(default)]
    #[validate(length(min = 1, message = "Title is required"))]
    pub title: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "Organizer is required"))]
    pub organizer: String,
    /// Event date (YYYY-MM-DD), or a full RFC 3339 instant when `time` is empty
    #[serde(default)]
    #[validate(length(min = 1, message = "Date is required"))]
    pub date: String,
    /// Start time in UTC (HH:MM)
    #[serde(default)]
    pub time: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "Location is required"))]
    pub location: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "Description is required"))]
    pub description: String,
}

impl EventPayload {
    /// Trim, validate and merge date + time into a UTC instant
    pub fn into_changes(self) -> AppResult<EventChanges> {
        let payload = Self {
            title: self.title.trim().to_string(),
            organizer: self.organizer.trim().to_string(),
            date: self.date.trim().to_string(),
            time: self.time.trim().to_string(),
            location: self.location.trim().to_string(),
            description: self.description.trim().to_string(),
        };
        payload.validate()?;

        let date = parse_event_instant(&payload.date, &payload.time)?;

        Ok(EventChanges {
            title: payload.title,
            organizer: payload.organizer,
            date,
            location: payload.location,
            description: payload.description,
        })
    }
}

fn parse_event_instant(date: &str, time: &str) -> AppResult<DateTime<Utc>> {
    if time.is_empty() {
        return DateTime::parse_from_rfc3339(date)
            .map(|d| d.with_timezone(&Utc))
            .map_err(|_| AppError::Validation("Time is required".to_string()));
    }

    let day = NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map_err(|_| AppError::Validation("Invalid date, expected YYYY-MM-DD".to_string()))?;
    let at = NaiveTime::parse_from_str(time, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(time, "%H:%M:%S"))
        .map_err(|_| AppError::Validation("Invalid time, expected HH:MM".to_string()))?;

    Ok(day.and_time(at).and_utc())
}

/// Event as returned by the API, with references resolved
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: Uuid,
    pub title: String,
    pub organizer: String,
    pub date: DateTime<Utc>,
    /// Time of day (HH:MM, UTC)
    pub time: String,
    /// Calendar date (YYYY-MM-DD, UTC)
    pub date_only: String,
    pub location: String,
    pub description: String,
    /// Owner; null when the user no longer exists
    pub created_by: Option<UserRef>,
    pub attendees: Vec<UserRef>,
    pub attendee_count: usize,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Event {
    /// Build the API view using a lookup of referenced users
    pub fn resolve(record: EventRecord, users: &HashMap<Uuid, UserRef>) -> Self {
        let time = record.time();
        let date_only = record.date_only();
        let attendee_count = record.attendee_count();
        let created_by = users.get(&record.created_by).map(UserRef::without_email);
        let attendees = record
            .attendees
            .iter()
            .filter_map(|id| users.get(id).cloned())
            .collect();

        Self {
            id: record.id,
            title: record.title,
            organizer: record.organizer,
            date: record.date,
            time,
            date_only,
            location: record.location,
            description: record.description,
            created_by,
            attendees,
            attendee_count,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

/// One page of a listing with its pagination metadata
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct EventPage {
    pub events: Vec<Event>,
    pub pagination: PaginationMeta,
}

/// Query parameters for event listings
#[derive(Debug, Clone, Default, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
#[serde(rename_all = "camelCase")]
pub struct EventQuery {
    /// Case-insensitive title search
    pub search: Option<String>,
    /// One of today, current-week, last-week, current-month, last-month, upcoming, past
    pub date_filter: Option<String>,
    /// Page number (1-based, default 1)
    pub page: Option<String>,
    /// Items per page (default 10)
    pub limit: Option<String>,
}

impl EventQuery {
    pub fn page_request(&self) -> PageRequest {
        PageRequest::from_raw(self.page.as_deref(), self.limit.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload() -> EventPayload {
        EventPayload {
            title: "  Rust Meetup ".into(),
            organizer: "Ferris".into(),
            date: "2024-03-15".into(),
            time: "10:00".into(),
            location: "Berlin".into(),
            description: "Talks".into(),
        }
    }

    #[test]
    fn test_date_and_time_are_merged_in_utc() {
        let changes = payload().into_changes().unwrap();
        assert_eq!(changes.title, "Rust Meetup");
        assert_eq!(changes.date.to_rfc3339(), "2024-03-15T10:00:00+00:00");
    }

    #[test]
    fn test_full_instant_without_time() {
        let mut p = payload();
        p.date = "2024-03-15T10:00:00+02:00".into();
        p.time = String::new();
        let changes = p.into_changes().unwrap();
        assert_eq!(changes.date.to_rfc3339(), "2024-03-15T08:00:00+00:00");
    }

    #[test]
    fn test_blank_field_is_rejected() {
        let mut p = payload();
        p.organizer = "   ".into();
        match p.into_changes() {
            Err(AppError::Validation(msg)) => assert_eq!(msg, "Organizer is required"),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_missing_fields_deserialize_as_empty() {
        let p: EventPayload = serde_json::from_value(serde_json::json!({ "title": "x" })).unwrap();
        assert!(matches!(p.into_changes(), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_bad_time_is_rejected() {
        let mut p = payload();
        p.time = "25:99".into();
        assert!(matches!(p.into_changes(), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_computed_fields() {
        let owner = Uuid::new_v4();
        let joiner = Uuid::new_v4();
        let mut record = EventRecord::new(payload().into_changes().unwrap(), owner, Utc::now());
        record.attendees.push(joiner);

        let mut users = HashMap::new();
        users.insert(
            owner,
            UserRef { id: owner, name: "Owner".into(), email: Some("o@x.io".into()), photo_url: None },
        );
        users.insert(
            joiner,
            UserRef { id: joiner, name: "Joiner".into(), email: Some("j@x.io".into()), photo_url: None },
        );

        let event = Event::resolve(record, &users);
        assert_eq!(event.time, "10:00");
        assert_eq!(event.date_only, "2024-03-15");
        assert_eq!(event.attendee_count, 1);
        assert_eq!(event.created_by.as_ref().map(|u| u.name.as_str()), Some("Owner"));
        assert_eq!(event.created_by.as_ref().and_then(|u| u.email.clone()), None);
        assert_eq!(event.attendees[0].email.as_deref(), Some("j@x.io"));

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["attendeeCount"], 1);
        assert_eq!(json["dateOnly"], "2024-03-15");
        assert!(json["createdBy"].is_object());
    }
}
