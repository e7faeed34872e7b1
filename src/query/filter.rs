//! Event predicate shared by the listing and counting queries

use chrono::{DateTime, Utc};
use sqlx::{Postgres, QueryBuilder};
use uuid::Uuid;

use super::date_range::{resolve_keyword, DateRange, WeekStart};
use crate::models::event::EventRecord;

/// Conjunction of the optional search, date and ownership conditions.
///
/// An empty filter matches every event.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventFilter {
    /// Case-insensitive substring of the title
    pub search: Option<String>,
    pub range: Option<DateRange>,
    pub owner: Option<Uuid>,
}

impl EventFilter {
    /// Build a filter from raw listing parameters.
    pub fn build(
        search: Option<&str>,
        date_filter: Option<&str>,
        owner: Option<Uuid>,
        now: DateTime<Utc>,
        week_start: WeekStart,
    ) -> Self {
        Self {
            search: search
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string),
            range: resolve_keyword(date_filter, now, week_start),
            owner,
        }
    }

    /// Evaluate the predicate against a stored event
    pub fn matches(&self, event: &EventRecord) -> bool {
        if let Some(ref search) = self.search {
            if !event.title.to_lowercase().contains(&search.to_lowercase()) {
                return false;
            }
        }
        if let Some(range) = self.range {
            if !range.contains(event.date) {
                return false;
            }
        }
        if let Some(owner) = self.owner {
            if event.created_by != owner {
                return false;
            }
        }
        true
    }

    /// Append the predicate as a `WHERE` clause
    pub fn push_where(&self, builder: &mut QueryBuilder<'_, Postgres>) {
        let mut keyword = " WHERE ";

        if let Some(ref search) = self.search {
            builder
                .push(keyword)
                .push("title ILIKE ")
                .push_bind(format!("%{}%", escape_like(search)))
                .push(" ESCAPE '\\'");
            keyword = " AND ";
        }
        if let Some(range) = self.range {
            if let Some(start) = range.start {
                builder.push(keyword).push("event_date >= ").push_bind(start);
                keyword = " AND ";
            }
            if let Some(end) = range.end {
                builder.push(keyword).push("event_date < ").push_bind(end);
                keyword = " AND ";
            }
        }
        if let Some(owner) = self.owner {
            builder.push(keyword).push("created_by = ").push_bind(owner);
        }
    }
}

/// Escape `LIKE` wildcards so the search text is matched literally
fn escape_like(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn record(title: &str, date: DateTime<Utc>, owner: Uuid) -> EventRecord {
        EventRecord {
            id: Uuid::new_v4(),
            title: title.to_string(),
            organizer: "Org".to_string(),
            date,
            location: "Hall".to_string(),
            description: "Desc".to_string(),
            created_by: owner,
            attendees: Vec::new(),
            created_at: date,
            updated_at: date,
        }
    }

    #[test]
    fn test_empty_filter_matches_all() {
        let e = record("Anything", Utc::now(), Uuid::new_v4());
        assert!(EventFilter::default().matches(&e));
    }

    #[test]
    fn test_search_is_case_insensitive_substring() {
        let e = record("Rust Meetup Berlin", Utc::now(), Uuid::new_v4());
        let f = |s: &str| EventFilter {
            search: Some(s.to_string()),
            ..Default::default()
        };
        assert!(f("meetup").matches(&e));
        assert!(f("ST MEE").matches(&e));
        assert!(!f("meetup paris").matches(&e));
    }

    #[test]
    fn test_all_conditions_are_conjoined() {
        let owner = Uuid::new_v4();
        let now = Utc.with_ymd_and_hms(2024, 3, 15, 12, 0, 0).unwrap();
        let filter = EventFilter::build(Some("jazz"), Some("today"), Some(owner), now, WeekStart::Sunday);

        let today = Utc.with_ymd_and_hms(2024, 3, 15, 20, 0, 0).unwrap();
        let tomorrow = Utc.with_ymd_and_hms(2024, 3, 16, 0, 0, 0).unwrap();

        assert!(filter.matches(&record("Jazz night", today, owner)));
        assert!(!filter.matches(&record("Jazz night", tomorrow, owner)));
        assert!(!filter.matches(&record("Jazz night", today, Uuid::new_v4())));
        assert!(!filter.matches(&record("Rock night", today, owner)));
    }

    #[test]
    fn test_blank_inputs_are_ignored() {
        let filter = EventFilter::build(Some("  "), Some(""), None, Utc::now(), WeekStart::Sunday);
        assert_eq!(filter, EventFilter::default());
    }

    #[test]
    fn test_push_where_renders_conditions() {
        let now = Utc.with_ymd_and_hms(2024, 3, 15, 12, 0, 0).unwrap();
        let filter = EventFilter::build(Some("50%"), Some("upcoming"), Some(Uuid::nil()), now, WeekStart::Sunday);
        let mut builder = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM events");
        filter.push_where(&mut builder);
        assert_eq!(
            builder.sql(),
            "SELECT COUNT(*) FROM events WHERE title ILIKE $1 ESCAPE '\\' AND event_date >= $2 AND created_by = $3"
        );
    }

    #[test]
    fn test_push_where_renders_both_bounds() {
        let now = Utc.with_ymd_and_hms(2024, 3, 15, 12, 0, 0).unwrap();
        let filter = EventFilter::build(None, Some("last-month"), None, now, WeekStart::Sunday);
        assert_eq!(
            filter.range,
            Some(DateRange::between(
                Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap(),
                Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap(),
            ))
        );

        let mut builder = QueryBuilder::<Postgres>::new("SELECT * FROM events");
        filter.push_where(&mut builder);
        assert_eq!(
            builder.sql(),
            "SELECT * FROM events WHERE event_date >= $1 AND event_date < $2"
        );
    }

    #[test]
    fn test_push_where_empty() {
        let mut builder = QueryBuilder::<Postgres>::new("SELECT * FROM events");
        EventFilter::default().push_where(&mut builder);
        assert_eq!(builder.sql(), "SELECT * FROM events");
    }

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("50%_off\\"), "50\\%\\_off\\\\");
        assert_eq!(escape_like("plain"), "plain");
    }
}
