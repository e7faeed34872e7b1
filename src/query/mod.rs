//! Event filtering: date-filter keywords and the listing predicate

pub mod date_range;
pub mod filter;

pub use date_range::{DateFilter, DateRange, WeekStart};
pub use filter::EventFilter;
