//! Data models for EventHub

pub mod event;
pub mod pagination;
pub mod user;

// Re-export commonly used types
pub use event::{Event, EventChanges, EventPayload, EventQuery, EventRecord};
pub use pagination::{PageRequest, PaginationMeta};
pub use user::{User, UserClaims, UserRef};
