//! Business logic services

pub mod auth;
pub mod events;

use crate::{config::AppConfig, repository::Repository};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub auth: auth::AuthService,
    pub events: events::EventsService,
    repository: Repository,
}

impl Services {
    /// Create all services with the given repository
    pub fn new(repository: Repository, config: &AppConfig) -> Self {
        Self {
            auth: auth::AuthService::new(repository.clone(), config.auth.clone()),
            events: events::EventsService::new(repository.clone(), config.events.clone()),
            repository,
        }
    }

    pub fn repository(&self) -> &Repository {
        &self.repository
    }
}
