//! Application state shared across handlers

use crate::{middleware::TokenVerifier, service::TaskService, settings::Settings};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState<S, U> {
    pub task_service: TaskService<S, U>,
    pub verifier: TokenVerifier,
    pub settings: Settings,
}

impl<S, U> AppState<S, U> {
    pub fn new(task_service: TaskService<S, U>, verifier: TokenVerifier, settings: Settings) -> Self {
        Self {
            task_service,
            verifier,
            settings,
        }
    }
}
