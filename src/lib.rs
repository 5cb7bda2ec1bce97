use std::sync::Arc;

pub mod api;
pub mod channel;
pub mod commands;
pub mod config;
pub mod controller;
pub mod database;
pub mod error;
pub mod grader;
pub mod keyboard;
pub mod payload;
pub mod progression;
pub mod recorder;
pub mod resolver;
pub mod schema;
pub mod state;
pub mod telemetry;

pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;
pub type HandlerResult = Result<(), BoxError>;

/// Shared handles built once at startup and handed to every bot handler and
/// API route.
pub struct AppContext<S> {
    pub store: Arc<S>,
    pub random_topic_label: Arc<str>,
}

impl<S> AppContext<S> {
    pub fn new(store: Arc<S>, random_topic_label: &str) -> Self {
        Self {
            store,
            random_topic_label: Arc::from(random_topic_label),
        }
    }
}

impl<S> Clone for AppContext<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            random_topic_label: Arc::clone(&self.random_topic_label),
        }
    }
}
