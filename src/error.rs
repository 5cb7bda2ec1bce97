use std::fmt;

use thiserror::Error;

/// Kind of record a lookup failed to find.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    Topic,
    Question,
    User,
    /// The option list of a question that should have options.
    Options,
    /// The hidden answer of a free-form question.
    Answer,
    /// The option marked correct.
    CorrectOption,
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Entity::Topic => "topic",
            Entity::Question => "question",
            Entity::User => "user",
            Entity::Options => "options of question",
            Entity::Answer => "answer of question",
            Entity::CorrectOption => "correct option of question",
        };
        f.write_str(name)
    }
}

/// Failures raised by the store and the quiz engine.
///
/// Only the conversation controller and the admin API turn these into
/// user-visible text or status codes.
#[derive(Error, Debug)]
pub enum QuizError {
    #[error("{entity} '{key}' not found")]
    NotFound { entity: Entity, key: String },

    #[error("invalid selection: {0}")]
    InvalidSelection(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("invalid input: {0}")]
    Validation(String),

    #[error("store unavailable: {0}")]
    StoreUnavailable(#[from] sqlx::Error),
}

impl QuizError {
    pub fn not_found(entity: Entity, key: impl ToString) -> Self {
        QuizError::NotFound {
            entity,
            key: key.to_string(),
        }
    }
}
