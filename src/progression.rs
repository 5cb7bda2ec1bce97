use tracing::instrument;

use crate::database::connection::{RetrieveAnswer, RetrieveQuestion};
use crate::database::model::{Question, TelegramId, TopicId};
use crate::error::QuizError;

#[derive(Debug, Clone, PartialEq)]
pub enum Progress {
    Next(Question),
    Exhausted,
}

/// Next question of `topic_id` for the user: the lowest question id above the
/// one they answered last in that topic. Progress is derived from the answer
/// log alone, so it survives restarts without a cursor table.
#[instrument(level = "debug", skip(store))]
pub async fn next_question<S>(
    store: &S,
    telegram_id: TelegramId,
    topic_id: TopicId,
) -> Result<Progress, QuizError>
where
    S: RetrieveAnswer + RetrieveQuestion,
{
    let last_id = store
        .latest_answer(telegram_id, topic_id)
        .await?
        .map(|answer| answer.question_id)
        .unwrap_or(0);

    let progress = match store.first_question_after(topic_id, last_id).await? {
        Some(question) => Progress::Next(question),
        None => Progress::Exhausted,
    };

    Ok(progress)
}
