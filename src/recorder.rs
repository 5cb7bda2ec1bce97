use tracing::instrument;

use crate::database::connection::{CreateAnswer, EditUser};
use crate::database::model::{NewAnswer, Question, TopicId, User};
use crate::error::QuizError;
use crate::grader::{grade, Grade};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recorded {
    /// `false` when this user had already answered the question.
    pub recorded: bool,
    pub grade: Grade,
}

/// Grades the selection and stores it once per user and question.
///
/// The answer row is written before the user's counters move. A duplicate
/// submission leaves both untouched and reports `recorded = false`.
#[instrument(level = "info", skip(store, question, user), fields(question = question.id, user = user.telegram_id))]
pub async fn record<S>(
    store: &S,
    question: &Question,
    topic_id: TopicId,
    user: &User,
    selection: Option<usize>,
) -> Result<Recorded, QuizError>
where
    S: CreateAnswer + EditUser,
{
    let grade = grade(question, selection)?;

    let answer = match selection.and_then(|index| question.options().get(index)) {
        Some(option) if question.has_options => option.text.clone(),
        _ => grade.correct_text.clone(),
    };

    let inserted = store
        .create_answer(NewAnswer {
            user_id: user.id,
            telegram_id: user.telegram_id,
            question_id: question.id,
            topic_id,
            answer,
            is_correct: grade.is_correct,
        })
        .await;

    match inserted {
        Ok(_) => {}
        Err(QuizError::Conflict(reason)) => {
            tracing::info!("duplicate answer ignored: {reason}");
            return Ok(Recorded {
                recorded: false,
                grade,
            });
        }
        Err(e) => return Err(e),
    }

    let updated = store
        .apply_answer(user.id, question.id, grade.is_correct)
        .await?;
    tracing::info!(
        answered = updated.questions_answered_count,
        correct = updated.correct_answers_count,
        "answer recorded"
    );

    Ok(Recorded {
        recorded: true,
        grade,
    })
}
