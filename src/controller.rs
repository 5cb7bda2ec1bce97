//! Conversation flow of the training bot.
//!
//! `/start` greets and shows the topic menu, a topic label presents the next
//! unanswered question of that topic, and a button tap grades and records the
//! answer. Every failure ends in a canned reply; only transport errors are
//! returned to the dispatcher.

use teloxide::types::ChatId;
use tracing::instrument;

use crate::channel::MessagingChannel;
use crate::database::connection::QuizStore;
use crate::database::model::{Question, TelegramId};
use crate::error::{Entity, QuizError};
use crate::grader::Grade;
use crate::keyboard::{question_buttons, topics_layout, Button};
use crate::payload::CallbackPayload;
use crate::progression::{next_question, Progress};
use crate::recorder::{record, Recorded};
use crate::resolver::resolve;
use crate::state::ConversationState;
use crate::{AppContext, BoxError};

pub const GREETING: &str = "Hallo! Ich bin ein Immobilien Schulung Bot 🤖 \nIch helfe dir die Immobilienbranche zu verstehen und lernen";
pub const MENU_PROMPT: &str = "Wo möchtest Du beginnen?👇";
pub const CORRECT_REPLY: &str = "Richtig! 🎉";
pub const INCORRECT_REPLY: &str = "Falsch! 😢 Die richtige Antwort ist:";
pub const NO_MORE_QUESTIONS: &str =
    "Du hast alle Fragen zu diesem Thema beantwortet. Wähle ein anderes Thema 👇";
pub const TOPIC_NOT_FOUND: &str = "Thema nicht gefunden. Bitte wähle ein Thema aus dem Menü 👇";
pub const QUESTION_NOT_FOUND: &str = "Frage nicht gefunden.";
pub const OPTIONS_NOT_FOUND: &str = "Antwortmöglichkeiten nicht gefunden.";
pub const OPTION_NOT_FOUND: &str = "Ausgewählte Option nicht gefunden.";
pub const GENERIC_ERROR: &str = "Etwas ist schiefgelaufen. Bitte versuche es später erneut.";

pub type ControllerResult = Result<ConversationState, BoxError>;

/// The Telegram account behind an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sender {
    pub telegram_id: TelegramId,
    pub name: String,
}

impl From<&teloxide::types::User> for Sender {
    fn from(user: &teloxide::types::User) -> Self {
        Self {
            telegram_id: user.id.0 as TelegramId,
            name: user.full_name(),
        }
    }
}

/// Canned reply for a failed event. Store outages are logged here.
pub fn error_reply(error: &QuizError) -> &'static str {
    match error {
        QuizError::NotFound { entity: Entity::Topic, .. } => TOPIC_NOT_FOUND,
        QuizError::NotFound { entity: Entity::Question, .. } => QUESTION_NOT_FOUND,
        QuizError::NotFound {
            entity: Entity::Options,
            ..
        } => OPTIONS_NOT_FOUND,
        QuizError::InvalidSelection(_) => OPTION_NOT_FOUND,
        QuizError::StoreUnavailable(e) => {
            tracing::error!("store unavailable: {e}");
            GENERIC_ERROR
        }
        QuizError::NotFound { .. } | QuizError::Conflict(_) | QuizError::Validation(_) => {
            GENERIC_ERROR
        }
    }
}

/// Text shown after a tap: the hidden answer, an affirmation, or the
/// correction.
pub fn outcome_text(revealed: bool, grade: &Grade) -> String {
    if revealed {
        grade.correct_text.clone()
    } else if grade.is_correct {
        CORRECT_REPLY.to_owned()
    } else {
        format!("{INCORRECT_REPLY} {}", grade.correct_text)
    }
}

#[instrument(level = "info", skip(ctx, channel))]
pub async fn on_start<S, C>(
    ctx: &AppContext<S>,
    channel: &C,
    chat: ChatId,
    sender: &Sender,
) -> ControllerResult
where
    S: QuizStore,
    C: MessagingChannel,
{
    let menu = async {
        let user = ctx
            .store
            .register_user(sender.telegram_id, &sender.name)
            .await?;
        tracing::info!(user = user.id, "user registered");
        let topics = ctx.store.topics_with_questions().await?;
        Ok::<_, QuizError>(topics_layout(&topics, &ctx.random_topic_label))
    }
    .await;

    match menu {
        Ok(rows) => {
            channel.send_text(chat, GREETING).await?;
            channel.send_menu(chat, MENU_PROMPT, &rows).await?;
            Ok(ConversationState::AwaitingTopicChoice)
        }
        Err(e) => {
            channel.send_text(chat, error_reply(&e)).await?;
            Ok(ConversationState::Idle)
        }
    }
}

async fn prepare_question<S: QuizStore>(
    ctx: &AppContext<S>,
    sender: &Sender,
    label: &str,
) -> Result<Option<(Question, Vec<Button>)>, QuizError> {
    let store = ctx.store.as_ref();
    let topic_id = resolve(store, label, &ctx.random_topic_label).await?;

    match next_question(store, sender.telegram_id, topic_id).await? {
        Progress::Next(question) => {
            let buttons = question_buttons(&question)?;
            Ok(Some((question, buttons)))
        }
        Progress::Exhausted => Ok(None),
    }
}

/// Topic selection is accepted at any time, regardless of earlier events.
#[instrument(level = "info", skip(ctx, channel))]
pub async fn on_topic_label<S, C>(
    ctx: &AppContext<S>,
    channel: &C,
    chat: ChatId,
    sender: &Sender,
    label: Option<&str>,
) -> ControllerResult
where
    S: QuizStore,
    C: MessagingChannel,
{
    let Some(label) = label else {
        channel.send_text(chat, TOPIC_NOT_FOUND).await?;
        return Ok(ConversationState::Idle);
    };

    match prepare_question(ctx, sender, label).await {
        Ok(Some((question, buttons))) => {
            tracing::info!(
                topic = question.topic_id,
                question = question.id,
                "presenting question"
            );
            channel.send_prompt(chat, &question.text, &buttons).await?;
            Ok(ConversationState::QuestionPresented {
                topic_id: question.topic_id,
                question_id: question.id,
            })
        }
        Ok(None) => {
            tracing::info!("no questions left for '{label}'");
            channel.send_text(chat, NO_MORE_QUESTIONS).await?;
            Ok(ConversationState::Idle)
        }
        Err(e) => {
            tracing::info!("topic '{label}' not served: {e}");
            channel.send_text(chat, error_reply(&e)).await?;
            Ok(ConversationState::Idle)
        }
    }
}

async fn grade_tap<S: QuizStore>(
    ctx: &AppContext<S>,
    sender: &Sender,
    data: &str,
) -> Result<(bool, Recorded), QuizError> {
    let store = ctx.store.as_ref();
    let payload = CallbackPayload::decode(data)?;

    let question = store
        .question(payload.question_id)
        .await?
        .ok_or_else(|| QuizError::not_found(Entity::Question, payload.question_id))?;
    if question.topic_id != payload.topic_id {
        return Err(QuizError::InvalidSelection(format!(
            "question {} does not belong to topic {}",
            question.id, payload.topic_id
        )));
    }

    let user = store
        .register_user(sender.telegram_id, &sender.name)
        .await?;
    let recorded = record(
        store,
        &question,
        payload.topic_id,
        &user,
        payload.option_index,
    )
    .await?;

    Ok((!question.has_options, recorded))
}

#[instrument(level = "info", skip(ctx, channel))]
pub async fn on_button_tap<S, C>(
    ctx: &AppContext<S>,
    channel: &C,
    chat: ChatId,
    sender: &Sender,
    callback_id: &str,
    data: Option<&str>,
) -> ControllerResult
where
    S: QuizStore,
    C: MessagingChannel,
{
    let reply = match data {
        Some(data) => match grade_tap(ctx, sender, data).await {
            Ok((revealed, recorded)) => outcome_text(revealed, &recorded.grade),
            Err(e) => {
                tracing::warn!("button tap rejected: {e}");
                error_reply(&e).to_owned()
            }
        },
        None => {
            tracing::warn!("button tap without payload");
            GENERIC_ERROR.to_owned()
        }
    };

    // The button stays in its loading state until acknowledged, even when
    // the reply could not be delivered.
    let sent = channel.send_text(chat, &reply).await;
    channel.acknowledge(callback_id).await?;
    sent?;
    Ok(ConversationState::Idle)
}
