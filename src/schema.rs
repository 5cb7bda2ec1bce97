use teloxide::{
    dispatching::{dialogue::GetChatId, UpdateFilterExt, UpdateHandler},
    dptree,
    types::{CallbackQuery, ChatId, Message, Update},
    Bot,
};
use tracing::instrument;

use crate::{
    commands::{help, sender_of, start, Command},
    controller::{self, Sender},
    database::connection::QuizStore,
    AppContext, BoxError, HandlerResult,
};

/// Dispatch tree: commands first, any other text is a topic label, and
/// callback queries are option taps.
pub fn schema<S: QuizStore>() -> UpdateHandler<BoxError> {
    use dptree::case;

    let command_handler = teloxide::filter_command::<Command, _>()
        .branch(case![Command::Help].endpoint(help))
        .branch(case![Command::Start].endpoint(start::<S>));

    let message_handler = Update::filter_message()
        .branch(command_handler)
        .endpoint(topic_label::<S>);

    let callback_handler = Update::filter_callback_query().endpoint(button_tap::<S>);

    dptree::entry()
        .branch(message_handler)
        .branch(callback_handler)
}

#[instrument(level = "info", skip(bot, ctx, msg), fields(chat = msg.chat.id.0))]
async fn topic_label<S: QuizStore>(bot: Bot, msg: Message, ctx: AppContext<S>) -> HandlerResult {
    let sender = sender_of(&msg);
    let state =
        controller::on_topic_label(&ctx, &bot, msg.chat.id, &sender, msg.text()).await?;
    tracing::debug!(?state, "topic label handled");
    Ok(())
}

#[instrument(level = "info", skip(bot, ctx, q), fields(from = q.from.id.0))]
async fn button_tap<S: QuizStore>(bot: Bot, q: CallbackQuery, ctx: AppContext<S>) -> HandlerResult {
    let sender = Sender::from(&q.from);
    let chat = q.chat_id().unwrap_or(ChatId(sender.telegram_id));
    let state = controller::on_button_tap(
        &ctx,
        &bot,
        chat,
        &sender,
        &q.id,
        q.data.as_deref(),
    )
    .await?;
    tracing::debug!(?state, "button tap handled");
    Ok(())
}
