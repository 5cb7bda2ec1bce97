use teloxide::{prelude::Requester, types::Message, utils::command::BotCommands, Bot};
use tracing::instrument;

use crate::controller::{self, Sender};
use crate::database::connection::QuizStore;
use crate::{AppContext, HandlerResult};

#[derive(Debug, Clone, BotCommands)]
#[command(rename_rule = "lowercase")]
pub enum Command {
    #[command(description = "display help.")]
    Help,
    #[command(description = "show the topic menu.")]
    Start,
}

/// Account behind a message; channel posts fall back to the chat itself.
pub(crate) fn sender_of(msg: &Message) -> Sender {
    match msg.from.as_ref() {
        Some(user) => Sender::from(user),
        None => Sender {
            telegram_id: msg.chat.id.0,
            name: msg.chat.username().unwrap_or("anonymous").to_owned(),
        },
    }
}

pub(crate) async fn help(bot: Bot, msg: Message) -> HandlerResult {
    bot.send_message(msg.chat.id, Command::descriptions().to_string())
        .await?;
    Ok(())
}

#[instrument(level = "info", skip(bot, ctx, msg), fields(chat = msg.chat.id.0))]
pub(crate) async fn start<S: QuizStore>(bot: Bot, msg: Message, ctx: AppContext<S>) -> HandlerResult {
    let sender = sender_of(&msg);
    let state = controller::on_start(&ctx, &bot, msg.chat.id, &sender).await?;
    tracing::debug!(?state, "start handled");
    Ok(())
}
