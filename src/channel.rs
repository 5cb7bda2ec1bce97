use std::future::Future;

use teloxide::{
    payloads::SendMessageSetters,
    prelude::Requester,
    types::ChatId,
    Bot,
};

use crate::keyboard::{menu_markup, prompt_markup, Button};
use crate::HandlerResult;

/// Outbound side of the chat transport.
pub trait MessagingChannel: Send + Sync {
    fn send_text(&self, chat: ChatId, text: &str) -> impl Future<Output = HandlerResult> + Send;

    /// Text with a persistent reply keyboard of labels.
    fn send_menu(
        &self,
        chat: ChatId,
        text: &str,
        rows: &[Vec<String>],
    ) -> impl Future<Output = HandlerResult> + Send;

    /// Text with "pick one" inline buttons.
    fn send_prompt(
        &self,
        chat: ChatId,
        text: &str,
        buttons: &[Button],
    ) -> impl Future<Output = HandlerResult> + Send;

    /// Dismisses the loading state of a tapped button.
    fn acknowledge(&self, callback_id: &str) -> impl Future<Output = HandlerResult> + Send;
}

impl MessagingChannel for Bot {
    async fn send_text(&self, chat: ChatId, text: &str) -> HandlerResult {
        self.send_message(chat, text).await?;
        Ok(())
    }

    async fn send_menu(&self, chat: ChatId, text: &str, rows: &[Vec<String>]) -> HandlerResult {
        self.send_message(chat, text)
            .reply_markup(menu_markup(rows))
            .await?;
        Ok(())
    }

    async fn send_prompt(&self, chat: ChatId, text: &str, buttons: &[Button]) -> HandlerResult {
        self.send_message(chat, text)
            .reply_markup(prompt_markup(buttons))
            .await?;
        Ok(())
    }

    async fn acknowledge(&self, callback_id: &str) -> HandlerResult {
        self.answer_callback_query(callback_id.to_owned()).await?;
        Ok(())
    }
}
