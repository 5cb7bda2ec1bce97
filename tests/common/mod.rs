#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use quiztrainer::{
    channel::MessagingChannel,
    controller::Sender,
    database::{
        memory::MemStore,
        model::{Question, QuizOption, Topic},
    },
    keyboard::Button,
    resolver::RANDOM_TOPIC_LABEL,
    AppContext, HandlerResult,
};
use teloxide::types::ChatId;

pub const BUCHHALTUNG: i64 = 3;
pub const WEG: i64 = 5;
pub const GEWERBE: i64 = 8;

/// Topic 3 holds questions 101 (options, "B" correct), 102 (free-form) and
/// 105 (options, first correct); topic 5 holds 201; topic 8 is empty.
pub fn seeded_store() -> MemStore {
    MemStore::seeded(
        vec![
            Topic { id: BUCHHALTUNG, name: "Buchhaltung".into() },
            Topic { id: WEG, name: "WEG Verwaltung".into() },
            Topic { id: GEWERBE, name: "Gewerbeimmobilien".into() },
        ],
        vec![
            Question::with_options(
                101,
                BUCHHALTUNG,
                "Was gehört auf die Passivseite?",
                vec![QuizOption::new("A", false), QuizOption::new("B", true)],
            ),
            Question::free_form(102, BUCHHALTUNG, "Was ist eine Bilanz?", "Eine Gegenüberstellung von Vermögen und Kapital."),
            Question::with_options(
                105,
                BUCHHALTUNG,
                "Was ist ein Soll-Konto?",
                vec![
                    QuizOption::new("Linke Seite", true),
                    QuizOption::new("Rechte Seite", false),
                    QuizOption::new("Beide", false),
                ],
            ),
            Question::free_form(201, WEG, "Was ist eine WEG?", "Eine Wohnungseigentümergemeinschaft."),
        ],
    )
}

pub fn context(store: MemStore) -> AppContext<MemStore> {
    AppContext::new(Arc::new(store), RANDOM_TOPIC_LABEL)
}

pub fn sender(telegram_id: i64) -> Sender {
    Sender {
        telegram_id,
        name: "Erika Mustermann".into(),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Sent {
    Text { chat: ChatId, text: String },
    Menu { chat: ChatId, text: String, rows: Vec<Vec<String>> },
    Prompt { chat: ChatId, text: String, buttons: Vec<Button> },
    Ack(String),
}

/// Messaging channel that keeps everything sent through it.
#[derive(Debug, Default)]
pub struct RecordingChannel {
    sent: Mutex<Vec<Sent>>,
    fail_text: bool,
}

impl RecordingChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// A channel whose text messages never get delivered.
    pub fn failing_text() -> Self {
        Self {
            fail_text: true,
            ..Self::default()
        }
    }

    /// Returns and clears what was sent so far.
    pub fn take(&self) -> Vec<Sent> {
        std::mem::take(&mut *self.sent.lock().unwrap())
    }

    fn push(&self, sent: Sent) {
        self.sent.lock().unwrap().push(sent);
    }
}

impl MessagingChannel for RecordingChannel {
    async fn send_text(&self, chat: ChatId, text: &str) -> HandlerResult {
        if self.fail_text {
            return Err("chat unreachable".into());
        }
        self.push(Sent::Text { chat, text: text.to_owned() });
        Ok(())
    }

    async fn send_menu(&self, chat: ChatId, text: &str, rows: &[Vec<String>]) -> HandlerResult {
        self.push(Sent::Menu {
            chat,
            text: text.to_owned(),
            rows: rows.to_vec(),
        });
        Ok(())
    }

    async fn send_prompt(&self, chat: ChatId, text: &str, buttons: &[Button]) -> HandlerResult {
        self.push(Sent::Prompt {
            chat,
            text: text.to_owned(),
            buttons: buttons.to_vec(),
        });
        Ok(())
    }

    async fn acknowledge(&self, callback_id: &str) -> HandlerResult {
        self.push(Sent::Ack(callback_id.to_owned()));
        Ok(())
    }
}
