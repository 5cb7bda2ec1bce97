use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup, KeyboardButton, KeyboardMarkup};

use crate::database::model::{Question, Topic};
use crate::error::{Entity, QuizError};
use crate::payload::CallbackPayload;

pub const REVEAL_ANSWER_LABEL: &str = "die Antwort bekommen";

const TOPICS_PER_ROW: usize = 2;

/// Inline button: visible label plus the callback data sent back on tap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Button {
    pub label: String,
    pub data: String,
}

/// Topic names two per row, the random-topic label on its own last row.
pub fn topics_layout(topics: &[Topic], random_label: &str) -> Vec<Vec<String>> {
    let mut rows: Vec<Vec<String>> = topics
        .chunks(TOPICS_PER_ROW)
        .map(|chunk| chunk.iter().map(|topic| topic.name.clone()).collect())
        .collect();
    rows.push(vec![random_label.to_owned()]);
    rows
}

/// One button per option in display order, or a single reveal button for
/// free-form questions.
pub fn question_buttons(question: &Question) -> Result<Vec<Button>, QuizError> {
    if !question.has_options {
        return Ok(vec![Button {
            label: REVEAL_ANSWER_LABEL.to_owned(),
            data: CallbackPayload::reveal(question.topic_id, question.id).encode()?,
        }]);
    }

    if question.options().is_empty() {
        return Err(QuizError::not_found(Entity::Options, question.id));
    }

    question
        .options()
        .iter()
        .enumerate()
        .map(|(index, option)| {
            Ok(Button {
                label: option.text.clone(),
                data: CallbackPayload::option(question.topic_id, question.id, index).encode()?,
            })
        })
        .collect()
}

pub(crate) fn menu_markup(rows: &[Vec<String>]) -> KeyboardMarkup {
    let keyboard: Vec<Vec<KeyboardButton>> = rows
        .iter()
        .map(|row| row.iter().map(KeyboardButton::new).collect())
        .collect();

    KeyboardMarkup::new(keyboard)
}

pub(crate) fn prompt_markup(buttons: &[Button]) -> InlineKeyboardMarkup {
    let keyboard: Vec<Vec<InlineKeyboardButton>> = buttons
        .iter()
        .map(|button| {
            vec![InlineKeyboardButton::callback(
                button.label.clone(),
                button.data.clone(),
            )]
        })
        .collect();

    InlineKeyboardMarkup::new(keyboard)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::model::QuizOption;

    fn topic(id: i64, name: &str) -> Topic {
        Topic {
            id,
            name: name.into(),
        }
    }

    #[test]
    fn topics_are_laid_out_in_pairs() {
        let rows = topics_layout(
            &[
                topic(1, "Immobilienarten"),
                topic(2, "Technische Verwaltung"),
                topic(3, "Buchhaltung"),
            ],
            "Random Frage",
        );
        assert_eq!(
            rows,
            vec![
                vec!["Immobilienarten".to_string(), "Technische Verwaltung".to_string()],
                vec!["Buchhaltung".to_string()],
                vec!["Random Frage".to_string()],
            ]
        );
    }

    #[test]
    fn option_buttons_carry_their_index() {
        let question = Question::with_options(
            101,
            3,
            "Welche Option?",
            vec![QuizOption::new("A", false), QuizOption::new("B", true)],
        );
        let buttons = question_buttons(&question).unwrap();
        assert_eq!(buttons.len(), 2);
        assert_eq!(buttons[1].label, "B");
        assert_eq!(
            CallbackPayload::decode(&buttons[1].data).unwrap(),
            CallbackPayload::option(3, 101, 1)
        );
    }

    #[test]
    fn free_form_question_gets_reveal_button() {
        let question = Question::free_form(7, 3, "Was ist AfA?", "Absetzung für Abnutzung");
        let buttons = question_buttons(&question).unwrap();
        assert_eq!(buttons.len(), 1);
        assert_eq!(buttons[0].label, REVEAL_ANSWER_LABEL);
        assert_eq!(
            CallbackPayload::decode(&buttons[0].data).unwrap(),
            CallbackPayload::reveal(3, 7)
        );
    }

    #[test]
    fn choice_question_without_options_is_rejected() {
        let mut question = Question::with_options(8, 3, "Leer", vec![]);
        question.options = None;
        assert!(matches!(question_buttons(&question), Err(QuizError::NotFound { .. })));
    }

    #[test]
    fn prompt_markup_puts_each_option_on_its_own_row() {
        let buttons = vec![
            Button { label: "A".into(), data: "a".into() },
            Button { label: "B".into(), data: "b".into() },
        ];
        assert_eq!(prompt_markup(&buttons).inline_keyboard.len(), 2);
    }
}
