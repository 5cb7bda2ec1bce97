use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::QuizError;

pub type TopicId = i64;
pub type QuestionId = i64;
pub type UserId = i64;
pub type TelegramId = i64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Topic {
    pub id: TopicId,
    pub name: String,
}

/// One selectable answer of a question. Options have no identity of their
/// own: they are addressed by position inside [`Question::options`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizOption {
    pub text: String,
    #[serde(rename = "isCorrect")]
    pub is_correct: bool,
}

impl QuizOption {
    pub fn new(text: impl Into<String>, is_correct: bool) -> Self {
        Self {
            text: text.into(),
            is_correct,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub id: QuestionId,
    pub topic_id: TopicId,
    pub text: String,
    #[serde(rename = "hasOptions")]
    pub has_options: bool,
    pub answer: Option<String>,
    pub options: Option<Vec<QuizOption>>,
    pub created_at: DateTime<Utc>,
}

impl Question {
    /// A question revealing a hidden answer instead of offering options.
    pub fn free_form(
        id: QuestionId,
        topic_id: TopicId,
        text: impl Into<String>,
        answer: impl Into<String>,
    ) -> Self {
        Self {
            id,
            topic_id,
            text: text.into(),
            has_options: false,
            answer: Some(answer.into()),
            options: None,
            created_at: Utc::now(),
        }
    }

    pub fn with_options(
        id: QuestionId,
        topic_id: TopicId,
        text: impl Into<String>,
        options: Vec<QuizOption>,
    ) -> Self {
        Self {
            id,
            topic_id,
            text: text.into(),
            has_options: true,
            answer: None,
            options: Some(options),
            created_at: Utc::now(),
        }
    }

    /// Options in display order, empty for free-form questions.
    pub fn options(&self) -> &[QuizOption] {
        self.options.as_deref().unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: UserId,
    pub telegram_id: TelegramId,
    pub name: String,
    pub questions_answered_count: i64,
    pub correct_answers_count: i64,
    pub last_question_id: Option<QuestionId>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Answer {
    pub id: i64,
    pub user_id: UserId,
    pub telegram_id: TelegramId,
    pub question_id: QuestionId,
    pub topic_id: TopicId,
    pub answer: String,
    #[serde(rename = "isCorrect")]
    pub is_correct: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAnswer {
    pub user_id: UserId,
    pub telegram_id: TelegramId,
    pub question_id: QuestionId,
    pub topic_id: TopicId,
    pub answer: String,
    pub is_correct: bool,
}

/// Question as submitted through the admin API, before it gets an id.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NewQuestion {
    pub topic_id: TopicId,
    pub text: String,
    #[serde(rename = "hasOptions", default)]
    pub has_options: bool,
    #[serde(default)]
    pub answer: Option<String>,
    #[serde(default)]
    pub options: Option<Vec<QuizOption>>,
}

impl NewQuestion {
    /// Checks the options/answer invariant and returns the trimmed question
    /// with the field that does not apply dropped.
    pub fn validate(self) -> Result<NewQuestion, QuizError> {
        let text = self.text.trim().to_owned();
        if text.is_empty() {
            return Err(QuizError::Validation("question 'text' is required".into()));
        }

        if self.has_options {
            let options = self.options.unwrap_or_default();
            if options.len() < 2 {
                return Err(QuizError::Validation(
                    "'options' must be an array with at least two items".into(),
                ));
            }
            if options.iter().any(|option| option.text.trim().is_empty()) {
                return Err(QuizError::Validation("every option needs a text".into()));
            }
            if !options.iter().any(|option| option.is_correct) {
                return Err(QuizError::Validation(
                    "at least one option must be marked correct".into(),
                ));
            }

            Ok(NewQuestion {
                topic_id: self.topic_id,
                text,
                has_options: true,
                answer: None,
                options: Some(
                    options
                        .into_iter()
                        .map(|option| QuizOption::new(option.text.trim(), option.is_correct))
                        .collect(),
                ),
            })
        } else {
            let answer = self.answer.as_deref().map(str::trim).unwrap_or_default();
            if answer.is_empty() {
                return Err(QuizError::Validation("question 'answer' is required".into()));
            }

            Ok(NewQuestion {
                topic_id: self.topic_id,
                text,
                has_options: false,
                answer: Some(answer.to_owned()),
                options: None,
            })
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Statistics {
    pub questions_count: i64,
    pub topics_count: i64,
    pub completion_percentage: f64,
    pub users_count: i64,
}

impl Statistics {
    pub fn from_counts(questions_count: i64, topics_count: i64, users: &[User]) -> Self {
        let (correct, answered) = users.iter().fold((0i64, 0i64), |(correct, answered), user| {
            (
                correct + user.correct_answers_count,
                answered + user.questions_answered_count,
            )
        });

        let completion_percentage = if answered == 0 {
            0.0
        } else {
            correct as f64 / answered as f64 * 100.0
        };

        Self {
            questions_count,
            topics_count,
            completion_percentage,
            users_count: users.len() as i64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(answered: i64, correct: i64) -> User {
        User {
            id: 1,
            telegram_id: 1,
            name: "test".into(),
            questions_answered_count: answered,
            correct_answers_count: correct,
            last_question_id: None,
            created_at: Utc::now(),
        }
    }

    fn choice(options: Vec<QuizOption>) -> NewQuestion {
        NewQuestion {
            topic_id: 1,
            text: " Was ist WEG? ".into(),
            has_options: true,
            answer: Some("ignored".into()),
            options: Some(options),
        }
    }

    #[test]
    fn completion_percentage_sums_over_all_users() {
        let stats = Statistics::from_counts(10, 3, &[user(4, 3), user(6, 2)]);
        assert_eq!(stats.users_count, 2);
        assert!((stats.completion_percentage - 50.0).abs() < f64::EPSILON);
    }

    #[test]
    fn completion_percentage_is_zero_without_answers() {
        let stats = Statistics::from_counts(0, 0, &[user(0, 0)]);
        assert_eq!(stats.completion_percentage, 0.0);
    }

    #[test]
    fn statistics_serialize_with_dashboard_field_names() {
        let json = serde_json::to_value(Statistics::from_counts(1, 2, &[])).unwrap();
        assert_eq!(json["questionsCount"], 1);
        assert_eq!(json["topicsCount"], 2);
        assert_eq!(json["usersCount"], 0);
        assert_eq!(json["completionPercentage"], 0.0);
    }

    #[test]
    fn choice_question_is_trimmed_and_loses_answer() {
        let question = choice(vec![QuizOption::new("A ", false), QuizOption::new("B", true)])
            .validate()
            .unwrap();
        assert_eq!(question.text, "Was ist WEG?");
        assert_eq!(question.answer, None);
        assert_eq!(question.options.unwrap()[0].text, "A");
    }

    #[test]
    fn choice_question_needs_two_options_and_a_correct_one() {
        let single = choice(vec![QuizOption::new("A", true)]).validate();
        assert!(matches!(single, Err(QuizError::Validation(_))));

        let none_correct =
            choice(vec![QuizOption::new("A", false), QuizOption::new("B", false)]).validate();
        assert!(matches!(none_correct, Err(QuizError::Validation(_))));
    }

    #[test]
    fn free_form_question_needs_answer() {
        let question = NewQuestion {
            topic_id: 1,
            text: "Was ist eine Teilungserklärung?".into(),
            has_options: false,
            answer: Some("   ".into()),
            options: None,
        };
        assert!(matches!(question.validate(), Err(QuizError::Validation(_))));
    }

    #[test]
    fn new_question_deserializes_dashboard_payload() {
        let question: NewQuestion = serde_json::from_str(
            r#"{"topic_id":3,"text":"Q","hasOptions":true,"options":[{"text":"A","isCorrect":false},{"text":"B","isCorrect":true}]}"#,
        )
        .unwrap();
        assert!(question.has_options);
        assert_eq!(question.options.unwrap()[1], QuizOption::new("B", true));
    }
}
