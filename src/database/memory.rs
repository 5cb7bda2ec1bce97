//! Record store kept in process memory.
//!
//! Implements the same capability traits as the Postgres [`Connection`],
//! including the `(telegram_id, question_id)` uniqueness of answers and the
//! restrict-on-delete policy, so the quiz engine behaves the same on both.
//!
//! [`Connection`]: super::connection::Connection

use chrono::Utc;
use tokio::sync::Mutex;

use super::connection::{
    CountRecords, CreateAnswer, CreateUser, EditQuestion, EditTopic, EditUser, RetrieveAnswer,
    RetrieveQuestion, RetrieveTopic, RetrieveUser,
};
use super::model::{
    Answer, NewAnswer, NewQuestion, Question, QuestionId, TelegramId, Topic, TopicId, User,
    UserId,
};
use crate::error::{Entity, QuizError};
use crate::resolver::normalize;

#[derive(Debug, Default)]
struct Tables {
    topics: Vec<Topic>,
    questions: Vec<Question>,
    users: Vec<User>,
    answers: Vec<Answer>,
    next_topic_id: TopicId,
    next_question_id: QuestionId,
    next_user_id: UserId,
    next_answer_id: i64,
}

#[derive(Debug, Default)]
pub struct MemStore {
    tables: Mutex<Tables>,
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts from fixed topics and questions, keeping their ids.
    pub fn seeded(topics: Vec<Topic>, questions: Vec<Question>) -> Self {
        let next_topic_id = topics.iter().map(|t| t.id).max().unwrap_or(0);
        let next_question_id = questions.iter().map(|q| q.id).max().unwrap_or(0);
        Self {
            tables: Mutex::new(Tables {
                topics,
                questions,
                next_topic_id,
                next_question_id,
                ..Tables::default()
            }),
        }
    }
}

impl RetrieveTopic for MemStore {
    async fn topics(&self) -> Result<Vec<Topic>, QuizError> {
        let tables = self.tables.lock().await;
        let mut topics = tables.topics.clone();
        topics.sort_by_key(|t| t.id);
        Ok(topics)
    }

    async fn topics_with_questions(&self) -> Result<Vec<Topic>, QuizError> {
        let tables = self.tables.lock().await;
        let mut topics: Vec<Topic> = tables
            .topics
            .iter()
            .filter(|t| tables.questions.iter().any(|q| q.topic_id == t.id))
            .cloned()
            .collect();
        topics.sort_by_key(|t| t.id);
        Ok(topics)
    }

    async fn topic(&self, id: TopicId) -> Result<Option<Topic>, QuizError> {
        let tables = self.tables.lock().await;
        Ok(tables.topics.iter().find(|t| t.id == id).cloned())
    }
}

impl EditTopic for MemStore {
    async fn create_topic(&self, name: &str) -> Result<Topic, QuizError> {
        let mut tables = self.tables.lock().await;
        let wanted = normalize(name);
        if tables.topics.iter().any(|t| normalize(&t.name) == wanted) {
            return Err(QuizError::Conflict(format!("topic '{name}' already exists")));
        }
        tables.next_topic_id += 1;
        let topic = Topic {
            id: tables.next_topic_id,
            name: name.to_owned(),
        };
        tables.topics.push(topic.clone());
        Ok(topic)
    }

    async fn delete_topic(&self, id: TopicId) -> Result<Topic, QuizError> {
        let mut tables = self.tables.lock().await;
        let position = tables
            .topics
            .iter()
            .position(|t| t.id == id)
            .ok_or_else(|| QuizError::not_found(Entity::Topic, id))?;
        if tables.questions.iter().any(|q| q.topic_id == id) {
            return Err(QuizError::Conflict(format!("topic {id} still has questions")));
        }
        Ok(tables.topics.remove(position))
    }
}

impl RetrieveQuestion for MemStore {
    async fn question(&self, id: QuestionId) -> Result<Option<Question>, QuizError> {
        let tables = self.tables.lock().await;
        Ok(tables.questions.iter().find(|q| q.id == id).cloned())
    }

    async fn first_question_after(
        &self,
        topic_id: TopicId,
        after: QuestionId,
    ) -> Result<Option<Question>, QuizError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .questions
            .iter()
            .filter(|q| q.topic_id == topic_id && q.id > after)
            .min_by_key(|q| q.id)
            .cloned())
    }

    async fn questions(&self) -> Result<Vec<Question>, QuizError> {
        let tables = self.tables.lock().await;
        let mut questions = tables.questions.clone();
        questions.sort_by_key(|q| q.id);
        Ok(questions)
    }
}

impl EditQuestion for MemStore {
    async fn create_question(&self, question: NewQuestion) -> Result<Question, QuizError> {
        let mut tables = self.tables.lock().await;
        if !tables.topics.iter().any(|t| t.id == question.topic_id) {
            return Err(QuizError::not_found(Entity::Topic, question.topic_id));
        }
        tables.next_question_id += 1;
        let question = Question {
            id: tables.next_question_id,
            topic_id: question.topic_id,
            text: question.text,
            has_options: question.has_options,
            answer: question.answer,
            options: question.options,
            created_at: Utc::now(),
        };
        tables.questions.push(question.clone());
        Ok(question)
    }

    async fn delete_question(&self, id: QuestionId) -> Result<Question, QuizError> {
        let mut tables = self.tables.lock().await;
        let position = tables
            .questions
            .iter()
            .position(|q| q.id == id)
            .ok_or_else(|| QuizError::not_found(Entity::Question, id))?;
        if tables.answers.iter().any(|a| a.question_id == id) {
            return Err(QuizError::Conflict(format!("question {id} already has answers")));
        }
        for user in tables
            .users
            .iter_mut()
            .filter(|u| u.last_question_id == Some(id))
        {
            user.last_question_id = None;
        }
        Ok(tables.questions.remove(position))
    }
}

impl RetrieveAnswer for MemStore {
    async fn latest_answer(
        &self,
        telegram_id: TelegramId,
        topic_id: TopicId,
    ) -> Result<Option<Answer>, QuizError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .answers
            .iter()
            .filter(|a| a.telegram_id == telegram_id && a.topic_id == topic_id)
            .max_by_key(|a| (a.created_at, a.id))
            .cloned())
    }
}

impl CreateAnswer for MemStore {
    async fn create_answer(&self, answer: NewAnswer) -> Result<Answer, QuizError> {
        let mut tables = self.tables.lock().await;
        if tables
            .answers
            .iter()
            .any(|a| a.telegram_id == answer.telegram_id && a.question_id == answer.question_id)
        {
            return Err(QuizError::Conflict(format!(
                "user {} already answered question {}",
                answer.telegram_id, answer.question_id
            )));
        }
        tables.next_answer_id += 1;
        let answer = Answer {
            id: tables.next_answer_id,
            user_id: answer.user_id,
            telegram_id: answer.telegram_id,
            question_id: answer.question_id,
            topic_id: answer.topic_id,
            answer: answer.answer,
            is_correct: answer.is_correct,
            created_at: Utc::now(),
        };
        tables.answers.push(answer.clone());
        Ok(answer)
    }
}

impl RetrieveUser for MemStore {
    async fn user_by_telegram_id(
        &self,
        telegram_id: TelegramId,
    ) -> Result<Option<User>, QuizError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .users
            .iter()
            .find(|u| u.telegram_id == telegram_id)
            .cloned())
    }

    async fn users(&self) -> Result<Vec<User>, QuizError> {
        let tables = self.tables.lock().await;
        let mut users = tables.users.clone();
        users.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        Ok(users)
    }
}

impl CreateUser for MemStore {
    async fn register_user(&self, telegram_id: TelegramId, name: &str) -> Result<User, QuizError> {
        let mut tables = self.tables.lock().await;
        if let Some(user) = tables.users.iter().find(|u| u.telegram_id == telegram_id) {
            return Ok(user.clone());
        }
        tables.next_user_id += 1;
        let user = User {
            id: tables.next_user_id,
            telegram_id,
            name: name.to_owned(),
            questions_answered_count: 0,
            correct_answers_count: 0,
            last_question_id: None,
            created_at: Utc::now(),
        };
        tables.users.push(user.clone());
        Ok(user)
    }
}

impl EditUser for MemStore {
    async fn apply_answer(
        &self,
        user_id: UserId,
        question_id: QuestionId,
        is_correct: bool,
    ) -> Result<User, QuizError> {
        let mut tables = self.tables.lock().await;
        let user = tables
            .users
            .iter_mut()
            .find(|u| u.id == user_id)
            .ok_or_else(|| QuizError::not_found(Entity::User, user_id))?;
        user.questions_answered_count += 1;
        if is_correct {
            user.correct_answers_count += 1;
        }
        user.last_question_id = Some(question_id);
        Ok(user.clone())
    }
}

impl CountRecords for MemStore {
    async fn count_questions(&self) -> Result<i64, QuizError> {
        Ok(self.tables.lock().await.questions.len() as i64)
    }

    async fn count_topics(&self) -> Result<i64, QuizError> {
        Ok(self.tables.lock().await.topics.len() as i64)
    }
}
