use std::future::Future;

use chrono::{DateTime, Utc};
use sqlx::{postgres::PgPool, types::Json};
use tracing::instrument;

use super::model::{
    Answer, NewAnswer, NewQuestion, Question, QuestionId, QuizOption, TelegramId, Topic, TopicId,
    User, UserId,
};
use crate::error::{Entity, QuizError};

type StoreResult<T> = Result<T, QuizError>;

pub trait RetrieveTopic {
    /// All topics ordered by id.
    fn topics(&self) -> impl Future<Output = StoreResult<Vec<Topic>>> + Send;

    /// Topics with at least one question, ordered by id.
    fn topics_with_questions(&self) -> impl Future<Output = StoreResult<Vec<Topic>>> + Send;

    fn topic(&self, id: TopicId) -> impl Future<Output = StoreResult<Option<Topic>>> + Send;
}

pub trait EditTopic {
    /// Fails with `Conflict` when a topic of the same name exists, ignoring
    /// letter case.
    fn create_topic(&self, name: &str) -> impl Future<Output = StoreResult<Topic>> + Send;

    /// Fails with `Conflict` while questions still reference the topic.
    fn delete_topic(&self, id: TopicId) -> impl Future<Output = StoreResult<Topic>> + Send;
}

pub trait RetrieveQuestion {
    fn question(&self, id: QuestionId)
        -> impl Future<Output = StoreResult<Option<Question>>> + Send;

    /// The question of `topic_id` with the smallest id strictly greater than `after`.
    fn first_question_after(
        &self,
        topic_id: TopicId,
        after: QuestionId,
    ) -> impl Future<Output = StoreResult<Option<Question>>> + Send;

    fn questions(&self) -> impl Future<Output = StoreResult<Vec<Question>>> + Send;
}

pub trait EditQuestion {
    fn create_question(
        &self,
        question: NewQuestion,
    ) -> impl Future<Output = StoreResult<Question>> + Send;

    /// Fails with `Conflict` while answers still reference the question.
    fn delete_question(&self, id: QuestionId)
        -> impl Future<Output = StoreResult<Question>> + Send;
}

pub trait RetrieveAnswer {
    /// Most recently recorded answer of a user inside one topic.
    fn latest_answer(
        &self,
        telegram_id: TelegramId,
        topic_id: TopicId,
    ) -> impl Future<Output = StoreResult<Option<Answer>>> + Send;
}

pub trait CreateAnswer {
    /// Fails with `Conflict` when `(telegram_id, question_id)` was already recorded.
    fn create_answer(&self, answer: NewAnswer) -> impl Future<Output = StoreResult<Answer>> + Send;
}

pub trait RetrieveUser {
    fn user_by_telegram_id(
        &self,
        telegram_id: TelegramId,
    ) -> impl Future<Output = StoreResult<Option<User>>> + Send;

    /// All users, newest first.
    fn users(&self) -> impl Future<Output = StoreResult<Vec<User>>> + Send;
}

pub trait CreateUser {
    /// Creates the user, or returns the existing one for this `telegram_id`.
    fn register_user(
        &self,
        telegram_id: TelegramId,
        name: &str,
    ) -> impl Future<Output = StoreResult<User>> + Send;
}

pub trait EditUser {
    /// Counts one more answered question (and one more correct one when
    /// `is_correct`) and moves `last_question_id`, as a single update.
    fn apply_answer(
        &self,
        user_id: UserId,
        question_id: QuestionId,
        is_correct: bool,
    ) -> impl Future<Output = StoreResult<User>> + Send;
}

pub trait CountRecords {
    fn count_questions(&self) -> impl Future<Output = StoreResult<i64>> + Send;

    fn count_topics(&self) -> impl Future<Output = StoreResult<i64>> + Send;
}

/// Everything the bot and the admin API need from a record store.
pub trait QuizStore:
    RetrieveTopic
    + EditTopic
    + RetrieveQuestion
    + EditQuestion
    + RetrieveAnswer
    + CreateAnswer
    + RetrieveUser
    + CreateUser
    + EditUser
    + CountRecords
    + Send
    + Sync
    + 'static
{
}

impl<T> QuizStore for T where
    T: RetrieveTopic
        + EditTopic
        + RetrieveQuestion
        + EditQuestion
        + RetrieveAnswer
        + CreateAnswer
        + RetrieveUser
        + CreateUser
        + EditUser
        + CountRecords
        + Send
        + Sync
        + 'static
{
}

pub struct Connection {
    pool: PgPool,
}

impl Connection {
    pub async fn connect(connection_string: &str) -> StoreResult<Self> {
        let pool = PgPool::connect(connection_string).await?;
        Ok(Self { pool })
    }

    pub async fn run_migrations(&self) -> StoreResult<()> {
        sqlx::migrate!()
            .run(&self.pool)
            .await
            .map_err(sqlx::Error::from)?;
        tracing::info!("database migrations applied");
        Ok(())
    }
}

#[derive(sqlx::FromRow)]
struct QuestionRow {
    id: QuestionId,
    topic_id: TopicId,
    text: String,
    has_options: bool,
    answer: Option<String>,
    options: Option<Json<Vec<QuizOption>>>,
    created_at: DateTime<Utc>,
}

impl From<QuestionRow> for Question {
    fn from(row: QuestionRow) -> Self {
        Question {
            id: row.id,
            topic_id: row.topic_id,
            text: row.text,
            has_options: row.has_options,
            answer: row.answer,
            options: row.options.map(|Json(options)| options),
            created_at: row.created_at,
        }
    }
}

fn is_unique_violation(error: &sqlx::Error) -> bool {
    matches!(error, sqlx::Error::Database(db) if db.is_unique_violation())
}

fn is_foreign_key_violation(error: &sqlx::Error) -> bool {
    matches!(error, sqlx::Error::Database(db) if db.is_foreign_key_violation())
}

impl RetrieveTopic for Connection {
    #[instrument(level = "debug", skip(self))]
    async fn topics(&self) -> StoreResult<Vec<Topic>> {
        let topics = sqlx::query_as::<_, Topic>("SELECT id, name FROM topics ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        Ok(topics)
    }

    #[instrument(level = "debug", skip(self))]
    async fn topics_with_questions(&self) -> StoreResult<Vec<Topic>> {
        let topics = sqlx::query_as::<_, Topic>(
            "SELECT t.id, t.name FROM topics t \
             WHERE EXISTS (SELECT 1 FROM questions q WHERE q.topic_id = t.id) \
             ORDER BY t.id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(topics)
    }

    #[instrument(level = "debug", skip(self))]
    async fn topic(&self, id: TopicId) -> StoreResult<Option<Topic>> {
        let topic = sqlx::query_as::<_, Topic>("SELECT id, name FROM topics WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(topic)
    }
}

impl EditTopic for Connection {
    #[instrument(level = "debug", skip(self))]
    async fn create_topic(&self, name: &str) -> StoreResult<Topic> {
        sqlx::query_as::<_, Topic>("INSERT INTO topics (name) VALUES ($1) RETURNING id, name")
            .bind(name)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    QuizError::Conflict(format!("topic '{name}' already exists"))
                } else {
                    e.into()
                }
            })
    }

    #[instrument(level = "debug", skip(self))]
    async fn delete_topic(&self, id: TopicId) -> StoreResult<Topic> {
        sqlx::query_as::<_, Topic>("DELETE FROM topics WHERE id = $1 RETURNING id, name")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                if is_foreign_key_violation(&e) {
                    QuizError::Conflict(format!("topic {id} still has questions"))
                } else {
                    e.into()
                }
            })?
            .ok_or_else(|| QuizError::not_found(Entity::Topic, id))
    }
}

impl RetrieveQuestion for Connection {
    #[instrument(level = "debug", skip(self))]
    async fn question(&self, id: QuestionId) -> StoreResult<Option<Question>> {
        let row = sqlx::query_as::<_, QuestionRow>(
            "SELECT id, topic_id, text, has_options, answer, options, created_at \
             FROM questions WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Question::from))
    }

    #[instrument(level = "debug", skip(self))]
    async fn first_question_after(
        &self,
        topic_id: TopicId,
        after: QuestionId,
    ) -> StoreResult<Option<Question>> {
        let row = sqlx::query_as::<_, QuestionRow>(
            "SELECT id, topic_id, text, has_options, answer, options, created_at \
             FROM questions WHERE topic_id = $1 AND id > $2 ORDER BY id LIMIT 1",
        )
        .bind(topic_id)
        .bind(after)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Question::from))
    }

    #[instrument(level = "debug", skip(self))]
    async fn questions(&self) -> StoreResult<Vec<Question>> {
        let rows = sqlx::query_as::<_, QuestionRow>(
            "SELECT id, topic_id, text, has_options, answer, options, created_at \
             FROM questions ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Question::from).collect())
    }
}

impl EditQuestion for Connection {
    #[instrument(level = "debug", skip(self))]
    async fn create_question(&self, question: NewQuestion) -> StoreResult<Question> {
        let topic_id = question.topic_id;
        let row = sqlx::query_as::<_, QuestionRow>(
            "INSERT INTO questions (topic_id, text, has_options, answer, options) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING id, topic_id, text, has_options, answer, options, created_at",
        )
        .bind(question.topic_id)
        .bind(question.text)
        .bind(question.has_options)
        .bind(question.answer)
        .bind(question.options.map(Json))
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_foreign_key_violation(&e) {
                QuizError::not_found(Entity::Topic, topic_id)
            } else {
                e.into()
            }
        })?;
        Ok(row.into())
    }

    #[instrument(level = "debug", skip(self))]
    async fn delete_question(&self, id: QuestionId) -> StoreResult<Question> {
        sqlx::query_as::<_, QuestionRow>(
            "DELETE FROM questions WHERE id = $1 \
             RETURNING id, topic_id, text, has_options, answer, options, created_at",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            if is_foreign_key_violation(&e) {
                QuizError::Conflict(format!("question {id} already has answers"))
            } else {
                e.into()
            }
        })?
        .map(Question::from)
        .ok_or_else(|| QuizError::not_found(Entity::Question, id))
    }
}

impl RetrieveAnswer for Connection {
    #[instrument(level = "debug", skip(self))]
    async fn latest_answer(
        &self,
        telegram_id: TelegramId,
        topic_id: TopicId,
    ) -> StoreResult<Option<Answer>> {
        let answer = sqlx::query_as::<_, Answer>(
            "SELECT id, user_id, telegram_id, question_id, topic_id, answer, is_correct, created_at \
             FROM answers WHERE telegram_id = $1 AND topic_id = $2 \
             ORDER BY created_at DESC, id DESC LIMIT 1",
        )
        .bind(telegram_id)
        .bind(topic_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(answer)
    }
}

impl CreateAnswer for Connection {
    #[instrument(level = "debug", skip(self))]
    async fn create_answer(&self, answer: NewAnswer) -> StoreResult<Answer> {
        let (telegram_id, question_id) = (answer.telegram_id, answer.question_id);
        sqlx::query_as::<_, Answer>(
            "INSERT INTO answers (user_id, telegram_id, question_id, topic_id, answer, is_correct) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING id, user_id, telegram_id, question_id, topic_id, answer, is_correct, created_at",
        )
        .bind(answer.user_id)
        .bind(answer.telegram_id)
        .bind(answer.question_id)
        .bind(answer.topic_id)
        .bind(answer.answer)
        .bind(answer.is_correct)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                QuizError::Conflict(format!(
                    "user {telegram_id} already answered question {question_id}"
                ))
            } else {
                e.into()
            }
        })
    }
}

impl RetrieveUser for Connection {
    #[instrument(level = "debug", skip(self))]
    async fn user_by_telegram_id(&self, telegram_id: TelegramId) -> StoreResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, telegram_id, name, questions_answered_count, correct_answers_count, \
             last_question_id, created_at FROM users WHERE telegram_id = $1",
        )
        .bind(telegram_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    #[instrument(level = "debug", skip(self))]
    async fn users(&self) -> StoreResult<Vec<User>> {
        let users = sqlx::query_as::<_, User>(
            "SELECT id, telegram_id, name, questions_answered_count, correct_answers_count, \
             last_question_id, created_at FROM users ORDER BY created_at DESC, id DESC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(users)
    }
}

impl CreateUser for Connection {
    #[instrument(level = "debug", skip(self))]
    async fn register_user(&self, telegram_id: TelegramId, name: &str) -> StoreResult<User> {
        sqlx::query("INSERT INTO users (telegram_id, name) VALUES ($1, $2) ON CONFLICT (telegram_id) DO NOTHING")
            .bind(telegram_id)
            .bind(name)
            .execute(&self.pool)
            .await?;

        self.user_by_telegram_id(telegram_id)
            .await?
            .ok_or_else(|| QuizError::not_found(Entity::User, telegram_id))
    }
}

impl EditUser for Connection {
    #[instrument(level = "debug", skip(self))]
    async fn apply_answer(
        &self,
        user_id: UserId,
        question_id: QuestionId,
        is_correct: bool,
    ) -> StoreResult<User> {
        sqlx::query_as::<_, User>(
            "UPDATE users SET \
             questions_answered_count = questions_answered_count + 1, \
             correct_answers_count = correct_answers_count + CASE WHEN $2 THEN 1 ELSE 0 END, \
             last_question_id = $3 \
             WHERE id = $1 \
             RETURNING id, telegram_id, name, questions_answered_count, correct_answers_count, \
             last_question_id, created_at",
        )
        .bind(user_id)
        .bind(is_correct)
        .bind(question_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| QuizError::not_found(Entity::User, user_id))
    }
}

impl CountRecords for Connection {
    async fn count_questions(&self) -> StoreResult<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM questions")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn count_topics(&self) -> StoreResult<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM topics")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
