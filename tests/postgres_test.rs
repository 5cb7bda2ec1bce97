//! Store tests against a real Postgres. Run with
//! `DATABASE_URL=postgres://... cargo test -- --ignored`.

use std::time::{SystemTime, UNIX_EPOCH};

use quiztrainer::{
    database::{
        connection::{
            Connection, CreateAnswer, CreateUser, EditQuestion, EditTopic, EditUser,
            RetrieveAnswer, RetrieveUser,
        },
        model::{NewAnswer, NewQuestion, Question, Topic, User},
    },
    error::QuizError,
    progression::{next_question, Progress},
    recorder::record,
};

fn postgres_database_url() -> String {
    std::env::var("DATABASE_URL")
        .ok()
        .filter(|value| !value.trim().is_empty())
        .expect("set DATABASE_URL to run postgres integration tests")
}

fn nonce() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("time should move forward")
        .as_nanos()
}

fn unique_name(prefix: &str) -> String {
    format!("{prefix}-{}", nonce())
}

fn unique_telegram_id() -> i64 {
    (nonce() % 1_000_000_000_000) as i64 + 1
}

async fn connection() -> Connection {
    let connection = Connection::connect(&postgres_database_url())
        .await
        .expect("postgres should accept connections");
    connection
        .run_migrations()
        .await
        .expect("migrations should apply");
    connection
}

async fn topic_with_questions(connection: &Connection, count: usize) -> (Topic, Vec<Question>) {
    let topic = connection
        .create_topic(&unique_name("Thema"))
        .await
        .expect("topic should be created");
    let mut questions = Vec::new();
    for n in 0..count {
        let question = connection
            .create_question(NewQuestion {
                topic_id: topic.id,
                text: format!("Frage {n}"),
                has_options: false,
                answer: Some(format!("Antwort {n}")),
                options: None,
            })
            .await
            .expect("question should be created");
        questions.push(question);
    }
    (topic, questions)
}

async fn user(connection: &Connection) -> User {
    connection
        .register_user(unique_telegram_id(), "Erika")
        .await
        .expect("user should be registered")
}

fn answer_of(user: &User, question: &Question) -> NewAnswer {
    NewAnswer {
        user_id: user.id,
        telegram_id: user.telegram_id,
        question_id: question.id,
        topic_id: question.topic_id,
        answer: "Antwort".into(),
        is_correct: true,
    }
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn duplicate_answer_is_a_conflict() {
    let connection = connection().await;
    let (_, questions) = topic_with_questions(&connection, 1).await;
    let user = user(&connection).await;

    connection
        .create_answer(answer_of(&user, &questions[0]))
        .await
        .expect("first answer should be stored");
    let second = connection.create_answer(answer_of(&user, &questions[0])).await;

    assert!(matches!(second, Err(QuizError::Conflict(_))), "{second:?}");
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn recording_twice_counts_once() {
    let connection = connection().await;
    let (topic, questions) = topic_with_questions(&connection, 1).await;
    let user = user(&connection).await;

    let first = record(&connection, &questions[0], topic.id, &user, None)
        .await
        .expect("first record should succeed");
    let second = record(&connection, &questions[0], topic.id, &user, None)
        .await
        .expect("duplicate record should succeed");

    assert!(first.recorded);
    assert!(!second.recorded);
    let stored = connection
        .user_by_telegram_id(user.telegram_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.questions_answered_count, 1);
    assert_eq!(stored.correct_answers_count, 1);
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn latest_answer_is_the_most_recent_one() {
    let connection = connection().await;
    let (topic, questions) = topic_with_questions(&connection, 3).await;
    let user = user(&connection).await;

    connection
        .create_answer(answer_of(&user, &questions[2]))
        .await
        .unwrap();
    connection
        .create_answer(answer_of(&user, &questions[0]))
        .await
        .unwrap();

    let latest = connection
        .latest_answer(user.telegram_id, topic.id)
        .await
        .unwrap()
        .expect("an answer should exist");
    assert_eq!(latest.question_id, questions[0].id);

    let Progress::Next(next) = next_question(&connection, user.telegram_id, topic.id)
        .await
        .unwrap()
    else {
        panic!("expected a question");
    };
    assert_eq!(next.id, questions[1].id);
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn apply_answer_moves_counters_and_pointer() {
    let connection = connection().await;
    let (_, questions) = topic_with_questions(&connection, 2).await;
    let user = user(&connection).await;

    connection
        .apply_answer(user.id, questions[0].id, true)
        .await
        .unwrap();
    let updated = connection
        .apply_answer(user.id, questions[1].id, false)
        .await
        .unwrap();

    assert_eq!(updated.questions_answered_count, 2);
    assert_eq!(updated.correct_answers_count, 1);
    assert_eq!(updated.last_question_id, Some(questions[1].id));
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn referenced_records_are_not_deleted() {
    let connection = connection().await;
    let (topic, questions) = topic_with_questions(&connection, 1).await;
    let user = user(&connection).await;
    connection
        .create_answer(answer_of(&user, &questions[0]))
        .await
        .unwrap();

    let topic_delete = connection.delete_topic(topic.id).await;
    assert!(matches!(topic_delete, Err(QuizError::Conflict(_))), "{topic_delete:?}");

    let question_delete = connection.delete_question(questions[0].id).await;
    assert!(
        matches!(question_delete, Err(QuizError::Conflict(_))),
        "{question_delete:?}"
    );
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn deleting_a_question_clears_last_question_pointer() {
    let connection = connection().await;
    let (topic, questions) = topic_with_questions(&connection, 1).await;
    let user = user(&connection).await;
    connection
        .apply_answer(user.id, questions[0].id, true)
        .await
        .unwrap();

    connection.delete_question(questions[0].id).await.unwrap();
    connection.delete_topic(topic.id).await.unwrap();

    let stored = connection
        .user_by_telegram_id(user.telegram_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.last_question_id, None);
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn topic_names_are_unique_ignoring_case() {
    let connection = connection().await;
    let name = unique_name("Mietrecht");
    connection.create_topic(&name).await.unwrap();

    let duplicate = connection.create_topic(&name.to_uppercase()).await;

    assert!(matches!(duplicate, Err(QuizError::Conflict(_))), "{duplicate:?}");
}
