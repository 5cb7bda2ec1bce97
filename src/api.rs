//! Admin REST API used by the dashboard: topics, questions, users and
//! aggregate statistics.

use std::net::SocketAddr;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::instrument;

use crate::database::connection::QuizStore;
use crate::database::model::{NewQuestion, Question, Statistics, Topic, User};
use crate::error::{Entity, QuizError};
use crate::{AppContext, BoxError};

pub struct ApiError(QuizError);

impl From<QuizError> for ApiError {
    fn from(error: QuizError) -> Self {
        ApiError(error)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            QuizError::NotFound { .. } => StatusCode::NOT_FOUND,
            QuizError::InvalidSelection(_) | QuizError::Validation(_) => StatusCode::BAD_REQUEST,
            QuizError::Conflict(_) => StatusCode::CONFLICT,
            QuizError::StoreUnavailable(e) => {
                tracing::error!("admin request failed: {e}");
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": "internal error" })),
                )
                    .into_response();
            }
        };

        (status, Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}

type ApiResult<T> = Result<T, ApiError>;

pub fn router<S: QuizStore>(ctx: AppContext<S>) -> Router {
    Router::new()
        .route("/", get(health))
        .route("/topics", get(list_topics::<S>).post(create_topic::<S>))
        .route("/topics/:id", delete(delete_topic::<S>))
        .route(
            "/questions",
            get(list_questions::<S>).post(create_question::<S>),
        )
        .route(
            "/questions/:id",
            get(get_question::<S>).delete(delete_question::<S>),
        )
        .route("/users", get(list_users::<S>))
        .route("/statistics", get(statistics::<S>))
        .with_state(ctx)
}

pub async fn serve<S: QuizStore>(addr: SocketAddr, ctx: AppContext<S>) -> Result<(), BoxError> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("admin API listening on {addr}");
    axum::serve(listener, router(ctx)).await?;
    Ok(())
}

fn positive_id(id: i64) -> ApiResult<i64> {
    if id <= 0 {
        return Err(QuizError::Validation("valid numeric 'id' is required".into()).into());
    }
    Ok(id)
}

async fn health() -> Json<Value> {
    Json(json!({ "ok": true, "message": "API running" }))
}

async fn list_topics<S: QuizStore>(State(ctx): State<AppContext<S>>) -> ApiResult<Json<Vec<Topic>>> {
    Ok(Json(ctx.store.topics().await?))
}

#[derive(Debug, Deserialize)]
struct TopicBody {
    name: Option<String>,
}

#[instrument(level = "info", skip(ctx))]
async fn create_topic<S: QuizStore>(
    State(ctx): State<AppContext<S>>,
    Json(body): Json<TopicBody>,
) -> ApiResult<(StatusCode, Json<Topic>)> {
    let name = body.name.as_deref().map(str::trim).unwrap_or_default();
    if name.is_empty() {
        return Err(QuizError::Validation("topic 'name' is required".into()).into());
    }

    let topic = ctx.store.create_topic(name).await?;
    tracing::info!(topic = topic.id, "topic created");
    Ok((StatusCode::CREATED, Json(topic)))
}

#[instrument(level = "info", skip(ctx))]
async fn delete_topic<S: QuizStore>(
    State(ctx): State<AppContext<S>>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Value>> {
    let topic = ctx.store.delete_topic(positive_id(id)?).await?;
    Ok(Json(json!({ "deleted": true, "topic": topic })))
}

async fn list_questions<S: QuizStore>(
    State(ctx): State<AppContext<S>>,
) -> ApiResult<Json<Vec<Question>>> {
    Ok(Json(ctx.store.questions().await?))
}

async fn get_question<S: QuizStore>(
    State(ctx): State<AppContext<S>>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Question>> {
    let id = positive_id(id)?;
    let question = ctx
        .store
        .question(id)
        .await?
        .ok_or_else(|| QuizError::not_found(Entity::Question, id))?;
    Ok(Json(question))
}

#[instrument(level = "info", skip(ctx))]
async fn create_question<S: QuizStore>(
    State(ctx): State<AppContext<S>>,
    Json(body): Json<NewQuestion>,
) -> ApiResult<(StatusCode, Json<Question>)> {
    let question = ctx.store.create_question(body.validate()?).await?;
    tracing::info!(question = question.id, topic = question.topic_id, "question created");
    Ok((StatusCode::CREATED, Json(question)))
}

#[instrument(level = "info", skip(ctx))]
async fn delete_question<S: QuizStore>(
    State(ctx): State<AppContext<S>>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Value>> {
    let question = ctx.store.delete_question(positive_id(id)?).await?;
    Ok(Json(json!({ "deleted": true, "question": question })))
}

async fn list_users<S: QuizStore>(State(ctx): State<AppContext<S>>) -> ApiResult<Json<Vec<User>>> {
    Ok(Json(ctx.store.users().await?))
}

async fn statistics<S: QuizStore>(State(ctx): State<AppContext<S>>) -> ApiResult<Json<Statistics>> {
    let (questions, topics, users) = tokio::try_join!(
        ctx.store.count_questions(),
        ctx.store.count_topics(),
        ctx.store.users(),
    )?;
    Ok(Json(Statistics::from_counts(questions, topics, &users)))
}
