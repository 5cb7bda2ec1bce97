use rand::Rng;
use tracing::instrument;

use crate::database::connection::RetrieveTopic;
use crate::database::model::{Topic, TopicId};
use crate::error::{Entity, QuizError};

pub const RANDOM_TOPIC_LABEL: &str = "Random Frage";

/// Button texts arrive as typed by the chat client, so matching ignores
/// surrounding whitespace and letter case.
pub fn normalize(label: &str) -> String {
    label.trim().to_lowercase()
}

/// Uniform draw over the given topics.
pub fn pick_random_topic<R: Rng + ?Sized>(topics: &[Topic], rng: &mut R) -> Option<TopicId> {
    if topics.is_empty() {
        return None;
    }
    let index = rng.gen_range(0..topics.len());
    Some(topics[index].id)
}

/// Maps a topic label to its id. The random-topic label picks any topic that
/// has at least one question.
#[instrument(level = "debug", skip(store))]
pub async fn resolve<S: RetrieveTopic>(
    store: &S,
    label: &str,
    random_label: &str,
) -> Result<TopicId, QuizError> {
    let wanted = normalize(label);

    if wanted == normalize(random_label) {
        let topics = store.topics_with_questions().await?;
        let picked = pick_random_topic(&topics, &mut rand::thread_rng());
        return picked.ok_or_else(|| QuizError::not_found(Entity::Topic, label.trim()));
    }

    store
        .topics()
        .await?
        .into_iter()
        .find(|topic| normalize(&topic.name) == wanted)
        .map(|topic| topic.id)
        .ok_or_else(|| QuizError::not_found(Entity::Topic, label.trim()))
}
