use crate::database::model::{QuestionId, TopicId};

/// Where a chat stands after the controller handled an event. Nothing of
/// this is stored between events; it only reports the transition taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConversationState {
    #[default]
    Idle,
    AwaitingTopicChoice,
    QuestionPresented {
        topic_id: TopicId,
        question_id: QuestionId,
    },
}
