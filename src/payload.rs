use serde::{Deserialize, Serialize};

use crate::database::model::{QuestionId, TopicId};
use crate::error::QuizError;

/// Telegram's limit on `callback_data`, in bytes.
pub const CALLBACK_DATA_LIMIT: usize = 64;

/// Data carried by an inline button and handed back verbatim on tap.
/// `option_index` is present exactly when the question has options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallbackPayload {
    pub topic_id: TopicId,
    pub question_id: QuestionId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub option_index: Option<usize>,
}

impl CallbackPayload {
    pub fn reveal(topic_id: TopicId, question_id: QuestionId) -> Self {
        Self {
            topic_id,
            question_id,
            option_index: None,
        }
    }

    pub fn option(topic_id: TopicId, question_id: QuestionId, option_index: usize) -> Self {
        Self {
            topic_id,
            question_id,
            option_index: Some(option_index),
        }
    }

    /// Fails when the JSON exceeds what Telegram accepts as callback data.
    pub fn encode(&self) -> Result<String, QuizError> {
        let data = serde_json::to_string(self)
            .map_err(|e| QuizError::InvalidSelection(format!("unencodable payload: {e}")))?;
        if data.len() > CALLBACK_DATA_LIMIT {
            return Err(QuizError::InvalidSelection(format!(
                "payload of question {} is {} bytes, limit is {CALLBACK_DATA_LIMIT}",
                self.question_id,
                data.len()
            )));
        }
        Ok(data)
    }

    pub fn decode(data: &str) -> Result<Self, QuizError> {
        serde_json::from_str(data)
            .map_err(|e| QuizError::InvalidSelection(format!("malformed payload '{data}': {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn option_payload_uses_camel_case_keys() {
        let data = CallbackPayload::option(3, 101, 1).encode().unwrap();
        assert_eq!(data, r#"{"topicId":3,"questionId":101,"optionIndex":1}"#);
    }

    #[test]
    fn reveal_payload_omits_option_index() {
        let data = CallbackPayload::reveal(3, 101).encode().unwrap();
        assert_eq!(data, r#"{"topicId":3,"questionId":101}"#);
        assert_eq!(CallbackPayload::decode(&data).unwrap().option_index, None);
    }

    #[test]
    fn payload_fits_telegram_callback_limit() {
        let id = i64::from(i32::MAX);
        let data = CallbackPayload::option(id, id, 99).encode().unwrap();
        assert!(data.len() <= CALLBACK_DATA_LIMIT, "{} bytes", data.len());
    }

    #[test]
    fn oversized_payload_is_rejected() {
        let id = 100_000_000_000;
        assert!(matches!(
            CallbackPayload::option(id, id, 10).encode(),
            Err(QuizError::InvalidSelection(_))
        ));
    }

    #[test]
    fn tampered_payloads_are_invalid_selections() {
        for data in ["", "not json", r#"{"topicId":3}"#, r#"{"topicId":3,"questionId":1,"optionIndex":-1}"#] {
            assert!(
                matches!(CallbackPayload::decode(data), Err(QuizError::InvalidSelection(_))),
                "accepted {data:?}"
            );
        }
    }
}
