use crate::database::model::Question;
use crate::error::{Entity, QuizError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grade {
    pub is_correct: bool,
    pub correct_text: String,
}

/// Grades a selection against a question.
///
/// Free-form questions are a reveal: the selection is ignored and the result
/// is always correct. For questions with options, the verdict comes from the
/// selected option while `correct_text` is the first option marked correct;
/// the two may differ when several options are marked correct.
pub fn grade(question: &Question, selection: Option<usize>) -> Result<Grade, QuizError> {
    if !question.has_options {
        let answer = question
            .answer
            .clone()
            .ok_or_else(|| QuizError::not_found(Entity::Answer, question.id))?;
        return Ok(Grade {
            is_correct: true,
            correct_text: answer,
        });
    }

    let options = question.options();
    let index = selection.ok_or_else(|| {
        QuizError::InvalidSelection(format!("question {} needs an option", question.id))
    })?;
    let selected = options.get(index).ok_or_else(|| {
        QuizError::InvalidSelection(format!(
            "option {index} out of range for question {} ({} options)",
            question.id,
            options.len()
        ))
    })?;

    let correct_text = options
        .iter()
        .find(|option| option.is_correct)
        .map(|option| option.text.clone())
        .ok_or_else(|| QuizError::not_found(Entity::CorrectOption, question.id))?;

    Ok(Grade {
        is_correct: selected.is_correct,
        correct_text,
    })
}
