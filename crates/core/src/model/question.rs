use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::QuestionId;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question id cannot be empty")]
    EmptyId,

    #[error("question {id:?} has an empty prompt")]
    EmptyPrompt { id: String },

    #[error("question {id:?} has an empty expected answer")]
    EmptyAnswer { id: String },
}

/// Reference to the image or clip shown alongside a question.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MediaRef(String);

impl MediaRef {
    #[must_use]
    pub fn new(uri: impl Into<String>) -> Self {
        Self(uri.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Unvalidated question as it appears in a catalog file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionDraft {
    pub id: String,
    pub prompt: String,
    pub expected_answer: String,
    #[serde(default)]
    pub media: Option<String>,
}

impl QuestionDraft {
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        prompt: impl Into<String>,
        expected_answer: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            prompt: prompt.into(),
            expected_answer: expected_answer.into(),
            media: None,
        }
    }

    #[must_use]
    pub fn with_media(mut self, media: impl Into<String>) -> Self {
        self.media = Some(media.into());
        self
    }

    /// Trim and check the draft.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` if the id, prompt, or expected answer is blank.
    pub fn validate(self) -> Result<QuestionItem, QuestionError> {
        let id = self.id.trim().to_owned();
        if id.is_empty() {
            return Err(QuestionError::EmptyId);
        }
        let prompt = self.prompt.trim().to_owned();
        if prompt.is_empty() {
            return Err(QuestionError::EmptyPrompt { id });
        }
        let expected_answer = self.expected_answer.trim().to_owned();
        if expected_answer.is_empty() {
            return Err(QuestionError::EmptyAnswer { id });
        }

        Ok(QuestionItem {
            id: QuestionId::new(id),
            prompt,
            expected_answer,
            media: MediaRef::new(self.media.map(|m| m.trim().to_owned()).unwrap_or_default()),
        })
    }
}

/// One piece of quiz or board content. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "QuestionDraft")]
pub struct QuestionItem {
    id: QuestionId,
    prompt: String,
    expected_answer: String,
    media: MediaRef,
}

impl TryFrom<QuestionDraft> for QuestionItem {
    type Error = QuestionError;

    fn try_from(draft: QuestionDraft) -> Result<Self, Self::Error> {
        draft.validate()
    }
}

impl QuestionItem {
    #[must_use]
    pub fn id(&self) -> &QuestionId {
        &self.id
    }

    #[must_use]
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    #[must_use]
    pub fn expected_answer(&self) -> &str {
        &self.expected_answer
    }

    #[must_use]
    pub fn media(&self) -> &MediaRef {
        &self.media
    }

    /// Compares a raw submission with the expected answer, ignoring
    /// surrounding whitespace and letter case.
    #[must_use]
    pub fn accepts(&self, raw: &str) -> bool {
        normalize_answer(raw) == normalize_answer(&self.expected_answer)
    }
}

/// Trimmed, case-folded form used for answer comparison.
#[must_use]
pub fn normalize_answer(raw: &str) -> String {
    raw.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mars() -> QuestionItem {
        QuestionDraft::new("p1", "Which planet is red?", "Mars")
            .with_media("img/mars.png")
            .validate()
            .unwrap()
    }

    #[test]
    fn accepts_ignores_case_and_whitespace() {
        let item = mars();
        assert!(item.accepts("  mars "));
        assert!(item.accepts("MARS"));
        assert!(!item.accepts("Venus"));
        assert!(!item.accepts(""));
    }

    #[test]
    fn blank_fields_are_rejected() {
        assert_eq!(
            QuestionDraft::new(" ", "q", "a").validate().unwrap_err(),
            QuestionError::EmptyId
        );
        assert!(matches!(
            QuestionDraft::new("x", "", "a").validate(),
            Err(QuestionError::EmptyPrompt { .. })
        ));
        assert!(matches!(
            QuestionDraft::new("x", "q", "  ").validate(),
            Err(QuestionError::EmptyAnswer { .. })
        ));
    }

    #[test]
    fn deserializes_through_validation() {
        let json = r#"{"id":"c1","prompt":"Hunter?","expectedAnswer":"Orion"}"#;
        let item: QuestionItem = serde_json::from_str(json).unwrap();
        assert_eq!(item.id().as_str(), "c1");
        assert!(item.media().is_empty());

        let bad = r#"{"id":"c1","prompt":"","expectedAnswer":"Orion"}"#;
        assert!(serde_json::from_str::<QuestionItem>(bad).is_err());
    }
}
