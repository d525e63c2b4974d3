use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use sqlx::FromRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QuestionType {
    Matching,
    Completion,
    Drawing,
    Coloring,
    MultipleChoice,
    Ordering,
    Tracing,
    AudioReading,
    Counting,
    Identification,
    Puzzle,
    Sorting,
    Handwriting,
    LetterTracing,
    NumberRecognition,
    PictureWordMatching,
    PatternCompletion,
    Categorization,
}

impl QuestionType {
    pub const ALL: [QuestionType; 18] = [
        QuestionType::Matching,
        QuestionType::Completion,
        QuestionType::Drawing,
        QuestionType::Coloring,
        QuestionType::MultipleChoice,
        QuestionType::Ordering,
        QuestionType::Tracing,
        QuestionType::AudioReading,
        QuestionType::Counting,
        QuestionType::Identification,
        QuestionType::Puzzle,
        QuestionType::Sorting,
        QuestionType::Handwriting,
        QuestionType::LetterTracing,
        QuestionType::NumberRecognition,
        QuestionType::PictureWordMatching,
        QuestionType::PatternCompletion,
        QuestionType::Categorization,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionType::Matching => "MATCHING",
            QuestionType::Completion => "COMPLETION",
            QuestionType::Drawing => "DRAWING",
            QuestionType::Coloring => "COLORING",
            QuestionType::MultipleChoice => "MULTIPLE_CHOICE",
            QuestionType::Ordering => "ORDERING",
            QuestionType::Tracing => "TRACING",
            QuestionType::AudioReading => "AUDIO_READING",
            QuestionType::Counting => "COUNTING",
            QuestionType::Identification => "IDENTIFICATION",
            QuestionType::Puzzle => "PUZZLE",
            QuestionType::Sorting => "SORTING",
            QuestionType::Handwriting => "HANDWRITING",
            QuestionType::LetterTracing => "LETTER_TRACING",
            QuestionType::NumberRecognition => "NUMBER_RECOGNITION",
            QuestionType::PictureWordMatching => "PICTURE_WORD_MATCHING",
            QuestionType::PatternCompletion => "PATTERN_COMPLETION",
            QuestionType::Categorization => "CATEGORIZATION",
        }
    }

    /// Case-insensitive lookup of a stored or client-supplied tag.
    pub fn from_tag(tag: &str) -> Option<Self> {
        let tag = tag.trim();
        Self::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(tag))
    }
}

impl std::fmt::Display for QuestionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A question row as read back from storage. Only the columns every
/// environment is guaranteed to have are selected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Question {
    pub id: String,
    pub assignment_id: i64,
    #[serde(rename = "type")]
    pub question_type: String,
    #[sqlx(rename = "question_order")]
    pub order: i32,
    #[sqlx(rename = "question_text")]
    pub text: String,
    #[sqlx(rename = "question_data")]
    pub data: Option<JsonValue>,
}

/// Identity of an already-stored question, used to keep ids stable across saves.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct StoredPosition {
    pub id: String,
    #[sqlx(rename = "question_order")]
    pub order: i32,
}

/// What a client submits when saving an assignment's questions.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QuestionDraft {
    #[serde(rename = "type", alias = "questionType", default)]
    pub question_type: Option<String>,
    #[serde(alias = "questionText", default)]
    pub text: Option<String>,
    #[serde(alias = "questionData", default)]
    pub data: Option<JsonValue>,
    /// Accepted so older clients keep working; position in the list wins.
    #[serde(default)]
    pub order: Option<JsonValue>,
    #[serde(alias = "hintText", default)]
    pub hint_text: Option<String>,
    #[serde(alias = "audioInstructions", default)]
    pub audio_instructions: Option<String>,
    #[serde(alias = "feedbackCorrect", default)]
    pub feedback_correct: Option<String>,
    #[serde(alias = "feedbackIncorrect", default)]
    pub feedback_incorrect: Option<String>,
}

impl QuestionDraft {
    pub fn new(question_type: Option<&str>, text: &str) -> Self {
        Self {
            question_type: question_type.map(str::to_string),
            text: Some(text.to_string()),
            ..Default::default()
        }
    }
}
