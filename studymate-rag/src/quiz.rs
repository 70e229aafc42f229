//! Quiz generation, validation, and repair.
//!
//! A generative model is asked for a fixed composition of questions as a
//! bare JSON array. Models wrap output in Markdown fences often enough
//! that parsing goes through a repair pass first; after parsing, every
//! question is validated structurally and an invalid batch is regenerated
//! once before failing with a reason that names the offending item.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::completion::{CompletionProvider, CompletionRequest};
use crate::error::{QuizFormatError, RagError, Result};

/// Documents shorter than this produce meaningless quizzes and are
/// rejected before any model call.
pub const MIN_DOCUMENT_LENGTH: usize = 100;

/// Document text is truncated to this many characters before prompting.
/// A lossy prefix cut, not a summarization.
pub const DOCUMENT_PREFIX_LIMIT: usize = 8000;

/// Default number of questions requested per quiz.
pub const DEFAULT_QUESTION_COUNT: usize = 30;

/// The kind of a quiz question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionType {
    /// Multiple choice: exactly 4 options, the answer among them.
    Mcq,
    /// Short answer.
    Saq,
    /// Long answer.
    Laq,
}

/// A validated quiz question.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct QuizQuestion {
    /// Unique question id, assigned when the model omits one.
    pub id: String,
    /// The question kind.
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    /// The question text.
    pub question: String,
    /// Exactly 4 options for `mcq`; absent otherwise.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
    /// The expected answer. For `mcq` it is one of the options.
    pub correct_answer: String,
    /// Why the answer is correct.
    #[serde(default)]
    pub explanation: String,
}

/// A recorded quiz attempt. Immutable once stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizAttempt {
    /// The document the quiz was generated from.
    pub document_id: String,
    /// The questions as presented.
    pub questions: Vec<QuizQuestion>,
    /// Question id → the user's answer.
    pub user_answers: HashMap<String, String>,
    /// Percentage score in `[0, 100]`.
    pub score: f32,
    /// When the attempt was submitted.
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Compute an attempt's score: `100 × correct / total`, where an answer is
/// correct when it equals the expected answer after trimming and
/// lowercasing. An empty question list scores 0.
pub fn score_attempt(questions: &[QuizQuestion], user_answers: &HashMap<String, String>) -> f32 {
    if questions.is_empty() {
        return 0.0;
    }

    let normalize = |s: &str| s.trim().to_lowercase();
    let correct = questions
        .iter()
        .filter(|q| {
            user_answers
                .get(&q.id)
                .is_some_and(|answer| normalize(answer) == normalize(&q.correct_answer))
        })
        .count();

    100.0 * correct as f32 / questions.len() as f32
}

/// What the model is allowed to return per question, before validation.
/// Unknown or missing fields surface as typed validation failures instead
/// of propagating into downstream consumers.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawQuestion {
    #[serde(default)]
    id: Option<String>,
    #[serde(rename = "type")]
    question_type: QuestionType,
    #[serde(default)]
    question: String,
    #[serde(default)]
    options: Option<Vec<String>>,
    #[serde(default)]
    correct_answer: String,
    #[serde(default)]
    explanation: String,
}

/// Generates and validates quizzes over a completion provider.
pub struct QuizGenerator {
    completion_provider: Arc<dyn CompletionProvider>,
    temperature: f32,
}

impl QuizGenerator {
    /// Create a generator over the given completion provider.
    pub fn new(completion_provider: Arc<dyn CompletionProvider>) -> Self {
        Self { completion_provider, temperature: 0.7 }
    }

    /// Set the sampling temperature for quiz generation.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Generate a validated question set from document text.
    ///
    /// The document must be at least [`MIN_DOCUMENT_LENGTH`] characters;
    /// longer texts are truncated to [`DOCUMENT_PREFIX_LIMIT`] characters
    /// before prompting. One invalid batch triggers a single full
    /// regeneration; a second invalid batch fails with the specific
    /// [`QuizFormatError`].
    pub async fn generate(&self, document_text: &str, question_count: usize) -> Result<Vec<QuizQuestion>> {
        let trimmed = document_text.trim();
        if trimmed.chars().count() < MIN_DOCUMENT_LENGTH {
            return Err(RagError::InvalidInput(format!(
                "document text must be at least {MIN_DOCUMENT_LENGTH} characters to generate a quiz"
            )));
        }

        let prefix = crate::document::truncate_chars(trimmed, DOCUMENT_PREFIX_LIMIT);
        let prompt = quiz_prompt(prefix, question_count);

        match self.generate_once(&prompt).await {
            Ok(questions) => Ok(questions),
            Err(RagError::QuizFormat(first_failure)) => {
                warn!(error = %first_failure, "quiz batch invalid, regenerating once");
                self.generate_once(&prompt).await
            }
            Err(other) => Err(other),
        }
    }

    /// One generation round: complete, repair, parse, validate.
    async fn generate_once(&self, prompt: &str) -> Result<Vec<QuizQuestion>> {
        let request = CompletionRequest::user(prompt).with_temperature(self.temperature);
        let output = self.completion_provider.complete(request).await?;

        let questions = parse_quiz_output(&output)?;
        info!(question_count = questions.len(), "generated quiz");
        Ok(questions)
    }
}

/// Build the structured-output prompt with the fixed 10/10/10 composition.
fn quiz_prompt(content: &str, question_count: usize) -> String {
    format!(
        "Generate exactly {question_count} questions from the following content:\n\
         - 10 Multiple Choice Questions (MCQs) with 4 options each\n\
         - 10 Short Answer Questions (SAQs)\n\
         - 10 Long Answer Questions (LAQs)\n\n\
         Content: {content}\n\n\
         Return ONLY a valid JSON array, with no surrounding prose, using this structure:\n\
         [\n\
           {{\n\
             \"type\": \"mcq\",\n\
             \"question\": \"...\",\n\
             \"options\": [\"A\", \"B\", \"C\", \"D\"],\n\
             \"correctAnswer\": \"A\",\n\
             \"explanation\": \"...\"\n\
           }},\n\
           {{\n\
             \"type\": \"saq\",\n\
             \"question\": \"...\",\n\
             \"correctAnswer\": \"...\",\n\
             \"explanation\": \"...\"\n\
           }},\n\
           {{\n\
             \"type\": \"laq\",\n\
             \"question\": \"...\",\n\
             \"correctAnswer\": \"...\",\n\
             \"explanation\": \"...\"\n\
           }}\n\
         ]"
    )
}

/// Repair and parse raw model output into validated questions.
///
/// The repair pass strips a surrounding Markdown code fence when present;
/// the fenced and unfenced forms of the same array parse identically.
pub fn parse_quiz_output(output: &str) -> Result<Vec<QuizQuestion>> {
    let trimmed = output.trim();
    if trimmed.is_empty() {
        return Err(QuizFormatError::EmptyOutput.into());
    }

    let inner = strip_code_fence(trimmed);

    let raw: Vec<RawQuestion> = serde_json::from_str(inner)
        .map_err(|e| QuizFormatError::InvalidJson(e.to_string()))?;

    if raw.is_empty() {
        return Err(QuizFormatError::EmptyArray.into());
    }

    raw.into_iter().enumerate().map(|(index, raw)| validate_question(index, raw)).collect()
}

/// Strip a surrounding Markdown code fence (with an optional language tag)
/// from model output. Returns the input unchanged when no fence wraps it.
fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    let Some(body) = rest.strip_suffix("```") else {
        return text;
    };
    // Drop the language tag line (e.g. "json") if one follows the fence.
    match body.find('\n') {
        Some(newline) if body[..newline].trim().chars().all(|c| c.is_ascii_alphanumeric()) => {
            body[newline + 1..].trim()
        }
        _ => body.trim(),
    }
}

/// Validate one raw question, normalizing it into a [`QuizQuestion`].
fn validate_question(index: usize, raw: RawQuestion) -> Result<QuizQuestion> {
    let invalid = |reason: &str| -> RagError {
        QuizFormatError::InvalidQuestion { index, reason: reason.to_string() }.into()
    };

    if raw.question.trim().is_empty() {
        return Err(invalid("question text is empty"));
    }
    if raw.correct_answer.trim().is_empty() {
        return Err(invalid("correct answer is empty"));
    }

    let options = match raw.question_type {
        QuestionType::Mcq => {
            let options = raw.options.ok_or_else(|| invalid("mcq has no options"))?;
            if options.len() != 4 {
                return Err(invalid("mcq must have exactly 4 options"));
            }
            if options.iter().any(|o| o.trim().is_empty()) {
                return Err(invalid("mcq option is empty"));
            }
            let mut distinct: Vec<&String> = options.iter().collect();
            distinct.sort();
            distinct.dedup();
            if distinct.len() != 4 {
                return Err(invalid("mcq options are not distinct"));
            }
            if !options.contains(&raw.correct_answer) {
                return Err(invalid("mcq correct answer is not among the options"));
            }
            Some(options)
        }
        // Options on saq/laq are a model slip; drop them rather than fail.
        QuestionType::Saq | QuestionType::Laq => None,
    };

    Ok(QuizQuestion {
        id: raw.id.filter(|id| !id.trim().is_empty()).unwrap_or_else(|| Uuid::new_v4().to_string()),
        question_type: raw.question_type,
        question: raw.question,
        options,
        correct_answer: raw.correct_answer,
        explanation: raw.explanation,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID_MCQ: &str = r#"[{
        "type": "mcq",
        "question": "What color is the sky?",
        "options": ["Blue", "Green", "Red", "Yellow"],
        "correctAnswer": "Blue",
        "explanation": "Rayleigh scattering."
    }]"#;

    #[test]
    fn parses_a_bare_json_array() {
        let questions = parse_quiz_output(VALID_MCQ).unwrap();
        assert_eq!(questions.len(), 1);
        assert_eq!(questions[0].question_type, QuestionType::Mcq);
        assert_eq!(questions[0].correct_answer, "Blue");
        assert!(!questions[0].id.is_empty());
    }

    #[test]
    fn fenced_output_parses_identically_to_unfenced() {
        let fenced = format!("```json\n{VALID_MCQ}\n```");
        let plain = parse_quiz_output(VALID_MCQ).unwrap();
        let repaired = parse_quiz_output(&fenced).unwrap();
        assert_eq!(plain.len(), repaired.len());
        assert_eq!(plain[0].question, repaired[0].question);
        assert_eq!(plain[0].options, repaired[0].options);
    }

    #[test]
    fn fence_without_language_tag_is_stripped() {
        let fenced = format!("```\n{VALID_MCQ}\n```");
        assert!(parse_quiz_output(&fenced).is_ok());
    }

    #[test]
    fn empty_output_is_a_distinct_failure() {
        assert!(matches!(
            parse_quiz_output("   "),
            Err(RagError::QuizFormat(QuizFormatError::EmptyOutput))
        ));
    }

    #[test]
    fn non_json_output_is_a_distinct_failure() {
        assert!(matches!(
            parse_quiz_output("Sure! Here are your questions."),
            Err(RagError::QuizFormat(QuizFormatError::InvalidJson(_)))
        ));
    }

    #[test]
    fn empty_array_is_a_distinct_failure() {
        assert!(matches!(
            parse_quiz_output("[]"),
            Err(RagError::QuizFormat(QuizFormatError::EmptyArray))
        ));
    }

    #[test]
    fn mcq_with_three_options_is_rejected() {
        let bad = r#"[{
            "type": "mcq",
            "question": "q",
            "options": ["A", "B", "C"],
            "correctAnswer": "A",
            "explanation": ""
        }]"#;
        assert!(matches!(
            parse_quiz_output(bad),
            Err(RagError::QuizFormat(QuizFormatError::InvalidQuestion { index: 0, .. }))
        ));
    }

    #[test]
    fn mcq_answer_outside_options_is_rejected() {
        let bad = r#"[{
            "type": "mcq",
            "question": "q",
            "options": ["A", "B", "C", "D"],
            "correctAnswer": "E",
            "explanation": ""
        }]"#;
        assert!(parse_quiz_output(bad).is_err());
    }

    #[test]
    fn duplicate_mcq_options_are_rejected() {
        let bad = r#"[{
            "type": "mcq",
            "question": "q",
            "options": ["A", "A", "B", "C"],
            "correctAnswer": "A",
            "explanation": ""
        }]"#;
        assert!(parse_quiz_output(bad).is_err());
    }

    #[test]
    fn saq_options_are_dropped_not_fatal() {
        let sloppy = r#"[{
            "type": "saq",
            "question": "Define osmosis.",
            "options": ["stray"],
            "correctAnswer": "Diffusion of water across a membrane.",
            "explanation": ""
        }]"#;
        let questions = parse_quiz_output(sloppy).unwrap();
        assert!(questions[0].options.is_none());
    }

    #[test]
    fn model_supplied_ids_are_kept() {
        let with_id = r#"[{
            "id": "q-7",
            "type": "laq",
            "question": "Discuss photosynthesis.",
            "correctAnswer": "Light reactions and the Calvin cycle.",
            "explanation": ""
        }]"#;
        assert_eq!(parse_quiz_output(with_id).unwrap()[0].id, "q-7");
    }

    fn question(id: &str, answer: &str) -> QuizQuestion {
        QuizQuestion {
            id: id.to_string(),
            question_type: QuestionType::Saq,
            question: "q".to_string(),
            options: None,
            correct_answer: answer.to_string(),
            explanation: String::new(),
        }
    }

    #[test]
    fn score_normalizes_case_and_whitespace() {
        let questions = vec![question("a", "Mitochondria"), question("b", "Golgi")];
        let mut answers = HashMap::new();
        answers.insert("a".to_string(), "  mitochondria ".to_string());
        answers.insert("b".to_string(), "nucleus".to_string());
        let score = score_attempt(&questions, &answers);
        assert!((score - 50.0).abs() < f32::EPSILON);
    }

    #[test]
    fn unanswered_questions_count_as_wrong() {
        let questions = vec![question("a", "x"), question("b", "y")];
        let answers = HashMap::new();
        assert_eq!(score_attempt(&questions, &answers), 0.0);
    }

    #[test]
    fn score_is_bounded() {
        let questions = vec![question("a", "x")];
        let mut answers = HashMap::new();
        answers.insert("a".to_string(), "x".to_string());
        assert_eq!(score_attempt(&questions, &answers), 100.0);
        assert_eq!(score_attempt(&[], &answers), 0.0);
    }
}
