//! Required-shape checks for model replies.
//!
//! Each reply kind has a bundled JSON schema. A [`ResponseSchema`] validates an
//! extracted payload against it and converts an accepted payload into the
//! typed result. Any violation is a retryable [`EngineError::SchemaViolation`].

use jsonschema::Validator;
use serde_json::Value;

use crate::error::{EngineError, Result};
use crate::types::{EvaluationResult, GenerationResult, ItemAnalysis};

const ARTICLE_SCHEMA_JSON: &str = include_str!("../schema/article_response.json");
const EVALUATION_SCHEMA_JSON: &str = include_str!("../schema/evaluation_response.json");

/// Validation and typed conversion for one kind of model reply.
pub trait ResponseSchema {
    type Output;

    /// Short label used in log lines.
    fn name(&self) -> &'static str;

    /// Check the payload, listing every violation found.
    fn validate(&self, value: &Value) -> Result<()>;

    /// Validate and convert the payload into the typed result.
    fn parse(&self, value: Value) -> Result<Self::Output>;

    fn is_valid(&self, value: &Value) -> bool {
        self.validate(value).is_ok()
    }
}

fn compile(schema_json: &str) -> Result<Validator> {
    let schema: Value =
        serde_json::from_str(schema_json).map_err(|e| EngineError::SchemaLoad(e.to_string()))?;
    Validator::new(&schema)
        .map_err(|e| EngineError::SchemaLoad(format!("failed to compile schema: {e}")))
}

fn check(validator: &Validator, value: &Value) -> Result<()> {
    let errors: Vec<String> = validator
        .iter_errors(value)
        .map(|e| {
            let path = e.instance_path().to_string();
            if path.is_empty() {
                e.to_string()
            } else {
                format!("{path}: {e}")
            }
        })
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(EngineError::SchemaViolation { errors })
    }
}

/// Article plus exactly two multiple choice, two fill-in-the-blank and one
/// true/false question.
pub struct ArticleSchema {
    validator: Validator,
}

impl ArticleSchema {
    pub fn new() -> Result<Self> {
        Ok(Self {
            validator: compile(ARTICLE_SCHEMA_JSON)?,
        })
    }
}

impl ResponseSchema for ArticleSchema {
    type Output = GenerationResult;

    fn name(&self) -> &'static str {
        "article"
    }

    fn validate(&self, value: &Value) -> Result<()> {
        check(&self.validator, value)
    }

    fn parse(&self, value: Value) -> Result<GenerationResult> {
        self.validate(&value)?;
        serde_json::from_value(value).map_err(|e| EngineError::SchemaViolation {
            errors: vec![e.to_string()],
        })
    }
}

/// Score in `[0, 100]` plus per-item analysis and free-text feedback.
pub struct EvaluationSchema {
    validator: Validator,
}

impl EvaluationSchema {
    pub fn new() -> Result<Self> {
        Ok(Self {
            validator: compile(EVALUATION_SCHEMA_JSON)?,
        })
    }
}

impl ResponseSchema for EvaluationSchema {
    type Output = EvaluationResult;

    fn name(&self) -> &'static str {
        "evaluation"
    }

    fn validate(&self, value: &Value) -> Result<()> {
        check(&self.validator, value)
    }

    fn parse(&self, value: Value) -> Result<EvaluationResult> {
        self.validate(&value)?;

        let score = value["score"]
            .as_f64()
            .ok_or_else(|| EngineError::SchemaViolation {
                errors: vec!["/score: not a number".into()],
            })?;

        let item_analysis = value["item_analysis"]
            .as_array()
            .map(|items| {
                items
                    .iter()
                    .enumerate()
                    .map(|(i, item)| item_from_value(i, item))
                    .collect()
            })
            .unwrap_or_default();

        Ok(EvaluationResult {
            score,
            item_analysis,
            overall_feedback: text_of(&value["overall_feedback"]),
            suggestions: text_of(&value["suggestions"]),
        })
    }
}

/// Per-item entries are free-form; take what is there and fill the gaps.
fn item_from_value(index: usize, item: &Value) -> ItemAnalysis {
    let position = u32::try_from(index + 1).unwrap_or(u32::MAX);
    match item {
        Value::Object(fields) => ItemAnalysis {
            question_num: fields
                .get("question_num")
                .and_then(|v| {
                    v.as_u64()
                        .or_else(|| v.as_str().and_then(|s| s.trim().parse().ok()))
                })
                .and_then(|n| u32::try_from(n).ok())
                .unwrap_or(position),
            correct: fields.get("correct").is_some_and(truthy),
            feedback: fields.get("feedback").map(text_of).unwrap_or_default(),
        },
        other => ItemAnalysis {
            question_num: position,
            correct: false,
            feedback: text_of(other),
        },
    }
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::String(s) => matches!(s.trim().to_lowercase().as_str(), "true" | "yes" | "correct"),
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        _ => false,
    }
}

/// Render a feedback field as display text.
fn text_of(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(text_of)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join("\n"),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Choice, Question, QuestionType};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn article() -> String {
        "Tom found a small cat under the old bridge near the river. ".repeat(3)
    }

    fn valid_article_payload() -> Value {
        json!({
            "article": article(),
            "questions": [
                {"type": "multiple_choice", "question": "Where was the cat?", "options": ["A. bridge", "B. house", "C. tree", "D. car"], "correct_answer": "A"},
                {"type": "multiple_choice", "question": "Who found it?", "options": ["A. Ann", "B. Tom", "C. Max", "D. Sue"], "correct_answer": "B"},
                {"type": "fill_blank", "question": "The cat was ___.", "correct_answer": "small"},
                {"type": "fill_blank", "question": "The bridge was near the ___.", "correct_answer": "river"},
                {"type": "true_false", "question": "The cat was big.", "correct_answer": false}
            ]
        })
    }

    #[test]
    fn test_schemas_compile() {
        assert!(ArticleSchema::new().is_ok());
        assert!(EvaluationSchema::new().is_ok());
    }

    #[test]
    fn test_valid_article() {
        let schema = ArticleSchema::new().expect("schema");
        let result = schema.parse(valid_article_payload()).expect("valid");

        assert_eq!(result.questions.len(), 5);
        assert_eq!(result.count_of(QuestionType::MultipleChoice), 2);
        assert_eq!(result.count_of(QuestionType::FillBlank), 2);
        assert_eq!(result.count_of(QuestionType::TrueFalse), 1);
        assert!(matches!(
            result.questions[1],
            Question::MultipleChoice {
                correct_answer: Choice::B,
                ..
            }
        ));
    }

    #[test]
    fn test_article_too_short() {
        let schema = ArticleSchema::new().expect("schema");
        let mut payload = valid_article_payload();
        payload["article"] = json!("Too short.");
        assert!(!schema.is_valid(&payload));
    }

    #[test]
    fn test_missing_questions() {
        let schema = ArticleSchema::new().expect("schema");
        let err = schema
            .validate(&json!({"article": article()}))
            .expect_err("missing questions");
        assert!(matches!(err, EngineError::SchemaViolation { .. }));
        assert!(err.is_retryable());
    }

    #[test]
    fn test_wrong_composition_rejected() {
        let schema = ArticleSchema::new().expect("schema");
        let mut payload = valid_article_payload();
        // Three multiple choice, one fill-in-the-blank.
        payload["questions"][3] = json!({
            "type": "multiple_choice",
            "question": "What did Tom find?",
            "options": ["A. dog", "B. cat", "C. bird", "D. fish"],
            "correct_answer": "B"
        });
        assert!(!schema.is_valid(&payload));
    }

    #[test]
    fn test_four_questions_rejected() {
        let schema = ArticleSchema::new().expect("schema");
        let mut payload = valid_article_payload();
        if let Some(questions) = payload["questions"].as_array_mut() {
            questions.pop();
        }
        assert!(!schema.is_valid(&payload));
    }

    #[test]
    fn test_multiple_choice_needs_four_options() {
        let schema = ArticleSchema::new().expect("schema");
        let mut payload = valid_article_payload();
        payload["questions"][0]["options"] = json!(["A. bridge", "B. house", "C. tree"]);
        assert!(!schema.is_valid(&payload));
    }

    #[test]
    fn test_multiple_choice_answer_must_be_letter() {
        let schema = ArticleSchema::new().expect("schema");
        let mut payload = valid_article_payload();
        payload["questions"][0]["correct_answer"] = json!("bridge");
        assert!(!schema.is_valid(&payload));

        payload["questions"][0]["correct_answer"] = json!("A. bridge");
        assert!(schema.is_valid(&payload));
    }

    #[test]
    fn test_true_false_accepts_quoted_bool() {
        let schema = ArticleSchema::new().expect("schema");
        let mut payload = valid_article_payload();
        payload["questions"][4]["correct_answer"] = json!("True");
        let result = schema.parse(payload).expect("quoted bool");
        assert_eq!(result.questions[4].correct_answer_text(), "true");
    }

    #[test]
    fn test_unknown_question_type_rejected() {
        let schema = ArticleSchema::new().expect("schema");
        let mut payload = valid_article_payload();
        payload["questions"][2]["type"] = json!("essay");
        assert!(!schema.is_valid(&payload));
    }

    #[test]
    fn test_valid_evaluation() {
        let schema = EvaluationSchema::new().expect("schema");
        let result = schema
            .parse(json!({
                "score": 85,
                "item_analysis": [
                    {"question_num": 1, "correct": true, "feedback": "Well done"},
                    {"correct": false, "feedback": "The answer was B"}
                ],
                "overall_feedback": "Good work",
                "suggestions": ["Re-read the second paragraph", "Practise new words"]
            }))
            .expect("valid");

        assert_eq!(result.score, 85.0);
        assert_eq!(result.item_analysis.len(), 2);
        assert_eq!(result.item_analysis[1].question_num, 2);
        assert!(!result.item_analysis[1].correct);
        assert_eq!(
            result.suggestions,
            "Re-read the second paragraph\nPractise new words"
        );
    }

    #[test]
    fn test_evaluation_score_out_of_range() {
        let schema = EvaluationSchema::new().expect("schema");
        let payload = json!({
            "score": 120,
            "item_analysis": [],
            "overall_feedback": "",
            "suggestions": ""
        });
        assert!(!schema.is_valid(&payload));
    }

    #[test]
    fn test_evaluation_missing_field() {
        let schema = EvaluationSchema::new().expect("schema");
        let err = schema
            .validate(&json!({"score": 50, "item_analysis": [], "overall_feedback": "ok"}))
            .expect_err("missing suggestions");
        assert!(err.to_string().contains("suggestions"));
    }

    #[test]
    fn test_evaluation_score_must_be_number() {
        let schema = EvaluationSchema::new().expect("schema");
        let payload = json!({
            "score": "85",
            "item_analysis": [],
            "overall_feedback": "",
            "suggestions": ""
        });
        assert!(!schema.is_valid(&payload));
    }
}
