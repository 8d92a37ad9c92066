use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::Result;
use crate::utils::truncate_chars;

use super::client::CompletionClient;
use super::message::ChatMessage;

pub const QUIZ_TEXT_LIMIT: usize = 3000;
pub const DEFAULT_QUESTION_COUNT: usize = 5;

const RAW_EXCERPT_CHARS: usize = 100;
const FALLBACK_QUESTION: &str = "Quiz Generation Error";

static NULL: Value = Value::Null;

const SYSTEM_PROMPT: &str = "You are a helpful quiz generator. Create multiple choice questions \
based on the provided text. You MUST respond with valid JSON only - no other text. Format your \
response as a JSON array of objects with 'question', 'options' (array of 4 choices), 'correct' \
(index of correct answer, 0-3), and 'explanation' (why this is the correct answer).";

/// One question as the model sent it. Reading an item never fails: fields
/// that are missing or of the wrong type come back empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Value")]
pub struct QuizItem {
    pub question: String,
    pub options: Vec<String>,
    /// Index into `options`; `None` when absent or not an integer, and may be
    /// out of range.
    pub correct: Option<i64>,
    pub explanation: String,
}

impl QuizItem {
    pub fn from_value(value: &Value) -> Self {
        let field = |name: &str| value.get(name).unwrap_or(&NULL);
        let question = match value {
            Value::Object(_) => text_of(field("question")),
            other => text_of(other),
        };
        let options = match field("options") {
            Value::Array(options) => options.iter().map(text_of).collect(),
            _ => Vec::new(),
        };

        Self {
            question,
            options,
            correct: answer_index(field("correct")),
            explanation: text_of(field("explanation")),
        }
    }

    /// The answer index when it points into `options`.
    pub fn correct_index(&self) -> Option<usize> {
        self.correct
            .and_then(|correct| usize::try_from(correct).ok())
            .filter(|idx| *idx < self.options.len())
    }

    pub fn correct_option(&self) -> Option<&str> {
        self.correct_index().map(|idx| self.options[idx].as_str())
    }

    pub fn is_well_formed(&self) -> bool {
        self.correct_index().is_some()
    }
}

impl From<Value> for QuizItem {
    fn from(value: Value) -> Self {
        Self::from_value(&value)
    }
}

fn text_of(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

/// Integers, integral floats and integer strings; anything else is `None`.
fn answer_index(value: &Value) -> Option<i64> {
    match value {
        Value::Number(number) => number.as_i64().or_else(|| {
            number
                .as_f64()
                .filter(|float| float.fract() == 0.0 && float.abs() < i64::MAX as f64)
                .map(|float| float as i64)
        }),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum QuizOutcome {
    Parsed(Vec<QuizItem>),
    /// The reply was not a usable quiz; `quiz` holds one diagnostic item.
    Recovered {
        quiz: Vec<QuizItem>,
        raw_reply: String,
    },
}

impl QuizOutcome {
    pub fn items(&self) -> &[QuizItem] {
        match self {
            QuizOutcome::Parsed(items) => items,
            QuizOutcome::Recovered { quiz, .. } => quiz,
        }
    }

    pub fn into_items(self) -> Vec<QuizItem> {
        match self {
            QuizOutcome::Parsed(items) => items,
            QuizOutcome::Recovered { quiz, .. } => quiz,
        }
    }

    pub fn is_recovered(&self) -> bool {
        matches!(self, QuizOutcome::Recovered { .. })
    }
}

pub fn quiz_messages(text: &str, num_questions: usize) -> Vec<ChatMessage> {
    let excerpt = truncate_chars(text, QUIZ_TEXT_LIMIT);
    vec![
        ChatMessage::system(SYSTEM_PROMPT),
        ChatMessage::user(format!(
            "Based on this text, create {num_questions} multiple choice questions. \
             Respond with ONLY valid JSON:\n\n{excerpt}"
        )),
    ]
}

pub async fn generate_quiz(
    client: &CompletionClient,
    text: &str,
    num_questions: usize,
) -> Result<QuizOutcome> {
    let reply = client.call_api(&quiz_messages(text, num_questions)).await?;
    Ok(parse_quiz_reply(&reply))
}

/// Never fails: any non-empty JSON array is `Parsed`, whatever its elements
/// hold; anything else becomes a `Recovered` outcome.
pub fn parse_quiz_reply(reply: &str) -> QuizOutcome {
    match try_parse_quiz(reply) {
        Some(items) => QuizOutcome::Parsed(items),
        None => {
            warn!(
                chars = reply.chars().count(),
                "model reply was not a valid quiz"
            );
            debug!(reply = %reply, "raw model reply");
            QuizOutcome::Recovered {
                quiz: vec![fallback_item(reply)],
                raw_reply: reply.to_string(),
            }
        }
    }
}

fn try_parse_quiz(reply: &str) -> Option<Vec<QuizItem>> {
    let value: Value = serde_json::from_str(strip_code_fence(reply)).ok()?;
    match value {
        Value::Array(entries) if !entries.is_empty() => {
            Some(entries.iter().map(QuizItem::from_value).collect())
        }
        _ => None,
    }
}

/// Removes a leading ```` ```json ```` or ```` ``` ```` marker and a trailing
/// ```` ``` ````.
pub fn strip_code_fence(reply: &str) -> &str {
    let trimmed = reply.trim();
    let Some(body) = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
    else {
        return trimmed;
    };

    let body = body.trim();
    body.strip_suffix("```").unwrap_or(body).trim()
}

fn fallback_item(reply: &str) -> QuizItem {
    QuizItem {
        question: FALLBACK_QUESTION.to_string(),
        options: vec![
            "The AI response was not in the expected format".to_string(),
            "Please try again".to_string(),
            "Run with -vv to log the full response".to_string(),
            format!(
                "Raw response: {}...",
                truncate_chars(reply, RAW_EXCERPT_CHARS)
            ),
        ],
        correct: Some(0),
        explanation: format!(
            "There was an error parsing the AI response. Raw response: {reply}"
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const QUIZ_JSON: &str = r#"[
        {
            "question": "What orbits the earth?",
            "options": ["The sun", "The moon", "Mars", "Venus"],
            "correct": 1,
            "explanation": "The moon is earth's satellite."
        }
    ]"#;

    fn assert_recovered(outcome: &QuizOutcome, reply: &str) {
        let QuizOutcome::Recovered { quiz, raw_reply } = outcome else {
            panic!("expected recovered outcome, got {outcome:?}");
        };
        assert_eq!(raw_reply, reply);
        assert_eq!(quiz.len(), 1);
        let item = &quiz[0];
        assert_eq!(item.question, FALLBACK_QUESTION);
        assert_eq!(item.options.len(), 4);
        assert_eq!(item.correct, Some(0));
        assert!(item.is_well_formed());
        assert!(item.explanation.ends_with(reply));
    }

    #[test]
    fn parses_plain_json_array() {
        let outcome = parse_quiz_reply(QUIZ_JSON);
        let QuizOutcome::Parsed(items) = outcome else {
            panic!("expected parsed quiz");
        };
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].correct_option(), Some("The moon"));
    }

    #[test]
    fn fenced_reply_matches_unwrapped() {
        let plain = parse_quiz_reply(QUIZ_JSON);
        let json_fence = parse_quiz_reply(&format!("```json\n{QUIZ_JSON}\n```"));
        let bare_fence = parse_quiz_reply(&format!("```\n{QUIZ_JSON}\n```  "));

        assert_eq!(plain, json_fence);
        assert_eq!(plain, bare_fence);
        assert!(!plain.is_recovered());
    }

    #[test]
    fn prose_reply_is_recovered() {
        let reply = "Sure! Here are some questions about the moon.";
        assert_recovered(&parse_quiz_reply(reply), reply);
    }

    #[test]
    fn empty_array_and_non_array_are_recovered() {
        for reply in ["[]", "{\"question\": \"q\"}", "42", "", "```json\n```"] {
            assert_recovered(&parse_quiz_reply(reply), reply);
        }
    }

    fn parsed(reply: &str) -> Vec<QuizItem> {
        match parse_quiz_reply(reply) {
            QuizOutcome::Parsed(items) => items,
            other => panic!("expected parsed quiz for {reply}, got {other:?}"),
        }
    }

    #[test]
    fn odd_answer_fields_keep_the_quiz() {
        let options = r#""options": ["a", "b", "c", "d"]"#;
        let cases = [
            (format!(r#"[{{"question": "q", {options}, "correct": "B"}}]"#), None),
            (format!(r#"[{{"question": "q", {options}, "correct": 1.0}}]"#), Some(1)),
            (format!(r#"[{{"question": "q", {options}, "correct": " 2 "}}]"#), Some(2)),
            (format!(r#"[{{"question": "q", {options}}}]"#), None),
            (format!(r#"[{{"question": "q", {options}, "correct": null}}]"#), None),
            (format!(r#"[{{"question": "q", {options}, "correct": 1.5}}]"#), None),
        ];

        for (reply, correct) in cases {
            let items = parsed(&reply);
            assert_eq!(items.len(), 1);
            assert_eq!(items[0].question, "q");
            assert_eq!(items[0].options, ["a", "b", "c", "d"]);
            assert_eq!(items[0].correct, correct, "{reply}");
        }
    }

    #[test]
    fn one_bad_item_does_not_discard_the_rest() {
        let reply = r#"[
            {"question": "good", "options": ["x", "y"], "correct": 0, "explanation": "e"},
            {"question": "bad", "options": ["x", "y"], "correct": "y"}
        ]"#;
        let items = parsed(reply);

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].correct_option(), Some("x"));
        assert_eq!(items[0].explanation, "e");
        assert!(!items[1].is_well_formed());
        assert_eq!(items[1].explanation, "");
    }

    #[test]
    fn array_of_non_objects_is_kept() {
        let items = parsed(r#"["just", 7, {"options": "none"}]"#);

        assert_eq!(items.len(), 3);
        assert_eq!(items[0].question, "just");
        assert_eq!(items[1].question, "7");
        assert_eq!(items[2].question, "");
        assert!(items.iter().all(|item| item.options.is_empty()));
        assert!(items.iter().all(|item| item.correct.is_none()));
    }

    #[test]
    fn non_string_options_are_rendered_as_text() {
        let items = parsed(r#"[{"question": "q", "options": [1, true, "c"], "correct": 2}]"#);
        assert_eq!(items[0].options, ["1", "true", "c"]);
        assert_eq!(items[0].correct_option(), Some("c"));
    }

    #[test]
    fn quiz_items_round_trip_through_json_output() {
        let items = parsed(QUIZ_JSON);
        let printed = serde_json::to_string(&items).unwrap();
        let reread: Vec<QuizItem> = serde_json::from_str(&printed).unwrap();
        assert_eq!(reread, items);
    }

    #[test]
    fn out_of_range_answer_is_kept_not_rejected() {
        let reply = r#"[{"question": "q", "options": ["a", "b"], "correct": 7}]"#;
        let QuizOutcome::Parsed(items) = parse_quiz_reply(reply) else {
            panic!("expected parsed quiz");
        };
        assert_eq!(items[0].correct, Some(7));
        assert!(items[0].correct_option().is_none());
        assert!(!items[0].is_well_formed());
        assert_eq!(items[0].explanation, "");
    }

    #[test]
    fn negative_answer_index_is_not_well_formed() {
        let item = QuizItem {
            question: "q".into(),
            options: vec!["a".into()],
            correct: Some(-1),
            explanation: String::new(),
        };
        assert!(item.correct_option().is_none());
    }

    #[test]
    fn fallback_excerpt_is_limited_to_100_chars() {
        let reply = "x".repeat(250);
        let item = fallback_item(&reply);
        assert_eq!(item.options[3], format!("Raw response: {}...", "x".repeat(100)));
        assert!(item.explanation.contains(&reply));
    }

    #[test]
    fn quiz_prompt_truncates_text() {
        let text = "a".repeat(QUIZ_TEXT_LIMIT + 500);
        let messages = quiz_messages(&text, 3);

        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0], ChatMessage::system(SYSTEM_PROMPT));
        let user = &messages[1].content;
        assert!(user.starts_with("Based on this text, create 3 multiple choice questions."));
        assert!(user.ends_with(&"a".repeat(QUIZ_TEXT_LIMIT)));
        assert!(!user.contains(&"a".repeat(QUIZ_TEXT_LIMIT + 1)));
    }

    #[test]
    fn strip_code_fence_leaves_unfenced_text() {
        assert_eq!(strip_code_fence("  [1] \n"), "[1]");
        assert_eq!(strip_code_fence("```json[1]```"), "[1]");
        assert_eq!(strip_code_fence("```\n[1]"), "[1]");
    }

    use proptest::prelude::*;
    proptest! {
        #[test]
        fn test_parse_quiz_reply( content in "\\PC*") {
            let outcome = parse_quiz_reply(&content);
            prop_assert!(!outcome.items().is_empty());
        }
    }
}
