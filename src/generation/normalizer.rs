//! Turns untrusted provider output into a typed quiz payload.
//!
//! Providers are free to wrap their JSON in markdown fences, prefix it with
//! commentary, nest it inside candidate envelopes, or not return JSON at all.
//! Every extraction step has a fallback; malformed output degrades to an empty
//! question list carrying a `failure` reason. Only an empty response is
//! reported as an error.

use std::sync::OnceLock;

use regex::Regex;
use serde_json::{Map, Value};

use super::{client::RawCompletion, prompt::GenerationParams};
use crate::{
    error::AppError,
    models::quiz::{FALLBACK_QUIZ_TITLE, QuestionType},
    utils::value::display_value,
};

/// Keys under which a question array may appear.
const QUESTION_LIST_KEYS: &[&str] = &["questions", "items", "questions_list"];
const QUESTION_TEXT_KEYS: &[&str] = &["questionText", "question", "prompt", "question_text", "text"];
const CORRECT_ANSWER_KEYS: &[&str] = &["correctAnswer", "answer", "correct_answer"];
const OPTION_KEYS: &[&str] = &["options", "choices"];

/// Upper bound on start positions tried by the balanced-brace fallback.
const MAX_BRACE_ATTEMPTS: usize = 32;

#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedQuestion {
    /// May be empty; dropping such entries is up to the caller.
    pub question_text: String,
    /// `Some` only for multiple-choice questions.
    pub options: Option<Vec<String>>,
    pub correct_answer: Option<String>,
    pub question_type: QuestionType,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedQuiz {
    pub title: String,
    pub questions: Vec<NormalizedQuestion>,
    /// Why the provider output could not be used, if it could not.
    pub failure: Option<String>,
}

impl NormalizedQuiz {
    fn degraded(reason: impl Into<String>) -> Self {
        Self {
            title: FALLBACK_QUIZ_TITLE.to_string(),
            questions: Vec::new(),
            failure: Some(reason.into()),
        }
    }
}

static FENCED_BLOCK_REGEX: OnceLock<Regex> = OnceLock::new();
static FENCE_MARKER_REGEX: OnceLock<Regex> = OnceLock::new();
static LABEL_LINE_REGEX: OnceLock<Regex> = OnceLock::new();

fn fenced_block_regex() -> &'static Regex {
    FENCED_BLOCK_REGEX.get_or_init(|| {
        Regex::new(r"(?s)```[ \t]*([A-Za-z0-9_+-]*)[ \t]*\r?\n?(.*?)```")
            .expect("Invalid fenced block regex")
    })
}

fn fence_marker_regex() -> &'static Regex {
    FENCE_MARKER_REGEX
        .get_or_init(|| Regex::new(r"```[ \t]*[A-Za-z0-9_+-]*").expect("Invalid fence marker regex"))
}

fn label_line_regex() -> &'static Regex {
    LABEL_LINE_REGEX.get_or_init(|| {
        Regex::new(r"^(?i)[a-z][a-z0-9 _-]{0,30}:[ \t]*(\r?\n)?").expect("Invalid label line regex")
    })
}

/// Normalizes a provider response into at most `params.num_questions`
/// questions.
///
/// Returns `AppError::Generation` only for an empty response: null, blank, or
/// a provider envelope without any text.
pub fn normalize(raw: &RawCompletion, params: &GenerationParams) -> Result<NormalizedQuiz, AppError> {
    if let RawCompletion::Structured(value) = raw {
        if let Some(list) = question_list(value) {
            return Ok(from_payload(value, list, params));
        }
    }

    let Some(text) = locate_text(raw) else {
        return match raw {
            RawCompletion::Structured(value) if !is_empty_response(value) => Ok(
                NormalizedQuiz::degraded("provider response holds neither text nor questions"),
            ),
            _ => Err(AppError::Generation("Empty response from AI".to_string())),
        };
    };

    let cleaned = strip_fences(&text);
    let candidate = extract_json_candidate(&text, &cleaned);

    let parsed = match serde_json::from_str::<Value>(candidate) {
        Ok(value) => value,
        Err(err) => match recover_object(&[candidate, cleaned.as_str()]) {
            Some(value) => value,
            None => {
                return Ok(NormalizedQuiz::degraded(format!(
                    "provider output is not valid JSON: {}",
                    err
                )));
            }
        },
    };

    match question_list(&parsed) {
        Some(list) => Ok(from_payload(&parsed, list, params)),
        None => Ok(NormalizedQuiz::degraded(
            "provider JSON does not contain a questions array",
        )),
    }
}

/// Keys of provider envelopes that wrap the generated text.
const ENVELOPE_KEYS: &[&str] = &["text", "candidates", "choices"];

/// Null, blank, or an envelope that carried no text.
fn is_empty_response(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(text) => text.trim().is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty() || ENVELOPE_KEYS.iter().any(|key| map.contains_key(*key)),
        _ => false,
    }
}

/// The question array of a payload: a known key on an object, or a bare array.
fn question_list(value: &Value) -> Option<&Vec<Value>> {
    match value {
        Value::Array(items) => Some(items),
        Value::Object(map) => QUESTION_LIST_KEYS
            .iter()
            .find_map(|key| map.get(*key).and_then(Value::as_array)),
        _ => None,
    }
}

fn from_payload(root: &Value, list: &[Value], params: &GenerationParams) -> NormalizedQuiz {
    let title = root
        .get("title")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .unwrap_or(FALLBACK_QUIZ_TITLE)
        .to_string();

    let questions: Vec<NormalizedQuestion> = list
        .iter()
        .take(params.num_questions)
        .map(|item| normalize_question(item, params.question_type))
        .collect();

    let failure = questions
        .is_empty()
        .then(|| "provider returned an empty questions array".to_string());

    NormalizedQuiz {
        title,
        questions,
        failure,
    }
}

fn normalize_question(item: &Value, default_type: QuestionType) -> NormalizedQuestion {
    let empty = Map::new();
    let obj = item.as_object().unwrap_or(&empty);

    let question_type = obj
        .get("type")
        .and_then(Value::as_str)
        .and_then(QuestionType::from_label)
        .unwrap_or(default_type);

    let options = match question_type {
        QuestionType::MultipleChoice => OPTION_KEYS
            .iter()
            .find_map(|key| obj.get(*key))
            .and_then(parse_options),
        QuestionType::Text => None,
    };

    NormalizedQuestion {
        question_text: first_text(obj, QUESTION_TEXT_KEYS).unwrap_or_default(),
        options,
        correct_answer: first_text(obj, CORRECT_ANSWER_KEYS),
        question_type,
    }
}

/// First non-blank value among `keys`, rendered as text.
fn first_text(obj: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| match obj.get(*key) {
        None | Some(Value::Null) => None,
        Some(value) => {
            let text = display_value(value);
            let trimmed = text.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
    })
}

/// Options arrive as an array, a JSON-encoded array, or "A|B|C".
fn parse_options(value: &Value) -> Option<Vec<String>> {
    match value {
        Value::Array(items) => Some(items.iter().map(display_value).collect()),
        Value::String(raw) => match serde_json::from_str::<Value>(raw) {
            Ok(Value::Array(items)) => Some(items.iter().map(display_value).collect()),
            _ => Some(raw.split('|').map(|part| part.trim().to_string()).collect()),
        },
        _ => None,
    }
}

/// Finds the text blob in a response: a plain string, a `text` field,
/// or the concatenated text of all candidates.
fn locate_text(raw: &RawCompletion) -> Option<String> {
    let text = match raw {
        RawCompletion::Text(text) => Some(text.clone()),
        RawCompletion::Structured(value) => text_of(value),
    }?;

    (!text.trim().is_empty()).then_some(text)
}

fn text_of(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Object(map) => {
            if let Some(text) = map.get("text").and_then(Value::as_str) {
                return Some(text.to_string());
            }
            if let Some(candidates) = map.get("candidates").and_then(Value::as_array) {
                return join_non_empty(candidates.iter().filter_map(candidate_text));
            }
            // OpenAI-style envelopes
            if let Some(choices) = map.get("choices").and_then(Value::as_array) {
                return join_non_empty(choices.iter().filter_map(|choice| {
                    choice
                        .pointer("/message/content")
                        .or_else(|| choice.get("text"))
                        .and_then(content_text)
                }));
            }
            None
        }
        _ => None,
    }
}

fn candidate_text(candidate: &Value) -> Option<String> {
    match candidate {
        Value::String(text) => Some(text.clone()),
        Value::Object(map) => ["content", "output", "text"]
            .iter()
            .filter_map(|key| map.get(*key))
            .find_map(content_text),
        _ => None,
    }
}

/// Content may be a string, a list of parts, or `{ parts: [...] }`.
fn content_text(content: &Value) -> Option<String> {
    match content {
        Value::String(text) => Some(text.clone()),
        Value::Array(parts) => {
            let joined: String = parts
                .iter()
                .filter_map(|part| match part {
                    Value::String(text) => Some(text.as_str()),
                    other => other.get("text").and_then(Value::as_str),
                })
                .collect();
            (!joined.is_empty()).then_some(joined)
        }
        Value::Object(map) => match map.get("parts") {
            Some(parts) => content_text(parts),
            None => map.get("text").and_then(Value::as_str).map(str::to_string),
        },
        _ => None,
    }
}

fn join_non_empty(texts: impl Iterator<Item = String>) -> Option<String> {
    let texts: Vec<String> = texts.filter(|t| !t.trim().is_empty()).collect();
    (!texts.is_empty()).then(|| texts.join("\n"))
}

/// Removes fence markers and a leading "json:" style label line.
fn strip_fences(text: &str) -> String {
    let unfenced = fence_marker_regex().replace_all(text, "");
    let trimmed = unfenced.trim();
    label_line_regex().replace(trimmed, "").trim().to_string()
}

/// Picks the most promising JSON-object substring, in order: a json fenced
/// block, the unfenced text when it is an object, the greedy `{...}` span,
/// and finally the cleaned text itself.
fn extract_json_candidate<'a>(text: &'a str, cleaned: &'a str) -> &'a str {
    for caps in fenced_block_regex().captures_iter(text) {
        let label = caps.get(1).map_or("", |m| m.as_str());
        let body = caps.get(2).map_or("", |m| m.as_str()).trim();
        if label.eq_ignore_ascii_case("json") || (label.is_empty() && body.starts_with('{')) {
            return body;
        }
    }

    if cleaned.starts_with('{') && cleaned.ends_with('}') {
        return cleaned;
    }

    if let (Some(start), Some(end)) = (cleaned.find('{'), cleaned.rfind('}')) {
        if start < end {
            return &cleaned[start..=end];
        }
    }

    cleaned
}

/// Balanced-brace recovery over several sources. An object carrying a
/// question list wins over any earlier object that parses without one, so a
/// nested question is never mistaken for the payload.
fn recover_object(sources: &[&str]) -> Option<Value> {
    let mut fallback = None;
    for value in sources.iter().flat_map(|text| parsable_objects(text)) {
        if question_list(&value).is_some() {
            return Some(value);
        }
        fallback.get_or_insert(value);
    }
    fallback
}

/// Balanced `{...}` objects of `text` that parse, in order of their opening brace.
fn parsable_objects(text: &str) -> impl Iterator<Item = Value> + '_ {
    text.match_indices('{')
        .take(MAX_BRACE_ATTEMPTS)
        .filter_map(|(start, _)| balanced_object(&text[start..]))
        .filter_map(|slice| match serde_json::from_str::<Value>(slice) {
            Ok(value @ Value::Object(_)) => Some(value),
            _ => None,
        })
}

/// Returns the prefix of `text` (which starts with `{`) up to its matching
/// closing brace. Braces inside string literals are ignored.
fn balanced_object(text: &str) -> Option<&str> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, c) in text.char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(&text[..=i]);
                }
            }
            _ => {}
        }
    }
    None
}
