//! Recovery of a JSON object from free-form model output.
//!
//! Attempts run in a fixed order and the first success wins:
//! 1. the contents of a fenced code block
//! 2. the raw text
//! 3. the outermost `{...}` span
//! 4. that span with trailing commas before `}` or `]` removed

use regex::Regex;
use serde::de::DeserializeOwned;
use std::borrow::Cow;
use std::sync::LazyLock;
use thiserror::Error;

static OBJECT_SPAN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\{[\s\S]*\}").unwrap());

static TRAILING_COMMA: LazyLock<Regex> = LazyLock::new(|| Regex::new(r",(\s*[}\]])").unwrap());

/// Which attempt produced the value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseStrategy {
    FencedBlock,
    RawText,
    ObjectSpan,
    TrailingCommasRemoved,
}

/// Successfully recovered value.
#[derive(Debug, Clone, PartialEq)]
pub struct Parsed<T> {
    pub value: T,
    pub strategy: ParseStrategy,
}

/// No attempt produced a value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("could not recover JSON from model response ({length} chars): {last_error}")]
pub struct LenientParseError {
    pub length: usize,
    pub last_error: String,
}

/// Text of the first fenced block, preferring a ```` ```json ```` fence.
fn fenced_block(text: &str) -> Option<&str> {
    let after_open = if let Some((_, rest)) = text.split_once("```json") {
        rest
    } else {
        text.split_once("```")?.1
    };
    let body = after_open
        .split_once("```")
        .map(|(body, _)| body)
        .unwrap_or(after_open);
    Some(body.trim())
}

/// Parse `text` into `T`, tolerating fences, surrounding prose and trailing
/// commas.
pub fn parse_lenient<T: DeserializeOwned>(text: &str) -> Result<Parsed<T>, LenientParseError> {
    let fenced = fenced_block(text);
    let span = OBJECT_SPAN.find(fenced.unwrap_or(text)).map(|m| m.as_str());
    let repaired = span.map(|s| TRAILING_COMMA.replace_all(s, "$1"));

    let attempts: [(ParseStrategy, Option<Cow<'_, str>>); 4] = [
        (ParseStrategy::FencedBlock, fenced.map(Cow::Borrowed)),
        (ParseStrategy::RawText, Some(Cow::Borrowed(text.trim()))),
        (ParseStrategy::ObjectSpan, span.map(Cow::Borrowed)),
        (ParseStrategy::TrailingCommasRemoved, repaired),
    ];

    let mut last_error = String::from("empty response");
    for (strategy, candidate) in attempts {
        let Some(candidate) = candidate else {
            continue;
        };
        match serde_json::from_str::<T>(&candidate) {
            Ok(value) => return Ok(Parsed { value, strategy }),
            Err(e) => last_error = e.to_string(),
        }
    }

    Err(LenientParseError {
        length: text.len(),
        last_error,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Clips {
        clips: Vec<Item>,
    }

    #[derive(Debug, Deserialize, PartialEq)]
    struct Item {
        rank: u32,
    }

    fn ranks(parsed: &Parsed<Clips>) -> Vec<u32> {
        parsed.value.clips.iter().map(|c| c.rank).collect()
    }

    #[test]
    fn test_clean_json() {
        let parsed: Parsed<Clips> = parse_lenient(r#"{"clips": [{"rank": 1}, {"rank": 2}]}"#).unwrap();
        assert_eq!(ranks(&parsed), vec![1, 2]);
    }

    #[test]
    fn test_json_fence() {
        let text = "Here you go:\n```json\n{\"clips\": [{\"rank\": 3}]}\n```\nEnjoy.";
        let parsed: Parsed<Clips> = parse_lenient(text).unwrap();
        assert_eq!(parsed.strategy, ParseStrategy::FencedBlock);
        assert_eq!(ranks(&parsed), vec![3]);
    }

    #[test]
    fn test_plain_fence() {
        let text = "```\n{\"clips\": []}\n```";
        let parsed: Parsed<Clips> = parse_lenient(text).unwrap();
        assert_eq!(parsed.strategy, ParseStrategy::FencedBlock);
        assert!(parsed.value.clips.is_empty());
    }

    #[test]
    fn test_surrounding_prose() {
        let text = "Sure! The best moments are {\"clips\": [{\"rank\": 1}]} hope that helps";
        let parsed: Parsed<Clips> = parse_lenient(text).unwrap();
        assert_eq!(parsed.strategy, ParseStrategy::ObjectSpan);
        assert_eq!(ranks(&parsed), vec![1]);
    }

    #[test]
    fn test_trailing_comma() {
        let text = "{\"clips\": [{\"rank\": 1}, {\"rank\": 2},\n]}";
        let parsed: Parsed<Clips> = parse_lenient(text).unwrap();
        assert_eq!(parsed.strategy, ParseStrategy::TrailingCommasRemoved);
        assert_eq!(ranks(&parsed), vec![1, 2]);
    }

    #[test]
    fn test_trailing_comma_inside_fence() {
        let text = "```json\n{\"clips\": [{\"rank\": 5,}]}\n```";
        let parsed: Parsed<Clips> = parse_lenient(text).unwrap();
        assert_eq!(ranks(&parsed), vec![5]);
    }

    #[test]
    fn test_no_json() {
        let err = parse_lenient::<Clips>("I could not find any good clips, sorry.").unwrap_err();
        assert_eq!(err.length, 39);
    }

    #[test]
    fn test_unrecoverable_object() {
        assert!(parse_lenient::<Clips>("{clips: [rank 1]}").is_err());
    }
}
