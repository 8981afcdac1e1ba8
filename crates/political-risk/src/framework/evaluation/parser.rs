use serde_json::Value;
use tracing::warn;

use super::ImpactEvaluation;
use crate::framework::domain::CategoryId;
use crate::framework::scenario::Impact;

/// Failure modes of interpreting an evaluator reply. Each one is recoverable by the caller.
#[derive(Debug, thiserror::Error)]
pub enum ImpactParseError {
    #[error("reply does not contain a JSON object")]
    NoJsonFound,
    #[error("reply contains malformed JSON: {0}")]
    InvalidJson(#[source] serde_json::Error),
    #[error("reply has an unexpected shape: {0}")]
    MalformedShape(String),
    #[error("reply contained no usable impacts")]
    EmptyResult,
}

/// Validate a free-text evaluator reply into impacts over the known category vocabulary.
///
/// Entries with an unknown category, a non-numeric delta, or no reason are dropped; the
/// parse fails only when nothing usable remains.
pub fn parse_impact_response(raw: &str) -> Result<ImpactEvaluation, ImpactParseError> {
    let candidate = extract_json_object(raw).ok_or(ImpactParseError::NoJsonFound)?;
    let normalized = strip_explicit_plus(candidate);
    let document: Value =
        serde_json::from_str(&normalized).map_err(ImpactParseError::InvalidJson)?;

    let entries = match document.get("impacts") {
        Some(Value::Array(entries)) => entries,
        Some(_) => {
            return Err(ImpactParseError::MalformedShape(
                "`impacts` is not an array".to_string(),
            ))
        }
        None => {
            return Err(ImpactParseError::MalformedShape(
                "`impacts` field is missing".to_string(),
            ))
        }
    };

    let mut impacts = Vec::with_capacity(entries.len());
    let mut dropped = 0;
    for (index, entry) in entries.iter().enumerate() {
        match parse_entry(entry) {
            Ok(impact) => impacts.push(impact),
            Err(reason) => {
                dropped += 1;
                warn!(index, %reason, "dropping impact entry from evaluator reply");
            }
        }
    }

    if impacts.is_empty() {
        return Err(ImpactParseError::EmptyResult);
    }

    let summary = document
        .get("summary")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    Ok(ImpactEvaluation {
        impacts,
        summary,
        dropped,
    })
}

fn parse_entry(entry: &Value) -> Result<Impact, String> {
    let raw_category = entry
        .get("category")
        .and_then(Value::as_str)
        .ok_or_else(|| "missing category".to_string())?;
    let category = raw_category
        .parse::<CategoryId>()
        .map_err(|err| err.to_string())?;

    let delta = entry
        .get("delta")
        .and_then(Value::as_f64)
        .filter(|delta| delta.is_finite())
        .ok_or_else(|| format!("non-numeric delta for {category}"))?;

    let reason = entry
        .get("reason")
        .and_then(Value::as_str)
        .ok_or_else(|| format!("missing reason for {category}"))?;

    Ok(Impact::new(category, delta, reason))
}

/// First `{...}` substring whose braces balance, ignoring braces inside JSON strings.
pub(crate) fn extract_json_object(text: &str) -> Option<&str> {
    let mut search_from = 0;
    while let Some(offset) = text[search_from..].find('{') {
        let start = search_from + offset;
        if let Some(end) = balanced_end(&text.as_bytes()[start..]) {
            return Some(&text[start..=start + end]);
        }
        search_from = start + 1;
    }
    None
}

fn balanced_end(bytes: &[u8]) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (index, byte) in bytes.iter().enumerate() {
        if in_string {
            if escaped {
                escaped = false;
            } else if *byte == b'\\' {
                escaped = true;
            } else if *byte == b'"' {
                in_string = false;
            }
            continue;
        }

        match byte {
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(index);
                }
            }
            _ => {}
        }
    }

    None
}

/// Drop a `+` sign written directly after a colon (`"delta": +2`), outside string literals.
pub(crate) fn strip_explicit_plus(candidate: &str) -> String {
    let mut output = String::with_capacity(candidate.len());
    let mut chars = candidate.chars().peekable();
    let mut in_string = false;
    let mut escaped = false;
    let mut after_colon = false;

    while let Some(ch) = chars.next() {
        if in_string {
            output.push(ch);
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }

        match ch {
            '"' => {
                in_string = true;
                after_colon = false;
                output.push(ch);
            }
            ':' => {
                after_colon = true;
                output.push(ch);
            }
            '+' if after_colon && chars.peek().is_some_and(char::is_ascii_digit) => {
                after_colon = false;
            }
            ch if ch.is_whitespace() => output.push(ch),
            _ => {
                after_colon = false;
                output.push(ch);
            }
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_explicit_plus_deltas() {
        let evaluation = parse_impact_response(
            r#"{"impacts":[{"category":"elections","delta": +3,"reason":"x"}],"summary":"s"}"#,
        )
        .expect("parse succeeds");

        assert_eq!(evaluation.impacts.len(), 1);
        assert_eq!(evaluation.impacts[0].category, CategoryId::Elections);
        assert_eq!(evaluation.impacts[0].delta, 3.0);
        assert_eq!(evaluation.summary, "s");
    }

    #[test]
    fn finds_json_wrapped_in_prose() {
        let raw = "Here is my analysis:\n```json\n{\"impacts\": [{\"category\": \"trade-policy\", \"delta\": -1, \"reason\": \"tariff relief {partial}\"}], \"summary\": \"Eases trade risk.\"}\n```\nLet me know {if} you need more.";
        let evaluation = parse_impact_response(raw).expect("parse succeeds");
        assert_eq!(evaluation.impacts[0].category, CategoryId::TradePolicy);
        assert_eq!(evaluation.impacts[0].delta, -1.0);
        assert_eq!(evaluation.impacts[0].reason, "tariff relief {partial}");
    }

    #[test]
    fn rejects_text_without_an_object() {
        assert!(matches!(
            parse_impact_response("no json here"),
            Err(ImpactParseError::NoJsonFound)
        ));
        assert!(matches!(
            parse_impact_response("{ unterminated"),
            Err(ImpactParseError::NoJsonFound)
        ));
    }

    #[test]
    fn rejects_malformed_json() {
        assert!(matches!(
            parse_impact_response("{impacts: [}"),
            Err(ImpactParseError::InvalidJson(_))
        ));
    }

    #[test]
    fn requires_an_impacts_array() {
        assert!(matches!(
            parse_impact_response(r#"{"summary": "nothing"}"#),
            Err(ImpactParseError::MalformedShape(_))
        ));
        assert!(matches!(
            parse_impact_response(r#"{"impacts": {"category": "elections"}}"#),
            Err(ImpactParseError::MalformedShape(_))
        ));
    }

    #[test]
    fn drops_unknown_categories_and_fails_when_nothing_remains() {
        assert!(matches!(
            parse_impact_response(
                r#"{"impacts":[{"category":"not-a-real-category","delta":1,"reason":"x"}]}"#
            ),
            Err(ImpactParseError::EmptyResult)
        ));

        let evaluation = parse_impact_response(
            r#"{"impacts":[
                {"category":"not-a-real-category","delta":1,"reason":"x"},
                {"category":"fiscal-policy","delta":"two","reason":"x"},
                {"category":"media-freedom","delta":1.5},
                {"category":"civil-discourse","delta":2,"reason":"protests"}
            ]}"#,
        )
        .expect("one valid entry survives");
        assert_eq!(evaluation.impacts.len(), 1);
        assert_eq!(evaluation.impacts[0].category, CategoryId::CivilDiscourse);
        assert_eq!(evaluation.dropped, 3);
        assert_eq!(evaluation.summary, "");
    }

    #[test]
    fn plus_signs_inside_strings_are_preserved() {
        let normalized = strip_explicit_plus(r#"{"reason": "a: +1 swing", "delta": +1}"#);
        assert_eq!(normalized, r#"{"reason": "a: +1 swing", "delta": 1}"#);
    }

    #[test]
    fn extraction_skips_escaped_quotes() {
        let text = r#"prefix {"a": "quote \" and } brace"} suffix"#;
        assert_eq!(
            extract_json_object(text),
            Some(r#"{"a": "quote \" and } brace"}"#)
        );
    }
}
