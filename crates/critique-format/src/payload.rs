use critique_core::{EvaluationReport, FullReport};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use tracing::debug;

/// A ```json fenced body anywhere in the text.
static JSON_FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)```(?:json)?[ \t]*\r?\n(.*?)```").expect("valid fence regex"));

/// Result of decoding a payload. Decoding never fails: anything that is not a
/// usable report comes back as `Unstructured` for verbatim display.
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedPayload {
    Structured(EvaluationReport),
    Unstructured(String),
}

impl ParsedPayload {
    pub fn is_structured(&self) -> bool {
        matches!(self, ParsedPayload::Structured(_))
    }
}

/// Known payload layouts. The envelope is tried first because a flat decode
/// of an envelope succeeds with every field absent.
#[derive(Deserialize)]
#[serde(untagged)]
enum PayloadShape {
    Envelope { full_report: FullReport },
    Flat(EvaluationReport),
    /// JSON that was encoded twice
    Encoded(String),
}

pub fn parse_payload(raw: &str) -> ParsedPayload {
    match decode(raw, true) {
        Some(parsed) => parsed,
        None => {
            debug!("payload is not a structured report ({} bytes)", raw.len());
            ParsedPayload::Unstructured(raw.to_string())
        }
    }
}

/// `nested` allows one level of recursion into a string `full_report` or a
/// double-encoded payload.
fn decode(raw: &str, nested: bool) -> Option<ParsedPayload> {
    for candidate in candidates(raw) {
        let shape = match serde_json::from_str::<PayloadShape>(candidate) {
            Ok(shape) => shape,
            Err(e) => {
                debug!("candidate rejected: {e}");
                continue;
            }
        };

        match shape {
            PayloadShape::Envelope {
                full_report: FullReport::Structured(report),
            } if !report.is_blank() => {
                debug!("decoded envelope with nested report object");
                return Some(ParsedPayload::Structured(report));
            }
            PayloadShape::Envelope {
                full_report: FullReport::Text(text),
            } => {
                if nested {
                    if let Some(inner @ ParsedPayload::Structured(_)) = decode(&text, false) {
                        debug!("decoded envelope with report encoded as a string");
                        return Some(inner);
                    }
                }
                if !text.trim().is_empty() {
                    debug!("envelope carries a prose report");
                    return Some(ParsedPayload::Unstructured(text));
                }
            }
            PayloadShape::Flat(report) if !report.is_blank() => {
                debug!("decoded flat report");
                return Some(ParsedPayload::Structured(report));
            }
            PayloadShape::Encoded(text) if nested => {
                if let Some(inner) = decode(&text, false) {
                    return Some(inner);
                }
            }
            _ => {}
        }
    }
    None
}

/// The trimmed text, the body of a ```json fence, then the outermost `{...}`.
/// Only objects and JSON strings are worth decoding.
fn candidates<'a>(raw: &'a str) -> Vec<&'a str> {
    let mut out: Vec<&'a str> = Vec::with_capacity(3);
    let mut push = |c: &'a str| {
        let c = c.trim();
        if (c.starts_with('{') || c.starts_with('"')) && !out.contains(&c) {
            out.push(c);
        }
    };

    push(raw);
    if let Some(body) = JSON_FENCE.captures(raw).and_then(|c| c.get(1)) {
        push(body.as_str());
    }
    if let (Some(start), Some(end)) = (raw.find('{'), raw.rfind('}')) {
        if start < end {
            push(&raw[start..=end]);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use critique_core::Recommendation;

    fn structured(raw: &str) -> EvaluationReport {
        match parse_payload(raw) {
            ParsedPayload::Structured(r) => r,
            other => panic!("expected structured, got {other:?}"),
        }
    }

    #[test]
    fn flat_payload() {
        let r = structured(r#"{"code_quality":"Solid.","performance":"O(n)."}"#);
        assert_eq!(r.code_quality.as_deref(), Some("Solid."));
        assert_eq!(r.performance.as_deref(), Some("O(n)."));
        assert!(r.readability.is_none());
    }

    #[test]
    fn envelope_with_nested_object() {
        let r = structured(
            r#"{"score":80,"strengths":"s","improvements":"i","full_report":{"readability":"Clear."}}"#,
        );
        assert_eq!(r.readability.as_deref(), Some("Clear."));
    }

    #[test]
    fn envelope_with_string_encoded_report() {
        let inner = r#"{"security_considerations":"None found."}"#;
        let raw = serde_json::json!({ "score": 50, "full_report": inner }).to_string();
        let r = structured(&raw);
        assert_eq!(r.security_considerations.as_deref(), Some("None found."));
    }

    #[test]
    fn envelope_with_prose_report_is_unstructured_prose() {
        let raw = r#"{"score":50,"full_report":"The code is fine overall."}"#;
        assert_eq!(
            parse_payload(raw),
            ParsedPayload::Unstructured("The code is fine overall.".into())
        );
    }

    #[test]
    fn fenced_and_chatty_payloads() {
        let fenced = "Here you go:\n```json\n{\"best_practices\":\"Use const.\"}\n```\nThanks!";
        assert_eq!(structured(fenced).best_practices.as_deref(), Some("Use const."));

        let chatty = "Sure! {\"readability\":\"Good.\"} Hope that helps.";
        assert_eq!(structured(chatty).readability.as_deref(), Some("Good."));
    }

    #[test]
    fn double_encoded_payload() {
        let raw = serde_json::to_string(r#"{"performance":"Fine."}"#).unwrap();
        assert_eq!(structured(&raw).performance.as_deref(), Some("Fine."));
    }

    #[test]
    fn recommendations_keep_their_shape() {
        let r = structured(
            r#"{"recommendations":{
                "improved_function":{"explanation":"Guard input.","code":"function f(x){ return x ?? 0; }"},
                "informative_feedback":"Prefer early returns."}}"#,
        );
        let recs = r.recommendations.unwrap();
        assert!(matches!(recs.improved_function, Some(Recommendation::Split { .. })));
        assert_eq!(
            recs.informative_feedback,
            Some(Recommendation::Combined("Prefer early returns.".into()))
        );
    }

    #[test]
    fn garbage_and_mismatched_types_fall_back() {
        for raw in [
            "not json at all",
            "{ broken",
            "[1, 2, 3]",
            "42",
            r#"{"code_quality": 5}"#,
            r#"{"unrelated": "field"}"#,
            r#"{"code_quality": "   "}"#,
            "",
        ] {
            assert_eq!(
                parse_payload(raw),
                ParsedPayload::Unstructured(raw.to_string()),
                "{raw:?}"
            );
        }
    }
}
