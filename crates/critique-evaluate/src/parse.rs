use critique_core::{clamp_score, EvaluationEnvelope, FullReport};
use serde_json::Value;

use crate::EvaluateError;

/// The validated parts of an LLM reply, before an id and timestamp are attached.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedEvaluation {
    pub score: u8,
    pub strengths: String,
    pub improvements: String,
    /// Formatter payload: the report object re-serialized, or the text or unknown JSON as sent
    pub full_report: String,
}

/// Parse and validate the reply. Unlike report rendering this is strict: a
/// reply missing a summary field is rejected rather than stored.
pub fn parse_evaluation(raw: &str) -> Result<ParsedEvaluation, EvaluateError> {
    let json = extract_json_object(raw)
        .ok_or_else(|| EvaluateError::InvalidResponse("no JSON object in reply".to_string()))?;

    let value: Value =
        serde_json::from_str(json).map_err(|e| EvaluateError::InvalidResponse(e.to_string()))?;
    let envelope: EvaluationEnvelope = serde_json::from_value(value.clone())
        .map_err(|e| EvaluateError::InvalidResponse(e.to_string()))?;

    let strengths = required(&envelope.strengths, "strengths")?;
    let improvements = required(&envelope.improvements, "improvements")?;

    // An object with unknown keys decodes as a blank report. Keep its JSON so
    // the formatter can still show it raw.
    let full_report = match &envelope.full_report {
        FullReport::Structured(report) if report.is_blank() => value
            .get("full_report")
            .filter(|raw| !is_blank_value(raw))
            .map(Value::to_string),
        FullReport::Structured(report) => serde_json::to_string(report).ok(),
        FullReport::Text(text) => (!text.trim().is_empty()).then(|| text.clone()),
    }
    .ok_or_else(|| EvaluateError::InvalidResponse("full_report is empty".to_string()))?;

    Ok(ParsedEvaluation {
        score: clamp_score(envelope.score),
        strengths,
        improvements,
        full_report,
    })
}

fn is_blank_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Array(items) => items.iter().all(is_blank_value),
        Value::Object(map) => map.values().all(is_blank_value),
        Value::Bool(_) | Value::Number(_) => false,
    }
}

fn required(value: &str, field: &str) -> Result<String, EvaluateError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(EvaluateError::InvalidResponse(format!("{field} is empty")))
    } else {
        Ok(trimmed.to_string())
    }
}

/// Extract the outermost JSON object from raw LLM output.
fn extract_json_object(raw: &str) -> Option<&str> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    if end <= start {
        return None;
    }
    Some(&raw[start..=end])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn structured_reply_is_reserialized() {
        let raw = r#"Here is the evaluation:
{"score": 104.6, "strengths": " Clear naming. ", "improvements": "Handle nulls.",
 "full_report": {"readability": "Good.", "recommendations": {"informative_feedback": "Add tests."}}}"#;
        let parsed = parse_evaluation(raw).unwrap();
        assert_eq!(parsed.score, 100);
        assert_eq!(parsed.strengths, "Clear naming.");
        let report: serde_json::Value = serde_json::from_str(&parsed.full_report).unwrap();
        assert_eq!(report["readability"], "Good.");
        assert_eq!(report["recommendations"]["informative_feedback"], "Add tests.");
    }

    #[test]
    fn prose_report_is_kept_verbatim() {
        let raw = r#"{"score": 55, "strengths": "s", "improvements": "i", "full_report": "Long prose."}"#;
        assert_eq!(parse_evaluation(raw).unwrap().full_report, "Long prose.");
    }

    #[test]
    fn unrecognised_report_object_is_kept_as_json() {
        let raw = r#"{"score":70,"strengths":"s","improvements":"i",
            "full_report":{"summary":"Good code overall.","issues":["none"]}}"#;
        let parsed = parse_evaluation(raw).unwrap();
        assert_eq!(parsed.score, 70);
        let report: Value = serde_json::from_str(&parsed.full_report).unwrap();
        assert_eq!(report["summary"], "Good code overall.");
        assert_eq!(report["issues"][0], "none");
    }

    #[test]
    fn missing_or_empty_fields_are_rejected() {
        for raw in [
            "no json here",
            r#"{"strengths": "s", "improvements": "i", "full_report": "r"}"#,
            r#"{"score": "high", "strengths": "s", "improvements": "i", "full_report": "r"}"#,
            r#"{"score": 10, "strengths": "", "improvements": "i", "full_report": "r"}"#,
            r#"{"score": 10, "strengths": "s", "improvements": "i", "full_report": "  "}"#,
            r#"{"score": 10, "strengths": "s", "improvements": "i", "full_report": {}}"#,
            r#"{"score": 10, "strengths": "s", "improvements": "i", "full_report": {"summary": " ", "notes": []}}"#,
        ] {
            assert!(
                matches!(parse_evaluation(raw), Err(EvaluateError::InvalidResponse(_))),
                "{raw}"
            );
        }
    }
}
