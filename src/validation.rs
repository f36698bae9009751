//! Write-path validation for new cases.
//!
//! Reads never fail (the normalizer defaults everything); writes are
//! checked first and rejected with a stable, machine-readable code.

use serde_json::Value;

use crate::normalize::parse_event_datetime;

const TEXT_FIELDS: &[&str] = &[
    "titleZh",
    "title",
    "shortSentenceZh",
    "summaryZh",
    "summary",
    "fullStoryZh",
    "content",
];

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Case body must be a JSON object")]
    InvalidBody,
    #[error("At least one text field is required")]
    MissingText,
    #[error("An event date is required")]
    MissingEventDate,
    #[error("Event date is not a recognised date: {0}")]
    InvalidEventDate(String),
    #[error("caseId must be a positive integer")]
    InvalidCaseId,
}

impl ValidationError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidBody => "invalid_body",
            Self::MissingText => "missing_text",
            Self::MissingEventDate => "missing_event_date",
            Self::InvalidEventDate(_) => "invalid_event_date",
            Self::InvalidCaseId => "invalid_case_id",
        }
    }
}

fn non_blank<'a>(obj: &'a serde_json::Map<String, Value>, key: &str) -> Option<&'a str> {
    obj.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// Check a raw case body before it is normalized and stored.
pub fn validate_new_case(raw: &Value) -> Result<(), ValidationError> {
    let obj = raw.as_object().ok_or(ValidationError::InvalidBody)?;

    if !TEXT_FIELDS.iter().any(|k| non_blank(obj, k).is_some()) {
        return Err(ValidationError::MissingText);
    }

    let date = non_blank(obj, "eventDatetime")
        .or_else(|| non_blank(obj, "eventDate"))
        .ok_or(ValidationError::MissingEventDate)?;
    if parse_event_datetime(date).is_none() {
        return Err(ValidationError::InvalidEventDate(date.to_string()));
    }

    if let Some(case_id) = obj.get("caseId") {
        let valid = match case_id {
            Value::Number(n) => n.as_u64().is_some_and(|v| v > 0 && v <= u64::from(u32::MAX)),
            Value::String(s) => s.trim().parse::<u32>().is_ok_and(|v| v > 0),
            Value::Null => true,
            _ => false,
        };
        if !valid {
            return Err(ValidationError::InvalidCaseId);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn accepts_minimal_case() {
        assert!(validate_new_case(&json!({ "titleZh": "散步", "eventDate": "2026-03-01" })).is_ok());
        assert!(validate_new_case(&json!({
            "content": "walked",
            "eventDatetime": "2026-03-01T08:00:00+08:00",
            "caseId": "2",
        }))
        .is_ok());
    }

    #[test]
    fn reason_codes() {
        let code = |v: serde_json::Value| validate_new_case(&v).unwrap_err().code();
        assert_eq!(code(json!([1, 2])), "invalid_body");
        assert_eq!(code(json!({ "titleZh": "  ", "eventDate": "2026-03-01" })), "missing_text");
        assert_eq!(code(json!({ "titleZh": "x" })), "missing_event_date");
        assert_eq!(code(json!({ "titleZh": "x", "eventDate": "yesterday" })), "invalid_event_date");
        assert_eq!(
            code(json!({ "titleZh": "x", "eventDate": "2026-03-01", "caseId": 0 })),
            "invalid_case_id"
        );
        assert_eq!(
            code(json!({ "titleZh": "x", "eventDate": "2026-03-01", "caseId": -4 })),
            "invalid_case_id"
        );
    }

    #[test]
    fn text_is_checked_before_date() {
        let err = validate_new_case(&json!({})).unwrap_err();
        assert_eq!(err, ValidationError::MissingText);
    }
}
