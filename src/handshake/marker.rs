use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::HandoffError;

/// Arbitrary JSON-shaped payload carried by a handoff. Stored and returned verbatim.
pub type HandoffContext = serde_json::Map<String, serde_json::Value>;

/// The five handoff states. Serialized as their upper-case names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HandoffState {
    /// Coherence check passed, ready for the next agent.
    Wave,
    /// Explicit, unconditional handoff to a named agent.
    Pass,
    /// Gate failure, cannot proceed.
    Block,
    /// Waiting on external input or approval.
    Hold,
    /// Forced re-iteration because uncertainty was detected.
    Push,
}

impl HandoffState {
    pub const ALL: [HandoffState; 5] = [
        HandoffState::Wave,
        HandoffState::Pass,
        HandoffState::Block,
        HandoffState::Hold,
        HandoffState::Push,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            HandoffState::Wave => "WAVE",
            HandoffState::Pass => "PASS",
            HandoffState::Block => "BLOCK",
            HandoffState::Hold => "HOLD",
            HandoffState::Push => "PUSH",
        }
    }
}

impl fmt::Display for HandoffState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HandoffState {
    type Err = HandoffError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        HandoffState::ALL
            .into_iter()
            .find(|state| state.as_str() == s)
            .ok_or_else(|| HandoffError::InvalidState(s.to_string()))
    }
}

/// One recorded transition of control between two agents.
///
/// `state` and `timestamp` hold the raw text as written to the log, so a marker
/// read back from a hand-edited file can still be inspected by validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HandshakeMarker {
    pub id: String,
    pub timestamp: String,
    pub from_agent: String,
    pub to_agent: String,
    pub state: String,
    #[serde(default)]
    pub context: HandoffContext,
    pub trail_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coherence_score: Option<f64>,
    /// Reserved for integrity proofs; never populated here.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
    pub session_id: String,
}

impl HandshakeMarker {
    /// The typed state, or `None` when the stored tag is not one of the five states.
    pub fn handoff_state(&self) -> Option<HandoffState> {
        self.state.parse().ok()
    }
}

/// Parses a marker timestamp into UTC.
///
/// Markers written here always carry RFC 3339, but records from other writers
/// may use looser ISO 8601: a compact `+hhmm` offset, no offset at all (read as
/// UTC), or a bare date (midnight UTC).
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    if let Ok(ts) = DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f%z") {
        return Some(ts.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(naive.and_utc());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Outcome of [`validate_handoff`](crate::HandshakeProtocol::validate_handoff).
///
/// `errors` and `warnings` are `None` rather than empty so that a clean marker
/// serializes as `{"valid":true}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub valid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warnings: Option<Vec<String>>,
}

impl ValidationResult {
    pub fn from_issues(errors: Vec<String>, warnings: Vec<String>) -> Self {
        Self {
            valid: errors.is_empty(),
            errors: (!errors.is_empty()).then_some(errors),
            warnings: (!warnings.is_empty()).then_some(warnings),
        }
    }

    pub fn errors(&self) -> &[String] {
        self.errors.as_deref().unwrap_or_default()
    }

    pub fn warnings(&self) -> &[String] {
        self.warnings.as_deref().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn sample_marker() -> HandshakeMarker {
        let mut context = HandoffContext::new();
        context.insert("phase".into(), json!("exploration"));
        context.insert("files".into(), json!(["a.rs", {"b": [1, 2.5, null]}]));
        HandshakeMarker {
            id: "0b6d2f4e-2d1c-4c5e-9f1a-6b8f3a7d9e01".into(),
            timestamp: "2026-03-01T12:00:00.000Z".into(),
            from_agent: "claude".into(),
            to_agent: "grok".into(),
            state: "WAVE".into(),
            context,
            trail_id: "ATOM-1".into(),
            coherence_score: Some(88.0),
            signature: None,
            session_id: "s1".into(),
        }
    }

    #[test]
    fn state_display_and_parse() {
        for state in HandoffState::ALL {
            assert_eq!(state.to_string().parse::<HandoffState>().unwrap(), state);
        }
        assert_eq!(HandoffState::Block.to_string(), "BLOCK");
    }

    #[test]
    fn state_parse_is_case_sensitive() {
        assert!(matches!(
            "wave".parse::<HandoffState>(),
            Err(HandoffError::InvalidState(s)) if s == "wave"
        ));
        assert!("".parse::<HandoffState>().is_err());
    }

    #[test]
    fn state_serializes_upper_case() {
        assert_eq!(serde_json::to_string(&HandoffState::Hold).unwrap(), "\"HOLD\"");
    }

    #[test]
    fn marker_uses_camel_case_field_names() {
        let value = serde_json::to_value(sample_marker()).unwrap();
        let obj = value.as_object().unwrap();
        for key in [
            "id",
            "timestamp",
            "fromAgent",
            "toAgent",
            "state",
            "context",
            "trailId",
            "coherenceScore",
            "sessionId",
        ] {
            assert!(obj.contains_key(key), "missing {key}");
        }
        assert!(!obj.contains_key("signature"));
    }

    #[test]
    fn marker_without_score_omits_field() {
        let mut marker = sample_marker();
        marker.coherence_score = None;
        let json = serde_json::to_string(&marker).unwrap();
        assert!(!json.contains("coherenceScore"));
    }

    #[test]
    fn marker_keeps_nested_context() {
        let marker = sample_marker();
        let json = serde_json::to_string(&marker).unwrap();
        let back: HandshakeMarker = serde_json::from_str(&json).unwrap();
        assert_eq!(back, marker);
        assert_eq!(back.context["files"][1]["b"][1], json!(2.5));
    }

    #[test]
    fn handoff_state_accessor() {
        let mut marker = sample_marker();
        assert_eq!(marker.handoff_state(), Some(HandoffState::Wave));
        marker.state = "BOGUS".into();
        assert_eq!(marker.handoff_state(), None);
    }

    #[test]
    fn clean_validation_result_has_no_lists() {
        let result = ValidationResult::from_issues(vec![], vec![]);
        assert!(result.valid);
        assert!(result.errors.is_none());
        assert!(result.warnings.is_none());
        assert_eq!(serde_json::to_string(&result).unwrap(), r#"{"valid":true}"#);
    }

    #[test]
    fn warnings_do_not_invalidate() {
        let result = ValidationResult::from_issues(vec![], vec!["careful".into()]);
        assert!(result.valid);
        assert_eq!(result.warnings(), ["careful".to_string()]);
        assert!(result.errors().is_empty());
    }

    #[test]
    fn timestamps_accept_iso_8601_variants() {
        let ten = Utc.with_ymd_and_hms(2026, 3, 1, 10, 0, 0).unwrap();
        assert_eq!(parse_timestamp("2026-03-01T10:00:00.000Z"), Some(ten));
        assert_eq!(parse_timestamp("2026-03-01T12:00:00+02:00"), Some(ten));
        assert_eq!(parse_timestamp("2026-03-01T10:00:00.000+0000"), Some(ten));
        assert_eq!(parse_timestamp("2026-03-01T10:00:00"), Some(ten));
        assert_eq!(
            parse_timestamp("2026-03-01"),
            Some(Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap())
        );
    }

    #[test]
    fn garbage_timestamps_do_not_parse() {
        for raw in ["", "yesterday", "2026-13-01", "10:00:00"] {
            assert_eq!(parse_timestamp(raw), None, "parsed {raw:?}");
        }
    }
}
