//! Grade submission payloads.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Maximum score assumed when the request leaves it out.
pub const DEFAULT_MAX_SCORE: f64 = 100.0;

/// Body of `POST /submit_grade`.
///
/// `score` and `max_score` are kept as raw JSON so numeric strings such as
/// `"85"` are accepted alongside numbers.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GradeRequest {
    #[serde(default)]
    pub score: Option<Value>,
    #[serde(default)]
    pub max_score: Option<Value>,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub launch_id: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
}

impl GradeRequest {
    /// Validated `(score, max_score)` pair.
    ///
    /// Requires a finite `score` in `[0, max_score]` and a positive finite
    /// `max_score`.
    #[must_use]
    pub fn validated_score(&self) -> Option<(f64, f64)> {
        let score = self.score.as_ref().and_then(as_number)?;
        let max_score = match &self.max_score {
            None | Some(Value::Null) => DEFAULT_MAX_SCORE,
            Some(value) => as_number(value)?,
        };

        if !score.is_finite() || !max_score.is_finite() || max_score <= 0.0 {
            return None;
        }
        if score < 0.0 || score > max_score {
            return None;
        }
        Some((score, max_score))
    }

    /// Comment with surrounding whitespace removed; empty becomes `None`.
    #[must_use]
    pub fn comment(&self) -> Option<&str> {
        self.comment.as_deref().map(str::trim).filter(|c| !c.is_empty())
    }
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Success body of `POST /submit_grade`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GradeResponse {
    pub success: bool,
    pub score: f64,
    pub max_score: f64,
    pub comment: Option<String>,
}

/// AGS score progress values.
pub mod progress {
    pub const ACTIVITY_COMPLETED: &str = "Completed";
    pub const GRADING_FULLY_GRADED: &str = "FullyGraded";
}

/// AGS score publish payload (`application/vnd.ims.lis.v1.score+json`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Score {
    pub user_id: String,
    pub score_given: f64,
    pub score_maximum: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    pub activity_progress: String,
    pub grading_progress: String,
    pub timestamp: String,
}

impl Score {
    /// A completed, fully graded score stamped with `at`.
    #[must_use]
    pub fn completed(
        user_id: impl Into<String>,
        score_given: f64,
        score_maximum: f64,
        comment: Option<String>,
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            score_given,
            score_maximum,
            comment,
            activity_progress: progress::ACTIVITY_COMPLETED.to_string(),
            grading_progress: progress::GRADING_FULLY_GRADED.to_string(),
            timestamp: at.to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }
}

/// An AGS line item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub score_maximum: f64,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_link_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use serde_json::json;

    use super::*;

    fn request(body: Value) -> GradeRequest {
        serde_json::from_value(body).unwrap()
    }

    #[test]
    fn test_score_defaults_max_to_100() {
        assert_eq!(request(json!({"score": 85})).validated_score(), Some((85.0, 100.0)));
    }

    #[test]
    fn test_numeric_strings_accepted() {
        let req = request(json!({"score": "7.5", "max_score": "10"}));
        assert_eq!(req.validated_score(), Some((7.5, 10.0)));
    }

    #[test]
    fn test_invalid_scores_rejected() {
        for body in [
            json!({}),
            json!({"score": null}),
            json!({"score": "abc"}),
            json!({"score": -1}),
            json!({"score": 101}),
            json!({"score": 5, "max_score": 0}),
            json!({"score": 5, "max_score": "lots"}),
            json!({"score": true}),
        ] {
            assert_eq!(request(body.clone()).validated_score(), None, "{body} should be rejected");
        }
    }

    #[test]
    fn test_boundaries_accepted() {
        assert_eq!(request(json!({"score": 0})).validated_score(), Some((0.0, 100.0)));
        assert_eq!(request(json!({"score": 100})).validated_score(), Some((100.0, 100.0)));
    }

    #[test]
    fn test_blank_comment_dropped() {
        assert_eq!(request(json!({"comment": "   "})).comment(), None);
        assert_eq!(request(json!({"comment": " Nice "})).comment(), Some("Nice"));
    }

    #[test]
    fn test_score_payload_shape() {
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let score = Score::completed("user-1", 85.0, 100.0, Some("Good".into()), at);
        insta::assert_json_snapshot!(score, @r#"
        {
          "userId": "user-1",
          "scoreGiven": 85.0,
          "scoreMaximum": 100.0,
          "comment": "Good",
          "activityProgress": "Completed",
          "gradingProgress": "FullyGraded",
          "timestamp": "2024-05-01T12:00:00.000Z"
        }
        "#);
    }
}
