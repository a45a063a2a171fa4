//! Boundary result contract.
//!
//! Every identify/register attempt produces exactly one of these; it is
//! what callers (today the CLI, previously a web layer) consume.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Identify,
    Register,
}

/// Terminal outcome of one attempt.
#[derive(Debug, Clone, Serialize)]
pub struct OperationResult {
    pub operation: Operation,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identity: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f32>,
    pub message: String,
}

impl OperationResult {
    pub fn success(
        operation: Operation,
        identity: impl Into<String>,
        confidence: f32,
        message: impl Into<String>,
    ) -> Self {
        Self {
            operation,
            success: true,
            identity: Some(identity.into()),
            confidence: Some(confidence),
            message: message.into(),
        }
    }

    pub fn failure(operation: Operation, message: impl Into<String>) -> Self {
        Self {
            operation,
            success: false,
            identity: None,
            confidence: None,
            message: message.into(),
        }
    }

    /// Negative-but-valid outcome: a face was captured and scored, just
    /// not above threshold.
    pub fn not_recognized(operation: Operation, confidence: f32, message: impl Into<String>) -> Self {
        Self {
            operation,
            success: false,
            identity: None,
            confidence: Some(confidence),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_serialization() {
        let r = OperationResult::success(Operation::Identify, "alice", 0.97, "identified as alice");
        let json: serde_json::Value = serde_json::to_value(&r).unwrap();
        assert_eq!(json["operation"], "identify");
        assert_eq!(json["success"], true);
        assert_eq!(json["identity"], "alice");
        assert!((json["confidence"].as_f64().unwrap() - 0.97).abs() < 1e-6);
        assert_eq!(json["message"], "identified as alice");
    }

    #[test]
    fn test_failure_omits_optional_fields() {
        let r = OperationResult::failure(Operation::Register, "camera error");
        let json: serde_json::Value = serde_json::to_value(&r).unwrap();
        assert_eq!(json["operation"], "register");
        assert_eq!(json["success"], false);
        assert!(json.get("identity").is_none());
        assert!(json.get("confidence").is_none());
    }
}
