use serde::{Serialize, Serializer};
use serde_json::Value;

use crate::api::ApiError;

/// Result of every public `SessionStore` operation.
///
/// Serializes to `{"success":true,"user":...}`, `{"success":false,"error":"..."}`,
/// or the bare `{"success":false}` that `check_auth` returns without a token.
#[derive(Debug, Clone, PartialEq)]
pub enum AuthOutcome {
    Success { user: Value },
    Failure { error: Option<String> },
}

impl AuthOutcome {
    pub fn success(user: Value) -> Self {
        AuthOutcome::Success { user }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        AuthOutcome::Failure {
            error: Some(message.into()),
        }
    }

    /// Failure carrying no message.
    pub fn unattempted() -> Self {
        AuthOutcome::Failure { error: None }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, AuthOutcome::Success { .. })
    }

    pub fn user(&self) -> Option<&Value> {
        match self {
            AuthOutcome::Success { user } => Some(user),
            AuthOutcome::Failure { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            AuthOutcome::Success { .. } => None,
            AuthOutcome::Failure { error } => error.as_deref(),
        }
    }
}

impl From<ApiError> for AuthOutcome {
    fn from(err: ApiError) -> Self {
        AuthOutcome::failure(err.to_string())
    }
}

impl From<Result<Value, ApiError>> for AuthOutcome {
    fn from(result: Result<Value, ApiError>) -> Self {
        match result {
            Ok(user) => AuthOutcome::success(user),
            Err(e) => e.into(),
        }
    }
}

#[derive(Serialize)]
struct OutcomeWire<'a> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    user: Option<&'a Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<&'a str>,
}

impl Serialize for AuthOutcome {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        OutcomeWire {
            success: self.is_success(),
            user: self.user(),
            error: self.error(),
        }
        .serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_wire_shapes() {
        let ok = AuthOutcome::success(json!({"id": 1}));
        assert_eq!(
            serde_json::to_value(&ok).unwrap(),
            json!({"success": true, "user": {"id": 1}})
        );

        let failed = AuthOutcome::failure("Not authenticated");
        assert_eq!(
            serde_json::to_value(&failed).unwrap(),
            json!({"success": false, "error": "Not authenticated"})
        );

        let bare = AuthOutcome::unattempted();
        assert_eq!(serde_json::to_value(&bare).unwrap(), json!({"success": false}));
    }

    #[test]
    fn test_from_api_error_uses_display_text() {
        let outcome: AuthOutcome = ApiError::Server {
            status: 400,
            message: "bad credentials".to_string(),
        }
        .into();
        assert_eq!(outcome, AuthOutcome::failure("bad credentials"));
        assert_eq!(outcome.error(), Some("bad credentials"));
        assert!(outcome.user().is_none());
    }
}
