//! Response classification
//!
//! Maps a completed exchange onto success or one of the typed failures. Pure;
//! every function here is side-effect free.

use nexium_domain::constants::NOT_AUTHENTICATED_CODE;
use nexium_domain::{DispatchError, DispatchResult};
use serde::Deserialize;
use serde_json::Value;

use crate::ports::{ExchangeResponse, ResponseBody, TransportFailure};

const UNAUTHORIZED: u16 = 401;

/// Outcome of one exchange as far as the dispatch protocol is concerned
#[derive(Debug, Clone, PartialEq)]
pub enum Classification {
    /// 2xx, with the decoded body (`null` if empty or undecodable)
    Success(Value),
    /// 401 on an authenticated exchange
    CredentialExpired,
    /// Non-2xx with a structured `{code, error}` body
    ApplicationError {
        /// Server error code
        code: String,
        /// Server error text
        message: String,
    },
    /// No usable response
    TransportError(String),
}

impl Classification {
    /// Whether this outcome should enter the renewal protocol
    pub fn is_credential_expired(&self) -> bool {
        matches!(self, Self::CredentialExpired)
    }

    /// Final caller-facing result.
    ///
    /// Only valid once renewal has already been attempted for this request:
    /// a remaining `CredentialExpired` then means the session is gone.
    pub fn into_result(self) -> DispatchResult {
        match self {
            Self::Success(value) => Ok(value),
            Self::ApplicationError { code, message } => Err(DispatchError::Api { code, message }),
            Self::TransportError(message) => Err(DispatchError::Transport { message }),
            Self::CredentialExpired => Err(DispatchError::SessionExpired),
        }
    }
}

/// Structured error body: `{"code": "...", "error": "..."}`
#[derive(Debug, Deserialize)]
struct ErrorBody {
    code: String,
    #[serde(default)]
    error: String,
}

fn structured_error(body: &ResponseBody) -> Option<ErrorBody> {
    body.json().and_then(|value| ErrorBody::deserialize(value).ok())
}

/// Error `code` of a structured error body, if there is one
pub fn error_code(body: &ResponseBody) -> Option<String> {
    structured_error(body).map(|parsed| parsed.code)
}

/// Classify an authenticated exchange.
pub fn classify(response: ExchangeResponse) -> Classification {
    let ExchangeResponse { status, body } = response;

    if (200..300).contains(&status) {
        return match body {
            ResponseBody::Json(value) => Classification::Success(value),
            ResponseBody::Empty | ResponseBody::Undecodable(_) => {
                Classification::Success(Value::Null)
            }
        };
    }

    if status == UNAUTHORIZED {
        return Classification::CredentialExpired;
    }

    if status >= 500 {
        return Classification::TransportError(format!("server error (status {status})"));
    }

    match structured_error(&body) {
        Some(ErrorBody { code, error }) => {
            Classification::ApplicationError { code, message: error }
        }
        None => Classification::TransportError(format!("undecodable error response (status {status})")),
    }
}

/// Classify an exchange that carried no credential.
///
/// A 401 here is the server refusing the request itself (bad login, for
/// instance), not an expired credential, so it never triggers renewal.
pub fn classify_unauthenticated(response: ExchangeResponse) -> Classification {
    if response.status != UNAUTHORIZED {
        return classify(response);
    }

    match structured_error(&response.body) {
        Some(ErrorBody { code, error }) => {
            Classification::ApplicationError { code, message: error }
        }
        None => Classification::ApplicationError {
            code: NOT_AUTHENTICATED_CODE.to_string(),
            message: "not authenticated".to_string(),
        },
    }
}

/// Classify a transport outcome, folding transport failures in.
pub fn classify_outcome(outcome: Result<ExchangeResponse, TransportFailure>) -> Classification {
    match outcome {
        Ok(response) => classify(response),
        Err(TransportFailure(message)) => Classification::TransportError(message),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_success_with_body() {
        let classified = classify(ExchangeResponse::json(200, json!({ "value": 42 })));
        assert_eq!(classified, Classification::Success(json!({ "value": 42 })));
    }

    #[test]
    fn test_empty_success_is_null() {
        assert_eq!(classify(ExchangeResponse::empty(204)), Classification::Success(Value::Null));
        assert_eq!(
            classify(ExchangeResponse::new(200, ResponseBody::Undecodable("ok".into()))),
            Classification::Success(Value::Null)
        );
    }

    #[test]
    fn test_unauthorized_is_credential_expired() {
        let classified =
            classify(ExchangeResponse::json(401, json!({ "code": "accessdenied", "error": "x" })));
        assert!(classified.is_credential_expired());
        assert!(classify(ExchangeResponse::empty(401)).is_credential_expired());
    }

    #[test]
    fn test_server_fault_is_transport_error() {
        let classified =
            classify(ExchangeResponse::json(503, json!({ "code": "databaseerror", "error": "x" })));
        assert!(matches!(classified, Classification::TransportError(_)));
    }

    #[test]
    fn test_structured_client_error() {
        let classified =
            classify(ExchangeResponse::json(404, json!({ "code": "notfound", "error": "missing" })));
        assert_eq!(
            classified,
            Classification::ApplicationError {
                code: "notfound".to_string(),
                message: "missing".to_string()
            }
        );
    }

    #[test]
    fn test_unstructured_client_error_is_transport_error() {
        assert!(matches!(
            classify(ExchangeResponse::empty(400)),
            Classification::TransportError(_)
        ));
        assert!(matches!(
            classify(ExchangeResponse::json(422, json!({ "message": "nope" }))),
            Classification::TransportError(_)
        ));
    }

    #[test]
    fn test_unauthenticated_401_is_application_error() {
        let classified = classify_unauthenticated(ExchangeResponse::json(
            401,
            json!({ "code": "passworderror", "error": "wrong password" }),
        ));
        assert_eq!(
            classified,
            Classification::ApplicationError {
                code: "passworderror".to_string(),
                message: "wrong password".to_string()
            }
        );

        let classified = classify_unauthenticated(ExchangeResponse::empty(401));
        assert!(matches!(
            classified,
            Classification::ApplicationError { ref code, .. } if code == "notauthenticated"
        ));
    }

    #[test]
    fn test_transport_failure_folds_in() {
        let classified = classify_outcome(Err(TransportFailure::new("connection refused")));
        assert_eq!(classified, Classification::TransportError("connection refused".to_string()));
    }

    #[test]
    fn test_into_result_maps_leftover_expiry_to_session_expired() {
        assert_eq!(
            Classification::CredentialExpired.into_result(),
            Err(DispatchError::SessionExpired)
        );
    }

    #[test]
    fn test_error_code_extraction() {
        assert_eq!(
            error_code(&ResponseBody::Json(json!({ "code": "accessdenied" }))),
            Some("accessdenied".to_string())
        );
        assert_eq!(error_code(&ResponseBody::Empty), None);
    }
}
