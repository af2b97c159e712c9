//! Responses returned by a controller and the canonical error set.

use serde::{Deserialize, Serialize};

/// A response produced by a handler, a custom validation override, or one of
/// the canonical error responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Response {
    /// HTTP status code.
    pub status_code: u16,
    /// Response body, already encoded by whoever built the response.
    pub body: String,
}

impl Response {
    /// Create a response.
    #[must_use]
    pub fn new(status_code: u16, body: impl Into<String>) -> Self {
        Self {
            status_code,
            body: body.into(),
        }
    }

    /// Create a `200 OK` response.
    #[must_use]
    pub fn ok(body: impl Into<String>) -> Self {
        Self::new(200, body)
    }

    /// Create a response whose body is `value` encoded as JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if `value` cannot be serialized.
    pub fn json<T: Serialize>(status_code: u16, value: &T) -> Result<Self, serde_json::Error> {
        Ok(Self::new(status_code, serde_json::to_string(value)?))
    }

    /// Returns `true` for 5xx status codes.
    #[must_use]
    pub const fn is_server_error(&self) -> bool {
        self.status_code >= 500 && self.status_code < 600
    }
}

/// The four fixed error responses a controller falls back to.
///
/// Built once as part of the controller configuration and read-only while
/// requests are served.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CanonicalResponses {
    /// Route not found or validation failed.
    pub bad_request: Response,
    /// The authenticator reported an unauthenticated caller.
    pub unauthorized: Response,
    /// The authenticator reported insufficient roles.
    pub forbidden: Response,
    /// Missing configuration or a failing collaborator.
    pub internal_error: Response,
}

impl CanonicalResponses {
    /// `400 Bad Request`
    #[must_use]
    pub fn default_bad_request() -> Response {
        Response::new(400, "Bad Request")
    }

    /// `401 Unauthorize`
    #[must_use]
    pub fn default_unauthorized() -> Response {
        Response::new(401, "Unauthorize")
    }

    /// `403 Forbidden`
    #[must_use]
    pub fn default_forbidden() -> Response {
        Response::new(403, "Forbidden")
    }

    /// `500 Internal Server Error`
    #[must_use]
    pub fn default_internal_error() -> Response {
        Response::new(500, "Internal Server Error")
    }
}

impl Default for CanonicalResponses {
    fn default() -> Self {
        Self {
            bad_request: Self::default_bad_request(),
            unauthorized: Self::default_unauthorized(),
            forbidden: Self::default_forbidden(),
            internal_error: Self::default_internal_error(),
        }
    }
}
