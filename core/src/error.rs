//! Rejection taxonomy for the dispatch pipeline.
//!
//! Every stage that ends a request early produces a [`Rejection`]. The
//! dispatcher turns it into a response with [`Rejection::into_response`], so
//! callers only ever see a canonical error, a custom validation override, or
//! the handler's own response.

use crate::response::{CanonicalResponses, Response};
use crate::validation::Violation;
use thiserror::Error;

/// Why a request did not reach (or did not survive) its handler.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Rejection {
    // ═══════════════════════════════════════════════════════════
    // Bad Request
    // ═══════════════════════════════════════════════════════════
    /// No condition is registered for the request's method.
    #[error("No condition registered for method {method}")]
    RouteNotFound {
        /// The method string as received.
        method: String,
    },

    /// A request bundle failed its schema.
    #[error("Schema validation failed with {} violation(s)", violations.len())]
    ValidationFailed {
        /// Every violation found.
        violations: Vec<Violation>,
    },

    /// The custom validation returned `validation_result == false`.
    #[error("Custom validation rejected the request")]
    CustomValidationFailed,

    // ═══════════════════════════════════════════════════════════
    // Override
    // ═══════════════════════════════════════════════════════════
    /// The custom validation supplied its own error response.
    #[error("Custom validation responded with status {}", .0.status_code)]
    CustomResponse(Response),

    // ═══════════════════════════════════════════════════════════
    // Authentication
    // ═══════════════════════════════════════════════════════════
    /// The authenticator reported an unauthenticated caller.
    #[error("Caller is not authenticated")]
    Unauthenticated,

    /// The authenticator reported insufficient roles.
    #[error("Caller lacks the required roles")]
    Forbidden,

    // ═══════════════════════════════════════════════════════════
    // Internal Errors
    // ═══════════════════════════════════════════════════════════
    /// The method requires authentication but no authenticator is configured.
    #[error("Authentication required but no authenticator is configured")]
    ConfigurationMissing,

    /// The authenticator failed or reported `error500`.
    #[error("Authentication failed: {reason}")]
    AuthenticationFailed {
        /// Failure detail, for logs only.
        reason: String,
    },

    /// The handler failed.
    #[error("Handler '{handler}' failed: {reason}")]
    HandlerFailed {
        /// Name of the failing handler.
        handler: String,
        /// Failure detail, for logs only.
        reason: String,
    },

    /// The custom validation panicked.
    #[error("Custom validation failed: {reason}")]
    CustomValidationPanicked {
        /// Failure detail, for logs only.
        reason: String,
    },
}

impl Rejection {
    /// The response a caller sees for this rejection.
    #[must_use]
    pub fn into_response(self, responses: &CanonicalResponses) -> Response {
        match self {
            Self::RouteNotFound { .. } | Self::ValidationFailed { .. } | Self::CustomValidationFailed => {
                responses.bad_request.clone()
            },
            Self::CustomResponse(response) => response,
            Self::Unauthenticated => responses.unauthorized.clone(),
            Self::Forbidden => responses.forbidden.clone(),
            Self::ConfigurationMissing
            | Self::AuthenticationFailed { .. }
            | Self::HandlerFailed { .. }
            | Self::CustomValidationPanicked { .. } => responses.internal_error.clone(),
        }
    }

    /// Returns `true` if this rejection is a defect on the server side.
    ///
    /// # Examples
    ///
    /// ```
    /// # use method_controller_core::error::Rejection;
    /// assert!(Rejection::ConfigurationMissing.is_server_error());
    /// assert!(!Rejection::Forbidden.is_server_error());
    /// ```
    #[must_use]
    pub const fn is_server_error(&self) -> bool {
        matches!(
            self,
            Self::ConfigurationMissing
                | Self::AuthenticationFailed { .. }
                | Self::HandlerFailed { .. }
                | Self::CustomValidationPanicked { .. }
        )
    }

    /// Short label for metrics.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::RouteNotFound { .. } => "route_not_found",
            Self::ValidationFailed { .. } => "validation_failed",
            Self::CustomValidationFailed => "custom_validation_failed",
            Self::CustomResponse(_) => "custom_response",
            Self::Unauthenticated => "unauthenticated",
            Self::Forbidden => "forbidden",
            Self::ConfigurationMissing => "configuration_missing",
            Self::AuthenticationFailed { .. } => "authentication_failed",
            Self::HandlerFailed { .. } => "handler_failed",
            Self::CustomValidationPanicked { .. } => "custom_validation_panicked",
        }
    }
}
