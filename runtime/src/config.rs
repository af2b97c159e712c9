//! Controller configuration.
//!
//! Holds the authentication collaborator and the canonical error responses.
//! Built once during startup and shared by `Arc` between any number of
//! controllers; nothing in it changes while requests are served.

use method_controller_core::{Authenticator, CanonicalResponses, Response};
use std::fmt;
use std::sync::Arc;

/// Configuration shared by the controllers of one host.
///
/// # Example
///
/// ```
/// use method_controller_core::Response;
/// use method_controller_runtime::ControllerConfig;
///
/// let config = ControllerConfig::<()>::new()
///     .with_unauthorized(Response::new(401, r#"{"message":"login required"}"#));
///
/// assert!(config.authenticator().is_none());
/// assert_eq!(config.responses().unauthorized.status_code, 401);
/// ```
pub struct ControllerConfig<U> {
    authenticator: Option<Arc<dyn Authenticator<U>>>,
    responses: CanonicalResponses,
}

impl<U> ControllerConfig<U> {
    /// No authenticator and the default canonical responses.
    #[must_use]
    pub fn new() -> Self {
        Self {
            authenticator: None,
            responses: CanonicalResponses::default(),
        }
    }

    /// Set the authentication collaborator.
    #[must_use]
    pub fn with_authenticator<A>(mut self, authenticator: A) -> Self
    where
        A: Authenticator<U> + 'static,
    {
        self.authenticator = Some(Arc::new(authenticator));
        self
    }

    /// Set an already shared authentication collaborator.
    #[must_use]
    pub fn with_shared_authenticator(mut self, authenticator: Arc<dyn Authenticator<U>>) -> Self {
        self.authenticator = Some(authenticator);
        self
    }

    /// Replace all four canonical responses.
    #[must_use]
    pub fn with_responses(mut self, responses: CanonicalResponses) -> Self {
        self.responses = responses;
        self
    }

    /// Override the 400 response.
    #[must_use]
    pub fn with_bad_request(mut self, response: Response) -> Self {
        self.responses.bad_request = response;
        self
    }

    /// Override the 401 response.
    #[must_use]
    pub fn with_unauthorized(mut self, response: Response) -> Self {
        self.responses.unauthorized = response;
        self
    }

    /// Override the 403 response.
    #[must_use]
    pub fn with_forbidden(mut self, response: Response) -> Self {
        self.responses.forbidden = response;
        self
    }

    /// Override the 500 response.
    #[must_use]
    pub fn with_internal_error(mut self, response: Response) -> Self {
        self.responses.internal_error = response;
        self
    }

    /// The authentication collaborator, if configured.
    #[must_use]
    pub fn authenticator(&self) -> Option<&dyn Authenticator<U>> {
        self.authenticator.as_deref()
    }

    /// The canonical responses.
    #[must_use]
    pub const fn responses(&self) -> &CanonicalResponses {
        &self.responses
    }
}

impl<U> Default for ControllerConfig<U> {
    fn default() -> Self {
        Self::new()
    }
}

impl<U> Clone for ControllerConfig<U> {
    fn clone(&self) -> Self {
        Self {
            authenticator: self.authenticator.clone(),
            responses: self.responses.clone(),
        }
    }
}

impl<U> fmt::Debug for ControllerConfig<U> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ControllerConfig")
            .field("authenticator", &self.authenticator.as_ref().map(|_| "<authenticator>"))
            .field("responses", &self.responses)
            .finish()
    }
}
