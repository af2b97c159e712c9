//! Per-method handling recipes and the collaborators they call.
//!
//! A [`Condition`] says, for one HTTP method, whether the caller must be
//! authenticated (and with which roles), which schemas the request bundles
//! must satisfy, which optional custom check runs afterwards, and which
//! [`Handler`] finally serves the request.
//!
//! Collaborators are plain values bound at registration time: the dispatcher
//! never looks anything up by name.

use crate::request::{ApiRequest, HandlerEvent, Parameters};
use crate::response::Response;
use crate::validation::ValidationRules;
use futures::future::BoxFuture;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

/// Outcome reported by an [`Authenticator`].
/// The dispatcher checks `error401`, then `error403`, then `error500`; when
/// The dispatcher checks `error500`, then `error401`, then `error403`; when
/// none is set the request proceeds with `user_info`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthResult<U> {
    /// The authenticated user.
    pub user_info: Option<U>,
    /// The caller is not authenticated.
    pub error401: bool,
    /// The caller lacks the required roles.
    pub error403: bool,
    /// Authentication could not be performed.
    pub error500: bool,
}

impl<U> AuthResult<U> {
    /// A successful authentication.
    #[must_use]
    pub const fn authenticated(user_info: U) -> Self {
        Self {
            user_info: Some(user_info),
            error401: false,
            error403: false,
            error500: false,
        }
    }

    /// The caller could not be authenticated.
    #[must_use]
    pub const fn unauthorized() -> Self {
        Self {
            user_info: None,
            error401: true,
            error403: false,
            error500: false,
        }
    }

    /// The caller is authenticated but not allowed.
    #[must_use]
    pub const fn forbidden() -> Self {
        Self {
            user_info: None,
            error401: false,
            error403: true,
            error500: false,
        }
    }

    /// Authentication itself failed.
    #[must_use]
    pub const fn internal_error() -> Self {
        Self {
            user_info: None,
            error401: false,
            error403: false,
            error500: true,
        }
    }
}

/// Authentication collaborator.
///
/// Receives the raw request and the roles the method admits. Returning an
/// error is treated the same as `error500`.
///
/// # Implementation Note
///
/// This trait returns a boxed future instead of using `async fn` so that it
/// can be stored as `Arc<dyn Authenticator<U>>` in the controller configuration.
pub trait Authenticator<U>: Send + Sync {
    /// Authenticate `request` against `roles`.
    ///
    /// # Errors
    ///
    /// Any error means the authentication could not be carried out.
    fn authenticate<'a>(
        &'a self,
        request: &'a ApiRequest,
        roles: &'a [String],
    ) -> BoxFuture<'a, anyhow::Result<AuthResult<U>>>;
}

type HandlerFn<U> = dyn Fn(HandlerEvent<U>) -> BoxFuture<'static, anyhow::Result<Response>> + Send + Sync;

/// The function serving a method once every check has passed.
///
/// Carries the symbolic name it was registered under, for introspection and logs.
pub struct Handler<U> {
    name: String,
    func: Arc<HandlerFn<U>>,
}

impl<U> Handler<U> {
    /// Bind `func` under `name`.
    pub fn new<F, Fut>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(HandlerEvent<U>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<Response>> + Send + 'static,
    {
        Self {
            name: name.into(),
            func: Arc::new(
                move |event: HandlerEvent<U>| -> BoxFuture<'static, anyhow::Result<Response>> {
                    Box::pin(func(event))
                },
            ),
        }
    }

    /// The registered name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Invoke the handler.
    pub fn call(&self, event: HandlerEvent<U>) -> BoxFuture<'static, anyhow::Result<Response>> {
        (self.func)(event)
    }
}

impl<U> Clone for Handler<U> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            func: Arc::clone(&self.func),
        }
    }
}

impl<U> fmt::Debug for Handler<U> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handler").field("name", &self.name).finish_non_exhaustive()
    }
}

/// Result of a custom validation.
///
/// An `error_response` is returned to the caller verbatim, whatever
/// `validation_result` says. Otherwise `validation_result == false` yields the
/// canonical bad request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomValidationResult {
    /// Whether the parameters are acceptable.
    pub validation_result: bool,
    /// Response overriding the canonical error.
    pub error_response: Option<Response>,
}

impl CustomValidationResult {
    /// The parameters are acceptable.
    #[must_use]
    pub const fn pass() -> Self {
        Self {
            validation_result: true,
            error_response: None,
        }
    }

    /// The parameters are rejected with the canonical bad request.
    #[must_use]
    pub const fn reject() -> Self {
        Self {
            validation_result: false,
            error_response: None,
        }
    }

    /// The parameters are rejected with `response`.
    #[must_use]
    pub const fn respond(response: Response) -> Self {
        Self {
            validation_result: false,
            error_response: Some(response),
        }
    }
}

type CustomValidationFn = dyn Fn(Parameters) -> BoxFuture<'static, CustomValidationResult> + Send + Sync;

/// A cross-field check run after schema validation.
///
/// Typical use: constraints spanning several fields, such as a range that
/// depends on another field's value.
#[derive(Clone)]
pub struct CustomValidation {
    func: Arc<CustomValidationFn>,
}

impl CustomValidation {
    /// Wrap an async check.
    pub fn new<F, Fut>(func: F) -> Self
    where
        F: Fn(Parameters) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = CustomValidationResult> + Send + 'static,
    {
        Self {
            func: Arc::new(
                move |parameters: Parameters| -> BoxFuture<'static, CustomValidationResult> {
                    Box::pin(func(parameters))
                },
            ),
        }
    }

    /// Run the check.
    pub fn call(&self, parameters: Parameters) -> BoxFuture<'static, CustomValidationResult> {
        (self.func)(parameters)
    }
}

impl fmt::Debug for CustomValidation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CustomValidation(<fn>)")
    }
}

/// Handling recipe for one HTTP method. Immutable once registered.
pub struct Condition<U> {
    authentication: bool,
    roles: Vec<String>,
    validation: ValidationRules,
    handler: Handler<U>,
    custom_validation: Option<CustomValidation>,
}

impl<U> Condition<U> {
    /// A public method: no authentication, no schemas, no custom check.
    #[must_use]
    pub fn new(handler: Handler<U>) -> Self {
        Self {
            authentication: false,
            roles: Vec::new(),
            validation: ValidationRules::default(),
            handler,
            custom_validation: None,
        }
    }

    /// Require authentication, admitting the given roles.
    #[must_use]
    pub fn with_authentication<I, R>(mut self, roles: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: Into<String>,
    {
        self.authentication = true;
        self.roles = roles.into_iter().map(Into::into).collect();
        self
    }

    /// Validate the request bundles against `rules`.
    #[must_use]
    pub fn with_validation(mut self, rules: ValidationRules) -> Self {
        self.validation = rules;
        self
    }

    /// Run `check` after schema validation.
    #[must_use]
    pub fn with_custom_validation(mut self, check: CustomValidation) -> Self {
        self.custom_validation = Some(check);
        self
    }

    /// Whether the method authenticates its caller.
    #[must_use]
    pub const fn requires_authentication(&self) -> bool {
        self.authentication
    }

    /// Roles handed to the authenticator.
    #[must_use]
    pub fn roles(&self) -> &[String] {
        &self.roles
    }

    /// Schemas for the request bundles.
    #[must_use]
    pub const fn validation(&self) -> &ValidationRules {
        &self.validation
    }

    /// The handler serving the method.
    #[must_use]
    pub const fn handler(&self) -> &Handler<U> {
        &self.handler
    }

    /// Name of the handler serving the method.
    #[must_use]
    pub fn handler_name(&self) -> &str {
        self.handler.name()
    }

    /// The custom check, if any.
    #[must_use]
    pub const fn custom_validation(&self) -> Option<&CustomValidation> {
        self.custom_validation.as_ref()
    }

    /// Whether a custom check is registered.
    #[must_use]
    pub const fn has_custom_validation(&self) -> bool {
        self.custom_validation.is_some()
    }
}

impl<U> Clone for Condition<U> {
    fn clone(&self) -> Self {
        Self {
            authentication: self.authentication,
            roles: self.roles.clone(),
            validation: self.validation.clone(),
            handler: self.handler.clone(),
            custom_validation: self.custom_validation.clone(),
        }
    }
}

impl<U> fmt::Debug for Condition<U> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Condition")
            .field("authentication", &self.authentication)
            .field("roles", &self.roles)
            .field("validation", &self.validation)
            .field("handler", &self.handler)
            .field("custom_validation", &self.custom_validation)
            .finish()
    }
}
