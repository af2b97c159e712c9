//! The request dispatcher.
//!
//! A [`Controller`] serves one resource. Each request runs one linear pass
//! through
//!
//! ```text
//! MethodLookup → Authenticate → Validate → CustomValidate → Invoke → Respond
//! ```
//!
//! and any stage may end it early with a [`Rejection`]. Rejections are mapped
//! to the configured canonical responses, so [`Controller::handle`] always
//! yields a [`Response`]: failures and panics inside collaborators are caught
//! where they are awaited.
//!
//! Nothing is retried and no stage runs concurrently with another.

use crate::config::ControllerConfig;
use crate::metrics::DispatchMetrics;
use futures::FutureExt;
use method_controller_core::{
    ApiRequest, Condition, ConditionRegistry, HandlerEvent, HttpMethod, Parameters, Rejection,
    Response, validation::inspect_request,
};
use std::any::Any;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

/// Dispatcher for a single resource.
///
/// Cheap to share: wrap it in an `Arc` and call [`handle`](Self::handle) from
/// as many tasks as needed.
pub struct Controller<U> {
    name: String,
    config: Arc<ControllerConfig<U>>,
    registry: ConditionRegistry<U>,
}

impl<U> Controller<U> {
    /// Create a controller from an already built registry.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        config: Arc<ControllerConfig<U>>,
        registry: ConditionRegistry<U>,
    ) -> Self {
        Self {
            name: name.into(),
            config,
            registry,
        }
    }

    /// Start building a controller.
    #[must_use]
    pub fn builder(name: impl Into<String>, config: Arc<ControllerConfig<U>>) -> ControllerBuilder<U> {
        ControllerBuilder::new(name, config)
    }

    /// The name used in logs.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The shared configuration.
    #[must_use]
    pub const fn config(&self) -> &Arc<ControllerConfig<U>> {
        &self.config
    }

    /// The condition table.
    #[must_use]
    pub const fn registry(&self) -> &ConditionRegistry<U> {
        &self.registry
    }

    /// Returns `true` if `method` has a condition.
    #[must_use]
    pub fn is_defined(&self, method: HttpMethod) -> bool {
        self.registry.contains(method)
    }

    /// Condition registered for `method`.
    #[must_use]
    pub fn condition(&self, method: HttpMethod) -> Option<&Condition<U>> {
        self.registry.get(method)
    }

    /// Registered methods.
    #[must_use]
    pub fn methods(&self) -> Vec<HttpMethod> {
        self.registry.methods()
    }
}

impl<U: Send + 'static> Controller<U> {
    /// Dispatch `request` and produce its response.
    ///
    /// Never fails: every rejection becomes a canonical response, or the
    /// response supplied by a custom validation.
    #[tracing::instrument(skip(self, request), fields(controller = %self.name, method = %request.method))]
    pub async fn handle(&self, request: &ApiRequest) -> Response {
        let started = Instant::now();

        let response = match self.dispatch(request).await {
            Ok(response) => {
                tracing::debug!(status = response.status_code, "Request handled");
                response
            },
            Err(rejection) => self.reject(rejection),
        };

        DispatchMetrics::record_outcome(&request.method, response.status_code, started.elapsed());
        response
    }

    async fn dispatch(&self, request: &ApiRequest) -> Result<Response, Rejection> {
        let condition = self.lookup(&request.method)?;
        let user_info = self.authenticate(condition, request).await?;
        Self::validate(condition, request)?;

        let parameters = Parameters::from(request);
        Self::custom_validate(condition, &parameters).await?;
        Self::invoke(condition, HandlerEvent::new(parameters, user_info)).await
    }

    fn lookup(&self, method: &str) -> Result<&Condition<U>, Rejection> {
        self.registry.lookup(method).ok_or_else(|| Rejection::RouteNotFound {
            method: method.to_string(),
        })
    }

    async fn authenticate(
        &self,
        condition: &Condition<U>,
        request: &ApiRequest,
    ) -> Result<Option<U>, Rejection> {
        if !condition.requires_authentication() {
            tracing::trace!("Authentication not required");
            return Ok(None);
        }

        let authenticator = self
            .config
            .authenticator()
            .ok_or(Rejection::ConfigurationMissing)?;

        let outcome = AssertUnwindSafe(async {
            authenticator.authenticate(request, condition.roles()).await
        })
        .catch_unwind()
        .await;

        let result = match outcome {
            Ok(Ok(result)) => result,
            Ok(Err(error)) => {
                return Err(Rejection::AuthenticationFailed {
                    reason: format!("{error:#}"),
                });
            },
            Err(panic) => {
                return Err(Rejection::AuthenticationFailed {
                    reason: panic_message(panic.as_ref()),
                });
            },
        };

        if result.error401 {
            return Err(Rejection::Unauthenticated);
        }
        if result.error403 {
            return Err(Rejection::Forbidden);
        }
        if result.error500 {
            return Err(Rejection::AuthenticationFailed {
                reason: "authenticator reported an internal error".to_string(),
            });
        }

        tracing::trace!("Authenticated");
        Ok(result.user_info)
    }

    fn validate(condition: &Condition<U>, request: &ApiRequest) -> Result<(), Rejection> {
        let violations = inspect_request(condition.validation(), request);
        if violations.is_empty() {
            return Ok(());
        }

        for violation in &violations {
            tracing::debug!(path = %violation.path, reason = %violation.kind, "Schema violation");
        }
        Err(Rejection::ValidationFailed { violations })
    }

    async fn custom_validate(condition: &Condition<U>, parameters: &Parameters) -> Result<(), Rejection> {
        let Some(check) = condition.custom_validation() else {
            return Ok(());
        };

        let outcome = AssertUnwindSafe(async { check.call(parameters.clone()).await })
            .catch_unwind()
            .await;

        match outcome {
            Ok(result) => match result.error_response {
                Some(response) => Err(Rejection::CustomResponse(response)),
                None if !result.validation_result => Err(Rejection::CustomValidationFailed),
                None => Ok(()),
            },
            Err(panic) => Err(Rejection::CustomValidationPanicked {
                reason: panic_message(panic.as_ref()),
            }),
        }
    }

    async fn invoke(condition: &Condition<U>, event: HandlerEvent<U>) -> Result<Response, Rejection> {
        let handler = condition.handler();
        tracing::trace!(handler = handler.name(), "Invoking handler");

        let outcome = AssertUnwindSafe(async move { handler.call(event).await })
            .catch_unwind()
            .await;

        match outcome {
            Ok(Ok(response)) => Ok(response),
            Ok(Err(error)) => Err(Rejection::HandlerFailed {
                handler: handler.name().to_string(),
                reason: format!("{error:#}"),
            }),
            Err(panic) => Err(Rejection::HandlerFailed {
                handler: handler.name().to_string(),
                reason: panic_message(panic.as_ref()),
            }),
        }
    }

    fn reject(&self, rejection: Rejection) -> Response {
        DispatchMetrics::record_rejection(rejection.kind());

        if rejection.is_server_error() {
            tracing::error!(error = %rejection, "Request failed");
        } else {
            tracing::debug!(reason = %rejection, "Request rejected");
        }

        rejection.into_response(self.config.responses())
    }
}

impl<U> fmt::Debug for Controller<U> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Controller")
            .field("name", &self.name)
            .field("config", &self.config)
            .field("registry", &self.registry)
            .finish()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|message| (*message).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .map_or_else(|| "panicked".to_string(), |message| format!("panicked: {message}"))
}

/// Builder for [`Controller`].
///
/// # Example
///
/// ```
/// use method_controller_core::{Condition, Handler, HttpMethod, Response};
/// use method_controller_runtime::{Controller, ControllerConfig};
/// use std::sync::Arc;
///
/// let config = Arc::new(ControllerConfig::<()>::new());
/// let controller = Controller::builder("health", config)
///     .on(
///         HttpMethod::Get,
///         Condition::new(Handler::new("get", |_event| async { Ok(Response::ok("up")) })),
///     )
///     .build();
///
/// assert!(controller.is_defined(HttpMethod::Get));
/// assert!(!controller.is_defined(HttpMethod::Delete));
/// ```
pub struct ControllerBuilder<U> {
    name: String,
    config: Arc<ControllerConfig<U>>,
    registry: ConditionRegistry<U>,
}

impl<U> ControllerBuilder<U> {
    /// Start with an empty registry.
    #[must_use]
    pub fn new(name: impl Into<String>, config: Arc<ControllerConfig<U>>) -> Self {
        Self {
            name: name.into(),
            config,
            registry: ConditionRegistry::new(),
        }
    }

    /// Register `condition` for `method`, replacing any earlier one.
    #[must_use]
    pub fn on(mut self, method: HttpMethod, condition: Condition<U>) -> Self {
        if self.registry.insert(method, condition).is_some() {
            tracing::warn!(controller = %self.name, %method, "Replacing existing condition");
        }
        self
    }

    /// Finish the controller. The registry is frozen from here on.
    #[must_use]
    pub fn build(self) -> Controller<U> {
        tracing::debug!(
            controller = %self.name,
            methods = ?self.registry.methods(),
            "Controller built"
        );
        Controller::new(self.name, self.config, self.registry)
    }
}

impl<U> fmt::Debug for ControllerBuilder<U> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ControllerBuilder")
            .field("name", &self.name)
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}
