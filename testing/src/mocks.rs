//! Scripted collaborators for controller tests.
//!
//! - [`MockAuthenticator`]: returns a scripted outcome and records every call
//! - [`RecordingHandler`]: hands out [`Handler`]s that record the events they receive
//! - [`MockCustomValidation`]: returns a scripted verdict and records its input
//!
//! All three are cheap to clone and share their recordings between clones, so
//! a test can move one clone into the controller and keep another for
//! assertions.

#![allow(clippy::unwrap_used)] // Test infrastructure uses unwrap for simplicity
#![allow(clippy::missing_panics_doc)] // Panics only on a poisoned lock

use futures::future::BoxFuture;
use method_controller_core::{
    ApiRequest, AuthResult, Authenticator, CustomValidation, CustomValidationResult, Handler,
    HandlerEvent, Parameters, Response,
};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone)]
enum AuthScript<U> {
    Return(AuthResult<U>),
    Fail(String),
    Panic(String),
}

/// Authenticator returning a fixed outcome.
///
/// # Example
///
/// ```
/// use method_controller_testing::mocks::MockAuthenticator;
///
/// let auth = MockAuthenticator::authenticated("user-1".to_string());
/// assert_eq!(auth.call_count(), 0);
/// ```
#[derive(Debug, Clone)]
pub struct MockAuthenticator<U> {
    script: AuthScript<U>,
    calls: Arc<Mutex<Vec<Vec<String>>>>,
}

impl<U> MockAuthenticator<U> {
    fn scripted(script: AuthScript<U>) -> Self {
        Self {
            script,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Authenticates every caller as `user_info`.
    #[must_use]
    pub fn authenticated(user_info: U) -> Self {
        Self::scripted(AuthScript::Return(AuthResult::authenticated(user_info)))
    }

    /// Returns `result` verbatim.
    #[must_use]
    pub fn returning(result: AuthResult<U>) -> Self {
        Self::scripted(AuthScript::Return(result))
    }

    /// Reports every caller as unauthenticated.
    #[must_use]
    pub fn unauthorized() -> Self {
        Self::returning(AuthResult::unauthorized())
    }

    /// Reports every caller as lacking the required roles.
    #[must_use]
    pub fn forbidden() -> Self {
        Self::returning(AuthResult::forbidden())
    }

    /// Reports an internal error for every caller.
    #[must_use]
    pub fn internal_error() -> Self {
        Self::returning(AuthResult::internal_error())
    }

    /// Fails every call with `message`.
    #[must_use]
    pub fn failing(message: impl Into<String>) -> Self {
        Self::scripted(AuthScript::Fail(message.into()))
    }

    /// Panics on every call with `message`.
    #[must_use]
    pub fn panicking(message: impl Into<String>) -> Self {
        Self::scripted(AuthScript::Panic(message.into()))
    }

    /// Number of calls received.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Returns `true` if the authenticator was called at least once.
    #[must_use]
    pub fn was_called(&self) -> bool {
        self.call_count() > 0
    }

    /// Roles passed on each call, oldest first.
    #[must_use]
    pub fn received_roles(&self) -> Vec<Vec<String>> {
        self.calls.lock().unwrap().clone()
    }
}

impl<U> Authenticator<U> for MockAuthenticator<U>
where
    U: Clone + Send + Sync + 'static,
{
    #[allow(clippy::panic)] // Scripted panic
    fn authenticate<'a>(
        &'a self,
        _request: &'a ApiRequest,
        roles: &'a [String],
    ) -> BoxFuture<'a, anyhow::Result<AuthResult<U>>> {
        Box::pin(async move {
            self.calls.lock().unwrap().push(roles.to_vec());
            match &self.script {
                AuthScript::Return(result) => Ok(result.clone()),
                AuthScript::Fail(message) => Err(anyhow::anyhow!("{message}")),
                AuthScript::Panic(message) => panic!("{message}"),
            }
        })
    }
}

/// Source of handlers that record what they are called with.
///
/// # Example
///
/// ```
/// use method_controller_core::Response;
/// use method_controller_testing::mocks::RecordingHandler;
///
/// let recorder = RecordingHandler::<()>::responding(Response::ok("ok"));
/// let handler = recorder.handler("get");
/// assert_eq!(handler.name(), "get");
/// assert_eq!(recorder.call_count(), 0);
/// ```
#[derive(Debug, Clone)]
pub struct RecordingHandler<U> {
    response: Response,
    events: Arc<Mutex<Vec<HandlerEvent<U>>>>,
}

impl<U> RecordingHandler<U>
where
    U: Clone + Send + 'static,
{
    /// Handlers answering `200 ok`.
    #[must_use]
    pub fn new() -> Self {
        Self::responding(Response::ok("ok"))
    }

    /// Handlers answering `response`.
    #[must_use]
    pub fn responding(response: Response) -> Self {
        Self {
            response,
            events: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// A handler registered under `name` that records into this recorder.
    #[must_use]
    pub fn handler(&self, name: &str) -> Handler<U> {
        let response = self.response.clone();
        let events = Arc::clone(&self.events);
        Handler::new(name, move |event: HandlerEvent<U>| {
            events.lock().unwrap().push(event);
            let response = response.clone();
            async move { Ok(response) }
        })
    }

    /// Number of calls across every handler of this recorder.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.events.lock().unwrap().len()
    }

    /// Returns `true` if any handler of this recorder was called.
    #[must_use]
    pub fn was_called(&self) -> bool {
        self.call_count() > 0
    }

    /// Every event received, oldest first.
    #[must_use]
    pub fn events(&self) -> Vec<HandlerEvent<U>> {
        self.events.lock().unwrap().clone()
    }

    /// The most recent event.
    #[must_use]
    pub fn last_event(&self) -> Option<HandlerEvent<U>> {
        self.events.lock().unwrap().last().cloned()
    }
}

impl<U> Default for RecordingHandler<U>
where
    U: Clone + Send + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

/// A handler that fails every call with `message`.
#[must_use]
pub fn failing_handler<U: Send + 'static>(name: &str, message: &str) -> Handler<U> {
    let message = message.to_string();
    Handler::new(name, move |_event: HandlerEvent<U>| {
        let message = message.clone();
        async move { Err(anyhow::anyhow!("{message}")) }
    })
}

/// A handler that panics on every call with `message`.
#[must_use]
pub fn panicking_handler<U: Send + 'static>(name: &str, message: &str) -> Handler<U> {
    let message = message.to_string();
    Handler::new(name, move |_event: HandlerEvent<U>| explode(message.clone()))
}

#[allow(clippy::panic)] // Scripted panic
#[allow(clippy::unused_async)]
async fn explode(message: String) -> anyhow::Result<Response> {
    panic!("{message}")
}

/// Custom validation returning a fixed verdict.
#[derive(Debug, Clone)]
pub struct MockCustomValidation {
    result: CustomValidationResult,
    calls: Arc<Mutex<Vec<Parameters>>>,
}

impl MockCustomValidation {
    /// Returns `result` on every call.
    #[must_use]
    pub fn returning(result: CustomValidationResult) -> Self {
        Self {
            result,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Accepts every request.
    #[must_use]
    pub fn passing() -> Self {
        Self::returning(CustomValidationResult::pass())
    }

    /// Rejects every request with the canonical bad request.
    #[must_use]
    pub fn rejecting() -> Self {
        Self::returning(CustomValidationResult::reject())
    }

    /// Rejects every request with `response`.
    #[must_use]
    pub fn responding(response: Response) -> Self {
        Self::returning(CustomValidationResult::respond(response))
    }

    /// The check to register on a condition.
    #[must_use]
    pub fn validation(&self) -> CustomValidation {
        let result = self.result.clone();
        let calls = Arc::clone(&self.calls);
        CustomValidation::new(move |parameters: Parameters| {
            calls.lock().unwrap().push(parameters);
            let result = result.clone();
            async move { result }
        })
    }

    /// Number of calls received.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Parameters received on each call, oldest first.
    #[must_use]
    pub fn received(&self) -> Vec<Parameters> {
        self.calls.lock().unwrap().clone()
    }
}
