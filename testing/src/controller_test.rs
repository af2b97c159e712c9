//! Ergonomic testing utilities for controllers
//!
//! This module provides a fluent API for testing controllers with readable Given-When-Then syntax.

#![allow(clippy::module_name_repetitions)] // ControllerTest is the natural name

use method_controller_core::{ApiRequest, Response};
use method_controller_runtime::Controller;

/// Type alias for response assertion functions
type ResponseAssertion = Box<dyn FnOnce(&Response)>;

/// Fluent API for testing controllers with Given-When-Then syntax
///
/// # Example
///
/// ```
/// use method_controller_core::{ApiRequest, Condition, Handler, HttpMethod, Response};
/// use method_controller_runtime::{Controller, ControllerConfig};
/// use method_controller_testing::ControllerTest;
/// use std::sync::Arc;
///
/// # tokio_test::block_on(async {
/// let controller = Controller::builder("test", Arc::new(ControllerConfig::<()>::new()))
///     .on(
///         HttpMethod::Get,
///         Condition::new(Handler::new("get", |_event| async { Ok(Response::ok("ok")) })),
///     )
///     .build();
///
/// ControllerTest::new(&controller)
///     .when_request(ApiRequest::new("GET"))
///     .then_status(200)
///     .then_body("ok")
///     .run()
///     .await;
/// # });
/// ```
pub struct ControllerTest<'c, U> {
    controller: &'c Controller<U>,
    request: Option<ApiRequest>,
    response_assertions: Vec<ResponseAssertion>,
}

impl<'c, U> ControllerTest<'c, U>
where
    U: Send + 'static,
{
    /// Create a new test against `controller` (Given)
    #[must_use]
    pub const fn new(controller: &'c Controller<U>) -> Self {
        Self {
            controller,
            request: None,
            response_assertions: Vec::new(),
        }
    }

    /// Set the request to dispatch (When)
    #[must_use]
    pub fn when_request(mut self, request: ApiRequest) -> Self {
        self.request = Some(request);
        self
    }

    /// Expect the response to equal `expected` (Then)
    #[must_use]
    pub fn then_response_eq(self, expected: Response) -> Self {
        self.then_response(move |response| {
            assert_eq!(response, &expected, "Unexpected response");
        })
    }

    /// Expect the response status (Then)
    #[must_use]
    pub fn then_status(self, expected: u16) -> Self {
        self.then_response(move |response| {
            assert_eq!(
                response.status_code, expected,
                "Expected status {expected}, got {} with body {:?}",
                response.status_code, response.body
            );
        })
    }

    /// Expect the response body (Then)
    #[must_use]
    pub fn then_body(self, expected: impl Into<String>) -> Self {
        let expected = expected.into();
        self.then_response(move |response| {
            assert_eq!(response.body, expected, "Unexpected response body");
        })
    }

    /// Add an assertion about the response (Then)
    #[must_use]
    pub fn then_response<F>(mut self, assertion: F) -> Self
    where
        F: FnOnce(&Response) + 'static,
    {
        self.response_assertions.push(Box::new(assertion));
        self
    }

    /// Dispatch the request and execute all assertions
    ///
    /// Returns the response for further inspection.
    ///
    /// # Panics
    ///
    /// Panics if no request is set, or if any assertion fails.
    #[allow(clippy::expect_used)] // Test code can use expect
    pub async fn run(self) -> Response {
        let request = self
            .request
            .expect("Request must be set with when_request()");

        let response = self.controller.handle(&request).await;

        for assertion in self.response_assertions {
            assertion(&response);
        }

        response
    }
}

/// Helper assertions for controller registrations
pub mod assertions {
    use method_controller_core::{Condition, HttpMethod};
    use method_controller_runtime::Controller;

    /// Assert that `method` has a condition
    ///
    /// # Panics
    ///
    /// Panics if the method is not registered.
    pub fn assert_method_defined<U>(controller: &Controller<U>, method: HttpMethod) {
        assert!(
            controller.is_defined(method),
            "Expected {method} to be defined on controller '{}', registered: {:?}",
            controller.name(),
            controller.methods()
        );
    }

    /// Assert that `method` has no condition
    ///
    /// # Panics
    ///
    /// Panics if the method is registered.
    pub fn assert_method_undefined<U>(controller: &Controller<U>, method: HttpMethod) {
        assert!(
            !controller.is_defined(method),
            "Expected {method} to be undefined on controller '{}'",
            controller.name()
        );
    }

    /// Assert the name of the handler serving `method`
    ///
    /// # Panics
    ///
    /// Panics if the method is not registered or its handler has another name.
    pub fn assert_method_handler<U>(controller: &Controller<U>, method: HttpMethod, expected: &str) {
        assert_method_defined(controller, method);
        let actual = controller.condition(method).map(|c| c.handler_name().to_string());
        assert_eq!(
            actual.as_deref(),
            Some(expected),
            "Unexpected handler for {method}"
        );
    }

    /// Assert whether `method` authenticates its caller
    ///
    /// # Panics
    ///
    /// Panics if the method is not registered or the flag differs.
    pub fn assert_method_authentication<U>(controller: &Controller<U>, method: HttpMethod, expected: bool) {
        assert_method_defined(controller, method);
        let actual = controller.condition(method).map(Condition::requires_authentication);
        assert_eq!(
            actual,
            Some(expected),
            "Unexpected authentication flag for {method}"
        );
    }

    /// Assert the roles `method` admits, in order
    ///
    /// # Panics
    ///
    /// Panics if the method is not registered or the roles differ.
    pub fn assert_method_roles<U>(controller: &Controller<U>, method: HttpMethod, expected: &[&str]) {
        assert_method_defined(controller, method);
        let actual: Vec<&str> = controller
            .condition(method)
            .map(|c| c.roles().iter().map(String::as_str).collect())
            .unwrap_or_default();
        assert_eq!(actual, expected, "Unexpected roles for {method}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mocks::RecordingHandler;
    use method_controller_core::{Condition, HttpMethod};
    use method_controller_runtime::ControllerConfig;
    use std::sync::Arc;

    fn controller(recorder: &RecordingHandler<()>) -> Controller<()> {
        Controller::builder("widgets", Arc::new(ControllerConfig::new()))
            .on(
                HttpMethod::Get,
                Condition::new(recorder.handler("get")).with_authentication(["reader"]),
            )
            .on(HttpMethod::Post, Condition::new(recorder.handler("post")))
            .build()
    }

    #[test]
    fn test_registration_assertions() {
        let recorder = RecordingHandler::new();
        let controller = controller(&recorder);

        assertions::assert_method_defined(&controller, HttpMethod::Get);
        assertions::assert_method_undefined(&controller, HttpMethod::Delete);
        assertions::assert_method_handler(&controller, HttpMethod::Post, "post");
        assertions::assert_method_authentication(&controller, HttpMethod::Get, true);
        assertions::assert_method_authentication(&controller, HttpMethod::Post, false);
        assertions::assert_method_roles(&controller, HttpMethod::Get, &["reader"]);
    }

    #[tokio::test]
    async fn test_controller_test_public_method() {
        let recorder = RecordingHandler::new();
        let controller = controller(&recorder);

        let response = ControllerTest::new(&controller)
            .when_request(ApiRequest::new("POST"))
            .then_response_eq(Response::ok("ok"))
            .run()
            .await;

        assert_eq!(response.status_code, 200);
        assert_eq!(recorder.call_count(), 1);
    }

    #[tokio::test]
    async fn test_controller_test_missing_authenticator() {
        let recorder = RecordingHandler::new();
        let controller = controller(&recorder);

        ControllerTest::new(&controller)
            .when_request(ApiRequest::new("GET"))
            .then_status(500)
            .then_body("Internal Server Error")
            .run()
            .await;

        assert!(!recorder.was_called());
    }
}
