//! End-to-end dispatch tests: lookup, authentication, validation, custom
//! validation and invocation, with scripted collaborators.

#![allow(clippy::unwrap_used)]

use method_controller_core::{
    ApiRequest, AuthResult, Condition, CustomValidation, CustomValidationResult, CustomRule,
    Field, HttpMethod, NumberRule, Parameters, Response, Schema, StringRule, ValidationRules,
};
use method_controller_runtime::{Controller, ControllerConfig};
use method_controller_testing::helpers::init_tracing;
use method_controller_testing::{
    ControllerTest, MockAuthenticator, MockCustomValidation, RecordingHandler, failing_handler,
    panicking_handler,
};
use serde_json::json;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Debug, Clone, PartialEq)]
struct User {
    id: String,
}

fn user(id: &str) -> User {
    User { id: id.to_string() }
}

fn single(method: HttpMethod, condition: Condition<User>, config: ControllerConfig<User>) -> Controller<User> {
    Controller::builder("test", Arc::new(config))
        .on(method, condition)
        .build()
}

fn id_rules() -> ValidationRules {
    ValidationRules::new().with_path(
        Schema::new().field(
            "id",
            Field::required(StringRule::new().try_with_pattern("^[0-9a-zA-Z]{1,10}$").unwrap()),
        ),
    )
}

// ═══════════════════════════════════════════════════════════════════════
// MethodLookup
// ═══════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn registered_get_returns_handler_response() {
    init_tracing();
    let recorder = RecordingHandler::responding(Response::ok("ok"));
    let controller = single(HttpMethod::Get, Condition::new(recorder.handler("get")), ControllerConfig::new());

    ControllerTest::new(&controller)
        .when_request(ApiRequest::new("GET"))
        .then_response_eq(Response::new(200, "ok"))
        .run()
        .await;
}

#[tokio::test]
async fn unregistered_method_is_bad_request_and_never_invokes() {
    let recorder = RecordingHandler::new();
    let auth = MockAuthenticator::authenticated(user("u1"));
    let controller = single(
        HttpMethod::Get,
        Condition::new(recorder.handler("get")).with_authentication(["admin"]),
        ControllerConfig::new().with_authenticator(auth.clone()),
    );

    for method in ["DELETE", "POST", "get", "TRACE", ""] {
        ControllerTest::new(&controller)
            .when_request(ApiRequest::new(method))
            .then_response_eq(Response::new(400, "Bad Request"))
            .run()
            .await;
    }

    assert!(!recorder.was_called());
    assert!(!auth.was_called());
}

// ═══════════════════════════════════════════════════════════════════════
// Authenticate
// ═══════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn public_method_never_calls_authenticator() {
    let recorder = RecordingHandler::new();
    let auth = MockAuthenticator::<User>::unauthorized();
    let controller = single(
        HttpMethod::Get,
        Condition::new(recorder.handler("get")),
        ControllerConfig::new().with_authenticator(auth.clone()),
    );

    ControllerTest::new(&controller)
        .when_request(ApiRequest::new("GET"))
        .then_status(200)
        .run()
        .await;

    assert!(!auth.was_called());
    assert_eq!(recorder.last_event().unwrap().user_info, None);
}

#[tokio::test]
async fn missing_authenticator_is_internal_error_and_skips_everything() {
    let recorder = RecordingHandler::new();
    let custom = MockCustomValidation::passing();
    let rule_calls = Arc::new(AtomicUsize::new(0));
    let counted = Arc::clone(&rule_calls);
    let rules = ValidationRules::new().with_header(Schema::new().field(
        "x-any",
        Field::optional(CustomRule::new(move |_| {
            counted.fetch_add(1, Ordering::SeqCst);
            true
        })),
    ));

    let controller = single(
        HttpMethod::Get,
        Condition::new(recorder.handler("get"))
            .with_authentication(["admin"])
            .with_validation(rules)
            .with_custom_validation(custom.validation()),
        ControllerConfig::new(),
    );

    ControllerTest::new(&controller)
        .when_request(ApiRequest::new("GET").with_header("x-any", "1"))
        .then_response_eq(Response::new(500, "Internal Server Error"))
        .run()
        .await;

    assert_eq!(rule_calls.load(Ordering::SeqCst), 0);
    assert_eq!(custom.call_count(), 0);
    assert!(!recorder.was_called());
}

#[tokio::test]
async fn authenticator_receives_declared_roles_in_order() {
    let recorder = RecordingHandler::new();
    let auth = MockAuthenticator::authenticated(user("u1"));
    let controller = single(
        HttpMethod::Get,
        Condition::new(recorder.handler("get")).with_authentication(["admin", "user"]),
        ControllerConfig::new().with_authenticator(auth.clone()),
    );

    controller.handle(&ApiRequest::new("GET")).await;

    assert_eq!(
        auth.received_roles(),
        vec![vec!["admin".to_string(), "user".to_string()]]
    );
    let user_info = recorder.last_event().unwrap().user_info.unwrap();
    assert_eq!(user_info.id, "u1");
}

#[tokio::test]
async fn error401_is_unauthorized_and_skips_validation() {
    let recorder = RecordingHandler::new();
    let controller = single(
        HttpMethod::Get,
        Condition::new(recorder.handler("get"))
            .with_authentication(["admin"])
            .with_validation(id_rules()),
        ControllerConfig::new().with_authenticator(MockAuthenticator::unauthorized()),
    );

    // The request would also fail validation; authentication wins.
    ControllerTest::new(&controller)
        .when_request(ApiRequest::new("GET"))
        .then_response_eq(Response::new(401, "Unauthorize"))
        .run()
        .await;

    assert!(!recorder.was_called());
}

#[tokio::test]
async fn error403_is_forbidden_and_skips_validation() {
    let recorder = RecordingHandler::new();
    let controller = single(
        HttpMethod::Get,
        Condition::new(recorder.handler("get"))
            .with_authentication(["admin"])
            .with_validation(id_rules()),
        ControllerConfig::new().with_authenticator(MockAuthenticator::forbidden()),
    );

    ControllerTest::new(&controller)
        .when_request(ApiRequest::new("GET"))
        .then_response_eq(Response::new(403, "Forbidden"))
        .run()
        .await;

    assert!(!recorder.was_called());
}

#[tokio::test]
async fn error401_takes_precedence_over_other_flags() {
    let recorder = RecordingHandler::new();
    let result = AuthResult {
        user_info: Some(user("u1")),
        error401: true,
        error403: true,
        error500: true,
    };
    let controller = single(
        HttpMethod::Get,
        Condition::new(recorder.handler("get")).with_authentication(["admin"]),
        ControllerConfig::new().with_authenticator(MockAuthenticator::returning(result)),
    );

    ControllerTest::new(&controller)
        .when_request(ApiRequest::new("GET"))
        .then_response_eq(Response::new(401, "Unauthorize"))
        .run()
        .await;

    assert!(!recorder.was_called());
}

#[tokio::test]
async fn error403_takes_precedence_over_error500() {
    let result = AuthResult {
        user_info: None,
        error401: false,
        error403: true,
        error500: true,
    };
    let controller = single(
        HttpMethod::Get,
        Condition::new(RecordingHandler::new().handler("get")).with_authentication(["admin"]),
        ControllerConfig::new().with_authenticator(MockAuthenticator::returning(result)),
    );

    ControllerTest::new(&controller)
        .when_request(ApiRequest::new("GET"))
        .then_response_eq(Response::new(403, "Forbidden"))
        .run()
        .await;
}

#[tokio::test]
async fn error500_alone_is_internal_error() {
    let result = AuthResult {
        user_info: Some(user("u1")),
        error401: false,
        error403: false,
        error500: true,
    };
    let controller = single(
        HttpMethod::Get,
        Condition::new(RecordingHandler::new().handler("get")).with_authentication(["admin"]),
        ControllerConfig::new().with_authenticator(MockAuthenticator::returning(result)),
    );

    ControllerTest::new(&controller)
        .when_request(ApiRequest::new("GET"))
        .then_response_eq(Response::new(500, "Internal Server Error"))
        .run()
        .await;
}

#[tokio::test]
async fn failing_authenticator_is_internal_error() {
    let recorder = RecordingHandler::new();
    let controller = single(
        HttpMethod::Get,
        Condition::new(recorder.handler("get")).with_authentication(["admin"]),
        ControllerConfig::new().with_authenticator(MockAuthenticator::failing("token service down")),
    );

    ControllerTest::new(&controller)
        .when_request(ApiRequest::new("GET"))
        .then_response_eq(Response::new(500, "Internal Server Error"))
        .run()
        .await;

    assert!(!recorder.was_called());
}

#[tokio::test]
async fn panicking_authenticator_is_internal_error() {
    let recorder = RecordingHandler::new();
    let controller = single(
        HttpMethod::Get,
        Condition::new(recorder.handler("get")).with_authentication(["admin"]),
        ControllerConfig::new().with_authenticator(MockAuthenticator::panicking("bad key")),
    );

    ControllerTest::new(&controller)
        .when_request(ApiRequest::new("GET"))
        .then_status(500)
        .run()
        .await;

    assert!(!recorder.was_called());
}

// ═══════════════════════════════════════════════════════════════════════
// Validate
// ═══════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn path_parameters_are_validated() {
    let recorder = RecordingHandler::new();
    let controller = single(
        HttpMethod::Get,
        Condition::new(recorder.handler("get")).with_validation(id_rules()),
        ControllerConfig::new(),
    );

    ControllerTest::new(&controller)
        .when_request(ApiRequest::new("GET").with_path_parameter("id", "abc123"))
        .then_status(200)
        .run()
        .await;

    for bad in [
        ApiRequest::new("GET").with_path_parameter("id", "not-alnum!"),
        ApiRequest::new("GET").with_path_parameter("id", "abcdefghijk"),
        ApiRequest::new("GET").with_path_parameter("id", 42),
        ApiRequest::new("GET"),
    ] {
        ControllerTest::new(&controller)
            .when_request(bad)
            .then_response_eq(Response::new(400, "Bad Request"))
            .run()
            .await;
    }

    assert_eq!(recorder.call_count(), 1);
}

#[tokio::test]
async fn every_bundle_must_pass() {
    let recorder = RecordingHandler::new();
    let rules = ValidationRules::new()
        .with_body(Schema::new().field("count", Field::required(NumberRule::new().integer().or_more(1.0))))
        .with_query(Schema::new().field("page", Field::optional(StringRule::new().with_max_length(3))))
        .with_header(Schema::new().field("x-client", Field::required(StringRule::new())));
    let controller = single(
        HttpMethod::Post,
        Condition::new(recorder.handler("post")).with_validation(rules),
        ControllerConfig::new(),
    );

    let valid = ApiRequest::new("POST")
        .with_header("x-client", "cli")
        .with_query_parameter("page", "2")
        .with_body(json!({"count": 2, "extra": true}));
    ControllerTest::new(&controller)
        .when_request(valid.clone())
        .then_status(200)
        .run()
        .await;

    let mut missing_header = valid.clone();
    missing_header.headers.clear();
    let bad_query = valid.clone().with_query_parameter("page", "1234");
    let bad_body = valid.clone().with_body(json!({"count": 1.5}));
    let array_body = valid.with_body(json!([{"count": 2}]));

    for bad in [missing_header, bad_query, bad_body, array_body] {
        ControllerTest::new(&controller)
            .when_request(bad)
            .then_status(400)
            .run()
            .await;
    }

    assert_eq!(recorder.call_count(), 1);
}

#[tokio::test]
async fn absent_optional_bundle_schema_is_a_pass() {
    let recorder = RecordingHandler::new();
    let controller = single(
        HttpMethod::Get,
        Condition::new(recorder.handler("get")).with_validation(ValidationRules::new()),
        ControllerConfig::new(),
    );

    ControllerTest::new(&controller)
        .when_request(ApiRequest::new("GET").with_body(json!("not a record")))
        .then_status(200)
        .run()
        .await;
}

// ═══════════════════════════════════════════════════════════════════════
// CustomValidate
// ═══════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn custom_error_response_is_returned_verbatim() {
    let recorder = RecordingHandler::new();
    let custom = MockCustomValidation::responding(Response::new(500, "X"));
    let controller = single(
        HttpMethod::Get,
        Condition::new(recorder.handler("get")).with_custom_validation(custom.validation()),
        ControllerConfig::new(),
    );

    ControllerTest::new(&controller)
        .when_request(ApiRequest::new("GET"))
        .then_response_eq(Response::new(500, "X"))
        .run()
        .await;

    assert!(!recorder.was_called());
}

#[tokio::test]
async fn custom_error_response_wins_even_when_result_is_true() {
    let custom = MockCustomValidation::returning(CustomValidationResult {
        validation_result: true,
        error_response: Some(Response::new(409, "conflict")),
    });
    let recorder = RecordingHandler::new();
    let controller = single(
        HttpMethod::Get,
        Condition::new(recorder.handler("get")).with_custom_validation(custom.validation()),
        ControllerConfig::new(),
    );

    ControllerTest::new(&controller)
        .when_request(ApiRequest::new("GET"))
        .then_response_eq(Response::new(409, "conflict"))
        .run()
        .await;

    assert!(!recorder.was_called());
}

#[tokio::test]
async fn custom_rejection_is_bad_request() {
    let recorder = RecordingHandler::new();
    let custom = MockCustomValidation::rejecting();
    let controller = single(
        HttpMethod::Get,
        Condition::new(recorder.handler("get")).with_custom_validation(custom.validation()),
        ControllerConfig::new().with_bad_request(Response::new(400, r#"{"error":"invalid"}"#)),
    );

    ControllerTest::new(&controller)
        .when_request(ApiRequest::new("GET"))
        .then_response_eq(Response::new(400, r#"{"error":"invalid"}"#))
        .run()
        .await;

    assert!(!recorder.was_called());
}

#[tokio::test]
async fn custom_validation_runs_after_schema_validation_without_user_info() {
    let recorder = RecordingHandler::new();
    let custom = MockCustomValidation::passing();
    let controller = single(
        HttpMethod::Get,
        Condition::new(recorder.handler("get"))
            .with_authentication(["user"])
            .with_validation(id_rules())
            .with_custom_validation(custom.validation()),
        ControllerConfig::new().with_authenticator(MockAuthenticator::authenticated(user("u9"))),
    );

    ControllerTest::new(&controller)
        .when_request(ApiRequest::new("GET").with_path_parameter("id", "bad id"))
        .then_status(400)
        .run()
        .await;
    assert_eq!(custom.call_count(), 0);

    let request = ApiRequest::new("GET").with_path_parameter("id", "a1");
    ControllerTest::new(&controller)
        .when_request(request.clone())
        .then_status(200)
        .run()
        .await;

    assert_eq!(custom.received(), vec![Parameters::from(&request)]);
    assert_eq!(recorder.last_event().unwrap().user_info, Some(user("u9")));
}

#[tokio::test]
async fn panicking_custom_validation_is_internal_error() {
    #[allow(clippy::panic, clippy::unused_async)]
    async fn broken_check(_parameters: Parameters) -> CustomValidationResult {
        panic!("validator bug")
    }

    let recorder = RecordingHandler::new();
    let check = CustomValidation::new(broken_check);
    let controller = single(
        HttpMethod::Get,
        Condition::new(recorder.handler("get")).with_custom_validation(check),
        ControllerConfig::new(),
    );

    ControllerTest::new(&controller)
        .when_request(ApiRequest::new("GET"))
        .then_status(500)
        .run()
        .await;

    assert!(!recorder.was_called());
}

// ═══════════════════════════════════════════════════════════════════════
// Invoke
// ═══════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn handler_receives_all_bundles() {
    let recorder = RecordingHandler::new();
    let controller = single(
        HttpMethod::Put,
        Condition::new(recorder.handler("put")),
        ControllerConfig::new(),
    );

    let request = ApiRequest::new("PUT")
        .with_header("x-trace", "t1")
        .with_path_parameter("id", "a1")
        .with_query_parameter("dry", "true")
        .with_body(json!({"name": "widget"}));
    controller.handle(&request).await;

    let event = recorder.last_event().unwrap();
    assert_eq!(event.headers, request.headers);
    assert_eq!(event.path_parameters, request.path_parameters);
    assert_eq!(event.query_parameters, request.query_parameters);
    assert_eq!(event.body, request.body);
}

#[tokio::test]
async fn handler_response_is_returned_unmodified() {
    let recorder = RecordingHandler::responding(Response::new(201, r#"{"id":"a1"}"#));
    let controller = single(
        HttpMethod::Post,
        Condition::new(recorder.handler("post")),
        ControllerConfig::new(),
    );

    ControllerTest::new(&controller)
        .when_request(ApiRequest::new("POST"))
        .then_response_eq(Response::new(201, r#"{"id":"a1"}"#))
        .run()
        .await;
}

#[tokio::test]
async fn failing_handler_is_internal_error() {
    let controller = single(
        HttpMethod::Delete,
        Condition::new(failing_handler("delete", "row locked")),
        ControllerConfig::new().with_internal_error(Response::new(500, "try later")),
    );

    ControllerTest::new(&controller)
        .when_request(ApiRequest::new("DELETE"))
        .then_response_eq(Response::new(500, "try later"))
        .run()
        .await;
}

#[tokio::test]
async fn panicking_handler_is_internal_error() {
    let controller = single(
        HttpMethod::Patch,
        Condition::new(panicking_handler("patch", "index out of bounds")),
        ControllerConfig::new(),
    );

    ControllerTest::new(&controller)
        .when_request(ApiRequest::new("PATCH"))
        .then_response_eq(Response::new(500, "Internal Server Error"))
        .run()
        .await;
}

// ═══════════════════════════════════════════════════════════════════════
// Shared configuration
// ═══════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn controllers_share_one_config() {
    let auth = MockAuthenticator::authenticated(user("shared"));
    let config = Arc::new(ControllerConfig::new().with_authenticator(auth.clone()));

    let first = Controller::builder("first", Arc::clone(&config))
        .on(
            HttpMethod::Get,
            Condition::new(RecordingHandler::new().handler("get")).with_authentication(["a"]),
        )
        .build();
    let second = Controller::builder("second", config)
        .on(
            HttpMethod::Get,
            Condition::new(RecordingHandler::new().handler("get")).with_authentication(["b"]),
        )
        .build();

    first.handle(&ApiRequest::new("GET")).await;
    second.handle(&ApiRequest::new("GET")).await;

    assert_eq!(
        auth.received_roles(),
        vec![vec!["a".to_string()], vec!["b".to_string()]]
    );
}

#[tokio::test]
async fn concurrent_requests_share_a_controller() {
    let recorder = RecordingHandler::new();
    let controller = Arc::new(single(
        HttpMethod::Get,
        Condition::new(recorder.handler("get")),
        ControllerConfig::new(),
    ));

    let mut tasks = Vec::new();
    for _ in 0..16 {
        let controller = Arc::clone(&controller);
        tasks.push(tokio::spawn(async move {
            controller.handle(&ApiRequest::new("GET")).await
        }));
    }
    for task in tasks {
        assert_eq!(task.await.unwrap().status_code, 200);
    }

    assert_eq!(recorder.call_count(), 16);
}
