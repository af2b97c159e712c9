//! # Method Controller Testing
//!
//! Testing utilities and helpers for method controllers.
//!
//! This crate provides:
//! - Scripted authenticators, handlers and custom validations
//! - A Given-When-Then harness for controllers
//! - Assertion helpers for controller registrations
//! - Property-based testing strategies for schemas and JSON values
//!
//! ## Example
//!
//! ```
//! use method_controller_core::{ApiRequest, Condition, HttpMethod};
//! use method_controller_runtime::{Controller, ControllerConfig};
//! use method_controller_testing::{ControllerTest, MockAuthenticator, RecordingHandler};
//! use std::sync::Arc;
//!
//! # tokio_test::block_on(async {
//! let auth = MockAuthenticator::forbidden();
//! let recorder = RecordingHandler::<String>::new();
//! let config = ControllerConfig::new().with_authenticator(auth.clone());
//!
//! let controller = Controller::builder("orders", Arc::new(config))
//!     .on(
//!         HttpMethod::Get,
//!         Condition::new(recorder.handler("get")).with_authentication(["admin"]),
//!     )
//!     .build();
//!
//! ControllerTest::new(&controller)
//!     .when_request(ApiRequest::new("GET"))
//!     .then_status(403)
//!     .run()
//!     .await;
//!
//! assert_eq!(auth.received_roles(), vec![vec!["admin".to_string()]]);
//! assert!(!recorder.was_called());
//! # });
//! ```

/// Scripted collaborators
pub mod mocks;

/// Given-When-Then harness and registration assertions
pub mod controller_test;

/// Test helpers and utilities.
pub mod helpers {
    use tracing_subscriber::EnvFilter;

    /// Install a test tracing subscriber honouring `RUST_LOG`.
    ///
    /// Safe to call from every test: only the first call installs anything.
    pub fn init_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
            )
            .with_test_writer()
            .try_init();
    }
}

/// Property-based testing utilities using proptest.
pub mod properties {
    use method_controller_core::{
        ArrayRule, EnumRule, Field, NumberRule, ObjectRule, PrimitiveRule, Rule, Schema,
        StringRule,
    };
    use proptest::prelude::*;
    use serde_json::{Map, Value};

    /// Field names generated for schemas. Never contain `_`.
    pub const FIELD_NAME: &str = "[a-z]{1,6}";

    /// Keys guaranteed not to collide with [`FIELD_NAME`].
    pub const EXTRA_KEY: &str = "extra_[a-z]{1,6}";

    /// Arbitrary JSON values, nested up to a few levels.
    pub fn json_value() -> impl Strategy<Value = Value> {
        let leaf = prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::Bool),
            any::<i64>().prop_map(Value::from),
            (-1.0e6_f64..1.0e6).prop_map(Value::from),
            "[a-zA-Z0-9 ]{0,12}".prop_map(Value::String),
        ];
        leaf.prop_recursive(3, 32, 6, |inner| {
            prop_oneof![
                prop::collection::vec(inner.clone(), 0..6).prop_map(Value::Array),
                prop::collection::btree_map(FIELD_NAME, inner, 0..6)
                    .prop_map(|m| Value::Object(m.into_iter().collect())),
            ]
        })
    }

    /// Arbitrary JSON records keyed by [`FIELD_NAME`].
    pub fn json_record() -> impl Strategy<Value = Map<String, Value>> {
        prop::collection::btree_map(FIELD_NAME, json_value(), 0..6)
            .prop_map(|m| m.into_iter().collect())
    }

    /// Records keyed by [`EXTRA_KEY`].
    pub fn extra_fields() -> impl Strategy<Value = Map<String, Value>> {
        prop::collection::btree_map(EXTRA_KEY, json_value(), 1..4)
            .prop_map(|m| m.into_iter().collect())
    }

    /// Arbitrary leaf rules (no nested schemas).
    pub fn leaf_rule() -> impl Strategy<Value = Rule> {
        prop_oneof![
            (proptest::option::of(0_usize..4), proptest::option::of(4_usize..12)).prop_map(
                |(min, max)| {
                    let mut rule = StringRule::new();
                    rule.min_length = min;
                    rule.max_length = max;
                    Rule::String(rule)
                }
            ),
            (any::<bool>(), proptest::option::of(-100.0_f64..100.0)).prop_map(
                |(integer, floor)| {
                    let mut rule = NumberRule::new();
                    rule.integer = integer;
                    rule.or_more = floor;
                    Rule::Number(rule)
                }
            ),
            Just(Rule::Boolean),
            prop::collection::vec("[a-z]{1,4}", 1..4).prop_map(|list| Rule::Enum(EnumRule::new(list))),
            Just(Rule::Object(ObjectRule::any())),
            Just(Rule::Array(
                ArrayRule::new().of_primitive(PrimitiveRule::Boolean)
            )),
        ]
    }

    /// Arbitrary rules, nesting object schemas one level deep.
    pub fn rule() -> impl Strategy<Value = Rule> {
        prop_oneof![
            3 => leaf_rule(),
            1 => prop::collection::btree_map(FIELD_NAME, (any::<bool>(), leaf_rule()), 0..4)
                .prop_map(|fields| Rule::Object(ObjectRule::with_schema(schema_from(fields)))),
        ]
    }

    /// Arbitrary schemas mixing required and optional fields.
    pub fn schema() -> impl Strategy<Value = Schema> {
        prop::collection::btree_map(FIELD_NAME, (any::<bool>(), rule()), 0..6).prop_map(schema_from)
    }

    /// Arbitrary schemas whose fields are all optional.
    pub fn optional_schema() -> impl Strategy<Value = Schema> {
        prop::collection::btree_map(FIELD_NAME, rule(), 0..6).prop_map(|fields| {
            fields
                .into_iter()
                .map(|(name, rule)| (name, Field::optional(rule)))
                .collect()
        })
    }

    fn schema_from(fields: std::collections::BTreeMap<String, (bool, Rule)>) -> Schema {
        fields
            .into_iter()
            .map(|(name, (required, rule))| {
                let field = if required {
                    Field::required(rule)
                } else {
                    Field::optional(rule)
                };
                (name, field)
            })
            .collect()
    }
}

pub use controller_test::{ControllerTest, assertions};
pub use mocks::{
    MockAuthenticator, MockCustomValidation, RecordingHandler, failing_handler, panicking_handler,
};
