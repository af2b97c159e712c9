//! Validation engine.
//!
//! Walks a [`Schema`] against a JSON value. Every declared field is evaluated,
//! an earlier failure never hides a later one, and the verdict is the AND of
//! all field verdicts. Nothing here panics or returns an error: a type
//! mismatch is simply a failing verdict.
//!
//! [`inspect`] returns every [`Violation`] found; [`validate`] and [`check`]
//! collapse that into a boolean.

use crate::request::{ApiRequest, Bundle};
use crate::schema::{ArrayItems, ArrayRule, EnumRule, NumberRule, ObjectRule, PrimitiveRule, Rule, Schema, StringRule};
use serde_json::{Number, Value};
use std::fmt;
use thiserror::Error;

/// The optional schemas applied to each of the four request bundles.
///
/// An absent schema is a vacuous pass for its bundle.
#[derive(Debug, Clone, Default)]
pub struct ValidationRules {
    /// Schema for the decoded body.
    pub body: Option<Schema>,
    /// Schema for the path parameters.
    pub path: Option<Schema>,
    /// Schema for the query parameters.
    pub query: Option<Schema>,
    /// Schema for the headers.
    pub header: Option<Schema>,
}

impl ValidationRules {
    /// No schemas: every request passes.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate the body against `schema`.
    #[must_use]
    pub fn with_body(mut self, schema: Schema) -> Self {
        self.body = Some(schema);
        self
    }

    /// Validate the path parameters against `schema`.
    #[must_use]
    pub fn with_path(mut self, schema: Schema) -> Self {
        self.path = Some(schema);
        self
    }

    /// Validate the query parameters against `schema`.
    #[must_use]
    pub fn with_query(mut self, schema: Schema) -> Self {
        self.query = Some(schema);
        self
    }

    /// Validate the headers against `schema`.
    #[must_use]
    pub fn with_header(mut self, schema: Schema) -> Self {
        self.header = Some(schema);
        self
    }
}

/// Why a value failed its rule.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ViolationKind {
    /// A record was expected (top-level bundle, object rule, object array element).
    #[error("expected a record")]
    NotARecord,

    /// A required field is absent.
    #[error("required field is missing")]
    Missing,

    /// The value has the wrong JSON type.
    #[error("expected {expected}")]
    TypeMismatch {
        /// Expected rule kind.
        expected: &'static str,
    },

    /// A string does not match the rule's pattern.
    #[error("does not match pattern {pattern}")]
    PatternMismatch {
        /// The pattern source.
        pattern: String,
    },

    /// A string or array is shorter than allowed.
    #[error("length {actual} is below the minimum {min}")]
    TooShort {
        /// Minimum length.
        min: usize,
        /// Actual length.
        actual: usize,
    },

    /// A string or array is longer than allowed.
    #[error("length {actual} exceeds the maximum {max}")]
    TooLong {
        /// Maximum length.
        max: usize,
        /// Actual length.
        actual: usize,
    },

    /// A number has a fractional part where an integer is required.
    #[error("expected an integer")]
    NotInteger,

    /// A number violates a bound.
    #[error("{value} is not {comparison} {bound}")]
    OutOfRange {
        /// The offending value.
        value: f64,
        /// The violated comparison (`<=`, `>=`, `<`, `>`).
        comparison: &'static str,
        /// The bound.
        bound: f64,
    },

    /// A value is not in the enum's list.
    #[error("not one of the allowed values")]
    NotInEnum,

    /// A custom predicate returned false.
    #[error("rejected by custom rule")]
    CustomRejected,
}

/// A failed rule at a dotted field path (`body.items[2].name`).
#[derive(Debug, Clone, PartialEq)]
pub struct Violation {
    /// Path to the offending value.
    pub path: String,
    /// What went wrong.
    pub kind: ViolationKind,
}

impl Violation {
    fn new(path: &str, kind: ViolationKind) -> Self {
        Self {
            path: path.to_string(),
            kind,
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            write!(f, "{}", self.kind)
        } else {
            write!(f, "{}: {}", self.path, self.kind)
        }
    }
}

/// Returns `true` if `value` is a record satisfying `schema`.
#[must_use]
pub fn validate(value: &Value, schema: &Schema) -> bool {
    inspect(value, schema).is_empty()
}

/// Every violation of `schema` by `value`; empty means valid.
#[must_use]
pub fn inspect(value: &Value, schema: &Schema) -> Vec<Violation> {
    let mut violations = Vec::new();
    inspect_value(value, schema, "", &mut violations);
    violations
}

/// Validate the four bundles against their optional schemas.
///
/// A bundle without a schema passes. A bundle with a schema must be a record;
/// an absent bundle fails it.
#[must_use]
pub fn check(
    rules: &ValidationRules,
    headers: &Bundle,
    path_parameters: Option<&Bundle>,
    body: Option<&Value>,
    query_parameters: Option<&Bundle>,
) -> bool {
    inspect_bundles(rules, headers, path_parameters, body, query_parameters).is_empty()
}

/// Every violation found in `request`'s bundles.
#[must_use]
pub fn inspect_request(rules: &ValidationRules, request: &ApiRequest) -> Vec<Violation> {
    inspect_bundles(
        rules,
        &request.headers,
        request.path_parameters.as_ref(),
        request.body.as_ref(),
        request.query_parameters.as_ref(),
    )
}

fn inspect_bundles(
    rules: &ValidationRules,
    headers: &Bundle,
    path_parameters: Option<&Bundle>,
    body: Option<&Value>,
    query_parameters: Option<&Bundle>,
) -> Vec<Violation> {
    let mut violations = Vec::new();

    if let Some(schema) = &rules.body {
        match body {
            Some(value) => inspect_value(value, schema, "body", &mut violations),
            None => violations.push(Violation::new("body", ViolationKind::NotARecord)),
        }
    }
    if let Some(schema) = &rules.path {
        inspect_bundle(path_parameters, schema, "pathParameters", &mut violations);
    }
    if let Some(schema) = &rules.query {
        inspect_bundle(query_parameters, schema, "queryParameters", &mut violations);
    }
    if let Some(schema) = &rules.header {
        inspect_fields(headers, schema, "headers", &mut violations);
    }

    violations
}

fn inspect_bundle(bundle: Option<&Bundle>, schema: &Schema, path: &str, out: &mut Vec<Violation>) {
    match bundle {
        Some(record) => inspect_fields(record, schema, path, out),
        None => out.push(Violation::new(path, ViolationKind::NotARecord)),
    }
}

fn inspect_value(value: &Value, schema: &Schema, path: &str, out: &mut Vec<Violation>) {
    match value.as_object() {
        Some(record) => inspect_fields(record, schema, path, out),
        None => out.push(Violation::new(path, ViolationKind::NotARecord)),
    }
}

fn inspect_fields(record: &Bundle, schema: &Schema, path: &str, out: &mut Vec<Violation>) {
    for (name, field) in schema.iter() {
        let field_path = join(path, name);
        match record.get(name) {
            Some(value) => inspect_rule(value, &field.rule, &field_path, out),
            None if field.required => out.push(Violation::new(&field_path, ViolationKind::Missing)),
            None => {},
        }
    }
}

fn inspect_rule(value: &Value, rule: &Rule, path: &str, out: &mut Vec<Violation>) {
    match rule {
        Rule::String(rule) => inspect_string(value, rule, path, out),
        Rule::Number(rule) => inspect_number(value, rule, path, out),
        Rule::Boolean => inspect_boolean(value, path, out),
        Rule::Enum(rule) => inspect_enum(value, rule, path, out),
        Rule::Object(rule) => inspect_object(value, rule, path, out),
        Rule::Array(rule) => inspect_array(value, rule, path, out),
        Rule::Custom(rule) => {
            if !rule.check(value) {
                out.push(Violation::new(path, ViolationKind::CustomRejected));
            }
        },
    }
}

fn inspect_primitive(value: &Value, rule: &PrimitiveRule, path: &str, out: &mut Vec<Violation>) {
    match rule {
        PrimitiveRule::String(rule) => inspect_string(value, rule, path, out),
        PrimitiveRule::Number(rule) => inspect_number(value, rule, path, out),
        PrimitiveRule::Boolean => inspect_boolean(value, path, out),
        PrimitiveRule::Custom(rule) => {
            if !rule.check(value) {
                out.push(Violation::new(path, ViolationKind::CustomRejected));
            }
        },
    }
}

fn inspect_string(value: &Value, rule: &StringRule, path: &str, out: &mut Vec<Violation>) {
    let Some(text) = value.as_str() else {
        out.push(Violation::new(path, ViolationKind::TypeMismatch { expected: "string" }));
        return;
    };

    if let Some(pattern) = &rule.pattern {
        if !pattern.is_match(text) {
            out.push(Violation::new(
                path,
                ViolationKind::PatternMismatch {
                    pattern: pattern.as_str().to_string(),
                },
            ));
        }
    }

    inspect_length(text.chars().count(), rule.min_length, rule.max_length, path, out);
}

fn inspect_number(value: &Value, rule: &NumberRule, path: &str, out: &mut Vec<Violation>) {
    let Value::Number(number) = value else {
        out.push(Violation::new(path, ViolationKind::TypeMismatch { expected: "number" }));
        return;
    };
    let Some(actual) = number.as_f64() else {
        out.push(Violation::new(path, ViolationKind::TypeMismatch { expected: "number" }));
        return;
    };

    if rule.integer && !is_integral(number, actual) {
        out.push(Violation::new(path, ViolationKind::NotInteger));
    }

    let bounds: [(Option<f64>, &'static str, fn(f64, f64) -> bool); 4] = [
        (rule.or_lower, "<=", |v, b| v <= b),
        (rule.or_more, ">=", |v, b| v >= b),
        (rule.less_than, "<", |v, b| v < b),
        (rule.more_than, ">", |v, b| v > b),
    ];
    for (bound, comparison, holds) in bounds {
        if let Some(bound) = bound {
            if !holds(actual, bound) {
                out.push(Violation::new(
                    path,
                    ViolationKind::OutOfRange {
                        value: actual,
                        comparison,
                        bound,
                    },
                ));
            }
        }
    }
}

#[allow(clippy::float_cmp)]
fn is_integral(number: &Number, as_float: f64) -> bool {
    number.is_i64() || number.is_u64() || (as_float.is_finite() && as_float.fract() == 0.0)
}

fn inspect_boolean(value: &Value, path: &str, out: &mut Vec<Violation>) {
    if !value.is_boolean() {
        out.push(Violation::new(path, ViolationKind::TypeMismatch { expected: "boolean" }));
    }
}

fn inspect_enum(value: &Value, rule: &EnumRule, path: &str, out: &mut Vec<Violation>) {
    if !rule.list.iter().any(|literal| literal.matches(value)) {
        out.push(Violation::new(path, ViolationKind::NotInEnum));
    }
}

fn inspect_object(value: &Value, rule: &ObjectRule, path: &str, out: &mut Vec<Violation>) {
    let Some(record) = value.as_object() else {
        out.push(Violation::new(path, ViolationKind::TypeMismatch { expected: "object" }));
        return;
    };

    if let Some(schema) = &rule.validator {
        inspect_fields(record, schema, path, out);
    }
}

fn inspect_array(value: &Value, rule: &ArrayRule, path: &str, out: &mut Vec<Violation>) {
    let Some(elements) = value.as_array() else {
        out.push(Violation::new(path, ViolationKind::TypeMismatch { expected: "array" }));
        return;
    };

    inspect_length(elements.len(), rule.min_length, rule.max_length, path, out);

    match &rule.items {
        Some(ArrayItems::Primitive(element_rule)) => {
            for (index, element) in elements.iter().enumerate() {
                inspect_primitive(element, element_rule, &format!("{path}[{index}]"), out);
            }
        },
        Some(ArrayItems::Object(schema)) => {
            for (index, element) in elements.iter().enumerate() {
                inspect_value(element, schema, &format!("{path}[{index}]"), out);
            }
        },
        None => {},
    }
}

fn inspect_length(
    actual: usize,
    min: Option<usize>,
    max: Option<usize>,
    path: &str,
    out: &mut Vec<Violation>,
) {
    if let Some(min) = min {
        if actual < min {
            out.push(Violation::new(path, ViolationKind::TooShort { min, actual }));
        }
    }
    if let Some(max) = max {
        if actual > max {
            out.push(Violation::new(path, ViolationKind::TooLong { max, actual }));
        }
    }
}

fn join(path: &str, name: &str) -> String {
    if path.is_empty() {
        name.to_string()
    } else {
        format!("{path}.{name}")
    }
}
