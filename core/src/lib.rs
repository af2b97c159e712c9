//! # Method Controller Core
//!
//! Types and pure logic for single-resource API handlers.
//!
//! A resource is served by one controller holding a [`Condition`] per HTTP
//! method. Each condition declares whether the caller must authenticate (and
//! with which roles), which schemas the request bundles must satisfy, an
//! optional cross-field check, and the [`Handler`] doing the actual work.
//!
//! This crate holds everything that does not need a runtime:
//!
//! - **Requests and responses**: [`ApiRequest`], [`Response`] and the four
//!   [`CanonicalResponses`] every rejection collapses into
//! - **Schemas**: the recursive [`Schema`] / [`Rule`] tree
//! - **Validation**: [`validate`], [`inspect`] and [`check`], pure functions over
//!   decoded JSON values
//! - **Conditions**: per-method recipes, the [`ConditionRegistry`] holding them,
//!   and the [`Authenticator`] seam
//! - **Rejections**: why a request was turned away, and the response it maps to
//!
//! The dispatcher itself lives in `method-controller-runtime`.
//!
//! ## Example
//!
//! ```
//! use method_controller_core::schema::{Field, Schema, StringRule};
//! use method_controller_core::validation::validate;
//! use serde_json::json;
//!
//! let schema = Schema::new()
//!     .field("name", Field::required(StringRule::new().with_max_length(8)));
//!
//! assert!(validate(&json!({"name": "widget"}), &schema));
//! assert!(!validate(&json!({"name": "a very long name"}), &schema));
//! assert!(!validate(&json!({}), &schema));
//! ```

pub mod condition;
pub mod error;
pub mod method;
pub mod registry;
pub mod request;
pub mod response;
pub mod schema;
pub mod validation;

pub use condition::{
    AuthResult, Authenticator, Condition, CustomValidation, CustomValidationResult, Handler,
};
pub use error::Rejection;
pub use method::{HttpMethod, MethodParseError};
pub use registry::ConditionRegistry;
pub use request::{ApiRequest, Bundle, HandlerEvent, Parameters};
pub use response::{CanonicalResponses, Response};
pub use schema::{
    ArrayItems, ArrayRule, CustomRule, EnumRule, Field, Literal, NumberRule, ObjectRule,
    PrimitiveRule, Rule, Schema, StringRule,
};
pub use validation::{
    ValidationRules, Violation, ViolationKind, check, inspect, inspect_request, validate,
};
