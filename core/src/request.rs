//! Inbound requests and the parameter bundles handed to collaborators.
//!
//! The transport decodes its wire format into an [`ApiRequest`]; the core never
//! sees raw bytes. Headers, path parameters and query parameters are
//! string-keyed maps, the body is an arbitrary decoded JSON value.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// A string-keyed parameter group (headers, path parameters, query parameters).
pub type Bundle = Map<String, Value>;

/// An inbound request tagged with its HTTP method.
///
/// Field aliases accept the shape of an API gateway proxy event, so a host
/// can deserialize one directly.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiRequest {
    /// HTTP verb as received; matched exactly against the registered methods.
    #[serde(alias = "httpMethod")]
    pub method: String,
    /// Request headers. A `null` from the gateway reads as no headers.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub headers: Bundle,
    /// Path parameters, absent when the route has none.
    #[serde(default)]
    pub path_parameters: Option<Bundle>,
    /// Decoded body.
    #[serde(default)]
    pub body: Option<Value>,
    /// Query parameters.
    #[serde(default, alias = "queryStringParameters")]
    pub query_parameters: Option<Bundle>,
}

impl ApiRequest {
    /// Create a request with no headers, parameters or body.
    #[must_use]
    pub fn new(method: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            ..Self::default()
        }
    }

    /// Add a header.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Add a path parameter.
    #[must_use]
    pub fn with_path_parameter(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.path_parameters
            .get_or_insert_with(Bundle::new)
            .insert(name.into(), value.into());
        self
    }

    /// Add a query parameter.
    #[must_use]
    pub fn with_query_parameter(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.query_parameters
            .get_or_insert_with(Bundle::new)
            .insert(name.into(), value.into());
        self
    }

    /// Set the decoded body.
    #[must_use]
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Bundle, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Bundle>::deserialize(deserializer)?.unwrap_or_default())
}

/// The four parameter bundles, as handed to a custom validation.
///
/// Carries no user information: custom validation runs before the handler and
/// only looks at caller input.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Parameters {
    /// Request headers.
    pub headers: Bundle,
    /// Path parameters.
    pub path_parameters: Option<Bundle>,
    /// Decoded body.
    pub body: Option<Value>,
    /// Query parameters.
    pub query_parameters: Option<Bundle>,
}

impl From<&ApiRequest> for Parameters {
    fn from(request: &ApiRequest) -> Self {
        Self {
            headers: request.headers.clone(),
            path_parameters: request.path_parameters.clone(),
            body: request.body.clone(),
            query_parameters: request.query_parameters.clone(),
        }
    }
}

/// Everything a handler receives: the request bundles plus the user
/// information produced by authentication.
#[derive(Debug, Clone, PartialEq)]
pub struct HandlerEvent<U> {
    /// Request headers.
    pub headers: Bundle,
    /// Path parameters.
    pub path_parameters: Option<Bundle>,
    /// Decoded body.
    pub body: Option<Value>,
    /// Query parameters.
    pub query_parameters: Option<Bundle>,
    /// Authenticated user, `None` when the method does not authenticate.
    pub user_info: Option<U>,
}

impl<U> HandlerEvent<U> {
    /// Assemble a handler event from validated parameters.
    #[must_use]
    pub fn new(parameters: Parameters, user_info: Option<U>) -> Self {
        Self {
            headers: parameters.headers,
            path_parameters: parameters.path_parameters,
            body: parameters.body,
            query_parameters: parameters.query_parameters,
            user_info,
        }
    }

    /// Look up a path parameter as a string.
    #[must_use]
    pub fn path_parameter(&self, name: &str) -> Option<&str> {
        self.path_parameters
            .as_ref()
            .and_then(|params| params.get(name))
            .and_then(Value::as_str)
    }
}
