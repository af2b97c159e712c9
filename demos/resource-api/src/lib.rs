//! # Resource API Example
//!
//! Two resources served by method controllers behind a bearer-token
//! authenticator.
//!
//! This example showcases:
//! - Declaring per-method conditions (authentication, roles, schemas, custom checks)
//! - Sharing one configuration between controllers
//! - Routing gateway events to the controller of their resource
//!
//! ## Example
//!
//! ```
//! use resource_api::{GatewayEvent, Resources, Role, UserInfo, HeaderTokenAuthenticator};
//! use method_controller_runtime::ControllerConfig;
//! use std::sync::Arc;
//!
//! # tokio_test::block_on(async {
//! let auth = HeaderTokenAuthenticator::new()
//!     .with_token("t1", UserInfo::new("u1", Role::User));
//! let resources = Resources::new(Arc::new(ControllerConfig::new().with_authenticator(auth)))?;
//!
//! let event: GatewayEvent = serde_json::from_str(
//!     r#"{"resource":"/test","httpMethod":"GET","headers":{"Authorization":"Bearer t1"}}"#,
//! )?;
//! let response = resources.dispatch(&event).await;
//! assert_eq!(response.status_code, 200);
//! # Ok::<(), anyhow::Error>(())
//! # }).unwrap();
//! ```

pub mod auth;
pub mod controllers;

pub use auth::{HeaderTokenAuthenticator, Role, UserInfo};

use method_controller_core::{ApiRequest, Response};
use method_controller_runtime::{Controller, ControllerConfig};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// A gateway proxy event: the resource template plus the request itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GatewayEvent {
    /// Resource template the gateway matched, e.g. `/test/{id}`.
    pub resource: String,
    /// The request.
    #[serde(flatten)]
    pub request: ApiRequest,
}

/// Resource template → controller.
#[derive(Debug)]
pub struct Resources {
    controllers: HashMap<String, Controller<UserInfo>>,
}

impl Resources {
    /// Build every demo controller over `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if a controller cannot be built.
    pub fn new(config: Arc<ControllerConfig<UserInfo>>) -> anyhow::Result<Self> {
        let controllers = [
            controllers::test_controller(Arc::clone(&config)),
            controllers::test_id_controller(config)?,
        ]
        .into_iter()
        .map(|controller| (controller.name().to_string(), controller))
        .collect();

        Ok(Self { controllers })
    }

    /// Controller serving `resource`.
    #[must_use]
    pub fn resolve(&self, resource: &str) -> Option<&Controller<UserInfo>> {
        self.controllers.get(resource)
    }

    /// Registered resource templates, sorted.
    #[must_use]
    pub fn resources(&self) -> Vec<&str> {
        let mut resources: Vec<&str> = self.controllers.keys().map(String::as_str).collect();
        resources.sort_unstable();
        resources
    }

    /// Route `event` to its controller.
    ///
    /// An unknown resource is answered with `404 Not Found`.
    pub async fn dispatch(&self, event: &GatewayEvent) -> Response {
        match self.resolve(&event.resource) {
            Some(controller) => controller.handle(&event.request).await,
            None => {
                tracing::warn!(resource = %event.resource, "No controller for resource");
                Response::new(404, "Not Found")
            },
        }
    }
}
