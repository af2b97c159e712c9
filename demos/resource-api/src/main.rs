//! Resource API example binary
//!
//! Dispatches a handful of gateway events against the demo resources and
//! prints each response, followed by the dispatch metrics.

use method_controller_runtime::ControllerConfig;
use method_controller_runtime::metrics::MetricsExporter;
use resource_api::{GatewayEvent, HeaderTokenAuthenticator, Resources, Role, UserInfo};
use serde_json::json;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "resource_api=debug,method_controller_runtime=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let exporter = MetricsExporter::install()?;

    let authenticator = HeaderTokenAuthenticator::new()
        .with_token(
            "admin-token",
            UserInfo::new("6e1dca92-70f5-4531-8dc2-cc20dbca363b", Role::Admin),
        )
        .with_token("user-token", UserInfo::new("b0a7c1f4-3d2e-4f11-9c55-0e8f2a6d7b90", Role::User));
    let config = Arc::new(ControllerConfig::new().with_authenticator(authenticator));
    let resources = Resources::new(config)?;

    println!("=== Resource API Example ===\n");
    println!("Resources: {:?}", resources.resources());

    let events = [
        json!({"resource": "/test", "httpMethod": "GET",
               "headers": {"Authorization": "Bearer user-token"}}),
        json!({"resource": "/test", "httpMethod": "GET"}),
        json!({"resource": "/test", "httpMethod": "DELETE",
               "headers": {"Authorization": "Bearer user-token"}}),
        json!({"resource": "/test/{id}", "httpMethod": "GET",
               "headers": {"Authorization": "Bearer user-token"},
               "pathParameters": {"id": "abc123"}}),
        json!({"resource": "/test/{id}", "httpMethod": "GET",
               "headers": {"Authorization": "Bearer user-token"},
               "pathParameters": {"id": "not/a/valid/id"}}),
        json!({"resource": "/test/{id}", "httpMethod": "POST",
               "headers": {"Authorization": "Bearer user-token"},
               "pathParameters": {"id": "item1"},
               "body": {"name": "bolt", "kind": "widget"}}),
        json!({"resource": "/test/{id}", "httpMethod": "POST",
               "headers": {"Authorization": "Bearer admin-token"},
               "pathParameters": {"id": "item1"},
               "body": {"name": "bolt", "kind": "widget", "minQuantity": 10, "maxQuantity": 2}}),
        json!({"resource": "/test/{id}", "httpMethod": "POST",
               "headers": {"Authorization": "Bearer admin-token"},
               "pathParameters": {"id": "item1"},
               "body": {"name": "bolt", "kind": "widget", "tags": ["m8"]}}),
        json!({"resource": "/missing", "httpMethod": "GET"}),
    ];

    for raw in events {
        let event: GatewayEvent = serde_json::from_value(raw)?;
        println!("\n>>> {} {}", event.request.method, event.resource);
        let response = resources.dispatch(&event).await;
        println!("<<< {} {}", response.status_code, response.body);
    }

    if let Some(rendered) = exporter.render() {
        println!("\n=== Metrics ===\n{rendered}");
    }

    Ok(())
}
