//! The two demo resources.
//!
//! - `/test`: authenticated `GET` echoing the caller
//! - `/test/{id}`: authenticated `GET` with a validated path id, and `POST`
//!   creating an item from a validated body with a cross-field range check

use crate::auth::{Role, UserInfo};
use method_controller_core::{
    ArrayRule, Condition, CustomValidation, CustomValidationResult, EnumRule, Field, Handler,
    HandlerEvent, HttpMethod, NumberRule, Parameters, Response, Schema, StringRule,
    ValidationRules,
};
use method_controller_runtime::{Controller, ControllerConfig};
use serde_json::{Value, json};
use std::sync::Arc;

/// Path id: one to ten ASCII letters or digits.
pub const ID_PATTERN: &str = "^[0-9a-zA-Z]{1,10}$";

const ALL_ROLES: [Role; 2] = [Role::Admin, Role::User];

/// Controller for `/test`.
#[must_use]
pub fn test_controller(config: Arc<ControllerConfig<UserInfo>>) -> Controller<UserInfo> {
    Controller::builder("/test", config)
        .on(
            HttpMethod::Get,
            Condition::new(Handler::new("get", get_test))
                .with_authentication(ALL_ROLES.map(Role::as_str)),
        )
        .build()
}

/// Controller for `/test/{id}`.
///
/// # Errors
///
/// Returns an error if the id pattern fails to compile.
pub fn test_id_controller(
    config: Arc<ControllerConfig<UserInfo>>,
) -> anyhow::Result<Controller<UserInfo>> {
    let path = Schema::new().field("id", Field::required(StringRule::new().try_with_pattern(ID_PATTERN)?));

    Ok(Controller::builder("/test/{id}", config)
        .on(
            HttpMethod::Get,
            Condition::new(Handler::new("get", get_test_id))
                .with_authentication(ALL_ROLES.map(Role::as_str))
                .with_validation(ValidationRules::new().with_path(path.clone())),
        )
        .on(
            HttpMethod::Post,
            Condition::new(Handler::new("post", post_test_id))
                .with_authentication([Role::Admin.as_str()])
                .with_validation(
                    ValidationRules::new()
                        .with_path(path)
                        .with_body(item_schema()),
                )
                .with_custom_validation(CustomValidation::new(check_quantity_range)),
        )
        .build())
}

fn item_schema() -> Schema {
    Schema::new()
        .field(
            "name",
            Field::required(StringRule::new().with_min_length(1).with_max_length(32)),
        )
        .field("kind", Field::required(EnumRule::new(["widget", "gadget"])))
        .field(
            "minQuantity",
            Field::optional(NumberRule::new().integer().or_more(0.0)),
        )
        .field(
            "maxQuantity",
            Field::optional(NumberRule::new().integer().or_lower(10_000.0)),
        )
        .field(
            "tags",
            Field::optional(
                ArrayRule::new()
                    .with_max_length(5)
                    .of_primitive(StringRule::new().with_max_length(16)),
            ),
        )
}

#[allow(clippy::unused_async)]
async fn check_quantity_range(parameters: Parameters) -> CustomValidationResult {
    let body = parameters.body.unwrap_or(Value::Null);
    let min = body.get("minQuantity").and_then(Value::as_f64);
    let max = body.get("maxQuantity").and_then(Value::as_f64);

    match (min, max) {
        (Some(min), Some(max)) if min > max => CustomValidationResult::respond(Response::new(
            422,
            json!({"message": "minQuantity must not exceed maxQuantity"}).to_string(),
        )),
        _ => CustomValidationResult::pass(),
    }
}

#[allow(clippy::unused_async)]
async fn get_test(event: HandlerEvent<UserInfo>) -> anyhow::Result<Response> {
    Ok(Response::json(200, &echo(event.user_info.as_ref(), "/test"))?)
}

#[allow(clippy::unused_async)]
async fn get_test_id(event: HandlerEvent<UserInfo>) -> anyhow::Result<Response> {
    let mut body = echo(event.user_info.as_ref(), "/test/{id}");
    if let Some(id) = event.path_parameter("id") {
        body["id"] = json!(id);
    }
    Ok(Response::json(200, &body)?)
}

#[allow(clippy::unused_async)]
async fn post_test_id(event: HandlerEvent<UserInfo>) -> anyhow::Result<Response> {
    let id = event
        .path_parameter("id")
        .ok_or_else(|| anyhow::anyhow!("path id missing after validation"))?
        .to_string();
    let created_by = event.user_info.map(|user| user.user_id);

    tracing::info!(%id, ?created_by, "Item created");
    Ok(Response::json(
        201,
        &json!({ "id": id, "item": event.body, "createdBy": created_by }),
    )?)
}

fn echo(user: Option<&UserInfo>, uri: &str) -> Value {
    let mut body = user
        .and_then(|user| serde_json::to_value(user).ok())
        .unwrap_or_else(|| json!({}));
    body["uri"] = json!(uri);
    body
}
