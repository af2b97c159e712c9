//! Bearer-token authentication for the demo resources.

use futures::future::BoxFuture;
use method_controller_core::{ApiRequest, AuthResult, Authenticator};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Roles a demo user can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Full access.
    Admin,
    /// Regular access.
    User,
}

impl Role {
    /// The role identifier used in condition role lists.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::User => "user",
        }
    }
}

/// User information handed to handlers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInfo {
    /// Stable user identifier.
    pub user_id: String,
    /// Role held by the user.
    pub role: Role,
}

impl UserInfo {
    /// Create user information.
    #[must_use]
    pub fn new(user_id: impl Into<String>, role: Role) -> Self {
        Self {
            user_id: user_id.into(),
            role,
        }
    }
}

/// Resolves `Authorization: Bearer <token>` against a fixed token table.
///
/// - no header, a non-string header, another scheme or an unknown token: 401
/// - a known token whose role is not admitted by the method: 403
///
/// An empty role list admits every known user.
#[derive(Debug, Clone, Default)]
pub struct HeaderTokenAuthenticator {
    tokens: HashMap<String, UserInfo>,
}

impl HeaderTokenAuthenticator {
    /// An authenticator that knows no token.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Accept `token` as `user`.
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>, user: UserInfo) -> Self {
        self.tokens.insert(token.into(), user);
        self
    }

    fn resolve(&self, request: &ApiRequest, roles: &[String]) -> AuthResult<UserInfo> {
        let Some(token) = bearer_token(request) else {
            tracing::debug!("Missing or malformed authorization header");
            return AuthResult::unauthorized();
        };
        let Some(user) = self.tokens.get(token) else {
            tracing::debug!("Unknown token");
            return AuthResult::unauthorized();
        };

        if !roles.is_empty() && !roles.iter().any(|role| role == user.role.as_str()) {
            tracing::debug!(user_id = %user.user_id, role = user.role.as_str(), "Role not admitted");
            return AuthResult::forbidden();
        }

        AuthResult::authenticated(user.clone())
    }
}

impl Authenticator<UserInfo> for HeaderTokenAuthenticator {
    fn authenticate<'a>(
        &'a self,
        request: &'a ApiRequest,
        roles: &'a [String],
    ) -> BoxFuture<'a, anyhow::Result<AuthResult<UserInfo>>> {
        Box::pin(async move { Ok(self.resolve(request, roles)) })
    }
}

fn bearer_token(request: &ApiRequest) -> Option<&str> {
    request
        .headers
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case("authorization"))
        .and_then(|(_, value)| value.as_str())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}
