//! Operator authentication for the console.
//!
//! Requests carry a session token as a bearer header or a cookie. The
//! middleware resolves it against the identity service and injects an
//! [`OperatorAuth`] into the request; directory routes additionally
//! require the admin role.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, header::COOKIE, request::Parts, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use warden_model::{OperatorSession, Roles, UserRecord};
use warden_provider::account::AccountProvider;
use warden_provider::directory::DirectoryProvider;

use crate::error::ConsoleError;
use crate::events::AuditLogger;
use crate::state::ConsoleState;

/// Name of the session cookie set by the HTML console.
pub const SESSION_COOKIE: &str = "warden_session";

/// Message shown when a non-admin reaches a directory route.
pub const ADMIN_REQUIRED: &str = "Admin permissions required.";

/// Authenticated operator context.
///
/// Extracted from the session token and made available to handlers.
#[derive(Debug, Clone)]
pub struct OperatorAuth {
    /// The operator's account.
    pub user: UserRecord,
    /// The raw session token, forwarded on session-scoped calls.
    pub token: String,
    /// Set when the session was minted by impersonation.
    pub impersonated_by: Option<String>,
}

impl OperatorAuth {
    /// Builds the context from a resolved session.
    #[must_use]
    pub fn from_session(session: OperatorSession) -> Self {
        Self {
            impersonated_by: session.session.impersonated_by.clone(),
            token: session.session.token,
            user: session.user,
        }
    }

    /// The operator's normalized roles.
    #[must_use]
    pub fn roles(&self) -> &Roles {
        &self.user.role
    }

    /// Whether the operator holds the admin role.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.user.is_admin()
    }

    /// Ensures the operator holds the admin role.
    ///
    /// ## Errors
    ///
    /// Returns `ConsoleError::Forbidden` otherwise.
    pub fn require_admin(&self) -> Result<(), ConsoleError> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(ConsoleError::Forbidden(ADMIN_REQUIRED.to_string()))
        }
    }
}

/// Extracts the session token from the bearer header or the session
/// cookie.
#[must_use]
pub fn extract_session_token(headers: &HeaderMap) -> Option<String> {
    if let Some(token) = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
    {
        return Some(token.to_string());
    }

    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|header| header.split(';'))
        .find_map(|pair| {
            pair.trim()
                .strip_prefix(SESSION_COOKIE)
                .and_then(|rest| rest.strip_prefix('='))
                .map(str::to_string)
        })
}

/// Authentication middleware.
///
/// Resolves the session token against the identity service and injects
/// [`OperatorAuth`] into the request extensions.
pub async fn auth_middleware<D, A, L>(
    State(state): State<ConsoleState<D, A, L>>,
    mut request: Request,
    next: Next,
) -> Response
where
    D: DirectoryProvider + 'static,
    A: AccountProvider + 'static,
    L: AuditLogger + 'static,
{
    let Some(token) = extract_session_token(request.headers()) else {
        return ConsoleError::Unauthorized.into_response();
    };

    match state.accounts.get_session(&token).await {
        Ok(Some(session)) => {
            request
                .extensions_mut()
                .insert(OperatorAuth::from_session(session));
            next.run(request).await
        }
        Ok(None) => ConsoleError::Unauthorized.into_response(),
        Err(err) => ConsoleError::from(err).into_response(),
    }
}

/// Middleware gating a router on the admin role.
///
/// Must run after [`auth_middleware`].
pub async fn require_admin(request: Request, next: Next) -> Response {
    match request.extensions().get::<OperatorAuth>() {
        Some(auth) if auth.is_admin() => next.run(request).await,
        Some(_) => ConsoleError::Forbidden(ADMIN_REQUIRED.to_string()).into_response(),
        None => ConsoleError::Unauthorized.into_response(),
    }
}

/// Axum extractor for [`OperatorAuth`].
///
/// Use this in handler functions to get the authenticated operator:
///
/// ```ignore
/// async fn handler(auth: OperatorAuth) -> impl IntoResponse {
///     // auth.user, auth.token, ...
/// }
/// ```
impl<S> FromRequestParts<S> for OperatorAuth
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Self>()
            .cloned()
            .ok_or((StatusCode::UNAUTHORIZED, "Not authenticated"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn admin_auth() -> OperatorAuth {
        OperatorAuth {
            user: UserRecord::new("u_ada").with_roles(Roles::from_csv("admin")),
            token: "tok".to_string(),
            impersonated_by: None,
        }
    }

    #[test]
    fn bearer_token_wins_over_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer tok_bearer"));
        headers.insert(
            COOKIE,
            HeaderValue::from_static("warden_session=tok_cookie"),
        );
        assert_eq!(
            extract_session_token(&headers).as_deref(),
            Some("tok_bearer")
        );
    }

    #[test]
    fn cookie_is_found_among_others() {
        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            HeaderValue::from_static("theme=dark; warden_session=tok_1; lang=en"),
        );
        assert_eq!(extract_session_token(&headers).as_deref(), Some("tok_1"));
    }

    #[test]
    fn missing_token_yields_none() {
        let headers = HeaderMap::new();
        assert_eq!(extract_session_token(&headers), None);

        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_static("theme=dark"));
        assert_eq!(extract_session_token(&headers), None);
    }

    #[test]
    fn admin_gate() {
        assert!(admin_auth().require_admin().is_ok());

        let plain = OperatorAuth {
            user: UserRecord::new("u_bob").with_roles(Roles::from_csv("user")),
            token: "tok".to_string(),
            impersonated_by: None,
        };
        let err = plain.require_admin().unwrap_err();
        assert_eq!(err.operator_message(), ADMIN_REQUIRED);
    }
}
