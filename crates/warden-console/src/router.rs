//! Console API router and handlers.
//!
//! Each handler validates its input, makes exactly one provider call,
//! records an audit event, and maps the result. Failures are never
//! retried and never fatal; the error contract lives in
//! [`crate::error`].

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, patch, post, put},
    Json, Router,
};
use warden_model::{OperatorSession, UserRecord};
use warden_provider::account::AccountProvider;
use warden_provider::directory::DirectoryProvider;

use crate::auth::OperatorAuth;
use crate::dto::{
    AccountResponse, BanUserRequest, ChangePasswordRequest, CreateUserRequest, DirectoryPage,
    DirectoryQuery, SetPasswordRequest, SetRoleRequest, SignInRequest, SignUpRequest,
    UpdateProfileRequest,
};
use crate::error::ConsoleResult;
use crate::events::{AuditEvent, AuditEventType, AuditLogger};
use crate::state::ConsoleState;

/// Records an event, logging sink failures instead of propagating them.
async fn record<L: AuditLogger>(audit: &L, event: AuditEvent) {
    if let Err(err) = audit.log(event).await {
        tracing::warn!(error = %err, "failed to record audit event");
    }
}

// ============================================================================
// Directory Handlers
// ============================================================================

/// GET /console/users - List/search the directory
async fn list_users<D, A, L>(
    State(state): State<ConsoleState<D, A, L>>,
    Query(query): Query<DirectoryQuery>,
) -> ConsoleResult<Json<DirectoryPage>>
where
    D: DirectoryProvider,
    A: AccountProvider,
    L: AuditLogger,
{
    let page = state.directory.list_users(&query.into_query()).await?;
    Ok(Json(DirectoryPage::from(page)))
}

/// POST /console/users - Create a user
async fn create_user<D, A, L>(
    State(state): State<ConsoleState<D, A, L>>,
    auth: OperatorAuth,
    Json(request): Json<CreateUserRequest>,
) -> ConsoleResult<impl IntoResponse>
where
    D: DirectoryProvider,
    A: AccountProvider,
    L: AuditLogger,
{
    let new_user = request.into_new_user()?;
    let role = new_user.role.clone().unwrap_or_default();
    let user = state.directory.create_user(&new_user).await?;

    record(
        state.audit.as_ref(),
        AuditEvent::builder(AuditEventType::UserCreated)
            .operator(&auth)
            .target(user.id.clone())
            .detail("role", role)
            .build(),
    )
    .await;

    Ok((StatusCode::CREATED, Json(user)))
}

/// PUT /console/users/{id}/role - Replace the role assignment
async fn set_role<D, A, L>(
    State(state): State<ConsoleState<D, A, L>>,
    auth: OperatorAuth,
    Path(user_id): Path<String>,
    Json(request): Json<SetRoleRequest>,
) -> ConsoleResult<Json<UserRecord>>
where
    D: DirectoryProvider,
    A: AccountProvider,
    L: AuditLogger,
{
    let role = request.role()?;
    let user = state.directory.set_role(&user_id, role.as_str()).await?;

    record(
        state.audit.as_ref(),
        AuditEvent::builder(AuditEventType::RoleAssigned)
            .operator(&auth)
            .target(user_id)
            .detail("role", role.as_str())
            .build(),
    )
    .await;

    Ok(Json(user))
}

/// PUT /console/users/{id}/password - Force a new password
async fn set_password<D, A, L>(
    State(state): State<ConsoleState<D, A, L>>,
    auth: OperatorAuth,
    Path(user_id): Path<String>,
    Json(request): Json<SetPasswordRequest>,
) -> ConsoleResult<StatusCode>
where
    D: DirectoryProvider,
    A: AccountProvider,
    L: AuditLogger,
{
    let new_password = request.into_password()?;
    state.directory.set_password(&user_id, &new_password).await?;

    record(
        state.audit.as_ref(),
        AuditEvent::builder(AuditEventType::PasswordReset)
            .operator(&auth)
            .target(user_id)
            .build(),
    )
    .await;

    Ok(StatusCode::NO_CONTENT)
}

/// POST /console/users/{id}/ban - Ban a user
async fn ban_user<D, A, L>(
    State(state): State<ConsoleState<D, A, L>>,
    auth: OperatorAuth,
    Path(user_id): Path<String>,
    Json(request): Json<BanUserRequest>,
) -> ConsoleResult<Json<UserRecord>>
where
    D: DirectoryProvider,
    A: AccountProvider,
    L: AuditLogger,
{
    let (reason, expires_in) = request.into_parts()?;
    let user = state
        .directory
        .ban_user(&user_id, reason.as_deref(), expires_in)
        .await?;

    let mut event = AuditEvent::builder(AuditEventType::UserBanned)
        .operator(&auth)
        .target(user_id);
    if let Some(reason) = reason {
        event = event.detail("reason", reason);
    }
    if let Some(expires_in) = expires_in {
        event = event.detail("expires_in", expires_in.to_string());
    }
    record(state.audit.as_ref(), event.build()).await;

    Ok(Json(user))
}

/// DELETE /console/users/{id}/ban - Lift a ban
async fn unban_user<D, A, L>(
    State(state): State<ConsoleState<D, A, L>>,
    auth: OperatorAuth,
    Path(user_id): Path<String>,
) -> ConsoleResult<Json<UserRecord>>
where
    D: DirectoryProvider,
    A: AccountProvider,
    L: AuditLogger,
{
    let user = state.directory.unban_user(&user_id).await?;

    record(
        state.audit.as_ref(),
        AuditEvent::builder(AuditEventType::UserUnbanned)
            .operator(&auth)
            .target(user_id)
            .build(),
    )
    .await;

    Ok(Json(user))
}

/// DELETE /console/users/{id}/sessions - Revoke all sessions
async fn revoke_sessions<D, A, L>(
    State(state): State<ConsoleState<D, A, L>>,
    auth: OperatorAuth,
    Path(user_id): Path<String>,
) -> ConsoleResult<StatusCode>
where
    D: DirectoryProvider,
    A: AccountProvider,
    L: AuditLogger,
{
    state.directory.revoke_sessions(&user_id).await?;

    record(
        state.audit.as_ref(),
        AuditEvent::builder(AuditEventType::SessionsRevoked)
            .operator(&auth)
            .target(user_id)
            .build(),
    )
    .await;

    Ok(StatusCode::NO_CONTENT)
}

/// POST /console/users/{id}/impersonate - Start impersonation
async fn impersonate<D, A, L>(
    State(state): State<ConsoleState<D, A, L>>,
    auth: OperatorAuth,
    Path(user_id): Path<String>,
) -> ConsoleResult<Json<OperatorSession>>
where
    D: DirectoryProvider,
    A: AccountProvider,
    L: AuditLogger,
{
    let session = state.directory.impersonate(&auth.token, &user_id).await?;

    record(
        state.audit.as_ref(),
        AuditEvent::builder(AuditEventType::ImpersonationStarted)
            .operator(&auth)
            .target(user_id)
            .build(),
    )
    .await;

    Ok(Json(session))
}

/// POST /console/impersonation/stop - End impersonation
async fn stop_impersonating<D, A, L>(
    State(state): State<ConsoleState<D, A, L>>,
    auth: OperatorAuth,
) -> ConsoleResult<Json<OperatorSession>>
where
    D: DirectoryProvider,
    A: AccountProvider,
    L: AuditLogger,
{
    let session = state.directory.stop_impersonating(&auth.token).await?;

    record(
        state.audit.as_ref(),
        AuditEvent::builder(AuditEventType::ImpersonationStopped)
            .operator(&auth)
            .target(auth.user.id.clone())
            .build(),
    )
    .await;

    Ok(Json(session))
}

/// DELETE /console/users/{id} - Remove an account
async fn remove_user<D, A, L>(
    State(state): State<ConsoleState<D, A, L>>,
    auth: OperatorAuth,
    Path(user_id): Path<String>,
) -> ConsoleResult<StatusCode>
where
    D: DirectoryProvider,
    A: AccountProvider,
    L: AuditLogger,
{
    state.directory.remove_user(&user_id).await?;

    record(
        state.audit.as_ref(),
        AuditEvent::builder(AuditEventType::UserRemoved)
            .operator(&auth)
            .target(user_id)
            .build(),
    )
    .await;

    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// Account Handlers
// ============================================================================

/// POST /account/sign-up - Self-service registration
async fn sign_up<D, A, L>(
    State(state): State<ConsoleState<D, A, L>>,
    Json(request): Json<SignUpRequest>,
) -> ConsoleResult<impl IntoResponse>
where
    D: DirectoryProvider,
    A: AccountProvider,
    L: AuditLogger,
{
    let signup = request.into_sign_up()?;
    let session = state.accounts.sign_up(&signup).await?;

    record(
        state.audit.as_ref(),
        AuditEvent::builder(AuditEventType::UserCreated)
            .target(session.user.id.clone())
            .detail("self_service", "true")
            .build(),
    )
    .await;

    Ok((StatusCode::CREATED, Json(session)))
}

/// POST /account/sign-in - Authenticate
async fn sign_in<D, A, L>(
    State(state): State<ConsoleState<D, A, L>>,
    Json(request): Json<SignInRequest>,
) -> ConsoleResult<Json<OperatorSession>>
where
    D: DirectoryProvider,
    A: AccountProvider,
    L: AuditLogger,
{
    let (email, password) = request.into_credentials()?;
    match state.accounts.sign_in(&email, &password).await {
        Ok(session) => {
            record(
                state.audit.as_ref(),
                AuditEvent::builder(AuditEventType::SignedIn)
                    .target(session.user.id.clone())
                    .build(),
            )
            .await;
            Ok(Json(session))
        }
        Err(err) => {
            record(
                state.audit.as_ref(),
                AuditEvent::builder(AuditEventType::SignedIn)
                    .detail("email", email)
                    .failure(err.message())
                    .build(),
            )
            .await;
            Err(err.into())
        }
    }
}

/// POST /account/sign-out - Invalidate the current session
async fn sign_out<D, A, L>(
    State(state): State<ConsoleState<D, A, L>>,
    auth: OperatorAuth,
) -> ConsoleResult<StatusCode>
where
    D: DirectoryProvider,
    A: AccountProvider,
    L: AuditLogger,
{
    state.accounts.sign_out(&auth.token).await?;

    record(
        state.audit.as_ref(),
        AuditEvent::builder(AuditEventType::SignedOut)
            .operator(&auth)
            .build(),
    )
    .await;

    Ok(StatusCode::NO_CONTENT)
}

/// GET /account - Current operator profile
async fn current_account(auth: OperatorAuth) -> Json<AccountResponse> {
    Json(AccountResponse {
        impersonated_by: auth.impersonated_by.clone(),
        user: auth.user,
    })
}

/// PATCH /account/profile - Update name and/or avatar
async fn update_profile<D, A, L>(
    State(state): State<ConsoleState<D, A, L>>,
    auth: OperatorAuth,
    Json(request): Json<UpdateProfileRequest>,
) -> ConsoleResult<Json<UserRecord>>
where
    D: DirectoryProvider,
    A: AccountProvider,
    L: AuditLogger,
{
    let update = request.into_update()?;
    let mut event = AuditEvent::builder(AuditEventType::ProfileUpdated)
        .operator(&auth)
        .target(auth.user.id.clone());
    if update.name.is_some() {
        event = event.detail("field", "name");
    }
    if let Some(image) = &update.image {
        event = event.detail(
            "field",
            if image.is_some() { "image" } else { "image_cleared" },
        );
    }

    let user = state.accounts.update_profile(&auth.token, &update).await?;
    record(state.audit.as_ref(), event.build()).await;
    Ok(Json(user))
}

/// POST /account/password - Change the operator's own password
async fn change_password<D, A, L>(
    State(state): State<ConsoleState<D, A, L>>,
    auth: OperatorAuth,
    Json(request): Json<ChangePasswordRequest>,
) -> ConsoleResult<StatusCode>
where
    D: DirectoryProvider,
    A: AccountProvider,
    L: AuditLogger,
{
    request.validate()?;
    state
        .accounts
        .change_password(
            &auth.token,
            &request.current_password,
            &request.new_password,
            request.revoke_other_sessions,
        )
        .await?;

    record(
        state.audit.as_ref(),
        AuditEvent::builder(AuditEventType::PasswordChanged)
            .operator(&auth)
            .target(auth.user.id.clone())
            .build(),
    )
    .await;

    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// Router Construction
// ============================================================================

/// Creates the directory router.
///
/// Compose it behind [`crate::auth::auth_middleware`] and
/// [`crate::auth::require_admin`]; every route expects an authenticated
/// admin.
///
/// # Routes
///
/// - `GET    /console/users` - List/search the directory
/// - `POST   /console/users` - Create a user
/// - `PUT    /console/users/{id}/role` - Replace the role assignment
/// - `PUT    /console/users/{id}/password` - Force a new password
/// - `POST   /console/users/{id}/ban` - Ban a user
/// - `DELETE /console/users/{id}/ban` - Lift a ban
/// - `DELETE /console/users/{id}/sessions` - Revoke all sessions
/// - `POST   /console/users/{id}/impersonate` - Start impersonation
/// - `DELETE /console/users/{id}` - Remove an account
pub fn directory_router<D, A, L>() -> Router<ConsoleState<D, A, L>>
where
    D: DirectoryProvider + 'static,
    A: AccountProvider + 'static,
    L: AuditLogger + 'static,
{
    Router::new()
        .route(
            "/console/users",
            get(list_users::<D, A, L>).post(create_user::<D, A, L>),
        )
        .route("/console/users/{id}/role", put(set_role::<D, A, L>))
        .route(
            "/console/users/{id}/password",
            put(set_password::<D, A, L>),
        )
        .route(
            "/console/users/{id}/ban",
            post(ban_user::<D, A, L>).delete(unban_user::<D, A, L>),
        )
        .route(
            "/console/users/{id}/sessions",
            delete(revoke_sessions::<D, A, L>),
        )
        .route(
            "/console/users/{id}/impersonate",
            post(impersonate::<D, A, L>),
        )
        .route("/console/users/{id}", delete(remove_user::<D, A, L>))
}

/// Creates the unauthenticated account router (sign-up, sign-in).
pub fn account_public_router<D, A, L>() -> Router<ConsoleState<D, A, L>>
where
    D: DirectoryProvider + 'static,
    A: AccountProvider + 'static,
    L: AuditLogger + 'static,
{
    Router::new()
        .route("/account/sign-up", post(sign_up::<D, A, L>))
        .route("/account/sign-in", post(sign_in::<D, A, L>))
}

/// Creates the session-scoped account router.
///
/// Compose it behind [`crate::auth::auth_middleware`]; no admin role is
/// required. Ending impersonation lives here because it runs on the
/// impersonated session, which does not carry the admin role.
///
/// # Routes
///
/// - `POST  /account/sign-out` - Invalidate the current session
/// - `GET   /account` - Current operator profile
/// - `PATCH /account/profile` - Update name and/or avatar
/// - `POST  /account/password` - Change the password
/// - `POST  /console/impersonation/stop` - End impersonation
pub fn account_router<D, A, L>() -> Router<ConsoleState<D, A, L>>
where
    D: DirectoryProvider + 'static,
    A: AccountProvider + 'static,
    L: AuditLogger + 'static,
{
    Router::new()
        .route("/account/sign-out", post(sign_out::<D, A, L>))
        .route("/account", get(current_account))
        .route("/account/profile", patch(update_profile::<D, A, L>))
        .route("/account/password", post(change_password::<D, A, L>))
        .route(
            "/console/impersonation/stop",
            post(stop_impersonating::<D, A, L>),
        )
}
