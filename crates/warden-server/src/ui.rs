//! HTML console pages.
//!
//! Server-rendered pages over the same provider seams as the JSON API:
//! sign-in, the user directory with per-row action forms, the
//! create-user form, and the account page with inline profile editing.
//! Failed actions come back as a flash message; successful saves on the
//! account page show a transient per-field status.

use askama::Template;
use axum::{
    extract::{Form, Path, Query, State},
    http::{header::SET_COOKIE, HeaderMap, StatusCode},
    response::{AppendHeaders, Html, IntoResponse, Redirect, Response},
    routing::{get, post},
    Router,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use url::form_urlencoded;

use warden_console::events::AuditLogger;
use warden_console::{
    extract_session_token, AuditEvent, AuditEventType, ChangePasswordRequest, CreateUserRequest,
    OperatorAuth, RoleName, SaveStatus, SetPasswordRequest, SetRoleRequest, SignInRequest,
    StatusBoard, UpdateProfileRequest, ADMIN_REQUIRED, SESSION_COOKIE,
};
use warden_model::UserRecord;
use warden_provider::account::AccountProvider;
use warden_provider::directory::DirectoryProvider;
use warden_provider::{SearchField, SortDirection, SortField, UserQuery};

use crate::state::AppState;

const SIGN_IN_PATH: &str = "/ui/sign-in";
const CONSOLE_PATH: &str = "/ui/console";
const ACCOUNT_PATH: &str = "/ui/account";
const CREATE_USER_PATH: &str = "/ui/console/users/new";

/// Page sizes offered by the directory page.
const PAGE_SIZES: [usize; 5] = [10, 20, 30, 40, 50];

// ============================================================================
// Templates
// ============================================================================

/// Sign-in page template.
#[derive(Template)]
#[template(path = "sign_in.html")]
pub struct SignInTemplate {
    /// Error message to display.
    pub error: Option<String>,
}

/// One row of the directory table, precomputed for display.
pub struct UserRow {
    /// Opaque identifier.
    pub id: String,
    /// Name shown in the row.
    pub display_name: String,
    /// Email or a dash.
    pub email: String,
    /// Avatar fallback initials.
    pub initials: String,
    /// Avatar URL, when set.
    pub image: Option<String>,
    /// Normalized role names; empty shows the default badge.
    pub roles: Vec<String>,
    /// Whether sign-in is blocked.
    pub banned: bool,
    /// Ban reason, when given.
    pub ban_reason: Option<String>,
    /// Formatted creation timestamp or a dash.
    pub created: String,
}

impl From<UserRecord> for UserRow {
    fn from(user: UserRecord) -> Self {
        Self {
            display_name: user.display_name().to_string(),
            email: user.email.clone().unwrap_or_else(|| "-".to_string()),
            initials: user.initials(),
            created: user
                .created_at
                .map(|t| t.format("%b %-d, %Y, %-I:%M %p").to_string())
                .unwrap_or_else(|| "-".to_string()),
            roles: user.role.as_slice().to_vec(),
            banned: user.banned,
            ban_reason: user.ban_reason,
            image: user.image,
            id: user.id,
        }
    }
}

/// One page-size choice in the selector.
pub struct PageSizeOption {
    /// The size.
    pub value: usize,
    /// Whether it is the current size.
    pub selected: bool,
}

/// Directory page template.
#[derive(Template)]
#[template(path = "console.html")]
pub struct ConsoleTemplate {
    /// Signed-in operator's display name.
    pub operator_name: String,
    /// Set while the operator is impersonating another account.
    pub impersonating: bool,
    /// Whether the operator lacks the admin role.
    pub not_admin: bool,
    /// Rows of the current page.
    pub users: Vec<UserRow>,
    /// Total number of matching records.
    pub total: usize,
    /// Current search value.
    pub search_value: String,
    /// Current search field wire name.
    pub search_field: String,
    /// Current page size.
    pub limit: usize,
    /// Offered page sizes.
    pub page_sizes: Vec<PageSizeOption>,
    /// URL of the previous page, when one exists.
    pub prev_url: Option<String>,
    /// URL of the next page, when one exists.
    pub next_url: Option<String>,
    /// Success flash message.
    pub notice: Option<String>,
    /// Error flash message.
    pub error: Option<String>,
}

/// Create-user page template.
#[derive(Template)]
#[template(path = "create_user.html")]
pub struct CreateUserTemplate {
    /// Error message to display.
    pub error: Option<String>,
}

/// Per-field note on the account page.
pub struct FieldNote {
    /// Message beside the field, when one is showing.
    pub message: Option<String>,
    /// Whether the note reports a failure.
    pub is_error: bool,
}

impl FieldNote {
    fn from_board(board: &StatusBoard, field: &str, now: DateTime<Utc>) -> Self {
        let (status, message) = board.current(field, now);
        Self {
            message: message.map(str::to_string),
            is_error: status == SaveStatus::Error,
        }
    }
}

/// Account page template.
#[derive(Template)]
#[template(path = "account.html")]
pub struct AccountTemplate {
    /// Current display name.
    pub name: String,
    /// Email or a dash.
    pub email: String,
    /// Avatar fallback initials.
    pub initials: String,
    /// Avatar URL, when set.
    pub image: Option<String>,
    /// Set while the operator is impersonating another account.
    pub impersonating: bool,
    /// Whether the operator may open the directory.
    pub is_admin: bool,
    /// Status note for the name field.
    pub name_note: FieldNote,
    /// Status note for the avatar field.
    pub image_note: FieldNote,
    /// Status note for the password form.
    pub password_note: FieldNote,
}

/// Error page template.
#[derive(Template)]
#[template(path = "error.html")]
pub struct ErrorTemplate {
    /// Error headline.
    pub error: String,
    /// Error description.
    pub error_description: Option<String>,
}

// ============================================================================
// Helpers
// ============================================================================

fn render<T: Template>(template: T) -> Response {
    match template.render() {
        Ok(html) => Html(html).into_response(),
        Err(e) => {
            tracing::error!("Template render error: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Template error").into_response()
        }
    }
}

fn render_error(status: StatusCode, error: &str, description: Option<&str>) -> Response {
    let template = ErrorTemplate {
        error: error.to_string(),
        error_description: description.map(String::from),
    };
    match template.render() {
        Ok(html) => (status, Html(html)).into_response(),
        Err(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Template error").into_response(),
    }
}

/// Builds a path with urlencoded query parameters.
fn with_params(path: &str, params: &[(&str, &str)]) -> String {
    if params.is_empty() {
        return path.to_string();
    }
    let query: String = form_urlencoded::Serializer::new(String::new())
        .extend_pairs(params)
        .finish();
    format!("{path}?{query}")
}

fn set_session_cookie(token: &str) -> String {
    format!("{SESSION_COOKIE}={token}; Path=/; HttpOnly; SameSite=Lax")
}

fn clear_session_cookie() -> String {
    format!("{SESSION_COOKIE}=; Path=/; HttpOnly; Max-Age=0")
}

fn redirect_with_cookie(cookie: String, path: &str) -> Response {
    (AppendHeaders([(SET_COOKIE, cookie)]), Redirect::to(path)).into_response()
}

async fn record<L: AuditLogger>(audit: &L, event: AuditEvent) {
    if let Err(err) = audit.log(event).await {
        tracing::warn!(error = %err, "failed to record audit event");
    }
}

/// Resolves the session cookie to an operator, redirecting to the
/// sign-in page when there is none.
async fn operator<D, A, L>(
    state: &AppState<D, A, L>,
    headers: &HeaderMap,
) -> Result<OperatorAuth, Response>
where
    D: DirectoryProvider,
    A: AccountProvider,
    L: AuditLogger,
{
    let Some(token) = extract_session_token(headers) else {
        return Err(Redirect::to(SIGN_IN_PATH).into_response());
    };
    match state.console.accounts.get_session(&token).await {
        Ok(Some(session)) => Ok(OperatorAuth::from_session(session)),
        Ok(None) => Err(Redirect::to(SIGN_IN_PATH).into_response()),
        Err(err) => {
            tracing::warn!(error = %err, "session lookup failed");
            Err(render_error(
                StatusCode::BAD_GATEWAY,
                "Console unavailable",
                Some(err.message()),
            ))
        }
    }
}

/// Redirects a directory action back to the console with an error
/// flash when the operator lacks the admin role.
fn admin_gate(auth: &OperatorAuth) -> Result<(), Response> {
    if auth.is_admin() {
        Ok(())
    } else {
        Err(Redirect::to(&with_params(CONSOLE_PATH, &[("error", ADMIN_REQUIRED)])).into_response())
    }
}

// ============================================================================
// Sign-in / Sign-out
// ============================================================================

/// Query parameters of the sign-in page.
#[derive(Debug, Deserialize)]
pub struct SignInPageQuery {
    /// Flash error message.
    pub error: Option<String>,
}

/// Form data for sign-in.
#[derive(Debug, Deserialize)]
pub struct SignInForm {
    /// Email address.
    #[serde(default)]
    pub email: String,
    /// Password.
    #[serde(default)]
    pub password: String,
}

/// Shows the sign-in page.
pub async fn sign_in_page(Query(query): Query<SignInPageQuery>) -> Response {
    render(SignInTemplate { error: query.error })
}

/// Handles sign-in form submission.
pub async fn sign_in_submit<D, A, L>(
    State(state): State<AppState<D, A, L>>,
    Form(form): Form<SignInForm>,
) -> Response
where
    D: DirectoryProvider,
    A: AccountProvider,
    L: AuditLogger,
{
    let request = SignInRequest {
        email: form.email,
        password: form.password,
    };
    let (email, password) = match request.into_credentials() {
        Ok(parts) => parts,
        Err(err) => {
            return Redirect::to(&with_params(
                SIGN_IN_PATH,
                &[("error", err.operator_message())],
            ))
            .into_response();
        }
    };

    match state.console.accounts.sign_in(&email, &password).await {
        Ok(session) => {
            record(
                state.console.audit.as_ref(),
                AuditEvent::builder(AuditEventType::SignedIn)
                    .target(session.user.id.clone())
                    .build(),
            )
            .await;
            let destination = if session.user.is_admin() {
                CONSOLE_PATH
            } else {
                ACCOUNT_PATH
            };
            redirect_with_cookie(set_session_cookie(&session.session.token), destination)
        }
        Err(err) => {
            record(
                state.console.audit.as_ref(),
                AuditEvent::builder(AuditEventType::SignedIn)
                    .detail("email", email)
                    .failure(err.message())
                    .build(),
            )
            .await;
            Redirect::to(&with_params(SIGN_IN_PATH, &[("error", err.message())])).into_response()
        }
    }
}

/// Handles sign-out.
pub async fn sign_out_submit<D, A, L>(
    State(state): State<AppState<D, A, L>>,
    headers: HeaderMap,
) -> Response
where
    D: DirectoryProvider,
    A: AccountProvider,
    L: AuditLogger,
{
    if let Some(token) = extract_session_token(&headers) {
        if let Err(err) = state.console.accounts.sign_out(&token).await {
            tracing::debug!(error = %err, "sign-out call failed");
        }
        record(
            state.console.audit.as_ref(),
            AuditEvent::builder(AuditEventType::SignedOut).build(),
        )
        .await;
    }
    redirect_with_cookie(clear_session_cookie(), SIGN_IN_PATH)
}

// ============================================================================
// Directory Page
// ============================================================================

/// Query parameters of the directory page.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsolePageQuery {
    /// Free-text search value.
    pub search_value: Option<String>,
    /// Field the search runs against.
    pub search_field: Option<SearchField>,
    /// Sort key.
    pub sort_by: Option<SortField>,
    /// Sort direction.
    pub sort_direction: Option<SortDirection>,
    /// Page size.
    pub limit: Option<usize>,
    /// Offset of the first record.
    pub offset: Option<usize>,
    /// Equality filter on the banned flag.
    pub banned: Option<bool>,
    /// Success flash message.
    pub notice: Option<String>,
    /// Error flash message.
    pub error: Option<String>,
}

impl ConsolePageQuery {
    fn to_user_query(&self, default_limit: usize) -> UserQuery {
        let mut query = UserQuery::new().limit(self.limit.unwrap_or(default_limit));
        if let Some(value) = &self.search_value {
            query = query.search(value.clone());
        }
        if let Some(field) = self.search_field {
            query = query.search_field(field);
        }
        query = query.sort(
            self.sort_by.unwrap_or_default(),
            self.sort_direction.unwrap_or_default(),
        );
        if let Some(offset) = self.offset {
            query = query.offset(offset);
        }
        if let Some(banned) = self.banned {
            query = query.banned(banned);
        }
        query
    }

    /// Rebuilds the page URL for a different offset, preserving the
    /// search and sort state.
    fn page_url(&self, query: &UserQuery, offset: usize) -> String {
        let mut params: Vec<(&str, String)> = Vec::new();
        if let Some(value) = &query.search_value {
            params.push(("searchValue", value.clone()));
        }
        params.push(("searchField", query.search_field.as_str().to_string()));
        params.push(("sortBy", query.sort_by.as_str().to_string()));
        params.push(("sortDirection", query.sort_direction.as_str().to_string()));
        params.push(("limit", query.limit.to_string()));
        params.push(("offset", offset.to_string()));
        if let Some(banned) = query.banned {
            params.push(("banned", banned.to_string()));
        }
        let pairs: Vec<(&str, &str)> = params.iter().map(|(k, v)| (*k, v.as_str())).collect();
        with_params(CONSOLE_PATH, &pairs)
    }
}

/// Shows the directory page.
pub async fn console_page<D, A, L>(
    State(state): State<AppState<D, A, L>>,
    headers: HeaderMap,
    Query(page_query): Query<ConsolePageQuery>,
) -> Response
where
    D: DirectoryProvider,
    A: AccountProvider,
    L: AuditLogger,
{
    let auth = match operator(&state, &headers).await {
        Ok(auth) => auth,
        Err(redirect) => return redirect,
    };

    let query = page_query.to_user_query(state.config.default_page_size);

    // Non-admins see the page shell with a warning instead of data.
    let (users, total, prev_url, next_url, error) = if auth.is_admin() {
        match state.console.directory.list_users(&query).await {
            Ok(page) => (
                page.items
                    .iter()
                    .cloned()
                    .map(UserRow::from)
                    .collect::<Vec<_>>(),
                page.total,
                page.has_previous()
                    .then(|| page_query.page_url(&query, page.previous_offset())),
                page.has_next()
                    .then(|| page_query.page_url(&query, page.next_offset())),
                page_query.error.clone(),
            ),
            Err(err) => (
                Vec::new(),
                0,
                None,
                None,
                Some(err.message().to_string()),
            ),
        }
    } else {
        (Vec::new(), 0, None, None, page_query.error.clone())
    };

    render(ConsoleTemplate {
        operator_name: auth.user.display_name().to_string(),
        impersonating: auth.impersonated_by.is_some(),
        not_admin: !auth.is_admin(),
        users,
        total,
        search_value: query.search_value.clone().unwrap_or_default(),
        search_field: query.search_field.as_str().to_string(),
        limit: query.limit,
        page_sizes: PAGE_SIZES
            .iter()
            .map(|&value| PageSizeOption {
                value,
                selected: value == query.limit,
            })
            .collect(),
        prev_url,
        next_url,
        notice: page_query.notice,
        error,
    })
}

// ============================================================================
// Directory Actions
// ============================================================================

fn console_notice(notice: &str) -> Response {
    Redirect::to(&with_params(CONSOLE_PATH, &[("notice", notice)])).into_response()
}

fn console_error(message: &str) -> Response {
    Redirect::to(&with_params(CONSOLE_PATH, &[("error", message)])).into_response()
}

/// Form data for creating a user.
#[derive(Debug, Deserialize)]
pub struct CreateUserForm {
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Email address.
    #[serde(default)]
    pub email: String,
    /// Initial password.
    #[serde(default)]
    pub password: String,
    /// Password confirmation.
    #[serde(default)]
    pub confirm_password: String,
    /// Initial role.
    #[serde(default)]
    pub role: RoleName,
}

/// Shows the create-user page.
pub async fn create_user_page<D, A, L>(
    State(state): State<AppState<D, A, L>>,
    headers: HeaderMap,
    Query(query): Query<SignInPageQuery>,
) -> Response
where
    D: DirectoryProvider,
    A: AccountProvider,
    L: AuditLogger,
{
    let auth = match operator(&state, &headers).await {
        Ok(auth) => auth,
        Err(redirect) => return redirect,
    };
    if let Err(redirect) = admin_gate(&auth) {
        return redirect;
    }
    render(CreateUserTemplate { error: query.error })
}

/// Handles create-user form submission.
pub async fn create_user_submit<D, A, L>(
    State(state): State<AppState<D, A, L>>,
    headers: HeaderMap,
    Form(form): Form<CreateUserForm>,
) -> Response
where
    D: DirectoryProvider,
    A: AccountProvider,
    L: AuditLogger,
{
    let auth = match operator(&state, &headers).await {
        Ok(auth) => auth,
        Err(redirect) => return redirect,
    };
    if let Err(redirect) = admin_gate(&auth) {
        return redirect;
    }

    let request = CreateUserRequest {
        name: form.name,
        email: form.email,
        password: form.password,
        confirm_password: form.confirm_password,
        role: form.role,
    };
    let new_user = match request.into_new_user() {
        Ok(new_user) => new_user,
        Err(err) => {
            return Redirect::to(&with_params(
                CREATE_USER_PATH,
                &[("error", err.operator_message())],
            ))
            .into_response();
        }
    };

    match state.console.directory.create_user(&new_user).await {
        Ok(user) => {
            record(
                state.console.audit.as_ref(),
                AuditEvent::builder(AuditEventType::UserCreated)
                    .operator(&auth)
                    .target(user.id)
                    .build(),
            )
            .await;
            console_notice("User created.")
        }
        Err(err) => Redirect::to(&with_params(
            CREATE_USER_PATH,
            &[("error", err.message())],
        ))
        .into_response(),
    }
}

/// Form data for the role action.
#[derive(Debug, Deserialize)]
pub struct RoleForm {
    /// Selected role.
    pub role: Option<RoleName>,
}

/// Handles the set-role form.
pub async fn set_role_submit<D, A, L>(
    State(state): State<AppState<D, A, L>>,
    headers: HeaderMap,
    Path(user_id): Path<String>,
    Form(form): Form<RoleForm>,
) -> Response
where
    D: DirectoryProvider,
    A: AccountProvider,
    L: AuditLogger,
{
    let auth = match operator(&state, &headers).await {
        Ok(auth) => auth,
        Err(redirect) => return redirect,
    };
    if let Err(redirect) = admin_gate(&auth) {
        return redirect;
    }

    let role = match (SetRoleRequest { role: form.role }).role() {
        Ok(role) => role,
        Err(err) => return console_error(err.operator_message()),
    };

    match state.console.directory.set_role(&user_id, role.as_str()).await {
        Ok(_) => {
            record(
                state.console.audit.as_ref(),
                AuditEvent::builder(AuditEventType::RoleAssigned)
                    .operator(&auth)
                    .target(user_id)
                    .detail("role", role.as_str())
                    .build(),
            )
            .await;
            console_notice("Role updated.")
        }
        Err(err) => console_error(err.message()),
    }
}

/// Form data for the password-reset action.
#[derive(Debug, Deserialize)]
pub struct PasswordForm {
    /// New password.
    #[serde(default)]
    pub new_password: String,
    /// Password confirmation.
    #[serde(default)]
    pub confirm_password: String,
}

/// Handles the password-reset form.
pub async fn set_password_submit<D, A, L>(
    State(state): State<AppState<D, A, L>>,
    headers: HeaderMap,
    Path(user_id): Path<String>,
    Form(form): Form<PasswordForm>,
) -> Response
where
    D: DirectoryProvider,
    A: AccountProvider,
    L: AuditLogger,
{
    let auth = match operator(&state, &headers).await {
        Ok(auth) => auth,
        Err(redirect) => return redirect,
    };
    if let Err(redirect) = admin_gate(&auth) {
        return redirect;
    }

    let request = SetPasswordRequest {
        new_password: form.new_password,
        confirm_password: form.confirm_password,
    };
    let new_password = match request.into_password() {
        Ok(password) => password,
        Err(err) => return console_error(err.operator_message()),
    };

    match state
        .console
        .directory
        .set_password(&user_id, &new_password)
        .await
    {
        Ok(()) => {
            record(
                state.console.audit.as_ref(),
                AuditEvent::builder(AuditEventType::PasswordReset)
                    .operator(&auth)
                    .target(user_id)
                    .build(),
            )
            .await;
            console_notice("Password updated.")
        }
        Err(err) => console_error(err.message()),
    }
}

/// Form data for the ban action.
#[derive(Debug, Deserialize)]
pub struct BanForm {
    /// Reason shown to the user.
    #[serde(default)]
    pub ban_reason: String,
    /// Ban duration in seconds, blank for permanent.
    #[serde(default)]
    pub ban_expires_in: String,
}

/// Handles the ban form.
pub async fn ban_submit<D, A, L>(
    State(state): State<AppState<D, A, L>>,
    headers: HeaderMap,
    Path(user_id): Path<String>,
    Form(form): Form<BanForm>,
) -> Response
where
    D: DirectoryProvider,
    A: AccountProvider,
    L: AuditLogger,
{
    let auth = match operator(&state, &headers).await {
        Ok(auth) => auth,
        Err(redirect) => return redirect,
    };
    if let Err(redirect) = admin_gate(&auth) {
        return redirect;
    }

    let expires_in = match form.ban_expires_in.trim() {
        "" => None,
        raw => match raw.parse::<i64>() {
            Ok(secs) if secs > 0 => Some(secs),
            _ => return console_error("Ban duration must be a number of seconds."),
        },
    };
    let reason = {
        let trimmed = form.ban_reason.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    };

    match state
        .console
        .directory
        .ban_user(&user_id, reason.as_deref(), expires_in)
        .await
    {
        Ok(_) => {
            let mut event = AuditEvent::builder(AuditEventType::UserBanned)
                .operator(&auth)
                .target(user_id);
            if let Some(reason) = reason {
                event = event.detail("reason", reason);
            }
            record(state.console.audit.as_ref(), event.build()).await;
            console_notice("User banned.")
        }
        Err(err) => console_error(err.message()),
    }
}

/// Handles the unban form.
pub async fn unban_submit<D, A, L>(
    State(state): State<AppState<D, A, L>>,
    headers: HeaderMap,
    Path(user_id): Path<String>,
) -> Response
where
    D: DirectoryProvider,
    A: AccountProvider,
    L: AuditLogger,
{
    let auth = match operator(&state, &headers).await {
        Ok(auth) => auth,
        Err(redirect) => return redirect,
    };
    if let Err(redirect) = admin_gate(&auth) {
        return redirect;
    }

    match state.console.directory.unban_user(&user_id).await {
        Ok(_) => {
            record(
                state.console.audit.as_ref(),
                AuditEvent::builder(AuditEventType::UserUnbanned)
                    .operator(&auth)
                    .target(user_id)
                    .build(),
            )
            .await;
            console_notice("Ban removed.")
        }
        Err(err) => console_error(err.message()),
    }
}

/// Handles the revoke-sessions form.
pub async fn revoke_sessions_submit<D, A, L>(
    State(state): State<AppState<D, A, L>>,
    headers: HeaderMap,
    Path(user_id): Path<String>,
) -> Response
where
    D: DirectoryProvider,
    A: AccountProvider,
    L: AuditLogger,
{
    let auth = match operator(&state, &headers).await {
        Ok(auth) => auth,
        Err(redirect) => return redirect,
    };
    if let Err(redirect) = admin_gate(&auth) {
        return redirect;
    }

    match state.console.directory.revoke_sessions(&user_id).await {
        Ok(()) => {
            record(
                state.console.audit.as_ref(),
                AuditEvent::builder(AuditEventType::SessionsRevoked)
                    .operator(&auth)
                    .target(user_id)
                    .build(),
            )
            .await;
            console_notice("All sessions revoked.")
        }
        Err(err) => console_error(err.message()),
    }
}

/// Handles the impersonate form. On success the console switches to the
/// minted session and lands on the account page as the target user.
pub async fn impersonate_submit<D, A, L>(
    State(state): State<AppState<D, A, L>>,
    headers: HeaderMap,
    Path(user_id): Path<String>,
) -> Response
where
    D: DirectoryProvider,
    A: AccountProvider,
    L: AuditLogger,
{
    let auth = match operator(&state, &headers).await {
        Ok(auth) => auth,
        Err(redirect) => return redirect,
    };
    if let Err(redirect) = admin_gate(&auth) {
        return redirect;
    }

    match state
        .console
        .directory
        .impersonate(&auth.token, &user_id)
        .await
    {
        Ok(session) => {
            record(
                state.console.audit.as_ref(),
                AuditEvent::builder(AuditEventType::ImpersonationStarted)
                    .operator(&auth)
                    .target(user_id)
                    .build(),
            )
            .await;
            redirect_with_cookie(set_session_cookie(&session.session.token), ACCOUNT_PATH)
        }
        Err(err) => console_error(err.message()),
    }
}

/// Handles the stop-impersonating form, restoring the operator's own
/// session.
pub async fn stop_impersonating_submit<D, A, L>(
    State(state): State<AppState<D, A, L>>,
    headers: HeaderMap,
) -> Response
where
    D: DirectoryProvider,
    A: AccountProvider,
    L: AuditLogger,
{
    let auth = match operator(&state, &headers).await {
        Ok(auth) => auth,
        Err(redirect) => return redirect,
    };

    match state.console.directory.stop_impersonating(&auth.token).await {
        Ok(session) => {
            record(
                state.console.audit.as_ref(),
                AuditEvent::builder(AuditEventType::ImpersonationStopped)
                    .operator(&auth)
                    .build(),
            )
            .await;
            redirect_with_cookie(set_session_cookie(&session.session.token), CONSOLE_PATH)
        }
        Err(err) => console_error(err.message()),
    }
}

/// Handles the remove-user form.
pub async fn remove_user_submit<D, A, L>(
    State(state): State<AppState<D, A, L>>,
    headers: HeaderMap,
    Path(user_id): Path<String>,
) -> Response
where
    D: DirectoryProvider,
    A: AccountProvider,
    L: AuditLogger,
{
    let auth = match operator(&state, &headers).await {
        Ok(auth) => auth,
        Err(redirect) => return redirect,
    };
    if let Err(redirect) = admin_gate(&auth) {
        return redirect;
    }

    match state.console.directory.remove_user(&user_id).await {
        Ok(()) => {
            record(
                state.console.audit.as_ref(),
                AuditEvent::builder(AuditEventType::UserRemoved)
                    .operator(&auth)
                    .target(user_id)
                    .build(),
            )
            .await;
            console_notice("User removed.")
        }
        Err(err) => console_error(err.message()),
    }
}

// ============================================================================
// Account Page
// ============================================================================

/// Query parameters of the account page.
#[derive(Debug, Default, Deserialize)]
pub struct AccountPageQuery {
    /// Field that was just saved.
    pub saved: Option<String>,
    /// Millisecond timestamp of the save, for the transient status.
    pub at: Option<i64>,
    /// Field whose save failed.
    pub field: Option<String>,
    /// Failure message for that field.
    pub message: Option<String>,
}

fn saved_message(field: &str) -> &'static str {
    match field {
        "password" => "Password updated.",
        _ => "Saved.",
    }
}

/// Shows the account page.
pub async fn account_page<D, A, L>(
    State(state): State<AppState<D, A, L>>,
    headers: HeaderMap,
    Query(query): Query<AccountPageQuery>,
) -> Response
where
    D: DirectoryProvider,
    A: AccountProvider,
    L: AuditLogger,
{
    let auth = match operator(&state, &headers).await {
        Ok(auth) => auth,
        Err(redirect) => return redirect,
    };

    let now = Utc::now();
    let mut board = StatusBoard::new();
    if let (Some(field), Some(at)) = (&query.saved, query.at) {
        if let Some(at) = DateTime::from_timestamp_millis(at) {
            board.saved(field.clone(), saved_message(field), at);
        }
    }
    if let (Some(field), Some(message)) = (&query.field, &query.message) {
        board.failed(field.clone(), message.clone(), now);
    }

    render(AccountTemplate {
        name: auth.user.name.clone().unwrap_or_default(),
        email: auth.user.email.clone().unwrap_or_else(|| "-".to_string()),
        initials: auth.user.initials(),
        image: auth.user.image.clone(),
        impersonating: auth.impersonated_by.is_some(),
        is_admin: auth.is_admin(),
        name_note: FieldNote::from_board(&board, "name", now),
        image_note: FieldNote::from_board(&board, "image", now),
        password_note: FieldNote::from_board(&board, "password", now),
    })
}

fn account_saved(field: &str) -> Response {
    let at = Utc::now().timestamp_millis().to_string();
    Redirect::to(&with_params(
        ACCOUNT_PATH,
        &[("saved", field), ("at", &at)],
    ))
    .into_response()
}

fn account_failed(field: &str, message: &str) -> Response {
    Redirect::to(&with_params(
        ACCOUNT_PATH,
        &[("field", field), ("message", message)],
    ))
    .into_response()
}

/// Form data for the name field.
#[derive(Debug, Deserialize)]
pub struct NameForm {
    /// New display name.
    #[serde(default)]
    pub name: String,
}

/// Handles the name field save.
pub async fn account_name_submit<D, A, L>(
    State(state): State<AppState<D, A, L>>,
    headers: HeaderMap,
    Form(form): Form<NameForm>,
) -> Response
where
    D: DirectoryProvider,
    A: AccountProvider,
    L: AuditLogger,
{
    let auth = match operator(&state, &headers).await {
        Ok(auth) => auth,
        Err(redirect) => return redirect,
    };

    let request = UpdateProfileRequest {
        name: Some(form.name),
        image: None,
    };
    let update = match request.into_update() {
        Ok(update) => update,
        Err(err) => return account_failed("name", err.operator_message()),
    };

    match state
        .console
        .accounts
        .update_profile(&auth.token, &update)
        .await
    {
        Ok(_) => {
            record(
                state.console.audit.as_ref(),
                AuditEvent::builder(AuditEventType::ProfileUpdated)
                    .operator(&auth)
                    .target(auth.user.id.clone())
                    .detail("field", "name")
                    .build(),
            )
            .await;
            account_saved("name")
        }
        Err(err) => account_failed("name", err.message()),
    }
}

/// Form data for the avatar field.
#[derive(Debug, Deserialize)]
pub struct AvatarForm {
    /// Avatar URL or data URI; blank clears it.
    #[serde(default)]
    pub image: String,
}

/// Handles the avatar field save.
pub async fn account_avatar_submit<D, A, L>(
    State(state): State<AppState<D, A, L>>,
    headers: HeaderMap,
    Form(form): Form<AvatarForm>,
) -> Response
where
    D: DirectoryProvider,
    A: AccountProvider,
    L: AuditLogger,
{
    let auth = match operator(&state, &headers).await {
        Ok(auth) => auth,
        Err(redirect) => return redirect,
    };

    let trimmed = form.image.trim();
    let update = warden_provider::account::ProfileUpdate::new()
        .image((!trimmed.is_empty()).then(|| trimmed.to_string()));

    match state
        .console
        .accounts
        .update_profile(&auth.token, &update)
        .await
    {
        Ok(_) => {
            record(
                state.console.audit.as_ref(),
                AuditEvent::builder(AuditEventType::ProfileUpdated)
                    .operator(&auth)
                    .target(auth.user.id.clone())
                    .detail("field", "image")
                    .build(),
            )
            .await;
            account_saved("image")
        }
        Err(err) => account_failed("image", err.message()),
    }
}

/// Form data for the password form.
#[derive(Debug, Deserialize)]
pub struct AccountPasswordForm {
    /// Current password.
    #[serde(default)]
    pub current_password: String,
    /// New password.
    #[serde(default)]
    pub new_password: String,
    /// Password confirmation.
    #[serde(default)]
    pub confirm_password: String,
}

/// Handles the change-password form.
pub async fn account_password_submit<D, A, L>(
    State(state): State<AppState<D, A, L>>,
    headers: HeaderMap,
    Form(form): Form<AccountPasswordForm>,
) -> Response
where
    D: DirectoryProvider,
    A: AccountProvider,
    L: AuditLogger,
{
    let auth = match operator(&state, &headers).await {
        Ok(auth) => auth,
        Err(redirect) => return redirect,
    };

    let request = ChangePasswordRequest {
        current_password: form.current_password,
        new_password: form.new_password,
        confirm_password: form.confirm_password,
        revoke_other_sessions: false,
    };
    if let Err(err) = request.validate() {
        return account_failed("password", err.operator_message());
    }

    match state
        .console
        .accounts
        .change_password(
            &auth.token,
            &request.current_password,
            &request.new_password,
            request.revoke_other_sessions,
        )
        .await
    {
        Ok(()) => {
            record(
                state.console.audit.as_ref(),
                AuditEvent::builder(AuditEventType::PasswordChanged)
                    .operator(&auth)
                    .target(auth.user.id.clone())
                    .build(),
            )
            .await;
            account_saved("password")
        }
        Err(err) => account_failed("password", err.message()),
    }
}

// ============================================================================
// Router
// ============================================================================

/// Creates the HTML page router.
pub fn ui_router<D, A, L>() -> Router<AppState<D, A, L>>
where
    D: DirectoryProvider + 'static,
    A: AccountProvider + 'static,
    L: AuditLogger + 'static,
{
    Router::new()
        .route(
            "/ui/sign-in",
            get(sign_in_page).post(sign_in_submit::<D, A, L>),
        )
        .route("/ui/sign-out", post(sign_out_submit::<D, A, L>))
        .route("/ui/console", get(console_page::<D, A, L>))
        .route(
            "/ui/console/users/new",
            get(create_user_page::<D, A, L>).post(create_user_submit::<D, A, L>),
        )
        .route(
            "/ui/console/users/{id}/role",
            post(set_role_submit::<D, A, L>),
        )
        .route(
            "/ui/console/users/{id}/password",
            post(set_password_submit::<D, A, L>),
        )
        .route("/ui/console/users/{id}/ban", post(ban_submit::<D, A, L>))
        .route(
            "/ui/console/users/{id}/unban",
            post(unban_submit::<D, A, L>),
        )
        .route(
            "/ui/console/users/{id}/revoke-sessions",
            post(revoke_sessions_submit::<D, A, L>),
        )
        .route(
            "/ui/console/users/{id}/impersonate",
            post(impersonate_submit::<D, A, L>),
        )
        .route(
            "/ui/impersonation/stop",
            post(stop_impersonating_submit::<D, A, L>),
        )
        .route(
            "/ui/console/users/{id}/remove",
            post(remove_user_submit::<D, A, L>),
        )
        .route("/ui/account", get(account_page::<D, A, L>))
        .route(
            "/ui/account/name",
            post(account_name_submit::<D, A, L>),
        )
        .route(
            "/ui/account/avatar",
            post(account_avatar_submit::<D, A, L>),
        )
        .route(
            "/ui/account/password",
            post(account_password_submit::<D, A, L>),
        )
}
