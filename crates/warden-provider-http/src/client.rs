//! HTTP client for the remote identity service.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use url::Url;
use warden_model::{OperatorSession, Page, UserRecord};
use warden_provider::account::{AccountProvider, ProfileUpdate, SignUp};
use warden_provider::directory::{DirectoryProvider, NewUser};
use warden_provider::{ProviderError, ProviderResult, UserQuery};

use crate::wire::{
    BanBody, ChangePasswordBody, CreateUserBody, ErrorBody, ListUsersResponse, SessionEnvelope,
    SetPasswordBody, SetRoleBody, SignInBody, SignUpBody, TokenEnvelope, UpdateUserBody,
    UserEnvelope, UserIdBody,
};

/// Remote endpoints, relative to the service base URL.
mod endpoints {
    pub const LIST_USERS: &str = "admin/list-users";
    pub const CREATE_USER: &str = "admin/create-user";
    pub const SET_ROLE: &str = "admin/set-role";
    pub const SET_USER_PASSWORD: &str = "admin/set-user-password";
    pub const BAN_USER: &str = "admin/ban-user";
    pub const UNBAN_USER: &str = "admin/unban-user";
    pub const REVOKE_USER_SESSIONS: &str = "admin/revoke-user-sessions";
    pub const IMPERSONATE_USER: &str = "admin/impersonate-user";
    pub const STOP_IMPERSONATING: &str = "admin/stop-impersonating";
    pub const REMOVE_USER: &str = "admin/remove-user";
    pub const SIGN_UP: &str = "sign-up/email";
    pub const SIGN_IN: &str = "sign-in/email";
    pub const SIGN_OUT: &str = "sign-out";
    pub const GET_SESSION: &str = "get-session";
    pub const UPDATE_USER: &str = "update-user";
    pub const CHANGE_PASSWORD: &str = "change-password";
}

fn with_trailing_slash(mut base: Url) -> Url {
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    base
}

/// Provider backed by the remote service's REST endpoints.
///
/// Administrative calls carry the service key as a bearer token;
/// session-scoped calls carry the operator's own token instead.
#[derive(Debug, Clone)]
pub struct HttpProvider {
    http: Client,
    base_url: Url,
    service_key: String,
}

impl HttpProvider {
    /// Creates a provider for the service at `base_url`.
    #[must_use]
    pub fn new(base_url: Url, service_key: impl Into<String>) -> Self {
        Self::with_client(Client::new(), base_url, service_key)
    }

    /// Creates a provider reusing an existing HTTP client.
    #[must_use]
    pub fn with_client(http: Client, base_url: Url, service_key: impl Into<String>) -> Self {
        Self {
            http,
            base_url: with_trailing_slash(base_url),
            service_key: service_key.into(),
        }
    }

    fn endpoint(&self, path: &str) -> ProviderResult<Url> {
        self.base_url
            .join(path)
            .map_err(|e| ProviderError::Transport(format!("invalid endpoint {path}: {e}")))
    }

    /// POST with service-key authentication.
    fn admin_post(&self, url: Url) -> RequestBuilder {
        self.http.post(url).bearer_auth(&self.service_key)
    }

    /// Request authenticated as the operator.
    fn session_request(&self, builder: RequestBuilder, token: &str) -> RequestBuilder {
        builder.bearer_auth(token)
    }

    async fn send(&self, request: RequestBuilder) -> ProviderResult<Response> {
        request
            .send()
            .await
            .map_err(|e| ProviderError::Transport(e.to_string()))
    }
}

async fn api_error(response: Response) -> ProviderError {
    let status = response.status().as_u16();
    let body: ErrorBody = response.json().await.unwrap_or_default();
    ProviderError::api(status, body.code, body.message)
}

async fn decode<T: DeserializeOwned>(response: Response) -> ProviderResult<T> {
    if !response.status().is_success() {
        return Err(api_error(response).await);
    }
    response
        .json()
        .await
        .map_err(|e| ProviderError::Decode(e.to_string()))
}

async fn expect_success(response: Response) -> ProviderResult<()> {
    if response.status().is_success() {
        Ok(())
    } else {
        Err(api_error(response).await)
    }
}

#[async_trait]
impl DirectoryProvider for HttpProvider {
    async fn list_users(&self, query: &UserQuery) -> ProviderResult<Page<UserRecord>> {
        let mut url = self.endpoint(endpoints::LIST_USERS)?;
        {
            let mut pairs = url.query_pairs_mut();
            if let Some(value) = &query.search_value {
                pairs.append_pair("searchValue", value);
            }
            pairs.append_pair("searchField", query.search_field.as_str());
            pairs.append_pair("sortBy", query.sort_by.as_str());
            pairs.append_pair("sortDirection", query.sort_direction.as_str());
            pairs.append_pair("limit", &query.limit.to_string());
            pairs.append_pair("offset", &query.offset.to_string());
            if let Some(banned) = query.banned {
                pairs.append_pair("filterField", "banned");
                pairs.append_pair("filterOperator", "eq");
                pairs.append_pair("filterValue", if banned { "true" } else { "false" });
            }
        }

        let request = self.http.get(url).bearer_auth(&self.service_key);
        let response: ListUsersResponse = decode(self.send(request).await?).await?;
        Ok(response.into_page(query.limit, query.offset))
    }

    async fn create_user(&self, user: &NewUser) -> ProviderResult<UserRecord> {
        let url = self.endpoint(endpoints::CREATE_USER)?;
        let body = CreateUserBody {
            name: &user.name,
            email: &user.email,
            password: &user.password,
            role: user.role.as_deref(),
        };
        let envelope: UserEnvelope =
            decode(self.send(self.admin_post(url).json(&body)).await?).await?;
        Ok(envelope.user)
    }

    async fn set_role(&self, user_id: &str, role: &str) -> ProviderResult<UserRecord> {
        let url = self.endpoint(endpoints::SET_ROLE)?;
        let body = SetRoleBody { user_id, role };
        let envelope: UserEnvelope =
            decode(self.send(self.admin_post(url).json(&body)).await?).await?;
        Ok(envelope.user)
    }

    async fn set_password(&self, user_id: &str, new_password: &str) -> ProviderResult<()> {
        let url = self.endpoint(endpoints::SET_USER_PASSWORD)?;
        let body = SetPasswordBody {
            user_id,
            new_password,
        };
        expect_success(self.send(self.admin_post(url).json(&body)).await?).await
    }

    async fn ban_user(
        &self,
        user_id: &str,
        reason: Option<&str>,
        expires_in: Option<i64>,
    ) -> ProviderResult<UserRecord> {
        let url = self.endpoint(endpoints::BAN_USER)?;
        let body = BanBody {
            user_id,
            ban_reason: reason,
            ban_expires_in: expires_in,
        };
        let envelope: UserEnvelope =
            decode(self.send(self.admin_post(url).json(&body)).await?).await?;
        Ok(envelope.user)
    }

    async fn unban_user(&self, user_id: &str) -> ProviderResult<UserRecord> {
        let url = self.endpoint(endpoints::UNBAN_USER)?;
        let body = UserIdBody { user_id };
        let envelope: UserEnvelope =
            decode(self.send(self.admin_post(url).json(&body)).await?).await?;
        Ok(envelope.user)
    }

    async fn revoke_sessions(&self, user_id: &str) -> ProviderResult<()> {
        let url = self.endpoint(endpoints::REVOKE_USER_SESSIONS)?;
        let body = UserIdBody { user_id };
        expect_success(self.send(self.admin_post(url).json(&body)).await?).await
    }

    async fn impersonate(
        &self,
        operator_token: &str,
        user_id: &str,
    ) -> ProviderResult<OperatorSession> {
        let url = self.endpoint(endpoints::IMPERSONATE_USER)?;
        let body = UserIdBody { user_id };
        let request = self
            .session_request(self.http.post(url), operator_token)
            .json(&body);
        let envelope: SessionEnvelope = decode(self.send(request).await?).await?;
        Ok(envelope.into())
    }

    async fn stop_impersonating(&self, token: &str) -> ProviderResult<OperatorSession> {
        let url = self.endpoint(endpoints::STOP_IMPERSONATING)?;
        let request = self
            .session_request(self.http.post(url), token)
            .json(&serde_json::json!({}));
        let envelope: SessionEnvelope = decode(self.send(request).await?).await?;
        Ok(envelope.into())
    }

    async fn remove_user(&self, user_id: &str) -> ProviderResult<()> {
        let url = self.endpoint(endpoints::REMOVE_USER)?;
        let body = UserIdBody { user_id };
        expect_success(self.send(self.admin_post(url).json(&body)).await?).await
    }
}

#[async_trait]
impl AccountProvider for HttpProvider {
    async fn sign_up(&self, signup: &SignUp) -> ProviderResult<OperatorSession> {
        let url = self.endpoint(endpoints::SIGN_UP)?;
        let body = SignUpBody {
            name: &signup.name,
            email: &signup.email,
            password: &signup.password,
            image: signup.image.as_deref(),
        };
        let envelope: TokenEnvelope =
            decode(self.send(self.http.post(url).json(&body)).await?).await?;
        envelope.into_session()
    }

    async fn sign_in(&self, email: &str, password: &str) -> ProviderResult<OperatorSession> {
        let url = self.endpoint(endpoints::SIGN_IN)?;
        let body = SignInBody { email, password };
        let envelope: TokenEnvelope =
            decode(self.send(self.http.post(url).json(&body)).await?).await?;
        envelope.into_session()
    }

    async fn sign_out(&self, token: &str) -> ProviderResult<()> {
        let url = self.endpoint(endpoints::SIGN_OUT)?;
        let request = self
            .session_request(self.http.post(url), token)
            .json(&serde_json::json!({}));
        expect_success(self.send(request).await?).await
    }

    async fn get_session(&self, token: &str) -> ProviderResult<Option<OperatorSession>> {
        let url = self.endpoint(endpoints::GET_SESSION)?;
        let request = self.session_request(self.http.get(url), token);
        let response = self.send(request).await?;

        // An unknown or expired token is an absent session, not a fault.
        if response.status().as_u16() == 401 {
            return Ok(None);
        }
        let envelope: Option<SessionEnvelope> = decode(response).await?;
        Ok(envelope.map(Into::into))
    }

    async fn update_profile(
        &self,
        token: &str,
        update: &ProfileUpdate,
    ) -> ProviderResult<UserRecord> {
        let url = self.endpoint(endpoints::UPDATE_USER)?;
        let body = UpdateUserBody {
            name: update.name.clone(),
            image: update.image.clone(),
        };
        let request = self.session_request(self.http.post(url), token).json(&body);
        let envelope: UserEnvelope = decode(self.send(request).await?).await?;
        Ok(envelope.user)
    }

    async fn change_password(
        &self,
        token: &str,
        current_password: &str,
        new_password: &str,
        revoke_other_sessions: bool,
    ) -> ProviderResult<()> {
        let url = self.endpoint(endpoints::CHANGE_PASSWORD)?;
        let body = ChangePasswordBody {
            current_password,
            new_password,
            revoke_other_sessions,
        };
        let request = self.session_request(self.http.post(url), token).json(&body);
        expect_success(self.send(request).await?).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_gains_a_trailing_slash() {
        let base = Url::parse("https://auth.example.com/api/auth").unwrap();
        let provider = HttpProvider::new(base, "key");
        assert_eq!(
            provider.endpoint(endpoints::LIST_USERS).unwrap().as_str(),
            "https://auth.example.com/api/auth/admin/list-users"
        );
    }

    #[test]
    fn existing_trailing_slash_is_kept() {
        let base = Url::parse("https://auth.example.com/api/auth/").unwrap();
        let provider = HttpProvider::new(base, "key");
        assert_eq!(
            provider.endpoint(endpoints::GET_SESSION).unwrap().as_str(),
            "https://auth.example.com/api/auth/get-session"
        );
    }
}
