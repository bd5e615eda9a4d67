//! In-memory provider for tests and local development.
//!
//! Implements both trait seams over process-local maps. The behavior
//! here documents the semantics the remote service is expected to
//! have: substring search on the selected field, stable sorting,
//! offset/limit slicing with the filtered count as the total, bans that
//! revoke sessions, and impersonation that restores the parent session.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;
use warden_model::{OperatorSession, Page, Roles, SessionHandle, UserRecord};

use crate::account::{AccountProvider, ProfileUpdate, SignUp};
use crate::directory::{DirectoryProvider, NewUser};
use crate::error::{ProviderError, ProviderResult};
use crate::query::{SearchField, SortDirection, SortField, UserQuery};

/// Lifetime of a regular session, in seconds.
const SESSION_TTL_SECS: i64 = 7 * 24 * 60 * 60;

/// Lifetime of an impersonation session, in seconds.
const IMPERSONATION_TTL_SECS: i64 = 60 * 60;

#[derive(Debug, Clone)]
struct StoredSession {
    user_id: String,
    expires_at: DateTime<Utc>,
    impersonated_by: Option<String>,
    parent_token: Option<String>,
}

#[derive(Debug, Default)]
struct State {
    users: Vec<UserRecord>,
    passwords: HashMap<String, String>,
    sessions: HashMap<String, StoredSession>,
    next_id: u64,
}

impl State {
    fn user(&self, id: &str) -> ProviderResult<&UserRecord> {
        self.users
            .iter()
            .find(|u| u.id == id)
            .ok_or_else(|| ProviderError::user_not_found(id))
    }

    fn user_mut(&mut self, id: &str) -> ProviderResult<&mut UserRecord> {
        self.users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or_else(|| ProviderError::user_not_found(id))
    }

    fn live_session(&self, token: &str) -> Option<&StoredSession> {
        self.sessions
            .get(token)
            .filter(|s| s.expires_at > Utc::now())
    }

    fn revoke_sessions_of(&mut self, user_id: &str) {
        self.sessions.retain(|_, s| s.user_id != user_id);
    }

    fn mint_session(
        &mut self,
        user_id: &str,
        ttl: Duration,
        impersonated_by: Option<String>,
        parent_token: Option<String>,
    ) -> SessionHandle {
        let token = Uuid::new_v4().simple().to_string();
        let expires_at = Utc::now() + ttl;
        self.sessions.insert(
            token.clone(),
            StoredSession {
                user_id: user_id.to_string(),
                expires_at,
                impersonated_by: impersonated_by.clone(),
                parent_token,
            },
        );
        let mut handle = SessionHandle::new(token).with_expires_at(expires_at);
        if let Some(operator_id) = impersonated_by {
            handle = handle.with_impersonated_by(operator_id);
        }
        handle
    }
}

/// Provider backed by process-local maps.
#[derive(Debug, Default)]
pub struct InMemoryProvider {
    state: RwLock<State>,
}

impl InMemoryProvider {
    /// Creates an empty provider.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a user directly, bypassing validation. Returns the
    /// assigned identifier.
    pub fn seed_user(&self, user: UserRecord, password: &str) -> String {
        let mut state = self.state.write().unwrap();
        state.next_id += 1;
        let mut user = user;
        if user.id.is_empty() {
            user.id = format!("usr_{}", state.next_id);
        }
        if user.created_at.is_none() {
            user.created_at = Some(Utc::now());
        }
        let id = user.id.clone();
        state.passwords.insert(id.clone(), password.to_string());
        state.users.push(user);
        id
    }

    /// Mints a session for an existing user and returns its token.
    pub fn seed_session(&self, user_id: &str) -> String {
        let mut state = self.state.write().unwrap();
        state
            .mint_session(user_id, Duration::seconds(SESSION_TTL_SECS), None, None)
            .token
    }

    /// Number of live sessions held for a user.
    #[must_use]
    pub fn session_count(&self, user_id: &str) -> usize {
        let state = self.state.read().unwrap();
        state
            .sessions
            .values()
            .filter(|s| s.user_id == user_id)
            .count()
    }
}

fn sort_key(user: &UserRecord, field: SortField) -> String {
    match field {
        SortField::Name => user.name.clone().unwrap_or_default().to_lowercase(),
        SortField::Email => user.email.clone().unwrap_or_default().to_lowercase(),
        SortField::CreatedAt => user
            .created_at
            .map(|t| t.to_rfc3339())
            .unwrap_or_default(),
    }
}

fn matches_search(user: &UserRecord, field: SearchField, needle: &str) -> bool {
    let haystack = match field {
        SearchField::Email => user.email.as_deref(),
        SearchField::Name => user.name.as_deref(),
    };
    haystack
        .map(|h| h.to_lowercase().contains(&needle.to_lowercase()))
        .unwrap_or(false)
}

#[async_trait]
impl DirectoryProvider for InMemoryProvider {
    async fn list_users(&self, query: &UserQuery) -> ProviderResult<Page<UserRecord>> {
        let state = self.state.read().unwrap();

        let mut matching: Vec<UserRecord> = state
            .users
            .iter()
            .filter(|u| query.banned.map_or(true, |b| u.banned == b))
            .filter(|u| {
                query
                    .search_value
                    .as_deref()
                    .map_or(true, |needle| matches_search(u, query.search_field, needle))
            })
            .cloned()
            .collect();

        matching.sort_by(|a, b| {
            let ordering = sort_key(a, query.sort_by).cmp(&sort_key(b, query.sort_by));
            match query.sort_direction {
                SortDirection::Asc => ordering,
                SortDirection::Desc => ordering.reverse(),
            }
        });

        let total = matching.len();
        let items: Vec<UserRecord> = matching
            .into_iter()
            .skip(query.offset)
            .take(query.limit)
            .collect();

        Ok(Page::new(items, total, query.limit, query.offset))
    }

    async fn create_user(&self, user: &NewUser) -> ProviderResult<UserRecord> {
        let mut state = self.state.write().unwrap();

        if state
            .users
            .iter()
            .any(|u| u.email.as_deref() == Some(user.email.as_str()))
        {
            return Err(ProviderError::conflict("User already exists."));
        }

        state.next_id += 1;
        let record = UserRecord::new(format!("usr_{}", state.next_id))
            .with_name(user.name.clone())
            .with_email(user.email.clone())
            .with_roles(
                user.role
                    .as_deref()
                    .map(Roles::from_csv)
                    .unwrap_or_default(),
            )
            .with_created_at(Utc::now());

        state
            .passwords
            .insert(record.id.clone(), user.password.clone());
        state.users.push(record.clone());
        Ok(record)
    }

    async fn set_role(&self, user_id: &str, role: &str) -> ProviderResult<UserRecord> {
        let mut state = self.state.write().unwrap();
        let user = state.user_mut(user_id)?;
        user.role = Roles::from_csv(role);
        Ok(user.clone())
    }

    async fn set_password(&self, user_id: &str, new_password: &str) -> ProviderResult<()> {
        let mut state = self.state.write().unwrap();
        state.user(user_id)?;
        state
            .passwords
            .insert(user_id.to_string(), new_password.to_string());
        Ok(())
    }

    async fn ban_user(
        &self,
        user_id: &str,
        reason: Option<&str>,
        expires_in: Option<i64>,
    ) -> ProviderResult<UserRecord> {
        let mut state = self.state.write().unwrap();
        let user = state.user_mut(user_id)?;
        user.banned = true;
        user.ban_reason = reason.map(str::to_string);
        user.ban_expires = expires_in.map(|secs| Utc::now() + Duration::seconds(secs));
        let updated = user.clone();
        state.revoke_sessions_of(user_id);
        Ok(updated)
    }

    async fn unban_user(&self, user_id: &str) -> ProviderResult<UserRecord> {
        let mut state = self.state.write().unwrap();
        let user = state.user_mut(user_id)?;
        user.banned = false;
        user.ban_reason = None;
        user.ban_expires = None;
        Ok(user.clone())
    }

    async fn revoke_sessions(&self, user_id: &str) -> ProviderResult<()> {
        let mut state = self.state.write().unwrap();
        state.user(user_id)?;
        state.revoke_sessions_of(user_id);
        Ok(())
    }

    async fn impersonate(
        &self,
        operator_token: &str,
        user_id: &str,
    ) -> ProviderResult<OperatorSession> {
        let mut state = self.state.write().unwrap();

        let operator_id = state
            .live_session(operator_token)
            .map(|s| s.user_id.clone())
            .ok_or_else(ProviderError::unauthorized)?;
        let target = state.user(user_id)?.clone();

        let handle = state.mint_session(
            user_id,
            Duration::seconds(IMPERSONATION_TTL_SECS),
            Some(operator_id),
            Some(operator_token.to_string()),
        );
        Ok(OperatorSession::new(target, handle))
    }

    async fn stop_impersonating(&self, token: &str) -> ProviderResult<OperatorSession> {
        let mut state = self.state.write().unwrap();

        let parent_token = state
            .live_session(token)
            .and_then(|s| s.parent_token.clone())
            .ok_or_else(|| ProviderError::invalid("Not an impersonation session."))?;
        state.sessions.remove(token);

        let parent = state
            .live_session(&parent_token)
            .cloned()
            .ok_or_else(ProviderError::unauthorized)?;
        let user = state.user(&parent.user_id)?.clone();
        Ok(OperatorSession::new(
            user,
            SessionHandle::new(parent_token).with_expires_at(parent.expires_at),
        ))
    }

    async fn remove_user(&self, user_id: &str) -> ProviderResult<()> {
        let mut state = self.state.write().unwrap();
        state.user(user_id)?;
        state.users.retain(|u| u.id != user_id);
        state.passwords.remove(user_id);
        state.revoke_sessions_of(user_id);
        Ok(())
    }
}

#[async_trait]
impl AccountProvider for InMemoryProvider {
    async fn sign_up(&self, signup: &SignUp) -> ProviderResult<OperatorSession> {
        let record = self
            .create_user(
                &NewUser::new(
                    signup.name.clone(),
                    signup.email.clone(),
                    signup.password.clone(),
                ),
            )
            .await?;

        let mut state = self.state.write().unwrap();
        if let Some(image) = &signup.image {
            state.user_mut(&record.id)?.image = Some(image.clone());
        }
        let user = state.user(&record.id)?.clone();
        let handle = state.mint_session(&record.id, Duration::seconds(SESSION_TTL_SECS), None, None);
        Ok(OperatorSession::new(user, handle))
    }

    async fn sign_in(&self, email: &str, password: &str) -> ProviderResult<OperatorSession> {
        let mut state = self.state.write().unwrap();

        let user = state
            .users
            .iter()
            .find(|u| u.email.as_deref() == Some(email))
            .cloned()
            .ok_or_else(|| {
                ProviderError::api(
                    401,
                    Some("INVALID_CREDENTIALS".to_string()),
                    Some("Invalid email or password.".to_string()),
                )
            })?;

        if state.passwords.get(&user.id).map(String::as_str) != Some(password) {
            return Err(ProviderError::api(
                401,
                Some("INVALID_CREDENTIALS".to_string()),
                Some("Invalid email or password.".to_string()),
            ));
        }

        if user.banned {
            return Err(ProviderError::api(
                403,
                Some("BANNED".to_string()),
                Some("This account has been banned.".to_string()),
            ));
        }

        let handle = state.mint_session(&user.id, Duration::seconds(SESSION_TTL_SECS), None, None);
        Ok(OperatorSession::new(user, handle))
    }

    async fn sign_out(&self, token: &str) -> ProviderResult<()> {
        let mut state = self.state.write().unwrap();
        state.sessions.remove(token);
        Ok(())
    }

    async fn get_session(&self, token: &str) -> ProviderResult<Option<OperatorSession>> {
        let state = self.state.read().unwrap();

        let Some(session) = state.live_session(token) else {
            return Ok(None);
        };
        let Ok(user) = state.user(&session.user_id) else {
            return Ok(None);
        };

        let mut handle = SessionHandle::new(token).with_expires_at(session.expires_at);
        if let Some(operator_id) = &session.impersonated_by {
            handle = handle.with_impersonated_by(operator_id.clone());
        }
        Ok(Some(OperatorSession::new(user.clone(), handle)))
    }

    async fn update_profile(
        &self,
        token: &str,
        update: &ProfileUpdate,
    ) -> ProviderResult<UserRecord> {
        let mut state = self.state.write().unwrap();

        let user_id = state
            .live_session(token)
            .map(|s| s.user_id.clone())
            .ok_or_else(ProviderError::unauthorized)?;

        let user = state.user_mut(&user_id)?;
        if let Some(name) = &update.name {
            user.name = Some(name.clone());
        }
        if let Some(image) = &update.image {
            user.image = image.clone();
        }
        Ok(user.clone())
    }

    async fn change_password(
        &self,
        token: &str,
        current_password: &str,
        new_password: &str,
        revoke_other_sessions: bool,
    ) -> ProviderResult<()> {
        let mut state = self.state.write().unwrap();

        let user_id = state
            .live_session(token)
            .map(|s| s.user_id.clone())
            .ok_or_else(ProviderError::unauthorized)?;

        if state.passwords.get(&user_id).map(String::as_str) != Some(current_password) {
            return Err(ProviderError::invalid("Current password is incorrect."));
        }

        state
            .passwords
            .insert(user_id.clone(), new_password.to_string());

        if revoke_other_sessions {
            state
                .sessions
                .retain(|t, s| s.user_id != user_id || t == token);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider_with_directory() -> InMemoryProvider {
        let provider = InMemoryProvider::new();
        provider.seed_user(
            UserRecord::new("u_ada")
                .with_name("Ada Lovelace")
                .with_email("ada@example.com")
                .with_roles(Roles::from_csv("admin")),
            "pw-ada",
        );
        provider.seed_user(
            UserRecord::new("u_bob")
                .with_name("Bob Martin")
                .with_email("bob@example.com"),
            "pw-bob",
        );
        provider.seed_user(
            UserRecord::new("u_eve")
                .with_name("Eve Moneypenny")
                .with_email("eve@example.com"),
            "pw-eve",
        );
        provider
    }

    #[tokio::test]
    async fn list_searches_the_selected_field() {
        let provider = provider_with_directory();

        let by_email = provider
            .list_users(&UserQuery::new().search("bob@"))
            .await
            .unwrap();
        assert_eq!(by_email.total, 1);
        assert_eq!(by_email.items[0].id, "u_bob");

        // The same needle misses when the search runs against names.
        let by_name = provider
            .list_users(&UserQuery::new().search("bob@").search_field(SearchField::Name))
            .await
            .unwrap();
        assert_eq!(by_name.total, 0);
    }

    #[tokio::test]
    async fn list_sorts_and_slices() {
        let provider = provider_with_directory();

        let page = provider
            .list_users(
                &UserQuery::new()
                    .sort(SortField::Name, SortDirection::Asc)
                    .limit(2),
            )
            .await
            .unwrap();
        assert_eq!(page.total, 3);
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.items[0].id, "u_ada");
        assert!(page.has_next());

        let rest = provider
            .list_users(
                &UserQuery::new()
                    .sort(SortField::Name, SortDirection::Asc)
                    .limit(2)
                    .offset(2),
            )
            .await
            .unwrap();
        assert_eq!(rest.items.len(), 1);
        assert_eq!(rest.items[0].id, "u_eve");
        assert!(!rest.has_next());
    }

    #[tokio::test]
    async fn list_filters_on_banned_flag() {
        let provider = provider_with_directory();
        provider.ban_user("u_bob", Some("spam"), None).await.unwrap();

        let banned = provider
            .list_users(&UserQuery::new().banned(true))
            .await
            .unwrap();
        assert_eq!(banned.total, 1);
        assert_eq!(banned.items[0].id, "u_bob");

        let active = provider
            .list_users(&UserQuery::new().banned(false))
            .await
            .unwrap();
        assert_eq!(active.total, 2);
    }

    #[tokio::test]
    async fn create_rejects_duplicate_email() {
        let provider = provider_with_directory();
        let err = provider
            .create_user(&NewUser::new("Ada Again", "ada@example.com", "pw"))
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(409));
        assert_eq!(err.message(), "User already exists.");
    }

    #[tokio::test]
    async fn ban_revokes_sessions_and_blocks_sign_in() {
        let provider = provider_with_directory();
        provider.seed_session("u_bob");
        assert_eq!(provider.session_count("u_bob"), 1);

        let banned = provider
            .ban_user("u_bob", Some("Spamming"), Some(3600))
            .await
            .unwrap();
        assert!(banned.banned);
        assert_eq!(banned.ban_reason.as_deref(), Some("Spamming"));
        assert!(banned.ban_expires.is_some());
        assert_eq!(provider.session_count("u_bob"), 0);

        let err = provider
            .sign_in("bob@example.com", "pw-bob")
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(403));

        provider.unban_user("u_bob").await.unwrap();
        assert!(provider.sign_in("bob@example.com", "pw-bob").await.is_ok());
    }

    #[tokio::test]
    async fn impersonation_round_trip() {
        let provider = provider_with_directory();
        let admin_token = provider.seed_session("u_ada");

        let impersonated = provider.impersonate(&admin_token, "u_bob").await.unwrap();
        assert_eq!(impersonated.user.id, "u_bob");
        assert_eq!(
            impersonated.session.impersonated_by.as_deref(),
            Some("u_ada")
        );

        // The impersonation token resolves to the target account.
        let session = provider
            .get_session(&impersonated.session.token)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(session.user.id, "u_bob");
        assert!(session.session.is_impersonated());

        let restored = provider
            .stop_impersonating(&impersonated.session.token)
            .await
            .unwrap();
        assert_eq!(restored.user.id, "u_ada");
        assert_eq!(restored.session.token, admin_token);

        let gone = provider
            .get_session(&impersonated.session.token)
            .await
            .unwrap();
        assert!(gone.is_none());
    }

    #[tokio::test]
    async fn stop_impersonating_rejects_plain_sessions() {
        let provider = provider_with_directory();
        let token = provider.seed_session("u_ada");
        let err = provider.stop_impersonating(&token).await.unwrap_err();
        assert_eq!(err.status(), Some(400));
    }

    #[tokio::test]
    async fn change_password_verifies_current_and_revokes_others() {
        let provider = provider_with_directory();
        let token = provider.seed_session("u_ada");
        let other = provider.seed_session("u_ada");

        let err = provider
            .change_password(&token, "wrong", "next", true)
            .await
            .unwrap_err();
        assert_eq!(err.message(), "Current password is incorrect.");

        provider
            .change_password(&token, "pw-ada", "next", true)
            .await
            .unwrap();
        assert!(provider.get_session(&token).await.unwrap().is_some());
        assert!(provider.get_session(&other).await.unwrap().is_none());
        assert!(provider.sign_in("ada@example.com", "next").await.is_ok());
    }

    #[tokio::test]
    async fn update_profile_applies_and_clears_fields() {
        let provider = provider_with_directory();
        let token = provider.seed_session("u_ada");

        let updated = provider
            .update_profile(
                &token,
                &ProfileUpdate::new()
                    .name("Ada L.")
                    .image(Some("data:image/png;base64,xyz".to_string())),
            )
            .await
            .unwrap();
        assert_eq!(updated.name.as_deref(), Some("Ada L."));
        assert!(updated.image.is_some());

        let cleared = provider
            .update_profile(&token, &ProfileUpdate::new().image(None))
            .await
            .unwrap();
        assert_eq!(cleared.name.as_deref(), Some("Ada L."));
        assert!(cleared.image.is_none());
    }

    #[tokio::test]
    async fn remove_user_drops_account_and_sessions() {
        let provider = provider_with_directory();
        provider.seed_session("u_eve");

        provider.remove_user("u_eve").await.unwrap();
        assert_eq!(provider.session_count("u_eve"), 0);
        let err = provider.remove_user("u_eve").await.unwrap_err();
        assert_eq!(err.status(), Some(404));
    }
}
