//! Directory API integration tests.

use serde_json::{json, Value};

use crate::common::TestEnv;

/// Tests that the directory rejects anonymous and non-admin callers.
#[tokio::test]
async fn test_directory_requires_admin() -> anyhow::Result<()> {
    let env = TestEnv::new().await?;

    // Anonymous
    let response = env.client.get(env.url("/console/users")).send().await?;
    assert_eq!(response.status().as_u16(), 401);

    // Signed in without the admin role
    let user_id = env.seed_user("Bob Martin", "bob@example.com", "pw-bob");
    let token = env.provider.seed_session(&user_id);
    let response = env
        .client
        .get(env.url("/console/users"))
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(response.status().as_u16(), 403);
    let body: Value = response.json().await?;
    assert_eq!(body["error"], "forbidden");
    assert_eq!(body["message"], "Admin permissions required.");

    Ok(())
}

/// Tests listing with search, sort, and pagination metadata.
#[tokio::test]
async fn test_list_search_and_paginate() -> anyhow::Result<()> {
    let env = TestEnv::new().await?;
    env.seed_user("Bob Martin", "bob@example.com", "pw");
    env.seed_user("Carol Danvers", "carol@example.com", "pw");
    env.seed_user("Dave Grohl", "dave@example.com", "pw");

    // Default listing sees everyone (3 seeded + admin).
    let body: Value = env
        .client
        .get(env.url("/console/users"))
        .bearer_auth(&env.admin_token)
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(body["total"], 4);
    assert_eq!(body["hasPrevious"], false);
    assert_eq!(body["hasNext"], false);

    // Email search narrows to one record.
    let body: Value = env
        .client
        .get(env.url("/console/users?searchValue=carol@&searchField=email"))
        .bearer_auth(&env.admin_token)
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(body["total"], 1);
    assert_eq!(body["users"][0]["email"], "carol@example.com");

    // Page of two, ascending by name: first page has a next but no
    // previous, and the window metadata is echoed back.
    let body: Value = env
        .client
        .get(env.url(
            "/console/users?sortBy=name&sortDirection=asc&limit=2&offset=0",
        ))
        .bearer_auth(&env.admin_token)
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(body["users"].as_array().unwrap().len(), 2);
    assert_eq!(body["users"][0]["name"], "Ada Admin");
    assert_eq!(body["limit"], 2);
    assert_eq!(body["hasNext"], true);
    assert_eq!(body["hasPrevious"], false);

    // Last page: previous but no next.
    let body: Value = env
        .client
        .get(env.url(
            "/console/users?sortBy=name&sortDirection=asc&limit=2&offset=2",
        ))
        .bearer_auth(&env.admin_token)
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(body["hasNext"], false);
    assert_eq!(body["hasPrevious"], true);

    Ok(())
}

/// Tests create-user validation and the duplicate-email conflict.
#[tokio::test]
async fn test_create_user() -> anyhow::Result<()> {
    let env = TestEnv::new().await?;

    // Missing fields
    let response = env
        .client
        .post(env.url("/console/users"))
        .bearer_auth(&env.admin_token)
        .json(&json!({"name": "Eve", "password": "pw", "confirmPassword": "pw"}))
        .send()
        .await?;
    assert_eq!(response.status().as_u16(), 400);
    let body: Value = response.json().await?;
    assert_eq!(body["message"], "Name, email, and password are required.");

    // Confirmation mismatch
    let response = env
        .client
        .post(env.url("/console/users"))
        .bearer_auth(&env.admin_token)
        .json(&json!({
            "name": "Eve",
            "email": "eve@example.com",
            "password": "pw",
            "confirmPassword": "other"
        }))
        .send()
        .await?;
    assert_eq!(response.status().as_u16(), 400);
    let body: Value = response.json().await?;
    assert_eq!(body["message"], "Passwords do not match.");

    // Success
    let response = env
        .client
        .post(env.url("/console/users"))
        .bearer_auth(&env.admin_token)
        .json(&json!({
            "name": "Eve Moneypenny",
            "email": "eve@example.com",
            "password": "pw-eve",
            "confirmPassword": "pw-eve",
            "role": "admin"
        }))
        .send()
        .await?;
    assert_eq!(response.status().as_u16(), 201);
    let created: Value = response.json().await?;
    assert_eq!(created["email"], "eve@example.com");
    assert_eq!(created["role"], json!(["admin"]));

    // Duplicate email surfaces the provider's message.
    let response = env
        .client
        .post(env.url("/console/users"))
        .bearer_auth(&env.admin_token)
        .json(&json!({
            "name": "Eve Again",
            "email": "eve@example.com",
            "password": "pw",
            "confirmPassword": "pw"
        }))
        .send()
        .await?;
    assert_eq!(response.status().as_u16(), 409);
    let body: Value = response.json().await?;
    assert_eq!(body["error"], "provider_error");
    assert_eq!(body["message"], "User already exists.");

    Ok(())
}

/// Tests role assignment and password reset.
#[tokio::test]
async fn test_set_role_and_password() -> anyhow::Result<()> {
    let env = TestEnv::new().await?;
    let user_id = env.seed_user("Bob Martin", "bob@example.com", "pw-bob");

    // Missing role selection
    let response = env
        .client
        .put(env.url(&format!("/console/users/{user_id}/role")))
        .bearer_auth(&env.admin_token)
        .json(&json!({}))
        .send()
        .await?;
    assert_eq!(response.status().as_u16(), 400);
    let body: Value = response.json().await?;
    assert_eq!(body["message"], "Select a role.");

    // Promote to admin
    let response = env
        .client
        .put(env.url(&format!("/console/users/{user_id}/role")))
        .bearer_auth(&env.admin_token)
        .json(&json!({"role": "admin"}))
        .send()
        .await?;
    assert_eq!(response.status().as_u16(), 200);
    let body: Value = response.json().await?;
    assert_eq!(body["role"], json!(["admin"]));

    // Force a password and sign in with it
    let response = env
        .client
        .put(env.url(&format!("/console/users/{user_id}/password")))
        .bearer_auth(&env.admin_token)
        .json(&json!({"newPassword": "fresh-pw", "confirmPassword": "fresh-pw"}))
        .send()
        .await?;
    assert_eq!(response.status().as_u16(), 204);

    use warden_provider::account::AccountProvider;
    assert!(env
        .provider
        .sign_in("bob@example.com", "fresh-pw")
        .await
        .is_ok());

    Ok(())
}

/// Tests the ban/unban flow, including session revocation.
#[tokio::test]
async fn test_ban_and_unban() -> anyhow::Result<()> {
    let env = TestEnv::new().await?;
    let user_id = env.seed_user("Bob Martin", "bob@example.com", "pw-bob");
    env.provider.seed_session(&user_id);
    assert_eq!(env.provider.session_count(&user_id), 1);

    let response = env
        .client
        .post(env.url(&format!("/console/users/{user_id}/ban")))
        .bearer_auth(&env.admin_token)
        .json(&json!({"banReason": "Spamming"}))
        .send()
        .await?;
    assert_eq!(response.status().as_u16(), 200);
    let body: Value = response.json().await?;
    assert_eq!(body["banned"], true);
    assert_eq!(body["banReason"], "Spamming");
    assert_eq!(env.provider.session_count(&user_id), 0);

    // The banned filter now finds exactly this user.
    let body: Value = env
        .client
        .get(env.url("/console/users?banned=true"))
        .bearer_auth(&env.admin_token)
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(body["total"], 1);
    assert_eq!(body["users"][0]["banned"], true);

    let response = env
        .client
        .delete(env.url(&format!("/console/users/{user_id}/ban")))
        .bearer_auth(&env.admin_token)
        .send()
        .await?;
    assert_eq!(response.status().as_u16(), 200);
    let body: Value = response.json().await?;
    assert_eq!(body["banned"], false);

    Ok(())
}

/// Tests session revocation.
#[tokio::test]
async fn test_revoke_sessions() -> anyhow::Result<()> {
    let env = TestEnv::new().await?;
    let user_id = env.seed_user("Bob Martin", "bob@example.com", "pw-bob");
    env.provider.seed_session(&user_id);
    env.provider.seed_session(&user_id);

    let response = env
        .client
        .delete(env.url(&format!("/console/users/{user_id}/sessions")))
        .bearer_auth(&env.admin_token)
        .send()
        .await?;
    assert_eq!(response.status().as_u16(), 204);
    assert_eq!(env.provider.session_count(&user_id), 0);

    Ok(())
}

/// Tests the impersonation round trip.
#[tokio::test]
async fn test_impersonation() -> anyhow::Result<()> {
    let env = TestEnv::new().await?;
    let user_id = env.seed_user("Bob Martin", "bob@example.com", "pw-bob");

    let response = env
        .client
        .post(env.url(&format!("/console/users/{user_id}/impersonate")))
        .bearer_auth(&env.admin_token)
        .send()
        .await?;
    assert_eq!(response.status().as_u16(), 200);
    let body: Value = response.json().await?;
    assert_eq!(body["user"]["email"], "bob@example.com");
    assert_eq!(body["session"]["impersonatedBy"], env.admin_id.as_str());
    let impersonation_token = body["session"]["token"].as_str().unwrap().to_string();

    // The minted token reads as the target account.
    let body: Value = env
        .client
        .get(env.url("/account"))
        .bearer_auth(&impersonation_token)
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(body["user"]["email"], "bob@example.com");
    assert_eq!(body["impersonatedBy"], env.admin_id.as_str());

    // Stopping restores the operator's own session.
    let response = env
        .client
        .post(env.url("/console/impersonation/stop"))
        .bearer_auth(&impersonation_token)
        .send()
        .await?;
    assert_eq!(response.status().as_u16(), 200);
    let body: Value = response.json().await?;
    assert_eq!(body["user"]["email"], "admin@example.com");
    assert_eq!(body["session"]["token"], env.admin_token.as_str());

    // The impersonation token is gone.
    let response = env
        .client
        .get(env.url("/account"))
        .bearer_auth(&impersonation_token)
        .send()
        .await?;
    assert_eq!(response.status().as_u16(), 401);

    // A plain session cannot "stop impersonating".
    let response = env
        .client
        .post(env.url("/console/impersonation/stop"))
        .bearer_auth(&env.admin_token)
        .send()
        .await?;
    assert_eq!(response.status().as_u16(), 400);

    Ok(())
}

/// Tests account removal.
#[tokio::test]
async fn test_remove_user() -> anyhow::Result<()> {
    let env = TestEnv::new().await?;
    let user_id = env.seed_user("Bob Martin", "bob@example.com", "pw-bob");

    let response = env
        .client
        .delete(env.url(&format!("/console/users/{user_id}")))
        .bearer_auth(&env.admin_token)
        .send()
        .await?;
    assert_eq!(response.status().as_u16(), 204);

    // Gone from the directory; a second removal is a 404.
    let body: Value = env
        .client
        .get(env.url("/console/users?searchValue=bob@&searchField=email"))
        .bearer_auth(&env.admin_token)
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(body["total"], 0);

    let response = env
        .client
        .delete(env.url(&format!("/console/users/{user_id}")))
        .bearer_auth(&env.admin_token)
        .send()
        .await?;
    assert_eq!(response.status().as_u16(), 404);

    Ok(())
}

/// Tests the health and identification endpoints.
#[tokio::test]
async fn test_health_and_root() -> anyhow::Result<()> {
    let env = TestEnv::new().await?;

    for path in ["/health", "/health/live", "/health/ready"] {
        let response = env.client.get(env.url(path)).send().await?;
        assert!(
            response.status().is_success(),
            "{path} should return success"
        );
    }

    let body: Value = env.client.get(env.url("/")).send().await?.json().await?;
    assert_eq!(body["name"], "warden");
    assert!(body.get("version").is_some(), "Should have version field");

    Ok(())
}
