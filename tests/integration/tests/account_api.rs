//! Account API integration tests.

use serde_json::{json, Value};

use crate::common::TestEnv;

/// Tests sign-in failures and the session that a success returns.
#[tokio::test]
async fn test_sign_in() -> anyhow::Result<()> {
    let env = TestEnv::new().await?;
    env.seed_user("Bob Martin", "bob@example.com", "pw-bob");

    // Blank input is rejected before any provider call.
    let response = env
        .client
        .post(env.url("/account/sign-in"))
        .json(&json!({"email": "", "password": ""}))
        .send()
        .await?;
    assert_eq!(response.status().as_u16(), 400);
    let body: Value = response.json().await?;
    assert_eq!(body["message"], "Email and password are required.");

    // Wrong credentials surface the provider's message.
    let response = env
        .client
        .post(env.url("/account/sign-in"))
        .json(&json!({"email": "bob@example.com", "password": "wrong"}))
        .send()
        .await?;
    assert_eq!(response.status().as_u16(), 401);
    let body: Value = response.json().await?;
    assert_eq!(body["message"], "Invalid email or password.");

    // Success returns a usable session token.
    let body: Value = env
        .client
        .post(env.url("/account/sign-in"))
        .json(&json!({"email": "bob@example.com", "password": "pw-bob"}))
        .send()
        .await?
        .json()
        .await?;
    let token = body["session"]["token"].as_str().unwrap().to_string();

    let body: Value = env
        .client
        .get(env.url("/account"))
        .bearer_auth(&token)
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(body["user"]["email"], "bob@example.com");
    assert!(body.get("impersonatedBy").is_none());

    Ok(())
}

/// Tests that a banned account cannot sign in.
#[tokio::test]
async fn test_banned_account_cannot_sign_in() -> anyhow::Result<()> {
    let env = TestEnv::new().await?;
    let user_id = env.seed_user("Bob Martin", "bob@example.com", "pw-bob");

    env.client
        .post(env.url(&format!("/console/users/{user_id}/ban")))
        .bearer_auth(&env.admin_token)
        .json(&json!({"banReason": "Spamming"}))
        .send()
        .await?;

    let response = env
        .client
        .post(env.url("/account/sign-in"))
        .json(&json!({"email": "bob@example.com", "password": "pw-bob"}))
        .send()
        .await?;
    assert_eq!(response.status().as_u16(), 403);
    let body: Value = response.json().await?;
    assert_eq!(body["message"], "This account has been banned.");

    Ok(())
}

/// Tests self-service registration.
#[tokio::test]
async fn test_sign_up() -> anyhow::Result<()> {
    let env = TestEnv::new().await?;

    // Confirmation mismatch
    let response = env
        .client
        .post(env.url("/account/sign-up"))
        .json(&json!({
            "name": "Eve Moneypenny",
            "email": "eve@example.com",
            "password": "pw",
            "confirmPassword": "other"
        }))
        .send()
        .await?;
    assert_eq!(response.status().as_u16(), 400);
    let body: Value = response.json().await?;
    assert_eq!(body["message"], "Passwords do not match.");

    // Success signs the account in.
    let response = env
        .client
        .post(env.url("/account/sign-up"))
        .json(&json!({
            "name": "Eve Moneypenny",
            "email": "eve@example.com",
            "password": "pw-eve",
            "confirmPassword": "pw-eve"
        }))
        .send()
        .await?;
    assert_eq!(response.status().as_u16(), 201);
    let body: Value = response.json().await?;
    assert_eq!(body["user"]["name"], "Eve Moneypenny");
    assert!(body["session"]["token"].as_str().is_some());

    // The email is now taken.
    let response = env
        .client
        .post(env.url("/account/sign-up"))
        .json(&json!({
            "name": "Eve Again",
            "email": "eve@example.com",
            "password": "pw",
            "confirmPassword": "pw"
        }))
        .send()
        .await?;
    assert_eq!(response.status().as_u16(), 409);

    Ok(())
}

/// Tests inline profile editing, including clearing the avatar.
#[tokio::test]
async fn test_update_profile() -> anyhow::Result<()> {
    let env = TestEnv::new().await?;
    let user_id = env.seed_user("Bob Martin", "bob@example.com", "pw-bob");
    let token = env.provider.seed_session(&user_id);

    // Blank name is rejected with the inline error message.
    let response = env
        .client
        .patch(env.url("/account/profile"))
        .bearer_auth(&token)
        .json(&json!({"name": "   "}))
        .send()
        .await?;
    assert_eq!(response.status().as_u16(), 400);
    let body: Value = response.json().await?;
    assert_eq!(body["message"], "Name cannot be empty.");

    // Rename and set an avatar.
    let body: Value = env
        .client
        .patch(env.url("/account/profile"))
        .bearer_auth(&token)
        .json(&json!({"name": "Robert Martin", "image": "data:image/png;base64,xyz"}))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(body["name"], "Robert Martin");
    assert_eq!(body["image"], "data:image/png;base64,xyz");

    // An explicit null clears the avatar without touching the name.
    let body: Value = env
        .client
        .patch(env.url("/account/profile"))
        .bearer_auth(&token)
        .json(&json!({"image": null}))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(body["name"], "Robert Martin");
    assert!(body.get("image").is_none());

    Ok(())
}

/// Tests the change-password flow.
#[tokio::test]
async fn test_change_password() -> anyhow::Result<()> {
    let env = TestEnv::new().await?;
    let user_id = env.seed_user("Bob Martin", "bob@example.com", "pw-bob");
    let token = env.provider.seed_session(&user_id);

    // Missing fields
    let response = env
        .client
        .post(env.url("/account/password"))
        .bearer_auth(&token)
        .json(&json!({"currentPassword": "pw-bob"}))
        .send()
        .await?;
    assert_eq!(response.status().as_u16(), 400);
    let body: Value = response.json().await?;
    assert_eq!(body["message"], "Fill out all password fields.");

    // Wrong current password
    let response = env
        .client
        .post(env.url("/account/password"))
        .bearer_auth(&token)
        .json(&json!({
            "currentPassword": "wrong",
            "newPassword": "fresh",
            "confirmPassword": "fresh"
        }))
        .send()
        .await?;
    assert_eq!(response.status().as_u16(), 400);
    let body: Value = response.json().await?;
    assert_eq!(body["message"], "Current password is incorrect.");

    // Success
    let response = env
        .client
        .post(env.url("/account/password"))
        .bearer_auth(&token)
        .json(&json!({
            "currentPassword": "pw-bob",
            "newPassword": "fresh",
            "confirmPassword": "fresh"
        }))
        .send()
        .await?;
    assert_eq!(response.status().as_u16(), 204);

    use warden_provider::account::AccountProvider;
    assert!(env.provider.sign_in("bob@example.com", "fresh").await.is_ok());

    Ok(())
}

/// Tests sign-out.
#[tokio::test]
async fn test_sign_out() -> anyhow::Result<()> {
    let env = TestEnv::new().await?;
    let user_id = env.seed_user("Bob Martin", "bob@example.com", "pw-bob");
    let token = env.provider.seed_session(&user_id);

    let response = env
        .client
        .post(env.url("/account/sign-out"))
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(response.status().as_u16(), 204);

    let response = env
        .client
        .get(env.url("/account"))
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(response.status().as_u16(), 401);

    Ok(())
}
