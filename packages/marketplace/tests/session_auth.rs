mod support;

use common::Role;
use marketplace::SessionState;
use marketplace::repos::collections;
use marketplace::session::RegisterInput;
use support::{PASSWORD, TestEnv};

#[tokio::test]
async fn tracker_settles_immediately_with_local_provider() {
    let env = TestEnv::new();
    // The provider's initial callback fires on subscribe.
    assert!(!env.session.is_loading());
    assert!(matches!(env.session.state(), SessionState::SignedOut));
}

#[tokio::test]
async fn register_creates_user_record_and_signs_in() {
    let env = TestEnv::new();
    let principal = env.register_client("client@example.com").await;

    assert_eq!(principal.role, Role::Client);
    assert_eq!(principal.email, "client@example.com");

    let doc = env.raw_doc(collections::USERS, &principal.uid).await;
    assert_eq!(doc["role"], "Client");
    assert_eq!(doc["email"], "client@example.com");

    let current = env.session.current_principal().expect("signed in");
    assert_eq!(current.uid, principal.uid);
}

#[tokio::test]
async fn register_rejects_admin_role() {
    let env = TestEnv::new();
    let result = env
        .session
        .register(RegisterInput {
            email: "admin@example.com".into(),
            password: PASSWORD.into(),
            display_name: "Sneaky".into(),
            role: Role::Admin,
        })
        .await;
    assert!(!result.success);
    assert_eq!(result.code, Some("VALIDATION_ERROR"));
}

#[tokio::test]
async fn login_maps_provider_errors_to_stable_messages() {
    let env = TestEnv::new();
    env.register_client("client@example.com").await;
    env.session.logout().await;

    let result = env
        .session
        .login("client@example.com", "wrong-password")
        .await;
    assert!(!result.success);
    assert_eq!(result.code, Some("INVALID_CREDENTIALS"));
    assert_eq!(result.error.as_deref(), Some("Invalid email or password"));

    let result = env.session.login("nobody@example.com", PASSWORD).await;
    assert_eq!(result.code, Some("INVALID_CREDENTIALS"));
}

#[tokio::test]
async fn duplicate_registration_reports_email_in_use() {
    let env = TestEnv::new();
    env.register_client("client@example.com").await;

    let result = env
        .session
        .register(RegisterInput {
            email: "client@example.com".into(),
            password: PASSWORD.into(),
            display_name: "Again".into(),
            role: Role::Client,
        })
        .await;
    assert!(!result.success);
    assert_eq!(result.code, Some("EMAIL_IN_USE"));
}

#[tokio::test]
async fn weak_password_is_reported() {
    let env = TestEnv::new();
    let result = env
        .session
        .register(RegisterInput {
            email: "client@example.com".into(),
            password: "short".into(),
            display_name: "Weak".into(),
            role: Role::Client,
        })
        .await;
    assert_eq!(result.code, Some("WEAK_PASSWORD"));
}

#[tokio::test]
async fn disabled_account_is_reported() {
    let env = TestEnv::new();
    env.register_client("client@example.com").await;
    env.session.logout().await;
    env.provider.set_disabled("client@example.com", true);

    let result = env.session.login("client@example.com", PASSWORD).await;
    assert_eq!(result.code, Some("ACCOUNT_DISABLED"));
}

#[tokio::test]
async fn repeated_failures_are_rate_limited() {
    let env = TestEnv::new();
    env.register_client("client@example.com").await;
    env.session.logout().await;

    for _ in 0..5 {
        let _ = env.session.login("client@example.com", "wrong").await;
    }
    let result = env.session.login("client@example.com", PASSWORD).await;
    assert_eq!(result.code, Some("RATE_LIMITED"));
}

#[tokio::test]
async fn logout_clears_the_principal() {
    let env = TestEnv::new();
    env.register_client("client@example.com").await;
    assert!(env.session.current_principal().is_some());

    let result = env.session.logout().await;
    assert!(result.success);
    assert!(env.session.current_principal().is_none());
    assert!(matches!(env.session.state(), SessionState::SignedOut));
}

#[tokio::test]
async fn missing_user_record_flags_recovery_not_failure() {
    let env = TestEnv::new();
    let principal = env.register_client("client@example.com").await;
    env.session.logout().await;

    // Simulate the inconsistency: provider account exists, record gone.
    docstore::DocumentStore::delete(&*env.store, collections::USERS, &principal.uid)
        .await
        .unwrap();

    let result = env.session.login("client@example.com", PASSWORD).await;
    assert!(!result.success);
    assert_eq!(result.code, Some("NEEDS_RECOVERY"));
    assert!(matches!(
        env.session.state(),
        SessionState::NeedsRecovery { .. }
    ));
}

#[tokio::test]
async fn repair_recreates_the_user_record() {
    let env = TestEnv::new();
    let principal = env.register_client("client@example.com").await;
    env.session.logout().await;
    docstore::DocumentStore::delete(&*env.store, collections::USERS, &principal.uid)
        .await
        .unwrap();
    let _ = env.session.login("client@example.com", PASSWORD).await;

    let repaired = env
        .session
        .repair_account("Test Client", Role::Client)
        .await
        .expect_data("repair");
    assert_eq!(repaired.uid, principal.uid);
    assert!(matches!(env.session.state(), SessionState::SignedIn(_)));

    let doc = env.raw_doc(collections::USERS, &principal.uid).await;
    assert_eq!(doc["role"], "Client");
}

#[tokio::test]
async fn reset_password_returns_uniform_envelope() {
    let env = TestEnv::new();
    let result = env.session.reset_password("anyone@example.com").await;
    assert!(result.success);
    assert_eq!(result.message.as_deref(), Some("Password reset email sent"));
}

#[tokio::test]
async fn envelope_serializes_to_the_wire_shape() {
    let env = TestEnv::new();
    let result = env.session.login("nobody@example.com", PASSWORD).await;
    let json = serde_json::to_value(&result).unwrap();

    assert_eq!(json["success"], false);
    assert_eq!(json["code"], "INVALID_CREDENTIALS");
    assert!(json["error"].is_string());
    assert!(json.get("data").is_none());
}
