use chrono::{Duration, SubsecRound, Utc};
use portcullis::{
    AccessDenied, AccessPolicy, JsonRepositoryProvider, LoginOutcome, Portcullis,
    PortcullisBuilder, PortcullisError, Surface,
};
use serde_json::json;
use tempfile::TempDir;

const CLIENT: &str = "203.0.113.7";

async fn setup() -> (TempDir, Portcullis<JsonRepositoryProvider>) {
    let dir = tempfile::tempdir().unwrap();
    let users = json!({
        "admin": {"password": password_auth::generate_hash("admin123"), "role": "admin"},
        "olduser": password_auth::generate_hash("hunter2"),
    });
    tokio::fs::write(dir.path().join("users.json"), users.to_string())
        .await
        .unwrap();

    let portcullis = PortcullisBuilder::new()
        .with_json_files(
            dir.path().join("users.json"),
            dir.path().join("login-failures.json"),
        )
        .initialize_storage(true)
        .build()
        .await
        .expect("Failed to build Portcullis");

    (dir, portcullis)
}

async fn ledger_json(dir: &TempDir) -> serde_json::Value {
    let raw = tokio::fs::read_to_string(dir.path().join("login-failures.json"))
        .await
        .unwrap();
    serde_json::from_str(&raw).unwrap()
}

#[tokio::test]
async fn test_fourth_attempt_is_locked_out() -> Result<(), Box<dyn std::error::Error>> {
    let (dir, portcullis) = setup().await;
    // The ledger stores microseconds.
    let now = Utc::now().trunc_subsecs(6);

    for _ in 0..3 {
        let outcome = portcullis.login_at(CLIENT, "admin", "wrong", now).await;
        assert_eq!(outcome, LoginOutcome::Invalid);
    }

    let ledger = ledger_json(&dir).await;
    assert_eq!(ledger[CLIENT]["count"], 3);
    assert!(ledger[CLIENT]["locked_until"].is_string());

    // Even the right password is refused while locked.
    let outcome = portcullis.login_at(CLIENT, "admin", "admin123", now).await;
    assert_eq!(
        outcome,
        LoginOutcome::Locked {
            locked_until: now + Duration::minutes(1),
        }
    );
    assert_eq!(ledger_json(&dir).await[CLIENT]["count"], 3);

    Ok(())
}

#[tokio::test]
async fn test_login_after_lock_expires_clears_record() -> Result<(), Box<dyn std::error::Error>> {
    let (dir, portcullis) = setup().await;
    let now = Utc::now();

    for _ in 0..3 {
        portcullis.login_at(CLIENT, "admin", "wrong", now).await;
    }

    let later = now + Duration::seconds(61);
    let outcome = portcullis.login_at(CLIENT, "admin", "admin123", later).await;
    assert_eq!(
        outcome,
        LoginOutcome::Authenticated {
            username: "admin".to_string(),
            role: "admin".to_string(),
        }
    );

    assert!(ledger_json(&dir).await.get(CLIENT).is_none());
    assert_eq!(portcullis.lockout_status(CLIENT).await.failed_attempts, 0);

    Ok(())
}

#[tokio::test]
async fn test_unknown_user_looks_like_wrong_password() -> Result<(), Box<dyn std::error::Error>> {
    let (_dir, portcullis) = setup().await;

    let unknown = portcullis.login("10.0.0.1", "mallory", "admin123").await;
    let wrong = portcullis.login("10.0.0.2", "admin", "admin124").await;

    assert_eq!(unknown, wrong);
    assert_eq!(portcullis.lockout_status("10.0.0.1").await.failed_attempts, 1);
    assert_eq!(portcullis.lockout_status("10.0.0.2").await.failed_attempts, 1);

    Ok(())
}

#[tokio::test]
async fn test_legacy_user_signs_in_as_viewer() -> Result<(), Box<dyn std::error::Error>> {
    let (_dir, portcullis) = setup().await;

    let sign_in = portcullis.sign_in(CLIENT, " olduser ", "hunter2", None).await?;
    let session = sign_in.session.expect("session issued");

    assert_eq!(session.user, "olduser");
    assert_eq!(session.role, "viewer");

    let denied = portcullis
        .authorize(Some(&session.token), "/admin", &AccessPolicy::role("admin"))
        .await;
    assert!(matches!(
        denied,
        Err(PortcullisError::AccessDenied(AccessDenied::Forbidden))
    ));

    Ok(())
}

#[tokio::test]
async fn test_logout_denies_next_request() -> Result<(), Box<dyn std::error::Error>> {
    let (_dir, portcullis) = setup().await;

    let session = portcullis
        .sign_in(CLIENT, "admin", "admin123", None)
        .await?
        .session
        .expect("session issued");

    let admitted = portcullis
        .authorize(Some(&session.token), "/api/reports", &AccessPolicy::Authenticated)
        .await?;
    assert_eq!(admitted.user, "admin");

    portcullis.logout(&session.token).await?;

    let denied = portcullis
        .authorize(Some(&session.token), "/api/reports", &AccessPolicy::Authenticated)
        .await;
    assert!(matches!(
        denied,
        Err(PortcullisError::AccessDenied(AccessDenied::Unauthorized(
            Surface::Api
        )))
    ));

    let denied = portcullis
        .authorize(None, "/dashboard", &AccessPolicy::Authenticated)
        .await;
    assert!(matches!(
        denied,
        Err(PortcullisError::AccessDenied(AccessDenied::Unauthorized(
            Surface::Browser
        )))
    ));

    Ok(())
}

#[tokio::test]
async fn test_sign_in_replaces_previous_session() -> Result<(), Box<dyn std::error::Error>> {
    let (_dir, portcullis) = setup().await;

    let first = portcullis
        .sign_in(CLIENT, "olduser", "hunter2", None)
        .await?
        .session
        .expect("session issued");

    // A failed attempt leaves the existing session alone.
    let failed = portcullis
        .sign_in(CLIENT, "admin", "nope", Some(&first.token))
        .await?;
    assert!(failed.session.is_none());
    assert!(portcullis.session(&first.token).await?.is_some());

    let second = portcullis
        .sign_in(CLIENT, "admin", "admin123", Some(&first.token))
        .await?
        .session
        .expect("session issued");

    assert_ne!(first.token, second.token);
    assert!(portcullis.session(&first.token).await?.is_none());
    assert_eq!(
        portcullis.session(&second.token).await?.map(|s| s.role),
        Some("admin".to_string())
    );

    Ok(())
}

#[tokio::test]
async fn test_idle_session_expires() -> Result<(), Box<dyn std::error::Error>> {
    let (_dir, portcullis) = setup().await;
    let now = Utc::now();

    let session = portcullis
        .sign_in_at(CLIENT, "admin", "admin123", None, now)
        .await?
        .session
        .expect("session issued");

    let later = now + Duration::minutes(15) + Duration::seconds(1);
    assert!(portcullis.session_at(&session.token, later).await?.is_none());

    Ok(())
}

#[tokio::test]
async fn test_operator_unlock() -> Result<(), Box<dyn std::error::Error>> {
    let (_dir, portcullis) = setup().await;

    for _ in 0..3 {
        portcullis.login(CLIENT, "admin", "wrong").await;
    }
    let status = portcullis.lockout_status(CLIENT).await;
    assert!(status.is_locked);
    assert!(status.retry_after_seconds().is_some());

    assert!(portcullis.unlock(CLIENT).await);
    assert!(portcullis.login(CLIENT, "admin", "admin123").await.is_authenticated());

    Ok(())
}

#[tokio::test]
async fn test_missing_user_file_rejects_everyone() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let portcullis = PortcullisBuilder::new()
        .with_json_files(
            dir.path().join("absent.json"),
            dir.path().join("login-failures.json"),
        )
        .build()
        .await?;

    assert_eq!(portcullis.user_count().await, 0);
    assert_eq!(
        portcullis.login(CLIENT, "admin", "admin123").await,
        LoginOutcome::Invalid
    );
    portcullis.health_check().await?;

    Ok(())
}
