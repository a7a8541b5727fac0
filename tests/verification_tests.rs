mod common;

use common::{memory_repo, seed_actor, seed_user};
use devchat_forum::{
    AppError, Credentials, Repository,
    auth::AuthUser,
    config::SuperadminSeed,
    models::{RegisterUserRequest, Role, VerificationOutcome},
    services::{
        accounts::{SUPERADMIN_USERNAME, ensure_superadmin, register},
        admin::{list_all_users, list_pending_users, verify_user},
    },
};

fn credentials() -> Credentials {
    Credentials::new("verification-test-secret", 3600)
}

fn registration(username: &str, role: Option<Role>) -> RegisterUserRequest {
    RegisterUserRequest {
        username: username.to_string(),
        email: format!("{}@devchat.test", username),
        password: "correct horse battery staple".to_string(),
        role,
    }
}

// --- Registration defaults ---

#[tokio::test]
async fn test_registration_defaults_by_role() {
    let repo = memory_repo();
    let creds = credentials();

    let plain = register(repo.as_ref(), &creds, registration("uma", None)).await.unwrap();
    assert_eq!(plain.role, Role::User);
    assert!(plain.verified);

    for (name, role) in [("dina", Role::Dev), ("adam", Role::Admin), ("sara", Role::Superadmin)] {
        let response = register(repo.as_ref(), &creds, registration(name, Some(role))).await.unwrap();
        assert_eq!(response.role, role);
        assert!(!response.verified, "{:?} must start pending", role);
        assert!(!response.token.is_empty());
    }
}

#[tokio::test]
async fn test_duplicate_username_is_conflict() {
    let repo = memory_repo();
    let creds = credentials();
    register(repo.as_ref(), &creds, registration("alice", None)).await.unwrap();

    let err = register(repo.as_ref(), &creds, registration("alice", Some(Role::Dev)))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)), "{:?}", err);
}

#[tokio::test]
async fn test_blank_registration_fields_are_validation_errors() {
    let repo = memory_repo();
    let mut req = registration("  ", None);
    let err = register(repo.as_ref(), &credentials(), req.clone()).await.unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    req.username = "valid".to_string();
    req.email = "no-at-sign".to_string();
    let err = register(repo.as_ref(), &credentials(), req).await.unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
}

// --- Verification workflow ---

#[tokio::test]
async fn test_admin_verifies_registered_dev() {
    let repo = memory_repo();
    let creds = credentials();

    // alice registers as DEV and waits for approval.
    register(repo.as_ref(), &creds, registration("alice", Some(Role::Dev))).await.unwrap();
    let alice = repo.get_user_by_username("alice").await.unwrap().unwrap();
    assert!(!alice.verified);

    let bob = seed_actor(repo.as_ref(), "bob", Role::Admin).await;
    let response = verify_user(repo.as_ref(), &bob, alice.id).await.unwrap();

    assert_eq!(response.outcome, VerificationOutcome::Verified);
    assert!(response.user.verified);
    assert!(repo.get_user(alice.id).await.unwrap().unwrap().verified);
}

#[tokio::test]
async fn test_admin_cannot_verify_admin() {
    let repo = memory_repo();
    let bob = seed_actor(repo.as_ref(), "bob", Role::Admin).await;
    let charlie = seed_user(repo.as_ref(), "charlie", Role::Admin, false).await;

    let err = verify_user(repo.as_ref(), &bob, charlie.id).await.unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)), "{:?}", err);
    assert!(!repo.get_user(charlie.id).await.unwrap().unwrap().verified, "no side effect on denial");
}

#[tokio::test]
async fn test_superadmin_verifies_every_role() {
    let repo = memory_repo();
    let root = seed_actor(repo.as_ref(), "root", Role::Superadmin).await;

    for (i, role) in Role::ALL.into_iter().enumerate() {
        let target = seed_user(repo.as_ref(), &format!("target{}", i), role, false).await;
        let response = verify_user(repo.as_ref(), &root, target.id).await.unwrap();
        assert_eq!(response.outcome, VerificationOutcome::Verified, "{:?}", role);
    }
}

#[tokio::test]
async fn test_user_and_dev_cannot_verify_anyone() {
    let repo = memory_repo();
    let target = seed_user(repo.as_ref(), "target", Role::Dev, false).await;

    for (name, role) in [("u", Role::User), ("d", Role::Dev)] {
        let actor = seed_actor(repo.as_ref(), name, role).await;
        let err = verify_user(repo.as_ref(), &actor, target.id).await.unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }
}

#[tokio::test]
async fn test_verify_missing_user_is_not_found() {
    let repo = memory_repo();
    let root = seed_actor(repo.as_ref(), "root", Role::Superadmin).await;

    let err = verify_user(repo.as_ref(), &root, 404).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound { entity: "User", .. }));
}

#[tokio::test]
async fn test_reverification_is_idempotent() {
    let repo = memory_repo();
    let bob = seed_actor(repo.as_ref(), "bob", Role::Admin).await;
    let alice = seed_user(repo.as_ref(), "alice", Role::Dev, false).await;

    verify_user(repo.as_ref(), &bob, alice.id).await.unwrap();
    let again = verify_user(repo.as_ref(), &bob, alice.id).await.unwrap();

    assert_eq!(again.outcome, VerificationOutcome::AlreadyVerified);
    assert!(again.user.verified);
}

#[tokio::test]
async fn test_hierarchy_checked_before_already_verified() {
    let repo = memory_repo();
    let bob = seed_actor(repo.as_ref(), "bob", Role::Admin).await;
    // USER accounts are verified at creation but still outside ADMIN's scope.
    let uma = seed_user(repo.as_ref(), "uma", Role::User, true).await;

    let err = verify_user(repo.as_ref(), &bob, uma.id).await.unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));
}

// --- Pending queue and directory ---

#[tokio::test]
async fn test_pending_queue_is_scoped_by_actor_tier() {
    let repo = memory_repo();
    let root = seed_actor(repo.as_ref(), "root", Role::Superadmin).await;
    let bob = seed_actor(repo.as_ref(), "bob", Role::Admin).await;
    seed_user(repo.as_ref(), "pending-dev", Role::Dev, false).await;
    seed_user(repo.as_ref(), "pending-admin", Role::Admin, false).await;
    seed_user(repo.as_ref(), "active-dev", Role::Dev, true).await;

    let mut all: Vec<String> = list_pending_users(repo.as_ref(), &root)
        .await
        .unwrap()
        .into_iter()
        .map(|u| u.username)
        .collect();
    all.sort();
    assert_eq!(all, vec!["pending-admin", "pending-dev"]);

    let scoped: Vec<String> = list_pending_users(repo.as_ref(), &bob)
        .await
        .unwrap()
        .into_iter()
        .map(|u| u.username)
        .collect();
    assert_eq!(scoped, vec!["pending-dev"]);
}

#[tokio::test]
async fn test_pending_queue_forbidden_below_admin() {
    let repo = memory_repo();
    for (name, role) in [("u", Role::User), ("d", Role::Dev)] {
        let actor = seed_actor(repo.as_ref(), name, role).await;
        let err = list_pending_users(repo.as_ref(), &actor).await.unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }
}

#[tokio::test]
async fn test_all_users_is_superadmin_only() {
    let repo = memory_repo();
    let root = seed_actor(repo.as_ref(), "root", Role::Superadmin).await;
    let bob = seed_actor(repo.as_ref(), "bob", Role::Admin).await;

    assert_eq!(list_all_users(repo.as_ref(), &root).await.unwrap().len(), 2);
    let err = list_all_users(repo.as_ref(), &bob).await.unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));
}

// --- Bootstrap ---

#[tokio::test]
async fn test_superadmin_seed_is_verified_and_created_once() {
    let repo = memory_repo();
    let creds = credentials();
    let seed = SuperadminSeed {
        email: "root@devchat.test".to_string(),
        password: "bootstrap-password".to_string(),
    };

    let first = ensure_superadmin(repo.as_ref(), &creds, &seed).await.unwrap();
    assert_eq!(first.username, SUPERADMIN_USERNAME);
    assert_eq!(first.role, Role::Superadmin);
    assert!(first.verified);

    let second = ensure_superadmin(repo.as_ref(), &creds, &seed).await.unwrap();
    assert_eq!(second.id, first.id);
    assert_eq!(repo.list_users().await.unwrap().len(), 1);

    let actor = AuthUser::from(&first);
    assert_eq!(actor.role, Role::Superadmin);
}
