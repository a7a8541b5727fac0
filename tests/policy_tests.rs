use devchat_forum::{
    AppError,
    models::Role,
    policy::{
        can_create_message, can_list_all_users, can_list_pending_users, can_mutate_owned_content,
        can_verify, ensure,
    },
};

#[test]
fn test_pending_queue_visible_to_admin_tier_only() {
    assert!(!can_list_pending_users(Role::User));
    assert!(!can_list_pending_users(Role::Dev));
    assert!(can_list_pending_users(Role::Admin));
    assert!(can_list_pending_users(Role::Superadmin));
}

#[test]
fn test_full_directory_is_superadmin_only() {
    for role in Role::ALL {
        assert_eq!(can_list_all_users(role), role == Role::Superadmin, "{:?}", role);
    }
}

#[test]
fn test_verification_hierarchy_table() {
    for actor in Role::ALL {
        for target in Role::ALL {
            let expected = match actor {
                Role::Superadmin => true,
                Role::Admin => target == Role::Dev,
                Role::User | Role::Dev => false,
            };
            assert_eq!(
                can_verify(actor, target),
                expected,
                "{:?} verifying {:?}",
                actor,
                target
            );
        }
    }
}

#[test]
fn test_admin_cannot_verify_peer_admin() {
    assert!(!can_verify(Role::Admin, Role::Admin));
    assert!(!can_verify(Role::Admin, Role::Superadmin));
}

#[test]
fn test_only_dev_can_post_messages() {
    assert!(can_create_message(Role::Dev));
    assert!(!can_create_message(Role::User));
    assert!(!can_create_message(Role::Admin));
    assert!(!can_create_message(Role::Superadmin));
}

#[test]
fn test_ownership_is_exact_username_match() {
    assert!(can_mutate_owned_content("alice", "alice"));
    assert!(!can_mutate_owned_content("alice", "bob"));
    assert!(!can_mutate_owned_content("Alice", "alice"));
    assert!(!can_mutate_owned_content("superadmin", "alice"));
}

#[test]
fn test_ensure_maps_denial_to_forbidden() {
    assert_eq!(ensure(true, "unused"), Ok(()));
    assert_eq!(
        ensure(false, "nope"),
        Err(AppError::Forbidden("nope".to_string()))
    );
}
