//! Live integration tests for vidmap-db using `#[sqlx::test]`.
//!
//! Each test gets a fresh, fully-migrated Postgres database spun up by the
//! sqlx test harness. The `migrations` path is relative to the crate root
//! (`crates/vidmap-db/`), so `"../../migrations"` resolves to the workspace
//! migration directory.

use vidmap_db::{
    clear_history, create_user, get_user_by_email, get_user_by_id, insert_history_entry,
    list_history, update_password_hash, update_photo, upsert_google_user, DbError, GoogleProfile,
    NewHistoryEntry,
};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn insert_test_user(pool: &sqlx::PgPool, email: &str) -> i64 {
    create_user(pool, "Test User", email, "$argon2id$v=19$m=19456,t=2,p=1$c2FsdA$aGFzaA")
        .await
        .unwrap_or_else(|e| panic!("insert_test_user failed for '{email}': {e}"))
        .id
}

fn entry<'a>(video_id: &'a str, place_name: Option<&'a str>) -> NewHistoryEntry<'a> {
    NewHistoryEntry {
        video_id,
        title: "Video de prueba",
        place_name,
        latitude: 37.3826,
        longitude: -5.9963,
    }
}

fn google_profile(sub: &str, email: &str) -> GoogleProfile {
    GoogleProfile {
        sub: sub.to_string(),
        email: email.to_string(),
        display_name: "Google User".to_string(),
        picture: Some("https://lh3.googleusercontent.com/a/photo".to_string()),
    }
}

// ---------------------------------------------------------------------------
// Section 1: Users
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn create_user_then_lookup_by_email_ignores_case(pool: sqlx::PgPool) {
    let id = insert_test_user(&pool, "Ana@Example.com").await;

    let found = get_user_by_email(&pool, "ana@example.COM")
        .await
        .expect("get_user_by_email failed")
        .expect("user should exist");

    assert_eq!(found.id, id);
    assert_eq!(found.email, "Ana@Example.com");
    assert!(!found.is_oauth_only());
}

#[sqlx::test(migrations = "../../migrations")]
async fn duplicate_email_is_rejected_case_insensitively(pool: sqlx::PgPool) {
    insert_test_user(&pool, "pablo@example.com").await;

    let err = create_user(&pool, "Otro", "PABLO@example.com", "hash")
        .await
        .expect_err("second insert should fail");

    assert!(matches!(err, DbError::DuplicateEmail));
}

#[sqlx::test(migrations = "../../migrations")]
async fn get_user_by_id_returns_none_for_unknown_id(pool: sqlx::PgPool) {
    let found = get_user_by_id(&pool, 999_999)
        .await
        .expect("get_user_by_id failed");
    assert!(found.is_none());
}

#[sqlx::test(migrations = "../../migrations")]
async fn update_password_hash_replaces_hash(pool: sqlx::PgPool) {
    let id = insert_test_user(&pool, "marta@example.com").await;

    update_password_hash(&pool, id, "new-hash")
        .await
        .expect("update_password_hash failed");

    let user = get_user_by_id(&pool, id)
        .await
        .expect("get_user_by_id failed")
        .expect("user should exist");
    assert_eq!(user.password_hash.as_deref(), Some("new-hash"));
}

#[sqlx::test(migrations = "../../migrations")]
async fn update_password_hash_for_unknown_user_is_not_found(pool: sqlx::PgPool) {
    let err = update_password_hash(&pool, 424_242, "hash")
        .await
        .expect_err("unknown user should fail");
    assert!(matches!(err, DbError::NotFound));
}

#[sqlx::test(migrations = "../../migrations")]
async fn update_photo_sets_and_clears(pool: sqlx::PgPool) {
    let id = insert_test_user(&pool, "foto@example.com").await;

    let with_photo = update_photo(&pool, id, Some("data:image/png;base64,iVBORw0KGgo="))
        .await
        .expect("set photo failed");
    assert!(with_photo.photo.is_some());

    let cleared = update_photo(&pool, id, None)
        .await
        .expect("clear photo failed");
    assert!(cleared.photo.is_none());
}

// ---------------------------------------------------------------------------
// Section 2: Google sign-in
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn upsert_google_user_creates_then_reuses_account(pool: sqlx::PgPool) {
    let profile = google_profile("sub-1", "g@example.com");

    let first = upsert_google_user(&pool, &profile)
        .await
        .expect("first upsert failed");
    assert!(first.is_oauth_only());
    assert_eq!(first.google_sub.as_deref(), Some("sub-1"));

    let second = upsert_google_user(&pool, &profile)
        .await
        .expect("second upsert failed");
    assert_eq!(first.id, second.id);
}

#[sqlx::test(migrations = "../../migrations")]
async fn upsert_google_user_links_existing_password_account(pool: sqlx::PgPool) {
    let id = insert_test_user(&pool, "Link@Example.com").await;

    let linked = upsert_google_user(&pool, &google_profile("sub-2", "link@example.com"))
        .await
        .expect("upsert failed");

    assert_eq!(linked.id, id);
    assert_eq!(linked.google_sub.as_deref(), Some("sub-2"));
    assert!(!linked.is_oauth_only());
    assert!(linked.photo.is_some());
}

#[sqlx::test(migrations = "../../migrations")]
async fn upsert_google_user_never_relinks_a_different_identity(pool: sqlx::PgPool) {
    let original = upsert_google_user(&pool, &google_profile("sub-a", "taken@example.com"))
        .await
        .expect("first upsert failed");

    let result = upsert_google_user(&pool, &google_profile("sub-b", "TAKEN@example.com")).await;
    assert!(
        matches!(result, Err(DbError::GoogleAccountConflict)),
        "expected GoogleAccountConflict, got: {result:?}"
    );

    let stored = get_user_by_id(&pool, original.id)
        .await
        .expect("lookup failed")
        .expect("user missing");
    assert_eq!(stored.google_sub.as_deref(), Some("sub-a"));
}

// ---------------------------------------------------------------------------
// Section 3: Watch history
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn history_lists_newest_first_and_respects_limit(pool: sqlx::PgPool) {
    let user_id = insert_test_user(&pool, "hist@example.com").await;

    for video_id in ["a1", "b2", "c3"] {
        insert_history_entry(&pool, user_id, &entry(video_id, Some("Sevilla")))
            .await
            .expect("insert_history_entry failed");
    }

    let rows = list_history(&pool, user_id, 2)
        .await
        .expect("list_history failed");
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].video_id, "c3");
    assert_eq!(rows[1].video_id, "b2");
}

#[sqlx::test(migrations = "../../migrations")]
async fn history_is_scoped_per_user(pool: sqlx::PgPool) {
    let alice = insert_test_user(&pool, "alice@example.com").await;
    let bob = insert_test_user(&pool, "bob@example.com").await;

    insert_history_entry(&pool, alice, &entry("a1", None))
        .await
        .expect("insert failed");

    let bob_rows = list_history(&pool, bob, 50).await.expect("list failed");
    assert!(bob_rows.is_empty());
}

#[sqlx::test(migrations = "../../migrations")]
async fn clear_history_removes_only_that_users_rows(pool: sqlx::PgPool) {
    let alice = insert_test_user(&pool, "alice2@example.com").await;
    let bob = insert_test_user(&pool, "bob2@example.com").await;

    insert_history_entry(&pool, alice, &entry("a1", None))
        .await
        .expect("insert failed");
    insert_history_entry(&pool, alice, &entry("a2", None))
        .await
        .expect("insert failed");
    insert_history_entry(&pool, bob, &entry("b1", None))
        .await
        .expect("insert failed");

    let removed = clear_history(&pool, alice).await.expect("clear failed");
    assert_eq!(removed, 2);

    let removed_again = clear_history(&pool, alice).await.expect("clear failed");
    assert_eq!(removed_again, 0);

    let bob_rows = list_history(&pool, bob, 50).await.expect("list failed");
    assert_eq!(bob_rows.len(), 1);
}

#[sqlx::test(migrations = "../../migrations")]
async fn history_rejects_out_of_range_coordinates(pool: sqlx::PgPool) {
    let user_id = insert_test_user(&pool, "range@example.com").await;
    let bad = NewHistoryEntry {
        latitude: 91.0,
        ..entry("x", None)
    };

    let err = insert_history_entry(&pool, user_id, &bad)
        .await
        .expect_err("check constraint should reject latitude 91");
    assert!(matches!(err, DbError::Sqlx(_)));
}
