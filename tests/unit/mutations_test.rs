//! Unit tests for the mutation endpoints.
//!
//! Validation must reject before any storage call; successful mutations
//! apply optimistically and survive the realtime echo; the form-payload
//! variants must never surface failures.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use rstest::rstest;
use serde_json::json;

use linkdock::backend::local::LocalBackend;
use linkdock::managers::list_store::BookmarkListStore;
use linkdock::managers::mutations::{BookmarkMutations, CreateOutcome, RemoveOutcome};
use linkdock::types::bookmark::DraftRejection;
use linkdock::types::user::User;

fn demo_user() -> User {
    User {
        id: "user-1".to_string(),
        email: Some("user@example.com".to_string()),
    }
}

fn setup() -> (Arc<LocalBackend>, Arc<BookmarkListStore>, BookmarkMutations) {
    let backend = Arc::new(LocalBackend::new().expect("local backend"));
    backend.force_sign_in(&demo_user());
    let store = Arc::new(BookmarkListStore::new(backend.clone(), "user-1"));
    store.refresh();
    let mutations = BookmarkMutations::new(backend.clone(), store.clone());
    (backend, store, mutations)
}

#[rstest]
#[case("", "https://example.com", DraftRejection::EmptyTitle)]
#[case("   ", "https://example.com", DraftRejection::EmptyTitle)]
#[case("Example", "", DraftRejection::EmptyUrl)]
#[case("Example", "   ", DraftRejection::EmptyUrl)]
#[case("Example", "example.com", DraftRejection::MalformedUrl)]
#[case("Example", "ftp://example.com", DraftRejection::MalformedUrl)]
fn test_invalid_drafts_never_reach_storage(
    #[case] title: &str,
    #[case] url: &str,
    #[case] expected: DraftRejection,
) {
    let (backend, store, mutations) = setup();

    let outcome = mutations.create_bookmark(title, url).unwrap();

    assert_eq!(outcome, CreateOutcome::Rejected(expected));
    assert_eq!(backend.insert_calls(), 0);
    assert!(store.is_empty());
}

#[test]
fn test_create_without_a_session_is_a_noop() {
    let backend = Arc::new(LocalBackend::new().expect("local backend"));
    let store = Arc::new(BookmarkListStore::new(backend.clone(), "user-1"));
    let mutations = BookmarkMutations::new(backend.clone(), store);

    let outcome = mutations
        .create_bookmark("Example", "https://example.com")
        .unwrap();

    assert_eq!(outcome, CreateOutcome::NotSignedIn);
    assert_eq!(backend.insert_calls(), 0);
}

#[test]
fn test_create_inserts_one_row_owned_by_the_acting_user() {
    let (backend, store, mutations) = setup();

    let outcome = mutations
        .create_bookmark("Example", "https://example.com")
        .unwrap();

    let CreateOutcome::Created(bookmark) = outcome else {
        panic!("expected Created, got {:?}", outcome);
    };
    assert_eq!(bookmark.title, "Example");
    assert_eq!(bookmark.url, "https://example.com");
    assert_eq!(bookmark.owner_id, "user-1");
    assert_eq!(backend.insert_calls(), 1);

    // A refetch agrees with the optimistic apply.
    assert_eq!(store.len(), 1);
    store.refresh();
    assert_eq!(store.len(), 1);
    assert_eq!(store.snapshot()[0].id, bookmark.id);
}

/// Nothing deduplicates by URL.
#[test]
fn test_identical_urls_are_allowed() {
    let (_backend, store, mutations) = setup();

    mutations
        .create_bookmark("One", "https://example.com")
        .unwrap();
    mutations
        .create_bookmark("Two", "https://example.com")
        .unwrap();

    assert_eq!(store.len(), 2);
}

#[test]
fn test_create_surfaces_backend_failure_to_the_caller() {
    let (backend, store, mutations) = setup();
    backend.set_mutations_fail(true);

    let result = mutations.create_bookmark("Example", "https://example.com");

    assert!(result.is_err());
    assert!(store.is_empty());
}

#[test]
fn test_remove_deletes_the_row() {
    let (_backend, store, mutations) = setup();
    let outcome = mutations
        .create_bookmark("Example", "https://example.com")
        .unwrap();
    let CreateOutcome::Created(bookmark) = outcome else {
        panic!("expected Created");
    };

    let removed = mutations.remove_bookmark(&bookmark.id).unwrap();

    assert_eq!(removed, RemoveOutcome::Removed);
    assert!(store.is_empty());
    store.refresh();
    assert!(store.is_empty());
}

#[test]
fn test_remove_of_absent_id_is_a_noop() {
    let (_backend, store, mutations) = setup();
    mutations
        .create_bookmark("Example", "https://example.com")
        .unwrap();

    let removed = mutations.remove_bookmark("no-such-id").unwrap();

    assert_eq!(removed, RemoveOutcome::Removed);
    assert_eq!(store.len(), 1);
}

#[test]
fn test_remove_with_empty_id_is_rejected_before_storage() {
    let (_backend, store, mutations) = setup();
    mutations
        .create_bookmark("Example", "https://example.com")
        .unwrap();

    assert_eq!(mutations.remove_bookmark("").unwrap(), RemoveOutcome::Rejected);
    assert_eq!(mutations.remove_bookmark("  ").unwrap(), RemoveOutcome::Rejected);
    assert_eq!(store.len(), 1);
}

// --- form-payload variants ---

#[test]
fn test_form_create_with_missing_fields_aborts_silently() {
    let (backend, store, mutations) = setup();

    mutations.handle_create_form(&json!({"title": "Example"}));
    mutations.handle_create_form(&json!({"url": "https://example.com"}));
    mutations.handle_create_form(&json!({"title": "", "url": "https://example.com"}));

    assert_eq!(backend.insert_calls(), 0);
    assert!(store.is_empty());
}

#[test]
fn test_form_create_inserts_and_refreshes() {
    let (_backend, store, mutations) = setup();

    mutations.handle_create_form(&json!({"title": "Example", "url": "https://example.com"}));

    assert_eq!(store.len(), 1);
    assert_eq!(store.snapshot()[0].title, "Example");
}

/// The form variant logs backend failures instead of surfacing them.
#[test]
fn test_form_create_swallows_backend_failure() {
    let (backend, store, mutations) = setup();
    backend.set_mutations_fail(true);

    mutations.handle_create_form(&json!({"title": "Example", "url": "https://example.com"}));

    assert_eq!(backend.insert_calls(), 1);
    assert!(store.is_empty());
}

#[test]
fn test_form_delete_removes_and_missing_id_aborts() {
    let (_backend, store, mutations) = setup();
    let outcome = mutations
        .create_bookmark("Example", "https://example.com")
        .unwrap();
    let CreateOutcome::Created(bookmark) = outcome else {
        panic!("expected Created");
    };

    mutations.handle_delete_form(&json!({}));
    assert_eq!(store.len(), 1);

    mutations.handle_delete_form(&json!({"id": bookmark.id}));
    assert!(store.is_empty());
}

/// Submitting a bookmark while the realtime channel echoes the same row
/// must leave exactly one entry.
#[test]
fn test_local_create_and_realtime_echo_apply_once() {
    let (_backend, store, mutations) = setup();
    assert!(BookmarkListStore::connect(&store));

    let outcome = mutations.create_bookmark("Foo", "https://foo.com").unwrap();
    let CreateOutcome::Created(bookmark) = outcome else {
        panic!("expected Created");
    };

    thread::sleep(Duration::from_millis(200));

    let snapshot = store.snapshot();
    let matching: Vec<_> = snapshot.iter().filter(|b| b.title == "Foo").collect();
    assert_eq!(matching.len(), 1);
    assert_eq!(matching[0].id, bookmark.id);
}
