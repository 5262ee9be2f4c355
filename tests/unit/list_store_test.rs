//! Unit tests for the BookmarkListStore.
//!
//! Cover the reconciliation contract: wholesale install on load, ordered
//! insert under out-of-order realtime delivery, duplicate collapse, silent
//! no-op deletes, degraded refresh, and subscription lifecycle.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use linkdock::backend::api::BackendApi;
use linkdock::backend::local::LocalBackend;
use linkdock::backend::realtime::ChangeEvent;
use linkdock::managers::list_store::BookmarkListStore;
use linkdock::types::bookmark::{Bookmark, BookmarkDraft};
use linkdock::types::user::User;

fn demo_user() -> User {
    User {
        id: "user-1".to_string(),
        email: None,
    }
}

fn setup() -> (Arc<LocalBackend>, Arc<BookmarkListStore>) {
    let backend = Arc::new(LocalBackend::new().expect("local backend"));
    let store = Arc::new(BookmarkListStore::new(backend.clone(), "user-1"));
    (backend, store)
}

fn mk(id: &str, title: &str, created_at: i64, seq: i64) -> Bookmark {
    Bookmark {
        id: id.to_string(),
        title: title.to_string(),
        url: format!("https://{}.example.com", id),
        created_at,
        seq,
        owner_id: "user-1".to_string(),
    }
}

fn titles(store: &BookmarkListStore) -> Vec<String> {
    store.snapshot().into_iter().map(|b| b.title).collect()
}

#[test]
fn test_refresh_installs_rows_newest_first() {
    let (backend, store) = setup();
    let user = demo_user();
    backend
        .seed_bookmark(&user, "Example", "https://example.com", 5)
        .unwrap();
    backend
        .seed_bookmark(&user, "YouTube", "https://youtube.com", 10)
        .unwrap();

    assert!(store.refresh());

    assert_eq!(titles(&store), vec!["YouTube", "Example"]);
}

#[test]
fn test_refresh_replaces_the_list_wholesale() {
    let (backend, store) = setup();
    store.apply_event(&ChangeEvent::Inserted(mk("stale", "Stale", 99, 99)));

    let user = demo_user();
    backend
        .seed_bookmark(&user, "Example", "https://example.com", 5)
        .unwrap();
    assert!(store.refresh());

    assert_eq!(titles(&store), vec!["Example"]);
}

#[test]
fn test_refresh_failure_keeps_last_known_list() {
    let (backend, store) = setup();
    let user = demo_user();
    backend
        .seed_bookmark(&user, "Example", "https://example.com", 5)
        .unwrap();
    assert!(store.refresh());

    backend.set_listing_fails(true);

    assert!(!store.refresh());
    assert_eq!(titles(&store), vec!["Example"]);
}

#[test]
fn test_duplicate_insert_delivery_collapses_to_one_entry() {
    let (_backend, store) = setup();
    let event = ChangeEvent::Inserted(mk("a", "A", 10, 1));

    assert!(store.apply_event(&event));
    assert!(!store.apply_event(&event));

    assert_eq!(store.len(), 1);
}

#[test]
fn test_out_of_order_delivery_still_lands_in_key_order() {
    let (_backend, store) = setup();

    store.apply_event(&ChangeEvent::Inserted(mk("mid", "Mid", 7, 2)));
    store.apply_event(&ChangeEvent::Inserted(mk("old", "Old", 5, 1)));
    store.apply_event(&ChangeEvent::Inserted(mk("new", "New", 10, 3)));

    assert_eq!(titles(&store), vec!["New", "Mid", "Old"]);
}

#[test]
fn test_created_at_ties_break_by_insertion_order() {
    let (_backend, store) = setup();

    store.apply_event(&ChangeEvent::Inserted(mk("first", "First", 10, 1)));
    store.apply_event(&ChangeEvent::Inserted(mk("second", "Second", 10, 2)));

    assert_eq!(titles(&store), vec!["Second", "First"]);
}

#[test]
fn test_delete_of_absent_id_is_a_silent_noop() {
    let (_backend, store) = setup();
    store.apply_event(&ChangeEvent::Inserted(mk("a", "A", 10, 1)));

    assert!(!store.apply_event(&ChangeEvent::Deleted("missing".to_string())));

    assert_eq!(store.len(), 1);
}

#[test]
fn test_delete_removes_matching_id() {
    let (_backend, store) = setup();
    store.apply_event(&ChangeEvent::Inserted(mk("a", "A", 10, 1)));
    store.apply_event(&ChangeEvent::Inserted(mk("b", "B", 11, 2)));

    assert!(store.apply_event(&ChangeEvent::Deleted("a".to_string())));

    assert_eq!(titles(&store), vec!["B"]);
}

/// Local optimistic apply and the realtime echo of the same row must land
/// as exactly one entry, in either arrival order.
#[test]
fn test_optimistic_apply_collapses_with_realtime_echo() {
    let (_backend, store) = setup();
    let row = mk("a", "A", 10, 1);

    store.apply_local_insert(row.clone());
    store.apply_event(&ChangeEvent::Inserted(row.clone()));

    assert_eq!(store.len(), 1);

    store.apply_local_remove("a");
    store.apply_event(&ChangeEvent::Deleted("a".to_string()));

    assert!(store.is_empty());
}

#[test]
fn test_connect_applies_live_events() {
    let (backend, store) = setup();
    assert!(BookmarkListStore::connect(&store));
    assert!(store.is_live());

    let draft = BookmarkDraft::parse("Docs", "https://docs.rs").unwrap();
    backend.insert_bookmark(&draft, &demo_user()).unwrap();

    thread::sleep(Duration::from_millis(200));
    assert_eq!(titles(&store), vec!["Docs"]);
}

/// Re-arming tears the previous subscription down first.
#[test]
fn test_reconnect_does_not_duplicate_subscriptions() {
    let (backend, store) = setup();

    assert!(BookmarkListStore::connect(&store));
    assert_eq!(backend.subscriber_count(), 1);

    assert!(BookmarkListStore::connect(&store));
    assert_eq!(backend.subscriber_count(), 1);
}

#[test]
fn test_disconnect_releases_the_subscription() {
    let (backend, store) = setup();
    assert!(BookmarkListStore::connect(&store));

    store.disconnect();

    assert!(!store.is_live());
    assert_eq!(backend.subscriber_count(), 0);
}

/// Dropping the store must release the channel too.
#[test]
fn test_drop_releases_the_subscription() {
    let (backend, store) = setup();
    assert!(BookmarkListStore::connect(&store));
    assert_eq!(backend.subscriber_count(), 1);

    drop(store);

    assert_eq!(backend.subscriber_count(), 0);
}

#[test]
fn test_subscribe_failure_degrades_to_a_static_list() {
    let (backend, store) = setup();
    let user = demo_user();
    backend
        .seed_bookmark(&user, "Example", "https://example.com", 5)
        .unwrap();
    store.refresh();

    backend.set_subscribe_fails(true);

    assert!(!BookmarkListStore::connect(&store));
    assert!(!store.is_live());
    assert_eq!(titles(&store), vec!["Example"]);
}
