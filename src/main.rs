//! linkdock demo mode — walks the whole flow against the in-process
//! stand-in backend: sign-in, board rendering, live cross-session sync,
//! deletion, sign-out.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use linkdock::app::App;
use linkdock::backend::local::LocalBackend;
use linkdock::managers::list_store::BookmarkListStore;
use linkdock::rpc_handler::handle_method;
use linkdock::types::session::OAuthProvider;
use linkdock::types::user::User;
use linkdock::ui::shell::View;

use serde_json::json;
use tracing_subscriber::EnvFilter;

fn section(name: &str) {
    println!();
    println!("───────────────────────────────────────────────");
    println!("  {}", name);
    println!("───────────────────────────────────────────────");
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("linkdock v{} — demo mode", env!("CARGO_PKG_VERSION"));

    let backend = Arc::new(LocalBackend::new().expect("local backend"));
    let app = App::with_backend(backend.clone());

    section("Sign-in flow");
    let url = app
        .auth
        .begin_sign_in(OAuthProvider::Google, "http://localhost:3000")
        .expect("sign-in url");
    println!("  provider handoff: {}", url);

    let user = User {
        id: "demo-user".to_string(),
        email: Some("demo@example.com".to_string()),
    };
    let code = backend.issue_code(&user);
    let redirect = handle_method(
        &app,
        "auth.callback",
        &json!({"code": code, "origin": "http://localhost:3000"}),
    )
    .expect("callback");
    println!("  callback redirect: {}", redirect["redirect"]);
    println!("  signed in as: {:?}", app.auth.current_user().map(|u| u.id));

    section("Shortcut board");
    for (title, url) in [
        ("YouTube", "https://youtube.com"),
        ("Example", "https://example.com"),
        ("Rust", "https://rust-lang.org"),
    ] {
        handle_method(&app, "bookmark.create", &json!({"title": title, "url": url}))
            .expect("create");
    }
    match app.current_view() {
        View::Board { bookmarks, .. } => {
            println!("  {} shortcuts, newest first:", bookmarks.len());
            for b in &bookmarks {
                println!("    {} -> {}", b.title, b.url);
            }
        }
        View::SignIn => println!("  unexpected sign-in view"),
    }

    section("Live sync across sessions");
    // A second open session for the same user, fed only by the change feed.
    let other = Arc::new(BookmarkListStore::new(backend.clone(), user.id.clone()));
    other.refresh();
    BookmarkListStore::connect(&other);
    handle_method(
        &app,
        "bookmark.create",
        &json!({"title": "Docs", "url": "https://docs.rs"}),
    )
    .expect("create");
    thread::sleep(Duration::from_millis(200));
    println!(
        "  second session sees {} shortcuts (first: {})",
        other.len(),
        other
            .snapshot()
            .first()
            .map(|b| b.title.clone())
            .unwrap_or_default()
    );
    other.disconnect();

    section("Deletion");
    let first_id = app
        .session_store()
        .and_then(|s| s.snapshot().first().map(|b| b.id.clone()))
        .expect("non-empty list");
    handle_method(&app, "bookmark.delete", &json!({"id": first_id})).expect("delete");
    println!(
        "  removed newest shortcut, {} remain",
        app.session_store().map(|s| s.len()).unwrap_or(0)
    );

    section("Sign-out");
    handle_method(&app, "auth.signout", &json!({})).expect("signout");
    match app.current_view() {
        View::SignIn => println!("  back on the sign-in view"),
        View::Board { .. } => println!("  unexpected board view"),
    }
}
