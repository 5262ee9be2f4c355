//! Unit tests for the AuthGateway public API.
//!
//! These tests exercise the sign-in handoff, the OAuth callback redirect
//! resolution (including the forwarded-host branch), and the fail-open
//! behavior of `current_user`, against the in-process backend stand-in.

use std::sync::Arc;

use rstest::rstest;

use linkdock::backend::local::LocalBackend;
use linkdock::managers::auth_gateway::{AuthGateway, CallbackRequest, AUTH_ERROR_PATH};
use linkdock::types::session::OAuthProvider;
use linkdock::types::user::User;

fn setup() -> (Arc<LocalBackend>, AuthGateway) {
    let backend = Arc::new(LocalBackend::new().expect("local backend"));
    let gateway = AuthGateway::new(backend.clone());
    (backend, gateway)
}

fn demo_user() -> User {
    User {
        id: "user-1".to_string(),
        email: Some("user@example.com".to_string()),
    }
}

#[test]
fn test_begin_sign_in_targets_the_callback_route() {
    let (_backend, gateway) = setup();

    let url = gateway
        .begin_sign_in(OAuthProvider::Google, "http://localhost:3000")
        .unwrap();

    assert!(url.contains("google"));
    assert!(url.contains("http://localhost:3000/auth/callback"));
}

#[test]
fn test_callback_with_valid_code_signs_in_and_redirects_to_next() {
    let (backend, gateway) = setup();
    let code = backend.issue_code(&demo_user());

    let redirect = gateway.complete_sign_in(&CallbackRequest {
        code: Some(code),
        next: Some("/dashboard".to_string()),
        origin: "http://localhost:3000".to_string(),
        forwarded_host: None,
    });

    assert_eq!(redirect, "http://localhost:3000/dashboard");
    assert_eq!(gateway.current_user().map(|u| u.id), Some("user-1".to_string()));
}

#[test]
fn test_callback_defaults_next_to_root() {
    let (backend, gateway) = setup();
    let code = backend.issue_code(&demo_user());

    let redirect = gateway.complete_sign_in(&CallbackRequest {
        code: Some(code),
        next: None,
        origin: "http://localhost:3000".to_string(),
        forwarded_host: None,
    });

    assert_eq!(redirect, "http://localhost:3000/");
}

/// Behind a reverse proxy the forwarded host must win over the request
/// origin, always with https.
#[test]
fn test_callback_prefers_forwarded_host() {
    let (backend, gateway) = setup();
    let code = backend.issue_code(&demo_user());

    let redirect = gateway.complete_sign_in(&CallbackRequest {
        code: Some(code),
        next: Some("/after".to_string()),
        origin: "http://10.0.0.5:8080".to_string(),
        forwarded_host: Some("dock.example.com".to_string()),
    });

    assert_eq!(redirect, "https://dock.example.com/after");
}

#[test]
fn test_callback_without_code_redirects_to_error_view() {
    let (_backend, gateway) = setup();

    let redirect = gateway.complete_sign_in(&CallbackRequest {
        code: None,
        next: Some("/after".to_string()),
        origin: "http://localhost:3000".to_string(),
        forwarded_host: Some("dock.example.com".to_string()),
    });

    assert_eq!(redirect, format!("http://localhost:3000{}", AUTH_ERROR_PATH));
    assert!(gateway.current_user().is_none());
}

#[test]
fn test_callback_with_unknown_code_redirects_to_error_view() {
    let (_backend, gateway) = setup();

    let redirect = gateway.complete_sign_in(&CallbackRequest {
        code: Some("bogus".to_string()),
        next: None,
        origin: "http://localhost:3000".to_string(),
        forwarded_host: None,
    });

    assert_eq!(redirect, format!("http://localhost:3000{}", AUTH_ERROR_PATH));
    assert!(gateway.current_user().is_none());
}

/// A `next` that is not a local path must not turn the callback into an
/// open redirect.
#[rstest]
#[case(Some("https://evil.example"), "http://localhost:3000/")]
#[case(Some("//evil.example"), "http://localhost:3000/")]
#[case(Some(""), "http://localhost:3000/")]
#[case(Some("/ok"), "http://localhost:3000/ok")]
fn test_callback_sanitizes_next(#[case] next: Option<&str>, #[case] expected: &str) {
    let (backend, gateway) = setup();
    let code = backend.issue_code(&demo_user());

    let redirect = gateway.complete_sign_in(&CallbackRequest {
        code: Some(code),
        next: next.map(str::to_string),
        origin: "http://localhost:3000".to_string(),
        forwarded_host: None,
    });

    assert_eq!(redirect, expected);
}

/// Transport failures may only ever fail open to the sign-in view.
#[test]
fn test_current_user_treats_transport_failure_as_signed_out() {
    let (backend, gateway) = setup();
    backend.force_sign_in(&demo_user());
    assert!(gateway.current_user().is_some());

    backend.set_auth_fails(true);

    assert!(gateway.current_user().is_none());
}

#[test]
fn test_sign_out_clears_the_session() {
    let (backend, gateway) = setup();
    backend.force_sign_in(&demo_user());
    assert!(gateway.current_user().is_some());

    gateway.sign_out();

    assert!(gateway.current_user().is_none());
}

/// A failing sign-out call is logged, not propagated.
#[test]
fn test_sign_out_swallows_backend_failure() {
    let (backend, gateway) = setup();
    backend.force_sign_in(&demo_user());
    backend.set_auth_fails(true);

    gateway.sign_out();
}
