//! RPC method handler for the linkdock JSON-RPC protocol.
//!
//! Extracted from `rpc_server.rs` so it can be unit-tested independently.
//! The `handle_method` function dispatches JSON-RPC method calls to the
//! auth gateway, mutation endpoints, list store, and shell via the `App`
//! struct.

use serde_json::{json, Value};

use crate::app::App;
use crate::managers::auth_gateway::CallbackRequest;
use crate::managers::mutations::{CreateOutcome, RemoveOutcome};
use crate::types::session::OAuthProvider;

fn str_param<'a>(params: &'a Value, key: &str) -> Option<&'a str> {
    params.get(key).and_then(|v| v.as_str())
}

/// Dispatch a JSON-RPC method call to the appropriate handler.
///
/// Returns `Ok(Value)` on success or `Err(String)` with an error message.
pub fn handle_method(app: &App, method: &str, params: &Value) -> Result<Value, String> {
    match method {
        // ─── Auth ───
        "auth.signin" => {
            let origin = str_param(params, "origin").ok_or("missing origin")?;
            let provider = str_param(params, "provider").unwrap_or("google");
            let provider =
                OAuthProvider::parse(provider).ok_or_else(|| format!("unknown provider: {}", provider))?;
            let url = app
                .auth
                .begin_sign_in(provider, origin)
                .map_err(|e| e.to_string())?;
            Ok(json!({"url": url}))
        }
        "auth.callback" => {
            let request = CallbackRequest {
                code: str_param(params, "code").map(str::to_string),
                next: str_param(params, "next").map(str::to_string),
                origin: str_param(params, "origin").ok_or("missing origin")?.to_string(),
                forwarded_host: str_param(params, "forwarded_host").map(str::to_string),
            };
            let redirect = app.auth.complete_sign_in(&request);
            // A successful exchange leaves a signed-in user; seed and arm
            // the session before the browser follows the redirect.
            app.open_session();
            Ok(json!({"redirect": redirect}))
        }
        "auth.signout" => {
            app.sign_out();
            Ok(json!({"ok": true}))
        }
        "auth.user" => Ok(json!({"user": app.auth.current_user()})),

        // ─── Bookmarks (controlled-input variants) ───
        "bookmark.create" => {
            let title = str_param(params, "title").ok_or("missing title")?;
            let url = str_param(params, "url").ok_or("missing url")?;
            let mutations = app.session_mutations().ok_or("not signed in")?;
            match mutations.create_bookmark(title, url).map_err(|e| e.to_string())? {
                CreateOutcome::Created(bookmark) => Ok(json!({"ok": true, "bookmark": bookmark})),
                CreateOutcome::Rejected(rejection) => {
                    Ok(json!({"ok": false, "reason": rejection.as_str()}))
                }
                CreateOutcome::NotSignedIn => Err("not signed in".to_string()),
            }
        }
        "bookmark.delete" => {
            let id = str_param(params, "id").ok_or("missing id")?;
            let mutations = app.session_mutations().ok_or("not signed in")?;
            match mutations.remove_bookmark(id).map_err(|e| e.to_string())? {
                RemoveOutcome::Removed => Ok(json!({"ok": true})),
                RemoveOutcome::Rejected => Ok(json!({"ok": false, "reason": "missing id"})),
            }
        }
        "bookmark.list" => {
            let store = app.session_store().ok_or("not signed in")?;
            serde_json::to_value(store.snapshot()).map_err(|e| e.to_string())
        }
        "bookmark.refresh" => {
            let store = app.session_store().ok_or("not signed in")?;
            Ok(json!({"ok": store.refresh()}))
        }

        // ─── Bookmarks (form-payload variants, log-only failures) ───
        "form.bookmark.add" => {
            if let Some(mutations) = app.session_mutations() {
                mutations.handle_create_form(params);
            }
            Ok(json!({"ok": true}))
        }
        "form.bookmark.delete" => {
            if let Some(mutations) = app.session_mutations() {
                mutations.handle_delete_form(params);
            }
            Ok(json!({"ok": true}))
        }

        // ─── View ───
        "view.current" => serde_json::to_value(app.current_view()).map_err(|e| e.to_string()),
        "view.open_modal" => {
            app.open_modal();
            Ok(json!({"ok": true}))
        }
        "view.close_modal" => {
            app.close_modal();
            Ok(json!({"ok": true}))
        }
        "view.input" => {
            let field = str_param(params, "field").ok_or("missing field")?;
            let value = str_param(params, "value").ok_or("missing value")?;
            match field {
                "title" => app.set_modal_title(value),
                "url" => app.set_modal_url(value),
                other => return Err(format!("unknown field: {}", other)),
            }
            Ok(json!({"ok": true}))
        }
        "view.submit_modal" => {
            // Submit path of the modal: buffered inputs go through the
            // controlled create, and the modal closes whatever the outcome.
            let Some(draft) = app.take_modal_draft() else {
                return Err("modal not open".to_string());
            };
            let mutations = app.session_mutations().ok_or("not signed in")?;
            match mutations
                .create_bookmark(&draft.title, &draft.url)
                .map_err(|e| e.to_string())?
            {
                CreateOutcome::Created(bookmark) => Ok(json!({"ok": true, "bookmark": bookmark})),
                CreateOutcome::Rejected(rejection) => {
                    Ok(json!({"ok": false, "reason": rejection.as_str()}))
                }
                CreateOutcome::NotSignedIn => Err("not signed in".to_string()),
            }
        }

        // ─── Ping ───
        "ping" => Ok(json!({"pong": true})),

        _ => Err(format!("unknown method: {}", method)),
    }
}
