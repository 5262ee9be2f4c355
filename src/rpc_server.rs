//! linkdock RPC server — JSON-RPC over stdin/stdout for the webview shell.
//!
//! Protocol: one JSON object per line (newline-delimited JSON).
//! Request:  {"id":1, "method":"bookmark.create", "params":{"title":"...","url":"..."}}
//! Response: {"id":1, "result":{...}} or {"id":1, "error":"..."}

use std::io::{self, BufRead, Write};
use std::sync::Arc;
use std::time::Instant;

use serde_json::{json, Value};
use tracing::info;
use tracing_subscriber::EnvFilter;

use linkdock::app::App;
use linkdock::backend::local::LocalBackend;
use linkdock::rpc_handler::handle_method;

/// Simple rate limiter: max requests per second across all methods.
struct RateLimiter {
    window_start: Instant,
    request_count: u32,
    max_per_second: u32,
}

impl RateLimiter {
    fn new(max_per_second: u32) -> Self {
        Self {
            window_start: Instant::now(),
            request_count: 0,
            max_per_second,
        }
    }

    /// Returns true if the request is allowed, false if rate-limited.
    fn check(&mut self) -> bool {
        if self.window_start.elapsed().as_secs() >= 1 {
            self.window_start = Instant::now();
            self.request_count = 0;
        }
        self.request_count += 1;
        self.request_count <= self.max_per_second
    }
}

fn build_app() -> App {
    #[cfg(feature = "network")]
    if let Some(config) = linkdock::config::BackendConfig::from_env() {
        match App::new(&config) {
            Ok(app) => {
                info!(base_url = %config.base_url, "connected to hosted backend");
                return app;
            }
            Err(e) => {
                eprintln!("failed to build backend client: {}", e);
                std::process::exit(1);
            }
        }
    }
    // No backend configured: run against the in-process stand-in.
    let backend = LocalBackend::new().unwrap_or_else(|e| {
        eprintln!("failed to open local backend: {}", e);
        std::process::exit(1);
    });
    info!("running against the local stand-in backend");
    App::with_backend(Arc::new(backend))
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let app = build_app();

    // Signal ready
    let ready = json!({"event": "ready", "version": env!("CARGO_PKG_VERSION")});
    println!("{}", ready);
    let _ = io::stdout().flush();

    // Max 200 RPC requests per second to keep a broken front-end loop from
    // hammering the hosted backend.
    let mut rate_limiter = RateLimiter::new(200);

    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = match line {
            Ok(line) => line,
            Err(_) => break,
        };
        if line.trim().is_empty() {
            continue;
        }

        let req: Value = match serde_json::from_str(&line) {
            Ok(v) => v,
            Err(e) => {
                println!("{}", json!({"id": null, "error": format!("parse error: {}", e)}));
                let _ = io::stdout().flush();
                continue;
            }
        };

        let id = req.get("id").cloned().unwrap_or(Value::Null);

        if !rate_limiter.check() {
            println!("{}", json!({"id": id, "error": "rate limit exceeded"}));
            let _ = io::stdout().flush();
            continue;
        }

        let method = req.get("method").and_then(|v| v.as_str()).unwrap_or("");
        let params = req.get("params").cloned().unwrap_or(json!({}));

        let response = match handle_method(&app, method, &params) {
            Ok(result) => json!({"id": id, "result": result}),
            Err(error) => json!({"id": id, "error": error}),
        };
        println!("{}", response);
        let _ = io::stdout().flush();
    }

    app.close_session();
}
