//! RPC method handler for the repomark JSON-RPC protocol.
//!
//! Extracted from `rpc_server.rs` so it can be unit-tested independently.
//! `handle_method` dispatches one call to the `App`; errors come back as
//! plain strings for the `"error"` field of the response.

use std::path::PathBuf;

use serde_json::{json, Value};

use crate::app::{App, ImportSource};
use crate::managers::identity::IdentityTrait;
use crate::services::search::username_from_suggestion;
use crate::types::bookmark::AddOutcome;
use crate::types::github::{Repository, Suggestion};

fn str_param<'a>(params: &'a Value, key: &str) -> Result<&'a str, String> {
    params
        .get(key)
        .and_then(|v| v.as_str())
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| format!("missing {}", key))
}

fn outcome_json(outcome: AddOutcome) -> Value {
    match outcome {
        AddOutcome::Added(record) => json!({"status": "added", "bookmark": record}),
        AddOutcome::AlreadyBookmarked => json!({"status": "already_bookmarked"}),
        AddOutcome::Ignored => json!({"status": "ignored"}),
    }
}

/// Dispatch a JSON-RPC method call to the appropriate handler.
///
/// Returns `Ok(Value)` on success or `Err(String)` with an error message.
pub async fn handle_method(app: &App, method: &str, params: &Value) -> Result<Value, String> {
    match method {
        // ─── Session ───
        "auth.sign_in" => {
            let user_id = str_param(params, "user_id")?.trim();
            let phase = app.sign_in(user_id).await.map_err(|e| e.to_string())?;
            let count = app.store.bookmarks().len();
            Ok(json!({"user_id": user_id, "phase": phase, "count": count}))
        }
        "auth.sign_out" => {
            let phase = app.sign_out().await;
            Ok(json!({"phase": phase}))
        }
        "auth.current" => Ok(json!({
            "user_id": app.identity.current_user(),
            "phase": app.store.phase(),
        })),

        // ─── Bookmarks ───
        "bookmark.list" => Ok(json!({"items": app.store.bookmarks()})),
        "bookmark.add" => {
            let repo = params.get("repo").ok_or("missing repo")?;
            let repo: Repository =
                serde_json::from_value(repo.clone()).map_err(|e| format!("invalid repo: {}", e))?;
            let outcome = app.add_repository(&repo).await.map_err(|e| e.to_string())?;
            Ok(outcome_json(outcome))
        }
        "bookmark.add_by_name" => {
            let full_name = str_param(params, "full_name")?;
            let outcome = app.add_by_name(full_name).await.map_err(|e| e.to_string())?;
            Ok(outcome_json(outcome))
        }
        "bookmark.remove" => {
            let id = str_param(params, "id")?;
            app.store.remove_bookmark(id).await.map_err(|e| e.to_string())?;
            Ok(json!({"ok": true}))
        }
        "bookmark.clear" => {
            let cleared = app.clear_bookmarks().await.map_err(|e| e.to_string())?;
            Ok(json!({"cleared": cleared}))
        }
        "bookmark.is_bookmarked" => {
            let id = str_param(params, "id")?;
            let remote = params.get("remote").and_then(|v| v.as_bool()).unwrap_or(false);
            let bookmarked = if remote {
                app.store.is_bookmarked_remotely(id).await.map_err(|e| e.to_string())?
            } else {
                app.store.is_bookmarked(id)
            };
            Ok(json!({"bookmarked": bookmarked}))
        }
        "bookmark.activity" => Ok(json!({"points": app.activity()})),

        // ─── Import ───
        "import.start" => {
            let source = if let Some(path) = params.get("path").and_then(|v| v.as_str()) {
                ImportSource::File(PathBuf::from(path))
            } else if let Some(text) = params.get("text").and_then(|v| v.as_str()) {
                ImportSource::Text(text.to_string())
            } else {
                return Err("missing path or text".to_string());
            };
            app.start_import(source).map_err(|e| e.to_string())?;
            Ok(json!({"started": true}))
        }
        "import.cancel" => Ok(json!({"cancelled": app.importer.cancel()})),
        "import.status" => serde_json::to_value(app.importer.status()).map_err(|e| e.to_string()),
        "import.clear_summary" => {
            app.importer.clear_summary();
            Ok(json!({"ok": true}))
        }

        // ─── GitHub ───
        "github.suggest" => {
            let query = params.get("query").and_then(|v| v.as_str()).unwrap_or("");
            let suggestions = app.search.suggest(query).await.map_err(|e| e.to_string())?;
            Ok(json!({"items": suggestions}))
        }
        "github.user_repos" => {
            let username = match params.get("suggestion") {
                Some(s) => {
                    let suggestion: Suggestion = serde_json::from_value(s.clone())
                        .map_err(|e| format!("invalid suggestion: {}", e))?;
                    username_from_suggestion(&suggestion)
                        .map(str::to_string)
                        .ok_or("suggestion has no owner")?
                }
                None => str_param(params, "username")?.to_string(),
            };
            let repos = app.user_repos(&username).await.map_err(|e| e.to_string())?;
            Ok(json!({"username": username, "items": repos}))
        }

        // ─── Settings ───
        "settings.get" => {
            let mut settings = app.settings();
            if settings.github.token.is_some() {
                settings.github.token = Some("********".to_string());
            }
            serde_json::to_value(settings).map_err(|e| e.to_string())
        }
        "settings.set" => {
            let key = str_param(params, "key")?;
            let value = params.get("value").cloned().ok_or("missing value")?;
            app.set_setting(key, value).map_err(|e| e.to_string())?;
            Ok(json!({"ok": true}))
        }

        // ─── Ping ───
        "ping" => Ok(json!({"pong": true, "version": env!("CARGO_PKG_VERSION")})),

        _ => Err(format!("unknown method: {}", method)),
    }
}
