//! Plain-text rendering of the settings form.

use std::fmt::Write as _;

use form_controller::{FormPhase, FormState, Notice};

const NO_TOKEN: &str = "(not set)";
const NEW_TOKEN: &str = "(new token entered)";

pub fn progress_line(state: &FormState) -> Option<&'static str> {
    match state.phase() {
        FormPhase::Idle => None,
        FormPhase::Loading => Some("Loading..."),
        FormPhase::Saving => Some("Saving..."),
        FormPhase::Deleting => Some("Disconnecting..."),
    }
}

pub fn render_form(state: &FormState) -> String {
    let mut out = String::new();
    let business = state
        .business_id
        .as_ref()
        .map(|id| id.as_str())
        .unwrap_or("-");
    let _ = writeln!(out, "Shopify integration for business {business}");

    match state.status.summary() {
        Some(summary) => {
            let active = if summary.is_active { "" } else { ", inactive" };
            let _ = writeln!(out, "  Status:       connected ({}{active})", summary.store_url);
            if let Some(updated_at) = summary.updated_at {
                let _ = writeln!(
                    out,
                    "  Last updated: {}",
                    updated_at.format("%Y-%m-%d %H:%M:%S UTC")
                );
            }
        }
        None => {
            let _ = writeln!(out, "  Status:       not connected");
        }
    }

    let _ = writeln!(out, "  Store URL:    {}", state.draft.store_url);
    let _ = writeln!(out, "  Access token: {}", token_line(state));
    let _ = writeln!(out, "  API version:  {}", state.draft.api_version);

    match &state.notice {
        Some(Notice::Success(text)) => {
            let _ = writeln!(out, "  [ok] {text}");
        }
        Some(Notice::Error(text)) => {
            let _ = writeln!(out, "  [error] {text}");
        }
        None => {}
    }
    out
}

fn token_line(state: &FormState) -> String {
    if state.draft.has_token() {
        return NEW_TOKEN.to_string();
    }
    match state.token_display() {
        Some(mask) => format!("{mask} (leave blank to keep)"),
        None => NO_TOKEN.to_string(),
    }
}

#[cfg(test)]
#[path = "tests/render_tests.rs"]
mod tests;
