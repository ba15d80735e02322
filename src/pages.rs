#![cfg(feature = "web")]

use axum::{Json, extract::State, response::IntoResponse, response::Response};
use serde_json::json;
use std::env;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use crate::app::AppState;
use crate::charts::{AGE_BREAKDOWN_VIEW, YEARLY_SUPPORT_VIEW};
use crate::datasets::{
    AGE_BREAKDOWN, CASES, HOME_AGE_LABELS, HOME_AGE_VALUES, NEWS, Source, YEARLY_SUPPORT,
    age_breakdown_fallback, empty_fallback, yearly_support_fallback,
};
use crate::templates::script_json;

pub async fn home(State(state): State<Arc<AppState>>) -> Response {
    state.render(
        "index",
        &json!({
            "page": "home",
            "age_labels": script_json(&HOME_AGE_LABELS),
            "age_values": script_json(&HOME_AGE_VALUES),
        }),
    )
}

pub async fn news(State(state): State<Arc<AppState>>) -> Response {
    render_table(&state, "news", NEWS)
}

pub async fn cases(State(state): State<Arc<AppState>>) -> Response {
    render_table(&state, "cases", CASES)
}

// List pages show the sheet as-is; a missing sheet renders an empty list.
fn render_table(state: &AppState, page: &str, source: Source) -> Response {
    let dataset = source.load_or(&state.config.data_dir, empty_fallback);

    state.render(
        page,
        &json!({
            "page": page,
            "columns": dataset.column_names(),
            "rows": dataset.rows(),
        }),
    )
}

pub async fn resources(State(state): State<Arc<AppState>>) -> Response {
    state.render("resources", &json!({ "page": "resources" }))
}

pub async fn about(State(state): State<Arc<AppState>>) -> Response {
    state.render("about", &json!({ "page": "about" }))
}

/// Age breakdown and yearly support charts
///
/// Each chart falls back to its built-in dataset when the CSV is missing,
/// unreadable, or has a shape the chart view cannot use.
pub async fn statistics(State(state): State<Arc<AppState>>) -> Response {
    let data_dir = &state.config.data_dir;

    let age = AGE_BREAKDOWN.load_or(data_dir, age_breakdown_fallback);
    let support = YEARLY_SUPPORT.load_or(data_dir, yearly_support_fallback);

    let age_chart = AGE_BREAKDOWN_VIEW.apply_or(&age, age_breakdown_fallback);
    let support_chart = YEARLY_SUPPORT_VIEW.apply_or(&support, yearly_support_fallback);

    state.render(
        "statistics",
        &json!({
            "page": "statistics",
            "age_types": age_chart.series_names,
            "support_types": support_chart.series_names,
            "age_chart": script_json(&age_chart),
            "support_chart": script_json(&support_chart),
        }),
    )
}

/// Filesystem report for diagnosing deployments
pub async fn debug(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let config = &state.config;
    let css_path = config.static_dir.join("css").join("style.css");

    let css_preview = match fs::read_to_string(&css_path) {
        Ok(content) if content.chars().count() > 200 => {
            format!("{}...", content.chars().take(200).collect::<String>())
        }
        Ok(content) => content,
        Err(_) => "파일을 읽을 수 없음".to_string(),
    };

    let current_dir = env::current_dir()
        .map(|dir| dir.display().to_string())
        .unwrap_or_default();

    Json(json!({
        "current_dir": current_dir,
        "static_dir_used": config.static_dir.display().to_string(),
        "static_exists": config.static_dir.exists(),
        "static_files": list_dir(&config.static_dir),
        "static_css_files": list_dir(&config.static_dir.join("css")),
        "static_css_exists": css_path.exists(),
        "css_file_size": fs::metadata(&css_path).map(|m| m.len()).unwrap_or(0),
        "css_preview": css_preview,
        "data_dir_used": config.data_dir.display().to_string(),
        "data_exists": config.data_dir.exists(),
        "data_files": list_dir(&config.data_dir),
        "reviews_file": config.reviews_file.display().to_string(),
        "reviews_file_exists": config.reviews_file.exists(),
    }))
}

fn list_dir(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .map(|entries| {
            entries
                .flatten()
                .map(|entry| entry.file_name().to_string_lossy().to_string())
                .collect()
        })
        .unwrap_or_default();
    names.sort();
    names
}
