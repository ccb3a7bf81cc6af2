mod resources;

pub use resources::*;

use std::collections::BTreeMap;

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Extension, Json,
};
use serde::Deserialize;
use serde_json::Value;

use super::middleware::Developer;
use crate::error::ServiceError;
use crate::layout::convert_external_layouts;
use crate::models::*;
use crate::repo::{EditingContext, Repository};
use crate::validation::{ensure_org_and_app, LayoutSetName};

type ApiError = (StatusCode, String);

// ============================================================
// Error Handling
// ============================================================

/// Map a service error to a status code. Client errors are logged as warnings,
/// everything else as errors; the message is passed through in both cases.
fn service_error(e: ServiceError) -> ApiError {
    match e {
        ServiceError::BadRequest(msg) => {
            tracing::warn!("Bad request: {}", msg);
            (StatusCode::BAD_REQUEST, msg)
        }
        ServiceError::NotFound(msg) => {
            tracing::warn!("Not found: {}", msg);
            (StatusCode::NOT_FOUND, msg)
        }
        ServiceError::Conflict(msg) => {
            tracing::warn!("Conflict: {}", msg);
            (StatusCode::CONFLICT, msg)
        }
        other => {
            tracing::error!("Internal error: {}", other);
            (StatusCode::INTERNAL_SERVER_ERROR, other.to_string())
        }
    }
}

// ============================================================
// Request parameters
// ============================================================

#[derive(Debug, Deserialize)]
pub struct AppPath {
    pub org: String,
    pub app: String,
}

#[derive(Debug, Deserialize)]
pub struct LayoutPath {
    pub org: String,
    pub app: String,
    pub layout_name: String,
}

/// The `layoutSetName` query parameter shared by most app-development routes.
#[derive(Debug, Default, Deserialize)]
pub struct LayoutSetQuery {
    #[serde(rename = "layoutSetName")]
    pub layout_set_name: Option<String>,
}

impl LayoutSetQuery {
    fn parse(&self) -> Result<Option<LayoutSetName>, ApiError> {
        LayoutSetName::parse_optional(self.layout_set_name.as_deref()).map_err(service_error)
    }
}

fn editing_context(
    org: &str,
    app: &str,
    developer: &Developer,
) -> Result<EditingContext, ApiError> {
    ensure_org_and_app(org, app).map_err(service_error)?;
    Ok(EditingContext::new(org, app, developer.0.clone()))
}

// ============================================================
// Health
// ============================================================

pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

// ============================================================
// Form layouts
// ============================================================

pub async fn get_form_layouts(
    State(repo): State<Repository>,
    Extension(developer): Extension<Developer>,
    Path(path): Path<AppPath>,
    Query(query): Query<LayoutSetQuery>,
) -> Result<Json<BTreeMap<String, Value>>, ApiError> {
    let ctx = editing_context(&path.org, &path.app, &developer)?;
    let layout_set = query.parse()?;
    repo.get_form_layouts(&ctx, layout_set.as_ref())
        .map(Json)
        .map_err(service_error)
}

/// Layouts in the editor's internal form, plus the names of layouts that
/// could not be converted completely.
pub async fn get_internal_form_layouts(
    State(repo): State<Repository>,
    Extension(developer): Extension<Developer>,
    Path(path): Path<AppPath>,
    Query(query): Query<LayoutSetQuery>,
) -> Result<Json<ConvertedLayouts>, ApiError> {
    let ctx = editing_context(&path.org, &path.app, &developer)?;
    let layout_set = query.parse()?;
    let layouts = repo
        .get_form_layouts(&ctx, layout_set.as_ref())
        .map_err(service_error)?;
    Ok(Json(convert_external_layouts(&layouts)))
}

pub async fn save_form_layout(
    State(repo): State<Repository>,
    Extension(developer): Extension<Developer>,
    Path(path): Path<LayoutPath>,
    Query(query): Query<LayoutSetQuery>,
    Json(layout): Json<Value>,
) -> Result<StatusCode, ApiError> {
    let ctx = editing_context(&path.org, &path.app, &developer)?;
    let layout_set = query.parse()?;
    if !layout.is_object() {
        return Err((
            StatusCode::BAD_REQUEST,
            "Layout must be a JSON object".to_string(),
        ));
    }
    repo.save_form_layout(&ctx, layout_set.as_ref(), &path.layout_name, &layout)
        .map(|_| StatusCode::OK)
        .map_err(service_error)
}

pub async fn delete_form_layout(
    State(repo): State<Repository>,
    Extension(developer): Extension<Developer>,
    Path(path): Path<LayoutPath>,
    Query(query): Query<LayoutSetQuery>,
) -> Result<StatusCode, ApiError> {
    let ctx = editing_context(&path.org, &path.app, &developer)?;
    let layout_set = query.parse()?;
    repo.delete_form_layout(&ctx, layout_set.as_ref(), &path.layout_name)
        .map(|_| StatusCode::OK)
        .map_err(service_error)
}

/// Rename a layout. The body is the new name as a JSON string.
pub async fn update_form_layout_name(
    State(repo): State<Repository>,
    Extension(developer): Extension<Developer>,
    Path(path): Path<LayoutPath>,
    Query(query): Query<LayoutSetQuery>,
    Json(new_name): Json<String>,
) -> Result<StatusCode, ApiError> {
    let ctx = editing_context(&path.org, &path.app, &developer)?;
    let layout_set = query.parse()?;
    repo.rename_form_layout(&ctx, layout_set.as_ref(), &path.layout_name, &new_name)
        .map(|_| StatusCode::OK)
        .map_err(service_error)
}

// ============================================================
// Layout settings
// ============================================================

pub async fn get_layout_settings(
    State(repo): State<Repository>,
    Extension(developer): Extension<Developer>,
    Path(path): Path<AppPath>,
    Query(query): Query<LayoutSetQuery>,
) -> Result<Json<Value>, ApiError> {
    let ctx = editing_context(&path.org, &path.app, &developer)?;
    let layout_set = query.parse()?;
    repo.get_layout_settings(&ctx, layout_set.as_ref())
        .map(Json)
        .map_err(service_error)
}

pub async fn save_layout_settings(
    State(repo): State<Repository>,
    Extension(developer): Extension<Developer>,
    Path(path): Path<AppPath>,
    Query(query): Query<LayoutSetQuery>,
    Json(settings): Json<Value>,
) -> Result<StatusCode, ApiError> {
    let ctx = editing_context(&path.org, &path.app, &developer)?;
    let layout_set = query.parse()?;
    repo.save_layout_settings(&ctx, layout_set.as_ref(), &settings)
        .map(|_| StatusCode::OK)
        .map_err(service_error)
}

// ============================================================
// Layout sets
// ============================================================

pub async fn get_layout_sets(
    State(repo): State<Repository>,
    Extension(developer): Extension<Developer>,
    Path(path): Path<AppPath>,
) -> Result<Json<LayoutSets>, ApiError> {
    let ctx = editing_context(&path.org, &path.app, &developer)?;
    repo.get_layout_sets(&ctx).map(Json).map_err(|e| match e {
        e if e.is_not_found() => (
            StatusCode::NOT_FOUND,
            "Layout-sets.json not found".to_string(),
        ),
        e => service_error(e),
    })
}

/// Convert an app without layout sets into one with the named set.
pub async fn configure_layout_set(
    State(repo): State<Repository>,
    Extension(developer): Extension<Developer>,
    Path(path): Path<AppPath>,
    Query(query): Query<LayoutSetQuery>,
) -> Result<Json<LayoutSets>, ApiError> {
    let ctx = editing_context(&path.org, &path.app, &developer)?;
    let Some(layout_set) = query.parse()? else {
        return Err((
            StatusCode::BAD_REQUEST,
            "LayoutSetName is required".to_string(),
        ));
    };
    repo.configure_layout_set(&ctx, &layout_set)
        .map(Json)
        .map_err(service_error)
}

pub async fn add_layout_set(
    State(repo): State<Repository>,
    Extension(developer): Extension<Developer>,
    Path(path): Path<AppPath>,
    Json(config): Json<LayoutSetConfig>,
) -> Result<StatusCode, ApiError> {
    let ctx = editing_context(&path.org, &path.app, &developer)?;
    repo.add_layout_set(&ctx, config)
        .map(|_| StatusCode::OK)
        .map_err(service_error)
}

// ============================================================
// Rules
// ============================================================

/// The rule handler script as plain text, or 204 when the app has none.
pub async fn get_rule_handler(
    State(repo): State<Repository>,
    Extension(developer): Extension<Developer>,
    Path(path): Path<AppPath>,
    Query(query): Query<LayoutSetQuery>,
) -> Result<Response, ApiError> {
    let ctx = editing_context(&path.org, &path.app, &developer)?;
    let layout_set = query.parse()?;
    match repo.get_rule_handler(&ctx, layout_set.as_ref()) {
        Ok(script) => Ok(script.into_response()),
        Err(e) if e.is_not_found() => Ok(StatusCode::NO_CONTENT.into_response()),
        Err(ServiceError::BadRequest(msg)) => Err((
            StatusCode::BAD_REQUEST,
            format!("Could not get rule handler: {msg}"),
        )),
        Err(e) => Err(service_error(e)),
    }
}

/// Store the raw request body as the rule handler script.
pub async fn save_rule_handler(
    State(repo): State<Repository>,
    Extension(developer): Extension<Developer>,
    Path(path): Path<AppPath>,
    Query(query): Query<LayoutSetQuery>,
    body: String,
) -> Result<StatusCode, ApiError> {
    let ctx = editing_context(&path.org, &path.app, &developer)?;
    let layout_set = query.parse()?;
    match repo.save_rule_handler(&ctx, layout_set.as_ref(), &body) {
        Ok(()) => Ok(StatusCode::NO_CONTENT),
        Err(ServiceError::BadRequest(msg)) => Err((StatusCode::BAD_REQUEST, msg)),
        Err(e) => {
            tracing::error!("Could not save rule handler: {}", e);
            Err((
                StatusCode::BAD_REQUEST,
                "Could not save rule handler".to_string(),
            ))
        }
    }
}

/// The rule configuration as JSON, or 204 when the app has none.
pub async fn get_rule_config(
    State(repo): State<Repository>,
    Extension(developer): Extension<Developer>,
    Path(path): Path<AppPath>,
    Query(query): Query<LayoutSetQuery>,
) -> Result<Response, ApiError> {
    let ctx = editing_context(&path.org, &path.app, &developer)?;
    let layout_set = query.parse()?;
    match repo.get_rule_config(&ctx, layout_set.as_ref()) {
        Ok(config) => Ok(([(header::CONTENT_TYPE, "application/json")], config).into_response()),
        Err(e) if e.is_not_found() => Ok(StatusCode::NO_CONTENT.into_response()),
        Err(ServiceError::BadRequest(msg)) => Err((
            StatusCode::BAD_REQUEST,
            format!("Could not get rule configuration: {msg}"),
        )),
        Err(e) => Err(service_error(e)),
    }
}

pub async fn save_rule_config(
    State(repo): State<Repository>,
    Extension(developer): Extension<Developer>,
    Path(path): Path<AppPath>,
    Query(query): Query<LayoutSetQuery>,
    Json(config): Json<Value>,
) -> Result<StatusCode, ApiError> {
    let ctx = editing_context(&path.org, &path.app, &developer)?;
    let layout_set = query.parse()?;
    repo.save_rule_config(&ctx, layout_set.as_ref(), &config)
        .map(|_| StatusCode::OK)
        .map_err(|e| {
            tracing::warn!("Rule configuration could not be saved: {}", e);
            (
                StatusCode::BAD_REQUEST,
                format!("Rule configuration could not be saved: {e}"),
            )
        })
}

// ============================================================
// App information
// ============================================================

pub async fn get_widget_settings(
    State(repo): State<Repository>,
    Extension(developer): Extension<Developer>,
    Path(path): Path<AppPath>,
) -> Result<Response, ApiError> {
    let ctx = editing_context(&path.org, &path.app, &developer)?;
    match repo.get_widget_settings(&ctx).map_err(service_error)? {
        Some(settings) => Ok(Json(settings).into_response()),
        None => Ok(StatusCode::NO_CONTENT.into_response()),
    }
}

pub async fn get_option_list_ids(
    State(repo): State<Repository>,
    Extension(developer): Extension<Developer>,
    Path(path): Path<AppPath>,
) -> Result<Response, ApiError> {
    let ctx = editing_context(&path.org, &path.app, &developer)?;
    match repo.get_option_list_ids(&ctx).map_err(service_error)? {
        Some(ids) => Ok(Json(ids).into_response()),
        None => Ok(StatusCode::NO_CONTENT.into_response()),
    }
}

pub async fn get_app_version(
    State(repo): State<Repository>,
    Extension(developer): Extension<Developer>,
    Path(path): Path<AppPath>,
) -> Result<Json<VersionResponse>, ApiError> {
    let ctx = editing_context(&path.org, &path.app, &developer)?;
    repo.get_app_version(&ctx)
        .map(Json)
        .map_err(service_error)
}
