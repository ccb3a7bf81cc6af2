use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Deserialize;

use super::{service_error, ApiError};
use crate::api::middleware::Developer;
use crate::models::{Resource, ResourceListItem, ResourcePolicy, ResourceValidation};
use crate::repo::{resource_repository_name, validate_resource, EditingContext, Repository};
use crate::validation::{ensure_file_name, is_valid_org_name};

#[derive(Debug, Deserialize)]
pub struct OrgPath {
    pub org: String,
}

#[derive(Debug, Deserialize)]
pub struct ResourcePath {
    pub org: String,
    pub repository: String,
    pub id: String,
}

fn resource_context(
    org: &str,
    repository: &str,
    developer: &Developer,
) -> Result<EditingContext, ApiError> {
    if !is_valid_org_name(org) {
        return Err((
            StatusCode::BAD_REQUEST,
            "Organisation name is not valid".to_string(),
        ));
    }
    ensure_file_name("Repository", repository).map_err(service_error)?;
    Ok(EditingContext::new(org, repository, developer.0.clone()))
}

pub async fn list_resources(
    State(repo): State<Repository>,
    Extension(developer): Extension<Developer>,
    Path(path): Path<OrgPath>,
) -> Result<Json<Vec<ResourceListItem>>, ApiError> {
    let ctx = resource_context(&path.org, &resource_repository_name(&path.org), &developer)?;
    repo.list_resources(&ctx).map(Json).map_err(service_error)
}

pub async fn add_resource(
    State(repo): State<Repository>,
    Extension(developer): Extension<Developer>,
    Path(path): Path<OrgPath>,
    Json(resource): Json<Resource>,
) -> Result<(StatusCode, Json<Resource>), ApiError> {
    let ctx = resource_context(&path.org, &resource_repository_name(&path.org), &developer)?;
    repo.add_resource(&ctx, &resource)
        .map(|_| (StatusCode::CREATED, Json(resource)))
        .map_err(service_error)
}

pub async fn get_resource(
    State(repo): State<Repository>,
    Extension(developer): Extension<Developer>,
    Path(path): Path<ResourcePath>,
) -> Result<Json<Resource>, ApiError> {
    let ctx = resource_context(&path.org, &path.repository, &developer)?;
    repo.get_resource(&ctx, &path.id)
        .map(Json)
        .map_err(service_error)
}

pub async fn update_resource(
    State(repo): State<Repository>,
    Extension(developer): Extension<Developer>,
    Path(path): Path<ResourcePath>,
    Json(resource): Json<Resource>,
) -> Result<Json<Resource>, ApiError> {
    let ctx = resource_context(&path.org, &path.repository, &developer)?;
    repo.update_resource(&ctx, &path.id, &resource)
        .map(|_| Json(resource))
        .map_err(service_error)
}

pub async fn validate_resource_by_id(
    State(repo): State<Repository>,
    Extension(developer): Extension<Developer>,
    Path(path): Path<ResourcePath>,
) -> Result<Json<ResourceValidation>, ApiError> {
    let ctx = resource_context(&path.org, &path.repository, &developer)?;
    let resource = repo.get_resource(&ctx, &path.id).map_err(service_error)?;
    Ok(Json(validate_resource(&resource)))
}

pub async fn get_policy(
    State(repo): State<Repository>,
    Extension(developer): Extension<Developer>,
    Path(path): Path<ResourcePath>,
) -> Result<Json<ResourcePolicy>, ApiError> {
    let ctx = resource_context(&path.org, &path.repository, &developer)?;
    repo.get_policy(&ctx, &path.id)
        .map(Json)
        .map_err(service_error)
}

pub async fn save_policy(
    State(repo): State<Repository>,
    Extension(developer): Extension<Developer>,
    Path(path): Path<ResourcePath>,
    Json(policy): Json<ResourcePolicy>,
) -> Result<Json<ResourcePolicy>, ApiError> {
    let ctx = resource_context(&path.org, &path.repository, &developer)?;
    repo.save_policy(&ctx, &path.id, &policy)
        .map(|_| Json(policy))
        .map_err(service_error)
}
