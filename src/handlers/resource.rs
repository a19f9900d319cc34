//! Collection handlers: list, create, read, update (PATCH/PUT), delete.

use crate::error::AppError;
use crate::extractors::SanitizedBody;
use crate::response::{success_many, success_one, success_one_ok};
use crate::service::CrudService;
use crate::state::ResourceState;
use crate::store::UpdateMode;
use axum::{
    extract::{Path, State},
    response::IntoResponse,
};

pub async fn list(State(rs): State<ResourceState>) -> Result<impl IntoResponse, AppError> {
    let data = CrudService::list(rs.store.as_ref(), &rs.schema).await?;
    Ok(success_many(data))
}

pub async fn create(
    State(rs): State<ResourceState>,
    SanitizedBody(body): SanitizedBody,
) -> Result<impl IntoResponse, AppError> {
    let data = CrudService::create(rs.store.as_ref(), &rs.schema, body)
        .await
        .map_err(AppError::save_failure)?;
    tracing::info!(collection = rs.schema.collection, id = %data.id, "created");
    Ok(success_one(data))
}

pub async fn read(
    State(rs): State<ResourceState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let data = CrudService::read(rs.store.as_ref(), &rs.schema, &id)
        .await
        .map_err(|e| e.not_found_for(rs.schema.kind, &id))?;
    Ok(success_one_ok(data))
}

async fn update(rs: ResourceState, id: String, body: SanitizedBody, mode: UpdateMode) -> Result<impl IntoResponse, AppError> {
    let data = CrudService::update(rs.store.as_ref(), &rs.schema, &id, body.0, mode)
        .await
        .map_err(|e| e.update_failure_for(rs.schema.kind, &id))?;
    Ok(success_one_ok(data))
}

/// PATCH: merge the body into the stored document.
pub async fn patch(
    State(rs): State<ResourceState>,
    Path(id): Path<String>,
    body: SanitizedBody,
) -> Result<impl IntoResponse, AppError> {
    update(rs, id, body, UpdateMode::Merge).await
}

/// PUT: the body replaces the stored document.
pub async fn put(
    State(rs): State<ResourceState>,
    Path(id): Path<String>,
    body: SanitizedBody,
) -> Result<impl IntoResponse, AppError> {
    update(rs, id, body, UpdateMode::Replace).await
}

pub async fn delete(
    State(rs): State<ResourceState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let data = CrudService::delete(rs.store.as_ref(), &rs.schema, &id)
        .await
        .map_err(|e| e.not_found_for(rs.schema.kind, &id))?;
    tracing::info!(collection = rs.schema.collection, id = %data.id, "deleted");
    Ok(success_one_ok(data))
}
