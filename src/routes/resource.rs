//! Collection CRUD routes, one router per entity schema.

use crate::handlers::resource::{create, delete as delete_handler, list, patch, put, read};
use crate::schema::EntitySchema;
use crate::state::{AppState, ResourceState};
use axum::{routing::get, Router};

/// Mount the five collection operations under `{prefix}/{collection}`.
/// The collection root also answers with a trailing slash.
pub fn resource_routes(state: &AppState, prefix: &str, schema: EntitySchema) -> Router {
    let base = format!("{}/{}", prefix, schema.collection);
    let item = format!("{}/:id", base);
    Router::new()
        .route(&base, get(list).post(create))
        .route(&format!("{}/", base), get(list).post(create))
        .route(&item, get(read).patch(patch).put(put).delete(delete_handler))
        .with_state(ResourceState::new(state, schema))
}
