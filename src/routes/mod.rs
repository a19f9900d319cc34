//! Router assembly.

mod common;
mod resource;

pub use common::common_routes;
pub use resource::resource_routes;

use crate::schema::all_schemas;
use crate::state::AppState;
use axum::{extract::DefaultBodyLimit, Router};
use tower_http::trace::TraceLayer;

/// Path prefix of every collection.
pub const API_PREFIX: &str = "/api";

/// Full application: operational routes, one CRUD router per schema, request tracing and body limit.
pub fn app(state: AppState, body_limit: usize) -> Router {
    let mut router = Router::new().merge(common_routes(state.clone()));
    for schema in all_schemas() {
        router = router.merge(resource_routes(&state, API_PREFIX, schema));
    }
    router
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
}
