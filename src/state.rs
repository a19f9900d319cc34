//! Shared application state. The store handle is created once at startup and injected into every router.

use crate::schema::EntitySchema;
use crate::store::DocumentStore;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn DocumentStore>,
}

impl AppState {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        AppState { store }
    }
}

/// State of one collection router: the shared store plus the schema it serves.
#[derive(Clone)]
pub struct ResourceState {
    pub store: Arc<dyn DocumentStore>,
    pub schema: Arc<EntitySchema>,
}

impl ResourceState {
    pub fn new(state: &AppState, schema: EntitySchema) -> Self {
        ResourceState {
            store: state.store.clone(),
            schema: Arc::new(schema),
        }
    }
}
