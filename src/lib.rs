//! Registrar: JSON:API REST backend for student and course documents.

pub mod config;
pub mod document;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod response;
pub mod routes;
pub mod sanitize;
pub mod schema;
pub mod service;
pub mod state;
pub mod store;

pub use config::{Settings, StoreKind};
pub use document::Document;
pub use error::{AppError, ConfigError};
pub use response::{format_many, format_one, ResourceObject};
pub use routes::{app, common_routes, resource_routes, API_PREFIX};
pub use schema::{all_schemas, course_schema, student_schema, EntitySchema};
pub use service::CrudService;
pub use state::AppState;
pub use store::{ensure_collections, ensure_database_exists, DocumentStore, MemoryStore, PgDocumentStore, UpdateMode};
