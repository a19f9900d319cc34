//! HTTP handlers for collection CRUD.

pub mod resource;
pub use resource::*;
