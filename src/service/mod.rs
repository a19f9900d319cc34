//! CrudService: generic CRUD driven by entity schemas.

mod crud;
mod validation;
pub use crud::CrudService;
pub use validation::{DocumentValidator, ValidationMode};
