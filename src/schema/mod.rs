pub mod types;
pub mod models;

pub use types::*;
pub use models::*;
