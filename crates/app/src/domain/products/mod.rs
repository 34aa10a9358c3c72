//! Products

pub mod errors;
pub mod models;
pub mod records;
pub mod service;

pub use errors::ProductsServiceError;
pub use service::*;
