//! Bundles

pub mod errors;
pub mod service;

pub use errors::BundlesServiceError;
pub use service::*;
