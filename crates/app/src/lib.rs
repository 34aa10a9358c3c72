//! Harvest application services over a remote document store.

pub mod config;
pub mod context;
pub mod domain;
pub mod observability;
pub mod store;

#[cfg(test)]
mod test;
