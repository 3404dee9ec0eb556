//! Order and inventory transaction engine for the storefront backend.

pub mod config;
pub mod context;
pub mod database;
pub mod domain;
pub mod uuids;

#[cfg(test)]
mod test;
